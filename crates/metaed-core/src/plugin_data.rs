//! Per-plugin annotation sections attached to entities.

use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Annotation bag keyed by plugin short name.
///
/// Each plugin owns exactly one section and stores a plugin-defined,
/// serde-described schema in it. A section that a plugin has not written yet
/// reads as `None`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PluginData(IndexMap<String, Value>);

impl PluginData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deserializes the section owned by `plugin`.
    ///
    /// Returns `None` if the section is absent or does not match `T`.
    pub fn get<T: DeserializeOwned>(&self, plugin: &str) -> Option<T> {
        let value = self.0.get(plugin)?;
        T::deserialize(value).ok()
    }

    /// Overwrites the section owned by `plugin`.
    pub fn set<T: Serialize>(&mut self, plugin: &str, value: &T) -> Result<(), serde_json::Error> {
        let value = serde_json::to_value(value)?;
        self.0.insert(plugin.to_owned(), value);
        Ok(())
    }

    pub fn raw(&self, plugin: &str) -> Option<&Value> {
        self.0.get(plugin)
    }

    pub fn raw_mut(&mut self, plugin: &str) -> Option<&mut Value> {
        self.0.get_mut(plugin)
    }

    pub fn insert_raw(&mut self, plugin: &str, value: Value) {
        self.0.insert(plugin.to_owned(), value);
    }

    pub fn contains(&self, plugin: &str) -> bool {
        self.0.contains_key(plugin)
    }

    pub fn plugins(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
