//! Configuration rules that annotate the model before a plugin runs.
//!
//! A rule without `matches` is plugin-wide and merges into the plugin
//! environment. A rule with `matches` merges into `config` of every selected
//! entity under the plugin's short name.

use indexmap::IndexSet;
use metaed_core::{EntityKey, EntityKind, EntityRepository};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::plugin::PluginEnvironment;
use crate::diagnostics::ValidationFailure;

const VALIDATOR_NAME: &str = "ConfigurationRule";

/// A single value or a list of them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany<T> {
    One(T),
    Many(Vec<T>),
}

impl<T> OneOrMany<T> {
    pub fn as_slice(&self) -> &[T] {
        match self {
            Self::One(value) => std::slice::from_ref(value),
            Self::Many(values) => values,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PluginConfiguration {
    #[serde(default)]
    pub config: Vec<ConfigurationRule>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigurationRule {
    pub rule: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub matches: Option<OneOrMany<ConfigurationMatches>>,
    pub data: Value,
}

/// Selects entities by kind, then narrows by namespace and name.
///
/// `core` and `extensions` restrict to core or extension namespaces; with
/// neither (or both) set, every namespace is eligible.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigurationMatches {
    pub entity: OneOrMany<String>,
    #[serde(default)]
    pub core: bool,
    #[serde(default)]
    pub extensions: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<OneOrMany<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entity_name: Option<OneOrMany<String>>,
}

/// Applies every rule of `plugin_config` for the plugin in `environment`.
///
/// A match definition that names a missing namespace, an unknown entity
/// kind, or an entity name nothing matches contributes one failure and no
/// annotations. Other match definitions of the same rule still apply.
pub fn annotate_model_with_configuration(
    repository: &mut EntityRepository,
    environment: &mut PluginEnvironment,
    plugin_config: &PluginConfiguration,
) -> Vec<ValidationFailure> {
    let mut failures = Vec::new();

    for rule in &plugin_config.config {
        let Some(matches) = &rule.matches else {
            merge_json(&mut environment.config, &rule.data);
            continue;
        };

        let mut selected: IndexSet<EntityKey> = IndexSet::new();
        for definition in matches.as_slice() {
            match select_entities(repository, definition) {
                Ok(keys) => selected.extend(keys),
                Err(problem) => failures.push(ValidationFailure::error(
                    VALIDATOR_NAME,
                    format!(
                        "Config rule '{}' for plugin {}: {problem}",
                        rule.rule, environment.short_name
                    ),
                )),
            }
        }

        tracing::debug!(
            plugin = %environment.short_name,
            rule = %rule.rule,
            entities = selected.len(),
            "applying configuration rule"
        );
        for key in &selected {
            let Some(entity) = repository.entity_mut(key) else {
                continue;
            };
            match entity.config.raw_mut(&environment.short_name) {
                Some(existing) => merge_json(existing, &rule.data),
                None => entity
                    .config
                    .insert_raw(&environment.short_name, rule.data.clone()),
            }
        }
    }

    failures
}

fn select_entities(
    repository: &EntityRepository,
    definition: &ConfigurationMatches,
) -> Result<Vec<EntityKey>, String> {
    let kinds = definition
        .entity
        .as_slice()
        .iter()
        .map(|name| {
            name.parse::<EntityKind>()
                .map_err(|_| format!("entity type '{name}' is not a known entity type"))
        })
        .collect::<Result<Vec<_>, _>>()?;

    let namespaces = match &definition.namespace {
        Some(names) => names
            .as_slice()
            .iter()
            .map(|name| {
                repository
                    .namespace(name)
                    .ok_or_else(|| format!("namespace '{name}' does not exist"))
            })
            .collect::<Result<Vec<_>, _>>()?,
        None => repository.namespaces().collect(),
    };

    let in_scope = |is_extension: bool| match (definition.core, definition.extensions) {
        (true, false) => !is_extension,
        (false, true) => is_extension,
        _ => true,
    };

    let names = definition.entity_name.as_ref().map(OneOrMany::as_slice);
    let mut keys = Vec::new();
    let mut unmatched: Vec<&str> = names
        .unwrap_or_default()
        .iter()
        .map(String::as_str)
        .collect();

    for namespace in namespaces.into_iter().filter(|n| in_scope(n.is_extension)) {
        for kind in &kinds {
            for entity in namespace.entities_of_kind(*kind) {
                if let Some(names) = names
                    && !names.contains(&entity.name)
                {
                    continue;
                }
                unmatched.retain(|name| *name != entity.name);
                keys.push(entity.key());
            }
        }
    }

    if !unmatched.is_empty() {
        return Err(format!(
            "entity name '{}' does not match any {}",
            unmatched.join("', '"),
            definition.entity.as_slice().join(" or ")
        ));
    }
    Ok(keys)
}

/// Deep merge: objects merge key by key, arrays concatenate, anything else
/// is overwritten.
pub fn merge_json(target: &mut Value, source: &Value) {
    match (target, source) {
        (Value::Object(target), Value::Object(source)) => {
            for (key, value) in source {
                match target.get_mut(key) {
                    Some(existing) => merge_json(existing, value),
                    None => {
                        target.insert(key.clone(), value.clone());
                    }
                }
            }
        }
        (Value::Array(target), Value::Array(source)) => target.extend(source.iter().cloned()),
        (target, source) => *target = source.clone(),
    }
}
