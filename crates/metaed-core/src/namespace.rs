use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::entity::{Entity, EntityKind};

/// A named partition of declared entities.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Namespace {
    pub name: String,
    pub project_name: String,
    pub project_version: String,
    /// Suffix used by extension projects (`TPDM`, `Sample`); empty for core.
    pub project_extension: String,
    pub description: String,
    pub is_extension: bool,
    /// Namespaces searched after this one, in order.
    pub dependencies: Vec<String>,
    entities: IndexMap<EntityKind, IndexMap<String, Entity>>,
}

impl Namespace {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// A namespace declared by an extension project.
    pub fn extension(name: impl Into<String>, project_extension: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            project_extension: project_extension.into(),
            is_extension: true,
            ..Self::default()
        }
    }

    /// Kind-filtered lookup. Kinds are tried in the given order.
    pub fn get_entity(&self, name: &str, kinds: &[EntityKind]) -> Option<&Entity> {
        kinds
            .iter()
            .find_map(|kind| self.entities.get(kind).and_then(|by_name| by_name.get(name)))
    }

    pub fn get_entity_mut(&mut self, name: &str, kind: EntityKind) -> Option<&mut Entity> {
        self.entities.get_mut(&kind)?.get_mut(name)
    }

    pub fn contains(&self, name: &str, kind: EntityKind) -> bool {
        self.entities
            .get(&kind)
            .is_some_and(|by_name| by_name.contains_key(name))
    }

    /// Entities of one kind in declaration order.
    pub fn entities_of_kind(&self, kind: EntityKind) -> impl Iterator<Item = &Entity> {
        self.entities.get(&kind).into_iter().flat_map(|by_name| by_name.values())
    }

    /// All entities, grouped by kind in first-declared order.
    pub fn entities(&self) -> impl Iterator<Item = &Entity> {
        self.entities.values().flat_map(|by_name| by_name.values())
    }

    pub fn entities_mut(&mut self) -> impl Iterator<Item = &mut Entity> {
        self.entities.values_mut().flat_map(|by_name| by_name.values_mut())
    }

    pub fn entity_count(&self) -> usize {
        self.entities.values().map(IndexMap::len).sum()
    }

    /// Inserts an entity, returning it back if the name is taken for its kind.
    pub(crate) fn insert(&mut self, entity: Entity) -> Result<(), Entity> {
        let by_name = self.entities.entry(entity.kind).or_default();
        if by_name.contains_key(&entity.name) {
            return Err(entity);
        }
        by_name.insert(entity.name.clone(), entity);
        Ok(())
    }
}
