//! Namespace-partitioned entity storage with chain-aware lookup.

use indexmap::IndexMap;

use crate::entity::{Entity, EntityKey, EntityKind};
use crate::namespace::Namespace;

/// Errors raised while populating the repository.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RepositoryError {
    #[error("namespace `{0}` is not declared")]
    UnknownNamespace(String),

    #[error("namespace `{0}` is already declared")]
    DuplicateNamespace(String),

    #[error("{kind} `{name}` is already declared in namespace `{namespace}`")]
    DuplicateEntity {
        namespace: String,
        kind: EntityKind,
        name: String,
    },
}

/// Splits `"Namespace.Entity"` into its qualifier and local name.
///
/// Unqualified names yield `(None, name)`.
pub fn split_qualified_name(name: &str) -> (Option<&str>, &str) {
    match name.split_once('.') {
        Some((namespace, local)) if !namespace.is_empty() => (Some(namespace), local),
        _ => (None, name),
    }
}

/// All namespaces of one compilation run, in declaration order.
#[derive(Debug, Clone, Default)]
pub struct EntityRepository {
    namespaces: IndexMap<String, Namespace>,
}

impl EntityRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_namespace(&mut self, namespace: Namespace) -> crate::Result<()> {
        if self.namespaces.contains_key(&namespace.name) {
            return Err(RepositoryError::DuplicateNamespace(namespace.name));
        }
        self.namespaces.insert(namespace.name.clone(), namespace);
        Ok(())
    }

    pub fn namespace(&self, name: &str) -> Option<&Namespace> {
        self.namespaces.get(name)
    }

    pub fn namespace_mut(&mut self, name: &str) -> Option<&mut Namespace> {
        self.namespaces.get_mut(name)
    }

    pub fn namespaces(&self) -> impl Iterator<Item = &Namespace> {
        self.namespaces.values()
    }

    pub fn namespaces_mut(&mut self) -> impl Iterator<Item = &mut Namespace> {
        self.namespaces.values_mut()
    }

    /// Adds an entity to the namespace it names.
    pub fn add_entity(&mut self, entity: Entity) -> crate::Result<EntityKey> {
        let Some(namespace) = self.namespaces.get_mut(&entity.namespace) else {
            return Err(RepositoryError::UnknownNamespace(entity.namespace));
        };
        let key = entity.key();
        namespace.insert(entity).map_err(|rejected| RepositoryError::DuplicateEntity {
            namespace: rejected.namespace,
            kind: rejected.kind,
            name: rejected.name,
        })?;
        Ok(key)
    }

    pub fn entity(&self, key: &EntityKey) -> Option<&Entity> {
        self.namespaces
            .get(&key.namespace)?
            .get_entity(&key.name, &[key.kind])
    }

    pub fn entity_mut(&mut self, key: &EntityKey) -> Option<&mut Entity> {
        self.namespaces
            .get_mut(&key.namespace)?
            .get_entity_mut(&key.name, key.kind)
    }

    /// Entities of any of `kinds`, namespace by namespace, kinds in the given order.
    pub fn entities_of_kind<'a>(
        &'a self,
        kinds: &'a [EntityKind],
    ) -> impl Iterator<Item = &'a Entity> + 'a {
        self.namespaces.values().flat_map(move |namespace| {
            kinds
                .iter()
                .flat_map(move |kind| namespace.entities_of_kind(*kind))
        })
    }

    /// Every entity declared in the named namespaces. Unknown names are skipped.
    pub fn all_entities_for_namespaces<'a>(
        &'a self,
        names: &'a [&'a str],
    ) -> impl Iterator<Item = &'a Entity> + 'a {
        names
            .iter()
            .filter_map(|name| self.namespaces.get(*name))
            .flat_map(Namespace::entities)
    }

    /// Namespaces visible from `starting`: itself, then its dependencies in order.
    pub fn namespace_chain<'a>(&'a self, starting: &str) -> Vec<&'a Namespace> {
        let Some(start) = self.namespaces.get(starting) else {
            return Vec::new();
        };
        let mut chain = vec![start];
        for dependency in &start.dependencies {
            if let Some(namespace) = self.namespaces.get(dependency)
                && !chain.iter().any(|n| n.name == namespace.name)
            {
                chain.push(namespace);
            }
        }
        chain
    }

    /// Resolves a possibly qualified entity name from `starting_namespace`.
    ///
    /// A qualifier in `name` wins over `explicit_namespace`. A qualified lookup
    /// only succeeds when the named namespace is visible from the starting
    /// namespace. Unresolved names yield `None`.
    pub fn entity_from_namespace_chain(
        &self,
        name: &str,
        explicit_namespace: Option<&str>,
        starting_namespace: &str,
        kinds: &[EntityKind],
    ) -> Option<&Entity> {
        let (qualifier, local_name) = split_qualified_name(name);
        let chain = self.namespace_chain(starting_namespace);

        match qualifier.or(explicit_namespace) {
            Some(wanted) => chain
                .into_iter()
                .find(|namespace| namespace.name == wanted)?
                .get_entity(local_name, kinds),
            None => chain
                .into_iter()
                .find_map(|namespace| namespace.get_entity(local_name, kinds)),
        }
    }

    /// Resolves the declared base of a subclass or extension.
    pub fn base_entity(&self, entity: &Entity) -> Option<&Entity> {
        let base_name = entity.base_entity_name.as_deref()?;
        self.entity_from_namespace_chain(
            base_name,
            entity.base_entity_namespace.as_deref(),
            &entity.namespace,
            entity.kind.base_kinds(),
        )
    }

    /// True if `entity` is `ancestor` or inherits from it through base entities.
    pub fn is_same_or_descendant(&self, entity: &Entity, ancestor: &Entity) -> bool {
        let mut current = Some(entity);
        let mut hops = 0;
        while let Some(candidate) = current {
            if candidate.key() == ancestor.key() {
                return true;
            }
            // Base chains are shallow; the bound guards against malformed cycles.
            hops += 1;
            if hops > self.entity_count() {
                return false;
            }
            current = self.base_entity(candidate);
        }
        false
    }

    pub fn entity_count(&self) -> usize {
        self.namespaces.values().map(Namespace::entity_count).sum()
    }
}
