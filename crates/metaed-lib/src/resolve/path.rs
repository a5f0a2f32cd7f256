use std::collections::HashSet;

use metaed_core::{Entity, EntityKey, EntityRepository, Property};

use super::filter::{FilterState, PropertyFilter};

/// A property found by path resolution, with the entity that declares it.
#[derive(Debug, Clone, Copy)]
pub struct ResolvedProperty<'r> {
    pub property: &'r Property,
    pub owner: &'r Entity,
}

/// Resolves the entity a reference property points at.
///
/// Lookup starts in the owner's namespace and follows its dependency chain.
pub fn referenced_entity<'r>(
    repository: &'r EntityRepository,
    property: &Property,
    owner: &Entity,
) -> Option<&'r Entity> {
    let name = property.referenced_entity.as_deref()?;
    repository.entity_from_namespace_chain(
        name,
        property.referenced_namespace.as_deref(),
        &owner.namespace,
        property.kind.referenced_kinds(),
    )
}

/// True when `a` and `b` are the same entity or one inherits from the other.
pub fn is_same_or_subclass(repository: &EntityRepository, a: &Entity, b: &Entity) -> bool {
    repository.is_same_or_descendant(a, b) || repository.is_same_or_descendant(b, a)
}

/// Walks `path` from `start` and returns the property named by its last segment.
///
/// Returns `None` when a segment cannot be matched, when a non-final segment
/// is not a navigable reference, or when the final property is a container.
pub fn find_referenced_property<'r>(
    repository: &'r EntityRepository,
    start: &'r Entity,
    path: &[&str],
    filter: PropertyFilter,
) -> Option<ResolvedProperty<'r>> {
    let chain = property_chain(repository, start, path, filter);
    let last = chain.last().copied()?;
    (chain.len() == path.len() && !last.property.kind.is_container()).then_some(last)
}

/// Every property matched while walking `path` from `start`, in order.
///
/// Stops after the first segment that cannot be matched or whose property
/// cannot be followed, so a chain shorter than `path` marks where resolution
/// failed.
pub fn property_chain<'r>(
    repository: &'r EntityRepository,
    start: &'r Entity,
    path: &[&str],
    filter: PropertyFilter,
) -> Vec<ResolvedProperty<'r>> {
    let mut state = FilterState::new(filter);
    let mut candidates = vec![start];
    let mut chain = Vec::with_capacity(path.len());

    for (index, segment) in path.iter().enumerate() {
        let Some(found) = match_segment(repository, &candidates, segment, &state) else {
            break;
        };
        chain.push(found);
        if index + 1 == path.len() || !found.property.kind.is_navigable() {
            break;
        }
        let Some(next) = referenced_entity(repository, found.property, found.owner) else {
            break;
        };
        candidates = vec![next];
        state.advance();
    }
    chain
}

/// Searches candidates, falling back to base entities restricted to identity.
fn match_segment<'r>(
    repository: &'r EntityRepository,
    candidates: &[&'r Entity],
    segment: &str,
    state: &FilterState,
) -> Option<ResolvedProperty<'r>> {
    let mut stack: Vec<(&'r Entity, bool)> = candidates.iter().rev().map(|e| (*e, false)).collect();
    let mut seen: HashSet<EntityKey> = HashSet::new();

    while let Some((entity, identity_only)) = stack.pop() {
        if !seen.insert(entity.key()) {
            continue;
        }
        let mut inlined = HashSet::new();
        if let Some(found) =
            search_entity(repository, entity, segment, state, identity_only, &mut inlined)
        {
            return Some(found);
        }
        if let Some(base) = repository.base_entity(entity) {
            stack.push((base, true));
        }
    }
    None
}

/// Matches `segment` against an entity's properties, descending into
/// choices and inline commons without consuming the segment.
fn search_entity<'r>(
    repository: &'r EntityRepository,
    entity: &'r Entity,
    segment: &str,
    state: &FilterState,
    identity_only: bool,
    inlined: &mut HashSet<EntityKey>,
) -> Option<ResolvedProperty<'r>> {
    for property in &entity.properties {
        if names_segment(property, segment) && state.accepts(property, entity, identity_only) {
            return Some(ResolvedProperty {
                property,
                owner: entity,
            });
        }

        if !property.kind.is_transparent() {
            continue;
        }
        let Some(container) = referenced_entity(repository, property, entity) else {
            continue;
        };
        if !inlined.insert(container.key()) {
            continue;
        }
        if let Some(found) =
            search_entity(repository, container, segment, state, identity_only, inlined)
        {
            return Some(found);
        }
    }
    None
}

/// A role name is part of the name: `Responsible` + `School` only matches
/// `ResponsibleSchool`.
fn names_segment(property: &Property, segment: &str) -> bool {
    match &property.role_name {
        Some(role_name) if *role_name != property.name => segment
            .strip_prefix(role_name.as_str())
            .is_some_and(|rest| rest == property.name),
        _ => segment == property.name,
    }
}
