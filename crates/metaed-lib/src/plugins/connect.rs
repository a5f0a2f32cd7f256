//! `edfiUnified` enhancers: record what names and merge paths resolve to.
//!
//! Results go into the `edfiUnified` data section of the entity they
//! describe, as [`UnifiedData`]. A name that does not resolve is kept with no
//! target; reporting it is the validators' job.

use indexmap::IndexMap;
use metaed_core::{Entity, EntityKey, EntityKind, EntityRepository, Property};
use serde::{Deserialize, Serialize};

use super::unified::{INTERCHANGE_ELEMENT_KINDS, SHORT_NAME};
use crate::PluginError;
use crate::pipeline::PluginEnvironment;
use crate::resolve::{PropertyFilter, ResolvedProperty, find_referenced_property, property_chain};

/// Kinds a domain or subdomain item may name.
const DOMAIN_ITEM_KINDS: [EntityKind; 7] = [
    EntityKind::DomainEntity,
    EntityKind::DomainEntitySubclass,
    EntityKind::Association,
    EntityKind::AssociationSubclass,
    EntityKind::Common,
    EntityKind::Descriptor,
    EntityKind::InlineCommon,
];

/// Interchange extension elements prefer the extension of an entity.
const INTERCHANGE_EXTENSION_ELEMENT_KINDS: [EntityKind; 7] = [
    EntityKind::DomainEntityExtension,
    EntityKind::AssociationExtension,
    EntityKind::DomainEntity,
    EntityKind::DomainEntitySubclass,
    EntityKind::Association,
    EntityKind::AssociationSubclass,
    EntityKind::Descriptor,
];

/// The `edfiUnified` section of an entity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct UnifiedData {
    /// Merge directives declared on this entity's properties.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub merge_directives: Vec<MergeDirectiveLink>,
    /// Merge directives whose source path ends at one of this entity's properties.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub merge_sourced_by: Vec<MergeUse>,
    /// Merge directives whose target path ends at one of this entity's properties.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub merge_targeted_by: Vec<MergeUse>,
    /// Domain, subdomain or interchange items, in declaration order.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub items: Vec<ItemLink>,
}

/// A property and the entity that declares it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyRef {
    pub owner: EntityKey,
    /// Role-name-qualified property name.
    pub property: String,
}

impl PropertyRef {
    pub fn new(owner: &Entity, property: &Property) -> Self {
        Self {
            owner: owner.key(),
            property: property.full_name(),
        }
    }
}

impl From<ResolvedProperty<'_>> for PropertyRef {
    fn from(found: ResolvedProperty<'_>) -> Self {
        Self::new(found.owner, found.property)
    }
}

/// Where one merge directive's paths lead.
///
/// The chains list every property walked, so a chain shorter than its path
/// shows where resolution stopped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MergeDirectiveLink {
    /// Full name of the reference property declaring the directive.
    pub property: String,
    pub source_property_path: String,
    pub target_property_path: String,
    pub source_property: Option<PropertyRef>,
    pub source_property_chain: Vec<PropertyRef>,
    pub target_property: Option<PropertyRef>,
    pub target_property_chain: Vec<PropertyRef>,
}

/// One of this entity's properties named by a merge directive elsewhere.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MergeUse {
    pub property: String,
    pub declared_on: PropertyRef,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemLink {
    pub name: String,
    pub referenced_entity: Option<EntityKey>,
}

/// Reads the section, applies `update`, and writes it back.
fn update_section(
    repository: &mut EntityRepository,
    key: &EntityKey,
    update: impl FnOnce(&mut UnifiedData),
) -> Result<(), PluginError> {
    let Some(entity) = repository.entity_mut(key) else {
        return Ok(());
    };
    let mut data = entity.data.get::<UnifiedData>(SHORT_NAME).unwrap_or_default();
    update(&mut data);
    entity.data.set(SHORT_NAME, &data)?;
    Ok(())
}

/// Resolves both paths of every merge directive and links the properties
/// they end at back to the directive.
///
/// Paths are walked without the identity restriction the merge validators
/// apply, so a link exists for anything the path names.
pub fn merge_directive_enhancer(
    repository: &mut EntityRepository,
    _: &PluginEnvironment,
) -> Result<(), PluginError> {
    let updates = merge_links(repository);
    let linked = updates.len();
    for (key, update) in updates {
        update_section(repository, &key, |data| {
            data.merge_directives = update.merge_directives;
            data.merge_sourced_by = update.merge_sourced_by;
            data.merge_targeted_by = update.merge_targeted_by;
        })?;
    }
    tracing::debug!(entities = linked, "linked merge directives");
    Ok(())
}

fn merge_links(repository: &EntityRepository) -> IndexMap<EntityKey, UnifiedData> {
    let mut updates: IndexMap<EntityKey, UnifiedData> = IndexMap::new();

    for entity in repository.namespaces().flat_map(|namespace| namespace.entities()) {
        for property in &entity.properties {
            for directive in &property.merge_directives {
                let declared_on = PropertyRef::new(entity, property);
                let (source_property, source_property_chain) =
                    walk(repository, entity, &directive.source_path());
                let (target_property, target_property_chain) =
                    walk(repository, entity, &directive.target_path());

                if let Some(source) = &source_property {
                    updates
                        .entry(source.owner.clone())
                        .or_default()
                        .merge_sourced_by
                        .push(MergeUse {
                            property: source.property.clone(),
                            declared_on: declared_on.clone(),
                        });
                }
                if let Some(target) = &target_property {
                    updates
                        .entry(target.owner.clone())
                        .or_default()
                        .merge_targeted_by
                        .push(MergeUse {
                            property: target.property.clone(),
                            declared_on: declared_on.clone(),
                        });
                }
                updates.entry(entity.key()).or_default().merge_directives.push(MergeDirectiveLink {
                    property: declared_on.property,
                    source_property_path: directive.source_property_path.clone(),
                    target_property_path: directive.target_property_path.clone(),
                    source_property,
                    source_property_chain,
                    target_property,
                    target_property_chain,
                });
            }
        }
    }
    updates
}

fn walk<'r>(
    repository: &'r EntityRepository,
    entity: &'r Entity,
    path: &[&str],
) -> (Option<PropertyRef>, Vec<PropertyRef>) {
    let found = find_referenced_property(repository, entity, path, PropertyFilter::All);
    let chain = property_chain(repository, entity, path, PropertyFilter::All);
    (found.map(PropertyRef::from), chain.into_iter().map(PropertyRef::from).collect())
}

/// Resolves the items of every domain and subdomain.
pub fn domain_item_enhancer(
    repository: &mut EntityRepository,
    _: &PluginEnvironment,
) -> Result<(), PluginError> {
    link_items(repository, &[EntityKind::Domain, EntityKind::Subdomain], domain_item_kinds)
}

/// Resolves the elements of every interchange and interchange extension.
pub fn interchange_item_enhancer(
    repository: &mut EntityRepository,
    _: &PluginEnvironment,
) -> Result<(), PluginError> {
    link_items(
        repository,
        &[EntityKind::Interchange, EntityKind::InterchangeExtension],
        interchange_element_kinds,
    )
}

fn domain_item_kinds(_: EntityKind) -> &'static [EntityKind] {
    &DOMAIN_ITEM_KINDS
}

fn interchange_element_kinds(owner: EntityKind) -> &'static [EntityKind] {
    match owner {
        EntityKind::InterchangeExtension => &INTERCHANGE_EXTENSION_ELEMENT_KINDS,
        _ => &INTERCHANGE_ELEMENT_KINDS,
    }
}

fn link_items(
    repository: &mut EntityRepository,
    owner_kinds: &[EntityKind],
    item_kinds: fn(EntityKind) -> &'static [EntityKind],
) -> Result<(), PluginError> {
    for (key, items) in item_links(repository, owner_kinds, item_kinds) {
        let unresolved = items.iter().filter(|item| item.referenced_entity.is_none()).count();
        if unresolved > 0 {
            tracing::debug!(owner = %key, unresolved, "items left unresolved");
        }
        update_section(repository, &key, |data| data.items = items)?;
    }
    Ok(())
}

fn item_links(
    repository: &EntityRepository,
    owner_kinds: &[EntityKind],
    item_kinds: fn(EntityKind) -> &'static [EntityKind],
) -> Vec<(EntityKey, Vec<ItemLink>)> {
    repository
        .entities_of_kind(owner_kinds)
        .map(|owner| {
            let kinds = item_kinds(owner.kind);
            let items = owner
                .items
                .iter()
                .map(|item| ItemLink {
                    name: item.name.clone(),
                    referenced_entity: repository
                        .entity_from_namespace_chain(
                            &item.name,
                            item.namespace.as_deref(),
                            &owner.namespace,
                            kinds,
                        )
                        .map(Entity::key),
                })
                .collect();
            (owner.key(), items)
        })
        .collect()
}
