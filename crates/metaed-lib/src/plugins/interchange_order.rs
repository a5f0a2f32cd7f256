//! `edfiInterchangeOrder`: load order for entities and interchanges.
//!
//! Every top-level entity gets a `globalDependencyOrder` such that anything
//! it references comes first. Interchanges are then ordered by the entities
//! they carry and numbered 10, 20, 30 so that new ones can be slotted in.
//!
//! Edges point from the referencing entity to the referenced one, through
//! commons, choices and inline commons. An edge is required when the
//! property is required or part of the identity, or when it points at a base
//! entity; only optional edges are dropped while cycles can be broken without
//! touching required ones.

use std::collections::HashSet;
use std::fmt::{self, Write};

use indexmap::IndexMap;
use metaed_core::{Entity, EntityKey, EntityKind, EntityRepository};
use serde::{Deserialize, Serialize};

use super::unified::INTERCHANGE_ELEMENT_KINDS;
use crate::PluginError;
use crate::graph::{DependencyGraph, sort_graph};
use crate::pipeline::{GeneratedOutput, GeneratorResult, PluginEnvironment, PluginManifest};
use crate::resolve::referenced_entity;

pub const SHORT_NAME: &str = "edfiInterchangeOrder";

/// Entities that take part in the global order.
pub const ORDERED_KINDS: [EntityKind; 5] = [
    EntityKind::Descriptor,
    EntityKind::DomainEntity,
    EntityKind::DomainEntitySubclass,
    EntityKind::Association,
    EntityKind::AssociationSubclass,
];

const INTERCHANGE_KINDS: [EntityKind; 2] = [EntityKind::Interchange, EntityKind::InterchangeExtension];

/// Spacing between consecutive interchange positions.
const API_ORDER_STEP: usize = 10;

/// Section written on every ordered entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityOrder {
    pub global_dependency_order: usize,
}

/// Section written on every interchange.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InterchangeOrder {
    pub api_order: usize,
    pub api_ordered_elements: Vec<OrderedElement>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderedElement {
    pub global_dependency_order: usize,
    pub name: String,
}

pub fn manifest() -> PluginManifest {
    PluginManifest::new(SHORT_NAME)
        .with_enhancer("InterchangeOrderEnhancer", enhance)
        .with_generator("InterchangeOrderReport", generate)
}

/// Writes [`EntityOrder`] and [`InterchangeOrder`] sections.
pub fn enhance(repository: &mut EntityRepository, _: &PluginEnvironment) -> Result<(), PluginError> {
    let entity_graph = entity_dependency_graph(repository);
    let global_orders = global_dependency_orders(&entity_graph);
    let interchange_orders = interchange_orders(repository, &entity_graph, &global_orders);

    for (key, order) in &global_orders {
        if let Some(entity) = repository.entity_mut(key) {
            entity.data.set(
                SHORT_NAME,
                &EntityOrder {
                    global_dependency_order: *order,
                },
            )?;
        }
    }
    for (key, order) in &interchange_orders {
        if let Some(interchange) = repository.entity_mut(key) {
            interchange.data.set(SHORT_NAME, order)?;
        }
    }

    tracing::debug!(
        entities = global_orders.len(),
        interchanges = interchange_orders.len(),
        "assigned interchange order"
    );
    Ok(())
}

fn entity_dependency_graph(repository: &EntityRepository) -> DependencyGraph<EntityKey> {
    let mut graph = DependencyGraph::new();
    for entity in repository.entities_of_kind(&ORDERED_KINDS) {
        graph.add_node(entity.key());
    }

    for entity in repository.entities_of_kind(&ORDERED_KINDS) {
        let from = entity.key();
        if let Some(base) = repository.base_entity(entity)
            && base.kind.is_top_level_ordered()
        {
            graph.set_edge(from.clone(), base.key(), true);
        }

        let mut dependencies = Vec::new();
        collect_dependencies(repository, entity, &mut HashSet::new(), &mut dependencies);
        for (target, is_required) in dependencies {
            if !target.kind.is_top_level_ordered() {
                continue;
            }
            // A second reference to the same entity never weakens a required edge.
            let is_required = is_required || graph.edge(&from, &target.key()).unwrap_or(false);
            graph.set_edge(from.clone(), target.key(), is_required);
        }
    }
    graph
}

/// References made by `entity`, looking through container properties.
fn collect_dependencies<'r>(
    repository: &'r EntityRepository,
    entity: &'r Entity,
    visited: &mut HashSet<EntityKey>,
    dependencies: &mut Vec<(&'r Entity, bool)>,
) {
    for property in &entity.properties {
        let Some(target) = referenced_entity(repository, property, entity) else {
            continue;
        };
        if property.kind.is_container() {
            if visited.insert(target.key()) {
                collect_dependencies(repository, target, visited, dependencies);
            }
            continue;
        }
        dependencies.push((target, property.is_required || property.is_identity()));
    }
}

/// 1-based positions, referenced entities first.
fn global_dependency_orders(graph: &DependencyGraph<EntityKey>) -> IndexMap<EntityKey, usize> {
    let outcome = sort_graph(graph.clone());
    if outcome.is_fallback {
        tracing::error!("entity dependencies could not be ordered; no global order assigned");
    }
    for (from, to, is_required) in &outcome.removed_edges {
        tracing::warn!(%from, %to, is_required, "ignored dependency to break a reference cycle");
    }

    outcome
        .order
        .into_iter()
        .rev()
        .enumerate()
        .map(|(index, key)| (key, index + 1))
        .collect()
}

fn interchange_orders(
    repository: &EntityRepository,
    entity_graph: &DependencyGraph<EntityKey>,
    global_orders: &IndexMap<EntityKey, usize>,
) -> IndexMap<EntityKey, InterchangeOrder> {
    let elements: IndexMap<EntityKey, Vec<EntityKey>> = repository
        .entities_of_kind(&INTERCHANGE_KINDS)
        .map(|interchange| (interchange.key(), interchange_elements(repository, interchange)))
        .collect();

    let mut graph = DependencyGraph::new();
    for interchange in elements.keys() {
        graph.add_node(interchange.clone());
    }
    for (from, from_elements) in &elements {
        for (to, to_elements) in &elements {
            if from == to {
                continue;
            }
            let depends = from_elements.iter().any(|element| {
                to_elements
                    .iter()
                    .any(|dependency| entity_graph.has_edge(element, dependency))
            });
            if depends {
                graph.set_edge(from.clone(), to.clone(), false);
            }
        }
    }

    let outcome = sort_graph(graph);
    if outcome.is_fallback {
        tracing::error!("interchanges could not be ordered; no api order assigned");
    }

    outcome
        .order
        .into_iter()
        .rev()
        .enumerate()
        .map(|(index, key)| {
            let mut ordered_elements: Vec<OrderedElement> = elements[&key]
                .iter()
                .filter_map(|element| {
                    global_orders.get(element).map(|order| OrderedElement {
                        global_dependency_order: *order,
                        name: element.name.clone(),
                    })
                })
                .collect();
            ordered_elements.sort_by_key(|element| element.global_dependency_order);
            let order = InterchangeOrder {
                api_order: (index + 1) * API_ORDER_STEP,
                api_ordered_elements: ordered_elements,
            };
            (key, order)
        })
        .collect()
}

/// Resolved elements of an interchange; unresolved names are skipped.
fn interchange_elements(repository: &EntityRepository, interchange: &Entity) -> Vec<EntityKey> {
    interchange
        .items
        .iter()
        .filter_map(|item| {
            repository.entity_from_namespace_chain(
                &item.name,
                item.namespace.as_deref(),
                &interchange.namespace,
                &INTERCHANGE_ELEMENT_KINDS,
            )
        })
        .map(Entity::key)
        .collect()
}

/// One text file per namespace listing interchanges in load order.
pub fn generate(
    repository: &EntityRepository,
    _: &PluginEnvironment,
) -> Result<GeneratorResult, PluginError> {
    let mut result = GeneratorResult::new("InterchangeOrderReport");

    for namespace in repository.namespaces() {
        let mut interchanges: Vec<(InterchangeOrder, &str)> = INTERCHANGE_KINDS
            .iter()
            .flat_map(|kind| namespace.entities_of_kind(*kind))
            .filter_map(|interchange| {
                let order = interchange.data.get::<InterchangeOrder>(SHORT_NAME)?;
                Some((order, interchange.name.as_str()))
            })
            .collect();
        if interchanges.is_empty() {
            continue;
        }
        interchanges.sort_by_key(|(order, _)| order.api_order);

        let mut report = String::new();
        write_report(&mut report, &interchanges).map_err(|e| PluginError::new(e.to_string()))?;

        result = result.with_output(GeneratedOutput {
            name: "Interchange Order".to_owned(),
            namespace: namespace.name.clone(),
            folder_name: "Documentation".to_owned(),
            file_name: "InterchangeOrder.txt".to_owned(),
            result_string: report,
        });
    }

    Ok(result)
}

fn write_report(w: &mut impl Write, interchanges: &[(InterchangeOrder, &str)]) -> fmt::Result {
    for (order, name) in interchanges {
        writeln!(w, "{} {name}", order.api_order)?;
        for element in &order.api_ordered_elements {
            writeln!(w, "  {} {}", element.global_dependency_order, element.name)?;
        }
    }
    Ok(())
}
