//! Plugins shipped with the engine.
//!
//! [`built_in`] returns them in the order they must run: reference
//! validation and linking first, merge directive validation second,
//! ordering last.

pub mod connect;
pub mod interchange_order;
pub mod unified;
pub mod unified_advanced;


use crate::pipeline::PluginManifest;

pub fn built_in() -> Vec<PluginManifest> {
    vec![
        unified::manifest(),
        unified_advanced::manifest(),
        interchange_order::manifest(),
    ]
}

/// `Extension, EdFi`: the namespaces a name is looked up in from `namespace`.
fn searched_namespaces(repository: &metaed_core::EntityRepository, namespace: &str) -> String {
    let chain = repository.namespace_chain(namespace);
    if chain.is_empty() {
        return namespace.to_owned();
    }
    chain
        .iter()
        .map(|namespace| namespace.name.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}
