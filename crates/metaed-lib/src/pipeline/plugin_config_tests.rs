use metaed_core::{Entity, EntityKey, EntityKind, EntityRepository, Namespace};
use serde_json::json;

use super::*;

const PLUGIN: &str = "pluginName";

fn config(rules: serde_json::Value) -> PluginConfiguration {
    serde_json::from_value(json!({ "config": rules })).unwrap()
}

fn environment() -> PluginEnvironment {
    PluginEnvironment::new(PLUGIN, "7.1.0")
}

/// `EdFi` (core) with two domain entities and an association, `Sample` and
/// `Homograph` (extensions) each declaring a domain entity.
fn model() -> EntityRepository {
    let mut repository = EntityRepository::new();
    repository.add_namespace(Namespace::new("EdFi")).unwrap();
    repository
        .add_namespace(Namespace::extension("Sample", "Sample"))
        .unwrap();
    repository
        .add_namespace(Namespace::extension("Homograph", "Homograph"))
        .unwrap();

    for (namespace, kind, name) in [
        ("EdFi", EntityKind::DomainEntity, "DomainEntityName"),
        ("EdFi", EntityKind::DomainEntity, "Other"),
        ("EdFi", EntityKind::Association, "AssociationName"),
        ("Sample", EntityKind::DomainEntity, "DomainEntityName"),
        ("Homograph", EntityKind::DomainEntity, "DomainEntityName")
    ] {
        repository
            .add_entity(Entity::new(kind, namespace, name))
            .unwrap();
    }
    repository
}

fn explainer(repository: &EntityRepository, namespace: &str, kind: EntityKind, name: &str) -> Option<String> {
    let entity = repository.entity(&EntityKey::new(namespace, kind, name))?;
    entity.config.raw(PLUGIN)?.get("explainer")?.as_str().map(str::to_owned)
}

fn domain_entity(repository: &EntityRepository, namespace: &str, name: &str) -> Option<String> {
    explainer(repository, namespace, EntityKind::DomainEntity, name)
}

#[test]
fn plugin_wide_rule_merges_into_environment() {
    let mut repository = model();
    let mut environment = environment();
    let config = config(json!([
        { "rule": "rule123", "data": { "explainer": "info" } },
        { "rule": "rule456", "data": { "special": "sauce" } }
    ]));

    let failures = annotate_model_with_configuration(&mut repository, &mut environment, &config);

    assert!(failures.is_empty());
    assert_eq!(environment.config["explainer"], "info");
    assert_eq!(environment.config["special"], "sauce");
    assert_eq!(domain_entity(&repository, "EdFi", "DomainEntityName"), None);
}

#[test]
fn plugin_wide_arrays_concatenate() {
    let mut repository = model();
    let mut environment = environment();
    let config = config(json!([
        { "rule": "rule123", "data": { "explainer": ["info"] } },
        { "rule": "rule456", "data": { "explainer": ["sauce"] } }
    ]));

    annotate_model_with_configuration(&mut repository, &mut environment, &config);

    assert_eq!(environment.config["explainer"], json!(["info", "sauce"]));
}

#[test]
fn rule_for_entity_types() {
    let mut repository = model();
    let mut environment = environment();
    let config = config(json!([{
        "rule": "rule123",
        "matches": { "entity": ["domainEntity", "association"] },
        "data": { "explainer": "info" }
    }]));

    let failures = annotate_model_with_configuration(&mut repository, &mut environment, &config);

    assert!(failures.is_empty());
    assert_eq!(environment.config.get("explainer"), None);
    assert_eq!(domain_entity(&repository, "EdFi", "Other").as_deref(), Some("info"));
    assert_eq!(domain_entity(&repository, "Sample", "DomainEntityName").as_deref(), Some("info"));
    assert_eq!(
        explainer(&repository, "EdFi", EntityKind::Association, "AssociationName").as_deref(),
        Some("info")
    );
}

#[test]
fn rule_restricted_to_core() {
    let mut repository = model();
    let config = config(json!([{
        "rule": "rule123",
        "matches": { "entity": "domainEntity", "core": true },
        "data": { "explainer": "info" }
    }]));

    annotate_model_with_configuration(&mut repository, &mut environment(), &config);

    assert_eq!(domain_entity(&repository, "EdFi", "DomainEntityName").as_deref(), Some("info"));
    assert_eq!(domain_entity(&repository, "Sample", "DomainEntityName"), None);
}

#[test]
fn rule_restricted_to_extensions_with_duplicate_names() {
    let mut repository = model();
    let config = config(json!([{
        "rule": "rule123",
        "matches": { "entity": "domainEntity", "extensions": true, "entityName": ["DomainEntityName"] },
        "data": { "explainer": "info" }
    }]));

    let failures = annotate_model_with_configuration(&mut repository, &mut environment(), &config);

    assert!(failures.is_empty());
    assert_eq!(domain_entity(&repository, "EdFi", "DomainEntityName"), None);
    assert_eq!(domain_entity(&repository, "Sample", "DomainEntityName").as_deref(), Some("info"));
    assert_eq!(domain_entity(&repository, "Homograph", "DomainEntityName").as_deref(), Some("info"));
}

#[test]
fn rule_for_named_namespaces() {
    let mut repository = model();
    let config = config(json!([{
        "rule": "rule123",
        "matches": { "entity": "domainEntity", "namespace": ["EdFi", "Homograph"] },
        "data": { "explainer": "info" }
    }]));

    annotate_model_with_configuration(&mut repository, &mut environment(), &config);

    assert_eq!(domain_entity(&repository, "EdFi", "Other").as_deref(), Some("info"));
    assert_eq!(domain_entity(&repository, "Sample", "DomainEntityName"), None);
    assert_eq!(domain_entity(&repository, "Homograph", "DomainEntityName").as_deref(), Some("info"));
}

#[test]
fn missing_namespace_fails_without_annotating() {
    let mut repository = model();
    let config = config(json!([{
        "rule": "rule123",
        "matches": { "entity": "domainEntity", "namespace": "invalid" },
        "data": { "explainer": "info" }
    }]));

    let failures = annotate_model_with_configuration(&mut repository, &mut environment(), &config);

    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].validator_name, "ConfigurationRule");
    insta::assert_snapshot!(failures[0].message, @"Config rule 'rule123' for plugin pluginName: namespace 'invalid' does not exist");
    assert_eq!(domain_entity(&repository, "EdFi", "DomainEntityName"), None);
}

#[test]
fn entity_name_list() {
    let mut repository = model();
    let config = config(json!([{
        "rule": "rule123",
        "matches": { "entity": "domainEntity", "namespace": "EdFi", "entityName": ["DomainEntityName", "Other"] },
        "data": { "explainer": "info" }
    }]));

    let failures = annotate_model_with_configuration(&mut repository, &mut environment(), &config);

    assert!(failures.is_empty());
    assert_eq!(domain_entity(&repository, "EdFi", "DomainEntityName").as_deref(), Some("info"));
    assert_eq!(domain_entity(&repository, "EdFi", "Other").as_deref(), Some("info"));
    assert_eq!(domain_entity(&repository, "Sample", "DomainEntityName"), None);
}

#[test]
fn unmatched_entity_name_fails_without_annotating() {
    let mut repository = model();
    let config = config(json!([{
        "rule": "rule123",
        "matches": { "entity": "domainEntity", "namespace": "EdFi", "entityName": "invalid" },
        "data": { "explainer": "info" }
    }]));

    let failures = annotate_model_with_configuration(&mut repository, &mut environment(), &config);

    assert_eq!(failures.len(), 1);
    insta::assert_snapshot!(failures[0].message, @"Config rule 'rule123' for plugin pluginName: entity name 'invalid' does not match any domainEntity");
    assert_eq!(domain_entity(&repository, "EdFi", "DomainEntityName"), None);
}

#[test]
fn multiple_match_definitions() {
    let mut repository = model();
    let config = config(json!([{
        "rule": "rule123",
        "matches": [
            { "entity": "domainEntity", "extensions": true },
            { "entity": "domainEntity", "core": true, "entityName": "DomainEntityName" }
        ],
        "data": { "explainer": "info" }
    }]));

    let failures = annotate_model_with_configuration(&mut repository, &mut environment(), &config);

    assert!(failures.is_empty());
    assert_eq!(domain_entity(&repository, "EdFi", "DomainEntityName").as_deref(), Some("info"));
    assert_eq!(domain_entity(&repository, "EdFi", "Other"), None);
    assert_eq!(domain_entity(&repository, "Sample", "DomainEntityName").as_deref(), Some("info"));
}

#[test]
fn overlapping_match_definitions_annotate_once() {
    let mut repository = model();
    let config = config(json!([{
        "rule": "rule123",
        "matches": [
            { "entity": "domainEntity", "core": true },
            { "entity": "domainEntity", "core": true, "entityName": "DomainEntityName" }
        ],
        "data": { "tags": ["a"] }
    }]));

    annotate_model_with_configuration(&mut repository, &mut environment(), &config);

    let key = EntityKey::new("EdFi", EntityKind::DomainEntity, "DomainEntityName");
    let entity = repository.entity(&key).unwrap();
    assert_eq!(entity.config.raw(PLUGIN), Some(&json!({ "tags": ["a"] })));
}

#[test]
fn invalid_match_definition_does_not_block_others() {
    let mut repository = model();
    let config = config(json!([{
        "rule": "rule123",
        "matches": [
            { "entity": "domainEntity", "core": true },
            { "entity": "domainEntity", "core": true, "entityName": "invalid" }
        ],
        "data": { "explainer": "info" }
    }]));

    let failures = annotate_model_with_configuration(&mut repository, &mut environment(), &config);

    assert_eq!(failures.len(), 1);
    assert_eq!(domain_entity(&repository, "EdFi", "DomainEntityName").as_deref(), Some("info"));
    assert_eq!(domain_entity(&repository, "EdFi", "Other").as_deref(), Some("info"));
    assert_eq!(domain_entity(&repository, "Sample", "DomainEntityName"), None);
}

#[test]
fn unknown_entity_type_is_reported() {
    let mut repository = model();
    let config = config(json!([{
        "rule": "rule123",
        "matches": { "entity": "table" },
        "data": {}
    }]));

    let failures = annotate_model_with_configuration(&mut repository, &mut environment(), &config);

    assert_eq!(failures.len(), 1);
    assert!(failures[0].message.contains("entity type 'table'"));
}

#[test]
fn merge_json_rules() {
    let mut target = json!({ "a": { "b": 1, "list": [1] }, "c": "old" });
    merge_json(&mut target, &json!({ "a": { "d": 2, "list": [2] }, "c": "new" }));
    assert_eq!(target, json!({ "a": { "b": 1, "list": [1, 2], "d": 2 }, "c": "new" }));
}
