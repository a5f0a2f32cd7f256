//! `edfiUnified`: every reference in the model must name a declared entity.
//!
//! One validator per reference kind, plus base-entity and interchange-element
//! checks. Lookups follow the owning entity's namespace chain, so an
//! extension may reference core entities but not the other way round. The
//! enhancers in [`super::connect`] then record what each name resolved to.

use metaed_core::{Entity, EntityKind, EntityRepository, PropertyKind};

use super::{connect, searched_namespaces};
use crate::diagnostics::ValidationFailure;
use crate::pipeline::{PluginEnvironment, PluginManifest};
use crate::resolve::referenced_entity;

pub const SHORT_NAME: &str = "edfiUnified";

/// Kinds an interchange element may name.
pub const INTERCHANGE_ELEMENT_KINDS: [EntityKind; 5] = [
    EntityKind::DomainEntity,
    EntityKind::DomainEntitySubclass,
    EntityKind::Association,
    EntityKind::AssociationSubclass,
    EntityKind::Descriptor,
];

/// A property kind and the wording used when its target is missing.
#[derive(Debug)]
struct ReferenceRule {
    validator_name: &'static str,
    property_kind: PropertyKind,
    property_label: &'static str,
    target_label: &'static str,
}

static REFERENCE_RULES: [ReferenceRule; 11] = [
    ReferenceRule {
        validator_name: "DomainEntityPropertyMustMatchADomainEntity",
        property_kind: PropertyKind::DomainEntity,
        property_label: "Domain Entity",
        target_label: "Domain Entity or Domain Entity Subclass",
    },
    ReferenceRule {
        validator_name: "AssociationPropertyMustMatchAnAssociation",
        property_kind: PropertyKind::Association,
        property_label: "Association",
        target_label: "Association or Association Subclass",
    },
    ReferenceRule {
        validator_name: "CommonPropertyMustMatchACommon",
        property_kind: PropertyKind::Common,
        property_label: "Common",
        target_label: "Common",
    },
    ReferenceRule {
        validator_name: "InlineCommonPropertyMustMatchAnInlineCommon",
        property_kind: PropertyKind::InlineCommon,
        property_label: "Inline Common",
        target_label: "Inline Common",
    },
    ReferenceRule {
        validator_name: "ChoicePropertyMustMatchAChoice",
        property_kind: PropertyKind::Choice,
        property_label: "Choice",
        target_label: "Choice",
    },
    ReferenceRule {
        validator_name: "DescriptorPropertyMustMatchADescriptor",
        property_kind: PropertyKind::Descriptor,
        property_label: "Descriptor",
        target_label: "Descriptor",
    },
    ReferenceRule {
        validator_name: "EnumerationPropertyMustMatchAnEnumeration",
        property_kind: PropertyKind::Enumeration,
        property_label: "Enumeration",
        target_label: "Enumeration",
    },
    ReferenceRule {
        validator_name: "SharedDecimalPropertyMustMatchASharedDecimal",
        property_kind: PropertyKind::SharedDecimal,
        property_label: "Shared Decimal",
        target_label: "Shared Decimal",
    },
    ReferenceRule {
        validator_name: "SharedIntegerPropertyMustMatchASharedInteger",
        property_kind: PropertyKind::SharedInteger,
        property_label: "Shared Integer",
        target_label: "Shared Integer",
    },
    ReferenceRule {
        validator_name: "SharedShortPropertyMustMatchASharedShort",
        property_kind: PropertyKind::SharedShort,
        property_label: "Shared Short",
        target_label: "Shared Short",
    },
    ReferenceRule {
        validator_name: "SharedStringPropertyMustMatchASharedString",
        property_kind: PropertyKind::SharedString,
        property_label: "Shared String",
        target_label: "Shared String",
    },
];

pub fn manifest() -> PluginManifest {
    let mut manifest = PluginManifest::new(SHORT_NAME);
    for rule in &REFERENCE_RULES {
        manifest = manifest.with_validator(rule.validator_name, move |repository, _| {
            property_must_match(repository, rule)
        });
    }
    manifest
        .with_validator("SubclassMustMatchABaseEntity", subclass_must_match_a_base_entity)
        .with_validator(
            "InterchangeElementMustMatchADomainEntityOrAssociationOrSubclass",
            interchange_element_must_match,
        )
        .with_enhancer("MergeDirectiveEnhancer", connect::merge_directive_enhancer)
        .with_enhancer("DomainItemEnhancer", connect::domain_item_enhancer)
        .with_enhancer("InterchangeItemEnhancer", connect::interchange_item_enhancer)
}

fn property_must_match(repository: &EntityRepository, rule: &ReferenceRule) -> Vec<ValidationFailure> {
    let mut failures = Vec::new();
    for namespace in repository.namespaces() {
        for entity in namespace.entities() {
            for property in &entity.properties {
                if property.kind != rule.property_kind
                    || referenced_entity(repository, property, entity).is_some()
                {
                    continue;
                }
                let target = property.referenced_entity.as_deref().unwrap_or(&property.name);
                failures.push(
                    ValidationFailure::error(
                        rule.validator_name,
                        format!(
                            "{} property '{target}' does not match any declared {} in namespaces {}.",
                            rule.property_label,
                            rule.target_label,
                            searched_namespaces(repository, &entity.namespace),
                        ),
                    )
                    .at(&property.source),
                );
            }
        }
    }
    failures
}

pub fn subclass_must_match_a_base_entity(
    repository: &EntityRepository,
    _: &PluginEnvironment,
) -> Vec<ValidationFailure> {
    repository
        .namespaces()
        .flat_map(|namespace| namespace.entities())
        .filter(|entity| entity.kind.is_subclass() || entity.kind.is_extension())
        .filter(|entity| repository.base_entity(entity).is_none())
        .map(|entity| missing_base(repository, entity))
        .collect()
}

fn missing_base(repository: &EntityRepository, entity: &Entity) -> ValidationFailure {
    let base = entity.base_entity_name.as_deref().unwrap_or_default();
    let base_kinds = entity
        .kind
        .base_kinds()
        .iter()
        .map(EntityKind::display_name)
        .collect::<Vec<_>>()
        .join(" or ");
    ValidationFailure::error(
        "SubclassMustMatchABaseEntity",
        format!(
            "{} '{}' based on '{base}' does not match any declared {base_kinds} in namespaces {}.",
            entity.kind.display_name(),
            entity.name,
            searched_namespaces(repository, &entity.namespace),
        ),
    )
    .at(&entity.source)
}

pub fn interchange_element_must_match(
    repository: &EntityRepository,
    _: &PluginEnvironment,
) -> Vec<ValidationFailure> {
    let mut failures = Vec::new();
    for interchange in
        repository.entities_of_kind(&[EntityKind::Interchange, EntityKind::InterchangeExtension])
    {
        for item in &interchange.items {
            let found = repository.entity_from_namespace_chain(
                &item.name,
                item.namespace.as_deref(),
                &interchange.namespace,
                &INTERCHANGE_ELEMENT_KINDS,
            );
            if found.is_some() {
                continue;
            }
            failures.push(
                ValidationFailure::error(
                    "InterchangeElementMustMatchADomainEntityOrAssociationOrSubclass",
                    format!(
                        "Interchange element '{}' on '{}' does not match any declared Domain Entity, Association, Descriptor or subclass in namespaces {}.",
                        item.name,
                        interchange.name,
                        searched_namespaces(repository, &interchange.namespace),
                    ),
                )
                .at(&item.source),
            );
        }
    }
    failures
}
