//! `edfiUnifiedAdvanced`: merge directive checks.
//!
//! A merge directive on a reference property asserts that a value reached
//! through that reference equals one the owning entity already carries.
//! Both paths are resolved from the owning entity; after the first segment
//! only identity properties may be followed.

use metaed_core::{Entity, EntityRepository, MergeDirective, Property, PropertyKind};

use crate::diagnostics::ValidationFailure;
use crate::pipeline::{PluginEnvironment, PluginManifest};
use crate::resolve::{
    PropertyFilter, ResolvedProperty, find_referenced_property, is_same_or_subclass,
    referenced_entity,
};

pub const SHORT_NAME: &str = "edfiUnifiedAdvanced";

pub fn manifest() -> PluginManifest {
    PluginManifest::new(SHORT_NAME)
        .with_validator(
            "MergeDirectiveMustStartSourcePathWithPropertyName",
            merge_directive_must_start_source_path_with_property_name,
        )
        .with_validator("SourcePropertyPathMustExist", source_property_path_must_exist)
        .with_validator("TargetPropertyPathMustExist", target_property_path_must_exist)
        .with_validator(
            "SourcePropertyAndTargetPropertyMustMatch",
            source_property_and_target_property_must_match,
        )
}

/// A merge directive together with the property and entity declaring it.
struct Merge<'r> {
    entity: &'r Entity,
    property: &'r Property,
    directive: &'r MergeDirective,
}

fn merges(repository: &EntityRepository) -> impl Iterator<Item = Merge<'_>> {
    repository
        .namespaces()
        .flat_map(|namespace| namespace.entities())
        .flat_map(|entity| {
            entity.properties.iter().flat_map(move |property| {
                property.merge_directives.iter().map(move |directive| Merge {
                    entity,
                    property,
                    directive,
                })
            })
        })
}

fn resolve<'r>(
    repository: &'r EntityRepository,
    entity: &'r Entity,
    path: &str,
) -> Option<ResolvedProperty<'r>> {
    let segments: Vec<&str> = path.split('.').collect();
    find_referenced_property(repository, entity, &segments, PropertyFilter::AllButFirstAsIdentity)
}

pub fn merge_directive_must_start_source_path_with_property_name(
    repository: &EntityRepository,
    _: &PluginEnvironment,
) -> Vec<ValidationFailure> {
    merges(repository)
        .filter(|merge| {
            matches!(
                merge.property.kind,
                PropertyKind::DomainEntity | PropertyKind::Association
            )
        })
        .filter_map(|merge| {
            let expected = merge.property.full_name();
            let first = merge.directive.source_path()[0];
            (first != expected).then(|| {
                ValidationFailure::error(
                    "MergeDirectiveMustStartSourcePathWithPropertyName",
                    format!(
                        "Merge directive source path '{}' must start with '{expected}', the property it is declared on.",
                        merge.directive.source_property_path,
                    ),
                )
                .at(&merge.directive.source)
            })
        })
        .collect()
}

pub fn source_property_path_must_exist(
    repository: &EntityRepository,
    _: &PluginEnvironment,
) -> Vec<ValidationFailure> {
    merges(repository)
        .filter(|merge| {
            resolve(repository, merge.entity, &merge.directive.source_property_path).is_none()
        })
        .map(|merge| {
            ValidationFailure::error(
                "SourcePropertyPathMustExist",
                format!(
                    "Merge directive source path '{}' on '{}' does not resolve to a property.",
                    merge.directive.source_property_path, merge.entity.name,
                ),
            )
            .at(&merge.directive.source)
        })
        .collect()
}

pub fn target_property_path_must_exist(
    repository: &EntityRepository,
    _: &PluginEnvironment,
) -> Vec<ValidationFailure> {
    merges(repository)
        .filter(|merge| {
            resolve(repository, merge.entity, &merge.directive.target_property_path).is_none()
        })
        .map(|merge| {
            ValidationFailure::error(
                "TargetPropertyPathMustExist",
                format!(
                    "Merge directive target path '{}' on '{}' does not resolve to a property.",
                    merge.directive.target_property_path, merge.entity.name,
                ),
            )
            .at(&merge.directive.source)
        })
        .collect()
}

/// Unresolvable paths are left to the two existence checks.
pub fn source_property_and_target_property_must_match(
    repository: &EntityRepository,
    _: &PluginEnvironment,
) -> Vec<ValidationFailure> {
    let mut failures = Vec::new();
    for merge in merges(repository) {
        let source = resolve(repository, merge.entity, &merge.directive.source_property_path);
        let target = resolve(repository, merge.entity, &merge.directive.target_property_path);
        let (Some(source), Some(target)) = (source, target) else {
            continue;
        };
        if resolved_properties_match(repository, source, target) {
            continue;
        }
        failures.push(
            ValidationFailure::error(
                "SourcePropertyAndTargetPropertyMustMatch",
                format!(
                    "Merge directive source '{}' ({}) and target '{}' ({}) on '{}' do not refer to the same type.",
                    merge.directive.source_property_path,
                    source.property.kind,
                    merge.directive.target_property_path,
                    target.property.kind,
                    merge.entity.name,
                ),
            )
            .at(&merge.directive.source),
        );
    }
    failures
}

fn resolved_properties_match(
    repository: &EntityRepository,
    source: ResolvedProperty<'_>,
    target: ResolvedProperty<'_>,
) -> bool {
    let kind = source.property.kind;
    if kind != target.property.kind {
        return false;
    }
    if !kind.is_reference() {
        return true;
    }

    let source_entity = referenced_entity(repository, source.property, source.owner);
    let target_entity = referenced_entity(repository, target.property, target.owner);
    match (kind, source_entity, target_entity) {
        (PropertyKind::DomainEntity | PropertyKind::Association, Some(a), Some(b)) => {
            is_same_or_subclass(repository, a, b)
        }
        (PropertyKind::DomainEntity | PropertyKind::Association, _, _) => false,
        (_, Some(a), Some(b)) => a.key() == b.key(),
        _ => source.property.referenced_entity == target.property.referenced_entity,
    }
}
