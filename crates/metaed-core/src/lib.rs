#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! Core data model for MetaEd semantic resolution.
//!
//! Three layers:
//! - **Declarations**: [`Entity`], [`Property`] and [`MergeDirective`] as produced
//!   by parse-tree builders.
//! - **Partitioning**: [`Namespace`] groups entities by kind, with explicit
//!   extension → core dependency edges.
//! - **Lookup**: [`EntityRepository`] resolves names across namespace chains.

mod entity;
mod namespace;
mod plugin_data;
mod property;
mod repository;
mod source;


pub use entity::{Entity, EntityItem, EntityKey, EntityKind};
pub use namespace::Namespace;
pub use plugin_data::PluginData;
pub use property::{MergeDirective, Property, PropertyKind};
pub use repository::{EntityRepository, RepositoryError, split_qualified_name};
pub use source::SourceSpan;

/// Result type for repository operations.
pub type Result<T> = std::result::Result<T, RepositoryError>;
