//! MetaEd semantic resolution: path resolution, dependency ordering and the
//! plugin pipeline over an [`EntityRepository`].
//!
//! # Example
//!
//! ```
//! use metaed_core::{Entity, EntityKind, EntityRepository, Namespace, Property, PropertyKind};
//! use metaed_lib::resolve::{PropertyFilter, find_referenced_property};
//!
//! let mut repository = EntityRepository::new();
//! repository.add_namespace(Namespace::new("EdFi")).unwrap();
//! let student = Entity::new(EntityKind::DomainEntity, "EdFi", "Student")
//!     .with_property(Property::identity(PropertyKind::String, "StudentUniqueId"));
//! let key = repository.add_entity(student).unwrap();
//!
//! let start = repository.entity(&key).unwrap();
//! let found = find_referenced_property(&repository, start, &["StudentUniqueId"], PropertyFilter::All);
//! assert!(found.is_some());
//! ```

#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

use std::path::PathBuf;

pub mod diagnostics;
pub mod graph;
pub mod pipeline;
pub mod plugins;
pub mod resolve;

pub use diagnostics::{Category, Failures, PipelineFailure, ValidationFailure};
pub use metaed_core::{EntityRepository, RepositoryError};
pub use pipeline::{Pipeline, PipelineOptions, PipelineOutcome, PipelineState};

/// Fatal errors that end a pipeline run.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error("invalid configuration: {0}")]
    Configuration(String),

    #[error("configuration is not valid JSON")]
    ConfigurationParse(#[from] serde_json::Error),

    /// A project names a namespace the model does not declare.
    #[error("project `{project}` names unknown namespace `{namespace}`")]
    UnknownProjectNamespace { project: String, namespace: String },

    #[error("extension namespaces {0:?} have no core namespace to depend on")]
    MissingCoreNamespace(Vec<String>),

    #[error("failed to load model files: {0}")]
    FileLoad(String),

    /// The output root exists, is not empty, and is not a marked output directory.
    #[error("refusing to clear `{}`: not a MetaEdOutput directory", path.display())]
    UnsafeOutputDirectory { path: PathBuf },

    #[error("failed to write `{}`", path.display())]
    OutputWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Result type for pipeline operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error raised by a plugin's enhancer or generator.
///
/// Caught at the plugin boundary and reported as a [`PipelineFailure`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct PluginError {
    pub message: String,
}

impl PluginError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl From<String> for PluginError {
    fn from(message: String) -> Self {
        Self { message }
    }
}

impl From<&str> for PluginError {
    fn from(message: &str) -> Self {
        Self::new(message)
    }
}

impl From<serde_json::Error> for PluginError {
    fn from(error: serde_json::Error) -> Self {
        Self::new(error.to_string())
    }
}
