use std::fmt;

use metaed_core::SourceSpan;
use serde::{Deserialize, Serialize};

use super::file_index::FileLocation;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    #[default]
    Error,
    Warning,
    Info,
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Category::Error => write!(f, "error"),
            Category::Warning => write!(f, "warning"),
            Category::Info => write!(f, "info"),
        }
    }
}

/// A data-driven problem found in the model.
///
/// Immutable after creation, except that `file_map` is backfilled once from
/// `source_map` when file indexing becomes available.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationFailure {
    pub validator_name: String,
    pub category: Category,
    pub message: String,
    pub source_map: Option<SourceSpan>,
    pub file_map: Option<FileLocation>,
}

impl ValidationFailure {
    pub fn new(
        validator_name: impl Into<String>,
        category: Category,
        message: impl Into<String>,
    ) -> Self {
        Self {
            validator_name: validator_name.into(),
            category,
            message: message.into(),
            source_map: None,
            file_map: None,
        }
    }

    pub fn error(validator_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(validator_name, Category::Error, message)
    }

    pub fn warning(validator_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(validator_name, Category::Warning, message)
    }

    pub fn info(validator_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(validator_name, Category::Info, message)
    }

    /// Attaches the declaration token this failure points at.
    pub fn at(mut self, span: &SourceSpan) -> Self {
        if !span.is_unknown() {
            self.source_map = Some(span.clone());
        }
        self
    }

    pub fn is_error(&self) -> bool {
        self.category == Category::Error
    }

    pub fn is_warning(&self) -> bool {
        self.category == Category::Warning
    }
}

impl fmt::Display for ValidationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}]: {}", self.category, self.validator_name, self.message)?;
        match (&self.file_map, &self.source_map) {
            (Some(location), _) => write!(f, " ({location})")?,
            (None, Some(span)) => write!(f, " (line {}, column {})", span.line, span.column)?,
            (None, None) => {}
        }
        Ok(())
    }
}

/// A plugin phase that raised an error or panicked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineFailure {
    pub plugin_short_name: String,
    pub category: Category,
    pub message: String,
}

impl PipelineFailure {
    pub fn error(plugin_short_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            plugin_short_name: plugin_short_name.into(),
            category: Category::Error,
            message: message.into(),
        }
    }
}

impl fmt::Display for PipelineFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} in plugin {}: {}", self.category, self.plugin_short_name, self.message)
    }
}
