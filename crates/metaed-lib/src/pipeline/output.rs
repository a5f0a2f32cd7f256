use std::fs;
use std::path::{Path, PathBuf};

use super::config::MetaEdConfiguration;
use super::plugin::GeneratorResult;
use crate::{Error, Result};

/// Directory name that marks an output root as safe to clear.
pub const OUTPUT_MARKER: &str = "MetaEdOutput";

/// Persists generator results at the end of a successful run.
pub trait OutputWriter {
    fn write(&mut self, results: &[GeneratorResult]) -> Result<()>;
}

/// Writes each output to `root/<namespace>/<folder_name>/<file_name>`.
#[derive(Debug, Clone)]
pub struct DirectoryOutputWriter {
    root: PathBuf,
}

impl DirectoryOutputWriter {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Writer rooted at the configured `artifactDirectory`, if one is set.
    pub fn from_config(config: &MetaEdConfiguration) -> Option<Self> {
        let directory = config.artifact_directory.trim();
        if directory.is_empty() {
            return None;
        }
        Some(Self::new(directory))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn is_marked(&self) -> bool {
        self.root
            .file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| name.contains(OUTPUT_MARKER))
    }

    /// Clears a marked root; refuses to touch an unmarked one that has content.
    fn prepare_root(&self) -> Result<()> {
        let io_error = |source| Error::OutputWrite {
            path: self.root.clone(),
            source,
        };

        if self.is_marked() {
            if self.root.exists() {
                tracing::debug!(root = %self.root.display(), "clearing output directory");
                fs::remove_dir_all(&self.root).map_err(io_error)?;
            }
        } else if self.root.exists() && fs::read_dir(&self.root).map_err(io_error)?.next().is_some() {
            return Err(Error::UnsafeOutputDirectory {
                path: self.root.clone(),
            });
        }

        fs::create_dir_all(&self.root).map_err(io_error)
    }
}

impl OutputWriter for DirectoryOutputWriter {
    fn write(&mut self, results: &[GeneratorResult]) -> Result<()> {
        self.prepare_root()?;

        let mut written = 0usize;
        for output in results.iter().flat_map(|result| &result.generated_output) {
            let directory = self.root.join(&output.namespace).join(&output.folder_name);
            fs::create_dir_all(&directory).map_err(|source| Error::OutputWrite {
                path: directory.clone(),
                source,
            })?;

            let path = directory.join(&output.file_name);
            fs::write(&path, &output.result_string)
                .map_err(|source| Error::OutputWrite { path, source })?;
            written += 1;
        }

        tracing::info!(root = %self.root.display(), files = written, "wrote generated output");
        Ok(())
    }
}
