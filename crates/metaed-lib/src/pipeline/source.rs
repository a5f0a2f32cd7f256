use metaed_core::EntityRepository;

use crate::Result;
use crate::diagnostics::{FileIndex, ValidationFailure};

/// Supplies the model a run works on.
///
/// Loading and parsing happen outside this crate; a source only has to hand
/// over the loaded files and a populated repository.
pub trait ModelSource {
    /// Loads model files. Failure is fatal for the run.
    fn load_files(&mut self) -> Result<FileIndex>;

    /// Populates `repository`, returning syntax and declaration failures.
    fn build_model(&mut self, repository: &mut EntityRepository) -> Result<Vec<ValidationFailure>>;
}

/// A model that was assembled in memory.
#[derive(Debug, Default)]
pub struct PrebuiltModel {
    repository: Option<EntityRepository>,
    files: FileIndex,
    failures: Vec<ValidationFailure>,
}

impl PrebuiltModel {
    pub fn new(repository: EntityRepository) -> Self {
        Self {
            repository: Some(repository),
            ..Self::default()
        }
    }

    /// Source text the failures' line numbers refer to.
    pub fn with_files(mut self, files: FileIndex) -> Self {
        self.files = files;
        self
    }

    /// Failures reported while the model was built.
    pub fn with_failures(mut self, failures: Vec<ValidationFailure>) -> Self {
        self.failures = failures;
        self
    }
}

impl ModelSource for PrebuiltModel {
    fn load_files(&mut self) -> Result<FileIndex> {
        Ok(std::mem::take(&mut self.files))
    }

    fn build_model(&mut self, repository: &mut EntityRepository) -> Result<Vec<ValidationFailure>> {
        if let Some(prebuilt) = self.repository.take() {
            *repository = prebuilt;
        }
        Ok(std::mem::take(&mut self.failures))
    }
}
