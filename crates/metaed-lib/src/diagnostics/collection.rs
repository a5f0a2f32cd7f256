//! Validation failures reported during one run, in report order.

use super::failure::ValidationFailure;
use super::file_index::{FileIndex, file_map_for_validation_failure};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Failures(Vec<ValidationFailure>);

impl Failures {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, failure: ValidationFailure) {
        self.0.push(failure);
    }

    pub fn extend(&mut self, failures: impl IntoIterator<Item = ValidationFailure>) {
        self.0.extend(failures);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ValidationFailure> {
        self.0.iter()
    }

    /// Failures that stop the pipeline when `stop_on_validation_failure` is set.
    pub fn errors(&self) -> impl Iterator<Item = &ValidationFailure> {
        self.0.iter().filter(|f| f.is_error())
    }

    pub fn error_count(&self) -> usize {
        self.errors().count()
    }

    pub fn warning_count(&self) -> usize {
        self.0.iter().filter(|f| f.is_warning()).count()
    }

    pub fn by_validator<'a>(&'a self, validator_name: &'a str) -> impl Iterator<Item = &'a ValidationFailure> {
        self.0.iter().filter(move |f| f.validator_name == validator_name)
    }

    /// Fills in `file_map` for every failure that has a span but no file location yet.
    pub fn locate(&mut self, files: &FileIndex) {
        file_map_for_validation_failure(&mut self.0, files);
    }
}

impl FromIterator<ValidationFailure> for Failures {
    fn from_iter<T: IntoIterator<Item = ValidationFailure>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}
