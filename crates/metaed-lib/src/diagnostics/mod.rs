//! Uniform failure records shared by validators, the pipeline, and output.

mod collection;
mod failure;
mod file_index;
mod printer;


pub use collection::Failures;
pub use failure::{Category, PipelineFailure, ValidationFailure};
pub use file_index::{FileIndex, FileLocation, file_map_for_validation_failure};
pub use printer::FailurePrinter;
