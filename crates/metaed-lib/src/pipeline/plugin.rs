use std::fmt;

use metaed_core::EntityRepository;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::PluginError;
use crate::diagnostics::ValidationFailure;

pub type ValidatorFn = dyn Fn(&EntityRepository, &PluginEnvironment) -> Vec<ValidationFailure>;
pub type EnhancerFn =
    dyn Fn(&mut EntityRepository, &PluginEnvironment) -> Result<(), PluginError>;
pub type GeneratorFn =
    dyn Fn(&EntityRepository, &PluginEnvironment) -> Result<GeneratorResult, PluginError>;

/// A named plugin function, run in declaration order within its phase.
pub struct Named<F: ?Sized> {
    pub name: String,
    pub run: Box<F>,
}

impl<F: ?Sized> fmt::Debug for Named<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Named").field("name", &self.name).finish_non_exhaustive()
    }
}

pub type Validator = Named<ValidatorFn>;
pub type Enhancer = Named<EnhancerFn>;
pub type Generator = Named<GeneratorFn>;

/// What a plugin contributes to a run.
#[derive(Debug)]
pub struct PluginManifest {
    pub short_name: String,
    /// Used when the configuration has no override for this plugin.
    pub default_target_version: Option<String>,
    /// Target technology versions this plugin supports; `None` accepts any.
    pub target_version_range: Option<String>,
    pub validators: Vec<Validator>,
    pub enhancers: Vec<Enhancer>,
    pub generators: Vec<Generator>,
}

impl PluginManifest {
    pub fn new(short_name: impl Into<String>) -> Self {
        Self {
            short_name: short_name.into(),
            default_target_version: None,
            target_version_range: None,
            validators: Vec::new(),
            enhancers: Vec::new(),
            generators: Vec::new(),
        }
    }

    pub fn with_default_target_version(mut self, version: impl Into<String>) -> Self {
        self.default_target_version = Some(version.into());
        self
    }

    pub fn with_target_version_range(mut self, range: impl Into<String>) -> Self {
        self.target_version_range = Some(range.into());
        self
    }

    pub fn with_validator<F>(mut self, name: impl Into<String>, validator: F) -> Self
    where
        F: Fn(&EntityRepository, &PluginEnvironment) -> Vec<ValidationFailure> + 'static,
    {
        self.validators.push(Named {
            name: name.into(),
            run: Box::new(validator),
        });
        self
    }

    pub fn with_enhancer<F>(mut self, name: impl Into<String>, enhancer: F) -> Self
    where
        F: Fn(&mut EntityRepository, &PluginEnvironment) -> Result<(), PluginError> + 'static,
    {
        self.enhancers.push(Named {
            name: name.into(),
            run: Box::new(enhancer),
        });
        self
    }

    pub fn with_generator<F>(mut self, name: impl Into<String>, generator: F) -> Self
    where
        F: Fn(&EntityRepository, &PluginEnvironment) -> Result<GeneratorResult, PluginError>
            + 'static,
    {
        self.generators.push(Named {
            name: name.into(),
            run: Box::new(generator),
        });
        self
    }
}

/// Per-plugin run state handed to every phase function.
#[derive(Debug, Clone, PartialEq)]
pub struct PluginEnvironment {
    pub short_name: String,
    pub target_technology_version: String,
    /// Model-wide settings merged from configuration rules without `matches`.
    pub config: Value,
}

impl PluginEnvironment {
    pub fn new(short_name: impl Into<String>, target_technology_version: impl Into<String>) -> Self {
        Self {
            short_name: short_name.into(),
            target_technology_version: target_technology_version.into(),
            config: Value::Object(serde_json::Map::new()),
        }
    }
}

/// One artifact produced by a generator.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedOutput {
    pub name: String,
    pub namespace: String,
    pub folder_name: String,
    pub file_name: String,
    pub result_string: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratorResult {
    pub generator_name: String,
    pub generated_output: Vec<GeneratedOutput>,
}

impl GeneratorResult {
    pub fn new(generator_name: impl Into<String>) -> Self {
        Self {
            generator_name: generator_name.into(),
            generated_output: Vec::new(),
        }
    }

    pub fn with_output(mut self, output: GeneratedOutput) -> Self {
        self.generated_output.push(output);
        self
    }
}
