use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::plugin_config::PluginConfiguration;

/// Fallback target technology version for plugins without an override.
pub const DEFAULT_PLUGIN_TECH_VERSION: &str = "7.1.0";

/// Which phases a run executes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PipelineOptions {
    pub run_validators: bool,
    pub run_enhancers: bool,
    pub run_generators: bool,
    /// Abort the plugin loop after the first plugin whose validators report an error.
    pub stop_on_validation_failure: bool,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            run_validators: true,
            run_enhancers: true,
            run_generators: true,
            stop_on_validation_failure: true,
        }
    }
}

impl PipelineOptions {
    pub fn with_validators(mut self, value: bool) -> Self {
        self.run_validators = value;
        self
    }

    pub fn with_enhancers(mut self, value: bool) -> Self {
        self.run_enhancers = value;
        self
    }

    pub fn with_generators(mut self, value: bool) -> Self {
        self.run_generators = value;
        self
    }

    pub fn with_stop_on_validation_failure(mut self, value: bool) -> Self {
        self.stop_on_validation_failure = value;
        self
    }
}

/// Metadata for the project that owns one namespace.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ProjectConfiguration {
    pub namespace_name: String,
    pub project_name: String,
    pub project_version: String,
    /// Empty for the core project.
    pub project_extension: String,
    pub description: String,
}

impl ProjectConfiguration {
    pub fn new(namespace_name: impl Into<String>, project_name: impl Into<String>) -> Self {
        Self {
            namespace_name: namespace_name.into(),
            project_name: project_name.into(),
            ..Self::default()
        }
    }

    pub fn with_extension(mut self, project_extension: impl Into<String>) -> Self {
        self.project_extension = project_extension.into();
        self
    }

    pub fn with_version(mut self, project_version: impl Into<String>) -> Self {
        self.project_version = project_version.into();
        self
    }

    pub fn is_extension(&self) -> bool {
        !self.project_extension.is_empty()
    }
}

/// Run-wide configuration, usually read from a JSON file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MetaEdConfiguration {
    pub projects: Vec<ProjectConfiguration>,
    pub default_plugin_tech_version: String,
    /// Per-plugin target technology version overrides, by short name.
    pub plugin_tech_versions: IndexMap<String, String>,
    /// Per-plugin configuration rules, by short name.
    pub plugin_config: IndexMap<String, PluginConfiguration>,
    /// Root for generated output. Empty means nothing is written.
    pub artifact_directory: String,
}

impl Default for MetaEdConfiguration {
    fn default() -> Self {
        Self {
            projects: Vec::new(),
            default_plugin_tech_version: DEFAULT_PLUGIN_TECH_VERSION.to_owned(),
            plugin_tech_versions: IndexMap::new(),
            plugin_config: IndexMap::new(),
            artifact_directory: String::new(),
        }
    }
}

impl MetaEdConfiguration {
    pub fn from_json(json: &str) -> crate::Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        if config.default_plugin_tech_version.trim().is_empty() {
            return Err(crate::Error::Configuration(
                "defaultPluginTechVersion must not be empty".to_owned(),
            ));
        }
        Ok(config)
    }

    pub fn with_project(mut self, project: ProjectConfiguration) -> Self {
        self.projects.push(project);
        self
    }

    pub fn with_plugin_tech_version(
        mut self,
        short_name: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        self.plugin_tech_versions.insert(short_name.into(), version.into());
        self
    }

    pub fn with_plugin_config(
        mut self,
        short_name: impl Into<String>,
        config: PluginConfiguration,
    ) -> Self {
        self.plugin_config.insert(short_name.into(), config);
        self
    }

    pub fn with_artifact_directory(mut self, directory: impl Into<String>) -> Self {
        self.artifact_directory = directory.into();
        self
    }

    pub fn project_for(&self, namespace_name: &str) -> Option<&ProjectConfiguration> {
        self.projects
            .iter()
            .find(|project| project.namespace_name == namespace_name)
    }
}
