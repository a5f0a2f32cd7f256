//! Plugin pipeline: load, build, initialize namespaces, then run each plugin's
//! validators, enhancers and generators in caller order.
//!
//! Plugin code never aborts a run. Errors and panics raised inside a phase
//! function are caught at the plugin boundary and recorded as
//! [`PipelineFailure`]s; the rest of that plugin is skipped and the next
//! plugin runs. Only three things end a run early: a fatal [`Error`] while
//! loading or writing, a model-building error, or a validator error with
//! `stop_on_validation_failure` set.

mod config;
mod namespaces;
mod output;
mod plugin;
mod plugin_config;
mod source;
mod state;
mod version;

#[cfg(test)]
mod output_tests;
#[cfg(test)]
mod pipeline_tests;
#[cfg(test)]
mod plugin_config_tests;

use std::any::Any;
use std::panic::{AssertUnwindSafe, catch_unwind};

use metaed_core::EntityRepository;

pub use config::{
    DEFAULT_PLUGIN_TECH_VERSION, MetaEdConfiguration, PipelineOptions, ProjectConfiguration,
};
pub use namespaces::initialize_namespaces;
pub use output::{DirectoryOutputWriter, OUTPUT_MARKER, OutputWriter};
pub use plugin::{
    Enhancer, EnhancerFn, GeneratedOutput, Generator, GeneratorFn, GeneratorResult, Named,
    PluginEnvironment, PluginManifest, Validator, ValidatorFn,
};
pub use plugin_config::{
    ConfigurationMatches, ConfigurationRule, OneOrMany, PluginConfiguration,
    annotate_model_with_configuration, merge_json,
};
pub use source::{ModelSource, PrebuiltModel};
pub use state::PipelineState;
pub use version::{
    DISABLED, InvalidVersion, Version, is_disabled, target_technology_version_for,
    version_satisfies,
};

use crate::diagnostics::{Failures, FileIndex, PipelineFailure, ValidationFailure};
use crate::{Error, PluginError};

/// Everything a finished run produced.
#[derive(Debug)]
pub struct PipelineOutcome {
    pub final_state: PipelineState,
    /// Set when the run aborted, a plugin failed, or a fatal error occurred.
    pub failure: bool,
    pub validation_failures: Failures,
    pub pipeline_failures: Vec<PipelineFailure>,
    pub generator_results: Vec<GeneratorResult>,
    pub repository: EntityRepository,
    pub files: FileIndex,
    /// The error that ended the run, if one did.
    pub fatal_error: Option<Error>,
}

/// Ordered plugins plus the configuration they run under.
#[derive(Debug)]
pub struct Pipeline {
    plugins: Vec<PluginManifest>,
    config: MetaEdConfiguration,
    options: PipelineOptions,
    state: PipelineState,
}

impl Pipeline {
    pub fn new(config: MetaEdConfiguration) -> Self {
        Self {
            plugins: Vec::new(),
            config,
            options: PipelineOptions::default(),
            state: PipelineState::Initialized,
        }
    }

    pub fn with_options(mut self, options: PipelineOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_plugin(mut self, manifest: PluginManifest) -> Self {
        self.plugins.push(manifest);
        self
    }

    pub fn with_plugins(mut self, manifests: impl IntoIterator<Item = PluginManifest>) -> Self {
        self.plugins.extend(manifests);
        self
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    pub fn options(&self) -> PipelineOptions {
        self.options
    }

    pub fn config(&self) -> &MetaEdConfiguration {
        &self.config
    }

    pub fn plugins(&self) -> &[PluginManifest] {
        &self.plugins
    }

    /// Runs every stage once.
    ///
    /// `writer` receives the generator results only when generators ran and
    /// no plugin failed.
    pub fn run(
        &mut self,
        source: &mut dyn ModelSource,
        writer: Option<&mut dyn OutputWriter>,
    ) -> PipelineOutcome {
        let mut run = Run::default();
        tracing::info!(plugins = self.plugins.len(), "starting pipeline run");
        run.transition(PipelineState::PluginsLoaded);

        let outcome = match self.execute(&mut run, source, writer) {
            Ok(()) => run.finish(),
            Err(error) => {
                tracing::error!(%error, state = %run.state, "pipeline run aborted");
                run.fatal(error)
            }
        };
        self.state = outcome.final_state;
        outcome
    }

    fn execute(
        &self,
        run: &mut Run,
        source: &mut dyn ModelSource,
        writer: Option<&mut dyn OutputWriter>,
    ) -> Result<(), Error> {
        run.files = source.load_files()?;
        run.transition(PipelineState::FilesLoaded);

        let build_failures = source.build_model(&mut run.repository)?;
        run.transition(PipelineState::ParseTreeBuilt);
        let build_has_errors = build_failures.iter().any(ValidationFailure::is_error);
        run.failures.extend(build_failures);
        run.transition(PipelineState::ModelBuilt);

        if build_has_errors && self.options.stop_on_validation_failure {
            tracing::warn!(errors = run.failures.error_count(), "model has errors; skipping plugins");
            run.aborted = true;
            return Ok(());
        }

        initialize_namespaces(&mut run.repository, &self.config)?;
        run.transition(PipelineState::NamespacesInitialized);

        for manifest in &self.plugins {
            let Some(mut environment) = self.environment_for(manifest) else {
                continue;
            };

            if let Some(plugin_config) = self.config.plugin_config.get(&manifest.short_name) {
                let config_failures = annotate_model_with_configuration(
                    &mut run.repository,
                    &mut environment,
                    plugin_config,
                );
                run.failures.extend(config_failures);
            }

            match self.run_plugin(run, manifest, &environment) {
                Ok(PluginStep::Continue) => {}
                Ok(PluginStep::Abort) => {
                    tracing::warn!(
                        plugin = %manifest.short_name,
                        errors = run.failures.error_count(),
                        "validation failed; stopping plugin loop"
                    );
                    run.aborted = true;
                    break;
                }
                Err(failure) => {
                    tracing::error!(plugin = %failure.plugin_short_name, message = %failure.message, "plugin failed");
                    run.pipeline_failures.push(failure);
                }
            }
        }

        run.failures.locate(&run.files);

        if run.aborted || !run.pipeline_failures.is_empty() || !self.options.run_generators {
            return Ok(());
        }
        if let Some(writer) = writer {
            writer.write(&run.generator_results)?;
            run.transition(PipelineState::OutputWritten);
        }
        Ok(())
    }

    /// Resolves the plugin's target version, or `None` if it must be skipped.
    fn environment_for(&self, manifest: &PluginManifest) -> Option<PluginEnvironment> {
        let version = target_technology_version_for(
            &manifest.short_name,
            manifest.default_target_version.as_deref(),
            &self.config,
        );

        if is_disabled(&version) {
            tracing::info!(plugin = %manifest.short_name, "plugin disabled; skipping");
            return None;
        }
        if let Some(range) = &manifest.target_version_range
            && !version_satisfies(&version, range)
        {
            tracing::info!(
                plugin = %manifest.short_name,
                %version,
                %range,
                "target technology version out of range; skipping"
            );
            return None;
        }

        Some(PluginEnvironment::new(&manifest.short_name, version))
    }

    fn run_plugin(
        &self,
        run: &mut Run,
        manifest: &PluginManifest,
        environment: &PluginEnvironment,
    ) -> Result<PluginStep, PipelineFailure> {
        let plugin = manifest.short_name.as_str();

        if self.options.run_validators {
            run.transition(PipelineState::Validating);
            let mut found_error = false;
            for validator in &manifest.validators {
                let failures = guard(plugin, &validator.name, || {
                    Ok((validator.run)(&run.repository, environment))
                })?;
                found_error |= failures.iter().any(ValidationFailure::is_error);
                run.failures.extend(failures);
            }
            if found_error && self.options.stop_on_validation_failure {
                return Ok(PluginStep::Abort);
            }
        }

        if self.options.run_enhancers {
            run.transition(PipelineState::Enhancing);
            for enhancer in &manifest.enhancers {
                let repository = &mut run.repository;
                guard(plugin, &enhancer.name, || (enhancer.run)(repository, environment))?;
            }
        }

        if self.options.run_generators {
            run.transition(PipelineState::Generating);
            for generator in &manifest.generators {
                let result = guard(plugin, &generator.name, || {
                    (generator.run)(&run.repository, environment)
                })?;
                run.generator_results.push(result);
            }
        }

        Ok(PluginStep::Continue)
    }
}

enum PluginStep {
    Continue,
    Abort,
}

/// Mutable state of one run.
#[derive(Default)]
struct Run {
    state: PipelineState,
    repository: EntityRepository,
    files: FileIndex,
    failures: Failures,
    pipeline_failures: Vec<PipelineFailure>,
    generator_results: Vec<GeneratorResult>,
    aborted: bool,
}

impl Run {
    fn transition(&mut self, next: PipelineState) {
        tracing::debug!(from = %self.state, to = %next, "pipeline state");
        self.state = next;
    }

    fn finish(mut self) -> PipelineOutcome {
        let failure = self.aborted || !self.pipeline_failures.is_empty();
        if failure {
            self.transition(PipelineState::Failed);
        }
        self.into_outcome(failure, None)
    }

    fn fatal(mut self, error: Error) -> PipelineOutcome {
        self.transition(PipelineState::Failed);
        self.into_outcome(true, Some(error))
    }

    fn into_outcome(self, failure: bool, fatal_error: Option<Error>) -> PipelineOutcome {
        PipelineOutcome {
            final_state: self.state,
            failure,
            validation_failures: self.failures,
            pipeline_failures: self.pipeline_failures,
            generator_results: self.generator_results,
            repository: self.repository,
            files: self.files,
            fatal_error,
        }
    }
}

/// Runs one plugin function, turning errors and panics into a failure record.
fn guard<T>(
    plugin: &str,
    function: &str,
    f: impl FnOnce() -> Result<T, PluginError>,
) -> Result<T, PipelineFailure> {
    match catch_unwind(AssertUnwindSafe(f)) {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(error)) => Err(PipelineFailure::error(plugin, format!("{function}: {error}"))),
        Err(payload) => Err(PipelineFailure::error(
            plugin,
            format!("{function} panicked: {}", panic_message(payload.as_ref())),
        )),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message
    } else {
        "unknown panic"
    }
}
