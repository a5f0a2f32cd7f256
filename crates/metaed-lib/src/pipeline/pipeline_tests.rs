use std::cell::Cell;
use std::rc::Rc;

use metaed_core::{Entity, EntityKind, EntityRepository, Namespace, SourceSpan};
use serde_json::json;

use super::*;
use crate::{Category, Error, ValidationFailure};

fn model() -> EntityRepository {
    let mut repository = EntityRepository::new();
    repository.add_namespace(Namespace::new("EdFi")).unwrap();
    repository
        .add_entity(Entity::new(EntityKind::DomainEntity, "EdFi", "Student"))
        .unwrap();
    repository
}

fn failing_validator(name: &'static str) -> PluginManifest {
    PluginManifest::new(name).with_validator("AlwaysFails", |_, _| {
        vec![ValidationFailure::error("AlwaysFails", "model is wrong")]
    })
}

/// A plugin whose enhancer records that it ran.
fn tracking(name: &str, ran: &Rc<Cell<bool>>) -> PluginManifest {
    let ran = Rc::clone(ran);
    PluginManifest::new(name).with_enhancer("Track", move |_, _| {
        ran.set(true);
        Ok(())
    })
}

fn report(name: &str) -> PluginManifest {
    PluginManifest::new(name).with_generator("Report", |_, environment| {
        Ok(GeneratorResult::new("Report").with_output(GeneratedOutput {
            name: "report".to_owned(),
            namespace: "EdFi".to_owned(),
            folder_name: "Reports".to_owned(),
            file_name: format!("{}.txt", environment.short_name),
            result_string: environment.target_technology_version.clone(),
        }))
    })
}

#[derive(Default)]
struct RecordingWriter {
    calls: usize,
    files: Vec<String>,
}

impl OutputWriter for RecordingWriter {
    fn write(&mut self, results: &[GeneratorResult]) -> crate::Result<()> {
        self.calls += 1;
        self.files.extend(
            results
                .iter()
                .flat_map(|result| &result.generated_output)
                .map(|output| output.file_name.clone()),
        );
        Ok(())
    }
}

struct BrokenWriter;

impl OutputWriter for BrokenWriter {
    fn write(&mut self, _: &[GeneratorResult]) -> crate::Result<()> {
        Err(Error::UnsafeOutputDirectory {
            path: "/tmp/not-marked".into(),
        })
    }
}

struct UnreadableSource;

impl ModelSource for UnreadableSource {
    fn load_files(&mut self) -> crate::Result<FileIndex> {
        Err(Error::FileLoad("no such directory".to_owned()))
    }

    fn build_model(&mut self, _: &mut EntityRepository) -> crate::Result<Vec<ValidationFailure>> {
        unreachable!("files never loaded")
    }
}

/// Routes log output through the test harness so field formatting runs.
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}

#[test]
fn clean_run_writes_output() {
    init_tracing();
    let mut pipeline = Pipeline::new(MetaEdConfiguration::default())
        .with_plugin(report("edfiUnified"))
        .with_plugin(report("edfiInterchangeOrder"));
    let mut writer = RecordingWriter::default();

    let outcome = pipeline.run(&mut PrebuiltModel::new(model()), Some(&mut writer));

    assert!(!outcome.failure);
    assert_eq!(outcome.final_state, PipelineState::OutputWritten);
    assert!(outcome.final_state.is_terminal());
    assert_eq!(pipeline.state(), PipelineState::OutputWritten);
    assert_eq!(writer.calls, 1);
    assert_eq!(writer.files, ["edfiUnified.txt", "edfiInterchangeOrder.txt"]);
    assert_eq!(outcome.generator_results.len(), 2);
}

#[test]
fn run_without_writer_ends_after_plugins() {
    let mut pipeline = Pipeline::new(MetaEdConfiguration::default()).with_plugin(report("a"));

    let outcome = pipeline.run(&mut PrebuiltModel::new(model()), None);

    assert!(!outcome.failure);
    assert_eq!(outcome.final_state, PipelineState::Generating);
    assert_eq!(outcome.generator_results.len(), 1);
}

#[test]
fn validation_error_stops_later_plugins() {
    let second_ran = Rc::new(Cell::new(false));
    let mut pipeline = Pipeline::new(MetaEdConfiguration::default())
        .with_plugin(failing_validator("first"))
        .with_plugin(tracking("second", &second_ran).with_generator("Report", |_, _| {
            panic!("generator of a stopped run must not execute")
        }));
    let mut writer = RecordingWriter::default();

    let outcome = pipeline.run(&mut PrebuiltModel::new(model()), Some(&mut writer));

    assert!(outcome.failure);
    assert_eq!(outcome.final_state, PipelineState::Failed);
    assert!(!second_ran.get());
    assert!(outcome.pipeline_failures.is_empty());
    assert_eq!(outcome.validation_failures.error_count(), 1);
    assert_eq!(writer.calls, 0);
}

#[test]
fn validation_error_without_stop_flag_continues() {
    let second_ran = Rc::new(Cell::new(false));
    let mut pipeline = Pipeline::new(MetaEdConfiguration::default())
        .with_options(PipelineOptions::default().with_stop_on_validation_failure(false))
        .with_plugin(failing_validator("first"))
        .with_plugin(tracking("second", &second_ran));

    let outcome = pipeline.run(&mut PrebuiltModel::new(model()), None);

    assert!(second_ran.get());
    assert!(!outcome.failure);
    assert_eq!(outcome.validation_failures.error_count(), 1);
}

#[test]
fn warnings_never_stop_the_loop() {
    let second_ran = Rc::new(Cell::new(false));
    let mut pipeline = Pipeline::new(MetaEdConfiguration::default())
        .with_plugin(PluginManifest::new("first").with_validator("Style", |_, _| {
            vec![ValidationFailure::warning("Style", "consider renaming")]
        }))
        .with_plugin(tracking("second", &second_ran));

    let outcome = pipeline.run(&mut PrebuiltModel::new(model()), None);

    assert!(second_ran.get());
    assert!(!outcome.failure);
    assert_eq!(outcome.validation_failures.warning_count(), 1);
}

#[test]
fn disabled_plugin_is_skipped() {
    let ran = Rc::new(Cell::new(false));
    let config = MetaEdConfiguration::default().with_plugin_tech_version("optional", "Disabled");
    let mut pipeline = Pipeline::new(config).with_plugin(tracking("optional", &ran));

    let outcome = pipeline.run(&mut PrebuiltModel::new(model()), None);

    assert!(!ran.get());
    assert!(!outcome.failure);
}

#[test]
fn plugin_outside_version_range_is_skipped() {
    let old = Rc::new(Cell::new(false));
    let current = Rc::new(Cell::new(false));
    let config = MetaEdConfiguration::default().with_plugin_tech_version("current", "5.3.0");
    let mut pipeline = Pipeline::new(config)
        .with_plugin(
            tracking("old", &old)
                .with_default_target_version("7.1.0")
                .with_target_version_range("<3.4.0 || >=3.5.0 <5.0.0"),
        )
        .with_plugin(tracking("current", &current).with_target_version_range(">=5.0.0"));

    let outcome = pipeline.run(&mut PrebuiltModel::new(model()), None);

    assert!(!old.get());
    assert!(current.get());
    assert!(!outcome.failure);
    assert!(outcome.validation_failures.is_empty());
}

#[test]
fn generator_sees_resolved_target_version() {
    let config = MetaEdConfiguration::default().with_plugin_tech_version("edfiOdsApi", "5.2.0");
    let mut pipeline = Pipeline::new(config).with_plugin(report("edfiOdsApi"));

    let outcome = pipeline.run(&mut PrebuiltModel::new(model()), None);

    let output = &outcome.generator_results[0].generated_output[0];
    assert_eq!(output.result_string, "5.2.0");
}

#[test]
fn enhancer_error_is_contained() {
    let later_ran = Rc::new(Cell::new(false));
    let mut pipeline = Pipeline::new(MetaEdConfiguration::default())
        .with_plugin(
            PluginManifest::new("broken")
                .with_enhancer("Explodes", |_, _| Err("missing lookup table".into()))
                .with_generator("NeverRuns", |_, _| panic!("skipped after enhancer failure")),
        )
        .with_plugin(tracking("later", &later_ran));
    let mut writer = RecordingWriter::default();

    let outcome = pipeline.run(&mut PrebuiltModel::new(model()), Some(&mut writer));

    assert!(later_ran.get());
    assert!(outcome.failure);
    assert_eq!(outcome.final_state, PipelineState::Failed);
    assert_eq!(writer.calls, 0);
    assert_eq!(outcome.pipeline_failures.len(), 1);
    let failure = &outcome.pipeline_failures[0];
    assert_eq!(failure.plugin_short_name, "broken");
    assert_eq!(failure.category, Category::Error);
    insta::assert_snapshot!(failure.to_string(), @"error in plugin broken: Explodes: missing lookup table");
}

#[test]
fn generator_panic_is_contained() {
    let mut pipeline = Pipeline::new(MetaEdConfiguration::default())
        .with_plugin(
            PluginManifest::new("fragile")
                .with_generator("Template", |_, _| panic!("template exploded")),
        )
        .with_plugin(report("steady"));

    let outcome = pipeline.run(&mut PrebuiltModel::new(model()), None);

    assert!(outcome.failure);
    assert_eq!(outcome.pipeline_failures.len(), 1);
    assert_eq!(
        outcome.pipeline_failures[0].message,
        "Template panicked: template exploded"
    );
    assert_eq!(outcome.generator_results.len(), 1);
}

#[test]
fn enhancers_see_earlier_plugins_annotations() {
    let mut pipeline = Pipeline::new(MetaEdConfiguration::default())
        .with_plugin(PluginManifest::new("producer").with_enhancer("Annotate", |repository, environment| {
            for namespace in repository.namespaces_mut() {
                for entity in namespace.entities_mut() {
                    entity.data.set(&environment.short_name, &json!({ "seen": true }))?;
                }
            }
            Ok(())
        }))
        .with_plugin(PluginManifest::new("consumer").with_validator("NeedsProducer", |repository, _| {
            repository
                .namespaces()
                .flat_map(|namespace| namespace.entities())
                .filter(|entity| !entity.data.contains("producer"))
                .map(|entity| ValidationFailure::error("NeedsProducer", entity.name.clone()))
                .collect()
        }));

    let outcome = pipeline.run(&mut PrebuiltModel::new(model()), None);

    assert!(!outcome.failure);
    assert!(outcome.validation_failures.is_empty());
}

#[test]
fn generators_can_be_turned_off() {
    let mut pipeline = Pipeline::new(MetaEdConfiguration::default())
        .with_options(PipelineOptions::default().with_generators(false))
        .with_plugin(report("a"));
    let mut writer = RecordingWriter::default();

    let outcome = pipeline.run(&mut PrebuiltModel::new(model()), Some(&mut writer));

    assert!(outcome.generator_results.is_empty());
    assert_eq!(writer.calls, 0);
    assert!(!outcome.failure);
}

#[test]
fn validators_can_be_turned_off() {
    let mut pipeline = Pipeline::new(MetaEdConfiguration::default())
        .with_options(PipelineOptions::default().with_validators(false).with_enhancers(false))
        .with_plugin(failing_validator("first"));

    let outcome = pipeline.run(&mut PrebuiltModel::new(model()), None);

    assert!(outcome.validation_failures.is_empty());
    assert!(!outcome.failure);
}

#[test]
fn load_failure_is_fatal() {
    let mut pipeline = Pipeline::new(MetaEdConfiguration::default()).with_plugin(report("a"));

    let outcome = pipeline.run(&mut UnreadableSource, None);

    assert!(outcome.failure);
    assert_eq!(outcome.final_state, PipelineState::Failed);
    assert!(matches!(outcome.fatal_error, Some(Error::FileLoad(_))));
    assert!(outcome.generator_results.is_empty());
}

#[test]
fn output_failure_is_fatal() {
    let mut pipeline = Pipeline::new(MetaEdConfiguration::default()).with_plugin(report("a"));

    let outcome = pipeline.run(&mut PrebuiltModel::new(model()), Some(&mut BrokenWriter));

    assert!(outcome.failure);
    assert_eq!(outcome.final_state, PipelineState::Failed);
    assert!(matches!(
        outcome.fatal_error,
        Some(Error::UnsafeOutputDirectory { .. })
    ));
}

#[test]
fn unknown_project_namespace_is_fatal() {
    let config = MetaEdConfiguration::default()
        .with_project(ProjectConfiguration::new("Missing", "Missing"));
    let mut pipeline = Pipeline::new(config).with_plugin(report("a"));

    let outcome = pipeline.run(&mut PrebuiltModel::new(model()), None);

    assert!(outcome.failure);
    assert!(matches!(
        outcome.fatal_error,
        Some(Error::UnknownProjectNamespace { .. })
    ));
}

#[test]
fn model_errors_skip_plugins() {
    let ran = Rc::new(Cell::new(false));
    let mut pipeline =
        Pipeline::new(MetaEdConfiguration::default()).with_plugin(tracking("a", &ran));
    let mut source = PrebuiltModel::new(model())
        .with_failures(vec![ValidationFailure::error("SyntaxError", "unexpected token")]);

    let outcome = pipeline.run(&mut source, None);

    assert!(!ran.get());
    assert!(outcome.failure);
    assert_eq!(outcome.validation_failures.len(), 1);
}

#[test]
fn failures_get_file_locations() {
    let mut files = FileIndex::new();
    files.add_file("EdFi/Student.metaed", "Begin Namespace EdFi core\nDomain Entity Student\n");
    let mut pipeline = Pipeline::new(MetaEdConfiguration::default())
        .with_options(PipelineOptions::default().with_stop_on_validation_failure(false))
        .with_plugin(PluginManifest::new("edfiUnified").with_validator("Located", |_, _| {
            vec![ValidationFailure::error("Located", "points at Student").at(&SourceSpan::new(2, 14, "Student"))]
        }));

    let outcome = pipeline.run(&mut PrebuiltModel::new(model()).with_files(files), None);

    let failure = outcome.validation_failures.iter().next().unwrap();
    assert_eq!(
        failure.file_map.as_ref().map(ToString::to_string).as_deref(),
        Some("EdFi/Student.metaed:2:14")
    );
}

#[test]
fn plugin_config_is_applied_before_validators() {
    let config: MetaEdConfiguration = MetaEdConfiguration::from_json(
        r#"{
            "pluginConfig": {
                "checker": {
                    "config": [
                        { "rule": "wide", "data": { "strict": true } },
                        { "rule": "flag", "matches": { "entity": "domainEntity" }, "data": { "flagged": true } }
                    ]
                }
            }
        }"#,
    )
    .unwrap();
    let mut pipeline = Pipeline::new(config).with_plugin(PluginManifest::new("checker").with_validator(
        "ReadsConfig",
        |repository, environment| {
            let flagged = repository
                .namespaces()
                .flat_map(|namespace| namespace.entities())
                .filter(|entity| entity.config.contains("checker"))
                .count();
            vec![ValidationFailure::info(
                "ReadsConfig",
                format!("strict={} flagged={flagged}", environment.config["strict"]),
            )]
        },
    ));

    let outcome = pipeline.run(&mut PrebuiltModel::new(model()), None);

    let failure = outcome.validation_failures.iter().next().unwrap();
    assert_eq!(failure.message, "strict=true flagged=1");
}

#[test]
fn configuration_from_json_defaults() {
    let config = MetaEdConfiguration::from_json(
        r#"{ "projects": [{ "namespaceName": "EdFi", "projectName": "Ed-Fi" }] }"#,
    )
    .unwrap();

    assert_eq!(config.default_plugin_tech_version, DEFAULT_PLUGIN_TECH_VERSION);
    assert_eq!(config.project_for("EdFi").map(|p| p.is_extension()), Some(false));
    assert!(MetaEdConfiguration::from_json("{ not json").is_err());
    assert!(matches!(
        MetaEdConfiguration::from_json(r#"{ "defaultPluginTechVersion": " " }"#),
        Err(Error::Configuration(_))
    ));
}
