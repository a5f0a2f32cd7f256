use std::fs;

use super::*;
use crate::Error;

fn results() -> Vec<GeneratorResult> {
    vec![
        GeneratorResult::new("InterchangeOrderReport").with_output(GeneratedOutput {
            name: "Interchange Order".to_owned(),
            namespace: "EdFi".to_owned(),
            folder_name: "Documentation".to_owned(),
            file_name: "InterchangeOrder.txt".to_owned(),
            result_string: "1 Student\n".to_owned(),
        }),
    ]
}

#[test]
fn writes_into_namespace_and_folder() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().join(OUTPUT_MARKER);

    DirectoryOutputWriter::new(&root).write(&results()).unwrap();

    let written = fs::read_to_string(root.join("EdFi/Documentation/InterchangeOrder.txt")).unwrap();
    assert_eq!(written, "1 Student\n");
}

#[test]
fn marked_root_is_cleared() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().join(OUTPUT_MARKER);
    fs::create_dir_all(root.join("stale")).unwrap();
    fs::write(root.join("stale/old.txt"), "old").unwrap();

    DirectoryOutputWriter::new(&root).write(&results()).unwrap();

    assert!(!root.join("stale").exists());
    assert!(root.join("EdFi").is_dir());
}

#[test]
fn root_containing_marker_is_cleared() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().join(format!("My{OUTPUT_MARKER}-v2"));
    fs::create_dir_all(&root).unwrap();
    fs::write(root.join("old.txt"), "old").unwrap();

    DirectoryOutputWriter::new(&root).write(&results()).unwrap();

    assert!(!root.join("old.txt").exists());
    assert!(root.join("EdFi/Documentation/InterchangeOrder.txt").is_file());
}

#[test]
fn unmarked_non_empty_root_is_refused() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("keep.txt"), "precious").unwrap();

    let error = DirectoryOutputWriter::new(dir.path())
        .write(&results())
        .unwrap_err();

    assert!(matches!(error, Error::UnsafeOutputDirectory { .. }));
    assert_eq!(fs::read_to_string(dir.path().join("keep.txt")).unwrap(), "precious");
    assert!(!dir.path().join("EdFi").exists());
}

#[test]
fn unmarked_empty_root_is_written() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().join("artifacts");

    let mut writer = DirectoryOutputWriter::new(&root);
    writer.write(&results()).unwrap();

    assert_eq!(writer.root(), root.as_path());
    assert!(root.join("EdFi/Documentation/InterchangeOrder.txt").is_file());
}

#[test]
fn writer_follows_configured_artifact_directory() {
    assert!(DirectoryOutputWriter::from_config(&MetaEdConfiguration::default()).is_none());
    let blank = MetaEdConfiguration::default().with_artifact_directory("  ");
    assert!(DirectoryOutputWriter::from_config(&blank).is_none());

    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().join(OUTPUT_MARKER);
    let config = MetaEdConfiguration::from_json(
        &serde_json::json!({ "artifactDirectory": root.to_str().unwrap() }).to_string(),
    )
    .unwrap();

    let mut writer = DirectoryOutputWriter::from_config(&config).unwrap();
    assert_eq!(writer.root(), root.as_path());
    writer.write(&results()).unwrap();
    assert!(root.join("EdFi/Documentation/InterchangeOrder.txt").is_file());
}
