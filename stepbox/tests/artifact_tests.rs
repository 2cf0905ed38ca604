use std::path::Path;

use stepbox::{Artifact, ArtifactKind, StepError};
use tempfile::TempDir;

#[test]
fn parses_versioned_type_names() {
    let kind = ArtifactKind::parse("system.Dataset@0.0.1").expect("known kind");
    assert_eq!(kind, ArtifactKind::Dataset);
}

#[test]
fn parses_bare_type_names() {
    assert_eq!(ArtifactKind::parse("Model").unwrap(), ArtifactKind::Model);
    assert_eq!(
        ArtifactKind::parse("system.Metrics").unwrap(),
        ArtifactKind::Metrics
    );
}

#[test]
fn rejects_unknown_type_names() {
    let err = ArtifactKind::parse("system.Tensor").unwrap_err();
    assert!(matches!(err, StepError::UnknownArtifactType(_)));
}

#[test]
fn unknown_type_fails_artifact_synthesis() {
    let err = Artifact::new("system.Tensor", Path::new("/tmp/run"), "slot").unwrap_err();
    assert!(matches!(err, StepError::UnknownArtifactType(_)));
}

#[test]
fn write_and_read_backing_file() {
    let temp = TempDir::new().unwrap();
    let artifact = Artifact::new("system.Dataset", temp.path(), "numbers").expect("artifact");

    artifact.write_json(&vec![1, 2, 3]).expect("write");
    let read: Vec<i64> = artifact.read_json().expect("read");
    assert_eq!(read, vec![1, 2, 3]);
    assert!(artifact.path().exists());
}

#[test]
fn rebase_preserves_type_and_identity() {
    let artifact =
        Artifact::new("system.Dataset", Path::new("/host/base/outputs_3"), "result").unwrap();
    let moved = artifact.rebase(Path::new("/work/component_output")).unwrap();
    assert_eq!(moved.type_name(), "system.Dataset");
    assert_eq!(
        moved.uri(),
        "file:///work/component_output/outputs_3/result"
    );
}
