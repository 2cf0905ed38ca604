use std::path::Path;

use stepbox::uri;
use stepbox::StepError;

#[test]
fn attaches_and_strips_scheme() {
    let uri = uri::from_path(Path::new("/data/run_a/slot"));
    assert_eq!(uri, "file:///data/run_a/slot");
    assert_eq!(uri::to_path(&uri), Path::new("/data/run_a/slot"));
}

#[test]
fn strips_nothing_from_bare_paths() {
    assert_eq!(uri::to_path("/data/run_a/slot"), Path::new("/data/run_a/slot"));
}

#[test]
fn slot_identity_is_the_last_two_segments() {
    let uri = uri::from_path(Path::new("/host/base/outputs_1/result"));
    let (dir, name) = uri::slot_identity(&uri).expect("identity");
    assert_eq!(dir, "outputs_1");
    assert_eq!(name, "result");
}

#[test]
fn rebase_keeps_slot_identity() {
    let uri = uri::from_path(Path::new("/host/base/outputs_1/result"));
    let moved = uri::rebase(&uri, Path::new("/work/component_output")).expect("rebase");
    assert_eq!(moved, "file:///work/component_output/outputs_1/result");
}

#[test]
fn rebase_round_trips() {
    let original = uri::from_path(Path::new("/root_a/outputs_7/slot"));
    let there = uri::rebase(&original, Path::new("/root_b")).expect("rebase there");
    let back = uri::rebase(&there, Path::new("/root_a")).expect("rebase back");
    assert_eq!(back, original);
}

#[test]
fn rejects_uri_without_slot_directory() {
    let err = uri::rebase("file:///slot", Path::new("/elsewhere")).unwrap_err();
    assert!(matches!(err, StepError::MalformedUri(_)));
}
