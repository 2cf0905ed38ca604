use std::sync::Arc;

use anyhow::Result;
use demo_components::{failing_component, named_output_component};
use integration_tests::support::{temp_workspace, FakeRuntime};
use serde_json::json;
use stepbox::{
    Component, ComponentArgs, ComponentSpec, ContainerStep, ExecArgs, LocalStep, ReturnValue,
    StepError,
};

#[tokio::test]
async fn container_run_matches_local_run() -> Result<()> {
    let args = ComponentArgs::new()
        .with_value("firstname", json!("Jeffrey"))
        .with_value("lastname", json!("Lebowski"))
        .with_value("input_dataset", json!([1, 2, 3, 4, 5]));

    let local_ws = temp_workspace()?;
    let local = LocalStep::new(named_output_component()?, args.clone(), Some(local_ws.path()))?
        .run()?;

    let container_ws = temp_workspace()?;
    let container = ContainerStep::new(
        named_output_component()?,
        args,
        Some(container_ws.path()),
        FakeRuntime::new()?,
    )?
    .run()
    .await?;

    assert_eq!(local.obj, container.obj);
    assert_eq!(container.obj["full_name"], json!("Jeffrey Lebowski"));
    assert_eq!(container.obj["squared_dataset"], json!([1, 4, 9, 16, 25]));
    Ok(())
}

#[tokio::test]
async fn container_output_artifacts_resolve_on_the_host() -> Result<()> {
    let workspace = temp_workspace()?;
    let args = ComponentArgs::new()
        .with_value("firstname", json!("Jeffrey"))
        .with_value("lastname", json!("Lebowski"))
        .with_value("input_dataset", json!([2, 3]));

    let run = ContainerStep::new(
        named_output_component()?,
        args,
        Some(workspace.path()),
        FakeRuntime::new()?,
    )?
    .run()
    .await?;

    let artifact = run.artifact("output_dataset").expect("output artifact");
    assert!(artifact.path().starts_with(workspace.path().canonicalize()?));
    let content: Vec<i64> = artifact.read_json()?;
    assert_eq!(content, vec![4, 9]);
    Ok(())
}

#[tokio::test]
async fn failing_component_surfaces_exit_status_and_stderr() -> Result<()> {
    let workspace = temp_workspace()?;
    let args = ComponentArgs::new().with_value("input_list", json!([1]));

    let err = ContainerStep::new(
        failing_component()?,
        args,
        Some(workspace.path()),
        FakeRuntime::new()?,
    )?
    .run()
    .await
    .expect_err("sandbox failure expected");

    match err {
        StepError::SandboxFailed { code, stderr } => {
            assert_eq!(code, 1);
            assert!(stderr.contains("failing_component always fails"));
        }
        other => panic!("unexpected error: {other}"),
    }
    Ok(())
}

#[tokio::test]
async fn unregistered_component_surfaces_as_sandbox_failure() -> Result<()> {
    let spec = ComponentSpec::new([], [])?;
    let ghost = Component::new(
        "ghost_component",
        concat!(env!("CARGO_MANIFEST_DIR"), "/container_exec.rs"),
        "debian:bookworm-slim",
        spec,
        Arc::new(|_args: &ExecArgs| Ok(ReturnValue::None)),
    )?;

    let workspace = temp_workspace()?;
    let err = ContainerStep::new(ghost, ComponentArgs::new(), Some(workspace.path()), FakeRuntime::new()?)?
        .run()
        .await
        .expect_err("resolution failure expected");

    match err {
        StepError::SandboxFailed { stderr, .. } => {
            assert!(stderr.contains("not registered"));
        }
        other => panic!("unexpected error: {other}"),
    }
    Ok(())
}
