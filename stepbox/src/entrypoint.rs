use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::component::{ComponentArgs, ComponentRegistry, Locator};
use crate::errors::Result;
use crate::local::{LocalStep, StepOutput};

pub const RUN_REQUEST_FILE: &str = "run_request.json";
pub const RUN_RESULT_FILE: &str = "run_result.json";

/// The bundle handed from host to sandbox. It never contains the component
/// callable; the sandbox re-resolves the component from its own registry.
/// `base_path` is relative and resolved against the sandbox working
/// directory, so both sides address the shared output mount by their own
/// root.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunRequest {
    pub component_args: ComponentArgs,
    pub base_path: String,
}

/// The sandbox side of a container run: resolve the component named by the
/// locator, replay the staged run request through a local step, and leave the
/// serialized result in the io directory for the host to collect.
#[instrument(skip(registry))]
pub fn run(
    io_dir: &Path,
    source_file: &str,
    symbol: &str,
    registry: &ComponentRegistry,
    work_root: &Path,
) -> Result<StepOutput> {
    let locator = Locator::new(source_file, symbol);
    let component = registry.resolve(&locator)?;

    let bytes = fs::read(io_dir.join(RUN_REQUEST_FILE))?;
    let request: RunRequest = serde_json::from_slice(&bytes)?;

    let base_path = work_root.join(&request.base_path);
    let step = LocalStep::new((*component).clone(), request.component_args, Some(&base_path))?;
    let output = step.run()?;

    fs::write(io_dir.join(RUN_RESULT_FILE), serde_json::to_vec(&output)?)?;
    Ok(output)
}
