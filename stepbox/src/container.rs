use std::fs;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::component::{ArgValue, Component, ComponentArgs};
use crate::entrypoint::{RunRequest, RUN_REQUEST_FILE, RUN_RESULT_FILE};
use crate::errors::{Result, StepError};
use crate::local::{self, StepOutput};

/// Sandbox-local names of the three bind mounts, relative to the image's
/// working directory.
pub const IO_MOUNT: &str = "component_io";
pub const OUTPUT_MOUNT: &str = "component_output";
pub const CODE_MOUNT: &str = "component_code";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mount {
    pub host: PathBuf,
    pub container: String,
}

#[derive(Debug, Clone)]
pub struct LaunchSpec {
    pub image: String,
    pub command: Vec<String>,
    pub mounts: Vec<Mount>,
    pub workdir: String,
}

#[derive(Debug)]
pub struct LaunchOutput {
    pub exit_code: i32,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
}

/// The primitive the harness expects from a container runtime: inspect an
/// image's declared working directory, and run the image with a command and
/// volume bindings, waiting for it to exit.
#[async_trait]
pub trait ContainerRuntime {
    async fn workdir(&self, image: &str) -> Result<String>;
    async fn launch(&self, spec: LaunchSpec) -> Result<LaunchOutput>;
}

/// Runs a component inside its declared runtime image with the same
/// observable results as [`crate::LocalStep`]: the argument set is staged
/// into a handoff bundle, artifact uris are rewritten to sandbox paths, and
/// the sandbox's result is reconciled back to host paths afterwards.
pub struct ContainerStep<R> {
    component: Component,
    args: ComponentArgs,
    base_path: PathBuf,
    io_dir: PathBuf,
    code_dir: PathBuf,
    runner: PathBuf,
    runtime: R,
}

impl<R: ContainerRuntime> ContainerStep<R> {
    /// Chained steps must share one `base_path`; it doubles as the shared
    /// output root mounted into every sandbox of the chain.
    pub fn new(
        component: Component,
        args: ComponentArgs,
        base_path: Option<&Path>,
        runtime: R,
    ) -> Result<Self> {
        let base_path = local::resolve_base_path(base_path)?;
        let step_id = Uuid::new_v4();
        let io_dir = base_path.join(format!("io_{step_id}"));
        let code_dir = base_path.join(format!("code_{step_id}"));
        fs::create_dir_all(&io_dir)?;
        fs::create_dir_all(&code_dir)?;
        let runner = std::env::current_exe()?;
        Ok(Self {
            component,
            args,
            base_path,
            io_dir,
            code_dir,
            runner,
            runtime,
        })
    }

    /// Override the entry-point binary staged into the code mount. Defaults
    /// to the current executable.
    pub fn with_runner(mut self, runner: impl Into<PathBuf>) -> Self {
        self.runner = runner.into();
        self
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    pub fn io_dir(&self) -> &Path {
        &self.io_dir
    }

    pub fn code_dir(&self) -> &Path {
        &self.code_dir
    }

    #[instrument(skip(self), fields(component = %self.component.name(), image = %self.component.image()))]
    pub async fn run(&self) -> Result<StepOutput> {
        let declared = self.runtime.workdir(self.component.image()).await?;
        let workdir = if declared.trim().is_empty() {
            "/".to_string()
        } else {
            declared
        };

        let container_io = mount_point(&workdir, IO_MOUNT);
        let container_output = mount_point(&workdir, OUTPUT_MOUNT);
        let container_code = mount_point(&workdir, CODE_MOUNT);

        // Host-to-sandbox translation: every artifact keeps its slot identity
        // but is re-rooted under the sandbox's view of the output mount.
        let staged_args = self
            .args
            .map_artifacts(|artifact| artifact.rebase(Path::new(&container_output)))?;
        let request = RunRequest {
            component_args: staged_args,
            base_path: OUTPUT_MOUNT.to_string(),
        };
        fs::write(
            self.io_dir.join(RUN_REQUEST_FILE),
            serde_json::to_vec(&request)?,
        )?;

        self.stage_code()?;

        let runner_name = file_name(&self.runner)?;
        let locator = self.component.locator()?;
        let command = vec![
            "/bin/sh".to_string(),
            "-c".to_string(),
            format!(
                "{container_code}/{runner_name} {container_io} {source} {symbol}",
                source = locator.source_file,
                symbol = locator.symbol
            ),
        ];

        let spec = LaunchSpec {
            image: self.component.image().to_string(),
            command,
            mounts: vec![
                Mount {
                    host: self.io_dir.clone(),
                    container: container_io,
                },
                Mount {
                    host: self.base_path.clone(),
                    container: container_output,
                },
                Mount {
                    host: self.code_dir.clone(),
                    container: container_code,
                },
            ],
            workdir,
        };

        info!(image = %spec.image, "launching sandbox");
        let outcome = self.runtime.launch(spec).await?;
        if outcome.exit_code != 0 {
            return Err(StepError::SandboxFailed {
                code: outcome.exit_code,
                stderr: String::from_utf8_lossy(&outcome.stderr).into_owned(),
            });
        }

        let bytes = fs::read(self.io_dir.join(RUN_RESULT_FILE))?;
        let mut output: StepOutput = serde_json::from_slice(&bytes)?;

        // Sandbox-to-host translation of every output artifact.
        for value in output.outputs.values_mut() {
            if let ArgValue::Artifact(artifact) = value {
                *artifact = artifact.rebase(&self.base_path)?;
            }
        }
        Ok(output)
    }

    /// The sandbox resolves the component from scratch, so it gets the entry
    /// binary plus the component's source file, not the in-process object
    /// graph.
    fn stage_code(&self) -> Result<()> {
        let runner_name = file_name(&self.runner)?;
        fs::copy(&self.runner, self.code_dir.join(runner_name))?;
        let source_name = self.component.source_file_name()?;
        fs::copy(self.component.source_path(), self.code_dir.join(source_name))?;
        Ok(())
    }
}

fn mount_point(workdir: &str, name: &str) -> String {
    format!("{}/{name}", workdir.trim_end_matches('/'))
}

fn file_name(path: &Path) -> Result<String> {
    path.file_name()
        .and_then(|name| name.to_str())
        .map(str::to_string)
        .ok_or_else(|| {
            StepError::InvalidComponent(format!("path '{}' has no file name", path.display()))
        })
}
