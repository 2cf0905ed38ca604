use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

use crate::container::{ContainerRuntime, LaunchOutput, LaunchSpec};
use crate::errors::{Result, StepError};

/// Container runtime backed by the `docker` command line client.
#[derive(Debug, Clone, Copy, Default)]
pub struct DockerRuntime;

impl DockerRuntime {
    pub fn new() -> Self {
        Self
    }

    pub async fn is_available(&self) -> bool {
        Command::new("docker")
            .arg("info")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await
            .map(|status| status.success())
            .unwrap_or(false)
    }
}

#[async_trait]
impl ContainerRuntime for DockerRuntime {
    async fn workdir(&self, image: &str) -> Result<String> {
        let output = Command::new("docker")
            .args(["image", "inspect", "--format", "{{.Config.WorkingDir}}", image])
            .output()
            .await
            .map_err(|err| StepError::RuntimeUnavailable(err.to_string()))?;
        if !output.status.success() {
            return Err(StepError::ImageNotFound(image.to_string()));
        }
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }

    async fn launch(&self, spec: LaunchSpec) -> Result<LaunchOutput> {
        let mut command = Command::new("docker");
        command.arg("run").arg("--rm");
        command.arg("-w").arg(&spec.workdir);
        for mount in &spec.mounts {
            command
                .arg("-v")
                .arg(format!("{}:{}", mount.host.display(), mount.container));
        }
        command.arg(&spec.image);
        for part in &spec.command {
            command.arg(part);
        }
        command.kill_on_drop(true);
        command.stdin(Stdio::null());

        debug!(image = %spec.image, "docker run");
        let output = command.output().await?;
        let exit_code = output.status.code().ok_or(StepError::TerminatedBySignal)?;
        Ok(LaunchOutput {
            exit_code,
            stdout: output.stdout,
            stderr: output.stderr,
        })
    }
}
