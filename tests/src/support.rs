use std::fs;
use std::os::unix::fs::symlink;
use std::path::{Path, PathBuf};

use anyhow::Result;
use async_trait::async_trait;
use stepbox::container::{ContainerRuntime, LaunchOutput, LaunchSpec};
use tempfile::{tempdir, TempDir};

pub fn temp_workspace() -> Result<TempDir> {
    Ok(tempdir()?)
}

/// In-process stand-in for a container runtime. Binds are materialized as
/// symlinks under a private working directory and the staged runner command
/// is served by calling the entry point directly, so the whole handoff
/// machinery runs without a daemon.
pub struct FakeRuntime {
    _root: TempDir,
    workdir: PathBuf,
}

impl FakeRuntime {
    pub fn new() -> Result<Self> {
        let root = tempdir()?;
        let workdir = root.path().join("work");
        fs::create_dir_all(&workdir)?;
        Ok(Self {
            _root: root,
            workdir,
        })
    }
}

#[async_trait]
impl ContainerRuntime for FakeRuntime {
    async fn workdir(&self, _image: &str) -> stepbox::Result<String> {
        Ok(self.workdir.display().to_string())
    }

    async fn launch(&self, spec: LaunchSpec) -> stepbox::Result<LaunchOutput> {
        for mount in &spec.mounts {
            let target = Path::new(&mount.container);
            if !target.exists() {
                symlink(&mount.host, target)?;
            }
        }

        // command shape: /bin/sh -c "{code}/{runner} {io-dir} {source} {symbol}"
        let line = spec.command.last().cloned().unwrap_or_default();
        let mut parts = line.split_whitespace();
        let _runner = parts.next().expect("runner path");
        let io_dir = parts.next().expect("io dir argument");
        let source = parts.next().expect("source argument");
        let symbol = parts.next().expect("symbol argument");

        let registry = demo_components::registry()?;
        match stepbox::entrypoint::run(
            Path::new(io_dir),
            source,
            symbol,
            &registry,
            Path::new(&spec.workdir),
        ) {
            Ok(_) => Ok(LaunchOutput {
                exit_code: 0,
                stdout: Vec::new(),
                stderr: Vec::new(),
            }),
            Err(err) => Ok(LaunchOutput {
                exit_code: 1,
                stdout: Vec::new(),
                stderr: err.to_string().into_bytes(),
            }),
        }
    }
}
