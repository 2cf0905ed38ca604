use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::instrument;
use uuid::Uuid;

use crate::artifact::Artifact;
use crate::component::{ArgKind, ArgValue, Component, ComponentArgs, ExecArgs, ReturnValue};
use crate::errors::{Result, StepError};

/// Normalized result of one component run. `output` carries a single return
/// value, `outputs` carries named return values and every output artifact,
/// and `obj` holds every output with artifacts materialized from disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepOutput {
    pub output: Option<Value>,
    pub outputs: BTreeMap<String, ArgValue>,
    pub obj: BTreeMap<String, Value>,
}

impl StepOutput {
    pub fn artifact(&self, name: &str) -> Option<&Artifact> {
        match self.outputs.get(name) {
            Some(ArgValue::Artifact(artifact)) => Some(artifact),
            _ => None,
        }
    }
}

/// Runs a component synchronously in the current process, materializing
/// plain argument values into the artifact files the component expects.
#[derive(Debug, Clone)]
pub struct LocalStep {
    component: Component,
    args: ComponentArgs,
    base_path: PathBuf,
}

impl LocalStep {
    /// `base_path` is the directory the per-run artifact directories are
    /// created under; omit it to allocate a fresh temp directory. Chained
    /// steps must share one base path.
    pub fn new(
        component: Component,
        args: ComponentArgs,
        base_path: Option<&Path>,
    ) -> Result<Self> {
        let base_path = resolve_base_path(base_path)?;
        Ok(Self {
            component,
            args,
            base_path,
        })
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    #[instrument(skip(self), fields(component = %self.component.name()))]
    pub fn run(&self) -> Result<StepOutput> {
        let run_id = Uuid::new_v4();
        let input_dir = self.base_path.join(format!("inputs_{run_id}"));
        let output_dir = self.base_path.join(format!("outputs_{run_id}"));
        fs::create_dir_all(&input_dir)?;
        fs::create_dir_all(&output_dir)?;

        let mut exec = BTreeMap::new();

        for (name, spec) in self.component.spec().inputs() {
            let supplied = self.args.get(name);
            match spec.kind {
                ArgKind::Artifact => match supplied {
                    // An artifact from a previous run chains through unchanged.
                    Some(ArgValue::Artifact(artifact)) => {
                        exec.insert(name.clone(), ArgValue::Artifact(artifact.clone()));
                    }
                    // A plain value becomes a fresh artifact persisted to disk.
                    Some(ArgValue::Plain(value)) => {
                        let artifact = Artifact::new(&spec.type_name, &input_dir, name)?;
                        artifact.write_json(value)?;
                        exec.insert(name.clone(), ArgValue::Artifact(artifact));
                    }
                    None => return Err(StepError::MissingArgument(name.clone())),
                },
                ArgKind::Parameter => match supplied {
                    Some(value) => {
                        exec.insert(name.clone(), value.clone());
                    }
                    None => return Err(StepError::MissingArgument(name.clone())),
                },
            }
        }

        let mut output_artifacts = Vec::new();
        for (name, spec) in self.component.spec().outputs() {
            if spec.kind == ArgKind::Artifact {
                let artifact = Artifact::new(&spec.type_name, &output_dir, name)?;
                exec.insert(name.clone(), ArgValue::Artifact(artifact.clone()));
                output_artifacts.push((name.clone(), artifact));
            }
        }

        let exec_args = ExecArgs::new(exec);
        let response = self.component.execute(&exec_args)?;

        let (output, mut outputs) = match response {
            ReturnValue::Named(named) => {
                let named = named
                    .into_iter()
                    .map(|(name, value)| (name, ArgValue::Plain(value)))
                    .collect::<BTreeMap<_, _>>();
                (None, named)
            }
            ReturnValue::Single(value) => (Some(value), BTreeMap::new()),
            ReturnValue::None => (None, BTreeMap::new()),
        };

        let mut obj = outputs
            .iter()
            .filter_map(|(name, value)| match value {
                ArgValue::Plain(value) => Some((name.clone(), value.clone())),
                ArgValue::Artifact(_) => None,
            })
            .collect::<BTreeMap<_, _>>();

        for (name, artifact) in output_artifacts {
            obj.insert(name.clone(), artifact.read_json()?);
            outputs.insert(name, ArgValue::Artifact(artifact));
        }

        Ok(StepOutput {
            output,
            outputs,
            obj,
        })
    }
}

/// Per-run directories persist after the run, failures included, so results
/// stay inspectable.
pub(crate) fn resolve_base_path(base_path: Option<&Path>) -> Result<PathBuf> {
    let base = match base_path {
        Some(path) => {
            fs::create_dir_all(path)?;
            path.to_path_buf()
        }
        None => tempfile::Builder::new()
            .prefix("stepbox_")
            .tempdir()?
            .into_path(),
    };
    Ok(base.canonicalize()?)
}
