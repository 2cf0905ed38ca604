use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StepError {
    #[error("invalid component: {0}")]
    InvalidComponent(String),
    #[error("missing argument '{0}'")]
    MissingArgument(String),
    #[error("argument '{name}' is not a {expected}")]
    ArgumentMismatch { name: String, expected: &'static str },
    #[error("artifact uri '{0}' is malformed")]
    MalformedUri(String),
    #[error("unknown artifact type '{0}'")]
    UnknownArtifactType(String),
    #[error("component '{symbol}' from '{source_file}' is not registered")]
    ComponentUnresolved { source_file: String, symbol: String },
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("component execution failed: {0}")]
    Execution(String),
    #[error("sandbox exited with status {code}: {stderr}")]
    SandboxFailed { code: i32, stderr: String },
    #[error("sandbox process terminated by signal")]
    TerminatedBySignal,
    #[error("image '{0}' not found")]
    ImageNotFound(String),
    #[error("container runtime unavailable: {0}")]
    RuntimeUnavailable(String),
}

pub type Result<T> = std::result::Result<T, StepError>;
