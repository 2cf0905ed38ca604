//! Harness for executing pipeline components against their declared
//! argument metadata, either in-process or inside the component's runtime
//! image, with results normalized into one inspectable shape either way.

pub mod artifact;
pub mod component;
pub mod container;
pub mod docker;
pub mod entrypoint;
pub mod errors;
pub mod local;
pub mod uri;

pub use artifact::{Artifact, ArtifactKind};
pub use component::{
    ArgKind, ArgSpec, ArgValue, Component, ComponentArgs, ComponentFn, ComponentRegistry,
    ComponentSpec, ExecArgs, Locator, ReturnValue,
};
pub use container::{ContainerRuntime, ContainerStep, LaunchOutput, LaunchSpec, Mount};
pub use docker::DockerRuntime;
pub use errors::{Result, StepError};
pub use local::{LocalStep, StepOutput};
