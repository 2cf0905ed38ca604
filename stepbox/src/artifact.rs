use std::fs;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::errors::{Result, StepError};
use crate::uri;

/// The closed set of artifact kinds the harness can materialize.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    Artifact,
    Dataset,
    Model,
    Metrics,
    Html,
    Markdown,
}

impl ArtifactKind {
    /// Declared types arrive as `system.Dataset@0.0.1`, `system.Dataset`, or
    /// bare `Dataset`; anything not in the known set is a lookup error.
    pub fn parse(type_name: &str) -> Result<Self> {
        let bare = type_name.split('@').next().unwrap_or(type_name);
        let bare = bare.rsplit('.').next().unwrap_or(bare);
        match bare {
            "Artifact" => Ok(Self::Artifact),
            "Dataset" => Ok(Self::Dataset),
            "Model" => Ok(Self::Model),
            "Metrics" => Ok(Self::Metrics),
            "HTML" | "Html" => Ok(Self::Html),
            "Markdown" => Ok(Self::Markdown),
            _ => Err(StepError::UnknownArtifactType(type_name.to_string())),
        }
    }
}

/// A file-backed value. The uri ends in `{slot-directory}/{slot-name}`, the
/// artifact's identity across filesystem roots; content is JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Artifact {
    #[serde(rename = "type")]
    type_name: String,
    uri: String,
}

impl Artifact {
    /// Synthesize a fresh artifact of `type_name` rooted at `root`, backed by
    /// the file `{root}/{slot}`.
    pub fn new(type_name: impl Into<String>, root: &Path, slot: &str) -> Result<Self> {
        let type_name = type_name.into();
        ArtifactKind::parse(&type_name)?;
        if slot.trim().is_empty() {
            return Err(StepError::InvalidComponent(
                "artifact slot name must not be empty".to_string(),
            ));
        }
        Ok(Self {
            uri: uri::from_path(&root.join(slot)),
            type_name,
        })
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn kind(&self) -> Result<ArtifactKind> {
        ArtifactKind::parse(&self.type_name)
    }

    pub fn uri(&self) -> &str {
        &self.uri
    }

    pub fn path(&self) -> PathBuf {
        uri::to_path(&self.uri)
    }

    /// The same artifact resolved under a different root; slot identity is
    /// preserved.
    pub fn rebase(&self, new_root: &Path) -> Result<Artifact> {
        Ok(Self {
            type_name: self.type_name.clone(),
            uri: uri::rebase(&self.uri, new_root)?,
        })
    }

    pub fn read_json<T: DeserializeOwned>(&self) -> Result<T> {
        let bytes = fs::read(self.path())?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    pub fn write_json<T: Serialize>(&self, value: &T) -> Result<()> {
        let path = self.path();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_vec(value)?)?;
        Ok(())
    }
}
