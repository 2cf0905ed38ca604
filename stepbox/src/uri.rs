use std::path::{Path, PathBuf};

use crate::errors::{Result, StepError};

/// Scheme prefix attached to every artifact uri. Stripping it forces
/// resolution against the local filesystem.
pub const SCHEME: &str = "file://";

pub fn from_path(path: &Path) -> String {
    format!("{SCHEME}{}", path.display())
}

pub fn to_path(uri: &str) -> PathBuf {
    PathBuf::from(uri.strip_prefix(SCHEME).unwrap_or(uri))
}

/// The last two path segments of an artifact uri: `{slot-directory}/{slot-name}`.
/// They form the artifact's durable identity regardless of which root the uri
/// is currently resolved under.
pub fn slot_identity(uri: &str) -> Result<(String, String)> {
    let path = to_path(uri);
    let slot_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .map(str::to_string);
    let slot_dir = path
        .parent()
        .and_then(|parent| parent.file_name())
        .and_then(|name| name.to_str())
        .map(str::to_string);
    match (slot_dir, slot_name) {
        (Some(dir), Some(name)) => Ok((dir, name)),
        _ => Err(StepError::MalformedUri(uri.to_string())),
    }
}

/// Replace everything up to the slot identity with `new_root`. Applied
/// host-to-sandbox before handoff and sandbox-to-host after collection.
pub fn rebase(uri: &str, new_root: &Path) -> Result<String> {
    let (slot_dir, slot_name) = slot_identity(uri)?;
    Ok(from_path(&new_root.join(slot_dir).join(slot_name)))
}
