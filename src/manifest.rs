//! Bundle manifest: the `manifest.json` at the root of every game archive.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::protocol::GameKind;

#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("bundle has no manifest.json: {0}")]
    Missing(#[source] std::io::Error),
    #[error("manifest.json is not valid: {0}")]
    Invalid(#[from] serde_json::Error),
    #[error("manifest declares an empty server command")]
    EmptyServerCmd,
}

/// Flag names the client uses to pass the hub's address to the game client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArgsFormat {
    pub connect_ip: String,
    pub connect_port: String,
}

/// How to start the bundled server and client executables.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionSpec {
    pub server_cmd: Vec<String>,
    pub client_cmd: Vec<String>,
    pub args_format: ArgsFormat,
}

/// Contents of `manifest.json` at the archive root.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BundleManifest {
    pub name: String,
    pub version: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "type")]
    pub kind: GameKind,
    pub min_players: u32,
    pub max_players: u32,
    pub execution: ExecutionSpec,
}

impl BundleManifest {
    /// Read and validate the manifest from an extracted bundle directory.
    pub fn load_from_dir(dir: &Path) -> Result<Self, ManifestError> {
        let raw = std::fs::read_to_string(dir.join("manifest.json"))
            .map_err(ManifestError::Missing)?;
        let manifest: BundleManifest = serde_json::from_str(&raw)?;
        if manifest.execution.server_cmd.is_empty() {
            return Err(ManifestError::EmptyServerCmd);
        }
        Ok(manifest)
    }
}
