//! On-disk layout configuration.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::defaults::{default_data_dir, default_session_root, default_upload_root};

/// Where the hub keeps its snapshots, uploaded archives, and per-room
/// extraction directories.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct StorageConfig {
    /// Directory holding `users.json` and `games.json`.
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
    /// Root for committed archives:
    /// `<upload_root>/<game_name>/<version>/game_archive.zip`.
    #[serde(default = "default_upload_root")]
    pub upload_root: String,
    /// Root for room-scoped bundle extraction, wiped before each launch.
    #[serde(default = "default_session_root")]
    pub session_root: String,
}

impl StorageConfig {
    pub fn users_path(&self) -> PathBuf {
        Path::new(&self.data_dir).join("users.json")
    }

    pub fn games_path(&self) -> PathBuf {
        Path::new(&self.data_dir).join("games.json")
    }

    /// Final resting place of a committed archive.
    pub fn archive_path(&self, game_name: &str, version: &str) -> PathBuf {
        Path::new(&self.upload_root)
            .join(game_name)
            .join(version)
            .join("game_archive.zip")
    }

    /// Room-scoped directory a bundle is extracted into before launch.
    pub fn session_dir(&self, room_id: u32) -> PathBuf {
        Path::new(&self.session_root).join(format!("room_{room_id}"))
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            upload_root: default_upload_root(),
            session_root: default_session_root(),
        }
    }
}
