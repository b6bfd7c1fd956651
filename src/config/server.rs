//! Hub behaviour configuration.

use serde::{Deserialize, Serialize};

use super::defaults::{
    default_download_chunk_size, default_max_frame_len, default_ready_check_timeout_secs,
};

/// Tunables for the protocol and the pre-launch coordination.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct HubConfig {
    /// Cap on the declared frame length; larger frames close the connection.
    #[serde(default = "default_max_frame_len")]
    pub max_frame_len: usize,
    /// Chunk size for streaming archives to clients (bytes).
    #[serde(default = "default_download_chunk_size")]
    pub download_chunk_size: usize,
    /// How long a ready-check window may stay open before the start attempt
    /// fails (seconds). Guards against members that never respond.
    #[serde(default = "default_ready_check_timeout_secs")]
    pub ready_check_timeout_secs: u64,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            max_frame_len: default_max_frame_len(),
            download_chunk_size: default_download_chunk_size(),
            ready_check_timeout_secs: default_ready_check_timeout_secs(),
        }
    }
}
