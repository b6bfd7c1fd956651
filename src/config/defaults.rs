//! Default value functions referenced by the serde derives.

pub fn default_port() -> u16 {
    12365
}

/// Address advertised to players in GAME_LAUNCH_EVENT. Deployments set this to
/// the host's public address; the listener itself always binds 0.0.0.0.
pub fn default_public_addr() -> String {
    "127.0.0.1".to_string()
}

pub fn default_max_frame_len() -> usize {
    8 * 1024 * 1024
}

pub fn default_download_chunk_size() -> usize {
    64 * 1024
}

pub fn default_ready_check_timeout_secs() -> u64 {
    30
}

pub fn default_data_dir() -> String {
    "data".to_string()
}

pub fn default_upload_root() -> String {
    "data/uploads".to_string()
}

pub fn default_session_root() -> String {
    "data/sessions".to_string()
}

pub fn default_log_dir() -> String {
    "logs".to_string()
}

pub fn default_log_filename() -> String {
    "hub.log".to_string()
}

pub fn default_log_rotation() -> String {
    "daily".to_string()
}

pub fn default_enable_file_logging() -> bool {
    false
}
