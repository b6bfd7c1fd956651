//! Configuration validation.

use super::Config;

/// Validate a loaded configuration. Returns a human-readable list of problems.
pub fn validate(cfg: &Config) -> Result<(), String> {
    let mut problems = Vec::new();

    if cfg.public_addr.trim().is_empty() {
        problems.push("public_addr must not be empty".to_string());
    }

    if cfg.server.max_frame_len < 1024 {
        problems.push(format!(
            "server.max_frame_len {} is too small (minimum 1024)",
            cfg.server.max_frame_len
        ));
    }

    if cfg.server.download_chunk_size == 0 {
        problems.push("server.download_chunk_size must be non-zero".to_string());
    } else if cfg.server.download_chunk_size + 1 > cfg.server.max_frame_len {
        problems.push(format!(
            "server.download_chunk_size {} does not fit in a frame capped at {}",
            cfg.server.download_chunk_size, cfg.server.max_frame_len
        ));
    }

    if cfg.server.ready_check_timeout_secs == 0 {
        problems.push("server.ready_check_timeout_secs must be non-zero".to_string());
    }

    for (label, dir) in [
        ("storage.data_dir", &cfg.storage.data_dir),
        ("storage.upload_root", &cfg.storage.upload_root),
        ("storage.session_root", &cfg.storage.session_root),
    ] {
        if dir.trim().is_empty() {
            problems.push(format!("{label} must not be empty"));
        }
    }

    if problems.is_empty() {
        Ok(())
    } else {
        Err(problems.join("\n"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_oversized_chunk() {
        let mut cfg = Config::default();
        cfg.server.download_chunk_size = cfg.server.max_frame_len;
        let err = validate(&cfg).unwrap_err();
        assert!(err.contains("does not fit"));
    }

    #[test]
    fn rejects_empty_public_addr() {
        let mut cfg = Config::default();
        cfg.public_addr = "  ".to_string();
        assert!(validate(&cfg).is_err());
    }

    #[test]
    fn rejects_empty_storage_dirs() {
        let mut cfg = Config::default();
        cfg.storage.upload_root = String::new();
        let err = validate(&cfg).unwrap_err();
        assert!(err.contains("upload_root"));
    }
}
