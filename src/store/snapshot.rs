//! Crash-atomic JSON snapshots: write-to-temp, then rename over the live file.

use std::io;
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::Serialize;

/// Persist `value` as pretty JSON at `path` via a sibling temp file and an
/// atomic rename. The live file is never truncated in place.
pub fn save_json<T: Serialize>(path: &Path, value: &T) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let json = serde_json::to_vec_pretty(value).map_err(io::Error::other)?;
    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, &json)?;
    std::fs::rename(&tmp, path)
}

/// Load a snapshot. A missing file yields the type's default (fresh install);
/// an unreadable or corrupt file is an error so startup can refuse to proceed
/// with silently-empty state.
pub fn load_json<T: DeserializeOwned + Default>(path: &Path) -> anyhow::Result<T> {
    let raw = match std::fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(T::default()),
        Err(e) => {
            return Err(anyhow::anyhow!("failed to read snapshot {}: {e}", path.display()))
        }
    };
    serde_json::from_str(&raw)
        .map_err(|e| anyhow::anyhow!("snapshot {} is corrupt: {e}", path.display()))
}
