//! Owner-only storage for secret JSON files.
//!
//! Writes go through a temporary file in the destination directory that is
//! renamed over the target, so a crash mid-write never leaves a truncated
//! secret behind. On Unix the directory is created with mode `0700` and the
//! file with mode `0600`.

use std::fs;
use std::io::Write;
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tempfile::NamedTempFile;

use crate::error::CrossCheckError;

/// Creates `dir` (and any missing parents) with owner-only permissions.
/// An existing `dir` is tightened to `0700` as well.
pub fn ensure_private_dir(dir: &Path) -> Result<(), CrossCheckError> {
    let mut builder = fs::DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        builder.mode(0o700);
    }
    builder.create(dir)?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(dir, fs::Permissions::from_mode(0o700))?;
    }
    Ok(())
}

/// Serializes `value` as pretty JSON and atomically replaces `path` with it.
pub fn write_private_json<T: Serialize>(path: &Path, value: &T) -> Result<(), CrossCheckError> {
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    ensure_private_dir(dir)?;

    let content = serde_json::to_string_pretty(value)?;
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(content.as_bytes())?;
    tmp.flush()?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        tmp.as_file()
            .set_permissions(fs::Permissions::from_mode(0o600))?;
    }

    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

/// Reads and deserializes a JSON file. Missing, unreadable, or malformed
/// files all yield `None`.
pub fn read_json<T: DeserializeOwned>(path: &Path) -> Option<T> {
    let content = match fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => {
            tracing::debug!(path = %path.display(), error = %e, "secret file not readable");
            return None;
        }
    };
    match serde_json::from_str(&content) {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "ignoring malformed secret file");
            None
        }
    }
}
