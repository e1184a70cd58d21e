//! Fail-open reads and atomic writes.

use std::fs;
use std::io::{ErrorKind, Write};
use std::path::Path;

use tracing::{Level, instrument, warn};

use crate::error::{BrainError, Result};

/// Read a UTF-8 file.
///
/// `Ok(None)` when the file does not exist; any other failure is an error.
#[instrument(level = Level::TRACE)]
pub fn read_to_string_optional(path: &Path) -> Result<Option<String>> {
    match fs::read_to_string(path) {
        Ok(content) => Ok(Some(content)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(BrainError::ReadError {
            path: path.to_path_buf(),
            source: e,
        }),
    }
}

/// Like [`read_to_string_optional`], but unreadable files count as absent.
pub fn read_fail_open(path: &Path) -> Option<String> {
    read_to_string_optional(path).unwrap_or_else(|e| {
        warn!(error = %e, "Treating unreadable file as absent");
        None
    })
}

/// Write `content` to `path` via a temp file in the same directory and a
/// rename. Parent directories are created.
#[instrument(level = Level::TRACE, skip(content))]
pub fn write_atomic(path: &Path, content: &str) -> Result<()> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    if !parent.exists() {
        fs::create_dir_all(parent).map_err(|e| BrainError::CreateDirError {
            path: parent.to_path_buf(),
            source: e,
        })?;
    }

    let write_err = |source: std::io::Error| BrainError::WriteError {
        path: path.to_path_buf(),
        source,
    };
    let mut tmp = tempfile::NamedTempFile::new_in(parent).map_err(write_err)?;
    tmp.write_all(content.as_bytes()).map_err(write_err)?;
    tmp.flush().map_err(write_err)?;
    tmp.persist(path).map_err(|e| write_err(e.error))?;
    Ok(())
}
