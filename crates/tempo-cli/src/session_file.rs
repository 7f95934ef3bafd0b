//! Session state checkpointing.
//!
//! The running timer is transient state and never touches the relational
//! store. A CLI process is short-lived, so the active session is
//! checkpointed to `session.json` in the state directory between
//! invocations. A missing file means no timer is running; a corrupt file is
//! treated the same after a warning, since starting a fresh timer is always
//! safe.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tempo_core::ActiveSession;

/// Returns the path to session.json in the XDG state directory.
pub fn session_json_path() -> Result<PathBuf> {
    let state_dir =
        crate::config::dirs_state_path().context("could not determine state directory")?;
    Ok(state_dir.join("session.json"))
}

/// Loads the checkpointed session, if any.
pub fn load(path: &Path) -> Result<Option<ActiveSession>> {
    match std::fs::read_to_string(path) {
        Ok(content) => match serde_json::from_str(&content) {
            Ok(active) => Ok(Some(active)),
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "corrupt session file, treating as no running timer"
                );
                Ok(None)
            }
        },
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e).context("failed to read session file"),
    }
}

/// Checkpoints the session.
///
/// Writes atomically by writing to a .tmp file then renaming.
pub fn save(path: &Path, active: &ActiveSession) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).context("failed to create state directory")?;
    }
    let json = serde_json::to_string_pretty(active).context("failed to serialize session")?;
    let tmp_path = path.with_extension("tmp");
    std::fs::write(&tmp_path, json).context("failed to write session file")?;
    std::fs::rename(&tmp_path, path).context("failed to replace session file")?;
    Ok(())
}

/// Removes the checkpoint. A missing file is not an error.
pub fn clear(path: &Path) -> Result<()> {
    match std::fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e).context("failed to remove session file"),
    }
}
