//! Persisted CLI session: identity only, never credentials.
//!
//! `auth login` writes `session.json` under the platform config dir, every
//! other command restores it, `auth logout` removes it. Writes go through a
//! temp file and rename so a crash cannot leave a half-written session.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use earthmover_core::config::CONFIG_DIR_NAME;
use earthmover_core::Session;

use crate::error::CliError;

pub const SESSION_FILE_NAME: &str = "session.json";

pub fn default_session_path() -> Result<PathBuf, CliError> {
    let dir = dirs::config_dir().ok_or(CliError::NoConfigDir)?;
    Ok(dir.join(CONFIG_DIR_NAME).join(SESSION_FILE_NAME))
}

/// Restore the stored session. Missing or unreadable files count as signed
/// out; a corrupt file is reported and skipped rather than locking the user
/// out of `auth login`.
pub fn load(path: &Path) -> Result<Option<Session>, CliError> {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(error) if error.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(error) => return Err(error.into()),
    };
    match serde_json::from_str(&raw) {
        Ok(session) => Ok(Some(session)),
        Err(error) => {
            tracing::warn!(path = %path.display(), %error, "Ignoring corrupt session file");
            Ok(None)
        }
    }
}

pub fn save(path: &Path, session: &Session) -> Result<(), CliError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(session)?;
    let temp = path.with_extension("json.tmp");
    fs::write(&temp, json)?;
    fs::rename(&temp, path)?;
    Ok(())
}

/// Remove the stored session. Already signed out is not an error.
pub fn clear(path: &Path) -> Result<(), CliError> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(error) if error.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(error) => Err(error.into()),
    }
}

#[cfg(test)]
mod tests {
    use earthmover_core::Role;
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    use super::*;

    fn session() -> Session {
        Session {
            user_id: 7,
            name: "Ravi Kumar".to_string(),
            phone: "9876501234".to_string(),
            email: Some("ravi@example.com".to_string()),
            role: Role::Customer,
        }
    }

    #[test]
    fn missing_file_is_signed_out() {
        let dir = tempdir().unwrap();
        let loaded = load(&dir.path().join("session.json")).unwrap();
        assert_eq!(loaded, None);
    }

    #[test]
    fn save_then_load_round_trips() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("earthmover").join("session.json");
        save(&path, &session()).unwrap();
        assert_eq!(load(&path).unwrap(), Some(session()));
    }

    #[test]
    fn corrupt_file_reads_as_signed_out() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("session.json");
        fs::write(&path, "{broken").unwrap();
        assert_eq!(load(&path).unwrap(), None);
    }

    #[test]
    fn clear_is_idempotent() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("session.json");
        save(&path, &session()).unwrap();
        clear(&path).unwrap();
        clear(&path).unwrap();
        assert_eq!(load(&path).unwrap(), None);
    }

    #[test]
    fn stored_file_never_contains_a_password_field() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("session.json");
        save(&path, &session()).unwrap();
        let raw = fs::read_to_string(&path).unwrap();
        assert!(!raw.contains("password"));
        assert!(raw.contains("\"role\": \"customer\""));
    }
}
