// Session record persistence (C3): the file that lets a stateless CLI
// invocation find the daemon a previous `rdc open` started.
//
// Grounded on the daemon's own path-resolution idiom (`~/.scriptum/` via
// `$HOME`, owner-only directory permissions) generalized to `~/.rdc/`, with
// the in-place `save_to` of the teacher's config layer upgraded to a real
// atomic write (temp file + rename) per the §3 invariant.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::fs_perms::{ensure_owner_only_dir, ensure_owner_only_file};

const SESSIONS_DIR: &str = "sessions";
const DEFAULT_SESSION_NAME: &str = "default";

/// Persisted per-session-name record (spec §3).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SessionRecord {
    pub capture: PathBuf,
    pub host: String,
    pub port: u16,
    /// 128-bit random token, lowercase hex (32 characters).
    pub token: String,
    /// OS pid of the daemon; `0` means externally managed (no liveness
    /// check, no signal-based shutdown).
    pub pid: u32,
    pub current_eid: i64,
    pub opened_at: DateTime<Utc>,
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("no session")]
    NotFound,
    #[error("failed to read session directory: {0}")]
    Io(#[source] std::io::Error),
    #[error("failed to serialize session record: {0}")]
    Encode(#[source] serde_json::Error),
}

/// Root directory for session records: `$HOME/.rdc/sessions/`.
pub fn sessions_dir(home: &Path) -> PathBuf {
    home.join(".rdc").join(SESSIONS_DIR)
}

/// Sanitize a caller-supplied session name into a safe file stem.
///
/// Any name that is empty, contains a path separator, or contains a `..`
/// component is silently replaced by `"default"` — never rejected with an
/// error (spec §3, matching the original's traversal handling exactly).
pub fn sanitize_name(name: &str) -> String {
    let is_safe = !name.is_empty()
        && !name.contains('/')
        && !name.contains('\\')
        && !name.split(['/', '\\']).any(|part| part == "..");
    if is_safe {
        name.to_string()
    } else {
        DEFAULT_SESSION_NAME.to_string()
    }
}

pub fn session_path(home: &Path, name: &str) -> PathBuf {
    sessions_dir(home).join(format!("{}.json", sanitize_name(name)))
}

/// Write a session record atomically: a temp file in the same directory,
/// then a rename, then owner-only permissions — so a concurrent reader
/// never observes a partially written file (spec §8's `save` atomicity
/// law).
pub fn save(home: &Path, name: &str, record: &SessionRecord) -> Result<(), SessionError> {
    let dir = sessions_dir(home);
    std::fs::create_dir_all(&dir).map_err(SessionError::Io)?;
    ensure_owner_only_dir(&dir).map_err(SessionError::Io)?;

    let path = session_path(home, name);
    let encoded = serde_json::to_vec_pretty(record).map_err(SessionError::Encode)?;

    let mut tmp = tempfile::NamedTempFile::new_in(&dir).map_err(SessionError::Io)?;
    use std::io::Write;
    tmp.write_all(&encoded).map_err(SessionError::Io)?;
    tmp.flush().map_err(SessionError::Io)?;
    tmp.persist(&path).map_err(|e| SessionError::Io(e.error))?;

    ensure_owner_only_file(&path).map_err(SessionError::Io)?;
    Ok(())
}

/// Load a session record. A missing file is `NotFound`; a corrupt file is
/// deleted and reported as `NotFound` too (spec §4.3 "no session"), since
/// a record that can't be trusted is no better than one that isn't there.
pub fn load(home: &Path, name: &str) -> Result<SessionRecord, SessionError> {
    let path = session_path(home, name);
    let bytes = match std::fs::read(&path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Err(SessionError::NotFound),
        Err(e) => return Err(SessionError::Io(e)),
    };

    match serde_json::from_slice(&bytes) {
        Ok(record) => Ok(record),
        Err(_corrupt) => {
            let _ = std::fs::remove_file(&path);
            Err(SessionError::NotFound)
        }
    }
}

pub fn delete(home: &Path, name: &str) {
    let path = session_path(home, name);
    let _ = std::fs::remove_file(path);
}

/// `pid == 0` means "externally managed, assume alive" (no liveness check
/// is possible or meaningful). Otherwise probe with signal 0.
#[cfg(unix)]
pub fn is_alive(pid: u32) -> bool {
    if pid == 0 {
        return true;
    }
    nix::sys::signal::kill(nix::unistd::Pid::from_raw(pid as i32), None).is_ok()
}

#[cfg(not(unix))]
pub fn is_alive(pid: u32) -> bool {
    pid == 0
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use tempfile::TempDir;

    fn sample_record() -> SessionRecord {
        SessionRecord {
            capture: PathBuf::from("/captures/vkcube.rdc"),
            host: "127.0.0.1".to_string(),
            port: 54321,
            token: "0123456789abcdef0123456789abcdef".to_string(),
            pid: 4242,
            current_eid: 0,
            opened_at: Utc::now(),
        }
    }

    #[test]
    fn save_then_load_round_trips() {
        let tmp = TempDir::new().unwrap();
        let record = sample_record();
        save(tmp.path(), "default", &record).unwrap();
        let loaded = load(tmp.path(), "default").unwrap();
        assert_eq!(loaded, record);
    }

    #[test]
    fn load_missing_session_is_not_found() {
        let tmp = TempDir::new().unwrap();
        let err = load(tmp.path(), "default").unwrap_err();
        assert!(matches!(err, SessionError::NotFound));
    }

    #[test]
    fn load_corrupt_session_deletes_file_and_reports_not_found() {
        let tmp = TempDir::new().unwrap();
        let dir = sessions_dir(tmp.path());
        std::fs::create_dir_all(&dir).unwrap();
        let path = session_path(tmp.path(), "default");
        std::fs::write(&path, b"not json").unwrap();

        let err = load(tmp.path(), "default").unwrap_err();
        assert!(matches!(err, SessionError::NotFound));
        assert!(!path.exists());
    }

    #[test]
    fn sanitize_rejects_traversal_and_separators() {
        assert_eq!(sanitize_name("../../etc/evil"), "default");
        assert_eq!(sanitize_name("a/b"), "default");
        assert_eq!(sanitize_name("a\\b"), "default");
        assert_eq!(sanitize_name(""), "default");
        assert_eq!(sanitize_name("diff:abc123:A"), "diff:abc123:A");
    }

    #[test]
    fn pid_zero_is_always_alive() {
        assert!(is_alive(0));
    }

    proptest! {
        #[test]
        fn saved_record_round_trips_for_arbitrary_names(
            name in "[a-zA-Z0-9_-]{1,20}",
            port in any::<u16>(),
            pid in any::<u32>(),
            eid in any::<i64>(),
        ) {
            let tmp = TempDir::new().unwrap();
            let record = SessionRecord {
                capture: PathBuf::from("/captures/x.rdc"),
                host: "127.0.0.1".to_string(),
                port,
                token: "0123456789abcdef0123456789abcdef".to_string(),
                pid,
                current_eid: eid,
                opened_at: Utc::now(),
            };
            save(tmp.path(), &name, &record).unwrap();
            let loaded = load(tmp.path(), &name).unwrap();
            prop_assert_eq!(loaded, record);
        }
    }
}
