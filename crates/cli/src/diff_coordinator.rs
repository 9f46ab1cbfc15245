// Diff coordinator (C8): two daemons, one per capture, under derived
// session names `diff:<id>:A` / `diff:<id>:B`. Grounded on
// `original_source/src/rdc/commands/diff.py`'s `start_diff_session`/
// `stop_diff_session` names and shape, with the teacher's
// poll-with-retries-and-delay idiom
// (`scriptum-daemon::runtime::wait_for_daemon_shutdown`) reused here for
// the two-daemon readiness wait.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Result;
use rand::RngCore;
use rdc_common::session::SessionRecord;
use thiserror::Error;

use crate::session_service::{self, StartMode};

#[derive(Debug, Error)]
pub enum DiffStartError {
    #[error("daemon_a_not_ready")]
    DaemonANotReady,
    #[error("daemon_b_not_ready")]
    DaemonBNotReady,
}

pub struct DiffContext {
    pub id: String,
    pub session_a: String,
    pub session_b: String,
    pub record_a: SessionRecord,
    pub record_b: SessionRecord,
}

/// Spawn two daemons, one per capture, and wait for both to answer `ping`
/// within `timeout`. `timeout` is handed to `open_session` directly rather
/// than wrapped around it with `tokio::time::timeout`: the latter would
/// cancel the spawn-and-poll future from the outside, dropping its
/// spawned-child handle before `session_service` gets a chance to kill the
/// process and delete any session file it wrote — leaving exactly the
/// orphaned daemon this function exists to prevent. If either daemon
/// fails to come up, whichever of A/B already started is torn down
/// (best-effort `shutdown` plus a direct kill if it's still alive — §4.4's
/// shutdown is cooperative, the kill is the backstop) before the error
/// surfaces, so a failed `diff` never leaves an orphaned daemon or session
/// file behind.
pub async fn start_diff_session(
    home: &Path,
    capture_a: PathBuf,
    capture_b: PathBuf,
    timeout: Duration,
) -> Result<DiffContext, DiffStartError> {
    let id = mint_diff_id();
    let session_a = format!("diff:{id}:A");
    let session_b = format!("diff:{id}:B");

    let record_a =
        match session_service::open_session(home, &session_a, capture_a, StartMode::Spawn, timeout)
            .await
        {
            Ok(record) => record,
            Err(_) => {
                let _ = session_service::close_session(home, &session_a).await;
                return Err(DiffStartError::DaemonANotReady);
            }
        };

    let record_b =
        match session_service::open_session(home, &session_b, capture_b, StartMode::Spawn, timeout)
            .await
        {
            Ok(record) => record,
            Err(_) => {
                let _ = session_service::close_session(home, &session_a).await;
                let _ = session_service::close_session(home, &session_b).await;
                return Err(DiffStartError::DaemonBNotReady);
            }
        };

    Ok(DiffContext { id, session_a, session_b, record_a, record_b })
}

/// Tear down both daemons for a diff session. Best-effort, swallows every
/// error — matches spec.md's "never raises" for the stop path.
pub async fn stop_diff_session(home: &Path, ctx: &DiffContext) {
    let _ = session_service::close_session(home, &ctx.session_a).await;
    let _ = session_service::close_session(home, &ctx.session_b).await;
}

fn mint_diff_id() -> String {
    let mut bytes = [0u8; 6];
    rand::thread_rng().fill_bytes(&mut bytes);
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn diff_ids_are_12_lowercase_hex_chars() {
        let id = mint_diff_id();
        assert_eq!(id.len(), 12);
        assert!(id.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn session_names_are_derived_from_the_diff_id() {
        let id = mint_diff_id();
        let session_a = format!("diff:{id}:A");
        let session_b = format!("diff:{id}:B");
        assert!(session_a.starts_with("diff:"));
        assert!(session_a.ends_with(":A"));
        assert!(session_b.ends_with(":B"));
    }

    #[tokio::test]
    async fn daemon_a_not_ready_error_message_matches_the_documented_scenario() {
        // spec.md scenario 6 expects the lowercase-snake message verbatim.
        assert_eq!(DiffStartError::DaemonANotReady.to_string(), "daemon_a_not_ready");
        assert_eq!(DiffStartError::DaemonBNotReady.to_string(), "daemon_b_not_ready");
    }

    #[tokio::test]
    async fn a_failure_to_spawn_leaves_no_session_files_behind() {
        // spec.md scenario 6: a diff that never gets both daemons ready
        // leaves no `diff:*` session files. Pointing `RDC_DAEMON_BIN` at a
        // binary that doesn't exist makes daemon A fail at the very first
        // `spawn()` call, exercising the A-failure cleanup branch.
        std::env::set_var("RDC_DAEMON_BIN", "/nonexistent/rdcd-does-not-exist");
        let home = tempfile::TempDir::new().unwrap();

        let result = start_diff_session(
            home.path(),
            PathBuf::from("/captures/a.rdc"),
            PathBuf::from("/captures/b.rdc"),
            Duration::from_millis(50),
        )
        .await;

        std::env::remove_var("RDC_DAEMON_BIN");
        assert!(matches!(result, Err(DiffStartError::DaemonANotReady)));

        let leftovers: Vec<_> = std::fs::read_dir(home.path().join(".rdc").join("sessions"))
            .into_iter()
            .flatten()
            .filter_map(|entry| entry.ok())
            .collect();
        assert!(leftovers.is_empty(), "expected no session files, found {leftovers:?}");
    }
}
