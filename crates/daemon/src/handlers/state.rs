// Daemon-process-wide state (§3 "Daemon state", §9 "Global daemon state").
//
// Specified explicitly as a value passed to every handler rather than an
// ambient singleton: constructed once at startup, torn down on shutdown or
// crash (`temp_dir` cleans itself up via `Drop` on every exit path).

use std::path::PathBuf;

use tempfile::TempDir;

use crate::adapter::ReplayAdapter;

pub struct DaemonState {
    pub capture: PathBuf,
    pub token: String,
    pub adapter: ReplayAdapter,
    pub temp_dir: TempDir,
    pub host: String,
    pub port: u16,
    pub session_name: String,
    /// `$HOME`, so a handler that repositions the capture (§4.5
    /// `require_pipe`) can re-save the session record's `current_eid`
    /// (spec §3: "mutable; updated by goto").
    pub home: PathBuf,
}

impl DaemonState {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        home: PathBuf,
        capture: PathBuf,
        token: String,
        adapter: ReplayAdapter,
        host: String,
        port: u16,
        session_name: String,
    ) -> std::io::Result<Self> {
        let temp_dir = tempfile::Builder::new().prefix("rdc-daemon-").tempdir()?;
        Ok(Self { capture, token, adapter, temp_dir, host, port, session_name, home })
    }

    #[cfg(test)]
    pub fn for_test(max_eid: i64) -> Self {
        use crate::adapter::MockReplayLibrary;

        let home = tempfile::Builder::new()
            .prefix("rdc-test-home-")
            .tempdir()
            .expect("temp home should create in test")
            .into_path();

        let capture = PathBuf::from("/captures/test.rdc");
        let session_name = "default".to_string();
        let record = rdc_common::session::SessionRecord {
            capture: capture.clone(),
            host: "127.0.0.1".to_string(),
            port: 0,
            token: "test-token".to_string(),
            pid: std::process::id(),
            current_eid: 0,
            opened_at: chrono::Utc::now(),
        };
        rdc_common::session::save(&home, &session_name, &record)
            .expect("session record should save in test");

        Self::new(
            home,
            capture,
            "test-token".to_string(),
            ReplayAdapter::new(Box::new(MockReplayLibrary::new(max_eid)), (1, 32)),
            "127.0.0.1".to_string(),
            0,
            session_name,
        )
        .expect("temp dir should create in test")
    }
}
