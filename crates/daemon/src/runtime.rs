// Daemon lifecycle (C4): bind the loopback listener, mint a token, open
// the capture via the replay adapter, persist the session record, then
// serve the sequential RPC loop until `shutdown` (§4.4, §4.6 mode 1/2).

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Utc;
use rdc_common::session::{self, SessionRecord};
use tracing::info;

use crate::adapter::{ReplayAdapter, ReplayLibrary};
use crate::handlers::DaemonState;
use crate::rpc::tcp;
use crate::startup::{bind_loopback, mint_token};

/// Run a daemon bound to an OS-assigned loopback port, serving until a
/// `shutdown` RPC is answered. `pid_for_record` lets `--listen` mode (§4.6
/// mode 2) write `pid = 0` into the session record while every other
/// startup path writes the real process id.
pub async fn run(
    home: &Path,
    session_name: &str,
    capture: PathBuf,
    controller: Box<dyn ReplayLibrary>,
    library_version: (u32, u32),
    pid_for_record: u32,
) -> Result<()> {
    let listener = bind_loopback().await?;
    let addr = listener.local_addr().context("failed to read bound loopback address")?;
    let token = mint_token();

    let mut adapter = ReplayAdapter::new(controller, library_version);
    adapter.open(&capture).with_context(|| format!("failed to open capture `{}`", capture.display()))?;

    let record = SessionRecord {
        capture: capture.clone(),
        host: addr.ip().to_string(),
        port: addr.port(),
        token: token.clone(),
        pid: pid_for_record,
        current_eid: adapter.current_eid(),
        opened_at: Utc::now(),
    };
    session::save(home, session_name, &record).context("failed to persist session record")?;

    let mut state = DaemonState::new(
        home.to_path_buf(),
        capture,
        token,
        adapter,
        addr.ip().to_string(),
        addr.port(),
        session_name.to_string(),
    )
    .context("failed to create daemon scratch directory")?;

    info!(%addr, session = session_name, "daemon ready");
    let result = tcp::serve(listener, &mut state).await;
    state.adapter.shutdown();
    session::delete(home, session_name);
    result
}
