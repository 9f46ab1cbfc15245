// Session service (C6): the four ways `rdc open` can bring a daemon
// online, grounded on `scriptum-cli::daemon_launcher`'s spawn-then-poll
// shape, generalized from "always spawn the one fixed binary" to
// spec.md §4.6's four modes.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::{Duration, Instant};

use anyhow::{bail, Context, Result};
use rdc_common::session::{self, SessionRecord};
use rdc_daemon::config::{SPAWN_POLL_INITIAL_DELAY, SPAWN_POLL_MAX_DELAY};
use tokio::process::Command;
use tracing::info;

use crate::client::DaemonClient;

/// How `rdc open` should bring a daemon online for this session (§4.6).
pub enum StartMode {
    /// Fork a detached `rdcd` child and poll for readiness (the default).
    Spawn,
    /// Run the daemon in this process, blocking until `shutdown` (§4.6 #2).
    Listen { addr: SocketAddr },
    /// Point the session at an already-running external daemon (§4.6 #3).
    Connect { addr: SocketAddr, token: String },
    /// Like `Connect`, plus an opaque proxy hint forwarded to the adapter's
    /// capture-open call (§4.6 #4 — "the specific protocol is left to the
    /// replay library").
    Proxy { addr: SocketAddr },
}

/// Open `capture` under `session_name`, returning the session record once
/// the daemon is confirmed reachable. Only `StartMode::Spawn` polls for
/// readiness, bounded by `timeout`; `Connect`/`Proxy` trust the caller's
/// claim that the address is live and just persist a record, `pid = 0`.
///
/// `timeout` is a parameter rather than always `SPAWN_READY_TIMEOUT` so a
/// caller racing several daemons against a tighter deadline (the diff
/// coordinator's `--timeout`) can hand the readiness wait that same
/// deadline directly, instead of wrapping this call in its own
/// `tokio::time::timeout` — which would cancel the future and drop the
/// spawned child's handle before the Spawn branch gets a chance to kill it
/// and clean up after itself.
pub async fn open_session(
    home: &Path,
    session_name: &str,
    capture: PathBuf,
    mode: StartMode,
    timeout: Duration,
) -> Result<SessionRecord> {
    match mode {
        StartMode::Spawn => spawn_and_wait(home, session_name, capture, timeout).await,
        StartMode::Listen { .. } => {
            bail!("--listen runs the daemon in the foreground; call `run_listen_mode` directly")
        }
        StartMode::Connect { addr, token } => {
            connect_external(home, session_name, capture, addr, token).await
        }
        StartMode::Proxy { addr } => {
            // Proxy mode shares Connect's session-record shape; the proxy
            // hint itself is threaded through to the adapter's open call
            // by the daemon side (out of scope here — no daemon process is
            // started from the CLI for an external proxy target).
            connect_external(home, session_name, capture, addr, mint_placeholder_token()).await
        }
    }
}

/// `--listen` mode: the current process *becomes* the daemon. Blocks until
/// a `shutdown` RPC is served.
pub async fn run_listen_mode(home: &Path, session_name: &str, capture: PathBuf) -> Result<()> {
    use rdc_daemon::adapter::MockReplayLibrary;

    const LIBRARY_VERSION: (u32, u32) = (1, 32);
    rdc_daemon::runtime::run(
        home,
        session_name,
        capture,
        Box::new(MockReplayLibrary::new(0)),
        LIBRARY_VERSION,
        0,
    )
    .await
}

/// Spawn the daemon binary and poll it to readiness, killing it directly
/// (not via RPC) and removing any session file it managed to write if
/// readiness isn't reached in time. The `Child` handle is held for exactly
/// this reason: once `.spawn()` returns, this function is the only thing
/// that can still reach the process, so it must not be dropped before the
/// caller knows whether the daemon came up.
async fn spawn_and_wait(
    home: &Path,
    session_name: &str,
    capture: PathBuf,
    timeout: Duration,
) -> Result<SessionRecord> {
    let binary = daemon_binary();
    let mut command = Command::new(&binary);
    command
        .arg("--capture")
        .arg(&capture)
        .arg("--session")
        .arg(session_name)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null());

    let mut child =
        command.spawn().with_context(|| format!("failed to spawn daemon binary `{binary}`"))?;

    match wait_for_ready(home, session_name, timeout).await {
        Ok(record) => Ok(record),
        Err(error) => {
            let _ = child.kill().await;
            session::delete(home, session_name);
            Err(error)
        }
    }
}

/// Poll for the session record to appear, then `ping` it, with exponential
/// backoff capped at `timeout` total (§4.6).
async fn wait_for_ready(home: &Path, session_name: &str, timeout: Duration) -> Result<SessionRecord> {
    let deadline = Instant::now() + timeout;
    let mut delay = SPAWN_POLL_INITIAL_DELAY;

    loop {
        if let Ok(record) = session::load(home, session_name) {
            let addr: SocketAddr = format!("{}:{}", record.host, record.port)
                .parse()
                .context("session record carries an invalid address")?;
            let client = DaemonClient::new(addr, record.token.clone());
            if client.call("ping", serde_json::json!({})).await.is_ok() {
                return Ok(record);
            }
        }

        if Instant::now() >= deadline {
            bail!("daemon did not become ready within {:?}", timeout);
        }

        tokio::time::sleep(delay.min(deadline.saturating_duration_since(Instant::now()))).await;
        delay = (delay * 2).min(SPAWN_POLL_MAX_DELAY);
    }
}

async fn connect_external(
    home: &Path,
    session_name: &str,
    capture: PathBuf,
    addr: SocketAddr,
    token: String,
) -> Result<SessionRecord> {
    let client = DaemonClient::new(addr, token.clone());
    let status = client
        .call("status", serde_json::json!({}))
        .await
        .context("failed to reach external daemon")?;
    let current_eid = status.get("current_eid").and_then(|v| v.as_i64()).unwrap_or(0);

    let record = SessionRecord {
        capture,
        host: addr.ip().to_string(),
        port: addr.port(),
        token,
        pid: 0,
        current_eid,
        opened_at: chrono::Utc::now(),
    };
    session::save(home, session_name, &record).context("failed to persist session record")?;
    info!(session = session_name, %addr, "connected to external daemon");
    Ok(record)
}

fn daemon_binary() -> String {
    std::env::var("RDC_DAEMON_BIN").unwrap_or_else(|_| "rdcd".to_string())
}

fn mint_placeholder_token() -> String {
    // Proxy mode's actual token comes from the replay library's proxy
    // handshake (out of scope, §1); callers that reach this path without
    // a real token will simply fail the initial `status` probe above.
    let mut bytes = [0u8; 16];
    rand::RngCore::fill_bytes(&mut rand::thread_rng(), &mut bytes);
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

/// `rdc close` (§4.6 Shutdown): cooperative `shutdown` RPC, then escalate
/// to SIGTERM/SIGKILL if the process is still alive after the grace
/// period, then delete the session file regardless of outcome.
pub async fn close_session(home: &Path, session_name: &str) -> Result<()> {
    let record = session::load(home, session_name).context("no session")?;

    let addr: SocketAddr = format!("{}:{}", record.host, record.port).parse()?;
    let client = DaemonClient::new(addr, record.token.clone());
    let _ = client.call("shutdown", serde_json::json!({})).await;

    if record.pid != 0 {
        wait_for_exit_or_kill(record.pid).await;
    }

    session::delete(home, session_name);
    Ok(())
}

async fn wait_for_exit_or_kill(pid: u32) {
    use rdc_daemon::config::SHUTDOWN_GRACE_PERIOD;

    let deadline = Instant::now() + SHUTDOWN_GRACE_PERIOD;
    while Instant::now() < deadline {
        if !session::is_alive(pid) {
            return;
        }
        tokio::time::sleep(Duration::from_millis(100)).await;
    }

    #[cfg(unix)]
    {
        let target = nix::unistd::Pid::from_raw(pid as i32);
        let _ = nix::sys::signal::kill(target, nix::sys::signal::Signal::SIGTERM);
        tokio::time::sleep(Duration::from_millis(200)).await;
        if session::is_alive(pid) {
            let _ = nix::sys::signal::kill(target, nix::sys::signal::Signal::SIGKILL);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn daemon_binary_defaults_to_rdcd() {
        std::env::remove_var("RDC_DAEMON_BIN");
        assert_eq!(daemon_binary(), "rdcd");
    }

    #[test]
    fn placeholder_tokens_are_32_lowercase_hex_chars() {
        let token = mint_placeholder_token();
        assert_eq!(token.len(), 32);
        assert!(token.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[tokio::test]
    async fn wait_for_ready_times_out_when_no_session_appears() {
        let tmp = tempfile::TempDir::new().unwrap();
        let result = wait_for_ready(tmp.path(), "nonexistent", Duration::from_millis(50)).await;
        assert!(result.is_err(), "expected the short timeout to elapse with no session ever appearing");
    }
}
