// CLI subcommand dispatch (§6.1). Only the five in-scope leaf commands
// live here; every other method the daemon answers (§4.2) is reachable by
// hand-building a `DaemonClient::call`, not by a dedicated subcommand.

use clap::Subcommand;

pub mod close;
pub mod diff;
pub mod goto;
pub mod open;
pub mod status;

#[derive(Subcommand)]
pub enum Command {
    /// Open a capture, spawning or attaching to a daemon for it
    Open(open::OpenArgs),
    /// Shut down the daemon for a session
    Close(close::CloseArgs),
    /// Report daemon and capture status
    Status(status::StatusArgs),
    /// Reposition the capture to an event id
    Goto(goto::GotoArgs),
    /// Compare two captures side by side
    Diff(diff::DiffArgs),
}

pub async fn run(cmd: Command) -> anyhow::Result<()> {
    match cmd {
        Command::Open(args) => open::run(args).await,
        Command::Close(args) => close::run(args).await,
        Command::Status(args) => status::run(args).await,
        Command::Goto(args) => goto::run(args).await,
        Command::Diff(args) => diff::run(args).await,
    }
}

/// Resolve the session name: `--session`, else `$RDC_SESSION`, else
/// `"default"` (§6.2).
pub fn session_name(explicit: &Option<String>) -> String {
    explicit
        .clone()
        .or_else(|| std::env::var("RDC_SESSION").ok().filter(|s| !s.is_empty()))
        .unwrap_or_else(|| "default".to_string())
}

pub fn home_dir() -> anyhow::Result<std::path::PathBuf> {
    rdc_daemon::config::home_dir().ok_or_else(|| anyhow::anyhow!("HOME is not set"))
}
