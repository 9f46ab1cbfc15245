// rdcd: the daemon binary `rdc open` spawns (§4.6 mode 1). `--listen`
// mode (§4.6 mode 2) never execs this binary — the CLI process becomes
// the daemon in place by calling `rdc_daemon::runtime::run` directly.

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing::info;

use rdc_daemon::adapter::MockReplayLibrary;
use rdc_daemon::config::home_dir;

/// Library version reported to the adapter. The real replay library is out
/// of scope (spec §1); `MockReplayLibrary` stands in until a real binding
/// is wired in, so this is a placeholder rather than a detected version.
const LIBRARY_VERSION: (u32, u32) = (1, 32);

#[derive(Parser)]
#[command(name = "rdcd")]
struct Args {
    /// Path to the `.rdc` capture to open.
    #[arg(long)]
    capture: PathBuf,

    /// Session name this daemon's record is filed under.
    #[arg(long, default_value = "default")]
    session: String,

    /// Write `pid = 0` into the session record (used by externally
    /// managed daemons; Spawn-mode children never pass this).
    #[arg(long, default_value_t = false)]
    pid_zero: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    let home = home_dir().context("HOME is not set")?;
    let pid = if args.pid_zero { 0 } else { std::process::id() };

    info!(capture = %args.capture.display(), session = %args.session, "starting rdcd");
    rdc_daemon::runtime::run(
        &home,
        &args.session,
        args.capture,
        Box::new(MockReplayLibrary::new(0)),
        LIBRARY_VERSION,
        pid,
    )
    .await
    .context("daemon terminated unexpectedly")
}
