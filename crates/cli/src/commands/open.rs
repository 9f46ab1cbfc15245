// `rdc open` — bring a daemon online for a capture (§4.6, §6.1).

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Args;
use serde::Serialize;

use crate::commands::{home_dir, session_name};
use crate::output::{self, OutputFormat};
use crate::session_service::{self, StartMode};

#[derive(Debug, Args)]
pub struct OpenArgs {
    /// Path to the `.rdc` capture to open.
    pub capture: PathBuf,

    /// Session name to file this daemon's record under.
    #[arg(long)]
    session: Option<String>,

    /// Run the daemon in this process instead of spawning a child.
    #[arg(long, value_name = "HOST:PORT")]
    listen: Option<SocketAddr>,

    /// Attach to an already-running external daemon instead of spawning one.
    #[arg(long, value_name = "HOST:PORT", requires = "token")]
    connect: Option<SocketAddr>,

    /// Token for `--connect` (required alongside it).
    #[arg(long)]
    token: Option<String>,

    /// Attach through a replay-library proxy instead of spawning directly.
    #[arg(long, value_name = "HOST:PORT")]
    proxy: Option<SocketAddr>,

    /// Force JSON output.
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Serialize)]
struct OpenResult {
    session: String,
    host: String,
    port: u16,
    current_eid: i64,
}

pub async fn run(args: OpenArgs) -> anyhow::Result<()> {
    let format = OutputFormat::detect(args.json);
    let home = home_dir()?;
    let session = session_name(&args.session);

    let result = execute(&home, &session, args).await;
    match result {
        Ok(result) => {
            output::print_output(format, &result, format_human)?;
            Ok(())
        }
        Err(error) => {
            output::print_anyhow_error(format, &error);
            Err(error)
        }
    }
}

async fn execute(
    home: &std::path::Path,
    session: &str,
    args: OpenArgs,
) -> anyhow::Result<OpenResult> {
    if let Some(addr) = args.listen {
        // `--listen` runs the daemon in the foreground; it never returns
        // until `shutdown` is served, so there is no "result" to print.
        session_service::run_listen_mode(home, session, args.capture).await?;
        return Ok(OpenResult {
            session: session.to_string(),
            host: addr.ip().to_string(),
            port: addr.port(),
            current_eid: 0,
        });
    }

    let mode = if let Some(addr) = args.connect {
        StartMode::Connect { addr, token: args.token.expect("clap requires --token with --connect") }
    } else if let Some(addr) = args.proxy {
        StartMode::Proxy { addr }
    } else {
        StartMode::Spawn
    };

    let record = session_service::open_session(
        home,
        session,
        args.capture,
        mode,
        rdc_daemon::config::SPAWN_READY_TIMEOUT,
    )
    .await?;
    Ok(OpenResult {
        session: session.to_string(),
        host: record.host,
        port: record.port,
        current_eid: record.current_eid,
    })
}

fn format_human(result: &OpenResult) -> String {
    format!(
        "opened session `{}` at {}:{} (eid {})",
        result.session, result.host, result.port, result.current_eid
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn human_format_mentions_session_and_address() {
        let result =
            OpenResult { session: "default".into(), host: "127.0.0.1".into(), port: 4242, current_eid: 0 };
        let line = format_human(&result);
        assert!(line.contains("default"));
        assert!(line.contains("127.0.0.1:4242"));
    }
}
