// `rdc status` — report daemon and capture status for a session (§6.1).

use std::net::SocketAddr;

use clap::Args;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::client::DaemonClient;
use crate::commands::{home_dir, session_name};
use crate::output::{self, OutputFormat};

#[derive(Debug, Args)]
pub struct StatusArgs {
    #[arg(long)]
    session: Option<String>,

    #[arg(long)]
    json: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResult {
    pub session: String,
    pub capture: String,
    pub current_eid: i64,
    pub max_eid: i64,
}

pub async fn run(args: StatusArgs) -> anyhow::Result<()> {
    let format = OutputFormat::detect(args.json);
    let home = home_dir()?;
    let session = session_name(&args.session);

    match execute(&home, &session).await {
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

async fn execute(home: &std::path::Path, session: &str) -> anyhow::Result<StatusResult> {
    let record = rdc_common::session::load(home, session).map_err(|_| anyhow::anyhow!("no session"))?;
    let addr: SocketAddr = format!("{}:{}", record.host, record.port).parse()?;
    let client = DaemonClient::new(addr, record.token.clone());
    let raw = client.call("status", json!({})).await?;

    Ok(StatusResult {
        session: session.to_string(),
        capture: record.capture.display().to_string(),
        current_eid: raw.get("current_eid").and_then(|v| v.as_i64()).unwrap_or(record.current_eid),
        max_eid: raw.get("max_eid").and_then(|v| v.as_i64()).unwrap_or(0),
    })
}

fn format_human(result: &StatusResult) -> String {
    format!(
        "session `{}`: {} (eid {}/{})",
        result.session, result.capture, result.current_eid, result.max_eid
    )
}
