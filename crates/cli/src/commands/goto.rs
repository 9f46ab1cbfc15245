// `rdc goto` — reposition the capture to an event id (§8 scenario 2,
// supplemented beyond spec.md's literal leaf-command list: the minimal
// command needed to exercise the `goto`-then-`status` flow interactively).

use std::net::SocketAddr;

use clap::Args;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::client::DaemonClient;
use crate::commands::{home_dir, session_name};
use crate::output::{self, OutputFormat};

#[derive(Debug, Args)]
pub struct GotoArgs {
    /// Event id to reposition to.
    pub eid: i64,

    #[arg(long)]
    session: Option<String>,

    #[arg(long)]
    json: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GotoResult {
    pub session: String,
    pub eid: i64,
}

pub async fn run(args: GotoArgs) -> anyhow::Result<()> {
    let format = OutputFormat::detect(args.json);
    let home = home_dir()?;
    let session = session_name(&args.session);
    let eid = args.eid;

    match execute(&home, &session, eid).await {
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

async fn execute(home: &std::path::Path, session: &str, eid: i64) -> anyhow::Result<GotoResult> {
    let record = rdc_common::session::load(home, session).map_err(|_| anyhow::anyhow!("no session"))?;
    let addr: SocketAddr = format!("{}:{}", record.host, record.port).parse()?;
    let client = DaemonClient::new(addr, record.token.clone());
    client.call("goto", json!({ "eid": eid })).await?;

    Ok(GotoResult { session: session.to_string(), eid })
}

fn format_human(result: &GotoResult) -> String {
    format!("session `{}` now at eid {}", result.session, result.eid)
}
