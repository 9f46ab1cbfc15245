// `rdc close` — shut down the daemon for a session (§4.6 Shutdown, §6.1).

use clap::Args;
use serde::Serialize;

use crate::commands::{home_dir, session_name};
use crate::output::{self, OutputFormat};
use crate::session_service;

#[derive(Debug, Args)]
pub struct CloseArgs {
    #[arg(long)]
    session: Option<String>,

    #[arg(long)]
    json: bool,
}

#[derive(Debug, Serialize)]
struct CloseResult {
    session: String,
    closed: bool,
}

pub async fn run(args: CloseArgs) -> anyhow::Result<()> {
    let format = OutputFormat::detect(args.json);
    let home = home_dir()?;
    let session = session_name(&args.session);

    match session_service::close_session(&home, &session).await {
        Ok(()) => {
            let result = CloseResult { session: session.clone(), closed: true };
            output::print_output(format, &result, format_human)?;
            Ok(())
        }
        Err(error) => {
            output::print_anyhow_error(format, &error);
            Err(error)
        }
    }
}

fn format_human(result: &CloseResult) -> String {
    format!("closed session `{}`", result.session)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn human_format_mentions_session_name() {
        let result = CloseResult { session: "default".into(), closed: true };
        assert_eq!(format_human(&result), "closed session `default`");
    }
}
