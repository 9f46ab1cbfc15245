// `rdc diff` — compare two captures side by side (§4.8, §6.1), grounded
// on `original_source/src/rdc/commands/diff.py`: a summary-only stub here
// since the per-mode comparisons (`--draws`, `--resources`, ...) are out
// of scope (spec.md's "image-diff utilities" Non-goal); what's in scope
// is bringing both daemons up, confirming both are ready, and tearing
// both down cleanly.

use std::path::PathBuf;
use std::time::Duration;

use clap::Args;
use serde::Serialize;

use crate::commands::home_dir;
use crate::diff_coordinator::{self, DiffStartError};
use crate::output::{self, OutputFormat};

#[derive(Debug, Args)]
pub struct DiffArgs {
    pub capture_a: PathBuf,
    pub capture_b: PathBuf,

    /// Seconds to wait for both daemons to become ready.
    #[arg(long, default_value_t = 60.0)]
    timeout: f64,

    #[arg(long)]
    json: bool,
}

#[derive(Debug, Serialize)]
struct DiffResult {
    id: String,
    session_a: String,
    session_b: String,
}

pub async fn run(args: DiffArgs) -> anyhow::Result<()> {
    let format = OutputFormat::detect(args.json);
    let home = home_dir()?;
    let timeout = Duration::from_secs_f64(args.timeout);

    let ctx = match diff_coordinator::start_diff_session(&home, args.capture_a, args.capture_b, timeout)
        .await
    {
        Ok(ctx) => ctx,
        Err(error) => {
            let message = match &error {
                DiffStartError::DaemonANotReady => "daemon_a_not_ready",
                DiffStartError::DaemonBNotReady => "daemon_b_not_ready",
            };
            output::print_error(format, "DIFF_START_FAILED", message);
            return Err(error.into());
        }
    };

    let result = DiffResult { id: ctx.id.clone(), session_a: ctx.session_a.clone(), session_b: ctx.session_b.clone() };
    output::print_output(format, &result, format_human)?;

    diff_coordinator::stop_diff_session(&home, &ctx).await;
    Ok(())
}

fn format_human(result: &DiffResult) -> String {
    format!("diff `{}`: {} vs {}", result.id, result.session_a, result.session_b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn human_format_names_both_sessions() {
        let result = DiffResult {
            id: "abc123".into(),
            session_a: "diff:abc123:A".into(),
            session_b: "diff:abc123:B".into(),
        };
        let line = format_human(&result);
        assert!(line.contains("diff:abc123:A"));
        assert!(line.contains("diff:abc123:B"));
    }
}
