// rdc CLI entry point.

use clap::Parser;

mod client;
mod commands;
mod diff_coordinator;
mod exit_code;
mod output;
mod session_service;

use exit_code::ExitCode;

#[derive(Parser)]
#[command(name = "rdc", about = "Thin client for inspecting RenderDoc captures")]
struct Cli {
    #[command(subcommand)]
    command: commands::Command,
}

#[tokio::main]
async fn main() -> std::process::ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match commands::run(cli.command).await {
        Ok(()) => ExitCode::Success.into(),
        // Each command already reported its own error via `output::print_anyhow_error`
        // (format-aware: plain text or structured JSON); main just maps the exit code.
        Err(error) => ExitCode::from_error(&error).into(),
    }
}
