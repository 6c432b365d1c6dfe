use clap::Parser;
use std::process::ExitCode;
use tracing::error;
use tracing_subscriber::EnvFilter;

use library_circulation::io::cli::{self, Cli};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Logs go to stderr so command output on stdout stays machine-readable
    let filter = if cli.debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match cli::run(cli).await {
        Ok(code) => code,
        Err(err) => {
            error!("{:#}", err);
            ExitCode::FAILURE
        }
    }
}
