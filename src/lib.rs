pub mod cli;
pub mod core;

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::cli::Cli;

fn init_logging(verbose: bool) {
    let fallback = if verbose {
        "info,hearth_lib=debug"
    } else {
        "warn,hearth_lib=info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback)),
        )
        .with_writer(std::io::stderr)
        .init();
}

pub async fn run() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    tracing::debug!("Hearth {} starting...", env!("CARGO_PKG_VERSION"));

    match cli::execute(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!("{}", err);
            eprintln!("Error: {}", err.root_cause());
            ExitCode::FAILURE
        }
    }
}
