use std::process::ExitCode;

use clap::Parser;

use sshwarden_daemon::cli::DaemonCli;
use sshwarden_daemon::error::DaemonError;
use sshwarden_daemon::logging;
use sshwarden_daemon::orchestrator::Orchestrator;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = DaemonCli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, exit_code = e.exit_code(), "sshwarden-daemon exiting");
            eprintln!("sshwarden-daemon: {e}");
            ExitCode::from(e.exit_code())
        }
    }
}

async fn run(cli: DaemonCli) -> Result<(), DaemonError> {
    let config = cli.resolve_config().await?;

    if cli.validate {
        println!(
            "configuration is valid: following {} into {}",
            config.watch.log_file, config.allowlist.path
        );
        return Ok(());
    }

    logging::init_tracing(&config.general)?;
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "sshwarden-daemon starting");

    let mut orchestrator = Orchestrator::build_from_config(config).await?;
    orchestrator.run().await
}
