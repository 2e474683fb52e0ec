use std::process::ExitCode;

use clap::Parser;
use parley::Cli;

fn init_tracing() {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        // --help and --version go to stdout and are not failures.
        Err(e) if !e.use_stderr() => {
            let _ = e.print();
            return ExitCode::SUCCESS;
        }
        Err(e) => {
            let _ = e.print();
            return ExitCode::FAILURE;
        }
    };

    init_tracing();

    let service = match cli.to_builder().build().await {
        Ok(service) => service,
        Err(e) => {
            tracing::error!(error = %e, "failed to start");
            return ExitCode::FAILURE;
        }
    };

    for addr in service.local_addrs() {
        tracing::info!(%addr, "listening");
    }

    if let Err(e) = service.run_until_ctrl_c().await {
        tracing::error!(error = %e, "shutdown failed");
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}
