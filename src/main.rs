//! Main entry point for the SGX derivatives downloader CLI

use clap::Parser;
use sgx_derivatives_downloader::cli::Cli;
use sgx_derivatives_downloader::logging;
use sgx_derivatives_downloader::pipeline::RunStatus;
use tracing::{error, info};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let log_path = match logging::init(&cli.log_dir) {
        Ok(path) => path,
        Err(e) => {
            eprintln!("failed to set up logging: {e}");
            std::process::exit(1);
        }
    };
    info!("run log: {}", log_path.display());

    let result = cli.execute().await.map_err(|e| anyhow::anyhow!(e));

    match result {
        Ok(run) => {
            // A breaker halt is systemic unavailability and exits distinctly
            // from a completed run with isolated failed dates
            let code = match (run.status, run.failed_dates().is_empty()) {
                (RunStatus::Completed, true) => 0,
                (RunStatus::Completed, false) => 1,
                (RunStatus::HaltedByBreaker, _) => 2,
            };
            info!("download pipeline finished");
            std::process::exit(code);
        }
        Err(e) => {
            error!("download pipeline failed to run: {e}");
            std::process::exit(1);
        }
    }
}
