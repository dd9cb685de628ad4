use harvest_core::logging;

mod cli;

use crate::cli::CliCommand;

#[tokio::main]
async fn main() {
    // Fall back to stderr if the state dir is not writable.
    if let Err(err) = logging::init_logging() {
        match logging::init_logging_stderr() {
            Ok(()) => tracing::warn!("file logging unavailable: {:#}", err),
            Err(e) => eprintln!("harvest: logging disabled: {:#}; {:#}", err, e),
        }
    }

    if let Err(err) = CliCommand::run_from_args().await {
        eprintln!("harvest error: {:#}", err);
        std::process::exit(1);
    }
}
