//! `listing-dash`: command-line access to the listing-bot dashboards.

mod application;
mod commands;

use std::process::ExitCode;

use application::BootstrapError;

#[tokio::main]
async fn main() -> ExitCode {
    if let Err(err) = application::run().await {
        eprintln!("[listing-dash] {err}");
        if matches!(err, BootstrapError::Usage(_)) {
            eprint!("{}", commands::usage());
        }
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}
