//! rpcgen CLI
//!
//! Command-line entry point for the RPC interface generator.

use std::process::ExitCode;

use clap::Parser;
use env_logger::Env;
use log::info;

use rpcgen::cli::commands;
use rpcgen::cli::Cli;

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logger
    let default_filter = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(default_filter)).init();

    info!("rpcgen v{}", env!("CARGO_PKG_VERSION"));

    match commands::dispatch(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error[{}]: {}", e.error_code(), e);
            for hint in e.recovery_suggestions() {
                eprintln!("  hint: {}", hint);
            }
            ExitCode::from(e.exit_code())
        }
    }
}
