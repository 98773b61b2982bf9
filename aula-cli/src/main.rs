//! Main entry point for the aula CLI.
//!
//! Command-line interface for the facility reservation engine. It
//! provides commands for the booking lifecycle:
//! - `book`: Create a booking request
//! - `assign-room`: Bind a room to a pending booking
//! - `confirm` / `reject` / `cancel`: Drive the review workflow
//! - `check` / `stock`: Availability queries
//! - `devices` / `rentals`: Loan device management

mod cli;
mod commands;
mod error;
mod utils;

use clap::Parser;
use cli::Cli;
use utils::GlobalOptions;

fn main() {
    let cli = Cli::parse();

    let _logger = aula::init_logger(cli.verbose, cli.quiet);

    let global = GlobalOptions {
        verbose: cli.verbose,
        quiet: cli.quiet,
        data_dir: cli.data_dir,
        config_file: cli.config,
        no_auto_init: cli.no_auto_init,
    };

    let result = match cli.command {
        cli::Command::Init(cmd) => cmd.execute(&global),
        cli::Command::Rooms(cmd) => cmd.execute(&global),
        cli::Command::Check(cmd) => cmd.execute(&global),
        cli::Command::Book(cmd) => cmd.execute(&global),
        cli::Command::AssignRoom(cmd) => cmd.execute(&global),
        cli::Command::Confirm(cmd) => cmd.execute(&global),
        cli::Command::Reject(cmd) => cmd.execute(&global),
        cli::Command::Cancel(cmd) => cmd.execute(&global),
        cli::Command::Bookings(cmd) => cmd.execute(&global),
        cli::Command::Devices(cmd) => cmd.execute(&global),
        cli::Command::Stock(cmd) => cmd.execute(&global),
        cli::Command::Rentals(cmd) => cmd.execute(&global),
        cli::Command::PoolStats(cmd) => cmd.execute(&global),
    };

    match result {
        Ok(()) => std::process::exit(0),
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(e.exit_code());
        }
    }
}
