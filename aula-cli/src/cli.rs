//! CLI structure and command definitions.
//!
//! This module defines the main CLI structure using clap's derive
//! macros, including global options and subcommands.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::commands::{
    AssignRoomCommand, BookCommand, BookingsCommand, CancelCommand, CheckCommand, ConfirmCommand,
    DevicesCommand, InitCommand, PoolStatsCommand, RejectCommand, RentalsCommand, RoomsCommand,
    StockCommand,
};

/// Command-line tool for facility room and device reservations.
#[derive(Parser)]
#[command(name = "aula")]
#[command(version, about = "Manage facility room and device reservations", long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(long, global = true)]
    pub verbose: bool,

    /// Suppress non-essential output
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Override the data directory location
    #[arg(long, value_name = "PATH", global = true, env = "AULA_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Configuration file to load
    #[arg(long, value_name = "PATH", global = true, env = "AULA_CONFIG")]
    pub config: Option<PathBuf>,

    /// Fail instead of creating a missing database
    #[arg(long, global = true, env = "AULA_NO_AUTO_INIT")]
    pub no_auto_init: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Available CLI commands.
#[derive(Subcommand)]
pub enum Command {
    /// Initialize the data directory and database
    Init(InitCommand),

    /// Manage rooms and combinable-room links
    Rooms(RoomsCommand),

    /// Check room or device availability for a period
    Check(CheckCommand),

    /// Create a booking request
    Book(BookCommand),

    /// Bind a room to a pending booking
    AssignRoom(AssignRoomCommand),

    /// Confirm a room-assigned booking
    Confirm(ConfirmCommand),

    /// Reject a pending booking
    Reject(RejectCommand),

    /// Cancel a booking
    Cancel(CancelCommand),

    /// List or inspect bookings
    Bookings(BookingsCommand),

    /// Manage loan devices and assignments
    Devices(DevicesCommand),

    /// Check promisable stock for a device category
    Stock(StockCommand),

    /// Manage offsite rentals
    Rentals(RentalsCommand),

    /// Show connection pool statistics
    PoolStats(PoolStatsCommand),
}
