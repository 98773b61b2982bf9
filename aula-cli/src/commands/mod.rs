//! CLI command implementations.
//!
//! This module contains the implementations of all CLI commands:
//! - `init`: Initialize the data directory and database
//! - `rooms`: Manage rooms and combinable-room links
//! - `check`: Check room or device availability for a period
//! - `book`: Create a booking request
//! - `assign_room`: Bind a room to a pending booking
//! - `confirm` / `reject` / `cancel`: Drive the review workflow
//! - `bookings`: List or inspect bookings
//! - `devices`: Manage loan devices and assignments
//! - `stock`: Check promisable stock for a device category
//! - `rentals`: Manage offsite rentals
//! - `pool_stats`: Show connection pool statistics

pub mod assign_room;
pub mod book;
pub mod bookings;
pub mod cancel;
pub mod check;
pub mod confirm;
pub mod devices;
pub mod init;
pub mod pool_stats;
pub mod reject;
pub mod rentals;
pub mod rooms;
pub mod stock;

pub use assign_room::AssignRoomCommand;
pub use book::BookCommand;
pub use bookings::BookingsCommand;
pub use cancel::CancelCommand;
pub use check::CheckCommand;
pub use confirm::ConfirmCommand;
pub use devices::DevicesCommand;
pub use init::InitCommand;
pub use pool_stats::PoolStatsCommand;
pub use reject::RejectCommand;
pub use rentals::RentalsCommand;
pub use rooms::RoomsCommand;
pub use stock::StockCommand;
