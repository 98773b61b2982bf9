//! Database layer for persistent storage of rooms, bookings, and devices.
//!
//! This module provides a SQLite-based storage layer with connection
//! management, schema versioning, and the query surface the workflow,
//! availability, and assignment modules build on. The schema carries
//! overlap triggers as a commit-time backstop against double bookings.
//!
//! # Examples
//!
//! ```no_run
//! use aula::database::{Database, DatabaseConfig};
//!
//! let config = DatabaseConfig::new("/tmp/aula.db");
//! let db = Database::open(config).unwrap();
//!
//! let room = db.create_room("Atrium East", 40).unwrap();
//! println!("room {} created", room.id);
//! ```

mod bookings;
mod config;
mod connection;
mod devices;
pub mod migrations;
mod rooms;
mod schema;

#[cfg(test)]
pub(crate) mod test_util;

pub use config::{default_data_dir, resolve_database_path, DatabaseConfig};
pub use connection::Database;

// Re-export migration functions for advanced use cases
pub use migrations::{check_schema_compatibility, get_schema_version, initialize_schema};
pub use schema::CURRENT_SCHEMA_VERSION;

pub(crate) use bookings::{
    booking_by_id, conflicts_for_room, insert_booking, update_booking_room, update_booking_status,
};
pub(crate) use devices::{
    assignment_by_id, busy_device_ids, consume_placeholder, delete_assignment,
    device_assignments_in, insert_assignment, insert_rental, placeholder_quantity,
};
pub(crate) use schema::{CLEAR_OVERRIDE_FLAG, SET_OVERRIDE_FLAG};

use chrono::{DateTime, Utc};

/// Returns the current instant as Unix epoch seconds for storage.
pub(crate) fn now_unix() -> i64 {
    Utc::now().timestamp()
}

/// Converts stored Unix epoch seconds back to a UTC instant.
///
/// Stored rows always hold representable timestamps, so a failure here
/// indicates corruption and is reported as a conversion error.
pub(crate) fn datetime_from_unix(secs: i64) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::from_timestamp(secs, 0).ok_or_else(|| {
        rusqlite::Error::ToSqlConversionFailure(
            format!("stored timestamp {secs} is unrepresentable").into(),
        )
    })
}
