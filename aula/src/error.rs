//! Error types for reservation operations.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur during reservation operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Invalid input to an operation (bad field value, inverted range).
    #[error("validation failed for {field}: {message}")]
    Validation {
        /// The field that failed validation.
        field: String,
        /// Description of the failure.
        message: String,
    },

    /// A requested entity does not exist.
    #[error("{kind} not found: {id}")]
    NotFound {
        /// The kind of entity ("room", "booking", "device").
        kind: &'static str,
        /// Identifier that was looked up.
        id: String,
    },

    /// An operation is not valid for the entity's current state.
    #[error("invalid state transition for booking {booking_id}: {message}")]
    InvalidTransition {
        /// The booking whose status blocked the operation.
        booking_id: i64,
        /// Description of why the transition is rejected.
        message: String,
    },

    /// A room assignment lost the race against a conflicting commit.
    ///
    /// Raised by the storage layer's overlap backstop when two writers
    /// both saw a clear window and one committed first.
    #[error("room {room_id} is no longer free for {period}: {message}")]
    DoubleBooking {
        /// The room that is already occupied.
        room_id: i64,
        /// The requested period, formatted for display.
        period: String,
        /// Detail from the storage constraint.
        message: String,
    },

    /// The connection pool is above its saturation threshold.
    ///
    /// Callers should surface this without retrying; the pool is
    /// shedding load deliberately.
    #[error("connection pool saturated ({in_use}/{capacity} in use, threshold {threshold:.0}%)")]
    PoolSaturated {
        /// Connections currently checked out.
        in_use: usize,
        /// Total pool capacity.
        capacity: usize,
        /// Saturation threshold as a percentage.
        threshold: f64,
    },

    /// No pooled connection became available within the retry budget.
    #[error("no connection available after {attempts} attempts over {waited_ms}ms")]
    ConnectionUnavailable {
        /// Acquisition attempts made.
        attempts: u32,
        /// Total time spent waiting, in milliseconds.
        waited_ms: u64,
    },

    /// Database operation failed.
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// The on-disk schema version does not match this build.
    #[error("database schema version {found} is not supported (this build expects {supported}): {message}")]
    SchemaVersion {
        /// Version recorded in the database.
        found: i32,
        /// Version this build expects.
        supported: i32,
        /// Whether the database is older or newer and what to do.
        message: String,
    },

    /// Failed to read or parse a configuration file.
    #[error("configuration error in {path}: {message}")]
    Configuration {
        /// The configuration file involved.
        path: PathBuf,
        /// Description of the failure.
        message: String,
    },

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Convenience constructor for validation failures.
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Convenience constructor for missing entities.
    pub fn not_found(kind: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            kind,
            id: id.into(),
        }
    }

    /// Returns true if the error reflects a lost race rather than bad
    /// input, so the caller may re-check availability and try again.
    #[must_use]
    pub const fn is_conflict(&self) -> bool {
        matches!(self, Self::DoubleBooking { .. })
    }

    /// Returns true if the error is transient load shedding from the
    /// connection pool.
    #[must_use]
    pub const fn is_pool_exhaustion(&self) -> bool {
        matches!(
            self,
            Self::PoolSaturated { .. } | Self::ConnectionUnavailable { .. }
        )
    }
}

/// Result type alias for reservation operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_display() {
        let err = Error::validation("headcount", "must be positive");
        assert_eq!(
            err.to_string(),
            "validation failed for headcount: must be positive"
        );
    }

    #[test]
    fn test_not_found_display() {
        let err = Error::not_found("room", "42");
        assert_eq!(err.to_string(), "room not found: 42");
    }

    #[test]
    fn test_double_booking_is_conflict() {
        let err = Error::DoubleBooking {
            room_id: 7,
            period: "[2026-03-02 07:30, 2026-03-02 16:30)".into(),
            message: "overlapping booking exists".into(),
        };
        assert!(err.is_conflict());
        assert!(!err.is_pool_exhaustion());
    }

    #[test]
    fn test_pool_errors_are_exhaustion() {
        let saturated = Error::PoolSaturated {
            in_use: 9,
            capacity: 10,
            threshold: 90.0,
        };
        let unavailable = Error::ConnectionUnavailable {
            attempts: 3,
            waited_ms: 3500,
        };
        assert!(saturated.is_pool_exhaustion());
        assert!(unavailable.is_pool_exhaustion());
        assert!(!saturated.is_conflict());
    }

    #[test]
    fn test_database_error_conversion() {
        let sqlite_err = rusqlite::Error::QueryReturnedNoRows;
        let err: Error = sqlite_err.into();
        assert!(matches!(err, Error::Database(_)));
    }
}
