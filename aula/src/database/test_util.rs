//! Shared test utilities for database unit tests.

use chrono::NaiveDate;
use tempfile::tempdir;

use crate::booking::{BookingRequest, Headcount};
use crate::database::{Database, DatabaseConfig};
use crate::timerange::TimeRange;

/// Creates a temporary test database that will be cleaned up automatically.
///
/// # Panics
///
/// Panics if the temporary directory or database cannot be created.
/// This is acceptable in test code where we want to fail fast.
#[must_use]
pub fn create_test_database() -> Database {
    let dir = tempdir().unwrap();
    let path = dir.path().join("test.db");
    let config = DatabaseConfig::new(path);
    let db = Database::open(config).unwrap();

    // Prevent the TempDir from being dropped immediately
    std::mem::forget(dir);

    db
}

/// Builds a whole-day range spanning the given days of March 2026.
///
/// # Panics
///
/// Panics if the days do not form a valid range.
#[must_use]
pub fn sample_range(start_day: u32, end_day: u32) -> TimeRange {
    let start = NaiveDate::from_ymd_opt(2026, 3, start_day).unwrap();
    let end = NaiveDate::from_ymd_opt(2026, 3, end_day).unwrap();
    TimeRange::from_dates(start, end).unwrap()
}

/// Builds a booking request with sensible defaults for tests.
///
/// # Panics
///
/// Panics if the request fails validation.
#[must_use]
pub fn test_request(client: &str, room_id: Option<i64>, period: TimeRange) -> BookingRequest {
    let builder = BookingRequest::builder(client, period).headcount(Headcount::new(10, 2));
    let builder = match room_id {
        Some(id) => builder.room(id),
        None => builder,
    };
    builder.build().unwrap()
}
