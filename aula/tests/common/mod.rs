//! Common test utilities for integration tests.
//!
//! Helpers for opening throwaway databases and building booking
//! fixtures against the public API.

use chrono::{NaiveDate, TimeZone, Utc};

use aula::{BookingRequest, Database, DatabaseConfig, Headcount, TimeRange};

/// Opens a database in a temporary directory that lives for the whole
/// test process.
#[allow(dead_code)]
pub fn open_test_database() -> Database {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let path = dir.path().join("test.db");
    // Keep the temp dir alive for the duration of the process.
    std::mem::forget(dir);
    Database::open(DatabaseConfig::new(path)).expect("Failed to open database")
}

/// A whole-day range in March 2026, half-open over facility hours.
#[allow(dead_code)]
pub fn day_range(day: u32) -> TimeRange {
    let date = NaiveDate::from_ymd_opt(2026, 3, day).expect("invalid test day");
    TimeRange::from_dates(date, date).expect("invalid test range")
}

/// An hour-bounded range on one March 2026 day.
#[allow(dead_code)]
pub fn hour_range(day: u32, start_hour: u32, end_hour: u32) -> TimeRange {
    let start = Utc
        .with_ymd_and_hms(2026, 3, day, start_hour, 0, 0)
        .unwrap();
    let end = Utc.with_ymd_and_hms(2026, 3, day, end_hour, 0, 0).unwrap();
    TimeRange::new(start, end).expect("invalid test range")
}

/// A minimal valid request for a client, optionally naming a room.
#[allow(dead_code)]
pub fn request(client: &str, room_id: Option<i64>, period: TimeRange) -> BookingRequest {
    let mut builder =
        BookingRequest::builder(client, period).headcount(Headcount::new(10, 2));
    if let Some(id) = room_id {
        builder = builder.room(id);
    }
    builder.build().expect("request should validate")
}
