//! Database schema management and migrations.
//!
//! This module handles schema initialization, version checking, and the
//! migration entry point consulted on every connection open.

use rusqlite::Connection;

use crate::error::{Error, Result};

use super::schema::{
    CREATE_ASSIGNMENTS_BOOKING_INDEX, CREATE_ASSIGNMENTS_DEVICE_INDEX,
    CREATE_BOOKINGS_RANGE_INDEX, CREATE_BOOKINGS_ROOM_INDEX, CREATE_BOOKINGS_STATUS_INDEX,
    CREATE_BOOKINGS_TABLE, CREATE_DEVICES_TABLE, CREATE_DEVICE_ASSIGNMENTS_TABLE,
    CREATE_METADATA_TABLE, CREATE_OFFSITE_RENTALS_TABLE, CREATE_OVERLAP_INSERT_TRIGGER,
    CREATE_OVERLAP_UPDATE_TRIGGER, CREATE_ROOMS_TABLE, CREATE_ROOM_DEPENDENCIES_TABLE,
    CURRENT_SCHEMA_VERSION, INSERT_SCHEMA_VERSION, SELECT_SCHEMA_VERSION,
};

/// Initializes the database schema.
///
/// Creates all tables, indices, overlap triggers, and the version
/// metadata for a fresh database.
///
/// # Errors
///
/// Returns an error if any SQL statement fails to execute.
pub fn initialize_schema(conn: &Connection) -> Result<()> {
    conn.execute(CREATE_METADATA_TABLE, [])?;

    conn.execute(CREATE_ROOMS_TABLE, [])?;
    conn.execute(CREATE_ROOM_DEPENDENCIES_TABLE, [])?;
    conn.execute(CREATE_BOOKINGS_TABLE, [])?;
    conn.execute(CREATE_DEVICES_TABLE, [])?;
    conn.execute(CREATE_DEVICE_ASSIGNMENTS_TABLE, [])?;
    conn.execute(CREATE_OFFSITE_RENTALS_TABLE, [])?;

    conn.execute(CREATE_BOOKINGS_ROOM_INDEX, [])?;
    conn.execute(CREATE_BOOKINGS_RANGE_INDEX, [])?;
    conn.execute(CREATE_BOOKINGS_STATUS_INDEX, [])?;
    conn.execute(CREATE_ASSIGNMENTS_BOOKING_INDEX, [])?;
    conn.execute(CREATE_ASSIGNMENTS_DEVICE_INDEX, [])?;

    conn.execute(CREATE_OVERLAP_INSERT_TRIGGER, [])?;
    conn.execute(CREATE_OVERLAP_UPDATE_TRIGGER, [])?;

    conn.execute(INSERT_SCHEMA_VERSION, [CURRENT_SCHEMA_VERSION])?;

    Ok(())
}

/// Gets the current schema version from the database.
///
/// # Errors
///
/// Returns an error if the query fails for reasons other than
/// "no rows returned" or a missing metadata table (both report 0).
pub fn get_schema_version(conn: &Connection) -> Result<i32> {
    match conn.query_row(SELECT_SCHEMA_VERSION, [], |row| {
        let value: String = row.get(0)?;
        value
            .parse::<i32>()
            .map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))
    }) {
        Ok(version) => Ok(version),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(0),
        Err(e) => {
            if let rusqlite::Error::SqliteFailure(ref sqlite_err, _) = e {
                if sqlite_err.code == rusqlite::ErrorCode::Unknown {
                    // Metadata table doesn't exist yet
                    return Ok(0);
                }
            }
            Err(e.into())
        }
    }
}

/// Checks schema compatibility and initializes if needed.
///
/// A fresh database (version 0) is initialized in place. A database
/// written by a different version of this crate is rejected with
/// [`Error::SchemaVersion`].
///
/// # Errors
///
/// Returns an error if the version is incompatible or initialization
/// fails.
pub fn check_schema_compatibility(conn: &Connection) -> Result<()> {
    let version = get_schema_version(conn)?;

    if version == 0 {
        initialize_schema(conn)?;
    } else if version < CURRENT_SCHEMA_VERSION {
        return Err(Error::SchemaVersion {
            found: version,
            supported: CURRENT_SCHEMA_VERSION,
            message: "database is older than this build and migration is not yet implemented"
                .into(),
        });
    } else if version > CURRENT_SCHEMA_VERSION {
        return Err(Error::SchemaVersion {
            found: version,
            supported: CURRENT_SCHEMA_VERSION,
            message: "database was written by a newer build; upgrade this client".into(),
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_connection() -> Connection {
        Connection::open_in_memory().unwrap()
    }

    #[test]
    fn test_initialize_schema() {
        let conn = create_test_connection();
        initialize_schema(&conn).unwrap();

        let version = get_schema_version(&conn).unwrap();
        assert_eq!(version, CURRENT_SCHEMA_VERSION);

        for table in [
            "rooms",
            "room_dependencies",
            "bookings",
            "devices",
            "device_assignments",
            "offsite_rentals",
        ] {
            let count: i32 = conn
                .query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| {
                    row.get(0)
                })
                .unwrap();
            assert_eq!(count, 0, "table {table} should exist and be empty");
        }
    }

    #[test]
    fn test_get_schema_version_uninitialized() {
        let conn = create_test_connection();
        assert_eq!(get_schema_version(&conn).unwrap(), 0);
    }

    #[test]
    fn test_check_schema_compatibility_fresh_database() {
        let conn = create_test_connection();
        check_schema_compatibility(&conn).unwrap();
        assert_eq!(get_schema_version(&conn).unwrap(), CURRENT_SCHEMA_VERSION);
    }

    #[test]
    fn test_check_schema_compatibility_newer_version() {
        let conn = create_test_connection();
        initialize_schema(&conn).unwrap();

        conn.execute(
            "UPDATE metadata SET value = '999' WHERE key = 'schema_version'",
            [],
        )
        .unwrap();

        let result = check_schema_compatibility(&conn);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("newer build"));
    }

    #[test]
    fn test_schema_creates_overlap_triggers() {
        let conn = create_test_connection();
        initialize_schema(&conn).unwrap();

        let trigger_count: i32 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'trigger' AND name LIKE 'trg_bookings_overlap_%'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(trigger_count, 2);
    }

    #[test]
    fn test_schema_creates_all_indices() {
        let conn = create_test_connection();
        initialize_schema(&conn).unwrap();

        let index_count: i32 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'index' AND name LIKE 'idx_%'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(index_count, 5);
    }

    #[test]
    fn test_initialize_schema_is_idempotent() {
        let conn = create_test_connection();
        initialize_schema(&conn).unwrap();
        initialize_schema(&conn).unwrap();
    }
}
