//! Database schema definitions and SQL constants.
//!
//! All table, index, and trigger DDL for the reservation store lives
//! here, together with the schema version constants used by the
//! migrations module.

/// Current schema version for the database.
///
/// Stored in the metadata table and checked on every open.
pub const CURRENT_SCHEMA_VERSION: i32 = 1;

/// Marker text raised by the overlap triggers.
///
/// The storage layer matches on this text to distinguish a lost
/// booking race from any other constraint failure.
pub(crate) const OVERLAP_ABORT_MARKER: &str = "overlapping booking occupies a related room";

/// SQL statement to create the metadata table.
pub const CREATE_METADATA_TABLE: &str = r"
    CREATE TABLE IF NOT EXISTS metadata (
        key TEXT PRIMARY KEY NOT NULL,
        value TEXT NOT NULL
    )";

/// SQL statement to create the rooms table.
pub const CREATE_ROOMS_TABLE: &str = r"
    CREATE TABLE IF NOT EXISTS rooms (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL UNIQUE,
        capacity INTEGER NOT NULL,
        is_active INTEGER NOT NULL DEFAULT 1
    )";

/// SQL statement to create the room combinability table.
///
/// Each row links a combined (parent) room to one of its constituent
/// (child) rooms. The relation is stored one way and read as symmetric.
pub const CREATE_ROOM_DEPENDENCIES_TABLE: &str = r"
    CREATE TABLE IF NOT EXISTS room_dependencies (
        parent_room_id INTEGER NOT NULL REFERENCES rooms(id),
        child_room_id INTEGER NOT NULL REFERENCES rooms(id),
        PRIMARY KEY (parent_room_id, child_room_id),
        CHECK (parent_room_id <> child_room_id)
    )";

/// SQL statement to create the bookings table.
///
/// `room_id` is nullable: a booking may exist (and claim devices) before
/// any room is bound. Periods are half-open `[start_at, end_at)` in Unix
/// seconds. Rows are never deleted; terminal statuses retire them.
pub const CREATE_BOOKINGS_TABLE: &str = r"
    CREATE TABLE IF NOT EXISTS bookings (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        room_id INTEGER REFERENCES rooms(id),
        tenant_id TEXT,
        client_name TEXT NOT NULL,
        client_email TEXT,
        client_contact TEXT,
        client_phone TEXT,
        start_at INTEGER NOT NULL,
        end_at INTEGER NOT NULL,
        status TEXT NOT NULL DEFAULT 'Pending',
        num_learners INTEGER NOT NULL DEFAULT 0,
        num_facilitators INTEGER NOT NULL DEFAULT 0,
        coffee_tea_station INTEGER NOT NULL DEFAULT 0,
        stationery INTEGER NOT NULL DEFAULT 0,
        water_bottles INTEGER NOT NULL DEFAULT 0,
        morning_catering INTEGER NOT NULL DEFAULT 0,
        lunch_catering INTEGER NOT NULL DEFAULT 0,
        catering_notes TEXT,
        devices_needed INTEGER NOT NULL DEFAULT 0,
        device_type_preference TEXT,
        assignment_notes TEXT,
        created_by TEXT,
        created_at INTEGER NOT NULL,
        updated_at INTEGER NOT NULL,
        CHECK (start_at < end_at)
    )";

/// SQL statement to create the devices table.
pub const CREATE_DEVICES_TABLE: &str = r"
    CREATE TABLE IF NOT EXISTS devices (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        serial_number TEXT NOT NULL UNIQUE,
        name TEXT NOT NULL,
        category TEXT NOT NULL,
        status TEXT NOT NULL DEFAULT 'available'
    )";

/// SQL statement to create the device assignments table.
///
/// A NULL `device_id` marks a category-level placeholder claim.
pub const CREATE_DEVICE_ASSIGNMENTS_TABLE: &str = r"
    CREATE TABLE IF NOT EXISTS device_assignments (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        booking_id INTEGER NOT NULL REFERENCES bookings(id),
        device_id INTEGER REFERENCES devices(id),
        category TEXT NOT NULL,
        quantity INTEGER NOT NULL DEFAULT 1,
        assigned_by TEXT,
        is_offsite INTEGER NOT NULL DEFAULT 0,
        notes TEXT,
        assigned_at INTEGER NOT NULL,
        CHECK (quantity > 0)
    )";

/// SQL statement to create the offsite rentals table.
///
/// Dates are stored as ISO-8601 text (`YYYY-MM-DD`). Rental paperwork
/// lives and dies with its assignment; returning a device deletes the
/// assignment and the cascade clears the rental row.
pub const CREATE_OFFSITE_RENTALS_TABLE: &str = r"
    CREATE TABLE IF NOT EXISTS offsite_rentals (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        assignment_id INTEGER NOT NULL
            REFERENCES device_assignments(id) ON DELETE CASCADE,
        rental_no TEXT NOT NULL UNIQUE,
        rental_date TEXT NOT NULL,
        contact_person TEXT NOT NULL,
        contact_number TEXT,
        contact_email TEXT,
        company TEXT,
        address TEXT,
        return_expected_date TEXT
    )";

/// Index speeding up per-room conflict scans.
pub const CREATE_BOOKINGS_ROOM_INDEX: &str =
    "CREATE INDEX IF NOT EXISTS idx_bookings_room ON bookings(room_id)";

/// Index speeding up range-overlap scans.
pub const CREATE_BOOKINGS_RANGE_INDEX: &str =
    "CREATE INDEX IF NOT EXISTS idx_bookings_range ON bookings(start_at, end_at)";

/// Index speeding up status-filtered queues.
pub const CREATE_BOOKINGS_STATUS_INDEX: &str =
    "CREATE INDEX IF NOT EXISTS idx_bookings_status ON bookings(status)";

/// Index speeding up per-booking assignment lookups.
pub const CREATE_ASSIGNMENTS_BOOKING_INDEX: &str =
    "CREATE INDEX IF NOT EXISTS idx_assignments_booking ON device_assignments(booking_id)";

/// Index speeding up per-device assignment lookups.
pub const CREATE_ASSIGNMENTS_DEVICE_INDEX: &str =
    "CREATE INDEX IF NOT EXISTS idx_assignments_device ON device_assignments(device_id)";

/// Trigger aborting an INSERT that would double-book a room.
///
/// This is the storage-level backstop behind the application's own
/// conflict pre-checks: every write still goes through it, so a clear
/// pre-check that loses the race to a concurrent commit is caught here.
/// The guard covers the inserted room and every room related to it
/// through `room_dependencies` in either direction; terminal bookings
/// and room-less bookings are ignored on both sides.
///
/// An authorized override sets the [`SET_OVERRIDE_FLAG`] metadata row
/// for the duration of its own transaction, which disarms the guard.
/// Writers serialize, so the flag is invisible to other connections.
pub const CREATE_OVERLAP_INSERT_TRIGGER: &str = r"
    CREATE TRIGGER IF NOT EXISTS trg_bookings_overlap_insert
    BEFORE INSERT ON bookings
    FOR EACH ROW
    WHEN NEW.room_id IS NOT NULL AND NEW.status NOT IN ('Rejected', 'Cancelled')
         AND NOT EXISTS (SELECT 1 FROM metadata WHERE key = 'overlap_override')
    BEGIN
        SELECT RAISE(ABORT, 'overlapping booking occupies a related room')
        WHERE EXISTS (
            SELECT 1 FROM bookings b
            WHERE b.room_id IS NOT NULL
              AND b.status NOT IN ('Rejected', 'Cancelled')
              AND b.start_at < NEW.end_at
              AND NEW.start_at < b.end_at
              AND (b.room_id = NEW.room_id
                   OR EXISTS (
                       SELECT 1 FROM room_dependencies d
                       WHERE (d.parent_room_id = NEW.room_id AND d.child_room_id = b.room_id)
                          OR (d.child_room_id = NEW.room_id AND d.parent_room_id = b.room_id)))
        );
    END";

/// Trigger aborting an UPDATE that would double-book a room.
///
/// Same guard as the insert trigger, excluding the row being updated.
pub const CREATE_OVERLAP_UPDATE_TRIGGER: &str = r"
    CREATE TRIGGER IF NOT EXISTS trg_bookings_overlap_update
    BEFORE UPDATE OF room_id, start_at, end_at, status ON bookings
    FOR EACH ROW
    WHEN NEW.room_id IS NOT NULL AND NEW.status NOT IN ('Rejected', 'Cancelled')
         AND NOT EXISTS (SELECT 1 FROM metadata WHERE key = 'overlap_override')
    BEGIN
        SELECT RAISE(ABORT, 'overlapping booking occupies a related room')
        WHERE EXISTS (
            SELECT 1 FROM bookings b
            WHERE b.id <> NEW.id
              AND b.room_id IS NOT NULL
              AND b.status NOT IN ('Rejected', 'Cancelled')
              AND b.start_at < NEW.end_at
              AND NEW.start_at < b.end_at
              AND (b.room_id = NEW.room_id
                   OR EXISTS (
                       SELECT 1 FROM room_dependencies d
                       WHERE (d.parent_room_id = NEW.room_id AND d.child_room_id = b.room_id)
                          OR (d.child_room_id = NEW.room_id AND d.parent_room_id = b.room_id)))
        );
    END";

/// Disarms the overlap triggers for the current transaction.
///
/// Must be paired with [`CLEAR_OVERRIDE_FLAG`] before commit.
pub(crate) const SET_OVERRIDE_FLAG: &str =
    "INSERT OR REPLACE INTO metadata (key, value) VALUES ('overlap_override', '1')";

/// Re-arms the overlap triggers.
pub(crate) const CLEAR_OVERRIDE_FLAG: &str =
    "DELETE FROM metadata WHERE key = 'overlap_override'";

/// SQL statement to select the schema version from the metadata table.
pub const SELECT_SCHEMA_VERSION: &str = "SELECT value FROM metadata WHERE key = 'schema_version'";

/// SQL statement to insert or update the schema version in the metadata table.
pub const INSERT_SCHEMA_VERSION: &str =
    "INSERT OR REPLACE INTO metadata (key, value) VALUES ('schema_version', ?)";
