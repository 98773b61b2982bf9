//! Booking persistence and range-overlap queries.
//!
//! The write helpers here take a raw connection so the workflow module
//! can run them inside an IMMEDIATE transaction. Every write that binds
//! a room passes through the schema's overlap triggers; a trigger abort
//! is translated into [`Error::DoubleBooking`] so callers can tell a
//! lost race from a genuine failure.

use rusqlite::{params, params_from_iter, Connection, OptionalExtension};

use crate::booking::{Booking, BookingRequest, BookingStatus, CateringOptions, Headcount};
use crate::error::{Error, Result};
use crate::timerange::TimeRange;

use super::connection::Database;
use super::rooms::related_room_ids;
use super::schema::OVERLAP_ABORT_MARKER;
use super::{datetime_from_unix, now_unix};

const BOOKING_COLUMNS: &str = "id, room_id, tenant_id, client_name, client_email, \
     client_contact, client_phone, start_at, end_at, status, num_learners, \
     num_facilitators, coffee_tea_station, stationery, water_bottles, \
     morning_catering, lunch_catering, catering_notes, devices_needed, \
     device_type_preference, assignment_notes, created_by, created_at, updated_at";

const INSERT_BOOKING: &str = r"
    INSERT INTO bookings
    (room_id, tenant_id, client_name, client_email, client_contact, client_phone,
     start_at, end_at, status, num_learners, num_facilitators, coffee_tea_station,
     stationery, water_bottles, morning_catering, lunch_catering, catering_notes,
     devices_needed, device_type_preference, assignment_notes, created_by,
     created_at, updated_at)
    VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
";

const UPDATE_ROOM: &str = r"
    UPDATE bookings
    SET room_id = ?, status = ?, assignment_notes = ?, updated_at = ?
    WHERE id = ?
";

const UPDATE_STATUS: &str = r"
    UPDATE bookings SET status = ?, updated_at = ? WHERE id = ?
";

const UPDATE_STATUS_AND_NOTES: &str = r"
    UPDATE bookings SET status = ?, assignment_notes = ?, updated_at = ? WHERE id = ?
";

/// Deserializes a booking from a row selected with [`BOOKING_COLUMNS`].
pub(crate) fn row_to_booking(row: &rusqlite::Row<'_>) -> rusqlite::Result<Booking> {
    let start_secs: i64 = row.get(7)?;
    let end_secs: i64 = row.get(8)?;
    let period = TimeRange::from_unix(start_secs, end_secs)
        .map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))?;

    let status: String = row.get(9)?;
    let status: BookingStatus = status
        .parse()
        .map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))?;

    Ok(Booking {
        id: row.get(0)?,
        room_id: row.get(1)?,
        tenant_id: row.get(2)?,
        client_name: row.get(3)?,
        client_email: row.get(4)?,
        client_contact: row.get(5)?,
        client_phone: row.get(6)?,
        period,
        status,
        headcount: Headcount {
            learners: row.get(10)?,
            facilitators: row.get(11)?,
        },
        catering: CateringOptions {
            coffee_tea_station: row.get(12)?,
            stationery: row.get(13)?,
            water_bottles: row.get(14)?,
            morning_catering: row.get(15)?,
            lunch_catering: row.get(16)?,
        },
        catering_notes: row.get(17)?,
        devices_needed: row.get(18)?,
        device_type_preference: row.get(19)?,
        assignment_notes: row.get(20)?,
        created_by: row.get(21)?,
        created_at: datetime_from_unix(row.get(22)?)?,
        updated_at: datetime_from_unix(row.get(23)?)?,
    })
}

/// Translates an overlap-trigger abort into a domain conflict error.
fn map_write_error(err: rusqlite::Error, room_id: i64, period: &TimeRange) -> Error {
    if let rusqlite::Error::SqliteFailure(_, Some(ref message)) = err {
        if message.contains(OVERLAP_ABORT_MARKER) {
            return Error::DoubleBooking {
                room_id,
                period: period.to_string(),
                message: message.clone(),
            };
        }
    }
    Error::Database(err)
}

/// Inserts a booking row with the given initial status.
///
/// Runs inside whatever transaction `conn` currently holds. A trigger
/// abort on a room-bound insert becomes [`Error::DoubleBooking`].
pub(crate) fn insert_booking(
    conn: &Connection,
    request: &BookingRequest,
    status: BookingStatus,
    assignment_notes: Option<&str>,
) -> Result<i64> {
    let now = now_unix();
    conn.execute(
        INSERT_BOOKING,
        params![
            request.room_id,
            request.tenant_id,
            request.client_name,
            request.client_email,
            request.client_contact,
            request.client_phone,
            request.period.start_unix(),
            request.period.end_unix(),
            status.as_str(),
            request.headcount.learners,
            request.headcount.facilitators,
            request.catering.coffee_tea_station,
            request.catering.stationery,
            request.catering.water_bottles,
            request.catering.morning_catering,
            request.catering.lunch_catering,
            request.catering_notes,
            request.devices_needed,
            request.device_type_preference,
            assignment_notes,
            request.created_by,
            now,
            now,
        ],
    )
    .map_err(|e| match request.room_id {
        Some(room_id) => map_write_error(e, room_id, &request.period),
        None => Error::Database(e),
    })?;
    Ok(conn.last_insert_rowid())
}

/// Binds a room to a booking, moving it to the given status.
///
/// A trigger abort becomes [`Error::DoubleBooking`]. `assignment_notes`
/// replaces the stored notes wholesale; the caller composes the new
/// text from the old.
pub(crate) fn update_booking_room(
    conn: &Connection,
    booking_id: i64,
    room_id: i64,
    status: BookingStatus,
    assignment_notes: Option<&str>,
    period: &TimeRange,
) -> Result<()> {
    let changed = conn
        .execute(
            UPDATE_ROOM,
            params![
                room_id,
                status.as_str(),
                assignment_notes,
                now_unix(),
                booking_id
            ],
        )
        .map_err(|e| map_write_error(e, room_id, period))?;
    if changed == 0 {
        return Err(Error::not_found("booking", booking_id.to_string()));
    }
    Ok(())
}

/// Updates a booking's status, optionally replacing its notes.
pub(crate) fn update_booking_status(
    conn: &Connection,
    booking_id: i64,
    status: BookingStatus,
    assignment_notes: Option<&str>,
) -> Result<()> {
    let changed = match assignment_notes {
        Some(notes) => conn.execute(
            UPDATE_STATUS_AND_NOTES,
            params![status.as_str(), notes, now_unix(), booking_id],
        )?,
        None => conn.execute(UPDATE_STATUS, params![status.as_str(), now_unix(), booking_id])?,
    };
    if changed == 0 {
        return Err(Error::not_found("booking", booking_id.to_string()));
    }
    Ok(())
}

/// Looks up a booking by id on a raw connection.
pub(crate) fn booking_by_id(conn: &Connection, booking_id: i64) -> Result<Option<Booking>> {
    let sql = format!("SELECT {BOOKING_COLUMNS} FROM bookings WHERE id = ?");
    let booking = conn
        .query_row(&sql, [booking_id], row_to_booking)
        .optional()?;
    Ok(booking)
}

/// Finds the bookings that occupy a room (or any combinability-related
/// room) for some part of the given period.
///
/// Terminal and room-less bookings never conflict. `exclude` omits one
/// booking from the scan, used when re-checking a booking against
/// everything but itself.
pub(crate) fn conflicts_for_room(
    conn: &Connection,
    room_id: i64,
    period: &TimeRange,
    exclude: Option<i64>,
) -> Result<Vec<Booking>> {
    let related = related_room_ids(conn, room_id)?;
    let placeholders = vec!["?"; related.len()].join(", ");
    let sql = format!(
        "SELECT {BOOKING_COLUMNS} FROM bookings
         WHERE room_id IN ({placeholders})
           AND status NOT IN ('Rejected', 'Cancelled')
           AND start_at < ? AND ? < end_at
           AND id <> ?
         ORDER BY start_at"
    );

    let mut bind: Vec<i64> = related;
    bind.push(period.end_unix());
    bind.push(period.start_unix());
    bind.push(exclude.unwrap_or(-1));

    let mut stmt = conn.prepare_cached(&sql)?;
    let bookings = stmt
        .query_map(params_from_iter(bind), row_to_booking)?
        .collect::<rusqlite::Result<_>>()?;
    Ok(bookings)
}

impl Database {
    /// Looks up a booking by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn booking(&self, booking_id: i64) -> Result<Option<Booking>> {
        booking_by_id(&self.conn, booking_id)
    }

    /// Lists all bookings ordered by start time.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn list_bookings(&self) -> Result<Vec<Booking>> {
        let sql = format!("SELECT {BOOKING_COLUMNS} FROM bookings ORDER BY start_at, id");
        let mut stmt = self.conn.prepare_cached(&sql)?;
        let bookings = stmt
            .query_map([], row_to_booking)?
            .collect::<rusqlite::Result<_>>()?;
        Ok(bookings)
    }

    /// Lists `Pending` bookings, oldest first, for the assignment queue.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn pending_bookings(&self) -> Result<Vec<Booking>> {
        let sql = format!(
            "SELECT {BOOKING_COLUMNS} FROM bookings
             WHERE status = 'Pending'
             ORDER BY created_at, id"
        );
        let mut stmt = self.conn.prepare_cached(&sql)?;
        let bookings = stmt
            .query_map([], row_to_booking)?
            .collect::<rusqlite::Result<_>>()?;
        Ok(bookings)
    }

    /// Lists non-terminal room-bound bookings overlapping a period.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn occupying_bookings_in(&self, period: &TimeRange) -> Result<Vec<Booking>> {
        let sql = format!(
            "SELECT {BOOKING_COLUMNS} FROM bookings
             WHERE room_id IS NOT NULL
               AND status NOT IN ('Rejected', 'Cancelled')
               AND start_at < ? AND ? < end_at
             ORDER BY start_at, id"
        );
        let mut stmt = self.conn.prepare_cached(&sql)?;
        let bookings = stmt
            .query_map(
                params![period.end_unix(), period.start_unix()],
                row_to_booking,
            )?
            .collect::<rusqlite::Result<_>>()?;
        Ok(bookings)
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_util::{create_test_database, sample_range, test_request};
    use super::*;

    #[test]
    fn test_insert_and_fetch_booking() {
        let db = create_test_database();
        let room = db.create_room("Atrium East", 40).unwrap();
        let request = test_request("Acme", Some(room.id), sample_range(2, 4));

        let id = insert_booking(
            db.connection(),
            &request,
            BookingStatus::Pending,
            None,
        )
        .unwrap();

        let booking = db.booking(id).unwrap().unwrap();
        assert_eq!(booking.room_id, Some(room.id));
        assert_eq!(booking.client_name, "Acme");
        assert_eq!(booking.status, BookingStatus::Pending);
        assert_eq!(booking.period, request.period());
    }

    #[test]
    fn test_contact_and_catering_fields_round_trip() {
        let db = create_test_database();
        let request = BookingRequest::builder("Acme", sample_range(2, 4))
            .email("jo@acme.test")
            .contact("Jo Client")
            .phone("021 555 0100")
            .catering_options(CateringOptions {
                morning_catering: true,
                water_bottles: true,
                ..CateringOptions::default()
            })
            .catering("no dairy")
            .build()
            .unwrap();
        let id = insert_booking(db.connection(), &request, BookingStatus::Pending, None).unwrap();

        let booking = db.booking(id).unwrap().unwrap();
        assert_eq!(booking.client_contact.as_deref(), Some("Jo Client"));
        assert_eq!(booking.client_phone.as_deref(), Some("021 555 0100"));
        assert!(booking.catering.morning_catering);
        assert!(booking.catering.water_bottles);
        assert!(!booking.catering.lunch_catering);
        assert_eq!(booking.catering_notes.as_deref(), Some("no dairy"));
    }

    #[test]
    fn test_roomless_booking_insert() {
        let db = create_test_database();
        let request = test_request("Acme", None, sample_range(2, 4));
        let id = insert_booking(db.connection(), &request, BookingStatus::Pending, None).unwrap();
        let booking = db.booking(id).unwrap().unwrap();
        assert_eq!(booking.room_id, None);
        assert!(!booking.occupies_room());
    }

    #[test]
    fn test_overlap_trigger_blocks_same_room() {
        let db = create_test_database();
        let room = db.create_room("Atrium East", 40).unwrap();

        let first = test_request("Acme", Some(room.id), sample_range(2, 4));
        insert_booking(db.connection(), &first, BookingStatus::Confirmed, None).unwrap();

        let second = test_request("Globex", Some(room.id), sample_range(3, 5));
        let err = insert_booking(db.connection(), &second, BookingStatus::Pending, None)
            .unwrap_err();
        assert!(err.is_conflict());
    }

    #[test]
    fn test_overlap_trigger_ignores_terminal_bookings() {
        let db = create_test_database();
        let room = db.create_room("Atrium East", 40).unwrap();

        let first = test_request("Acme", Some(room.id), sample_range(2, 4));
        insert_booking(db.connection(), &first, BookingStatus::Cancelled, None).unwrap();

        let second = test_request("Globex", Some(room.id), sample_range(3, 5));
        insert_booking(db.connection(), &second, BookingStatus::Pending, None).unwrap();
    }

    #[test]
    fn test_overlap_trigger_covers_related_rooms() {
        let db = create_test_database();
        let combined = db.create_room("Atrium (combined)", 80).unwrap();
        let east = db.create_room("Atrium East", 40).unwrap();
        db.link_rooms(combined.id, east.id).unwrap();

        let first = test_request("Acme", Some(east.id), sample_range(2, 4));
        insert_booking(db.connection(), &first, BookingStatus::Confirmed, None).unwrap();

        let second = test_request("Globex", Some(combined.id), sample_range(2, 4));
        let err = insert_booking(db.connection(), &second, BookingStatus::Pending, None)
            .unwrap_err();
        assert!(err.is_conflict());
    }

    #[test]
    fn test_overlap_trigger_allows_siblings() {
        let db = create_test_database();
        let combined = db.create_room("Atrium (combined)", 80).unwrap();
        let east = db.create_room("Atrium East", 40).unwrap();
        let west = db.create_room("Atrium West", 40).unwrap();
        db.link_rooms(combined.id, east.id).unwrap();
        db.link_rooms(combined.id, west.id).unwrap();

        let first = test_request("Acme", Some(east.id), sample_range(2, 4));
        insert_booking(db.connection(), &first, BookingStatus::Confirmed, None).unwrap();

        // The west half is independent of the east half.
        let second = test_request("Globex", Some(west.id), sample_range(2, 4));
        insert_booking(db.connection(), &second, BookingStatus::Confirmed, None).unwrap();
    }

    #[test]
    fn test_overlap_trigger_allows_back_to_back() {
        use chrono::{TimeZone, Utc};

        let db = create_test_database();
        let room = db.create_room("Atrium East", 40).unwrap();

        let morning = TimeRange::new(
            Utc.with_ymd_and_hms(2026, 3, 2, 9, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2026, 3, 2, 12, 0, 0).unwrap(),
        )
        .unwrap();
        let afternoon = TimeRange::new(
            Utc.with_ymd_and_hms(2026, 3, 2, 12, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2026, 3, 2, 16, 0, 0).unwrap(),
        )
        .unwrap();

        let first = test_request("Acme", Some(room.id), morning);
        insert_booking(db.connection(), &first, BookingStatus::Confirmed, None).unwrap();

        // Starts at the instant the first one ends; half-open, so no clash.
        let second = test_request("Globex", Some(room.id), afternoon);
        insert_booking(db.connection(), &second, BookingStatus::Confirmed, None).unwrap();
    }

    #[test]
    fn test_update_trigger_blocks_room_bind_into_overlap() {
        let db = create_test_database();
        let room = db.create_room("Atrium East", 40).unwrap();

        let first = test_request("Acme", Some(room.id), sample_range(2, 4));
        insert_booking(db.connection(), &first, BookingStatus::Confirmed, None).unwrap();

        let second = test_request("Globex", None, sample_range(3, 5));
        let id = insert_booking(db.connection(), &second, BookingStatus::Pending, None).unwrap();

        let err = update_booking_room(
            db.connection(),
            id,
            room.id,
            BookingStatus::RoomAssigned,
            None,
            &sample_range(3, 5),
        )
        .unwrap_err();
        assert!(err.is_conflict());
    }

    #[test]
    fn test_conflicts_for_room_excludes_self() {
        let db = create_test_database();
        let room = db.create_room("Atrium East", 40).unwrap();
        let request = test_request("Acme", Some(room.id), sample_range(2, 4));
        let id = insert_booking(db.connection(), &request, BookingStatus::Confirmed, None).unwrap();

        let all = conflicts_for_room(db.connection(), room.id, &sample_range(2, 4), None).unwrap();
        assert_eq!(all.len(), 1);

        let excluding =
            conflicts_for_room(db.connection(), room.id, &sample_range(2, 4), Some(id)).unwrap();
        assert!(excluding.is_empty());
    }

    #[test]
    fn test_update_booking_status() {
        let db = create_test_database();
        let request = test_request("Acme", None, sample_range(2, 4));
        let id = insert_booking(db.connection(), &request, BookingStatus::Pending, None).unwrap();

        update_booking_status(
            db.connection(),
            id,
            BookingStatus::Rejected,
            Some("Rejected by ops: no rooms"),
        )
        .unwrap();

        let booking = db.booking(id).unwrap().unwrap();
        assert_eq!(booking.status, BookingStatus::Rejected);
        assert_eq!(
            booking.assignment_notes.as_deref(),
            Some("Rejected by ops: no rooms")
        );
    }

    #[test]
    fn test_update_missing_booking_not_found() {
        let db = create_test_database();
        let result = update_booking_status(db.connection(), 999, BookingStatus::Cancelled, None);
        assert!(matches!(result, Err(Error::NotFound { .. })));
    }

    #[test]
    fn test_pending_queue_order() {
        let db = create_test_database();
        let a = insert_booking(
            db.connection(),
            &test_request("First", None, sample_range(2, 3)),
            BookingStatus::Pending,
            None,
        )
        .unwrap();
        let b = insert_booking(
            db.connection(),
            &test_request("Second", None, sample_range(5, 6)),
            BookingStatus::Pending,
            None,
        )
        .unwrap();
        insert_booking(
            db.connection(),
            &test_request("Third", None, sample_range(7, 8)),
            BookingStatus::Cancelled,
            None,
        )
        .unwrap();

        let queue = db.pending_bookings().unwrap();
        let ids: Vec<i64> = queue.iter().map(|b| b.id).collect();
        assert_eq!(ids, vec![a, b]);
    }
}
