//! Device, assignment, and offsite rental persistence.
//!
//! As with bookings, the assignment write helpers take a raw connection
//! so the assignment module can compose them inside one transaction.

use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension};

use crate::device::{Device, DeviceAssignment, DeviceStatus, OffsiteRental};
use crate::error::{Error, Result};

use super::connection::Database;
use super::{datetime_from_unix, now_unix};

const ASSIGNMENT_COLUMNS: &str =
    "id, booking_id, device_id, category, quantity, assigned_by, is_offsite, notes, assigned_at";

const RENTAL_COLUMNS: &str = "id, assignment_id, rental_no, rental_date, contact_person, \
     contact_number, contact_email, company, address, return_expected_date";

const INSERT_DEVICE: &str = r"
    INSERT INTO devices (serial_number, name, category, status)
    VALUES (?, ?, ?, ?)
";

const INSERT_ASSIGNMENT: &str = r"
    INSERT INTO device_assignments
    (booking_id, device_id, category, quantity, assigned_by, is_offsite, notes, assigned_at)
    VALUES (?, ?, ?, ?, ?, ?, ?, ?)
";

const INSERT_RENTAL: &str = r"
    INSERT INTO offsite_rentals
    (assignment_id, rental_no, rental_date, contact_person, contact_number,
     contact_email, company, address, return_expected_date)
    VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
";

fn row_to_device(row: &rusqlite::Row<'_>) -> rusqlite::Result<Device> {
    let status: String = row.get(4)?;
    let status: DeviceStatus = status
        .parse()
        .map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))?;
    Ok(Device {
        id: row.get(0)?,
        serial_number: row.get(1)?,
        name: row.get(2)?,
        category: row.get(3)?,
        status,
    })
}

pub(crate) fn row_to_assignment(row: &rusqlite::Row<'_>) -> rusqlite::Result<DeviceAssignment> {
    Ok(DeviceAssignment {
        id: row.get(0)?,
        booking_id: row.get(1)?,
        device_id: row.get(2)?,
        category: row.get(3)?,
        quantity: row.get(4)?,
        assigned_by: row.get(5)?,
        is_offsite: row.get(6)?,
        notes: row.get(7)?,
        assigned_at: datetime_from_unix(row.get(8)?)?,
    })
}

fn parse_date(text: &str) -> rusqlite::Result<NaiveDate> {
    text.parse()
        .map_err(|e: chrono::ParseError| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))
}

fn row_to_rental(row: &rusqlite::Row<'_>) -> rusqlite::Result<OffsiteRental> {
    let rental_date: String = row.get(3)?;
    let return_expected: Option<String> = row.get(9)?;
    Ok(OffsiteRental {
        id: row.get(0)?,
        assignment_id: row.get(1)?,
        rental_no: row.get(2)?,
        rental_date: parse_date(&rental_date)?,
        contact_person: row.get(4)?,
        contact_number: row.get(5)?,
        contact_email: row.get(6)?,
        company: row.get(7)?,
        address: row.get(8)?,
        return_expected_date: return_expected.as_deref().map(parse_date).transpose()?,
    })
}

/// Inserts an assignment row; `device_id = None` records a placeholder.
pub(crate) fn insert_assignment(
    conn: &Connection,
    booking_id: i64,
    device_id: Option<i64>,
    category: &str,
    quantity: u32,
    assigned_by: Option<&str>,
    is_offsite: bool,
    notes: Option<&str>,
) -> Result<i64> {
    conn.execute(
        INSERT_ASSIGNMENT,
        params![
            booking_id,
            device_id,
            category,
            quantity,
            assigned_by,
            is_offsite,
            notes,
            now_unix(),
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Deletes an assignment row.
pub(crate) fn delete_assignment(conn: &Connection, assignment_id: i64) -> Result<()> {
    let changed = conn.execute(
        "DELETE FROM device_assignments WHERE id = ?",
        [assignment_id],
    )?;
    if changed == 0 {
        return Err(Error::not_found("assignment", assignment_id.to_string()));
    }
    Ok(())
}

/// Looks up an assignment by id.
pub(crate) fn assignment_by_id(
    conn: &Connection,
    assignment_id: i64,
) -> Result<Option<DeviceAssignment>> {
    let sql = format!("SELECT {ASSIGNMENT_COLUMNS} FROM device_assignments WHERE id = ?");
    let assignment = conn
        .query_row(&sql, [assignment_id], row_to_assignment)
        .optional()?;
    Ok(assignment)
}

/// Lists assignments for a booking, placeholders included.
pub(crate) fn assignments_for_booking(
    conn: &Connection,
    booking_id: i64,
) -> Result<Vec<DeviceAssignment>> {
    let sql = format!(
        "SELECT {ASSIGNMENT_COLUMNS} FROM device_assignments
         WHERE booking_id = ? ORDER BY id"
    );
    let mut stmt = conn.prepare_cached(&sql)?;
    let assignments = stmt
        .query_map([booking_id], row_to_assignment)?
        .collect::<rusqlite::Result<_>>()?;
    Ok(assignments)
}

/// Consumes one unit of a placeholder claim for `booking_id`/`category`.
///
/// Decrements a multi-unit placeholder or deletes a single-unit one.
/// Returns false when the booking holds no matching placeholder, which
/// is not an error: a device can be assigned beyond what was requested.
pub(crate) fn consume_placeholder(
    conn: &Connection,
    booking_id: i64,
    category: &str,
) -> Result<bool> {
    let found: Option<(i64, u32)> = conn
        .query_row(
            "SELECT id, quantity FROM device_assignments
             WHERE booking_id = ? AND device_id IS NULL AND category = ?
             ORDER BY id LIMIT 1",
            params![booking_id, category],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .optional()?;

    match found {
        Some((id, quantity)) if quantity > 1 => {
            conn.execute(
                "UPDATE device_assignments SET quantity = quantity - 1 WHERE id = ?",
                [id],
            )?;
            Ok(true)
        }
        Some((id, _)) => {
            conn.execute("DELETE FROM device_assignments WHERE id = ?", [id])?;
            Ok(true)
        }
        None => Ok(false),
    }
}

/// Device ids of a category claimed by a concrete assignment whose
/// booking overlaps the period and is not terminal.
pub(crate) fn busy_device_ids(
    conn: &Connection,
    category: &str,
    start_unix: i64,
    end_unix: i64,
) -> Result<Vec<i64>> {
    let mut stmt = conn.prepare_cached(
        "SELECT DISTINCT a.device_id
         FROM device_assignments a
         JOIN bookings b ON b.id = a.booking_id
         JOIN devices d ON d.id = a.device_id
         WHERE a.device_id IS NOT NULL
           AND d.category = ?
           AND b.status NOT IN ('Rejected', 'Cancelled')
           AND b.start_at < ? AND ? < b.end_at",
    )?;
    let ids = stmt
        .query_map(params![category, end_unix, start_unix], |row| row.get(0))?
        .collect::<rusqlite::Result<_>>()?;
    Ok(ids)
}

/// Total placeholder quantity of a category claimed by bookings that
/// overlap the period and are not terminal.
pub(crate) fn placeholder_quantity(
    conn: &Connection,
    category: &str,
    start_unix: i64,
    end_unix: i64,
) -> Result<u32> {
    let total: Option<u32> = conn.query_row(
        "SELECT SUM(a.quantity)
         FROM device_assignments a
         JOIN bookings b ON b.id = a.booking_id
         WHERE a.device_id IS NULL
           AND a.category = ?
           AND b.status NOT IN ('Rejected', 'Cancelled')
           AND b.start_at < ? AND ? < b.end_at",
        params![category, end_unix, start_unix],
        |row| row.get(0),
    )?;
    Ok(total.unwrap_or(0))
}

/// Assignments binding a specific device into bookings that overlap the
/// period and are not terminal.
pub(crate) fn device_assignments_in(
    conn: &Connection,
    device_id: i64,
    start_unix: i64,
    end_unix: i64,
) -> Result<Vec<DeviceAssignment>> {
    let sql = format!(
        "SELECT {ASSIGNMENT_COLUMNS_PREFIXED} FROM device_assignments a
         JOIN bookings b ON b.id = a.booking_id
         WHERE a.device_id = ?
           AND b.status NOT IN ('Rejected', 'Cancelled')
           AND b.start_at < ? AND ? < b.end_at
         ORDER BY b.start_at",
        ASSIGNMENT_COLUMNS_PREFIXED = "a.id, a.booking_id, a.device_id, a.category, a.quantity, \
             a.assigned_by, a.is_offsite, a.notes, a.assigned_at"
    );
    let mut stmt = conn.prepare_cached(&sql)?;
    let assignments = stmt
        .query_map(params![device_id, end_unix, start_unix], row_to_assignment)?
        .collect::<rusqlite::Result<_>>()?;
    Ok(assignments)
}

/// Inserts an offsite rental record for an assignment.
#[allow(clippy::too_many_arguments)]
pub(crate) fn insert_rental(
    conn: &Connection,
    assignment_id: i64,
    rental_no: &str,
    rental_date: NaiveDate,
    contact_person: &str,
    contact_number: Option<&str>,
    contact_email: Option<&str>,
    company: Option<&str>,
    address: Option<&str>,
    return_expected_date: Option<NaiveDate>,
) -> Result<i64> {
    conn.execute(
        INSERT_RENTAL,
        params![
            assignment_id,
            rental_no,
            rental_date.to_string(),
            contact_person,
            contact_number,
            contact_email,
            company,
            address,
            return_expected_date.map(|d| d.to_string()),
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

impl Database {
    /// Registers a new device as available.
    ///
    /// # Errors
    ///
    /// Returns an error if the serial number is blank or already taken.
    pub fn create_device(&self, serial_number: &str, name: &str, category: &str) -> Result<Device> {
        if serial_number.trim().is_empty() {
            return Err(Error::validation("serial_number", "must not be blank"));
        }
        if category.trim().is_empty() {
            return Err(Error::validation("category", "must not be blank"));
        }
        self.conn.execute(
            INSERT_DEVICE,
            params![serial_number, name, category, DeviceStatus::Available.as_str()],
        )?;
        Ok(Device {
            id: self.conn.last_insert_rowid(),
            serial_number: serial_number.to_owned(),
            name: name.to_owned(),
            category: category.to_owned(),
            status: DeviceStatus::Available,
        })
    }

    /// Looks up a device by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn device(&self, device_id: i64) -> Result<Option<Device>> {
        let sql = "SELECT id, serial_number, name, category, status FROM devices WHERE id = ?";
        let device = self
            .conn
            .query_row(sql, [device_id], row_to_device)
            .optional()?;
        Ok(device)
    }

    /// Looks up a device by serial number.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn device_by_serial(&self, serial_number: &str) -> Result<Option<Device>> {
        let sql =
            "SELECT id, serial_number, name, category, status FROM devices WHERE serial_number = ?";
        let device = self
            .conn
            .query_row(sql, [serial_number], row_to_device)
            .optional()?;
        Ok(device)
    }

    /// Lists devices, optionally filtered by category.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn list_devices(&self, category: Option<&str>) -> Result<Vec<Device>> {
        let devices = match category {
            Some(cat) => {
                let mut stmt = self.conn.prepare_cached(
                    "SELECT id, serial_number, name, category, status FROM devices
                     WHERE category = ? ORDER BY serial_number",
                )?;
                let devices: Vec<Device> = stmt
                    .query_map([cat], row_to_device)?
                    .collect::<rusqlite::Result<_>>()?;
                devices
            }
            None => {
                let mut stmt = self.conn.prepare_cached(
                    "SELECT id, serial_number, name, category, status FROM devices
                     ORDER BY serial_number",
                )?;
                let devices: Vec<Device> = stmt
                    .query_map([], row_to_device)?
                    .collect::<rusqlite::Result<_>>()?;
                devices
            }
        };
        Ok(devices)
    }

    /// Updates a device's inventory status.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if the device does not exist.
    pub fn set_device_status(&self, device_id: i64, status: DeviceStatus) -> Result<()> {
        let changed = self.conn.execute(
            "UPDATE devices SET status = ? WHERE id = ?",
            params![status.as_str(), device_id],
        )?;
        if changed == 0 {
            return Err(Error::not_found("device", device_id.to_string()));
        }
        Ok(())
    }

    /// Lists assignments for a booking, placeholders included.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn booking_assignments(&self, booking_id: i64) -> Result<Vec<DeviceAssignment>> {
        assignments_for_booking(&self.conn, booking_id)
    }

    /// Lists rentals whose expected return date is strictly before
    /// `as_of` and whose assignment is still live.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn overdue_rentals(&self, as_of: NaiveDate) -> Result<Vec<OffsiteRental>> {
        let sql = format!(
            "SELECT {RENTAL_COLUMNS} FROM offsite_rentals r
             WHERE r.return_expected_date IS NOT NULL
               AND r.return_expected_date < ?
               AND EXISTS (SELECT 1 FROM device_assignments a WHERE a.id = r.assignment_id)
             ORDER BY r.return_expected_date",
            RENTAL_COLUMNS = "r.id, r.assignment_id, r.rental_no, r.rental_date, \
                 r.contact_person, r.contact_number, r.contact_email, r.company, r.address, \
                 r.return_expected_date"
        );
        let mut stmt = self.conn.prepare_cached(&sql)?;
        let rentals = stmt
            .query_map([as_of.to_string()], row_to_rental)?
            .collect::<rusqlite::Result<_>>()?;
        Ok(rentals)
    }

    /// Looks up an offsite rental by its reference number.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn rental_by_no(&self, rental_no: &str) -> Result<Option<OffsiteRental>> {
        let sql = format!("SELECT {RENTAL_COLUMNS} FROM offsite_rentals WHERE rental_no = ?");
        let rental = self
            .conn
            .query_row(&sql, [rental_no], row_to_rental)
            .optional()?;
        Ok(rental)
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_util::{create_test_database, sample_range, test_request};
    use super::super::insert_booking;
    use super::*;
    use crate::booking::BookingStatus;

    #[test]
    fn test_create_and_fetch_device() {
        let db = create_test_database();
        let device = db.create_device("LT-001", "Laptop 1", "laptop").unwrap();
        assert_eq!(device.status, DeviceStatus::Available);

        let fetched = db.device(device.id).unwrap().unwrap();
        assert_eq!(fetched, device);
        assert_eq!(
            db.device_by_serial("LT-001").unwrap().unwrap().id,
            device.id
        );
    }

    #[test]
    fn test_duplicate_serial_rejected() {
        let db = create_test_database();
        db.create_device("LT-001", "Laptop 1", "laptop").unwrap();
        assert!(db.create_device("LT-001", "Laptop 1b", "laptop").is_err());
    }

    #[test]
    fn test_list_devices_by_category() {
        let db = create_test_database();
        db.create_device("LT-001", "Laptop 1", "laptop").unwrap();
        db.create_device("PJ-001", "Projector 1", "projector").unwrap();

        let laptops = db.list_devices(Some("laptop")).unwrap();
        assert_eq!(laptops.len(), 1);
        assert_eq!(laptops[0].serial_number, "LT-001");

        let all = db.list_devices(None).unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].serial_number, "LT-001");
        assert_eq!(all[1].serial_number, "PJ-001");
    }

    #[test]
    fn test_placeholder_consumption() {
        let db = create_test_database();
        let booking_id = insert_booking(
            db.connection(),
            &test_request("Acme", None, sample_range(2, 4)),
            BookingStatus::Pending,
            None,
        )
        .unwrap();

        insert_assignment(
            db.connection(),
            booking_id,
            None,
            "laptop",
            2,
            None,
            false,
            None,
        )
        .unwrap();

        // First consumption decrements the quantity.
        assert!(consume_placeholder(db.connection(), booking_id, "laptop").unwrap());
        let remaining = assignments_for_booking(db.connection(), booking_id).unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].quantity, 1);

        // Second consumption deletes the row.
        assert!(consume_placeholder(db.connection(), booking_id, "laptop").unwrap());
        assert!(assignments_for_booking(db.connection(), booking_id)
            .unwrap()
            .is_empty());

        // Nothing left to consume.
        assert!(!consume_placeholder(db.connection(), booking_id, "laptop").unwrap());
    }

    #[test]
    fn test_busy_and_placeholder_counts() {
        let db = create_test_database();
        let device = db.create_device("LT-001", "Laptop 1", "laptop").unwrap();
        let range = sample_range(2, 4);
        let booking_id = insert_booking(
            db.connection(),
            &test_request("Acme", None, range),
            BookingStatus::Pending,
            None,
        )
        .unwrap();

        insert_assignment(
            db.connection(),
            booking_id,
            Some(device.id),
            "laptop",
            1,
            None,
            false,
            None,
        )
        .unwrap();
        insert_assignment(
            db.connection(),
            booking_id,
            None,
            "laptop",
            3,
            None,
            false,
            None,
        )
        .unwrap();

        let busy = busy_device_ids(
            db.connection(),
            "laptop",
            range.start_unix(),
            range.end_unix(),
        )
        .unwrap();
        assert_eq!(busy, vec![device.id]);

        let placeholders = placeholder_quantity(
            db.connection(),
            "laptop",
            range.start_unix(),
            range.end_unix(),
        )
        .unwrap();
        assert_eq!(placeholders, 3);

        // A disjoint period sees no claims.
        let later = sample_range(10, 12);
        assert!(busy_device_ids(
            db.connection(),
            "laptop",
            later.start_unix(),
            later.end_unix()
        )
        .unwrap()
        .is_empty());
    }

    #[test]
    fn test_terminal_bookings_release_claims() {
        let db = create_test_database();
        let device = db.create_device("LT-001", "Laptop 1", "laptop").unwrap();
        let range = sample_range(2, 4);
        let booking_id = insert_booking(
            db.connection(),
            &test_request("Acme", None, range),
            BookingStatus::Cancelled,
            None,
        )
        .unwrap();
        insert_assignment(
            db.connection(),
            booking_id,
            Some(device.id),
            "laptop",
            1,
            None,
            false,
            None,
        )
        .unwrap();

        assert!(busy_device_ids(
            db.connection(),
            "laptop",
            range.start_unix(),
            range.end_unix()
        )
        .unwrap()
        .is_empty());
    }

    #[test]
    fn test_overdue_rentals() {
        let db = create_test_database();
        let booking_id = insert_booking(
            db.connection(),
            &test_request("Acme", None, sample_range(2, 4)),
            BookingStatus::Confirmed,
            None,
        )
        .unwrap();
        let assignment_id = insert_assignment(
            db.connection(),
            booking_id,
            None,
            "laptop",
            2,
            None,
            true,
            None,
        )
        .unwrap();

        let rental_date = NaiveDate::from_ymd_opt(2026, 3, 2).unwrap();
        let expected_back = NaiveDate::from_ymd_opt(2026, 3, 6).unwrap();
        insert_rental(
            db.connection(),
            assignment_id,
            "R-2026-001",
            rental_date,
            "Jo Client",
            None,
            None,
            Some("Acme"),
            None,
            Some(expected_back),
        )
        .unwrap();

        // Not yet overdue on the expected day itself.
        assert!(db.overdue_rentals(expected_back).unwrap().is_empty());

        let next_day = expected_back.succ_opt().unwrap();
        let overdue = db.overdue_rentals(next_day).unwrap();
        assert_eq!(overdue.len(), 1);
        assert_eq!(overdue[0].rental_no, "R-2026-001");

        // Returning (unassigning) clears the overdue list.
        delete_assignment(db.connection(), assignment_id).unwrap();
        assert!(db.overdue_rentals(next_day).unwrap().is_empty());
    }
}
