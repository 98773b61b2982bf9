//! Device assignment and reallocation operations.
//!
//! Devices are claimed two ways: a placeholder row reserves a quantity
//! of a category without naming units, and a concrete assignment binds
//! one physical device. Assigning a device to a booking that holds a
//! matching placeholder consumes one placeholder unit in the same
//! transaction, so the claim total never double-counts.

use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

use crate::booking::Booking;
use crate::database::{self, booking_by_id, Database};
use crate::device::{DeviceAssignment, DeviceStatus};
use crate::error::{Error, Result};
use crate::timerange::TimeRange;
use rusqlite::TransactionBehavior;

/// Options for [`assign_device`].
#[derive(Debug, Clone)]
pub struct AssignDeviceOptions {
    /// The booking receiving the device.
    pub booking_id: i64,
    /// The device to bind.
    pub device_id: i64,
    /// Operator performing the assignment.
    pub assigned_by: Option<String>,
    /// True when the device leaves the facility.
    pub is_offsite: bool,
    /// Free-text notes.
    pub notes: Option<String>,
}

/// Outcome of [`assign_device`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum DeviceAssignDecision {
    /// The device was bound.
    Assigned {
        /// Id of the new assignment row.
        assignment_id: i64,
    },
    /// The device is already claimed by an overlapping booking.
    /// Nothing was written; unassign or reallocate the listed claims
    /// first.
    Conflicts(Vec<DeviceAssignment>),
}

/// Where a booking stood, relative to the clock, when its device was
/// taken away.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ReallocationTiming {
    /// The source booking had not started yet.
    NotStarted,
    /// The source booking was underway. The move still happens; the
    /// timing is advisory so the operator knows a running session just
    /// lost equipment.
    InProgress,
    /// The source booking had already ended.
    Completed,
}

impl ReallocationTiming {
    fn classify(period: &TimeRange, now: DateTime<Utc>) -> Self {
        if period.ends_before(now) {
            Self::Completed
        } else if period.started_by(now) {
            Self::InProgress
        } else {
            Self::NotStarted
        }
    }
}

impl fmt::Display for ReallocationTiming {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::NotStarted => "not started",
            Self::InProgress => "in progress",
            Self::Completed => "completed",
        };
        f.write_str(text)
    }
}

/// Options for [`reallocate`].
#[derive(Debug, Clone)]
pub struct ReallocateOptions {
    /// The concrete assignment to move.
    pub assignment_id: i64,
    /// The booking receiving the device.
    pub to_booking_id: i64,
    /// Operator performing the move.
    pub performed_by: Option<String>,
    /// Why the device was taken from its source booking.
    pub reason: Option<String>,
}

impl ReallocateOptions {
    /// Creates options with no actor or reason recorded.
    #[must_use]
    pub const fn new(assignment_id: i64, to_booking_id: i64) -> Self {
        Self {
            assignment_id,
            to_booking_id,
            performed_by: None,
            reason: None,
        }
    }
}

/// Result of [`reallocate`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Reallocation {
    /// The moved assignment.
    pub assignment_id: i64,
    /// The booking that lost the device.
    pub from_booking_id: i64,
    /// The booking that gained it.
    pub to_booking_id: i64,
    /// Where the source booking stood when the device moved.
    pub timing: ReallocationTiming,
}

/// Stock signal from [`low_stock_check`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StockLevel {
    /// The category checked.
    pub category: String,
    /// Units promisable for the checked day.
    pub available: u32,
    /// The threshold the count was compared against.
    pub threshold: u32,
    /// True when `available` is strictly below the threshold.
    pub low: bool,
}

/// A request to record offsite rental paperwork.
#[derive(Debug, Clone)]
pub struct RentalRequest {
    /// The offsite assignment the rental covers.
    pub assignment_id: i64,
    /// External rental reference number.
    pub rental_no: String,
    /// Date the equipment leaves the facility.
    pub rental_date: NaiveDate,
    /// Named contact at the renting party.
    pub contact_person: String,
    /// Contact phone number.
    pub contact_number: Option<String>,
    /// Contact email address.
    pub contact_email: Option<String>,
    /// Renting company.
    pub company: Option<String>,
    /// Delivery address.
    pub address: Option<String>,
    /// Date the equipment is expected back.
    pub return_expected_date: Option<NaiveDate>,
}

fn require_live_booking(conn: &rusqlite::Connection, booking_id: i64) -> Result<Booking> {
    let booking = booking_by_id(conn, booking_id)?
        .ok_or_else(|| Error::not_found("booking", booking_id.to_string()))?;
    if booking.status.is_terminal() {
        return Err(Error::InvalidTransition {
            booking_id,
            message: format!("booking is terminal ({})", booking.status),
        });
    }
    Ok(booking)
}

/// Binds a concrete device to a booking.
///
/// The device must exist and be in `available` status. If an
/// overlapping non-terminal booking already claims the device, the
/// claims come back as [`DeviceAssignDecision::Conflicts`] and nothing
/// is written. On success, one unit of any matching placeholder claim
/// on the booking is consumed in the same transaction.
///
/// # Errors
///
/// Returns [`Error::NotFound`] for a missing booking or device,
/// [`Error::InvalidTransition`] for a terminal booking, and
/// [`Error::Validation`] for a rented or retired device.
pub fn assign_device(
    db: &mut Database,
    opts: &AssignDeviceOptions,
) -> Result<DeviceAssignDecision> {
    let device = db
        .device(opts.device_id)?
        .ok_or_else(|| Error::not_found("device", opts.device_id.to_string()))?;
    if device.status != DeviceStatus::Available {
        return Err(Error::validation(
            "device_id",
            format!("device {} is {}", device.serial_number, device.status),
        ));
    }

    let tx = db
        .connection_mut()
        .transaction_with_behavior(TransactionBehavior::Immediate)?;

    let booking = require_live_booking(&tx, opts.booking_id)?;

    let claims = database::device_assignments_in(
        &tx,
        device.id,
        booking.period.start_unix(),
        booking.period.end_unix(),
    )?;
    if !claims.is_empty() {
        return Ok(DeviceAssignDecision::Conflicts(claims));
    }

    database::consume_placeholder(&tx, booking.id, &device.category)?;
    let assignment_id = database::insert_assignment(
        &tx,
        booking.id,
        Some(device.id),
        &device.category,
        1,
        opts.assigned_by.as_deref(),
        opts.is_offsite,
        opts.notes.as_deref(),
    )?;

    tx.commit()?;
    log::debug!(
        "device {} assigned to booking {}",
        device.serial_number,
        booking.id
    );
    Ok(DeviceAssignDecision::Assigned { assignment_id })
}

/// Records a category-level placeholder claim on a booking.
///
/// Used for device requests made before specific units are picked,
/// including device-only bookings that never bind a room.
///
/// # Errors
///
/// Returns [`Error::Validation`] for a zero quantity or blank
/// category, [`Error::NotFound`] for a missing booking, and
/// [`Error::InvalidTransition`] for a terminal booking.
pub fn request_devices(
    db: &mut Database,
    booking_id: i64,
    category: &str,
    quantity: u32,
    requested_by: Option<&str>,
) -> Result<i64> {
    if quantity == 0 {
        return Err(Error::validation("quantity", "must be at least 1"));
    }
    if category.trim().is_empty() {
        return Err(Error::validation("category", "must not be blank"));
    }

    let tx = db
        .connection_mut()
        .transaction_with_behavior(TransactionBehavior::Immediate)?;
    require_live_booking(&tx, booking_id)?;
    let id = database::insert_assignment(
        &tx,
        booking_id,
        None,
        category,
        quantity,
        requested_by,
        false,
        None,
    )?;
    tx.commit()?;
    Ok(id)
}

/// Removes an assignment, releasing its claim.
///
/// Works on both concrete assignments and placeholders.
///
/// # Errors
///
/// Returns [`Error::NotFound`] if the assignment does not exist.
pub fn unassign(db: &mut Database, assignment_id: i64) -> Result<()> {
    database::delete_assignment(db.connection(), assignment_id)
}

/// Moves a concrete device assignment to another booking, atomically.
///
/// The target booking must be live and the device must be free for its
/// period (the moving assignment itself excluded). The move is recorded
/// on the assignment's notes, together with the actor and reason when
/// given. The source booking's position relative to `now` is classified
/// and returned; an in-progress source is logged but never blocks the
/// move.
///
/// # Errors
///
/// Returns [`Error::NotFound`] for a missing assignment or target
/// booking, [`Error::Validation`] for a placeholder assignment or a
/// device already claimed over the target period, and
/// [`Error::InvalidTransition`] for a terminal target booking.
pub fn reallocate(
    db: &mut Database,
    opts: &ReallocateOptions,
    now: DateTime<Utc>,
) -> Result<Reallocation> {
    let assignment_id = opts.assignment_id;
    let to_booking_id = opts.to_booking_id;

    let tx = db
        .connection_mut()
        .transaction_with_behavior(TransactionBehavior::Immediate)?;

    let assignment = database::assignment_by_id(&tx, assignment_id)?
        .ok_or_else(|| Error::not_found("assignment", assignment_id.to_string()))?;
    let Some(device_id) = assignment.device_id else {
        return Err(Error::validation(
            "assignment_id",
            "placeholder claims cannot be reallocated; assign a device first",
        ));
    };

    let source = booking_by_id(&tx, assignment.booking_id)?
        .ok_or_else(|| Error::not_found("booking", assignment.booking_id.to_string()))?;
    let target = require_live_booking(&tx, to_booking_id)?;

    let competing: Vec<DeviceAssignment> = database::device_assignments_in(
        &tx,
        device_id,
        target.period.start_unix(),
        target.period.end_unix(),
    )?
    .into_iter()
    .filter(|a| a.id != assignment_id)
    .collect();
    if !competing.is_empty() {
        return Err(Error::validation(
            "device_id",
            format!(
                "device is already claimed for the target period by assignment {}",
                competing[0].id
            ),
        ));
    }

    let mut note = format!("Reallocated from booking {}", source.id);
    if let Some(reason) = opts.reason.as_deref() {
        note.push_str(&format!(". Reason: {reason}"));
    }
    tx.execute(
        "UPDATE device_assignments
         SET booking_id = ?, assigned_by = COALESCE(?, assigned_by), notes = ?
         WHERE id = ?",
        rusqlite::params![to_booking_id, opts.performed_by, note, assignment_id],
    )?;
    tx.commit()?;

    let timing = ReallocationTiming::classify(&source.period, now);
    if timing == ReallocationTiming::InProgress {
        log::warn!(
            "assignment {assignment_id} moved away from booking {} while it is in progress",
            source.id
        );
    }
    Ok(Reallocation {
        assignment_id,
        from_booking_id: source.id,
        to_booking_id,
        timing,
    })
}

/// Lists the live claims on a device over a period.
///
/// # Errors
///
/// Returns [`Error::NotFound`] if the device does not exist.
pub fn device_conflicts(
    db: &Database,
    device_id: i64,
    period: &TimeRange,
) -> Result<Vec<DeviceAssignment>> {
    if db.device(device_id)?.is_none() {
        return Err(Error::not_found("device", device_id.to_string()));
    }
    database::device_assignments_in(
        db.connection(),
        device_id,
        period.start_unix(),
        period.end_unix(),
    )
}

/// Checks promisable stock of a category for one facility day.
///
/// # Errors
///
/// Returns an error if a query fails.
pub fn low_stock_check(
    db: &Database,
    category: &str,
    date: NaiveDate,
    threshold: u32,
) -> Result<StockLevel> {
    let period = TimeRange::from_dates(date, date)
        .map_err(|e| Error::validation("date", e.to_string()))?;
    let availability = crate::availability::device_availability(db, category, 0, &period)?;
    let available = availability.available;
    let low = available < threshold;
    if low {
        log::warn!("low stock: {available} {category}(s) promisable on {date} (threshold {threshold})");
    }
    Ok(StockLevel {
        category: category.to_owned(),
        available,
        threshold,
        low,
    })
}

/// Records offsite rental paperwork for an assignment.
///
/// A concrete device on an offsite rental is marked `rented` in the
/// inventory in the same transaction.
///
/// # Errors
///
/// Returns [`Error::NotFound`] for a missing assignment,
/// [`Error::Validation`] for a non-offsite assignment or blank
/// reference or contact fields.
pub fn create_offsite_rental(db: &mut Database, request: &RentalRequest) -> Result<i64> {
    if request.rental_no.trim().is_empty() {
        return Err(Error::validation("rental_no", "must not be blank"));
    }
    if request.contact_person.trim().is_empty() {
        return Err(Error::validation("contact_person", "must not be blank"));
    }

    let tx = db
        .connection_mut()
        .transaction_with_behavior(TransactionBehavior::Immediate)?;

    let assignment = database::assignment_by_id(&tx, request.assignment_id)?
        .ok_or_else(|| Error::not_found("assignment", request.assignment_id.to_string()))?;
    if !assignment.is_offsite {
        return Err(Error::validation(
            "assignment_id",
            "rental paperwork applies to offsite assignments only",
        ));
    }

    let rental_id = database::insert_rental(
        &tx,
        assignment.id,
        &request.rental_no,
        request.rental_date,
        &request.contact_person,
        request.contact_number.as_deref(),
        request.contact_email.as_deref(),
        request.company.as_deref(),
        request.address.as_deref(),
        request.return_expected_date,
    )?;

    if let Some(device_id) = assignment.device_id {
        tx.execute(
            "UPDATE devices SET status = ? WHERE id = ?",
            rusqlite::params![DeviceStatus::Rented.as_str(), device_id],
        )?;
    }

    tx.commit()?;
    Ok(rental_id)
}

/// Returns a device to the storeroom after an offsite rental.
///
/// Deletes the assignment (clearing the overdue list) and marks a
/// concrete device `available` again.
///
/// # Errors
///
/// Returns [`Error::NotFound`] if the assignment does not exist.
pub fn return_rental(db: &mut Database, assignment_id: i64) -> Result<()> {
    let tx = db
        .connection_mut()
        .transaction_with_behavior(TransactionBehavior::Immediate)?;
    let assignment = database::assignment_by_id(&tx, assignment_id)?
        .ok_or_else(|| Error::not_found("assignment", assignment_id.to_string()))?;
    database::delete_assignment(&tx, assignment_id)?;
    if let Some(device_id) = assignment.device_id {
        tx.execute(
            "UPDATE devices SET status = ? WHERE id = ?",
            rusqlite::params![DeviceStatus::Available.as_str(), device_id],
        )?;
    }
    tx.commit()?;
    Ok(())
}
