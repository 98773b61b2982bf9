//! Read-only availability queries.
//!
//! Everything here answers "could this fit?" without changing state.
//! The answers are advisory: between a check and a booking commit
//! another writer may take the slot, so the workflow re-checks inside
//! its transaction and the schema keeps a trigger backstop. Results
//! are plain values, not errors; an occupied room is a normal answer,
//! not a failure.

use serde::Serialize;

use crate::booking::{Booking, BookingStatus, Headcount};
use crate::database::{self, Database};
use crate::device::Device;
use crate::error::{Error, Result};
use crate::room::Room;
use crate::timerange::TimeRange;

/// Utilization ratio above which a capacity check flags the fit.
pub const HIGH_UTILIZATION: f64 = 0.9;

/// One booking standing in the way of a requested slot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BookingConflict {
    /// The conflicting booking.
    pub booking_id: i64,
    /// The room it occupies (possibly a related room, not the one asked
    /// about).
    pub room_id: i64,
    /// Client holding the conflicting booking.
    pub client_name: String,
    /// The occupied period.
    pub period: TimeRange,
    /// Status of the conflicting booking.
    pub status: BookingStatus,
}

impl BookingConflict {
    pub(crate) fn from_booking(booking: &Booking) -> Self {
        Self {
            booking_id: booking.id,
            room_id: booking.room_id.unwrap_or_default(),
            client_name: booking.client_name.clone(),
            period: booking.period,
            status: booking.status,
        }
    }
}

/// Outcome of a room availability check.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum RoomAvailability {
    /// The room and all related rooms are free for the whole period.
    Available,
    /// The slot is taken; every conflicting booking is listed.
    Conflicts(Vec<BookingConflict>),
}

impl RoomAvailability {
    /// Returns true if the slot is free.
    #[must_use]
    pub const fn is_available(&self) -> bool {
        matches!(self, Self::Available)
    }
}

/// Device availability for a category over a period.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeviceAvailability {
    /// How many devices were asked for.
    pub requested: u32,
    /// How many can actually be promised for the period, after both
    /// concrete and placeholder claims.
    pub available: u32,
    /// `requested - available` when the request cannot be met.
    pub shortfall: u32,
    /// Concrete devices not yet claimed for the period. Placeholder
    /// claims reduce `available` but cannot name which of these they
    /// will take.
    pub candidates: Vec<Device>,
}

impl DeviceAvailability {
    /// Returns true if the full requested quantity can be promised.
    #[must_use]
    pub const fn is_sufficient(&self) -> bool {
        self.shortfall == 0
    }
}

/// Advisory result of a capacity check.
///
/// Capacity never blocks a booking; operators overfill rooms routinely
/// for standing-room events.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CapacityCheck {
    /// The room's seated capacity.
    pub capacity: u32,
    /// Total expected attendance.
    pub headcount: u32,
    /// True when attendance is within capacity.
    pub fits: bool,
    /// True when attendance is at or above 90% of capacity.
    pub high_utilization: bool,
}

/// Lists the bookings that conflict with using `room_id` for `period`.
///
/// The scan covers the room itself and every combinability-related
/// room; terminal bookings never conflict; touching endpoints do not
/// conflict. `exclude` omits one booking, used when re-checking a
/// booking against everything but itself.
///
/// # Errors
///
/// Returns [`Error::NotFound`] if the room does not exist.
pub fn room_conflicts(
    db: &Database,
    room_id: i64,
    period: &TimeRange,
    exclude: Option<i64>,
) -> Result<Vec<BookingConflict>> {
    if db.room(room_id)?.is_none() {
        return Err(Error::not_found("room", room_id.to_string()));
    }
    let bookings = database::conflicts_for_room(db.connection(), room_id, period, exclude)?;
    Ok(bookings.iter().map(BookingConflict::from_booking).collect())
}

/// Checks whether a room is free for a period.
///
/// # Errors
///
/// Returns [`Error::NotFound`] if the room does not exist.
pub fn check_room(
    db: &Database,
    room_id: i64,
    period: &TimeRange,
    exclude: Option<i64>,
) -> Result<RoomAvailability> {
    let conflicts = room_conflicts(db, room_id, period, exclude)?;
    if conflicts.is_empty() {
        Ok(RoomAvailability::Available)
    } else {
        Ok(RoomAvailability::Conflicts(conflicts))
    }
}

/// Lists active rooms wholly free for a period.
///
/// # Errors
///
/// Returns an error if a query fails.
pub fn available_rooms(db: &Database, period: &TimeRange) -> Result<Vec<Room>> {
    let mut free = Vec::new();
    for room in db.list_rooms()? {
        if !room.is_active {
            continue;
        }
        let conflicts = database::conflicts_for_room(db.connection(), room.id, period, None)?;
        if conflicts.is_empty() {
            free.push(room);
        }
    }
    Ok(free)
}

/// Computes device availability for a category over a period.
///
/// Candidates are `available`-status devices of the category with no
/// concrete claim overlapping the period. Placeholder claims from
/// overlapping non-terminal bookings reduce the promisable count
/// without naming devices.
///
/// # Errors
///
/// Returns an error if a query fails.
pub fn device_availability(
    db: &Database,
    category: &str,
    requested: u32,
    period: &TimeRange,
) -> Result<DeviceAvailability> {
    let busy = database::busy_device_ids(
        db.connection(),
        category,
        period.start_unix(),
        period.end_unix(),
    )?;
    let candidates: Vec<Device> = db
        .list_devices(Some(category))?
        .into_iter()
        .filter(|d| d.status == crate::device::DeviceStatus::Available)
        .filter(|d| !busy.contains(&d.id))
        .collect();
    let placeholders = database::placeholder_quantity(
        db.connection(),
        category,
        period.start_unix(),
        period.end_unix(),
    )?;

    let candidate_count = u32::try_from(candidates.len()).unwrap_or(u32::MAX);
    let available = candidate_count.saturating_sub(placeholders);
    Ok(DeviceAvailability {
        requested,
        available,
        shortfall: requested.saturating_sub(available),
        candidates,
    })
}

/// Advisory capacity check for a room and expected attendance.
///
/// # Errors
///
/// Returns [`Error::NotFound`] if the room does not exist.
pub fn capacity_check(db: &Database, room_id: i64, headcount: Headcount) -> Result<CapacityCheck> {
    let room = db
        .room(room_id)?
        .ok_or_else(|| Error::not_found("room", room_id.to_string()))?;
    let total = headcount.total();
    #[allow(clippy::cast_precision_loss)]
    let high = room.capacity > 0 && f64::from(total) >= f64::from(room.capacity) * HIGH_UTILIZATION;
    Ok(CapacityCheck {
        capacity: room.capacity,
        headcount: total,
        fits: total <= room.capacity,
        high_utilization: high,
    })
}
