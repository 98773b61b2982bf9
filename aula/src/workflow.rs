//! Booking lifecycle operations.
//!
//! Bookings move `Pending` -> `Room Assigned` -> `Confirmed` or exit
//! through `Rejected` / `Cancelled`; intake with an accepted room
//! enters at `Room Assigned` directly. Every state change that binds a
//! room runs inside an IMMEDIATE transaction: the slot is re-checked
//! with the write lock held, and the schema's overlap trigger backs the
//! check up, so two operators who both saw a clear window cannot both
//! commit. A lost race comes back as a conflict decision, the same as a
//! conflict found up front, never as a bare error.

use rusqlite::TransactionBehavior;
use serde::Serialize;

use crate::availability::BookingConflict;
use crate::booking::{Booking, BookingRequest, BookingStatus};
use crate::database::{
    self, booking_by_id, conflicts_for_room, insert_booking, update_booking_room,
    update_booking_status, Database, CLEAR_OVERRIDE_FLAG, SET_OVERRIDE_FLAG,
};
use crate::error::{Error, Result};

/// Device category assumed when a booking requests devices without
/// naming one.
pub const DEFAULT_DEVICE_CATEGORY: &str = "laptop";

/// Options for [`create_booking`].
#[derive(Debug, Clone)]
pub struct CreateBookingOptions {
    /// The validated request.
    pub request: BookingRequest,
    /// Proceed even if the requested room is occupied, recording the
    /// conflicts in the assignment notes.
    pub allow_override: bool,
}

impl CreateBookingOptions {
    /// Wraps a request with overrides disabled.
    #[must_use]
    pub const fn new(request: BookingRequest) -> Self {
        Self {
            request,
            allow_override: false,
        }
    }
}

/// Options for [`assign_room`].
#[derive(Debug, Clone)]
pub struct AssignRoomOptions {
    /// The `Pending` booking to bind.
    pub booking_id: i64,
    /// The room to bind it to.
    pub room_id: i64,
    /// Operator performing the assignment.
    pub assigned_by: Option<String>,
    /// Proceed even if the room is occupied, recording the conflicts
    /// in the assignment notes.
    pub allow_override: bool,
}

/// Outcome of [`create_booking`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum BookingDecision {
    /// The booking was created.
    Booked {
        /// Id of the new booking.
        booking_id: i64,
        /// Its initial status.
        status: BookingStatus,
    },
    /// The requested room is occupied and no override was authorized.
    /// Nothing was written.
    Conflicts(Vec<BookingConflict>),
}

/// Outcome of [`assign_room`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum AssignDecision {
    /// The room was bound.
    Assigned {
        /// The booking that was updated.
        booking_id: i64,
        /// The room now bound to it.
        room_id: i64,
    },
    /// The room is occupied and no override was authorized. Nothing
    /// was written.
    Conflicts(Vec<BookingConflict>),
}

fn append_note(existing: Option<&str>, addition: &str) -> String {
    match existing {
        Some(text) if !text.is_empty() => format!("{text}\n{addition}"),
        _ => addition.to_owned(),
    }
}

fn override_note(conflicts: &[BookingConflict]) -> String {
    let mut note = format!("OVERRIDE: proceeding past {} conflict(s):", conflicts.len());
    for conflict in conflicts {
        note.push_str(&format!(
            " booking {} in room {} {};",
            conflict.booking_id, conflict.room_id, conflict.period
        ));
    }
    note
}

fn require_active_room(conn: &rusqlite::Connection, room_id: i64) -> Result<()> {
    use rusqlite::OptionalExtension;

    let active: Option<bool> = conn
        .query_row("SELECT is_active FROM rooms WHERE id = ?", [room_id], |row| {
            row.get(0)
        })
        .optional()?;
    match active {
        None => Err(Error::not_found("room", room_id.to_string())),
        Some(false) => Err(Error::validation(
            "room_id",
            format!("room {room_id} is inactive"),
        )),
        Some(true) => Ok(()),
    }
}

/// Creates a booking, with or without a requested room.
///
/// With a room, the slot is checked inside the committing transaction;
/// conflicts come back as [`BookingDecision::Conflicts`] with nothing
/// written, unless `allow_override` is set, in which case the booking
/// is created anyway with the conflicts recorded in its notes. A
/// booking whose room was accepted (or forced) starts `RoomAssigned`
/// and occupies its slot immediately; a room-less booking starts
/// `Pending`. A device request is recorded as a category-level
/// placeholder claim in the same transaction.
///
/// # Errors
///
/// Returns an error for a missing or inactive room or a storage
/// failure. An occupied slot is a decision, not an error.
pub fn create_booking(db: &mut Database, opts: &CreateBookingOptions) -> Result<BookingDecision> {
    let request = &opts.request;

    let tx = db
        .connection_mut()
        .transaction_with_behavior(TransactionBehavior::Immediate)?;

    let mut notes: Option<String> = None;
    let mut overriding = false;
    if let Some(room_id) = request.room_id() {
        require_active_room(&tx, room_id)?;
        let conflicts: Vec<BookingConflict> =
            conflicts_for_room(&tx, room_id, &request.period(), None)?
                .iter()
                .map(BookingConflict::from_booking)
                .collect();
        if !conflicts.is_empty() {
            if !opts.allow_override {
                return Ok(BookingDecision::Conflicts(conflicts));
            }
            log::debug!(
                "booking override for room {room_id}: {} conflict(s)",
                conflicts.len()
            );
            notes = Some(override_note(&conflicts));
            overriding = true;
        }
    }

    let initial_status = if request.room_id().is_some() {
        BookingStatus::RoomAssigned
    } else {
        BookingStatus::Pending
    };

    if overriding {
        tx.execute(SET_OVERRIDE_FLAG, [])?;
    }
    let inserted = insert_booking(&tx, request, initial_status, notes.as_deref());
    if overriding {
        tx.execute(CLEAR_OVERRIDE_FLAG, [])?;
    }

    let booking_id = match inserted {
        Ok(id) => id,
        // The pre-check was clear but a concurrent commit beat us to the
        // trigger. Report it the same way as an up-front conflict.
        Err(e) if e.is_conflict() => {
            drop(tx);
            let room_id = request.room_id().unwrap_or_default();
            let conflicts = database::conflicts_for_room(
                db.connection(),
                room_id,
                &request.period(),
                None,
            )?
            .iter()
            .map(BookingConflict::from_booking)
            .collect();
            return Ok(BookingDecision::Conflicts(conflicts));
        }
        Err(e) => return Err(e),
    };

    if request.devices_needed > 0 {
        let category = request
            .device_type_preference
            .as_deref()
            .unwrap_or(DEFAULT_DEVICE_CATEGORY);
        database::insert_assignment(
            &tx,
            booking_id,
            None,
            category,
            request.devices_needed,
            request.created_by.as_deref(),
            false,
            None,
        )?;
    }

    tx.commit()?;
    Ok(BookingDecision::Booked {
        booking_id,
        status: initial_status,
    })
}

/// Binds a room to a `Pending` booking.
///
/// The slot is re-checked excluding the booking itself; conflicts come
/// back as [`AssignDecision::Conflicts`] with nothing written, unless
/// `allow_override` is set. The assignment (and any override) is
/// recorded in the booking's notes.
///
/// # Errors
///
/// Returns [`Error::NotFound`] for a missing booking or room,
/// [`Error::InvalidTransition`] when the booking is not `Pending`, and
/// [`Error::Validation`] for an inactive room.
pub fn assign_room(db: &mut Database, opts: &AssignRoomOptions) -> Result<AssignDecision> {
    let tx = db
        .connection_mut()
        .transaction_with_behavior(TransactionBehavior::Immediate)?;

    let booking = booking_by_id(&tx, opts.booking_id)?
        .ok_or_else(|| Error::not_found("booking", opts.booking_id.to_string()))?;
    if booking.status != BookingStatus::Pending {
        return Err(Error::InvalidTransition {
            booking_id: booking.id,
            message: format!(
                "only Pending bookings can be assigned a room, found {}",
                booking.status
            ),
        });
    }
    require_active_room(&tx, opts.room_id)?;

    let conflicts: Vec<BookingConflict> =
        conflicts_for_room(&tx, opts.room_id, &booking.period, Some(booking.id))?
            .iter()
            .map(BookingConflict::from_booking)
            .collect();

    let operator = opts.assigned_by.as_deref().unwrap_or("unknown");
    let mut notes = append_note(
        booking.assignment_notes.as_deref(),
        &format!("Room {} assigned by {operator}", opts.room_id),
    );
    let overriding = !conflicts.is_empty();
    if overriding {
        if !opts.allow_override {
            return Ok(AssignDecision::Conflicts(conflicts));
        }
        log::debug!(
            "assignment override for room {}: {} conflict(s)",
            opts.room_id,
            conflicts.len()
        );
        notes = append_note(Some(&notes), &override_note(&conflicts));
        tx.execute(SET_OVERRIDE_FLAG, [])?;
    }

    let updated = update_booking_room(
        &tx,
        booking.id,
        opts.room_id,
        BookingStatus::RoomAssigned,
        Some(&notes),
        &booking.period,
    );
    if overriding {
        tx.execute(CLEAR_OVERRIDE_FLAG, [])?;
    }

    match updated {
        Ok(()) => {}
        Err(e) if e.is_conflict() => {
            drop(tx);
            let conflicts = database::conflicts_for_room(
                db.connection(),
                opts.room_id,
                &booking.period,
                Some(booking.id),
            )?
            .iter()
            .map(BookingConflict::from_booking)
            .collect();
            return Ok(AssignDecision::Conflicts(conflicts));
        }
        Err(e) => return Err(e),
    }

    tx.commit()?;
    Ok(AssignDecision::Assigned {
        booking_id: opts.booking_id,
        room_id: opts.room_id,
    })
}

/// Confirms a `Room Assigned` booking.
///
/// # Errors
///
/// Returns [`Error::NotFound`] for a missing booking and
/// [`Error::InvalidTransition`] for any status other than
/// `Room Assigned`.
pub fn confirm_booking(db: &mut Database, booking_id: i64) -> Result<()> {
    let tx = db
        .connection_mut()
        .transaction_with_behavior(TransactionBehavior::Immediate)?;
    let booking = booking_by_id(&tx, booking_id)?
        .ok_or_else(|| Error::not_found("booking", booking_id.to_string()))?;
    if booking.status != BookingStatus::RoomAssigned {
        return Err(Error::InvalidTransition {
            booking_id,
            message: format!(
                "only Room Assigned bookings can be confirmed, found {}",
                booking.status
            ),
        });
    }
    update_booking_status(&tx, booking_id, BookingStatus::Confirmed, None)?;
    tx.commit()?;
    Ok(())
}

/// Rejects a `Pending` booking with a required reason. Terminal.
///
/// # Errors
///
/// Returns [`Error::Validation`] for a blank reason,
/// [`Error::NotFound`] for a missing booking, and
/// [`Error::InvalidTransition`] for any status other than `Pending`.
pub fn reject_booking(db: &mut Database, booking_id: i64, actor: &str, reason: &str) -> Result<()> {
    if reason.trim().is_empty() {
        return Err(Error::validation("reason", "a rejection reason is required"));
    }
    let tx = db
        .connection_mut()
        .transaction_with_behavior(TransactionBehavior::Immediate)?;
    let booking = booking_by_id(&tx, booking_id)?
        .ok_or_else(|| Error::not_found("booking", booking_id.to_string()))?;
    if booking.status != BookingStatus::Pending {
        return Err(Error::InvalidTransition {
            booking_id,
            message: format!("only Pending bookings can be rejected, found {}", booking.status),
        });
    }
    let notes = append_note(
        booking.assignment_notes.as_deref(),
        &format!("Rejected by {actor}: {reason}"),
    );
    update_booking_status(&tx, booking_id, BookingStatus::Rejected, Some(&notes))?;
    tx.commit()?;
    Ok(())
}

/// Cancels a booking from any non-terminal status. Terminal.
///
/// Cancelling releases the room slot and every device claim held by
/// the booking's status alone; assignment rows are kept for history.
///
/// # Errors
///
/// Returns [`Error::NotFound`] for a missing booking and
/// [`Error::InvalidTransition`] when it is already terminal.
pub fn cancel_booking(db: &mut Database, booking_id: i64) -> Result<()> {
    let tx = db
        .connection_mut()
        .transaction_with_behavior(TransactionBehavior::Immediate)?;
    let booking = booking_by_id(&tx, booking_id)?
        .ok_or_else(|| Error::not_found("booking", booking_id.to_string()))?;
    if booking.status.is_terminal() {
        return Err(Error::InvalidTransition {
            booking_id,
            message: format!("booking is already terminal ({})", booking.status),
        });
    }
    update_booking_status(&tx, booking_id, BookingStatus::Cancelled, None)?;
    tx.commit()?;
    Ok(())
}

/// Looks up a booking by id, as an error when absent.
///
/// # Errors
///
/// Returns [`Error::NotFound`] if the booking does not exist.
pub fn booking(db: &Database, booking_id: i64) -> Result<Booking> {
    db.booking(booking_id)?
        .ok_or_else(|| Error::not_found("booking", booking_id.to_string()))
}
