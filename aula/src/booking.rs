//! Booking types and the booking status machine.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::timerange::TimeRange;

/// Lifecycle status of a booking.
///
/// A booking moves `Pending` -> `RoomAssigned` -> `Confirmed`, or exits
/// through one of the terminal statuses. Terminal bookings never occupy
/// a room or a device and are excluded from every conflict computation;
/// everything else does, even `Pending` bookings that carry a requested
/// room (ghost inventory).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BookingStatus {
    /// Requested, awaiting room assignment.
    Pending,
    /// A room has been bound by an operator.
    RoomAssigned,
    /// Fully confirmed.
    Confirmed,
    /// Rejected by an operator. Terminal.
    Rejected,
    /// Cancelled by the client or an operator. Terminal.
    Cancelled,
}

impl BookingStatus {
    /// Returns the canonical storage string for this status.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::RoomAssigned => "Room Assigned",
            Self::Confirmed => "Confirmed",
            Self::Rejected => "Rejected",
            Self::Cancelled => "Cancelled",
        }
    }

    /// Returns true for statuses that end the booking lifecycle.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Rejected | Self::Cancelled)
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BookingStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "Pending" => Ok(Self::Pending),
            "Room Assigned" => Ok(Self::RoomAssigned),
            "Confirmed" => Ok(Self::Confirmed),
            "Rejected" => Ok(Self::Rejected),
            "Cancelled" => Ok(Self::Cancelled),
            other => Err(Error::validation(
                "status",
                format!("unknown booking status '{other}'"),
            )),
        }
    }
}

/// Expected attendance for a booking, split by role.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Headcount {
    /// Number of learners attending.
    pub learners: u32,
    /// Number of facilitators attending.
    pub facilitators: u32,
}

impl Headcount {
    /// Creates a headcount from role counts.
    #[must_use]
    pub const fn new(learners: u32, facilitators: u32) -> Self {
        Self {
            learners,
            facilitators,
        }
    }

    /// Total number of people expected in the room.
    #[must_use]
    pub const fn total(&self) -> u32 {
        self.learners + self.facilitators
    }
}

/// Catering and supply options requested for a booking.
///
/// These are advisory for the facility staff and never affect conflict
/// or availability computations.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CateringOptions {
    /// Coffee and tea station in the room.
    pub coffee_tea_station: bool,
    /// Stationery packs for attendees.
    pub stationery: bool,
    /// Bottled water.
    pub water_bottles: bool,
    /// Catered morning break.
    pub morning_catering: bool,
    /// Catered lunch.
    pub lunch_catering: bool,
}

impl CateringOptions {
    /// Returns true when at least one option is requested.
    #[must_use]
    pub const fn any(&self) -> bool {
        self.coffee_tea_station
            || self.stationery
            || self.water_bottles
            || self.morning_catering
            || self.lunch_catering
    }
}

/// A stored booking row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Booking {
    /// Row identifier.
    pub id: i64,
    /// The room this booking occupies, if any has been bound yet.
    pub room_id: Option<i64>,
    /// Owning tenant, when the deployment is multi-tenant.
    pub tenant_id: Option<String>,
    /// Name of the requesting client or group.
    pub client_name: String,
    /// Contact address for the client.
    pub client_email: Option<String>,
    /// Named contact person at the client.
    pub client_contact: Option<String>,
    /// Contact phone number.
    pub client_phone: Option<String>,
    /// Reserved period, half-open in UTC.
    pub period: TimeRange,
    /// Current lifecycle status.
    pub status: BookingStatus,
    /// Expected attendance.
    pub headcount: Headcount,
    /// Requested catering and supply options.
    pub catering: CateringOptions,
    /// Free-text catering or supply notes.
    pub catering_notes: Option<String>,
    /// Number of loan devices requested alongside the room.
    pub devices_needed: u32,
    /// Preferred device category for loan devices.
    pub device_type_preference: Option<String>,
    /// Operator notes accumulated during assignment, newest first.
    pub assignment_notes: Option<String>,
    /// Who created the booking.
    pub created_by: Option<String>,
    /// Creation instant.
    pub created_at: DateTime<Utc>,
    /// Last modification instant.
    pub updated_at: DateTime<Utc>,
}

impl Booking {
    /// Returns true if this booking currently occupies its room.
    ///
    /// A booking occupies a room when it has one bound and its status is
    /// not terminal.
    #[must_use]
    pub const fn occupies_room(&self) -> bool {
        self.room_id.is_some() && !self.status.is_terminal()
    }
}

/// A validated request to create a booking, produced by
/// [`BookingRequestBuilder`].
#[derive(Debug, Clone, PartialEq)]
pub struct BookingRequest {
    pub(crate) room_id: Option<i64>,
    pub(crate) tenant_id: Option<String>,
    pub(crate) client_name: String,
    pub(crate) client_email: Option<String>,
    pub(crate) client_contact: Option<String>,
    pub(crate) client_phone: Option<String>,
    pub(crate) period: TimeRange,
    pub(crate) headcount: Headcount,
    pub(crate) catering: CateringOptions,
    pub(crate) catering_notes: Option<String>,
    pub(crate) devices_needed: u32,
    pub(crate) device_type_preference: Option<String>,
    pub(crate) created_by: Option<String>,
}

impl BookingRequest {
    /// Starts building a request for the given client and period.
    pub fn builder(client_name: impl Into<String>, period: TimeRange) -> BookingRequestBuilder {
        BookingRequestBuilder::new(client_name, period)
    }

    /// The room the client asked for, if any.
    #[must_use]
    pub const fn room_id(&self) -> Option<i64> {
        self.room_id
    }

    /// The requested period.
    #[must_use]
    pub const fn period(&self) -> TimeRange {
        self.period
    }
}

/// Builder for [`BookingRequest`].
///
/// # Examples
///
/// ```
/// use aula::{BookingRequest, Headcount, TimeRange};
/// use chrono::NaiveDate;
///
/// let day = NaiveDate::from_ymd_opt(2026, 3, 2).unwrap();
/// let request = BookingRequest::builder("Acme Corp", TimeRange::from_dates(day, day).unwrap())
///     .room(3)
///     .headcount(Headcount::new(12, 2))
///     .devices(12, Some("laptop"))
///     .build()
///     .unwrap();
/// assert_eq!(request.room_id(), Some(3));
/// ```
#[derive(Debug, Clone)]
pub struct BookingRequestBuilder {
    room_id: Option<i64>,
    tenant_id: Option<String>,
    client_name: String,
    client_email: Option<String>,
    client_contact: Option<String>,
    client_phone: Option<String>,
    period: TimeRange,
    headcount: Headcount,
    catering: CateringOptions,
    catering_notes: Option<String>,
    devices_needed: u32,
    device_type_preference: Option<String>,
    created_by: Option<String>,
}

impl BookingRequestBuilder {
    /// Creates a builder with the required fields.
    pub fn new(client_name: impl Into<String>, period: TimeRange) -> Self {
        Self {
            room_id: None,
            tenant_id: None,
            client_name: client_name.into(),
            client_email: None,
            client_contact: None,
            client_phone: None,
            period,
            headcount: Headcount::default(),
            catering: CateringOptions::default(),
            catering_notes: None,
            devices_needed: 0,
            device_type_preference: None,
            created_by: None,
        }
    }

    /// Requests a specific room.
    #[must_use]
    pub const fn room(mut self, room_id: i64) -> Self {
        self.room_id = Some(room_id);
        self
    }

    /// Sets the owning tenant.
    #[must_use]
    pub fn tenant(mut self, tenant_id: impl Into<String>) -> Self {
        self.tenant_id = Some(tenant_id.into());
        self
    }

    /// Sets the client contact address.
    #[must_use]
    pub fn email(mut self, email: impl Into<String>) -> Self {
        self.client_email = Some(email.into());
        self
    }

    /// Names the contact person at the client.
    #[must_use]
    pub fn contact(mut self, person: impl Into<String>) -> Self {
        self.client_contact = Some(person.into());
        self
    }

    /// Sets the client contact phone number.
    #[must_use]
    pub fn phone(mut self, number: impl Into<String>) -> Self {
        self.client_phone = Some(number.into());
        self
    }

    /// Sets the expected attendance.
    #[must_use]
    pub const fn headcount(mut self, headcount: Headcount) -> Self {
        self.headcount = headcount;
        self
    }

    /// Sets the requested catering and supply options.
    #[must_use]
    pub const fn catering_options(mut self, options: CateringOptions) -> Self {
        self.catering = options;
        self
    }

    /// Attaches free-text catering notes.
    #[must_use]
    pub fn catering(mut self, notes: impl Into<String>) -> Self {
        self.catering_notes = Some(notes.into());
        self
    }

    /// Requests loan devices alongside the room.
    #[must_use]
    pub fn devices(mut self, quantity: u32, category: Option<&str>) -> Self {
        self.devices_needed = quantity;
        self.device_type_preference = category.map(str::to_owned);
        self
    }

    /// Records who created the booking.
    #[must_use]
    pub fn created_by(mut self, actor: impl Into<String>) -> Self {
        self.created_by = Some(actor.into());
        self
    }

    /// Validates the accumulated fields and produces the request.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] if the client name is blank or a
    /// device preference is given without a device count.
    pub fn build(self) -> Result<BookingRequest> {
        if self.client_name.trim().is_empty() {
            return Err(Error::validation("client_name", "must not be blank"));
        }
        if self.devices_needed == 0 && self.device_type_preference.is_some() {
            return Err(Error::validation(
                "devices_needed",
                "device category given but requested quantity is zero",
            ));
        }
        Ok(BookingRequest {
            room_id: self.room_id,
            tenant_id: self.tenant_id,
            client_name: self.client_name,
            client_email: self.client_email,
            client_contact: self.client_contact,
            client_phone: self.client_phone,
            period: self.period,
            headcount: self.headcount,
            catering: self.catering,
            catering_notes: self.catering_notes,
            devices_needed: self.devices_needed,
            device_type_preference: self.device_type_preference,
            created_by: self.created_by,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn sample_period() -> TimeRange {
        let day = NaiveDate::from_ymd_opt(2026, 3, 2).unwrap();
        TimeRange::from_dates(day, day).unwrap()
    }

    #[test]
    fn test_status_round_trip_through_storage_strings() {
        for status in [
            BookingStatus::Pending,
            BookingStatus::RoomAssigned,
            BookingStatus::Confirmed,
            BookingStatus::Rejected,
            BookingStatus::Cancelled,
        ] {
            let parsed: BookingStatus = status.as_str().parse().unwrap();
            assert_eq!(parsed, status);
        }
    }

    #[test]
    fn test_room_assigned_storage_string_has_space() {
        assert_eq!(BookingStatus::RoomAssigned.as_str(), "Room Assigned");
    }

    #[test]
    fn test_unknown_status_string_rejected() {
        assert!("Approved".parse::<BookingStatus>().is_err());
    }

    #[test]
    fn test_only_rejected_and_cancelled_are_terminal() {
        assert!(!BookingStatus::Pending.is_terminal());
        assert!(!BookingStatus::RoomAssigned.is_terminal());
        assert!(!BookingStatus::Confirmed.is_terminal());
        assert!(BookingStatus::Rejected.is_terminal());
        assert!(BookingStatus::Cancelled.is_terminal());
    }

    #[test]
    fn test_headcount_total() {
        assert_eq!(Headcount::new(12, 2).total(), 14);
        assert_eq!(Headcount::default().total(), 0);
    }

    #[test]
    fn test_builder_rejects_blank_client() {
        let result = BookingRequest::builder("   ", sample_period()).build();
        assert!(result.is_err());
    }

    #[test]
    fn test_builder_rejects_category_without_quantity() {
        let result = BookingRequest::builder("Acme", sample_period())
            .devices(0, Some("laptop"))
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn test_builder_minimal_request() {
        let request = BookingRequest::builder("Acme", sample_period())
            .build()
            .unwrap();
        assert_eq!(request.room_id(), None);
        assert_eq!(request.devices_needed, 0);
    }

    #[test]
    fn test_builder_contact_and_catering_options() {
        let request = BookingRequest::builder("Acme", sample_period())
            .contact("Jo Client")
            .phone("021 555 0100")
            .catering_options(CateringOptions {
                coffee_tea_station: true,
                lunch_catering: true,
                ..CateringOptions::default()
            })
            .build()
            .unwrap();
        assert_eq!(request.client_contact.as_deref(), Some("Jo Client"));
        assert_eq!(request.client_phone.as_deref(), Some("021 555 0100"));
        assert!(request.catering.any());
        assert!(request.catering.lunch_catering);
        assert!(!request.catering.water_bottles);
    }

    #[test]
    fn test_catering_options_default_is_none_requested() {
        assert!(!CateringOptions::default().any());
    }

    #[test]
    fn test_occupies_room() {
        let period = sample_period();
        let now = period.start();
        let mut booking = Booking {
            id: 1,
            room_id: Some(3),
            tenant_id: None,
            client_name: "Acme".into(),
            client_email: None,
            client_contact: None,
            client_phone: None,
            period,
            status: BookingStatus::Pending,
            headcount: Headcount::default(),
            catering: CateringOptions::default(),
            catering_notes: None,
            devices_needed: 0,
            device_type_preference: None,
            assignment_notes: None,
            created_by: None,
            created_at: now,
            updated_at: now,
        };
        assert!(booking.occupies_room());

        booking.status = BookingStatus::Cancelled;
        assert!(!booking.occupies_room());

        booking.status = BookingStatus::Pending;
        booking.room_id = None;
        assert!(!booking.occupies_room());
    }
}
