//! Loanable device inventory types.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Inventory status of a device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DeviceStatus {
    /// In the storeroom and assignable.
    Available,
    /// Out on an offsite rental.
    Rented,
    /// Withdrawn from service.
    Retired,
}

impl DeviceStatus {
    /// Returns the canonical storage string for this status.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Available => "available",
            Self::Rented => "rented",
            Self::Retired => "retired",
        }
    }
}

impl fmt::Display for DeviceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DeviceStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "available" => Ok(Self::Available),
            "rented" => Ok(Self::Rented),
            "retired" => Ok(Self::Retired),
            other => Err(Error::validation(
                "status",
                format!("unknown device status '{other}'"),
            )),
        }
    }
}

/// A single loanable device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Device {
    /// Row identifier.
    pub id: i64,
    /// Asset serial number, unique.
    pub serial_number: String,
    /// Display name.
    pub name: String,
    /// Category used for placeholder requests ("laptop", "projector").
    pub category: String,
    /// Inventory status.
    pub status: DeviceStatus,
}

/// A device bound (or requested) for a booking.
///
/// A row with `device_id = None` is a category-level placeholder: the
/// booking has claimed `quantity` devices of `category` without naming
/// them yet. Placeholders count against availability the same way a
/// concrete assignment does.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceAssignment {
    /// Row identifier.
    pub id: i64,
    /// The booking holding the claim.
    pub booking_id: i64,
    /// The concrete device, or `None` for a placeholder.
    pub device_id: Option<i64>,
    /// Device category, always present.
    pub category: String,
    /// Number of devices claimed. Always 1 for concrete assignments.
    pub quantity: u32,
    /// Operator who made the assignment.
    pub assigned_by: Option<String>,
    /// True when the devices leave the facility.
    pub is_offsite: bool,
    /// Free-text notes.
    pub notes: Option<String>,
    /// When the assignment was recorded.
    pub assigned_at: DateTime<Utc>,
}

impl DeviceAssignment {
    /// Returns true if this row is a category-level placeholder.
    #[must_use]
    pub const fn is_placeholder(&self) -> bool {
        self.device_id.is_none()
    }
}

/// Offsite rental paperwork attached to an assignment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OffsiteRental {
    /// Row identifier.
    pub id: i64,
    /// The assignment the rental covers.
    pub assignment_id: i64,
    /// External rental reference number.
    pub rental_no: String,
    /// Date the equipment left the facility.
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
