#![deny(missing_docs, unsafe_code)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

//! # aula
//!
//! A reservation and availability engine for training facility rooms
//! and loaner devices.
//!
//! Bookings move through a review workflow backed by `SQLite`; room
//! conflicts are detected over half-open time ranges, combinable rooms
//! exclude each other through declared dependencies, and device stock
//! is tracked as concrete units plus category placeholders so pending
//! requests already count against inventory.
//!
//! ## Core Types
//!
//! - [`TimeRange`]: Half-open UTC occupancy interval
//! - [`Booking`] and [`BookingRequest`]: Reservation records and intake
//! - [`Error`] and [`Result`]: Error handling types
//! - [`Logger`] and [`LogLevel`]: Logging infrastructure
//!
//! ## Examples
//!
//! ```
//! use aula::{BookingRequest, Headcount, TimeRange};
//!
//! let period = TimeRange::from_unix(1_767_261_600, 1_767_272_400).unwrap();
//! let request = BookingRequest::builder("Acme Corp", period)
//!     .headcount(Headcount::new(12, 2))
//!     .build()
//!     .unwrap();
//! assert_eq!(request.period(), period);
//! ```

pub mod assignment;
pub mod availability;
pub mod booking;
pub mod config;
pub mod database;
pub mod device;
pub mod error;
pub mod logging;
pub mod pool;
pub mod room;
pub mod timerange;
pub mod workflow;

// Re-export key types at crate root for convenience
pub use assignment::{
    AssignDeviceOptions, DeviceAssignDecision, ReallocateOptions, Reallocation,
    ReallocationTiming, RentalRequest, StockLevel,
};
pub use availability::{
    BookingConflict, CapacityCheck, DeviceAvailability, RoomAvailability, HIGH_UTILIZATION,
};
pub use booking::{
    Booking, BookingRequest, BookingRequestBuilder, BookingStatus, CateringOptions, Headcount,
};
pub use config::{EngineConfig, DEFAULT_LOW_STOCK_THRESHOLD};
pub use database::{Database, DatabaseConfig};
pub use device::{Device, DeviceAssignment, DeviceStatus, OffsiteRental};
pub use error::{Error, Result};
pub use logging::{init_logger, LogLevel, Logger};
pub use pool::{PoolConfig, PoolGuard, PoolStats, PooledConnection};
pub use room::{Room, RoomDependency};
pub use timerange::TimeRange;
pub use workflow::{
    AssignDecision, AssignRoomOptions, BookingDecision, CreateBookingOptions,
    DEFAULT_DEVICE_CATEGORY,
};
