//! Devices command implementation.
//!
//! Manages the loan device inventory and the claims bookings hold on
//! it: concrete assignments, category placeholders, and reallocations
//! between bookings.

use clap::{Args, Subcommand};

use aula::assignment::{self, AssignDeviceOptions, DeviceAssignDecision, ReallocateOptions};
use aula::DeviceStatus;

use crate::error::CliError;
use crate::utils::{load_configuration, open_database, resolve_device, GlobalOptions};

/// Manage loan devices and assignments.
#[derive(Args)]
pub struct DevicesCommand {
    #[command(subcommand)]
    action: DevicesAction,
}

#[derive(Subcommand)]
enum DevicesAction {
    /// Add a device to the inventory
    Add {
        /// Asset serial number, unique
        serial: String,

        /// Display name
        name: String,

        /// Device category
        #[arg(long, value_name = "CATEGORY", default_value = "laptop")]
        category: String,
    },

    /// List devices
    List {
        /// Restrict to one category
        #[arg(long, value_name = "CATEGORY")]
        category: Option<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Assign a concrete device to a booking
    Assign {
        /// Booking receiving the device
        #[arg(value_name = "BOOKING_ID")]
        booking_id: i64,

        /// Device to assign (id or serial)
        #[arg(value_name = "DEVICE")]
        device: String,

        /// Operator performing the assignment
        #[arg(long, value_name = "ACTOR")]
        by: Option<String>,

        /// The device leaves the facility
        #[arg(long)]
        offsite: bool,

        /// Free-text notes
        #[arg(long, value_name = "TEXT")]
        notes: Option<String>,
    },

    /// Release an assignment or placeholder claim
    Unassign {
        /// Assignment row to delete
        #[arg(value_name = "ASSIGNMENT_ID")]
        assignment_id: i64,
    },

    /// Record a category-level placeholder claim
    Request {
        /// Booking holding the claim
        #[arg(value_name = "BOOKING_ID")]
        booking_id: i64,

        /// Device category
        #[arg(value_name = "CATEGORY")]
        category: String,

        /// Number of devices claimed
        #[arg(value_name = "N")]
        quantity: u32,

        /// Operator recording the request
        #[arg(long, value_name = "ACTOR")]
        by: Option<String>,
    },

    /// Move a concrete assignment to another booking
    Reallocate {
        /// Assignment row to move
        #[arg(value_name = "ASSIGNMENT_ID")]
        assignment_id: i64,

        /// Booking receiving the device
        #[arg(value_name = "BOOKING_ID")]
        to_booking_id: i64,

        /// Operator performing the move
        #[arg(long, value_name = "ACTOR")]
        by: Option<String>,

        /// Reason recorded on the moved assignment
        #[arg(long, value_name = "TEXT")]
        reason: Option<String>,
    },

    /// Change a device's inventory status
    SetStatus {
        /// Device to update (id or serial)
        #[arg(value_name = "DEVICE")]
        device: String,

        /// New status (available, rented, retired)
        #[arg(value_name = "STATUS")]
        status: DeviceStatus,
    },
}

impl DevicesCommand {
    /// Execute the devices command.
    #[allow(clippy::too_many_lines)]
    pub fn execute(self, global: &GlobalOptions) -> Result<(), CliError> {
        let config = load_configuration(global)?;
        let mut db = open_database(global, &config)?;

        match self.action {
            DevicesAction::Add {
                serial,
                name,
                category,
            } => {
                let device = db.create_device(&serial, &name, &category)?;
                if !global.quiet {
                    println!("Added device {} (id {})", device.serial_number, device.id);
                }
            }
            DevicesAction::List { category, json } => {
                let devices = db.list_devices(category.as_deref())?;
                if json {
                    println!(
                        "{}",
                        serde_json::to_string_pretty(&devices)
                            .map_err(|e| CliError::Config(e.to_string()))?
                    );
                } else {
                    println!("ID\tSERIAL\tNAME\tCATEGORY\tSTATUS");
                    for device in devices {
                        println!(
                            "{}\t{}\t{}\t{}\t{}",
                            device.id,
                            device.serial_number,
                            device.name,
                            device.category,
                            device.status
                        );
                    }
                }
            }
            DevicesAction::Assign {
                booking_id,
                device,
                by,
                offsite,
                notes,
            } => {
                let device = resolve_device(&db, &device)?;
                let options = AssignDeviceOptions {
                    booking_id,
                    device_id: device.id,
                    assigned_by: by,
                    is_offsite: offsite,
                    notes,
                };
                match assignment::assign_device(&mut db, &options)? {
                    DeviceAssignDecision::Assigned { assignment_id } => {
                        if global.quiet {
                            println!("{assignment_id}");
                        } else {
                            println!(
                                "Assigned {} to booking {booking_id} (assignment {assignment_id})",
                                device.serial_number
                            );
                        }
                    }
                    DeviceAssignDecision::Conflicts(claims) => {
                        println!(
                            "{} is claimed by {} overlapping booking(s):",
                            device.serial_number,
                            claims.len()
                        );
                        for claim in &claims {
                            println!("  assignment {} on booking {}", claim.id, claim.booking_id);
                        }
                        return Err(CliError::Conflict("device not assigned".into()));
                    }
                }
            }
            DevicesAction::Unassign { assignment_id } => {
                assignment::unassign(&mut db, assignment_id)?;
                if !global.quiet {
                    println!("Released assignment {assignment_id}");
                }
            }
            DevicesAction::Request {
                booking_id,
                category,
                quantity,
                by,
            } => {
                let id = assignment::request_devices(
                    &mut db,
                    booking_id,
                    &category,
                    quantity,
                    by.as_deref(),
                )?;
                if global.quiet {
                    println!("{id}");
                } else {
                    println!("Recorded claim for {quantity} {category}(s) (assignment {id})");
                }
            }
            DevicesAction::Reallocate {
                assignment_id,
                to_booking_id,
                by,
                reason,
            } => {
                let opts = ReallocateOptions {
                    assignment_id,
                    to_booking_id,
                    performed_by: by,
                    reason,
                };
                let moved = assignment::reallocate(&mut db, &opts, chrono::Utc::now())?;
                if !global.quiet {
                    println!(
                        "Moved assignment {} from booking {} to booking {} ({})",
                        moved.assignment_id, moved.from_booking_id, moved.to_booking_id,
                        moved.timing
                    );
                }
            }
            DevicesAction::SetStatus { device, status } => {
                let device = resolve_device(&db, &device)?;
                db.set_device_status(device.id, status)?;
                if !global.quiet {
                    println!("Device {} is now {status}", device.serial_number);
                }
            }
        }
        Ok(())
    }
}
