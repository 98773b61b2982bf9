//! Check command implementation.
//!
//! Answers availability questions without writing anything: whether a
//! room is free for a period, which rooms are, and whether a category
//! of devices can cover a request.

use chrono::NaiveDate;
use clap::Args;

use aula::availability::{self, RoomAvailability};

use crate::error::CliError;
use crate::utils::{
    format_period, load_configuration, open_database, parse_period, resolve_room, GlobalOptions,
};

/// Check room or device availability for a period.
#[derive(Args)]
pub struct CheckCommand {
    /// Room to check (id or name); omit to list all free rooms
    #[arg(long, value_name = "ROOM")]
    room: Option<String>,

    /// First day of the period (YYYY-MM-DD)
    #[arg(long, value_name = "DATE")]
    start_date: NaiveDate,

    /// Last day of the period (defaults to the start date)
    #[arg(long, value_name = "DATE")]
    end_date: Option<NaiveDate>,

    /// Start time on the first day (defaults to facility opening)
    #[arg(long, value_name = "HH:MM")]
    start_time: Option<String>,

    /// End time on the last day (defaults to facility closing)
    #[arg(long, value_name = "HH:MM")]
    end_time: Option<String>,

    /// Also check promisable stock for a device category
    #[arg(long, value_name = "CATEGORY")]
    devices: Option<String>,

    /// Number of devices needed
    #[arg(long, value_name = "N", default_value_t = 1)]
    quantity: u32,
}

impl CheckCommand {
    /// Execute the check command.
    pub fn execute(self, global: &GlobalOptions) -> Result<(), CliError> {
        let config = load_configuration(global)?;
        let db = open_database(global, &config)?;
        let period = parse_period(
            &config,
            self.start_date,
            self.end_date,
            self.start_time.as_deref(),
            self.end_time.as_deref(),
        )?;

        let mut blocked = false;

        if let Some(ref reference) = self.room {
            let room = resolve_room(&db, reference)?;
            match availability::check_room(&db, room.id, &period, None)? {
                RoomAvailability::Available => {
                    println!("{} is free for {}", room.name, format_period(&period));
                }
                RoomAvailability::Conflicts(conflicts) => {
                    blocked = true;
                    println!(
                        "{} is occupied for {} by {} booking(s):",
                        room.name,
                        format_period(&period),
                        conflicts.len()
                    );
                    for conflict in conflicts {
                        println!(
                            "  booking {} ({}) in room {}: {}",
                            conflict.booking_id,
                            conflict.client_name,
                            conflict.room_id,
                            format_period(&conflict.period)
                        );
                    }
                }
            }
        } else {
            let rooms = availability::available_rooms(&db, &period)?;
            if rooms.is_empty() {
                println!("No rooms are free for {}", format_period(&period));
            } else {
                println!("ID\tNAME\tCAPACITY");
                for room in rooms {
                    println!("{}\t{}\t{}", room.id, room.name, room.capacity);
                }
            }
        }

        if let Some(ref category) = self.devices {
            let stock =
                availability::device_availability(&db, category, self.quantity, &period)?;
            if stock.is_sufficient() {
                println!(
                    "{} {}(s) available ({} requested)",
                    stock.available, category, stock.requested
                );
            } else {
                blocked = true;
                println!(
                    "Insufficient {}s: {} requested, {} available (short {})",
                    category, stock.requested, stock.available, stock.shortfall
                );
            }
        }

        if blocked {
            return Err(CliError::Conflict("requested slot is not available".into()));
        }
        Ok(())
    }
}
