//! Assign-room command implementation.
//!
//! Binds a room to a pending booking, moving it to `Room Assigned`.

use clap::Args;

use aula::workflow::{self, AssignDecision, AssignRoomOptions};

use crate::error::CliError;
use crate::utils::{
    format_period, load_configuration, open_database, resolve_room, GlobalOptions,
};

/// Bind a room to a pending booking.
#[derive(Args)]
pub struct AssignRoomCommand {
    /// Booking to update
    #[arg(value_name = "BOOKING_ID")]
    booking_id: i64,

    /// Room to bind (id or name)
    #[arg(value_name = "ROOM")]
    room: String,

    /// Operator performing the assignment
    #[arg(long, value_name = "ACTOR")]
    assigned_by: Option<String>,

    /// Proceed past conflicts, recording them in the notes
    #[arg(long)]
    force: bool,
}

impl AssignRoomCommand {
    /// Execute the assign-room command.
    pub fn execute(self, global: &GlobalOptions) -> Result<(), CliError> {
        let config = load_configuration(global)?;
        let mut db = open_database(global, &config)?;
        let room = resolve_room(&db, &self.room)?;

        let options = AssignRoomOptions {
            booking_id: self.booking_id,
            room_id: room.id,
            assigned_by: self.assigned_by,
            allow_override: self.force,
        };

        match workflow::assign_room(&mut db, &options)? {
            AssignDecision::Assigned { booking_id, .. } => {
                if !global.quiet {
                    println!("Assigned {} to booking {booking_id}", room.name);
                }
                Ok(())
            }
            AssignDecision::Conflicts(conflicts) => {
                println!(
                    "{} is occupied by {} booking(s):",
                    room.name,
                    conflicts.len()
                );
                for conflict in &conflicts {
                    println!(
                        "  booking {} ({}) in room {}: {}",
                        conflict.booking_id,
                        conflict.client_name,
                        conflict.room_id,
                        format_period(&conflict.period)
                    );
                }
                Err(CliError::Conflict(
                    "room not assigned (use --force to override)".into(),
                ))
            }
        }
    }
}
