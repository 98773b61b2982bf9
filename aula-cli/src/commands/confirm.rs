//! Confirm command implementation.

use clap::Args;

use aula::workflow;

use crate::error::CliError;
use crate::utils::{load_configuration, open_database, GlobalOptions};

/// Confirm a room-assigned booking.
#[derive(Args)]
pub struct ConfirmCommand {
    /// Booking to confirm
    #[arg(value_name = "BOOKING_ID")]
    booking_id: i64,
}

impl ConfirmCommand {
    /// Execute the confirm command.
    pub fn execute(self, global: &GlobalOptions) -> Result<(), CliError> {
        let config = load_configuration(global)?;
        let mut db = open_database(global, &config)?;
        workflow::confirm_booking(&mut db, self.booking_id)?;
        if !global.quiet {
            println!("Confirmed booking {}", self.booking_id);
        }
        Ok(())
    }
}
