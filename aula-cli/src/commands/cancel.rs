//! Cancel command implementation.

use clap::Args;

use aula::workflow;

use crate::error::CliError;
use crate::utils::{load_configuration, open_database, GlobalOptions};

/// Cancel a booking, releasing its room and device claims.
#[derive(Args)]
pub struct CancelCommand {
    /// Booking to cancel
    #[arg(value_name = "BOOKING_ID")]
    booking_id: i64,
}

impl CancelCommand {
    /// Execute the cancel command.
    pub fn execute(self, global: &GlobalOptions) -> Result<(), CliError> {
        let config = load_configuration(global)?;
        let mut db = open_database(global, &config)?;
        workflow::cancel_booking(&mut db, self.booking_id)?;
        if !global.quiet {
            println!("Cancelled booking {}", self.booking_id);
        }
        Ok(())
    }
}
