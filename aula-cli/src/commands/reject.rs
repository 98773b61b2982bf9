//! Reject command implementation.

use clap::Args;

use aula::workflow;

use crate::error::CliError;
use crate::utils::{load_configuration, open_database, GlobalOptions};

/// Reject a pending booking.
#[derive(Args)]
pub struct RejectCommand {
    /// Booking to reject
    #[arg(value_name = "BOOKING_ID")]
    booking_id: i64,

    /// Operator rejecting the booking
    #[arg(long, value_name = "ACTOR")]
    by: String,

    /// Reason recorded in the booking notes
    #[arg(long, value_name = "TEXT")]
    reason: String,
}

impl RejectCommand {
    /// Execute the reject command.
    pub fn execute(self, global: &GlobalOptions) -> Result<(), CliError> {
        let config = load_configuration(global)?;
        let mut db = open_database(global, &config)?;
        workflow::reject_booking(&mut db, self.booking_id, &self.by, &self.reason)?;
        if !global.quiet {
            println!("Rejected booking {}", self.booking_id);
        }
        Ok(())
    }
}
