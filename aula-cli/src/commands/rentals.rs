//! Rentals command implementation.
//!
//! Offsite rental paperwork: creating a rental against an offsite
//! assignment, listing overdue returns, and recording a return.

use chrono::NaiveDate;
use clap::{Args, Subcommand};

use aula::assignment::{self, RentalRequest};

use crate::error::CliError;
use crate::utils::{load_configuration, open_database, today, GlobalOptions};

/// Manage offsite rentals.
#[derive(Args)]
pub struct RentalsCommand {
    #[command(subcommand)]
    action: RentalsAction,
}

#[derive(Subcommand)]
enum RentalsAction {
    /// Record rental paperwork for an offsite assignment
    Create {
        /// The offsite assignment the rental covers
        #[arg(value_name = "ASSIGNMENT_ID")]
        assignment_id: i64,

        /// External rental reference number
        #[arg(long, value_name = "REF")]
        rental_no: String,

        /// Date the equipment leaves (defaults to today)
        #[arg(long, value_name = "DATE")]
        date: Option<NaiveDate>,

        /// Named contact at the renting party
        #[arg(long, value_name = "NAME")]
        contact: String,

        /// Contact phone number
        #[arg(long, value_name = "PHONE")]
        phone: Option<String>,

        /// Contact email address
        #[arg(long, value_name = "EMAIL")]
        email: Option<String>,

        /// Renting company
        #[arg(long, value_name = "NAME")]
        company: Option<String>,

        /// Delivery address
        #[arg(long, value_name = "TEXT")]
        address: Option<String>,

        /// Date the equipment is expected back
        #[arg(long, value_name = "DATE")]
        return_expected: Option<NaiveDate>,
    },

    /// List rentals past their expected return date
    Overdue {
        /// Reference date (defaults to today)
        #[arg(long, value_name = "DATE")]
        as_of: Option<NaiveDate>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Record the return of rented equipment
    Return {
        /// The assignment whose equipment came back
        #[arg(value_name = "ASSIGNMENT_ID")]
        assignment_id: i64,
    },
}

impl RentalsCommand {
    /// Execute the rentals command.
    pub fn execute(self, global: &GlobalOptions) -> Result<(), CliError> {
        let config = load_configuration(global)?;
        let mut db = open_database(global, &config)?;

        match self.action {
            RentalsAction::Create {
                assignment_id,
                rental_no,
                date,
                contact,
                phone,
                email,
                company,
                address,
                return_expected,
            } => {
                let request = RentalRequest {
                    assignment_id,
                    rental_no,
                    rental_date: date.unwrap_or_else(today),
                    contact_person: contact,
                    contact_number: phone,
                    contact_email: email,
                    company,
                    address,
                    return_expected_date: return_expected,
                };
                let id = assignment::create_offsite_rental(&mut db, &request)?;
                if global.quiet {
                    println!("{id}");
                } else {
                    println!("Created rental {} (id {id})", request.rental_no);
                }
            }
            RentalsAction::Overdue { as_of, json } => {
                let rentals = db.overdue_rentals(as_of.unwrap_or_else(today))?;
                if json {
                    println!(
                        "{}",
                        serde_json::to_string_pretty(&rentals)
                            .map_err(|e| CliError::Config(e.to_string()))?
                    );
                } else {
                    println!("ID\tRENTAL_NO\tCONTACT\tEXPECTED");
                    for rental in rentals {
                        let expected = rental
                            .return_expected_date
                            .map_or_else(|| "-".to_string(), |d| d.to_string());
                        println!(
                            "{}\t{}\t{}\t{}",
                            rental.id, rental.rental_no, rental.contact_person, expected
                        );
                    }
                }
            }
            RentalsAction::Return { assignment_id } => {
                assignment::return_rental(&mut db, assignment_id)?;
                if !global.quiet {
                    println!("Returned equipment for assignment {assignment_id}");
                }
            }
        }
        Ok(())
    }
}
