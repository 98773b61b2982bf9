//! Bookings command implementation.
//!
//! Lists bookings (optionally just the review queue) or shows one
//! booking in full, including its device claims.

use clap::Args;

use aula::workflow;

use crate::error::CliError;
use crate::utils::{format_period, load_configuration, open_database, GlobalOptions};

/// List or inspect bookings.
#[derive(Args)]
pub struct BookingsCommand {
    /// Show only pending bookings, oldest first
    #[arg(long, conflicts_with = "id")]
    pending: bool,

    /// Show one booking in full
    #[arg(long, value_name = "BOOKING_ID")]
    id: Option<i64>,

    /// Output as JSON
    #[arg(long)]
    json: bool,
}

impl BookingsCommand {
    /// Execute the bookings command.
    pub fn execute(self, global: &GlobalOptions) -> Result<(), CliError> {
        let config = load_configuration(global)?;
        let db = open_database(global, &config)?;

        if let Some(booking_id) = self.id {
            let booking = workflow::booking(&db, booking_id)?;
            let assignments = db.booking_assignments(booking_id)?;
            if self.json {
                let record = serde_json::json!({
                    "booking": booking,
                    "device_assignments": assignments,
                });
                println!(
                    "{}",
                    serde_json::to_string_pretty(&record)
                        .map_err(|e| CliError::Config(e.to_string()))?
                );
            } else {
                println!("Booking {}: {}", booking.id, booking.client_name);
                println!("  status:   {}", booking.status);
                println!("  period:   {}", format_period(&booking.period));
                match booking.room_id {
                    Some(room_id) => println!("  room:     {room_id}"),
                    None => println!("  room:     (none)"),
                }
                println!("  headcount: {}", booking.headcount.total());
                if let Some(ref contact) = booking.client_contact {
                    println!("  contact:  {contact}");
                }
                if let Some(ref phone) = booking.client_phone {
                    println!("  phone:    {phone}");
                }
                if booking.catering.any() {
                    let requested = [
                        ("coffee/tea station", booking.catering.coffee_tea_station),
                        ("stationery", booking.catering.stationery),
                        ("water bottles", booking.catering.water_bottles),
                        ("morning catering", booking.catering.morning_catering),
                        ("lunch catering", booking.catering.lunch_catering),
                    ]
                    .into_iter()
                    .filter_map(|(label, wanted)| wanted.then_some(label))
                    .collect::<Vec<_>>()
                    .join(", ");
                    println!("  catering: {requested}");
                }
                if let Some(ref notes) = booking.assignment_notes {
                    println!("  notes:");
                    for line in notes.lines() {
                        println!("    {line}");
                    }
                }
                for assignment in assignments {
                    if assignment.is_placeholder() {
                        println!(
                            "  claim {}: {} x{} (placeholder)",
                            assignment.id, assignment.category, assignment.quantity
                        );
                    } else {
                        println!(
                            "  claim {}: {} device {}",
                            assignment.id,
                            assignment.category,
                            assignment.device_id.unwrap_or_default()
                        );
                    }
                }
            }
            return Ok(());
        }

        let bookings = if self.pending {
            db.pending_bookings()?
        } else {
            db.list_bookings()?
        };

        if self.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&bookings)
                    .map_err(|e| CliError::Config(e.to_string()))?
            );
        } else {
            println!("ID\tCLIENT\tSTATUS\tROOM\tPERIOD");
            for booking in bookings {
                let room = booking
                    .room_id
                    .map_or_else(|| "-".to_string(), |id| id.to_string());
                println!(
                    "{}\t{}\t{}\t{}\t{}",
                    booking.id,
                    booking.client_name,
                    booking.status,
                    room,
                    format_period(&booking.period)
                );
            }
        }
        Ok(())
    }
}
