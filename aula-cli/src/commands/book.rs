//! Book command implementation.
//!
//! Creates a booking request, optionally naming a room up front. A
//! conflicting room yields a conflict listing and exit code 1 unless
//! `--force` records an authorized override.

use chrono::NaiveDate;
use clap::Args;

use aula::workflow::{self, BookingDecision, CreateBookingOptions};
use aula::{BookingRequest, CateringOptions, Headcount};

use crate::error::CliError;
use crate::utils::{
    format_period, load_configuration, open_database, parse_period, resolve_room, GlobalOptions,
};

/// Create a booking request.
#[derive(Args)]
pub struct BookCommand {
    /// Requesting client or group name
    #[arg(long, value_name = "NAME")]
    client: String,

    /// Room to request (id or name); omit to book room-less
    #[arg(long, value_name = "ROOM")]
    room: Option<String>,

    /// Owning tenant identifier
    #[arg(long, value_name = "TENANT")]
    tenant: Option<String>,

    /// Client contact email
    #[arg(long, value_name = "EMAIL")]
    email: Option<String>,

    /// Named contact person at the client
    #[arg(long, value_name = "NAME")]
    contact: Option<String>,

    /// Client contact phone number
    #[arg(long, value_name = "PHONE")]
    phone: Option<String>,

    /// Expected number of learners
    #[arg(long, value_name = "N", default_value_t = 0)]
    learners: u32,

    /// Expected number of facilitators
    #[arg(long, value_name = "N", default_value_t = 0)]
    facilitators: u32,

    /// Coffee and tea station in the room
    #[arg(long)]
    coffee_tea: bool,

    /// Stationery packs for attendees
    #[arg(long)]
    stationery: bool,

    /// Bottled water
    #[arg(long)]
    water_bottles: bool,

    /// Catered morning break
    #[arg(long)]
    morning_catering: bool,

    /// Catered lunch
    #[arg(long)]
    lunch_catering: bool,

    /// Catering notes
    #[arg(long, value_name = "NOTES")]
    catering: Option<String>,

    /// Number of loan devices needed
    #[arg(long, value_name = "N", default_value_t = 0)]
    devices: u32,

    /// Preferred device category
    #[arg(long, value_name = "CATEGORY")]
    device_type: Option<String>,

    /// Operator creating the booking
    #[arg(long, value_name = "ACTOR")]
    created_by: Option<String>,

    /// Proceed past conflicts, recording them in the notes
    #[arg(long)]
    force: bool,

    /// First day of the booking (YYYY-MM-DD)
    #[arg(long, value_name = "DATE")]
    start_date: NaiveDate,

    /// Last day of the booking (defaults to the start date)
    #[arg(long, value_name = "DATE")]
    end_date: Option<NaiveDate>,

    /// Start time on the first day (defaults to facility opening)
    #[arg(long, value_name = "HH:MM")]
    start_time: Option<String>,

    /// End time on the last day (defaults to facility closing)
    #[arg(long, value_name = "HH:MM")]
    end_time: Option<String>,
}

impl BookCommand {
    /// Execute the book command.
    pub fn execute(self, global: &GlobalOptions) -> Result<(), CliError> {
        let config = load_configuration(global)?;
        let mut db = open_database(global, &config)?;
        let period = parse_period(
            &config,
            self.start_date,
            self.end_date,
            self.start_time.as_deref(),
            self.end_time.as_deref(),
        )?;

        let mut builder = BookingRequest::builder(&self.client, period)
            .headcount(Headcount::new(self.learners, self.facilitators));
        if let Some(ref reference) = self.room {
            let room = resolve_room(&db, reference)?;
            builder = builder.room(room.id);
        }
        if let Some(tenant) = self.tenant {
            builder = builder.tenant(tenant);
        }
        if let Some(email) = self.email {
            builder = builder.email(email);
        }
        if let Some(contact) = self.contact {
            builder = builder.contact(contact);
        }
        if let Some(phone) = self.phone {
            builder = builder.phone(phone);
        }
        builder = builder.catering_options(CateringOptions {
            coffee_tea_station: self.coffee_tea,
            stationery: self.stationery,
            water_bottles: self.water_bottles,
            morning_catering: self.morning_catering,
            lunch_catering: self.lunch_catering,
        });
        if let Some(catering) = self.catering {
            builder = builder.catering(catering);
        }
        if self.devices > 0 {
            builder = builder.devices(self.devices, self.device_type.as_deref());
        }
        if let Some(actor) = self.created_by {
            builder = builder.created_by(actor);
        }
        let request = builder.build()?;

        let mut options = CreateBookingOptions::new(request);
        options.allow_override = self.force;

        match workflow::create_booking(&mut db, &options)? {
            BookingDecision::Booked { booking_id, status } => {
                if global.quiet {
                    println!("{booking_id}");
                } else {
                    println!("Created booking {booking_id} ({status})");
                }
                Ok(())
            }
            BookingDecision::Conflicts(conflicts) => {
                println!("Slot is occupied by {} booking(s):", conflicts.len());
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
                    "booking not created (use --force to override)".into(),
                ))
            }
        }
    }
}
