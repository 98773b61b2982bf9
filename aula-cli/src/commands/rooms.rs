//! Rooms command implementation.
//!
//! Manages the room catalog: creation, listing, deactivation, and the
//! dependency links that make combinable rooms exclude each other.

use clap::{Args, Subcommand};

use crate::error::CliError;
use crate::utils::{load_configuration, open_database, resolve_room, GlobalOptions};

/// Manage rooms and combinable-room links.
#[derive(Args)]
pub struct RoomsCommand {
    #[command(subcommand)]
    action: RoomsAction,
}

#[derive(Subcommand)]
enum RoomsAction {
    /// Add a room to the catalog
    Add {
        /// Room name, unique
        name: String,

        /// Seating capacity
        #[arg(long, value_name = "N")]
        capacity: u32,
    },

    /// List rooms
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Link two rooms so bookings in one block the other
    Link {
        /// Parent room (id or name)
        parent: String,

        /// Child room (id or name)
        child: String,
    },

    /// Show the rooms related to one room
    Related {
        /// Room (id or name)
        room: String,
    },

    /// Take a room out of service
    Deactivate {
        /// Room (id or name)
        room: String,
    },

    /// Return a room to service
    Activate {
        /// Room (id or name)
        room: String,
    },
}

impl RoomsCommand {
    /// Execute the rooms command.
    pub fn execute(self, global: &GlobalOptions) -> Result<(), CliError> {
        let config = load_configuration(global)?;
        let db = open_database(global, &config)?;

        match self.action {
            RoomsAction::Add { name, capacity } => {
                let room = db.create_room(&name, capacity)?;
                if !global.quiet {
                    println!("Added room {} (id {})", room.name, room.id);
                }
            }
            RoomsAction::List { json } => {
                let rooms = db.list_rooms()?;
                if json {
                    println!(
                        "{}",
                        serde_json::to_string_pretty(&rooms)
                            .map_err(|e| CliError::Config(e.to_string()))?
                    );
                } else {
                    println!("ID\tNAME\tCAPACITY\tACTIVE");
                    for room in rooms {
                        println!(
                            "{}\t{}\t{}\t{}",
                            room.id, room.name, room.capacity, room.is_active
                        );
                    }
                }
            }
            RoomsAction::Link { parent, child } => {
                let parent = resolve_room(&db, &parent)?;
                let child = resolve_room(&db, &child)?;
                db.link_rooms(parent.id, child.id)?;
                if !global.quiet {
                    println!("Linked {} <-> {}", parent.name, child.name);
                }
            }
            RoomsAction::Related { room } => {
                let room = resolve_room(&db, &room)?;
                for id in db.related_rooms(room.id)? {
                    if let Some(related) = db.room(id)? {
                        println!("{}\t{}", related.id, related.name);
                    }
                }
            }
            RoomsAction::Deactivate { room } => {
                let room = resolve_room(&db, &room)?;
                db.set_room_active(room.id, false)?;
                if !global.quiet {
                    println!("Deactivated room {}", room.name);
                }
            }
            RoomsAction::Activate { room } => {
                let room = resolve_room(&db, &room)?;
                db.set_room_active(room.id, true)?;
                if !global.quiet {
                    println!("Activated room {}", room.name);
                }
            }
        }
        Ok(())
    }
}
