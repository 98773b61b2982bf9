//! Room records and combinability relations.

use serde::{Deserialize, Serialize};

/// A bookable room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Room {
    /// Row identifier.
    pub id: i64,
    /// Display name, unique within the facility.
    pub name: String,
    /// Seated capacity.
    pub capacity: u32,
    /// Inactive rooms are never offered or assigned.
    pub is_active: bool,
}

/// A combinability relation between two rooms.
///
/// Rooms joined by a movable partition cannot be let independently: a
/// booking in either side blocks the other. The relation is stored once
/// per pair but treated as symmetric everywhere it is consulted. Two
/// children of the same parent are not related to each other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomDependency {
    /// The combined (parent) room.
    pub parent_room_id: i64,
    /// A constituent (child) room.
    pub child_room_id: i64,
}
