//! Room and combinability queries.

use rusqlite::{params, Connection, OptionalExtension};

use crate::error::{Error, Result};
use crate::room::{Room, RoomDependency};

use super::connection::Database;

const INSERT_ROOM: &str = r"
    INSERT INTO rooms (name, capacity, is_active)
    VALUES (?, ?, 1)
";

const SELECT_ROOM: &str = r"
    SELECT id, name, capacity, is_active FROM rooms WHERE id = ?
";

const SELECT_ROOM_BY_NAME: &str = r"
    SELECT id, name, capacity, is_active FROM rooms WHERE name = ?
";

const LIST_ROOMS: &str = r"
    SELECT id, name, capacity, is_active FROM rooms ORDER BY name
";

const SET_ROOM_ACTIVE: &str = r"
    UPDATE rooms SET is_active = ? WHERE id = ?
";

const INSERT_DEPENDENCY: &str = r"
    INSERT INTO room_dependencies (parent_room_id, child_room_id)
    VALUES (?, ?)
";

const LIST_DEPENDENCIES: &str = r"
    SELECT parent_room_id, child_room_id FROM room_dependencies
    ORDER BY parent_room_id, child_room_id
";

const SELECT_RELATED: &str = r"
    SELECT child_room_id FROM room_dependencies WHERE parent_room_id = ?
    UNION
    SELECT parent_room_id FROM room_dependencies WHERE child_room_id = ?
";

fn row_to_room(row: &rusqlite::Row<'_>) -> rusqlite::Result<Room> {
    Ok(Room {
        id: row.get(0)?,
        name: row.get(1)?,
        capacity: row.get(2)?,
        is_active: row.get(3)?,
    })
}

/// Expands a room to its combinability-related set.
///
/// The result always contains the room itself, plus every room that
/// appears opposite it in any dependency row, in either direction.
/// Children of the same parent are not related to each other. The
/// result is sorted and duplicate-free.
pub(crate) fn related_room_ids(conn: &Connection, room_id: i64) -> Result<Vec<i64>> {
    let mut stmt = conn.prepare_cached(SELECT_RELATED)?;
    let mut ids: Vec<i64> = stmt
        .query_map(params![room_id, room_id], |row| row.get(0))?
        .collect::<rusqlite::Result<_>>()?;
    ids.push(room_id);
    ids.sort_unstable();
    ids.dedup();
    Ok(ids)
}

impl Database {
    /// Creates a new active room.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is blank or already taken.
    pub fn create_room(&self, name: &str, capacity: u32) -> Result<Room> {
        if name.trim().is_empty() {
            return Err(Error::validation("name", "must not be blank"));
        }
        self.conn.execute(INSERT_ROOM, params![name, capacity])?;
        Ok(Room {
            id: self.conn.last_insert_rowid(),
            name: name.to_owned(),
            capacity,
            is_active: true,
        })
    }

    /// Looks up a room by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn room(&self, room_id: i64) -> Result<Option<Room>> {
        let room = self
            .conn
            .query_row(SELECT_ROOM, [room_id], row_to_room)
            .optional()?;
        Ok(room)
    }

    /// Looks up a room by name.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn room_by_name(&self, name: &str) -> Result<Option<Room>> {
        let room = self
            .conn
            .query_row(SELECT_ROOM_BY_NAME, [name], row_to_room)
            .optional()?;
        Ok(room)
    }

    /// Lists all rooms, active and inactive, ordered by name.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn list_rooms(&self) -> Result<Vec<Room>> {
        let mut stmt = self.conn.prepare_cached(LIST_ROOMS)?;
        let rooms = stmt
            .query_map([], row_to_room)?
            .collect::<rusqlite::Result<_>>()?;
        Ok(rooms)
    }

    /// Activates or deactivates a room.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if the room does not exist.
    pub fn set_room_active(&self, room_id: i64, active: bool) -> Result<()> {
        let changed = self.conn.execute(SET_ROOM_ACTIVE, params![active, room_id])?;
        if changed == 0 {
            return Err(Error::not_found("room", room_id.to_string()));
        }
        Ok(())
    }

    /// Records a combinability relation between a combined room and one
    /// of its constituent rooms.
    ///
    /// # Errors
    ///
    /// Returns an error if either room does not exist, the ids are
    /// equal, or the relation is already recorded.
    pub fn link_rooms(&self, parent_room_id: i64, child_room_id: i64) -> Result<()> {
        if parent_room_id == child_room_id {
            return Err(Error::validation(
                "child_room_id",
                "a room cannot be related to itself",
            ));
        }
        for id in [parent_room_id, child_room_id] {
            if self.room(id)?.is_none() {
                return Err(Error::not_found("room", id.to_string()));
            }
        }
        self.conn
            .execute(INSERT_DEPENDENCY, params![parent_room_id, child_room_id])?;
        Ok(())
    }

    /// Lists all combinability relations.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn list_room_dependencies(&self) -> Result<Vec<RoomDependency>> {
        let mut stmt = self.conn.prepare_cached(LIST_DEPENDENCIES)?;
        let deps = stmt
            .query_map([], |row| {
                Ok(RoomDependency {
                    parent_room_id: row.get(0)?,
                    child_room_id: row.get(1)?,
                })
            })?
            .collect::<rusqlite::Result<_>>()?;
        Ok(deps)
    }

    /// Returns the combinability-related set for a room, including the
    /// room itself.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn related_rooms(&self, room_id: i64) -> Result<Vec<i64>> {
        related_room_ids(&self.conn, room_id)
    }
}
