//! Room entity model and DTOs.

use hms_core::rooms::Occupancy;
use hms_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `rooms` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Room {
    pub id: DbId,
    pub room_number: String,
    pub room_type: String,
    pub capacity: i32,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// A room joined with its live occupant count.
#[derive(Debug, Clone, FromRow)]
pub struct RoomWithOccupancy {
    pub id: DbId,
    pub room_number: String,
    pub room_type: String,
    pub capacity: i32,
    /// Approved, active students currently assigned.
    pub occupied: i64,
    pub created_at: Timestamp,
}

impl RoomWithOccupancy {
    pub fn occupancy(&self) -> Occupancy {
        Occupancy::new(self.capacity, self.occupied)
    }
}

/// DTO for creating a room.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateRoom {
    pub room_number: String,
    pub room_type: String,
    pub capacity: Option<i32>,
}

/// DTO for updating a room. All fields are optional.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateRoom {
    pub room_number: Option<String>,
    pub room_type: Option<String>,
    pub capacity: Option<i32>,
}
