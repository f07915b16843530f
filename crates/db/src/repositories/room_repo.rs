//! Repository for the `rooms` table.

use hms_core::enrollment::STUDENT_STATUS_ACTIVE;
use hms_core::rooms::DEFAULT_ROOM_CAPACITY;
use hms_core::types::DbId;
use sqlx::PgPool;

use crate::models::room::{CreateRoom, Room, RoomWithOccupancy, UpdateRoom};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, room_number, room_type, capacity, created_at, updated_at";

/// Room columns plus the live occupant count, aliased for `RoomWithOccupancy`.
fn occupancy_select() -> String {
    format!(
        "SELECT r.id, r.room_number, r.room_type, r.capacity,
                (SELECT COUNT(*) FROM students s
                  WHERE s.room_id = r.id AND s.is_approved = true
                    AND s.status = '{STUDENT_STATUS_ACTIVE}') AS occupied,
                r.created_at
         FROM rooms r"
    )
}

/// Provides CRUD operations for rooms.
pub struct RoomRepo;

impl RoomRepo {
    /// Insert a new room, returning the created row.
    pub async fn create(pool: &PgPool, input: &CreateRoom) -> Result<Room, sqlx::Error> {
        let query = format!(
            "INSERT INTO rooms (room_number, room_type, capacity)
             VALUES ($1, $2, $3)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Room>(&query)
            .bind(&input.room_number)
            .bind(&input.room_type)
            .bind(input.capacity.unwrap_or(DEFAULT_ROOM_CAPACITY))
            .fetch_one(pool)
            .await
    }

    /// Find a room by internal ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Room>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM rooms WHERE id = $1");
        sqlx::query_as::<_, Room>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Find a room with its occupant count.
    pub async fn find_with_occupancy(
        pool: &PgPool,
        id: DbId,
    ) -> Result<Option<RoomWithOccupancy>, sqlx::Error> {
        let query = format!("{} WHERE r.id = $1", occupancy_select());
        sqlx::query_as::<_, RoomWithOccupancy>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List every room with its occupant count, ordered by room number.
    pub async fn list_with_occupancy(pool: &PgPool) -> Result<Vec<RoomWithOccupancy>, sqlx::Error> {
        let query = format!("{} ORDER BY r.room_number", occupancy_select());
        sqlx::query_as::<_, RoomWithOccupancy>(&query)
            .fetch_all(pool)
            .await
    }

    /// List rooms that still have at least one free bed.
    pub async fn list_available(pool: &PgPool) -> Result<Vec<RoomWithOccupancy>, sqlx::Error> {
        let query = format!(
            "SELECT * FROM ({}) AS occ WHERE occ.occupied < occ.capacity ORDER BY occ.room_number",
            occupancy_select()
        );
        sqlx::query_as::<_, RoomWithOccupancy>(&query)
            .fetch_all(pool)
            .await
    }

    /// Update a room. Only non-`None` fields in `input` are applied.
    ///
    /// Returns `None` if no row with the given `id` exists.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateRoom,
    ) -> Result<Option<Room>, sqlx::Error> {
        let query = format!(
            "UPDATE rooms SET
                room_number = COALESCE($2, room_number),
                room_type = COALESCE($3, room_type),
                capacity = COALESCE($4, capacity)
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Room>(&query)
            .bind(id)
            .bind(&input.room_number)
            .bind(&input.room_type)
            .bind(input.capacity)
            .fetch_optional(pool)
            .await
    }

    /// Roll numbers of every student linked to the room, approved or not.
    pub async fn assigned_roll_numbers(
        pool: &PgPool,
        room_id: DbId,
    ) -> Result<Vec<String>, sqlx::Error> {
        sqlx::query_scalar::<_, String>(
            "SELECT roll_number FROM students WHERE room_id = $1 ORDER BY roll_number",
        )
        .bind(room_id)
        .fetch_all(pool)
        .await
    }

    /// Delete a room. Returns `true` if the row was removed.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM rooms WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
