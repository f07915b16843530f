//! Handlers for the `/rooms` resource.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use hms_core::error::CoreError;
use hms_core::rooms::{normalize_room_number, validate_capacity};
use hms_core::types::{DbId, Timestamp};
use hms_db::models::room::{CreateRoom, RoomWithOccupancy, UpdateRoom};
use hms_db::repositories::RoomRepo;
use serde::Serialize;

use super::required_text;
use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::middleware::rbac::RequireAdmin;
use crate::response::MessageResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// A room with its live occupancy.
#[derive(Debug, Serialize)]
pub struct RoomResponse {
    pub id: DbId,
    pub room_number: String,
    pub room_type: String,
    pub capacity: i32,
    pub occupied: i32,
    pub available: i32,
    pub is_full: bool,
    /// `Vacant`, `n/capacity` or `Fully Occupied`.
    pub status: String,
    pub created_at: Timestamp,
}

impl From<&RoomWithOccupancy> for RoomResponse {
    fn from(room: &RoomWithOccupancy) -> Self {
        let occupancy = room.occupancy();
        Self {
            id: room.id,
            room_number: room.room_number.clone(),
            room_type: room.room_type.clone(),
            capacity: room.capacity,
            occupied: occupancy.occupied,
            available: occupancy.available(),
            is_full: occupancy.is_full(),
            status: occupancy.status_label(),
            created_at: room.created_at,
        }
    }
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// GET /api/rooms
pub async fn list_rooms(
    State(state): State<AppState>,
    _auth: AuthUser,
) -> AppResult<Json<Vec<RoomResponse>>> {
    let rooms = RoomRepo::list_with_occupancy(&state.pool).await?;
    Ok(Json(rooms.iter().map(RoomResponse::from).collect()))
}

/// GET /api/rooms/available
///
/// Rooms with at least one free bed, for the approval dialog.
pub async fn list_available_rooms(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
) -> AppResult<Json<Vec<RoomResponse>>> {
    let rooms = RoomRepo::list_available(&state.pool).await?;
    Ok(Json(rooms.iter().map(RoomResponse::from).collect()))
}

/// POST /api/rooms
///
/// Rooms created without a capacity get the configured default.
pub async fn create_room(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Json(input): Json<CreateRoom>,
) -> AppResult<(StatusCode, Json<RoomResponse>)> {
    let room_number = normalize_room_number(&input.room_number)?;
    let room_type = required_text(&input.room_type, "room_type")?;
    let capacity = input.capacity.unwrap_or(state.config.room_capacity);
    validate_capacity(capacity)?;

    let room = RoomRepo::create(
        &state.pool,
        &CreateRoom {
            room_number,
            room_type,
            capacity: Some(capacity),
        },
    )
    .await?;
    tracing::info!(room_id = room.id, admin_id = admin.user_id, "Room created");

    let created = load_room(&state, room.id).await?;
    Ok((StatusCode::CREATED, Json(RoomResponse::from(&created))))
}

/// PUT /api/rooms/{id}
///
/// Capacity may not drop below the number of current occupants.
pub async fn update_room(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateRoom>,
) -> AppResult<Json<RoomResponse>> {
    let current = load_room(&state, id).await?;

    let room_number = input
        .room_number
        .as_deref()
        .map(normalize_room_number)
        .transpose()?;
    let room_type = input
        .room_type
        .as_deref()
        .map(|t| required_text(t, "room_type"))
        .transpose()?;
    if let Some(capacity) = input.capacity {
        validate_capacity(capacity)?;
        if i64::from(capacity) < current.occupied {
            return Err(AppError::Core(CoreError::Conflict(format!(
                "Room {} has {} occupants; capacity cannot be lower",
                current.room_number, current.occupied
            ))));
        }
    }

    RoomRepo::update(
        &state.pool,
        id,
        &UpdateRoom {
            room_number,
            room_type,
            capacity: input.capacity,
        },
    )
    .await?
    .ok_or(AppError::Core(CoreError::NotFound { entity: "Room", id }))?;

    let updated = load_room(&state, id).await?;
    Ok(Json(RoomResponse::from(&updated)))
}

/// DELETE /api/rooms/{id}
///
/// Refused while any student is linked to the room.
pub async fn delete_room(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<DbId>,
) -> AppResult<Json<MessageResponse>> {
    let room = load_room(&state, id).await?;

    let assigned = RoomRepo::assigned_roll_numbers(&state.pool, id).await?;
    if !assigned.is_empty() {
        return Err(AppError::BadRequest(format!(
            "Cannot delete room {}: students are assigned ({})",
            room.room_number,
            assigned.join(", ")
        )));
    }

    if !RoomRepo::delete(&state.pool, id).await? {
        return Err(AppError::Core(CoreError::NotFound { entity: "Room", id }));
    }
    tracing::info!(room_id = id, admin_id = admin.user_id, "Room deleted");

    Ok(Json(MessageResponse::new(format!(
        "Room {} deleted successfully",
        room.room_number
    ))))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn load_room(state: &AppState, id: DbId) -> AppResult<RoomWithOccupancy> {
    RoomRepo::find_with_occupancy(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound { entity: "Room", id }))
}
