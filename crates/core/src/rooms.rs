//! Room capacity and occupancy rules.
//!
//! Occupancy is never stored. It is the number of approved, active students
//! assigned to a room, counted at read time. The status label shown on the
//! admin room list is derived from the same numbers.

use serde::Serialize;

use crate::error::CoreError;

/// Capacity given to rooms created without an explicit value.
pub const DEFAULT_ROOM_CAPACITY: i32 = 4;

/// Largest capacity accepted for a single room.
pub const MAX_ROOM_CAPACITY: i32 = 12;

/// Label for a room with no occupants.
pub const STATUS_VACANT: &str = "Vacant";

/// Label for a room at or over capacity.
pub const STATUS_FULL: &str = "Fully Occupied";

/// Occupancy snapshot of a single room.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Occupancy {
    pub capacity: i32,
    pub occupied: i32,
}

impl Occupancy {
    pub fn new(capacity: i32, occupied: i64) -> Self {
        Self {
            capacity,
            occupied: i32::try_from(occupied).unwrap_or(i32::MAX),
        }
    }

    pub fn is_full(&self) -> bool {
        self.occupied >= self.capacity
    }

    /// Free beds, never negative.
    pub fn available(&self) -> i32 {
        (self.capacity - self.occupied).max(0)
    }

    /// `Vacant`, `n/capacity` or `Fully Occupied`.
    pub fn status_label(&self) -> String {
        if self.occupied <= 0 {
            STATUS_VACANT.to_string()
        } else if self.is_full() {
            STATUS_FULL.to_string()
        } else {
            format!("{}/{}", self.occupied, self.capacity)
        }
    }
}

/// Validate a requested room capacity.
pub fn validate_capacity(capacity: i32) -> Result<(), CoreError> {
    if !(1..=MAX_ROOM_CAPACITY).contains(&capacity) {
        return Err(CoreError::Validation(format!(
            "Room capacity must be between 1 and {MAX_ROOM_CAPACITY}"
        )));
    }
    Ok(())
}

/// Validate and normalize a room number (trimmed, non-empty).
pub fn normalize_room_number(room_number: &str) -> Result<String, CoreError> {
    let trimmed = room_number.trim();
    if trimmed.is_empty() {
        return Err(CoreError::Validation("Room number is required".into()));
    }
    if trimmed.len() > 20 {
        return Err(CoreError::Validation(
            "Room number must be at most 20 characters".into(),
        ));
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn empty_room_is_vacant() {
        let occ = Occupancy::new(DEFAULT_ROOM_CAPACITY, 0);
        assert_eq!(occ.status_label(), "Vacant");
        assert!(!occ.is_full());
        assert_eq!(occ.available(), 4);
    }

    #[test]
    fn partially_occupied_room_shows_ratio() {
        let occ = Occupancy::new(4, 3);
        assert_eq!(occ.status_label(), "3/4");
        assert_eq!(occ.available(), 1);
    }

    #[test]
    fn full_room_is_reported_full() {
        let occ = Occupancy::new(4, 4);
        assert!(occ.is_full());
        assert_eq!(occ.status_label(), "Fully Occupied");
        assert_eq!(occ.available(), 0);
    }

    #[test]
    fn overfilled_room_never_reports_negative_availability() {
        let occ = Occupancy::new(2, 5);
        assert!(occ.is_full());
        assert_eq!(occ.available(), 0);
    }

    #[test]
    fn capacity_bounds() {
        assert!(validate_capacity(1).is_ok());
        assert!(validate_capacity(MAX_ROOM_CAPACITY).is_ok());
        assert_matches!(validate_capacity(0), Err(CoreError::Validation(_)));
        assert_matches!(validate_capacity(13), Err(CoreError::Validation(_)));
    }

    #[test]
    fn room_number_is_trimmed() {
        assert_eq!(normalize_room_number("  A-101 ").unwrap(), "A-101");
        assert!(normalize_room_number("   ").is_err());
    }
}
