// src/models/enrollment.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// Progress value at which an enrollment counts as completed.
pub const COMPLETE_PROGRESS: i32 = 100;

/// Represents the 'enrollments' table in the database.
/// At most one row per (student, course).
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct Enrollment {
    pub id: i64,
    pub student_id: i64,
    pub course_id: i64,
    pub enrolled_at: DateTime<Utc>,
    /// Percentage, 0-100.
    pub progress: i32,
    /// Set once progress reaches 100 and never cleared.
    pub completed: bool,
}

/// DTO for reporting course progress.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateProgressRequest {
    #[validate(range(min = 0, max = 100))]
    pub progress: i32,
}
