// src/models/attempt.rs

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::models::question::Question;

/// Represents the 'quiz_attempts' table in the database.
/// Holds the latest scored submission of one student for one quiz.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct QuizAttempt {
    pub id: i64,
    pub quiz_id: i64,
    pub student_id: i64,
    /// Percentage, 0-100.
    pub score: i32,
    pub completed_at: DateTime<Utc>,
}

/// DTO for submitting a quiz attempt.
#[derive(Debug, Deserialize)]
pub struct SubmitQuizRequest {
    /// User's answers map.
    /// Key: Question ID (i64)
    /// Value: User's answer (String)
    pub answers: Option<HashMap<i64, String>>,
}

/// Response body of a scored submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubmissionResult {
    pub attempt_id: i64,
    pub score: i32,
    pub passed: bool,
    pub passing_score: i32,
    pub total_questions: usize,
    pub correct_answers: usize,
    pub earned_points: i64,
    pub total_points: i64,
    pub completed_at: DateTime<Utc>,
}

/// Answer-key view of a quiz for review and correction.
#[derive(Debug, Serialize)]
pub struct QuizResults {
    pub quiz_id: i64,
    pub total_questions: usize,
    pub total_points: i64,
    pub questions: Vec<Question>,
}
