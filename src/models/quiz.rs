// src/models/quiz.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use crate::config::DEFAULT_PASSING_SCORE;

/// Represents the 'quizzes' table in the database.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct Quiz {
    pub id: i64,

    pub title: String,

    /// Time limit in minutes. Advisory only, never enforced on submission.
    pub time_limit: Option<i32>,

    /// Minimum percentage (0-100) a submission needs to pass.
    pub passing_score: i32,

    /// Owning lesson. Must exist when the quiz is created.
    pub lesson_id: i64,
}

/// Resolved input for inserting a quiz.
#[derive(Debug, Clone)]
pub struct NewQuiz {
    pub title: String,
    pub time_limit: Option<i32>,
    pub passing_score: i32,
    pub lesson_id: i64,
}

/// Resolved input for editing a quiz. The owning lesson never changes.
#[derive(Debug, Clone)]
pub struct QuizChanges {
    pub title: String,
    pub time_limit: Option<i32>,
    pub passing_score: i32,
}

/// DTO for creating a new quiz.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateQuizRequest {
    /// Plain text, stored verbatim. Clients escape it when rendering.
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[validate(range(min = 1))]
    pub time_limit: Option<i32>,
    #[validate(range(min = 0, max = 100))]
    pub passing_score: Option<i32>,
    pub lesson_id: i64,
}

impl CreateQuizRequest {
    pub fn into_new_quiz(self) -> NewQuiz {
        NewQuiz {
            title: self.title,
            time_limit: self.time_limit,
            passing_score: self.passing_score.unwrap_or(DEFAULT_PASSING_SCORE),
            lesson_id: self.lesson_id,
        }
    }
}

/// DTO for updating a quiz. An omitted passing score falls back to the default.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateQuizRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[validate(range(min = 1))]
    pub time_limit: Option<i32>,
    #[validate(range(min = 0, max = 100))]
    pub passing_score: Option<i32>,
}

impl UpdateQuizRequest {
    pub fn into_changes(self) -> QuizChanges {
        QuizChanges {
            title: self.title,
            time_limit: self.time_limit,
            passing_score: self.passing_score.unwrap_or(DEFAULT_PASSING_SCORE),
        }
    }
}
