// src/models/question.rs

use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::prelude::FromRow;
use validator::Validate;

use crate::config::DEFAULT_QUESTION_POINTS;

/// Represents the 'questions' table in the database.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct Question {
    pub id: i64,

    pub quiz_id: i64,

    /// The text content of the question.
    pub question_text: String,

    /// Answer options as authored (e.g., ["Option A", "Option B"]).
    /// Opaque to scoring; stored as JSONB.
    pub options: Option<Value>,

    /// The expected answer, compared case-insensitively on submission.
    pub correct_answer: String,

    /// Point weight. `None` or anything below 1 counts as 1.
    pub points: Option<i32>,
}

impl Question {
    pub fn effective_points(&self) -> i32 {
        match self.points {
            Some(points) if points >= DEFAULT_QUESTION_POINTS => points,
            _ => DEFAULT_QUESTION_POINTS,
        }
    }
}

/// DTO for sending question to a student (excludes the correct answer).
#[derive(Debug, Serialize)]
pub struct PublicQuestion {
    pub id: i64,
    pub question_text: String,
    pub options: Option<Value>,
    pub points: i32,
}

impl From<Question> for PublicQuestion {
    fn from(q: Question) -> Self {
        let points = q.effective_points();
        PublicQuestion {
            id: q.id,
            question_text: q.question_text,
            options: q.options,
            points,
        }
    }
}

/// Resolved input for inserting or editing a question.
#[derive(Debug, Clone)]
pub struct QuestionDraft {
    pub question_text: String,
    pub options: Option<Value>,
    pub correct_answer: String,
    pub points: i32,
}

impl QuestionDraft {
    pub fn new(
        question_text: String,
        options: Option<Value>,
        correct_answer: String,
        points: Option<i32>,
    ) -> Self {
        QuestionDraft {
            question_text,
            options,
            correct_answer,
            points: points.unwrap_or(DEFAULT_QUESTION_POINTS),
        }
    }
}

/// DTO for creating a new question.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateQuestionRequest {
    pub quiz_id: i64,
    #[validate(length(min = 1, max = 5000))]
    pub question_text: String,
    pub options: Option<Value>,
    #[validate(length(min = 1, max = 500))]
    pub correct_answer: String,
    #[validate(range(min = 1))]
    pub points: Option<i32>,
}

/// DTO for updating a question. The owning quiz never changes.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateQuestionRequest {
    #[validate(length(min = 1, max = 5000))]
    pub question_text: String,
    pub options: Option<Value>,
    #[validate(length(min = 1, max = 500))]
    pub correct_answer: String,
    #[validate(range(min = 1))]
    pub points: Option<i32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn question(points: Option<i32>) -> Question {
        Question {
            id: 1,
            quiz_id: 1,
            question_text: "Q".to_string(),
            options: None,
            correct_answer: "A".to_string(),
            points,
        }
    }

    #[test]
    fn missing_points_count_as_one() {
        assert_eq!(question(None).effective_points(), 1);
    }

    #[test]
    fn non_positive_points_are_raised_to_one() {
        assert_eq!(question(Some(0)).effective_points(), 1);
        assert_eq!(question(Some(-4)).effective_points(), 1);
    }

    #[test]
    fn explicit_points_are_kept() {
        assert_eq!(question(Some(5)).effective_points(), 5);
    }

    #[test]
    fn public_question_hides_answer() {
        let public = PublicQuestion::from(question(Some(3)));
        let json = serde_json::to_value(&public).unwrap();
        assert!(json.get("correct_answer").is_none());
        assert_eq!(json["points"], 3);
    }
}
