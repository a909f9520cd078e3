// src/models/course.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// Represents the 'courses' table in the database.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct Course {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub category: Option<String>,
    /// Author of the course. Cleared when that account is removed.
    pub teacher_id: Option<i64>,
    pub created_at: DateTime<Utc>,
}

/// Resolved input for inserting or editing a course.
#[derive(Debug, Clone)]
pub struct CourseDraft {
    pub title: String,
    pub description: Option<String>,
    pub category: Option<String>,
}

/// DTO for creating or updating a course. The author is taken from the token.
#[derive(Debug, Deserialize, Validate)]
pub struct CourseRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[validate(length(max = 10000))]
    pub description: Option<String>,
    #[validate(length(min = 1, max = 50))]
    pub category: Option<String>,
}

impl From<CourseRequest> for CourseDraft {
    fn from(req: CourseRequest) -> Self {
        CourseDraft {
            title: req.title,
            description: req.description,
            category: req.category,
        }
    }
}

/// Optional filters for `GET /api/courses`. Both apply when both are given.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct CourseFilter {
    pub category: Option<String>,
    pub teacher_id: Option<i64>,
}

impl CourseFilter {
    pub fn matches(&self, course: &Course) -> bool {
        let category_ok = match &self.category {
            Some(category) => course.category.as_deref() == Some(category.as_str()),
            None => true,
        };
        let teacher_ok = match self.teacher_id {
            Some(teacher_id) => course.teacher_id == Some(teacher_id),
            None => true,
        };
        category_ok && teacher_ok
    }
}
