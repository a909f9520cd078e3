// src/models/lesson.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// Represents the 'lessons' table in the database.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct Lesson {
    pub id: i64,
    pub course_id: i64,
    pub title: String,
    /// HTML body, sanitized on write.
    pub content: Option<String>,
    pub video_url: Option<String>,
    /// Position inside the course. Lessons are listed by this, then by id.
    pub order_index: i32,
}

/// Resolved input for inserting a lesson.
#[derive(Debug, Clone)]
pub struct NewLesson {
    pub course_id: i64,
    pub title: String,
    pub content: Option<String>,
    pub video_url: Option<String>,
    pub order_index: i32,
}

/// Resolved input for editing a lesson. `None` keeps the current position.
#[derive(Debug, Clone)]
pub struct LessonChanges {
    pub title: String,
    pub content: Option<String>,
    pub video_url: Option<String>,
    pub order_index: Option<i32>,
}

/// DTO for creating a new lesson.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateLessonRequest {
    pub course_id: i64,
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[validate(length(max = 100000))]
    pub content: Option<String>,
    #[validate(length(max = 500))]
    pub video_url: Option<String>,
    #[validate(range(min = 0))]
    pub order_index: Option<i32>,
}

impl CreateLessonRequest {
    pub fn into_new_lesson(self, content: Option<String>) -> NewLesson {
        NewLesson {
            course_id: self.course_id,
            title: self.title,
            content,
            video_url: self.video_url,
            order_index: self.order_index.unwrap_or(0),
        }
    }
}

/// DTO for updating a lesson. The owning course never changes.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateLessonRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[validate(length(max = 100000))]
    pub content: Option<String>,
    #[validate(length(max = 500))]
    pub video_url: Option<String>,
    #[validate(range(min = 0))]
    pub order_index: Option<i32>,
}

impl UpdateLessonRequest {
    pub fn into_changes(self, content: Option<String>) -> LessonChanges {
        LessonChanges {
            title: self.title,
            content,
            video_url: self.video_url,
            order_index: self.order_index,
        }
    }
}
