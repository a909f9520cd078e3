// src/store/mod.rs

//! Storage seams. Entities are plain structs referenced by id; every backend
//! implements the same repositories.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::{
    error::AppError,
    models::{
        attempt::QuizAttempt,
        course::{Course, CourseDraft, CourseFilter},
        enrollment::Enrollment,
        lesson::{Lesson, LessonChanges, NewLesson},
        question::{Question, QuestionDraft},
        quiz::{NewQuiz, Quiz, QuizChanges},
        user::{NewUser, User},
    },
};

pub use memory::MemoryStore;
pub use postgres::PgStore;

#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Fails with `Conflict` when the username is taken.
    async fn create_user(&self, user: NewUser) -> Result<User, AppError>;

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, AppError>;
}

/// Courses and their lessons.
#[async_trait]
pub trait CourseCatalog: Send + Sync {
    async fn create_course(
        &self,
        teacher_id: Option<i64>,
        draft: CourseDraft,
    ) -> Result<Course, AppError>;

    async fn find_course(&self, id: i64) -> Result<Option<Course>, AppError>;

    /// Courses matching every filter that is set, ordered by id.
    async fn list_courses(&self, filter: &CourseFilter) -> Result<Vec<Course>, AppError>;

    async fn update_course(&self, id: i64, draft: CourseDraft)
    -> Result<Option<Course>, AppError>;

    /// Removes the course with its lessons, their quizzes and all enrollments.
    async fn delete_course(&self, id: i64) -> Result<bool, AppError>;

    /// The caller must have checked that the course exists.
    async fn create_lesson(&self, lesson: NewLesson) -> Result<Lesson, AppError>;

    async fn find_lesson(&self, id: i64) -> Result<Option<Lesson>, AppError>;

    /// Ordered by `order_index`, then id.
    async fn lessons_for_course(&self, course_id: i64) -> Result<Vec<Lesson>, AppError>;

    async fn update_lesson(
        &self,
        id: i64,
        changes: LessonChanges,
    ) -> Result<Option<Lesson>, AppError>;

    /// Removes the lesson with its quizzes.
    async fn delete_lesson(&self, id: i64) -> Result<bool, AppError>;
}

/// One enrollment per (student, course).
#[async_trait]
pub trait EnrollmentRepository: Send + Sync {
    /// Fails with `Conflict` when the student is already enrolled.
    async fn enroll(
        &self,
        student_id: i64,
        course_id: i64,
        enrolled_at: DateTime<Utc>,
    ) -> Result<Enrollment, AppError>;

    async fn find_enrollment(&self, id: i64) -> Result<Option<Enrollment>, AppError>;

    /// Sets progress. Reaching 100 marks the enrollment completed for good.
    async fn update_progress(
        &self,
        id: i64,
        progress: i32,
    ) -> Result<Option<Enrollment>, AppError>;

    async fn delete_enrollment(&self, id: i64) -> Result<bool, AppError>;

    async fn enrollments_for_student(&self, student_id: i64)
    -> Result<Vec<Enrollment>, AppError>;

    async fn enrollments_for_course(&self, course_id: i64) -> Result<Vec<Enrollment>, AppError>;
}

/// Read side used by scoring.
#[async_trait]
pub trait QuestionBank: Send + Sync {
    async fn find_quiz_by_id(&self, id: i64) -> Result<Option<Quiz>, AppError>;

    /// All questions of a quiz ordered by id. Empty when the quiz has none.
    async fn questions_for_quiz(&self, quiz_id: i64) -> Result<Vec<Question>, AppError>;
}

/// Teacher-facing quiz and question management.
#[async_trait]
pub trait QuizCatalog: Send + Sync {
    async fn create_quiz(&self, quiz: NewQuiz) -> Result<Quiz, AppError>;

    async fn update_quiz(&self, id: i64, changes: QuizChanges) -> Result<Option<Quiz>, AppError>;

    /// Removes the quiz with its questions and attempts. Returns false if it did not exist.
    async fn delete_quiz(&self, id: i64) -> Result<bool, AppError>;

    async fn quizzes_for_lesson(&self, lesson_id: i64) -> Result<Vec<Quiz>, AppError>;

    /// The caller must have checked that `quiz_id` exists.
    async fn create_question(&self, quiz_id: i64, draft: QuestionDraft)
    -> Result<Question, AppError>;

    async fn find_question(&self, id: i64) -> Result<Option<Question>, AppError>;

    async fn update_question(
        &self,
        id: i64,
        draft: QuestionDraft,
    ) -> Result<Option<Question>, AppError>;

    async fn delete_question(&self, id: i64) -> Result<bool, AppError>;
}

/// One attempt per (quiz, student).
#[async_trait]
pub trait AttemptRepository: Send + Sync {
    async fn find_attempt(
        &self,
        quiz_id: i64,
        student_id: i64,
    ) -> Result<Option<QuizAttempt>, AppError>;

    /// Inserts the attempt, or overwrites score and timestamp of the existing
    /// one for the pair while keeping its id. Atomic per pair.
    async fn upsert_attempt(
        &self,
        quiz_id: i64,
        student_id: i64,
        score: i32,
        completed_at: DateTime<Utc>,
    ) -> Result<QuizAttempt, AppError>;

    async fn attempts_for_quiz(&self, quiz_id: i64) -> Result<Vec<QuizAttempt>, AppError>;
}

pub trait Store:
    UserRepository
    + CourseCatalog
    + EnrollmentRepository
    + QuestionBank
    + QuizCatalog
    + AttemptRepository
{
}

impl<T> Store for T where
    T: UserRepository
        + CourseCatalog
        + EnrollmentRepository
        + QuestionBank
        + QuizCatalog
        + AttemptRepository
{
}
