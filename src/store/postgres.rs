// src/store/postgres.rs

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, postgres::PgPoolOptions};

use crate::{
    error::AppError,
    models::{
        attempt::QuizAttempt,
        course::{Course, CourseDraft, CourseFilter},
        enrollment::{COMPLETE_PROGRESS, Enrollment},
        lesson::{Lesson, LessonChanges, NewLesson},
        question::{Question, QuestionDraft},
        quiz::{NewQuiz, Quiz, QuizChanges},
        user::{NewUser, User},
    },
    store::{
        AttemptRepository, CourseCatalog, EnrollmentRepository, QuestionBank, QuizCatalog,
        UserRepository,
    },
};

const CONNECT_RETRIES: u32 = 5;

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connects with retry, then applies pending migrations.
    pub async fn connect(database_url: &str) -> Result<Self, AppError> {
        let mut retry_count = 0;
        let pool = loop {
            match PgPoolOptions::new()
                .max_connections(5)
                .acquire_timeout(Duration::from_secs(3))
                .connect(database_url)
                .await
            {
                Ok(pool) => break pool,
                Err(e) => {
                    retry_count += 1;
                    if retry_count > CONNECT_RETRIES {
                        return Err(AppError::InternalServerError(format!(
                            "Failed to connect to database after {} retries: {}",
                            CONNECT_RETRIES, e
                        )));
                    }
                    tracing::warn!(
                        "Database not ready, retrying in 2s... (Attempt {})",
                        retry_count
                    );
                    tokio::time::sleep(Duration::from_secs(2)).await;
                }
            }
        };

        tracing::info!("Database connected...");

        tracing::info!("Running migrations...");
        sqlx::migrate!("./migrations").run(&pool).await?;
        tracing::info!("Migrations applied successfully.");

        Ok(Self::new(pool))
    }
}

fn storage_error(context: &str, e: sqlx::Error) -> AppError {
    tracing::error!("{}: {:?}", context, e);
    AppError::from(e)
}

fn is_unique_violation(e: &sqlx::Error) -> bool {
    e.as_database_error()
        .is_some_and(|db| db.is_unique_violation())
}

#[async_trait]
impl UserRepository for PgStore {
    async fn create_user(&self, user: NewUser) -> Result<User, AppError> {
        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (username, password, role)
            VALUES ($1, $2, $3)
            RETURNING id, username, password, role, created_at
            "#,
        )
        .bind(&user.username)
        .bind(&user.password)
        .bind(user.role.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                AppError::Conflict(format!("Username '{}' already exists", user.username))
            } else {
                storage_error("Failed to create user", e)
            }
        })
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, AppError> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, password, role, created_at
            FROM users
            WHERE username = $1
            "#,
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| storage_error("Failed to fetch user", e))
    }
}

#[async_trait]
impl CourseCatalog for PgStore {
    async fn create_course(
        &self,
        teacher_id: Option<i64>,
        draft: CourseDraft,
    ) -> Result<Course, AppError> {
        sqlx::query_as::<_, Course>(
            r#"
            INSERT INTO courses (title, description, category, teacher_id)
            VALUES ($1, $2, $3, $4)
            RETURNING id, title, description, category, teacher_id, created_at
            "#,
        )
        .bind(&draft.title)
        .bind(&draft.description)
        .bind(&draft.category)
        .bind(teacher_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| storage_error("Failed to create course", e))
    }

    async fn find_course(&self, id: i64) -> Result<Option<Course>, AppError> {
        sqlx::query_as::<_, Course>(
            r#"
            SELECT id, title, description, category, teacher_id, created_at
            FROM courses
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| storage_error("Failed to fetch course", e))
    }

    async fn list_courses(&self, filter: &CourseFilter) -> Result<Vec<Course>, AppError> {
        sqlx::query_as::<_, Course>(
            r#"
            SELECT id, title, description, category, teacher_id, created_at
            FROM courses
            WHERE ($1::TEXT IS NULL OR category = $1)
              AND ($2::BIGINT IS NULL OR teacher_id = $2)
            ORDER BY id
            "#,
        )
        .bind(&filter.category)
        .bind(filter.teacher_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| storage_error("Failed to list courses", e))
    }

    async fn update_course(
        &self,
        id: i64,
        draft: CourseDraft,
    ) -> Result<Option<Course>, AppError> {
        sqlx::query_as::<_, Course>(
            r#"
            UPDATE courses
            SET title = $1, description = $2, category = $3
            WHERE id = $4
            RETURNING id, title, description, category, teacher_id, created_at
            "#,
        )
        .bind(&draft.title)
        .bind(&draft.description)
        .bind(&draft.category)
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| storage_error("Failed to update course", e))
    }

    async fn delete_course(&self, id: i64) -> Result<bool, AppError> {
        // lessons, quizzes and enrollments cascade through their foreign keys
        let result = sqlx::query("DELETE FROM courses WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| storage_error("Failed to delete course", e))?;

        Ok(result.rows_affected() > 0)
    }

    async fn create_lesson(&self, lesson: NewLesson) -> Result<Lesson, AppError> {
        sqlx::query_as::<_, Lesson>(
            r#"
            INSERT INTO lessons (course_id, title, content, video_url, order_index)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, course_id, title, content, video_url, order_index
            "#,
        )
        .bind(lesson.course_id)
        .bind(&lesson.title)
        .bind(&lesson.content)
        .bind(&lesson.video_url)
        .bind(lesson.order_index)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| storage_error("Failed to create lesson", e))
    }

    async fn find_lesson(&self, id: i64) -> Result<Option<Lesson>, AppError> {
        sqlx::query_as::<_, Lesson>(
            r#"
            SELECT id, course_id, title, content, video_url, order_index
            FROM lessons
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| storage_error("Failed to fetch lesson", e))
    }

    async fn lessons_for_course(&self, course_id: i64) -> Result<Vec<Lesson>, AppError> {
        sqlx::query_as::<_, Lesson>(
            r#"
            SELECT id, course_id, title, content, video_url, order_index
            FROM lessons
            WHERE course_id = $1
            ORDER BY order_index, id
            "#,
        )
        .bind(course_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| storage_error("Failed to list lessons", e))
    }

    async fn update_lesson(
        &self,
        id: i64,
        changes: LessonChanges,
    ) -> Result<Option<Lesson>, AppError> {
        sqlx::query_as::<_, Lesson>(
            r#"
            UPDATE lessons
            SET title = $1, content = $2, video_url = $3,
                order_index = COALESCE($4, order_index)
            WHERE id = $5
            RETURNING id, course_id, title, content, video_url, order_index
            "#,
        )
        .bind(&changes.title)
        .bind(&changes.content)
        .bind(&changes.video_url)
        .bind(changes.order_index)
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| storage_error("Failed to update lesson", e))
    }

    async fn delete_lesson(&self, id: i64) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM lessons WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| storage_error("Failed to delete lesson", e))?;

        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl EnrollmentRepository for PgStore {
    async fn enroll(
        &self,
        student_id: i64,
        course_id: i64,
        enrolled_at: DateTime<Utc>,
    ) -> Result<Enrollment, AppError> {
        sqlx::query_as::<_, Enrollment>(
            r#"
            INSERT INTO enrollments (student_id, course_id, enrolled_at)
            VALUES ($1, $2, $3)
            RETURNING id, student_id, course_id, enrolled_at, progress, completed
            "#,
        )
        .bind(student_id)
        .bind(course_id)
        .bind(enrolled_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                AppError::Conflict(format!("Already enrolled in course {}", course_id))
            } else {
                storage_error("Failed to enroll student", e)
            }
        })
    }

    async fn find_enrollment(&self, id: i64) -> Result<Option<Enrollment>, AppError> {
        sqlx::query_as::<_, Enrollment>(
            r#"
            SELECT id, student_id, course_id, enrolled_at, progress, completed
            FROM enrollments
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| storage_error("Failed to fetch enrollment", e))
    }

    async fn update_progress(
        &self,
        id: i64,
        progress: i32,
    ) -> Result<Option<Enrollment>, AppError> {
        sqlx::query_as::<_, Enrollment>(
            r#"
            UPDATE enrollments
            SET progress = $1, completed = completed OR $1 >= $2
            WHERE id = $3
            RETURNING id, student_id, course_id, enrolled_at, progress, completed
            "#,
        )
        .bind(progress)
        .bind(COMPLETE_PROGRESS)
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| storage_error("Failed to update enrollment progress", e))
    }

    async fn delete_enrollment(&self, id: i64) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM enrollments WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| storage_error("Failed to delete enrollment", e))?;

        Ok(result.rows_affected() > 0)
    }

    async fn enrollments_for_student(
        &self,
        student_id: i64,
    ) -> Result<Vec<Enrollment>, AppError> {
        sqlx::query_as::<_, Enrollment>(
            r#"
            SELECT id, student_id, course_id, enrolled_at, progress, completed
            FROM enrollments
            WHERE student_id = $1
            ORDER BY id
            "#,
        )
        .bind(student_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| storage_error("Failed to list student enrollments", e))
    }

    async fn enrollments_for_course(&self, course_id: i64) -> Result<Vec<Enrollment>, AppError> {
        sqlx::query_as::<_, Enrollment>(
            r#"
            SELECT id, student_id, course_id, enrolled_at, progress, completed
            FROM enrollments
            WHERE course_id = $1
            ORDER BY id
            "#,
        )
        .bind(course_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| storage_error("Failed to list course enrollments", e))
    }
}

#[async_trait]
impl QuestionBank for PgStore {
    async fn find_quiz_by_id(&self, id: i64) -> Result<Option<Quiz>, AppError> {
        sqlx::query_as::<_, Quiz>(
            r#"
            SELECT id, title, time_limit, passing_score, lesson_id
            FROM quizzes
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| storage_error("Failed to fetch quiz", e))
    }

    async fn questions_for_quiz(&self, quiz_id: i64) -> Result<Vec<Question>, AppError> {
        sqlx::query_as::<_, Question>(
            r#"
            SELECT id, quiz_id, question_text, options, correct_answer, points
            FROM questions
            WHERE quiz_id = $1
            ORDER BY id
            "#,
        )
        .bind(quiz_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| storage_error("Failed to fetch questions", e))
    }
}

#[async_trait]
impl QuizCatalog for PgStore {
    async fn create_quiz(&self, quiz: NewQuiz) -> Result<Quiz, AppError> {
        sqlx::query_as::<_, Quiz>(
            r#"
            INSERT INTO quizzes (title, time_limit, passing_score, lesson_id)
            VALUES ($1, $2, $3, $4)
            RETURNING id, title, time_limit, passing_score, lesson_id
            "#,
        )
        .bind(&quiz.title)
        .bind(quiz.time_limit)
        .bind(quiz.passing_score)
        .bind(quiz.lesson_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| storage_error("Failed to create quiz", e))
    }

    async fn update_quiz(&self, id: i64, changes: QuizChanges) -> Result<Option<Quiz>, AppError> {
        sqlx::query_as::<_, Quiz>(
            r#"
            UPDATE quizzes
            SET title = $1, time_limit = $2, passing_score = $3
            WHERE id = $4
            RETURNING id, title, time_limit, passing_score, lesson_id
            "#,
        )
        .bind(&changes.title)
        .bind(changes.time_limit)
        .bind(changes.passing_score)
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| storage_error("Failed to update quiz", e))
    }

    async fn delete_quiz(&self, id: i64) -> Result<bool, AppError> {
        // questions and quiz_attempts reference quizzes with ON DELETE CASCADE
        let result = sqlx::query("DELETE FROM quizzes WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| storage_error("Failed to delete quiz", e))?;

        Ok(result.rows_affected() > 0)
    }

    async fn quizzes_for_lesson(&self, lesson_id: i64) -> Result<Vec<Quiz>, AppError> {
        sqlx::query_as::<_, Quiz>(
            r#"
            SELECT id, title, time_limit, passing_score, lesson_id
            FROM quizzes
            WHERE lesson_id = $1
            ORDER BY id
            "#,
        )
        .bind(lesson_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| storage_error("Failed to list quizzes", e))
    }

    async fn create_question(
        &self,
        quiz_id: i64,
        draft: QuestionDraft,
    ) -> Result<Question, AppError> {
        sqlx::query_as::<_, Question>(
            r#"
            INSERT INTO questions (quiz_id, question_text, options, correct_answer, points)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, quiz_id, question_text, options, correct_answer, points
            "#,
        )
        .bind(quiz_id)
        .bind(&draft.question_text)
        .bind(&draft.options)
        .bind(&draft.correct_answer)
        .bind(draft.points)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| storage_error("Failed to create question", e))
    }

    async fn find_question(&self, id: i64) -> Result<Option<Question>, AppError> {
        sqlx::query_as::<_, Question>(
            r#"
            SELECT id, quiz_id, question_text, options, correct_answer, points
            FROM questions
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| storage_error("Failed to fetch question", e))
    }

    async fn update_question(
        &self,
        id: i64,
        draft: QuestionDraft,
    ) -> Result<Option<Question>, AppError> {
        sqlx::query_as::<_, Question>(
            r#"
            UPDATE questions
            SET question_text = $1, options = $2, correct_answer = $3, points = $4
            WHERE id = $5
            RETURNING id, quiz_id, question_text, options, correct_answer, points
            "#,
        )
        .bind(&draft.question_text)
        .bind(&draft.options)
        .bind(&draft.correct_answer)
        .bind(draft.points)
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| storage_error("Failed to update question", e))
    }

    async fn delete_question(&self, id: i64) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM questions WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| storage_error("Failed to delete question", e))?;

        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl AttemptRepository for PgStore {
    async fn find_attempt(
        &self,
        quiz_id: i64,
        student_id: i64,
    ) -> Result<Option<QuizAttempt>, AppError> {
        sqlx::query_as::<_, QuizAttempt>(
            r#"
            SELECT id, quiz_id, student_id, score, completed_at
            FROM quiz_attempts
            WHERE quiz_id = $1 AND student_id = $2
            "#,
        )
        .bind(quiz_id)
        .bind(student_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| storage_error("Failed to fetch attempt", e))
    }

    async fn upsert_attempt(
        &self,
        quiz_id: i64,
        student_id: i64,
        score: i32,
        completed_at: DateTime<Utc>,
    ) -> Result<QuizAttempt, AppError> {
        // Single statement against UNIQUE (quiz_id, student_id): last submission wins.
        sqlx::query_as::<_, QuizAttempt>(
            r#"
            INSERT INTO quiz_attempts (quiz_id, student_id, score, completed_at)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (quiz_id, student_id) DO UPDATE SET
                score = EXCLUDED.score,
                completed_at = EXCLUDED.completed_at
            RETURNING id, quiz_id, student_id, score, completed_at
            "#,
        )
        .bind(quiz_id)
        .bind(student_id)
        .bind(score)
        .bind(completed_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| storage_error("Failed to upsert quiz attempt", e))
    }

    async fn attempts_for_quiz(&self, quiz_id: i64) -> Result<Vec<QuizAttempt>, AppError> {
        sqlx::query_as::<_, QuizAttempt>(
            r#"
            SELECT id, quiz_id, student_id, score, completed_at
            FROM quiz_attempts
            WHERE quiz_id = $1
            ORDER BY id
            "#,
        )
        .bind(quiz_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| storage_error("Failed to list quiz attempts", e))
    }
}
