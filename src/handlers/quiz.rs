// src/handlers/quiz.rs

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use validator::Validate;

use crate::{
    error::AppError,
    handlers::lesson::lesson_not_found,
    models::{
        attempt::SubmitQuizRequest,
        question::PublicQuestion,
        quiz::{CreateQuizRequest, UpdateQuizRequest},
    },
    services::submission,
    state::SharedStore,
    store::{AttemptRepository, CourseCatalog, QuestionBank, QuizCatalog},
    utils::{extract::AppJson, jwt::Claims},
};

fn quiz_not_found(id: i64) -> AppError {
    AppError::NotFound(format!("Quiz {} not found", id))
}

/// Lists the quizzes attached to a lesson.
pub async fn list_by_lesson(
    State(store): State<SharedStore>,
    Path(lesson_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    store
        .find_lesson(lesson_id)
        .await?
        .ok_or_else(|| lesson_not_found(lesson_id))?;

    let quizzes = store.quizzes_for_lesson(lesson_id).await?;
    Ok(Json(quizzes))
}

/// Retrieves a single quiz by ID.
pub async fn get_quiz(
    State(store): State<SharedStore>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let quiz = store
        .find_quiz_by_id(id)
        .await?
        .ok_or_else(|| quiz_not_found(id))?;

    Ok(Json(quiz))
}

/// Returns the questions of a quiz for taking it, without answers.
pub async fn list_public_questions(
    State(store): State<SharedStore>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    store
        .find_quiz_by_id(id)
        .await?
        .ok_or_else(|| quiz_not_found(id))?;

    let questions: Vec<PublicQuestion> = store
        .questions_for_quiz(id)
        .await?
        .into_iter()
        .map(PublicQuestion::from)
        .collect();

    Ok(Json(questions))
}

/// Creates a quiz under an existing lesson. Teacher/admin only.
pub async fn create_quiz(
    State(store): State<SharedStore>,
    AppJson(payload): AppJson<CreateQuizRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    store
        .find_lesson(payload.lesson_id)
        .await?
        .ok_or_else(|| lesson_not_found(payload.lesson_id))?;

    let quiz = store.create_quiz(payload.into_new_quiz()).await?;

    tracing::info!(quiz_id = quiz.id, lesson_id = quiz.lesson_id, "Quiz created");

    Ok((StatusCode::CREATED, Json(quiz)))
}

/// Edits title, time limit and passing score. Teacher/admin only.
///
/// Existing attempts keep their stored percentage; only future pass/fail
/// decisions see the new threshold.
pub async fn update_quiz(
    State(store): State<SharedStore>,
    Path(id): Path<i64>,
    AppJson(payload): AppJson<UpdateQuizRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let quiz = store
        .update_quiz(id, payload.into_changes())
        .await?
        .ok_or_else(|| quiz_not_found(id))?;

    Ok(Json(quiz))
}

/// Deletes a quiz together with its questions and attempts. Teacher/admin only.
pub async fn delete_quiz(
    State(store): State<SharedStore>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    if !store.delete_quiz(id).await? {
        return Err(quiz_not_found(id));
    }

    tracing::info!(quiz_id = id, "Quiz deleted");

    Ok(StatusCode::NO_CONTENT)
}

/// Submits the caller's answers and returns the scored result.
///
/// * The student is the authenticated user, never a body field.
/// * A body without `answers` is rejected before scoring.
/// * The (quiz, student) attempt is created or overwritten.
pub async fn submit_quiz(
    State(store): State<SharedStore>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
    AppJson(req): AppJson<SubmitQuizRequest>,
) -> Result<impl IntoResponse, AppError> {
    let student_id = claims.user_id()?;
    let answers = req
        .answers
        .ok_or_else(|| AppError::BadRequest("Answers are required".to_string()))?;

    let result = submission::submit_quiz(store.as_ref(), id, student_id, &answers).await?;

    Ok(Json(result))
}

/// Returns the caller's recorded attempt for a quiz.
pub async fn get_my_attempt(
    State(store): State<SharedStore>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let student_id = claims.user_id()?;

    let attempt = store
        .find_attempt(id, student_id)
        .await?
        .ok_or_else(|| AppError::NotFound("No attempt recorded for this quiz".to_string()))?;

    Ok(Json(attempt))
}

/// Answer-key view: totals plus every question with its correct answer. Teacher/admin only.
pub async fn get_results(
    State(store): State<SharedStore>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let results = submission::quiz_results(store.as_ref(), id).await?;
    Ok(Json(results))
}

/// Lists every student's attempt on a quiz. Teacher/admin only.
pub async fn list_attempts(
    State(store): State<SharedStore>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    store
        .find_quiz_by_id(id)
        .await?
        .ok_or_else(|| quiz_not_found(id))?;

    let attempts = store.attempts_for_quiz(id).await?;
    Ok(Json(attempts))
}
