// src/handlers/question.rs

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use validator::Validate;

use crate::{
    error::AppError,
    models::question::{CreateQuestionRequest, QuestionDraft, UpdateQuestionRequest},
    state::SharedStore,
    store::{QuestionBank, QuizCatalog},
    utils::extract::AppJson,
};

fn question_not_found(id: i64) -> AppError {
    AppError::NotFound(format!("Question {} not found", id))
}

/// Adds a question to an existing quiz.
/// Teacher/admin only. Omitted points default to 1.
pub async fn create_question(
    State(store): State<SharedStore>,
    AppJson(payload): AppJson<CreateQuestionRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    store
        .find_quiz_by_id(payload.quiz_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Quiz {} not found", payload.quiz_id)))?;

    let draft = QuestionDraft::new(
        payload.question_text,
        payload.options,
        payload.correct_answer,
        payload.points,
    );
    let question = store.create_question(payload.quiz_id, draft).await?;

    Ok((StatusCode::CREATED, Json(question)))
}

/// Retrieves a question including its correct answer.
/// Teacher/admin only.
pub async fn get_question(
    State(store): State<SharedStore>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let question = store
        .find_question(id)
        .await?
        .ok_or_else(|| question_not_found(id))?;

    Ok(Json(question))
}

/// Replaces text, options, answer and points of a question.
/// Teacher/admin only.
pub async fn update_question(
    State(store): State<SharedStore>,
    Path(id): Path<i64>,
    AppJson(payload): AppJson<UpdateQuestionRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let draft = QuestionDraft::new(
        payload.question_text,
        payload.options,
        payload.correct_answer,
        payload.points,
    );
    let question = store
        .update_question(id, draft)
        .await?
        .ok_or_else(|| question_not_found(id))?;

    Ok(Json(question))
}

/// Deletes a question by ID.
/// Teacher/admin only.
pub async fn delete_question(
    State(store): State<SharedStore>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    if !store.delete_question(id).await? {
        return Err(question_not_found(id));
    }

    Ok(StatusCode::NO_CONTENT)
}
