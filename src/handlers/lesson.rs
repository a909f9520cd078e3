// src/handlers/lesson.rs

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use validator::Validate;

use crate::{
    error::AppError,
    handlers::course::course_not_found,
    models::lesson::{CreateLessonRequest, UpdateLessonRequest},
    state::SharedStore,
    store::CourseCatalog,
    utils::{extract::AppJson, html::clean_html},
};

pub(crate) fn lesson_not_found(id: i64) -> AppError {
    AppError::NotFound(format!("Lesson {} not found", id))
}

/// Lists the lessons of a course in teaching order.
pub async fn list_by_course(
    State(store): State<SharedStore>,
    Path(course_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    store
        .find_course(course_id)
        .await?
        .ok_or_else(|| course_not_found(course_id))?;

    let lessons = store.lessons_for_course(course_id).await?;
    Ok(Json(lessons))
}

pub async fn get_lesson(
    State(store): State<SharedStore>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let lesson = store
        .find_lesson(id)
        .await?
        .ok_or_else(|| lesson_not_found(id))?;

    Ok(Json(lesson))
}

/// Adds a lesson to an existing course. Teacher/admin only.
/// The HTML body is sanitized; omitted position defaults to 0.
pub async fn create_lesson(
    State(store): State<SharedStore>,
    AppJson(payload): AppJson<CreateLessonRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    store
        .find_course(payload.course_id)
        .await?
        .ok_or_else(|| course_not_found(payload.course_id))?;

    let content = payload.content.as_deref().map(clean_html);
    let lesson = store.create_lesson(payload.into_new_lesson(content)).await?;

    tracing::info!(lesson_id = lesson.id, course_id = lesson.course_id, "Lesson created");

    Ok((StatusCode::CREATED, Json(lesson)))
}

/// Replaces title, body and video. Position only changes when given.
/// Teacher/admin only.
pub async fn update_lesson(
    State(store): State<SharedStore>,
    Path(id): Path<i64>,
    AppJson(payload): AppJson<UpdateLessonRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let content = payload.content.as_deref().map(clean_html);
    let lesson = store
        .update_lesson(id, payload.into_changes(content))
        .await?
        .ok_or_else(|| lesson_not_found(id))?;

    Ok(Json(lesson))
}

/// Deletes a lesson with its quizzes. Teacher/admin only.
pub async fn delete_lesson(
    State(store): State<SharedStore>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    if !store.delete_lesson(id).await? {
        return Err(lesson_not_found(id));
    }

    Ok(StatusCode::NO_CONTENT)
}
