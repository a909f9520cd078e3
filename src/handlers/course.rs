// src/handlers/course.rs

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use validator::Validate;

use crate::{
    error::AppError,
    models::course::{CourseFilter, CourseRequest},
    state::SharedStore,
    store::{CourseCatalog, EnrollmentRepository},
    utils::{
        extract::{AppJson, AppQuery},
        jwt::Claims,
    },
};

pub(crate) fn course_not_found(id: i64) -> AppError {
    AppError::NotFound(format!("Course {} not found", id))
}

/// Lists courses, optionally filtered by `category` and `teacher_id`.
pub async fn list_courses(
    State(store): State<SharedStore>,
    AppQuery(filter): AppQuery<CourseFilter>,
) -> Result<impl IntoResponse, AppError> {
    let courses = store.list_courses(&filter).await?;
    Ok(Json(courses))
}

pub async fn get_course(
    State(store): State<SharedStore>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let course = store
        .find_course(id)
        .await?
        .ok_or_else(|| course_not_found(id))?;

    Ok(Json(course))
}

/// Creates a course authored by the caller. Teacher/admin only.
pub async fn create_course(
    State(store): State<SharedStore>,
    Extension(claims): Extension<Claims>,
    AppJson(payload): AppJson<CourseRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let teacher_id = claims.user_id()?;
    let course = store
        .create_course(Some(teacher_id), payload.into())
        .await?;

    tracing::info!(course_id = course.id, teacher_id, "Course created");

    Ok((StatusCode::CREATED, Json(course)))
}

/// Replaces title, description and category. Teacher/admin only.
pub async fn update_course(
    State(store): State<SharedStore>,
    Path(id): Path<i64>,
    AppJson(payload): AppJson<CourseRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let course = store
        .update_course(id, payload.into())
        .await?
        .ok_or_else(|| course_not_found(id))?;

    Ok(Json(course))
}

/// Deletes a course with its lessons, quizzes and enrollments. Teacher/admin only.
pub async fn delete_course(
    State(store): State<SharedStore>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    if !store.delete_course(id).await? {
        return Err(course_not_found(id));
    }

    tracing::info!(course_id = id, "Course deleted");

    Ok(StatusCode::NO_CONTENT)
}

/// Lists everyone enrolled in a course. Teacher/admin only.
pub async fn list_course_enrollments(
    State(store): State<SharedStore>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    store
        .find_course(id)
        .await?
        .ok_or_else(|| course_not_found(id))?;

    let enrollments = store.enrollments_for_course(id).await?;
    Ok(Json(enrollments))
}
