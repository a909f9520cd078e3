// src/handlers/enrollment.rs

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;
use validator::Validate;

use crate::{
    error::AppError,
    handlers::course::course_not_found,
    models::enrollment::{Enrollment, UpdateProgressRequest},
    state::SharedStore,
    store::{CourseCatalog, EnrollmentRepository},
    utils::{extract::AppJson, jwt::Claims},
};

/// Loads an enrollment the caller may change: their own, or any for staff.
async fn owned_enrollment(
    store: &SharedStore,
    claims: &Claims,
    id: i64,
) -> Result<Enrollment, AppError> {
    let enrollment = store
        .find_enrollment(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Enrollment {} not found", id)))?;

    let is_staff = claims.role().is_some_and(|role| role.is_staff());
    if enrollment.student_id != claims.user_id()? && !is_staff {
        return Err(AppError::Forbidden(
            "Enrollment belongs to another student".to_string(),
        ));
    }

    Ok(enrollment)
}

/// Enrolls the caller in a course.
pub async fn enroll(
    State(store): State<SharedStore>,
    Extension(claims): Extension<Claims>,
    Path(course_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let student_id = claims.user_id()?;

    store
        .find_course(course_id)
        .await?
        .ok_or_else(|| course_not_found(course_id))?;

    let enrollment = store.enroll(student_id, course_id, Utc::now()).await?;

    tracing::info!(enrollment_id = enrollment.id, student_id, course_id, "Student enrolled");

    Ok((StatusCode::CREATED, Json(enrollment)))
}

/// The caller's enrollments.
pub async fn list_mine(
    State(store): State<SharedStore>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let enrollments = store.enrollments_for_student(claims.user_id()?).await?;
    Ok(Json(enrollments))
}

/// Records course progress (0-100). At 100 the enrollment is completed.
pub async fn update_progress(
    State(store): State<SharedStore>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
    AppJson(payload): AppJson<UpdateProgressRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    owned_enrollment(&store, &claims, id).await?;

    let enrollment = store
        .update_progress(id, payload.progress)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Enrollment {} not found", id)))?;

    Ok(Json(enrollment))
}

/// Drops an enrollment.
pub async fn unenroll(
    State(store): State<SharedStore>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    owned_enrollment(&store, &claims, id).await?;

    store.delete_enrollment(id).await?;

    Ok(StatusCode::NO_CONTENT)
}
