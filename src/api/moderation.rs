use axum::{
    extract::{Path, State},
    routing::{get, patch},
    Json, Router,
};

use crate::api::courses::course_responses;
use crate::api::errors::ApiError;
use crate::api::guards::CurrentModerator;
use crate::core::state::AppState;
use crate::repositories;
use crate::schemas::course::{ApprovalUpdate, CourseResponse};

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/courses", get(list_pending))
        .route("/courses/:slug", patch(set_approval))
}

async fn list_pending(
    CurrentModerator(_moderator): CurrentModerator,
    State(state): State<AppState>,
) -> Result<Json<Vec<CourseResponse>>, ApiError> {
    let courses = repositories::courses::list_pending(state.db())
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list pending courses"))?;

    Ok(Json(course_responses(&state, courses, false).await?))
}

async fn set_approval(
    Path(slug): Path<String>,
    CurrentModerator(moderator): CurrentModerator,
    State(state): State<AppState>,
    Json(payload): Json<ApprovalUpdate>,
) -> Result<Json<CourseResponse>, ApiError> {
    let course = crate::api::guards::load_course(&state, &slug).await?;

    let updated = repositories::courses::set_approval(state.db(), &course.id, payload.approval)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to update course approval"))?
        .ok_or_else(|| ApiError::not_found("Course not found"))?;

    tracing::info!(
        course_id = %updated.id,
        moderator_id = %moderator.id,
        approval = payload.approval,
        "Course approval changed"
    );

    let mut responses = course_responses(&state, vec![updated], false).await?;
    responses.pop().map(Json).ok_or_else(|| ApiError::not_found("Course not found"))
}
