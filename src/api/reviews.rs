use std::time::Duration;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};

use crate::api::errors::ApiError;
use crate::api::guards::CurrentUser;
use crate::api::validation::validate_body;
use crate::core::state::AppState;
use crate::db::models::{TaskSubmission, User};
use crate::repositories;
use crate::schemas::submission::{
    PendingSubmissionResponse, ReviewCreate, ReviewResponse, SubmissionResponse,
};
use crate::services::submissions;

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(review_queue))
        .route("/:submission_id", get(get_submission).post(review_submission))
}

async fn review_queue(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<PendingSubmissionResponse>>, ApiError> {
    let pending = repositories::task_submissions::list_pending_for_reviewer(state.db(), &user.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list pending submissions"))?;

    Ok(Json(pending.into_iter().map(PendingSubmissionResponse::from).collect()))
}

/// Loads a submission the user may review: they must have created the task's course.
async fn reviewable_submission(
    state: &AppState,
    user: &User,
    submission_id: &str,
) -> Result<TaskSubmission, ApiError> {
    let submission = repositories::task_submissions::find_by_id(state.db(), submission_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load submission"))?
        .ok_or_else(|| ApiError::not_found("Submission not found"))?;

    let owner = repositories::task_submissions::task_owner(state.db(), &submission.task_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load task course"))?
        .ok_or_else(|| ApiError::not_found("Task not found"))?;

    if owner.creator_id != user.id {
        return Err(ApiError::Forbidden("Only the course creator can review submissions"));
    }

    Ok(submission)
}

async fn get_submission(
    Path(submission_id): Path<String>,
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<SubmissionResponse>, ApiError> {
    let submission = reviewable_submission(&state, &user, &submission_id).await?;
    let review = repositories::task_submissions::find_review(state.db(), &submission.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load review"))?;

    let mut response = SubmissionResponse::from_db(submission);
    response.review = review.map(ReviewResponse::from);

    if let Some(storage) = state.storage() {
        let ttl =
            Duration::from_secs(state.settings().content().presigned_url_expire_minutes * 60);
        match storage.presign_get(&response.file, ttl).await {
            Ok(url) => response.file_url = Some(url),
            Err(err) => tracing::warn!(error = %err, "Failed to presign submission file"),
        }
    }

    Ok(Json(response))
}

async fn review_submission(
    Path(submission_id): Path<String>,
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Json(payload): Json<ReviewCreate>,
) -> Result<(StatusCode, Json<ReviewResponse>), ApiError> {
    validate_body(&payload)?;
    let submission = reviewable_submission(&state, &user, &submission_id).await?;

    let review = submissions::review_submission(
        state.db(),
        &submission.id,
        &user.id,
        payload.is_correct,
        payload.comment.trim(),
    )
    .await?;

    Ok((StatusCode::CREATED, Json(ReviewResponse::from(review))))
}
