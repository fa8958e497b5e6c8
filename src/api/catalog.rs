use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use uuid::Uuid;

use crate::api::courses::course_responses;
use crate::api::errors::ApiError;
use crate::api::guards::CurrentUser;
use crate::api::validation::validate_body;
use crate::core::state::AppState;
use crate::core::time::{format_primitive, primitive_now_utc};
use crate::db;
use crate::db::models::Course;
use crate::repositories;
use crate::schemas::auth::MessageResponse;
use crate::schemas::course::{CourseResponse, RatingCreate, RatingResponse};

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_catalog))
        .route("/:slug", get(get_catalog_course))
        .route("/:slug/enroll", post(enroll))
        .route("/:slug/ratings", get(list_ratings).post(rate_course))
}

async fn load_approved(state: &AppState, slug: &str) -> Result<Course, ApiError> {
    repositories::courses::find_by_slug(state.db(), slug)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load course"))?
        .filter(|course| course.approval)
        .ok_or_else(|| ApiError::not_found("Course not found"))
}

async fn list_catalog(
    CurrentUser(_viewer): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<CourseResponse>>, ApiError> {
    let courses = repositories::courses::list_approved(state.db())
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list catalog"))?;

    Ok(Json(course_responses(&state, courses, true).await?))
}

async fn get_catalog_course(
    Path(slug): Path<String>,
    CurrentUser(_viewer): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<CourseResponse>, ApiError> {
    let course = load_approved(&state, &slug).await?;

    let mut responses = course_responses(&state, vec![course], true).await?;
    responses.pop().map(Json).ok_or_else(|| ApiError::not_found("Course not found"))
}

async fn enroll(
    Path(slug): Path<String>,
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<MessageResponse>), ApiError> {
    let course = load_approved(&state, &slug).await?;

    let added =
        repositories::courses::add_member(state.db(), &course.id, &user.id, primitive_now_utc())
            .await
            .map_err(|e| ApiError::internal(e, "Failed to enroll"))?;

    if added {
        tracing::info!(course_id = %course.id, user_id = %user.id, "User enrolled");
        Ok((StatusCode::CREATED, Json(MessageResponse::new("Enrolled"))))
    } else {
        Ok((StatusCode::OK, Json(MessageResponse::new("Already enrolled"))))
    }
}

async fn list_ratings(
    Path(slug): Path<String>,
    CurrentUser(_viewer): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<RatingResponse>>, ApiError> {
    let course = load_approved(&state, &slug).await?;

    let ratings = repositories::ratings::list_by_course(state.db(), &course.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load ratings"))?;

    Ok(Json(ratings.into_iter().map(RatingResponse::from_row).collect()))
}

async fn rate_course(
    Path(slug): Path<String>,
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Json(payload): Json<RatingCreate>,
) -> Result<(StatusCode, Json<RatingResponse>), ApiError> {
    validate_body(&payload)?;
    let course = load_approved(&state, &slug).await?;

    let member = repositories::courses::is_member(state.db(), &course.id, &user.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to check course membership"))?;
    if !member {
        return Err(ApiError::Forbidden("Enroll in the course before rating it"));
    }

    let rating = repositories::ratings::create(
        state.db(),
        repositories::ratings::CreateRating {
            id: &Uuid::new_v4().to_string(),
            course_id: &course.id,
            user_id: &user.id,
            rating: payload.rating,
            review: payload.review.trim(),
            created_at: primitive_now_utc(),
        },
    )
    .await
    .map_err(|e| {
        if db::is_unique_violation(&e, repositories::ratings::RATING_UNIQUE) {
            ApiError::Conflict {
                code: "duplicate_rating",
                detail: "You have already rated this course".to_string(),
            }
        } else {
            ApiError::internal(e, "Failed to store rating")
        }
    })?;

    Ok((
        StatusCode::CREATED,
        Json(RatingResponse {
            id: rating.id,
            author: user.display_name(),
            rating: rating.rating,
            review: rating.review,
            created_at: format_primitive(rating.created_at),
        }),
    ))
}
