use async_trait::async_trait;
use axum::extract::{FromRequestParts, State};
use axum::http::{header, request::Parts};

use crate::api::errors::ApiError;
use crate::core::{security, state::AppState};
use crate::db::models::{Course, User};
use crate::repositories;

pub(crate) struct CurrentUser(pub(crate) User);
pub(crate) struct CurrentModerator(pub(crate) User);

/// How the current user relates to a course they are allowed to read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CourseAccess {
    Creator,
    Moderator,
    Member,
}

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let State(app_state) = State::<AppState>::from_request_parts(parts, state)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to access application state"))?;

        let auth_header = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or(ApiError::Unauthorized("Invalid authentication credentials"))?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or(ApiError::Unauthorized("Invalid authentication credentials"))?;

        let claims = security::verify_token(token, app_state.settings())
            .map_err(|_| ApiError::Unauthorized("Invalid authentication credentials"))?;

        let user = repositories::users::find_by_id(app_state.db(), &claims.sub)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to load user"))?;

        let Some(user) = user else {
            return Err(ApiError::Unauthorized("User not found"));
        };

        if !user.is_active {
            return Err(ApiError::Unauthorized("Invalid authentication credentials"));
        }

        Ok(CurrentUser(user))
    }
}

#[async_trait]
impl FromRequestParts<AppState> for CurrentModerator {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let CurrentUser(user) = CurrentUser::from_request_parts(parts, state).await?;

        if user.is_moderator {
            Ok(CurrentModerator(user))
        } else {
            Err(ApiError::Forbidden("Moderator access required"))
        }
    }
}

pub(crate) async fn load_course(state: &AppState, slug: &str) -> Result<Course, ApiError> {
    repositories::courses::find_by_slug(state.db(), slug)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load course"))?
        .ok_or_else(|| ApiError::not_found("Course not found"))
}

/// Authoring is reserved for the course creator.
pub(crate) fn require_author(user: &User, course: &Course) -> Result<(), ApiError> {
    if course.creator_id == user.id {
        Ok(())
    } else {
        Err(ApiError::Forbidden("Only the course creator can change this course"))
    }
}

/// Creators and moderators always read; members only once the course is approved.
pub(crate) async fn require_reader(
    state: &AppState,
    user: &User,
    course: &Course,
) -> Result<CourseAccess, ApiError> {
    if course.creator_id == user.id {
        return Ok(CourseAccess::Creator);
    }
    if user.is_moderator {
        return Ok(CourseAccess::Moderator);
    }

    let member = repositories::courses::is_member(state.db(), &course.id, &user.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to check course membership"))?;

    if !member {
        return Err(ApiError::Forbidden("You do not have access to this course"));
    }
    if !course.approval {
        return Err(ApiError::Forbidden("Course is not approved yet"));
    }

    Ok(CourseAccess::Member)
}
