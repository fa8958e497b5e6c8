use std::time::Duration;

use crate::api::errors::ApiError;
use crate::core::state::AppState;
use crate::db::models::{Content, Course, Lesson, Module};
use crate::repositories;
use crate::schemas::course::{CourseResponse, RatingResponse};
use crate::services::content_registry::ViewContext;

pub(super) async fn load_module(
    state: &AppState,
    course: &Course,
    module_id: &str,
) -> Result<Module, ApiError> {
    repositories::modules::find_in_course(state.db(), &course.id, module_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load module"))?
        .ok_or_else(|| ApiError::not_found("Module not found"))
}

pub(super) async fn load_lesson(
    state: &AppState,
    module: &Module,
    lesson_id: &str,
) -> Result<Lesson, ApiError> {
    repositories::lessons::find_in_module(state.db(), &module.id, lesson_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load lesson"))?
        .ok_or_else(|| ApiError::not_found("Lesson not found"))
}

pub(super) async fn load_content(
    state: &AppState,
    lesson: &Lesson,
    content_id: &str,
) -> Result<Content, ApiError> {
    repositories::contents::find_in_lesson(state.db(), &lesson.id, content_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load content"))?
        .ok_or_else(|| ApiError::not_found("Content not found"))
}

pub(super) fn url_ttl(state: &AppState) -> Duration {
    Duration::from_secs(state.settings().content().presigned_url_expire_minutes * 60)
}

pub(super) fn view_context<'a>(state: &'a AppState, viewer_id: &'a str) -> ViewContext<'a> {
    ViewContext { viewer_id: Some(viewer_id), storage: state.storage(), url_ttl: url_ttl(state) }
}

/// Builds course responses with creator names and presigned logos; ratings are
/// attached only when asked for.
pub(crate) async fn course_responses(
    state: &AppState,
    courses: Vec<Course>,
    with_ratings: bool,
) -> Result<Vec<CourseResponse>, ApiError> {
    let creator_ids: Vec<String> =
        courses.iter().map(|course| course.creator_id.clone()).collect();
    let names = repositories::courses::creator_names(state.db(), &creator_ids)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load course creators"))?;

    let mut responses = Vec::with_capacity(courses.len());
    for course in courses {
        let creator = names.get(&course.creator_id).cloned().unwrap_or_default();
        let logo_url = match (state.storage(), course.logo.as_deref()) {
            (Some(storage), Some(logo)) => match storage.presign_get(logo, url_ttl(state)).await {
                Ok(url) => Some(url),
                Err(err) => {
                    tracing::warn!(error = %err, course_id = %course.id, "Failed to presign logo");
                    None
                }
            },
            _ => None,
        };

        let mut response = CourseResponse::from_db(course, creator);
        response.logo_url = logo_url;

        if with_ratings {
            response.average_rating = repositories::ratings::average(state.db(), &response.id)
                .await
                .map_err(|e| ApiError::internal(e, "Failed to load course rating"))?;
            response.ratings = repositories::ratings::list_by_course(state.db(), &response.id)
                .await
                .map_err(|e| ApiError::internal(e, "Failed to load course ratings"))?
                .into_iter()
                .map(RatingResponse::from_row)
                .collect();
        }

        responses.push(response);
    }

    Ok(responses)
}
