use std::collections::HashMap;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use super::helpers::{load_lesson, load_module, view_context};
use crate::api::errors::ApiError;
use crate::api::guards::{load_course, require_author, require_reader, CurrentUser};
use crate::api::validation::validate_body;
use crate::core::state::AppState;
use crate::repositories;
use crate::schemas::content::ContentResponse;
use crate::schemas::lesson::{
    ContentSummary, LessonCreate, LessonCreatedResponse, LessonResponse, ModuleCreate,
    ModuleResponse,
};
use crate::services::{authoring, content_registry};

pub(super) async fn list_modules(
    Path(slug): Path<String>,
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<ModuleResponse>>, ApiError> {
    let course = load_course(&state, &slug).await?;
    require_reader(&state, &user, &course).await?;

    let modules = repositories::modules::list_by_course(state.db(), &course.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list modules"))?;

    Ok(Json(modules.into_iter().map(ModuleResponse::from).collect()))
}

pub(super) async fn create_module(
    Path(slug): Path<String>,
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Json(payload): Json<ModuleCreate>,
) -> Result<(StatusCode, Json<ModuleResponse>), ApiError> {
    validate_body(&payload)?;
    let course = load_course(&state, &slug).await?;
    require_author(&user, &course)?;

    let module = authoring::create_module(state.db(), &course.id, payload.title.trim()).await?;
    Ok((StatusCode::CREATED, Json(ModuleResponse::from(module))))
}

pub(super) async fn delete_module(
    Path((slug, module_id)): Path<(String, String)>,
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
) -> Result<StatusCode, ApiError> {
    let course = load_course(&state, &slug).await?;
    require_author(&user, &course)?;
    let module = load_module(&state, &course, &module_id).await?;

    authoring::delete_module(state.db(), &module.id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub(super) async fn list_lessons(
    Path((slug, module_id)): Path<(String, String)>,
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<LessonResponse>>, ApiError> {
    let course = load_course(&state, &slug).await?;
    require_reader(&state, &user, &course).await?;
    let module = load_module(&state, &course, &module_id).await?;

    let lessons = repositories::lessons::list_by_module(state.db(), &module.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list lessons"))?;
    let summaries = repositories::contents::list_summaries_by_module(state.db(), &module.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list lesson contents"))?;

    let mut by_lesson: HashMap<String, Vec<ContentSummary>> = HashMap::new();
    for row in summaries {
        by_lesson.entry(row.lesson_id.clone()).or_default().push(ContentSummary::from(row));
    }

    let response = lessons
        .into_iter()
        .map(|lesson| {
            let contents = by_lesson.remove(&lesson.id).unwrap_or_default();
            LessonResponse::from_db(lesson, contents)
        })
        .collect();

    Ok(Json(response))
}

pub(super) async fn create_lesson(
    Path((slug, module_id)): Path<(String, String)>,
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Json(payload): Json<LessonCreate>,
) -> Result<(StatusCode, Json<LessonCreatedResponse>), ApiError> {
    validate_body(&payload)?;
    let course = load_course(&state, &slug).await?;
    require_author(&user, &course)?;
    let module = load_module(&state, &course, &module_id).await?;

    let inline = authoring::parse_inline_contents(
        payload.contents.into_iter().map(|entry| (entry.kind, entry.payload)).collect(),
    )?;
    let (lesson, created) =
        authoring::create_lesson(state.db(), &module.id, payload.title.trim(), &inline).await?;

    let ctx = view_context(&state, &user.id);
    let mut contents = Vec::with_capacity(created.len());
    for resolved in created {
        let view = content_registry::serialize(state.db(), resolved.item, ctx).await?;
        contents.push(ContentResponse::from_db(resolved.content, view));
    }

    Ok((
        StatusCode::CREATED,
        Json(LessonCreatedResponse {
            id: lesson.id,
            title: lesson.title,
            order: lesson.order_index,
            contents,
        }),
    ))
}

pub(super) async fn delete_lesson(
    Path((slug, module_id, lesson_id)): Path<(String, String, String)>,
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
) -> Result<StatusCode, ApiError> {
    let course = load_course(&state, &slug).await?;
    require_author(&user, &course)?;
    let module = load_module(&state, &course, &module_id).await?;
    let lesson = load_lesson(&state, &module, &lesson_id).await?;

    authoring::delete_lesson(state.db(), &lesson.id).await?;
    Ok(StatusCode::NO_CONTENT)
}
