use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use super::helpers::{load_content, load_lesson, load_module, url_ttl, view_context};
use crate::api::errors::ApiError;
use crate::api::guards::{load_course, require_author, require_reader, CurrentUser};
use crate::api::validation::{validate_body, validate_submission_upload};
use crate::core::metrics;
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::db::models::{Content, Lesson, User};
use crate::db::types::ContentKind;
use crate::repositories;
use crate::schemas::content::{
    AnswerResult, AnswerSubmit, CommentCreate, CommentResponse, ContentCreate, ContentResponse,
};
use crate::schemas::submission::SubmissionResponse;
use crate::services::content_registry::{self, ContentItem};
use crate::services::errors::DomainError;
use crate::services::grading;
use crate::services::submissions::{self, SubmissionUpload};

type LessonPath = (String, String, String);
type ContentPath = (String, String, String, String);

/// Resolves the lesson addressed by the path and checks read or author access.
async fn lesson_scope(
    state: &AppState,
    user: &User,
    (slug, module_id, lesson_id): LessonPath,
    authoring: bool,
) -> Result<Lesson, ApiError> {
    let course = load_course(state, &slug).await?;
    if authoring {
        require_author(user, &course)?;
    } else {
        require_reader(state, user, &course).await?;
    }
    let module = load_module(state, &course, &module_id).await?;
    load_lesson(state, &module, &lesson_id).await
}

async fn content_scope(
    state: &AppState,
    user: &User,
    (slug, module_id, lesson_id, content_id): ContentPath,
    authoring: bool,
) -> Result<Content, ApiError> {
    let lesson = lesson_scope(state, user, (slug, module_id, lesson_id), authoring).await?;
    load_content(state, &lesson, &content_id).await
}

pub(super) async fn list_contents(
    Path(path): Path<LessonPath>,
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<ContentResponse>>, ApiError> {
    let lesson = lesson_scope(&state, &user, path, false).await?;

    let contents = repositories::contents::list_by_lesson(state.db(), &lesson.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list contents"))?;

    let ctx = view_context(&state, &user.id);
    let mut response = Vec::with_capacity(contents.len());
    for content in contents {
        let view = content_registry::present(state.db(), &content, ctx).await?;
        response.push(ContentResponse::from_db(content, view));
    }

    Ok(Json(response))
}

pub(super) async fn create_content(
    Path(path): Path<LessonPath>,
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Json(payload): Json<ContentCreate>,
) -> Result<(StatusCode, Json<ContentResponse>), ApiError> {
    let lesson = lesson_scope(&state, &user, path, true).await?;

    let created =
        content_registry::create_content(state.db(), &lesson.id, &payload.kind, payload.payload)
            .await?;
    let view =
        content_registry::serialize(state.db(), created.item, view_context(&state, &user.id))
            .await?;

    Ok((StatusCode::CREATED, Json(ContentResponse::from_db(created.content, view))))
}

pub(super) async fn get_content(
    Path(path): Path<ContentPath>,
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<ContentResponse>, ApiError> {
    let content = content_scope(&state, &user, path, false).await?;

    let view =
        content_registry::present(state.db(), &content, view_context(&state, &user.id)).await?;
    let comments = load_comments(&state, &content.id).await?;

    Ok(Json(ContentResponse::from_db(content, view).with_comments(comments)))
}

pub(super) async fn delete_content(
    Path(path): Path<ContentPath>,
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
) -> Result<StatusCode, ApiError> {
    let content = content_scope(&state, &user, path, true).await?;

    content_registry::delete_content(state.db(), &content.id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub(super) async fn answer_question(
    Path(path): Path<ContentPath>,
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Json(payload): Json<AnswerSubmit>,
) -> Result<Json<AnswerResult>, ApiError> {
    validate_body(&payload)?;
    let content = content_scope(&state, &user, path, false).await?;
    if content.kind != ContentKind::Question {
        return Err(DomainError::NotAnswerable(content.kind).into());
    }

    let ContentItem::Question { answers, .. } =
        content_registry::resolve(state.db(), &content).await?
    else {
        return Err(DomainError::NotAnswerable(content.kind).into());
    };

    let verdict = grading::grade_answer(&payload.answer, &answers);
    metrics::record_answer_graded(verdict.is_correct());
    tracing::info!(
        content_id = %content.id,
        user_id = %user.id,
        correct = verdict.is_correct(),
        "Question answered"
    );

    Ok(Json(AnswerResult::from(verdict)))
}

pub(super) async fn submit_task(
    Path(path): Path<ContentPath>,
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<SubmissionResponse>), ApiError> {
    let content = content_scope(&state, &user, path, false).await?;
    if content.kind != ContentKind::Task {
        return Err(DomainError::NotAnswerable(content.kind).into());
    }

    let storage = state.storage().ok_or_else(|| {
        ApiError::ServiceUnavailable("File storage is not configured".to_string())
    })?;

    let max_bytes = state.settings().storage().max_upload_bytes();
    let mut upload: Option<SubmissionUpload> = None;

    while let Some(mut field) = multipart
        .next_field()
        .await
        .map_err(|_| ApiError::BadRequest("Invalid multipart data".to_string()))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let filename = field.file_name().map(|s| s.to_string()).unwrap_or_default();
        let content_type = field
            .content_type()
            .map(|s| s.to_string())
            .unwrap_or_else(|| "application/octet-stream".to_string());

        let mut bytes = Vec::new();
        while let Some(chunk) = field
            .chunk()
            .await
            .map_err(|_| ApiError::BadRequest("Failed to read file".to_string()))?
        {
            if bytes.len() + chunk.len() > max_bytes {
                return Err(ApiError::field("file", "File is too large"));
            }
            bytes.extend_from_slice(&chunk);
        }

        upload = Some(SubmissionUpload { filename, content_type, bytes });
    }

    let upload = upload.ok_or_else(|| ApiError::field("file", "File is required"))?;
    validate_submission_upload(
        &upload.filename,
        upload.bytes.len(),
        &state.settings().storage().allowed_submission_extensions,
        max_bytes,
    )?;

    let submission =
        submissions::submit_task(state.db(), storage, &content.target_id, &user.id, upload)
            .await?;

    let mut response = SubmissionResponse::from_db(submission);
    match storage.presign_get(&response.file, url_ttl(&state)).await {
        Ok(url) => response.file_url = Some(url),
        Err(err) => tracing::warn!(error = %err, "Failed to presign submission file"),
    }

    Ok((StatusCode::CREATED, Json(response)))
}

pub(super) async fn list_comments(
    Path(path): Path<ContentPath>,
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<CommentResponse>>, ApiError> {
    let content = content_scope(&state, &user, path, false).await?;
    Ok(Json(load_comments(&state, &content.id).await?))
}

pub(super) async fn create_comment(
    Path(path): Path<ContentPath>,
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Json(payload): Json<CommentCreate>,
) -> Result<(StatusCode, Json<CommentResponse>), ApiError> {
    validate_body(&payload)?;
    let content = content_scope(&state, &user, path, false).await?;

    let comment = repositories::comments::create(
        state.db(),
        &Uuid::new_v4().to_string(),
        &content.id,
        &user.id,
        payload.text.trim(),
        primitive_now_utc(),
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to create comment"))?;

    Ok((StatusCode::CREATED, Json(CommentResponse::from(comment))))
}

async fn load_comments(state: &AppState, content_id: &str) -> Result<Vec<CommentResponse>, ApiError> {
    let comments = repositories::comments::list_by_content(state.db(), content_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load comments"))?;
    Ok(comments.into_iter().map(CommentResponse::from).collect())
}
