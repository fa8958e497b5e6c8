//! Lesson contents: a positional wrapper row pointing at exactly one concrete
//! item through `(kind, target_id)`.
//!
//! Every operation dispatches over [`ContentKind`] with an exhaustive match, so
//! adding a kind fails to compile until storage, loading, rendering and
//! deletion all handle it.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;
use validator::Validate;

use crate::core::metrics;
use crate::core::time::{format_primitive, primitive_now_utc};
use crate::db::models::{
    AnswerItem, Content, FileItem, QuestionItem, TaskItem, TaskReview, TaskSubmission, TextItem,
    VideoItem,
};
use crate::db::types::{ContentKind, UnknownContentKind};
use crate::repositories;
use crate::services::errors::{field_errors, DomainError, FieldError};
use crate::services::ordering::{assign_order, OrderScope};
use crate::services::storage::StorageService;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub(crate) struct TextPayload {
    #[serde(default)]
    #[validate(length(min = 1, max = 255, message = "title must be 1-255 characters"))]
    pub(crate) title: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "content must not be empty"))]
    pub(crate) content: String,
}

/// Payload for both file and image items; `file` is an opaque storage key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub(crate) struct FilePayload {
    #[serde(default)]
    #[validate(length(min = 1, max = 255, message = "title must be 1-255 characters"))]
    pub(crate) title: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "file must not be empty"))]
    pub(crate) file: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub(crate) struct VideoPayload {
    #[serde(default)]
    #[validate(length(min = 1, max = 255, message = "title must be 1-255 characters"))]
    pub(crate) title: String,
    #[serde(default)]
    #[validate(url(message = "url must be a valid URL"))]
    pub(crate) url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub(crate) struct AnswerDraft {
    #[serde(default)]
    #[validate(length(min = 1, message = "text must not be empty"))]
    pub(crate) text: String,
    #[serde(default)]
    pub(crate) is_true: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub(crate) struct QuestionPayload {
    #[serde(default)]
    #[validate(length(min = 1, max = 255, message = "title must be 1-255 characters"))]
    pub(crate) title: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "text must not be empty"))]
    pub(crate) text: String,
    #[serde(default)]
    #[validate(nested)]
    pub(crate) answers: Vec<AnswerDraft>,
}

/// Standalone answer attached to a question that already sits in the same lesson.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub(crate) struct AnswerPayload {
    #[serde(default)]
    #[validate(length(min = 1, message = "question_id must not be empty"))]
    pub(crate) question_id: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "text must not be empty"))]
    pub(crate) text: String,
    #[serde(default)]
    pub(crate) is_true: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub(crate) struct TaskPayload {
    #[serde(default)]
    #[validate(length(min = 1, max = 255, message = "title must be 1-255 characters"))]
    pub(crate) title: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "description must not be empty"))]
    pub(crate) description: String,
}

/// Validated authoring input, one variant per kind.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum ContentPayload {
    Text(TextPayload),
    File(FilePayload),
    Image(FilePayload),
    Video(VideoPayload),
    Question(QuestionPayload),
    Answer(AnswerPayload),
    Task(TaskPayload),
}

impl ContentPayload {
    pub(crate) fn kind(&self) -> ContentKind {
        match self {
            Self::Text(_) => ContentKind::Text,
            Self::File(_) => ContentKind::File,
            Self::Image(_) => ContentKind::Image,
            Self::Video(_) => ContentKind::Video,
            Self::Question(_) => ContentKind::Question,
            Self::Answer(_) => ContentKind::Answer,
            Self::Task(_) => ContentKind::Task,
        }
    }

    fn validate(&self) -> Result<(), DomainError> {
        let result = match self {
            Self::Text(payload) => payload.validate(),
            Self::File(payload) | Self::Image(payload) => payload.validate(),
            Self::Video(payload) => payload.validate(),
            Self::Question(payload) => payload.validate(),
            Self::Answer(payload) => payload.validate(),
            Self::Task(payload) => payload.validate(),
        };
        result.map_err(|errors| DomainError::Validation(field_errors(&errors, "payload")))
    }
}

/// Checks the tag against the closed kind set, then decodes and validates the payload.
pub(crate) fn parse_payload(tag: &str, payload: Value) -> Result<ContentPayload, DomainError> {
    let kind: ContentKind =
        tag.parse().map_err(|UnknownContentKind(tag)| DomainError::UnknownContentType(tag))?;

    let parsed = match kind {
        ContentKind::Text => ContentPayload::Text(decode(payload)?),
        ContentKind::File => ContentPayload::File(decode(payload)?),
        ContentKind::Image => ContentPayload::Image(decode(payload)?),
        ContentKind::Video => ContentPayload::Video(decode(payload)?),
        ContentKind::Question => ContentPayload::Question(decode(payload)?),
        ContentKind::Answer => ContentPayload::Answer(decode(payload)?),
        ContentKind::Task => ContentPayload::Task(decode(payload)?),
    };

    parsed.validate()?;
    Ok(parsed)
}

/// Absent string fields decode as empty and are caught by validation, so the
/// only decode failures left are shape and type mismatches.
fn decode<T: for<'de> Deserialize<'de>>(payload: Value) -> Result<T, DomainError> {
    serde_path_to_error::deserialize(payload).map_err(|error| {
        let path = error.path().to_string();
        let field = if path == "." { "payload".to_string() } else { format!("payload.{path}") };
        DomainError::Validation(vec![FieldError::new(field, error.inner().to_string())])
    })
}

/// Concrete item loaded for a content row.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum ContentItem {
    Text(TextItem),
    File(FileItem),
    Image(FileItem),
    Video(VideoItem),
    Question { question: QuestionItem, answers: Vec<AnswerItem> },
    Answer(AnswerItem),
    Task(TaskItem),
}

impl ContentItem {
    pub(crate) fn kind(&self) -> ContentKind {
        match self {
            Self::Text(_) => ContentKind::Text,
            Self::File(_) => ContentKind::File,
            Self::Image(_) => ContentKind::Image,
            Self::Video(_) => ContentKind::Video,
            Self::Question { .. } => ContentKind::Question,
            Self::Answer(_) => ContentKind::Answer,
            Self::Task(_) => ContentKind::Task,
        }
    }

    pub(crate) fn id(&self) -> &str {
        match self {
            Self::Text(item) => &item.id,
            Self::File(item) | Self::Image(item) => &item.id,
            Self::Video(item) => &item.id,
            Self::Question { question, .. } => &question.id,
            Self::Answer(item) => &item.id,
            Self::Task(item) => &item.id,
        }
    }

    pub(crate) fn title(&self) -> &str {
        match self {
            Self::Text(item) => &item.title,
            Self::File(item) | Self::Image(item) => &item.title,
            Self::Video(item) => &item.title,
            Self::Question { question, .. } => &question.title,
            Self::Answer(item) => &item.text,
            Self::Task(item) => &item.title,
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) struct ResolvedContent {
    pub(crate) content: Content,
    pub(crate) item: ContentItem,
}

/// Creates the concrete item and its wrapper inside the caller's transaction.
pub(crate) async fn create_content_in(
    conn: &mut PgConnection,
    lesson_id: &str,
    payload: &ContentPayload,
) -> Result<ResolvedContent, DomainError> {
    let order_index = assign_order(&mut *conn, OrderScope::Lesson(lesson_id)).await?;
    let item = store_item(&mut *conn, lesson_id, payload).await?;

    let content = repositories::contents::create(
        &mut *conn,
        repositories::contents::CreateContent {
            id: &Uuid::new_v4().to_string(),
            lesson_id,
            kind: item.kind(),
            target_id: item.id(),
            order_index,
            created_at: primitive_now_utc(),
        },
    )
    .await?;

    metrics::record_content_created(content.kind);
    tracing::info!(
        content_id = %content.id,
        lesson_id,
        kind = %content.kind,
        order = content.order_index,
        "Content created"
    );

    Ok(ResolvedContent { content, item })
}

/// Parses `(tag, payload)` and creates the content in its own transaction.
pub(crate) async fn create_content(
    pool: &PgPool,
    lesson_id: &str,
    tag: &str,
    payload: Value,
) -> Result<ResolvedContent, DomainError> {
    let payload = parse_payload(tag, payload)?;

    let mut tx = pool.begin().await?;
    let created = create_content_in(&mut *tx, lesson_id, &payload).await?;
    tx.commit().await?;

    Ok(created)
}

async fn store_item(
    conn: &mut PgConnection,
    lesson_id: &str,
    payload: &ContentPayload,
) -> Result<ContentItem, DomainError> {
    let id = Uuid::new_v4().to_string();

    let item = match payload {
        ContentPayload::Text(payload) => ContentItem::Text(
            repositories::items::insert_text(&mut *conn, &id, &payload.title, &payload.content)
                .await?,
        ),
        ContentPayload::File(payload) => ContentItem::File(
            repositories::items::insert_file(
                &mut *conn,
                ContentKind::File,
                &id,
                &payload.title,
                &payload.file,
            )
            .await?,
        ),
        ContentPayload::Image(payload) => ContentItem::Image(
            repositories::items::insert_file(
                &mut *conn,
                ContentKind::Image,
                &id,
                &payload.title,
                &payload.file,
            )
            .await?,
        ),
        ContentPayload::Video(payload) => ContentItem::Video(
            repositories::items::insert_video(&mut *conn, &id, &payload.title, &payload.url)
                .await?,
        ),
        ContentPayload::Question(payload) => {
            let question =
                repositories::items::insert_question(&mut *conn, &id, &payload.title, &payload.text)
                    .await?;
            let mut answers = Vec::with_capacity(payload.answers.len());
            for draft in &payload.answers {
                answers.push(
                    repositories::items::insert_answer(
                        &mut *conn,
                        &Uuid::new_v4().to_string(),
                        &question.id,
                        &draft.text,
                        draft.is_true,
                    )
                    .await?,
                );
            }
            ContentItem::Question { question, answers }
        }
        ContentPayload::Answer(payload) => {
            let placed =
                repositories::contents::question_in_lesson(&mut *conn, lesson_id, &payload.question_id)
                    .await?;
            if !placed {
                return Err(DomainError::field(
                    "payload.question_id",
                    "question is not part of this lesson",
                ));
            }
            ContentItem::Answer(
                repositories::items::insert_answer(
                    &mut *conn,
                    &id,
                    &payload.question_id,
                    &payload.text,
                    payload.is_true,
                )
                .await?,
            )
        }
        ContentPayload::Task(payload) => ContentItem::Task(
            repositories::items::insert_task(&mut *conn, &id, &payload.title, &payload.description)
                .await?,
        ),
    };

    Ok(item)
}

/// Loads the concrete item a content row points at.
pub(crate) async fn resolve(pool: &PgPool, content: &Content) -> Result<ContentItem, DomainError> {
    let target = content.target_id.as_str();

    let item = match content.kind {
        ContentKind::Text => repositories::items::find_text(pool, target).await?.map(ContentItem::Text),
        ContentKind::File => repositories::items::find_file(pool, ContentKind::File, target)
            .await?
            .map(ContentItem::File),
        ContentKind::Image => repositories::items::find_file(pool, ContentKind::Image, target)
            .await?
            .map(ContentItem::Image),
        ContentKind::Video => {
            repositories::items::find_video(pool, target).await?.map(ContentItem::Video)
        }
        ContentKind::Question => match repositories::items::find_question(pool, target).await? {
            Some(question) => {
                let answers = repositories::items::list_answers(pool, &question.id).await?;
                Some(ContentItem::Question { question, answers })
            }
            None => None,
        },
        ContentKind::Answer => {
            repositories::items::find_answer(pool, target).await?.map(ContentItem::Answer)
        }
        ContentKind::Task => repositories::items::find_task(pool, target).await?.map(ContentItem::Task),
    };

    item.ok_or_else(|| {
        tracing::error!(
            content_id = %content.id,
            kind = %content.kind,
            target_id = %content.target_id,
            "Content points at a missing item"
        );
        DomainError::DanglingReference {
            content_id: content.id.clone(),
            kind: content.kind,
            target_id: content.target_id.clone(),
        }
    })
}

/// Who is looking and how blob references are turned into links.
#[derive(Clone, Copy)]
pub(crate) struct ViewContext<'a> {
    pub(crate) viewer_id: Option<&'a str>,
    pub(crate) storage: Option<&'a StorageService>,
    pub(crate) url_ttl: Duration,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub(crate) struct FileView {
    pub(crate) title: String,
    pub(crate) file: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub(crate) struct AnswerView {
    pub(crate) id: String,
    pub(crate) text: String,
    pub(crate) is_true: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub(crate) struct QuestionView {
    pub(crate) id: String,
    pub(crate) title: String,
    pub(crate) text: String,
    pub(crate) answers: Vec<AnswerView>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub(crate) struct SubmissionView {
    pub(crate) id: String,
    pub(crate) task_id: String,
    pub(crate) student_id: String,
    pub(crate) file: String,
    pub(crate) submitted_at: String,
}

impl From<TaskSubmission> for SubmissionView {
    fn from(submission: TaskSubmission) -> Self {
        Self {
            id: submission.id,
            task_id: submission.task_id,
            student_id: submission.student_id,
            file: submission.file,
            submitted_at: format_primitive(submission.submitted_at),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub(crate) struct ReviewView {
    pub(crate) is_correct: bool,
    pub(crate) comment: String,
    pub(crate) created_at: String,
}

impl From<TaskReview> for ReviewView {
    fn from(review: TaskReview) -> Self {
        Self {
            is_correct: review.is_correct,
            comment: review.comment,
            created_at: format_primitive(review.created_at),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub(crate) struct TaskView {
    pub(crate) title: String,
    pub(crate) description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) submission: Option<SubmissionView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) review: Option<ReviewView>,
}

/// Kind-specific output shape of a content item.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub(crate) enum ItemView {
    Text(TextPayload),
    File(FileView),
    Video(VideoPayload),
    Question(QuestionView),
    Answer(AnswerPayload),
    Task(TaskView),
}

/// Renders a resolved item. Tasks additionally carry the viewer's latest
/// submission and its review.
pub(crate) async fn serialize(
    pool: &PgPool,
    item: ContentItem,
    ctx: ViewContext<'_>,
) -> Result<ItemView, DomainError> {
    let view = match item {
        ContentItem::Text(item) => {
            ItemView::Text(TextPayload { title: item.title, content: item.content })
        }
        ContentItem::File(item) | ContentItem::Image(item) => {
            let url = presign(ctx, &item.file).await;
            ItemView::File(FileView { title: item.title, file: item.file, url })
        }
        ContentItem::Video(item) => {
            ItemView::Video(VideoPayload { title: item.title, url: item.url })
        }
        ContentItem::Question { question, answers } => ItemView::Question(QuestionView {
            id: question.id,
            title: question.title,
            text: question.text,
            answers: answers
                .into_iter()
                .map(|answer| AnswerView { id: answer.id, text: answer.text, is_true: answer.is_true })
                .collect(),
        }),
        ContentItem::Answer(item) => ItemView::Answer(AnswerPayload {
            question_id: item.question_id,
            text: item.text,
            is_true: item.is_true,
        }),
        ContentItem::Task(item) => {
            let (submission, review) = match ctx.viewer_id {
                Some(viewer_id) => task_progress(pool, &item.id, viewer_id).await?,
                None => (None, None),
            };
            ItemView::Task(TaskView {
                title: item.title,
                description: item.description,
                submission: submission.map(SubmissionView::from),
                review: review.map(ReviewView::from),
            })
        }
    };

    Ok(view)
}

async fn task_progress(
    pool: &PgPool,
    task_id: &str,
    student_id: &str,
) -> Result<(Option<TaskSubmission>, Option<TaskReview>), DomainError> {
    let Some(submission) =
        repositories::task_submissions::find_for_student(pool, task_id, student_id).await?
    else {
        return Ok((None, None));
    };

    let review = repositories::task_submissions::find_review(pool, &submission.id).await?;
    Ok((Some(submission), review))
}

async fn presign(ctx: ViewContext<'_>, key: &str) -> Option<String> {
    let storage = ctx.storage?;
    match storage.presign_get(key, ctx.url_ttl).await {
        Ok(url) => Some(url),
        Err(err) => {
            tracing::warn!(error = %err, key, "Failed to presign file reference");
            None
        }
    }
}

/// Resolves and renders in one step.
pub(crate) async fn present(
    pool: &PgPool,
    content: &Content,
    ctx: ViewContext<'_>,
) -> Result<ItemView, DomainError> {
    let item = resolve(pool, content).await?;
    serialize(pool, item, ctx).await
}

/// Removes the concrete item and its wrapper in one transaction.
///
/// Deleting a question also drops answer contents that point at its answers.
pub(crate) async fn delete_content(pool: &PgPool, content_id: &str) -> Result<Content, DomainError> {
    let mut tx = pool.begin().await?;

    let Some(content) = repositories::contents::lock_by_id(&mut *tx, content_id).await? else {
        return Err(DomainError::NotFound("content"));
    };

    if content.kind == ContentKind::Question {
        repositories::contents::delete_answer_wrappers(&mut *tx, &content.target_id).await?;
    }

    let item_existed =
        repositories::items::delete(&mut *tx, content.kind, &content.target_id).await?;
    if !item_existed {
        tracing::warn!(
            content_id = %content.id,
            kind = %content.kind,
            target_id = %content.target_id,
            "Deleting content whose item was already gone"
        );
    }

    repositories::contents::delete(&mut *tx, &content.id).await?;
    tx.commit().await?;

    metrics::record_content_deleted(content.kind);
    tracing::info!(content_id = %content.id, kind = %content.kind, "Content deleted");

    Ok(content)
}
