use serde::{Deserialize, Serialize};
use serde_json::Value;
use validator::Validate;

use crate::core::time::format_primitive;
use crate::db::models::{display_name, Content};
use crate::db::types::ContentKind;
use crate::repositories::comments::CommentWithAuthor;
use crate::services::content_registry::ItemView;
use crate::services::grading::Verdict;

#[derive(Debug, Deserialize)]
pub(crate) struct ContentCreate {
    #[serde(alias = "content_type")]
    pub(crate) kind: String,
    #[serde(default)]
    pub(crate) payload: Value,
}

#[derive(Debug, Serialize)]
pub(crate) struct ContentResponse {
    pub(crate) id: String,
    pub(crate) lesson_id: String,
    pub(crate) kind: ContentKind,
    pub(crate) order: i32,
    pub(crate) item: ItemView,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) comments: Option<Vec<CommentResponse>>,
}

impl ContentResponse {
    pub(crate) fn from_db(content: Content, item: ItemView) -> Self {
        Self {
            id: content.id,
            lesson_id: content.lesson_id,
            kind: content.kind,
            order: content.order_index,
            item,
            comments: None,
        }
    }

    pub(crate) fn with_comments(mut self, comments: Vec<CommentResponse>) -> Self {
        self.comments = Some(comments);
        self
    }
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct AnswerSubmit {
    #[validate(length(min = 1, message = "answer must not be empty"))]
    pub(crate) answer: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct AnswerResult {
    pub(crate) verdict: Verdict,
    pub(crate) message: &'static str,
}

impl From<Verdict> for AnswerResult {
    fn from(verdict: Verdict) -> Self {
        Self { verdict, message: verdict.message() }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct CommentCreate {
    #[validate(length(min = 1, max = 5000, message = "text must be 1-5000 characters"))]
    pub(crate) text: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct CommentResponse {
    pub(crate) id: String,
    pub(crate) author_id: String,
    pub(crate) author: String,
    pub(crate) text: String,
    pub(crate) created_at: String,
}

impl From<CommentWithAuthor> for CommentResponse {
    fn from(row: CommentWithAuthor) -> Self {
        Self {
            author: display_name(&row.username, &row.first_name, &row.last_name),
            id: row.id,
            author_id: row.author_id,
            text: row.text,
            created_at: format_primitive(row.created_at),
        }
    }
}
