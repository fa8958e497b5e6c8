use serde::{Deserialize, Serialize};
use serde_json::Value;
use validator::Validate;

use crate::db::models::{Lesson, Module};
use crate::db::types::ContentKind;
use crate::repositories::contents::ContentSummaryRow;
use crate::schemas::content::ContentResponse;

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct ModuleCreate {
    #[validate(length(min = 1, max = 255, message = "title must be 1-255 characters"))]
    pub(crate) title: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct ModuleResponse {
    pub(crate) id: String,
    pub(crate) title: String,
    pub(crate) order: i32,
}

impl From<Module> for ModuleResponse {
    fn from(module: Module) -> Self {
        Self { id: module.id, title: module.title, order: module.order_index }
    }
}

/// Content created together with its lesson. The tag is checked when the
/// payload is parsed, so unknown tags still reach the registry.
#[derive(Debug, Deserialize)]
pub(crate) struct InlineContent {
    #[serde(alias = "content_type")]
    pub(crate) kind: String,
    #[serde(default)]
    pub(crate) payload: Value,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct LessonCreate {
    #[validate(length(min = 1, max = 255, message = "title must be 1-255 characters"))]
    pub(crate) title: String,
    #[serde(default)]
    pub(crate) contents: Vec<InlineContent>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub(crate) struct ContentSummary {
    pub(crate) id: String,
    pub(crate) kind: ContentKind,
    pub(crate) order: i32,
    pub(crate) title: Option<String>,
}

impl From<ContentSummaryRow> for ContentSummary {
    fn from(row: ContentSummaryRow) -> Self {
        Self { id: row.id, kind: row.kind, order: row.order_index, title: row.title }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct LessonResponse {
    pub(crate) id: String,
    pub(crate) title: String,
    pub(crate) order: i32,
    pub(crate) contents: Vec<ContentSummary>,
}

impl LessonResponse {
    pub(crate) fn from_db(lesson: Lesson, contents: Vec<ContentSummary>) -> Self {
        Self { id: lesson.id, title: lesson.title, order: lesson.order_index, contents }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct LessonCreatedResponse {
    pub(crate) id: String,
    pub(crate) title: String,
    pub(crate) order: i32,
    pub(crate) contents: Vec<ContentResponse>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn inline_content_accepts_legacy_tag_name() {
        let lesson: LessonCreate = serde_json::from_value(json!({
            "title": "Warmup",
            "contents": [
                {"content_type": "text", "payload": {"title": "Intro", "content": "Hello"}},
                {"kind": "video", "payload": {"title": "Demo", "url": "https://v.example/1"}}
            ]
        }))
        .unwrap();

        let kinds: Vec<_> = lesson.contents.iter().map(|entry| entry.kind.as_str()).collect();
        assert_eq!(kinds, ["text", "video"]);
    }

    #[test]
    fn lesson_without_contents_is_valid() {
        let lesson: LessonCreate = serde_json::from_value(json!({"title": "Warmup"})).unwrap();
        assert!(lesson.contents.is_empty());
        assert!(lesson.validate().is_ok());
    }
}
