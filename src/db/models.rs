use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::PrimitiveDateTime;

use crate::db::types::ContentKind;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct User {
    pub(crate) id: String,
    pub(crate) username: String,
    pub(crate) email: String,
    pub(crate) hashed_password: String,
    pub(crate) first_name: String,
    pub(crate) last_name: String,
    pub(crate) avatar: Option<String>,
    pub(crate) is_moderator: bool,
    pub(crate) is_active: bool,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}

impl User {
    /// Full name when both parts are filled in, username otherwise.
    pub(crate) fn display_name(&self) -> String {
        display_name(&self.username, &self.first_name, &self.last_name)
    }
}

pub(crate) fn display_name(username: &str, first_name: &str, last_name: &str) -> String {
    if !first_name.is_empty() && !last_name.is_empty() {
        format!("{first_name} {last_name}")
    } else {
        username.to_string()
    }
}

#[derive(Debug, Clone, FromRow)]
pub(crate) struct PasswordResetRequest {
    pub(crate) id: String,
    pub(crate) email: String,
    pub(crate) reset_code: String,
    pub(crate) created_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct Course {
    pub(crate) id: String,
    pub(crate) creator_id: String,
    pub(crate) title: String,
    pub(crate) slug: String,
    pub(crate) description: String,
    pub(crate) target_description: String,
    pub(crate) price: Decimal,
    pub(crate) logo: Option<String>,
    pub(crate) approval: bool,
    pub(crate) created_at: PrimitiveDateTime,
}

impl Course {
    pub(crate) fn is_free(&self) -> bool {
        self.price.is_zero()
    }
}

#[derive(Debug, Clone, FromRow)]
pub(crate) struct CourseRating {
    pub(crate) id: String,
    pub(crate) course_id: String,
    pub(crate) user_id: String,
    pub(crate) rating: i32,
    pub(crate) review: String,
    pub(crate) created_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, FromRow)]
pub(crate) struct Module {
    pub(crate) id: String,
    pub(crate) course_id: String,
    pub(crate) title: String,
    pub(crate) order_index: i32,
    pub(crate) created_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, FromRow)]
pub(crate) struct Lesson {
    pub(crate) id: String,
    pub(crate) module_id: String,
    pub(crate) title: String,
    pub(crate) order_index: i32,
    pub(crate) created_at: PrimitiveDateTime,
}

/// Positional wrapper pointing at one concrete item by `(kind, target_id)`.
#[derive(Debug, Clone, FromRow)]
pub(crate) struct Content {
    pub(crate) id: String,
    pub(crate) lesson_id: String,
    pub(crate) kind: ContentKind,
    pub(crate) target_id: String,
    pub(crate) order_index: i32,
    pub(crate) created_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, PartialEq, FromRow)]
pub(crate) struct TextItem {
    pub(crate) id: String,
    pub(crate) title: String,
    pub(crate) content: String,
}

/// Shared row shape of `content_files` and `content_images`.
#[derive(Debug, Clone, PartialEq, FromRow)]
pub(crate) struct FileItem {
    pub(crate) id: String,
    pub(crate) title: String,
    pub(crate) file: String,
}

#[derive(Debug, Clone, PartialEq, FromRow)]
pub(crate) struct VideoItem {
    pub(crate) id: String,
    pub(crate) title: String,
    pub(crate) url: String,
}

#[derive(Debug, Clone, PartialEq, FromRow)]
pub(crate) struct QuestionItem {
    pub(crate) id: String,
    pub(crate) title: String,
    pub(crate) text: String,
}

#[derive(Debug, Clone, PartialEq, FromRow)]
pub(crate) struct AnswerItem {
    pub(crate) id: String,
    pub(crate) question_id: String,
    pub(crate) text: String,
    pub(crate) is_true: bool,
}

#[derive(Debug, Clone, PartialEq, FromRow)]
pub(crate) struct TaskItem {
    pub(crate) id: String,
    pub(crate) title: String,
    pub(crate) description: String,
}

#[derive(Debug, Clone, FromRow)]
pub(crate) struct TaskSubmission {
    pub(crate) id: String,
    pub(crate) task_id: String,
    pub(crate) student_id: String,
    pub(crate) file: String,
    pub(crate) submitted_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, FromRow)]
pub(crate) struct TaskReview {
    pub(crate) id: String,
    pub(crate) task_submission_id: String,
    pub(crate) reviewer_id: Option<String>,
    pub(crate) is_correct: bool,
    pub(crate) comment: String,
    pub(crate) created_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, FromRow)]
pub(crate) struct CommentContent {
    pub(crate) id: String,
    pub(crate) content_id: String,
    pub(crate) author_id: String,
    pub(crate) text: String,
    pub(crate) created_at: PrimitiveDateTime,
}
