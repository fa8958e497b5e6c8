use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::core::time::format_primitive;
use crate::db::models::{display_name, TaskReview, TaskSubmission};
use crate::repositories::task_submissions::PendingSubmission;

#[derive(Debug, Serialize)]
pub(crate) struct SubmissionResponse {
    pub(crate) id: String,
    pub(crate) task_id: String,
    pub(crate) student_id: String,
    pub(crate) file: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) file_url: Option<String>,
    pub(crate) submitted_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) review: Option<ReviewResponse>,
}

impl SubmissionResponse {
    pub(crate) fn from_db(submission: TaskSubmission) -> Self {
        Self {
            id: submission.id,
            task_id: submission.task_id,
            student_id: submission.student_id,
            file: submission.file,
            file_url: None,
            submitted_at: format_primitive(submission.submitted_at),
            review: None,
        }
    }
}

/// Review queue entry.
#[derive(Debug, Serialize)]
pub(crate) struct PendingSubmissionResponse {
    pub(crate) id: String,
    pub(crate) task_id: String,
    pub(crate) task_title: String,
    pub(crate) course_id: String,
    pub(crate) course_title: String,
    pub(crate) student: String,
    pub(crate) file: String,
    pub(crate) submitted_at: String,
}

impl From<PendingSubmission> for PendingSubmissionResponse {
    fn from(row: PendingSubmission) -> Self {
        Self {
            student: display_name(
                &row.student_username,
                &row.student_first_name,
                &row.student_last_name,
            ),
            id: row.id,
            task_id: row.task_id,
            task_title: row.task_title,
            course_id: row.course_id,
            course_title: row.course_title,
            file: row.file,
            submitted_at: format_primitive(row.submitted_at),
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct ReviewCreate {
    pub(crate) is_correct: bool,
    #[serde(default)]
    #[validate(length(max = 5000))]
    pub(crate) comment: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct ReviewResponse {
    pub(crate) id: String,
    pub(crate) task_submission_id: String,
    pub(crate) reviewer_id: Option<String>,
    pub(crate) is_correct: bool,
    pub(crate) comment: String,
    pub(crate) created_at: String,
}

impl From<TaskReview> for ReviewResponse {
    fn from(review: TaskReview) -> Self {
        Self {
            id: review.id,
            task_submission_id: review.task_submission_id,
            reviewer_id: review.reviewer_id,
            is_correct: review.is_correct,
            comment: review.comment,
            created_at: format_primitive(review.created_at),
        }
    }
}
