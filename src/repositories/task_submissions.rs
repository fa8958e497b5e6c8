use sqlx::PgPool;
use time::PrimitiveDateTime;

use crate::db::models::{TaskReview, TaskSubmission};

const SUBMISSION_COLUMNS: &str = "id, task_id, student_id, file, submitted_at";
const REVIEW_COLUMNS: &str = "id, task_submission_id, reviewer_id, is_correct, comment, created_at";

pub(crate) const SUBMISSION_UNIQUE: &str = "task_submissions_task_student_key";
pub(crate) const REVIEW_UNIQUE: &str = "task_reviews_submission_key";

/// One row of the review queue.
#[derive(Debug, Clone, sqlx::FromRow)]
pub(crate) struct PendingSubmission {
    pub(crate) id: String,
    pub(crate) task_id: String,
    pub(crate) task_title: String,
    pub(crate) course_id: String,
    pub(crate) course_title: String,
    pub(crate) student_username: String,
    pub(crate) student_first_name: String,
    pub(crate) student_last_name: String,
    pub(crate) file: String,
    pub(crate) submitted_at: PrimitiveDateTime,
}

/// Course that owns a task through its content wrapper.
#[derive(Debug, Clone, sqlx::FromRow)]
pub(crate) struct TaskOwner {
    pub(crate) course_id: String,
    pub(crate) creator_id: String,
}

pub(crate) struct CreateSubmission<'a> {
    pub(crate) id: &'a str,
    pub(crate) task_id: &'a str,
    pub(crate) student_id: &'a str,
    pub(crate) file: &'a str,
    pub(crate) submitted_at: PrimitiveDateTime,
}

/// Uniqueness on `(task_id, student_id)` is left to the constraint; callers map
/// [`SUBMISSION_UNIQUE`] violations.
pub(crate) async fn create(
    executor: impl sqlx::PgExecutor<'_>,
    params: CreateSubmission<'_>,
) -> Result<TaskSubmission, sqlx::Error> {
    sqlx::query_as::<_, TaskSubmission>(&format!(
        "INSERT INTO task_submissions (id, task_id, student_id, file, submitted_at)
         VALUES ($1,$2,$3,$4,$5)
         RETURNING {SUBMISSION_COLUMNS}"
    ))
    .bind(params.id)
    .bind(params.task_id)
    .bind(params.student_id)
    .bind(params.file)
    .bind(params.submitted_at)
    .fetch_one(executor)
    .await
}

pub(crate) async fn find_by_id(
    pool: &PgPool,
    submission_id: &str,
) -> Result<Option<TaskSubmission>, sqlx::Error> {
    sqlx::query_as::<_, TaskSubmission>(&format!(
        "SELECT {SUBMISSION_COLUMNS} FROM task_submissions WHERE id = $1"
    ))
    .bind(submission_id)
    .fetch_optional(pool)
    .await
}

pub(crate) async fn find_for_student(
    executor: impl sqlx::PgExecutor<'_>,
    task_id: &str,
    student_id: &str,
) -> Result<Option<TaskSubmission>, sqlx::Error> {
    sqlx::query_as::<_, TaskSubmission>(&format!(
        "SELECT {SUBMISSION_COLUMNS} FROM task_submissions
         WHERE task_id = $1 AND student_id = $2
         ORDER BY submitted_at DESC
         LIMIT 1"
    ))
    .bind(task_id)
    .bind(student_id)
    .fetch_optional(executor)
    .await
}

pub(crate) async fn task_owner(
    pool: &PgPool,
    task_id: &str,
) -> Result<Option<TaskOwner>, sqlx::Error> {
    sqlx::query_as::<_, TaskOwner>(
        "SELECT co.id AS course_id, co.creator_id
         FROM contents c
         JOIN lessons l ON l.id = c.lesson_id
         JOIN modules m ON m.id = l.module_id
         JOIN courses co ON co.id = m.course_id
         WHERE c.kind = 'task' AND c.target_id = $1",
    )
    .bind(task_id)
    .fetch_optional(pool)
    .await
}

/// Submissions without a review on courses created by `reviewer_id`, oldest first.
pub(crate) async fn list_pending_for_reviewer(
    pool: &PgPool,
    reviewer_id: &str,
) -> Result<Vec<PendingSubmission>, sqlx::Error> {
    sqlx::query_as::<_, PendingSubmission>(
        "SELECT s.id, s.task_id, t.title AS task_title,
                co.id AS course_id, co.title AS course_title,
                u.username AS student_username,
                u.first_name AS student_first_name,
                u.last_name AS student_last_name,
                s.file, s.submitted_at
         FROM task_submissions s
         JOIN content_tasks t ON t.id = s.task_id
         JOIN contents c ON c.kind = 'task' AND c.target_id = s.task_id
         JOIN lessons l ON l.id = c.lesson_id
         JOIN modules m ON m.id = l.module_id
         JOIN courses co ON co.id = m.course_id
         JOIN users u ON u.id = s.student_id
         WHERE co.creator_id = $1
           AND NOT EXISTS (
               SELECT 1 FROM task_reviews r WHERE r.task_submission_id = s.id
           )
         ORDER BY s.submitted_at",
    )
    .bind(reviewer_id)
    .fetch_all(pool)
    .await
}

pub(crate) struct CreateReview<'a> {
    pub(crate) id: &'a str,
    pub(crate) task_submission_id: &'a str,
    pub(crate) reviewer_id: &'a str,
    pub(crate) is_correct: bool,
    pub(crate) comment: &'a str,
    pub(crate) created_at: PrimitiveDateTime,
}

/// At most one review per submission; a second insert violates [`REVIEW_UNIQUE`].
pub(crate) async fn create_review(
    executor: impl sqlx::PgExecutor<'_>,
    params: CreateReview<'_>,
) -> Result<TaskReview, sqlx::Error> {
    sqlx::query_as::<_, TaskReview>(&format!(
        "INSERT INTO task_reviews (id, task_submission_id, reviewer_id, is_correct, comment, created_at)
         VALUES ($1,$2,$3,$4,$5,$6)
         RETURNING {REVIEW_COLUMNS}"
    ))
    .bind(params.id)
    .bind(params.task_submission_id)
    .bind(params.reviewer_id)
    .bind(params.is_correct)
    .bind(params.comment)
    .bind(params.created_at)
    .fetch_one(executor)
    .await
}

pub(crate) async fn find_review(
    executor: impl sqlx::PgExecutor<'_>,
    task_submission_id: &str,
) -> Result<Option<TaskReview>, sqlx::Error> {
    sqlx::query_as::<_, TaskReview>(&format!(
        "SELECT {REVIEW_COLUMNS} FROM task_reviews
         WHERE task_submission_id = $1
         ORDER BY created_at DESC
         LIMIT 1"
    ))
    .bind(task_submission_id)
    .fetch_optional(executor)
    .await
}
