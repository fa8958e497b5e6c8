use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::core::time::primitive_now_utc;
use crate::db;
use crate::db::models::{TaskReview, TaskSubmission};
use crate::repositories;
use crate::repositories::task_submissions::{REVIEW_UNIQUE, SUBMISSION_UNIQUE};
use crate::services::errors::DomainError;
use crate::services::storage::{self, StorageService};

/// File received for a task submission.
pub(crate) struct SubmissionUpload {
    pub(crate) filename: String,
    pub(crate) content_type: String,
    pub(crate) bytes: Vec<u8>,
}

/// Inserts the submission row; the `(task, student)` constraint decides duplicates.
pub(crate) async fn record_submission(
    conn: &mut PgConnection,
    task_id: &str,
    student_id: &str,
    file: &str,
) -> Result<TaskSubmission, DomainError> {
    repositories::task_submissions::create(
        conn,
        repositories::task_submissions::CreateSubmission {
            id: &Uuid::new_v4().to_string(),
            task_id,
            student_id,
            file,
            submitted_at: primitive_now_utc(),
        },
    )
    .await
    .map_err(|err| {
        if db::is_unique_violation(&err, SUBMISSION_UNIQUE) {
            DomainError::DuplicateSubmission
        } else {
            DomainError::Database(err)
        }
    })
}

/// Records the submission and uploads the file; the row only commits once the
/// blob is stored.
pub(crate) async fn submit_task(
    pool: &PgPool,
    storage: &StorageService,
    task_id: &str,
    student_id: &str,
    upload: SubmissionUpload,
) -> Result<TaskSubmission, DomainError> {
    let key = storage::submission_key(task_id, student_id, &upload.filename);

    let mut tx = pool.begin().await?;
    let submission = record_submission(&mut *tx, task_id, student_id, &key).await?;

    storage
        .upload_bytes(&key, &upload.content_type, upload.bytes)
        .await
        .map_err(|err| DomainError::Storage(err.to_string()))?;

    tx.commit().await?;

    tracing::info!(
        submission_id = %submission.id,
        task_id,
        student_id,
        "Task submission stored"
    );
    Ok(submission)
}

/// Attaches the single allowed review to a submission.
pub(crate) async fn review_submission(
    pool: &PgPool,
    submission_id: &str,
    reviewer_id: &str,
    is_correct: bool,
    comment: &str,
) -> Result<TaskReview, DomainError> {
    if repositories::task_submissions::find_by_id(pool, submission_id).await?.is_none() {
        return Err(DomainError::NotFound("submission"));
    }

    let review = repositories::task_submissions::create_review(
        pool,
        repositories::task_submissions::CreateReview {
            id: &Uuid::new_v4().to_string(),
            task_submission_id: submission_id,
            reviewer_id,
            is_correct,
            comment,
            created_at: primitive_now_utc(),
        },
    )
    .await
    .map_err(|err| {
        if db::is_unique_violation(&err, REVIEW_UNIQUE) {
            DomainError::DuplicateReview
        } else {
            DomainError::Database(err)
        }
    })?;

    tracing::info!(submission_id, reviewer_id, is_correct, "Task submission reviewed");
    Ok(review)
}
