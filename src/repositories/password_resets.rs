use sqlx::PgPool;
use time::PrimitiveDateTime;

use crate::db::models::PasswordResetRequest;

pub(crate) async fn create(
    pool: &PgPool,
    id: &str,
    email: &str,
    reset_code: &str,
    created_at: PrimitiveDateTime,
) -> Result<PasswordResetRequest, sqlx::Error> {
    sqlx::query_as::<_, PasswordResetRequest>(
        "INSERT INTO password_reset_requests (id, email, reset_code, created_at)
         VALUES ($1,$2,$3,$4)
         RETURNING id, email, reset_code, created_at",
    )
    .bind(id)
    .bind(email)
    .bind(reset_code)
    .bind(created_at)
    .fetch_one(pool)
    .await
}

/// Removes and returns the request matching `reset_code`, if any.
pub(crate) async fn take_by_code(
    executor: impl sqlx::PgExecutor<'_>,
    reset_code: &str,
) -> Result<Option<PasswordResetRequest>, sqlx::Error> {
    sqlx::query_as::<_, PasswordResetRequest>(
        "DELETE FROM password_reset_requests
         WHERE reset_code = $1
         RETURNING id, email, reset_code, created_at",
    )
    .bind(reset_code)
    .fetch_optional(executor)
    .await
}
