use async_trait::async_trait;
use rand::Rng;
use sqlx::PgPool;
use time::Duration;
use uuid::Uuid;

use crate::core::security;
use crate::core::time::primitive_now_utc;
use crate::db;
use crate::repositories;
use crate::services::errors::DomainError;

/// Codes older than this are treated as unknown.
pub(crate) const RESET_CODE_TTL: Duration = Duration::hours(1);

const MAX_CODE_ATTEMPTS: usize = 3;

/// Delivers reset codes to the account owner.
#[async_trait]
pub(crate) trait ResetCodeSender: Send + Sync {
    async fn send(&self, email: &str, reset_code: &str) -> anyhow::Result<()>;
}

/// Writes the delivery to the log instead of sending mail.
pub(crate) struct LoggingResetCodeSender;

#[async_trait]
impl ResetCodeSender for LoggingResetCodeSender {
    async fn send(&self, email: &str, _reset_code: &str) -> anyhow::Result<()> {
        tracing::info!(email, "Password reset code issued; no mail transport configured");
        Ok(())
    }
}

/// Random decimal code of `length` digits.
pub(crate) fn generate_reset_code(length: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..length).map(|_| char::from(b'0' + rng.gen_range(0..10u8))).collect()
}

/// Issues a code for `email` when an account with that address exists.
/// Unknown addresses are accepted silently.
pub(crate) async fn request_reset(
    pool: &PgPool,
    sender: &dyn ResetCodeSender,
    email: &str,
    code_length: usize,
) -> Result<(), DomainError> {
    if repositories::users::find_by_email(pool, email).await?.is_none() {
        tracing::info!(email, "Password reset requested for unknown email");
        return Ok(());
    }

    let mut attempt = 0;
    let request = loop {
        attempt += 1;
        let code = generate_reset_code(code_length);
        match repositories::password_resets::create(
            pool,
            &Uuid::new_v4().to_string(),
            email,
            &code,
            primitive_now_utc(),
        )
        .await
        {
            Ok(request) => break request,
            Err(err)
                if attempt < MAX_CODE_ATTEMPTS
                    && db::is_unique_violation(&err, "password_reset_requests_reset_code_key") =>
            {
                continue;
            }
            Err(err) => return Err(err.into()),
        }
    };

    if let Err(err) = sender.send(&request.email, &request.reset_code).await {
        tracing::error!(error = %err, email, "Failed to deliver password reset code");
    }

    Ok(())
}

/// Consumes `reset_code` and sets the new password on the matching account.
pub(crate) async fn confirm_reset(
    pool: &PgPool,
    reset_code: &str,
    new_password: &str,
) -> Result<(), DomainError> {
    let mut tx = pool.begin().await?;

    let request = repositories::password_resets::take_by_code(&mut *tx, reset_code).await?;
    let Some(request) = request else {
        return Err(DomainError::field("reset_code", "Invalid reset code"));
    };

    let now = primitive_now_utc();
    if now - request.created_at > RESET_CODE_TTL {
        tx.commit().await?;
        return Err(DomainError::field("reset_code", "Reset code expired"));
    }

    let Some(user) = repositories::users::find_by_email(pool, &request.email).await? else {
        tx.commit().await?;
        return Err(DomainError::field("reset_code", "Invalid reset code"));
    };

    let hashed_password = security::hash_password(new_password)
        .map_err(|err| DomainError::Internal(err.to_string()))?;

    repositories::users::update(
        &mut *tx,
        &user.id,
        repositories::users::UpdateUser {
            email: None,
            first_name: None,
            last_name: None,
            avatar: None,
            is_moderator: None,
            is_active: None,
            hashed_password: Some(hashed_password),
            updated_at: now,
        },
    )
    .await?;

    tx.commit().await?;
    tracing::info!(user_id = %user.id, "Password reset completed");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::generate_reset_code;

    #[test]
    fn reset_code_has_requested_length_and_digits_only() {
        for length in [4, 6, 12] {
            let code = generate_reset_code(length);
            assert_eq!(code.len(), length);
            assert!(code.chars().all(|c| c.is_ascii_digit()));
        }
    }
}
