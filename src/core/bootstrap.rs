use uuid::Uuid;

use crate::core::security;
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::repositories;

/// Makes sure the configured moderator account exists, is active and carries
/// the moderator flag, so that freshly created courses can be approved.
pub(crate) async fn ensure_moderator(state: &AppState) -> anyhow::Result<()> {
    let admin = state.settings().admin();
    if admin.first_moderator_password.is_empty() {
        tracing::warn!("FIRST_MODERATOR_PASSWORD not configured; skipping moderator creation");
        return Ok(());
    }

    let username = &admin.first_moderator_username;
    let now = primitive_now_utc();

    if let Some(user) = repositories::users::find_by_username(state.db(), username).await? {
        let verified =
            security::verify_password(&admin.first_moderator_password, &user.hashed_password)
                .unwrap_or(false);
        let hashed_password = if verified {
            None
        } else {
            Some(security::hash_password(&admin.first_moderator_password)?)
        };

        if hashed_password.is_none() && user.is_moderator && user.is_active {
            tracing::info!(username = %username, "Default moderator already up to date");
            return Ok(());
        }

        repositories::users::update(
            state.db(),
            &user.id,
            repositories::users::UpdateUser {
                email: None,
                first_name: None,
                last_name: None,
                avatar: None,
                is_moderator: Some(true),
                is_active: Some(true),
                hashed_password,
                updated_at: now,
            },
        )
        .await?;

        tracing::info!(username = %username, "Updated default moderator");
        return Ok(());
    }

    let hashed_password = security::hash_password(&admin.first_moderator_password)?;
    repositories::users::create(
        state.db(),
        repositories::users::CreateUser {
            id: &Uuid::new_v4().to_string(),
            username,
            email: &admin.first_moderator_email,
            hashed_password,
            first_name: "",
            last_name: "",
            is_moderator: true,
            created_at: now,
        },
    )
    .await?;

    tracing::info!(username = %username, "Created default moderator");
    Ok(())
}
