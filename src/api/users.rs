use axum::{extract::State, routing::get, Json, Router};

use crate::api::errors::ApiError;
use crate::api::guards::CurrentUser;
use crate::api::validation::validate_body;
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::db;
use crate::repositories;
use crate::schemas::user::{UserResponse, UserUpdate};

const EMAIL_UNIQUE: &str = "users_email_key";

pub(crate) fn router() -> Router<AppState> {
    Router::new().route("/me", get(me).patch(update_me))
}

async fn me(CurrentUser(user): CurrentUser) -> Json<UserResponse> {
    Json(UserResponse::from_db(user))
}

async fn update_me(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Json(payload): Json<UserUpdate>,
) -> Result<Json<UserResponse>, ApiError> {
    validate_body(&payload)?;

    repositories::users::update(
        state.db(),
        &user.id,
        repositories::users::UpdateUser {
            email: payload.email,
            first_name: payload.first_name,
            last_name: payload.last_name,
            avatar: payload.avatar,
            is_moderator: None,
            is_active: None,
            hashed_password: None,
            updated_at: primitive_now_utc(),
        },
    )
    .await
    .map_err(|e| {
        if db::is_unique_violation(&e, EMAIL_UNIQUE) {
            ApiError::conflict("User with this email already exists")
        } else {
            ApiError::internal(e, "Failed to update user")
        }
    })?;

    let updated = repositories::users::fetch_one_by_id(state.db(), &user.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load user"))?;

    Ok(Json(UserResponse::from_db(updated)))
}
