use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use std::time::Duration;
use uuid::Uuid;

use crate::api::errors::ApiError;
use crate::api::guards::CurrentUser;
use crate::api::validation::validate_body;
use crate::core::redis::{Admission, Throttle};
use crate::core::security;
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::db::models::User;
use crate::repositories;
use crate::schemas::auth::{
    MessageResponse, PasswordResetConfirmBody, PasswordResetRequestBody, TokenResponse,
};
use crate::schemas::user::{UserCreate, UserLogin, UserResponse};
use crate::services::password_reset;

const AUTH_WINDOW: Duration = Duration::from_secs(60);
const SIGNUP: Throttle = Throttle::new("signup", 10, AUTH_WINDOW);
const LOGIN: Throttle = Throttle::new("login", 10, AUTH_WINDOW);
const RESET_REQUEST: Throttle = Throttle::new("reset", 5, AUTH_WINDOW);
const RESET_CONFIRM: Throttle = Throttle::new("reset-confirm", 10, AUTH_WINDOW);

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/signup", post(signup))
        .route("/login", post(login))
        .route("/me", get(me))
        .route("/password-reset/request", post(request_password_reset))
        .route("/password-reset/confirm", post(confirm_password_reset))
}

async fn signup(
    State(state): State<AppState>,
    Json(payload): Json<UserCreate>,
) -> Result<(StatusCode, Json<TokenResponse>), ApiError> {
    validate_body(&payload)?;
    enforce_rate_limit(
        &state,
        &SIGNUP,
        &payload.username,
        "Too many signup attempts, try again later",
    )
    .await?;

    let (username_taken, email_taken) =
        repositories::users::identity_taken(state.db(), &payload.username, &payload.email)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to check existing user"))?;

    if username_taken {
        return Err(ApiError::conflict("User with this username already exists"));
    }
    if email_taken {
        return Err(ApiError::conflict("User with this email already exists"));
    }

    let hashed_password = security::hash_password(&payload.password)
        .map_err(|e| ApiError::internal(e, "Failed to hash password"))?;

    let user = repositories::users::create(
        state.db(),
        repositories::users::CreateUser {
            id: &Uuid::new_v4().to_string(),
            username: &payload.username,
            email: &payload.email,
            hashed_password,
            first_name: &payload.first_name,
            last_name: &payload.last_name,
            is_moderator: false,
            created_at: primitive_now_utc(),
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to create user"))?;

    tracing::info!(user_id = %user.id, username = %user.username, "User signed up");
    Ok((StatusCode::CREATED, Json(token_response(&state, user)?)))
}

async fn login(
    State(state): State<AppState>,
    Json(payload): Json<UserLogin>,
) -> Result<Json<TokenResponse>, ApiError> {
    validate_body(&payload)?;
    enforce_rate_limit(
        &state,
        &LOGIN,
        &payload.username,
        "Too many login attempts, try again later",
    )
    .await?;

    let user = repositories::users::find_by_username(state.db(), &payload.username)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load user"))?
        .ok_or(ApiError::Unauthorized("Incorrect username or password"))?;

    let verified = security::verify_password(&payload.password, &user.hashed_password)
        .map_err(|_| ApiError::Unauthorized("Incorrect username or password"))?;

    if !verified {
        return Err(ApiError::Unauthorized("Incorrect username or password"));
    }

    if !user.is_active {
        return Err(ApiError::BadRequest("Inactive user".to_string()));
    }

    Ok(Json(token_response(&state, user)?))
}

async fn me(CurrentUser(user): CurrentUser) -> Json<UserResponse> {
    Json(UserResponse::from_db(user))
}

async fn request_password_reset(
    State(state): State<AppState>,
    Json(payload): Json<PasswordResetRequestBody>,
) -> Result<Json<MessageResponse>, ApiError> {
    validate_body(&payload)?;
    enforce_rate_limit(
        &state,
        &RESET_REQUEST,
        &payload.email,
        "Too many reset requests, try again later",
    )
    .await?;

    password_reset::request_reset(
        state.db(),
        state.reset_sender(),
        &payload.email,
        state.settings().content().reset_code_length,
    )
    .await?;

    Ok(Json(MessageResponse::new("If the account exists, a reset code has been sent")))
}

async fn confirm_password_reset(
    State(state): State<AppState>,
    Json(payload): Json<PasswordResetConfirmBody>,
) -> Result<Json<MessageResponse>, ApiError> {
    validate_body(&payload)?;
    enforce_rate_limit(
        &state,
        &RESET_CONFIRM,
        &payload.reset_code,
        "Too many reset attempts, try again later",
    )
    .await?;

    password_reset::confirm_reset(state.db(), &payload.reset_code, &payload.new_password).await?;

    Ok(Json(MessageResponse::new("Password has been reset")))
}

async fn enforce_rate_limit(
    state: &AppState,
    throttle: &Throttle,
    subject: &str,
    message: &'static str,
) -> Result<(), ApiError> {
    let admission = match state.redis().admit(throttle, subject).await {
        Ok(admission) => admission,
        Err(error) => {
            tracing::warn!(
                action = throttle.action,
                error = %error,
                "Throttle check failed, admitting"
            );
            Admission::Allowed
        }
    };
    match admission {
        Admission::Allowed => Ok(()),
        Admission::Throttled { retry_after } => {
            tracing::info!(
                action = throttle.action,
                retry_after_secs = retry_after.as_secs(),
                "Auth request throttled"
            );
            Err(ApiError::TooManyRequests(message))
        }
    }
}

fn token_response(state: &AppState, user: User) -> Result<TokenResponse, ApiError> {
    let token = security::create_access_token(&user.id, state.settings(), None)
        .map_err(|e| ApiError::internal(e, "Failed to create access token"))?;

    Ok(TokenResponse {
        access_token: token,
        token_type: "bearer".to_string(),
        user: UserResponse::from_db(user),
    })
}
