use std::collections::BTreeMap;

use axum::{extract::State, http::header, http::StatusCode, response::IntoResponse, Json};

use crate::core::metrics;
use crate::core::state::AppState;
use crate::schemas::{HealthResponse, RootResponse};

pub(crate) async fn root(State(state): State<AppState>) -> Json<RootResponse> {
    Json(RootResponse {
        message: "Trainee API".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        api_prefix: state.settings().api().api_v1_str.clone(),
        storage_enabled: state.storage().is_some(),
    })
}

/// State of one backing service as reported by `/healthz`.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Component {
    Healthy,
    /// Optional service that is configured off or not connected yet.
    Absent(&'static str),
    Failing(String),
}

impl Component {
    fn from_result<E: std::fmt::Display>(result: Result<(), E>) -> Self {
        match result {
            Ok(()) => Self::Healthy,
            Err(error) => Self::Failing(error.to_string()),
        }
    }

    fn label(&self) -> String {
        match self {
            Self::Healthy => "healthy".to_string(),
            Self::Absent(reason) => (*reason).to_string(),
            Self::Failing(error) => format!("unhealthy: {error}"),
        }
    }
}

/// The database is required; Redis and object storage only degrade service.
fn overall_status(database: &Component, optional: &[&Component]) -> &'static str {
    if matches!(database, Component::Failing(_)) {
        "unhealthy"
    } else if optional.iter().any(|component| matches!(component, Component::Failing(_))) {
        "degraded"
    } else {
        "healthy"
    }
}

pub(crate) async fn healthz(State(state): State<AppState>) -> Json<HealthResponse> {
    let database =
        Component::from_result(sqlx::query("SELECT 1").execute(state.db()).await.map(|_| ()));

    let redis = match state.redis().ping().await {
        Some(result) => Component::from_result(result),
        None => Component::Absent("disconnected"),
    };

    let storage = match state.storage() {
        Some(storage) => Component::from_result(storage.check_bucket().await),
        None => Component::Absent("disabled"),
    };

    let status = overall_status(&database, &[&redis, &storage]);
    if status != "healthy" {
        tracing::warn!(status, ?database, ?redis, ?storage, "Health check not healthy");
    }

    let components = BTreeMap::from([
        ("database", database.label()),
        ("redis", redis.label()),
        ("storage", storage.label()),
    ]);

    Json(HealthResponse { service: "trainee-api", status, components })
}

pub(crate) async fn metrics(State(state): State<AppState>) -> impl IntoResponse {
    if !state.settings().telemetry().prometheus_enabled {
        return StatusCode::NOT_FOUND.into_response();
    }

    let Some(body) = metrics::render() else {
        return StatusCode::SERVICE_UNAVAILABLE.into_response();
    };
    ([(header::CONTENT_TYPE, "text/plain; version=0.0.4")], body).into_response()
}
