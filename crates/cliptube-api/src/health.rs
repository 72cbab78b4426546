use axum::Json;
use axum::extract::State;
use axum::response::IntoResponse;
use chrono::Utc;

use cliptube_types::api::{ApiEnvelope, HealthCheck};

use crate::auth::AppState;

/// Liveness probe; no auth, no storage access.
pub async fn healthcheck(State(state): State<AppState>) -> impl IntoResponse {
    let body = HealthCheck {
        uptime_secs: state.started_at.elapsed().as_secs(),
        message: "everything is ok".into(),
        timestamp: Utc::now().timestamp(),
    };
    Json(ApiEnvelope::ok(body, "health check passed"))
}
