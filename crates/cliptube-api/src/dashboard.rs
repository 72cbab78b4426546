use axum::Json;
use axum::extract::State;
use axum::response::IntoResponse;

use cliptube_types::api::ApiEnvelope;

use crate::auth::AppState;
use crate::error::ApiError;
use crate::middleware::CurrentUser;
use crate::blocking;

/// Aggregate stats for the caller's channel: total views, videos,
/// subscribers, and the likes the caller has given split by target kind.
pub async fn get_channel_stats(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<impl IntoResponse, ApiError> {
    let stats = blocking(&state, move |db| db.channel_stats(user.id)).await?;
    Ok(Json(ApiEnvelope::ok(
        stats,
        "channel stats fetched successfully",
    )))
}

/// Every video on the caller's channel, published or not, newest first.
pub async fn get_channel_videos(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<impl IntoResponse, ApiError> {
    let videos = blocking(&state, move |db| db.videos_by_owner(user.id)).await?;
    Ok(Json(ApiEnvelope::ok(
        videos,
        "channel videos fetched successfully",
    )))
}
