use axum::Json;
use axum::extract::{Path, State};
use axum::response::IntoResponse;
use uuid::Uuid;

use cliptube_types::api::ApiEnvelope;

use crate::auth::AppState;
use crate::error::ApiError;
use crate::middleware::CurrentUser;
use crate::blocking;

/// Toggle the caller's subscription to a channel. Self-subscription is
/// rejected outright.
pub async fn toggle_subscription(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(channel_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    if channel_id == user.id {
        return Err(ApiError::validation("you cannot subscribe to yourself"));
    }

    let sub_id = Uuid::new_v4();
    let subscribed = blocking(&state, move |db| {
        if db.get_user_by_id(channel_id)?.is_none() {
            return Ok(None);
        }
        db.toggle_subscription(sub_id, user.id, channel_id).map(Some)
    })
    .await?
    .ok_or_else(|| ApiError::not_found("channel does not exist"))?;

    let message = if subscribed {
        "subscribed"
    } else {
        "unsubscribed"
    };
    Ok(Json(ApiEnvelope::ok(
        serde_json::json!({ "subscribed": subscribed }),
        message,
    )))
}

/// Profiles of the users subscribed to a channel.
pub async fn get_channel_subscribers(
    State(state): State<AppState>,
    Path(channel_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let subscribers = blocking(&state, move |db| {
        if db.get_user_by_id(channel_id)?.is_none() {
            return Ok(None);
        }
        db.channel_subscribers(channel_id).map(Some)
    })
    .await?
    .ok_or_else(|| ApiError::not_found("channel does not exist"))?;

    Ok(Json(ApiEnvelope::ok(
        subscribers,
        "subscribers fetched successfully",
    )))
}

/// Profiles of the channels a user subscribes to.
pub async fn get_subscribed_channels(
    State(state): State<AppState>,
    Path(subscriber_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let channels = blocking(&state, move |db| {
        if db.get_user_by_id(subscriber_id)?.is_none() {
            return Ok(None);
        }
        db.subscribed_channels(subscriber_id).map(Some)
    })
    .await?
    .ok_or_else(|| ApiError::not_found("user does not exist"))?;

    Ok(Json(ApiEnvelope::ok(
        channels,
        "subscribed channels fetched successfully",
    )))
}
