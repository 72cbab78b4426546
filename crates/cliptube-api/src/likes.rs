use axum::Json;
use axum::extract::{Path, State};
use axum::response::IntoResponse;
use uuid::Uuid;

use cliptube_db::LikeTarget;
use cliptube_types::api::ApiEnvelope;

use crate::auth::AppState;
use crate::error::ApiError;
use crate::middleware::CurrentUser;
use crate::blocking;

pub async fn toggle_video_like(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(video_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    toggle(state, user.id, LikeTarget::Video(video_id)).await
}

pub async fn toggle_comment_like(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(comment_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    toggle(state, user.id, LikeTarget::Comment(comment_id)).await
}

pub async fn toggle_tweet_like(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(tweet_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    toggle(state, user.id, LikeTarget::Tweet(tweet_id)).await
}

/// Toggle by row presence: a first call likes, a second unlikes. The target
/// must exist up front so a bad id is 404 rather than a dangling like.
async fn toggle(
    state: AppState,
    user_id: Uuid,
    target: LikeTarget,
) -> Result<impl IntoResponse, ApiError> {
    let like_id = Uuid::new_v4();
    let liked = blocking(&state, move |db| {
        let target_exists = match target {
            LikeTarget::Video(v) => db.get_video(v)?.is_some(),
            LikeTarget::Comment(c) => db.get_comment(c)?.is_some(),
            LikeTarget::Tweet(t) => db.get_tweet(t)?.is_some(),
        };
        if !target_exists {
            return Ok(None);
        }
        db.toggle_like(like_id, user_id, target).map(Some)
    })
    .await?
    .ok_or_else(|| match target {
        LikeTarget::Video(_) => ApiError::not_found("video does not exist"),
        LikeTarget::Comment(_) => ApiError::not_found("comment does not exist"),
        LikeTarget::Tweet(_) => ApiError::not_found("tweet does not exist"),
    })?;

    let message = if liked { "liked" } else { "like removed" };
    Ok(Json(ApiEnvelope::ok(
        serde_json::json!({ "liked": liked }),
        message,
    )))
}

/// Every video the caller has liked, published or not, each joined with its
/// owner.
pub async fn get_liked_videos(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<impl IntoResponse, ApiError> {
    let videos = blocking(&state, move |db| db.liked_videos(user.id)).await?;
    Ok(Json(ApiEnvelope::ok(
        videos,
        "liked videos fetched successfully",
    )))
}
