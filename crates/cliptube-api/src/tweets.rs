use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use chrono::Utc;
use uuid::Uuid;

use cliptube_types::api::{ApiEnvelope, CreateTweetRequest, UpdateTweetRequest};
use cliptube_types::models::Tweet;

use crate::auth::AppState;
use crate::error::ApiError;
use crate::middleware::CurrentUser;
use crate::ownership::ensure_owner;
use crate::blocking;

pub async fn create_tweet(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(req): Json<CreateTweetRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let content = req.content.trim().to_string();
    if content.is_empty() {
        return Err(ApiError::validation("content is required"));
    }

    let tweet_id = Uuid::new_v4();
    {
        let content = content.clone();
        blocking(&state, move |db| db.insert_tweet(tweet_id, user.id, &content)).await?;
    }

    let tweet = Tweet {
        id: tweet_id,
        owner_id: user.id,
        content,
        created_at: Utc::now(),
    };
    Ok((
        StatusCode::CREATED,
        Json(ApiEnvelope::created(tweet, "tweet created successfully")),
    ))
}

/// All tweets by one user, newest first.
pub async fn get_user_tweets(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let tweets = blocking(&state, move |db| {
        if db.get_user_by_id(user_id)?.is_none() {
            return Ok(None);
        }
        db.tweets_by_owner(user_id).map(Some)
    })
    .await?
    .ok_or_else(|| ApiError::not_found("user does not exist"))?;

    Ok(Json(ApiEnvelope::ok(tweets, "tweets fetched successfully")))
}

pub async fn update_tweet(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(tweet_id): Path<Uuid>,
    Json(req): Json<UpdateTweetRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let content = req.new_content.trim().to_string();
    if content.is_empty() {
        return Err(ApiError::validation("newContent is required"));
    }

    let tweet = blocking(&state, move |db| db.get_tweet(tweet_id))
        .await?
        .ok_or_else(|| ApiError::not_found("tweet does not exist"))?;
    ensure_owner(&tweet, user.id, "update this tweet")?;

    let updated = blocking(&state, move |db| {
        db.update_tweet(tweet_id, &content)?;
        db.get_tweet(tweet_id)
    })
    .await?
    .ok_or_else(|| ApiError::not_found("tweet does not exist"))?;

    Ok(Json(ApiEnvelope::ok(updated, "tweet updated successfully")))
}

pub async fn delete_tweet(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(tweet_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let tweet = blocking(&state, move |db| db.get_tweet(tweet_id))
        .await?
        .ok_or_else(|| ApiError::not_found("tweet does not exist"))?;
    ensure_owner(&tweet, user.id, "delete this tweet")?;

    blocking(&state, move |db| db.delete_tweet(tweet_id)).await?;

    Ok(Json(ApiEnvelope::ok(
        serde_json::json!({}),
        "tweet deleted successfully",
    )))
}
