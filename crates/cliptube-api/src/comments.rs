use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use uuid::Uuid;

use cliptube_db::CommentTarget;
use cliptube_types::api::{AddCommentRequest, ApiEnvelope, PageQuery, Paginated, UpdateCommentRequest};
use cliptube_types::models::Comment;

use crate::auth::AppState;
use crate::error::ApiError;
use crate::middleware::CurrentUser;
use crate::ownership::ensure_owner;
use crate::blocking;

const MAX_PAGE_SIZE: u32 = 100;

/// Paginated comments on a video, newest first, each joined with its author.
pub async fn get_video_comments(
    State(state): State<AppState>,
    Path(video_id): Path<Uuid>,
    Query(params): Query<PageQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let page = params.page.max(1);
    let limit = params.limit.clamp(1, MAX_PAGE_SIZE);

    let (comments, total) = blocking(&state, move |db| {
        if db.get_video(video_id)?.is_none() {
            return Ok(None);
        }
        db.comments_for_video(video_id, page, limit).map(Some)
    })
    .await?
    .ok_or_else(|| ApiError::not_found("video does not exist"))?;

    Ok(Json(ApiEnvelope::ok(
        Paginated::new(comments, total, page, limit),
        "comments fetched successfully",
    )))
}

pub async fn get_tweet_comments(
    State(state): State<AppState>,
    Path(tweet_id): Path<Uuid>,
    Query(params): Query<PageQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let page = params.page.max(1);
    let limit = params.limit.clamp(1, MAX_PAGE_SIZE);

    let (comments, total) = blocking(&state, move |db| {
        if db.get_tweet(tweet_id)?.is_none() {
            return Ok(None);
        }
        db.comments_for_tweet(tweet_id, page, limit).map(Some)
    })
    .await?
    .ok_or_else(|| ApiError::not_found("tweet does not exist"))?;

    Ok(Json(ApiEnvelope::ok(
        Paginated::new(comments, total, page, limit),
        "comments fetched successfully",
    )))
}

pub async fn add_video_comment(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(video_id): Path<Uuid>,
    Json(req): Json<AddCommentRequest>,
) -> Result<impl IntoResponse, ApiError> {
    add_comment(state, user.id, CommentTarget::Video(video_id), req).await
}

pub async fn add_tweet_comment(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(tweet_id): Path<Uuid>,
    Json(req): Json<AddCommentRequest>,
) -> Result<impl IntoResponse, ApiError> {
    add_comment(state, user.id, CommentTarget::Tweet(tweet_id), req).await
}

async fn add_comment(
    state: AppState,
    owner_id: Uuid,
    target: CommentTarget,
    req: AddCommentRequest,
) -> Result<impl IntoResponse, ApiError> {
    let content = req.comment.trim().to_string();
    if content.is_empty() {
        return Err(ApiError::validation("comment is required"));
    }

    let comment_id = Uuid::new_v4();
    let comment = blocking(&state, move |db| {
        let parent_exists = match target {
            CommentTarget::Video(v) => db.get_video(v)?.is_some(),
            CommentTarget::Tweet(t) => db.get_tweet(t)?.is_some(),
        };
        if !parent_exists {
            return Ok(None);
        }
        db.insert_comment(comment_id, owner_id, &content, target)?;
        db.get_comment(comment_id)
    })
    .await?
    .ok_or_else(|| match target {
        CommentTarget::Video(_) => ApiError::not_found("video does not exist"),
        CommentTarget::Tweet(_) => ApiError::not_found("tweet does not exist"),
    })?;

    Ok((
        StatusCode::CREATED,
        Json(ApiEnvelope::created(comment, "comment added successfully")),
    ))
}

pub async fn update_comment(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(comment_id): Path<Uuid>,
    Json(req): Json<UpdateCommentRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let content = req.new_content.trim().to_string();
    if content.is_empty() {
        return Err(ApiError::validation("newContent is required"));
    }

    let comment: Comment = blocking(&state, move |db| db.get_comment(comment_id))
        .await?
        .ok_or_else(|| ApiError::not_found("comment does not exist"))?;
    ensure_owner(&comment, user.id, "update this comment")?;

    let updated = blocking(&state, move |db| {
        db.update_comment(comment_id, &content)?;
        db.get_comment(comment_id)
    })
    .await?
    .ok_or_else(|| ApiError::not_found("comment does not exist"))?;

    Ok(Json(ApiEnvelope::ok(
        updated,
        "comment updated successfully",
    )))
}

pub async fn delete_comment(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(comment_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let comment: Comment = blocking(&state, move |db| db.get_comment(comment_id))
        .await?
        .ok_or_else(|| ApiError::not_found("comment does not exist"))?;
    ensure_owner(&comment, user.id, "delete this comment")?;

    blocking(&state, move |db| db.delete_comment(comment_id)).await?;

    Ok(Json(ApiEnvelope::ok(
        serde_json::json!({}),
        "comment deleted successfully",
    )))
}
