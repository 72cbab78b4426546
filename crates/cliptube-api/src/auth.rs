use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::{SaltString, rand_core::OsRng},
};
use axum::extract::{Json, Multipart, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum_extra::extract::cookie::{Cookie, CookieJar};
use tracing::{info, warn};
use uuid::Uuid;

use cliptube_db::Database;
use cliptube_db::queries::users::NewUser;
use cliptube_types::api::{ApiEnvelope, LoginData, LoginRequest, RefreshTokenRequest, TokenPair};
use cliptube_types::models::User;

use crate::assets::{AssetKind, AssetStore, MAX_IMAGE_SIZE, stage_upload};
use crate::error::ApiError;
use crate::middleware::CurrentUser;
use crate::multipart::FormData;
use crate::tokens::{self, TokenKeys};
use crate::blocking;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Database,
    pub keys: TokenKeys,
    pub assets: AssetStore,
    pub upload_dir: PathBuf,
    pub started_at: Instant,
}

pub const ACCESS_COOKIE: &str = "accessToken";
pub const REFRESH_COOKIE: &str = "refreshToken";

fn session_cookie(name: &'static str, value: String) -> Cookie<'static> {
    Cookie::build((name, value))
        .http_only(true)
        .secure(true)
        .path("/")
        .build()
}

pub fn hash_password(password: &str) -> Result<String, ApiError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| ApiError::internal(format!("password hashing failed: {e}")))
}

pub fn password_matches(password: &str, stored_hash: &str) -> Result<bool, ApiError> {
    let parsed = PasswordHash::new(stored_hash)
        .map_err(|e| ApiError::internal(format!("stored hash is malformed: {e}")))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

/// Register a new account. Multipart form: fullName, email, username, password
/// as text fields, an avatar file (required) and a coverImage file (optional).
pub async fn register(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    let form = FormData::read(multipart).await?;

    let full_name = form.require_text("fullName")?.trim().to_string();
    let email = form.require_text("email")?.trim().to_string();
    let username = form.require_text("username")?.trim().to_lowercase();
    let password = form.require_text("password")?.to_string();

    if !email.contains('@') {
        return Err(ApiError::validation("email is not valid"));
    }
    if password.len() < 8 {
        return Err(ApiError::validation(
            "password must be at least 8 characters",
        ));
    }

    {
        let (username, email) = (username.clone(), email.clone());
        if blocking(&state, move |db| db.identity_taken(&username, &email)).await? {
            return Err(ApiError::conflict(
                "user with email or username already exists",
            ));
        }
    }

    let avatar_bytes = form.require_file("avatar")?;
    if avatar_bytes.len() > MAX_IMAGE_SIZE {
        return Err(ApiError::validation("avatar file is too large"));
    }
    let avatar_path = stage_upload(&state.upload_dir, avatar_bytes).await?;
    let avatar = state.assets.upload(&avatar_path, AssetKind::Image).await?;

    let cover = match form.file("coverImage") {
        Some(bytes) => {
            if bytes.len() > MAX_IMAGE_SIZE {
                return Err(ApiError::validation("cover image file is too large"));
            }
            let path = stage_upload(&state.upload_dir, bytes).await?;
            Some(state.assets.upload(&path, AssetKind::Image).await?)
        }
        None => None,
    };

    let password_hash = hash_password(&password)?;
    let user_id = Uuid::new_v4();

    let user = {
        let (username, email, full_name) = (username.clone(), email, full_name);
        blocking(&state, move |db| {
            db.create_user(&NewUser {
                id: user_id,
                username: &username,
                email: &email,
                full_name: &full_name,
                password_hash: &password_hash,
                avatar_url: &avatar.url,
                avatar_asset_id: &avatar.asset_id,
                cover_image: cover
                    .as_ref()
                    .map(|c| (c.url.as_str(), c.asset_id.as_str())),
            })?;
            db.get_user_by_id(user_id)
        })
        .await?
        .ok_or_else(|| ApiError::internal("registered user not found"))?
    };

    info!("registered user {}", username);
    Ok((
        StatusCode::CREATED,
        Json(ApiEnvelope::created(
            user.into_user(),
            "user registered successfully",
        )),
    ))
}

/// Log in with username or email plus password. Sets both token cookies and
/// echoes the tokens in the body for non-browser clients.
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(req): Json<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if req.username.is_none() && req.email.is_none() {
        return Err(ApiError::validation("username or email is required"));
    }

    let row = {
        let (username, email) = (req.username.clone(), req.email.clone());
        blocking(&state, move |db| {
            db.get_user_by_login(username.as_deref(), email.as_deref())
        })
        .await?
        .ok_or_else(|| ApiError::not_found("user does not exist"))?
    };

    if !password_matches(&req.password, &row.password)? {
        return Err(ApiError::InvalidCredentials);
    }

    let user = row.into_user();
    let pair = issue_and_store_pair(&state, &user).await?;

    let jar = jar
        .add(session_cookie(ACCESS_COOKIE, pair.access_token.clone()))
        .add(session_cookie(REFRESH_COOKIE, pair.refresh_token.clone()));

    info!("user {} logged in", user.username);
    let data = LoginData {
        user,
        access_token: pair.access_token,
        refresh_token: pair.refresh_token,
    };
    Ok((jar, Json(ApiEnvelope::ok(data, "user logged in successfully"))))
}

/// Rotate the session. The presented refresh token must both verify and match
/// the single token stored for the user; anything else is a dead session.
pub async fn refresh_token(
    State(state): State<AppState>,
    jar: CookieJar,
    body: Option<Json<RefreshTokenRequest>>,
) -> Result<impl IntoResponse, ApiError> {
    let presented = jar
        .get(REFRESH_COOKIE)
        .map(|c| c.value().to_string())
        .or_else(|| body.and_then(|Json(b)| b.refresh_token))
        .ok_or_else(|| ApiError::unauthenticated("missing refresh token"))?;

    let claims = tokens::verify_refresh(&state.keys, &presented)?;

    let row = blocking(&state, move |db| db.get_user_by_id(claims.sub))
        .await?
        .ok_or_else(|| ApiError::unauthenticated("invalid refresh token"))?;

    if row.refresh_token.as_deref() != Some(presented.as_str()) {
        warn!("stale refresh token presented for user {}", row.username);
        return Err(ApiError::unauthenticated("refresh token expired"));
    }

    let user = row.into_user();
    let pair = issue_and_store_pair(&state, &user).await?;

    let jar = jar
        .add(session_cookie(ACCESS_COOKIE, pair.access_token.clone()))
        .add(session_cookie(REFRESH_COOKIE, pair.refresh_token.clone()));

    Ok((jar, Json(ApiEnvelope::ok(pair, "access token refreshed"))))
}

/// Clear the stored refresh token and both cookies.
pub async fn logout(
    State(state): State<AppState>,
    jar: CookieJar,
    CurrentUser(user): CurrentUser,
) -> Result<impl IntoResponse, ApiError> {
    blocking(&state, move |db| db.set_refresh_token(user.id, None)).await?;

    let jar = jar
        .remove(Cookie::build((ACCESS_COOKIE, "")).path("/"))
        .remove(Cookie::build((REFRESH_COOKIE, "")).path("/"));

    info!("user {} logged out", user.username);
    Ok((
        jar,
        Json(ApiEnvelope::ok(
            serde_json::json!({}),
            "user logged out successfully",
        )),
    ))
}

async fn issue_and_store_pair(state: &AppState, user: &User) -> Result<TokenPair, ApiError> {
    let access_token = tokens::issue_access_token(&state.keys, user)?;
    let refresh_token = tokens::issue_refresh_token(&state.keys, user.id)?;

    let user_id = user.id;
    let stored = refresh_token.clone();
    blocking(state, move |db| {
        db.set_refresh_token(user_id, Some(&stored))
    })
    .await?;

    Ok(TokenPair {
        access_token,
        refresh_token,
    })
}
