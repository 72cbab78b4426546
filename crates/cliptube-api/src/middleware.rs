use axum::extract::{FromRequestParts, Request, State};
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum::middleware::Next;
use axum::response::Response;
use axum_extra::extract::cookie::CookieJar;

use cliptube_types::models::User;

use crate::auth::{ACCESS_COOKIE, AppState};
use crate::error::ApiError;
use crate::{blocking, tokens};

/// The authenticated user, inserted by [`require_auth`] and pulled out of
/// request extensions by handlers.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

impl<S: Send + Sync> FromRequestParts<S> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CurrentUser>()
            .cloned()
            .ok_or_else(|| ApiError::unauthenticated("unauthorized request"))
    }
}

/// Auth gate for every protected route. Accepts the access token from the
/// session cookie or an `Authorization: Bearer` header, verifies it, and
/// loads the live user record so deleted accounts lock out immediately.
pub async fn require_auth(
    State(state): State<AppState>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = jar
        .get(ACCESS_COOKIE)
        .map(|c| c.value().to_string())
        .or_else(|| bearer_token(&request))
        .ok_or_else(|| ApiError::unauthenticated("unauthorized request"))?;

    let claims = tokens::verify_access(&state.keys, &token)?;

    let row = blocking(&state, move |db| db.get_user_by_id(claims.sub))
        .await?
        .ok_or_else(|| ApiError::unauthenticated("invalid access token"))?;

    request.extensions_mut().insert(CurrentUser(row.into_user()));
    Ok(next.run(request).await)
}

fn bearer_token(request: &Request) -> Option<String> {
    request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::to_string)
}
