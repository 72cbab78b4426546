use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};

use cliptube_types::api::{AccessClaims, RefreshClaims};
use cliptube_types::models::User;

use crate::error::ApiError;

/// Signing material and lifetimes for both token kinds. Access and refresh
/// tokens use separate secrets so one can never be presented as the other.
#[derive(Debug, Clone)]
pub struct TokenKeys {
    pub access_secret: String,
    pub refresh_secret: String,
    pub access_ttl: Duration,
    pub refresh_ttl: Duration,
}

/// Access tokens carry enough identity to render the session without a
/// lookup; short-lived.
pub fn issue_access_token(keys: &TokenKeys, user: &User) -> anyhow::Result<String> {
    let claims = AccessClaims {
        sub: user.id,
        username: user.username.clone(),
        email: user.email.clone(),
        full_name: user.full_name.clone(),
        exp: (Utc::now() + keys.access_ttl).timestamp() as usize,
    };
    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(keys.access_secret.as_bytes()),
    )?;
    Ok(token)
}

/// Refresh tokens carry only the user id; long-lived.
pub fn issue_refresh_token(keys: &TokenKeys, user_id: uuid::Uuid) -> anyhow::Result<String> {
    let claims = RefreshClaims {
        sub: user_id,
        exp: (Utc::now() + keys.refresh_ttl).timestamp() as usize,
    };
    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(keys.refresh_secret.as_bytes()),
    )?;
    Ok(token)
}

pub fn verify_access(keys: &TokenKeys, token: &str) -> Result<AccessClaims, ApiError> {
    decode::<AccessClaims>(
        token,
        &DecodingKey::from_secret(keys.access_secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|_| ApiError::unauthenticated("invalid access token"))
}

pub fn verify_refresh(keys: &TokenKeys, token: &str) -> Result<RefreshClaims, ApiError> {
    decode::<RefreshClaims>(
        token,
        &DecodingKey::from_secret(keys.refresh_secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|_| ApiError::unauthenticated("invalid refresh token"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn keys() -> TokenKeys {
        TokenKeys {
            access_secret: "access-secret".into(),
            refresh_secret: "refresh-secret".into(),
            access_ttl: Duration::minutes(15),
            refresh_ttl: Duration::days(10),
        }
    }

    fn user() -> User {
        User {
            id: Uuid::new_v4(),
            username: "alice".into(),
            email: "a@x.com".into(),
            full_name: "Alice".into(),
            avatar: "https://assets.example/a.png".into(),
            cover_image: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn access_token_round_trip() {
        let keys = keys();
        let user = user();
        let token = issue_access_token(&keys, &user).unwrap();
        let claims = verify_access(&keys, &token).unwrap();
        assert_eq!(claims.sub, user.id);
        assert_eq!(claims.username, "alice");
        assert_eq!(claims.email, "a@x.com");
    }

    #[test]
    fn refresh_token_round_trip() {
        let keys = keys();
        let id = Uuid::new_v4();
        let token = issue_refresh_token(&keys, id).unwrap();
        let claims = verify_refresh(&keys, &token).unwrap();
        assert_eq!(claims.sub, id);
    }

    #[test]
    fn expired_token_is_rejected() {
        let mut keys = keys();
        keys.access_ttl = Duration::seconds(-120);
        let token = issue_access_token(&keys, &user()).unwrap();
        assert!(verify_access(&keys, &token).is_err());
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let keys = keys();
        let token = issue_access_token(&keys, &user()).unwrap();
        let mut other = keys.clone();
        other.access_secret = "different".into();
        assert!(verify_access(&other, &token).is_err());
    }

    #[test]
    fn refresh_token_is_not_an_access_token() {
        let keys = keys();
        let token = issue_refresh_token(&keys, Uuid::new_v4()).unwrap();
        assert!(verify_access(&keys, &token).is_err());
    }
}
