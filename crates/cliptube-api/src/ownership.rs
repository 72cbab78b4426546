use uuid::Uuid;

use cliptube_db::models::VideoRow;
use cliptube_types::models::{Comment, Playlist, Tweet};

use crate::error::ApiError;

/// Entities that belong to a single user. Mutations go through
/// [`ensure_owner`] before touching storage.
pub trait Owned {
    fn owner_id(&self) -> Uuid;
}

impl Owned for VideoRow {
    fn owner_id(&self) -> Uuid {
        self.owner_id
    }
}

impl Owned for Tweet {
    fn owner_id(&self) -> Uuid {
        self.owner_id
    }
}

impl Owned for Comment {
    fn owner_id(&self) -> Uuid {
        self.owner_id
    }
}

impl Owned for Playlist {
    fn owner_id(&self) -> Uuid {
        self.owner_id
    }
}

pub fn ensure_owner<T: Owned>(entity: &T, user_id: Uuid, action: &str) -> Result<(), ApiError> {
    if entity.owner_id() != user_id {
        return Err(ApiError::forbidden(format!(
            "you don't have permission to {action}"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn non_owner_is_rejected() {
        let tweet = Tweet {
            id: Uuid::new_v4(),
            owner_id: Uuid::new_v4(),
            content: "hi".into(),
            created_at: Utc::now(),
        };
        assert!(ensure_owner(&tweet, tweet.owner_id, "edit this tweet").is_ok());
        let err = ensure_owner(&tweet, Uuid::new_v4(), "edit this tweet").unwrap_err();
        assert_eq!(err.status(), axum::http::StatusCode::FORBIDDEN);
    }
}
