use anyhow::Result;
use rusqlite::params;
use uuid::Uuid;

use cliptube_types::models::Tweet;

use crate::Database;
use crate::models::{TWEET_COLS, tweet_from_row};
use crate::queries::users::OptionalExt;

impl Database {
    pub fn insert_tweet(&self, id: Uuid, owner_id: Uuid, content: &str) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO tweets (id, owner_id, content) VALUES (?1, ?2, ?3)",
                params![id.to_string(), owner_id.to_string(), content],
            )?;
            Ok(())
        })
    }

    pub fn get_tweet(&self, id: Uuid) -> Result<Option<Tweet>> {
        self.with_conn(|conn| {
            let mut stmt =
                conn.prepare(&format!("SELECT {TWEET_COLS} FROM tweets WHERE id = ?1"))?;
            let row = stmt.query_row([id.to_string()], tweet_from_row).optional()?;
            Ok(row)
        })
    }

    pub fn tweets_by_owner(&self, owner_id: Uuid) -> Result<Vec<Tweet>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {TWEET_COLS} FROM tweets WHERE owner_id = ?1 ORDER BY created_at DESC"
            ))?;
            let rows = stmt
                .query_map([owner_id.to_string()], tweet_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn update_tweet(&self, id: Uuid, content: &str) -> Result<usize> {
        self.with_conn(|conn| {
            let n = conn.execute(
                "UPDATE tweets SET content = ?2 WHERE id = ?1",
                params![id.to_string(), content],
            )?;
            Ok(n)
        })
    }

    pub fn delete_tweet(&self, id: Uuid) -> Result<usize> {
        self.with_conn(|conn| {
            let n = conn.execute("DELETE FROM tweets WHERE id = ?1", [id.to_string()])?;
            Ok(n)
        })
    }
}
