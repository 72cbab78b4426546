use anyhow::Result;
use rusqlite::params;
use uuid::Uuid;

use cliptube_types::models::OwnerSummary;

use crate::Database;
use crate::models::{self, OWNER_COLS};
use crate::queries::users::{OptionalExt, prefixed};

impl Database {
    /// Toggle a subscription; returns true when the subscription was created.
    /// Same transactional shape as the like toggle, with the unique
    /// (subscriber, channel) index as the back-stop.
    pub fn toggle_subscription(
        &self,
        id: Uuid,
        subscriber_id: Uuid,
        channel_id: Uuid,
    ) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            let existing: Option<String> = tx
                .query_row(
                    "SELECT id FROM subscriptions WHERE subscriber_id = ?1 AND channel_id = ?2",
                    params![subscriber_id.to_string(), channel_id.to_string()],
                    |row| row.get(0),
                )
                .optional()?;

            let subscribed = match existing {
                Some(existing_id) => {
                    tx.execute("DELETE FROM subscriptions WHERE id = ?1", [&existing_id])?;
                    false
                }
                None => {
                    tx.execute(
                        "INSERT INTO subscriptions (id, subscriber_id, channel_id) \
                         VALUES (?1, ?2, ?3)",
                        params![
                            id.to_string(),
                            subscriber_id.to_string(),
                            channel_id.to_string()
                        ],
                    )?;
                    true
                }
            };

            tx.commit()?;
            Ok(subscribed)
        })
    }

    pub fn is_subscribed(&self, subscriber_id: Uuid, channel_id: Uuid) -> Result<bool> {
        self.with_conn(|conn| {
            let n: i64 = conn.query_row(
                "SELECT COUNT(*) FROM subscriptions \
                 WHERE subscriber_id = ?1 AND channel_id = ?2",
                params![subscriber_id.to_string(), channel_id.to_string()],
                |row| row.get(0),
            )?;
            Ok(n > 0)
        })
    }

    /// Profiles of everyone subscribed to a channel.
    pub fn channel_subscribers(&self, channel_id: Uuid) -> Result<Vec<OwnerSummary>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {} \
                 FROM subscriptions s \
                 JOIN users u ON u.id = s.subscriber_id \
                 WHERE s.channel_id = ?1 \
                 ORDER BY s.created_at",
                prefixed(OWNER_COLS, "u"),
            ))?;
            let rows = stmt
                .query_map([channel_id.to_string()], |row| models::owner_at(row, 0))?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Profiles of every channel a user subscribes to.
    pub fn subscribed_channels(&self, subscriber_id: Uuid) -> Result<Vec<OwnerSummary>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {} \
                 FROM subscriptions s \
                 JOIN users u ON u.id = s.channel_id \
                 WHERE s.subscriber_id = ?1 \
                 ORDER BY s.created_at",
                prefixed(OWNER_COLS, "u"),
            ))?;
            let rows = stmt
                .query_map([subscriber_id.to_string()], |row| models::owner_at(row, 0))?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }
}
