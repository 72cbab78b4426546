use anyhow::Result;
use rusqlite::params;
use uuid::Uuid;

use cliptube_types::models::ChannelStats;

use crate::Database;

impl Database {
    /// Aggregate channel stats for a user: totals over their videos and
    /// subscribers, plus the likes they have given, split by target type.
    pub fn channel_stats(&self, user_id: Uuid) -> Result<ChannelStats> {
        self.with_conn(|conn| {
            let uid = user_id.to_string();

            let (total_video_views, total_videos): (i64, i64) = conn.query_row(
                "SELECT COALESCE(SUM(views), 0), COUNT(*) FROM videos WHERE owner_id = ?1",
                [&uid],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )?;

            let subscribers: i64 = conn.query_row(
                "SELECT COUNT(*) FROM subscriptions WHERE channel_id = ?1",
                [&uid],
                |row| row.get(0),
            )?;

            let (total_video_likes, total_tweet_likes, total_comment_likes): (i64, i64, i64) =
                conn.query_row(
                    "SELECT \
                        COALESCE(SUM(video_id IS NOT NULL), 0), \
                        COALESCE(SUM(tweet_id IS NOT NULL), 0), \
                        COALESCE(SUM(comment_id IS NOT NULL), 0) \
                     FROM likes WHERE liked_by = ?1",
                    params![uid],
                    |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
                )?;

            Ok(ChannelStats {
                total_video_views,
                total_videos,
                subscribers,
                total_video_likes,
                total_tweet_likes,
                total_comment_likes,
            })
        })
    }
}
