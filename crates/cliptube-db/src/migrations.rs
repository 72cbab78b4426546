use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS users (
            id                    TEXT PRIMARY KEY,
            username              TEXT NOT NULL UNIQUE,
            email                 TEXT NOT NULL UNIQUE,
            full_name             TEXT NOT NULL,
            password              TEXT NOT NULL,
            avatar_url            TEXT NOT NULL,
            avatar_asset_id       TEXT NOT NULL,
            cover_image_url       TEXT,
            cover_image_asset_id  TEXT,
            refresh_token         TEXT,
            created_at            TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS videos (
            id                  TEXT PRIMARY KEY,
            owner_id            TEXT NOT NULL REFERENCES users(id),
            title               TEXT NOT NULL,
            description         TEXT NOT NULL,
            video_url           TEXT NOT NULL,
            video_asset_id      TEXT NOT NULL,
            thumbnail_url       TEXT NOT NULL,
            thumbnail_asset_id  TEXT NOT NULL,
            duration            REAL NOT NULL DEFAULT 0,
            views               INTEGER NOT NULL DEFAULT 0,
            is_published        INTEGER NOT NULL DEFAULT 1,
            created_at          TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX IF NOT EXISTS idx_videos_owner
            ON videos(owner_id, created_at);

        CREATE TABLE IF NOT EXISTS tweets (
            id          TEXT PRIMARY KEY,
            owner_id    TEXT NOT NULL REFERENCES users(id),
            content     TEXT NOT NULL,
            created_at  TEXT NOT NULL DEFAULT (datetime('now'))
        );

        -- A comment attaches to exactly one parent entity.
        CREATE TABLE IF NOT EXISTS comments (
            id          TEXT PRIMARY KEY,
            owner_id    TEXT NOT NULL REFERENCES users(id),
            content     TEXT NOT NULL,
            video_id    TEXT REFERENCES videos(id) ON DELETE CASCADE,
            tweet_id    TEXT REFERENCES tweets(id) ON DELETE CASCADE,
            created_at  TEXT NOT NULL DEFAULT (datetime('now')),
            CHECK ((video_id IS NULL) != (tweet_id IS NULL))
        );

        CREATE INDEX IF NOT EXISTS idx_comments_video
            ON comments(video_id, created_at);
        CREATE INDEX IF NOT EXISTS idx_comments_tweet
            ON comments(tweet_id, created_at);

        -- Row presence IS the liked state. The partial unique indexes are the
        -- arbiter under concurrent toggles.
        CREATE TABLE IF NOT EXISTS likes (
            id          TEXT PRIMARY KEY,
            liked_by    TEXT NOT NULL REFERENCES users(id),
            video_id    TEXT REFERENCES videos(id) ON DELETE CASCADE,
            comment_id  TEXT REFERENCES comments(id) ON DELETE CASCADE,
            tweet_id    TEXT REFERENCES tweets(id) ON DELETE CASCADE,
            created_at  TEXT NOT NULL DEFAULT (datetime('now')),
            CHECK ((video_id IS NOT NULL) + (comment_id IS NOT NULL) + (tweet_id IS NOT NULL) = 1)
        );

        CREATE UNIQUE INDEX IF NOT EXISTS idx_likes_video
            ON likes(liked_by, video_id) WHERE video_id IS NOT NULL;
        CREATE UNIQUE INDEX IF NOT EXISTS idx_likes_comment
            ON likes(liked_by, comment_id) WHERE comment_id IS NOT NULL;
        CREATE UNIQUE INDEX IF NOT EXISTS idx_likes_tweet
            ON likes(liked_by, tweet_id) WHERE tweet_id IS NOT NULL;

        CREATE TABLE IF NOT EXISTS subscriptions (
            id             TEXT PRIMARY KEY,
            subscriber_id  TEXT NOT NULL REFERENCES users(id),
            channel_id     TEXT NOT NULL REFERENCES users(id),
            created_at     TEXT NOT NULL DEFAULT (datetime('now')),
            UNIQUE(subscriber_id, channel_id)
        );

        CREATE INDEX IF NOT EXISTS idx_subscriptions_channel
            ON subscriptions(channel_id);

        CREATE TABLE IF NOT EXISTS playlists (
            id          TEXT PRIMARY KEY,
            owner_id    TEXT NOT NULL REFERENCES users(id),
            name        TEXT NOT NULL,
            description TEXT NOT NULL DEFAULT '',
            created_at  TEXT NOT NULL DEFAULT (datetime('now'))
        );

        -- Ordered membership; the primary key rejects duplicate videos.
        CREATE TABLE IF NOT EXISTS playlist_videos (
            playlist_id  TEXT NOT NULL REFERENCES playlists(id) ON DELETE CASCADE,
            video_id     TEXT NOT NULL REFERENCES videos(id) ON DELETE CASCADE,
            position     INTEGER NOT NULL,
            PRIMARY KEY (playlist_id, video_id)
        );

        -- seq gives a stable watch order; re-watching replaces the row and
        -- moves it to the end.
        CREATE TABLE IF NOT EXISTS watch_history (
            seq         INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id     TEXT NOT NULL REFERENCES users(id),
            video_id    TEXT NOT NULL REFERENCES videos(id) ON DELETE CASCADE,
            watched_at  TEXT NOT NULL DEFAULT (datetime('now')),
            UNIQUE(user_id, video_id)
        );
        ",
    )?;

    info!("Database migrations complete");
    Ok(())
}
