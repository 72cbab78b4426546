use uuid::Uuid;

use crate::queries::users::NewUser;
use crate::queries::videos::NewVideo;
use crate::{CommentTarget, Database, LikeTarget, is_constraint_violation};

fn db() -> Database {
    Database::open_in_memory().unwrap()
}

fn seed_user(db: &Database, username: &str) -> Uuid {
    let id = Uuid::new_v4();
    db.create_user(&NewUser {
        id,
        username,
        email: &format!("{username}@example.com"),
        full_name: &format!("{username} name"),
        password_hash: "argon2-hash",
        avatar_url: "https://assets.example/avatar.png",
        avatar_asset_id: "avatar-asset",
        cover_image: None,
    })
    .unwrap();
    id
}

fn seed_video(db: &Database, owner: Uuid, title: &str) -> Uuid {
    let id = Uuid::new_v4();
    db.insert_video(&NewVideo {
        id,
        owner_id: owner,
        title,
        description: &format!("{title} description"),
        video_url: "https://assets.example/v.mp4",
        video_asset_id: "video-asset",
        thumbnail_url: "https://assets.example/t.jpg",
        thumbnail_asset_id: "thumb-asset",
        duration: 12.5,
        is_published: true,
    })
    .unwrap();
    id
}

#[test]
fn duplicate_username_is_constraint_violation() {
    let db = db();
    seed_user(&db, "alice");
    let err = db
        .create_user(&NewUser {
            id: Uuid::new_v4(),
            username: "alice",
            email: "other@example.com",
            full_name: "Other",
            password_hash: "h",
            avatar_url: "u",
            avatar_asset_id: "a",
            cover_image: None,
        })
        .unwrap_err();
    assert!(is_constraint_violation(&err));
    assert!(db.identity_taken("alice", "nobody@example.com").unwrap());
    assert!(!db.identity_taken("bob", "nobody@example.com").unwrap());
}

#[test]
fn login_lookup_matches_username_or_email() {
    let db = db();
    let id = seed_user(&db, "alice");

    let by_name = db.get_user_by_login(Some("alice"), None).unwrap().unwrap();
    assert_eq!(by_name.id, id);

    let by_email = db
        .get_user_by_login(None, Some("alice@example.com"))
        .unwrap()
        .unwrap();
    assert_eq!(by_email.id, id);

    assert!(db.get_user_by_login(Some("nobody"), None).unwrap().is_none());
}

#[test]
fn refresh_token_set_rotate_clear() {
    let db = db();
    let id = seed_user(&db, "alice");
    assert!(db.get_user_by_id(id).unwrap().unwrap().refresh_token.is_none());

    db.set_refresh_token(id, Some("first")).unwrap();
    assert_eq!(
        db.get_user_by_id(id).unwrap().unwrap().refresh_token.as_deref(),
        Some("first")
    );

    // Issuing a new token overwrites the old one
    db.set_refresh_token(id, Some("second")).unwrap();
    assert_eq!(
        db.get_user_by_id(id).unwrap().unwrap().refresh_token.as_deref(),
        Some("second")
    );

    db.set_refresh_token(id, None).unwrap();
    assert!(db.get_user_by_id(id).unwrap().unwrap().refresh_token.is_none());
}

#[test]
fn toggle_like_is_an_involution() {
    let db = db();
    let alice = seed_user(&db, "alice");
    let video = seed_video(&db, alice, "clip");

    let added = db
        .toggle_like(Uuid::new_v4(), alice, LikeTarget::Video(video))
        .unwrap();
    assert!(added);
    assert_eq!(db.like_count_for_video(video).unwrap(), 1);

    let added = db
        .toggle_like(Uuid::new_v4(), alice, LikeTarget::Video(video))
        .unwrap();
    assert!(!added);
    assert_eq!(db.like_count_for_video(video).unwrap(), 0);
}

#[test]
fn duplicate_like_row_rejected_by_unique_index() {
    let db = db();
    let alice = seed_user(&db, "alice");
    let video = seed_video(&db, alice, "clip");
    db.toggle_like(Uuid::new_v4(), alice, LikeTarget::Video(video))
        .unwrap();

    // Bypass the toggle and insert the same (user, video) pair directly
    let err = db
        .with_conn(|conn| {
            conn.execute(
                "INSERT INTO likes (id, liked_by, video_id) VALUES (?1, ?2, ?3)",
                rusqlite::params![
                    Uuid::new_v4().to_string(),
                    alice.to_string(),
                    video.to_string()
                ],
            )?;
            Ok(())
        })
        .unwrap_err();
    assert!(is_constraint_violation(&err));
}

#[test]
fn comment_requires_exactly_one_parent() {
    let db = db();
    let alice = seed_user(&db, "alice");
    let video = seed_video(&db, alice, "clip");

    let err = db
        .with_conn(|conn| {
            conn.execute(
                "INSERT INTO comments (id, owner_id, content, video_id, tweet_id) \
                 VALUES (?1, ?2, 'x', ?3, ?3)",
                rusqlite::params![
                    Uuid::new_v4().to_string(),
                    alice.to_string(),
                    video.to_string()
                ],
            )?;
            Ok(())
        })
        .unwrap_err();
    assert!(is_constraint_violation(&err));
}

#[test]
fn toggle_subscription_is_an_involution() {
    let db = db();
    let alice = seed_user(&db, "alice");
    let bob = seed_user(&db, "bob");

    assert!(db.toggle_subscription(Uuid::new_v4(), bob, alice).unwrap());
    assert!(db.is_subscribed(bob, alice).unwrap());

    assert!(!db.toggle_subscription(Uuid::new_v4(), bob, alice).unwrap());
    assert!(!db.is_subscribed(bob, alice).unwrap());
}

#[test]
fn channel_profile_counts_and_viewer_flag() {
    let db = db();
    let alice = seed_user(&db, "alice");
    let bob = seed_user(&db, "bob");
    let carol = seed_user(&db, "carol");

    db.toggle_subscription(Uuid::new_v4(), bob, alice).unwrap();
    db.toggle_subscription(Uuid::new_v4(), carol, alice).unwrap();
    db.toggle_subscription(Uuid::new_v4(), alice, bob).unwrap();

    let profile = db.channel_profile("alice", bob).unwrap().unwrap();
    assert_eq!(profile.subscribers_count, 2);
    assert_eq!(profile.channel_subscribed_to_count, 1);
    assert!(profile.is_subscribed);

    let profile = db.channel_profile("bob", carol).unwrap().unwrap();
    assert_eq!(profile.subscribers_count, 1);
    assert!(!profile.is_subscribed);

    assert!(db.channel_profile("nobody", bob).unwrap().is_none());
}

#[test]
fn subscriber_listings_join_user_profiles() {
    let db = db();
    let alice = seed_user(&db, "alice");
    let bob = seed_user(&db, "bob");
    let carol = seed_user(&db, "carol");
    db.toggle_subscription(Uuid::new_v4(), bob, alice).unwrap();
    db.toggle_subscription(Uuid::new_v4(), carol, alice).unwrap();
    db.toggle_subscription(Uuid::new_v4(), bob, carol).unwrap();

    let subs = db.channel_subscribers(alice).unwrap();
    let names: Vec<_> = subs.iter().map(|s| s.username.as_str()).collect();
    assert_eq!(subs.len(), 2);
    assert!(names.contains(&"bob") && names.contains(&"carol"));

    let channels = db.subscribed_channels(bob).unwrap();
    let names: Vec<_> = channels.iter().map(|c| c.username.as_str()).collect();
    assert_eq!(names.len(), 2);
    assert!(names.contains(&"alice") && names.contains(&"carol"));
}

#[test]
fn watch_history_keeps_watch_order_and_rewatch_moves_to_end() {
    let db = db();
    let alice = seed_user(&db, "alice");
    let bob = seed_user(&db, "bob");
    let v1 = seed_video(&db, bob, "first");
    let v2 = seed_video(&db, bob, "second");
    let v3 = seed_video(&db, bob, "third");

    db.record_watch(alice, v1).unwrap();
    db.record_watch(alice, v2).unwrap();
    db.record_watch(alice, v3).unwrap();

    let history = db.watch_history(alice).unwrap();
    let ids: Vec<_> = history.iter().map(|e| e.video.id).collect();
    assert_eq!(ids, vec![v1, v2, v3]);
    assert_eq!(history[0].owner.username, "bob");

    db.record_watch(alice, v1).unwrap();
    let ids: Vec<_> = db
        .watch_history(alice)
        .unwrap()
        .iter()
        .map(|e| e.video.id)
        .collect();
    assert_eq!(ids, vec![v2, v3, v1]);
}

#[test]
fn liked_videos_flattens_to_videos_with_owner() {
    let db = db();
    let alice = seed_user(&db, "alice");
    let bob = seed_user(&db, "bob");
    let video = seed_video(&db, bob, "clip");
    let tweet = Uuid::new_v4();
    db.insert_tweet(tweet, bob, "hello").unwrap();

    db.toggle_like(Uuid::new_v4(), alice, LikeTarget::Video(video))
        .unwrap();
    db.toggle_like(Uuid::new_v4(), alice, LikeTarget::Tweet(tweet))
        .unwrap();

    let liked = db.liked_videos(alice).unwrap();
    assert_eq!(liked.len(), 1);
    assert_eq!(liked[0].video.id, video);
    assert_eq!(liked[0].owner.username, "bob");
}

#[test]
fn search_videos_filters_and_paginates_in_query() {
    let db = db();
    let alice = seed_user(&db, "alice");
    for title in ["alpha cats", "beta cats", "gamma cats", "delta dogs"] {
        seed_video(&db, alice, title);
    }

    let (all, total) = db
        .search_videos(Some(alice), Some("cats"), Some("title"), true, 1, 10)
        .unwrap();
    assert_eq!(total, 3);
    let titles: Vec<_> = all.iter().map(|v| v.title.as_str()).collect();
    assert_eq!(titles, vec!["alpha cats", "beta cats", "gamma cats"]);

    // Second page of two
    let (page, total) = db
        .search_videos(Some(alice), Some("cats"), Some("title"), true, 2, 2)
        .unwrap();
    assert_eq!(total, 3);
    assert_eq!(page.len(), 1);
    assert_eq!(page[0].title, "gamma cats");

    // Case-insensitive match against description too
    let (hits, _) = db
        .search_videos(Some(alice), Some("DOGS"), None, false, 1, 10)
        .unwrap();
    assert_eq!(hits.len(), 1);

    // Other owners never leak in
    let bob = seed_user(&db, "bob");
    let (none, total) = db
        .search_videos(Some(bob), Some("cats"), None, true, 1, 10)
        .unwrap();
    assert!(none.is_empty());
    assert_eq!(total, 0);
}

#[test]
fn video_partial_update_keeps_unset_fields() {
    let db = db();
    let alice = seed_user(&db, "alice");
    let id = seed_video(&db, alice, "clip");

    let n = db
        .update_video_details(id, Some("renamed"), None, None)
        .unwrap();
    assert_eq!(n, 1);

    let video = db.get_video(id).unwrap().unwrap();
    assert_eq!(video.title, "renamed");
    assert_eq!(video.description, "clip description");
    assert_eq!(video.thumbnail_asset_id, "thumb-asset");
}

#[test]
fn playlist_membership_is_ordered_and_duplicates_rejected() {
    let db = db();
    let alice = seed_user(&db, "alice");
    let v1 = seed_video(&db, alice, "one");
    let v2 = seed_video(&db, alice, "two");
    let playlist = Uuid::new_v4();
    db.create_playlist(playlist, alice, "favs", "the good ones")
        .unwrap();

    db.add_video_to_playlist(playlist, v1).unwrap();
    db.add_video_to_playlist(playlist, v2).unwrap();
    assert!(db.playlist_contains(playlist, v1).unwrap());

    let err = db.add_video_to_playlist(playlist, v1).unwrap_err();
    assert!(is_constraint_violation(&err));

    let lists = db.playlists_by_owner(alice).unwrap();
    assert_eq!(lists.len(), 1);
    let ids: Vec<_> = lists[0].videos.iter().map(|v| v.id).collect();
    assert_eq!(ids, vec![v1, v2]);

    assert_eq!(db.remove_video_from_playlist(playlist, v1).unwrap(), 1);
    assert_eq!(db.remove_video_from_playlist(playlist, v1).unwrap(), 0);
}

#[test]
fn comment_listing_paginates_with_author() {
    let db = db();
    let alice = seed_user(&db, "alice");
    let video = seed_video(&db, alice, "clip");
    for i in 0..5 {
        db.insert_comment(
            Uuid::new_v4(),
            alice,
            &format!("comment {i}"),
            CommentTarget::Video(video),
        )
        .unwrap();
    }

    let (page, total) = db.comments_for_video(video, 1, 3).unwrap();
    assert_eq!(total, 5);
    assert_eq!(page.len(), 3);
    assert_eq!(page[0].owner.username, "alice");

    let (rest, _) = db.comments_for_video(video, 2, 3).unwrap();
    assert_eq!(rest.len(), 2);

    let (none, total) = db.comments_for_tweet(Uuid::new_v4(), 1, 10).unwrap();
    assert!(none.is_empty());
    assert_eq!(total, 0);
}

#[test]
fn deleting_a_video_cascades_dependent_rows() {
    let db = db();
    let alice = seed_user(&db, "alice");
    let video = seed_video(&db, alice, "clip");
    db.insert_comment(Uuid::new_v4(), alice, "nice", CommentTarget::Video(video))
        .unwrap();
    db.toggle_like(Uuid::new_v4(), alice, LikeTarget::Video(video))
        .unwrap();
    db.record_watch(alice, video).unwrap();

    assert_eq!(db.delete_video(video).unwrap(), 1);
    assert_eq!(db.like_count_for_video(video).unwrap(), 0);
    let (comments, _) = db.comments_for_video(video, 1, 10).unwrap();
    assert!(comments.is_empty());
    assert!(db.watch_history(alice).unwrap().is_empty());
}

#[test]
fn channel_stats_aggregates() {
    let db = db();
    let alice = seed_user(&db, "alice");
    let bob = seed_user(&db, "bob");
    let v1 = seed_video(&db, alice, "one");
    let v2 = seed_video(&db, alice, "two");
    db.increment_views(v1).unwrap();
    db.increment_views(v1).unwrap();
    db.increment_views(v2).unwrap();

    db.toggle_subscription(Uuid::new_v4(), bob, alice).unwrap();

    let tweet = Uuid::new_v4();
    db.insert_tweet(tweet, bob, "hi").unwrap();
    db.toggle_like(Uuid::new_v4(), alice, LikeTarget::Video(v1))
        .unwrap();
    db.toggle_like(Uuid::new_v4(), alice, LikeTarget::Tweet(tweet))
        .unwrap();

    let stats = db.channel_stats(alice).unwrap();
    assert_eq!(stats.total_video_views, 3);
    assert_eq!(stats.total_videos, 2);
    assert_eq!(stats.subscribers, 1);
    assert_eq!(stats.total_video_likes, 1);
    assert_eq!(stats.total_tweet_likes, 1);
    assert_eq!(stats.total_comment_likes, 0);
}
