use std::path::PathBuf;

use axum::body::Body;
use axum::extract::Path;
use axum::http::{Request, StatusCode, header};
use axum::routing::{delete, post};
use axum::{Json, Router};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;
use uuid::Uuid;

use cliptube_server::{Config, build_router, build_state};

/// Stand-in for the asset host: every upload succeeds with a fresh asset id.
async fn spawn_asset_host() -> String {
    async fn upload() -> Json<Value> {
        let id = Uuid::new_v4();
        Json(json!({
            "assetId": id.to_string(),
            "url": format!("http://assets.test/{id}"),
            "duration": 4.2,
        }))
    }
    async fn remove(Path(_id): Path<String>) -> StatusCode {
        StatusCode::OK
    }

    let app = Router::new()
        .route("/upload", post(upload))
        .route("/assets/{id}", delete(remove));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

async fn test_app() -> Router {
    let asset_host_url = spawn_asset_host().await;
    let config = Config {
        host: "127.0.0.1".into(),
        port: 0,
        db_path: PathBuf::new(),
        asset_host_url,
        upload_dir: std::env::temp_dir().join(format!("cliptube-test-{}", Uuid::new_v4())),
        access_secret: "test-access-secret".into(),
        refresh_secret: "test-refresh-secret".into(),
        access_ttl_minutes: 15,
        refresh_ttl_days: 10,
    };
    let db = cliptube_db::Database::open_in_memory().unwrap();
    build_router(build_state(&config, db))
}

const BOUNDARY: &str = "cliptube-test-boundary";

fn multipart_form(fields: &[(&str, &str)], with_avatar: bool) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
    }
    if with_avatar {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"avatar\"; \
                 filename=\"avatar.png\"\r\nContent-Type: image/png\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(b"not-really-a-png");
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

fn register_body(full_name: &str, email: &str, username: &str, password: &str) -> Vec<u8> {
    multipart_form(
        &[
            ("fullName", full_name),
            ("email", email),
            ("username", username),
            ("password", password),
        ],
        true,
    )
}

async fn register(app: &Router, username: &str) -> Value {
    let request = Request::post("/api/v1/users/register")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(register_body(
            "Test User",
            &format!("{username}@example.com"),
            username,
            "a-long-password",
        )))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    body_json(response).await
}

async fn login(app: &Router, username: &str, password: &str) -> axum::response::Response {
    let request = Request::post("/api/v1/users/login")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(
            json!({ "username": username, "password": password }).to_string(),
        ))
        .unwrap();
    app.clone().oneshot(request).await.unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

fn cookies(response: &axum::response::Response) -> String {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .filter_map(|v| v.split(';').next())
        .collect::<Vec<_>>()
        .join("; ")
}

#[tokio::test]
async fn register_login_logout_round_trip() {
    let app = test_app().await;

    let registered = register(&app, "alice").await;
    assert_eq!(registered["statuscode"], 201);
    assert_eq!(registered["data"]["username"], "alice");
    assert!(registered["data"].get("password").is_none());

    let response = login(&app, "alice", "a-long-password").await;
    assert_eq!(response.status(), StatusCode::OK);
    let session = cookies(&response);
    assert!(session.contains("accessToken="));
    assert!(session.contains("refreshToken="));
    let body = body_json(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["user"]["username"], "alice");

    let request = Request::get("/api/v1/users/current-user")
        .header(header::COOKIE, &session)
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["username"], "alice");

    let request = Request::post("/api/v1/users/logout")
        .header(header::COOKIE, &session)
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // The stored refresh token was cleared, so the old cookie is dead.
    let request = Request::post("/api/v1/users/refresh-token")
        .header(header::COOKIE, &session)
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn login_failures_distinguish_unknown_user_from_bad_password() {
    let app = test_app().await;
    register(&app, "bob").await;

    let response = login(&app, "bob", "wrong-password").await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = login(&app, "nobody", "a-long-password").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn duplicate_registration_conflicts() {
    let app = test_app().await;
    register(&app, "carol").await;

    let request = Request::post("/api/v1/users/register")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(register_body(
            "Carol Again",
            "carol@example.com",
            "carol",
            "a-long-password",
        )))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn protected_routes_reject_missing_and_garbage_tokens() {
    let app = test_app().await;

    let request = Request::get("/api/v1/users/current-user")
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(response).await;
    assert_eq!(body["success"], false);

    let request = Request::get("/api/v1/users/current-user")
        .header(header::AUTHORIZATION, "Bearer not-a-jwt")
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn refresh_rotates_the_stored_token() {
    let app = test_app().await;
    register(&app, "dave").await;

    let response = login(&app, "dave", "a-long-password").await;
    let first_session = cookies(&response);

    let request = Request::post("/api/v1/users/refresh-token")
        .header(header::COOKIE, &first_session)
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let second_session = cookies(&response);
    assert!(second_session.contains("refreshToken="));

    // Rotation invalidates the first refresh token.
    let request = Request::post("/api/v1/users/refresh-token")
        .header(header::COOKIE, &first_session)
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    // The rotated one still works.
    let request = Request::post("/api/v1/users/refresh-token")
        .header(header::COOKIE, &second_session)
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn registration_validation_rejects_bad_input() {
    let app = test_app().await;

    // One violation per rule: missing username, short password, bad email,
    // missing avatar file.
    let attempts: [(&[(&str, &str)], bool); 4] = [
        (
            &[
                ("fullName", "Frank Test"),
                ("email", "frank@example.com"),
                ("password", "a-long-password"),
            ],
            true,
        ),
        (
            &[
                ("fullName", "Frank Test"),
                ("email", "frank@example.com"),
                ("username", "frank"),
                ("password", "short"),
            ],
            true,
        ),
        (
            &[
                ("fullName", "Frank Test"),
                ("email", "frank.example.com"),
                ("username", "frank"),
                ("password", "a-long-password"),
            ],
            true,
        ),
        (
            &[
                ("fullName", "Frank Test"),
                ("email", "frank@example.com"),
                ("username", "frank"),
                ("password", "a-long-password"),
            ],
            false,
        ),
    ];

    for (fields, with_avatar) in attempts {
        let request = Request::post("/api/v1/users/register")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(multipart_form(fields, with_avatar)))
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["success"], false);
    }

    // None of the rejected attempts left a user record behind.
    let response = login(&app, "frank", "a-long-password").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn video_listing_for_unknown_user_is_not_found() {
    let app = test_app().await;
    register(&app, "grace").await;
    let body = body_json(login(&app, "grace", "a-long-password").await).await;
    let bearer = format!("Bearer {}", body["data"]["accessToken"].as_str().unwrap());

    let request = Request::get(format!("/api/v1/videos?userId={}", Uuid::new_v4()))
        .header(header::AUTHORIZATION, &bearer)
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    // The caller's own (empty) listing still works.
    let request = Request::get("/api/v1/videos")
        .header(header::AUTHORIZATION, &bearer)
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["totalDocs"], 0);
}

#[tokio::test]
async fn tweet_comment_like_flow_over_bearer_auth() {
    let app = test_app().await;
    register(&app, "erin").await;
    let body = body_json(login(&app, "erin", "a-long-password").await).await;
    let bearer = format!("Bearer {}", body["data"]["accessToken"].as_str().unwrap());

    let request = Request::post("/api/v1/tweets")
        .header(header::AUTHORIZATION, &bearer)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(json!({ "content": "first!" }).to_string()))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let tweet = body_json(response).await;
    let tweet_id = tweet["data"]["id"].as_str().unwrap().to_string();

    let request = Request::post(format!("/api/v1/comments/tweet/{tweet_id}"))
        .header(header::AUTHORIZATION, &bearer)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(json!({ "comment": "nice" }).to_string()))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    // Like toggles on, then off.
    for expected in [true, false] {
        let request = Request::post(format!("/api/v1/likes/toggle/t/{tweet_id}"))
            .header(header::AUTHORIZATION, &bearer)
            .body(Body::empty())
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["data"]["liked"], expected);
    }

    // Liking something that does not exist is a 404.
    let request = Request::post(format!("/api/v1/likes/toggle/v/{}", Uuid::new_v4()))
        .header(header::AUTHORIZATION, &bearer)
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
