//! End-to-end tests: full request/response cycles through the router,
//! backed by an in-memory database.
use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::util::ServiceExt;

use messagely_api::password::PasswordHasher;
use messagely_api::token::TokenIssuer;
use messagely_api::{AppStateInner, router};
use messagely_db::Database;

fn create_test_app() -> Router {
    let state = AppStateInner::new(
        Database::open_in_memory().unwrap(),
        PasswordHasher::with_memory(1, 256).unwrap(),
        TokenIssuer::new(b"http-test-secret", Some(chrono::Duration::hours(1))),
    );
    router(state)
}

async fn send(app: &Router, method: &str, uri: &str, token: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, value)
}

async fn register(app: &Router, username: &str) -> String {
    let (status, body) = send(
        app,
        "POST",
        "/auth/register",
        None,
        Some(json!({
            "username": username,
            "password": "password123",
            "first_name": "Test",
            "last_name": username,
            "phone": "555-0100",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    body["token"].as_str().unwrap().to_string()
}

async fn login(app: &Router, username: &str, password: &str) -> (StatusCode, Value) {
    send(
        app,
        "POST",
        "/auth/login",
        None,
        Some(json!({ "username": username, "password": password })),
    )
    .await
}

async fn post_message(app: &Router, token: &str, to: &str, body: &str) -> i64 {
    let (status, resp) = send(
        app,
        "POST",
        "/messages",
        Some(token),
        Some(json!({ "to_username": to, "body": body })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{resp}");
    resp["message"]["id"].as_i64().unwrap()
}

#[tokio::test]
async fn alice_receives_and_reads_message_from_bob() {
    let app = create_test_app();
    register(&app, "alice").await;
    let bob = register(&app, "bob").await;

    let (status, body) = login(&app, "alice", "password123").await;
    assert_eq!(status, StatusCode::OK);
    let alice = body["token"].as_str().unwrap().to_string();

    let id = post_message(&app, &bob, "alice", "hi").await;

    let (status, body) = send(&app, "GET", &format!("/messages/{id}"), Some(alice.as_str()), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"]["body"], "hi");
    assert_eq!(body["message"]["from_user"]["username"], "bob");
    assert_eq!(body["message"]["to_user"]["username"], "alice");
    assert!(body["message"]["read_at"].is_null());

    let (status, body) = send(&app, "POST", &format!("/messages/{id}/read"), Some(alice.as_str()), None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["message"]["read_at"].is_string());

    let (status, _) = send(&app, "POST", &format!("/messages/{id}/read"), Some(bob.as_str()), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn protected_routes_require_token() {
    let app = create_test_app();

    let (status, body) = send(&app, "GET", "/users", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "authentication failed");

    let (status, _) = send(&app, "GET", "/users", Some("not.a.token"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let foreign = TokenIssuer::new(b"another-secret", None).issue("alice").unwrap();
    let (status, _) = send(&app, "GET", "/messages/1", Some(foreign.as_str()), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn duplicate_registration_conflicts() {
    let app = create_test_app();
    register(&app, "alice").await;

    let (status, body) = send(
        &app,
        "POST",
        "/auth/register",
        None,
        Some(json!({
            "username": "alice",
            "password": "another-password",
            "first_name": "Second",
            "last_name": "Alice",
            "phone": "555-0199",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT, "{body}");

    let (status, _) = login(&app, "alice", "password123").await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn bad_credentials_look_alike() {
    let app = create_test_app();
    register(&app, "alice").await;

    let (wrong_status, wrong_body) = login(&app, "alice", "wrong-password").await;
    let (unknown_status, unknown_body) = login(&app, "mallory", "password123").await;

    assert_eq!(wrong_status, StatusCode::UNAUTHORIZED);
    assert_eq!(unknown_status, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong_body, unknown_body);
}

#[tokio::test]
async fn strangers_cannot_read_messages() {
    let app = create_test_app();
    register(&app, "alice").await;
    let bob = register(&app, "bob").await;
    let carol = register(&app, "carol").await;

    let id = post_message(&app, &bob, "alice", "private").await;

    let (status, _) = send(&app, "GET", &format!("/messages/{id}"), Some(carol.as_str()), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(&app, "GET", &format!("/messages/{id}"), Some(bob.as_str()), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(&app, "GET", "/messages/4242", Some(bob.as_str()), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn send_message_validation() {
    let app = create_test_app();
    register(&app, "alice").await;
    let bob = register(&app, "bob").await;

    let (status, _) = send(
        &app,
        "POST",
        "/messages",
        Some(bob.as_str()),
        Some(json!({ "to_username": "alice", "body": "" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &app,
        "POST",
        "/messages",
        Some(bob.as_str()),
        Some(json!({ "to_username": "nobody", "body": "hello" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(
        &app,
        "POST",
        "/messages",
        Some(bob.as_str()),
        Some(json!({ "from_username": "alice", "to_username": "bob", "body": "spoofed" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn mailboxes_are_private_and_may_be_empty() {
    let app = create_test_app();
    let alice = register(&app, "alice").await;
    let bob = register(&app, "bob").await;

    let (status, body) = send(&app, "GET", "/users/alice/to", Some(alice.as_str()), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["messages"], json!([]));

    post_message(&app, &bob, "alice", "first").await;
    post_message(&app, &bob, "alice", "second").await;

    let (status, body) = send(&app, "GET", "/users/alice/to", Some(alice.as_str()), None).await;
    assert_eq!(status, StatusCode::OK);
    let inbox = body["messages"].as_array().unwrap();
    assert_eq!(inbox.len(), 2);
    assert_eq!(inbox[0]["body"], "first");
    assert_eq!(inbox[0]["from_user"]["username"], "bob");

    let (status, body) = send(&app, "GET", "/users/bob/from", Some(bob.as_str()), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["messages"][1]["to_user"]["username"], "alice");

    let (status, _) = send(&app, "GET", "/users/alice/to", Some(bob.as_str()), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = send(&app, "GET", "/users/bob/from", Some(alice.as_str()), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn user_directory_hides_passwords() {
    let app = create_test_app();
    let alice = register(&app, "alice").await;
    register(&app, "bob").await;

    let (status, body) = send(&app, "GET", "/users", Some(alice.as_str()), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["users"].as_array().unwrap().len(), 2);
    assert!(!body.to_string().contains("argon2"));

    let (status, body) = send(&app, "GET", "/users/alice", Some(alice.as_str()), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["username"], "alice");
    assert!(body["user"].get("password").is_none());

    let (status, _) = send(&app, "GET", "/users/bob", Some(alice.as_str()), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn malformed_requests_are_validation_errors() {
    let app = create_test_app();
    let alice = register(&app, "alice").await;

    let (status, body) = send(&app, "POST", "/messages", Some(alice.as_str()), Some(json!({ "body": "hi" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string(), "{body}");

    let (status, body) = send(
        &app,
        "POST",
        "/auth/register",
        None,
        Some(json!({ "username": "bob", "password": "password123" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string(), "{body}");

    let (status, body) = send(&app, "POST", "/auth/login", None, Some(json!({ "username": "alice" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string(), "{body}");

    let (status, body) = send(
        &app,
        "POST",
        "/auth/login",
        None,
        Some(json!({ "username": "alice", "password": "password123", "admin": true })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string(), "{body}");

    let (status, body) = send(&app, "GET", "/messages/abc", Some(alice.as_str()), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string(), "{body}");

    let (status, body) = send(&app, "POST", "/messages/abc/read", Some(alice.as_str()), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string(), "{body}");
}
