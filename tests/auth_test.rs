mod common;

use axum::{
    body::Body,
    http::{Method, Request, StatusCode, header},
};
use chrono::Utc;
use jsonwebtoken::{EncodingKey, Header, encode};
use serde_json::json;
use soundfood::utils::Claims;

use common::{TestApp, body_text, spawn_app, spawn_app_with};

#[tokio::test]
async fn register_login_and_me() {
    let app = spawn_app().await;

    let (status, body) = app.register("alice", "secret123").await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["message"], "User created successfully");
    let user_id = body["user_id"].as_i64().unwrap();

    let token = app.login("alice", "secret123").await;
    let (status, me) = app.request(Method::GET, "/auth/me", Some(&token), None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["id"], user_id);
    assert_eq!(me["username"], "alice");
    assert_eq!(me["role"], "user");
}

#[tokio::test]
async fn duplicate_username_conflicts_regardless_of_password() {
    let app = spawn_app().await;
    app.register("alice", "secret123").await;

    for password in ["secret123", "other-password"] {
        let (status, body) = app.register("alice", password).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error"], "Username already exists");
        assert_eq!(body["code"], 1001);
    }
}

#[tokio::test]
async fn registration_payload_is_validated() {
    let app = spawn_app().await;

    let (status, body) = app
        .request(Method::POST, "/auth/register", None, Some(json!({})))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "No data provided");

    let (status, body) = app
        .request(
            Method::POST,
            "/auth/register",
            None,
            Some(json!({ "username": "bob", "password": "" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Username and password required");

    let request = Request::builder()
        .method(Method::POST)
        .uri("/auth/register")
        .header(header::CONTENT_TYPE, "text/plain")
        .body(Body::from("username=bob"))
        .unwrap();
    let response = app.send(request).await;
    assert_eq!(response.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
}

#[tokio::test]
async fn login_failures_share_one_message() {
    let app = spawn_app().await;
    app.register("alice", "secret123").await;

    for (username, password) in [("alice", "wrong"), ("nobody", "secret123")] {
        let (status, body) = app
            .request(
                Method::POST,
                "/auth/login",
                None,
                Some(json!({ "username": username, "password": password })),
            )
            .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "Invalid credentials");
    }

    let (status, body) = app
        .request(Method::POST, "/auth/login", None, Some(json!(null)))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "No data provided");
}

#[tokio::test]
async fn logout_revokes_only_that_token() {
    let app = spawn_app().await;
    app.register("alice", "secret123").await;
    let first = app.login("alice", "secret123").await;
    let second = app.login("alice", "secret123").await;

    let (status, body) = app
        .request(Method::POST, "/auth/logout", Some(&first), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Successfully logged out");

    let (status, body) = app.request(Method::GET, "/auth/me", Some(&first), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Token has been revoked");

    let (status, _) = app.request(Method::GET, "/auth/me", Some(&second), None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn missing_invalid_and_expired_tokens_are_rejected() {
    let app = spawn_app().await;

    let (status, _) = app.request(Method::GET, "/auth/me", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = app
        .request(Method::GET, "/auth/me", Some("not-a-jwt"), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Invalid token");

    let now = Utc::now().timestamp();
    let claims = Claims {
        sub: "1".into(),
        jti: "expired-token".into(),
        iat: now - 7200,
        exp: now - 10,
    };
    let expired = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(app.state.config.jwt_secret.as_bytes()),
    )
    .unwrap();

    let (status, body) = app
        .request(Method::GET, "/auth/me", Some(&expired), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Token has expired");
}

#[tokio::test]
async fn registration_is_rate_limited() {
    let app = spawn_app().await;

    for i in 0..5 {
        let (status, _) = app.register(&format!("user{}", i), "secret123").await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, body) = app.register("user5", "secret123").await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(body["code"], 1005);
}

async fn register_from(app: &TestApp, forwarded_for: &str, username: &str) -> StatusCode {
    let request = Request::builder()
        .method(Method::POST)
        .uri("/auth/register")
        .header(header::CONTENT_TYPE, "application/json")
        .header("x-forwarded-for", forwarded_for)
        .header("x-real-ip", forwarded_for)
        .body(Body::from(
            json!({ "username": username, "password": "secret123" }).to_string(),
        ))
        .unwrap();
    app.send(request).await.status()
}

#[tokio::test]
async fn forged_proxy_headers_do_not_reset_the_limit() {
    let app = spawn_app().await;

    let mut statuses = Vec::new();
    for i in 0..8 {
        statuses.push(register_from(&app, &format!("10.0.0.{}", i), &format!("user{}", i)).await);
    }

    assert_eq!(statuses[..5], [StatusCode::CREATED; 5]);
    assert_eq!(statuses[5..], [StatusCode::TOO_MANY_REQUESTS; 3]);
}

#[tokio::test]
async fn proxy_headers_identify_clients_when_trusted() {
    let app = spawn_app_with(|config| config.trust_proxy_headers = true).await;

    for i in 0..5 {
        assert_eq!(
            register_from(&app, "10.0.0.1", &format!("user{}", i)).await,
            StatusCode::CREATED
        );
    }
    assert_eq!(
        register_from(&app, "10.0.0.1", "user5").await,
        StatusCode::TOO_MANY_REQUESTS
    );
    assert_eq!(
        register_from(&app, "10.0.0.2", "user6").await,
        StatusCode::CREATED
    );
}

#[tokio::test]
async fn unknown_routes_return_json_errors() {
    let app = spawn_app().await;
    let response = app
        .send(
            Request::builder()
                .uri("/nowhere")
                .body(Body::empty())
                .unwrap(),
        )
        .await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert!(body_text(response).await.contains("\"code\":1004"));
}
