mod common;

use std::time::Duration;

use axum::http::{Method, StatusCode};
use soundfood::cache::{CacheStore, keys::DASHBOARD_KEYS};
use sqlx::Row;

use common::{TestApp, spawn_app};

#[derive(Debug, PartialEq)]
struct LoggedRequest {
    method: String,
    endpoint: String,
    status_code: i64,
    user_id: Option<i64>,
}

async fn logged(app: &TestApp) -> Vec<LoggedRequest> {
    sqlx::query("SELECT method, endpoint, status_code, user_id FROM request_logs ORDER BY id")
        .fetch_all(&app.state.pool)
        .await
        .unwrap()
        .into_iter()
        .map(|row| LoggedRequest {
            method: row.get("method"),
            endpoint: row.get("endpoint"),
            status_code: row.get("status_code"),
            user_id: row.get("user_id"),
        })
        .collect()
}

fn entry(method: &str, endpoint: &str, status_code: i64, user_id: Option<i64>) -> LoggedRequest {
    LoggedRequest {
        method: method.into(),
        endpoint: endpoint.into(),
        status_code,
        user_id,
    }
}

#[tokio::test]
async fn api_requests_are_logged_with_status_and_user() {
    let app = spawn_app().await;
    let (user_id, token) = app.signup("alice", "secret123").await;

    app.request(Method::GET, "/api/health", None, None).await;
    app.request(Method::GET, "/api/menus", Some(&token), None).await;
    app.request(Method::GET, "/api/menus", None, None).await;
    app.request(Method::GET, "/api/menus/42", Some(&token), None)
        .await;

    assert_eq!(
        logged(&app).await,
        vec![
            entry("GET", "/api/health", 200, None),
            entry("GET", "/api/menus", 200, Some(user_id)),
            entry("GET", "/api/menus", 401, None),
            entry("GET", "/api/menus/42", 404, Some(user_id)),
        ]
    );
}

#[tokio::test]
async fn non_api_paths_are_not_logged() {
    let app = spawn_app().await;
    app.signup("alice", "secret123").await;
    app.get_page("/admin/login", None).await;
    app.get_page("/", None).await;

    assert_eq!(app.count("request_logs").await, 0);
}

#[tokio::test]
async fn revoked_token_is_logged_anonymously() {
    let app = spawn_app().await;
    let (_, token) = app.signup("alice", "secret123").await;
    let (status, _) = app
        .request(Method::POST, "/auth/logout", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app
        .request(Method::GET, "/api/emotions", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    assert_eq!(
        logged(&app).await,
        vec![entry("GET", "/api/emotions", 401, None)]
    );
}

#[tokio::test]
async fn unknown_api_paths_are_logged() {
    let app = spawn_app().await;
    let (status, body) = app.request(Method::GET, "/api/nothing", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], 1004);

    assert_eq!(
        logged(&app).await,
        vec![entry("GET", "/api/nothing", 404, None)]
    );
}

#[tokio::test]
async fn api_requests_evict_dashboard_cache() {
    let app = spawn_app().await;
    for key in DASHBOARD_KEYS {
        app.store
            .set_ex(key, "{}".into(), Duration::from_secs(300))
            .await
            .unwrap();
    }

    // 非 API 请求不影响缓存
    app.get_page("/admin/login", None).await;
    for key in DASHBOARD_KEYS {
        assert!(app.store.get(key).await.unwrap().is_some());
    }

    app.request(Method::GET, "/api/health", None, None).await;
    for key in DASHBOARD_KEYS {
        assert_eq!(app.store.get(key).await.unwrap(), None, "{} survived", key);
    }
}

#[tokio::test]
async fn failed_log_writes_keep_the_response() {
    let app = spawn_app().await;
    for key in DASHBOARD_KEYS {
        app.store
            .set_ex(key, "{}".into(), Duration::from_secs(300))
            .await
            .unwrap();
    }
    sqlx::query("DROP TABLE request_logs")
        .execute(&app.state.pool)
        .await
        .unwrap();

    let (status, body) = app.request(Method::GET, "/api/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");

    for key in DASHBOARD_KEYS {
        assert_eq!(app.store.get(key).await.unwrap(), None, "{} survived", key);
    }
}
