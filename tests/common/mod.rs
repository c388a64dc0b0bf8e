#![allow(dead_code)]

use std::str::FromStr;
use std::sync::Arc;

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Method, Request, StatusCode, header},
    response::Response,
};
use serde_json::{Value, json};
use soundfood::{
    AppState,
    cache::MemoryStore,
    config::Config,
    database::{UserRepository, init_database},
    policy::Role,
    router::build_router,
    utils::hash_password,
};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use tower::ServiceExt;

pub const BCRYPT_COST: u32 = 4;

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub store: Arc<MemoryStore>,
}

pub async fn spawn_app() -> TestApp {
    spawn_app_with(|_| {}).await
}

/// 在默认测试配置上做修改后启动
pub async fn spawn_app_with(configure: impl FnOnce(&mut Config)) -> TestApp {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")
        .unwrap()
        .foreign_keys(true);
    // 内存数据库只在单个连接内存在
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await
        .unwrap();

    let mut config = Config {
        jwt_secret: "integration-test-secret".into(),
        bcrypt_cost: BCRYPT_COST,
        ..Config::default()
    };
    configure(&mut config);
    init_database(&pool, &config.admin, config.bcrypt_cost)
        .await
        .unwrap();

    let store = Arc::new(MemoryStore::new());
    let state = AppState::with_store(pool, config, store.clone());

    TestApp {
        router: build_router(state.clone()),
        state,
        store,
    }
}

pub async fn body_text(response: Response) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8_lossy(&bytes).into_owned()
}

pub fn location(response: &Response) -> String {
    response
        .headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

impl TestApp {
    pub async fn send(&self, request: Request<Body>) -> Response {
        self.router.clone().oneshot(request).await.unwrap()
    }

    /// 发送 JSON 请求，返回状态码和解析后的响应体
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.send(request).await;
        let status = response.status();
        let text = body_text(response).await;
        let value = serde_json::from_str(&text).unwrap_or(Value::Null);
        (status, value)
    }

    pub async fn register(&self, username: &str, password: &str) -> (StatusCode, Value) {
        self.request(
            Method::POST,
            "/auth/register",
            None,
            Some(json!({ "username": username, "password": password })),
        )
        .await
    }

    pub async fn login(&self, username: &str, password: &str) -> String {
        let (status, body) = self
            .request(
                Method::POST,
                "/auth/login",
                None,
                Some(json!({ "username": username, "password": password })),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "login failed: {}", body);
        body["access_token"].as_str().unwrap().to_string()
    }

    /// 注册并登录，返回用户ID和令牌
    pub async fn signup(&self, username: &str, password: &str) -> (i64, String) {
        let (status, body) = self.register(username, password).await;
        assert_eq!(status, StatusCode::CREATED, "register failed: {}", body);
        let user_id = body["user_id"].as_i64().unwrap();
        (user_id, self.login(username, password).await)
    }

    /// 直接写库创建用户，不经过注册接口的限流
    pub async fn create_user(&self, username: &str, password: &str, role: Role) -> i64 {
        let hash = hash_password(password, BCRYPT_COST).unwrap();
        UserRepository::create(&self.state.pool, username, None, &hash, role)
            .await
            .unwrap()
    }

    pub async fn create_menu(&self, token: &str, title: &str) -> i64 {
        let (status, body) = self
            .request(
                Method::POST,
                "/api/menus",
                Some(token),
                Some(json!({ "title": title })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "create menu failed: {}", body);
        body["id"].as_i64().unwrap()
    }

    pub async fn count(&self, table: &str) -> i64 {
        sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {}", table))
            .fetch_one(&self.state.pool)
            .await
            .unwrap()
    }

    pub async fn get_page(&self, uri: &str, cookie: Option<&str>) -> Response {
        let mut builder = Request::builder().method(Method::GET).uri(uri);
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        self.send(builder.body(Body::empty()).unwrap()).await
    }

    pub async fn post_form(&self, uri: &str, cookie: Option<&str>, form: &str) -> Response {
        let mut builder = Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        self.send(builder.body(Body::from(form.to_string())).unwrap())
            .await
    }

    /// 后台登录，成功时返回可直接放入 Cookie 头的会话值
    pub async fn admin_login(&self, username: &str, password: &str) -> Option<String> {
        let response = self
            .post_form(
                "/admin/login",
                None,
                &format!("username={}&password={}", username, password),
            )
            .await;
        if response.status() != StatusCode::SEE_OTHER {
            return None;
        }
        response
            .headers()
            .get(header::SET_COOKIE)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(';').next())
            .map(str::to_string)
    }
}
