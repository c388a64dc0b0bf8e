use std::sync::Arc;

use axum::{
    Router,
    http::Method,
    middleware::{from_fn, from_fn_with_state},
    routing::{get, post, put},
};

use crate::{
    AppState,
    error::AppError,
    middleware::{
        RateLimitRule, RateLimiter, auth_middleware, log_api_requests, log_errors, rate_limit,
    },
    routes::{admin, attribute, auth, dish, health, menu},
};

/// 各路由的限流规则，未声明的路由使用配置中的默认值
pub fn rate_limiter(state: &AppState) -> RateLimiter {
    let rules = [
        (Method::GET, "/api/health", 120),
        (Method::POST, "/auth/register", 5),
        (Method::POST, "/auth/login", 10),
        (Method::GET, "/api/menus", 60),
        (Method::POST, "/api/menus", 20),
        (Method::GET, "/api/menus/{id}", 60),
        (Method::PUT, "/api/menus/{id}", 30),
        (Method::DELETE, "/api/menus/{id}", 10),
        (Method::GET, "/api/menus/{id}/dishes", 60),
        (Method::POST, "/api/menus/{id}/dishes", 30),
        (Method::PUT, "/api/dishes/{id}", 30),
        (Method::DELETE, "/api/dishes/{id}", 20),
        (Method::GET, "/api/emotions", 60),
        (Method::GET, "/api/textures", 60),
        (Method::GET, "/api/shapes", 60),
        (Method::GET, "/admin/login", 10),
        (Method::POST, "/admin/login", 10),
    ];

    rules.into_iter().fold(
        RateLimiter::new(state.cache.clone(), state.config.default_rate_limit())
            .trust_proxy_headers(state.config.trust_proxy_headers),
        |limiter, (method, path, requests)| {
            limiter.with_rule(method, path, RateLimitRule::per_minute(requests))
        },
    )
}

async fn not_found() -> AppError {
    AppError::NotFound("Resource not found".into())
}

pub fn build_router(state: AppState) -> Router {
    let limiter = Arc::new(rate_limiter(&state));

    // 将路由分为公开路由和受保护路由
    let public_routes = Router::new()
        .route("/api/health", get(health::health_check))
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login));

    let protected_routes = Router::new()
        .route("/auth/logout", post(auth::logout))
        .route("/auth/me", get(auth::me))
        // 菜单路由
        .route("/api/menus", get(menu::list_menus).post(menu::create_menu))
        .route(
            "/api/menus/{id}",
            get(menu::get_menu)
                .put(menu::update_menu)
                .delete(menu::delete_menu),
        )
        // 菜品路由
        .route(
            "/api/menus/{id}/dishes",
            get(dish::list_dishes).post(dish::create_dish),
        )
        .route(
            "/api/dishes/{id}",
            put(dish::update_dish).delete(dish::delete_dish),
        )
        // 属性词表
        .route("/api/emotions", get(attribute::list_emotions))
        .route("/api/textures", get(attribute::list_textures))
        .route("/api/shapes", get(attribute::list_shapes))
        .route_layer(from_fn_with_state(state.clone(), auth_middleware));

    let admin_public = Router::new()
        .route("/admin/login", get(admin::login_page).post(admin::login))
        .route("/admin/logout", get(admin::logout));

    let admin_routes = Router::new()
        .route("/admin", get(admin::dashboard))
        .route("/admin/", get(admin::dashboard))
        .route(
            "/admin/profile/",
            get(admin::profile_page).post(admin::update_profile),
        )
        .route("/admin/{model}/", get(admin::list_records))
        .route("/admin/{model}/new", post(admin::create_record))
        .route("/admin/{model}/{id}/edit", post(admin::edit_record))
        .route("/admin/{model}/{id}/delete", post(admin::delete_record))
        .route_layer(from_fn_with_state(state.clone(), admin::require_staff));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .merge(admin_public)
        .merge(admin_routes)
        .route_layer(from_fn_with_state(limiter, rate_limit))
        .fallback(not_found)
        // 请求日志在最外层，限流和认证失败的响应也会被记录
        .layer(from_fn_with_state(state.clone(), log_api_requests))
        .layer(from_fn(log_errors))
        .with_state(state)
}
