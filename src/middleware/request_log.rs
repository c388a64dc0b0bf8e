use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::Response,
};

use crate::{
    AppState,
    dashboard::DashboardCache,
    database::{NewRequestLog, RequestLogRepository},
    middleware::auth::authenticate,
    utils::bearer_token,
};

const API_PREFIX: &str = "/api";

/// 按路径段匹配 /api 前缀，比单纯的前缀匹配更严格，/apiary 之类的路径不算
pub fn is_api_path(path: &str) -> bool {
    path.strip_prefix(API_PREFIX)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
}

/// 记录每个 API 请求并使仪表盘缓存失效
/// 写日志或清缓存失败只记录错误，不影响原响应
pub async fn log_api_requests(
    State(state): State<AppState>,
    req: Request<Body>,
    next: Next,
) -> Response {
    if !is_api_path(req.uri().path()) {
        return next.run(req).await;
    }

    let method = req.method().to_string();
    let endpoint = req.uri().path().to_string();
    let token = bearer_token(req.headers());

    let response = next.run(req).await;

    let user_id = match token {
        Some(token) => authenticate(&state, &token)
            .await
            .ok()
            .and_then(|claims| claims.user_id().ok()),
        None => None,
    };

    let log = NewRequestLog {
        method,
        endpoint,
        status_code: response.status().as_u16(),
        user_id,
    };

    if let Err(e) = RequestLogRepository::create(&state.pool, &log).await {
        tracing::error!(
            "Failed to record request log for {} {}: {}",
            log.method,
            log.endpoint,
            e
        );
    }

    if let Err(e) = DashboardCache::invalidate(state.cache.as_ref()).await {
        tracing::error!("Failed to invalidate dashboard cache: {}", e);
    }

    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_prefix_is_segment_aware() {
        assert!(is_api_path("/api"));
        assert!(is_api_path("/api/"));
        assert!(is_api_path("/api/menus/3"));
        assert!(!is_api_path("/apiary"));
        assert!(!is_api_path("/auth/login"));
        assert!(!is_api_path("/admin/"));
        assert!(!is_api_path("/"));
    }
}
