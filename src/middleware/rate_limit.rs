use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    extract::{ConnectInfo, MatchedPath, State},
    http::{HeaderMap, Method, Request},
    middleware::Next,
    response::Response,
};

use crate::{
    cache::{CacheStore, keys::rate_limit_key},
    error::AppError,
};

/// 固定窗口内允许的请求数
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitRule {
    pub requests: u32,
    pub window: Duration,
}

impl RateLimitRule {
    pub fn new(requests: u32, window: Duration) -> Self {
        Self { requests, window }
    }

    pub fn per_minute(requests: u32) -> Self {
        Self::new(requests, Duration::from_secs(60))
    }
}

/// 按路由声明限制，计数键为 方法 + 路由模板 + 客户端IP
pub struct RateLimiter {
    store: Arc<dyn CacheStore>,
    rules: HashMap<(Method, String), RateLimitRule>,
    default_rule: RateLimitRule,
    trust_proxy_headers: bool,
}

impl RateLimiter {
    pub fn new(store: Arc<dyn CacheStore>, default_rule: RateLimitRule) -> Self {
        Self {
            store,
            rules: HashMap::new(),
            default_rule,
            trust_proxy_headers: false,
        }
    }

    /// 部署在反向代理后时按代理头识别客户端
    pub fn trust_proxy_headers(mut self, trust: bool) -> Self {
        self.trust_proxy_headers = trust;
        self
    }

    pub fn with_rule(mut self, method: Method, path: &str, rule: RateLimitRule) -> Self {
        self.rules.insert((method, path.to_string()), rule);
        self
    }

    pub fn rule_for(&self, method: &Method, path: &str) -> RateLimitRule {
        self.rules
            .get(&(method.clone(), path.to_string()))
            .copied()
            .unwrap_or(self.default_rule)
    }

    pub async fn check_rate_limit(&self, req: Request<Body>, next: Next) -> Result<Response, AppError> {
        let path = req
            .extensions()
            .get::<MatchedPath>()
            .map(|p| p.as_str().to_string())
            .unwrap_or_else(|| req.uri().path().to_string());
        let rule = self.rule_for(req.method(), &path);

        // 从连接信息获取原始IP
        let remote_ip = req
            .extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ci| ci.0.ip().to_string());
        let ip = if self.trust_proxy_headers {
            client_ip(req.headers(), remote_ip.as_deref())
        } else {
            remote_ip.unwrap_or_else(|| "unknown".to_string())
        };

        let key = rate_limit_key(&format!("{}:{}:{}", req.method(), path, ip));

        match self.store.incr_window(&key, rule.window).await {
            Ok(count) if count > rule.requests as u64 => {
                tracing::warn!("Rate limit exceeded for {} ({} requests)", key, count);
                return Err(AppError::RateLimited(rule.window.as_secs()));
            }
            Ok(_) => {}
            // 计数存储不可用时放行
            Err(e) => tracing::error!("Rate limit check failed for {}: {}", key, e),
        }

        Ok(next.run(req).await)
    }
}

/// 优先使用代理头中的IP，其次是连接IP，代理头可被客户端伪造
fn client_ip(headers: &HeaderMap, remote_ip: Option<&str>) -> String {
    headers
        .get("x-real-ip")
        .and_then(|h| h.to_str().ok())
        .or_else(|| {
            headers
                .get("x-forwarded-for")
                .and_then(|h| h.to_str().ok())
                .and_then(|s| s.split(',').find(|ip| !ip.trim().is_empty()))
        })
        .or(remote_ip)
        .unwrap_or("unknown")
        .trim()
        .to_string()
}

pub async fn rate_limit(
    State(limiter): State<Arc<RateLimiter>>,
    req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    limiter.check_rate_limit(req, next).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryStore;
    use axum::http::HeaderValue;

    #[test]
    fn declared_rule_wins_over_default() {
        let limiter = RateLimiter::new(Arc::new(MemoryStore::new()), RateLimitRule::per_minute(50))
            .with_rule(Method::POST, "/auth/register", RateLimitRule::per_minute(5));

        assert_eq!(
            limiter.rule_for(&Method::POST, "/auth/register"),
            RateLimitRule::per_minute(5)
        );
        assert_eq!(
            limiter.rule_for(&Method::GET, "/auth/register"),
            RateLimitRule::per_minute(50)
        );
    }

    #[test]
    fn client_ip_prefers_proxy_headers() {
        let mut headers = HeaderMap::new();
        assert_eq!(client_ip(&headers, Some("10.0.0.1")), "10.0.0.1");
        assert_eq!(client_ip(&headers, None), "unknown");

        headers.insert("x-forwarded-for", HeaderValue::from_static(" 1.2.3.4 , 5.6.7.8"));
        assert_eq!(client_ip(&headers, Some("10.0.0.1")), "1.2.3.4");

        headers.insert("x-real-ip", HeaderValue::from_static("9.9.9.9"));
        assert_eq!(client_ip(&headers, Some("10.0.0.1")), "9.9.9.9");
    }
}
