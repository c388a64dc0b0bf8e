use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::middleware::RateLimitRule;

/// 首次启动时创建的管理员账号
#[derive(Debug, Clone)]
pub struct AdminBootstrap {
    pub username: String,
    pub password: String,
    pub email: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub redis_url: Option<String>,
    pub jwt_secret: String,
    pub jwt_expiration_secs: u64,
    pub session_expiration_secs: u64,
    pub bcrypt_cost: u32,
    pub rate_limit_window_secs: u64,
    pub rate_limit_requests: u32,
    /// 限流时是否采信 X-Real-IP / X-Forwarded-For，只应在反向代理后开启
    pub trust_proxy_headers: bool,
    pub server_host: String,
    pub server_port: u16,
    pub auto_init_db: bool,
    pub admin: AdminBootstrap,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            database_url: "sqlite://soundfood.db?mode=rwc".into(),
            redis_url: None,
            jwt_secret: "dev-jwt-secret".into(),
            jwt_expiration_secs: 3600,
            session_expiration_secs: 8 * 3600,
            bcrypt_cost: bcrypt::DEFAULT_COST,
            rate_limit_window_secs: 60,
            rate_limit_requests: 50,
            trust_proxy_headers: false,
            server_host: "0.0.0.0".into(),
            server_port: 3000,
            auto_init_db: true,
            admin: AdminBootstrap {
                username: "admin".into(),
                password: "admin123".into(),
                email: None,
            },
        }
    }
}

impl Config {
    /// 从环境变量（以及 .env 文件）加载配置
    /// 只有 JWT_SECRET 是必填项，其余变量缺省时使用默认值
    pub fn from_env() -> Result<Self, env::VarError> {
        dotenv::dotenv().ok();

        let defaults = Config::default();
        Ok(Config {
            database_url: env::var("DATABASE_URL").unwrap_or(defaults.database_url),
            redis_url: env::var("REDIS_URL").ok().filter(|url| !url.trim().is_empty()),
            jwt_secret: env::var("JWT_SECRET")?,
            jwt_expiration_secs: var_or("JWT_EXPIRATION_SECS", defaults.jwt_expiration_secs),
            session_expiration_secs: var_or(
                "SESSION_EXPIRATION_SECS",
                defaults.session_expiration_secs,
            ),
            bcrypt_cost: var_or("BCRYPT_COST", defaults.bcrypt_cost),
            rate_limit_window_secs: var_or("RATE_LIMIT_WINDOW", defaults.rate_limit_window_secs),
            rate_limit_requests: var_or("RATE_LIMIT_REQUESTS", defaults.rate_limit_requests),
            trust_proxy_headers: env::var("TRUST_PROXY_HEADERS")
                .map(|v| parse_flag(&v))
                .unwrap_or(defaults.trust_proxy_headers),
            server_host: env::var("SERVER_HOST").unwrap_or(defaults.server_host),
            server_port: var_or("SERVER_PORT", defaults.server_port),
            auto_init_db: env::var("AUTO_INIT_DB")
                .map(|v| parse_flag(&v))
                .unwrap_or(defaults.auto_init_db),
            admin: AdminBootstrap {
                username: non_empty_var("ADMIN_USERNAME").unwrap_or(defaults.admin.username),
                password: non_empty_var("ADMIN_PASSWORD").unwrap_or(defaults.admin.password),
                email: non_empty_var("ADMIN_EMAIL"),
            },
        })
    }

    pub fn jwt_expiration(&self) -> Duration {
        Duration::from_secs(self.jwt_expiration_secs)
    }

    pub fn session_expiration(&self) -> Duration {
        Duration::from_secs(self.session_expiration_secs)
    }

    pub fn rate_limit_window(&self) -> Duration {
        Duration::from_secs(self.rate_limit_window_secs)
    }

    /// 未单独声明限流规则的路由使用的默认限制
    pub fn default_rate_limit(&self) -> RateLimitRule {
        RateLimitRule::new(self.rate_limit_requests, self.rate_limit_window())
    }
}

fn var_or<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "true" | "1" | "yes"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_accept_common_truthy_spellings() {
        assert!(parse_flag("true"));
        assert!(parse_flag("YES"));
        assert!(parse_flag(" 1 "));
        assert!(!parse_flag("false"));
        assert!(!parse_flag("0"));
        assert!(!parse_flag(""));
    }

    #[test]
    fn default_token_window_is_one_hour() {
        let config = Config::default();
        assert_eq!(config.jwt_expiration(), Duration::from_secs(3600));
        assert!(config.auto_init_db);
        assert!(!config.trust_proxy_headers);
        assert_eq!(config.admin.username, "admin");
    }
}
