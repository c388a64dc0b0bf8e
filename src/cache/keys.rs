/// 仪表盘统计缓存键
pub const DASHBOARD_STATS_KEY: &str = "dashboard_stats";

/// 仪表盘图表缓存键
pub const CHART_DATA_KEY: &str = "chart_data";

/// 最近请求日志缓存键
pub const RECENT_LOGS_KEY: &str = "recent_logs";

/// 每次API请求后需要失效的全部仪表盘键
pub const DASHBOARD_KEYS: [&str; 3] = [DASHBOARD_STATS_KEY, CHART_DATA_KEY, RECENT_LOGS_KEY];

const REVOKED_TOKEN_PREFIX: &str = "revoked:";
const SESSION_PREFIX: &str = "session:";
const RATE_LIMIT_PREFIX: &str = "rate_limit:";

/// 生成已撤销令牌键
pub fn revoked_token_key(jti: &str) -> String {
    format!("{}{}", REVOKED_TOKEN_PREFIX, jti)
}

/// 生成会话键，参数为会话ID的摘要
pub fn session_key(digest: &str) -> String {
    format!("{}{}", SESSION_PREFIX, digest)
}

pub fn rate_limit_key(bucket: &str) -> String {
    format!("{}{}", RATE_LIMIT_PREFIX, bucket)
}
