use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// 请求日志，只追加不修改
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct RequestLogEntity {
    pub id: i64,
    pub timestamp: DateTime<Utc>,
    pub method: String,
    pub endpoint: String,
    pub status_code: i64,
    pub user_id: Option<i64>,
}

#[derive(Debug, Clone)]
pub struct NewRequestLog {
    pub method: String,
    pub endpoint: String,
    pub status_code: u16,
    pub user_id: Option<i64>,
}

/// 某一天的请求数
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DailyCount {
    pub day: NaiveDate,
    pub count: i64,
}
