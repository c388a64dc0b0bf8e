use chrono::{NaiveDate, Utc};
use sqlx::SqlitePool;

use crate::database::models::{DailyCount, NewRequestLog, RequestLogEntity};

/// 请求日志存储库，只提供追加和查询
pub struct RequestLogRepository;

impl RequestLogRepository {
    pub async fn create(pool: &SqlitePool, log: &NewRequestLog) -> Result<i64, sqlx::Error> {
        let result = sqlx::query(
            "INSERT INTO request_logs (timestamp, method, endpoint, status_code, user_id) \
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(Utc::now())
        .bind(&log.method)
        .bind(&log.endpoint)
        .bind(log.status_code as i64)
        .bind(log.user_id)
        .execute(pool)
        .await?;

        Ok(result.last_insert_rowid())
    }

    /// 最近的日志，时间倒序
    pub async fn recent(pool: &SqlitePool, limit: i64) -> Result<Vec<RequestLogEntity>, sqlx::Error> {
        sqlx::query_as::<_, RequestLogEntity>(
            r#"
            SELECT id, timestamp, method, endpoint, status_code, user_id
            FROM request_logs
            ORDER BY timestamp DESC, id DESC
            LIMIT ?
            "#,
        )
        .bind(limit)
        .fetch_all(pool)
        .await
    }

    pub async fn count(pool: &SqlitePool) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM request_logs")
            .fetch_one(pool)
            .await
    }

    /// 从 since 当天起每天的请求数，没有请求的日期不返回
    pub async fn daily_counts(
        pool: &SqlitePool,
        since: NaiveDate,
    ) -> Result<Vec<DailyCount>, sqlx::Error> {
        let rows: Vec<(String, i64)> = sqlx::query_as(
            r#"
            SELECT substr(timestamp, 1, 10) AS day, COUNT(*) AS count
            FROM request_logs
            WHERE substr(timestamp, 1, 10) >= ?
            GROUP BY day
            ORDER BY day
            "#,
        )
        .bind(since.format("%Y-%m-%d").to_string())
        .fetch_all(pool)
        .await?;

        Ok(rows
            .into_iter()
            .filter_map(|(day, count)| {
                NaiveDate::parse_from_str(&day, "%Y-%m-%d")
                    .ok()
                    .map(|day| DailyCount { day, count })
            })
            .collect())
    }
}
