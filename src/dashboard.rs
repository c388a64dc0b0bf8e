// 仪表盘缓存
// 统计、30天请求曲线和最近日志都走读穿透缓存，请求日志中间件负责失效

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::{Days, NaiveDate, Utc};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use sqlx::SqlitePool;

use crate::cache::keys::{CHART_DATA_KEY, DASHBOARD_KEYS, DASHBOARD_STATS_KEY, RECENT_LOGS_KEY};
use crate::cache::{CacheError, CacheStore, get_json, set_json};
use crate::database::{
    AttributeKind, AttributeRepository, DailyCount, DishRepository, MenuRepository,
    RequestLogEntity, RequestLogRepository, UserRepository,
};

pub const STATS_TTL: Duration = Duration::from_secs(300);
pub const CHART_TTL: Duration = Duration::from_secs(300);
pub const RECENT_LOGS_TTL: Duration = Duration::from_secs(60);

pub const CHART_DAYS: u64 = 30;
pub const RECENT_LOG_LIMIT: i64 = 10;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardStats {
    pub users: i64,
    pub menus: i64,
    pub dishes: i64,
    pub emotions: i64,
    pub textures: i64,
    pub shapes: i64,
    pub requests: i64,
}

/// 按天的请求数曲线，时间正序
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChartData {
    pub labels: Vec<String>,
    pub values: Vec<i64>,
}

pub struct DashboardCache {
    pool: SqlitePool,
    cache: Arc<dyn CacheStore>,
}

impl DashboardCache {
    pub fn new(pool: SqlitePool, cache: Arc<dyn CacheStore>) -> Self {
        Self { pool, cache }
    }

    pub async fn stats(&self) -> Result<DashboardStats, sqlx::Error> {
        self.read_through(DASHBOARD_STATS_KEY, STATS_TTL, || compute_stats(&self.pool))
            .await
    }

    pub async fn chart_data(&self) -> Result<ChartData, sqlx::Error> {
        self.read_through(CHART_DATA_KEY, CHART_TTL, || async {
            let today = Utc::now().date_naive();
            let since = window_start(today);
            let counts = RequestLogRepository::daily_counts(&self.pool, since).await?;
            Ok(build_series(today, &counts))
        })
        .await
    }

    pub async fn recent_logs(&self) -> Result<Vec<RequestLogEntity>, sqlx::Error> {
        self.read_through(RECENT_LOGS_KEY, RECENT_LOGS_TTL, || {
            RequestLogRepository::recent(&self.pool, RECENT_LOG_LIMIT)
        })
        .await
    }

    /// 删除全部仪表盘缓存键
    pub async fn invalidate(store: &dyn CacheStore) -> Result<(), CacheError> {
        store.delete(&DASHBOARD_KEYS).await
    }

    async fn read_through<T, F, Fut>(
        &self,
        key: &str,
        ttl: Duration,
        compute: F,
    ) -> Result<T, sqlx::Error>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, sqlx::Error>>,
    {
        match get_json::<T>(self.cache.as_ref(), key).await {
            Ok(Some(value)) => return Ok(value),
            Ok(None) => {}
            Err(e) => tracing::warn!("Dashboard cache read failed for {}: {}", key, e),
        }

        let value = compute().await?;

        if let Err(e) = set_json(self.cache.as_ref(), key, &value, ttl).await {
            tracing::warn!("Dashboard cache write failed for {}: {}", key, e);
        }

        Ok(value)
    }
}

async fn compute_stats(pool: &SqlitePool) -> Result<DashboardStats, sqlx::Error> {
    Ok(DashboardStats {
        users: UserRepository::count(pool).await?,
        menus: MenuRepository::count(pool).await?,
        dishes: DishRepository::count(pool).await?,
        emotions: AttributeRepository::count(pool, AttributeKind::Emotion).await?,
        textures: AttributeRepository::count(pool, AttributeKind::Texture).await?,
        shapes: AttributeRepository::count(pool, AttributeKind::Shape).await?,
        requests: RequestLogRepository::count(pool).await?,
    })
}

fn window_start(today: NaiveDate) -> NaiveDate {
    today
        .checked_sub_days(Days::new(CHART_DAYS - 1))
        .unwrap_or(NaiveDate::MIN)
}

/// 以 today 结尾的30天曲线，没有请求的日期补0
pub fn build_series(today: NaiveDate, counts: &[DailyCount]) -> ChartData {
    let start = window_start(today);
    let mut labels = Vec::with_capacity(CHART_DAYS as usize);
    let mut values = Vec::with_capacity(CHART_DAYS as usize);

    for day in start.iter_days().take(CHART_DAYS as usize) {
        let count = counts
            .iter()
            .find(|c| c.day == day)
            .map(|c| c.count)
            .unwrap_or(0);
        labels.push(day.format("%Y-%m-%d").to_string());
        values.push(count);
    }

    ChartData { labels, values }
}
