// 数据库模块
// 包含连接、建表、初始数据、实体定义和存储库操作

use std::str::FromStr;

use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};

pub mod models; // 数据库实体定义
pub mod repositories; // 存储库实现
mod schema;

pub use models::{
    AttributeEntity, AttributeKind, DailyCount, DishChanges, DishEntity, MenuEntity, MenuSummary,
    NewDish, NewRequestLog, RequestLogEntity, UserEntity,
};
pub use repositories::{
    AttributeRepository, DishRepository, MenuRepository, RequestLogRepository, UserRepository,
};
pub use schema::{
    DEFAULT_EMOTIONS, DEFAULT_SHAPES, DEFAULT_TEXTURES, ensure_admin_user, init_database,
    init_schema, needs_init, seed_default_attributes,
};

/// 建立连接池，数据库文件不存在时自动创建
pub async fn connect(database_url: &str) -> Result<SqlitePool, sqlx::Error> {
    let options = SqliteConnectOptions::from_str(database_url)?
        .create_if_missing(true)
        .foreign_keys(true);

    SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await
}

/// 检查数据库是否可用
pub async fn check_connection(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT 1").execute(pool).await?;
    Ok(())
}
