use serde::Serialize;
use sqlx::FromRow;

/// 菜单实体
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct MenuEntity {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub owner_id: Option<i64>,
}

/// 菜单列表项，带菜品数量
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct MenuSummary {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub dish_count: i64,
}
