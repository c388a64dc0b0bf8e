use serde::{Deserialize, Serialize};

use crate::routes::dish::DishView;

#[derive(Debug, Deserialize)]
pub struct CreateMenuRequest {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
}

/// 只有非空字段会覆盖原值
#[derive(Debug, Default, Deserialize)]
pub struct UpdateMenuRequest {
    pub title: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct MenuDetail {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub dishes: Vec<DishView>,
}
