use serde::Serialize;
use sqlx::FromRow;

use crate::policy::Role;

/// 用户实体
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct UserEntity {
    pub id: i64,
    pub username: String,
    pub email: Option<String>,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: Role,
}
