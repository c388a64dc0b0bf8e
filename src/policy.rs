// 权限策略
// 角色是封闭枚举，按 User < Manager < Admin 排序，高级角色包含低级角色的全部权限

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::AppError;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, sqlx::Type,
)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum Role {
    User,
    Manager,
    Admin,
}

impl Role {
    pub const ALL: [Role; 3] = [Role::User, Role::Manager, Role::Admin];

    /// 当前角色是否具备 required 角色的权限
    pub fn includes(self, required: Role) -> bool {
        self >= required
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Manager => "manager",
            Role::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "user" => Ok(Role::User),
            "manager" => Ok(Role::Manager),
            "admin" => Ok(Role::Admin),
            other => Err(AppError::Validation(format!("Unknown role: {}", other))),
        }
    }
}

/// 资源归属检查，无主资源对任何人都不可访问
pub fn check_owner(owner_id: Option<i64>, subject_id: i64) -> Result<(), AppError> {
    match owner_id {
        Some(owner) if owner == subject_id => Ok(()),
        _ => Err(AppError::Forbidden),
    }
}

/// 管理后台视图的访问策略，write 为 None 表示只读
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewPolicy {
    pub read: Role,
    pub write: Option<Role>,
}

impl ViewPolicy {
    pub const USERS: ViewPolicy = ViewPolicy {
        read: Role::Manager,
        write: Some(Role::Admin),
    };

    pub const CATALOG: ViewPolicy = ViewPolicy {
        read: Role::Manager,
        write: Some(Role::Manager),
    };

    pub const REQUEST_LOGS: ViewPolicy = ViewPolicy {
        read: Role::Manager,
        write: None,
    };

    /// 仪表盘和个人资料页
    pub const STAFF: ViewPolicy = ViewPolicy {
        read: Role::Manager,
        write: Some(Role::Manager),
    };

    pub fn can_read(&self, role: Role) -> bool {
        role.includes(self.read)
    }

    pub fn can_write(&self, role: Role) -> bool {
        self.write.is_some_and(|required| role.includes(required))
    }
}

/// 能否进入管理后台
pub fn panel_access(role: Role) -> bool {
    ViewPolicy::STAFF.can_read(role)
}
