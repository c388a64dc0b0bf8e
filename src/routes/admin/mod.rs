// 管理后台
// 会话 Cookie 登录，按视图策略控制各模型的读写

mod handler;
mod model;
mod render;

pub use handler::{
    StaffUser, create_record, dashboard, delete_record, edit_record, list_records, login,
    login_page, logout, profile_page, require_staff, update_profile,
};
pub use model::{AdminModel, SESSION_COOKIE};
