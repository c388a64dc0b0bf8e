pub mod attribute;
pub mod dish;
pub mod menu;
pub mod request_log;
pub mod user;

pub use attribute::{AttributeEntity, AttributeKind};
pub use dish::{DishChanges, DishEntity, NewDish};
pub use menu::{MenuEntity, MenuSummary};
pub use request_log::{DailyCount, NewRequestLog, RequestLogEntity};
pub use user::UserEntity;
