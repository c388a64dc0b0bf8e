pub mod attribute;
pub mod dish;
pub mod menu;
pub mod request_log;
pub mod user;

pub use attribute::AttributeRepository;
pub use dish::DishRepository;
pub use menu::MenuRepository;
pub use request_log::RequestLogRepository;
pub use user::UserRepository;
