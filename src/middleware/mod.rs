mod auth;
mod error_handler;
mod rate_limit;
mod request_log;

pub use auth::{auth_middleware, authenticate};
pub use error_handler::log_errors;
pub use rate_limit::{RateLimitRule, RateLimiter, rate_limit};
pub use request_log::{is_api_path, log_api_requests};
