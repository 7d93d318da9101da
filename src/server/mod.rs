mod admin;
pub mod dto;
pub mod quota;
pub mod quota_guard;
pub mod response;
mod router;
mod user;
pub mod validation;

pub use admin::admin_router;
pub use quota_guard::{QuotaTarget, enforce_quota};
pub use router::{AppState, create_router};
pub use user::user_router;
