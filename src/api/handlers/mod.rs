//! HTTP request handlers.

pub mod ai_handler;
pub mod auth_handler;
pub mod badge_handler;
pub mod community_handler;
pub mod event_handler;
pub mod post_handler;
pub mod report_handler;
pub mod user_handler;

pub use ai_handler::ai_routes;
pub use auth_handler::auth_routes;
pub use badge_handler::badge_routes;
pub use community_handler::community_routes;
pub use event_handler::event_routes;
pub use report_handler::report_routes;
pub use user_handler::user_routes;
