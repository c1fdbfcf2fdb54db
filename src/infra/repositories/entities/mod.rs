//! SeaORM entity definitions
//!
//! These are database-specific entities separate from domain models.

pub mod badge;
pub mod community;
pub mod community_member;
pub mod event;
pub mod event_rsvp;
pub mod notification;
pub mod point_transaction;
pub mod post;
pub mod report;
pub mod user;
pub mod user_badge;
