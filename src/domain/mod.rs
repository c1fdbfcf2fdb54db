//! Domain layer - Core business entities and rules
//!
//! Plain data types plus the pure rules of the platform: reputation
//! levels, the report threshold, community roles and event capacity.
//! Nothing here touches the database or the network.

pub mod assistant;
pub mod badge;
pub mod community;
pub mod event;
pub mod moderation;
pub mod notification;
pub mod password;
pub mod post;
pub mod reputation;
pub mod user;

pub use assistant::{ChatMessage, ChatRole, ModerationVerdict, Recommendation};
pub use badge::{Badge, NewBadge, OwnedBadge};
pub use community::{
    Community, CommunityChanges, CommunityDetail, CommunityFilter, Member, MemberRole,
    Membership, NewCommunity, UserCommunity,
};
pub use event::{has_capacity, Event, NewEvent, Rsvp, RsvpCounts, RsvpState, RsvpStatus};
pub use moderation::{
    threshold_reached, ModerationAction, NewReport, Report, ReportOutcome, ReportStatus,
    ReportTarget, Resolution,
};
pub use notification::{NewNotification, Notification, NotificationKind};
pub use password::Password;
pub use post::Post;
pub use reputation::{
    Activity, PointAward, PointTotals, PointTransaction, PointsOverview, ReputationLevel,
    ReputationSummary, REASON_BADGE_PURCHASE,
};
pub use user::{Actor, Profile, ProfileChanges, User, UserResponse, UserRole};
