//! Repository layer - Data access abstraction
//!
//! One trait per aggregate, implemented by a `*Store` over sea-orm.
//! Services depend on the traits so tests can swap in mocks.

mod badge_repository;
mod community_repository;
pub(crate) mod entities;
mod event_repository;
mod notification_repository;
mod points_repository;
mod post_repository;
mod report_repository;
mod user_repository;

pub use badge_repository::{BadgeRepository, BadgeStore};
pub use community_repository::{CommunityRepository, CommunityStore};
pub use event_repository::{EventRepository, EventStore, RsvpChange};
pub use notification_repository::{NotificationRepository, NotificationStore};
pub use points_repository::{PointsRepository, PointsStore};
pub use post_repository::{PostRepository, PostStore};
pub use report_repository::{ReportRepository, ReportStore};
pub use user_repository::{UserRepository, UserStore};

// Export mocks for tests (both unit and integration)
#[cfg(any(test, feature = "test-utils"))]
pub use badge_repository::MockBadgeRepository;
#[cfg(any(test, feature = "test-utils"))]
pub use community_repository::MockCommunityRepository;
#[cfg(any(test, feature = "test-utils"))]
pub use event_repository::MockEventRepository;
#[cfg(any(test, feature = "test-utils"))]
pub use notification_repository::MockNotificationRepository;
#[cfg(any(test, feature = "test-utils"))]
pub use points_repository::MockPointsRepository;
#[cfg(any(test, feature = "test-utils"))]
pub use post_repository::MockPostRepository;
#[cfg(any(test, feature = "test-utils"))]
pub use report_repository::MockReportRepository;
#[cfg(any(test, feature = "test-utils"))]
pub use user_repository::MockUserRepository;
