//! Application services layer - Use cases and business logic.
//!
//! Services orchestrate domain rules and infrastructure. Each is a trait
//! (mockable in tests) with a `*Manager` implementation generic over the
//! `UnitOfWork` repository hub.

mod access;
mod assistant_service;
mod auth_service;
mod badge_service;
mod community_service;
pub mod container;
mod event_service;
mod notification_service;
mod post_service;
mod report_service;
mod reputation_service;
mod user_service;

// Service Container
pub use container::{parallel, ServiceContainer, Services};

// Service traits and implementations
pub use assistant_service::{AssistantManager, AssistantService};
pub use auth_service::{generate_token, AuthService, Authenticator, Claims, TokenResponse};
pub use badge_service::{BadgeManager, BadgeService};
pub use community_service::{CommunityManager, CommunityService};
pub use event_service::{EventManager, EventService};
pub use notification_service::{NotificationManager, NotificationService};
pub use post_service::{PostManager, PostService};
pub use report_service::{ReportManager, ReportService};
pub use reputation_service::{ReputationManager, ReputationService};
pub use user_service::{UserManager, UserService};

#[cfg(any(test, feature = "test-utils"))]
pub use assistant_service::MockAssistantService;
#[cfg(any(test, feature = "test-utils"))]
pub use auth_service::MockAuthService;
#[cfg(any(test, feature = "test-utils"))]
pub use badge_service::MockBadgeService;
#[cfg(any(test, feature = "test-utils"))]
pub use community_service::MockCommunityService;
#[cfg(any(test, feature = "test-utils"))]
pub use container::MockServiceContainer;
#[cfg(any(test, feature = "test-utils"))]
pub use event_service::MockEventService;
#[cfg(any(test, feature = "test-utils"))]
pub use notification_service::MockNotificationService;
#[cfg(any(test, feature = "test-utils"))]
pub use post_service::MockPostService;
#[cfg(any(test, feature = "test-utils"))]
pub use report_service::MockReportService;
#[cfg(any(test, feature = "test-utils"))]
pub use reputation_service::MockReputationService;
#[cfg(any(test, feature = "test-utils"))]
pub use user_service::MockUserService;
