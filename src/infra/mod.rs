//! Infrastructure layer - External systems integration
//!
//! - Database connections, migrations and repositories
//! - Hosted language model clients
//! - Caching and rate limit counters (Redis)
//! - Background job queue
//! - Unit of Work repository hub

pub mod ai;
pub mod cache;
pub mod db;
pub mod queue;
pub mod repositories;
pub mod unit_of_work;

pub use ai::{build_language_model, CompletionRequest, LanguageModel};
pub use cache::Cache;
pub use db::{Database, Migrator};
pub use queue::{notification_email_storage, JobQueue, PostgresQueue};
pub use repositories::{
    BadgeRepository, CommunityRepository, EventRepository, NotificationRepository,
    PointsRepository, PostRepository, ReportRepository, RsvpChange, UserRepository,
};
pub use unit_of_work::{Persistence, UnitOfWork};

#[cfg(any(test, feature = "test-utils"))]
pub use ai::MockLanguageModel;
#[cfg(any(test, feature = "test-utils"))]
pub use queue::MockJobQueue;
#[cfg(any(test, feature = "test-utils"))]
pub use unit_of_work::{testing::MockRepos, MockUnitOfWork};
