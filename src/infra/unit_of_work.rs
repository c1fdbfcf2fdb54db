//! Unit of Work - centralized repository access.
//!
//! Services reach every repository through one `UnitOfWork` handle.
//! Multi-row writes that must be atomic (community creation, RSVP
//! capacity checks, report resolution, badge purchase) open their own
//! transaction inside the owning store, so the hub exposes no generic
//! transaction API and can be mocked whole in service tests.

use sea_orm::DatabaseConnection;
use std::sync::Arc;

use super::repositories::{
    BadgeRepository, BadgeStore, CommunityRepository, CommunityStore, EventRepository, EventStore,
    NotificationRepository, NotificationStore, PointsRepository, PointsStore, PostRepository,
    PostStore, ReportRepository, ReportStore, UserRepository, UserStore,
};

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// Unit of Work trait for dependency injection.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
pub trait UnitOfWork: Send + Sync + 'static {
    fn users(&self) -> Arc<dyn UserRepository>;

    fn communities(&self) -> Arc<dyn CommunityRepository>;

    fn posts(&self) -> Arc<dyn PostRepository>;

    fn events(&self) -> Arc<dyn EventRepository>;

    fn reports(&self) -> Arc<dyn ReportRepository>;

    fn points(&self) -> Arc<dyn PointsRepository>;

    fn badges(&self) -> Arc<dyn BadgeRepository>;

    fn notifications(&self) -> Arc<dyn NotificationRepository>;
}

/// Concrete implementation of UnitOfWork backed by one connection pool
pub struct Persistence {
    users: Arc<UserStore>,
    communities: Arc<CommunityStore>,
    posts: Arc<PostStore>,
    events: Arc<EventStore>,
    reports: Arc<ReportStore>,
    points: Arc<PointsStore>,
    badges: Arc<BadgeStore>,
    notifications: Arc<NotificationStore>,
}

impl Persistence {
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            users: Arc::new(UserStore::new(db.clone())),
            communities: Arc::new(CommunityStore::new(db.clone())),
            posts: Arc::new(PostStore::new(db.clone())),
            events: Arc::new(EventStore::new(db.clone())),
            reports: Arc::new(ReportStore::new(db.clone())),
            points: Arc::new(PointsStore::new(db.clone())),
            badges: Arc::new(BadgeStore::new(db.clone())),
            notifications: Arc::new(NotificationStore::new(db)),
        }
    }
}

impl UnitOfWork for Persistence {
    fn users(&self) -> Arc<dyn UserRepository> {
        self.users.clone()
    }

    fn communities(&self) -> Arc<dyn CommunityRepository> {
        self.communities.clone()
    }

    fn posts(&self) -> Arc<dyn PostRepository> {
        self.posts.clone()
    }

    fn events(&self) -> Arc<dyn EventRepository> {
        self.events.clone()
    }

    fn reports(&self) -> Arc<dyn ReportRepository> {
        self.reports.clone()
    }

    fn points(&self) -> Arc<dyn PointsRepository> {
        self.points.clone()
    }

    fn badges(&self) -> Arc<dyn BadgeRepository> {
        self.badges.clone()
    }

    fn notifications(&self) -> Arc<dyn NotificationRepository> {
        self.notifications.clone()
    }
}

/// Builds a `MockUnitOfWork` from individually configured repository mocks.
#[cfg(any(test, feature = "test-utils"))]
pub mod testing {
    use super::*;
    use crate::infra::repositories::{
        MockBadgeRepository, MockCommunityRepository, MockEventRepository,
        MockNotificationRepository, MockPointsRepository, MockPostRepository,
        MockReportRepository, MockUserRepository,
    };

    /// Repository mocks; unset ones have no expectations and panic if called.
    #[derive(Default)]
    pub struct MockRepos {
        pub users: MockUserRepository,
        pub communities: MockCommunityRepository,
        pub posts: MockPostRepository,
        pub events: MockEventRepository,
        pub reports: MockReportRepository,
        pub points: MockPointsRepository,
        pub badges: MockBadgeRepository,
        pub notifications: MockNotificationRepository,
    }

    impl MockRepos {
        pub fn into_uow(self) -> Arc<MockUnitOfWork> {
            let users: Arc<dyn UserRepository> = Arc::new(self.users);
            let communities: Arc<dyn CommunityRepository> = Arc::new(self.communities);
            let posts: Arc<dyn PostRepository> = Arc::new(self.posts);
            let events: Arc<dyn EventRepository> = Arc::new(self.events);
            let reports: Arc<dyn ReportRepository> = Arc::new(self.reports);
            let points: Arc<dyn PointsRepository> = Arc::new(self.points);
            let badges: Arc<dyn BadgeRepository> = Arc::new(self.badges);
            let notifications: Arc<dyn NotificationRepository> = Arc::new(self.notifications);

            let mut uow = MockUnitOfWork::new();
            uow.expect_users().return_const(users);
            uow.expect_communities().return_const(communities);
            uow.expect_posts().return_const(posts);
            uow.expect_events().return_const(events);
            uow.expect_reports().return_const(reports);
            uow.expect_points().return_const(points);
            uow.expect_badges().return_const(badges);
            uow.expect_notifications().return_const(notifications);
            Arc::new(uow)
        }
    }
}
