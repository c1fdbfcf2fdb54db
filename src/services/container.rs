//! Service Container - Centralized service access with parallel execution support.
//!
//! Builds every service once over a shared `Persistence` hub and hands
//! them out as trait objects.

use std::future::Future;
use std::sync::Arc;

use super::{
    AssistantManager, AssistantService, AuthService, Authenticator, BadgeManager, BadgeService,
    CommunityManager, CommunityService, EventManager, EventService, NotificationManager,
    NotificationService, PostManager, PostService, ReportManager, ReportService,
    ReputationManager, ReputationService, UserManager, UserService,
};
use crate::config::Config;
use crate::errors::AppResult;
use crate::infra::{JobQueue, LanguageModel, Persistence};

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// Service container trait for dependency injection.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
pub trait ServiceContainer: Send + Sync {
    fn auth(&self) -> Arc<dyn AuthService>;

    fn users(&self) -> Arc<dyn UserService>;

    fn reputation(&self) -> Arc<dyn ReputationService>;

    fn notifications(&self) -> Arc<dyn NotificationService>;

    fn communities(&self) -> Arc<dyn CommunityService>;

    fn posts(&self) -> Arc<dyn PostService>;

    fn events(&self) -> Arc<dyn EventService>;

    fn reports(&self) -> Arc<dyn ReportService>;

    fn badges(&self) -> Arc<dyn BadgeService>;

    fn assistant(&self) -> Arc<dyn AssistantService>;
}

/// Concrete implementation of ServiceContainer
pub struct Services {
    auth: Arc<dyn AuthService>,
    users: Arc<dyn UserService>,
    reputation: Arc<dyn ReputationService>,
    notifications: Arc<dyn NotificationService>,
    communities: Arc<dyn CommunityService>,
    posts: Arc<dyn PostService>,
    events: Arc<dyn EventService>,
    reports: Arc<dyn ReportService>,
    badges: Arc<dyn BadgeService>,
    assistant: Arc<dyn AssistantService>,
}

impl Services {
    /// Wire every service over one connection pool.
    ///
    /// `model` and `queue` are optional: without a model the assistant
    /// degrades, without a queue no e-mails are sent.
    pub fn from_connection(
        db: sea_orm::DatabaseConnection,
        config: Config,
        model: Option<Arc<dyn LanguageModel>>,
        queue: Option<Arc<dyn JobQueue>>,
    ) -> Self {
        let uow = Arc::new(Persistence::new(db));

        let notifications: Arc<dyn NotificationService> =
            Arc::new(NotificationManager::new(uow.clone(), queue));
        let reputation: Arc<dyn ReputationService> =
            Arc::new(ReputationManager::new(uow.clone(), notifications.clone()));
        let assistant: Arc<dyn AssistantService> =
            Arc::new(AssistantManager::new(uow.clone(), model));

        Self {
            auth: Arc::new(Authenticator::new(uow.clone(), config)),
            users: Arc::new(UserManager::new(uow.clone(), reputation.clone())),
            communities: Arc::new(CommunityManager::new(
                uow.clone(),
                reputation.clone(),
                notifications.clone(),
            )),
            posts: Arc::new(PostManager::new(
                uow.clone(),
                reputation.clone(),
                assistant.clone(),
            )),
            events: Arc::new(EventManager::new(
                uow.clone(),
                reputation.clone(),
                notifications.clone(),
            )),
            reports: Arc::new(ReportManager::new(
                uow.clone(),
                reputation.clone(),
                notifications.clone(),
            )),
            badges: Arc::new(BadgeManager::new(uow, notifications.clone())),
            reputation,
            notifications,
            assistant,
        }
    }
}

impl ServiceContainer for Services {
    fn auth(&self) -> Arc<dyn AuthService> {
        self.auth.clone()
    }

    fn users(&self) -> Arc<dyn UserService> {
        self.users.clone()
    }

    fn reputation(&self) -> Arc<dyn ReputationService> {
        self.reputation.clone()
    }

    fn notifications(&self) -> Arc<dyn NotificationService> {
        self.notifications.clone()
    }

    fn communities(&self) -> Arc<dyn CommunityService> {
        self.communities.clone()
    }

    fn posts(&self) -> Arc<dyn PostService> {
        self.posts.clone()
    }

    fn events(&self) -> Arc<dyn EventService> {
        self.events.clone()
    }

    fn reports(&self) -> Arc<dyn ReportService> {
        self.reports.clone()
    }

    fn badges(&self) -> Arc<dyn BadgeService> {
        self.badges.clone()
    }

    fn assistant(&self) -> Arc<dyn AssistantService> {
        self.assistant.clone()
    }
}

/// Parallel execution utilities for running independent operations concurrently.
pub mod parallel {
    use super::*;
    use tokio::try_join;

    /// Execute two independent async operations in parallel.
    ///
    /// If either operation fails, the error is returned immediately.
    pub async fn join2<F1, F2, T1, T2>(f1: F1, f2: F2) -> AppResult<(T1, T2)>
    where
        F1: Future<Output = AppResult<T1>>,
        F2: Future<Output = AppResult<T2>>,
    {
        try_join!(f1, f2)
    }

    /// Execute three independent async operations in parallel.
    pub async fn join3<F1, F2, F3, T1, T2, T3>(
        f1: F1,
        f2: F2,
        f3: F3,
    ) -> AppResult<(T1, T2, T3)>
    where
        F1: Future<Output = AppResult<T1>>,
        F2: Future<Output = AppResult<T2>>,
        F3: Future<Output = AppResult<T3>>,
    {
        try_join!(f1, f2, f3)
    }

    /// Execute operations with at most `limit` in flight.
    ///
    /// Results come back in completion order, not input order.
    pub async fn join_all_limited<F, T, I>(futures: I, limit: usize) -> AppResult<Vec<T>>
    where
        F: Future<Output = AppResult<T>>,
        I: IntoIterator<Item = F>,
    {
        use futures::stream::{self, StreamExt, TryStreamExt};

        let futures: Vec<AppResult<F>> = futures.into_iter().map(Ok).collect();
        stream::iter(futures)
            .try_buffer_unordered(limit.max(1))
            .try_collect()
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::AppError;

    #[tokio::test]
    async fn test_parallel_join2() {
        async fn op1() -> AppResult<i32> {
            Ok(1)
        }
        async fn op2() -> AppResult<i32> {
            Ok(2)
        }

        let (a, b) = parallel::join2(op1(), op2()).await.unwrap();
        assert_eq!(a, 1);
        assert_eq!(b, 2);
    }

    #[tokio::test]
    async fn test_parallel_join3_short_circuits() {
        let result = parallel::join3(
            async { Ok::<_, AppError>(1) },
            async { Err::<i32, _>(AppError::NotFound) },
            async { Ok::<_, AppError>(3) },
        )
        .await;
        assert!(matches!(result, Err(AppError::NotFound)));
    }

    #[tokio::test]
    async fn test_join_all_limited_collects_everything() {
        let futures = (0..10).map(|i| async move { Ok::<_, AppError>(i) });
        let mut results = parallel::join_all_limited(futures, 3).await.unwrap();
        results.sort();
        assert_eq!(results, (0..10).collect::<Vec<_>>());
    }
}
