//! Notification service - In-app notifications and their e-mail copies.

use async_trait::async_trait;
use std::sync::Arc;
use uuid::Uuid;

use super::container::parallel;
use crate::config::NOTIFICATION_FANOUT_CONCURRENCY;
use crate::domain::{NewNotification, Notification, NotificationKind};
use crate::errors::{AppError, AppResult};
use crate::infra::{JobQueue, UnitOfWork};
use crate::jobs::NotificationEmailJob;
use crate::types::{Paginated, PaginationParams};

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait NotificationService: Send + Sync {
    /// Store a notification, queueing an e-mail for kinds that send one
    async fn notify(&self, notification: NewNotification) -> AppResult<Notification>;

    /// Send the same message to several users; returns how many were stored
    async fn notify_many(
        &self,
        user_ids: Vec<Uuid>,
        kind: NotificationKind,
        message: String,
        link: Option<String>,
    ) -> AppResult<usize>;

    async fn list(
        &self,
        user_id: Uuid,
        unread_only: bool,
        params: PaginationParams,
    ) -> AppResult<Paginated<Notification>>;

    async fn mark_read(&self, user_id: Uuid, id: Uuid) -> AppResult<()>;

    /// Returns the number of notifications marked
    async fn mark_all_read(&self, user_id: Uuid) -> AppResult<u64>;
}

/// Notify after the main action already succeeded; failures are logged.
pub async fn deliver(notifications: &dyn NotificationService, notification: NewNotification) {
    let user_id = notification.user_id;
    let kind = notification.kind;
    if let Err(e) = notifications.notify(notification).await {
        tracing::warn!(
            user_id = %user_id,
            kind = kind.as_str(),
            error = %e,
            "Failed to deliver notification"
        );
    }
}

fn email_subject(kind: NotificationKind) -> &'static str {
    match kind {
        NotificationKind::ReportFlagged => "Content in your community needs review",
        NotificationKind::Banned => "You have been banned from a community",
        NotificationKind::ContentRemoved => "Your content was removed",
        NotificationKind::LevelUp => "You reached a new level",
        NotificationKind::BadgePurchased => "Badge purchased",
        NotificationKind::RoleChanged => "Your community role changed",
        NotificationKind::EventCreated => "New event in your community",
    }
}

pub struct NotificationManager<U: UnitOfWork> {
    uow: Arc<U>,
    queue: Option<Arc<dyn JobQueue>>,
}

impl<U: UnitOfWork> NotificationManager<U> {
    /// Without a queue, notifications are stored in-app only
    pub fn new(uow: Arc<U>, queue: Option<Arc<dyn JobQueue>>) -> Self {
        Self { uow, queue }
    }

    async fn queue_email(&self, notification: &Notification) -> AppResult<()> {
        let Some(queue) = self.queue.as_ref() else {
            return Ok(());
        };
        let Some(user) = self.uow.users().find_by_id(notification.user_id).await? else {
            return Ok(());
        };

        let body = match &notification.link {
            Some(link) => format!("{}\n\n{}", notification.message, link),
            None => notification.message.clone(),
        };
        queue
            .enqueue_email(NotificationEmailJob::new(
                user.email,
                email_subject(notification.kind),
                body,
            ))
            .await
    }
}

#[async_trait]
impl<U: UnitOfWork> NotificationService for NotificationManager<U> {
    async fn notify(&self, notification: NewNotification) -> AppResult<Notification> {
        let stored = self.uow.notifications().create(notification).await?;

        if stored.kind.sends_email() {
            if let Err(e) = self.queue_email(&stored).await {
                tracing::warn!(
                    notification_id = %stored.id,
                    error = %e,
                    "Failed to queue notification email"
                );
            }
        }

        Ok(stored)
    }

    async fn notify_many(
        &self,
        user_ids: Vec<Uuid>,
        kind: NotificationKind,
        message: String,
        link: Option<String>,
    ) -> AppResult<usize> {
        let deliveries = user_ids.into_iter().map(|user_id| {
            let notification = NewNotification {
                user_id,
                kind,
                message: message.clone(),
                link: link.clone(),
            };
            async move {
                match self.notify(notification).await {
                    Ok(_) => Ok::<_, AppError>(true),
                    Err(e) => {
                        tracing::warn!(user_id = %user_id, error = %e, "Notification failed");
                        Ok(false)
                    }
                }
            }
        });

        let results =
            parallel::join_all_limited(deliveries, NOTIFICATION_FANOUT_CONCURRENCY).await?;
        Ok(results.into_iter().filter(|delivered| *delivered).count())
    }

    async fn list(
        &self,
        user_id: Uuid,
        unread_only: bool,
        params: PaginationParams,
    ) -> AppResult<Paginated<Notification>> {
        let (rows, total) = self
            .uow
            .notifications()
            .list(user_id, unread_only, params)
            .await?;
        Ok(Paginated::new(rows, &params, total))
    }

    async fn mark_read(&self, user_id: Uuid, id: Uuid) -> AppResult<()> {
        if self.uow.notifications().mark_read(user_id, id).await? {
            Ok(())
        } else {
            Err(AppError::Missing("Notification".into()))
        }
    }

    async fn mark_all_read(&self, user_id: Uuid) -> AppResult<u64> {
        self.uow.notifications().mark_all_read(user_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{User, UserRole};
    use crate::infra::{MockJobQueue, MockRepos};
    use chrono::Utc;

    fn stored(new: NewNotification) -> Notification {
        Notification {
            id: Uuid::new_v4(),
            user_id: new.user_id,
            kind: new.kind,
            message: new.message,
            link: new.link,
            read_at: None,
            created_at: Utc::now(),
        }
    }

    fn user(id: Uuid) -> User {
        User {
            id,
            email: "mod@example.com".into(),
            password_hash: String::new(),
            name: "Mod".into(),
            bio: None,
            interests: vec![],
            role: UserRole::User,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            deleted_at: None,
        }
    }

    #[tokio::test]
    async fn test_flagged_notification_queues_email() {
        let user_id = Uuid::new_v4();
        let mut repos = MockRepos::default();
        repos
            .notifications
            .expect_create()
            .times(1)
            .returning(|n| Ok(stored(n)));
        repos
            .users
            .expect_find_by_id()
            .returning(|id| Ok(Some(user(id))));

        let mut queue = MockJobQueue::new();
        queue
            .expect_enqueue_email()
            .withf(|job| job.to == "mod@example.com" && job.body.contains("/reports"))
            .times(1)
            .returning(|_| Ok(()));

        let service = NotificationManager::new(repos.into_uow(), Some(Arc::new(queue)));
        let notification = service
            .notify(
                NewNotification::new(user_id, NotificationKind::ReportFlagged, "A post was flagged")
                    .with_link("/reports"),
            )
            .await
            .unwrap();

        assert_eq!(notification.kind, NotificationKind::ReportFlagged);
    }

    #[tokio::test]
    async fn test_in_app_only_kinds_skip_email() {
        let mut repos = MockRepos::default();
        repos
            .notifications
            .expect_create()
            .returning(|n| Ok(stored(n)));

        let mut queue = MockJobQueue::new();
        queue.expect_enqueue_email().never();

        let service = NotificationManager::new(repos.into_uow(), Some(Arc::new(queue)));
        service
            .notify(NewNotification::new(
                Uuid::new_v4(),
                NotificationKind::LevelUp,
                "Level up",
            ))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_queue_failure_does_not_fail_notify() {
        let mut repos = MockRepos::default();
        repos
            .notifications
            .expect_create()
            .returning(|n| Ok(stored(n)));
        repos
            .users
            .expect_find_by_id()
            .returning(|id| Ok(Some(user(id))));

        let mut queue = MockJobQueue::new();
        queue
            .expect_enqueue_email()
            .returning(|_| Err(AppError::internal("queue down")));

        let service = NotificationManager::new(repos.into_uow(), Some(Arc::new(queue)));
        let result = service
            .notify(NewNotification::new(
                Uuid::new_v4(),
                NotificationKind::Banned,
                "Banned",
            ))
            .await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_notify_many_counts_successes() {
        let failing = Uuid::new_v4();
        let mut repos = MockRepos::default();
        repos.notifications.expect_create().returning(move |n| {
            if n.user_id == failing {
                Err(AppError::internal("insert failed"))
            } else {
                Ok(stored(n))
            }
        });

        let service = NotificationManager::new(repos.into_uow(), None);
        let delivered = service
            .notify_many(
                vec![Uuid::new_v4(), failing, Uuid::new_v4()],
                NotificationKind::EventCreated,
                "New event".into(),
                None,
            )
            .await
            .unwrap();
        assert_eq!(delivered, 2);
    }

    #[tokio::test]
    async fn test_mark_read_unknown_is_not_found() {
        let mut repos = MockRepos::default();
        repos
            .notifications
            .expect_mark_read()
            .returning(|_, _| Ok(false));

        let service = NotificationManager::new(repos.into_uow(), None);
        let result = service.mark_read(Uuid::new_v4(), Uuid::new_v4()).await;
        assert!(matches!(result, Err(AppError::Missing(ref e)) if e == "Notification"));
    }
}
