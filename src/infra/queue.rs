//! Job queue used by services to hand work to the background worker.

use apalis::prelude::Storage;
use apalis_sql::postgres::PostgresStorage;
use apalis_sql::sqlx::PgPool;
use async_trait::async_trait;

use crate::config::JOB_NAME_NOTIFICATION_EMAIL;
use crate::errors::{AppError, AppResult};
use crate::jobs::NotificationEmailJob;

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait JobQueue: Send + Sync {
    async fn enqueue_email(&self, job: NotificationEmailJob) -> AppResult<()>;
}

/// Storage for notification e-mails, namespaced so the worker and
/// `jobs list` see the same rows.
pub fn notification_email_storage(pool: PgPool) -> PostgresStorage<NotificationEmailJob> {
    PostgresStorage::new_with_config(
        pool,
        apalis_sql::Config::new(JOB_NAME_NOTIFICATION_EMAIL),
    )
}

/// apalis Postgres storage shared with the `jobs work` worker
#[derive(Clone)]
pub struct PostgresQueue {
    emails: PostgresStorage<NotificationEmailJob>,
}

impl PostgresQueue {
    /// Prepare the apalis tables and open the e-mail queue.
    pub async fn connect(database_url: &str) -> AppResult<Self> {
        let pool = PgPool::connect(database_url)
            .await
            .map_err(|e| AppError::internal(format!("Failed to connect job queue: {}", e)))?;

        PostgresStorage::setup(&pool)
            .await
            .map_err(|e| AppError::internal(format!("Failed to setup job storage: {}", e)))?;

        Ok(Self {
            emails: notification_email_storage(pool),
        })
    }
}

#[async_trait]
impl JobQueue for PostgresQueue {
    async fn enqueue_email(&self, job: NotificationEmailJob) -> AppResult<()> {
        let mut storage = self.emails.clone();
        storage
            .push(job)
            .await
            .map_err(|e| AppError::internal(format!("Failed to enqueue email: {}", e)))?;
        Ok(())
    }
}
