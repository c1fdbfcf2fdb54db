//! Notification repository.

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, Set,
};
use uuid::Uuid;

use super::entities::notification::{self, Entity as NotificationEntity};
use crate::domain::{NewNotification, Notification};
use crate::errors::AppResult;
use crate::types::PaginationParams;

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait NotificationRepository: Send + Sync {
    async fn create(&self, new: NewNotification) -> AppResult<Notification>;

    /// Newest first, with the unpaginated total
    async fn list(
        &self,
        user_id: Uuid,
        unread_only: bool,
        params: PaginationParams,
    ) -> AppResult<(Vec<Notification>, u64)>;

    /// Mark one of the user's notifications read; `false` if it does not exist
    async fn mark_read(&self, user_id: Uuid, id: Uuid) -> AppResult<bool>;

    /// Returns the number of notifications changed
    async fn mark_all_read(&self, user_id: Uuid) -> AppResult<u64>;
}

pub struct NotificationStore {
    db: DatabaseConnection,
}

impl NotificationStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl NotificationRepository for NotificationStore {
    async fn create(&self, new: NewNotification) -> AppResult<Notification> {
        let model = notification::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(new.user_id),
            kind: Set(new.kind.as_str().to_string()),
            message: Set(new.message),
            link: Set(new.link),
            read_at: Set(None),
            created_at: Set(Utc::now()),
        }
        .insert(&self.db)
        .await?;

        Notification::try_from(model)
    }

    async fn list(
        &self,
        user_id: Uuid,
        unread_only: bool,
        params: PaginationParams,
    ) -> AppResult<(Vec<Notification>, u64)> {
        let mut query =
            NotificationEntity::find().filter(notification::Column::UserId.eq(user_id));
        if unread_only {
            query = query.filter(notification::Column::ReadAt.is_null());
        }

        let paginator = query
            .order_by_desc(notification::Column::CreatedAt)
            .paginate(&self.db, params.limit());
        let total = paginator.num_items().await?;
        let models = paginator.fetch_page(params.page_index()).await?;

        let notifications = models
            .into_iter()
            .map(Notification::try_from)
            .collect::<AppResult<Vec<_>>>()?;
        Ok((notifications, total))
    }

    async fn mark_read(&self, user_id: Uuid, id: Uuid) -> AppResult<bool> {
        let found = NotificationEntity::find_by_id(id)
            .filter(notification::Column::UserId.eq(user_id))
            .one(&self.db)
            .await?;

        match found {
            Some(model) if model.read_at.is_none() => {
                let mut active: notification::ActiveModel = model.into();
                active.read_at = Set(Some(Utc::now()));
                active.update(&self.db).await?;
                Ok(true)
            }
            // Already read
            Some(_) => Ok(true),
            None => Ok(false),
        }
    }

    async fn mark_all_read(&self, user_id: Uuid) -> AppResult<u64> {
        let result = NotificationEntity::update_many()
            .col_expr(notification::Column::ReadAt, Expr::value(Some(Utc::now())))
            .filter(notification::Column::UserId.eq(user_id))
            .filter(notification::Column::ReadAt.is_null())
            .exec(&self.db)
            .await?;
        Ok(result.rows_affected)
    }
}
