//! Badge service - Catalog and purchases paid from the points balance.

use async_trait::async_trait;
use std::sync::Arc;
use uuid::Uuid;

use super::notification_service::{deliver, NotificationService};
use crate::domain::{Actor, Badge, NewBadge, NewNotification, NotificationKind, OwnedBadge};
use crate::errors::{AppError, AppResult, OptionExt};
use crate::infra::UnitOfWork;

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait BadgeService: Send + Sync {
    async fn catalog(&self) -> AppResult<Vec<Badge>>;

    async fn get(&self, id: Uuid) -> AppResult<Badge>;

    /// Platform admins only
    async fn create(&self, actor: Actor, new: NewBadge) -> AppResult<Badge>;

    async fn purchase(&self, actor: Actor, id: Uuid) -> AppResult<OwnedBadge>;

    async fn owned(&self, user_id: Uuid) -> AppResult<Vec<OwnedBadge>>;
}

pub struct BadgeManager<U: UnitOfWork> {
    uow: Arc<U>,
    notifications: Arc<dyn NotificationService>,
}

impl<U: UnitOfWork> BadgeManager<U> {
    pub fn new(uow: Arc<U>, notifications: Arc<dyn NotificationService>) -> Self {
        Self { uow, notifications }
    }
}

#[async_trait]
impl<U: UnitOfWork> BadgeService for BadgeManager<U> {
    async fn catalog(&self) -> AppResult<Vec<Badge>> {
        self.uow.badges().list().await
    }

    async fn get(&self, id: Uuid) -> AppResult<Badge> {
        self.uow.badges().find_by_id(id).await?.ok_or_missing("Badge")
    }

    async fn create(&self, actor: Actor, new: NewBadge) -> AppResult<Badge> {
        if !actor.is_admin() {
            return Err(AppError::forbidden("Only platform admins can create badges"));
        }
        let name = new.name.trim().to_string();
        if name.is_empty() {
            return Err(AppError::validation("Name is required"));
        }
        if new.price < 0 {
            return Err(AppError::validation("Price cannot be negative"));
        }
        if self.uow.badges().find_by_name(&name).await?.is_some() {
            return Err(AppError::conflict("A badge with this name already exists"));
        }

        let badge = self
            .uow
            .badges()
            .create(NewBadge {
                name,
                description: new.description.trim().to_string(),
                icon: new.icon.filter(|i| !i.trim().is_empty()),
                price: new.price,
            })
            .await?;
        tracing::info!(badge_id = %badge.id, price = badge.price, "Badge created");
        Ok(badge)
    }

    async fn purchase(&self, actor: Actor, id: Uuid) -> AppResult<OwnedBadge> {
        let badge = self.get(id).await?;
        let badges = self.uow.badges();

        // Fast rejections; the store re-checks both under a row lock
        if badges.owns(actor.id, id).await? {
            return Err(AppError::conflict("Badge already owned"));
        }
        let balance = self.uow.points().totals(actor.id).await?.balance;
        if balance < badge.price {
            return Err(AppError::validation(format!(
                "Insufficient points: badge costs {}, balance is {}",
                badge.price, balance
            )));
        }

        let owned = badges.purchase(actor.id, badge).await?;
        tracing::info!(
            user_id = %actor.id,
            badge_id = %id,
            price = owned.badge.price,
            "Badge purchased"
        );

        deliver(
            self.notifications.as_ref(),
            NewNotification::new(
                actor.id,
                NotificationKind::BadgePurchased,
                format!("You bought the {} badge", owned.badge.name),
            )
            .with_link("/user/badges"),
        )
        .await;

        Ok(owned)
    }

    async fn owned(&self, user_id: Uuid) -> AppResult<Vec<OwnedBadge>> {
        self.uow.badges().owned(user_id).await
    }
}
