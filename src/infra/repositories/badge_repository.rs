//! Badge catalog and ownership repository.

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{
    sea_query::{Expr, Func},
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DatabaseTransaction, EntityTrait,
    FromQueryResult, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use uuid::Uuid;

use super::entities::{
    badge::{self, Entity as BadgeEntity},
    point_transaction::{self, Entity as PointEntity},
    user::Entity as UserEntity,
    user_badge::{self, Entity as UserBadgeEntity},
};
use crate::domain::{Badge, NewBadge, OwnedBadge, REASON_BADGE_PURCHASE};
use crate::errors::{AppError, AppResult, OptionExt};

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait BadgeRepository: Send + Sync {
    /// Cheapest first
    async fn list(&self) -> AppResult<Vec<Badge>>;

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Badge>>;

    /// Case-insensitive name lookup
    async fn find_by_name(&self, name: &str) -> AppResult<Option<Badge>>;

    async fn create(&self, new: NewBadge) -> AppResult<Badge>;

    /// Badges the user owns, most recent purchase first
    async fn owned(&self, user_id: Uuid) -> AppResult<Vec<OwnedBadge>>;

    async fn owns(&self, user_id: Uuid, badge_id: Uuid) -> AppResult<bool>;

    /// Debit the price and grant the badge in one transaction.
    ///
    /// The buyer's user row is locked so concurrent purchases see each
    /// other's debits. Fails with a conflict when already owned and a
    /// validation error when the balance is short.
    async fn purchase(&self, user_id: Uuid, badge: Badge) -> AppResult<OwnedBadge>;
}

pub struct BadgeStore {
    db: DatabaseConnection,
}

impl BadgeStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[derive(Debug, FromQueryResult)]
struct BalanceRow {
    balance: i64,
}

async fn balance_in(txn: &DatabaseTransaction, user_id: Uuid) -> AppResult<i64> {
    let row = PointEntity::find()
        .select_only()
        .column_as(Expr::cust("COALESCE(SUM(amount), 0)::BIGINT"), "balance")
        .filter(point_transaction::Column::UserId.eq(user_id))
        .into_model::<BalanceRow>()
        .one(txn)
        .await?;
    Ok(row.map(|r| r.balance).unwrap_or(0))
}

#[async_trait]
impl BadgeRepository for BadgeStore {
    async fn list(&self) -> AppResult<Vec<Badge>> {
        let models = BadgeEntity::find()
            .order_by_asc(badge::Column::Price)
            .order_by_asc(badge::Column::Name)
            .all(&self.db)
            .await?;
        Ok(models.into_iter().map(Badge::from).collect())
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Badge>> {
        let model = BadgeEntity::find_by_id(id).one(&self.db).await?;
        Ok(model.map(Badge::from))
    }

    async fn find_by_name(&self, name: &str) -> AppResult<Option<Badge>> {
        let model = BadgeEntity::find()
            .filter(
                Expr::expr(Func::lower(Expr::col(badge::Column::Name)))
                    .eq(name.trim().to_lowercase()),
            )
            .one(&self.db)
            .await?;
        Ok(model.map(Badge::from))
    }

    async fn create(&self, new: NewBadge) -> AppResult<Badge> {
        let model = badge::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(new.name),
            description: Set(new.description),
            icon: Set(new.icon),
            price: Set(new.price),
            created_at: Set(Utc::now()),
        }
        .insert(&self.db)
        .await?;
        Ok(Badge::from(model))
    }

    async fn owned(&self, user_id: Uuid) -> AppResult<Vec<OwnedBadge>> {
        let rows = UserBadgeEntity::find()
            .filter(user_badge::Column::UserId.eq(user_id))
            .find_also_related(BadgeEntity)
            .order_by_desc(user_badge::Column::PurchasedAt)
            .all(&self.db)
            .await?;

        Ok(rows
            .into_iter()
            .filter_map(|(owned, badge)| {
                badge.map(|b| OwnedBadge {
                    badge: Badge::from(b),
                    purchased_at: owned.purchased_at,
                })
            })
            .collect())
    }

    async fn owns(&self, user_id: Uuid, badge_id: Uuid) -> AppResult<bool> {
        let count = UserBadgeEntity::find()
            .filter(user_badge::Column::UserId.eq(user_id))
            .filter(user_badge::Column::BadgeId.eq(badge_id))
            .count(&self.db)
            .await?;
        Ok(count > 0)
    }

    async fn purchase(&self, user_id: Uuid, badge: Badge) -> AppResult<OwnedBadge> {
        let txn = self.db.begin().await?;

        UserEntity::find_by_id(user_id)
            .lock_exclusive()
            .one(&txn)
            .await?
            .ok_or_missing("User")?;

        let already_owned = UserBadgeEntity::find()
            .filter(user_badge::Column::UserId.eq(user_id))
            .filter(user_badge::Column::BadgeId.eq(badge.id))
            .count(&txn)
            .await?
            > 0;
        if already_owned {
            return Err(AppError::conflict("Badge already owned"));
        }

        let balance = balance_in(&txn, user_id).await?;
        if balance < badge.price {
            return Err(AppError::validation(format!(
                "Insufficient points: badge costs {}, balance is {}",
                badge.price, balance
            )));
        }

        let now = Utc::now();
        point_transaction::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(user_id),
            amount: Set(-badge.price),
            reason: Set(REASON_BADGE_PURCHASE.to_string()),
            reference_id: Set(Some(badge.id)),
            created_at: Set(now),
        }
        .insert(&txn)
        .await?;

        user_badge::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(user_id),
            badge_id: Set(badge.id),
            purchased_at: Set(now),
        }
        .insert(&txn)
        .await?;

        txn.commit().await?;

        Ok(OwnedBadge {
            badge,
            purchased_at: now,
        })
    }
}
