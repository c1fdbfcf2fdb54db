//! Points ledger repository.

use async_trait::async_trait;
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection,
    EntityTrait, FromQueryResult, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set,
    TransactionTrait,
};
use uuid::Uuid;

use super::entities::{
    point_transaction::{self, Entity as PointEntity},
    user::Entity as UserEntity,
};
use crate::domain::{PointAward, PointTotals, PointTransaction};
use crate::errors::{AppResult, OptionExt};

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait PointsRepository: Send + Sync {
    /// Append a ledger entry and return it with the totals before and after.
    ///
    /// With a `reference`, at most one entry exists per user, reason and
    /// reference: a repeat returns `None` and writes nothing.
    async fn record(
        &self,
        user_id: Uuid,
        amount: i64,
        reason: String,
        reference: Option<Uuid>,
    ) -> AppResult<Option<PointAward>>;

    async fn totals(&self, user_id: Uuid) -> AppResult<PointTotals>;

    /// Newest entries first
    async fn recent(&self, user_id: Uuid, limit: u64) -> AppResult<Vec<PointTransaction>>;
}

pub struct PointsStore {
    db: DatabaseConnection,
}

impl PointsStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[derive(Debug, FromQueryResult)]
struct TotalsRow {
    balance: i64,
    earned: i64,
}

async fn totals_in<C: ConnectionTrait>(conn: &C, user_id: Uuid) -> AppResult<PointTotals> {
    let row = PointEntity::find()
        .select_only()
        .column_as(Expr::cust("COALESCE(SUM(amount), 0)::BIGINT"), "balance")
        .column_as(
            Expr::cust("COALESCE(SUM(amount) FILTER (WHERE amount > 0), 0)::BIGINT"),
            "earned",
        )
        .filter(point_transaction::Column::UserId.eq(user_id))
        .into_model::<TotalsRow>()
        .one(conn)
        .await?;

    Ok(row
        .map(|r| PointTotals {
            balance: r.balance,
            earned: r.earned,
        })
        .unwrap_or_default())
}

#[async_trait]
impl PointsRepository for PointsStore {
    async fn record(
        &self,
        user_id: Uuid,
        amount: i64,
        reason: String,
        reference: Option<Uuid>,
    ) -> AppResult<Option<PointAward>> {
        let txn = self.db.begin().await?;

        // Serializes a user's ledger writes so `before` stays accurate
        UserEntity::find_by_id(user_id)
            .lock_exclusive()
            .one(&txn)
            .await?
            .ok_or_missing("User")?;

        if let Some(reference_id) = reference {
            let already_recorded = PointEntity::find()
                .filter(point_transaction::Column::UserId.eq(user_id))
                .filter(point_transaction::Column::Reason.eq(reason.as_str()))
                .filter(point_transaction::Column::ReferenceId.eq(reference_id))
                .count(&txn)
                .await?
                > 0;
            if already_recorded {
                return Ok(None);
            }
        }

        let before = totals_in(&txn, user_id).await?;
        let model = point_transaction::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(user_id),
            amount: Set(amount),
            reason: Set(reason),
            reference_id: Set(reference),
            created_at: Set(chrono::Utc::now()),
        }
        .insert(&txn)
        .await?;

        txn.commit().await?;

        Ok(Some(PointAward {
            entry: PointTransaction::from(model),
            before,
            after: before.with_entry(amount),
        }))
    }

    async fn totals(&self, user_id: Uuid) -> AppResult<PointTotals> {
        totals_in(&self.db, user_id).await
    }

    async fn recent(&self, user_id: Uuid, limit: u64) -> AppResult<Vec<PointTransaction>> {
        let models = PointEntity::find()
            .filter(point_transaction::Column::UserId.eq(user_id))
            .order_by_desc(point_transaction::Column::CreatedAt)
            .limit(limit)
            .all(&self.db)
            .await?;
        Ok(models.into_iter().map(PointTransaction::from).collect())
    }
}
