//! Reputation service - Points ledger and levels.
//!
//! Awards are appended to the ledger; when an award lifts the user's
//! earned total over a level boundary a `level_up` notification follows.
//! Awards tied to a reference (an event for RSVPs) are paid once.

use async_trait::async_trait;
use std::sync::Arc;
use uuid::Uuid;

use super::notification_service::{deliver, NotificationService};
use crate::config::RECENT_POINT_TRANSACTIONS;
use crate::domain::{
    Activity, NewNotification, NotificationKind, PointTotals, PointsOverview, ReputationSummary,
};
use crate::errors::{AppError, AppResult};
use crate::infra::UnitOfWork;

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait ReputationService: Send + Sync {
    /// Record the activity's points and return the new summary
    async fn award(&self, user_id: Uuid, activity: Activity) -> AppResult<ReputationSummary>;

    /// Like `award`, but at most once per `reference`; `None` when already paid
    async fn award_once(
        &self,
        user_id: Uuid,
        activity: Activity,
        reference: Uuid,
    ) -> AppResult<Option<ReputationSummary>>;

    async fn summary(&self, user_id: Uuid) -> AppResult<ReputationSummary>;

    /// Summary plus the most recent ledger entries
    async fn overview(&self, user_id: Uuid) -> AppResult<PointsOverview>;
}

/// Award points after the main action already succeeded.
///
/// A failed award is logged and does not fail the caller's request.
pub async fn reward(reputation: &dyn ReputationService, user_id: Uuid, activity: Activity) {
    if let Err(e) = reputation.award(user_id, activity).await {
        tracing::warn!(
            user_id = %user_id,
            activity = ?activity,
            error = %e,
            "Failed to award points"
        );
    }
}

/// `reward` for awards paid once per `reference`
pub async fn reward_once(
    reputation: &dyn ReputationService,
    user_id: Uuid,
    activity: Activity,
    reference: Uuid,
) {
    if let Err(e) = reputation.award_once(user_id, activity, reference).await {
        tracing::warn!(
            user_id = %user_id,
            activity = ?activity,
            reference = %reference,
            error = %e,
            "Failed to award points"
        );
    }
}

pub struct ReputationManager<U: UnitOfWork> {
    uow: Arc<U>,
    notifications: Arc<dyn NotificationService>,
}

impl<U: UnitOfWork> ReputationManager<U> {
    pub fn new(uow: Arc<U>, notifications: Arc<dyn NotificationService>) -> Self {
        Self { uow, notifications }
    }

    async fn apply(
        &self,
        user_id: Uuid,
        activity: Activity,
        reference: Option<Uuid>,
    ) -> AppResult<Option<ReputationSummary>> {
        let amount = activity.points();
        let Some(award) = self
            .uow
            .points()
            .record(user_id, amount, activity.reason().to_string(), reference)
            .await?
        else {
            tracing::debug!(
                user_id = %user_id,
                activity = ?activity,
                "Points already awarded for this reference"
            );
            return Ok(None);
        };

        tracing::info!(
            user_id = %user_id,
            activity = ?activity,
            amount,
            earned = award.after.earned,
            "Points awarded"
        );

        if let Some(level) = award.level_reached() {
            deliver(
                self.notifications.as_ref(),
                NewNotification::new(
                    user_id,
                    NotificationKind::LevelUp,
                    format!("You reached the {} level!", level),
                )
                .with_link("/user/points"),
            )
            .await;
        }

        Ok(Some(ReputationSummary::from(award.after)))
    }
}

#[async_trait]
impl<U: UnitOfWork> ReputationService for ReputationManager<U> {
    async fn award(&self, user_id: Uuid, activity: Activity) -> AppResult<ReputationSummary> {
        self.apply(user_id, activity, None)
            .await?
            .ok_or_else(|| AppError::internal("Unreferenced award was not recorded"))
    }

    async fn award_once(
        &self,
        user_id: Uuid,
        activity: Activity,
        reference: Uuid,
    ) -> AppResult<Option<ReputationSummary>> {
        self.apply(user_id, activity, Some(reference)).await
    }

    async fn summary(&self, user_id: Uuid) -> AppResult<ReputationSummary> {
        let totals: PointTotals = self.uow.points().totals(user_id).await?;
        Ok(totals.into())
    }

    async fn overview(&self, user_id: Uuid) -> AppResult<PointsOverview> {
        let points = self.uow.points();
        let (totals, recent) = tokio::try_join!(
            points.totals(user_id),
            points.recent(user_id, RECENT_POINT_TRANSACTIONS)
        )?;

        Ok(PointsOverview {
            summary: totals.into(),
            recent,
        })
    }
}
