//! Report repository.
//!
//! `resolve` closes every open report on a target and applies the
//! moderation action inside one transaction. A partial unique index keeps
//! one open report per reporter and target.

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection,
    DatabaseTransaction, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set,
    TransactionTrait,
};
use uuid::Uuid;

use super::entities::{
    community_member::{self, Entity as MemberEntity},
    event::Entity as EventEntity,
    post::Entity as PostEntity,
    report::{self, Entity as ReportEntity},
};
use crate::domain::{
    MemberRole, ModerationAction, NewReport, Report, ReportStatus, ReportTarget, Resolution,
};
use crate::errors::{conflict_on_duplicate, AppError, AppResult};
use crate::types::PaginationParams;

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait ReportRepository: Send + Sync {
    async fn create(&self, new: NewReport) -> AppResult<Report>;

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Report>>;

    /// The reporter's open report on the target, if any
    async fn find_open_by_reporter(
        &self,
        reporter_id: Uuid,
        community_id: Uuid,
        target_type: ReportTarget,
        target_id: Uuid,
    ) -> AppResult<Option<Report>>;

    /// Open reports against one target within a community
    async fn count_open(
        &self,
        community_id: Uuid,
        target_type: ReportTarget,
        target_id: Uuid,
    ) -> AppResult<u64>;

    /// Move the target's pending reports to `under_review`.
    ///
    /// Returns true when none of the target's open reports were under
    /// review before, i.e. this call flagged the target.
    async fn mark_under_review(
        &self,
        community_id: Uuid,
        target_type: ReportTarget,
        target_id: Uuid,
    ) -> AppResult<bool>;

    /// Newest first. `community_ids` of `None` means every community.
    async fn list(
        &self,
        community_ids: Option<Vec<Uuid>>,
        status: Option<ReportStatus>,
        params: PaginationParams,
    ) -> AppResult<(Vec<Report>, u64)>;

    /// Close the target's open reports and apply the action. Returns the closed reports.
    async fn resolve(&self, resolution: Resolution) -> AppResult<Vec<Report>>;
}

pub struct ReportStore {
    db: DatabaseConnection,
}

impl ReportStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

fn target_condition(community_id: Uuid, target_type: ReportTarget, target_id: Uuid) -> Condition {
    Condition::all()
        .add(report::Column::CommunityId.eq(community_id))
        .add(report::Column::TargetType.eq(target_type.as_str()))
        .add(report::Column::TargetId.eq(target_id))
}

fn open_statuses() -> Vec<&'static str> {
    ReportStatus::OPEN.iter().map(|s| s.as_str()).collect()
}

fn to_reports(models: Vec<report::Model>) -> AppResult<Vec<Report>> {
    models.into_iter().map(Report::try_from).collect()
}

/// Ban `user_id` from the community, creating the membership row if needed
async fn ban_member(txn: &DatabaseTransaction, community_id: Uuid, user_id: Uuid) -> AppResult<()> {
    let existing = MemberEntity::find()
        .filter(community_member::Column::CommunityId.eq(community_id))
        .filter(community_member::Column::UserId.eq(user_id))
        .one(txn)
        .await?;

    match existing {
        Some(model) => {
            let mut active: community_member::ActiveModel = model.into();
            active.role = Set(MemberRole::Banned.as_str().to_string());
            active.update(txn).await?;
        }
        None => {
            community_member::ActiveModel {
                id: Set(Uuid::new_v4()),
                community_id: Set(community_id),
                user_id: Set(user_id),
                role: Set(MemberRole::Banned.as_str().to_string()),
                joined_at: Set(Utc::now()),
            }
            .insert(txn)
            .await?;
        }
    }
    Ok(())
}

/// Remove the reported post, event or membership
async fn delete_target(
    txn: &DatabaseTransaction,
    community_id: Uuid,
    target_type: ReportTarget,
    target_id: Uuid,
) -> AppResult<()> {
    match target_type {
        ReportTarget::Post => {
            PostEntity::delete_by_id(target_id).exec(txn).await?;
        }
        ReportTarget::Event => {
            EventEntity::delete_by_id(target_id).exec(txn).await?;
        }
        ReportTarget::User => {
            MemberEntity::delete_many()
                .filter(community_member::Column::CommunityId.eq(community_id))
                .filter(community_member::Column::UserId.eq(target_id))
                .exec(txn)
                .await?;
        }
    }
    Ok(())
}

#[async_trait]
impl ReportRepository for ReportStore {
    async fn create(&self, new: NewReport) -> AppResult<Report> {
        let model = report::ActiveModel {
            id: Set(Uuid::new_v4()),
            community_id: Set(new.community_id),
            reporter_id: Set(new.reporter_id),
            target_type: Set(new.target_type.as_str().to_string()),
            target_id: Set(new.target_id),
            reason: Set(new.reason),
            details: Set(new.details),
            status: Set(ReportStatus::Pending.as_str().to_string()),
            resolution: Set(None),
            resolution_note: Set(None),
            resolved_by: Set(None),
            created_at: Set(Utc::now()),
            resolved_at: Set(None),
        }
        .insert(&self.db)
        .await
        .map_err(conflict_on_duplicate("You have already reported this"))?;

        Report::try_from(model)
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Report>> {
        ReportEntity::find_by_id(id)
            .one(&self.db)
            .await?
            .map(Report::try_from)
            .transpose()
    }

    async fn find_open_by_reporter(
        &self,
        reporter_id: Uuid,
        community_id: Uuid,
        target_type: ReportTarget,
        target_id: Uuid,
    ) -> AppResult<Option<Report>> {
        ReportEntity::find()
            .filter(target_condition(community_id, target_type, target_id))
            .filter(report::Column::ReporterId.eq(reporter_id))
            .filter(report::Column::Status.is_in(open_statuses()))
            .one(&self.db)
            .await?
            .map(Report::try_from)
            .transpose()
    }

    async fn count_open(
        &self,
        community_id: Uuid,
        target_type: ReportTarget,
        target_id: Uuid,
    ) -> AppResult<u64> {
        let count = ReportEntity::find()
            .filter(target_condition(community_id, target_type, target_id))
            .filter(report::Column::Status.is_in(open_statuses()))
            .count(&self.db)
            .await?;
        Ok(count)
    }

    async fn mark_under_review(
        &self,
        community_id: Uuid,
        target_type: ReportTarget,
        target_id: Uuid,
    ) -> AppResult<bool> {
        let txn = self.db.begin().await?;

        // Concurrent submits on the same target queue up here
        let open = ReportEntity::find()
            .filter(target_condition(community_id, target_type, target_id))
            .filter(report::Column::Status.is_in(open_statuses()))
            .lock_exclusive()
            .all(&txn)
            .await?;
        let already_flagged = open
            .iter()
            .any(|m| m.status == ReportStatus::UnderReview.as_str());

        ReportEntity::update_many()
            .col_expr(
                report::Column::Status,
                Expr::value(ReportStatus::UnderReview.as_str()),
            )
            .filter(target_condition(community_id, target_type, target_id))
            .filter(report::Column::Status.eq(ReportStatus::Pending.as_str()))
            .exec(&txn)
            .await?;

        txn.commit().await?;
        Ok(!already_flagged)
    }

    async fn list(
        &self,
        community_ids: Option<Vec<Uuid>>,
        status: Option<ReportStatus>,
        params: PaginationParams,
    ) -> AppResult<(Vec<Report>, u64)> {
        let mut query = ReportEntity::find();
        if let Some(ids) = community_ids {
            query = query.filter(report::Column::CommunityId.is_in(ids));
        }
        if let Some(status) = status {
            query = query.filter(report::Column::Status.eq(status.as_str()));
        }

        let paginator = query
            .order_by_desc(report::Column::CreatedAt)
            .paginate(&self.db, params.limit());
        let total = paginator.num_items().await?;
        let models = paginator.fetch_page(params.page_index()).await?;

        Ok((to_reports(models)?, total))
    }

    async fn resolve(&self, resolution: Resolution) -> AppResult<Vec<Report>> {
        let txn = self.db.begin().await?;

        let open = ReportEntity::find()
            .filter(target_condition(
                resolution.community_id,
                resolution.target_type,
                resolution.target_id,
            ))
            .filter(report::Column::Status.is_in(open_statuses()))
            .lock_exclusive()
            .all(&txn)
            .await?;

        // Another moderator closed them first
        if open.is_empty() {
            return Err(AppError::conflict("Report has already been resolved"));
        }

        let ids: Vec<Uuid> = open.iter().map(|m| m.id).collect();
        let now = Utc::now();
        ReportEntity::update_many()
            .col_expr(
                report::Column::Status,
                Expr::value(resolution.action.resulting_status().as_str()),
            )
            .col_expr(
                report::Column::Resolution,
                Expr::value(Some(resolution.action.as_str())),
            )
            .col_expr(
                report::Column::ResolutionNote,
                Expr::value(resolution.note.clone()),
            )
            .col_expr(report::Column::ResolvedBy, Expr::value(Some(resolution.resolved_by)))
            .col_expr(report::Column::ResolvedAt, Expr::value(Some(now)))
            .filter(report::Column::Id.is_in(ids.clone()))
            .exec(&txn)
            .await?;

        match resolution.action {
            ModerationAction::Ban => {
                if let Some(offender_id) = resolution.offender_id {
                    ban_member(&txn, resolution.community_id, offender_id).await?;
                }
            }
            ModerationAction::Delete => {
                delete_target(
                    &txn,
                    resolution.community_id,
                    resolution.target_type,
                    resolution.target_id,
                )
                .await?;
            }
            ModerationAction::Dismiss => {}
        }

        let closed = ReportEntity::find()
            .filter(report::Column::Id.is_in(ids))
            .order_by_asc(report::Column::CreatedAt)
            .all(&txn)
            .await?;

        txn.commit().await?;
        to_reports(closed)
    }
}
