//! Report service - Member reports, the review threshold and moderator actions.
//!
//! Filing a report counts the open reports against the same target. Once
//! the count meets the threshold the target's reports move to
//! `under_review`; the report that first flags the target alerts the
//! community's moderators, later ones join the review silently.

use async_trait::async_trait;
use std::collections::BTreeSet;
use std::sync::Arc;
use uuid::Uuid;

use super::access::{active_membership, can_moderate, require_community, require_moderator};
use super::notification_service::{deliver, NotificationService};
use super::reputation_service::{reward, ReputationService};
use crate::domain::{
    threshold_reached, Activity, Actor, MemberRole, ModerationAction, NewNotification, NewReport,
    NotificationKind, Report, ReportOutcome, ReportStatus, ReportTarget, Resolution,
};
use crate::errors::{AppError, AppResult, OptionExt};
use crate::infra::UnitOfWork;
use crate::types::{Paginated, PaginationParams};

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait ReportService: Send + Sync {
    async fn submit(&self, actor: Actor, report: NewReport) -> AppResult<ReportOutcome>;

    /// Reports the caller may review; `community_id` narrows to one community
    async fn list(
        &self,
        actor: Actor,
        community_id: Option<Uuid>,
        status: Option<ReportStatus>,
        params: PaginationParams,
    ) -> AppResult<Paginated<Report>>;

    /// Close every open report on the reported target with `action`
    async fn act(
        &self,
        actor: Actor,
        report_id: Uuid,
        action: ModerationAction,
        note: Option<String>,
    ) -> AppResult<Vec<Report>>;
}

pub struct ReportManager<U: UnitOfWork> {
    uow: Arc<U>,
    reputation: Arc<dyn ReputationService>,
    notifications: Arc<dyn NotificationService>,
}

impl<U: UnitOfWork> ReportManager<U> {
    pub fn new(
        uow: Arc<U>,
        reputation: Arc<dyn ReputationService>,
        notifications: Arc<dyn NotificationService>,
    ) -> Self {
        Self {
            uow,
            reputation,
            notifications,
        }
    }

    /// User responsible for the target, `None` when the target is gone.
    /// Posts and events must belong to `community_id`.
    async fn offender(
        &self,
        community_id: Uuid,
        target_type: ReportTarget,
        target_id: Uuid,
    ) -> AppResult<Option<Uuid>> {
        let offender = match target_type {
            ReportTarget::Post => self
                .uow
                .posts()
                .find_by_id(target_id)
                .await?
                .filter(|p| p.community_id == community_id)
                .map(|p| p.author_id),
            ReportTarget::Event => self
                .uow
                .events()
                .find_by_id(target_id)
                .await?
                .filter(|e| e.community_id == community_id)
                .map(|e| e.created_by),
            ReportTarget::User => self
                .uow
                .communities()
                .membership(community_id, target_id)
                .await?
                .map(|m| m.user_id),
        };
        Ok(offender)
    }

    async fn alert_moderators(&self, report: &Report, community_name: &str) {
        let moderators = match self
            .uow
            .communities()
            .member_ids(
                report.community_id,
                vec![MemberRole::Admin, MemberRole::Moderator],
            )
            .await
        {
            Ok(ids) => ids,
            Err(e) => {
                tracing::warn!(report_id = %report.id, error = %e, "Could not load moderators");
                return;
            }
        };

        let message = format!(
            "A {} in {} was reported by enough members to need review",
            report.target_type.as_str(),
            community_name
        );
        if let Err(e) = self
            .notifications
            .notify_many(
                moderators,
                NotificationKind::ReportFlagged,
                message,
                Some(format!("/reports?community_id={}", report.community_id)),
            )
            .await
        {
            tracing::warn!(report_id = %report.id, error = %e, "Moderator alert failed");
        }
    }

    async fn notify_offender(
        &self,
        offender_id: Uuid,
        action: ModerationAction,
        target_type: ReportTarget,
        community_name: &str,
    ) {
        let (kind, message) = match (action, target_type) {
            (ModerationAction::Dismiss, _) => return,
            (ModerationAction::Ban, _) => (
                NotificationKind::Banned,
                format!("You have been banned from {}", community_name),
            ),
            (ModerationAction::Delete, ReportTarget::User) => (
                NotificationKind::ContentRemoved,
                format!("You were removed from {}", community_name),
            ),
            (ModerationAction::Delete, target) => (
                NotificationKind::ContentRemoved,
                format!(
                    "Your {} in {} was removed by a moderator",
                    target.as_str(),
                    community_name
                ),
            ),
        };

        deliver(
            self.notifications.as_ref(),
            NewNotification::new(offender_id, kind, message),
        )
        .await;
    }
}

#[async_trait]
impl<U: UnitOfWork> ReportService for ReportManager<U> {
    async fn submit(&self, actor: Actor, report: NewReport) -> AppResult<ReportOutcome> {
        let reason = report.reason.trim().to_string();
        if reason.is_empty() {
            return Err(AppError::validation("A reason is required"));
        }
        let (community_id, target_type, target_id) =
            (report.community_id, report.target_type, report.target_id);

        let community = require_community(self.uow.as_ref(), community_id).await?;
        active_membership(self.uow.as_ref(), community_id, actor.id).await?;

        let offender = self
            .offender(community_id, target_type, target_id)
            .await?
            .ok_or_else(|| AppError::Missing("Reported content".into()))?;
        if offender == actor.id {
            return Err(AppError::validation("You cannot report yourself"));
        }

        let reports = self.uow.reports();
        if reports
            .find_open_by_reporter(actor.id, community_id, target_type, target_id)
            .await?
            .is_some()
        {
            return Err(AppError::conflict("You have already reported this"));
        }

        let mut created = reports
            .create(NewReport {
                community_id,
                reporter_id: actor.id,
                target_type,
                target_id,
                reason,
                details: report
                    .details
                    .map(|d| d.trim().to_string())
                    .filter(|d| !d.is_empty()),
            })
            .await?;

        let communities = self.uow.communities();
        let (open_reports, members) = tokio::try_join!(
            reports.count_open(community_id, target_type, target_id),
            communities.count_members(community_id)
        )?;
        let flagged = threshold_reached(open_reports, members);

        tracing::info!(
            report_id = %created.id,
            community_id = %community_id,
            target_type = target_type.as_str(),
            target_id = %target_id,
            open_reports,
            members,
            flagged,
            "Report filed"
        );

        if flagged {
            let newly_flagged = reports
                .mark_under_review(community_id, target_type, target_id)
                .await?;
            created.status = ReportStatus::UnderReview;
            if newly_flagged {
                self.alert_moderators(&created, &community.name).await;
            }
        }

        Ok(ReportOutcome {
            report: created,
            open_reports,
            members,
            flagged,
        })
    }

    async fn list(
        &self,
        actor: Actor,
        community_id: Option<Uuid>,
        status: Option<ReportStatus>,
        params: PaginationParams,
    ) -> AppResult<Paginated<Report>> {
        let scope = match community_id {
            Some(id) => {
                require_moderator(self.uow.as_ref(), id, actor).await?;
                Some(vec![id])
            }
            None if actor.is_admin() => None,
            None => {
                let moderated: Vec<Uuid> = self
                    .uow
                    .communities()
                    .list_for_user(actor.id)
                    .await?
                    .into_iter()
                    .filter(|m| m.role.can_moderate())
                    .map(|m| m.community.id)
                    .collect();
                if moderated.is_empty() {
                    return Err(AppError::forbidden(
                        "Only community moderators can review reports",
                    ));
                }
                Some(moderated)
            }
        };

        let (rows, total) = self.uow.reports().list(scope, status, params).await?;
        Ok(Paginated::new(rows, &params, total))
    }

    async fn act(
        &self,
        actor: Actor,
        report_id: Uuid,
        action: ModerationAction,
        note: Option<String>,
    ) -> AppResult<Vec<Report>> {
        let report = self
            .uow
            .reports()
            .find_by_id(report_id)
            .await?
            .ok_or_missing("Report")?;
        if !report.status.is_open() {
            return Err(AppError::conflict("Report has already been resolved"));
        }
        if !can_moderate(self.uow.as_ref(), report.community_id, actor).await? {
            return Err(AppError::forbidden(
                "Only community moderators can act on reports",
            ));
        }
        let community = require_community(self.uow.as_ref(), report.community_id).await?;

        let offender = self
            .offender(report.community_id, report.target_type, report.target_id)
            .await?;

        if action.is_upheld() {
            let offender_id = offender.ok_or_else(|| {
                AppError::conflict("The reported content no longer exists; dismiss the report")
            })?;
            let removes_user =
                action == ModerationAction::Ban || report.target_type == ReportTarget::User;
            if removes_user {
                if offender_id == actor.id {
                    return Err(AppError::validation("You cannot ban or remove yourself"));
                }
                let offender_is_admin = self
                    .uow
                    .communities()
                    .membership(report.community_id, offender_id)
                    .await?
                    .is_some_and(|m| m.role.is_admin());
                if offender_is_admin && !actor.is_admin() {
                    return Err(AppError::forbidden(
                        "Community admins can only be removed by a platform admin",
                    ));
                }
            }
        }

        let closed = self
            .uow
            .reports()
            .resolve(Resolution {
                community_id: report.community_id,
                target_type: report.target_type,
                target_id: report.target_id,
                action,
                offender_id: offender,
                resolved_by: actor.id,
                note: note.map(|n| n.trim().to_string()).filter(|n| !n.is_empty()),
            })
            .await?;

        tracing::info!(
            report_id = %report_id,
            community_id = %report.community_id,
            action = action.as_str(),
            closed = closed.len(),
            resolved_by = %actor.id,
            "Reports resolved"
        );

        if action.is_upheld() {
            let reporters: BTreeSet<Uuid> = closed.iter().map(|r| r.reporter_id).collect();
            for reporter in reporters {
                reward(self.reputation.as_ref(), reporter, Activity::ReportUpheld).await;
            }
            if let Some(offender_id) = offender {
                self.notify_offender(offender_id, action, report.target_type, &community.name)
                    .await;
            }
        }

        Ok(closed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ReputationLevel, ReputationSummary, UserCommunity, UserRole};
    use crate::infra::{MockRepos, MockUnitOfWork};
    use crate::services::access::fixtures;
    use crate::services::{MockNotificationService, MockReputationService};
    use chrono::Utc;
    use mockall::predicate::*;

    fn summary() -> ReputationSummary {
        ReputationSummary {
            balance: 15,
            earned: 15,
            level: ReputationLevel::Newcomer,
            next_level: Some(ReputationLevel::Beginner),
            points_to_next_level: Some(10),
        }
    }

    fn manager(
        repos: MockRepos,
        reputation: MockReputationService,
        notifications: MockNotificationService,
    ) -> ReportManager<MockUnitOfWork> {
        ReportManager::new(repos.into_uow(), Arc::new(reputation), Arc::new(notifications))
    }

    fn new_report(community_id: Uuid, target_id: Uuid) -> NewReport {
        NewReport {
            community_id,
            reporter_id: Uuid::nil(),
            target_type: ReportTarget::Post,
            target_id,
            reason: "Spam".into(),
            details: Some("  ".into()),
        }
    }

    /// A post by `author` in a community with `members` members and `open` open reports after insert
    fn submit_repos(author: Uuid, open: u64, members: u64) -> MockRepos {
        let mut repos = MockRepos::default();
        repos
            .communities
            .expect_find_by_id()
            .returning(|id| Ok(Some(fixtures::community(id))));
        repos
            .communities
            .expect_membership()
            .returning(|c, u| Ok(Some(fixtures::membership(c, u, MemberRole::Member))));
        repos
            .posts
            .expect_find_by_id()
            .returning(move |id| Ok(Some(fixtures::post(id, Uuid::nil(), author))));
        repos
            .reports
            .expect_find_open_by_reporter()
            .returning(|_, _, _, _| Ok(None));
        repos.reports.expect_create().returning(|new| {
            Ok(fixtures::report(
                new.community_id,
                new.reporter_id,
                new.target_type,
                new.target_id,
                ReportStatus::Pending,
            ))
        });
        repos
            .reports
            .expect_count_open()
            .returning(move |_, _, _| Ok(open));
        repos
            .communities
            .expect_count_members()
            .returning(move |_| Ok(members));
        repos
    }

    #[tokio::test]
    async fn test_report_below_threshold_stays_pending() {
        let mut repos = submit_repos(Uuid::new_v4(), 2, 10);
        repos.reports.expect_mark_under_review().never();

        let mut notifications = MockNotificationService::new();
        notifications.expect_notify_many().never();

        let service = manager(repos, MockReputationService::new(), notifications);
        let outcome = service
            .submit(Actor::member(Uuid::new_v4()), new_report(Uuid::nil(), Uuid::new_v4()))
            .await
            .unwrap();

        assert!(!outcome.flagged);
        assert_eq!(outcome.report.status, ReportStatus::Pending);
        assert_eq!(outcome.report.details, None);
    }

    #[tokio::test]
    async fn test_crossing_threshold_escalates_and_alerts() {
        let mut repos = submit_repos(Uuid::new_v4(), 3, 10);
        repos
            .reports
            .expect_mark_under_review()
            .times(1)
            .returning(|_, _, _| Ok(true));
        let moderator = Uuid::new_v4();
        repos
            .communities
            .expect_member_ids()
            .withf(|_, roles| roles.contains(&MemberRole::Moderator) && !roles.contains(&MemberRole::Member))
            .returning(move |_, _| Ok(vec![moderator]));

        let mut notifications = MockNotificationService::new();
        notifications
            .expect_notify_many()
            .withf(move |ids, kind, _, _| ids == &vec![moderator] && *kind == NotificationKind::ReportFlagged)
            .times(1)
            .returning(|ids, _, _, _| Ok(ids.len()));

        let service = manager(repos, MockReputationService::new(), notifications);
        let outcome = service
            .submit(Actor::member(Uuid::new_v4()), new_report(Uuid::nil(), Uuid::new_v4()))
            .await
            .unwrap();

        assert!(outcome.flagged);
        assert_eq!(outcome.open_reports, 3);
        assert_eq!(outcome.report.status, ReportStatus::UnderReview);
    }

    #[tokio::test]
    async fn test_reports_after_flagging_do_not_realert() {
        let mut repos = submit_repos(Uuid::new_v4(), 4, 10);
        repos
            .reports
            .expect_mark_under_review()
            .times(1)
            .returning(|_, _, _| Ok(false));

        let mut notifications = MockNotificationService::new();
        notifications.expect_notify_many().never();

        let service = manager(repos, MockReputationService::new(), notifications);
        let outcome = service
            .submit(Actor::member(Uuid::new_v4()), new_report(Uuid::nil(), Uuid::new_v4()))
            .await
            .unwrap();
        assert!(outcome.flagged);
    }

    #[tokio::test]
    async fn test_flagging_after_members_left_still_alerts() {
        // Two reports when the community had 10 members, four have left since:
        // the third report is the first to flag the target at 3/6
        let mut repos = submit_repos(Uuid::new_v4(), 3, 6);
        repos
            .reports
            .expect_mark_under_review()
            .times(1)
            .returning(|_, _, _| Ok(true));
        let moderator = Uuid::new_v4();
        repos
            .communities
            .expect_member_ids()
            .returning(move |_, _| Ok(vec![moderator]));

        let mut notifications = MockNotificationService::new();
        notifications
            .expect_notify_many()
            .withf(move |ids, kind, _, _| ids == &vec![moderator] && *kind == NotificationKind::ReportFlagged)
            .times(1)
            .returning(|ids, _, _, _| Ok(ids.len()));

        let service = manager(repos, MockReputationService::new(), notifications);
        let outcome = service
            .submit(Actor::member(Uuid::new_v4()), new_report(Uuid::nil(), Uuid::new_v4()))
            .await
            .unwrap();
        assert!(outcome.flagged);
        assert_eq!(outcome.members, 6);
    }

    #[tokio::test]
    async fn test_concurrent_duplicate_report_conflicts_at_insert() {
        let mut repos = MockRepos::default();
        repos
            .communities
            .expect_find_by_id()
            .returning(|id| Ok(Some(fixtures::community(id))));
        repos
            .communities
            .expect_membership()
            .returning(|c, u| Ok(Some(fixtures::membership(c, u, MemberRole::Member))));
        repos
            .posts
            .expect_find_by_id()
            .returning(|id| Ok(Some(fixtures::post(id, Uuid::nil(), Uuid::new_v4()))));
        // The other request inserted between the check and this insert
        repos
            .reports
            .expect_find_open_by_reporter()
            .returning(|_, _, _, _| Ok(None));
        repos
            .reports
            .expect_create()
            .times(1)
            .returning(|_| Err(AppError::conflict("You have already reported this")));
        repos.reports.expect_count_open().never();
        repos.reports.expect_mark_under_review().never();

        let mut notifications = MockNotificationService::new();
        notifications.expect_notify_many().never();

        let service = manager(repos, MockReputationService::new(), notifications);
        let result = service
            .submit(Actor::member(Uuid::new_v4()), new_report(Uuid::nil(), Uuid::new_v4()))
            .await;
        assert!(matches!(result, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_cannot_report_yourself() {
        let actor = Actor::member(Uuid::new_v4());
        let repos = submit_repos(actor.id, 1, 10);

        let service = manager(repos, MockReputationService::new(), MockNotificationService::new());
        let result = service
            .submit(actor, new_report(Uuid::nil(), Uuid::new_v4()))
            .await;
        assert!(matches!(result, Err(AppError::Validation(ref m)) if m.contains("yourself")));
    }

    #[tokio::test]
    async fn test_duplicate_open_report_conflicts() {
        let mut repos = MockRepos::default();
        repos
            .communities
            .expect_find_by_id()
            .returning(|id| Ok(Some(fixtures::community(id))));
        repos
            .communities
            .expect_membership()
            .returning(|c, u| Ok(Some(fixtures::membership(c, u, MemberRole::Member))));
        repos
            .posts
            .expect_find_by_id()
            .returning(|id| Ok(Some(fixtures::post(id, Uuid::nil(), Uuid::new_v4()))));
        repos
            .reports
            .expect_find_open_by_reporter()
            .returning(|reporter, community, target_type, target_id| {
                Ok(Some(fixtures::report(
                    community,
                    reporter,
                    target_type,
                    target_id,
                    ReportStatus::Pending,
                )))
            });
        repos.reports.expect_create().never();

        let service = manager(repos, MockReputationService::new(), MockNotificationService::new());
        let result = service
            .submit(Actor::member(Uuid::new_v4()), new_report(Uuid::nil(), Uuid::new_v4()))
            .await;
        assert!(matches!(result, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_post_from_other_community_cannot_be_reported() {
        let mut repos = MockRepos::default();
        repos
            .communities
            .expect_find_by_id()
            .returning(|id| Ok(Some(fixtures::community(id))));
        repos
            .communities
            .expect_membership()
            .returning(|c, u| Ok(Some(fixtures::membership(c, u, MemberRole::Member))));
        repos
            .posts
            .expect_find_by_id()
            .returning(|id| Ok(Some(fixtures::post(id, Uuid::new_v4(), Uuid::new_v4()))));

        let service = manager(repos, MockReputationService::new(), MockNotificationService::new());
        let result = service
            .submit(Actor::member(Uuid::new_v4()), new_report(Uuid::nil(), Uuid::new_v4()))
            .await;
        assert!(matches!(result, Err(AppError::Missing(_))));
    }

    /// An open report on a post by `author`, acted on by a community moderator
    fn act_repos(author: Uuid, author_role: MemberRole) -> MockRepos {
        let mut repos = MockRepos::default();
        repos.reports.expect_find_by_id().returning(move |id| {
            let mut report = fixtures::report(
                Uuid::nil(),
                Uuid::new_v4(),
                ReportTarget::Post,
                Uuid::new_v4(),
                ReportStatus::UnderReview,
            );
            report.id = id;
            Ok(Some(report))
        });
        repos.communities.expect_membership().returning(move |c, u| {
            let role = if u == author {
                author_role
            } else {
                MemberRole::Moderator
            };
            Ok(Some(fixtures::membership(c, u, role)))
        });
        repos
            .communities
            .expect_find_by_id()
            .returning(|id| Ok(Some(fixtures::community(id))));
        repos
            .posts
            .expect_find_by_id()
            .returning(move |id| Ok(Some(fixtures::post(id, Uuid::nil(), author))));
        repos
    }

    fn closed_reports(reporters: &[Uuid], status: ReportStatus) -> Vec<Report> {
        reporters
            .iter()
            .map(|r| {
                let mut report =
                    fixtures::report(Uuid::nil(), *r, ReportTarget::Post, Uuid::nil(), status);
                report.resolved_at = Some(Utc::now());
                report
            })
            .collect()
    }

    #[tokio::test]
    async fn test_ban_rewards_each_reporter_once_and_notifies() {
        let author = Uuid::new_v4();
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        let mut repos = act_repos(author, MemberRole::Member);
        repos
            .reports
            .expect_resolve()
            .withf(move |r| r.action == ModerationAction::Ban && r.offender_id == Some(author))
            .times(1)
            .returning(move |_| Ok(closed_reports(&[a, b, a], ReportStatus::Actioned)));

        let mut reputation = MockReputationService::new();
        reputation
            .expect_award()
            .with(always(), eq(Activity::ReportUpheld))
            .times(2)
            .returning(|_, _| Ok(summary()));

        let mut notifications = MockNotificationService::new();
        notifications
            .expect_notify()
            .withf(move |n| n.user_id == author && n.kind == NotificationKind::Banned)
            .times(1)
            .returning(|_| Err(AppError::internal("ignored")));

        let service = manager(repos, reputation, notifications);
        let closed = service
            .act(
                Actor::member(Uuid::new_v4()),
                Uuid::new_v4(),
                ModerationAction::Ban,
                Some("Repeated spam".into()),
            )
            .await
            .unwrap();
        assert_eq!(closed.len(), 3);
    }

    #[tokio::test]
    async fn test_delete_notifies_author() {
        let author = Uuid::new_v4();
        let mut repos = act_repos(author, MemberRole::Member);
        repos
            .reports
            .expect_resolve()
            .returning(|_| Ok(closed_reports(&[Uuid::new_v4()], ReportStatus::Actioned)));

        let mut reputation = MockReputationService::new();
        reputation.expect_award().times(1).returning(|_, _| Ok(summary()));
        let mut notifications = MockNotificationService::new();
        notifications
            .expect_notify()
            .withf(move |n| {
                n.user_id == author
                    && n.kind == NotificationKind::ContentRemoved
                    && n.message.contains("post")
            })
            .times(1)
            .returning(|_| Err(AppError::internal("ignored")));

        let service = manager(repos, reputation, notifications);
        service
            .act(
                Actor::member(Uuid::new_v4()),
                Uuid::new_v4(),
                ModerationAction::Delete,
                None,
            )
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_dismiss_rewards_nobody() {
        let mut repos = act_repos(Uuid::new_v4(), MemberRole::Member);
        repos.reports.expect_resolve().returning(|r| {
            assert_eq!(r.action, ModerationAction::Dismiss);
            Ok(closed_reports(
                &[Uuid::new_v4(), Uuid::new_v4()],
                ReportStatus::Dismissed,
            ))
        });
        let mut reputation = MockReputationService::new();
        reputation.expect_award().never();
        let mut notifications = MockNotificationService::new();
        notifications.expect_notify().never();

        let service = manager(repos, reputation, notifications);
        let closed = service
            .act(
                Actor::member(Uuid::new_v4()),
                Uuid::new_v4(),
                ModerationAction::Dismiss,
                None,
            )
            .await
            .unwrap();
        assert!(closed.iter().all(|r| r.status == ReportStatus::Dismissed));
    }

    #[tokio::test]
    async fn test_moderator_cannot_ban_community_admin() {
        let admin_author = Uuid::new_v4();
        let mut repos = act_repos(admin_author, MemberRole::Admin);
        repos.reports.expect_resolve().never();

        let service = manager(repos, MockReputationService::new(), MockNotificationService::new());
        let result = service
            .act(
                Actor::member(Uuid::new_v4()),
                Uuid::new_v4(),
                ModerationAction::Ban,
                None,
            )
            .await;
        assert!(matches!(result, Err(AppError::ForbiddenAction(_))));
    }

    #[tokio::test]
    async fn test_resolved_report_conflicts() {
        let mut repos = MockRepos::default();
        repos.reports.expect_find_by_id().returning(|id| {
            let mut report = fixtures::report(
                Uuid::nil(),
                Uuid::new_v4(),
                ReportTarget::Post,
                Uuid::new_v4(),
                ReportStatus::Dismissed,
            );
            report.id = id;
            Ok(Some(report))
        });

        let service = manager(repos, MockReputationService::new(), MockNotificationService::new());
        let result = service
            .act(
                Actor::new(Uuid::new_v4(), UserRole::Admin),
                Uuid::new_v4(),
                ModerationAction::Delete,
                None,
            )
            .await;
        assert!(matches!(result, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_plain_member_cannot_act() {
        let mut repos = MockRepos::default();
        repos.reports.expect_find_by_id().returning(|id| {
            let mut report = fixtures::report(
                Uuid::nil(),
                Uuid::new_v4(),
                ReportTarget::Post,
                Uuid::new_v4(),
                ReportStatus::Pending,
            );
            report.id = id;
            Ok(Some(report))
        });
        repos
            .communities
            .expect_membership()
            .returning(|c, u| Ok(Some(fixtures::membership(c, u, MemberRole::Member))));
        repos.reports.expect_resolve().never();

        let service = manager(repos, MockReputationService::new(), MockNotificationService::new());
        let result = service
            .act(
                Actor::member(Uuid::new_v4()),
                Uuid::new_v4(),
                ModerationAction::Dismiss,
                None,
            )
            .await;
        assert!(matches!(result, Err(AppError::ForbiddenAction(_))));
    }

    #[tokio::test]
    async fn test_list_scopes_to_moderated_communities() {
        let moderated = Uuid::new_v4();
        let mut repos = MockRepos::default();
        repos.communities.expect_list_for_user().returning(move |_| {
            Ok(vec![
                UserCommunity {
                    community: fixtures::community(moderated),
                    role: MemberRole::Moderator,
                    joined_at: Utc::now(),
                },
                UserCommunity {
                    community: fixtures::community(Uuid::new_v4()),
                    role: MemberRole::Member,
                    joined_at: Utc::now(),
                },
            ])
        });
        repos
            .reports
            .expect_list()
            .withf(move |scope, status, _| {
                scope.as_ref() == Some(&vec![moderated]) && *status == Some(ReportStatus::Pending)
            })
            .returning(|_, _, _| Ok((vec![], 0)));

        let service = manager(repos, MockReputationService::new(), MockNotificationService::new());
        let page = service
            .list(
                Actor::member(Uuid::new_v4()),
                None,
                Some(ReportStatus::Pending),
                PaginationParams::default(),
            )
            .await
            .unwrap();
        assert_eq!(page.meta.total, 0);
    }

    #[tokio::test]
    async fn test_platform_admin_lists_everything() {
        let mut repos = MockRepos::default();
        repos
            .reports
            .expect_list()
            .withf(|scope, _, _| scope.is_none())
            .returning(|_, _, _| Ok((vec![], 0)));

        let service = manager(repos, MockReputationService::new(), MockNotificationService::new());
        service
            .list(
                Actor::new(Uuid::new_v4(), UserRole::Admin),
                None,
                None,
                PaginationParams::default(),
            )
            .await
            .unwrap();
    }
}
