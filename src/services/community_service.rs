//! Community service - Communities, memberships and roles.

use async_trait::async_trait;
use std::sync::Arc;
use uuid::Uuid;

use super::access::{require_admin, require_community};
use super::container::parallel;
use super::notification_service::{deliver, NotificationService};
use super::reputation_service::{reward, ReputationService};
use crate::domain::{
    Activity, Actor, Community, CommunityChanges, CommunityDetail, CommunityFilter, Member,
    MemberRole, Membership, NewCommunity, NewNotification, NotificationKind, UserCommunity,
};
use crate::errors::{AppError, AppResult};
use crate::infra::UnitOfWork;
use crate::types::{Paginated, PaginationParams};

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait CommunityService: Send + Sync {
    /// Create a community; the creator becomes its admin
    async fn create(&self, actor: Actor, new: NewCommunity) -> AppResult<Community>;

    async fn list(
        &self,
        filter: CommunityFilter,
        params: PaginationParams,
    ) -> AppResult<Paginated<Community>>;

    async fn get(&self, actor: Actor, id: Uuid) -> AppResult<CommunityDetail>;

    async fn update(&self, actor: Actor, id: Uuid, changes: CommunityChanges)
        -> AppResult<Community>;

    async fn join(&self, actor: Actor, id: Uuid) -> AppResult<Membership>;

    async fn leave(&self, actor: Actor, id: Uuid) -> AppResult<()>;

    async fn members(&self, id: Uuid) -> AppResult<Vec<Member>>;

    /// Change a member's role. Bans go through moderation actions.
    async fn set_role(
        &self,
        actor: Actor,
        id: Uuid,
        user_id: Uuid,
        role: MemberRole,
    ) -> AppResult<Membership>;

    async fn user_communities(&self, user_id: Uuid) -> AppResult<Vec<UserCommunity>>;
}

fn required_text(field: &str, value: String) -> AppResult<String> {
    let value = value.trim().to_string();
    if value.is_empty() {
        return Err(AppError::validation(format!("{} is required", field)));
    }
    Ok(value)
}

pub struct CommunityManager<U: UnitOfWork> {
    uow: Arc<U>,
    reputation: Arc<dyn ReputationService>,
    notifications: Arc<dyn NotificationService>,
}

impl<U: UnitOfWork> CommunityManager<U> {
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

    async fn ensure_name_free(&self, name: &str, except: Option<Uuid>) -> AppResult<()> {
        match self.uow.communities().find_by_name(name).await? {
            Some(existing) if Some(existing.id) != except => Err(AppError::conflict(
                "A community with this name already exists",
            )),
            _ => Ok(()),
        }
    }

    /// Refuse changes that would leave the community without an admin
    async fn ensure_other_admin(&self, community_id: Uuid, message: &str) -> AppResult<()> {
        if self.uow.communities().count_admins(community_id).await? <= 1 {
            return Err(AppError::conflict(message));
        }
        Ok(())
    }
}

#[async_trait]
impl<U: UnitOfWork> CommunityService for CommunityManager<U> {
    async fn create(&self, actor: Actor, new: NewCommunity) -> AppResult<Community> {
        let new = NewCommunity {
            name: required_text("Name", new.name)?,
            description: new.description.trim().to_string(),
            category: required_text("Category", new.category)?.to_lowercase(),
        };
        self.ensure_name_free(&new.name, None).await?;

        let community = self.uow.communities().create(actor.id, new).await?;
        tracing::info!(
            community_id = %community.id,
            user_id = %actor.id,
            "Community created"
        );

        reward(self.reputation.as_ref(), actor.id, Activity::CreateCommunity).await;
        Ok(community)
    }

    async fn list(
        &self,
        filter: CommunityFilter,
        params: PaginationParams,
    ) -> AppResult<Paginated<Community>> {
        let filter = CommunityFilter {
            search: filter
                .search
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty()),
            category: filter
                .category
                .map(|c| c.trim().to_lowercase())
                .filter(|c| !c.is_empty()),
        };
        let (rows, total) = self.uow.communities().list(filter, params).await?;
        Ok(Paginated::new(rows, &params, total))
    }

    async fn get(&self, actor: Actor, id: Uuid) -> AppResult<CommunityDetail> {
        let communities = self.uow.communities();
        let (community, member_count, membership) = parallel::join3(
            require_community(self.uow.as_ref(), id),
            communities.count_members(id),
            communities.membership(id, actor.id),
        )
        .await?;

        Ok(CommunityDetail {
            community,
            member_count,
            my_role: membership.map(|m| m.role),
        })
    }

    async fn update(
        &self,
        actor: Actor,
        id: Uuid,
        changes: CommunityChanges,
    ) -> AppResult<Community> {
        require_community(self.uow.as_ref(), id).await?;
        require_admin(self.uow.as_ref(), id, actor).await?;

        if changes.is_empty() {
            return Err(AppError::validation("No changes provided"));
        }
        let changes = CommunityChanges {
            name: changes.name.map(|n| required_text("Name", n)).transpose()?,
            description: changes.description.map(|d| d.trim().to_string()),
            category: changes
                .category
                .map(|c| required_text("Category", c).map(|c| c.to_lowercase()))
                .transpose()?,
        };
        if let Some(name) = &changes.name {
            self.ensure_name_free(name, Some(id)).await?;
        }

        self.uow.communities().update(id, changes).await
    }

    async fn join(&self, actor: Actor, id: Uuid) -> AppResult<Membership> {
        require_community(self.uow.as_ref(), id).await?;

        match self.uow.communities().membership(id, actor.id).await? {
            Some(m) if m.role.is_banned() => {
                return Err(AppError::forbidden("You are banned from this community"))
            }
            Some(_) => return Err(AppError::conflict("Already a member of this community")),
            None => {}
        }

        let membership = self
            .uow
            .communities()
            .add_member(id, actor.id, MemberRole::Member)
            .await?;
        tracing::info!(community_id = %id, user_id = %actor.id, "Member joined");

        reward(self.reputation.as_ref(), actor.id, Activity::JoinCommunity).await;
        Ok(membership)
    }

    async fn leave(&self, actor: Actor, id: Uuid) -> AppResult<()> {
        let membership = self
            .uow
            .communities()
            .membership(id, actor.id)
            .await?
            .ok_or_else(|| AppError::Missing("Membership".into()))?;

        match membership.role {
            // Leaving would erase the ban
            MemberRole::Banned => {
                return Err(AppError::forbidden("You are banned from this community"))
            }
            MemberRole::Admin => {
                self.ensure_other_admin(id, "The last admin cannot leave the community")
                    .await?
            }
            MemberRole::Moderator | MemberRole::Member => {}
        }

        self.uow.communities().remove_member(id, actor.id).await?;
        tracing::info!(community_id = %id, user_id = %actor.id, "Member left");
        Ok(())
    }

    async fn members(&self, id: Uuid) -> AppResult<Vec<Member>> {
        require_community(self.uow.as_ref(), id).await?;
        self.uow.communities().list_members(id).await
    }

    async fn set_role(
        &self,
        actor: Actor,
        id: Uuid,
        user_id: Uuid,
        role: MemberRole,
    ) -> AppResult<Membership> {
        if role.is_banned() {
            return Err(AppError::validation(
                "Members are banned through moderation actions",
            ));
        }
        let community = require_community(self.uow.as_ref(), id).await?;
        require_admin(self.uow.as_ref(), id, actor).await?;

        let current = self
            .uow
            .communities()
            .membership(id, user_id)
            .await?
            .ok_or_else(|| AppError::Missing("Member".into()))?;
        if current.role.is_banned() {
            return Err(AppError::conflict("Banned users cannot be given a role"));
        }
        if current.role == role {
            return Ok(current);
        }
        if current.role.is_admin() {
            self.ensure_other_admin(id, "The last admin cannot be demoted")
                .await?;
        }

        let membership = self
            .uow
            .communities()
            .set_member_role(id, user_id, role)
            .await?;
        tracing::info!(
            community_id = %id,
            user_id = %user_id,
            role = role.as_str(),
            changed_by = %actor.id,
            "Member role changed"
        );

        deliver(
            self.notifications.as_ref(),
            NewNotification::new(
                user_id,
                NotificationKind::RoleChanged,
                format!("You are now a {} of {}", role, community.name),
            )
            .with_link(format!("/communities/{}", id)),
        )
        .await;

        Ok(membership)
    }

    async fn user_communities(&self, user_id: Uuid) -> AppResult<Vec<UserCommunity>> {
        self.uow.communities().list_for_user(user_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ReputationLevel, ReputationSummary, UserRole};
    use crate::infra::MockRepos;
    use crate::services::access::fixtures;
    use crate::services::{MockNotificationService, MockReputationService};
    use mockall::predicate::*;

    fn summary() -> ReputationSummary {
        ReputationSummary {
            balance: 0,
            earned: 0,
            level: ReputationLevel::Newcomer,
            next_level: Some(ReputationLevel::Beginner),
            points_to_next_level: Some(25),
        }
    }

    fn expect_award(activity: Activity) -> MockReputationService {
        let mut reputation = MockReputationService::new();
        reputation
            .expect_award()
            .with(always(), eq(activity))
            .times(1)
            .returning(|_, _| Ok(summary()));
        reputation
    }

    fn manager(
        repos: MockRepos,
        reputation: MockReputationService,
        notifications: MockNotificationService,
    ) -> CommunityManager<crate::infra::MockUnitOfWork> {
        CommunityManager::new(repos.into_uow(), Arc::new(reputation), Arc::new(notifications))
    }

    fn with_community(repos: &mut MockRepos) {
        repos
            .communities
            .expect_find_by_id()
            .returning(|id| Ok(Some(fixtures::community(id))));
    }

    fn with_role(repos: &mut MockRepos, role: Option<MemberRole>) {
        repos
            .communities
            .expect_membership()
            .returning(move |c, u| Ok(role.map(|r| fixtures::membership(c, u, r))));
    }

    #[tokio::test]
    async fn test_create_awards_points() {
        let actor = Actor::member(Uuid::new_v4());
        let mut repos = MockRepos::default();
        repos.communities.expect_find_by_name().returning(|_| Ok(None));
        repos
            .communities
            .expect_create()
            .withf(move |created_by, new| *created_by == actor.id && new.category == "sports")
            .returning(|_, new| {
                let mut community = fixtures::community(Uuid::new_v4());
                community.name = new.name;
                Ok(community)
            });

        let service = manager(
            repos,
            expect_award(Activity::CreateCommunity),
            MockNotificationService::new(),
        );
        let community = service
            .create(
                actor,
                NewCommunity {
                    name: " Trail Runners ".into(),
                    description: String::new(),
                    category: "Sports".into(),
                },
            )
            .await
            .unwrap();
        assert_eq!(community.name, "Trail Runners");
    }

    #[tokio::test]
    async fn test_create_duplicate_name() {
        let mut repos = MockRepos::default();
        repos
            .communities
            .expect_find_by_name()
            .returning(|_| Ok(Some(fixtures::community(Uuid::new_v4()))));
        repos.communities.expect_create().never();

        let mut reputation = MockReputationService::new();
        reputation.expect_award().never();

        let service = manager(repos, reputation, MockNotificationService::new());
        let result = service
            .create(
                Actor::member(Uuid::new_v4()),
                NewCommunity {
                    name: "trail runners".into(),
                    description: String::new(),
                    category: "sports".into(),
                },
            )
            .await;
        assert!(matches!(result, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_join_new_member() {
        let actor = Actor::member(Uuid::new_v4());
        let mut repos = MockRepos::default();
        with_community(&mut repos);
        with_role(&mut repos, None);
        repos
            .communities
            .expect_add_member()
            .with(always(), eq(actor.id), eq(MemberRole::Member))
            .times(1)
            .returning(|c, u, r| Ok(fixtures::membership(c, u, r)));

        let service = manager(
            repos,
            expect_award(Activity::JoinCommunity),
            MockNotificationService::new(),
        );
        let membership = service.join(actor, Uuid::new_v4()).await.unwrap();
        assert_eq!(membership.role, MemberRole::Member);
    }

    #[tokio::test]
    async fn test_duplicate_join_conflicts() {
        let mut repos = MockRepos::default();
        with_community(&mut repos);
        with_role(&mut repos, Some(MemberRole::Member));
        repos.communities.expect_add_member().never();

        let mut reputation = MockReputationService::new();
        reputation.expect_award().never();

        let service = manager(repos, reputation, MockNotificationService::new());
        let result = service
            .join(Actor::member(Uuid::new_v4()), Uuid::new_v4())
            .await;
        assert!(matches!(result, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_banned_user_cannot_rejoin() {
        let mut repos = MockRepos::default();
        with_community(&mut repos);
        with_role(&mut repos, Some(MemberRole::Banned));
        repos.communities.expect_add_member().never();

        let service = manager(
            repos,
            MockReputationService::new(),
            MockNotificationService::new(),
        );
        let result = service
            .join(Actor::member(Uuid::new_v4()), Uuid::new_v4())
            .await;
        assert!(matches!(result, Err(AppError::ForbiddenAction(_))));
    }

    #[tokio::test]
    async fn test_last_admin_cannot_leave() {
        let mut repos = MockRepos::default();
        with_role(&mut repos, Some(MemberRole::Admin));
        repos.communities.expect_count_admins().returning(|_| Ok(1));
        repos.communities.expect_remove_member().never();

        let service = manager(
            repos,
            MockReputationService::new(),
            MockNotificationService::new(),
        );
        let result = service
            .leave(Actor::member(Uuid::new_v4()), Uuid::new_v4())
            .await;
        assert!(matches!(result, Err(AppError::Conflict(ref m)) if m.contains("last admin")));
    }

    #[tokio::test]
    async fn test_admin_leaves_when_another_admin_remains() {
        let mut repos = MockRepos::default();
        with_role(&mut repos, Some(MemberRole::Admin));
        repos.communities.expect_count_admins().returning(|_| Ok(2));
        repos
            .communities
            .expect_remove_member()
            .times(1)
            .returning(|_, _| Ok(true));

        let service = manager(
            repos,
            MockReputationService::new(),
            MockNotificationService::new(),
        );
        service
            .leave(Actor::member(Uuid::new_v4()), Uuid::new_v4())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_leave_without_membership() {
        let mut repos = MockRepos::default();
        with_role(&mut repos, None);

        let service = manager(
            repos,
            MockReputationService::new(),
            MockNotificationService::new(),
        );
        let result = service
            .leave(Actor::member(Uuid::new_v4()), Uuid::new_v4())
            .await;
        assert!(matches!(result, Err(AppError::Missing(_))));
    }

    #[tokio::test]
    async fn test_set_role_cannot_ban() {
        let service = manager(
            MockRepos::default(),
            MockReputationService::new(),
            MockNotificationService::new(),
        );
        let result = service
            .set_role(
                Actor::new(Uuid::new_v4(), UserRole::Admin),
                Uuid::new_v4(),
                Uuid::new_v4(),
                MemberRole::Banned,
            )
            .await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_set_role_requires_admin() {
        let mut repos = MockRepos::default();
        with_community(&mut repos);
        with_role(&mut repos, Some(MemberRole::Moderator));
        repos.communities.expect_set_member_role().never();

        let service = manager(
            repos,
            MockReputationService::new(),
            MockNotificationService::new(),
        );
        let result = service
            .set_role(
                Actor::member(Uuid::new_v4()),
                Uuid::new_v4(),
                Uuid::new_v4(),
                MemberRole::Moderator,
            )
            .await;
        assert!(matches!(result, Err(AppError::ForbiddenAction(_))));
    }

    #[tokio::test]
    async fn test_promote_member_notifies() {
        let admin = Actor::member(Uuid::new_v4());
        let target = Uuid::new_v4();
        let mut repos = MockRepos::default();
        with_community(&mut repos);
        repos.communities.expect_membership().returning(move |c, u| {
            let role = if u == admin.id {
                MemberRole::Admin
            } else {
                MemberRole::Member
            };
            Ok(Some(fixtures::membership(c, u, role)))
        });
        repos
            .communities
            .expect_set_member_role()
            .with(always(), eq(target), eq(MemberRole::Moderator))
            .returning(|c, u, r| Ok(fixtures::membership(c, u, r)));

        let mut notifications = MockNotificationService::new();
        notifications
            .expect_notify()
            .withf(move |n| n.user_id == target && n.kind == NotificationKind::RoleChanged)
            .times(1)
            .returning(|_| Err(AppError::internal("ignored")));

        let service = manager(repos, MockReputationService::new(), notifications);
        let membership = service
            .set_role(admin, Uuid::new_v4(), target, MemberRole::Moderator)
            .await
            .unwrap();
        assert_eq!(membership.role, MemberRole::Moderator);
    }

    #[tokio::test]
    async fn test_detail_reports_my_role() {
        let actor = Actor::member(Uuid::new_v4());
        let mut repos = MockRepos::default();
        with_community(&mut repos);
        with_role(&mut repos, Some(MemberRole::Moderator));
        repos.communities.expect_count_members().returning(|_| Ok(12));

        let service = manager(
            repos,
            MockReputationService::new(),
            MockNotificationService::new(),
        );
        let detail = service.get(actor, Uuid::new_v4()).await.unwrap();
        assert_eq!(detail.member_count, 12);
        assert_eq!(detail.my_role, Some(MemberRole::Moderator));
    }
}
