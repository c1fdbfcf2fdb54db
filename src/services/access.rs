//! Community permission checks shared by the services.

use uuid::Uuid;

use crate::domain::{Actor, Community, Membership};
use crate::errors::{AppError, AppResult, OptionExt};
use crate::infra::UnitOfWork;

pub(crate) async fn require_community<U: UnitOfWork>(uow: &U, id: Uuid) -> AppResult<Community> {
    uow.communities()
        .find_by_id(id)
        .await?
        .ok_or_missing("Community")
}

/// The caller's membership, rejecting outsiders and banned users
pub(crate) async fn active_membership<U: UnitOfWork>(
    uow: &U,
    community_id: Uuid,
    user_id: Uuid,
) -> AppResult<Membership> {
    match uow.communities().membership(community_id, user_id).await? {
        None => Err(AppError::forbidden("You are not a member of this community")),
        Some(m) if m.role.is_banned() => {
            Err(AppError::forbidden("You are banned from this community"))
        }
        Some(m) => Ok(m),
    }
}

/// Platform admins moderate everywhere; otherwise the community role decides
pub(crate) async fn can_moderate<U: UnitOfWork>(
    uow: &U,
    community_id: Uuid,
    actor: Actor,
) -> AppResult<bool> {
    if actor.is_admin() {
        return Ok(true);
    }
    Ok(uow
        .communities()
        .membership(community_id, actor.id)
        .await?
        .is_some_and(|m| m.role.can_moderate()))
}

pub(crate) async fn require_moderator<U: UnitOfWork>(
    uow: &U,
    community_id: Uuid,
    actor: Actor,
) -> AppResult<()> {
    if can_moderate(uow, community_id, actor).await? {
        Ok(())
    } else {
        Err(AppError::forbidden(
            "Only community moderators can do this",
        ))
    }
}

pub(crate) async fn require_admin<U: UnitOfWork>(
    uow: &U,
    community_id: Uuid,
    actor: Actor,
) -> AppResult<()> {
    if actor.is_admin() {
        return Ok(());
    }
    let is_admin = uow
        .communities()
        .membership(community_id, actor.id)
        .await?
        .is_some_and(|m| m.role.is_admin());

    if is_admin {
        Ok(())
    } else {
        Err(AppError::forbidden("Only community admins can do this"))
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    //! Builders shared by the service tests.

    use chrono::{Duration, Utc};
    use uuid::Uuid;

    use crate::domain::{Community, Event, MemberRole, Membership, Post, Report, ReportStatus, ReportTarget};

    pub fn community(id: Uuid) -> Community {
        Community {
            id,
            name: "Trail Runners".into(),
            description: "Weekend trail runs".into(),
            category: "sports".into(),
            created_by: Uuid::new_v4(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    pub fn membership(community_id: Uuid, user_id: Uuid, role: MemberRole) -> Membership {
        Membership {
            community_id,
            user_id,
            role,
            joined_at: Utc::now(),
        }
    }

    pub fn post(id: Uuid, community_id: Uuid, author_id: Uuid) -> Post {
        Post {
            id,
            community_id,
            author_id,
            content: "Anyone up for Sunday?".into(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    pub fn event(id: Uuid, community_id: Uuid, capacity: Option<i32>) -> Event {
        Event {
            id,
            community_id,
            created_by: Uuid::new_v4(),
            title: "Sunday long run".into(),
            description: "20k easy pace".into(),
            location: Some("Grunewald".into()),
            starts_at: Utc::now() + Duration::days(3),
            ends_at: None,
            capacity,
            created_at: Utc::now(),
        }
    }

    pub fn report(
        community_id: Uuid,
        reporter_id: Uuid,
        target_type: ReportTarget,
        target_id: Uuid,
        status: ReportStatus,
    ) -> Report {
        Report {
            id: Uuid::new_v4(),
            community_id,
            reporter_id,
            target_type,
            target_id,
            reason: "Spam".into(),
            details: None,
            status,
            resolution: None,
            resolution_note: None,
            resolved_by: None,
            created_at: Utc::now(),
            resolved_at: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::MemberRole;
    use crate::infra::MockRepos;

    fn repos_with_role(role: Option<MemberRole>) -> MockRepos {
        let mut repos = MockRepos::default();
        repos
            .communities
            .expect_membership()
            .returning(move |c, u| Ok(role.map(|r| fixtures::membership(c, u, r))));
        repos
    }

    #[tokio::test]
    async fn test_banned_member_is_not_active() {
        let uow = repos_with_role(Some(MemberRole::Banned)).into_uow();
        let result = active_membership(uow.as_ref(), Uuid::new_v4(), Uuid::new_v4()).await;
        assert!(matches!(result, Err(AppError::ForbiddenAction(ref m)) if m.contains("banned")));
    }

    #[tokio::test]
    async fn test_outsider_is_not_active() {
        let uow = repos_with_role(None).into_uow();
        let result = active_membership(uow.as_ref(), Uuid::new_v4(), Uuid::new_v4()).await;
        assert!(matches!(result, Err(AppError::ForbiddenAction(_))));
    }

    #[tokio::test]
    async fn test_moderation_rights() {
        let community_id = Uuid::new_v4();
        let member = Actor::member(Uuid::new_v4());

        let uow = repos_with_role(Some(MemberRole::Moderator)).into_uow();
        assert!(can_moderate(uow.as_ref(), community_id, member).await.unwrap());

        let uow = repos_with_role(Some(MemberRole::Member)).into_uow();
        assert!(!can_moderate(uow.as_ref(), community_id, member).await.unwrap());
        assert!(require_admin(uow.as_ref(), community_id, member).await.is_err());

        // Platform admins need no membership at all
        let uow = MockRepos::default().into_uow();
        let admin = Actor::new(Uuid::new_v4(), crate::domain::UserRole::Admin);
        assert!(can_moderate(uow.as_ref(), community_id, admin).await.unwrap());
        assert!(require_admin(uow.as_ref(), community_id, admin).await.is_ok());
    }
}
