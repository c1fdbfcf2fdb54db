//! Post service - Community posts with an AI moderation screen.

use async_trait::async_trait;
use std::sync::Arc;
use uuid::Uuid;

use super::access::{active_membership, can_moderate, require_community};
use super::assistant_service::AssistantService;
use super::reputation_service::{reward, ReputationService};
use crate::config::MAX_POST_LENGTH;
use crate::domain::{Activity, Actor, Post};
use crate::errors::{AppError, AppResult};
use crate::infra::UnitOfWork;
use crate::types::{Paginated, PaginationParams};

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait PostService: Send + Sync {
    async fn create(&self, actor: Actor, community_id: Uuid, content: String) -> AppResult<Post>;

    async fn list(&self, community_id: Uuid, params: PaginationParams)
        -> AppResult<Paginated<Post>>;

    /// Authors delete their own posts; moderators delete any
    async fn delete(&self, actor: Actor, community_id: Uuid, post_id: Uuid) -> AppResult<()>;
}

pub struct PostManager<U: UnitOfWork> {
    uow: Arc<U>,
    reputation: Arc<dyn ReputationService>,
    assistant: Arc<dyn AssistantService>,
}

impl<U: UnitOfWork> PostManager<U> {
    pub fn new(
        uow: Arc<U>,
        reputation: Arc<dyn ReputationService>,
        assistant: Arc<dyn AssistantService>,
    ) -> Self {
        Self {
            uow,
            reputation,
            assistant,
        }
    }
}

#[async_trait]
impl<U: UnitOfWork> PostService for PostManager<U> {
    async fn create(&self, actor: Actor, community_id: Uuid, content: String) -> AppResult<Post> {
        let content = content.trim().to_string();
        if content.is_empty() {
            return Err(AppError::validation("Post content is required"));
        }
        if content.chars().count() as u64 > MAX_POST_LENGTH {
            return Err(AppError::validation(format!(
                "Posts are limited to {} characters",
                MAX_POST_LENGTH
            )));
        }

        require_community(self.uow.as_ref(), community_id).await?;
        active_membership(self.uow.as_ref(), community_id, actor.id).await?;

        let verdict = self.assistant.screen(content.clone()).await;
        if verdict.flagged {
            tracing::info!(
                community_id = %community_id,
                user_id = %actor.id,
                categories = ?verdict.categories,
                "Post rejected by moderation screen"
            );
            let reason = verdict
                .reason
                .unwrap_or_else(|| "it violates the community guidelines".to_string());
            return Err(AppError::validation(format!(
                "Post was rejected by moderation: {}",
                reason
            )));
        }

        let post = self
            .uow
            .posts()
            .create(community_id, actor.id, content)
            .await?;
        reward(self.reputation.as_ref(), actor.id, Activity::CreatePost).await;
        Ok(post)
    }

    async fn list(
        &self,
        community_id: Uuid,
        params: PaginationParams,
    ) -> AppResult<Paginated<Post>> {
        require_community(self.uow.as_ref(), community_id).await?;
        let (rows, total) = self
            .uow
            .posts()
            .list_by_community(community_id, params)
            .await?;
        Ok(Paginated::new(rows, &params, total))
    }

    async fn delete(&self, actor: Actor, community_id: Uuid, post_id: Uuid) -> AppResult<()> {
        let post = self
            .uow
            .posts()
            .find_by_id(post_id)
            .await?
            .filter(|p| p.community_id == community_id)
            .ok_or_else(|| AppError::Missing("Post".into()))?;

        let allowed = post.author_id == actor.id
            || can_moderate(self.uow.as_ref(), community_id, actor).await?;
        if !allowed {
            return Err(AppError::forbidden(
                "Only the author or a moderator can delete this post",
            ));
        }

        self.uow.posts().delete(post_id).await?;
        tracing::info!(post_id = %post_id, deleted_by = %actor.id, "Post deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{MemberRole, ModerationVerdict, ReputationLevel, ReputationSummary};
    use crate::infra::MockRepos;
    use crate::services::access::fixtures;
    use crate::services::{MockAssistantService, MockReputationService};

    fn allowing_assistant() -> MockAssistantService {
        let mut assistant = MockAssistantService::new();
        assistant
            .expect_screen()
            .returning(|_| ModerationVerdict::allowed());
        assistant
    }

    fn member_repos(role: MemberRole) -> MockRepos {
        let mut repos = MockRepos::default();
        repos
            .communities
            .expect_find_by_id()
            .returning(|id| Ok(Some(fixtures::community(id))));
        repos
            .communities
            .expect_membership()
            .returning(move |c, u| Ok(Some(fixtures::membership(c, u, role))));
        repos
    }

    #[tokio::test]
    async fn test_member_posts_and_earns_points() {
        let mut repos = member_repos(MemberRole::Member);
        repos
            .posts
            .expect_create()
            .withf(|_, _, content| content == "See you Sunday")
            .times(1)
            .returning(|c, a, content| {
                let mut post = fixtures::post(Uuid::new_v4(), c, a);
                post.content = content;
                Ok(post)
            });

        let mut reputation = MockReputationService::new();
        reputation
            .expect_award()
            .withf(|_, activity| *activity == Activity::CreatePost)
            .times(1)
            .returning(|_, _| {
                Ok(ReputationSummary {
                    balance: 5,
                    earned: 5,
                    level: ReputationLevel::Newcomer,
                    next_level: Some(ReputationLevel::Beginner),
                    points_to_next_level: Some(20),
                })
            });

        let service = PostManager::new(
            repos.into_uow(),
            Arc::new(reputation),
            Arc::new(allowing_assistant()),
        );
        let post = service
            .create(Actor::member(Uuid::new_v4()), Uuid::new_v4(), " See you Sunday ".into())
            .await
            .unwrap();
        assert_eq!(post.content, "See you Sunday");
    }

    #[tokio::test]
    async fn test_banned_member_cannot_post() {
        let mut repos = member_repos(MemberRole::Banned);
        repos.posts.expect_create().never();

        let service = PostManager::new(
            repos.into_uow(),
            Arc::new(MockReputationService::new()),
            Arc::new(MockAssistantService::new()),
        );
        let result = service
            .create(Actor::member(Uuid::new_v4()), Uuid::new_v4(), "hi".into())
            .await;
        assert!(matches!(result, Err(AppError::ForbiddenAction(_))));
    }

    #[tokio::test]
    async fn test_flagged_post_is_rejected() {
        let mut repos = member_repos(MemberRole::Member);
        repos.posts.expect_create().never();

        let mut assistant = MockAssistantService::new();
        assistant.expect_screen().returning(|_| ModerationVerdict {
            flagged: true,
            categories: vec!["spam".into()],
            reason: Some("Looks like spam".into()),
        });

        let service = PostManager::new(
            repos.into_uow(),
            Arc::new(MockReputationService::new()),
            Arc::new(assistant),
        );
        let result = service
            .create(Actor::member(Uuid::new_v4()), Uuid::new_v4(), "cheap pills".into())
            .await;
        assert!(matches!(result, Err(AppError::Validation(ref m)) if m.contains("Looks like spam")));
    }

    #[tokio::test]
    async fn test_empty_post_is_rejected() {
        let service = PostManager::new(
            MockRepos::default().into_uow(),
            Arc::new(MockReputationService::new()),
            Arc::new(MockAssistantService::new()),
        );
        let result = service
            .create(Actor::member(Uuid::new_v4()), Uuid::new_v4(), "   ".into())
            .await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_author_deletes_own_post() {
        let author = Uuid::new_v4();
        let community_id = Uuid::new_v4();
        let mut repos = MockRepos::default();
        repos
            .posts
            .expect_find_by_id()
            .returning(move |id| Ok(Some(fixtures::post(id, community_id, author))));
        repos.posts.expect_delete().times(1).returning(|_| Ok(true));

        let service = PostManager::new(
            repos.into_uow(),
            Arc::new(MockReputationService::new()),
            Arc::new(MockAssistantService::new()),
        );
        service
            .delete(Actor::member(author), community_id, Uuid::new_v4())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_plain_member_cannot_delete_others_post() {
        let community_id = Uuid::new_v4();
        let mut repos = member_repos(MemberRole::Member);
        repos
            .posts
            .expect_find_by_id()
            .returning(move |id| Ok(Some(fixtures::post(id, community_id, Uuid::new_v4()))));
        repos.posts.expect_delete().never();

        let service = PostManager::new(
            repos.into_uow(),
            Arc::new(MockReputationService::new()),
            Arc::new(MockAssistantService::new()),
        );
        let result = service
            .delete(Actor::member(Uuid::new_v4()), community_id, Uuid::new_v4())
            .await;
        assert!(matches!(result, Err(AppError::ForbiddenAction(_))));
    }

    #[tokio::test]
    async fn test_post_from_other_community_is_missing() {
        let mut repos = MockRepos::default();
        repos.posts.expect_find_by_id().returning(|id| {
            Ok(Some(fixtures::post(id, Uuid::new_v4(), Uuid::new_v4())))
        });

        let service = PostManager::new(
            repos.into_uow(),
            Arc::new(MockReputationService::new()),
            Arc::new(MockAssistantService::new()),
        );
        let result = service
            .delete(Actor::member(Uuid::new_v4()), Uuid::new_v4(), Uuid::new_v4())
            .await;
        assert!(matches!(result, Err(AppError::Missing(_))));
    }
}
