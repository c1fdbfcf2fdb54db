//! User service - The caller's own profile.

use async_trait::async_trait;
use std::sync::Arc;
use uuid::Uuid;

use super::container::parallel;
use super::reputation_service::ReputationService;
use crate::config::MAX_INTERESTS;
use crate::domain::{Profile, ProfileChanges, User};
use crate::errors::{AppError, AppResult, OptionExt};
use crate::infra::UnitOfWork;

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait UserService: Send + Sync {
    /// Active user by ID
    async fn get_user(&self, id: Uuid) -> AppResult<User>;

    /// Profile with the reputation summary attached
    async fn profile(&self, id: Uuid) -> AppResult<Profile>;

    async fn update_profile(&self, id: Uuid, changes: ProfileChanges) -> AppResult<Profile>;

    /// Soft delete; the email stays reserved
    async fn delete_account(&self, id: Uuid) -> AppResult<()>;
}

/// Trim, drop blanks and duplicates (case-insensitive), keep order
fn clean_interests(interests: Vec<String>) -> AppResult<Vec<String>> {
    let mut cleaned: Vec<String> = Vec::with_capacity(interests.len());
    for interest in interests {
        let interest = interest.trim();
        if interest.is_empty() {
            continue;
        }
        if !cleaned.iter().any(|i| i.eq_ignore_ascii_case(interest)) {
            cleaned.push(interest.to_string());
        }
    }

    if cleaned.len() > MAX_INTERESTS {
        return Err(AppError::validation(format!(
            "At most {} interests are allowed",
            MAX_INTERESTS
        )));
    }
    Ok(cleaned)
}

pub struct UserManager<U: UnitOfWork> {
    uow: Arc<U>,
    reputation: Arc<dyn ReputationService>,
}

impl<U: UnitOfWork> UserManager<U> {
    pub fn new(uow: Arc<U>, reputation: Arc<dyn ReputationService>) -> Self {
        Self { uow, reputation }
    }
}

#[async_trait]
impl<U: UnitOfWork> UserService for UserManager<U> {
    async fn get_user(&self, id: Uuid) -> AppResult<User> {
        self.uow.users().find_by_id(id).await?.ok_or_missing("User")
    }

    async fn profile(&self, id: Uuid) -> AppResult<Profile> {
        let (user, reputation) =
            parallel::join2(self.get_user(id), self.reputation.summary(id)).await?;

        Ok(Profile {
            user: user.into(),
            reputation,
        })
    }

    async fn update_profile(&self, id: Uuid, changes: ProfileChanges) -> AppResult<Profile> {
        let name = match changes.name {
            Some(name) if name.trim().is_empty() => {
                return Err(AppError::validation("Name cannot be empty"))
            }
            Some(name) => Some(name.trim().to_string()),
            None => None,
        };
        let changes = ProfileChanges {
            name,
            bio: changes.bio.map(|b| b.trim().to_string()),
            interests: changes.interests.map(clean_interests).transpose()?,
        };

        let user = self.uow.users().update_profile(id, changes).await?;
        let reputation = self.reputation.summary(id).await?;

        Ok(Profile {
            user: user.into(),
            reputation,
        })
    }

    async fn delete_account(&self, id: Uuid) -> AppResult<()> {
        self.get_user(id).await?;
        self.uow.users().delete(id).await?;
        tracing::info!(user_id = %id, "Account deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{PointTotals, ReputationLevel, ReputationSummary, UserRole};
    use crate::infra::MockRepos;
    use crate::services::MockReputationService;
    use chrono::Utc;

    fn user(id: Uuid) -> User {
        User {
            id,
            email: "ada@example.com".into(),
            password_hash: String::new(),
            name: "Ada".into(),
            bio: None,
            interests: vec!["chess".into()],
            role: UserRole::User,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            deleted_at: None,
        }
    }

    fn reputation(earned: i64) -> MockReputationService {
        let mut reputation = MockReputationService::new();
        reputation.expect_summary().returning(move |_| {
            Ok(ReputationSummary::from(PointTotals {
                balance: earned,
                earned,
            }))
        });
        reputation
    }

    #[test]
    fn test_clean_interests() {
        let cleaned = clean_interests(vec![
            " Hiking ".into(),
            "".into(),
            "hiking".into(),
            "Jazz".into(),
        ])
        .unwrap();
        assert_eq!(cleaned, vec!["Hiking".to_string(), "Jazz".to_string()]);

        let too_many = (0..=MAX_INTERESTS).map(|i| format!("topic {}", i)).collect();
        assert!(clean_interests(too_many).is_err());
    }

    #[tokio::test]
    async fn test_profile_includes_level() {
        let id = Uuid::new_v4();
        let mut repos = MockRepos::default();
        repos
            .users
            .expect_find_by_id()
            .returning(|id| Ok(Some(user(id))));

        let service = UserManager::new(repos.into_uow(), Arc::new(reputation(120)));
        let profile = service.profile(id).await.unwrap();

        assert_eq!(profile.user.id, id);
        assert_eq!(profile.reputation.level, ReputationLevel::Intermediate);
    }

    #[tokio::test]
    async fn test_profile_of_missing_user() {
        let mut repos = MockRepos::default();
        repos.users.expect_find_by_id().returning(|_| Ok(None));

        let service = UserManager::new(repos.into_uow(), Arc::new(reputation(0)));
        let result = service.profile(Uuid::new_v4()).await;
        assert!(matches!(result, Err(AppError::Missing(_))));
    }

    #[tokio::test]
    async fn test_update_rejects_blank_name() {
        let repos = MockRepos::default();
        let service = UserManager::new(repos.into_uow(), Arc::new(reputation(0)));

        let result = service
            .update_profile(
                Uuid::new_v4(),
                ProfileChanges {
                    name: Some("   ".into()),
                    ..Default::default()
                },
            )
            .await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_update_cleans_interests() {
        let mut repos = MockRepos::default();
        repos
            .users
            .expect_update_profile()
            .withf(|_, changes| {
                changes.interests == Some(vec!["Chess".to_string(), "Go".to_string()])
            })
            .returning(|id, changes| {
                let mut updated = user(id);
                updated.interests = changes.interests.unwrap_or_default();
                Ok(updated)
            });

        let service = UserManager::new(repos.into_uow(), Arc::new(reputation(0)));
        let profile = service
            .update_profile(
                Uuid::new_v4(),
                ProfileChanges {
                    interests: Some(vec!["Chess".into(), "chess".into(), " Go".into()]),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(profile.user.interests.len(), 2);
    }

    #[tokio::test]
    async fn test_delete_account() {
        let mut repos = MockRepos::default();
        repos
            .users
            .expect_find_by_id()
            .returning(|id| Ok(Some(user(id))));
        repos.users.expect_delete().times(1).returning(|_| Ok(()));

        let service = UserManager::new(repos.into_uow(), Arc::new(reputation(0)));
        service.delete_account(Uuid::new_v4()).await.unwrap();
    }
}
