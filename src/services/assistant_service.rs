//! Assistant service - Chat, community recommendations and content screening.
//!
//! Every call goes through the configured `LanguageModel`. Chat and the
//! moderation endpoint fail when no model is configured; recommendations
//! fall back to a local interest match and post screening lets content
//! through.

use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashSet;
use std::sync::Arc;
use uuid::Uuid;

use crate::config::{
    AI_CHAT_MAX_TOKENS, AI_MAX_HISTORY_MESSAGES, AI_RECOMMENDATION_CANDIDATES,
    AI_STRUCTURED_MAX_TOKENS,
};
use crate::domain::{
    Actor, ChatMessage, Community, CommunityFilter, ModerationVerdict, Recommendation,
};
use crate::errors::{AppError, AppResult, OptionExt};
use crate::infra::ai::prompts::{
    extract_json, recommendation_request, CHAT_SYSTEM_PROMPT, MODERATION_SYSTEM_PROMPT,
    RECOMMENDATION_SYSTEM_PROMPT,
};
use crate::infra::{CompletionRequest, LanguageModel, UnitOfWork};
use crate::types::PaginationParams;

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait AssistantService: Send + Sync {
    /// Reply to `message` given the earlier turns of the conversation
    async fn chat(
        &self,
        actor: Actor,
        message: String,
        history: Vec<ChatMessage>,
    ) -> AppResult<String>;

    /// Communities the caller has not joined, best match first
    async fn recommend(
        &self,
        actor: Actor,
        query: Option<String>,
        limit: usize,
    ) -> AppResult<Vec<Recommendation>>;

    async fn moderate(&self, content: String) -> AppResult<ModerationVerdict>;

    /// Like `moderate`, but any failure lets the content through
    async fn screen(&self, content: String) -> ModerationVerdict;
}

#[derive(Debug, Deserialize)]
struct Pick {
    id: String,
    #[serde(default)]
    reason: Option<String>,
}

/// Match the model's picks against the candidates, dropping unknown and repeated ids
fn resolve_picks(picks: Vec<Pick>, candidates: &[Community], limit: usize) -> Vec<Recommendation> {
    let mut seen = HashSet::new();
    picks
        .into_iter()
        .filter_map(|pick| {
            let id = Uuid::parse_str(pick.id.trim()).ok()?;
            let community = candidates.iter().find(|c| c.id == id)?;
            seen.insert(id).then(|| Recommendation {
                community: community.clone(),
                reason: pick
                    .reason
                    .filter(|r| !r.trim().is_empty())
                    .unwrap_or_else(|| format!("A {} community you might enjoy", community.category)),
            })
        })
        .take(limit)
        .collect()
}

/// Deterministic ranking by interest overlap; candidates arrive newest first
/// and ties keep that order.
fn fallback_recommendations(
    interests: &[String],
    query: Option<&str>,
    candidates: &[Community],
    limit: usize,
) -> Vec<Recommendation> {
    let mut terms: Vec<String> = interests
        .iter()
        .map(|i| i.trim().to_lowercase())
        .filter(|i| !i.is_empty())
        .collect();
    if let Some(query) = query {
        terms.extend(
            query
                .split_whitespace()
                .filter(|w| w.chars().count() > 2)
                .map(str::to_lowercase),
        );
    }

    let mut scored: Vec<(usize, Option<&String>, &Community)> = candidates
        .iter()
        .map(|community| {
            let haystack = format!(
                "{} {} {}",
                community.name, community.category, community.description
            )
            .to_lowercase();
            let matched: Vec<&String> = terms.iter().filter(|t| haystack.contains(t.as_str())).collect();
            (matched.len(), matched.first().copied(), community)
        })
        .collect();
    scored.sort_by(|a, b| b.0.cmp(&a.0));

    scored
        .into_iter()
        .take(limit)
        .map(|(_, term, community)| Recommendation {
            community: community.clone(),
            reason: match term {
                Some(term) => format!("Matches your interest in {}", term),
                None => format!("A new {} community", community.category),
            },
        })
        .collect()
}

pub struct AssistantManager<U: UnitOfWork> {
    uow: Arc<U>,
    model: Option<Arc<dyn LanguageModel>>,
}

impl<U: UnitOfWork> AssistantManager<U> {
    pub fn new(uow: Arc<U>, model: Option<Arc<dyn LanguageModel>>) -> Self {
        Self { uow, model }
    }

    fn model(&self) -> AppResult<&Arc<dyn LanguageModel>> {
        self.model
            .as_ref()
            .ok_or_else(|| AppError::ai("no language model is configured"))
    }

    async fn ranked_by_model(
        &self,
        model: &dyn LanguageModel,
        interests: &[String],
        query: Option<&str>,
        candidates: &[Community],
        limit: usize,
    ) -> Option<Vec<Recommendation>> {
        let request = CompletionRequest::new(
            RECOMMENDATION_SYSTEM_PROMPT,
            vec![ChatMessage::user(recommendation_request(
                interests, query, candidates, limit,
            ))],
            AI_STRUCTURED_MAX_TOKENS,
        )
        .with_temperature(0.2);

        let reply = match model.complete(request).await {
            Ok(reply) => reply,
            Err(e) => {
                tracing::warn!(error = %e, "Recommendation request failed, using fallback");
                return None;
            }
        };

        let Some(picks) = extract_json::<Vec<Pick>>(&reply) else {
            tracing::warn!("Recommendation reply was not valid JSON, using fallback");
            return None;
        };
        let resolved = resolve_picks(picks, candidates, limit);
        (!resolved.is_empty()).then_some(resolved)
    }
}

#[async_trait]
impl<U: UnitOfWork> AssistantService for AssistantManager<U> {
    async fn chat(
        &self,
        actor: Actor,
        message: String,
        history: Vec<ChatMessage>,
    ) -> AppResult<String> {
        let message = message.trim();
        if message.is_empty() {
            return Err(AppError::validation("Message is required"));
        }
        let model = self.model()?;
        let user = self.uow.users().find_by_id(actor.id).await?.ok_or_missing("User")?;

        let mut system = CHAT_SYSTEM_PROMPT.to_string();
        if !user.interests.is_empty() {
            system.push_str(&format!(
                "\nThe member's interests: {}.",
                user.interests.join(", ")
            ));
        }

        let skip = history.len().saturating_sub(AI_MAX_HISTORY_MESSAGES);
        let mut messages: Vec<ChatMessage> = history.into_iter().skip(skip).collect();
        messages.push(ChatMessage::user(message));

        let reply = model
            .complete(CompletionRequest::new(system, messages, AI_CHAT_MAX_TOKENS))
            .await?;
        let reply = reply.trim();
        if reply.is_empty() {
            return Err(AppError::ai("model returned an empty reply"));
        }
        Ok(reply.to_string())
    }

    async fn recommend(
        &self,
        actor: Actor,
        query: Option<String>,
        limit: usize,
    ) -> AppResult<Vec<Recommendation>> {
        let user = self.uow.users().find_by_id(actor.id).await?.ok_or_missing("User")?;
        // Banned memberships count too
        let joined: HashSet<Uuid> = self
            .uow
            .communities()
            .membership_community_ids(actor.id)
            .await?
            .into_iter()
            .collect();

        let (communities, _) = self
            .uow
            .communities()
            .list(
                CommunityFilter::default(),
                PaginationParams::new(1, AI_RECOMMENDATION_CANDIDATES),
            )
            .await?;
        let candidates: Vec<Community> = communities
            .into_iter()
            .filter(|c| !joined.contains(&c.id))
            .collect();
        if candidates.is_empty() || limit == 0 {
            return Ok(Vec::new());
        }

        let query = query.as_deref().map(str::trim).filter(|q| !q.is_empty());
        if let Some(model) = self.model.as_ref() {
            if let Some(ranked) = self
                .ranked_by_model(model.as_ref(), &user.interests, query, &candidates, limit)
                .await
            {
                return Ok(ranked);
            }
        }

        Ok(fallback_recommendations(
            &user.interests,
            query,
            &candidates,
            limit,
        ))
    }

    async fn moderate(&self, content: String) -> AppResult<ModerationVerdict> {
        let model = self.model()?;
        let request = CompletionRequest::new(
            MODERATION_SYSTEM_PROMPT,
            vec![ChatMessage::user(content)],
            AI_STRUCTURED_MAX_TOKENS,
        )
        .with_temperature(0.0);

        let reply = model.complete(request).await?;
        match extract_json::<ModerationVerdict>(&reply) {
            Some(verdict) => Ok(verdict),
            None => {
                tracing::warn!("Moderation reply was not valid JSON, allowing content");
                Ok(ModerationVerdict::allowed())
            }
        }
    }

    async fn screen(&self, content: String) -> ModerationVerdict {
        if self.model.is_none() {
            return ModerationVerdict::allowed();
        }
        match self.moderate(content).await {
            Ok(verdict) => verdict,
            Err(e) => {
                tracing::warn!(error = %e, "Moderation screen failed, allowing content");
                ModerationVerdict::allowed()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{User, UserRole};
    use crate::infra::{MockLanguageModel, MockRepos};
    use crate::services::access::fixtures;
    use chrono::{Duration, Utc};

    fn user(id: Uuid, interests: &[&str]) -> User {
        User {
            id,
            email: "ada@example.com".into(),
            password_hash: String::new(),
            name: "Ada".into(),
            bio: None,
            interests: interests.iter().map(|s| s.to_string()).collect(),
            role: UserRole::User,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            deleted_at: None,
        }
    }

    fn community(name: &str, category: &str, age_days: i64) -> Community {
        let mut community = fixtures::community(Uuid::new_v4());
        community.name = name.into();
        community.category = category.into();
        community.description = String::new();
        community.created_at = Utc::now() - Duration::days(age_days);
        community
    }

    fn repos_for_recommendations(
        interests: &'static [&'static str],
        joined: Vec<Community>,
        listed: Vec<Community>,
    ) -> MockRepos {
        let mut repos = MockRepos::default();
        repos
            .users
            .expect_find_by_id()
            .returning(move |id| Ok(Some(user(id, interests))));
        repos
            .communities
            .expect_membership_community_ids()
            .returning(move |_| Ok(joined.iter().map(|community| community.id).collect()));
        repos.communities.expect_list().returning(move |_, _| {
            let total = listed.len() as u64;
            Ok((listed.clone(), total))
        });
        repos
    }

    #[test]
    fn test_fallback_prefers_interest_matches() {
        let newest = community("Board Game Nights", "games", 1);
        let chess = community("Chess Club", "games", 5);
        let ranked = fallback_recommendations(
            &["Chess".into()],
            None,
            &[newest.clone(), chess.clone()],
            2,
        );

        assert_eq!(ranked[0].community.id, chess.id);
        assert_eq!(ranked[0].reason, "Matches your interest in chess");
        assert_eq!(ranked[1].community.id, newest.id);
    }

    #[test]
    fn test_resolve_picks_ignores_unknown_ids() {
        let a = community("A", "music", 1);
        let picks = vec![
            Pick {
                id: Uuid::new_v4().to_string(),
                reason: None,
            },
            Pick {
                id: a.id.to_string(),
                reason: Some("Great fit".into()),
            },
            Pick {
                id: a.id.to_string(),
                reason: None,
            },
            Pick {
                id: "not-a-uuid".into(),
                reason: None,
            },
        ];
        let resolved = resolve_picks(picks, &[a.clone()], 5);
        assert_eq!(resolved.len(), 1);
        assert_eq!(resolved[0].reason, "Great fit");
    }

    #[tokio::test]
    async fn test_recommend_uses_model_picks() {
        let joined = community("Already In", "games", 2);
        let pick = community("Jazz Jam", "music", 3);
        let other = community("Knitting", "crafts", 4);
        let listed = vec![joined.clone(), pick.clone(), other];
        let repos = repos_for_recommendations(&["jazz"], vec![joined.clone()], listed);

        let pick_id = pick.id;
        let joined_id = joined.id;
        let mut model = MockLanguageModel::new();
        model
            .expect_complete()
            .withf(move |request| {
                let prompt = &request.messages[0].content;
                prompt.contains(&pick_id.to_string()) && !prompt.contains(&joined_id.to_string())
            })
            .returning(move |_| {
                Ok(format!(
                    "```json\n[{{\"id\": \"{}\", \"reason\": \"You like jazz\"}}]\n```",
                    pick_id
                ))
            });

        let service = AssistantManager::new(repos.into_uow(), Some(Arc::new(model)));
        let recommendations = service
            .recommend(Actor::member(Uuid::new_v4()), None, 3)
            .await
            .unwrap();

        assert_eq!(recommendations.len(), 1);
        assert_eq!(recommendations[0].community.id, pick.id);
        assert_eq!(recommendations[0].reason, "You like jazz");
    }

    #[tokio::test]
    async fn test_recommend_falls_back_on_garbage_reply() {
        let newest = community("Newest", "food", 1);
        let older = community("Older", "food", 9);
        let repos =
            repos_for_recommendations(&[], vec![], vec![newest.clone(), older.clone()]);

        let mut model = MockLanguageModel::new();
        model
            .expect_complete()
            .returning(|_| Ok("I think you would like cooking!".into()));

        let service = AssistantManager::new(repos.into_uow(), Some(Arc::new(model)));
        let recommendations = service
            .recommend(Actor::member(Uuid::new_v4()), Some("  ".into()), 5)
            .await
            .unwrap();

        let ids: Vec<Uuid> = recommendations.iter().map(|r| r.community.id).collect();
        assert_eq!(ids, vec![newest.id, older.id]);
    }

    #[tokio::test]
    async fn test_recommend_skips_communities_user_is_banned_from() {
        let banned_from = community("Chess Club", "games", 1);
        let open = community("Go Club", "games", 4);
        let repos = repos_for_recommendations(
            &["games"],
            vec![banned_from.clone()],
            vec![banned_from.clone(), open.clone()],
        );

        let service = AssistantManager::new(repos.into_uow(), None);
        let recommendations = service
            .recommend(Actor::member(Uuid::new_v4()), None, 5)
            .await
            .unwrap();

        let ids: Vec<Uuid> = recommendations.iter().map(|r| r.community.id).collect();
        assert_eq!(ids, vec![open.id]);
    }

    #[tokio::test]
    async fn test_chat_requires_model() {
        let service = AssistantManager::new(MockRepos::default().into_uow(), None);
        let result = service
            .chat(Actor::member(Uuid::new_v4()), "hello".into(), vec![])
            .await;
        assert!(matches!(result, Err(AppError::Ai(_))));
    }

    #[tokio::test]
    async fn test_chat_caps_history() {
        let mut repos = MockRepos::default();
        repos
            .users
            .expect_find_by_id()
            .returning(|id| Ok(Some(user(id, &["hiking"]))));

        let mut model = MockLanguageModel::new();
        model
            .expect_complete()
            .withf(|request| {
                request.messages.len() == AI_MAX_HISTORY_MESSAGES + 1
                    && request.messages.last().map(|m| m.content.as_str()) == Some("and now?")
                    && request.system.contains("hiking")
            })
            .returning(|_| Ok("  Try the Alpine Club.  ".into()));

        let history: Vec<ChatMessage> = (0..30)
            .map(|i| ChatMessage::assistant(format!("turn {}", i)))
            .collect();
        let service = AssistantManager::new(repos.into_uow(), Some(Arc::new(model)));
        let reply = service
            .chat(Actor::member(Uuid::new_v4()), " and now? ".into(), history)
            .await
            .unwrap();
        assert_eq!(reply, "Try the Alpine Club.");
    }

    #[tokio::test]
    async fn test_moderate_parses_verdict() {
        let mut model = MockLanguageModel::new();
        model.expect_complete().returning(|_| {
            Ok(r#"{"flagged": true, "categories": ["spam"], "reason": "Link farm"}"#.into())
        });

        let service =
            AssistantManager::new(MockRepos::default().into_uow(), Some(Arc::new(model)));
        let verdict = service.moderate("buy now".into()).await.unwrap();
        assert!(verdict.flagged);
        assert_eq!(verdict.categories, vec!["spam".to_string()]);
    }

    #[tokio::test]
    async fn test_screen_fails_open() {
        let mut model = MockLanguageModel::new();
        model
            .expect_complete()
            .returning(|_| Err(AppError::ai("timeout")));

        let service =
            AssistantManager::new(MockRepos::default().into_uow(), Some(Arc::new(model)));
        assert!(!service.screen("hello".into()).await.flagged);

        let unconfigured = AssistantManager::new(MockRepos::default().into_uow(), None);
        assert!(!unconfigured.screen("hello".into()).await.flagged);
    }
}
