//! Event service - Community events and RSVPs.

use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;

use super::access::{active_membership, require_community, require_moderator};
use super::notification_service::NotificationService;
use super::reputation_service::{reward, reward_once, ReputationService};
use crate::domain::{
    Activity, Actor, Event, MemberRole, NewEvent, NotificationKind, RsvpState, RsvpStatus,
};
use crate::errors::{AppError, AppResult, OptionExt};
use crate::infra::UnitOfWork;

/// Cap on `upcoming` results
const UPCOMING_EVENTS_LIMIT: u64 = 50;

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait EventService: Send + Sync {
    /// Moderators schedule events; members are notified
    async fn create(&self, actor: Actor, community_id: Uuid, new: NewEvent) -> AppResult<Event>;

    async fn list(&self, community_id: Uuid) -> AppResult<Vec<Event>>;

    /// Future events across the caller's communities
    async fn upcoming(&self, actor: Actor) -> AppResult<Vec<Event>>;

    async fn get(&self, id: Uuid) -> AppResult<Event>;

    async fn rsvp_state(&self, actor: Actor, id: Uuid) -> AppResult<RsvpState>;

    async fn rsvp(&self, actor: Actor, id: Uuid, status: RsvpStatus) -> AppResult<RsvpState>;

    async fn cancel_rsvp(&self, actor: Actor, id: Uuid) -> AppResult<()>;
}

fn validate_event(new: NewEvent) -> AppResult<NewEvent> {
    let title = new.title.trim().to_string();
    if title.is_empty() {
        return Err(AppError::validation("Title is required"));
    }
    if let Some(ends_at) = new.ends_at {
        if ends_at <= new.starts_at {
            return Err(AppError::validation("Event must end after it starts"));
        }
    }
    if matches!(new.capacity, Some(c) if c <= 0) {
        return Err(AppError::validation("Capacity must be positive"));
    }

    Ok(NewEvent {
        title,
        description: new.description.trim().to_string(),
        location: new
            .location
            .map(|l| l.trim().to_string())
            .filter(|l| !l.is_empty()),
        ..new
    })
}

pub struct EventManager<U: UnitOfWork> {
    uow: Arc<U>,
    reputation: Arc<dyn ReputationService>,
    notifications: Arc<dyn NotificationService>,
}

impl<U: UnitOfWork> EventManager<U> {
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

    async fn state(&self, event: &Event, user_id: Uuid) -> AppResult<RsvpState> {
        let events = self.uow.events();
        let (rsvp, counts) =
            tokio::try_join!(events.rsvp(event.id, user_id), events.rsvp_counts(event.id))?;

        Ok(RsvpState {
            event_id: event.id,
            status: rsvp.map(|r| r.status),
            counts,
            capacity: event.capacity,
        })
    }

    async fn announce(&self, event: &Event, community_name: &str) {
        let recipients = match self
            .uow
            .communities()
            .member_ids(
                event.community_id,
                vec![MemberRole::Admin, MemberRole::Moderator, MemberRole::Member],
            )
            .await
        {
            Ok(ids) => ids.into_iter().filter(|id| *id != event.created_by).collect(),
            Err(e) => {
                tracing::warn!(event_id = %event.id, error = %e, "Could not load event audience");
                return;
            }
        };

        let message = format!("New event in {}: {}", community_name, event.title);
        if let Err(e) = self
            .notifications
            .notify_many(
                recipients,
                NotificationKind::EventCreated,
                message,
                Some(format!("/events/{}", event.id)),
            )
            .await
        {
            tracing::warn!(event_id = %event.id, error = %e, "Event announcement failed");
        }
    }
}

#[async_trait]
impl<U: UnitOfWork> EventService for EventManager<U> {
    async fn create(&self, actor: Actor, community_id: Uuid, new: NewEvent) -> AppResult<Event> {
        let new = validate_event(new)?;
        let community = require_community(self.uow.as_ref(), community_id).await?;
        require_moderator(self.uow.as_ref(), community_id, actor).await?;

        let event = self
            .uow
            .events()
            .create(community_id, actor.id, new)
            .await?;
        tracing::info!(
            event_id = %event.id,
            community_id = %community_id,
            user_id = %actor.id,
            "Event created"
        );

        self.announce(&event, &community.name).await;
        reward(self.reputation.as_ref(), actor.id, Activity::CreateEvent).await;
        Ok(event)
    }

    async fn list(&self, community_id: Uuid) -> AppResult<Vec<Event>> {
        require_community(self.uow.as_ref(), community_id).await?;
        self.uow.events().list_by_community(community_id).await
    }

    async fn upcoming(&self, actor: Actor) -> AppResult<Vec<Event>> {
        let community_ids: Vec<Uuid> = self
            .uow
            .communities()
            .list_for_user(actor.id)
            .await?
            .into_iter()
            .map(|m| m.community.id)
            .collect();
        if community_ids.is_empty() {
            return Ok(Vec::new());
        }

        self.uow
            .events()
            .upcoming(community_ids, Utc::now(), UPCOMING_EVENTS_LIMIT)
            .await
    }

    async fn get(&self, id: Uuid) -> AppResult<Event> {
        self.uow.events().find_by_id(id).await?.ok_or_missing("Event")
    }

    async fn rsvp_state(&self, actor: Actor, id: Uuid) -> AppResult<RsvpState> {
        let event = self.get(id).await?;
        self.state(&event, actor.id).await
    }

    async fn rsvp(&self, actor: Actor, id: Uuid, status: RsvpStatus) -> AppResult<RsvpState> {
        let event = self.get(id).await?;
        active_membership(self.uow.as_ref(), event.community_id, actor.id).await?;

        let change = self.uow.events().set_rsvp(id, actor.id, status).await?;
        // Paid once per event, however often the RSVP changes or is cancelled
        if status == RsvpStatus::Going && change.previous != Some(RsvpStatus::Going) {
            reward_once(self.reputation.as_ref(), actor.id, Activity::RsvpGoing, id).await;
        }

        self.state(&event, actor.id).await
    }

    async fn cancel_rsvp(&self, actor: Actor, id: Uuid) -> AppResult<()> {
        self.get(id).await?;
        if !self.uow.events().delete_rsvp(id, actor.id).await? {
            return Err(AppError::Missing("RSVP".into()));
        }
        Ok(())
    }
}
