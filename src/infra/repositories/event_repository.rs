//! Event and RSVP repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use uuid::Uuid;

use super::entities::{
    event::{self, Entity as EventEntity},
    event_rsvp::{self, Entity as RsvpEntity},
};
use crate::domain::{has_capacity, Event, NewEvent, Rsvp, RsvpCounts, RsvpStatus};
use crate::errors::{AppError, AppResult, OptionExt};

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// Result of writing an RSVP
#[derive(Debug, Clone, PartialEq)]
pub struct RsvpChange {
    pub rsvp: Rsvp,
    /// Status before this write, `None` for a first RSVP
    pub previous: Option<RsvpStatus>,
}

#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait EventRepository: Send + Sync {
    async fn create(
        &self,
        community_id: Uuid,
        created_by: Uuid,
        new: NewEvent,
    ) -> AppResult<Event>;

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Event>>;

    /// Soonest first
    async fn list_by_community(&self, community_id: Uuid) -> AppResult<Vec<Event>>;

    /// Events starting after `from` in any of the communities, soonest first
    async fn upcoming(
        &self,
        community_ids: Vec<Uuid>,
        from: DateTime<Utc>,
        limit: u64,
    ) -> AppResult<Vec<Event>>;

    async fn rsvp(&self, event_id: Uuid, user_id: Uuid) -> AppResult<Option<Rsvp>>;

    /// Insert or update the caller's RSVP.
    ///
    /// The event row is locked while `going` RSVPs are counted so the
    /// capacity cannot be overrun by concurrent requests.
    async fn set_rsvp(
        &self,
        event_id: Uuid,
        user_id: Uuid,
        status: RsvpStatus,
    ) -> AppResult<RsvpChange>;

    /// Returns whether a row was removed
    async fn delete_rsvp(&self, event_id: Uuid, user_id: Uuid) -> AppResult<bool>;

    async fn rsvp_counts(&self, event_id: Uuid) -> AppResult<RsvpCounts>;
}

pub struct EventStore {
    db: DatabaseConnection,
}

impl EventStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

async fn count_status<C: ConnectionTrait>(
    conn: &C,
    event_id: Uuid,
    status: RsvpStatus,
) -> AppResult<u64> {
    let count = RsvpEntity::find()
        .filter(event_rsvp::Column::EventId.eq(event_id))
        .filter(event_rsvp::Column::Status.eq(status.as_str()))
        .count(conn)
        .await?;
    Ok(count)
}

#[async_trait]
impl EventRepository for EventStore {
    async fn create(
        &self,
        community_id: Uuid,
        created_by: Uuid,
        new: NewEvent,
    ) -> AppResult<Event> {
        let model = event::ActiveModel {
            id: Set(Uuid::new_v4()),
            community_id: Set(community_id),
            created_by: Set(created_by),
            title: Set(new.title),
            description: Set(new.description),
            location: Set(new.location),
            starts_at: Set(new.starts_at),
            ends_at: Set(new.ends_at),
            capacity: Set(new.capacity),
            created_at: Set(Utc::now()),
        }
        .insert(&self.db)
        .await?;

        Ok(Event::from(model))
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Event>> {
        let model = EventEntity::find_by_id(id).one(&self.db).await?;
        Ok(model.map(Event::from))
    }

    async fn list_by_community(&self, community_id: Uuid) -> AppResult<Vec<Event>> {
        let models = EventEntity::find()
            .filter(event::Column::CommunityId.eq(community_id))
            .order_by_asc(event::Column::StartsAt)
            .all(&self.db)
            .await?;
        Ok(models.into_iter().map(Event::from).collect())
    }

    async fn upcoming(
        &self,
        community_ids: Vec<Uuid>,
        from: DateTime<Utc>,
        limit: u64,
    ) -> AppResult<Vec<Event>> {
        if community_ids.is_empty() {
            return Ok(Vec::new());
        }

        let models = EventEntity::find()
            .filter(event::Column::CommunityId.is_in(community_ids))
            .filter(event::Column::StartsAt.gte(from))
            .order_by_asc(event::Column::StartsAt)
            .limit(limit)
            .all(&self.db)
            .await?;
        Ok(models.into_iter().map(Event::from).collect())
    }

    async fn rsvp(&self, event_id: Uuid, user_id: Uuid) -> AppResult<Option<Rsvp>> {
        RsvpEntity::find()
            .filter(event_rsvp::Column::EventId.eq(event_id))
            .filter(event_rsvp::Column::UserId.eq(user_id))
            .one(&self.db)
            .await?
            .map(Rsvp::try_from)
            .transpose()
    }

    async fn set_rsvp(
        &self,
        event_id: Uuid,
        user_id: Uuid,
        status: RsvpStatus,
    ) -> AppResult<RsvpChange> {
        let txn = self.db.begin().await?;

        let event = EventEntity::find_by_id(event_id)
            .lock_exclusive()
            .one(&txn)
            .await?
            .ok_or_missing("Event")?;

        let existing = RsvpEntity::find()
            .filter(event_rsvp::Column::EventId.eq(event_id))
            .filter(event_rsvp::Column::UserId.eq(user_id))
            .one(&txn)
            .await?;
        let previous = existing
            .as_ref()
            .map(|m| m.status.parse::<RsvpStatus>())
            .transpose()?;

        if status == RsvpStatus::Going && previous != Some(RsvpStatus::Going) {
            let going = count_status(&txn, event_id, RsvpStatus::Going).await?;
            if !has_capacity(event.capacity, going) {
                return Err(AppError::conflict("Event is at full capacity"));
            }
        }

        let model = match existing {
            Some(model) => {
                let mut active: event_rsvp::ActiveModel = model.into();
                active.status = Set(status.as_str().to_string());
                active.update(&txn).await?
            }
            None => {
                event_rsvp::ActiveModel {
                    id: Set(Uuid::new_v4()),
                    event_id: Set(event_id),
                    user_id: Set(user_id),
                    status: Set(status.as_str().to_string()),
                    created_at: Set(Utc::now()),
                }
                .insert(&txn)
                .await?
            }
        };

        txn.commit().await?;

        Ok(RsvpChange {
            rsvp: Rsvp::try_from(model)?,
            previous,
        })
    }

    async fn delete_rsvp(&self, event_id: Uuid, user_id: Uuid) -> AppResult<bool> {
        let result = RsvpEntity::delete_many()
            .filter(event_rsvp::Column::EventId.eq(event_id))
            .filter(event_rsvp::Column::UserId.eq(user_id))
            .exec(&self.db)
            .await?;
        Ok(result.rows_affected > 0)
    }

    async fn rsvp_counts(&self, event_id: Uuid) -> AppResult<RsvpCounts> {
        Ok(RsvpCounts {
            going: count_status(&self.db, event_id, RsvpStatus::Going).await?,
            interested: count_status(&self.db, event_id, RsvpStatus::Interested).await?,
        })
    }
}
