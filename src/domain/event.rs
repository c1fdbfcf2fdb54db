//! Community events and RSVPs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::errors::AppError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Event {
    pub id: Uuid,
    pub community_id: Uuid,
    pub created_by: Uuid,
    #[schema(example = "Sunday long run")]
    pub title: String,
    pub description: String,
    pub location: Option<String>,
    pub starts_at: DateTime<Utc>,
    pub ends_at: Option<DateTime<Utc>>,
    /// Maximum `going` RSVPs; unlimited when absent
    pub capacity: Option<i32>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewEvent {
    pub title: String,
    pub description: String,
    pub location: Option<String>,
    pub starts_at: DateTime<Utc>,
    pub ends_at: Option<DateTime<Utc>>,
    pub capacity: Option<i32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum RsvpStatus {
    Going,
    Interested,
}

impl RsvpStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            RsvpStatus::Going => "going",
            RsvpStatus::Interested => "interested",
        }
    }
}

impl FromStr for RsvpStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "going" => Ok(RsvpStatus::Going),
            "interested" => Ok(RsvpStatus::Interested),
            other => Err(AppError::internal(format!("unknown rsvp status: {}", other))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Rsvp {
    pub event_id: Uuid,
    pub user_id: Uuid,
    pub status: RsvpStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct RsvpCounts {
    pub going: u64,
    pub interested: u64,
}

/// Caller's RSVP plus the event's totals
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct RsvpState {
    pub event_id: Uuid,
    pub status: Option<RsvpStatus>,
    pub counts: RsvpCounts,
    pub capacity: Option<i32>,
}

/// Whether one more `going` RSVP fits.
pub fn has_capacity(capacity: Option<i32>, going: u64) -> bool {
    match capacity {
        None => true,
        Some(limit) if limit <= 0 => false,
        Some(limit) => going < limit as u64,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capacity() {
        assert!(has_capacity(None, 10_000));
        assert!(has_capacity(Some(3), 2));
        assert!(!has_capacity(Some(3), 3));
        assert!(!has_capacity(Some(0), 0));
    }

    #[test]
    fn test_rsvp_status_parse() {
        assert_eq!("going".parse::<RsvpStatus>().unwrap(), RsvpStatus::Going);
        assert!("maybe".parse::<RsvpStatus>().is_err());
    }
}
