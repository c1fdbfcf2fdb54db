//! Reputation levels and the points awarded for platform activity.
//!
//! A user's level is derived from *earned* points, the sum of every
//! positive ledger entry. Badge purchases spend from the *balance* (the
//! sum of all entries) and therefore never lower a level.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::config::{
    LEVEL_ADVANCED_POINTS, LEVEL_BEGINNER_POINTS, LEVEL_EXPERT_POINTS,
    LEVEL_INTERMEDIATE_POINTS, POINTS_CREATE_COMMUNITY, POINTS_CREATE_EVENT,
    POINTS_CREATE_POST, POINTS_JOIN_COMMUNITY, POINTS_REPORT_UPHELD, POINTS_RSVP_GOING,
};

/// Discrete reputation label, ordered from lowest to highest.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema,
)]
pub enum ReputationLevel {
    Newcomer,
    Beginner,
    Intermediate,
    Advanced,
    Expert,
}

impl ReputationLevel {
    /// Map a point total to its level. Total over all integers.
    pub fn from_points(points: i64) -> Self {
        match points {
            p if p >= LEVEL_EXPERT_POINTS => ReputationLevel::Expert,
            p if p >= LEVEL_ADVANCED_POINTS => ReputationLevel::Advanced,
            p if p >= LEVEL_INTERMEDIATE_POINTS => ReputationLevel::Intermediate,
            p if p >= LEVEL_BEGINNER_POINTS => ReputationLevel::Beginner,
            _ => ReputationLevel::Newcomer,
        }
    }

    /// Points required to reach this level.
    pub fn min_points(self) -> i64 {
        match self {
            ReputationLevel::Newcomer => 0,
            ReputationLevel::Beginner => LEVEL_BEGINNER_POINTS,
            ReputationLevel::Intermediate => LEVEL_INTERMEDIATE_POINTS,
            ReputationLevel::Advanced => LEVEL_ADVANCED_POINTS,
            ReputationLevel::Expert => LEVEL_EXPERT_POINTS,
        }
    }

    /// The level above this one, if any.
    pub fn next(self) -> Option<Self> {
        match self {
            ReputationLevel::Newcomer => Some(ReputationLevel::Beginner),
            ReputationLevel::Beginner => Some(ReputationLevel::Intermediate),
            ReputationLevel::Intermediate => Some(ReputationLevel::Advanced),
            ReputationLevel::Advanced => Some(ReputationLevel::Expert),
            ReputationLevel::Expert => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ReputationLevel::Newcomer => "Newcomer",
            ReputationLevel::Beginner => "Beginner",
            ReputationLevel::Intermediate => "Intermediate",
            ReputationLevel::Advanced => "Advanced",
            ReputationLevel::Expert => "Expert",
        }
    }
}

impl std::fmt::Display for ReputationLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Activities that earn points.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Activity {
    CreateCommunity,
    JoinCommunity,
    CreatePost,
    CreateEvent,
    RsvpGoing,
    ReportUpheld,
}

impl Activity {
    pub fn points(self) -> i64 {
        match self {
            Activity::CreateCommunity => POINTS_CREATE_COMMUNITY,
            Activity::JoinCommunity => POINTS_JOIN_COMMUNITY,
            Activity::CreatePost => POINTS_CREATE_POST,
            Activity::CreateEvent => POINTS_CREATE_EVENT,
            Activity::RsvpGoing => POINTS_RSVP_GOING,
            Activity::ReportUpheld => POINTS_REPORT_UPHELD,
        }
    }

    /// Ledger reason recorded with the award
    pub fn reason(self) -> &'static str {
        match self {
            Activity::CreateCommunity => "community_created",
            Activity::JoinCommunity => "community_joined",
            Activity::CreatePost => "post_created",
            Activity::CreateEvent => "event_created",
            Activity::RsvpGoing => "event_rsvp",
            Activity::ReportUpheld => "report_upheld",
        }
    }
}

/// Ledger reason for badge purchases
pub const REASON_BADGE_PURCHASE: &str = "badge_purchase";

/// One row of the points ledger
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PointTransaction {
    pub id: Uuid,
    pub user_id: Uuid,
    /// Signed amount; negative for spending
    #[schema(example = 10)]
    pub amount: i64,
    #[schema(example = "community_joined")]
    pub reason: String,
    pub created_at: DateTime<Utc>,
}

/// Aggregates over a user's ledger
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PointTotals {
    /// Sum of every entry (spendable)
    pub balance: i64,
    /// Sum of positive entries (drives the level)
    pub earned: i64,
}

impl PointTotals {
    /// Totals once an entry of `amount` is appended
    pub fn with_entry(self, amount: i64) -> Self {
        Self {
            balance: self.balance + amount,
            earned: self.earned + amount.max(0),
        }
    }
}

/// A recorded ledger entry with the totals on either side of it.
#[derive(Debug, Clone, PartialEq)]
pub struct PointAward {
    pub entry: PointTransaction,
    pub before: PointTotals,
    pub after: PointTotals,
}

impl PointAward {
    /// The new level when this entry crossed a level boundary
    pub fn level_reached(&self) -> Option<ReputationLevel> {
        let before = ReputationLevel::from_points(self.before.earned);
        let after = ReputationLevel::from_points(self.after.earned);
        (after != before).then_some(after)
    }
}

/// Reputation snapshot returned to clients
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ReputationSummary {
    #[schema(example = 120)]
    pub balance: i64,
    #[schema(example = 150)]
    pub earned: i64,
    pub level: ReputationLevel,
    pub next_level: Option<ReputationLevel>,
    /// Earned points still needed for `next_level`
    pub points_to_next_level: Option<i64>,
}

impl From<PointTotals> for ReputationSummary {
    fn from(totals: PointTotals) -> Self {
        let level = ReputationLevel::from_points(totals.earned);
        let next_level = level.next();
        Self {
            balance: totals.balance,
            earned: totals.earned,
            level,
            next_level,
            points_to_next_level: next_level.map(|next| next.min_points() - totals.earned),
        }
    }
}

/// Summary plus the most recent ledger entries
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PointsOverview {
    pub summary: ReputationSummary,
    pub recent: Vec<PointTransaction>,
}
