//! Content reports and the review threshold.
//!
//! Reports are scoped to a community. Once the open reports against one
//! target reach `REPORT_THRESHOLD_PERCENT` of the community's members the
//! target is flagged and its reports move to `under_review`. A moderator
//! then closes every open report on the target with one action.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::config::REPORT_THRESHOLD_PERCENT;
use crate::errors::AppError;

/// Whether `reports` open reports among `members` members reach the review threshold.
///
/// Zero reports never flag. Zero members flag on any report.
pub fn threshold_reached(reports: u64, members: u64) -> bool {
    if reports == 0 {
        return false;
    }
    u128::from(reports) * 100 >= u128::from(members) * u128::from(REPORT_THRESHOLD_PERCENT)
}

/// Kind of thing being reported
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ReportTarget {
    Post,
    Event,
    User,
}

impl ReportTarget {
    pub fn as_str(self) -> &'static str {
        match self {
            ReportTarget::Post => "post",
            ReportTarget::Event => "event",
            ReportTarget::User => "user",
        }
    }
}

impl FromStr for ReportTarget {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "post" => Ok(ReportTarget::Post),
            "event" => Ok(ReportTarget::Event),
            "user" => Ok(ReportTarget::User),
            other => Err(AppError::internal(format!("unknown report target: {}", other))),
        }
    }
}

/// Lifecycle of a report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ReportStatus {
    Pending,
    UnderReview,
    Actioned,
    Dismissed,
}

impl ReportStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ReportStatus::Pending => "pending",
            ReportStatus::UnderReview => "under_review",
            ReportStatus::Actioned => "actioned",
            ReportStatus::Dismissed => "dismissed",
        }
    }

    /// Open reports still await a moderator decision
    pub fn is_open(self) -> bool {
        matches!(self, ReportStatus::Pending | ReportStatus::UnderReview)
    }

    pub const OPEN: [ReportStatus; 2] = [ReportStatus::Pending, ReportStatus::UnderReview];
}

impl FromStr for ReportStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(ReportStatus::Pending),
            "under_review" => Ok(ReportStatus::UnderReview),
            "actioned" => Ok(ReportStatus::Actioned),
            "dismissed" => Ok(ReportStatus::Dismissed),
            other => Err(AppError::internal(format!("unknown report status: {}", other))),
        }
    }
}

/// Decision taken on a reported target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ModerationAction {
    /// Ban the offending user from the community
    Ban,
    /// Remove the reported content (or the reported member)
    Delete,
    /// Close the reports without action
    Dismiss,
}

impl ModerationAction {
    pub fn as_str(self) -> &'static str {
        match self {
            ModerationAction::Ban => "ban",
            ModerationAction::Delete => "delete",
            ModerationAction::Dismiss => "dismiss",
        }
    }

    /// Status the target's reports end in
    pub fn resulting_status(self) -> ReportStatus {
        match self {
            ModerationAction::Dismiss => ReportStatus::Dismissed,
            ModerationAction::Ban | ModerationAction::Delete => ReportStatus::Actioned,
        }
    }

    /// Whether reporters were right
    pub fn is_upheld(self) -> bool {
        !matches!(self, ModerationAction::Dismiss)
    }
}

impl FromStr for ModerationAction {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ban" => Ok(ModerationAction::Ban),
            "delete" => Ok(ModerationAction::Delete),
            "dismiss" => Ok(ModerationAction::Dismiss),
            other => Err(AppError::internal(format!("unknown moderation action: {}", other))),
        }
    }
}

/// A report raised by a member
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Report {
    pub id: Uuid,
    pub community_id: Uuid,
    pub reporter_id: Uuid,
    pub target_type: ReportTarget,
    pub target_id: Uuid,
    #[schema(example = "Spam")]
    pub reason: String,
    pub details: Option<String>,
    pub status: ReportStatus,
    pub resolution: Option<ModerationAction>,
    pub resolution_note: Option<String>,
    pub resolved_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
}

/// New report as accepted from a member
#[derive(Debug, Clone, PartialEq)]
pub struct NewReport {
    pub community_id: Uuid,
    pub reporter_id: Uuid,
    pub target_type: ReportTarget,
    pub target_id: Uuid,
    pub reason: String,
    pub details: Option<String>,
}

/// What happened when a report was filed
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ReportOutcome {
    pub report: Report,
    /// Open reports against the same target, this one included
    pub open_reports: u64,
    /// Community members counted for the threshold
    pub members: u64,
    /// Whether the target is now under review
    pub flagged: bool,
}

/// Everything needed to close a target's reports in one transaction
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    pub community_id: Uuid,
    pub target_type: ReportTarget,
    pub target_id: Uuid,
    pub action: ModerationAction,
    /// User to ban when `action` is `Ban`
    pub offender_id: Option<Uuid>,
    pub resolved_by: Uuid,
    pub note: Option<String>,
}
