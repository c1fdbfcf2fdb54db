//! In-app notifications.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::errors::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    LevelUp,
    ReportFlagged,
    ContentRemoved,
    Banned,
    BadgePurchased,
    RoleChanged,
    EventCreated,
}

impl NotificationKind {
    pub fn as_str(self) -> &'static str {
        match self {
            NotificationKind::LevelUp => "level_up",
            NotificationKind::ReportFlagged => "report_flagged",
            NotificationKind::ContentRemoved => "content_removed",
            NotificationKind::Banned => "banned",
            NotificationKind::BadgePurchased => "badge_purchased",
            NotificationKind::RoleChanged => "role_changed",
            NotificationKind::EventCreated => "event_created",
        }
    }

    /// Moderation notices are also delivered by e-mail
    pub fn sends_email(self) -> bool {
        matches!(
            self,
            NotificationKind::ReportFlagged | NotificationKind::Banned
        )
    }
}

impl FromStr for NotificationKind {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "level_up" => Ok(NotificationKind::LevelUp),
            "report_flagged" => Ok(NotificationKind::ReportFlagged),
            "content_removed" => Ok(NotificationKind::ContentRemoved),
            "banned" => Ok(NotificationKind::Banned),
            "badge_purchased" => Ok(NotificationKind::BadgePurchased),
            "role_changed" => Ok(NotificationKind::RoleChanged),
            "event_created" => Ok(NotificationKind::EventCreated),
            other => Err(AppError::internal(format!("unknown notification kind: {}", other))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Notification {
    pub id: Uuid,
    pub user_id: Uuid,
    pub kind: NotificationKind,
    pub message: String,
    /// Client route the notification points at
    #[schema(example = "/communities/550e8400-e29b-41d4-a716-446655440000")]
    pub link: Option<String>,
    pub read_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewNotification {
    pub user_id: Uuid,
    pub kind: NotificationKind,
    pub message: String,
    pub link: Option<String>,
}

impl NewNotification {
    pub fn new(user_id: Uuid, kind: NotificationKind, message: impl Into<String>) -> Self {
        Self {
            user_id,
            kind,
            message: message.into(),
            link: None,
        }
    }

    pub fn with_link(mut self, link: impl Into<String>) -> Self {
        self.link = Some(link.into());
        self
    }
}
