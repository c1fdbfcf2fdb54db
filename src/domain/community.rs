//! Communities and their memberships.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::errors::AppError;

/// Role of a user inside one community
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum MemberRole {
    Admin,
    Moderator,
    Member,
    Banned,
}

impl MemberRole {
    pub fn as_str(self) -> &'static str {
        match self {
            MemberRole::Admin => "admin",
            MemberRole::Moderator => "moderator",
            MemberRole::Member => "member",
            MemberRole::Banned => "banned",
        }
    }

    pub fn is_admin(self) -> bool {
        matches!(self, MemberRole::Admin)
    }

    /// Admins and moderators act on reports, events and other members' posts
    pub fn can_moderate(self) -> bool {
        matches!(self, MemberRole::Admin | MemberRole::Moderator)
    }

    pub fn is_banned(self) -> bool {
        matches!(self, MemberRole::Banned)
    }

    /// Active members take part in the community (everyone except banned users)
    pub fn is_active(self) -> bool {
        !self.is_banned()
    }
}

impl FromStr for MemberRole {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(MemberRole::Admin),
            "moderator" => Ok(MemberRole::Moderator),
            "member" => Ok(MemberRole::Member),
            "banned" => Ok(MemberRole::Banned),
            other => Err(AppError::internal(format!("unknown member role: {}", other))),
        }
    }
}

impl std::fmt::Display for MemberRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Community entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Community {
    pub id: Uuid,
    #[schema(example = "Trail Runners Berlin")]
    pub name: String,
    pub description: String,
    #[schema(example = "sports")]
    pub category: String,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields for a new community
#[derive(Debug, Clone, PartialEq)]
pub struct NewCommunity {
    pub name: String,
    pub description: String,
    pub category: String,
}

/// Community fields an admin may change
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CommunityChanges {
    pub name: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
}

impl CommunityChanges {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.description.is_none() && self.category.is_none()
    }
}

/// Listing filter
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CommunityFilter {
    /// Case-insensitive substring of the name
    pub search: Option<String>,
    pub category: Option<String>,
}

/// A user's membership row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Membership {
    pub community_id: Uuid,
    pub user_id: Uuid,
    pub role: MemberRole,
    pub joined_at: DateTime<Utc>,
}

/// Member listing entry
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct Member {
    pub user_id: Uuid,
    pub name: String,
    pub role: MemberRole,
    pub joined_at: DateTime<Utc>,
}

/// Community detail as seen by one user
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CommunityDetail {
    pub community: Community,
    pub member_count: u64,
    /// Caller's role, absent when not a member
    pub my_role: Option<MemberRole>,
}

/// A community the user belongs to
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct UserCommunity {
    pub community: Community,
    pub role: MemberRole,
    pub joined_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_permissions() {
        assert!(MemberRole::Admin.can_moderate());
        assert!(MemberRole::Moderator.can_moderate());
        assert!(!MemberRole::Member.can_moderate());
        assert!(!MemberRole::Banned.can_moderate());
        assert!(MemberRole::Banned.is_banned());
        assert!(MemberRole::Member.is_active());
    }

    #[test]
    fn test_role_round_trip() {
        for role in [
            MemberRole::Admin,
            MemberRole::Moderator,
            MemberRole::Member,
            MemberRole::Banned,
        ] {
            assert_eq!(role.as_str().parse::<MemberRole>().unwrap(), role);
        }
        assert!("owner".parse::<MemberRole>().is_err());
    }

    #[test]
    fn test_changes_is_empty() {
        assert!(CommunityChanges::default().is_empty());
        let changes = CommunityChanges {
            category: Some("music".into()),
            ..Default::default()
        };
        assert!(!changes.is_empty());
    }
}
