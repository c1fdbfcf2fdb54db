//! Purchasable badges.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Badge {
    pub id: Uuid,
    #[schema(example = "Trailblazer")]
    pub name: String,
    pub description: String,
    pub icon: Option<String>,
    /// Cost in points
    #[schema(example = 200)]
    pub price: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewBadge {
    pub name: String,
    pub description: String,
    pub icon: Option<String>,
    pub price: i64,
}

/// A badge in a user's collection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct OwnedBadge {
    pub badge: Badge,
    pub purchased_at: DateTime<Utc>,
}
