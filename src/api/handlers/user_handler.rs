//! Handlers for the caller's own account: profile, points, badges,
//! memberships and notifications.

use axum::{
    extract::{Extension, Path, Query, State},
    response::Json,
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::api::extractors::ValidatedJson;
use crate::api::middleware::CurrentUser;
use crate::api::AppState;
use crate::domain::{
    Notification, OwnedBadge, PointsOverview, Profile, ProfileChanges, UserCommunity,
};
use crate::errors::AppResult;
use crate::types::{
    MessageResponse, NoContent, Paginated, PaginatedNotifications, PaginationParams,
};

/// Profile update; omitted fields are left unchanged
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateProfileRequest {
    #[validate(length(min = 1, max = 100, message = "Name cannot be empty"))]
    #[schema(example = "Ada Lovelace")]
    pub name: Option<String>,
    #[validate(length(max = 1000, message = "Bio is too long"))]
    #[schema(example = "Analytical engines and poetry")]
    pub bio: Option<String>,
    /// Replaces the whole interest list
    #[schema(example = json!(["mathematics", "music"]))]
    pub interests: Option<Vec<String>>,
}

/// Notification list filter
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct NotificationQuery {
    /// Only unread notifications
    #[serde(default)]
    pub unread_only: bool,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MarkAllReadResponse {
    /// Number of notifications marked read
    pub marked: u64,
}

/// Create user routes
pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/profile",
            get(get_profile).patch(update_profile).delete(delete_account),
        )
        .route("/points", get(get_points))
        .route("/badges", get(get_badges))
        .route("/communities", get(get_communities))
        .route("/notifications", get(list_notifications))
        .route("/notifications/read-all", post(mark_all_read))
        .route("/notifications/:id/read", post(mark_read))
}

/// Get the caller's profile with points and level
#[utoipa::path(
    get,
    path = "/api/user/profile",
    tag = "User",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Profile", body = Profile),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn get_profile(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
) -> AppResult<Json<Profile>> {
    let profile = state.user_service.profile(current_user.id).await?;
    Ok(Json(profile))
}

/// Update name, bio or interests
#[utoipa::path(
    patch,
    path = "/api/user/profile",
    tag = "User",
    security(("bearer_auth" = [])),
    request_body = UpdateProfileRequest,
    responses(
        (status = 200, description = "Profile updated", body = Profile),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn update_profile(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<UpdateProfileRequest>,
) -> AppResult<Json<Profile>> {
    let changes = ProfileChanges {
        name: payload.name,
        bio: payload.bio,
        interests: payload.interests,
    };
    let profile = state
        .user_service
        .update_profile(current_user.id, changes)
        .await?;
    Ok(Json(profile))
}

/// Soft-delete the caller's account
#[utoipa::path(
    delete,
    path = "/api/user/profile",
    tag = "User",
    security(("bearer_auth" = [])),
    responses(
        (status = 204, description = "Account deleted"),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn delete_account(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
) -> AppResult<NoContent> {
    state.user_service.delete_account(current_user.id).await?;
    Ok(NoContent)
}

/// Balance, level and the most recent ledger entries
#[utoipa::path(
    get,
    path = "/api/user/points",
    tag = "User",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Points overview", body = PointsOverview),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn get_points(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
) -> AppResult<Json<PointsOverview>> {
    let overview = state.reputation_service.overview(current_user.id).await?;
    Ok(Json(overview))
}

#[utoipa::path(
    get,
    path = "/api/user/badges",
    tag = "User",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Owned badges", body = Vec<OwnedBadge>),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn get_badges(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
) -> AppResult<Json<Vec<OwnedBadge>>> {
    let badges = state.badge_service.owned(current_user.id).await?;
    Ok(Json(badges))
}

#[utoipa::path(
    get,
    path = "/api/user/communities",
    tag = "User",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Communities the caller belongs to", body = Vec<UserCommunity>),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn get_communities(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
) -> AppResult<Json<Vec<UserCommunity>>> {
    let communities = state
        .community_service
        .user_communities(current_user.id)
        .await?;
    Ok(Json(communities))
}

/// List notifications, newest first
#[utoipa::path(
    get,
    path = "/api/user/notifications",
    tag = "User",
    security(("bearer_auth" = [])),
    params(NotificationQuery, PaginationParams),
    responses(
        (status = 200, description = "Notifications", body = PaginatedNotifications),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn list_notifications(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
    Query(query): Query<NotificationQuery>,
    Query(params): Query<PaginationParams>,
) -> AppResult<Json<Paginated<Notification>>> {
    let page = state
        .notification_service
        .list(current_user.id, query.unread_only, params)
        .await?;
    Ok(Json(page))
}

#[utoipa::path(
    post,
    path = "/api/user/notifications/{id}/read",
    tag = "User",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Notification ID")),
    responses(
        (status = 200, description = "Marked read", body = MessageResponse),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Notification not found")
    )
)]
pub async fn mark_read(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<MessageResponse>> {
    state
        .notification_service
        .mark_read(current_user.id, id)
        .await?;
    Ok(Json(MessageResponse::new("Notification marked as read")))
}

#[utoipa::path(
    post,
    path = "/api/user/notifications/read-all",
    tag = "User",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "All notifications marked read", body = MarkAllReadResponse),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn mark_all_read(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
) -> AppResult<Json<MarkAllReadResponse>> {
    let marked = state
        .notification_service
        .mark_all_read(current_user.id)
        .await?;
    Ok(Json(MarkAllReadResponse { marked }))
}
