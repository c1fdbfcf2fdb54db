//! Community handlers.
//!
//! Posts and events are nested under a community; their handlers live
//! in `post_handler` and `event_handler` but are mounted here.

use axum::{
    extract::{Extension, Path, Query, State},
    response::Json,
    routing::{delete, get, post, put},
    Router,
};
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use super::{event_handler, post_handler};
use crate::api::extractors::ValidatedJson;
use crate::api::middleware::CurrentUser;
use crate::api::AppState;
use crate::domain::{
    Community, CommunityChanges, CommunityDetail, CommunityFilter, Member, MemberRole,
    Membership, NewCommunity,
};
use crate::errors::AppResult;
use crate::types::{Created, MessageResponse, Paginated, PaginatedCommunities, PaginationParams};

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateCommunityRequest {
    #[validate(length(min = 1, max = 100, message = "Name is required"))]
    #[schema(example = "Rustaceans Berlin")]
    pub name: String,
    #[validate(length(max = 2000, message = "Description is too long"))]
    #[schema(example = "Monthly meetups for Rust developers")]
    #[serde(default)]
    pub description: String,
    #[validate(length(min = 1, max = 50, message = "Category is required"))]
    #[schema(example = "technology")]
    pub category: String,
}

/// Partial community update (community admins)
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateCommunityRequest {
    #[validate(length(min = 1, max = 100, message = "Name cannot be empty"))]
    pub name: Option<String>,
    #[validate(length(max = 2000, message = "Description is too long"))]
    pub description: Option<String>,
    #[validate(length(min = 1, max = 50, message = "Category cannot be empty"))]
    pub category: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct SetRoleRequest {
    /// `admin`, `moderator` or `member`
    pub role: MemberRole,
}

/// Community search filters
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct CommunityQuery {
    /// Case-insensitive match on name or description
    pub search: Option<String>,
    pub category: Option<String>,
}

/// Create community routes
pub fn community_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_communities).post(create_community))
        .route("/:id", get(get_community).patch(update_community))
        .route("/:id/join", post(join_community))
        .route("/:id/leave", post(leave_community))
        .route("/:id/members", get(list_members))
        .route("/:id/members/:user_id/role", put(set_member_role))
        .route(
            "/:id/posts",
            get(post_handler::list_posts).post(post_handler::create_post),
        )
        .route("/:id/posts/:post_id", delete(post_handler::delete_post))
        .route(
            "/:id/events",
            get(event_handler::list_community_events).post(event_handler::create_event),
        )
}

/// Search and paginate communities, newest first
#[utoipa::path(
    get,
    path = "/api/communities",
    tag = "Communities",
    security(("bearer_auth" = [])),
    params(CommunityQuery, PaginationParams),
    responses(
        (status = 200, description = "Communities", body = PaginatedCommunities),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn list_communities(
    State(state): State<AppState>,
    Query(query): Query<CommunityQuery>,
    Query(params): Query<PaginationParams>,
) -> AppResult<Json<Paginated<Community>>> {
    let filter = CommunityFilter {
        search: query.search,
        category: query.category,
    };
    let page = state.community_service.list(filter, params).await?;
    Ok(Json(page))
}

/// Create a community; the caller becomes its admin
#[utoipa::path(
    post,
    path = "/api/communities",
    tag = "Communities",
    security(("bearer_auth" = [])),
    request_body = CreateCommunityRequest,
    responses(
        (status = 201, description = "Community created", body = Community),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Unauthorized"),
        (status = 409, description = "Name already taken")
    )
)]
pub async fn create_community(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<CreateCommunityRequest>,
) -> AppResult<Created<Community>> {
    let community = state
        .community_service
        .create(
            current_user.actor(),
            NewCommunity {
                name: payload.name,
                description: payload.description,
                category: payload.category,
            },
        )
        .await?;
    Ok(Created(community))
}

#[utoipa::path(
    get,
    path = "/api/communities/{id}",
    tag = "Communities",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Community ID")),
    responses(
        (status = 200, description = "Community with member count and the caller's role", body = CommunityDetail),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Community not found")
    )
)]
pub async fn get_community(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<CommunityDetail>> {
    let detail = state
        .community_service
        .get(current_user.actor(), id)
        .await?;
    Ok(Json(detail))
}

#[utoipa::path(
    patch,
    path = "/api/communities/{id}",
    tag = "Communities",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Community ID")),
    request_body = UpdateCommunityRequest,
    responses(
        (status = 200, description = "Community updated", body = Community),
        (status = 400, description = "Validation error"),
        (status = 403, description = "Not a community admin"),
        (status = 404, description = "Community not found"),
        (status = 409, description = "Name already taken")
    )
)]
pub async fn update_community(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ValidatedJson(payload): ValidatedJson<UpdateCommunityRequest>,
) -> AppResult<Json<Community>> {
    let changes = CommunityChanges {
        name: payload.name,
        description: payload.description,
        category: payload.category,
    };
    let community = state
        .community_service
        .update(current_user.actor(), id, changes)
        .await?;
    Ok(Json(community))
}

/// Join a community
#[utoipa::path(
    post,
    path = "/api/communities/{id}/join",
    tag = "Communities",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Community ID")),
    responses(
        (status = 201, description = "Joined", body = Membership),
        (status = 403, description = "Banned from this community"),
        (status = 404, description = "Community not found"),
        (status = 409, description = "Already a member")
    )
)]
pub async fn join_community(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Created<Membership>> {
    let membership = state
        .community_service
        .join(current_user.actor(), id)
        .await?;
    Ok(Created(membership))
}

#[utoipa::path(
    post,
    path = "/api/communities/{id}/leave",
    tag = "Communities",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Community ID")),
    responses(
        (status = 200, description = "Left", body = MessageResponse),
        (status = 403, description = "Not a member, or banned"),
        (status = 409, description = "The last admin cannot leave")
    )
)]
pub async fn leave_community(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<MessageResponse>> {
    state
        .community_service
        .leave(current_user.actor(), id)
        .await?;
    Ok(Json(MessageResponse::new("Left community")))
}

#[utoipa::path(
    get,
    path = "/api/communities/{id}/members",
    tag = "Communities",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Community ID")),
    responses(
        (status = 200, description = "Members", body = Vec<Member>),
        (status = 404, description = "Community not found")
    )
)]
pub async fn list_members(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Vec<Member>>> {
    let members = state.community_service.members(id).await?;
    Ok(Json(members))
}

/// Change a member's role (community admins)
#[utoipa::path(
    put,
    path = "/api/communities/{id}/members/{user_id}/role",
    tag = "Communities",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "Community ID"),
        ("user_id" = Uuid, Path, description = "Member's user ID")
    ),
    request_body = SetRoleRequest,
    responses(
        (status = 200, description = "Role changed", body = Membership),
        (status = 400, description = "Roles cannot be set to banned here"),
        (status = 403, description = "Not a community admin"),
        (status = 404, description = "Member not found"),
        (status = 409, description = "Would leave the community without an admin")
    )
)]
pub async fn set_member_role(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
    Path((id, user_id)): Path<(Uuid, Uuid)>,
    ValidatedJson(payload): ValidatedJson<SetRoleRequest>,
) -> AppResult<Json<Membership>> {
    let membership = state
        .community_service
        .set_role(current_user.actor(), id, user_id, payload.role)
        .await?;
    Ok(Json(membership))
}
