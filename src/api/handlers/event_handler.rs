//! Event and RSVP handlers.

use axum::{
    extract::{Extension, Path, State},
    response::Json,
    routing::get,
    Router,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::api::extractors::ValidatedJson;
use crate::api::middleware::CurrentUser;
use crate::api::AppState;
use crate::domain::{Event, NewEvent, RsvpState, RsvpStatus};
use crate::errors::AppResult;
use crate::types::{Created, NoContent};

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateEventRequest {
    #[validate(length(min = 1, max = 200, message = "Title is required"))]
    #[schema(example = "Rust meetup #12")]
    pub title: String,
    #[serde(default)]
    #[validate(length(max = 5000, message = "Description is too long"))]
    pub description: String,
    #[schema(example = "c-base, Berlin")]
    pub location: Option<String>,
    pub starts_at: DateTime<Utc>,
    /// Must be after `starts_at`
    pub ends_at: Option<DateTime<Utc>>,
    /// Maximum number of `going` RSVPs
    #[validate(range(min = 1, message = "Capacity must be positive"))]
    #[schema(example = 40)]
    pub capacity: Option<i32>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct RsvpRequest {
    pub status: RsvpStatus,
}

/// Create event routes
pub fn event_routes() -> Router<AppState> {
    Router::new()
        .route("/upcoming", get(upcoming_events))
        .route("/:id", get(get_event))
        .route(
            "/:id/rsvp",
            get(get_rsvp).post(rsvp).delete(cancel_rsvp),
        )
}

#[utoipa::path(
    get,
    path = "/api/communities/{id}/events",
    tag = "Events",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Community ID")),
    responses(
        (status = 200, description = "Events by start time", body = Vec<Event>),
        (status = 404, description = "Community not found")
    )
)]
pub async fn list_community_events(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Vec<Event>>> {
    let events = state.event_service.list(id).await?;
    Ok(Json(events))
}

/// Schedule an event (community moderators); members are notified
#[utoipa::path(
    post,
    path = "/api/communities/{id}/events",
    tag = "Events",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Community ID")),
    request_body = CreateEventRequest,
    responses(
        (status = 201, description = "Event created", body = Event),
        (status = 400, description = "Validation error"),
        (status = 403, description = "Not a community moderator"),
        (status = 404, description = "Community not found")
    )
)]
pub async fn create_event(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ValidatedJson(payload): ValidatedJson<CreateEventRequest>,
) -> AppResult<Created<Event>> {
    let new = NewEvent {
        title: payload.title,
        description: payload.description,
        location: payload.location,
        starts_at: payload.starts_at,
        ends_at: payload.ends_at,
        capacity: payload.capacity,
    };
    let event = state
        .event_service
        .create(current_user.actor(), id, new)
        .await?;
    Ok(Created(event))
}

/// Upcoming events across the caller's communities
#[utoipa::path(
    get,
    path = "/api/events/upcoming",
    tag = "Events",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Upcoming events", body = Vec<Event>),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn upcoming_events(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
) -> AppResult<Json<Vec<Event>>> {
    let events = state.event_service.upcoming(current_user.actor()).await?;
    Ok(Json(events))
}

#[utoipa::path(
    get,
    path = "/api/events/{id}",
    tag = "Events",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Event ID")),
    responses(
        (status = 200, description = "Event", body = Event),
        (status = 404, description = "Event not found")
    )
)]
pub async fn get_event(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Event>> {
    let event = state.event_service.get(id).await?;
    Ok(Json(event))
}

/// The caller's RSVP plus attendance counts
#[utoipa::path(
    get,
    path = "/api/events/{id}/rsvp",
    tag = "Events",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Event ID")),
    responses(
        (status = 200, description = "RSVP state", body = RsvpState),
        (status = 404, description = "Event not found")
    )
)]
pub async fn get_rsvp(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<RsvpState>> {
    let rsvp = state
        .event_service
        .rsvp_state(current_user.actor(), id)
        .await?;
    Ok(Json(rsvp))
}

/// RSVP as going or interested
#[utoipa::path(
    post,
    path = "/api/events/{id}/rsvp",
    tag = "Events",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Event ID")),
    request_body = RsvpRequest,
    responses(
        (status = 200, description = "RSVP recorded", body = RsvpState),
        (status = 403, description = "Not a member of the event's community"),
        (status = 404, description = "Event not found"),
        (status = 409, description = "Event is full")
    )
)]
pub async fn rsvp(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ValidatedJson(payload): ValidatedJson<RsvpRequest>,
) -> AppResult<Json<RsvpState>> {
    let rsvp = state
        .event_service
        .rsvp(current_user.actor(), id, payload.status)
        .await?;
    Ok(Json(rsvp))
}

#[utoipa::path(
    delete,
    path = "/api/events/{id}/rsvp",
    tag = "Events",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Event ID")),
    responses(
        (status = 204, description = "RSVP cancelled"),
        (status = 404, description = "No RSVP for this event")
    )
)]
pub async fn cancel_rsvp(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<NoContent> {
    state
        .event_service
        .cancel_rsvp(current_user.actor(), id)
        .await?;
    Ok(NoContent)
}
