//! Badge handlers. The catalog is cached in Redis.

use axum::{
    extract::{Extension, Path, State},
    response::Json,
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::api::extractors::ValidatedJson;
use crate::api::middleware::CurrentUser;
use crate::api::AppState;
use crate::config::{BADGE_CATALOG_TTL_SECONDS, CACHE_KEY_BADGE_CATALOG};
use crate::domain::{Badge, NewBadge, OwnedBadge};
use crate::errors::AppResult;
use crate::types::Created;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateBadgeRequest {
    #[validate(length(min = 1, max = 100, message = "Name is required"))]
    #[schema(example = "Trailblazer")]
    pub name: String,
    #[serde(default)]
    #[validate(length(max = 500, message = "Description is too long"))]
    pub description: String,
    /// Icon URL or emoji
    pub icon: Option<String>,
    /// Price in points
    #[validate(range(min = 0, message = "Price cannot be negative"))]
    #[schema(example = 200)]
    pub price: i64,
}

/// Create badge routes
pub fn badge_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_badges).post(create_badge))
        .route("/:id", get(get_badge))
        .route("/:id/purchase", post(purchase_badge))
}

/// Drop the cached catalog; the next read repopulates it.
async fn invalidate_catalog(state: &AppState) {
    if let Err(e) = state.cache.delete(CACHE_KEY_BADGE_CATALOG).await {
        tracing::warn!(error = %e, "Failed to invalidate badge catalog cache");
    }
}

/// Badge catalog, cheapest first
#[utoipa::path(
    get,
    path = "/api/badges",
    tag = "Badges",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Badge catalog", body = Vec<Badge>),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn list_badges(State(state): State<AppState>) -> AppResult<Json<Vec<Badge>>> {
    // Cache errors degrade to a database read
    match state.cache.get::<Vec<Badge>>(CACHE_KEY_BADGE_CATALOG).await {
        Ok(Some(badges)) => return Ok(Json(badges)),
        Ok(None) => {}
        Err(e) => tracing::warn!(error = %e, "Badge catalog cache read failed"),
    }

    let badges = state.badge_service.catalog().await?;

    if let Err(e) = state
        .cache
        .set_with_ttl(CACHE_KEY_BADGE_CATALOG, &badges, BADGE_CATALOG_TTL_SECONDS)
        .await
    {
        tracing::warn!(error = %e, "Badge catalog cache write failed");
    }

    Ok(Json(badges))
}

#[utoipa::path(
    get,
    path = "/api/badges/{id}",
    tag = "Badges",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Badge ID")),
    responses(
        (status = 200, description = "Badge", body = Badge),
        (status = 404, description = "Badge not found")
    )
)]
pub async fn get_badge(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Badge>> {
    let badge = state.badge_service.get(id).await?;
    Ok(Json(badge))
}

/// Add a badge to the catalog (platform admins)
#[utoipa::path(
    post,
    path = "/api/badges",
    tag = "Badges",
    security(("bearer_auth" = [])),
    request_body = CreateBadgeRequest,
    responses(
        (status = 201, description = "Badge created", body = Badge),
        (status = 400, description = "Validation error"),
        (status = 403, description = "Platform admins only"),
        (status = 409, description = "Name already taken")
    )
)]
pub async fn create_badge(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<CreateBadgeRequest>,
) -> AppResult<Created<Badge>> {
    let badge = state
        .badge_service
        .create(
            current_user.actor(),
            NewBadge {
                name: payload.name,
                description: payload.description,
                icon: payload.icon,
                price: payload.price,
            },
        )
        .await?;

    invalidate_catalog(&state).await;
    Ok(Created(badge))
}

/// Buy a badge with points from the caller's balance
#[utoipa::path(
    post,
    path = "/api/badges/{id}/purchase",
    tag = "Badges",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Badge ID")),
    responses(
        (status = 201, description = "Badge purchased", body = OwnedBadge),
        (status = 400, description = "Insufficient points"),
        (status = 404, description = "Badge not found"),
        (status = 409, description = "Badge already owned")
    )
)]
pub async fn purchase_badge(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Created<OwnedBadge>> {
    let owned = state
        .badge_service
        .purchase(current_user.actor(), id)
        .await?;
    Ok(Created(owned))
}
