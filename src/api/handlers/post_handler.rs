//! Post handlers, mounted under `/api/communities/:id/posts`.

use axum::{
    extract::{Extension, Path, Query, State},
    response::Json,
};
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::api::extractors::ValidatedJson;
use crate::api::middleware::CurrentUser;
use crate::api::AppState;
use crate::domain::Post;
use crate::errors::AppResult;
use crate::types::{Created, NoContent, Paginated, PaginatedPosts, PaginationParams};

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreatePostRequest {
    #[validate(length(min = 1, max = 5000, message = "Content must be 1-5000 characters"))]
    #[schema(example = "Who's coming to the meetup on Thursday?")]
    pub content: String,
}

#[utoipa::path(
    get,
    path = "/api/communities/{id}/posts",
    tag = "Posts",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Community ID"), PaginationParams),
    responses(
        (status = 200, description = "Posts, newest first", body = PaginatedPosts),
        (status = 404, description = "Community not found")
    )
)]
pub async fn list_posts(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(params): Query<PaginationParams>,
) -> AppResult<Json<Paginated<Post>>> {
    let page = state.post_service.list(id, params).await?;
    Ok(Json(page))
}

/// Publish a post; content is screened by the moderation model first
#[utoipa::path(
    post,
    path = "/api/communities/{id}/posts",
    tag = "Posts",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Community ID")),
    request_body = CreatePostRequest,
    responses(
        (status = 201, description = "Post created", body = Post),
        (status = 400, description = "Validation error or rejected by moderation"),
        (status = 403, description = "Not a member, or banned"),
        (status = 404, description = "Community not found")
    )
)]
pub async fn create_post(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ValidatedJson(payload): ValidatedJson<CreatePostRequest>,
) -> AppResult<Created<Post>> {
    let post = state
        .post_service
        .create(current_user.actor(), id, payload.content)
        .await?;
    Ok(Created(post))
}

/// Delete a post (author or community moderator)
#[utoipa::path(
    delete,
    path = "/api/communities/{id}/posts/{post_id}",
    tag = "Posts",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "Community ID"),
        ("post_id" = Uuid, Path, description = "Post ID")
    ),
    responses(
        (status = 204, description = "Post deleted"),
        (status = 403, description = "Not the author or a moderator"),
        (status = 404, description = "Post not found")
    )
)]
pub async fn delete_post(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
    Path((id, post_id)): Path<(Uuid, Uuid)>,
) -> AppResult<NoContent> {
    state
        .post_service
        .delete(current_user.actor(), id, post_id)
        .await?;
    Ok(NoContent)
}
