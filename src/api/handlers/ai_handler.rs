//! Assistant handlers: chat, community recommendations and moderation.

use axum::{extract::Extension, extract::State, response::Json, routing::post, Router};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::api::extractors::ValidatedJson;
use crate::api::middleware::CurrentUser;
use crate::api::AppState;
use crate::config::DEFAULT_RECOMMENDATION_LIMIT;
use crate::domain::{ChatMessage, ModerationVerdict, Recommendation};
use crate::errors::AppResult;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ChatRequest {
    #[validate(length(min = 1, max = 4000, message = "Message must be 1-4000 characters"))]
    #[schema(example = "Which communities are good for learning Rust?")]
    pub message: String,
    /// Earlier turns of the conversation, oldest first
    #[serde(default)]
    pub history: Vec<ChatMessage>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ChatResponse {
    pub reply: String,
}

#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct RecommendationRequest {
    /// Free-text hint combined with the caller's interests
    #[validate(length(max = 500, message = "Query is too long"))]
    #[schema(example = "weekend hiking")]
    pub query: Option<String>,
    #[validate(range(min = 1, max = 20, message = "Limit must be between 1 and 20"))]
    #[schema(example = 5)]
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RecommendationResponse {
    pub recommendations: Vec<Recommendation>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ModerateRequest {
    #[validate(length(min = 1, max = 5000, message = "Content must be 1-5000 characters"))]
    pub content: String,
}

/// Create AI routes
pub fn ai_routes() -> Router<AppState> {
    Router::new()
        .route("/chatbot/message", post(chat))
        .route("/chatbot/recommendations", post(recommend))
        .route("/moderate", post(moderate))
}

/// Talk to the community assistant
#[utoipa::path(
    post,
    path = "/api/ai/chatbot/message",
    tag = "AI",
    security(("bearer_auth" = [])),
    request_body = ChatRequest,
    responses(
        (status = 200, description = "Assistant reply", body = ChatResponse),
        (status = 400, description = "Validation error"),
        (status = 429, description = "Too many requests"),
        (status = 500, description = "AI service unavailable")
    )
)]
pub async fn chat(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<ChatRequest>,
) -> AppResult<Json<ChatResponse>> {
    let reply = state
        .assistant_service
        .chat(current_user.actor(), payload.message, payload.history)
        .await?;
    Ok(Json(ChatResponse { reply }))
}

/// Communities the caller has not joined, ranked for them
#[utoipa::path(
    post,
    path = "/api/ai/chatbot/recommendations",
    tag = "AI",
    security(("bearer_auth" = [])),
    request_body = RecommendationRequest,
    responses(
        (status = 200, description = "Recommendations", body = RecommendationResponse),
        (status = 400, description = "Validation error"),
        (status = 429, description = "Too many requests")
    )
)]
pub async fn recommend(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<RecommendationRequest>,
) -> AppResult<Json<RecommendationResponse>> {
    let limit = payload.limit.unwrap_or(DEFAULT_RECOMMENDATION_LIMIT);
    let recommendations = state
        .assistant_service
        .recommend(current_user.actor(), payload.query, limit)
        .await?;
    Ok(Json(RecommendationResponse { recommendations }))
}

/// Classify a piece of text
#[utoipa::path(
    post,
    path = "/api/ai/moderate",
    tag = "AI",
    security(("bearer_auth" = [])),
    request_body = ModerateRequest,
    responses(
        (status = 200, description = "Moderation verdict", body = ModerationVerdict),
        (status = 400, description = "Validation error"),
        (status = 429, description = "Too many requests"),
        (status = 500, description = "AI service unavailable")
    )
)]
pub async fn moderate(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<ModerateRequest>,
) -> AppResult<Json<ModerationVerdict>> {
    let verdict = state.assistant_service.moderate(payload.content).await?;
    Ok(Json(verdict))
}
