//! Integration tests for the HTTP surface that need no database or Redis:
//! error bodies, token round trips, request validation and the API document.

use std::sync::Arc;

use axum::body::to_bytes;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use chrono::Utc;
use sea_orm::DatabaseConnection;
use serde_json::{json, Value};
use tokio_test::{assert_err, assert_ok};
use uuid::Uuid;
use validator::Validate;

use community_hub::api::handlers::{
    ai_handler::{ChatRequest, RecommendationRequest},
    auth_handler::{LoginRequest, RegisterRequest},
    badge_handler::CreateBadgeRequest,
    community_handler::{CreateCommunityRequest, SetRoleRequest},
    event_handler::{CreateEventRequest, RsvpRequest},
    post_handler::CreatePostRequest,
    report_handler::{ReportActionRequest, SubmitReportRequest},
};
use community_hub::api::ApiDoc;
use community_hub::config::Config;
use community_hub::domain::{MemberRole, ModerationAction, ReportTarget, RsvpStatus, User, UserRole};
use community_hub::errors::AppError;
use community_hub::infra::Persistence;
use community_hub::services::{generate_token, AuthService, Authenticator};
use community_hub::types::{Created, MessageResponse};

const TEST_SECRET: &str = "test-secret-key-for-testing-only-32chars";

fn user(role: UserRole) -> User {
    User {
        id: Uuid::new_v4(),
        email: "ada@example.com".to_string(),
        password_hash: "hashed".to_string(),
        name: "Ada".to_string(),
        bio: None,
        interests: vec!["rust".to_string()],
        role,
        created_at: Utc::now(),
        updated_at: Utc::now(),
        deleted_at: None,
    }
}

/// Token verification never touches the database
fn authenticator(secret: &str) -> Authenticator<Persistence> {
    Authenticator::new(
        Arc::new(Persistence::new(DatabaseConnection::Disconnected)),
        Config::with_secret(secret),
    )
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

// =============================================================================
// Error responses
// =============================================================================

#[tokio::test]
async fn test_conflict_body_keeps_message() {
    let response = AppError::conflict("Already a member of this community").into_response();
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let body = body_json(response).await;
    assert_eq!(body["code"], "CONFLICT");
    assert_eq!(body["error"], "Already a member of this community");
}

#[tokio::test]
async fn test_missing_entity_is_named() {
    let response = AppError::Missing("Event".into()).into_response();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await["error"], "Event not found");
}

#[tokio::test]
async fn test_internal_details_are_hidden() {
    let response = AppError::internal("connection string postgres://secret").into_response();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let body = body_json(response).await;
    assert_eq!(body["code"], "INTERNAL_ERROR");
    assert!(!body["error"].as_str().unwrap().contains("secret"));
}

#[tokio::test]
async fn test_ai_errors_are_generic_500s() {
    let response = AppError::ai("provider returned 529 overloaded").into_response();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body_json(response).await["error"], "The AI service is unavailable");
}

#[test]
fn test_status_codes() {
    assert_eq!(AppError::Unauthorized.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(AppError::InvalidCredentials.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(AppError::forbidden("banned").status(), StatusCode::FORBIDDEN);
    assert_eq!(AppError::validation("x").status(), StatusCode::BAD_REQUEST);
    assert_eq!(AppError::conflict("x").status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_created_and_message_responses() {
    let response = Created(MessageResponse::new("Joined")).into_response();
    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(body_json(response).await["message"], "Joined");
}

// =============================================================================
// JWT round trip
// =============================================================================

#[test]
fn test_token_round_trip_keeps_identity_and_role() {
    let admin = user(UserRole::Admin);
    let token = generate_token(&admin, &Config::with_secret(TEST_SECRET)).unwrap();
    assert_eq!(token.token_type, "Bearer");

    let claims = assert_ok!(authenticator(TEST_SECRET).verify_token(&token.access_token));
    assert_eq!(claims.sub, admin.id);
    assert_eq!(claims.email, admin.email);
    assert_eq!(UserRole::from(claims.role.as_str()), UserRole::Admin);
    assert!(claims.exp > claims.iat);
}

#[test]
fn test_token_signed_with_another_secret_is_rejected() {
    let token = generate_token(
        &user(UserRole::User),
        &Config::with_secret("another-secret-that-is-also-32-chars!"),
    )
    .unwrap();

    assert_err!(authenticator(TEST_SECRET).verify_token(&token.access_token));
}

#[test]
fn test_garbage_token_is_rejected() {
    let result = authenticator(TEST_SECRET).verify_token("not-a-jwt");
    assert_eq!(result.unwrap_err().status(), StatusCode::UNAUTHORIZED);
}

// =============================================================================
// Request validation
// =============================================================================

#[test]
fn test_register_request_validation() {
    let valid: RegisterRequest = serde_json::from_value(json!({
        "email": "ada@example.com",
        "password": "SecurePass123!",
        "name": "Ada"
    }))
    .unwrap();
    assert!(valid.validate().is_ok());

    let short: RegisterRequest = serde_json::from_value(json!({
        "email": "not-an-email",
        "password": "short",
        "name": ""
    }))
    .unwrap();
    let errors = short.validate().unwrap_err();
    let fields = errors.field_errors();
    assert!(fields.contains_key("email"));
    assert!(fields.contains_key("password"));
    assert!(fields.contains_key("name"));
}

#[test]
fn test_login_requires_password() {
    let login: LoginRequest = serde_json::from_value(json!({
        "email": "ada@example.com",
        "password": ""
    }))
    .unwrap();
    assert!(login.validate().is_err());
}

#[test]
fn test_post_content_bounds() {
    let empty = CreatePostRequest {
        content: String::new(),
    };
    assert!(empty.validate().is_err());

    let long = CreatePostRequest {
        content: "x".repeat(5001),
    };
    assert!(long.validate().is_err());

    let ok = CreatePostRequest {
        content: "Hello".into(),
    };
    assert!(ok.validate().is_ok());
}

#[test]
fn test_community_request_requires_category() {
    let request: CreateCommunityRequest = serde_json::from_value(json!({
        "name": "Rustaceans",
        "category": ""
    }))
    .unwrap();
    assert!(request.description.is_empty());
    assert!(request.validate().is_err());
}

#[test]
fn test_event_capacity_must_be_positive() {
    let request: CreateEventRequest = serde_json::from_value(json!({
        "title": "Meetup",
        "starts_at": "2030-01-01T18:00:00Z",
        "capacity": 0
    }))
    .unwrap();
    assert!(request.validate().is_err());
    assert!(request.ends_at.is_none());
}

#[test]
fn test_badge_price_cannot_be_negative() {
    let request: CreateBadgeRequest = serde_json::from_value(json!({
        "name": "Trailblazer",
        "price": -1
    }))
    .unwrap();
    assert!(request.validate().is_err());
}

#[test]
fn test_recommendation_limit_range() {
    let request: RecommendationRequest = serde_json::from_value(json!({ "limit": 50 })).unwrap();
    assert!(request.validate().is_err());

    let defaults: RecommendationRequest = serde_json::from_value(json!({})).unwrap();
    assert!(defaults.validate().is_ok());
    assert!(defaults.limit.is_none());
}

#[test]
fn test_chat_history_defaults_to_empty() {
    let request: ChatRequest =
        serde_json::from_value(json!({ "message": "Any hiking groups?" })).unwrap();
    assert!(request.history.is_empty());
    assert!(request.validate().is_ok());
}

#[test]
fn test_enums_use_wire_names() {
    let report: SubmitReportRequest = serde_json::from_value(json!({
        "community_id": Uuid::new_v4(),
        "target_type": "post",
        "target_id": Uuid::new_v4(),
        "reason": "spam"
    }))
    .unwrap();
    assert_eq!(report.target_type, ReportTarget::Post);

    let action: ReportActionRequest =
        serde_json::from_value(json!({ "action": "dismiss" })).unwrap();
    assert_eq!(action.action, ModerationAction::Dismiss);

    let rsvp: RsvpRequest = serde_json::from_value(json!({ "status": "going" })).unwrap();
    assert_eq!(rsvp.status, RsvpStatus::Going);

    let role: SetRoleRequest = serde_json::from_value(json!({ "role": "moderator" })).unwrap();
    assert_eq!(role.role, MemberRole::Moderator);

    assert!(serde_json::from_value::<RsvpRequest>(json!({ "status": "maybe" })).is_err());
}

// =============================================================================
// API document
// =============================================================================

#[test]
fn test_openapi_document_serializes() {
    use utoipa::OpenApi;

    let doc = serde_json::to_value(ApiDoc::openapi()).unwrap();
    assert!(doc["paths"]["/api/reports"]["post"].is_object());
    assert!(doc["paths"]["/api/reports"]["get"].is_object());
    assert!(doc["components"]["schemas"]["PaginatedReports"].is_object());
}
