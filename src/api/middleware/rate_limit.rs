//! Rate limiting middleware using Redis cache.
//!
//! Three fixed-window tiers: general API traffic, the auth endpoints and
//! the AI endpoints, each counted per client address.

use axum::{
    extract::{ConnectInfo, Request, State},
    http::{HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::net::SocketAddr;

use crate::api::AppState;
use crate::config::{
    RATE_LIMIT_AI_REQUESTS, RATE_LIMIT_AI_WINDOW_SECONDS, RATE_LIMIT_AUTH_REQUESTS,
    RATE_LIMIT_AUTH_WINDOW_SECONDS, RATE_LIMIT_REQUESTS, RATE_LIMIT_WINDOW_SECONDS,
};

/// A rate limit bucket
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateTier {
    General,
    Auth,
    Ai,
}

impl RateTier {
    fn prefix(self) -> &'static str {
        match self {
            RateTier::General => "general",
            RateTier::Auth => "auth",
            RateTier::Ai => "ai",
        }
    }

    fn max_requests(self) -> u64 {
        match self {
            RateTier::General => RATE_LIMIT_REQUESTS,
            RateTier::Auth => RATE_LIMIT_AUTH_REQUESTS,
            RateTier::Ai => RATE_LIMIT_AI_REQUESTS,
        }
    }

    fn window_seconds(self) -> u64 {
        match self {
            RateTier::General => RATE_LIMIT_WINDOW_SECONDS,
            RateTier::Auth => RATE_LIMIT_AUTH_WINDOW_SECONDS,
            RateTier::Ai => RATE_LIMIT_AI_WINDOW_SECONDS,
        }
    }

    fn key(self, client_id: &str) -> String {
        format!("{}:{}", self.prefix(), client_id)
    }
}

/// Rate limit error response
#[derive(Debug)]
pub struct RateLimitError {
    pub retry_after: u64,
}

#[derive(Serialize)]
struct RateLimitBody {
    error: &'static str,
    code: &'static str,
}

impl IntoResponse for RateLimitError {
    fn into_response(self) -> Response {
        let mut response = (
            StatusCode::TOO_MANY_REQUESTS,
            Json(RateLimitBody {
                error: "Too many requests. Please try again later.",
                code: "RATE_LIMITED",
            }),
        )
            .into_response();

        let headers = response.headers_mut();
        headers.insert("Retry-After", HeaderValue::from(self.retry_after));
        headers.insert("X-RateLimit-Remaining", HeaderValue::from_static("0"));
        response
    }
}

/// Extract client identifier for rate limiting.
/// Uses X-Forwarded-For header if behind proxy, otherwise uses connection IP.
fn get_client_identifier(request: &Request) -> String {
    // First hop of X-Forwarded-For is the original client
    if let Some(ip) = request
        .headers()
        .get("X-Forwarded-For")
        .and_then(|h| h.to_str().ok())
        .and_then(|forwarded| forwarded.split(',').next())
        .map(str::trim)
        .filter(|ip| !ip.is_empty())
    {
        return ip.to_string();
    }

    if let Some(real_ip) = request
        .headers()
        .get("X-Real-IP")
        .and_then(|h| h.to_str().ok())
    {
        return real_ip.trim().to_string();
    }

    if let Some(connect_info) = request.extensions().get::<ConnectInfo<SocketAddr>>() {
        return connect_info.0.ip().to_string();
    }

    "unknown".to_string()
}

async fn enforce(
    tier: RateTier,
    state: AppState,
    request: Request,
    next: Next,
) -> Result<Response, RateLimitError> {
    let client_id = get_client_identifier(&request);
    let limit = tier.max_requests();
    let window = tier.window_seconds();

    let (count, allowed) = match state
        .cache
        .check_rate_limit(&tier.key(&client_id), limit, window)
        .await
    {
        Ok(result) => result,
        Err(e) => {
            // Fail closed: an unreachable Redis must not lift the limit
            tracing::error!(tier = tier.prefix(), error = %e, "Rate limit check failed - denying request");
            return Err(RateLimitError {
                retry_after: window,
            });
        }
    };

    if !allowed {
        tracing::warn!(
            tier = tier.prefix(),
            client = %client_id,
            count = count,
            "Rate limit exceeded"
        );
        return Err(RateLimitError {
            retry_after: window,
        });
    }

    let mut response = next.run(request).await;

    let headers = response.headers_mut();
    headers.insert("X-RateLimit-Limit", HeaderValue::from(limit));
    headers.insert(
        "X-RateLimit-Remaining",
        HeaderValue::from(limit.saturating_sub(count)),
    );

    Ok(response)
}

/// General rate limiting middleware.
pub async fn rate_limit_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, RateLimitError> {
    enforce(RateTier::General, state, request, next).await
}

/// Stricter rate limiting for authentication endpoints.
pub async fn rate_limit_auth_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, RateLimitError> {
    enforce(RateTier::Auth, state, request, next).await
}

/// Rate limiting for the AI endpoints, which call a paid provider.
pub async fn rate_limit_ai_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, RateLimitError> {
    enforce(RateTier::Ai, state, request, next).await
}
