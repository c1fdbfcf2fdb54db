//! OpenAPI documentation configuration.
//!
//! Provides Swagger UI for API exploration and testing.

use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::api::handlers::{
    ai_handler, auth_handler, badge_handler, community_handler, event_handler, post_handler,
    report_handler, user_handler,
};
use crate::domain::{
    Badge, ChatMessage, ChatRole, Community, CommunityDetail, Event, Member, MemberRole,
    Membership, ModerationAction, ModerationVerdict, Notification, NotificationKind, OwnedBadge,
    PointTransaction, PointsOverview, Post, Profile, Recommendation, Report, ReportOutcome,
    ReportStatus, ReportTarget, ReputationLevel, ReputationSummary, Rsvp, RsvpCounts, RsvpState,
    RsvpStatus, UserCommunity, UserResponse, UserRole,
};
use crate::services::TokenResponse;
use crate::types::{
    MessageResponse, PaginatedCommunities, PaginatedNotifications, PaginatedPosts,
    PaginatedReports, PaginationMeta,
};

/// OpenAPI documentation for the Community Hub API
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Community Hub",
        version = "0.1.0",
        description = "Communities, events, reputation points, badges and community moderation",
        license(name = "MIT", url = "https://opensource.org/licenses/MIT")
    ),
    servers(
        (url = "http://localhost:3000", description = "Local development server")
    ),
    paths(
        auth_handler::register,
        auth_handler::login,
        user_handler::get_profile,
        user_handler::update_profile,
        user_handler::delete_account,
        user_handler::get_points,
        user_handler::get_badges,
        user_handler::get_communities,
        user_handler::list_notifications,
        user_handler::mark_read,
        user_handler::mark_all_read,
        community_handler::list_communities,
        community_handler::create_community,
        community_handler::get_community,
        community_handler::update_community,
        community_handler::join_community,
        community_handler::leave_community,
        community_handler::list_members,
        community_handler::set_member_role,
        post_handler::list_posts,
        post_handler::create_post,
        post_handler::delete_post,
        event_handler::list_community_events,
        event_handler::create_event,
        event_handler::upcoming_events,
        event_handler::get_event,
        event_handler::get_rsvp,
        event_handler::rsvp,
        event_handler::cancel_rsvp,
        badge_handler::list_badges,
        badge_handler::get_badge,
        badge_handler::create_badge,
        badge_handler::purchase_badge,
        report_handler::submit_report,
        report_handler::list_reports,
        report_handler::act_on_report,
        ai_handler::chat,
        ai_handler::recommend,
        ai_handler::moderate,
    ),
    components(
        schemas(
            // Domain types
            UserRole,
            UserResponse,
            Profile,
            ReputationLevel,
            ReputationSummary,
            PointTransaction,
            PointsOverview,
            Community,
            CommunityDetail,
            MemberRole,
            Member,
            Membership,
            UserCommunity,
            Post,
            Event,
            Rsvp,
            RsvpStatus,
            RsvpCounts,
            RsvpState,
            Badge,
            OwnedBadge,
            Report,
            ReportTarget,
            ReportStatus,
            ReportOutcome,
            ModerationAction,
            Notification,
            NotificationKind,
            ChatRole,
            ChatMessage,
            ModerationVerdict,
            Recommendation,
            // Shared types
            MessageResponse,
            PaginationMeta,
            PaginatedCommunities,
            PaginatedNotifications,
            PaginatedPosts,
            PaginatedReports,
            TokenResponse,
            // Request and response bodies
            auth_handler::RegisterRequest,
            auth_handler::LoginRequest,
            user_handler::UpdateProfileRequest,
            user_handler::MarkAllReadResponse,
            community_handler::CreateCommunityRequest,
            community_handler::UpdateCommunityRequest,
            community_handler::SetRoleRequest,
            post_handler::CreatePostRequest,
            event_handler::CreateEventRequest,
            event_handler::RsvpRequest,
            badge_handler::CreateBadgeRequest,
            report_handler::SubmitReportRequest,
            report_handler::ReportActionRequest,
            report_handler::ReportActionResponse,
            ai_handler::ChatRequest,
            ai_handler::ChatResponse,
            ai_handler::RecommendationRequest,
            ai_handler::RecommendationResponse,
            ai_handler::ModerateRequest,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Authentication", description = "Registration and login"),
        (name = "User", description = "The caller's profile, points, badges and notifications"),
        (name = "Communities", description = "Communities and membership"),
        (name = "Posts", description = "Community posts"),
        (name = "Events", description = "Community events and RSVPs"),
        (name = "Badges", description = "Badge catalog and purchases"),
        (name = "Reports", description = "Reporting and moderation"),
        (name = "AI", description = "Assistant chat, recommendations and moderation")
    )
)]
pub struct ApiDoc;

/// Security scheme modifier for JWT Bearer authentication
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .description(Some("JWT token obtained from /api/auth/login"))
                        .build(),
                ),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_lists_every_route_group() {
        let doc = ApiDoc::openapi();
        for path in [
            "/api/auth/register",
            "/api/user/profile",
            "/api/communities/{id}/members/{user_id}/role",
            "/api/events/{id}/rsvp",
            "/api/badges/{id}/purchase",
            "/api/reports/{id}/action",
            "/api/ai/chatbot/recommendations",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing {path}");
        }
    }

    #[test]
    fn test_bearer_scheme_registered() {
        let doc = ApiDoc::openapi();
        let components = doc.components.expect("components");
        assert!(components.security_schemes.contains_key("bearer_auth"));
    }
}
