//! Report and moderation handlers.

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
    ModerationAction, NewReport, Report, ReportOutcome, ReportStatus, ReportTarget,
};
use crate::errors::AppResult;
use crate::types::{Created, Paginated, PaginatedReports, PaginationParams};

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct SubmitReportRequest {
    pub community_id: Uuid,
    pub target_type: ReportTarget,
    pub target_id: Uuid,
    #[validate(length(min = 1, max = 200, message = "Reason is required"))]
    #[schema(example = "spam")]
    pub reason: String,
    #[validate(length(max = 2000, message = "Details are too long"))]
    pub details: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ReportActionRequest {
    pub action: ModerationAction,
    #[validate(length(max = 2000, message = "Note is too long"))]
    pub note: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ReportActionResponse {
    /// Every open report on the target, now closed
    pub resolved: Vec<Report>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ReportQuery {
    /// Required unless the caller is a platform admin or moderates communities
    pub community_id: Option<Uuid>,
    pub status: Option<ReportStatus>,
}

/// Create report routes
pub fn report_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_reports).post(submit_report))
        .route("/:id/action", post(act_on_report))
}

/// Report a post, event or member
#[utoipa::path(
    post,
    path = "/api/reports",
    tag = "Reports",
    security(("bearer_auth" = [])),
    request_body = SubmitReportRequest,
    responses(
        (status = 201, description = "Report filed; `flagged` when the target reached the review threshold", body = ReportOutcome),
        (status = 400, description = "Validation error or reporting yourself"),
        (status = 403, description = "Not a member, or banned"),
        (status = 404, description = "Reported content not found"),
        (status = 409, description = "Already reported by the caller")
    )
)]
pub async fn submit_report(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<SubmitReportRequest>,
) -> AppResult<Created<ReportOutcome>> {
    let report = NewReport {
        community_id: payload.community_id,
        reporter_id: current_user.id,
        target_type: payload.target_type,
        target_id: payload.target_id,
        reason: payload.reason,
        details: payload.details,
    };
    let outcome = state
        .report_service
        .submit(current_user.actor(), report)
        .await?;
    Ok(Created(outcome))
}

/// Moderation queue
#[utoipa::path(
    get,
    path = "/api/reports",
    tag = "Reports",
    security(("bearer_auth" = [])),
    params(ReportQuery, PaginationParams),
    responses(
        (status = 200, description = "Reports, newest first", body = PaginatedReports),
        (status = 403, description = "Not a moderator")
    )
)]
pub async fn list_reports(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
    Query(query): Query<ReportQuery>,
    Query(params): Query<PaginationParams>,
) -> AppResult<Json<Paginated<Report>>> {
    let page = state
        .report_service
        .list(current_user.actor(), query.community_id, query.status, params)
        .await?;
    Ok(Json(page))
}

/// Ban, delete or dismiss
#[utoipa::path(
    post,
    path = "/api/reports/{id}/action",
    tag = "Reports",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Report ID")),
    request_body = ReportActionRequest,
    responses(
        (status = 200, description = "Reports resolved", body = ReportActionResponse),
        (status = 403, description = "Not a moderator of the community"),
        (status = 404, description = "Report not found"),
        (status = 409, description = "Report already closed")
    )
)]
pub async fn act_on_report(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ValidatedJson(payload): ValidatedJson<ReportActionRequest>,
) -> AppResult<Json<ReportActionResponse>> {
    let resolved = state
        .report_service
        .act(current_user.actor(), id, payload.action, payload.note)
        .await?;
    Ok(Json(ReportActionResponse { resolved }))
}
