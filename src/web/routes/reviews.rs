use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{get, patch, post},
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    approval,
    model::entity::{CourseApprovalRequest, ReviewDecision},
    web::{AppState, RequestContext, WebResult, error::ErrorResponse, middlewares},
};

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct SubmitBody {
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReviewBody {
    pub decision: ReviewDecision,
    pub admin_notes: Option<String>,
}

pub fn routes<S>(state: AppState) -> Router<S> {
    Router::new()
        .route("/{id}/submit", post(course_submit_handler))
        .route("/{id}/reviews", get(course_reviews_handler))
        .route("/reviews/{request_id}", patch(review_decide_handler))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            middlewares::extract_context_fn,
        ))
        .with_state(state)
}

#[utoipa::path(
    post,
    path = "/api/v1/courses/{course_id}/submit",
    request_body = SubmitBody,
    description = "Submits a draft or rejected course for admin review",
    params(
        ("course_id" = Uuid, Path, description = "ID of the course to submit")
    ),
    responses(
        (status = 200, description = "Approval request created", body = CourseApprovalRequest),
        (status = 400, description = "Precondition failed (wrong status, empty curriculum, already pending)", body = ErrorResponse),
        (status = 403, description = "Not the owner", body = ErrorResponse),
        (status = 404, description = "Course not found", body = ErrorResponse),
    ),
    security(
        ("cookie" = [])
    ),
    tag = "reviews"
)]
pub async fn course_submit_handler(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(course_id): Path<Uuid>,
    Json(payload): Json<SubmitBody>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;

    let request =
        approval::submit_course(state.pool(), user, course_id, payload.notes.as_deref()).await?;

    Ok((StatusCode::OK, Json(request)))
}

#[utoipa::path(
    get,
    path = "/api/v1/courses/{course_id}/reviews",
    description = "Approval history of a course, newest first",
    params(
        ("course_id" = Uuid, Path, description = "ID of the course")
    ),
    responses(
        (status = 200, description = "Approval requests", body = Vec<CourseApprovalRequest>),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    security(
        ("cookie" = [])
    ),
    tag = "reviews"
)]
pub async fn course_reviews_handler(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(course_id): Path<Uuid>,
) -> WebResult<impl IntoResponse> {
    let _user = ctx.user()?;

    let requests = CourseApprovalRequest::all_by_course(state.pool(), course_id)
        .await
        .map_err(|e| {
            crate::web::WebError::resource_fetch_error(
                crate::model::ResourceType::ApprovalRequest,
                e,
            )
        })?;

    Ok((StatusCode::OK, Json(requests)))
}

#[utoipa::path(
    patch,
    path = "/api/v1/courses/reviews/{request_id}",
    request_body = ReviewBody,
    description = "Admin decides a pending approval request",
    params(
        ("request_id" = Uuid, Path, description = "ID of the approval request")
    ),
    responses(
        (status = 200, description = "Request decided", body = CourseApprovalRequest),
        (status = 400, description = "Request already decided", body = ErrorResponse),
        (status = 403, description = "Admin only", body = ErrorResponse),
        (status = 404, description = "Request not found", body = ErrorResponse),
    ),
    security(
        ("cookie" = [])
    ),
    tag = "reviews"
)]
pub async fn review_decide_handler(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(request_id): Path<Uuid>,
    Json(payload): Json<ReviewBody>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;

    let updated = approval::review_request(
        state.pool(),
        user,
        request_id,
        payload.decision,
        payload.admin_notes.as_deref(),
    )
    .await?;

    Ok((StatusCode::OK, Json(updated)))
}
