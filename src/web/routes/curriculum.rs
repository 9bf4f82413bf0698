use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::put,
};
use serde_json::json;
use uuid::Uuid;

use crate::{
    curriculum::{CurriculumPayload, CurriculumTree, sync_curriculum},
    model::{
        CrudRepository, ResourceTyped,
        entity::Course,
    },
    web::{
        AppState, RequestContext, WebError, WebResult,
        dto::curriculum::CurriculumResponse,
        error::ErrorResponse,
        middlewares,
    },
};

pub fn routes<S>(state: AppState) -> Router<S> {
    Router::new()
        .route(
            "/{id}/curriculum",
            put(curriculum_sync_handler).get(curriculum_get_handler),
        )
        .layer(middleware::from_fn_with_state(
            state.clone(),
            middlewares::extract_context_fn,
        ))
        .with_state(state)
}

#[utoipa::path(
    put,
    path = "/api/v1/courses/{course_id}/curriculum",
    request_body = CurriculumPayload,
    description = "Reconciles the submitted curriculum tree against persisted state. \
                   All-or-nothing: creates, updates and archives happen in one transaction.",
    params(
        ("course_id" = Uuid, Path, description = "ID of the course to sync")
    ),
    responses(
        (status = 200, description = "Curriculum synced"),
        (status = 400, description = "Ordering or content invariant violated", body = ErrorResponse),
        (status = 403, description = "Not the owner, or course not editable", body = ErrorResponse),
        (status = 404, description = "Course or referenced node not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    security(
        ("cookie" = [])
    ),
    tag = "curriculum"
)]
pub async fn curriculum_sync_handler(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(course_id): Path<Uuid>,
    Json(payload): Json<CurriculumPayload>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;

    sync_curriculum(state.pool(), user, course_id, payload, state.assets()).await?;

    Ok((
        StatusCode::OK,
        Json(json!({ "message": "Curriculum updated successfully." })),
    ))
}

#[utoipa::path(
    get,
    path = "/api/v1/courses/{course_id}/curriculum",
    description = "Returns the full active curriculum tree of a course",
    params(
        ("course_id" = Uuid, Path, description = "ID of the course")
    ),
    responses(
        (status = 200, description = "Curriculum tree", body = CurriculumResponse),
        (status = 404, description = "Course not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    security(
        ("cookie" = [])
    ),
    tag = "curriculum"
)]
pub async fn curriculum_get_handler(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(course_id): Path<Uuid>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;

    let found = Course::find_by_id(state.pool(), user, course_id)
        .await
        .map_err(|e| WebError::resource_fetch_error(Course::get_resource_type(), e))?;
    if found.is_none() {
        return Err(WebError::resource_not_found(Course::get_resource_type()));
    }

    let mut conn = state
        .pool()
        .acquire()
        .await
        .map_err(|e| WebError::resource_fetch_error(Course::get_resource_type(), e))?;
    let tree = CurriculumTree::load(&mut conn, course_id).await?;

    let response = CurriculumResponse::from_tree(tree)
        .map_err(|e| WebError::resource_fetch_error(Course::get_resource_type(), e))?;

    Ok((StatusCode::OK, Json(response)))
}
