use axum::{
    Json, Router,
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{get, post},
};
use serde_json::json;
use uuid::Uuid;

use crate::{
    approval,
    assets::AssetKind,
    model::{
        CrudRepository, ResourceTyped,
        entity::{
            Course, CourseCreateUpdate, Enrollment, Lesson, LessonContent, QuizQuestion,
            VideoSource,
        },
    },
    web::{
        AppState, RequestContext, WebError, WebResult, error::ErrorResponse, middlewares,
    },
};

pub fn routes<S>(state: AppState) -> Router<S> {
    Router::new()
        .route("/", post(course_create_handler))
        .route(
            "/{id}",
            get(course_get_handler)
                .put(course_update_handler)
                .delete(course_delete_handler),
        )
        .route("/{id}/enroll", post(course_enroll_handler))
        .route("/{id}/feature", post(course_feature_handler))
        .route("/{id}/archive", post(course_archive_handler))
        .route("/{id}/draft", post(course_draft_handler))
        .route("/{id}/thumbnail", post(course_thumbnail_handler))
        .route("/lessons/{id}/video", post(lesson_video_handler))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            middlewares::extract_context_fn,
        ))
        .with_state(state)
}

fn validate_pricing(payload: &CourseCreateUpdate) -> WebResult<()> {
    if let (Some(original), Some(discounted)) = (payload.price_original, payload.price_discounted)
    {
        if discounted > original {
            return Err(WebError::resource_bad_request(
                Course::get_resource_type(),
                "Discounted price cannot exceed the original price.",
            ));
        }
    }
    Ok(())
}

/// Shared gate for generic course mutations: the owning instructor while
/// the course is draft/rejected, or an admin.
fn check_mutable(course: &Course, actor: &crate::web::AuthenticatedUser) -> WebResult<()> {
    if actor.is_admin() {
        return Ok(());
    }
    if course.instructor_id() != actor.user_id() {
        return Err(WebError::resource_forbidden(Course::get_resource_type()));
    }
    if !course.status().is_editable() {
        return Err(WebError::resource_forbidden(Course::get_resource_type()));
    }
    Ok(())
}

#[utoipa::path(
    post,
    path = "/api/v1/courses/",
    request_body = CourseCreateUpdate,
    description = "Creates a draft course owned by the calling instructor",
    responses(
        (status = 200, description = "Course created", body = Course),
        (status = 400, description = "Invalid pricing", body = ErrorResponse),
        (status = 409, description = "Course name already taken", body = ErrorResponse),
        (status = 401, description = "You're not authorized to do this", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    security(
        ("cookie" = [])
    ),
    tag = "courses"
)]
pub async fn course_create_handler(
    State(state): State<AppState>,
    ctx: RequestContext,
    Json(payload): Json<CourseCreateUpdate>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    validate_pricing(&payload)?;

    let mut slugger = github_slugger::Slugger::default();
    let slug = slugger.slug(&payload.name);
    let conflict = Course::find_by_slug(state.pool(), user, &slug)
        .await
        .map_err(|e| WebError::resource_fetch_error(Course::get_resource_type(), e))?;
    if conflict.is_some() {
        return Err(WebError::slug_conflict());
    }

    let created = Course::create(state.pool(), user, payload)
        .await
        .map_err(|e| WebError::resource_fetch_error(Course::get_resource_type(), e))?;

    Ok((StatusCode::OK, Json(created)))
}

#[utoipa::path(
    get,
    path = "/api/v1/courses/{id}",
    params(
        ("id" = Uuid, Path, description = "ID of the course")
    ),
    responses(
        (status = 200, description = "Course found", body = Course),
        (status = 404, description = "Course not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "courses"
)]
pub async fn course_get_handler(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(id): Path<Uuid>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    let course = Course::find_by_id(state.pool(), user, id)
        .await
        .map_err(|e| WebError::resource_fetch_error(Course::get_resource_type(), e))?
        .ok_or_else(|| WebError::resource_not_found(Course::get_resource_type()))?;

    Ok((StatusCode::OK, Json(course)))
}

#[utoipa::path(
    put,
    path = "/api/v1/courses/{id}",
    request_body = CourseCreateUpdate,
    description = "Updates course fields. Status and ownership are never settable here.",
    responses(
        (status = 200, description = "Course updated", body = Course),
        (status = 400, description = "Invalid pricing", body = ErrorResponse),
        (status = 403, description = "Not the owner, or course not editable", body = ErrorResponse),
        (status = 404, description = "Course not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    security(
        ("cookie" = [])
    ),
    tag = "courses"
)]
pub async fn course_update_handler(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(id): Path<Uuid>,
    Json(payload): Json<CourseCreateUpdate>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    validate_pricing(&payload)?;

    let course = Course::find_by_id(state.pool(), user, id)
        .await
        .map_err(|e| WebError::resource_fetch_error(Course::get_resource_type(), e))?
        .ok_or_else(|| WebError::resource_not_found(Course::get_resource_type()))?;

    check_mutable(&course, user)?;

    let updated = course
        .update(state.pool(), user, payload)
        .await
        .map_err(|e| WebError::resource_fetch_error(Course::get_resource_type(), e))?;

    Ok((StatusCode::OK, Json(updated)))
}

#[utoipa::path(
    delete,
    path = "/api/v1/courses/{id}",
    responses(
        (status = 200, description = "Course deleted"),
        (status = 403, description = "Not the owner, or course not editable", body = ErrorResponse),
        (status = 404, description = "Course not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    security(
        ("cookie" = [])
    ),
    tag = "courses"
)]
pub async fn course_delete_handler(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(id): Path<Uuid>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;

    let course = Course::find_by_id(state.pool(), user, id)
        .await
        .map_err(|e| WebError::resource_fetch_error(Course::get_resource_type(), e))?
        .ok_or_else(|| WebError::resource_not_found(Course::get_resource_type()))?;

    check_mutable(&course, user)?;

    course
        .delete(state.pool(), user)
        .await
        .map_err(|e| WebError::resource_fetch_error(Course::get_resource_type(), e))?;

    Ok(StatusCode::OK)
}

#[utoipa::path(
    post,
    path = "/api/v1/courses/{id}/enroll",
    description = "Enrolls the calling account into the course",
    responses(
        (status = 200, description = "Enrolled", body = Enrollment),
        (status = 404, description = "Course not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    security(
        ("cookie" = [])
    ),
    tag = "courses"
)]
pub async fn course_enroll_handler(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(id): Path<Uuid>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;

    let found = Course::find_by_id(state.pool(), user, id)
        .await
        .map_err(|e| WebError::resource_fetch_error(Course::get_resource_type(), e))?;
    if found.is_none() {
        return Err(WebError::resource_not_found(Course::get_resource_type()));
    }

    let enrollment = Enrollment::enroll(state.pool(), user.user_id(), id)
        .await
        .map_err(|e| {
            WebError::resource_fetch_error(crate::model::ResourceType::Enrollment, e)
        })?;

    Ok((StatusCode::OK, Json(enrollment)))
}

#[utoipa::path(
    post,
    path = "/api/v1/courses/{id}/feature",
    description = "Toggles the featured flag of a published course (admin only)",
    responses(
        (status = 200, description = "Flag toggled"),
        (status = 400, description = "Course is not published", body = ErrorResponse),
        (status = 403, description = "Admin only", body = ErrorResponse),
        (status = 404, description = "Course not found", body = ErrorResponse),
    ),
    security(
        ("cookie" = [])
    ),
    tag = "courses"
)]
pub async fn course_feature_handler(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(id): Path<Uuid>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    let featured = approval::toggle_featured(state.pool(), user, id).await?;
    Ok((StatusCode::OK, Json(json!({ "isFeatured": featured }))))
}

#[utoipa::path(
    post,
    path = "/api/v1/courses/{id}/archive",
    description = "Takes a published course off the marketplace",
    responses(
        (status = 200, description = "Course archived"),
        (status = 400, description = "Course is not published", body = ErrorResponse),
        (status = 403, description = "Not the owner", body = ErrorResponse),
        (status = 404, description = "Course not found", body = ErrorResponse),
    ),
    security(
        ("cookie" = [])
    ),
    tag = "courses"
)]
pub async fn course_archive_handler(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(id): Path<Uuid>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    approval::archive_course(state.pool(), user, id).await?;
    Ok(StatusCode::OK)
}

#[utoipa::path(
    post,
    path = "/api/v1/courses/{id}/draft",
    description = "Spawns the update draft of a published course",
    responses(
        (status = 200, description = "Draft created", body = Course),
        (status = 400, description = "Course not published or draft exists", body = ErrorResponse),
        (status = 403, description = "Not the owner", body = ErrorResponse),
        (status = 404, description = "Course not found", body = ErrorResponse),
    ),
    security(
        ("cookie" = [])
    ),
    tag = "courses"
)]
pub async fn course_draft_handler(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(id): Path<Uuid>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    let draft = approval::spawn_update_draft(state.pool(), user, id).await?;
    Ok((StatusCode::OK, Json(draft)))
}

#[utoipa::path(
    post,
    path = "/api/v1/courses/{id}/thumbnail",
    description = "Uploads a course thumbnail to the asset store",
    request_body = Vec<u8>,
    responses(
        (status = 200, description = "Thumbnail stored", body = Course),
        (status = 403, description = "Not the owner, or course not editable", body = ErrorResponse),
        (status = 404, description = "Course not found", body = ErrorResponse),
        (status = 500, description = "Asset store unavailable", body = ErrorResponse),
    ),
    security(
        ("cookie" = [])
    ),
    tag = "courses"
)]
pub async fn course_thumbnail_handler(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(id): Path<Uuid>,
    body: Bytes,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;

    let course = Course::find_by_id(state.pool(), user, id)
        .await
        .map_err(|e| WebError::resource_fetch_error(Course::get_resource_type(), e))?
        .ok_or_else(|| WebError::resource_not_found(Course::get_resource_type()))?;

    check_mutable(&course, user)?;

    let uploaded = state
        .assets()
        .upload(body.to_vec(), AssetKind::Image)
        .await
        .map_err(WebError::server_asset_error)?;

    let previous = course.thumbnail_public_id().map(str::to_string);

    let mut conn = state
        .pool()
        .acquire()
        .await
        .map_err(|e| WebError::resource_fetch_error(Course::get_resource_type(), e))?;
    Course::set_thumbnail(&mut conn, id, &uploaded.url, &uploaded.public_id)
        .await
        .map_err(|e| WebError::resource_fetch_error(Course::get_resource_type(), e))?;
    drop(conn);

    // replaced thumbnail is cleanup debt, never a request failure
    if let Some(public_id) = previous {
        if let Err(e) = state.assets().delete(&public_id).await {
            tracing::warn!("failed to delete replaced thumbnail {public_id}: {e}");
        }
    }

    let refreshed = Course::find_by_id(state.pool(), user, id)
        .await
        .map_err(|e| WebError::resource_fetch_error(Course::get_resource_type(), e))?
        .ok_or_else(|| WebError::resource_not_found(Course::get_resource_type()))?;

    Ok((StatusCode::OK, Json(refreshed)))
}

#[utoipa::path(
    post,
    path = "/api/v1/courses/lessons/{lesson_id}/video",
    description = "Uploads a lesson video. This is the only path that may set a platform-hosted video source.",
    request_body = Vec<u8>,
    responses(
        (status = 200, description = "Video stored"),
        (status = 400, description = "Lesson still carries quiz questions", body = ErrorResponse),
        (status = 403, description = "Not the owner, or course not editable", body = ErrorResponse),
        (status = 404, description = "Lesson not found", body = ErrorResponse),
        (status = 500, description = "Asset store unavailable", body = ErrorResponse),
    ),
    security(
        ("cookie" = [])
    ),
    tag = "courses"
)]
pub async fn lesson_video_handler(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(lesson_id): Path<Uuid>,
    body: Bytes,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;

    let mut tx = state
        .pool()
        .begin()
        .await
        .map_err(|e| WebError::resource_fetch_error(Course::get_resource_type(), e))?;

    let lesson = Lesson::find_active(&mut tx, lesson_id)
        .await
        .map_err(|e| WebError::resource_fetch_error(crate::model::ResourceType::Lesson, e))?
        .ok_or_else(|| WebError::resource_not_found(crate::model::ResourceType::Lesson))?;

    let course = Course::find_by_lesson_conn(&mut tx, lesson_id)
        .await
        .map_err(|e| WebError::resource_fetch_error(Course::get_resource_type(), e))?
        .ok_or_else(|| WebError::resource_not_found(Course::get_resource_type()))?;

    check_mutable(&course, user)?;

    // a quiz lesson must be emptied before it can become a video lesson
    let active_questions = QuizQuestion::count_active_by_lesson(&mut tx, lesson_id)
        .await
        .map_err(|e| WebError::resource_fetch_error(crate::model::ResourceType::QuizQuestion, e))?;
    if active_questions > 0 {
        return Err(WebError::resource_bad_request(
            crate::model::ResourceType::Lesson,
            "Quiz lessons must be emptied before switching to video.",
        ));
    }

    let previous = lesson.hosted_video_public_id().map(str::to_string);

    let uploaded = state
        .assets()
        .upload(body.to_vec(), AssetKind::Video)
        .await
        .map_err(WebError::server_asset_error)?;

    let content = LessonContent::Video {
        source: VideoSource::Cloudinary,
        video_id: uploaded.public_id.clone(),
        duration_seconds: uploaded.duration_seconds,
        thumbnail_url: None,
    };
    Lesson::update_fields(
        &mut tx,
        lesson_id,
        lesson.name(),
        lesson.description(),
        lesson.position(),
        lesson.is_free_preview(),
        &content,
    )
    .await
    .map_err(|e| WebError::resource_fetch_error(crate::model::ResourceType::Lesson, e))?;

    tx.commit()
        .await
        .map_err(|e| {
            WebError::resource_fetch_error(
                Course::get_resource_type(),
                crate::model::DatabaseError::from(e),
            )
        })?;

    if let Some(public_id) = previous {
        if public_id != uploaded.public_id {
            if let Err(e) = state.assets().delete(&public_id).await {
                tracing::warn!("failed to delete replaced video {public_id}: {e}");
            }
        }
    }

    Ok((StatusCode::OK, Json(uploaded)))
}
