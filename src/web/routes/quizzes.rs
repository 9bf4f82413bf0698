use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{get, post},
};
use uuid::Uuid;

use crate::{
    Config, quiz,
    model::entity::QuizAttempt,
    web::{
        AppState, RequestContext, WebResult,
        dto::quizzes::{AttemptResultResponse, SubmitAnswersBody},
        error::ErrorResponse,
        middlewares,
    },
};

pub fn routes<S>(state: AppState) -> Router<S> {
    Router::new()
        .route("/lessons/{lesson_id}/start", post(attempt_start_handler))
        .route("/lessons/{lesson_id}/attempts", get(attempt_history_handler))
        .route("/attempts/{attempt_id}/submit", post(attempt_submit_handler))
        .route("/attempts/{attempt_id}/result", get(attempt_result_handler))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            middlewares::extract_context_fn,
        ))
        .with_state(state)
}

#[utoipa::path(
    post,
    path = "/api/v1/quizzes/lessons/{lesson_id}/start",
    description = "Starts a new attempt on a quiz lesson",
    params(
        ("lesson_id" = Uuid, Path, description = "ID of the quiz lesson")
    ),
    responses(
        (status = 200, description = "Attempt started", body = QuizAttempt),
        (status = 400, description = "Lesson is not a quiz", body = ErrorResponse),
        (status = 403, description = "Not enrolled in the course", body = ErrorResponse),
        (status = 404, description = "Lesson not found", body = ErrorResponse),
    ),
    security(
        ("cookie" = [])
    ),
    tag = "quizzes"
)]
pub async fn attempt_start_handler(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(lesson_id): Path<Uuid>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    let attempt = quiz::start_attempt(state.pool(), user, lesson_id).await?;
    Ok((StatusCode::OK, Json(attempt)))
}

#[utoipa::path(
    post,
    path = "/api/v1/quizzes/attempts/{attempt_id}/submit",
    request_body = SubmitAnswersBody,
    description = "Submits the answers of an attempt; grading and finalization happen in one transaction",
    params(
        ("attempt_id" = Uuid, Path, description = "ID of the attempt")
    ),
    responses(
        (status = 200, description = "Attempt graded", body = QuizAttempt),
        (status = 400, description = "Attempt already submitted, or answers malformed", body = ErrorResponse),
        (status = 403, description = "Attempt belongs to another account", body = ErrorResponse),
        (status = 404, description = "Attempt not found", body = ErrorResponse),
    ),
    security(
        ("cookie" = [])
    ),
    tag = "quizzes"
)]
pub async fn attempt_submit_handler(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(attempt_id): Path<Uuid>,
    Json(payload): Json<SubmitAnswersBody>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;

    let answers = payload.answers.into_iter().map(Into::into).collect();
    let pass_threshold = Config::get_or_init(false).await.quiz().pass_threshold();

    let attempt =
        quiz::submit_attempt(state.pool(), user, attempt_id, answers, pass_threshold).await?;

    Ok((StatusCode::OK, Json(attempt)))
}

#[utoipa::path(
    get,
    path = "/api/v1/quizzes/attempts/{attempt_id}/result",
    description = "Detail of a completed attempt, correct answers revealed",
    params(
        ("attempt_id" = Uuid, Path, description = "ID of the attempt")
    ),
    responses(
        (status = 200, description = "Attempt detail", body = AttemptResultResponse),
        (status = 400, description = "Attempt not submitted yet", body = ErrorResponse),
        (status = 403, description = "Attempt belongs to another account", body = ErrorResponse),
        (status = 404, description = "Attempt not found", body = ErrorResponse),
    ),
    security(
        ("cookie" = [])
    ),
    tag = "quizzes"
)]
pub async fn attempt_result_handler(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(attempt_id): Path<Uuid>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    let detail = quiz::attempt_result(state.pool(), user, attempt_id).await?;
    Ok((StatusCode::OK, Json(AttemptResultResponse::from(detail))))
}

#[utoipa::path(
    get,
    path = "/api/v1/quizzes/lessons/{lesson_id}/attempts",
    description = "All attempts of the calling account on a lesson, newest first",
    params(
        ("lesson_id" = Uuid, Path, description = "ID of the quiz lesson")
    ),
    responses(
        (status = 200, description = "Attempt history", body = Vec<QuizAttempt>),
        (status = 404, description = "Lesson not found", body = ErrorResponse),
    ),
    security(
        ("cookie" = [])
    ),
    tag = "quizzes"
)]
pub async fn attempt_history_handler(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(lesson_id): Path<Uuid>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    let attempts = quiz::attempt_history(state.pool(), user, lesson_id).await?;
    Ok((StatusCode::OK, Json(attempts)))
}
