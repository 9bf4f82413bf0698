mod common;

use reqwest::StatusCode;
use serde_json::{Value, json};

use crate::common::{
    Action, Flow, create_course_action, setup_server, setup_test_db, signin_admin_action,
    signin_action, signup_action, simple_curriculum,
};

fn course_path(ctx: &common::FlowContext, suffix: &str) -> String {
    let course = ctx.get("course");
    format!(
        "/api/v1/courses/{}{}",
        course["id"].as_str().expect("course id"),
        suffix
    )
}

fn request_path(ctx: &common::FlowContext) -> String {
    let request = ctx.get("request");
    format!(
        "/api/v1/courses/reviews/{}",
        request["id"].as_str().expect("request id")
    )
}

#[tokio::test]
async fn route_submit_preconditions_test() {
    let pool = setup_test_db().await;
    let mut server = setup_server(&pool).await;

    Flow::new()
        .step(signup_action("teach", "teach", "instructor"))
        .step(create_course_action("Empty course").with_save_as("course"))
        // a course without curriculum cannot be submitted
        .step(
            Action::new("submit_empty", "POST", "dynamic")
                .with_dyn_path(|ctx| course_path(ctx, "/submit"))
                .with_body(json!({}))
                .with_expect(StatusCode::BAD_REQUEST),
        )
        .step(
            Action::new("sync", "PUT", "dynamic")
                .with_dyn_path(|ctx| course_path(ctx, "/curriculum"))
                .with_body(simple_curriculum()),
        )
        .step(
            Action::new("submit", "POST", "dynamic")
                .with_dyn_path(|ctx| course_path(ctx, "/submit"))
                .with_body(json!({"notes": "please review"}))
                .with_save_as("request")
                .assert_body(|body| {
                    let request: Value = serde_json::from_str(body).expect("invalid request");
                    assert_eq!(request["status"], "pending");
                    assert_eq!(request["request_type"], "initial_submission");
                }),
        )
        // a second submission while one is pending is rejected
        .step(
            Action::new("submit_again", "POST", "dynamic")
                .with_dyn_path(|ctx| course_path(ctx, "/submit"))
                .with_body(json!({}))
                .with_expect(StatusCode::BAD_REQUEST)
                .assert_body(|body| {
                    assert!(body.contains("pending"));
                }),
        )
        // the course is now pending, curriculum mutations are gone too
        .step(
            Action::new("sync_while_pending", "PUT", "dynamic")
                .with_dyn_path(|ctx| course_path(ctx, "/curriculum"))
                .with_body(simple_curriculum())
                .with_expect(StatusCode::FORBIDDEN),
        )
        .run(&mut server, pool)
        .await;
}

#[tokio::test]
async fn route_submit_not_owner_test() {
    let pool = setup_test_db().await;
    let mut server = setup_server(&pool).await;

    Flow::new()
        .step(signup_action("teach", "teach", "instructor"))
        .step(create_course_action("Mine").with_save_as("course"))
        .step(
            Action::new("sync", "PUT", "dynamic")
                .with_dyn_path(|ctx| course_path(ctx, "/curriculum"))
                .with_body(simple_curriculum()),
        )
        .step(signup_action("other", "other", "instructor").with_clear_cookies(true))
        .step(
            Action::new("submit_foreign", "POST", "dynamic")
                .with_dyn_path(|ctx| course_path(ctx, "/submit"))
                .with_body(json!({}))
                .with_expect(StatusCode::FORBIDDEN),
        )
        .run(&mut server, pool)
        .await;
}

#[tokio::test]
async fn route_review_approve_test() {
    let pool = setup_test_db().await;
    let mut server = setup_server(&pool).await;

    Flow::new()
        .step(signup_action("teach", "teach", "instructor"))
        .step(create_course_action("Ship it").with_save_as("course"))
        .step(
            Action::new("sync", "PUT", "dynamic")
                .with_dyn_path(|ctx| course_path(ctx, "/curriculum"))
                .with_body(simple_curriculum()),
        )
        .step(
            Action::new("submit", "POST", "dynamic")
                .with_dyn_path(|ctx| course_path(ctx, "/submit"))
                .with_body(json!({}))
                .with_save_as("request"),
        )
        // a non-admin cannot review
        .step(
            Action::new("review_not_admin", "PATCH", "dynamic")
                .with_dyn_path(request_path)
                .with_body(json!({"decision": "APPROVED"}))
                .with_expect(StatusCode::FORBIDDEN),
        )
        .step(signin_admin_action().with_clear_cookies(true))
        .step(
            Action::new("review_approve", "PATCH", "dynamic")
                .with_dyn_path(request_path)
                .with_body(json!({"decision": "APPROVED"}))
                .assert_body(|body| {
                    let request: Value = serde_json::from_str(body).expect("invalid request");
                    assert_eq!(request["status"], "approved");
                    assert!(request["reviewed_at"].is_string());
                }),
        )
        // the decision is final, a second review must fail
        .step(
            Action::new("review_twice", "PATCH", "dynamic")
                .with_dyn_path(request_path)
                .with_body(json!({"decision": "REJECTED"}))
                .with_expect(StatusCode::BAD_REQUEST),
        )
        .step(
            Action::new("course_published", "GET", "dynamic")
                .with_dyn_path(|ctx| course_path(ctx, ""))
                .assert_body(|body| {
                    let course: Value = serde_json::from_str(body).expect("invalid course");
                    assert_eq!(course["status"], "published");
                    assert!(course["published_at"].is_string());
                }),
        )
        // a published course cannot be re-submitted
        .step(
            signin_action("teach", "teach")
                .with_clear_cookies(true),
        )
        .step(
            Action::new("submit_published", "POST", "dynamic")
                .with_dyn_path(|ctx| course_path(ctx, "/submit"))
                .with_body(json!({}))
                .with_expect(StatusCode::BAD_REQUEST),
        )
        .run(&mut server, pool)
        .await;
}

#[tokio::test]
async fn route_review_reject_and_resubmit_test() {
    let pool = setup_test_db().await;
    let mut server = setup_server(&pool).await;

    Flow::new()
        .step(signup_action("teach", "teach", "instructor"))
        .step(create_course_action("Needs work").with_save_as("course"))
        .step(
            Action::new("sync", "PUT", "dynamic")
                .with_dyn_path(|ctx| course_path(ctx, "/curriculum"))
                .with_body(simple_curriculum()),
        )
        .step(
            Action::new("submit", "POST", "dynamic")
                .with_dyn_path(|ctx| course_path(ctx, "/submit"))
                .with_body(json!({}))
                .with_save_as("request"),
        )
        .step(signin_admin_action().with_clear_cookies(true))
        // NEEDS_REVISION keeps its own value on the request...
        .step(
            Action::new("review_needs_revision", "PATCH", "dynamic")
                .with_dyn_path(request_path)
                .with_body(json!({"decision": "NEEDS_REVISION", "adminNotes": "add a summary"}))
                .assert_body(|body| {
                    let request: Value = serde_json::from_str(body).expect("invalid request");
                    assert_eq!(request["status"], "needs_revision");
                    assert_eq!(request["admin_notes"], "add a summary");
                }),
        )
        // ...while the course collapses to rejected
        .step(
            Action::new("course_rejected", "GET", "dynamic")
                .with_dyn_path(|ctx| course_path(ctx, ""))
                .assert_body(|body| {
                    let course: Value = serde_json::from_str(body).expect("invalid course");
                    assert_eq!(course["status"], "rejected");
                }),
        )
        .step(signin_action("teach", "teach").with_clear_cookies(true))
        .step(
            Action::new("resubmit", "POST", "dynamic")
                .with_dyn_path(|ctx| course_path(ctx, "/submit"))
                .with_body(json!({}))
                .assert_body(|body| {
                    let request: Value = serde_json::from_str(body).expect("invalid request");
                    assert_eq!(request["request_type"], "re_submission");
                }),
        )
        .run(&mut server, pool)
        .await;
}

#[tokio::test]
async fn route_feature_toggle_test() {
    let pool = setup_test_db().await;
    let mut server = setup_server(&pool).await;

    Flow::new()
        .step(signup_action("teach", "teach", "instructor"))
        .step(create_course_action("Toggle me").with_save_as("course"))
        // featuring a draft course is rejected even for admins
        .step(signin_admin_action().with_clear_cookies(true))
        .step(
            Action::new("feature_draft", "POST", "dynamic")
                .with_dyn_path(|ctx| course_path(ctx, "/feature"))
                .with_expect(StatusCode::BAD_REQUEST),
        )
        .step(signin_action("teach", "teach").with_clear_cookies(true))
        .step(
            Action::new("sync", "PUT", "dynamic")
                .with_dyn_path(|ctx| course_path(ctx, "/curriculum"))
                .with_body(simple_curriculum()),
        )
        .step(
            Action::new("submit", "POST", "dynamic")
                .with_dyn_path(|ctx| course_path(ctx, "/submit"))
                .with_body(json!({}))
                .with_save_as("request"),
        )
        .step(signin_admin_action().with_clear_cookies(true))
        .step(
            Action::new("review_approve", "PATCH", "dynamic")
                .with_dyn_path(request_path)
                .with_body(json!({"decision": "APPROVED"})),
        )
        .step(
            Action::new("feature_published", "POST", "dynamic")
                .with_dyn_path(|ctx| course_path(ctx, "/feature"))
                .assert_body(|body| {
                    assert!(body.contains("true"));
                }),
        )
        // instructors cannot feature
        .step(signin_action("teach", "teach").with_clear_cookies(true))
        .step(
            Action::new("feature_not_admin", "POST", "dynamic")
                .with_dyn_path(|ctx| course_path(ctx, "/feature"))
                .with_expect(StatusCode::FORBIDDEN),
        )
        .run(&mut server, pool)
        .await;
}

/// The update-draft path: a published course spawns one draft, the draft's
/// approval merges its curriculum back into the live course.
#[tokio::test]
async fn route_update_draft_merge_test() {
    let pool = setup_test_db().await;
    let mut server = setup_server(&pool).await;
    server.save_cookies();

    // publish a course the long way
    server
        .post("/api/v1/account/signup")
        .json(&json!({"username": "teach", "password": "teach", "role": "instructor"}))
        .await
        .assert_status_ok();
    let course: Value = server
        .post("/api/v1/courses/")
        .json(&json!({"name": "Evolving course"}))
        .await
        .json();
    let course_id = course["id"].as_str().unwrap().to_string();

    server
        .put(&format!("/api/v1/courses/{course_id}/curriculum"))
        .json(&simple_curriculum())
        .await
        .assert_status_ok();
    let request: Value = server
        .post(&format!("/api/v1/courses/{course_id}/submit"))
        .json(&json!({}))
        .await
        .json();

    server.clear_cookies();
    server
        .post("/api/v1/account/signin")
        .json(&json!({"username": "admin", "password": "admin"}))
        .await
        .assert_status_ok();
    server
        .patch(&format!(
            "/api/v1/courses/reviews/{}",
            request["id"].as_str().unwrap()
        ))
        .json(&json!({"decision": "APPROVED"}))
        .await
        .assert_status_ok();

    // instructor spawns the update draft and edits it
    server.clear_cookies();
    server
        .post("/api/v1/account/signin")
        .json(&json!({"username": "teach", "password": "teach"}))
        .await
        .assert_status_ok();

    let draft: Value = server
        .post(&format!("/api/v1/courses/{course_id}/draft"))
        .await
        .json();
    let draft_id = draft["id"].as_str().unwrap().to_string();
    assert_eq!(draft["status"], "draft");
    assert_eq!(draft["live_course_id"], course_id.as_str());

    // only one live draft at a time
    server
        .post(&format!("/api/v1/courses/{course_id}/draft"))
        .await
        .assert_status(StatusCode::BAD_REQUEST);

    // the draft starts as a deep clone of the live curriculum
    let draft_tree: Value = server
        .get(&format!("/api/v1/courses/{draft_id}/curriculum"))
        .await
        .json();
    assert_eq!(draft_tree["sections"][0]["sectionName"], "Intro");

    let reworked = json!({
        "sections": [{
            "sectionName": "Reworked intro",
            "sectionOrder": 0,
            "lessons": [{
                "lessonName": "Welcome back",
                "lessonOrder": 0,
                "lessonType": "TEXT",
                "textContent": "hello again",
            }],
        }],
    });
    server
        .put(&format!("/api/v1/courses/{draft_id}/curriculum"))
        .json(&reworked)
        .await
        .assert_status_ok();

    let draft_request: Value = server
        .post(&format!("/api/v1/courses/{draft_id}/submit"))
        .json(&json!({}))
        .await
        .json();

    server.clear_cookies();
    server
        .post("/api/v1/account/signin")
        .json(&json!({"username": "admin", "password": "admin"}))
        .await
        .assert_status_ok();
    server
        .patch(&format!(
            "/api/v1/courses/reviews/{}",
            draft_request["id"].as_str().unwrap()
        ))
        .json(&json!({"decision": "APPROVED"}))
        .await
        .assert_status_ok();

    // the live course stays published and carries the reworked curriculum
    let live: Value = server
        .get(&format!("/api/v1/courses/{course_id}"))
        .await
        .json();
    assert_eq!(live["status"], "published");

    let live_tree: Value = server
        .get(&format!("/api/v1/courses/{course_id}/curriculum"))
        .await
        .json();
    assert_eq!(live_tree["sections"][0]["sectionName"], "Reworked intro");
    assert_eq!(
        live_tree["sections"][0]["lessons"][0]["textContent"],
        "hello again"
    );
}
