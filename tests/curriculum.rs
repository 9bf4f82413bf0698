mod common;

use reqwest::StatusCode;
use serde_json::{Value, json};

use crate::common::{
    Action, Flow, create_course_action, quiz_curriculum, setup_server, setup_test_db,
    signup_action, simple_curriculum,
};

fn course_path(ctx: &common::FlowContext, suffix: &str) -> String {
    let course = ctx.get("course");
    format!(
        "/api/v1/courses/{}{}",
        course["id"].as_str().expect("course id"),
        suffix
    )
}

#[tokio::test]
async fn route_curriculum_sync_and_roundtrip_test() {
    let pool = setup_test_db().await;
    let mut server = setup_server(&pool).await;

    Flow::new()
        .step(signup_action("teach", "teach", "instructor"))
        .step(create_course_action("Rust 101").with_save_as("course"))
        .step(
            Action::new("sync", "PUT", "dynamic")
                .with_dyn_path(|ctx| course_path(ctx, "/curriculum"))
                .with_body(simple_curriculum())
                .assert_body(|body| {
                    assert!(body.contains("Curriculum updated successfully."));
                }),
        )
        .step(
            Action::new("read_tree", "GET", "dynamic")
                .with_dyn_path(|ctx| course_path(ctx, "/curriculum"))
                .assert_body(|body| {
                    let tree: Value = serde_json::from_str(body).expect("invalid tree");
                    let sections = tree["sections"].as_array().expect("sections");
                    assert_eq!(sections.len(), 1);
                    assert_eq!(sections[0]["sectionName"], "Intro");
                    assert_eq!(sections[0]["sectionOrder"], 0);
                    assert!(sections[0]["id"].is_string()); // server-assigned

                    let lessons = sections[0]["lessons"].as_array().expect("lessons");
                    assert_eq!(lessons.len(), 1);
                    assert_eq!(lessons[0]["lessonName"], "Welcome");
                    assert_eq!(lessons[0]["lessonType"], "TEXT");
                    assert_eq!(lessons[0]["textContent"], "hi");
                    assert_eq!(lessons[0]["isFreePreview"], true);
                }),
        )
        .run(&mut server, pool)
        .await;
}

#[tokio::test]
async fn route_curriculum_order_validation_test() {
    let pool = setup_test_db().await;
    let mut server = setup_server(&pool).await;

    let bad_payload = json!({
        "sections": [{
            "sectionName": "Starts at one",
            "sectionOrder": 1,
            "lessons": [],
        }],
    });

    Flow::new()
        .step(signup_action("teach", "teach", "instructor"))
        .step(create_course_action("Rust 101").with_save_as("course"))
        .step(
            Action::new("sync_bad_order", "PUT", "dynamic")
                .with_dyn_path(|ctx| course_path(ctx, "/curriculum"))
                .with_body(bad_payload)
                .with_expect(StatusCode::BAD_REQUEST)
                .assert_body(|body| {
                    assert!(
                        body.contains("Section order must be unique, sequential and start from 0.")
                    );
                }),
        )
        .run(&mut server, pool)
        .await;
}

#[tokio::test]
async fn route_curriculum_bad_quiz_shape_test() {
    let pool = setup_test_db().await;
    let mut server = setup_server(&pool).await;

    // single option, and no correct answer
    let bad_quiz = json!({
        "sections": [{
            "sectionName": "Assessment",
            "sectionOrder": 0,
            "lessons": [{
                "lessonName": "Final check",
                "lessonOrder": 0,
                "lessonType": "QUIZ",
                "questions": [{
                    "questionText": "2 + 2?",
                    "questionOrder": 0,
                    "options": [
                        { "optionText": "4", "isCorrectAnswer": false },
                    ],
                }],
            }],
        }],
    });

    Flow::new()
        .step(signup_action("teach", "teach", "instructor"))
        .step(create_course_action("Rust 101").with_save_as("course"))
        .step(
            Action::new("sync_bad_quiz", "PUT", "dynamic")
                .with_dyn_path(|ctx| course_path(ctx, "/curriculum"))
                .with_body(bad_quiz)
                .with_expect(StatusCode::BAD_REQUEST),
        )
        .run(&mut server, pool)
        .await;
}

#[tokio::test]
async fn route_curriculum_hosted_video_rejected_test() {
    let pool = setup_test_db().await;
    let mut server = setup_server(&pool).await;

    // platform-hosted uploads must go through the dedicated upload endpoint
    let hosted_video = json!({
        "sections": [{
            "sectionName": "Media",
            "sectionOrder": 0,
            "lessons": [{
                "lessonName": "Clip",
                "lessonOrder": 0,
                "lessonType": "VIDEO",
                "videoSource": "CLOUDINARY",
                "videoId": "abc123",
            }],
        }],
    });

    Flow::new()
        .step(signup_action("teach", "teach", "instructor"))
        .step(create_course_action("Rust 101").with_save_as("course"))
        .step(
            Action::new("sync_hosted_video", "PUT", "dynamic")
                .with_dyn_path(|ctx| course_path(ctx, "/curriculum"))
                .with_body(hosted_video)
                .with_expect(StatusCode::BAD_REQUEST)
                .assert_body(|body| {
                    assert!(body.contains("upload endpoint"));
                }),
        )
        .run(&mut server, pool)
        .await;
}

async fn setup_course_with_curriculum(
    server: &mut axum_test::TestServer,
    payload: &Value,
) -> String {
    server.save_cookies();

    server
        .post("/api/v1/account/signup")
        .json(&json!({"username": "teach", "password": "teach", "role": "instructor"}))
        .await
        .assert_status_ok();

    let course: Value = server
        .post("/api/v1/courses/")
        .json(&json!({"name": "Sync 101"}))
        .await
        .json();
    let course_id = course["id"].as_str().expect("course id").to_string();

    server
        .put(&format!("/api/v1/courses/{course_id}/curriculum"))
        .json(payload)
        .await
        .assert_status_ok();

    course_id
}

/// Re-submitting the tree with the assigned ids substituted in must not
/// create or archive anything.
#[tokio::test]
async fn route_curriculum_idempotent_resync_test() {
    let pool = setup_test_db().await;
    let mut server = setup_server(&pool).await;

    let course_id = setup_course_with_curriculum(&mut server, &simple_curriculum()).await;
    let tree_url = format!("/api/v1/courses/{course_id}/curriculum");

    let first: Value = server.get(&tree_url).await.json();
    let section = &first["sections"][0];
    let lesson = &section["lessons"][0];

    let resync = json!({
        "sections": [{
            "id": section["id"],
            "sectionName": section["sectionName"],
            "sectionOrder": section["sectionOrder"],
            "lessons": [{
                "id": lesson["id"],
                "lessonName": lesson["lessonName"],
                "lessonOrder": lesson["lessonOrder"],
                "lessonType": lesson["lessonType"],
                "textContent": lesson["textContent"],
                "isFreePreview": lesson["isFreePreview"],
            }],
        }],
    });

    server.put(&tree_url).json(&resync).await.assert_status_ok();

    let second: Value = server.get(&tree_url).await.json();
    assert_eq!(first, second); // same ids, nothing created or archived

    let total_lessons: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM lessons")
        .fetch_one(&pool.pool)
        .await
        .unwrap();
    assert_eq!(total_lessons, 1);
}

/// Omitting a question's id archives the row instead of deleting it.
#[tokio::test]
async fn route_curriculum_archive_question_test() {
    let pool = setup_test_db().await;
    let mut server = setup_server(&pool).await;

    let course_id = setup_course_with_curriculum(&mut server, &quiz_curriculum()).await;
    let tree_url = format!("/api/v1/courses/{course_id}/curriculum");

    let tree: Value = server.get(&tree_url).await.json();
    let section = &tree["sections"][0];
    let lesson = &section["lessons"][0];
    let kept = &lesson["questions"][1]; // drop "2 + 2?", keep "3 * 3?"

    let resync = json!({
        "sections": [{
            "id": section["id"],
            "sectionName": section["sectionName"],
            "sectionOrder": 0,
            "lessons": [{
                "id": lesson["id"],
                "lessonName": lesson["lessonName"],
                "lessonOrder": 0,
                "lessonType": "QUIZ",
                "questions": [{
                    "id": kept["id"],
                    "questionText": kept["questionText"],
                    "questionOrder": 0,
                    "options": kept["options"],
                }],
            }],
        }],
    });

    server.put(&tree_url).json(&resync).await.assert_status_ok();

    let after: Value = server.get(&tree_url).await.json();
    let questions = after["sections"][0]["lessons"][0]["questions"]
        .as_array()
        .unwrap();
    assert_eq!(questions.len(), 1);
    assert_eq!(questions[0]["questionText"], "3 * 3?");

    // the archived row is retained, not deleted
    let (total, archived): (i64, i64) = sqlx::query_as(
        "SELECT COUNT(*), COUNT(*) FILTER (WHERE is_archived) FROM quiz_questions",
    )
    .fetch_one(&pool.pool)
    .await
    .unwrap();
    assert_eq!(total, 2);
    assert_eq!(archived, 1);
}

/// A quiz lesson that still has active questions cannot change its type.
#[tokio::test]
async fn route_curriculum_retype_quiz_guard_test() {
    let pool = setup_test_db().await;
    let mut server = setup_server(&pool).await;

    let course_id = setup_course_with_curriculum(&mut server, &quiz_curriculum()).await;
    let tree_url = format!("/api/v1/courses/{course_id}/curriculum");

    let tree: Value = server.get(&tree_url).await.json();
    let section = &tree["sections"][0];
    let lesson = &section["lessons"][0];

    let retype = json!({
        "sections": [{
            "id": section["id"],
            "sectionName": section["sectionName"],
            "sectionOrder": 0,
            "lessons": [{
                "id": lesson["id"],
                "lessonName": lesson["lessonName"],
                "lessonOrder": 0,
                "lessonType": "TEXT",
                "textContent": "now text",
            }],
        }],
    });

    let resp = server.put(&tree_url).json(&retype).await;
    resp.assert_status(StatusCode::BAD_REQUEST);

    // emptying the quiz first makes the transition legal
    let empty_quiz = json!({
        "sections": [{
            "id": section["id"],
            "sectionName": section["sectionName"],
            "sectionOrder": 0,
            "lessons": [{
                "id": lesson["id"],
                "lessonName": lesson["lessonName"],
                "lessonOrder": 0,
                "lessonType": "QUIZ",
                "questions": [],
            }],
        }],
    });
    server
        .put(&tree_url)
        .json(&empty_quiz)
        .await
        .assert_status_ok();

    let retype_again = json!({
        "sections": [{
            "id": section["id"],
            "sectionName": section["sectionName"],
            "sectionOrder": 0,
            "lessons": [{
                "id": lesson["id"],
                "lessonName": lesson["lessonName"],
                "lessonOrder": 0,
                "lessonType": "TEXT",
                "textContent": "now text",
            }],
        }],
    });
    server
        .put(&tree_url)
        .json(&retype_again)
        .await
        .assert_status_ok();
}
