mod common;

use reqwest::StatusCode;
use serde_json::{Value, json};

use crate::common::{quiz_curriculum, setup_server, setup_test_db};

struct QuizFixture {
    course_id: String,
    lesson_id: String,
    questions: Vec<Value>,
}

/// Instructor publishes nothing fancy: a draft course with one quiz
/// lesson. Returns the ids the student-side tests need.
async fn setup_quiz_course(server: &mut axum_test::TestServer) -> QuizFixture {
    server.save_cookies();

    server
        .post("/api/v1/account/signup")
        .json(&json!({"username": "teach", "password": "teach", "role": "instructor"}))
        .await
        .assert_status_ok();

    let course: Value = server
        .post("/api/v1/courses/")
        .json(&json!({"name": "Quiz course"}))
        .await
        .json();
    let course_id = course["id"].as_str().unwrap().to_string();

    server
        .put(&format!("/api/v1/courses/{course_id}/curriculum"))
        .json(&quiz_curriculum())
        .await
        .assert_status_ok();

    let tree: Value = server
        .get(&format!("/api/v1/courses/{course_id}/curriculum"))
        .await
        .json();
    let lesson = &tree["sections"][0]["lessons"][0];
    let lesson_id = lesson["id"].as_str().unwrap().to_string();
    let questions = lesson["questions"].as_array().unwrap().clone();

    QuizFixture {
        course_id,
        lesson_id,
        questions,
    }
}

fn option_id(question: &Value, correct: bool) -> String {
    question["options"]
        .as_array()
        .unwrap()
        .iter()
        .find(|o| o["isCorrectAnswer"] == correct)
        .expect("option with requested correctness")["id"]
        .as_str()
        .unwrap()
        .to_string()
}

async fn signup_and_enroll(server: &mut axum_test::TestServer, course_id: &str) {
    server.clear_cookies();
    server
        .post("/api/v1/account/signup")
        .json(&json!({"username": "student", "password": "student", "role": "student"}))
        .await
        .assert_status_ok();
    server
        .post(&format!("/api/v1/courses/{course_id}/enroll"))
        .await
        .assert_status_ok();
}

#[tokio::test]
async fn route_quiz_attempt_flow_test() {
    let pool = setup_test_db().await;
    let mut server = setup_server(&pool).await;

    let fixture = setup_quiz_course(&mut server).await;
    signup_and_enroll(&mut server, &fixture.course_id).await;

    let attempt: Value = server
        .post(&format!(
            "/api/v1/quizzes/lessons/{}/start",
            fixture.lesson_id
        ))
        .await
        .json();
    let attempt_id = attempt["id"].as_str().unwrap().to_string();
    assert_eq!(attempt["attempt_number"], 1);
    assert!(attempt["completed_at"].is_null());

    // first question right, second question wrong
    let answers = json!({
        "answers": [
            {
                "questionId": fixture.questions[0]["id"],
                "selectedOptionId": option_id(&fixture.questions[0], true),
            },
            {
                "questionId": fixture.questions[1]["id"],
                "selectedOptionId": option_id(&fixture.questions[1], false),
            },
        ],
    });

    let graded: Value = server
        .post(&format!("/api/v1/quizzes/attempts/{attempt_id}/submit"))
        .json(&answers)
        .await
        .json();
    assert_eq!(graded["score"], 0.5);
    assert_eq!(graded["is_passed"], false); // pass threshold is 0.7
    assert!(graded["completed_at"].is_string());

    // double submission of the same attempt is rejected
    server
        .post(&format!("/api/v1/quizzes/attempts/{attempt_id}/submit"))
        .json(&answers)
        .await
        .assert_status(StatusCode::BAD_REQUEST);

    // the result view reveals the correct flags after completion
    let result: Value = server
        .get(&format!("/api/v1/quizzes/attempts/{attempt_id}/result"))
        .await
        .json();
    assert_eq!(result["attemptNumber"], 1);
    assert_eq!(result["score"], 0.5);
    let detail = result["answers"].as_array().unwrap();
    assert_eq!(detail.len(), 2);
    let first = detail
        .iter()
        .find(|a| a["questionText"] == "2 + 2?")
        .unwrap();
    assert_eq!(first["isCorrect"], true);
    assert!(
        first["options"]
            .as_array()
            .unwrap()
            .iter()
            .any(|o| o["isCorrectAnswer"] == true)
    );

    // a second attempt allocates the next attempt number
    let second: Value = server
        .post(&format!(
            "/api/v1/quizzes/lessons/{}/start",
            fixture.lesson_id
        ))
        .await
        .json();
    assert_eq!(second["attempt_number"], 2);

    // history comes back newest first
    let history: Value = server
        .get(&format!(
            "/api/v1/quizzes/lessons/{}/attempts",
            fixture.lesson_id
        ))
        .await
        .json();
    let attempts = history.as_array().unwrap();
    assert_eq!(attempts.len(), 2);
    assert_eq!(attempts[0]["attempt_number"], 2);
    assert_eq!(attempts[1]["attempt_number"], 1);
}

#[tokio::test]
async fn route_quiz_requires_enrollment_test() {
    let pool = setup_test_db().await;
    let mut server = setup_server(&pool).await;

    let fixture = setup_quiz_course(&mut server).await;

    // fresh account, no enrollment
    server.clear_cookies();
    server
        .post("/api/v1/account/signup")
        .json(&json!({"username": "lurker", "password": "lurker", "role": "student"}))
        .await
        .assert_status_ok();

    server
        .post(&format!(
            "/api/v1/quizzes/lessons/{}/start",
            fixture.lesson_id
        ))
        .await
        .assert_status(StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn route_quiz_rejects_foreign_answers_test() {
    let pool = setup_test_db().await;
    let mut server = setup_server(&pool).await;

    let fixture = setup_quiz_course(&mut server).await;
    signup_and_enroll(&mut server, &fixture.course_id).await;

    let attempt: Value = server
        .post(&format!(
            "/api/v1/quizzes/lessons/{}/start",
            fixture.lesson_id
        ))
        .await
        .json();
    let attempt_id = attempt["id"].as_str().unwrap();

    // unknown question id
    server
        .post(&format!("/api/v1/quizzes/attempts/{attempt_id}/submit"))
        .json(&json!({
            "answers": [{
                "questionId": uuid::Uuid::new_v4(),
                "selectedOptionId": option_id(&fixture.questions[0], true),
            }],
        }))
        .await
        .assert_status(StatusCode::BAD_REQUEST);

    // option that belongs to the other question
    server
        .post(&format!("/api/v1/quizzes/attempts/{attempt_id}/submit"))
        .json(&json!({
            "answers": [{
                "questionId": fixture.questions[0]["id"],
                "selectedOptionId": option_id(&fixture.questions[1], true),
            }],
        }))
        .await
        .assert_status(StatusCode::BAD_REQUEST);
}

/// Archiving a question must not invalidate completed attempts that
/// reference it.
#[tokio::test]
async fn route_quiz_history_survives_archival_test() {
    let pool = setup_test_db().await;
    let mut server = setup_server(&pool).await;

    let fixture = setup_quiz_course(&mut server).await;
    signup_and_enroll(&mut server, &fixture.course_id).await;

    let attempt: Value = server
        .post(&format!(
            "/api/v1/quizzes/lessons/{}/start",
            fixture.lesson_id
        ))
        .await
        .json();
    let attempt_id = attempt["id"].as_str().unwrap().to_string();

    server
        .post(&format!("/api/v1/quizzes/attempts/{attempt_id}/submit"))
        .json(&json!({
            "answers": [{
                "questionId": fixture.questions[0]["id"],
                "selectedOptionId": option_id(&fixture.questions[0], true),
            }],
        }))
        .await
        .assert_status_ok();

    // instructor drops the answered question from the curriculum
    server.clear_cookies();
    server
        .post("/api/v1/account/signin")
        .json(&json!({"username": "teach", "password": "teach"}))
        .await
        .assert_status_ok();

    let tree: Value = server
        .get(&format!(
            "/api/v1/courses/{}/curriculum",
            fixture.course_id
        ))
        .await
        .json();
    let section = &tree["sections"][0];
    let lesson = &section["lessons"][0];
    let kept = &lesson["questions"][1];
    server
        .put(&format!(
            "/api/v1/courses/{}/curriculum",
            fixture.course_id
        ))
        .json(&json!({
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
        }))
        .await
        .assert_status_ok();

    // the student's completed attempt still joins the archived question
    server.clear_cookies();
    server
        .post("/api/v1/account/signin")
        .json(&json!({"username": "student", "password": "student"}))
        .await
        .assert_status_ok();

    let result: Value = server
        .get(&format!("/api/v1/quizzes/attempts/{attempt_id}/result"))
        .await
        .json();
    let detail = result["answers"].as_array().unwrap();
    assert_eq!(detail.len(), 1);
    assert_eq!(detail[0]["questionText"], "2 + 2?");
    assert_eq!(detail[0]["isCorrect"], true);
}
