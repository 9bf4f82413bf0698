//! Quiz attempt lifecycle: start, submit (grade + finalize in one
//! transaction), result retrieval and history. Correct flags are only
//! revealed on completed attempts — the show-answers-after-submission
//! policy.

use std::collections::{HashMap, HashSet};

use thiserror::Error;
use uuid::Uuid;

use crate::model::entity::{
    Course, Enrollment, Lesson, LessonType, QuizAttempt, QuizAttemptAnswer, QuizOption,
    QuizQuestion,
};
use crate::model::{DatabaseError, ModelManager};
use crate::web::AuthenticatedUser;

pub type QuizResult<T> = std::result::Result<T, QuizError>;

#[derive(Debug, Error)]
pub enum QuizError {
    #[error("database error: {0}")]
    Database(#[from] DatabaseError),

    #[error("lesson not found")]
    LessonNotFound,

    #[error("lesson is not a quiz")]
    NotAQuiz,

    #[error("caller is not enrolled in this course")]
    NotEnrolled,

    #[error("attempt not found")]
    AttemptNotFound,

    #[error("attempt belongs to another account")]
    NotYourAttempt,

    #[error("attempt was already submitted")]
    AlreadyCompleted,

    #[error("attempt has not been submitted yet")]
    NotCompleted,

    #[error("answer references a question outside this quiz")]
    UnknownQuestion,

    #[error("answer references an option outside its question")]
    UnknownOption,

    #[error("more than one answer for the same question")]
    DuplicateAnswer,
}

#[derive(Debug, Clone)]
pub struct SubmittedAnswer {
    pub question_id: Uuid,
    pub selected_option_id: Uuid,
}

/// Per-question detail of a completed attempt, correct flags included.
#[derive(Debug)]
pub struct AnswerDetail {
    pub question: QuizQuestion,
    pub options: Vec<QuizOption>,
    pub selected_option_id: Uuid,
    pub is_correct: bool,
}

#[derive(Debug)]
pub struct AttemptDetail {
    pub attempt: QuizAttempt,
    pub answers: Vec<AnswerDetail>,
}

/// Starts a new attempt with the next attempt number for this account.
pub async fn start_attempt(
    mm: &ModelManager,
    actor: &AuthenticatedUser,
    lesson_id: Uuid,
) -> QuizResult<QuizAttempt> {
    let mut conn = mm.acquire().await?;

    let lesson = Lesson::find_active(&mut conn, lesson_id)
        .await?
        .ok_or(QuizError::LessonNotFound)?;
    if lesson.lesson_type()? != LessonType::Quiz {
        return Err(QuizError::NotAQuiz);
    }

    check_quiz_access(mm, &mut conn, actor, lesson_id).await?;

    let attempt = QuizAttempt::start(&mut conn, lesson_id, actor.user_id()).await?;
    Ok(attempt)
}

/// Records the submitted answers, grades them against the correct options
/// and finalizes the attempt — all in one transaction.
pub async fn submit_attempt(
    mm: &ModelManager,
    actor: &AuthenticatedUser,
    attempt_id: Uuid,
    answers: Vec<SubmittedAnswer>,
    pass_threshold: f64,
) -> QuizResult<QuizAttempt> {
    let mut tx = mm.begin().await?;

    let attempt = QuizAttempt::find_by_id_conn(&mut tx, attempt_id)
        .await?
        .ok_or(QuizError::AttemptNotFound)?;

    if attempt.account_id() != actor.user_id() {
        return Err(QuizError::NotYourAttempt);
    }
    if attempt.is_completed() {
        return Err(QuizError::AlreadyCompleted);
    }

    let questions = QuizQuestion::active_by_lesson(&mut tx, attempt.lesson_id()).await?;
    let question_ids: HashSet<Uuid> = questions.iter().map(|q| q.id()).collect();

    let mut seen = HashSet::new();
    let mut options_by_question: HashMap<Uuid, Vec<QuizOption>> = HashMap::new();
    for answer in &answers {
        if !question_ids.contains(&answer.question_id) {
            return Err(QuizError::UnknownQuestion);
        }
        if !seen.insert(answer.question_id) {
            return Err(QuizError::DuplicateAnswer);
        }
        if !options_by_question.contains_key(&answer.question_id) {
            let options = QuizOption::active_by_question(&mut tx, answer.question_id).await?;
            options_by_question.insert(answer.question_id, options);
        }
    }

    // Answers land ungraded first, then the grading pass marks each one.
    let mut rows = Vec::with_capacity(answers.len());
    for answer in &answers {
        let options = &options_by_question[&answer.question_id];
        if !options.iter().any(|o| o.id() == answer.selected_option_id) {
            return Err(QuizError::UnknownOption);
        }
        let row = QuizAttemptAnswer::insert(
            &mut tx,
            attempt_id,
            answer.question_id,
            answer.selected_option_id,
        )
        .await?;
        rows.push(row);
    }

    let mut correct_count = 0usize;
    for row in &rows {
        let correct = QuizOption::correct_for_question(&mut tx, row.question_id()).await?;
        let is_correct = correct
            .map(|o| o.id() == row.selected_option_id())
            .unwrap_or(false);
        if is_correct {
            correct_count += 1;
        }
        QuizAttemptAnswer::set_correct(&mut tx, row.id(), is_correct).await?;
    }

    let total = questions.len();
    let score = if total == 0 {
        0.0
    } else {
        correct_count as f64 / total as f64
    };
    let is_passed = score >= pass_threshold;

    let finalized = QuizAttempt::finalize(&mut tx, attempt_id, score, is_passed).await?;

    tx.commit().await.map_err(DatabaseError::from)?;

    Ok(finalized)
}

/// Detail view of a completed attempt, joining question text and every
/// option (archived ones included, history outlives the curriculum).
pub async fn attempt_result(
    mm: &ModelManager,
    actor: &AuthenticatedUser,
    attempt_id: Uuid,
) -> QuizResult<AttemptDetail> {
    let attempt = QuizAttempt::find_by_id(mm, attempt_id)
        .await?
        .ok_or(QuizError::AttemptNotFound)?;

    if attempt.account_id() != actor.user_id() && !actor.is_admin() {
        return Err(QuizError::NotYourAttempt);
    }
    if !attempt.is_completed() {
        return Err(QuizError::NotCompleted);
    }

    let rows = QuizAttemptAnswer::all_by_attempt(mm, attempt_id).await?;
    let mut conn = mm.acquire().await?;

    let mut answers = Vec::with_capacity(rows.len());
    for row in rows {
        let question = QuizQuestion::find_by_id_any(&mut conn, row.question_id())
            .await?
            .ok_or(QuizError::UnknownQuestion)?;
        let options = QuizOption::all_by_question_any(&mut conn, question.id()).await?;
        answers.push(AnswerDetail {
            question,
            options,
            selected_option_id: row.selected_option_id(),
            is_correct: row.is_correct().unwrap_or(false),
        });
    }

    Ok(AttemptDetail { attempt, answers })
}

/// All attempts of the caller on a lesson, newest first.
pub async fn attempt_history(
    mm: &ModelManager,
    actor: &AuthenticatedUser,
    lesson_id: Uuid,
) -> QuizResult<Vec<QuizAttempt>> {
    let mut conn = mm.acquire().await?;
    Lesson::find_active(&mut conn, lesson_id)
        .await?
        .ok_or(QuizError::LessonNotFound)?;
    drop(conn);

    let attempts = QuizAttempt::history(mm, lesson_id, actor.user_id()).await?;
    Ok(attempts)
}

/// Students need an enrollment, the owning instructor and admins get in
/// for free.
async fn check_quiz_access(
    mm: &ModelManager,
    conn: &mut sqlx::PgConnection,
    actor: &AuthenticatedUser,
    lesson_id: Uuid,
) -> QuizResult<()> {
    if actor.is_admin() {
        return Ok(());
    }

    let course = Course::find_by_lesson_conn(conn, lesson_id)
        .await?
        .ok_or(QuizError::LessonNotFound)?;

    if course.instructor_id() == actor.user_id() {
        return Ok(());
    }

    if Enrollment::is_enrolled(mm, actor.user_id(), course.id()).await? {
        Ok(())
    } else {
        Err(QuizError::NotEnrolled)
    }
}
