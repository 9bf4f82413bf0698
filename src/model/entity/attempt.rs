use crate::model::error::DatabaseResult;
use crate::model::{ModelManager, ResourceTyped};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgConnection;
use sqlx::prelude::FromRow;
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, FromRow, utoipa::ToSchema)]
pub struct QuizAttempt {
    id: Uuid,
    lesson_id: Uuid,
    account_id: Uuid,
    attempt_number: i32,
    started_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
    score: Option<f64>,
    is_passed: Option<bool>,
}

impl ResourceTyped for QuizAttempt {
    fn get_resource_type() -> crate::model::ResourceType {
        crate::model::ResourceType::QuizAttempt
    }
}

impl QuizAttempt {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn lesson_id(&self) -> Uuid {
        self.lesson_id
    }

    pub fn account_id(&self) -> Uuid {
        self.account_id
    }

    pub fn attempt_number(&self) -> i32 {
        self.attempt_number
    }

    pub fn is_completed(&self) -> bool {
        self.completed_at.is_some()
    }

    pub fn score(&self) -> Option<f64> {
        self.score
    }

    pub fn is_passed(&self) -> Option<bool> {
        self.is_passed
    }
}

impl QuizAttempt {
    /// Allocates the next attempt number for this account+lesson pair.
    pub async fn start(
        conn: &mut PgConnection,
        lesson_id: Uuid,
        account_id: Uuid,
    ) -> DatabaseResult<Self> {
        let row = sqlx::query_as(
            r#"
            INSERT INTO quiz_attempts (id, lesson_id, account_id, attempt_number)
            SELECT $1, $2, $3, COALESCE(MAX(attempt_number), 0) + 1
            FROM quiz_attempts
            WHERE lesson_id = $2 AND account_id = $3
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(lesson_id)
        .bind(account_id)
        .fetch_one(conn)
        .await?;
        Ok(row)
    }

    pub async fn find_by_id(mm: &ModelManager, id: Uuid) -> DatabaseResult<Option<Self>> {
        let row = sqlx::query_as("SELECT * FROM quiz_attempts WHERE id = $1")
            .bind(id)
            .fetch_optional(mm.executor())
            .await?;
        Ok(row)
    }

    pub async fn find_by_id_conn(conn: &mut PgConnection, id: Uuid) -> DatabaseResult<Option<Self>> {
        let row = sqlx::query_as("SELECT * FROM quiz_attempts WHERE id = $1")
            .bind(id)
            .fetch_optional(conn)
            .await?;
        Ok(row)
    }

    pub async fn history(
        mm: &ModelManager,
        lesson_id: Uuid,
        account_id: Uuid,
    ) -> DatabaseResult<Vec<Self>> {
        let rows = sqlx::query_as(
            r#"
            SELECT * FROM quiz_attempts
            WHERE lesson_id = $1 AND account_id = $2
            ORDER BY attempt_number DESC
            "#,
        )
        .bind(lesson_id)
        .bind(account_id)
        .fetch_all(mm.executor())
        .await?;
        Ok(rows)
    }

    pub async fn finalize(
        conn: &mut PgConnection,
        id: Uuid,
        score: f64,
        is_passed: bool,
    ) -> DatabaseResult<Self> {
        let row = sqlx::query_as(
            r#"
            UPDATE quiz_attempts
            SET completed_at = now(), score = $1, is_passed = $2
            WHERE id = $3
            RETURNING *
            "#,
        )
        .bind(score)
        .bind(is_passed)
        .bind(id)
        .fetch_one(conn)
        .await?;
        Ok(row)
    }
}

#[derive(Debug, Serialize, Deserialize, FromRow, utoipa::ToSchema)]
pub struct QuizAttemptAnswer {
    id: Uuid,
    attempt_id: Uuid,
    question_id: Uuid,
    selected_option_id: Uuid,
    is_correct: Option<bool>,
}

impl QuizAttemptAnswer {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn question_id(&self) -> Uuid {
        self.question_id
    }

    pub fn selected_option_id(&self) -> Uuid {
        self.selected_option_id
    }

    pub fn is_correct(&self) -> Option<bool> {
        self.is_correct
    }
}

impl QuizAttemptAnswer {
    /// Inserted ungraded; correctness is computed in the grading pass.
    pub async fn insert(
        conn: &mut PgConnection,
        attempt_id: Uuid,
        question_id: Uuid,
        selected_option_id: Uuid,
    ) -> DatabaseResult<Self> {
        let row = sqlx::query_as(
            r#"
            INSERT INTO quiz_attempt_answers (id, attempt_id, question_id, selected_option_id)
            VALUES ($1,$2,$3,$4)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(attempt_id)
        .bind(question_id)
        .bind(selected_option_id)
        .fetch_one(conn)
        .await?;
        Ok(row)
    }

    pub async fn set_correct(
        conn: &mut PgConnection,
        id: Uuid,
        is_correct: bool,
    ) -> DatabaseResult<()> {
        sqlx::query("UPDATE quiz_attempt_answers SET is_correct = $1 WHERE id = $2")
            .bind(is_correct)
            .bind(id)
            .execute(conn)
            .await?;
        Ok(())
    }

    pub async fn all_by_attempt(
        mm: &ModelManager,
        attempt_id: Uuid,
    ) -> DatabaseResult<Vec<Self>> {
        let rows = sqlx::query_as("SELECT * FROM quiz_attempt_answers WHERE attempt_id = $1")
            .bind(attempt_id)
            .fetch_all(mm.executor())
            .await?;
        Ok(rows)
    }
}
