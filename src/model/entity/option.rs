use crate::model::error::DatabaseResult;
use serde::{Deserialize, Serialize};
use sqlx::PgConnection;
use sqlx::prelude::FromRow;
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, FromRow, utoipa::ToSchema)]
pub struct QuizOption {
    id: Uuid,
    question_id: Uuid,
    option_text: String,
    is_correct: bool,
    position: i32,
    is_archived: bool,
}

impl QuizOption {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn question_id(&self) -> Uuid {
        self.question_id
    }

    pub fn option_text(&self) -> &str {
        &self.option_text
    }

    pub fn is_correct(&self) -> bool {
        self.is_correct
    }

    pub fn position(&self) -> i32 {
        self.position
    }
}

impl QuizOption {
    pub async fn active_by_question(
        conn: &mut PgConnection,
        question_id: Uuid,
    ) -> DatabaseResult<Vec<Self>> {
        let rows = sqlx::query_as(
            "SELECT * FROM quiz_options WHERE question_id = $1 AND is_archived = FALSE ORDER BY position",
        )
        .bind(question_id)
        .fetch_all(conn)
        .await?;
        Ok(rows)
    }

    pub async fn insert(
        conn: &mut PgConnection,
        question_id: Uuid,
        option_text: &str,
        is_correct: bool,
        position: i32,
    ) -> DatabaseResult<Self> {
        let row = sqlx::query_as(
            r#"
            INSERT INTO quiz_options (id, question_id, option_text, is_correct, position)
            VALUES ($1,$2,$3,$4,$5)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(question_id)
        .bind(option_text)
        .bind(is_correct)
        .bind(position)
        .fetch_one(conn)
        .await?;
        Ok(row)
    }

    pub async fn update_fields(
        conn: &mut PgConnection,
        id: Uuid,
        option_text: &str,
        is_correct: bool,
        position: i32,
    ) -> DatabaseResult<()> {
        sqlx::query(
            "UPDATE quiz_options SET option_text = $1, is_correct = $2, position = $3 WHERE id = $4",
        )
        .bind(option_text)
        .bind(is_correct)
        .bind(position)
        .bind(id)
        .execute(conn)
        .await?;
        Ok(())
    }

    pub async fn archive(conn: &mut PgConnection, id: Uuid) -> DatabaseResult<()> {
        sqlx::query("UPDATE quiz_options SET is_archived = TRUE WHERE id = $1")
            .bind(id)
            .execute(conn)
            .await?;
        Ok(())
    }

    /// All options including archived ones, for historical attempt views.
    pub async fn all_by_question_any(
        conn: &mut PgConnection,
        question_id: Uuid,
    ) -> DatabaseResult<Vec<Self>> {
        let rows = sqlx::query_as(
            "SELECT * FROM quiz_options WHERE question_id = $1 ORDER BY position",
        )
        .bind(question_id)
        .fetch_all(conn)
        .await?;
        Ok(rows)
    }

    /// The single correct active option of a question, used at grading time.
    pub async fn correct_for_question(
        conn: &mut PgConnection,
        question_id: Uuid,
    ) -> DatabaseResult<Option<Self>> {
        let row = sqlx::query_as(
            "SELECT * FROM quiz_options WHERE question_id = $1 AND is_archived = FALSE AND is_correct = TRUE LIMIT 1",
        )
        .bind(question_id)
        .fetch_optional(conn)
        .await?;
        Ok(row)
    }

    /// (active option count, correct option count) for the invariant
    /// re-check before a sync commits.
    pub async fn shape_of_question(
        conn: &mut PgConnection,
        question_id: Uuid,
    ) -> DatabaseResult<(i64, i64)> {
        let row: (i64, i64) = sqlx::query_as(
            r#"
            SELECT COUNT(*), COUNT(*) FILTER (WHERE is_correct)
            FROM quiz_options
            WHERE question_id = $1 AND is_archived = FALSE
            "#,
        )
        .bind(question_id)
        .fetch_one(conn)
        .await?;
        Ok(row)
    }
}
