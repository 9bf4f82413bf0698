use crate::model::error::DatabaseResult;
use serde::{Deserialize, Serialize};
use sqlx::PgConnection;
use sqlx::prelude::FromRow;
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, FromRow, utoipa::ToSchema)]
pub struct QuizQuestion {
    id: Uuid,
    lesson_id: Uuid,
    question_text: String,
    explanation: Option<String>,
    position: i32,
    is_archived: bool,
}

impl QuizQuestion {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn lesson_id(&self) -> Uuid {
        self.lesson_id
    }

    pub fn question_text(&self) -> &str {
        &self.question_text
    }

    pub fn explanation(&self) -> Option<&str> {
        self.explanation.as_deref()
    }

    pub fn position(&self) -> i32 {
        self.position
    }

    pub fn is_archived(&self) -> bool {
        self.is_archived
    }
}

impl QuizQuestion {
    pub async fn active_by_lesson(
        conn: &mut PgConnection,
        lesson_id: Uuid,
    ) -> DatabaseResult<Vec<Self>> {
        let rows = sqlx::query_as(
            "SELECT * FROM quiz_questions WHERE lesson_id = $1 AND is_archived = FALSE ORDER BY position",
        )
        .bind(lesson_id)
        .fetch_all(conn)
        .await?;
        Ok(rows)
    }

    pub async fn count_active_by_lesson(
        conn: &mut PgConnection,
        lesson_id: Uuid,
    ) -> DatabaseResult<i64> {
        let count = sqlx::query_scalar(
            "SELECT COUNT(*) FROM quiz_questions WHERE lesson_id = $1 AND is_archived = FALSE",
        )
        .bind(lesson_id)
        .fetch_one(conn)
        .await?;
        Ok(count)
    }

    pub async fn insert(
        conn: &mut PgConnection,
        lesson_id: Uuid,
        question_text: &str,
        explanation: Option<&str>,
        position: i32,
    ) -> DatabaseResult<Self> {
        let row = sqlx::query_as(
            r#"
            INSERT INTO quiz_questions (id, lesson_id, question_text, explanation, position)
            VALUES ($1,$2,$3,$4,$5)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(lesson_id)
        .bind(question_text)
        .bind(explanation)
        .bind(position)
        .fetch_one(conn)
        .await?;
        Ok(row)
    }

    pub async fn update_fields(
        conn: &mut PgConnection,
        id: Uuid,
        question_text: &str,
        explanation: Option<&str>,
        position: i32,
    ) -> DatabaseResult<()> {
        sqlx::query(
            "UPDATE quiz_questions SET question_text = $1, explanation = $2, position = $3 WHERE id = $4",
        )
        .bind(question_text)
        .bind(explanation)
        .bind(position)
        .bind(id)
        .execute(conn)
        .await?;
        Ok(())
    }

    /// Soft delete. Answered attempts keep referencing the archived row.
    pub async fn archive(conn: &mut PgConnection, id: Uuid) -> DatabaseResult<()> {
        sqlx::query("UPDATE quiz_questions SET is_archived = TRUE WHERE id = $1")
            .bind(id)
            .execute(conn)
            .await?;
        Ok(())
    }

    /// Lookup that ignores the archive flag, for historical attempt views.
    pub async fn find_by_id_any(
        conn: &mut PgConnection,
        id: Uuid,
    ) -> DatabaseResult<Option<Self>> {
        let row = sqlx::query_as("SELECT * FROM quiz_questions WHERE id = $1")
            .bind(id)
            .fetch_optional(conn)
            .await?;
        Ok(row)
    }

    pub async fn positions_by_lesson(
        conn: &mut PgConnection,
        lesson_id: Uuid,
    ) -> DatabaseResult<Vec<i32>> {
        let positions = sqlx::query_scalar(
            "SELECT position FROM quiz_questions WHERE lesson_id = $1 AND is_archived = FALSE ORDER BY position",
        )
        .bind(lesson_id)
        .fetch_all(conn)
        .await?;
        Ok(positions)
    }
}
