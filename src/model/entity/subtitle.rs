use crate::model::error::DatabaseResult;
use serde::{Deserialize, Serialize};
use sqlx::PgConnection;
use sqlx::prelude::FromRow;
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, FromRow, utoipa::ToSchema)]
pub struct LessonSubtitle {
    id: Uuid,
    lesson_id: Uuid,
    language_code: String,
    file_url: String,
    is_default: bool,
}

impl LessonSubtitle {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn lesson_id(&self) -> Uuid {
        self.lesson_id
    }

    pub fn language_code(&self) -> &str {
        &self.language_code
    }

    pub fn file_url(&self) -> &str {
        &self.file_url
    }

    pub fn is_default(&self) -> bool {
        self.is_default
    }
}

impl LessonSubtitle {
    pub async fn all_by_lesson(
        conn: &mut PgConnection,
        lesson_id: Uuid,
    ) -> DatabaseResult<Vec<Self>> {
        let rows = sqlx::query_as("SELECT * FROM lesson_subtitles WHERE lesson_id = $1")
            .bind(lesson_id)
            .fetch_all(conn)
            .await?;
        Ok(rows)
    }

    pub async fn insert(
        conn: &mut PgConnection,
        lesson_id: Uuid,
        language_code: &str,
        file_url: &str,
    ) -> DatabaseResult<Self> {
        let row = sqlx::query_as(
            r#"
            INSERT INTO lesson_subtitles (id, lesson_id, language_code, file_url)
            VALUES ($1,$2,$3,$4)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(lesson_id)
        .bind(language_code)
        .bind(file_url)
        .fetch_one(conn)
        .await?;
        Ok(row)
    }

    pub async fn update_fields(
        conn: &mut PgConnection,
        id: Uuid,
        language_code: &str,
        file_url: &str,
    ) -> DatabaseResult<()> {
        sqlx::query("UPDATE lesson_subtitles SET language_code = $1, file_url = $2 WHERE id = $3")
            .bind(language_code)
            .bind(file_url)
            .bind(id)
            .execute(conn)
            .await?;
        Ok(())
    }

    pub async fn delete(conn: &mut PgConnection, id: Uuid) -> DatabaseResult<()> {
        sqlx::query("DELETE FROM lesson_subtitles WHERE id = $1")
            .bind(id)
            .execute(conn)
            .await?;
        Ok(())
    }

    /// At most one default per lesson: clear everything, then set one.
    pub async fn clear_default(conn: &mut PgConnection, lesson_id: Uuid) -> DatabaseResult<()> {
        sqlx::query("UPDATE lesson_subtitles SET is_default = FALSE WHERE lesson_id = $1")
            .bind(lesson_id)
            .execute(conn)
            .await?;
        Ok(())
    }

    pub async fn set_default(conn: &mut PgConnection, id: Uuid) -> DatabaseResult<()> {
        sqlx::query("UPDATE lesson_subtitles SET is_default = TRUE WHERE id = $1")
            .bind(id)
            .execute(conn)
            .await?;
        Ok(())
    }
}
