use crate::model::error::DatabaseResult;
use serde::{Deserialize, Serialize};
use sqlx::PgConnection;
use sqlx::prelude::FromRow;
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, FromRow, utoipa::ToSchema)]
pub struct LessonAttachment {
    id: Uuid,
    lesson_id: Uuid,
    file_name: String,
    file_url: String,
}

impl LessonAttachment {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn lesson_id(&self) -> Uuid {
        self.lesson_id
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn file_url(&self) -> &str {
        &self.file_url
    }
}

impl LessonAttachment {
    pub async fn all_by_lesson(
        conn: &mut PgConnection,
        lesson_id: Uuid,
    ) -> DatabaseResult<Vec<Self>> {
        let rows = sqlx::query_as("SELECT * FROM lesson_attachments WHERE lesson_id = $1")
            .bind(lesson_id)
            .fetch_all(conn)
            .await?;
        Ok(rows)
    }

    pub async fn insert(
        conn: &mut PgConnection,
        lesson_id: Uuid,
        file_name: &str,
        file_url: &str,
    ) -> DatabaseResult<Self> {
        let row = sqlx::query_as(
            r#"
            INSERT INTO lesson_attachments (id, lesson_id, file_name, file_url)
            VALUES ($1,$2,$3,$4)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(lesson_id)
        .bind(file_name)
        .bind(file_url)
        .fetch_one(conn)
        .await?;
        Ok(row)
    }

    pub async fn update_fields(
        conn: &mut PgConnection,
        id: Uuid,
        file_name: &str,
        file_url: &str,
    ) -> DatabaseResult<()> {
        sqlx::query("UPDATE lesson_attachments SET file_name = $1, file_url = $2 WHERE id = $3")
            .bind(file_name)
            .bind(file_url)
            .bind(id)
            .execute(conn)
            .await?;
        Ok(())
    }

    pub async fn delete(conn: &mut PgConnection, id: Uuid) -> DatabaseResult<()> {
        sqlx::query("DELETE FROM lesson_attachments WHERE id = $1")
            .bind(id)
            .execute(conn)
            .await?;
        Ok(())
    }
}
