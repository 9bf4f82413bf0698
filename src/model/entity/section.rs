use crate::model::error::DatabaseResult;
use serde::{Deserialize, Serialize};
use sqlx::PgConnection;
use sqlx::prelude::FromRow;
use uuid::Uuid;

/// A section owns its lessons by id, never by reference. All section
/// mutations run on the caller's transaction.
#[derive(Debug, Serialize, Deserialize, FromRow, utoipa::ToSchema)]
pub struct Section {
    id: Uuid,
    course_id: Uuid,
    name: String,
    description: Option<String>,
    position: i32,
    original_id: Option<Uuid>,
}

impl Section {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn course_id(&self) -> Uuid {
        self.course_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn position(&self) -> i32 {
        self.position
    }

    pub fn original_id(&self) -> Option<Uuid> {
        self.original_id
    }
}

impl Section {
    pub async fn all_by_course(
        conn: &mut PgConnection,
        course_id: Uuid,
    ) -> DatabaseResult<Vec<Self>> {
        let rows = sqlx::query_as(
            "SELECT * FROM sections WHERE course_id = $1 ORDER BY position",
        )
        .bind(course_id)
        .fetch_all(conn)
        .await?;
        Ok(rows)
    }

    pub async fn insert(
        conn: &mut PgConnection,
        course_id: Uuid,
        name: &str,
        description: Option<&str>,
        position: i32,
        original_id: Option<Uuid>,
    ) -> DatabaseResult<Self> {
        let row = sqlx::query_as(
            r#"
            INSERT INTO sections (id, course_id, name, description, position, original_id)
            VALUES ($1,$2,$3,$4,$5,$6)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(course_id)
        .bind(name)
        .bind(description)
        .bind(position)
        .bind(original_id)
        .fetch_one(conn)
        .await?;
        Ok(row)
    }

    pub async fn update_fields(
        conn: &mut PgConnection,
        id: Uuid,
        name: &str,
        description: Option<&str>,
        position: i32,
    ) -> DatabaseResult<()> {
        sqlx::query("UPDATE sections SET name = $1, description = $2, position = $3 WHERE id = $4")
            .bind(name)
            .bind(description)
            .bind(position)
            .bind(id)
            .execute(conn)
            .await?;
        Ok(())
    }

    /// Sections carry no attempt history, removal is a hard delete and
    /// cascades through lessons and their children.
    pub async fn delete(conn: &mut PgConnection, id: Uuid) -> DatabaseResult<()> {
        sqlx::query("DELETE FROM sections WHERE id = $1")
            .bind(id)
            .execute(conn)
            .await?;
        Ok(())
    }

    pub async fn count_by_course(conn: &mut PgConnection, course_id: Uuid) -> DatabaseResult<i64> {
        let count = sqlx::query_scalar("SELECT COUNT(*) FROM sections WHERE course_id = $1")
            .bind(course_id)
            .fetch_one(conn)
            .await?;
        Ok(count)
    }

    pub async fn positions_by_course(
        conn: &mut PgConnection,
        course_id: Uuid,
    ) -> DatabaseResult<Vec<i32>> {
        let positions = sqlx::query_scalar(
            "SELECT position FROM sections WHERE course_id = $1 ORDER BY position",
        )
        .bind(course_id)
        .fetch_all(conn)
        .await?;
        Ok(positions)
    }
}
