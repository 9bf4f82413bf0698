use crate::model::error::DatabaseResult;
use crate::model::ModelManager;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, FromRow, utoipa::ToSchema)]
pub struct Enrollment {
    id: Uuid,
    account_id: Uuid,
    course_id: Uuid,
    enrolled_at: DateTime<Utc>,
}

impl Enrollment {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn course_id(&self) -> Uuid {
        self.course_id
    }
}

impl Enrollment {
    pub async fn enroll(
        mm: &ModelManager,
        account_id: Uuid,
        course_id: Uuid,
    ) -> DatabaseResult<Self> {
        let row = sqlx::query_as(
            r#"
            INSERT INTO enrollments (id, account_id, course_id)
            VALUES ($1,$2,$3)
            ON CONFLICT (account_id, course_id) DO UPDATE SET account_id = EXCLUDED.account_id
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(account_id)
        .bind(course_id)
        .fetch_one(mm.executor())
        .await?;
        Ok(row)
    }

    pub async fn is_enrolled(
        mm: &ModelManager,
        account_id: Uuid,
        course_id: Uuid,
    ) -> DatabaseResult<bool> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM enrollments WHERE account_id = $1 AND course_id = $2",
        )
        .bind(account_id)
        .bind(course_id)
        .fetch_one(mm.executor())
        .await?;
        Ok(count > 0)
    }
}
