use crate::model::error::DatabaseResult;
use crate::model::ModelManager;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, FromRow, utoipa::ToSchema)]
pub struct Notification {
    id: Uuid,
    account_id: Uuid,
    notif_type: String,
    message: String,
    related_type: Option<String>,
    related_id: Option<Uuid>,
    is_read: bool,
    created_at: DateTime<Utc>,
}

impl Notification {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn notif_type(&self) -> &str {
        &self.notif_type
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl Notification {
    pub async fn insert(
        mm: &ModelManager,
        account_id: Uuid,
        notif_type: &str,
        message: &str,
        related_type: Option<&str>,
        related_id: Option<Uuid>,
    ) -> DatabaseResult<Self> {
        let row = sqlx::query_as(
            r#"
            INSERT INTO notifications (id, account_id, notif_type, message, related_type, related_id)
            VALUES ($1,$2,$3,$4,$5,$6)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(account_id)
        .bind(notif_type)
        .bind(message)
        .bind(related_type)
        .bind(related_id)
        .fetch_one(mm.executor())
        .await?;
        Ok(row)
    }

    pub async fn all_by_account(
        mm: &ModelManager,
        account_id: Uuid,
    ) -> DatabaseResult<Vec<Self>> {
        let rows = sqlx::query_as(
            "SELECT * FROM notifications WHERE account_id = $1 ORDER BY created_at DESC",
        )
        .bind(account_id)
        .fetch_all(mm.executor())
        .await?;
        Ok(rows)
    }
}
