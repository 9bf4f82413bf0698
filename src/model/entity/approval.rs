use crate::model::error::DatabaseResult;
use crate::model::{ModelManager, ResourceTyped};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgConnection;
use sqlx::prelude::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ApprovalRequestType {
    InitialSubmission,
    ReSubmission,
}

impl ApprovalRequestType {
    pub fn as_db(&self) -> &'static str {
        match self {
            Self::InitialSubmission => "initial_submission",
            Self::ReSubmission => "re_submission",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ApprovalStatus {
    Pending,
    Approved,
    Rejected,
    NeedsRevision,
}

impl ApprovalStatus {
    pub fn as_db(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::NeedsRevision => "needs_revision",
        }
    }
}

impl From<&str> for ApprovalStatus {
    fn from(value: &str) -> Self {
        match value {
            "approved" => Self::Approved,
            "rejected" => Self::Rejected,
            "needs_revision" => Self::NeedsRevision,
            _ => Self::Pending,
        }
    }
}

/// The admin's verdict on a pending request. REJECTED and NEEDS_REVISION
/// are kept distinct on the request record even though both send the
/// course back to the rejected status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReviewDecision {
    Approved,
    Rejected,
    NeedsRevision,
}

impl ReviewDecision {
    pub fn as_request_status(&self) -> ApprovalStatus {
        match self {
            Self::Approved => ApprovalStatus::Approved,
            Self::Rejected => ApprovalStatus::Rejected,
            Self::NeedsRevision => ApprovalStatus::NeedsRevision,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, FromRow, utoipa::ToSchema)]
pub struct CourseApprovalRequest {
    id: Uuid,
    course_id: Uuid,
    instructor_id: Uuid,
    request_type: String,
    status: String,
    instructor_notes: Option<String>,
    admin_id: Option<Uuid>,
    admin_notes: Option<String>,
    created_at: DateTime<Utc>,
    reviewed_at: Option<DateTime<Utc>>,
}

impl ResourceTyped for CourseApprovalRequest {
    fn get_resource_type() -> crate::model::ResourceType {
        crate::model::ResourceType::ApprovalRequest
    }
}

impl CourseApprovalRequest {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn course_id(&self) -> Uuid {
        self.course_id
    }

    pub fn instructor_id(&self) -> Uuid {
        self.instructor_id
    }

    pub fn status(&self) -> ApprovalStatus {
        ApprovalStatus::from(self.status.as_str())
    }

    pub fn admin_notes(&self) -> Option<&str> {
        self.admin_notes.as_deref()
    }

    pub fn reviewed_at(&self) -> Option<&DateTime<Utc>> {
        self.reviewed_at.as_ref()
    }
}

impl CourseApprovalRequest {
    pub async fn insert(
        conn: &mut PgConnection,
        course_id: Uuid,
        instructor_id: Uuid,
        request_type: ApprovalRequestType,
        instructor_notes: Option<&str>,
    ) -> DatabaseResult<Self> {
        let row = sqlx::query_as(
            r#"
            INSERT INTO course_approval_requests
                (id, course_id, instructor_id, request_type, status, instructor_notes)
            VALUES ($1,$2,$3,$4,'pending',$5)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(course_id)
        .bind(instructor_id)
        .bind(request_type.as_db())
        .bind(instructor_notes)
        .fetch_one(conn)
        .await?;
        Ok(row)
    }

    pub async fn find_by_id_conn(
        conn: &mut PgConnection,
        id: Uuid,
    ) -> DatabaseResult<Option<Self>> {
        let row = sqlx::query_as("SELECT * FROM course_approval_requests WHERE id = $1")
            .bind(id)
            .fetch_optional(conn)
            .await?;
        Ok(row)
    }

    pub async fn find_pending_by_course(
        conn: &mut PgConnection,
        course_id: Uuid,
    ) -> DatabaseResult<Option<Self>> {
        let row = sqlx::query_as(
            "SELECT * FROM course_approval_requests WHERE course_id = $1 AND status = 'pending'",
        )
        .bind(course_id)
        .fetch_optional(conn)
        .await?;
        Ok(row)
    }

    pub async fn all_by_course(
        mm: &ModelManager,
        course_id: Uuid,
    ) -> DatabaseResult<Vec<Self>> {
        let rows = sqlx::query_as(
            "SELECT * FROM course_approval_requests WHERE course_id = $1 ORDER BY created_at DESC",
        )
        .bind(course_id)
        .fetch_all(mm.executor())
        .await?;
        Ok(rows)
    }

    pub async fn mark_reviewed(
        conn: &mut PgConnection,
        id: Uuid,
        decision: ReviewDecision,
        admin_id: Uuid,
        admin_notes: Option<&str>,
    ) -> DatabaseResult<Self> {
        let row = sqlx::query_as(
            r#"
            UPDATE course_approval_requests
            SET status = $1, admin_id = $2, admin_notes = $3, reviewed_at = now()
            WHERE id = $4
            RETURNING *
            "#,
        )
        .bind(decision.as_request_status().as_db())
        .bind(admin_id)
        .bind(admin_notes)
        .bind(id)
        .fetch_one(conn)
        .await?;
        Ok(row)
    }
}
