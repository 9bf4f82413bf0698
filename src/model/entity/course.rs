use crate::impl_paginatable_for;
use crate::model::access::HasOwner;
use crate::model::repo::ResourceTyped;
use crate::model::{ModelManager, error::DatabaseResult, repo::CrudRepository};
use crate::web::AuthenticatedUser;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgConnection;
use sqlx::prelude::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum CourseStatus {
    Draft,
    Pending,
    Published,
    Rejected,
    Archived,
}

impl CourseStatus {
    pub fn as_db(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Pending => "pending",
            Self::Published => "published",
            Self::Rejected => "rejected",
            Self::Archived => "archived",
        }
    }

    /// Statuses in which the owning instructor may mutate course content.
    pub fn is_editable(&self) -> bool {
        matches!(self, Self::Draft | Self::Rejected)
    }
}

impl From<&str> for CourseStatus {
    fn from(value: &str) -> Self {
        match value {
            "pending" => Self::Pending,
            "published" => Self::Published,
            "rejected" => Self::Rejected,
            "archived" => Self::Archived,
            _ => Self::Draft,
        }
    }
}

impl std::fmt::Display for CourseStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_db())
    }
}

#[derive(Debug, Serialize, Deserialize, FromRow, utoipa::ToSchema)]
pub struct Course {
    id: Uuid,
    name: String,
    slug: String,
    subtitle: Option<String>,
    description: Option<String>,
    price_original: Option<i64>,
    price_discounted: Option<i64>,
    instructor_id: Uuid,
    category: Option<String>,
    level: Option<String>,
    language_code: Option<String>,
    status: String,
    thumbnail_url: Option<String>,
    thumbnail_public_id: Option<String>,
    is_featured: bool,
    published_at: Option<DateTime<Utc>>,
    rating_avg: f64,
    rating_count: i32,
    live_course_id: Option<Uuid>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl ResourceTyped for Course {
    fn get_resource_type() -> crate::model::ResourceType {
        crate::model::ResourceType::Course
    }
}

impl Course {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn slug(&self) -> &str {
        &self.slug
    }

    pub fn instructor_id(&self) -> Uuid {
        self.instructor_id
    }

    pub fn status(&self) -> CourseStatus {
        CourseStatus::from(self.status.as_str())
    }

    pub fn is_featured(&self) -> bool {
        self.is_featured
    }

    pub fn published_at(&self) -> Option<&DateTime<Utc>> {
        self.published_at.as_ref()
    }

    pub fn live_course_id(&self) -> Option<Uuid> {
        self.live_course_id
    }

    pub fn price_original(&self) -> Option<i64> {
        self.price_original
    }

    pub fn price_discounted(&self) -> Option<i64> {
        self.price_discounted
    }

    pub fn thumbnail_url(&self) -> Option<&str> {
        self.thumbnail_url.as_deref()
    }

    pub fn thumbnail_public_id(&self) -> Option<&str> {
        self.thumbnail_public_id.as_deref()
    }
}

#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct CourseCreateUpdate {
    pub name: String,
    pub subtitle: Option<String>,
    pub description: Option<String>,
    pub price_original: Option<i64>,
    pub price_discounted: Option<i64>,
    pub category: Option<String>,
    pub level: Option<String>,
    pub language_code: Option<String>,
}

#[async_trait]
impl CrudRepository<Course, CourseCreateUpdate, uuid::Uuid> for Course {
    async fn create(
        mm: &ModelManager,
        actor: &AuthenticatedUser,
        data: CourseCreateUpdate,
    ) -> DatabaseResult<Self> {
        let mut slugger = github_slugger::Slugger::default();
        let slug = slugger.slug(&data.name);
        let row = sqlx::query_as(
            r#"
            INSERT INTO courses
                (id, name, slug, subtitle, description, price_original, price_discounted,
                 instructor_id, category, level, language_code, status)
            VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$10,$11,'draft')
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&data.name)
        .bind(&slug)
        .bind(&data.subtitle)
        .bind(&data.description)
        .bind(data.price_original)
        .bind(data.price_discounted)
        .bind(actor.user_id())
        .bind(&data.category)
        .bind(&data.level)
        .bind(&data.language_code)
        .fetch_one(mm.executor())
        .await?;

        Ok(row)
    }

    async fn update(
        mut self,
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        data: CourseCreateUpdate,
    ) -> DatabaseResult<Self> {
        // status and instructor are deliberately not updatable here, the
        // review and feature paths own those columns.
        let row = sqlx::query_as(
            r#"
            UPDATE courses
            SET name = $1, subtitle = $2, description = $3, price_original = $4,
                price_discounted = $5, category = $6, level = $7, language_code = $8,
                updated_at = now()
            WHERE id = $9
            RETURNING *
            "#,
        )
        .bind(&data.name)
        .bind(&data.subtitle)
        .bind(&data.description)
        .bind(data.price_original)
        .bind(data.price_discounted)
        .bind(&data.category)
        .bind(&data.level)
        .bind(&data.language_code)
        .bind(self.id)
        .fetch_one(mm.executor())
        .await?;

        self = row;
        Ok(self)
    }

    async fn delete(self, mm: &ModelManager, _actor: &AuthenticatedUser) -> DatabaseResult<()> {
        sqlx::query("DELETE FROM courses WHERE id = $1")
            .bind(self.id)
            .execute(mm.executor())
            .await?;
        Ok(())
    }

    async fn find_by_id(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        id: uuid::Uuid,
    ) -> DatabaseResult<Option<Self>> {
        let result = sqlx::query_as("SELECT * FROM courses WHERE id = $1")
            .bind(id)
            .fetch_one(mm.executor())
            .await;
        if let Err(sqlx::Error::RowNotFound) = result {
            return Ok(None);
        }

        Ok(Some(result?))
    }

    async fn list(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        limit: i64,
        offset: i64,
    ) -> DatabaseResult<Vec<Self>> {
        let result = sqlx::query_as("SELECT * FROM courses ORDER BY created_at LIMIT $1 OFFSET $2")
            .bind(limit)
            .bind(offset)
            .fetch_all(mm.executor())
            .await?;
        Ok(result)
    }

    async fn count(mm: &ModelManager, _actor: &AuthenticatedUser) -> DatabaseResult<i64> {
        let result: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM courses")
            .fetch_one(mm.executor())
            .await?;

        Ok(result)
    }
}

impl_paginatable_for!(Course, CourseCreateUpdate, Uuid);

#[async_trait]
impl HasOwner for Course {
    type OwnerId = uuid::Uuid;

    async fn get_owner_id(
        &self,
        _mm: &ModelManager,
        _actor: &AuthenticatedUser,
    ) -> DatabaseResult<Self::OwnerId> {
        Ok(self.instructor_id)
    }
}

// Utils

impl Course {
    pub async fn find_by_slug(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        slug: &str,
    ) -> DatabaseResult<Option<Self>> {
        let result = sqlx::query_as("SELECT * FROM courses WHERE slug = $1")
            .bind(slug)
            .fetch_optional(mm.executor())
            .await?;
        Ok(result)
    }

    /// The course a lesson belongs to, resolved through its section.
    pub async fn find_by_lesson_conn(
        conn: &mut PgConnection,
        lesson_id: Uuid,
    ) -> DatabaseResult<Option<Self>> {
        let row = sqlx::query_as(
            r#"
            SELECT c.*
            FROM courses c
            JOIN sections s ON s.course_id = c.id
            JOIN lessons l ON l.section_id = s.id
            WHERE l.id = $1
            "#,
        )
        .bind(lesson_id)
        .fetch_optional(conn)
        .await?;
        Ok(row)
    }

    pub async fn find_by_id_conn(conn: &mut PgConnection, id: Uuid) -> DatabaseResult<Option<Self>> {
        let result = sqlx::query_as("SELECT * FROM courses WHERE id = $1")
            .bind(id)
            .fetch_optional(conn)
            .await?;
        Ok(result)
    }

    pub async fn set_status(
        conn: &mut PgConnection,
        id: Uuid,
        status: CourseStatus,
    ) -> DatabaseResult<()> {
        sqlx::query("UPDATE courses SET status = $1, updated_at = now() WHERE id = $2")
            .bind(status.as_db())
            .bind(id)
            .execute(conn)
            .await?;
        Ok(())
    }

    /// Publishes the course. `published_at` is stamped only on the first
    /// approval, a re-published course keeps its original timestamp.
    pub async fn mark_published(conn: &mut PgConnection, id: Uuid) -> DatabaseResult<()> {
        sqlx::query(
            r#"
            UPDATE courses
            SET status = 'published',
                published_at = COALESCE(published_at, now()),
                updated_at = now()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .execute(conn)
        .await?;
        Ok(())
    }

    pub async fn set_featured(
        conn: &mut PgConnection,
        id: Uuid,
        is_featured: bool,
    ) -> DatabaseResult<()> {
        sqlx::query("UPDATE courses SET is_featured = $1, updated_at = now() WHERE id = $2")
            .bind(is_featured)
            .bind(id)
            .execute(conn)
            .await?;
        Ok(())
    }

    /// Clones the course row into a fresh draft pointing back at the live
    /// course. Curriculum cloning is a separate step.
    pub async fn clone_as_draft(conn: &mut PgConnection, live: &Course) -> DatabaseResult<Self> {
        let row = sqlx::query_as(
            r#"
            INSERT INTO courses
                (id, name, slug, subtitle, description, price_original, price_discounted,
                 instructor_id, category, level, language_code, status,
                 thumbnail_url, thumbnail_public_id, live_course_id)
            SELECT $1, name, slug || '-draft', subtitle, description, price_original,
                   price_discounted, instructor_id, category, level, language_code,
                   'draft', thumbnail_url, thumbnail_public_id, id
            FROM courses WHERE id = $2
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(live.id)
        .fetch_one(conn)
        .await?;
        Ok(row)
    }

    /// The live update draft of a published course, if one exists. At most
    /// one is expected, enforced by query rather than by a constraint.
    pub async fn find_update_draft_conn(
        conn: &mut PgConnection,
        live_course_id: Uuid,
    ) -> DatabaseResult<Option<Self>> {
        let result = sqlx::query_as(
            "SELECT * FROM courses WHERE live_course_id = $1 ORDER BY created_at LIMIT 1",
        )
        .bind(live_course_id)
        .fetch_optional(conn)
        .await?;
        Ok(result)
    }

    /// Retires a merged update draft: archived, detached from its live
    /// course, and its slug freed up for the next draft.
    pub async fn retire_draft(conn: &mut PgConnection, id: Uuid) -> DatabaseResult<()> {
        sqlx::query(
            r#"
            UPDATE courses
            SET status = 'archived',
                live_course_id = NULL,
                slug = slug || '-' || left(id::text, 8),
                updated_at = now()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .execute(conn)
        .await?;
        Ok(())
    }

    pub async fn set_thumbnail(
        conn: &mut PgConnection,
        id: Uuid,
        url: &str,
        public_id: &str,
    ) -> DatabaseResult<()> {
        sqlx::query(
            "UPDATE courses SET thumbnail_url = $1, thumbnail_public_id = $2, updated_at = now() WHERE id = $3",
        )
        .bind(url)
        .bind(public_id)
        .bind(id)
        .execute(conn)
        .await?;
        Ok(())
    }

    /// Copies the instructor-editable columns of `source` onto `target`.
    /// Used when an approved update draft is merged back into its live course.
    pub async fn merge_fields_from(
        conn: &mut PgConnection,
        target_id: Uuid,
        source_id: Uuid,
    ) -> DatabaseResult<()> {
        sqlx::query(
            r#"
            UPDATE courses t
            SET name = s.name, subtitle = s.subtitle, description = s.description,
                price_original = s.price_original, price_discounted = s.price_discounted,
                category = s.category, level = s.level, language_code = s.language_code,
                thumbnail_url = s.thumbnail_url, thumbnail_public_id = s.thumbnail_public_id,
                updated_at = now()
            FROM courses s
            WHERE t.id = $1 AND s.id = $2
            "#,
        )
        .bind(target_id)
        .bind(source_id)
        .execute(conn)
        .await?;
        Ok(())
    }
}
