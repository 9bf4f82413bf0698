use crate::model::error::{DatabaseError, DatabaseResult};
use serde::{Deserialize, Serialize};
use sqlx::PgConnection;
use sqlx::prelude::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum LessonType {
    Video,
    Text,
    Quiz,
}

impl LessonType {
    pub fn as_db(&self) -> &'static str {
        match self {
            Self::Video => "video",
            Self::Text => "text",
            Self::Quiz => "quiz",
        }
    }

    pub fn from_db(value: &str) -> Option<Self> {
        match value {
            "video" => Some(Self::Video),
            "text" => Some(Self::Text),
            "quiz" => Some(Self::Quiz),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum VideoSource {
    Cloudinary,
    Youtube,
    Vimeo,
}

impl VideoSource {
    pub fn as_db(&self) -> &'static str {
        match self {
            Self::Cloudinary => "cloudinary",
            Self::Youtube => "youtube",
            Self::Vimeo => "vimeo",
        }
    }

    pub fn from_db(value: &str) -> Option<Self> {
        match value {
            "cloudinary" => Some(Self::Cloudinary),
            "youtube" => Some(Self::Youtube),
            "vimeo" => Some(Self::Vimeo),
            _ => None,
        }
    }
}

/// Closed variant of lesson content. Exactly one alternative is populated
/// per lesson, the nullable columns exist only in the stored record.
#[derive(Debug, Clone, PartialEq)]
pub enum LessonContent {
    Video {
        source: VideoSource,
        video_id: String,
        duration_seconds: Option<i32>,
        thumbnail_url: Option<String>,
    },
    Text {
        body: String,
    },
    Quiz,
}

impl LessonContent {
    pub fn lesson_type(&self) -> LessonType {
        match self {
            Self::Video { .. } => LessonType::Video,
            Self::Text { .. } => LessonType::Text,
            Self::Quiz => LessonType::Quiz,
        }
    }
}

/// Flattened view of [`LessonContent`] for binding into the lessons table.
pub struct ContentColumns<'a> {
    pub video_source: Option<&'static str>,
    pub video_id: Option<&'a str>,
    pub duration_seconds: Option<i32>,
    pub thumbnail_url: Option<&'a str>,
    pub text_content: Option<&'a str>,
}

impl LessonContent {
    pub fn columns(&self) -> ContentColumns<'_> {
        match self {
            Self::Video {
                source,
                video_id,
                duration_seconds,
                thumbnail_url,
            } => ContentColumns {
                video_source: Some(source.as_db()),
                video_id: Some(video_id),
                duration_seconds: *duration_seconds,
                thumbnail_url: thumbnail_url.as_deref(),
                text_content: None,
            },
            Self::Text { body } => ContentColumns {
                video_source: None,
                video_id: None,
                duration_seconds: None,
                thumbnail_url: None,
                text_content: Some(body),
            },
            Self::Quiz => ContentColumns {
                video_source: None,
                video_id: None,
                duration_seconds: None,
                thumbnail_url: None,
                text_content: None,
            },
        }
    }
}

#[derive(Debug, Serialize, Deserialize, FromRow, utoipa::ToSchema)]
pub struct Lesson {
    id: Uuid,
    section_id: Uuid,
    name: String,
    description: Option<String>,
    position: i32,
    lesson_type: String,
    is_free_preview: bool,
    is_archived: bool,
    video_source: Option<String>,
    video_id: Option<String>,
    duration_seconds: Option<i32>,
    thumbnail_url: Option<String>,
    text_content: Option<String>,
}

impl Lesson {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn section_id(&self) -> Uuid {
        self.section_id
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

    pub fn is_free_preview(&self) -> bool {
        self.is_free_preview
    }

    pub fn is_archived(&self) -> bool {
        self.is_archived
    }

    pub fn lesson_type(&self) -> DatabaseResult<LessonType> {
        LessonType::from_db(&self.lesson_type)
            .ok_or(DatabaseError::InconsistentRow("unknown lesson_type"))
    }

    /// Rebuilds the content variant from the flattened columns.
    pub fn content(&self) -> DatabaseResult<LessonContent> {
        match self.lesson_type()? {
            LessonType::Video => {
                let source = self
                    .video_source
                    .as_deref()
                    .and_then(VideoSource::from_db)
                    .ok_or(DatabaseError::InconsistentRow("video lesson without source"))?;
                let video_id = self
                    .video_id
                    .clone()
                    .ok_or(DatabaseError::InconsistentRow("video lesson without video id"))?;
                Ok(LessonContent::Video {
                    source,
                    video_id,
                    duration_seconds: self.duration_seconds,
                    thumbnail_url: self.thumbnail_url.clone(),
                })
            }
            LessonType::Text => {
                let body = self
                    .text_content
                    .clone()
                    .ok_or(DatabaseError::InconsistentRow("text lesson without content"))?;
                Ok(LessonContent::Text { body })
            }
            LessonType::Quiz => Ok(LessonContent::Quiz),
        }
    }

    /// Public id of a platform-hosted video, if this lesson carries one.
    /// Needed when a re-typed lesson leaves an orphaned upload behind.
    pub fn hosted_video_public_id(&self) -> Option<&str> {
        if self.video_source.as_deref() == Some("cloudinary") {
            self.video_id.as_deref()
        } else {
            None
        }
    }
}

impl Lesson {
    pub async fn active_by_section(
        conn: &mut PgConnection,
        section_id: Uuid,
    ) -> DatabaseResult<Vec<Self>> {
        let rows = sqlx::query_as(
            "SELECT * FROM lessons WHERE section_id = $1 AND is_archived = FALSE ORDER BY position",
        )
        .bind(section_id)
        .fetch_all(conn)
        .await?;
        Ok(rows)
    }

    pub async fn find_active(conn: &mut PgConnection, id: Uuid) -> DatabaseResult<Option<Self>> {
        let row = sqlx::query_as("SELECT * FROM lessons WHERE id = $1 AND is_archived = FALSE")
            .bind(id)
            .fetch_optional(conn)
            .await?;
        Ok(row)
    }

    pub async fn insert(
        conn: &mut PgConnection,
        section_id: Uuid,
        name: &str,
        description: Option<&str>,
        position: i32,
        is_free_preview: bool,
        content: &LessonContent,
    ) -> DatabaseResult<Self> {
        let cols = content.columns();
        let row = sqlx::query_as(
            r#"
            INSERT INTO lessons
                (id, section_id, name, description, position, lesson_type, is_free_preview,
                 video_source, video_id, duration_seconds, thumbnail_url, text_content)
            VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$10,$11,$12)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(section_id)
        .bind(name)
        .bind(description)
        .bind(position)
        .bind(content.lesson_type().as_db())
        .bind(is_free_preview)
        .bind(cols.video_source)
        .bind(cols.video_id)
        .bind(cols.duration_seconds)
        .bind(cols.thumbnail_url)
        .bind(cols.text_content)
        .fetch_one(conn)
        .await?;
        Ok(row)
    }

    /// Rewrites every variant column from the new content, so a type
    /// transition always nulls the fields of the previous type.
    pub async fn update_fields(
        conn: &mut PgConnection,
        id: Uuid,
        name: &str,
        description: Option<&str>,
        position: i32,
        is_free_preview: bool,
        content: &LessonContent,
    ) -> DatabaseResult<()> {
        let cols = content.columns();
        sqlx::query(
            r#"
            UPDATE lessons
            SET name = $1, description = $2, position = $3, is_free_preview = $4,
                lesson_type = $5, video_source = $6, video_id = $7,
                duration_seconds = $8, thumbnail_url = $9, text_content = $10
            WHERE id = $11
            "#,
        )
        .bind(name)
        .bind(description)
        .bind(position)
        .bind(is_free_preview)
        .bind(content.lesson_type().as_db())
        .bind(cols.video_source)
        .bind(cols.video_id)
        .bind(cols.duration_seconds)
        .bind(cols.thumbnail_url)
        .bind(cols.text_content)
        .bind(id)
        .execute(conn)
        .await?;
        Ok(())
    }

    /// Archived lessons disappear from reads but stay referencable by
    /// historical quiz attempts.
    pub async fn archive(conn: &mut PgConnection, id: Uuid) -> DatabaseResult<()> {
        sqlx::query("UPDATE lessons SET is_archived = TRUE WHERE id = $1")
            .bind(id)
            .execute(conn)
            .await?;
        Ok(())
    }

    pub async fn positions_by_section(
        conn: &mut PgConnection,
        section_id: Uuid,
    ) -> DatabaseResult<Vec<i32>> {
        let positions = sqlx::query_scalar(
            "SELECT position FROM lessons WHERE section_id = $1 AND is_archived = FALSE ORDER BY position",
        )
        .bind(section_id)
        .fetch_all(conn)
        .await?;
        Ok(positions)
    }

    pub async fn count_active_by_course(
        conn: &mut PgConnection,
        course_id: Uuid,
    ) -> DatabaseResult<i64> {
        let count = sqlx::query_scalar(
            r#"
            SELECT COUNT(*)
            FROM lessons l
            JOIN sections s ON s.id = l.section_id
            WHERE s.course_id = $1 AND l.is_archived = FALSE
            "#,
        )
        .bind(course_id)
        .fetch_one(conn)
        .await?;
        Ok(count)
    }

    /// A course is submittable only if at least one lesson is actually
    /// presentable: named, and carrying a recognized type.
    pub async fn count_presentable_by_course(
        conn: &mut PgConnection,
        course_id: Uuid,
    ) -> DatabaseResult<i64> {
        let count = sqlx::query_scalar(
            r#"
            SELECT COUNT(*)
            FROM lessons l
            JOIN sections s ON s.id = l.section_id
            WHERE s.course_id = $1
              AND l.is_archived = FALSE
              AND l.name <> ''
              AND l.lesson_type IN ('video', 'text', 'quiz')
            "#,
        )
        .bind(course_id)
        .fetch_one(conn)
        .await?;
        Ok(count)
    }
}
