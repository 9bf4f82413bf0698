//! Wire shape of the curriculum tree. Field names are the camelCase API
//! contract; conversion from the persisted tree is explicit and lives
//! here, next to the schema.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::curriculum::{CurriculumTree, LessonNode, QuestionNode, SectionNode};
use crate::model::DatabaseResult;
use crate::model::entity::{LessonContent, LessonType, VideoSource};

#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct CurriculumResponse {
    pub sections: Vec<SectionDto>,
}

#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SectionDto {
    pub id: Uuid,
    pub section_name: String,
    pub section_order: i32,
    pub description: Option<String>,
    pub lessons: Vec<LessonDto>,
}

#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LessonDto {
    pub id: Uuid,
    pub lesson_name: String,
    pub lesson_order: i32,
    pub lesson_type: LessonType,
    pub is_free_preview: bool,
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video_source: Option<VideoSource>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_seconds: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text_content: Option<String>,
    pub questions: Vec<QuestionDto>,
    pub attachments: Vec<AttachmentDto>,
    pub subtitles: Vec<SubtitleDto>,
}

#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct QuestionDto {
    pub id: Uuid,
    pub question_text: String,
    pub explanation: Option<String>,
    pub question_order: i32,
    pub options: Vec<OptionDto>,
}

#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OptionDto {
    pub id: Uuid,
    pub option_text: String,
    pub is_correct_answer: bool,
}

#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AttachmentDto {
    pub id: Uuid,
    pub file_name: String,
    pub file_url: String,
}

#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SubtitleDto {
    pub id: Uuid,
    pub language_code: String,
    pub file_url: String,
    pub is_default: bool,
}

impl CurriculumResponse {
    pub fn from_tree(tree: CurriculumTree) -> DatabaseResult<Self> {
        let sections = tree
            .sections
            .into_iter()
            .map(SectionDto::from_node)
            .collect::<DatabaseResult<Vec<_>>>()?;
        Ok(Self { sections })
    }
}

impl SectionDto {
    fn from_node(node: SectionNode) -> DatabaseResult<Self> {
        let lessons = node
            .lessons
            .into_iter()
            .map(LessonDto::from_node)
            .collect::<DatabaseResult<Vec<_>>>()?;
        Ok(Self {
            id: node.section.id(),
            section_name: node.section.name().to_string(),
            section_order: node.section.position(),
            description: node.section.description().map(str::to_string),
            lessons,
        })
    }
}

impl LessonDto {
    fn from_node(node: LessonNode) -> DatabaseResult<Self> {
        let lesson = &node.lesson;
        let content = lesson.content()?;

        let (video_source, video_id, duration_seconds, thumbnail_url, text_content) = match content
        {
            LessonContent::Video {
                source,
                video_id,
                duration_seconds,
                thumbnail_url,
            } => (
                Some(source),
                Some(video_id),
                duration_seconds,
                thumbnail_url,
                None,
            ),
            LessonContent::Text { body } => (None, None, None, None, Some(body)),
            LessonContent::Quiz => (None, None, None, None, None),
        };

        Ok(Self {
            id: lesson.id(),
            lesson_name: lesson.name().to_string(),
            lesson_order: lesson.position(),
            lesson_type: lesson.lesson_type()?,
            is_free_preview: lesson.is_free_preview(),
            description: lesson.description().map(str::to_string),
            video_source,
            video_id,
            duration_seconds,
            thumbnail_url,
            text_content,
            questions: node.questions.into_iter().map(QuestionDto::from_node).collect(),
            attachments: node
                .attachments
                .into_iter()
                .map(|a| AttachmentDto {
                    id: a.id(),
                    file_name: a.file_name().to_string(),
                    file_url: a.file_url().to_string(),
                })
                .collect(),
            subtitles: node
                .subtitles
                .into_iter()
                .map(|s| SubtitleDto {
                    id: s.id(),
                    language_code: s.language_code().to_string(),
                    file_url: s.file_url().to_string(),
                    is_default: s.is_default(),
                })
                .collect(),
        })
    }
}

impl QuestionDto {
    fn from_node(node: QuestionNode) -> Self {
        Self {
            id: node.question.id(),
            question_text: node.question.question_text().to_string(),
            explanation: node.question.explanation().map(str::to_string),
            question_order: node.question.position(),
            options: node
                .options
                .into_iter()
                .map(|o| OptionDto {
                    id: o.id(),
                    option_text: o.option_text().to_string(),
                    is_correct_answer: o.is_correct(),
                })
                .collect(),
        }
    }
}
