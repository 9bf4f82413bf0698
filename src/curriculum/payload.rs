//! Desired-tree payloads for the bulk curriculum endpoint. A node with an
//! `id` updates the persisted row, a node without one creates a fresh row,
//! and persisted children omitted from the payload are archived or removed.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::curriculum::CurriculumError;
use crate::model::entity::{LessonContent, LessonType, VideoSource};

#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct CurriculumPayload {
    pub sections: Vec<SectionPayload>,
}

#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SectionPayload {
    pub id: Option<Uuid>,
    pub section_name: String,
    pub section_order: i32,
    pub description: Option<String>,
    #[serde(default)]
    pub lessons: Vec<LessonPayload>,
}

#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LessonPayload {
    pub id: Option<Uuid>,
    pub lesson_name: String,
    pub lesson_order: i32,
    pub lesson_type: LessonType,
    #[serde(default)]
    pub is_free_preview: bool,
    pub description: Option<String>,
    // video fields
    pub video_source: Option<VideoSource>,
    pub video_id: Option<String>,
    pub duration_seconds: Option<i32>,
    pub thumbnail_url: Option<String>,
    // text fields
    pub text_content: Option<String>,
    // children
    #[serde(default)]
    pub questions: Vec<QuestionPayload>,
    #[serde(default)]
    pub attachments: Vec<AttachmentPayload>,
    #[serde(default)]
    pub subtitles: Vec<SubtitlePayload>,
}

#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct QuestionPayload {
    pub id: Option<Uuid>,
    pub question_text: String,
    pub explanation: Option<String>,
    pub question_order: i32,
    pub options: Vec<OptionPayload>,
}

#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OptionPayload {
    pub id: Option<Uuid>,
    pub option_text: String,
    #[serde(default)]
    pub is_correct_answer: bool,
}

#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AttachmentPayload {
    pub id: Option<Uuid>,
    pub file_name: String,
    pub file_url: String,
}

#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SubtitlePayload {
    pub id: Option<Uuid>,
    pub language_code: String,
    pub file_url: String,
    #[serde(default)]
    pub is_default: bool,
}

impl LessonPayload {
    /// Assembles the content variant, rejecting payloads whose fields do
    /// not belong to the declared lesson type.
    pub fn content(&self) -> Result<LessonContent, CurriculumError> {
        match self.lesson_type {
            LessonType::Video => {
                let source = self
                    .video_source
                    .ok_or_else(|| CurriculumError::ContentMismatch {
                        lesson: self.lesson_name.clone(),
                        reason: "video lessons require a videoSource",
                    })?;
                let video_id =
                    self.video_id
                        .clone()
                        .ok_or_else(|| CurriculumError::ContentMismatch {
                            lesson: self.lesson_name.clone(),
                            reason: "video lessons require a videoId",
                        })?;
                if self.text_content.is_some() || !self.questions.is_empty() {
                    return Err(CurriculumError::ContentMismatch {
                        lesson: self.lesson_name.clone(),
                        reason: "video lessons cannot carry text content or questions",
                    });
                }
                Ok(LessonContent::Video {
                    source,
                    video_id,
                    duration_seconds: self.duration_seconds,
                    thumbnail_url: self.thumbnail_url.clone(),
                })
            }
            LessonType::Text => {
                let body =
                    self.text_content
                        .clone()
                        .ok_or_else(|| CurriculumError::ContentMismatch {
                            lesson: self.lesson_name.clone(),
                            reason: "text lessons require textContent",
                        })?;
                if self.video_source.is_some()
                    || self.video_id.is_some()
                    || !self.questions.is_empty()
                {
                    return Err(CurriculumError::ContentMismatch {
                        lesson: self.lesson_name.clone(),
                        reason: "text lessons cannot carry video fields or questions",
                    });
                }
                Ok(LessonContent::Text { body })
            }
            LessonType::Quiz => {
                if self.video_source.is_some()
                    || self.video_id.is_some()
                    || self.text_content.is_some()
                {
                    return Err(CurriculumError::ContentMismatch {
                        lesson: self.lesson_name.clone(),
                        reason: "quiz lessons carry no inline content",
                    });
                }
                Ok(LessonContent::Quiz)
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn text_lesson() -> LessonPayload {
        serde_json::from_value(serde_json::json!({
            "lessonName": "Welcome",
            "lessonOrder": 0,
            "lessonType": "TEXT",
            "textContent": "hi",
            "isFreePreview": true,
        }))
        .unwrap()
    }

    #[test]
    fn text_payload_builds_text_content() {
        let lesson = text_lesson();
        assert_eq!(
            lesson.content().unwrap(),
            LessonContent::Text {
                body: "hi".to_string()
            }
        );
    }

    #[test]
    fn video_payload_without_source_is_rejected() {
        let lesson: LessonPayload = serde_json::from_value(serde_json::json!({
            "lessonName": "Clip",
            "lessonOrder": 0,
            "lessonType": "VIDEO",
            "videoId": "abc123",
        }))
        .unwrap();
        assert!(lesson.content().is_err());
    }

    #[test]
    fn quiz_payload_with_text_is_rejected() {
        let lesson: LessonPayload = serde_json::from_value(serde_json::json!({
            "lessonName": "Check",
            "lessonOrder": 0,
            "lessonType": "QUIZ",
            "textContent": "oops",
        }))
        .unwrap();
        assert!(lesson.content().is_err());
    }
}
