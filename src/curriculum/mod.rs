//! Curriculum tree: ordering invariants, desired-tree payloads, the
//! persisted-tree repository and the sync engine that reconciles the two.

pub mod ordering;
pub use ordering::{OrderLevel, validate_sequential_order};

pub mod payload;
pub use payload::{
    AttachmentPayload, CurriculumPayload, LessonPayload, OptionPayload, QuestionPayload,
    SectionPayload, SubtitlePayload,
};

pub mod tree;
pub use tree::{CurriculumTree, LessonNode, QuestionNode, SectionNode};

pub mod sync;
pub use sync::sync_curriculum;

use thiserror::Error;

use crate::model::DatabaseError;

pub type CurriculumResult<T> = std::result::Result<T, CurriculumError>;

#[derive(Debug, Error)]
pub enum CurriculumError {
    #[error("database error: {0}")]
    Database(#[from] DatabaseError),

    #[error("course not found")]
    CourseNotFound,

    #[error("{level} not found under its parent")]
    NodeNotFound { level: &'static str },

    #[error("caller does not own this course")]
    NotOwner,

    #[error("course is not editable in its current status")]
    NotEditable,

    #[error("{}", .0.client_message())]
    InvalidOrder(OrderLevel),

    #[error("lesson '{lesson}': {reason}")]
    ContentMismatch {
        lesson: String,
        reason: &'static str,
    },

    #[error("lesson '{lesson}' still has active questions and cannot change type")]
    QuizNotEmpty { lesson: String },

    #[error("lesson '{lesson}' requests a platform-hosted video, use the upload endpoint")]
    HostedVideoNotAllowed { lesson: String },

    #[error("question '{question}': {reason}")]
    BadQuizShape {
        question: String,
        reason: &'static str,
    },
}

impl From<sqlx::Error> for CurriculumError {
    fn from(e: sqlx::Error) -> Self {
        Self::Database(DatabaseError::from(e))
    }
}
