use axum::{Json, http::StatusCode, response::IntoResponse};
use thiserror::Error;

use crate::{
    approval::ApprovalError,
    auth::CryptError,
    curriculum::CurriculumError,
    error::log_error,
    model::{DatabaseError, ResourceType},
    quiz::QuizError,
};

pub type WebResult<T> = std::result::Result<T, WebError>;

#[derive(Debug, Error)]
pub enum RegistrationError {
    #[error("RegistrationUserConflict")]
    RegistrationUserConflict,

    #[error("RegistrationSlugConflict")]
    RegistrationSlugConflict,
}

#[derive(Debug, Error)]
pub enum AuthenticationError {
    #[error("AuthenticationCookieNotFound, cookie: {cookie}")]
    AuthenticationCookieNotFound { cookie: String },

    #[error("AuthenticationCookieInvalid, cookie: {cookie}. Error: {error}")]
    AuthenticationCookieInvalid {
        cookie: String,
        error: jsonwebtoken::errors::Error,
    },

    #[error("AuthenticationRequired")]
    AuthenticationRequired,

    #[error("AuthenticationInvalidCredentials")]
    AuthenticationInvalidCredentials,
}

#[derive(Debug, Error)]
pub enum ResourceError {
    #[error("ResourceNotFound: {resource_type:?}")]
    ResourceNotFound { resource_type: ResourceType },

    #[error("ResourceForbidden: {resource_type:?}")]
    ResourceForbidden { resource_type: ResourceType },

    #[error("ResourceFetchError: {resource_type:?}. Error: {error}")]
    ResourceFetchError {
        resource_type: ResourceType,
        error: DatabaseError,
    },

    #[error("ResourceBadRequest: {resource_type:?}, {message}")]
    ResourceBadRequest {
        resource_type: ResourceType,
        message: String,
    },
}

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("ServerCryptError: {0}")]
    ServerCryptError(#[from] crate::auth::CryptError),

    #[error("ServerAssetError: {0}")]
    ServerAssetError(#[from] crate::assets::AssetError),
}

impl ServerError {
    pub fn status_code(&self) -> StatusCode {
        StatusCode::INTERNAL_SERVER_ERROR
    }

    pub fn client_display(&self) -> String {
        String::from("Internal server error.")
    }
}

impl RegistrationError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::RegistrationUserConflict => StatusCode::CONFLICT,
            Self::RegistrationSlugConflict => StatusCode::CONFLICT,
        }
    }

    pub fn client_display(&self) -> String {
        match self {
            Self::RegistrationUserConflict => {
                String::from("Registration error, user already exists.")
            }
            Self::RegistrationSlugConflict => {
                String::from("A course with this name already exists.")
            }
        }
    }
}

impl AuthenticationError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::AuthenticationRequired => StatusCode::UNAUTHORIZED,
            Self::AuthenticationCookieNotFound { .. } => StatusCode::NOT_FOUND,
            Self::AuthenticationInvalidCredentials => StatusCode::UNAUTHORIZED,
            Self::AuthenticationCookieInvalid { .. } => StatusCode::BAD_REQUEST,
        }
    }

    pub fn client_display(&self) -> String {
        match self {
            Self::AuthenticationCookieInvalid { .. } => {
                String::from("Authentication error, cookie invalid.")
            }
            Self::AuthenticationCookieNotFound { .. } => {
                String::from("Authentication error, cookie not found.")
            }
            Self::AuthenticationRequired => String::from("Authentication required."),
            Self::AuthenticationInvalidCredentials => {
                String::from("Authentication error, user not found or password is invalid.")
            }
        }
    }
}

impl ResourceError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::ResourceNotFound { .. } => StatusCode::NOT_FOUND,
            Self::ResourceForbidden { .. } => StatusCode::FORBIDDEN,
            Self::ResourceFetchError { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            Self::ResourceBadRequest { .. } => StatusCode::BAD_REQUEST,
        }
    }

    pub fn client_display(&self) -> String {
        match self {
            Self::ResourceNotFound { .. } => String::from("Resource error, resource not found."),
            Self::ResourceForbidden { .. } => String::from("Resource error, resource forbidden."),
            Self::ResourceFetchError { .. } => {
                String::from("Resource error, unable to fetch resource.")
            }
            Self::ResourceBadRequest { message, .. } => message.clone(),
        }
    }
}

#[derive(Debug, Error)]
pub enum WebError {
    #[error("ResourceError - {0}")]
    ResourceError(#[from] ResourceError),
    #[error("AuthenticationError - {0}")]
    AuthenticationError(#[from] AuthenticationError),
    #[error("RegistrationError - {0}")]
    RegistrationError(#[from] RegistrationError),
    #[error("ServerError - {0}")]
    ServerError(#[from] ServerError),
    #[error("CurriculumError - {0}")]
    CurriculumError(#[from] CurriculumError),
    #[error("ApprovalError - {0}")]
    ApprovalError(#[from] ApprovalError),
    #[error("QuizError - {0}")]
    QuizError(#[from] QuizError),
}

impl WebError {
    pub fn resource_not_found(r#type: ResourceType) -> Self {
        Self::ResourceError(ResourceError::ResourceNotFound {
            resource_type: r#type,
        })
    }

    pub fn resource_forbidden(r#type: ResourceType) -> Self {
        Self::ResourceError(ResourceError::ResourceForbidden {
            resource_type: r#type,
        })
    }

    pub fn resource_fetch_error(r#type: ResourceType, error: DatabaseError) -> Self {
        Self::ResourceError(ResourceError::ResourceFetchError {
            resource_type: r#type,
            error,
        })
    }

    pub fn resource_bad_request<S: Into<String>>(r#type: ResourceType, message: S) -> Self {
        Self::ResourceError(ResourceError::ResourceBadRequest {
            resource_type: r#type,
            message: message.into(),
        })
    }

    pub fn auth_cookie_not_found<S: Into<String>>(cookie: S) -> Self {
        Self::AuthenticationError(AuthenticationError::AuthenticationCookieNotFound {
            cookie: cookie.into(),
        })
    }

    pub fn auth_cookie_invalid<S: Into<String>>(
        cookie: S,
        error: jsonwebtoken::errors::Error,
    ) -> Self {
        Self::AuthenticationError(AuthenticationError::AuthenticationCookieInvalid {
            cookie: cookie.into(),
            error,
        })
    }

    pub fn auth_required() -> Self {
        Self::AuthenticationError(AuthenticationError::AuthenticationRequired)
    }

    pub fn auth_invalid_credentials() -> Self {
        Self::AuthenticationError(AuthenticationError::AuthenticationInvalidCredentials)
    }

    pub fn registration_conflict() -> Self {
        Self::RegistrationError(RegistrationError::RegistrationUserConflict)
    }

    pub fn slug_conflict() -> Self {
        Self::RegistrationError(RegistrationError::RegistrationSlugConflict)
    }

    pub fn server_crypt_error(e: CryptError) -> Self {
        Self::ServerError(ServerError::ServerCryptError(e))
    }

    pub fn server_asset_error(e: crate::assets::AssetError) -> Self {
        Self::ServerError(ServerError::ServerAssetError(e))
    }

    pub fn status_code(&self) -> axum::http::StatusCode {
        match self {
            Self::ResourceError(e) => e.status_code(),
            Self::RegistrationError(e) => e.status_code(),
            Self::AuthenticationError(e) => e.status_code(),
            Self::ServerError(e) => e.status_code(),
            Self::CurriculumError(e) => curriculum_status(e),
            Self::ApprovalError(e) => approval_status(e),
            Self::QuizError(e) => quiz_status(e),
        }
    }

    pub fn client_display(&self) -> String {
        match self {
            Self::ResourceError(e) => e.client_display(),
            Self::RegistrationError(e) => e.client_display(),
            Self::AuthenticationError(e) => e.client_display(),
            Self::ServerError(e) => e.client_display(),
            Self::CurriculumError(e) => domain_display(curriculum_status(e), e),
            Self::ApprovalError(e) => domain_display(approval_status(e), e),
            Self::QuizError(e) => domain_display(quiz_status(e), e),
        }
    }
}

fn curriculum_status(e: &CurriculumError) -> StatusCode {
    match e {
        CurriculumError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        CurriculumError::CourseNotFound | CurriculumError::NodeNotFound { .. } => {
            StatusCode::NOT_FOUND
        }
        CurriculumError::NotOwner | CurriculumError::NotEditable => StatusCode::FORBIDDEN,
        CurriculumError::InvalidOrder(_)
        | CurriculumError::ContentMismatch { .. }
        | CurriculumError::QuizNotEmpty { .. }
        | CurriculumError::HostedVideoNotAllowed { .. }
        | CurriculumError::BadQuizShape { .. } => StatusCode::BAD_REQUEST,
    }
}

fn approval_status(e: &ApprovalError) -> StatusCode {
    match e {
        ApprovalError::Database(_) | ApprovalError::Curriculum(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
        ApprovalError::CourseNotFound | ApprovalError::RequestNotFound => StatusCode::NOT_FOUND,
        ApprovalError::NotOwner | ApprovalError::AdminOnly => StatusCode::FORBIDDEN,
        ApprovalError::NotSubmittable
        | ApprovalError::AlreadyPending
        | ApprovalError::EmptyCurriculum
        | ApprovalError::AlreadyDecided
        | ApprovalError::NotPublished
        | ApprovalError::DraftExists => StatusCode::BAD_REQUEST,
    }
}

fn quiz_status(e: &QuizError) -> StatusCode {
    match e {
        QuizError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        QuizError::LessonNotFound | QuizError::AttemptNotFound => StatusCode::NOT_FOUND,
        QuizError::NotEnrolled | QuizError::NotYourAttempt => StatusCode::FORBIDDEN,
        QuizError::NotAQuiz
        | QuizError::AlreadyCompleted
        | QuizError::NotCompleted
        | QuizError::UnknownQuestion
        | QuizError::UnknownOption
        | QuizError::DuplicateAnswer => StatusCode::BAD_REQUEST,
    }
}

/// Domain errors carry presentable messages for client faults; everything
/// else collapses to a generic message.
fn domain_display<E: std::fmt::Display>(status: StatusCode, e: &E) -> String {
    if status == StatusCode::INTERNAL_SERVER_ERROR {
        String::from("Internal server error.")
    } else {
        e.to_string()
    }
}

#[derive(serde::Serialize, utoipa::ToSchema)]
pub struct ErrorResponse {
    /// Human-readable message for the client
    pub message: String,
    /// HTTP status code (stringified)
    pub status_code: String,
    /// Optional debug details (only in debug mode)
    pub details: Option<String>,
}

impl IntoResponse for WebError {
    fn into_response(self) -> axum::response::Response {
        log_error(&self);

        let status_code = self.status_code();
        let display = self.client_display();

        let body = ErrorResponse {
            message: display,
            status_code: status_code.as_str().to_string(),
            details: if cfg!(debug_assertions) {
                Some(self.to_string())
            } else {
                None
            },
        };

        (status_code, Json(body)).into_response()
    }
}
