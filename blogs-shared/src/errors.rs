use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::types::ApiErrorResponse;

/// Application error codes following the pattern E{area}{sequence}
///
/// Ranges:
/// - E0xxx: Shared/infrastructure errors
/// - E1xxx: Auth and session errors
/// - E2xxx: Blog domain errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorCode {
    // Shared (E0xxx)
    InternalError,
    ValidationError,
    NotFound,
    Unauthorized,
    Forbidden,
    BadRequest,
    StorageTimeout,
    Conflict,

    // Auth (E1xxx)
    InvalidCredentials,
    EmailAlreadyExists,
    TokenMalformed,
    TokenInvalid,
    SessionNotFound,
    SessionExpired,
    UserNotFound,

    // Blog domain (E2xxx)
    BlogNotFound,
    CategoryNotFound,
    CategoryAlreadyExists,
    CategoryInUse,
    InvalidCategory,
    CollectionNotFound,
    BlogAlreadyInCollection,
    BlogNotInCollection,
    CommentNotFound,
    CannotFollowSelf,
    NotOwner,
}

impl ErrorCode {
    pub fn code(&self) -> &'static str {
        match self {
            // Shared
            Self::InternalError => "E0001",
            Self::ValidationError => "E0002",
            Self::NotFound => "E0003",
            Self::Unauthorized => "E0004",
            Self::Forbidden => "E0005",
            Self::BadRequest => "E0006",
            Self::StorageTimeout => "E0007",
            Self::Conflict => "E0008",

            // Auth
            Self::InvalidCredentials => "E1001",
            Self::EmailAlreadyExists => "E1002",
            Self::TokenMalformed => "E1003",
            Self::TokenInvalid => "E1004",
            Self::SessionNotFound => "E1005",
            Self::SessionExpired => "E1006",
            Self::UserNotFound => "E1007",

            // Blog domain
            Self::BlogNotFound => "E2001",
            Self::CategoryNotFound => "E2002",
            Self::CategoryAlreadyExists => "E2003",
            Self::CategoryInUse => "E2004",
            Self::InvalidCategory => "E2005",
            Self::CollectionNotFound => "E2006",
            Self::BlogAlreadyInCollection => "E2007",
            Self::BlogNotInCollection => "E2008",
            Self::CommentNotFound => "E2009",
            Self::CannotFollowSelf => "E2010",
            Self::NotOwner => "E2011",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::InternalError | Self::StorageTimeout => StatusCode::INTERNAL_SERVER_ERROR,
            Self::ValidationError | Self::BadRequest | Self::InvalidCategory
            | Self::CannotFollowSelf => StatusCode::BAD_REQUEST,
            Self::NotFound | Self::UserNotFound | Self::SessionNotFound | Self::BlogNotFound
            | Self::CategoryNotFound | Self::CollectionNotFound | Self::BlogNotInCollection
            | Self::CommentNotFound => StatusCode::NOT_FOUND,
            Self::Unauthorized | Self::InvalidCredentials | Self::TokenMalformed
            | Self::TokenInvalid | Self::SessionExpired => StatusCode::UNAUTHORIZED,
            Self::Forbidden | Self::NotOwner => StatusCode::FORBIDDEN,
            Self::Conflict | Self::EmailAlreadyExists | Self::CategoryAlreadyExists
            | Self::CategoryInUse | Self::BlogAlreadyInCollection => StatusCode::CONFLICT,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{message}")]
    Known {
        code: ErrorCode,
        message: String,
    },

    #[error("validation error: {0}")]
    Validation(String),
}

impl AppError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::Known {
            code,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::BadRequest, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, message)
    }

    /// The error code this error is reported under.
    pub fn code(&self) -> ErrorCode {
        match self {
            AppError::Known { code, .. } => *code,
            AppError::Validation(_) => ErrorCode::ValidationError,
        }
    }

    pub fn status_code(&self) -> StatusCode {
        self.code().status_code()
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        AppError::Validation(errors.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_response) = match &self {
            AppError::Known { code, message } => {
                let status = code.status_code();
                if status.is_server_error() {
                    // Internal causes stay in the logs, never in the body.
                    tracing::error!(code = code.code(), error = %message, "request failed");
                    (status, ApiErrorResponse::new(code.code(), "internal server error"))
                } else {
                    (status, ApiErrorResponse::new(code.code(), message))
                }
            }
            AppError::Validation(msg) => (
                StatusCode::BAD_REQUEST,
                ApiErrorResponse::new("E0002", msg),
            ),
        };

        (status, Json(error_response)).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;
