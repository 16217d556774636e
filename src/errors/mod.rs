use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use serde::Serialize;
use std::fmt;

#[derive(Debug)]
pub enum AppError {
    InvalidCredentials,
    DuplicateEmail(String),
    DuplicateEmployee(String),
    NotFound(String),
    UnsupportedFileType(String),
    FileTooLarge(String),
    Unauthorized(String),
    Validation(String),
    PersistenceError(String),
    Internal(String),
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::InvalidCredentials => write!(f, "Invalid credentials"),
            AppError::DuplicateEmail(msg)
            | AppError::DuplicateEmployee(msg)
            | AppError::NotFound(msg)
            | AppError::UnsupportedFileType(msg)
            | AppError::FileTooLarge(msg)
            | AppError::Unauthorized(msg)
            | AppError::Validation(msg)
            | AppError::PersistenceError(msg)
            | AppError::Internal(msg) => write!(f, "{}", msg),
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::InvalidCredentials | AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::DuplicateEmail(_) | AppError::DuplicateEmployee(_) => StatusCode::CONFLICT,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::UnsupportedFileType(_) | AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::FileTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            AppError::PersistenceError(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(ErrorResponse {
            error: self.to_string(),
        })
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        log::error!("Database error: {:?}", err);
        AppError::PersistenceError("Database error".to_string())
    }
}
