use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum AppError {
    /// Request body or query failed validation
    Validation(String),
    /// Required query parameters absent (reported under `error`, not `message`)
    MissingParameters(String),
    /// Identity provider rejected the call
    Identity(String),
    /// Document store call failed
    Store(String),
    /// Push dispatch failed
    Push(String),
    Auth(String),
    NotFound(String),
    Internal(String),
}

impl AppError {
    /// Raw text surfaced to the client.
    pub fn message(&self) -> &str {
        match self {
            AppError::Validation(msg)
            | AppError::MissingParameters(msg)
            | AppError::Identity(msg)
            | AppError::Store(msg)
            | AppError::Push(msg)
            | AppError::Auth(msg)
            | AppError::NotFound(msg)
            | AppError::Internal(msg) => msg,
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Validation(msg) => write!(f, "Validation error: {}", msg),
            AppError::MissingParameters(msg) => write!(f, "Missing parameters: {}", msg),
            AppError::Identity(msg) => write!(f, "Identity error: {}", msg),
            AppError::Store(msg) => write!(f, "Document store error: {}", msg),
            AppError::Push(msg) => write!(f, "Push error: {}", msg),
            AppError::Auth(msg) => write!(f, "Auth error: {}", msg),
            AppError::NotFound(msg) => write!(f, "Not found: {}", msg),
            AppError::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for AppError {}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_)
            | AppError::MissingParameters(_)
            | AppError::Identity(_)
            | AppError::Store(_)
            | AppError::Push(_) => StatusCode::BAD_REQUEST,
            AppError::Auth(_) => StatusCode::UNAUTHORIZED,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let body = match self {
            AppError::MissingParameters(msg) => serde_json::json!({ "error": msg }),
            other => serde_json::json!({ "message": other.message() }),
        };
        HttpResponse::build(self.status_code()).json(body)
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl From<jsonwebtoken::errors::Error> for AppError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        AppError::Internal(format!("Failed to sign token: {}", err))
    }
}

impl From<bcrypt::BcryptError> for AppError {
    fn from(err: bcrypt::BcryptError) -> Self {
        AppError::Internal(format!("Password hashing error: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(AppError::Validation("x".into()).status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(AppError::Identity("x".into()).status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(AppError::Auth("x".into()).status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(AppError::NotFound("x".into()).status_code(), StatusCode::NOT_FOUND);
        assert_eq!(AppError::Internal("x".into()).status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_message_is_raw_text() {
        let err = AppError::Store("No document to update".into());
        assert_eq!(err.message(), "No document to update");
        assert_eq!(err.to_string(), "Document store error: No document to update");
    }
}
