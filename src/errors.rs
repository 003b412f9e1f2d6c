// src/errors.rs
// DOCUMENTATION: Custom error types and HTTP responses
// PURPOSE: Centralized error handling for entire application

use crate::views;
use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};
use thiserror::Error;

/// Application-specific error types
/// DOCUMENTATION: Every failure a request can hit, mapped onto a status code
#[derive(Error, Debug)]
pub enum GopherError {
    /// Bad input shape: hash format, rating range, missing or invalid file
    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    /// Any database failure, message passed through verbatim
    #[error("Database error: {0}")]
    PersistenceError(String),
}

/// Convert GopherError to HTTP response
/// DOCUMENTATION: Renders a small HTML error page; persistence errors expose
/// the driver message to the client
impl ResponseError for GopherError {
    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        HttpResponse::build(status)
            .content_type(views::HTML_CONTENT_TYPE)
            .body(views::error_page(status, &self.to_string()).into_string())
    }

    fn status_code(&self) -> StatusCode {
        match self {
            GopherError::ValidationError(_) => StatusCode::BAD_REQUEST,
            GopherError::NotFound(_) => StatusCode::NOT_FOUND,
            GopherError::PersistenceError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(
            GopherError::ValidationError("bad".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            GopherError::NotFound("gone".into()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            GopherError::PersistenceError("down".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_persistence_message_is_exposed() {
        let err = GopherError::PersistenceError("connection refused".into());
        let resp = err.error_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.to_string(), "Database error: connection refused");
    }
}
