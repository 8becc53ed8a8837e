//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures errors to Sentry before
//! responding to the client. All route handlers return `Result<T, AppError>`.
//!
//! Taxonomy: bad-request (invalid input, signature failure), not-found,
//! upstream-unavailable (storage/payment calls), and internal. Clients only
//! ever see generic messages for server-side failures.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::content::ContentError;
use crate::db::RepositoryError;
use crate::gallery::GalleryError;
use crate::services::stripe::StripeError;

/// Application-level error type for the site.
#[derive(Debug, Error)]
pub enum AppError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// Object-storage listing failed.
    #[error("Gallery error: {0}")]
    Gallery(#[from] GalleryError),

    /// Stripe API operation failed.
    #[error("Stripe error: {0}")]
    Stripe(#[from] StripeError),

    /// Blog content failed to load.
    #[error("Content error: {0}")]
    Content(#[from] ContentError),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Request used an origin the server refuses to proxy.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Capture server errors to Sentry
        if matches!(
            self,
            Self::Database(_)
                | Self::Internal(_)
                | Self::Gallery(_)
                | Self::Stripe(_)
                | Self::Content(ContentError::Io(_) | ContentError::Parse(_))
        ) {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        let status = match &self {
            Self::Database(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Gallery(_) | Self::Stripe(_) => StatusCode::BAD_GATEWAY,
            Self::Content(err) => match err {
                ContentError::PostNotFound(_) => StatusCode::NOT_FOUND,
                ContentError::Io(_) | ContentError::Parse(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
        };

        // Don't expose internal error details to clients
        let message = match &self {
            Self::Database(_) | Self::Internal(_) => "Internal server error".to_string(),
            Self::Gallery(_) => "Failed to fetch from storage".to_string(),
            Self::Stripe(_) => "Payment provider error".to_string(),
            Self::Content(err) => match err {
                ContentError::PostNotFound(_) => "Post not found".to_string(),
                ContentError::Io(_) | ContentError::Parse(_) => {
                    "Failed to load content".to_string()
                }
            },
            _ => self.to_string(),
        };

        (status, message).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;
