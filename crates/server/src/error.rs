//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures errors to Sentry before
//! responding to the client. All route handlers should return `Result<T, AppError>`.
//!
//! Every error response body is JSON of the shape `{"error": "..."}` so all
//! three client apps can surface failures uniformly.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::db::RepositoryError;
use crate::db::coupons::CouponError;
use crate::db::orders::{CheckoutError, TransitionError};
use crate::services::ProviderError;
use crate::services::auth::AuthError;

/// Application-level error type for the API server.
#[derive(Debug, Error)]
pub enum AppError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// Authentication operation failed.
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// Checkout could not be completed.
    #[error("Checkout error: {0}")]
    Checkout(#[from] CheckoutError),

    /// Order item status transition was rejected.
    #[error("Transition error: {0}")]
    Transition(#[from] TransitionError),

    /// Coupon could not be applied.
    #[error("Coupon error: {0}")]
    Coupon(#[from] CouponError),

    /// An external provider (SMS, payment, places, storage) failed.
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    /// Request body failed validation.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// User is not authenticated.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// User is authenticated but lacks the required role.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::Database(err) => match err {
                RepositoryError::NotFound => StatusCode::NOT_FOUND,
                RepositoryError::Conflict(_) => StatusCode::CONFLICT,
                RepositoryError::Invalid(_) => StatusCode::BAD_REQUEST,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::Auth(err) => match err {
                AuthError::OtpInvalid
                | AuthError::OtpExpired
                | AuthError::OtpNotFound
                | AuthError::OtpTooManyAttempts => StatusCode::BAD_REQUEST,
                AuthError::MissingToken | AuthError::InvalidToken | AuthError::ExpiredToken => {
                    StatusCode::UNAUTHORIZED
                }
                AuthError::TokenEncoding(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::Checkout(err) => match err {
                CheckoutError::Repository(RepositoryError::NotFound) => StatusCode::NOT_FOUND,
                CheckoutError::Repository(_) => StatusCode::INTERNAL_SERVER_ERROR,
                CheckoutError::InsufficientStock(_) => StatusCode::CONFLICT,
                _ => StatusCode::BAD_REQUEST,
            },
            Self::Transition(err) => match err {
                TransitionError::Repository(_) => StatusCode::INTERNAL_SERVER_ERROR,
                TransitionError::NotFound => StatusCode::NOT_FOUND,
                TransitionError::RequiresAdmin { .. } => StatusCode::FORBIDDEN,
                TransitionError::NotAllowed { .. } => StatusCode::BAD_REQUEST,
            },
            Self::Coupon(err) => match err {
                CouponError::Repository(_) => StatusCode::INTERNAL_SERVER_ERROR,
                CouponError::NotFound => StatusCode::NOT_FOUND,
                _ => StatusCode::BAD_REQUEST,
            },
            Self::Provider(_) => StatusCode::BAD_GATEWAY,
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Client-facing message. Internal details are never exposed.
    fn client_message(&self) -> String {
        match self {
            Self::Database(err) => match err {
                RepositoryError::NotFound => "Not found".to_string(),
                RepositoryError::Conflict(msg) | RepositoryError::Invalid(msg) => msg.clone(),
                _ => "Internal server error".to_string(),
            },
            Self::Auth(err) => match err {
                AuthError::OtpInvalid => "Invalid OTP".to_string(),
                AuthError::OtpExpired => "OTP has expired, request a new one".to_string(),
                AuthError::OtpNotFound => "No OTP pending for this number".to_string(),
                AuthError::OtpTooManyAttempts => {
                    "Too many incorrect attempts, request a new OTP".to_string()
                }
                AuthError::MissingToken | AuthError::InvalidToken => {
                    "Authentication required".to_string()
                }
                AuthError::ExpiredToken => "Session expired, please log in again".to_string(),
                AuthError::TokenEncoding(_) => "Internal server error".to_string(),
            },
            Self::Checkout(err) => match err {
                CheckoutError::Repository(_) => "Internal server error".to_string(),
                _ => err.to_string(),
            },
            Self::Transition(err) => match err {
                TransitionError::Repository(_) => "Internal server error".to_string(),
                _ => err.to_string(),
            },
            Self::Coupon(err) => match err {
                CouponError::Repository(_) => "Internal server error".to_string(),
                _ => err.to_string(),
            },
            Self::Provider(_) => "External service error".to_string(),
            Self::Internal(_) => "Internal server error".to_string(),
            Self::Validation(msg) => msg.clone(),
            _ => self.to_string(),
        }
    }

    /// Whether this error should be reported to Sentry.
    const fn is_server_error(&self) -> bool {
        matches!(
            self,
            Self::Internal(_)
                | Self::Provider(_)
                | Self::Database(RepositoryError::Database(_) | RepositoryError::DataCorruption(_))
        )
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Capture server errors to Sentry
        if self.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        let status = self.status_code();
        let message = self.client_message();

        (status, Json(json!({ "error": message }))).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context from a user ID.
///
/// Call this after successful authentication to associate errors with users.
pub fn set_sentry_user(user_id: &impl ToString, phone: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            username: phone.map(String::from),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
///
/// Call this on logout to stop associating errors with the user.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_error_display() {
        let err = AppError::NotFound("product-123".to_string());
        assert_eq!(err.to_string(), "Not found: product-123");

        let err = AppError::Validation("quantity must be positive".to_string());
        assert_eq!(err.to_string(), "Validation error: quantity must be positive");
    }

    #[test]
    fn test_app_error_status_codes() {
        assert_eq!(
            AppError::NotFound("test".to_string()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::Unauthorized("test".to_string()).status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AppError::Forbidden("test".to_string()).status_code(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            AppError::Validation("test".to_string()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::Internal("test".to_string()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_repository_not_found_maps_to_404() {
        let err = AppError::Database(RepositoryError::NotFound);
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_internal_details_not_exposed() {
        let err = AppError::Internal("connection pool exhausted".to_string());
        assert_eq!(err.client_message(), "Internal server error");
    }

    #[test]
    fn test_transition_forbidden_maps_to_403() {
        use medbasket_core::OrderItemStatus;
        let err = AppError::Transition(TransitionError::RequiresAdmin {
            from: OrderItemStatus::Pending,
            to: OrderItemStatus::Shipped,
        });
        assert_eq!(err.status_code(), StatusCode::FORBIDDEN);
    }
}
