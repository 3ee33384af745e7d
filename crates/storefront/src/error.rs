//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures errors to Sentry before
//! responding to the client. All route handlers should return `Result<T, AppError>`.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use shophub_core::{RepositoryError, WorkflowError};
use thiserror::Error;

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum AppError {
    /// A workflow service rejected or failed the request.
    #[error(transparent)]
    Workflow(#[from] WorkflowError),

    /// Session store read or write failed.
    #[error("Session error: {0}")]
    Session(#[from] tower_sessions::session::Error),

    /// User is not authenticated.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),
}

impl AppError {
    /// HTTP status for this error.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Workflow(err) => workflow_status(err),
            Self::Session(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
        }
    }
}

const fn workflow_status(err: &WorkflowError) -> StatusCode {
    match err {
        WorkflowError::Validation(_) => StatusCode::BAD_REQUEST,
        WorkflowError::InvalidCredentials | WorkflowError::AccountDisabled => {
            StatusCode::UNAUTHORIZED
        }
        WorkflowError::Forbidden(_) => StatusCode::FORBIDDEN,
        WorkflowError::NotFound(_) | WorkflowError::Repository(RepositoryError::NotFound) => {
            StatusCode::NOT_FOUND
        }
        WorkflowError::Duplicate(_)
        | WorkflowError::InvalidTransition { .. }
        | WorkflowError::Repository(RepositoryError::Conflict(_)) => StatusCode::CONFLICT,
        WorkflowError::Repository(RepositoryError::DataCorruption(_)) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
        WorkflowError::AllocationExhausted { .. } | WorkflowError::Repository(_) => {
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Capture server errors to Sentry
        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        // Don't expose internal error details to clients
        let message = match &self {
            Self::Workflow(WorkflowError::AllocationExhausted { .. }) => {
                "Service busy, please try again".to_string()
            }
            Self::Workflow(WorkflowError::Validation(err)) => err.to_string(),
            Self::Workflow(WorkflowError::Forbidden(reason)) => reason.clone(),
            _ if status.is_server_error() => "Internal server error".to_string(),
            _ => self.to_string(),
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context.
///
/// Call this after successful authentication to associate errors with users.
pub fn set_sentry_user(user_id: &impl ToString, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}

/// Add a breadcrumb for a customer action.
///
/// Breadcrumbs appear in Sentry error reports to show the trail of actions
/// leading up to an error.
pub fn add_breadcrumb(category: &str, message: &str, data: Option<&[(&str, &str)]>) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    if let Some(pairs) = data {
        for (key, value) in pairs {
            breadcrumb.data.insert(
                (*key).to_string(),
                serde_json::Value::String((*value).to_string()),
            );
        }
    }

    sentry::add_breadcrumb(breadcrumb);
}

#[cfg(test)]
mod tests {
    use shophub_core::{OrderStatus, ValidationError};

    use super::*;

    fn get_status(err: AppError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn test_app_error_display() {
        let err = AppError::Unauthorized("sign in required".to_string());
        assert_eq!(err.to_string(), "Unauthorized: sign in required");

        let err = AppError::BadRequest("invalid input".to_string());
        assert_eq!(err.to_string(), "Bad request: invalid input");
    }

    #[test]
    fn test_app_error_status_codes() {
        assert_eq!(
            get_status(AppError::Unauthorized("test".to_string())),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            get_status(AppError::BadRequest("test".to_string())),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn test_workflow_status_codes() {
        let cases = [
            (
                WorkflowError::Validation(ValidationError::EmptyOrder),
                StatusCode::BAD_REQUEST,
            ),
            (WorkflowError::InvalidCredentials, StatusCode::UNAUTHORIZED),
            (WorkflowError::AccountDisabled, StatusCode::UNAUTHORIZED),
            (
                WorkflowError::Forbidden("nope".to_string()),
                StatusCode::FORBIDDEN,
            ),
            (
                WorkflowError::NotFound("order".to_string()),
                StatusCode::NOT_FOUND,
            ),
            (
                WorkflowError::Duplicate("email".to_string()),
                StatusCode::CONFLICT,
            ),
            (
                WorkflowError::InvalidTransition {
                    from: OrderStatus::Delivered,
                    to: OrderStatus::Pending,
                },
                StatusCode::CONFLICT,
            ),
            (
                WorkflowError::AllocationExhausted {
                    sequence: "users".to_string(),
                    attempts: 10,
                },
                StatusCode::SERVICE_UNAVAILABLE,
            ),
            (
                WorkflowError::Repository(RepositoryError::Unavailable("down".to_string())),
                StatusCode::SERVICE_UNAVAILABLE,
            ),
            (
                WorkflowError::Repository(RepositoryError::DataCorruption("bad".to_string())),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, expected) in cases {
            assert_eq!(get_status(AppError::from(err)), expected);
        }
    }
}
