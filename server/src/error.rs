//! Request-level errors and their envelope responses.
//!
//! A missing todo is an expected outcome: the service returns `None` and
//! the handler turns that into `AppError::NotFound`. Storage failures are
//! logged here and reach the client only as a generic 500.

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use todo_core::Envelope;
use validator::ValidationErrors;

use crate::store::StoreError;

pub const INTERNAL_ERROR_MESSAGE: &str = "Internal server error";

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Malformed or invalid input, rejected before the service is called.
    #[error("{0}")]
    Validation(String),

    #[error("Todo not found with id: {0}")]
    NotFound(i64),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            AppError::Store(err) => {
                tracing::error!(error = %err, "store operation failed");
                INTERNAL_ERROR_MESSAGE.to_string()
            }
            other => {
                tracing::debug!(status = status.as_u16(), error = %other, "request rejected");
                other.to_string()
            }
        };
        (status, Json(Envelope::<()>::error(status.as_u16(), message))).into_response()
    }
}

impl From<ValidationErrors> for AppError {
    fn from(errors: ValidationErrors) -> Self {
        let mut messages: Vec<String> = errors
            .field_errors()
            .into_iter()
            .flat_map(|(field, errors)| {
                errors.iter().map(move |error| match &error.message {
                    Some(message) => message.to_string(),
                    None => format!("{field}: {}", error.code),
                })
            })
            .collect();
        messages.sort();
        AppError::Validation(messages.join("; "))
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use todo_core::CreateTodo;
    use validator::Validate;

    #[test]
    fn statuses_follow_error_kind() {
        assert_eq!(AppError::Validation("x".into()).status(), StatusCode::BAD_REQUEST);
        assert_eq!(AppError::NotFound(1).status(), StatusCode::NOT_FOUND);
        let store = AppError::Store(StoreError::Sqlite(rusqlite::Error::QueryReturnedNoRows));
        assert_eq!(store.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn not_found_message_names_the_id() {
        assert_eq!(AppError::NotFound(12).to_string(), "Todo not found with id: 12");
    }

    #[test]
    fn validation_errors_use_field_messages() {
        let errors = CreateTodo::new(" ").validate().unwrap_err();
        let err = AppError::from(errors);
        assert_eq!(err.to_string(), "title must not be blank");
    }
}
