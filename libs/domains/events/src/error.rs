//! Event domain error types

use axum::response::{IntoResponse, Response};
use axum_helpers::AppError;
use thiserror::Error;

pub type EventResult<T> = Result<T, EventError>;

/// Event domain errors.
///
/// A duplicate submission is not an error; see
/// [`SubmissionOutcome::AlreadyExists`](crate::models::SubmissionOutcome).
#[derive(Debug, Error)]
pub enum EventError {
    /// Caller input rejected; the message is shown to the client as-is
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    NotFound(String),

    /// Event lookup service unreachable or answered with garbage
    #[error("Event lookup failed: {0}")]
    Upstream(String),

    #[error("Event store error: {0}")]
    Store(String),
}

impl EventError {
    pub fn event_not_found() -> Self {
        Self::NotFound("Event not found".to_string())
    }
}

impl From<mongodb::error::Error> for EventError {
    fn from(err: mongodb::error::Error) -> Self {
        Self::Store(err.to_string())
    }
}

impl From<mongodb::bson::ser::Error> for EventError {
    fn from(err: mongodb::bson::ser::Error) -> Self {
        Self::Store(format!("BSON serialization error: {}", err))
    }
}

impl From<mongodb::bson::de::Error> for EventError {
    fn from(err: mongodb::bson::de::Error) -> Self {
        Self::Store(format!("BSON deserialization error: {}", err))
    }
}

impl From<reqwest::Error> for EventError {
    fn from(err: reqwest::Error) -> Self {
        Self::Upstream(err.to_string())
    }
}

/// Server-side causes reach the log through `AppError`, never the client.
impl From<EventError> for AppError {
    fn from(err: EventError) -> Self {
        match err {
            EventError::Validation(msg) => AppError::BadRequest(msg),
            EventError::NotFound(msg) => AppError::NotFound(msg),
            err @ (EventError::Upstream(_) | EventError::Store(_)) => {
                AppError::InternalServerError(err.to_string())
            }
        }
    }
}

impl IntoResponse for EventError {
    fn into_response(self) -> Response {
        let app_error: AppError = self.into();
        app_error.into_response()
    }
}
