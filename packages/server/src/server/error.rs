//! Mapping of pipeline errors onto HTTP responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::error;

use crate::common::PipelineError;

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: &'static str,
    pub message: String,
}

/// Handler error: a `PipelineError` rendered as `{error, message}`.
#[derive(Debug)]
pub struct ApiError(pub PipelineError);

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            PipelineError::Validation(_) | PipelineError::PermanentSource(_) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            PipelineError::Conflict(_) | PipelineError::DuplicateIdentity { .. } => {
                StatusCode::CONFLICT
            }
            PipelineError::NotFound { .. } => StatusCode::NOT_FOUND,
            PipelineError::TransientNetwork(_) => StatusCode::SERVICE_UNAVAILABLE,
            PipelineError::IngestionTransaction(_)
            | PipelineError::Database(_)
            | PipelineError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl<E> From<E> for ApiError
where
    E: Into<PipelineError>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(kind = self.0.kind(), error = %self.0, "Request failed");
        }

        let body = ErrorBody {
            error: self.0.kind(),
            message: self.0.to_string(),
        };
        (status, Json(body)).into_response()
    }
}
