use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::batch::BatchError;
use crate::ranking::RankingError;
use crate::repository::RepositoryError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Unprocessable entity: {0}")]
    UnprocessableEntity(String),

    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<RankingError> for AppError {
    fn from(error: RankingError) -> Self {
        match error {
            RankingError::JobNotFound(_) | RankingError::CandidateNotFound(_) => {
                AppError::NotFound(error.to_string())
            }
            RankingError::CandidateNotEvaluable(_) => {
                AppError::UnprocessableEntity(error.to_string())
            }
            RankingError::Repository(e) => AppError::Repository(e),
        }
    }
}

impl From<BatchError> for AppError {
    fn from(error: BatchError) -> Self {
        match error {
            BatchError::InvalidConcurrency(_)
            | BatchError::DirectoryNotFound(_)
            | BatchError::OutsideIntakeDir(_)
            | BatchError::NoCvFiles(_) => AppError::Validation(error.to_string()),
            BatchError::ReadDirectory { .. } | BatchError::IntakeDirUnavailable { .. } => {
                AppError::Internal(anyhow::Error::new(error))
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::UnprocessableEntity(msg) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "UNPROCESSABLE_ENTITY",
                msg.clone(),
            ),
            AppError::Repository(e) => {
                tracing::error!("Repository error: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "DATABASE_ERROR",
                    "A database error occurred".to_string(),
                )
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_ranking_errors_map_to_http_statuses() {
        let not_found = AppError::from(RankingError::JobNotFound(Uuid::new_v4()));
        assert_eq!(not_found.into_response().status(), StatusCode::NOT_FOUND);

        let not_evaluable = AppError::from(RankingError::CandidateNotEvaluable(Uuid::new_v4()));
        assert_eq!(
            not_evaluable.into_response().status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
    }

    #[test]
    fn test_batch_input_errors_are_validation_errors() {
        let error = AppError::from(BatchError::InvalidConcurrency(0));
        assert_eq!(error.into_response().status(), StatusCode::BAD_REQUEST);
        let error = AppError::from(BatchError::OutsideIntakeDir("/etc".into()));
        assert_eq!(error.into_response().status(), StatusCode::BAD_REQUEST);
    }
}
