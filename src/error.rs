use std::path::PathBuf;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

use crate::storage::AssetClass;

/// Application error taxonomy. Every failure in the ingestion pipeline and
/// around it surfaces as one of these, mapped to an HTTP status at the
/// boundary. No variant is ever silently swallowed.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    /// Remote object store rejected or was unreachable. Carries the asset
    /// class and the staged local path so the orchestrator can decide cleanup.
    #[error("upload of {class} from {path:?} failed: {source}")]
    Upload {
        class: AssetClass,
        path: PathBuf,
        #[source]
        source: anyhow::Error,
    },

    #[error("storage operation failed: {0}")]
    Persistence(#[from] sqlx::Error),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Upload { .. } | AppError::Persistence(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = if status.is_server_error() {
            error!(error = %self, "request failed");
            // Details stay in the log; the client gets a generic message.
            match &self {
                AppError::Upload { .. } => "Error while uploading files".to_string(),
                AppError::Persistence(_) => "Storage error".to_string(),
                _ => "Internal server error".to_string(),
            }
        } else {
            self.to_string()
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statuses_match_taxonomy() {
        assert_eq!(
            AppError::Validation("x".into()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::Unauthorized("x".into()).status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AppError::Forbidden("x".into()).status(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(AppError::NotFound("x".into()).status(), StatusCode::NOT_FOUND);
        assert_eq!(AppError::Conflict("x".into()).status(), StatusCode::CONFLICT);
        let upload = AppError::Upload {
            class: AssetClass::CoverImage,
            path: PathBuf::from("/tmp/x"),
            source: anyhow::anyhow!("boom"),
        };
        assert_eq!(upload.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn upload_error_names_class_and_path() {
        let err = AppError::Upload {
            class: AssetClass::Document,
            path: PathBuf::from("/tmp/staged.bin"),
            source: anyhow::anyhow!("connection refused"),
        };
        let msg = err.to_string();
        assert!(msg.contains("document"));
        assert!(msg.contains("staged.bin"));
    }
}
