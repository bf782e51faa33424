use crate::normalize::NormalizeError;
use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use serde_json::json;
use thiserror::Error;

/// Every failure a `/predict` caller can observe. Class-mapping failures never
/// appear here: they degrade to raw labels instead.
#[derive(Debug, Error)]
pub enum ClassifyError {
    #[error("No file uploaded")]
    MissingFile,
    #[error("No selected file")]
    EmptyFilename,
    #[error("Uploaded file is empty")]
    EmptyFile,
    #[error("Uploaded file exceeds {limit} bytes")]
    PayloadTooLarge { limit: usize },
    #[error("Invalid upload: {0}")]
    BadUpload(String),
    #[error("Inference request failed: {0}")]
    InferenceFailed(#[from] reqwest::Error),
    #[error("Failed to normalize inference response: {0}")]
    Normalization(#[from] NormalizeError),
    #[error("Storage failed: {0}")]
    StorageFailed(#[from] object_store::Error),
}

impl ClassifyError {
    pub fn kind(&self) -> &'static str {
        match self {
            ClassifyError::MissingFile
            | ClassifyError::EmptyFilename
            | ClassifyError::EmptyFile
            | ClassifyError::PayloadTooLarge { .. }
            | ClassifyError::BadUpload(_) => "invalid_upload",
            ClassifyError::InferenceFailed(_) => "inference_failed",
            ClassifyError::Normalization(_) => "normalization_failed",
            ClassifyError::StorageFailed(_) => "storage_failed",
        }
    }
}

impl ResponseError for ClassifyError {
    fn status_code(&self) -> StatusCode {
        match self {
            ClassifyError::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            ClassifyError::MissingFile
            | ClassifyError::EmptyFilename
            | ClassifyError::EmptyFile
            | ClassifyError::BadUpload(_) => StatusCode::BAD_REQUEST,
            ClassifyError::InferenceFailed(_) => StatusCode::BAD_GATEWAY,
            ClassifyError::Normalization(_) | ClassifyError::StorageFailed(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(json!({
            "error": self.to_string(),
            "kind": self.kind(),
        }))
    }
}
