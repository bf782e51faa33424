use base64::{Engine, engine::general_purpose};
use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// Label reported when the upstream response carries no usable label.
pub const UNKNOWN_LABEL: &str = "Unknown";

pub const DEFAULT_IMAGE_MIME: &str = "image/jpeg";

/// An image received from the client, owned by the request that carried it.
#[derive(Debug, Clone)]
pub struct UploadedImage {
    pub filename: String,
    pub content_type: Option<String>,
    pub bytes: Bytes,
}

impl UploadedImage {
    pub fn new(filename: impl Into<String>, content_type: Option<String>, bytes: Bytes) -> Self {
        UploadedImage {
            filename: filename.into(),
            content_type,
            bytes,
        }
    }

    pub fn mime(&self) -> &str {
        self.content_type
            .as_deref()
            .filter(|m| !m.is_empty() && *m != "application/octet-stream")
            .unwrap_or(DEFAULT_IMAGE_MIME)
    }

    /// `data:<mime>;base64,<payload>`, as expected by Gradio-style JSON endpoints.
    pub fn data_uri(&self) -> String {
        format!(
            "data:{};base64,{}",
            self.mime(),
            general_purpose::STANDARD.encode(&self.bytes)
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InferenceResult {
    pub label: String,
    pub confidence: f64,
}

impl InferenceResult {
    pub fn new(label: impl Into<String>, confidence: f64) -> Self {
        InferenceResult {
            label: label.into(),
            confidence,
        }
    }
}

/// Body sent to upstream endpoints that take a base64 data URI instead of a file part.
#[derive(Debug, Serialize, Deserialize)]
pub struct Base64PredictRequest {
    pub data: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fn_index: Option<u32>,
}

/// Result record written next to the stored image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredRecord {
    pub filename: String,
    pub label: String,
    pub confidence: f64,
    pub timestamp: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredObjects {
    pub image_key: String,
    pub record_key: String,
    pub record: StoredRecord,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifyOutcome {
    pub filename: String,
    pub label: String,
    pub confidence: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stored: Option<StoredObjects>,
}
