use crate::class_names::{ClassMapping, ClassNameCache};
use crate::error::ClassifyError;
use crate::io_struct::{ClassifyOutcome, UploadedImage};
use crate::normalize::{ResponseNormalizer, ResponseShape, ShapeFields};
use crate::storage::ResultStore;
use crate::upstream::{InferenceClient, RequestFormat};
use anyhow::Context;
use std::path::PathBuf;
use std::sync::Arc;

pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 16 * 1024 * 1024;

#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub bucket: String,
    pub region: String,
    pub prefix: String,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub inference_url: String,
    pub request_format: String,
    pub fn_index: Option<u32>,
    pub response_shape: String,
    pub label_field: String,
    pub confidence_field: String,
    pub data_field: String,
    pub class_names_url: Option<String>,
    pub class_names_file: Option<PathBuf>,
    pub class_names_key: Option<String>,
    pub storage: Option<StorageConfig>,
    pub timeout: Option<u64>,
    pub max_upload_bytes: usize,
    pub log_level: String,
}

impl AppConfig {
    pub fn new(inference_url: impl Into<String>) -> Self {
        let fields = ShapeFields::default();
        AppConfig {
            host: "0.0.0.0".to_string(),
            port: 5000,
            inference_url: inference_url.into(),
            request_format: "multipart".to_string(),
            fn_index: None,
            response_shape: "auto".to_string(),
            label_field: fields.label,
            confidence_field: fields.confidence,
            data_field: fields.data,
            class_names_url: None,
            class_names_file: None,
            class_names_key: None,
            storage: None,
            timeout: None,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            log_level: "info".to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppState {
    pub inference: InferenceClient,
    pub normalizer: ResponseNormalizer,
    pub storage: Option<ResultStore>,
    pub max_upload_bytes: usize,
}

impl AppState {
    pub fn new(config: AppConfig) -> anyhow::Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(std::time::Duration::from_secs(timeout));
        }
        let client = builder.build()?;

        let format = match config.request_format.as_str() {
            "multipart" => RequestFormat::Multipart,
            "base64" => RequestFormat::Base64Json {
                fn_index: config.fn_index,
            },
            other => anyhow::bail!("Invalid request format: {}", other),
        };
        let shape = match config.response_shape.as_str() {
            "named" => ResponseShape::Named,
            "positional" => ResponseShape::Positional,
            "auto" => ResponseShape::Auto,
            other => anyhow::bail!("Invalid response shape: {}", other),
        };

        let class_names = match (&config.class_names_file, &config.class_names_url) {
            (Some(path), _) => {
                let mapping = ClassMapping::from_path(path, config.class_names_key.as_deref())
                    .with_context(|| {
                        format!("Failed to read class names from {}", path.display())
                    })?;
                ClassNameCache::fixed(mapping)
            }
            (None, Some(url)) => {
                ClassNameCache::remote(client.clone(), url, config.class_names_key)
            }
            (None, None) => ClassNameCache::disabled(),
        };
        let fields = ShapeFields {
            label: config.label_field,
            confidence: config.confidence_field,
            data: config.data_field,
        };
        let storage = config
            .storage
            .map(|s| ResultStore::s3(&s.bucket, &s.region, &s.prefix))
            .transpose()?;

        Ok(Self {
            inference: InferenceClient::new(client, config.inference_url, format),
            normalizer: ResponseNormalizer::new(shape, fields, Arc::new(class_names)),
            storage,
            max_upload_bytes: config.max_upload_bytes,
        })
    }

    /// Upstream call, normalization, then the optional storage side channel.
    pub async fn classify(&self, image: UploadedImage) -> Result<ClassifyOutcome, ClassifyError> {
        if image.filename.is_empty() {
            return Err(ClassifyError::EmptyFilename);
        }
        if image.bytes.is_empty() {
            return Err(ClassifyError::EmptyFile);
        }

        let response = self.inference.predict(&image).await.inspect_err(|e| {
            log::error!("Inference request to {} failed: {}", self.inference.url(), e);
        })?;
        log::debug!("Upstream response for {}: {}", image.filename, response);

        let result = self.normalizer.normalize(&response).await.inspect_err(|e| {
            log::error!("Failed to normalize response for {}: {}", image.filename, e);
        })?;
        log::info!(
            "Classified {} as {} ({:.3})",
            image.filename,
            result.label,
            result.confidence
        );

        let stored = match &self.storage {
            Some(store) => Some(store.persist(&image, &result).await.inspect_err(|e| {
                log::error!("Failed to store {}: {}", image.filename, e);
            })?),
            None => None,
        };

        Ok(ClassifyOutcome {
            filename: image.filename,
            label: result.label,
            confidence: result.confidence,
            stored,
        })
    }
}
