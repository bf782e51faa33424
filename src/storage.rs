use crate::error::ClassifyError;
use crate::io_struct::{InferenceResult, StoredObjects, StoredRecord, UploadedImage};
use chrono::{SecondsFormat, Utc};
use object_store::aws::AmazonS3Builder;
use object_store::path::Path;
use object_store::{ObjectStore, PutPayload};
use std::sync::Arc;

/// Mirrors uploads and their classification into an object store.
#[derive(Debug, Clone)]
pub struct ResultStore {
    store: Arc<dyn ObjectStore>,
    prefix: String,
}

impl ResultStore {
    pub fn new(store: Arc<dyn ObjectStore>, prefix: &str) -> Self {
        ResultStore {
            store,
            prefix: prefix.trim_matches('/').to_string(),
        }
    }

    /// S3 bucket in `region`; credentials come from the usual AWS environment variables.
    pub fn s3(bucket: &str, region: &str, prefix: &str) -> anyhow::Result<Self> {
        let s3 = AmazonS3Builder::from_env()
            .with_bucket_name(bucket)
            .with_region(region)
            .build()?;
        Ok(Self::new(Arc::new(s3), prefix))
    }

    pub async fn persist(
        &self,
        image: &UploadedImage,
        result: &InferenceResult,
    ) -> Result<StoredObjects, ClassifyError> {
        let now = Utc::now();
        let stem = format!(
            "{}-{:08x}-{}",
            now.format("%Y%m%dT%H%M%S%.3fZ"),
            rand::random::<u32>(),
            sanitize_filename(&image.filename)
        );
        let image_key = self.key("images", &stem);
        let record_key = self.key("results", &format!("{stem}.json"));
        let record = StoredRecord {
            filename: image.filename.clone(),
            label: result.label.clone(),
            confidence: result.confidence,
            timestamp: now.to_rfc3339_opts(SecondsFormat::Secs, true),
        };
        let body = serde_json::to_vec(&record).map_err(|e| object_store::Error::Generic {
            store: "ResultStore",
            source: Box::new(e),
        })?;

        self.store
            .put(&image_key, PutPayload::from_bytes(image.bytes.clone()))
            .await?;
        self.store.put(&record_key, PutPayload::from(body)).await?;
        log::debug!("Stored {} and {}", image_key, record_key);

        Ok(StoredObjects {
            image_key: image_key.to_string(),
            record_key: record_key.to_string(),
            record,
        })
    }

    fn key(&self, kind: &str, name: &str) -> Path {
        if self.prefix.is_empty() {
            Path::from(format!("{kind}/{name}"))
        } else {
            Path::from(format!("{}/{kind}/{name}", self.prefix))
        }
    }
}

/// Reduces a client-supplied filename to one safe path segment.
fn sanitize_filename(filename: &str) -> String {
    let base = filename.rsplit(['/', '\\']).next().unwrap_or_default();
    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let cleaned = cleaned.trim_start_matches('.');
    if cleaned.is_empty() {
        "upload".to_string()
    } else {
        cleaned.to_string()
    }
}
