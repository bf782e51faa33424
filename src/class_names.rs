use serde::Serialize;
use serde_json::Value;
use std::path::Path;
use thiserror::Error;
use tokio::sync::OnceCell;

#[derive(Debug, Error)]
pub enum MappingError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("unexpected status code {0}")]
    Status(reqwest::StatusCode),
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("expected a list of class names, found {0}")]
    NotAList(&'static str),
}

/// Class names indexed by the integer class id the model emits.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ClassMapping(Vec<String>);

impl ClassMapping {
    pub fn new(names: Vec<String>) -> Self {
        ClassMapping(names)
    }

    /// Builds a mapping from a fetched document. An object carrying `grouping_key`
    /// is unwrapped to that key's value first; anything else is used as-is.
    pub fn from_document(
        document: Value,
        grouping_key: Option<&str>,
    ) -> Result<Self, MappingError> {
        let effective = match document {
            Value::Object(mut map) => match grouping_key.and_then(|key| map.remove(key)) {
                Some(inner) => inner,
                None => Value::Object(map),
            },
            other => other,
        };
        match effective {
            Value::Array(items) => Ok(ClassMapping(
                items
                    .into_iter()
                    .map(|item| match item {
                        Value::String(name) => name,
                        other => other.to_string(),
                    })
                    .collect(),
            )),
            other => Err(MappingError::NotAList(json_kind(&other))),
        }
    }

    pub fn from_path(path: &Path, grouping_key: Option<&str>) -> Result<Self, MappingError> {
        let raw = std::fs::read(path)?;
        Self::from_document(serde_json::from_slice(&raw)?, grouping_key)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.0.get(index).map(String::as_str)
    }

    pub fn names(&self) -> &[String] {
        &self.0
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[derive(Debug, Clone)]
struct RemoteSource {
    client: reqwest::Client,
    url: String,
    grouping_key: Option<String>,
}

/// Lazily loaded, process-wide class mapping.
///
/// The first `get_mapping` call fetches the document; concurrent first callers wait
/// on the same fetch. Failures are logged and cached as an empty mapping, which
/// turns index resolution off for the rest of the process.
#[derive(Debug)]
pub struct ClassNameCache {
    source: Option<RemoteSource>,
    mapping: OnceCell<ClassMapping>,
}

impl ClassNameCache {
    pub fn remote(
        client: reqwest::Client,
        url: impl Into<String>,
        grouping_key: Option<String>,
    ) -> Self {
        ClassNameCache {
            source: Some(RemoteSource {
                client,
                url: url.into(),
                grouping_key,
            }),
            mapping: OnceCell::new(),
        }
    }

    pub fn fixed(mapping: ClassMapping) -> Self {
        ClassNameCache {
            source: None,
            mapping: OnceCell::new_with(Some(mapping)),
        }
    }

    pub fn disabled() -> Self {
        Self::fixed(ClassMapping::default())
    }

    pub async fn get_mapping(&self) -> &ClassMapping {
        self.mapping.get_or_init(|| self.load()).await
    }

    async fn load(&self) -> ClassMapping {
        let Some(source) = &self.source else {
            return ClassMapping::default();
        };
        match fetch_mapping(source).await {
            Ok(mapping) => {
                log::info!("Loaded {} class names from {}", mapping.len(), source.url);
                mapping
            }
            Err(e) => {
                log::warn!(
                    "Failed to load class names from {}, labels will not be resolved: {}",
                    source.url,
                    e
                );
                ClassMapping::default()
            }
        }
    }
}

async fn fetch_mapping(source: &RemoteSource) -> Result<ClassMapping, MappingError> {
    let response = source.client.get(&source.url).send().await?;
    let status = response.status();
    if !status.is_success() {
        return Err(MappingError::Status(status));
    }
    let document = response.json::<Value>().await?;
    ClassMapping::from_document(document, source.grouping_key.as_deref())
}
