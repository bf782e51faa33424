use crate::class_names::{ClassMapping, ClassNameCache};
use crate::io_struct::{InferenceResult, UNKNOWN_LABEL};
use serde_json::{Map, Value};
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum NormalizeError {
    #[error("class index {index} is out of range for {len} known class names")]
    IndexOutOfRange { index: String, len: usize },
}

/// Layout of the upstream response body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseShape {
    /// `{"<label>": .., "<confidence>": ..}`
    Named,
    /// `{"<data>": [label, confidence]}` or `{"<data>": [[label, confidence]]}`
    Positional,
    /// Named first, then positional.
    Auto,
}

/// Label fields tried after the configured one, for the hosted flower models.
const FALLBACK_LABEL_FIELDS: &[&str] = &["flowerName"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShapeFields {
    pub label: String,
    pub confidence: String,
    pub data: String,
}

impl Default for ShapeFields {
    fn default() -> Self {
        ShapeFields {
            label: "label".to_string(),
            confidence: "confidence".to_string(),
            data: "data".to_string(),
        }
    }
}

#[derive(Debug, Default, PartialEq)]
struct RawPrediction {
    label: Option<String>,
    confidence: Option<f64>,
}

/// Reduces upstream responses to an [`InferenceResult`], resolving class indices
/// through the injected [`ClassNameCache`].
#[derive(Debug, Clone)]
pub struct ResponseNormalizer {
    shape: ResponseShape,
    fields: ShapeFields,
    class_names: Arc<ClassNameCache>,
}

impl ResponseNormalizer {
    pub fn new(
        shape: ResponseShape,
        fields: ShapeFields,
        class_names: Arc<ClassNameCache>,
    ) -> Self {
        ResponseNormalizer {
            shape,
            fields,
            class_names,
        }
    }

    pub fn class_names(&self) -> &ClassNameCache {
        &self.class_names
    }

    pub async fn normalize(&self, response: &Value) -> Result<InferenceResult, NormalizeError> {
        let raw = self.extract(response).unwrap_or_else(|| {
            log::warn!(
                "Upstream response does not match the {:?} shape: {}",
                self.shape,
                response
            );
            RawPrediction::default()
        });
        let label = raw.label.unwrap_or_else(|| UNKNOWN_LABEL.to_string());
        let confidence = clamp_confidence(raw.confidence.unwrap_or(0.0));
        let mapping = self.class_names.get_mapping().await;
        let label = resolve_label(label, mapping)?;
        Ok(InferenceResult { label, confidence })
    }

    fn extract(&self, response: &Value) -> Option<RawPrediction> {
        match self.shape {
            ResponseShape::Named => self.extract_named(response),
            ResponseShape::Positional => self.extract_positional(response),
            ResponseShape::Auto => self
                .extract_named(response)
                .or_else(|| self.extract_positional(response)),
        }
    }

    fn extract_named(&self, response: &Value) -> Option<RawPrediction> {
        let object = response.as_object()?;
        let label = object.get(&self.fields.label).or_else(|| {
            FALLBACK_LABEL_FIELDS
                .iter()
                .find_map(|field| object.get(*field))
        });
        let confidence = object.get(&self.fields.confidence);
        if label.is_none() && confidence.is_none() {
            return None;
        }
        Some(RawPrediction {
            label: label.and_then(label_text),
            confidence: confidence.and_then(confidence_value),
        })
    }

    fn extract_positional(&self, response: &Value) -> Option<RawPrediction> {
        let outer = response.get(&self.fields.data)?.as_array()?;
        let entries = match outer.first() {
            Some(Value::Array(inner)) => inner.as_slice(),
            _ => outer.as_slice(),
        };
        match entries.first() {
            Some(Value::Object(label_output)) => Some(label_component(label_output)),
            first => Some(RawPrediction {
                label: first.and_then(label_text),
                confidence: entries.get(1).and_then(confidence_value),
            }),
        }
    }
}

/// Gradio `Label` output: `{"label": .., "confidences": [{"label": .., "confidence": ..}]}`.
fn label_component(output: &Map<String, Value>) -> RawPrediction {
    let label = output.get("label").and_then(label_text);
    let confidence = output.get("confidence").and_then(confidence_value).or_else(|| {
        let confidences = output.get("confidences")?.as_array()?;
        let top = confidences
            .iter()
            .find(|c| c.get("label").and_then(label_text) == label)
            .or_else(|| confidences.first())?;
        top.get("confidence").and_then(confidence_value)
    });
    RawPrediction { label, confidence }
}

fn label_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn confidence_value(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn clamp_confidence(confidence: f64) -> f64 {
    let clamped = if confidence.is_nan() {
        0.0
    } else {
        confidence.clamp(0.0, 1.0)
    };
    if clamped != confidence {
        log::warn!(
            "Upstream confidence {} is outside [0, 1], reporting {}",
            confidence,
            clamped
        );
    }
    clamped
}

/// Replaces an all-digit label with its class name. Labels pass through untouched
/// when they are not numeric or when no mapping is available.
pub fn resolve_label(label: String, mapping: &ClassMapping) -> Result<String, NormalizeError> {
    if mapping.is_empty() || label.is_empty() || !label.bytes().all(|b| b.is_ascii_digit()) {
        return Ok(label);
    }
    let out_of_range = || NormalizeError::IndexOutOfRange {
        index: label.clone(),
        len: mapping.len(),
    };
    let index = label.parse::<usize>().map_err(|_| out_of_range())?;
    mapping
        .get(index)
        .map(str::to_string)
        .ok_or_else(out_of_range)
}
