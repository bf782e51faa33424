use crate::error::ClassifyError;
use crate::io_struct::{Base64PredictRequest, UploadedImage};
use reqwest::multipart::{Form, Part};
use serde_json::Value;

/// How an image is encoded for the upstream endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestFormat {
    /// `multipart/form-data` with a single `file` part.
    Multipart,
    /// `{"data": ["data:<mime>;base64,.."], "fn_index": n}`
    Base64Json { fn_index: Option<u32> },
}

#[derive(Debug, Clone)]
pub struct InferenceClient {
    client: reqwest::Client,
    url: String,
    format: RequestFormat,
}

impl InferenceClient {
    pub fn new(client: reqwest::Client, url: impl Into<String>, format: RequestFormat) -> Self {
        InferenceClient {
            client,
            url: url.into(),
            format,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Sends one image upstream and returns the decoded JSON body. Never retried.
    pub async fn predict(&self, image: &UploadedImage) -> Result<Value, ClassifyError> {
        let request = match self.format {
            RequestFormat::Multipart => {
                let part = Part::bytes(image.bytes.to_vec())
                    .file_name(image.filename.clone())
                    .mime_str(image.mime())?;
                self.client
                    .post(&self.url)
                    .multipart(Form::new().part("file", part))
            }
            RequestFormat::Base64Json { fn_index } => {
                let body = Base64PredictRequest {
                    data: vec![image.data_uri()],
                    fn_index,
                };
                self.client.post(&self.url).json(&body)
            }
        };
        let response = request.send().await?.error_for_status()?;
        Ok(response.json::<Value>().await?)
    }
}
