//! `VisionModel` trait and the Gemini `generateContent` client.
//!
//! [`GeminiClient`] posts a text part plus an inline image part to
//! `{base_url}/v1beta/models/{model}:generateContent` and concatenates the
//! text parts of the first candidate.  Connection details come from
//! [`DescriberConfig`]; the key comes from an explicit [`ApiKey`].

use async_trait::async_trait;
use thiserror::Error;

use super::credential::ApiKey;
use super::input::ImageInput;
use crate::config::DescriberConfig;

// ---------------------------------------------------------------------------
// ModelError
// ---------------------------------------------------------------------------

/// Errors from the remote vision-language model.
#[derive(Debug, Error)]
pub enum ModelError {
    /// HTTP transport or connection error.
    #[error("HTTP request failed: {0}")]
    Request(String),

    /// The request did not complete within the configured timeout.
    #[error("model request timed out")]
    Timeout,

    /// The service answered with a non-success status.
    #[error("model returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// The response body was not the expected JSON.
    #[error("failed to parse model response: {0}")]
    Parse(String),

    /// The response carried no text.
    #[error("no response generated")]
    EmptyResponse,
}

impl From<reqwest::Error> for ModelError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            ModelError::Timeout
        } else {
            ModelError::Request(e.to_string())
        }
    }
}

// ---------------------------------------------------------------------------
// VisionModel trait
// ---------------------------------------------------------------------------

/// A remote model that answers a text prompt about an image.
///
/// Implementors must be `Send + Sync` so they can be held behind an
/// `Arc<dyn VisionModel>`.
#[async_trait]
pub trait VisionModel: Send + Sync {
    async fn describe(&self, prompt: &str, image: &ImageInput) -> Result<String, ModelError>;
}

// ---------------------------------------------------------------------------
// GeminiClient
// ---------------------------------------------------------------------------

/// Calls the Gemini `generateContent` endpoint.
pub struct GeminiClient {
    client: reqwest::Client,
    base_url: String,
    model: String,
    api_key: ApiKey,
}

impl GeminiClient {
    /// Build a client from describer settings and an API key.
    ///
    /// The HTTP client carries the timeout from `config.timeout_secs`.  A
    /// default client is used if the builder fails.
    pub fn new(config: &DescriberConfig, api_key: ApiKey) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            api_key,
        }
    }

    /// Full `generateContent` URL for the configured model.
    pub fn endpoint(&self) -> String {
        let model = self.model.strip_prefix("models/").unwrap_or(&self.model);
        format!("{}/v1beta/models/{}:generateContent", self.base_url, model)
    }
}

/// Request body with one text part and one inline image part.
pub fn request_body(prompt: &str, image: &ImageInput) -> serde_json::Value {
    serde_json::json!({
        "contents": [{
            "parts": [
                { "text": prompt },
                {
                    "inline_data": {
                        "mime_type": image.mime_type(),
                        "data":      image.to_base64()
                    }
                }
            ]
        }]
    })
}

/// Concatenate every text part of the first candidate.
pub fn extract_text(json: &serde_json::Value) -> Result<String, ModelError> {
    let parts = json["candidates"][0]["content"]["parts"]
        .as_array()
        .ok_or(ModelError::EmptyResponse)?;

    let text: String = parts
        .iter()
        .filter_map(|part| part["text"].as_str())
        .collect();

    if text.trim().is_empty() {
        return Err(ModelError::EmptyResponse);
    }
    Ok(text)
}

#[async_trait]
impl VisionModel for GeminiClient {
    async fn describe(&self, prompt: &str, image: &ImageInput) -> Result<String, ModelError> {
        let url = self.endpoint();
        log::debug!("POST {url} (image {} bytes)", image.bytes().len());

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", self.api_key.expose())
            .json(&request_body(prompt, image))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ModelError::Status {
                status: status.as_u16(),
                body: body.trim().to_string(),
            });
        }

        let json: serde_json::Value = response
            .json()
            .await
            .map_err(|e| ModelError::Parse(e.to_string()))?;

        extract_text(&json)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
