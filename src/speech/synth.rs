//! `Synthesizer` trait and its two backends.
//!
//! * [`GoogleTts`]: Cloud Text-to-Speech `POST /v1/text:synthesize`.
//! * [`ProxyTts`]: a TTS proxy `POST /v1/synthesize` returning raw MP3.
//!
//! Both return MP3 bytes.  Voice, locale and speaking rate come from
//! [`SpeakerConfig`]; credentials come from the environment.

use std::sync::Arc;

use async_trait::async_trait;
use base64::Engine as _;
use thiserror::Error;

use super::text::SynthesisInput;
use crate::config::{SpeakerConfig, TtsBackend};

// ---------------------------------------------------------------------------
// SynthError
// ---------------------------------------------------------------------------

/// Errors from a synthesis backend.
#[derive(Debug, Error)]
pub enum SynthError {
    /// No usable credential could be found.
    #[error("no TTS credential: {0}")]
    Credential(String),

    /// The backend is misconfigured (e.g. proxy selected without a URL).
    #[error("invalid TTS configuration: {0}")]
    Config(String),

    /// HTTP transport or connection error.
    #[error("HTTP request failed: {0}")]
    Request(String),

    /// The request did not complete within the configured timeout.
    #[error("synthesis request timed out")]
    Timeout,

    /// The service answered with a non-success status.
    #[error("TTS service returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// The response body was not the expected shape.
    #[error("failed to parse TTS response: {0}")]
    Parse(String),

    /// The service returned no audio.
    #[error("TTS service returned no audio")]
    EmptyAudio,
}

impl From<reqwest::Error> for SynthError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            SynthError::Timeout
        } else {
            SynthError::Request(e.to_string())
        }
    }
}

// ---------------------------------------------------------------------------
// Synthesizer trait
// ---------------------------------------------------------------------------

/// Turns prepared text into encoded (MP3) audio.
#[async_trait]
pub trait Synthesizer: Send + Sync {
    async fn synthesize(&self, input: &SynthesisInput) -> Result<Vec<u8>, SynthError>;
}

/// Clamp a speaking rate into the range the service accepts.
fn clamp_rate(rate: Option<f32>) -> Option<f32> {
    rate.map(|r| {
        let clamped = r.clamp(0.25, 2.0);
        if clamped != r {
            log::warn!("speaking rate {r} out of range, using {clamped}");
        }
        clamped
    })
}

fn http_client(timeout_secs: u64) -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(timeout_secs))
        .build()
        .unwrap_or_else(|_| reqwest::Client::new())
}

async fn error_status(response: reqwest::Response) -> SynthError {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    SynthError::Status {
        status,
        body: body.trim().to_string(),
    }
}

// ---------------------------------------------------------------------------
// TtsCredential
// ---------------------------------------------------------------------------

/// How requests to Cloud Text-to-Speech are authenticated.
#[derive(Clone, PartialEq, Eq)]
pub enum TtsCredential {
    /// API key sent as the `key` query parameter.
    ApiKey(String),
    /// OAuth access token sent as a bearer token.
    Bearer(String),
}

impl std::fmt::Debug for TtsCredential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ApiKey(_) => f.write_str("ApiKey(***)"),
            Self::Bearer(_) => f.write_str("Bearer(***)"),
        }
    }
}

impl TtsCredential {
    /// Resolve a credential: `GOOGLE_TTS_API_KEY`, then
    /// `GOOGLE_OAUTH_ACCESS_TOKEN`, then application-default credentials
    /// through `gcloud`.
    pub async fn resolve() -> Result<Self, SynthError> {
        if let Some(credential) = Self::from_lookup(|name| std::env::var(name).ok()) {
            return Ok(credential);
        }
        Self::from_gcloud().await
    }

    /// The environment part of [`resolve`](Self::resolve).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Option<Self> {
        let non_empty = |name: &str| lookup(name).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        non_empty("GOOGLE_TTS_API_KEY")
            .map(Self::ApiKey)
            .or_else(|| non_empty("GOOGLE_OAUTH_ACCESS_TOKEN").map(Self::Bearer))
    }

    async fn from_gcloud() -> Result<Self, SynthError> {
        let output = tokio::process::Command::new("gcloud")
            .args(["auth", "application-default", "print-access-token"])
            .output()
            .await
            .map_err(|e| SynthError::Credential(format!("could not run gcloud: {e}")))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(SynthError::Credential(format!(
                "gcloud failed: {}",
                stderr.trim()
            )));
        }

        let token = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if token.is_empty() {
            return Err(SynthError::Credential("gcloud printed an empty token".into()));
        }
        Ok(Self::Bearer(token))
    }
}

// ---------------------------------------------------------------------------
// GoogleTts
// ---------------------------------------------------------------------------

/// Calls Cloud Text-to-Speech directly.
pub struct GoogleTts {
    client: reqwest::Client,
    base_url: String,
    language_code: String,
    voice_name: String,
    speaking_rate: Option<f32>,
    quota_project: Option<String>,
}

impl GoogleTts {
    pub fn from_config(config: &SpeakerConfig) -> Self {
        Self {
            client: http_client(config.timeout_secs),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            language_code: config.language_code.clone(),
            voice_name: config.voice_name.clone(),
            speaking_rate: clamp_rate(config.speaking_rate),
            quota_project: std::env::var("GOOGLE_CLOUD_PROJECT")
                .ok()
                .filter(|p| !p.is_empty()),
        }
    }

    /// JSON body for `text:synthesize`.
    pub fn request_body(&self, input: &SynthesisInput) -> serde_json::Value {
        let input_json = match input {
            SynthesisInput::Text(text) => serde_json::json!({ "text": text }),
            SynthesisInput::Ssml(ssml) => serde_json::json!({ "ssml": ssml }),
        };

        let mut audio_config = serde_json::json!({ "audioEncoding": "MP3" });
        if let Some(rate) = self.speaking_rate {
            audio_config["speakingRate"] = serde_json::json!(rate);
        }

        serde_json::json!({
            "input": input_json,
            "voice": {
                "languageCode": self.language_code,
                "name":         self.voice_name
            },
            "audioConfig": audio_config
        })
    }
}

/// Decode the base64 `audioContent` field of a synthesis response.
pub fn decode_audio_content(json: &serde_json::Value) -> Result<Vec<u8>, SynthError> {
    let encoded = json["audioContent"]
        .as_str()
        .ok_or(SynthError::EmptyAudio)?;

    let bytes = base64::engine::general_purpose::STANDARD
        .decode(encoded)
        .map_err(|e| SynthError::Parse(e.to_string()))?;

    if bytes.is_empty() {
        return Err(SynthError::EmptyAudio);
    }
    Ok(bytes)
}

#[async_trait]
impl Synthesizer for GoogleTts {
    async fn synthesize(&self, input: &SynthesisInput) -> Result<Vec<u8>, SynthError> {
        let credential = TtsCredential::resolve().await?;

        let url = format!("{}/v1/text:synthesize", self.base_url);
        log::debug!("POST {url} ({} chars)", input.as_str().len());

        let mut req = self.client.post(&url).json(&self.request_body(input));
        req = match &credential {
            TtsCredential::ApiKey(key) => req.query(&[("key", key)]),
            TtsCredential::Bearer(token) => req.bearer_auth(token),
        };
        if let Some(project) = &self.quota_project {
            req = req.header("x-goog-user-project", project);
        }

        let response = req.send().await?;
        if !response.status().is_success() {
            return Err(error_status(response).await);
        }

        let json: serde_json::Value = response
            .json()
            .await
            .map_err(|e| SynthError::Parse(e.to_string()))?;

        decode_audio_content(&json)
    }
}

// ---------------------------------------------------------------------------
// ProxyTts
// ---------------------------------------------------------------------------

/// Calls a TTS proxy that holds the cloud credentials itself.
///
/// The proxy only accepts SSML; plain input is escaped and wrapped.
pub struct ProxyTts {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
    speaking_rate: Option<f32>,
}

impl ProxyTts {
    pub fn new(base_url: &str, token: Option<String>, config: &SpeakerConfig) -> Self {
        Self {
            client: http_client(config.timeout_secs),
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.filter(|t| !t.is_empty()),
            speaking_rate: clamp_rate(config.speaking_rate),
        }
    }

    pub fn request_body(&self, input: &SynthesisInput) -> serde_json::Value {
        let mut body = serde_json::json!({ "ssml": input.to_ssml() });
        if let Some(rate) = self.speaking_rate {
            body["speaking_rate"] = serde_json::json!(rate);
        }
        body
    }
}

#[async_trait]
impl Synthesizer for ProxyTts {
    async fn synthesize(&self, input: &SynthesisInput) -> Result<Vec<u8>, SynthError> {
        let url = format!("{}/v1/synthesize", self.base_url);
        log::debug!("POST {url} via proxy");

        let mut req = self.client.post(&url).json(&self.request_body(input));
        if let Some(token) = &self.token {
            req = req.bearer_auth(token);
        }

        let response = req.send().await?;
        if response.status() != reqwest::StatusCode::OK {
            return Err(error_status(response).await);
        }

        let bytes = response.bytes().await?;
        if bytes.is_empty() {
            return Err(SynthError::EmptyAudio);
        }
        Ok(bytes.to_vec())
    }
}

// ---------------------------------------------------------------------------
// Backend selection
// ---------------------------------------------------------------------------

/// Build the synthesizer selected by `config.backend`.
///
/// The proxy backend reads its bearer token from `TTS_PROXY_TOKEN`.
pub fn build_synthesizer(config: &SpeakerConfig) -> Result<Arc<dyn Synthesizer>, SynthError> {
    match config.backend {
        TtsBackend::Google => Ok(Arc::new(GoogleTts::from_config(config))),
        TtsBackend::Proxy => {
            let url = config
                .proxy_url
                .as_deref()
                .filter(|u| !u.is_empty())
                .ok_or_else(|| {
                    SynthError::Config("proxy backend selected but no proxy_url set".into())
                })?;
            let token = std::env::var("TTS_PROXY_TOKEN").ok();
            Ok(Arc::new(ProxyTts::new(url, token, config)))
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
