//! Application settings structs, defaults and TOML persistence.
//!
//! All structs implement `Serialize`, `Deserialize`, `Default` and `Clone`
//! so they can be round-tripped through TOML files.  Missing keys fall back
//! to their defaults, so a settings file only needs the values it changes.

use std::path::{Path, PathBuf};

use anyhow::Result;
use serde::{Deserialize, Serialize};

use super::AppPaths;
use crate::speech::InputMode;

// ---------------------------------------------------------------------------
// DescriberConfig
// ---------------------------------------------------------------------------

/// Settings for the image-description stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DescriberConfig {
    /// Gemini model identifier (e.g. `"gemini-2.5-pro"`).
    pub model: String,
    /// Base URL of the Generative Language API.
    pub base_url: String,
    /// Scientific field named in the prompt preamble.
    pub field: String,
    /// Plot-specific context appended after the instruction.
    pub context: String,
    /// Where the description artifact is written.
    pub output_path: PathBuf,
    /// Maximum seconds to wait for the model before timing out.
    pub timeout_secs: u64,
}

impl Default for DescriberConfig {
    fn default() -> Self {
        Self {
            model: "gemini-2.5-pro".into(),
            base_url: "https://generativelanguage.googleapis.com".into(),
            field: "bioinformatics".into(),
            context: "Additional context: the plot is a violin plot for RNA counts for \
                      different identities. "
                .into(),
            output_path: PathBuf::from("description.txt"),
            timeout_secs: 120,
        }
    }
}

// ---------------------------------------------------------------------------
// TtsBackend
// ---------------------------------------------------------------------------

/// Selects where synthesis requests are sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TtsBackend {
    /// Google Cloud Text-to-Speech REST API.
    Google,
    /// A TTS proxy exposing `POST /v1/synthesize`.
    Proxy,
}

impl Default for TtsBackend {
    fn default() -> Self {
        Self::Google
    }
}

// ---------------------------------------------------------------------------
// SpeakerConfig
// ---------------------------------------------------------------------------

/// Settings for the speech stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SpeakerConfig {
    /// Which synthesis backend to call.
    pub backend: TtsBackend,
    /// How the description text is submitted.
    pub mode: InputMode,
    /// BCP-47 locale of the voice.
    pub language_code: String,
    /// Voice name understood by Cloud Text-to-Speech.
    pub voice_name: String,
    /// Speaking rate (0.25 – 2.0).  `None` keeps the service default.
    pub speaking_rate: Option<f32>,
    /// Base URL of the Cloud Text-to-Speech API.
    pub base_url: String,
    /// Base URL of the TTS proxy; only used with [`TtsBackend::Proxy`].
    pub proxy_url: Option<String>,
    /// Strip markdown bullets and emphasis before SSML submission.
    pub strip_markdown: bool,
    /// Where the MP3 is saved when no audio output device is available.
    /// `None` turns the fallback off.
    pub save_fallback_path: Option<PathBuf>,
    /// Maximum seconds to wait for synthesis before timing out.
    pub timeout_secs: u64,
}

impl Default for SpeakerConfig {
    fn default() -> Self {
        Self {
            backend: TtsBackend::default(),
            mode: InputMode::Ssml,
            language_code: "en-US".into(),
            voice_name: "en-US-Wavenet-F".into(),
            speaking_rate: None,
            base_url: "https://texttospeech.googleapis.com".into(),
            proxy_url: None,
            strip_markdown: true,
            save_fallback_path: Some(PathBuf::from("description.mp3")),
            timeout_secs: 60,
        }
    }
}

impl SpeakerConfig {
    /// Apply `TTS_PROXY_URL` from the environment.  A non-empty value
    /// overrides `proxy_url` and switches the backend to the proxy.
    pub fn apply_env(&mut self) {
        self.apply_lookup(|name| std::env::var(name).ok());
    }

    /// Same as [`apply_env`](Self::apply_env) with an explicit lookup.
    pub fn apply_lookup(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup("TTS_PROXY_URL").filter(|u| !u.is_empty()) {
            self.proxy_url = Some(url);
            self.backend = TtsBackend::Proxy;
        }
    }
}

// ---------------------------------------------------------------------------
// AppConfig  (top-level)
// ---------------------------------------------------------------------------

/// Top-level application configuration, serialised as `settings.toml`.
///
/// ```rust,no_run
/// use plsdescribe::config::AppConfig;
///
/// // Platform settings file; defaults are written on first run
/// let config = AppConfig::load_or_default(None);
/// println!("{}", config.describer.model);
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Image-description stage.
    pub describer: DescriberConfig,
    /// Speech stage.
    pub speaker: SpeakerConfig,
}

impl AppConfig {
    /// Load settings for a binary.  Never fails: errors are logged and the
    /// defaults are used instead.
    ///
    /// An explicit `path` is only read.  Without one the platform
    /// `settings.toml` is used, and on first run the defaults are written
    /// there so the user has a file to edit.
    pub fn load_or_default(path: Option<&Path>) -> Self {
        match path {
            Some(p) => Self::load_or_init(p, false),
            None => Self::load_or_init(&AppPaths::new().settings_file, true),
        }
    }

    fn load_or_init(path: &Path, write_missing: bool) -> Self {
        if write_missing && !path.exists() {
            let defaults = Self::default();
            match defaults.save_to(path) {
                Ok(()) => log::info!("wrote default settings to {}", path.display()),
                Err(e) => log::warn!("could not write default settings ({e})"),
            }
            return defaults;
        }
        Self::load_from(path).unwrap_or_else(|e| {
            log::warn!("Failed to load config ({e}); using defaults");
            Self::default()
        })
    }

    /// Load from an explicit path.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save to `path`, creating parent directories as needed.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn round_trip_toml() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("settings.toml");

        let original = AppConfig::default();
        original.save_to(&path).expect("save");

        let loaded = AppConfig::load_from(&path).expect("load");

        assert_eq!(original.describer.model, loaded.describer.model);
        assert_eq!(original.describer.field, loaded.describer.field);
        assert_eq!(original.describer.context, loaded.describer.context);
        assert_eq!(original.describer.output_path, loaded.describer.output_path);
        assert_eq!(original.describer.timeout_secs, loaded.describer.timeout_secs);

        assert_eq!(original.speaker.backend, loaded.speaker.backend);
        assert_eq!(original.speaker.mode, loaded.speaker.mode);
        assert_eq!(original.speaker.voice_name, loaded.speaker.voice_name);
        assert_eq!(original.speaker.speaking_rate, loaded.speaker.speaking_rate);
        assert_eq!(
            original.speaker.save_fallback_path,
            loaded.speaker.save_fallback_path
        );
    }

    /// `load_from` on a non-existent path must return `Default` without error.
    #[test]
    fn load_missing_returns_default() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("nonexistent.toml");

        let config = AppConfig::load_from(&path).expect("should not error");
        assert_eq!(config.describer.model, "gemini-2.5-pro");
        assert_eq!(config.speaker.language_code, "en-US");
    }

    #[test]
    fn first_run_writes_default_settings() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("plsdescribe").join("settings.toml");

        let cfg = AppConfig::load_or_init(&path, true);
        assert_eq!(cfg.describer.model, "gemini-2.5-pro");

        let written = AppConfig::load_from(&path).expect("load written defaults");
        assert_eq!(written.speaker.voice_name, cfg.speaker.voice_name);
    }

    #[test]
    fn explicit_missing_path_is_not_created() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("custom.toml");

        let cfg = AppConfig::load_or_default(Some(&path));
        assert_eq!(cfg.describer.field, "bioinformatics");
        assert!(!path.exists());
    }

    #[test]
    fn malformed_file_falls_back_to_defaults() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("broken.toml");
        std::fs::write(&path, "[describer\nmodel = ").expect("write");

        let cfg = AppConfig::load_or_default(Some(&path));
        assert_eq!(cfg.describer.model, "gemini-2.5-pro");
    }

    #[test]
    fn default_values() {
        let cfg = AppConfig::default();

        assert_eq!(cfg.describer.field, "bioinformatics");
        assert_eq!(cfg.describer.output_path, PathBuf::from("description.txt"));
        assert!(cfg.describer.context.starts_with("Additional context:"));
        assert_eq!(cfg.speaker.backend, TtsBackend::Google);
        assert_eq!(cfg.speaker.mode, InputMode::Ssml);
        assert_eq!(cfg.speaker.voice_name, "en-US-Wavenet-F");
        assert!(cfg.speaker.speaking_rate.is_none());
        assert!(cfg.speaker.strip_markdown);
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("partial.toml");
        std::fs::write(
            &path,
            "[describer]\nfield = \"genomics\"\n\n[speaker]\nmode = \"plain\"\nspeaking_rate = 1.25\n",
        )
        .expect("write");

        let cfg = AppConfig::load_from(&path).expect("load");
        assert_eq!(cfg.describer.field, "genomics");
        assert_eq!(cfg.describer.model, "gemini-2.5-pro");
        assert_eq!(cfg.speaker.mode, InputMode::Plain);
        assert_eq!(cfg.speaker.speaking_rate, Some(1.25));
        assert_eq!(cfg.speaker.voice_name, "en-US-Wavenet-F");
    }

    #[test]
    fn proxy_url_from_env_switches_backend() {
        let mut cfg = SpeakerConfig::default();
        cfg.apply_lookup(|name| {
            (name == "TTS_PROXY_URL").then(|| "https://tts.example.org".to_string())
        });
        assert_eq!(cfg.backend, TtsBackend::Proxy);
        assert_eq!(cfg.proxy_url.as_deref(), Some("https://tts.example.org"));
    }

    #[test]
    fn empty_proxy_url_is_ignored() {
        let mut cfg = SpeakerConfig::default();
        cfg.apply_lookup(|_| Some(String::new()));
        assert_eq!(cfg.backend, TtsBackend::Google);
        assert!(cfg.proxy_url.is_none());
    }
}
