//! Configuration module for plsdescribe.
//!
//! Provides `AppConfig` (top-level settings), one sub-config per stage,
//! `AppPaths` for cross-platform config directories, and TOML persistence via
//! `AppConfig::load_or_default`.
//!
//! Credentials are read from the environment by each stage and are never
//! part of the settings file.

pub mod paths;
pub mod settings;

pub use paths::AppPaths;
pub use settings::{AppConfig, DescriberConfig, SpeakerConfig, TtsBackend};
