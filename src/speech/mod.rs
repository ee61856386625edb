//! Speech stage for plsdescribe.
//!
//! This module provides:
//! * [`InputMode`] / [`prepare`]: plain vs. SSML text preparation.
//! * [`Synthesizer`]: async trait implemented by [`GoogleTts`] and [`ProxyTts`].
//! * [`Speaker`]: synthesize, decode and play one description.
//! * [`SpeakError`]: tagged failure: synthesis, decode, playback or save.
//!
//! # Quick start
//!
//! ```rust,no_run
//! use plsdescribe::config::AppConfig;
//! use plsdescribe::speech::Speaker;
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = AppConfig::default();
//!     let speaker = Speaker::from_config(&config.speaker).unwrap();
//!     if let Err(e) = speaker.speak("<speak>Two clusters.</speak>").await {
//!         eprintln!("{e}");
//!     }
//! }
//! ```

pub mod speaker;
pub mod synth;
pub mod text;

// ---------------------------------------------------------------------------
// Public re-exports
// ---------------------------------------------------------------------------

pub use speaker::{read_aloud, PlaybackOutcome, SpeakError, Speaker};
pub use synth::{build_synthesizer, GoogleTts, ProxyTts, SynthError, Synthesizer, TtsCredential};
pub use text::{clean_markdown, normalize_whitespace, prepare, InputMode, SynthesisInput};
