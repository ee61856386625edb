//! Audio output: MP3 decode → mono mixdown → resample → cpal playback.
//!
//! # Pipeline
//!
//! ```text
//! MP3 bytes → decode_mp3 → AudioBuffer → downmix_to_mono → resample
//!           → cpal output callback (same sample on every device channel)
//! ```
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use plsdescribe::audio::{decode_mp3, AudioOutput, AudioPlayer};
//!
//! let mp3 = std::fs::read("description.mp3").unwrap();
//! let buffer = decode_mp3(&mp3).unwrap();
//! AudioPlayer::new().play(&buffer).unwrap(); // blocks until finished
//! ```

pub mod buffer;
pub mod decode;
pub mod error;
pub mod playback;
pub mod resample;

pub use buffer::AudioBuffer;
pub use decode::decode_mp3;
pub use error::AudioError;
pub use playback::{prepare_for_device, AudioOutput, AudioPlayer};
pub use resample::{downmix_to_mono, resample};
