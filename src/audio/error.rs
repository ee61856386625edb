//! Errors from decoding and playing synthesized audio.

use thiserror::Error;

// ---------------------------------------------------------------------------
// AudioError
// ---------------------------------------------------------------------------

/// Errors that can occur while decoding or playing audio.
#[derive(Debug, Error)]
pub enum AudioError {
    /// The encoded bytes could not be decoded.
    #[error("failed to decode audio: {0}")]
    Decode(String),

    /// Decoding succeeded but produced no samples.
    #[error("decoded audio contains no samples")]
    Empty,

    #[error("no output device found on the default audio host")]
    NoDevice,

    #[error("failed to query default output config: {0}")]
    DefaultConfig(#[from] cpal::DefaultStreamConfigError),

    #[error("failed to build output stream: {0}")]
    BuildStream(#[from] cpal::BuildStreamError),

    #[error("failed to start audio stream: {0}")]
    PlayStream(#[from] cpal::PlayStreamError),

    #[error("unsupported output sample format: {0}")]
    UnsupportedFormat(String),

    /// The device reported an error while playing.
    #[error("audio stream error: {0}")]
    Stream(String),

    /// Playback did not finish within the expected time.
    #[error("playback stalled after {0:.1}s")]
    Stalled(f32),

    /// The playback thread ended without a result.
    #[error("playback interrupted: {0}")]
    Interrupted(String),
}
