//! The speech stage: prepare → synthesize → decode → play.
//!
//! [`Speaker`] is one component for both input modes; the mode only changes
//! how [`prepare`] treats the text.  Every failure is returned as a tagged
//! [`SpeakError`] so the caller decides how loudly to report it.
//!
//! ```text
//! text ──prepare(mode)──▶ SynthesisInput ──Synthesizer──▶ MP3
//!      ──decode_mp3──▶ AudioBuffer ──spawn_blocking(AudioOutput::play)──▶ done
//!                                    └─ NoDevice + fallback path ─▶ MP3 saved
//! ```
//!
//! [`read_aloud`] is the whole `plsspeak` run: read the artifact, print it,
//! speak it, and finish with `Audio finished.` whatever the speech outcome.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use thiserror::Error;

use super::synth::{build_synthesizer, SynthError, Synthesizer};
use super::text::{prepare, InputMode};
use crate::artifact::{self, ArtifactError};
use crate::audio::{decode_mp3, AudioError, AudioOutput, AudioPlayer};
use crate::config::SpeakerConfig;

// ---------------------------------------------------------------------------
// SpeakError
// ---------------------------------------------------------------------------

/// Why a description was not spoken.
#[derive(Debug, Error)]
pub enum SpeakError {
    #[error("speech synthesis failed: {0}")]
    Synthesis(#[from] SynthError),

    #[error("could not decode synthesized audio: {0}")]
    Decode(#[source] AudioError),

    #[error("audio playback failed: {0}")]
    Playback(#[source] AudioError),

    #[error("failed to save audio to '{}': {source}", .path.display())]
    Save {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// What happened to the synthesized audio.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlaybackOutcome {
    /// Played on the output device.
    Played,
    /// No output device; the MP3 was written to this path instead.
    Saved(PathBuf),
}

// ---------------------------------------------------------------------------
// Speaker
// ---------------------------------------------------------------------------

pub struct Speaker {
    synthesizer: Arc<dyn Synthesizer>,
    output: Arc<dyn AudioOutput>,
    mode: InputMode,
    strip_markdown: bool,
    save_fallback_path: Option<PathBuf>,
}

impl Speaker {
    pub fn new(
        synthesizer: Arc<dyn Synthesizer>,
        output: Arc<dyn AudioOutput>,
        config: &SpeakerConfig,
    ) -> Self {
        Self {
            synthesizer,
            output,
            mode: config.mode,
            strip_markdown: config.strip_markdown,
            save_fallback_path: config.save_fallback_path.clone(),
        }
    }

    /// Speaker with the configured backend and the default output device.
    pub fn from_config(config: &SpeakerConfig) -> Result<Self, SynthError> {
        Ok(Self::new(
            build_synthesizer(config)?,
            Arc::new(AudioPlayer::new()),
            config,
        ))
    }

    /// Speak `text`, blocking (asynchronously) until playback finishes.
    pub async fn speak(&self, text: &str) -> Result<PlaybackOutcome, SpeakError> {
        let input = prepare(text, self.mode, self.strip_markdown);

        log::info!(
            "synthesizing speech ({:?} mode, {} chars)",
            self.mode,
            input.as_str().len()
        );
        let mp3 = self.synthesizer.synthesize(&input).await?;

        let buffer = decode_mp3(&mp3).map_err(SpeakError::Decode)?;

        let output = Arc::clone(&self.output);
        let played = tokio::task::spawn_blocking(move || output.play(&buffer))
            .await
            .map_err(|e| SpeakError::Playback(AudioError::Interrupted(e.to_string())))?;

        finish_playback(played, &mp3, self.save_fallback_path.as_deref())
    }

    /// Speak `text`, reporting the outcome on stderr instead of returning it.
    ///
    /// Returns `true` when the audio was played or saved.
    pub async fn speak_reported(&self, text: &str) -> bool {
        match self.speak(text).await {
            Ok(PlaybackOutcome::Played) => true,
            Ok(PlaybackOutcome::Saved(path)) => {
                eprintln!("No audio device found. Saved MP3 to {}", path.display());
                true
            }
            Err(e) => {
                log::error!("speech failed: {e}");
                eprintln!("TTS error: {e}");
                false
            }
        }
    }
}

/// Read the description at `input`, print it to `out` and speak it.
///
/// Only a failure to read the artifact is returned.  Speech failures are
/// logged, and `Audio finished.` is printed once the artifact was read.
pub async fn read_aloud<W: Write>(
    input: &Path,
    speaker: Option<&Speaker>,
    out: &mut W,
) -> Result<(), ArtifactError> {
    let description = artifact::read_description(input)?;
    // A closed stdout is not a reason to skip the audio.
    let _ = writeln!(out, "{description}");

    if let Some(speaker) = speaker {
        speaker.speak_reported(&description).await;
    }

    let _ = writeln!(out, "Audio finished.");
    Ok(())
}

/// Map the playback result, saving the MP3 when there is no output device
/// and a fallback path is configured.
fn finish_playback(
    played: Result<(), AudioError>,
    mp3: &[u8],
    fallback: Option<&Path>,
) -> Result<PlaybackOutcome, SpeakError> {
    match (played, fallback) {
        (Ok(()), _) => Ok(PlaybackOutcome::Played),
        (Err(AudioError::NoDevice), Some(path)) => {
            std::fs::write(path, mp3).map_err(|source| SpeakError::Save {
                path: path.to_path_buf(),
                source,
            })?;
            log::warn!("no audio output device; saved MP3 to {}", path.display());
            Ok(PlaybackOutcome::Saved(path.to_path_buf()))
        }
        (Err(e), _) => Err(SpeakError::Playback(e)),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use async_trait::async_trait;
    use tempfile::tempdir;

    use crate::audio::AudioBuffer;
    use crate::speech::SynthesisInput;

    // -----------------------------------------------------------------------
    // Test doubles
    // -----------------------------------------------------------------------

    /// Records the input it was given and answers with a fixed result.
    struct RecordingSynth {
        seen: Mutex<Option<SynthesisInput>>,
        answer: fn() -> Result<Vec<u8>, SynthError>,
    }

    impl RecordingSynth {
        fn new(answer: fn() -> Result<Vec<u8>, SynthError>) -> Self {
            Self {
                seen: Mutex::new(None),
                answer,
            }
        }
    }

    #[async_trait]
    impl Synthesizer for RecordingSynth {
        async fn synthesize(&self, input: &SynthesisInput) -> Result<Vec<u8>, SynthError> {
            *self.seen.lock().unwrap() = Some(input.clone());
            (self.answer)()
        }
    }

    /// Counts play calls.
    #[derive(Default)]
    struct CountingOutput(AtomicUsize);

    impl AudioOutput for CountingOutput {
        fn play(&self, _buffer: &AudioBuffer) -> Result<(), AudioError> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    fn speaker(
        synth: Arc<RecordingSynth>,
        output: Arc<CountingOutput>,
        mode: InputMode,
    ) -> Speaker {
        let config = SpeakerConfig {
            mode,
            ..SpeakerConfig::default()
        };
        Speaker::new(synth, output, &config)
    }

    const SILENCE_MP3: &[u8] =
        include_bytes!(concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/silence.mp3"));

    // -----------------------------------------------------------------------
    // Tests
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn synthesized_audio_is_decoded_and_played_once() {
        let synth = Arc::new(RecordingSynth::new(|| Ok(SILENCE_MP3.to_vec())));
        let output = Arc::new(CountingOutput::default());
        let s = speaker(synth, Arc::clone(&output), InputMode::Ssml);

        let outcome = s.speak("Two clusters.").await.expect("speak");
        assert_eq!(outcome, PlaybackOutcome::Played);
        assert_eq!(output.0.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn synthesis_failure_is_tagged_and_nothing_plays() {
        let synth = Arc::new(RecordingSynth::new(|| Err(SynthError::Timeout)));
        let output = Arc::new(CountingOutput::default());
        let s = speaker(synth, Arc::clone(&output), InputMode::Ssml);

        let err = s.speak("Two clusters.").await.unwrap_err();
        assert!(matches!(err, SpeakError::Synthesis(SynthError::Timeout)));
        assert_eq!(output.0.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn undecodable_audio_is_a_decode_error() {
        let synth = Arc::new(RecordingSynth::new(|| Ok(b"not audio".to_vec())));
        let output = Arc::new(CountingOutput::default());
        let s = speaker(synth, Arc::clone(&output), InputMode::Plain);

        let err = s.speak("hello").await.unwrap_err();
        assert!(matches!(err, SpeakError::Decode(_)));
        assert_eq!(output.0.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn ssml_mode_submits_normalized_ssml() {
        let synth = Arc::new(RecordingSynth::new(|| Err(SynthError::EmptyAudio)));
        let s = speaker(
            Arc::clone(&synth),
            Arc::new(CountingOutput::default()),
            InputMode::Ssml,
        );

        let _ = s.speak("<speak>\n  One   cluster.\n</speak>\n").await;
        let seen = synth.seen.lock().unwrap().clone();
        assert_eq!(
            seen,
            Some(SynthesisInput::Ssml("<speak> One cluster. </speak>".into()))
        );
    }

    #[tokio::test]
    async fn plain_mode_submits_text_unchanged() {
        let synth = Arc::new(RecordingSynth::new(|| Err(SynthError::EmptyAudio)));
        let s = speaker(
            Arc::clone(&synth),
            Arc::new(CountingOutput::default()),
            InputMode::Plain,
        );

        let text = "One   cluster.\n* bullet\n";
        let _ = s.speak(text).await;
        let seen = synth.seen.lock().unwrap().clone();
        assert_eq!(seen, Some(SynthesisInput::Text(text.into())));
    }

    // ---- read_aloud ---------------------------------------------------------

    fn artifact_in(dir: &Path, text: &str) -> PathBuf {
        let path = dir.join(crate::artifact::DEFAULT_ARTIFACT_PATH);
        std::fs::write(&path, text).expect("write artifact");
        path
    }

    #[tokio::test]
    async fn synthesis_failure_still_finishes_cleanly() {
        let dir = tempdir().expect("temp dir");
        let input = artifact_in(dir.path(), "Two clusters.");
        let synth = Arc::new(RecordingSynth::new(|| {
            Err(SynthError::Status {
                status: 503,
                body: "unavailable".into(),
            })
        }));
        let output = Arc::new(CountingOutput::default());
        let s = speaker(synth, Arc::clone(&output), InputMode::Ssml);

        let mut out = Vec::new();
        read_aloud(&input, Some(&s), &mut out).await.expect("clean exit");

        assert_eq!(String::from_utf8(out).unwrap(), "Two clusters.\nAudio finished.\n");
        assert_eq!(output.0.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn read_aloud_plays_the_description() {
        let dir = tempdir().expect("temp dir");
        let input = artifact_in(dir.path(), "<speak>One cluster.</speak>");
        let synth = Arc::new(RecordingSynth::new(|| Ok(SILENCE_MP3.to_vec())));
        let output = Arc::new(CountingOutput::default());
        let s = speaker(Arc::clone(&synth), Arc::clone(&output), InputMode::Ssml);

        let mut out = Vec::new();
        read_aloud(&input, Some(&s), &mut out).await.expect("read aloud");

        assert_eq!(output.0.load(Ordering::SeqCst), 1);
        assert_eq!(
            synth.seen.lock().unwrap().clone(),
            Some(SynthesisInput::Ssml("<speak>One cluster.</speak>".into()))
        );
        assert!(String::from_utf8(out).unwrap().ends_with("Audio finished.\n"));
    }

    #[tokio::test]
    async fn missing_artifact_is_not_found_and_prints_nothing() {
        let dir = tempdir().expect("temp dir");
        let synth = Arc::new(RecordingSynth::new(|| Ok(SILENCE_MP3.to_vec())));
        let output = Arc::new(CountingOutput::default());
        let s = speaker(Arc::clone(&synth), Arc::clone(&output), InputMode::Ssml);

        let mut out = Vec::new();
        let err = read_aloud(&dir.path().join("absent.txt"), Some(&s), &mut out)
            .await
            .unwrap_err();

        assert!(matches!(err, ArtifactError::NotFound(_)));
        assert_eq!(err.exit_code(), 3);
        assert!(out.is_empty());
        assert!(synth.seen.lock().unwrap().is_none());
    }

    #[tokio::test]
    async fn without_a_speaker_the_text_is_still_printed() {
        let dir = tempdir().expect("temp dir");
        let input = artifact_in(dir.path(), "Two clusters.");

        let mut out = Vec::new();
        read_aloud(&input, None, &mut out).await.expect("clean exit");
        assert_eq!(String::from_utf8(out).unwrap(), "Two clusters.\nAudio finished.\n");
    }

    // ---- finish_playback ----------------------------------------------------

    #[test]
    fn successful_playback_is_played() {
        assert_eq!(
            finish_playback(Ok(()), b"mp3", None).unwrap(),
            PlaybackOutcome::Played
        );
    }

    #[test]
    fn missing_device_saves_mp3_when_configured() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("description.mp3");

        let outcome = finish_playback(Err(AudioError::NoDevice), b"ID3data", Some(&path))
            .expect("fallback");
        assert_eq!(outcome, PlaybackOutcome::Saved(path.clone()));
        assert_eq!(std::fs::read(&path).expect("read"), b"ID3data");
    }

    #[test]
    fn missing_device_without_fallback_is_playback_error() {
        let err = finish_playback(Err(AudioError::NoDevice), b"x", None).unwrap_err();
        assert!(matches!(err, SpeakError::Playback(AudioError::NoDevice)));
    }

    #[test]
    fn stream_errors_do_not_trigger_fallback() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("description.mp3");

        let err = finish_playback(Err(AudioError::Stream("xrun".into())), b"x", Some(&path))
            .unwrap_err();
        assert!(matches!(err, SpeakError::Playback(AudioError::Stream(_))));
        assert!(!path.exists());
    }
}
