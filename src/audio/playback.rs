//! Speaker output via `cpal`.
//!
//! [`AudioPlayer`] opens the system default output device, converts an
//! [`AudioBuffer`] to the device's rate and channel layout, and blocks until
//! every frame has been handed to the hardware.  The cpal stream is dropped
//! on return, which releases the device on success and on error alike.

use std::sync::mpsc;
use std::time::Duration;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{FromSample, Sample, SizedSample};

use super::resample::{downmix_to_mono, resample};
use super::{AudioBuffer, AudioError};

/// Extra time allowed beyond the clip length before playback counts as stalled.
const STALL_GRACE: Duration = Duration::from_secs(10);

/// Time left for the device to drain its own buffer after the last frame.
const DRAIN_TAIL: Duration = Duration::from_millis(250);

// ---------------------------------------------------------------------------
// AudioOutput trait
// ---------------------------------------------------------------------------

/// Blocking audio sink.
///
/// Implementations must be `Send + Sync` so they can be moved into
/// `tokio::task::spawn_blocking` behind an `Arc`.
pub trait AudioOutput: Send + Sync {
    /// Play `buffer` to completion.
    fn play(&self, buffer: &AudioBuffer) -> Result<(), AudioError>;
}

// Compile-time assertion: Box<dyn AudioOutput> must be constructible.
const _: fn() = || {
    fn _assert_object_safe(_: Box<dyn AudioOutput>) {}
};

// ---------------------------------------------------------------------------
// Frame conversion
// ---------------------------------------------------------------------------

/// Convert `buffer` to mono at `device_rate`.
///
/// Speech is mono, so the device channels all receive the same sample.
pub fn prepare_for_device(buffer: &AudioBuffer, device_rate: u32) -> Vec<f32> {
    let mono = downmix_to_mono(&buffer.samples, buffer.channels);
    resample(&mono, buffer.sample_rate, device_rate)
}

enum PlaybackEvent {
    Finished,
    Failed(String),
}

// ---------------------------------------------------------------------------
// AudioPlayer
// ---------------------------------------------------------------------------

/// Plays audio on the system default output device.
#[derive(Debug, Default, Clone, Copy)]
pub struct AudioPlayer;

impl AudioPlayer {
    pub fn new() -> Self {
        Self
    }

    fn build_stream<T>(
        device: &cpal::Device,
        config: &cpal::StreamConfig,
        mono: Vec<f32>,
        events: mpsc::Sender<PlaybackEvent>,
    ) -> Result<cpal::Stream, AudioError>
    where
        T: SizedSample + FromSample<f32>,
    {
        let channels = config.channels.max(1) as usize;
        let error_events = events.clone();
        let mut finished = Some(events);
        let mut position = 0usize;

        let stream = device.build_output_stream(
            config,
            move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
                for frame in data.chunks_mut(channels) {
                    let value = match mono.get(position) {
                        Some(&s) => {
                            position += 1;
                            T::from_sample(s)
                        }
                        None => T::EQUILIBRIUM,
                    };
                    for out in frame.iter_mut() {
                        *out = value;
                    }
                }
                if position >= mono.len() {
                    if let Some(tx) = finished.take() {
                        // Ignore send errors; the waiter may have given up.
                        let _ = tx.send(PlaybackEvent::Finished);
                    }
                }
            },
            move |err: cpal::StreamError| {
                log::error!("cpal output stream error: {err}");
                let _ = error_events.send(PlaybackEvent::Failed(err.to_string()));
            },
            None, // no timeout
        )?;

        Ok(stream)
    }
}

impl AudioOutput for AudioPlayer {
    fn play(&self, buffer: &AudioBuffer) -> Result<(), AudioError> {
        if buffer.is_empty() {
            return Err(AudioError::Empty);
        }

        let host = cpal::default_host();
        let device = host.default_output_device().ok_or(AudioError::NoDevice)?;

        let supported = device.default_output_config()?;
        let sample_format = supported.sample_format();
        let config: cpal::StreamConfig = supported.into();
        let device_rate = config.sample_rate.0;

        let mono = prepare_for_device(buffer, device_rate);
        let (tx, rx) = mpsc::channel();

        let stream = match sample_format {
            cpal::SampleFormat::F32 => Self::build_stream::<f32>(&device, &config, mono, tx)?,
            cpal::SampleFormat::I16 => Self::build_stream::<i16>(&device, &config, mono, tx)?,
            cpal::SampleFormat::U16 => Self::build_stream::<u16>(&device, &config, mono, tx)?,
            other => return Err(AudioError::UnsupportedFormat(format!("{other:?}"))),
        };

        log::info!(
            "playing {:.1}s of audio ({} Hz, {} ch device)",
            buffer.duration_secs(),
            device_rate,
            config.channels
        );
        stream.play()?;

        let limit = Duration::from_secs_f32(buffer.duration_secs()) + STALL_GRACE;
        let result = match rx.recv_timeout(limit) {
            Ok(PlaybackEvent::Finished) => {
                std::thread::sleep(DRAIN_TAIL);
                Ok(())
            }
            Ok(PlaybackEvent::Failed(msg)) => Err(AudioError::Stream(msg)),
            Err(mpsc::RecvTimeoutError::Timeout) => Err(AudioError::Stalled(limit.as_secs_f32())),
            Err(mpsc::RecvTimeoutError::Disconnected) => {
                Err(AudioError::Interrupted("output stream closed".into()))
            }
        };

        drop(stream);
        result
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
