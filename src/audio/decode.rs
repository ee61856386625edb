//! MP3 decoding via `rodio`'s symphonia-backed decoder.

use std::io::Cursor;

use rodio::Source;

use super::{AudioBuffer, AudioError};

/// Decode encoded audio (MP3 from the synthesis service) into PCM.
///
/// # Errors
///
/// - [`AudioError::Decode`]: the bytes are not a recognised audio stream.
/// - [`AudioError::Empty`]: the stream decoded to zero frames.
pub fn decode_mp3(bytes: &[u8]) -> Result<AudioBuffer, AudioError> {
    let decoder = rodio::Decoder::new(Cursor::new(bytes.to_vec()))
        .map_err(|e| AudioError::Decode(e.to_string()))?;

    let channels = decoder.channels();
    let sample_rate = decoder.sample_rate();
    let samples: Vec<f32> = decoder.convert_samples::<f32>().collect();

    let buffer = AudioBuffer::new(samples, sample_rate, channels);
    if buffer.is_empty() {
        return Err(AudioError::Empty);
    }

    log::debug!(
        "decoded {:.2}s of audio ({} Hz, {} ch)",
        buffer.duration_secs(),
        sample_rate,
        channels
    );
    Ok(buffer)
}
