//! Decoded PCM held in memory for playback.
//!
//! [`AudioBuffer`] stores interleaved `f32` samples in `[-1.0, 1.0]` together
//! with their sample rate and channel count.  It lives only as long as one
//! playback.

/// Interleaved PCM audio.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioBuffer {
    /// Interleaved samples in `[-1.0, 1.0]`.
    pub samples: Vec<f32>,
    /// Frames per second.
    pub sample_rate: u32,
    /// Interleaved channels per frame (1 = mono, 2 = stereo, …).
    pub channels: u16,
}

impl AudioBuffer {
    pub fn new(samples: Vec<f32>, sample_rate: u32, channels: u16) -> Self {
        Self {
            samples,
            sample_rate,
            channels,
        }
    }

    /// Number of complete frames.
    pub fn frames(&self) -> usize {
        match self.channels {
            0 => 0,
            n => self.samples.len() / n as usize,
        }
    }

    /// Playback length in seconds.
    ///
    /// ```rust
    /// use plsdescribe::audio::AudioBuffer;
    ///
    /// let buf = AudioBuffer::new(vec![0.0; 48_000], 24_000, 2);
    /// assert!((buf.duration_secs() - 1.0).abs() < 1e-6);
    /// ```
    pub fn duration_secs(&self) -> f32 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.frames() as f32 / self.sample_rate as f32
    }

    pub fn is_empty(&self) -> bool {
        self.frames() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frames_ignore_trailing_partial_frame() {
        let buf = AudioBuffer::new(vec![0.0; 5], 8_000, 2);
        assert_eq!(buf.frames(), 2);
    }

    #[test]
    fn zero_channels_is_empty() {
        let buf = AudioBuffer::new(vec![0.0; 10], 8_000, 0);
        assert!(buf.is_empty());
        assert_eq!(buf.duration_secs(), 0.0);
    }

    #[test]
    fn zero_rate_has_zero_duration() {
        let buf = AudioBuffer::new(vec![0.0; 10], 0, 1);
        assert_eq!(buf.duration_secs(), 0.0);
        assert!(!buf.is_empty());
    }
}
