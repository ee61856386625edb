//! Channel mixing and sample-rate conversion for playback.
//!
//! Synthesized speech arrives at the service's rate (24 kHz for Wavenet
//! voices) while output devices usually run at 44.1 or 48 kHz.  Playback
//! converts in two steps:
//!
//! 1. [`downmix_to_mono`]: average interleaved channels.
//! 2. [`resample`]: linear interpolation to the device rate.

// ---------------------------------------------------------------------------
// downmix_to_mono
// ---------------------------------------------------------------------------

/// Mix interleaved multi-channel audio down to mono by averaging all channels.
///
/// * `channels == 1` returns the input unchanged.
/// * `channels == 0` returns an empty vector.
///
/// ```rust
/// use plsdescribe::audio::downmix_to_mono;
///
/// let stereo = vec![0.5_f32, -0.5, 0.2, 0.4]; // L R L R
/// let mono = downmix_to_mono(&stereo, 2);
/// assert_eq!(mono.len(), 2);
/// assert!((mono[1] - 0.3).abs() < 1e-6);
/// ```
pub fn downmix_to_mono(samples: &[f32], channels: u16) -> Vec<f32> {
    match channels {
        0 => Vec::new(),
        1 => samples.to_vec(),
        n => {
            let n = n as usize;
            samples
                .chunks_exact(n)
                .map(|frame| frame.iter().sum::<f32>() / n as f32)
                .collect()
        }
    }
}

// ---------------------------------------------------------------------------
// resample
// ---------------------------------------------------------------------------

/// Resample mono `samples` from `from_rate` to `to_rate` Hz using linear
/// interpolation.
///
/// * Equal rates return the input unchanged.
/// * Empty input or a zero rate returns an empty vector.
///
/// The output length is `ceil(samples.len() * to_rate / from_rate)`.
pub fn resample(samples: &[f32], from_rate: u32, to_rate: u32) -> Vec<f32> {
    if from_rate == to_rate {
        return samples.to_vec();
    }

    if samples.is_empty() || from_rate == 0 || to_rate == 0 {
        return Vec::new();
    }

    let ratio = to_rate as f64 / from_rate as f64;
    let output_len = (samples.len() as f64 * ratio).ceil() as usize;
    let mut output = Vec::with_capacity(output_len);

    for i in 0..output_len {
        let src_pos = i as f64 / ratio;
        let idx = src_pos as usize;
        let frac = (src_pos - idx as f64) as f32;

        let sample = if idx + 1 < samples.len() {
            samples[idx] * (1.0 - frac) + samples[idx + 1] * frac
        } else if idx < samples.len() {
            samples[idx]
        } else {
            0.0
        };

        output.push(sample);
    }

    output
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    // ---- downmix_to_mono ---------------------------------------------------

    #[test]
    fn downmix_already_mono() {
        let input = vec![0.1_f32, 0.2, 0.3];
        assert_eq!(downmix_to_mono(&input, 1), input);
    }

    #[test]
    fn downmix_two_channel() {
        let out = downmix_to_mono(&[1.0_f32, -1.0, 0.5, 0.5], 2);
        assert_eq!(out.len(), 2);
        assert!((out[0] - 0.0).abs() < 1e-6);
        assert!((out[1] - 0.5).abs() < 1e-6);
    }

    #[test]
    fn downmix_zero_channels() {
        assert!(downmix_to_mono(&[1.0_f32, 2.0], 0).is_empty());
    }

    // ---- resample ------------------------------------------------------------

    #[test]
    fn same_rate_is_noop() {
        let input: Vec<f32> = (0..240).map(|i| i as f32 / 240.0).collect();
        assert_eq!(resample(&input, 24_000, 24_000), input);
    }

    #[test]
    fn empty_input() {
        assert!(resample(&[], 24_000, 48_000).is_empty());
    }

    #[test]
    fn zero_rate_is_empty() {
        assert!(resample(&[0.5; 10], 0, 48_000).is_empty());
    }

    #[test]
    fn upsample_24k_to_48k_doubles_length() {
        // 10 ms @ 24 kHz → 10 ms @ 48 kHz
        let out = resample(&vec![0.0_f32; 240], 24_000, 48_000);
        assert_eq!(out.len(), 480);
    }

    #[test]
    fn upsample_24k_to_44100_length() {
        // 1 s @ 24 kHz → ~44 100 samples
        let out = resample(&vec![0.0_f32; 24_000], 24_000, 44_100);
        assert!(out.len().abs_diff(44_100) <= 1, "got {}", out.len());
    }

    #[test]
    fn constant_signal_preserves_amplitude() {
        let out = resample(&vec![0.5_f32; 240], 24_000, 44_100);
        for &s in &out {
            assert!((s - 0.5).abs() < 1e-5, "amplitude drift: {s}");
        }
    }

    #[test]
    fn interpolates_between_neighbours() {
        // 2× upsampling inserts midpoints
        let out = resample(&[0.0_f32, 1.0], 1, 2);
        assert_eq!(out.len(), 4);
        assert!((out[1] - 0.5).abs() < 1e-6);
    }
}
