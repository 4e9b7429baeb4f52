//! Reverb impulse — synthesized impulse response for the convolver.
//!
//! The reverb itself is a convolution node in the audio graph; this module
//! builds the two-channel impulse it convolves with: uniform noise shaped
//! by a power-law decay.

use rand::Rng;
use serde::Serialize;

/// Impulse length in seconds at full size.
pub const SECONDS_PER_SIZE: f64 = 3.0;

/// Damping is scaled by this to form the decay exponent.
pub const DAMPING_EXPONENT_SCALE: f64 = 10.0;

/// Number of channels in every impulse.
pub const CHANNELS: usize = 2;

/// A stereo impulse response.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReverbImpulse {
    pub sample_rate: f64,
    /// One sample vector per channel, all of equal length.
    pub channels: Vec<Vec<f32>>,
}

impl ReverbImpulse {
    /// Build a fresh random impulse.
    ///
    /// # Arguments
    /// - `sample_rate`: Audio sample rate in Hz.
    /// - `size`: Room size (0.0 to 1.0); the tail lasts `size * 3` seconds.
    /// - `damping`: Damping (0.0 to 1.0). Higher = faster decay.
    pub fn build(sample_rate: f64, size: f64, damping: f64) -> Self {
        Self::build_with_rng(sample_rate, size, damping, &mut rand::thread_rng())
    }

    /// Build an impulse drawing its noise from `rng`.
    pub fn build_with_rng<R: Rng>(
        sample_rate: f64,
        size: f64,
        damping: f64,
        rng: &mut R,
    ) -> Self {
        let length = impulse_length(sample_rate, size);
        let exponent = damping.max(0.0) * DAMPING_EXPONENT_SCALE;

        let channels = (0..CHANNELS)
            .map(|_| {
                (0..length)
                    .map(|i| {
                        let noise: f64 = rng.gen_range(-1.0..1.0);
                        (noise * decay(i, length, exponent)) as f32
                    })
                    .collect()
            })
            .collect();

        ReverbImpulse {
            sample_rate,
            channels,
        }
    }

    /// Samples per channel.
    pub fn len(&self) -> usize {
        self.channels.first().map_or(0, Vec::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Impulse length in samples: `round(sample_rate * size * 3)`.
pub fn impulse_length(sample_rate: f64, size: f64) -> usize {
    let length = (sample_rate * size * SECONDS_PER_SIZE).round();
    if length.is_finite() && length > 0.0 {
        length as usize
    } else {
        0
    }
}

/// Amplitude envelope at sample `i`: `(1 - i/length)^exponent`.
fn decay(i: usize, length: usize, exponent: f64) -> f64 {
    (1.0 - i as f64 / length as f64).powf(exponent)
}
