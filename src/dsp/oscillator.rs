//! Oscillator settings — waveform shapes and pitch math.
//!
//! The oscillators themselves live in the audio graph provider; this
//! module only decides what they are asked to play.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::SynthError;

/// Supported waveform shapes (the WebAudio `OscillatorType` subset).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Waveform {
    Sawtooth,
    Square,
    Triangle,
    Sine,
}

impl Waveform {
    /// All waveforms in selector order.
    pub const ALL: [Waveform; 4] = [
        Waveform::Sawtooth,
        Waveform::Square,
        Waveform::Triangle,
        Waveform::Sine,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Waveform::Sawtooth => "sawtooth",
            Waveform::Square => "square",
            Waveform::Triangle => "triangle",
            Waveform::Sine => "sine",
        }
    }

    /// Position in [`Waveform::ALL`].
    pub fn index(&self) -> usize {
        match self {
            Waveform::Sawtooth => 0,
            Waveform::Square => 1,
            Waveform::Triangle => 2,
            Waveform::Sine => 3,
        }
    }

    /// Nearest waveform for a numeric selector position, clamped to the list.
    pub fn from_index(index: f64) -> Waveform {
        if index.is_nan() {
            return Waveform::Sawtooth;
        }
        let i = index.round().clamp(0.0, (Self::ALL.len() - 1) as f64) as usize;
        Self::ALL[i]
    }
}

impl FromStr for Waveform {
    type Err = SynthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sawtooth" | "saw" => Ok(Waveform::Sawtooth),
            "square" => Ok(Waveform::Square),
            "triangle" => Ok(Waveform::Triangle),
            "sine" => Ok(Waveform::Sine),
            _ => Err(SynthError::UnknownWaveform(s.to_string())),
        }
    }
}

impl fmt::Display for Waveform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Frequency of a note shifted by `octave_shift` octaves: `base * 2^shift`.
///
/// Fractional shifts are allowed; the octave knobs are continuous.
pub fn octave_frequency(base: f64, octave_shift: f64) -> f64 {
    base * 2.0_f64.powf(octave_shift)
}
