//! Filter settings — matches WebAudio BiquadFilterNode types.

use serde::{Deserialize, Serialize};

/// Absolute ceiling for any frequency the filter envelope may reach.
pub const FILTER_CEILING_HZ: f64 = 20_000.0;

/// How far (in Hz) a full filter-envelope amount pushes the cutoff.
pub const ENV_AMOUNT_RANGE_HZ: f64 = 10_000.0;

/// Q reached at full resonance.
pub const MAX_Q: f64 = 20.0;

/// Biquad filter type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterType {
    Lowpass,
    Highpass,
    Bandpass,
    Notch,
    Peaking,
}

/// Filter Q for a normalized resonance in [0, 1].
pub fn resonance_to_q(resonance: f64) -> f64 {
    resonance * MAX_Q
}

/// Peak frequency of the filter envelope, clamped to the ceiling.
pub fn envelope_peak(base: f64, env_amount: f64) -> f64 {
    (base + env_amount * ENV_AMOUNT_RANGE_HZ).min(FILTER_CEILING_HZ)
}
