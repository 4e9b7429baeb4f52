//! Mixer — gain staging for the oscillator blend and the reverb send.

/// Gains for the two oscillators of a voice.
///
/// `mix` is the share of oscillator 1; oscillator 2 gets the rest, so the
/// pair always sums to unity.
pub fn oscillator_gains(mix: f64) -> (f64, f64) {
    let mix = mix.clamp(0.0, 1.0);
    (mix, 1.0 - mix)
}

/// Dry and wet path gains for the reverb split.
///
/// With the reverb switched off the dry path is at unity and the wet path
/// is muted regardless of `mix`.
pub fn dry_wet_gains(reverb_enabled: bool, mix: f64) -> (f64, f64) {
    if reverb_enabled {
        let mix = mix.clamp(0.0, 1.0);
        (1.0 - mix, mix)
    } else {
        (1.0, 0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn oscillator_gains_sum_to_unity() {
        for mix in [0.0, 0.25, 0.5, 0.9, 1.0] {
            let (a, b) = oscillator_gains(mix);
            assert!((a + b - 1.0).abs() < 1e-12, "mix {mix} gave {a} + {b}");
        }
        assert_eq!(oscillator_gains(0.3), (0.3, 0.7));
    }

    #[test]
    fn reverb_off_is_fully_dry() {
        assert_eq!(dry_wet_gains(false, 0.8), (1.0, 0.0));
    }

    #[test]
    fn reverb_on_splits_by_mix() {
        let (dry, wet) = dry_wet_gains(true, 0.3);
        assert!((dry - 0.7).abs() < 1e-12);
        assert!((wet - 0.3).abs() < 1e-12);
    }
}
