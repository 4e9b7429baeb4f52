//! Computer-keyboard note map.

use std::collections::BTreeMap;

use crate::error::SynthError;

/// Default map: the bottom letter row plays C4 to C5 chromatically, with
/// the row above it as the black keys.
const DEFAULT_KEYS: [(char, f64); 13] = [
    ('z', 261.63),
    ('s', 277.18),
    ('x', 293.66),
    ('d', 311.13),
    ('c', 329.63),
    ('v', 349.23),
    ('g', 369.99),
    ('b', 392.00),
    ('h', 415.30),
    ('n', 440.00),
    ('j', 466.16),
    ('m', 493.88),
    (',', 523.25),
];

/// Key → note frequency in Hz.
#[derive(Debug, Clone, PartialEq)]
pub struct KeyMap {
    keys: BTreeMap<char, f64>,
}

impl Default for KeyMap {
    fn default() -> Self {
        KeyMap {
            keys: DEFAULT_KEYS.into_iter().collect(),
        }
    }
}

impl KeyMap {
    /// Build a map from string keys, as found in configuration files and
    /// `KeyboardEvent.key`. Each key must be a single character and each
    /// frequency finite and positive.
    pub fn from_entries<'a, I>(entries: I) -> Result<Self, SynthError>
    where
        I: IntoIterator<Item = (&'a str, f64)>,
    {
        let mut keys = BTreeMap::new();
        for (key, freq) in entries {
            let ch = single_char(key).ok_or_else(|| SynthError::InvalidKeyMap {
                key: key.to_string(),
                reason: "expected a single character".to_string(),
            })?;
            if !freq.is_finite() || freq <= 0.0 {
                return Err(SynthError::InvalidKeyMap {
                    key: key.to_string(),
                    reason: format!("frequency {freq} must be positive"),
                });
            }
            keys.insert(ch, freq);
        }
        Ok(KeyMap { keys })
    }

    pub fn frequency(&self, key: char) -> Option<f64> {
        self.keys.get(&key).copied()
    }

    /// Resolve a `KeyboardEvent.key` string. Multi-character names
    /// (`"Shift"`, `"ArrowUp"`) never map.
    pub fn lookup(&self, key: &str) -> Option<(char, f64)> {
        let ch = single_char(key)?;
        self.frequency(ch).map(|f| (ch, f))
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (char, f64)> + '_ {
        self.keys.iter().map(|(&k, &f)| (k, f))
    }
}

fn single_char(s: &str) -> Option<char> {
    let mut chars = s.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Some(c),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_map_spans_an_octave() {
        let map = KeyMap::default();
        assert_eq!(map.len(), 13);
        assert_eq!(map.frequency('z'), Some(261.63));
        assert_eq!(map.frequency('n'), Some(440.0));
        assert_eq!(map.frequency(','), Some(523.25));
        assert_eq!(map.frequency('q'), None);
    }

    #[test]
    fn lookup_ignores_named_keys() {
        let map = KeyMap::default();
        assert_eq!(map.lookup("x"), Some(('x', 293.66)));
        assert_eq!(map.lookup("Shift"), None);
        assert_eq!(map.lookup(""), None);
    }

    #[test]
    fn custom_entries_replace_the_map() {
        let map = KeyMap::from_entries([("a", 220.0), ("k", 880.0)]).unwrap();
        assert_eq!(map.len(), 2);
        assert_eq!(map.frequency('a'), Some(220.0));
        assert_eq!(map.frequency('z'), None);
    }

    #[test]
    fn rejects_bad_entries() {
        let err = KeyMap::from_entries([("ab", 220.0)]).unwrap_err();
        assert!(matches!(err, SynthError::InvalidKeyMap { ref key, .. } if key == "ab"));
        let err = KeyMap::from_entries([("a", -1.0)]).unwrap_err();
        assert!(err.to_string().contains("must be positive"), "got: {err}");
    }
}
