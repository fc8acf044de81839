//! Chord quality registry

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::OmnifyError;

/// Chord quality. Declaration order is significant: CC-range selection
/// partitions the controller range in this order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ChordQuality {
    #[serde(rename = "MAJOR")]
    Major,
    #[serde(rename = "MINOR")]
    Minor,
    #[serde(rename = "DOM_7", alias = "DOMINANT_7")]
    Dominant7,
    #[serde(rename = "MAJOR_7")]
    Major7,
    #[serde(rename = "MINOR_7")]
    Minor7,
    #[serde(rename = "DIM_7")]
    Diminished7,
    #[serde(rename = "AUGMENTED")]
    Augmented,
    #[serde(rename = "SUS_4")]
    Sus4,
    #[serde(rename = "ADD_9")]
    Add9,
}

impl ChordQuality {
    pub const ALL: [ChordQuality; 9] = [
        Self::Major,
        Self::Minor,
        Self::Dominant7,
        Self::Major7,
        Self::Minor7,
        Self::Diminished7,
        Self::Augmented,
        Self::Sus4,
        Self::Add9,
    ];

    /// Semitone offsets from the root. Tetrads are root/third/fifth/seventh.
    pub fn offsets(&self) -> &'static [i32] {
        match self {
            Self::Major => &[0, 4, 7],
            Self::Minor => &[0, 3, 7],
            Self::Dominant7 => &[0, 4, 7, 10],
            Self::Major7 => &[0, 4, 7, 11],
            Self::Minor7 => &[0, 3, 7, 10],
            Self::Diminished7 => &[0, 3, 6, 9],
            Self::Augmented => &[0, 4, 8],
            Self::Sus4 => &[0, 5, 7],
            Self::Add9 => &[0, 4, 7, 14],
        }
    }

    /// Three-note reduction used by strum voicings: tetrads drop the fifth.
    pub fn triad(&self) -> [i32; 3] {
        let offsets = self.offsets();
        [offsets[0], offsets[1], offsets[offsets.len() - 1]]
    }

    /// Serialization key, as used in settings and chord files
    pub fn key(&self) -> &'static str {
        match self {
            Self::Major => "MAJOR",
            Self::Minor => "MINOR",
            Self::Dominant7 => "DOM_7",
            Self::Major7 => "MAJOR_7",
            Self::Minor7 => "MINOR_7",
            Self::Diminished7 => "DIM_7",
            Self::Augmented => "AUGMENTED",
            Self::Sus4 => "SUS_4",
            Self::Add9 => "ADD_9",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Major => "Major",
            Self::Minor => "Minor",
            Self::Dominant7 => "Dominant 7th",
            Self::Major7 => "Major 7th",
            Self::Minor7 => "Minor 7th",
            Self::Diminished7 => "Diminished 7th",
            Self::Augmented => "Augmented",
            Self::Sus4 => "Suspended 4th",
            Self::Add9 => "Add 9",
        }
    }

    /// Chord symbol suffix, e.g. "m7" for Cm7
    pub fn suffix(&self) -> &'static str {
        match self {
            Self::Major => "maj",
            Self::Minor => "m",
            Self::Dominant7 => "7",
            Self::Major7 => "maj7",
            Self::Minor7 => "m7",
            Self::Diminished7 => "dim7",
            Self::Augmented => "aug",
            Self::Sus4 => "sus4",
            Self::Add9 => "add9",
        }
    }

    /// Quality in effect before the player selects one
    pub fn default_enqueued() -> Self {
        Self::Major
    }

    pub fn index(&self) -> usize {
        *self as usize
    }

    /// Map a 0-127 controller value onto a quality, one equal region each
    pub fn from_cc_range(value: u8) -> Self {
        let region_size = 128.0 / Self::ALL.len() as f64;
        let idx = (value as f64 / region_size) as usize;
        Self::ALL[idx.min(Self::ALL.len() - 1)]
    }
}

impl FromStr for ChordQuality {
    type Err = OmnifyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "DOMINANT_7" {
            return Ok(Self::Dominant7);
        }
        Self::ALL
            .into_iter()
            .find(|q| q.key() == s)
            .ok_or_else(|| OmnifyError::UnknownQuality(s.to_string()))
    }
}

impl fmt::Display for ChordQuality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offsets_start_at_root() {
        for q in ChordQuality::ALL {
            let offsets = q.offsets();
            assert_eq!(offsets[0], 0, "{q:?}");
            assert!(offsets.len() == 3 || offsets.len() == 4, "{q:?}");
        }
    }

    #[test]
    fn test_triad_drops_fifth() {
        assert_eq!(ChordQuality::Major.triad(), [0, 4, 7]);
        assert_eq!(ChordQuality::Dominant7.triad(), [0, 4, 10]);
        assert_eq!(ChordQuality::Diminished7.triad(), [0, 3, 9]);
        assert_eq!(ChordQuality::Add9.triad(), [0, 4, 14]);
    }

    #[test]
    fn test_index_follows_declaration_order() {
        for (i, q) in ChordQuality::ALL.iter().enumerate() {
            assert_eq!(q.index(), i);
        }
    }

    #[test]
    fn test_cc_range_partitions_in_order() {
        assert_eq!(ChordQuality::from_cc_range(0), ChordQuality::Major);
        assert_eq!(ChordQuality::from_cc_range(14), ChordQuality::Major);
        assert_eq!(ChordQuality::from_cc_range(15), ChordQuality::Minor);
        assert_eq!(ChordQuality::from_cc_range(127), ChordQuality::Add9);
    }

    #[test]
    fn test_parse_key() {
        assert_eq!("DOM_7".parse::<ChordQuality>().unwrap(), ChordQuality::Dominant7);
        assert_eq!("DOMINANT_7".parse::<ChordQuality>().unwrap(), ChordQuality::Dominant7);
        assert!(matches!("POWER".parse::<ChordQuality>(), Err(OmnifyError::UnknownQuality(_))));
    }
}
