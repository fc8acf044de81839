//! Root position chords

use super::VoicingStyle;
use crate::chord_quality::ChordQuality;
use crate::error::Result;

/// The quality's offsets stacked on the root, in order
#[derive(Debug, Clone, Copy, Default)]
pub struct RootPosition;

impl VoicingStyle for RootPosition {
    fn name(&self) -> &str { "Root Position" }

    fn construct_chord(&self, quality: ChordQuality, root: u8) -> Result<Vec<i32>> {
        let root = root as i32;
        Ok(quality.offsets().iter().map(|&o| root + o).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_position() {
        assert_eq!(RootPosition.construct_chord(ChordQuality::Major, 60).unwrap(), vec![60, 64, 67]);
        assert_eq!(RootPosition.construct_chord(ChordQuality::Minor, 60).unwrap(), vec![60, 63, 67]);
        assert_eq!(RootPosition.construct_chord(ChordQuality::Dominant7, 62).unwrap(), vec![62, 66, 69, 72]);
    }

    #[test]
    fn test_root_position_preserves_offset_order() {
        for q in ChordQuality::ALL {
            for root in [0u8, 37, 120, 127] {
                let notes = RootPosition.construct_chord(q, root).unwrap();
                assert_eq!(notes.len(), q.offsets().len());
                for (n, o) in notes.iter().zip(q.offsets()) {
                    assert_eq!(*n, root as i32 + o);
                }
            }
        }
    }
}
