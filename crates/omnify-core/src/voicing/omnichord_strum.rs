//! Omnichord-style strum
//!
//! Every triad tone is snapped up to the first instance at or above a
//! reference F# in each octave band, so the strum plate always covers the same
//! register no matter which root is held.

use super::VoicingStyle;
use crate::chord_quality::ChordQuality;
use crate::error::Result;

const REFERENCE_PITCH_CLASS: i32 = 6;

/// Lowest reference pitch (an F#) at or below `root + 6`
pub(super) fn lowest_reference(root: i32) -> i32 {
    let shifted = (root - REFERENCE_PITCH_CLASS).max(0);
    (shifted / 12) * 12 + REFERENCE_PITCH_CLASS
}

/// Place `note`'s pitch class within the octave starting at `reference`
pub(super) fn snap(reference: i32, note: i32) -> i32 {
    let mut delta = note.rem_euclid(12) - REFERENCE_PITCH_CLASS;
    if delta < 0 {
        delta += 12;
    }
    reference + delta
}

#[derive(Debug, Clone, Copy, Default)]
pub struct OmnichordStrum;

impl VoicingStyle for OmnichordStrum {
    fn name(&self) -> &str { "Omnichord Strum" }

    fn construct_chord(&self, quality: ChordQuality, root: u8) -> Result<Vec<i32>> {
        let root = root as i32;
        let triad = quality.triad();
        let base = lowest_reference(root);

        let mut res = Vec::with_capacity(15);
        for octave in [-12, 0, 12, 24, 36] {
            let reference = base + octave;
            res.extend(triad.iter().map(|o| snap(reference, root + o)));
        }
        // 5 octaves of 3 gives 15; the plate has 13 zones
        res.truncate(super::STRUM_ZONES);
        Ok(res)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_major_at_middle_c() {
        assert_eq!(
            OmnichordStrum.construct_chord(ChordQuality::Major, 60).unwrap(),
            vec![48, 52, 43, 60, 64, 55, 72, 76, 67, 84, 88, 79, 96]
        );
    }

    #[test]
    fn test_lowest_reference() {
        assert_eq!(lowest_reference(60), 54);
        assert_eq!(lowest_reference(66), 66);
        assert_eq!(lowest_reference(65), 54);
        assert_eq!(lowest_reference(0), 6);
    }

    #[test]
    fn test_snap_stays_in_band() {
        for note in 0..128 {
            let snapped = snap(54, note);
            assert!((54..66).contains(&snapped));
            assert_eq!(snapped % 12, note % 12);
        }
    }

    #[test]
    fn test_groups_rise_by_octave() {
        for q in ChordQuality::ALL {
            for root in [30u8, 60, 61, 66, 71] {
                let notes = OmnichordStrum.construct_chord(q, root).unwrap();
                assert_eq!(notes.len(), 13);
                for i in 3..13 {
                    assert_eq!(notes[i] - notes[i - 3], 12, "{q:?} root {root}: {notes:?}");
                }
            }
        }
    }
}
