//! Full chord folded into the root's octave

use super::VoicingStyle;
use crate::chord_quality::ChordQuality;
use crate::error::Result;

/// Every chord tone keeps its pitch class but lands in the octave that starts
/// at the C at or below the root
#[derive(Debug, Clone, Copy, Default)]
pub struct SmoothedFull;

impl VoicingStyle for SmoothedFull {
    fn name(&self) -> &str { "Smoothed Full" }

    fn construct_chord(&self, quality: ChordQuality, root: u8) -> Result<Vec<i32>> {
        let root = root as i32;
        let octave_start = (root / 12) * 12;
        Ok(quality.offsets().iter().map(|o| octave_start + (root + o).rem_euclid(12)).collect())
    }
}
