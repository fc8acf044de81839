//! Plain ascending strum

use super::VoicingStyle;
use crate::chord_quality::ChordQuality;
use crate::error::Result;

/// Triad repeated over four octaves starting one below the root, capped with
/// the root three octaves up. 13 notes, strictly ascending.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainAscendingStrum;

impl PlainAscendingStrum {
    fn strum_offsets(triad: [i32; 3]) -> Vec<i32> {
        let mut res = Vec::with_capacity(13);
        for shift in [-12, 0, 12, 24] {
            res.extend(triad.iter().map(|o| shift + o));
        }
        res.push(36);
        res
    }
}

impl VoicingStyle for PlainAscendingStrum {
    fn name(&self) -> &str { "Plain Ascending" }

    fn construct_chord(&self, quality: ChordQuality, root: u8) -> Result<Vec<i32>> {
        let root = root as i32;
        Ok(Self::strum_offsets(quality.triad()).into_iter().map(|o| root + o).collect())
    }
}
