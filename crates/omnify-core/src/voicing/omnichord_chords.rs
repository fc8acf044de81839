//! Omnichord-style chord voicing: the triad folded into one F#-based octave

use super::VoicingStyle;
use super::omnichord_strum::{lowest_reference, snap};
use crate::chord_quality::ChordQuality;
use crate::error::Result;

/// Reference used when not following the root's octave
const FIXED_REFERENCE: i32 = 54;

#[derive(Debug, Clone, Copy)]
pub struct OmnichordChords {
    /// Follow the played root's octave instead of a fixed register
    relative: bool,
}

impl OmnichordChords {
    pub fn new(relative: bool) -> Self {
        Self { relative }
    }
}

impl VoicingStyle for OmnichordChords {
    fn name(&self) -> &str { "Omnichord" }

    fn construct_chord(&self, quality: ChordQuality, root: u8) -> Result<Vec<i32>> {
        let root = root as i32;
        let reference = if self.relative { lowest_reference(root) } else { FIXED_REFERENCE };
        Ok(quality.triad().iter().map(|o| snap(reference, root + o)).collect())
    }
}
