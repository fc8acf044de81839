//! One note per chord, in an octave chosen by quality

use super::VoicingStyle;
use crate::chord_quality::ChordQuality;
use crate::error::Result;

/// Maps each quality to its own octave so a downstream sampler can hold one
/// patch per quality across 84 keys.
#[derive(Debug, Clone, Copy, Default)]
pub struct Omni84;

impl Omni84 {
    pub fn octave_base(quality: ChordQuality) -> i32 {
        match quality {
            ChordQuality::Minor => 48,
            ChordQuality::Dominant7 => 60,
            ChordQuality::Minor7 => 72,
            ChordQuality::Major7 => 84,
            ChordQuality::Diminished7 => 96,
            ChordQuality::Augmented => 108,
            // no patch of their own; share the major octave
            ChordQuality::Major | ChordQuality::Sus4 | ChordQuality::Add9 => 36,
        }
    }
}

impl VoicingStyle for Omni84 {
    fn name(&self) -> &str { "Omni-84" }

    fn construct_chord(&self, quality: ChordQuality, root: u8) -> Result<Vec<i32>> {
        Ok(vec![Self::octave_base(quality) + (root % 12) as i32])
    }
}
