//! Octave handling applied around a chord voicing style

use serde::{Deserialize, Serialize};

use super::Voicing;
use crate::chord_quality::ChordQuality;
use crate::error::Result;

const MIDDLE_C: i32 = 60;

/// How the played root's octave feeds into the chord voicing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum VoicingModifier {
    /// Voice at the played root
    #[default]
    None,
    /// Voice in the middle octave whatever octave was played
    Fixed,
    /// Middle-octave voicing, inverted toward the played octave
    Smooth,
}

impl VoicingModifier {
    pub fn apply(&self, style: &Voicing, quality: ChordQuality, root: u8) -> Result<Vec<i32>> {
        let normalized = (MIDDLE_C + (root % 12) as i32) as u8;
        match self {
            Self::None => style.construct_chord(quality, root),
            Self::Fixed => style.construct_chord(quality, normalized),
            Self::Smooth => {
                let notes = style.construct_chord(quality, normalized)?;
                let offsets = notes.iter().map(|n| n - normalized as i32).collect();
                Ok(smooth(offsets, root))
            }
        }
    }
}

/// Sort offsets and shift the outer voices by octave so low roots lean down
/// and high roots lean up, while staying around middle C.
fn smooth(mut offsets: Vec<i32>, root: u8) -> Vec<i32> {
    offsets.sort_unstable();
    let base = MIDDLE_C + (root % 12) as i32;
    let len = offsets.len();

    let mut shifts = vec![0; len];
    match root / 12 {
        3 => shifts.iter_mut().skip(len.saturating_sub(2)).for_each(|s| *s = -12),
        4 => shifts.iter_mut().skip(len.saturating_sub(1)).for_each(|s| *s = -12),
        6 => shifts.iter_mut().take(1).for_each(|s| *s = 12),
        7 => shifts.iter_mut().take(2).for_each(|s| *s = 12),
        _ => {}
    }

    offsets.iter().zip(&shifts).map(|(o, s)| base + o + s).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::voicing::{Omni84, RootPosition};

    #[test]
    fn test_none_passes_root_through() {
        let style = Voicing::RootPosition(RootPosition);
        assert_eq!(VoicingModifier::None.apply(&style, ChordQuality::Major, 40).unwrap(), vec![40, 44, 47]);
    }

    #[test]
    fn test_fixed_uses_middle_octave() {
        let style = Voicing::RootPosition(RootPosition);
        assert_eq!(VoicingModifier::Fixed.apply(&style, ChordQuality::Major, 38).unwrap(), vec![62, 66, 69]);
        assert_eq!(VoicingModifier::Fixed.apply(&style, ChordQuality::Major, 98).unwrap(), vec![62, 66, 69]);
    }

    #[test]
    fn test_smooth_inverts_by_octave() {
        let style = Voicing::RootPosition(RootPosition);
        let q = ChordQuality::Major;
        assert_eq!(VoicingModifier::Smooth.apply(&style, q, 36).unwrap(), vec![60, 52, 55]);
        assert_eq!(VoicingModifier::Smooth.apply(&style, q, 48).unwrap(), vec![60, 64, 55]);
        assert_eq!(VoicingModifier::Smooth.apply(&style, q, 60).unwrap(), vec![60, 64, 67]);
        assert_eq!(VoicingModifier::Smooth.apply(&style, q, 72).unwrap(), vec![72, 64, 67]);
        assert_eq!(VoicingModifier::Smooth.apply(&style, q, 84).unwrap(), vec![72, 76, 67]);
        assert_eq!(VoicingModifier::Smooth.apply(&style, q, 12).unwrap(), vec![60, 64, 67]);
    }

    #[test]
    fn test_smooth_single_note_style() {
        let style = Voicing::Omni84(Omni84);
        let notes = VoicingModifier::Smooth.apply(&style, ChordQuality::Major, 36).unwrap();
        assert_eq!(notes.len(), 1);
    }
}
