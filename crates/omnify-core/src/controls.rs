//! Control inputs: buttons and chord quality selection

use serde::{Deserialize, Serialize};

use crate::chord_quality::ChordQuality;
use crate::dispatcher::Claim;
use crate::midi::MidiMessage;

/// CC values above this count as "pressed"
const CC_PRESSED_THRESHOLD: u8 = 63;

/// What a button press asks for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonAction {
    Flip,
    On,
    Off,
}

impl ButtonAction {
    pub fn apply(self, current: bool) -> bool {
        match self {
            Self::Flip => !current,
            Self::On => true,
            Self::Off => false,
        }
    }
}

/// A note or CC acting as a button
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum MidiButton {
    /// Any press of the note flips
    #[serde(rename = "MidiNoteButton")]
    Note { note: u8 },
    /// Toggle controllers report their state; momentary ones flip
    #[serde(rename = "MidiCCButton")]
    Cc { cc: u8, is_toggle: bool },
}

impl MidiButton {
    pub fn classify(&self, msg: &MidiMessage) -> Claim<ButtonAction> {
        match (*self, *msg) {
            (Self::Note { note }, MidiMessage::NoteOn { pitch, velocity, .. }) if pitch == note && velocity > 0 => {
                Claim::Claimed(ButtonAction::Flip)
            }
            (Self::Cc { cc, is_toggle }, MidiMessage::ControlChange { control, value, .. }) if control == cc => {
                Claim::Claimed(match (is_toggle, value > CC_PRESSED_THRESHOLD) {
                    (false, _) => ButtonAction::Flip,
                    (true, true) => ButtonAction::On,
                    (true, false) => ButtonAction::Off,
                })
            }
            _ => Claim::NoMatch,
        }
    }

    pub fn note(&self) -> Option<u8> {
        match *self {
            Self::Note { note } => Some(note),
            Self::Cc { .. } => None,
        }
    }

    pub(crate) fn number(&self) -> u8 {
        match *self {
            Self::Note { note } => note,
            Self::Cc { cc, .. } => cc,
        }
    }
}

/// A note or CC number bound to a quality
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QualityBinding {
    pub number: u8,
    pub quality: ChordQuality,
}

/// How the player picks the next chord quality
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum QualitySelector {
    /// Dedicated notes and/or buttons, one per quality
    ButtonPerChordQuality {
        #[serde(default)]
        notes: Vec<QualityBinding>,
        #[serde(default)]
        ccs: Vec<QualityBinding>,
    },
    /// One controller swept across all qualities in declaration order
    #[serde(rename = "CCRangePerChordQuality")]
    CcRangePerChordQuality { cc: u8 },
}

impl QualitySelector {
    pub fn classify(&self, msg: &MidiMessage) -> Claim<ChordQuality> {
        match (self, *msg) {
            (Self::ButtonPerChordQuality { notes, .. }, MidiMessage::NoteOn { pitch, velocity, .. }) if velocity > 0 => {
                lookup(notes, pitch).into()
            }
            (Self::ButtonPerChordQuality { ccs, .. }, MidiMessage::ControlChange { control, value, .. })
                if value > CC_PRESSED_THRESHOLD =>
            {
                lookup(ccs, control).into()
            }
            (Self::CcRangePerChordQuality { cc }, MidiMessage::ControlChange { control, value, .. }) if control == *cc => {
                Claim::Claimed(ChordQuality::from_cc_range(value))
            }
            _ => Claim::NoMatch,
        }
    }

    /// Notes that select a quality rather than play a chord
    pub fn notes(&self) -> impl Iterator<Item = u8> + '_ {
        let notes: &[QualityBinding] = match self {
            Self::ButtonPerChordQuality { notes, .. } => notes,
            Self::CcRangePerChordQuality { .. } => &[],
        };
        notes.iter().map(|b| b.number)
    }

    /// Qualities the player can reach through this selector
    pub fn qualities(&self) -> Vec<ChordQuality> {
        match self {
            Self::ButtonPerChordQuality { notes, ccs } => notes.iter().chain(ccs).map(|b| b.quality).collect(),
            Self::CcRangePerChordQuality { .. } => ChordQuality::ALL.to_vec(),
        }
    }

    pub(crate) fn numbers(&self) -> Vec<u8> {
        match self {
            Self::ButtonPerChordQuality { notes, ccs } => notes.iter().chain(ccs).map(|b| b.number).collect(),
            Self::CcRangePerChordQuality { cc } => vec![*cc],
        }
    }
}

fn lookup(bindings: &[QualityBinding], number: u8) -> Option<ChordQuality> {
    bindings.iter().find(|b| b.number == number).map(|b| b.quality)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn default_selector() -> QualitySelector {
        QualitySelector::ButtonPerChordQuality {
            notes: vec![
                QualityBinding { number: 0, quality: ChordQuality::Major },
                QualityBinding { number: 1, quality: ChordQuality::Minor },
            ],
            ccs: vec![QualityBinding { number: 20, quality: ChordQuality::Dominant7 }],
        }
    }

    #[test]
    fn test_note_button_flips_on_press_only() {
        let button = MidiButton::Note { note: 10 };
        assert_eq!(button.classify(&MidiMessage::note_on(0, 10, 90)), Claim::Claimed(ButtonAction::Flip));
        assert_eq!(button.classify(&MidiMessage::note_on(0, 10, 0)), Claim::NoMatch);
        assert_eq!(button.classify(&MidiMessage::note_off(0, 10, 0)), Claim::NoMatch);
        assert_eq!(button.classify(&MidiMessage::note_on(0, 11, 90)), Claim::NoMatch);
    }

    #[test]
    fn test_cc_toggle_reports_state() {
        let button = MidiButton::Cc { cc: 102, is_toggle: true };
        assert_eq!(button.classify(&MidiMessage::control_change(0, 102, 127)), Claim::Claimed(ButtonAction::On));
        assert_eq!(button.classify(&MidiMessage::control_change(0, 102, 64)), Claim::Claimed(ButtonAction::On));
        assert_eq!(button.classify(&MidiMessage::control_change(0, 102, 63)), Claim::Claimed(ButtonAction::Off));
        assert_eq!(button.classify(&MidiMessage::control_change(0, 102, 0)), Claim::Claimed(ButtonAction::Off));
        assert_eq!(button.classify(&MidiMessage::control_change(0, 103, 0)), Claim::NoMatch);
    }

    #[test]
    fn test_cc_momentary_flips() {
        let button = MidiButton::Cc { cc: 103, is_toggle: false };
        assert_eq!(button.classify(&MidiMessage::control_change(0, 103, 0)), Claim::Claimed(ButtonAction::Flip));
    }

    #[test]
    fn test_button_action_apply() {
        assert!(ButtonAction::Flip.apply(false));
        assert!(!ButtonAction::Flip.apply(true));
        assert!(ButtonAction::On.apply(false));
        assert!(!ButtonAction::Off.apply(true));
    }

    #[test]
    fn test_button_per_quality() {
        let selector = default_selector();
        assert_eq!(selector.classify(&MidiMessage::note_on(0, 1, 50)), Claim::Claimed(ChordQuality::Minor));
        assert_eq!(selector.classify(&MidiMessage::note_on(0, 1, 0)), Claim::NoMatch);
        assert_eq!(selector.classify(&MidiMessage::note_on(0, 60, 50)), Claim::NoMatch);
        assert_eq!(selector.classify(&MidiMessage::control_change(0, 20, 127)), Claim::Claimed(ChordQuality::Dominant7));
        assert_eq!(selector.classify(&MidiMessage::control_change(0, 20, 0)), Claim::NoMatch);
        assert_eq!(selector.notes().collect::<Vec<_>>(), vec![0, 1]);
    }

    #[test]
    fn test_cc_range_covers_all_qualities() {
        let selector = QualitySelector::CcRangePerChordQuality { cc: 74 };
        assert_eq!(selector.classify(&MidiMessage::control_change(0, 74, 0)), Claim::Claimed(ChordQuality::Major));
        assert_eq!(selector.classify(&MidiMessage::control_change(0, 74, 127)), Claim::Claimed(ChordQuality::Add9));
        assert_eq!(selector.classify(&MidiMessage::control_change(0, 75, 0)), Claim::NoMatch);
        assert_eq!(selector.qualities().len(), ChordQuality::ALL.len());
    }
}
