//! MIDI messages flowing into and out of the engine

use std::fmt;

/// A channel voice message. Channels are 0-15 on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MidiMessage {
    NoteOn { channel: u8, pitch: u8, velocity: u8 },
    NoteOff { channel: u8, pitch: u8, velocity: u8 },
    ControlChange { channel: u8, control: u8, value: u8 },
}

impl MidiMessage {
    pub fn note_on(channel: u8, pitch: u8, velocity: u8) -> Self {
        Self::NoteOn { channel, pitch, velocity }
    }

    pub fn note_off(channel: u8, pitch: u8, velocity: u8) -> Self {
        Self::NoteOff { channel, pitch, velocity }
    }

    pub fn control_change(channel: u8, control: u8, value: u8) -> Self {
        Self::ControlChange { channel, control, value }
    }

    pub fn channel(&self) -> u8 {
        match *self {
            Self::NoteOn { channel, .. }
            | Self::NoteOff { channel, .. }
            | Self::ControlChange { channel, .. } => channel,
        }
    }

    /// Note-on with non-zero velocity
    pub fn is_note_on(&self) -> bool {
        matches!(self, Self::NoteOn { velocity, .. } if *velocity > 0)
    }

    /// Note-off, or note-on with velocity 0 (running-status convention)
    pub fn is_note_off(&self) -> bool {
        matches!(self, Self::NoteOff { .. } | Self::NoteOn { velocity: 0, .. })
    }

    /// Pitch of a note message of either kind
    pub fn pitch(&self) -> Option<u8> {
        match *self {
            Self::NoteOn { pitch, .. } | Self::NoteOff { pitch, .. } => Some(pitch),
            Self::ControlChange { .. } => None,
        }
    }

    /// Value of a control change on `control`
    pub fn cc_value(&self, control: u8) -> Option<u8> {
        match *self {
            Self::ControlChange { control: c, value, .. } if c == control => Some(value),
            _ => None,
        }
    }
}

impl fmt::Display for MidiMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoteOn { channel, pitch, velocity } => {
                write!(f, "note_on ch={channel} note={pitch} vel={velocity}")
            }
            Self::NoteOff { channel, pitch, velocity } => {
                write!(f, "note_off ch={channel} note={pitch} vel={velocity}")
            }
            Self::ControlChange { channel, control, value } => {
                write!(f, "cc ch={channel} control={control} value={value}")
            }
        }
    }
}

/// Fold a computed pitch into 0..=127.
///
/// Pitches above the range land in the top octave (108..=119) keeping their
/// pitch class; negative pitches fold to `|p| mod 12`.
pub fn clamp_note(note: i32) -> u8 {
    if note > 127 {
        return (note.rem_euclid(12) + 108) as u8;
    }
    if note < 0 {
        return (note.unsigned_abs() % 12) as u8;
    }
    note as u8
}
