//! omnify-core: Chord engine, voicings, and MIDI routing for an omnichord-style controller

pub mod chord_quality;
pub mod controls;
pub mod dispatcher;
pub mod engine;
mod error;
pub mod midi;
pub mod scheduler;
pub mod settings;
pub mod voicing;

pub use chord_quality::ChordQuality;
pub use controls::{ButtonAction, MidiButton, QualityBinding, QualitySelector};
pub use dispatcher::{Claim, EventDispatcher};
pub use engine::{strum_zone, ChordEngine, EngineState, Omnify, RealtimeParams};
pub use error::{OmnifyError, Result, SinkError};
pub use midi::{clamp_note, MidiMessage};
pub use scheduler::{secs_to_duration, MessageScheduler, MidiSink, MAX_DELAY_SECS};
pub use settings::{EngineConfig, Settings};
pub use voicing::{ChordStyleConfig, StrumStyleConfig, Voicing, VoicingModifier, VoicingStyle, STRUM_ZONES};
pub use voicing::{ChordFile, FromFile, Omni84, OmnichordChords, OmnichordStrum, PlainAscendingStrum, RootPosition, SmoothedFull};
