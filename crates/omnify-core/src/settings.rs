//! Settings and the resolved engine configuration

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::chord_quality::ChordQuality;
use crate::controls::{MidiButton, QualityBinding, QualitySelector};
use crate::error::{OmnifyError, Result};
use crate::scheduler::MAX_DELAY_SECS;
use crate::voicing::{ChordStyleConfig, PlainAscendingStrum, RootPosition, StrumStyleConfig, Voicing, VoicingModifier};

/// User-facing settings, as stored on disk (TOML)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Output channel for chords, 1-16
    pub chord_channel: u8,
    /// Output channel for strum notes, 1-16
    pub strum_channel: u8,
    /// Minimum time before the same strum zone retriggers
    pub strum_cooldown_secs: f64,
    /// How long each strum note sounds
    pub strum_gate_time_secs: f64,
    /// Controller acting as the strum plate
    pub strum_plate_cc: u8,
    #[serde(default)]
    pub voicing_modifier: VoicingModifier,
    pub chord_voicing_style: ChordStyleConfig,
    pub strum_voicing_style: StrumStyleConfig,
    pub chord_quality_selection_style: QualitySelector,
    pub latch_toggle_button: MidiButton,
    pub stop_button: MidiButton,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            chord_channel: 1,
            strum_channel: 2,
            strum_cooldown_secs: 0.3,
            strum_gate_time_secs: 0.5,
            strum_plate_cc: 1,
            voicing_modifier: VoicingModifier::None,
            chord_voicing_style: ChordStyleConfig::RootPosition,
            strum_voicing_style: StrumStyleConfig::PlainAscending,
            chord_quality_selection_style: QualitySelector::ButtonPerChordQuality {
                notes: vec![
                    QualityBinding { number: 0, quality: ChordQuality::Major },
                    QualityBinding { number: 1, quality: ChordQuality::Minor },
                    QualityBinding { number: 2, quality: ChordQuality::Dominant7 },
                ],
                ccs: vec![],
            },
            latch_toggle_button: MidiButton::Cc { cc: 102, is_toggle: true },
            stop_button: MidiButton::Cc { cc: 103, is_toggle: false },
        }
    }
}

impl Settings {
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let settings: Self = toml::from_str(s)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn to_toml_string(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let settings = Self::from_toml_str(&text)?;
        info!(path = %path.display(), "Loaded settings");
        Ok(settings)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, self.to_toml_string()?)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        for (name, channel) in [("chord_channel", self.chord_channel), ("strum_channel", self.strum_channel)] {
            if !(1..=16).contains(&channel) {
                return Err(invalid(format!("{name} must be 1-16, got {channel}")));
            }
        }
        for (name, secs) in [
            ("strum_cooldown_secs", self.strum_cooldown_secs),
            ("strum_gate_time_secs", self.strum_gate_time_secs),
        ] {
            if !(0.0..=MAX_DELAY_SECS).contains(&secs) {
                return Err(invalid(format!("{name} must be 0-{MAX_DELAY_SECS} seconds, got {secs}")));
            }
        }

        let mut numbers = vec![("strum_plate_cc", self.strum_plate_cc)];
        numbers.extend(self.chord_quality_selection_style.numbers().into_iter().map(|n| ("chord quality selector", n)));
        numbers.push(("latch_toggle_button", self.latch_toggle_button.number()));
        numbers.push(("stop_button", self.stop_button.number()));
        if let Some((name, n)) = numbers.into_iter().find(|(_, n)| *n > 127) {
            return Err(invalid(format!("{name} must be 0-127, got {n}")));
        }
        Ok(())
    }

    /// Notes reserved for controls; these never start a chord
    pub fn is_control_note(&self, note: u8) -> bool {
        self.chord_quality_selection_style.notes().any(|n| n == note)
            || self.latch_toggle_button.note() == Some(note)
            || self.stop_button.note() == Some(note)
    }

    /// Qualities the engine may be asked to voice: the start-up default plus
    /// whatever the selector can reach
    pub fn reachable_qualities(&self) -> Vec<ChordQuality> {
        let mut qualities = vec![ChordQuality::default_enqueued()];
        for q in self.chord_quality_selection_style.qualities() {
            if !qualities.contains(&q) {
                qualities.push(q);
            }
        }
        qualities
    }

    /// 0-based wire channel for chord output
    pub fn chord_channel_index(&self) -> u8 {
        self.chord_channel.saturating_sub(1)
    }

    /// 0-based wire channel for strum output
    pub fn strum_channel_index(&self) -> u8 {
        self.strum_channel.saturating_sub(1)
    }
}

fn invalid(msg: String) -> OmnifyError {
    OmnifyError::InvalidSetting(msg)
}

/// Immutable snapshot the engine runs from: validated settings plus the
/// constructed voicing styles. Replaced whole, never mutated in place.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub settings: Settings,
    pub chord_voicing: Voicing,
    pub strum_voicing: Voicing,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            settings: Settings::default(),
            chord_voicing: Voicing::RootPosition(RootPosition),
            strum_voicing: Voicing::PlainAscending(PlainAscendingStrum),
        }
    }
}

impl EngineConfig {
    /// Validate `settings` and build its voicing styles. Relative chord file
    /// paths resolve against `base_dir`.
    pub fn new(settings: Settings, base_dir: &Path) -> Result<Self> {
        settings.validate()?;
        let required = settings.reachable_qualities();
        let chord_voicing = settings.chord_voicing_style.build(base_dir, &required)?;
        let strum_voicing = settings.strum_voicing_style.build(base_dir, &required)?;
        info!(chord = chord_voicing.name(), strum = strum_voicing.name(), "Voicing styles ready");
        Ok(Self { settings, chord_voicing, strum_voicing })
    }

    /// Load settings from `path`, resolving chord files next to it
    pub fn load(path: &Path) -> Result<Self> {
        let settings = Settings::load(path)?;
        let base_dir = path.parent().unwrap_or(Path::new("."));
        Self::new(settings, base_dir)
    }
}
