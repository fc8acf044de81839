//! Voicing styles: (quality, root) -> output pitches
//!
//! Styles may return pitches outside 0..=127, duplicates, or notes below the
//! root. Clamping happens once, in the engine.

mod from_file;
mod modifier;
mod omni84;
mod omnichord_chords;
mod omnichord_strum;
mod plain_ascending;
mod root_position;
mod smoothed_full;

pub use from_file::{ChordFile, FromFile};
pub use modifier::VoicingModifier;
pub use omni84::Omni84;
pub use omnichord_chords::OmnichordChords;
pub use omnichord_strum::OmnichordStrum;
pub use plain_ascending::PlainAscendingStrum;
pub use root_position::RootPosition;
pub use smoothed_full::SmoothedFull;

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::chord_quality::ChordQuality;
use crate::error::Result;

/// Number of strum zones, and so the minimum length of a strum voicing
pub const STRUM_ZONES: usize = 13;

/// Trait for voicing styles
pub trait VoicingStyle: Send + Sync {
    fn name(&self) -> &str;
    fn construct_chord(&self, quality: ChordQuality, root: u8) -> Result<Vec<i32>>;
}

/// Enum wrapper for all voicing styles
#[derive(Debug, Clone)]
pub enum Voicing {
    RootPosition(RootPosition),
    FromFile(FromFile),
    Omni84(Omni84),
    OmnichordChords(OmnichordChords),
    SmoothedFull(SmoothedFull),
    PlainAscending(PlainAscendingStrum),
    OmnichordStrum(OmnichordStrum),
}

impl Voicing {
    pub fn name(&self) -> &str {
        match self {
            Self::RootPosition(v) => v.name(),
            Self::FromFile(v) => v.name(),
            Self::Omni84(v) => v.name(),
            Self::OmnichordChords(v) => v.name(),
            Self::SmoothedFull(v) => v.name(),
            Self::PlainAscending(v) => v.name(),
            Self::OmnichordStrum(v) => v.name(),
        }
    }

    pub fn construct_chord(&self, quality: ChordQuality, root: u8) -> Result<Vec<i32>> {
        match self {
            Self::RootPosition(v) => v.construct_chord(quality, root),
            Self::FromFile(v) => v.construct_chord(quality, root),
            Self::Omni84(v) => v.construct_chord(quality, root),
            Self::OmnichordChords(v) => v.construct_chord(quality, root),
            Self::SmoothedFull(v) => v.construct_chord(quality, root),
            Self::PlainAscending(v) => v.construct_chord(quality, root),
            Self::OmnichordStrum(v) => v.construct_chord(quality, root),
        }
    }
}

/// Chord voicing style as written in settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ChordStyleConfig {
    RootPosition,
    #[serde(alias = "FileStyle")]
    FromFile { path: PathBuf },
    Omni84,
    Omnichord { relative: bool },
    SmoothedFull,
}

impl Default for ChordStyleConfig {
    fn default() -> Self {
        Self::RootPosition
    }
}

impl ChordStyleConfig {
    /// Build the style, loading and checking any chord file it references.
    /// `required` lists the qualities a file must cover.
    pub fn build(&self, base_dir: &Path, required: &[ChordQuality]) -> Result<Voicing> {
        Ok(match self {
            Self::RootPosition => Voicing::RootPosition(RootPosition),
            Self::FromFile { path } => {
                let file = FromFile::load(&resolve(base_dir, path))?;
                file.check_covers(required)?;
                Voicing::FromFile(file)
            }
            Self::Omni84 => Voicing::Omni84(Omni84),
            Self::Omnichord { relative } => Voicing::OmnichordChords(OmnichordChords::new(*relative)),
            Self::SmoothedFull => Voicing::SmoothedFull(SmoothedFull),
        })
    }
}

/// Strum voicing style as written in settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum StrumStyleConfig {
    #[serde(alias = "PlainAscendingStrumStyle")]
    PlainAscending,
    #[serde(alias = "OmnichordStrumStyle")]
    OmnichordStrum,
    FromFile { path: PathBuf },
}

impl Default for StrumStyleConfig {
    fn default() -> Self {
        Self::PlainAscending
    }
}

impl StrumStyleConfig {
    /// Build the style. File-based strums must hold a note for every zone.
    pub fn build(&self, base_dir: &Path, required: &[ChordQuality]) -> Result<Voicing> {
        Ok(match self {
            Self::PlainAscending => Voicing::PlainAscending(PlainAscendingStrum),
            Self::OmnichordStrum => Voicing::OmnichordStrum(OmnichordStrum),
            Self::FromFile { path } => {
                let file = FromFile::load(&resolve(base_dir, path))?;
                file.check_covers(required)?;
                file.check_min_len(STRUM_ZONES)?;
                Voicing::FromFile(file)
            }
        })
    }
}

fn resolve(base_dir: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        return path.to_path_buf();
    }
    base_dir.join(path)
}
