//! Voicing tables loaded from JSON chord files
//!
//! A chord file holds, per quality, one entry for each of the twelve root
//! pitch classes. Entries are offsets from the played root when
//! `is_offset_file` is set, otherwise absolute pitches.
//!
//! ```json
//! {
//!   "name": "Close voiced",
//!   "description": "...",
//!   "is_offset_file": true,
//!   "chords": { "MAJOR": { "0": [0, 4, 7], "1": [-8, -5, 0], ... } }
//! }
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::VoicingStyle;
use crate::chord_quality::ChordQuality;
use crate::error::{OmnifyError, Result};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChordFile {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(alias = "isOffsetFile")]
    pub is_offset_file: bool,
    pub chords: BTreeMap<ChordQuality, BTreeMap<u8, Vec<i32>>>,
}

#[derive(Debug, Clone)]
pub struct FromFile {
    data: ChordFile,
}

impl FromFile {
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let data: ChordFile = serde_json::from_str(&text).map_err(|source| OmnifyError::ChordFile {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(path = %path.display(), name = %data.name, "Loaded chord file");
        Self::from_chord_file(data)
    }

    /// Every quality present must have an entry for each pitch class 0-11
    pub fn from_chord_file(data: ChordFile) -> Result<Self> {
        for (&quality, by_class) in &data.chords {
            if let Some(&bad) = by_class.keys().find(|&&pc| pc > 11) {
                return Err(OmnifyError::InvalidSetting(format!(
                    "chord file {:?}: {} has pitch class {bad}, expected 0-11",
                    data.name,
                    quality.key()
                )));
            }
            if let Some(pitch_class) = (0..12u8).find(|pc| !by_class.contains_key(pc)) {
                return Err(OmnifyError::MissingVoicing { quality, pitch_class });
            }
        }
        Ok(Self { data })
    }

    /// Fail unless every quality in `required` has a table
    pub fn check_covers(&self, required: &[ChordQuality]) -> Result<()> {
        match required.iter().find(|q| !self.data.chords.contains_key(q)) {
            Some(&quality) => Err(OmnifyError::MissingVoicing { quality, pitch_class: 0 }),
            None => Ok(()),
        }
    }

    /// Fail unless every entry holds at least `min` notes
    pub fn check_min_len(&self, min: usize) -> Result<()> {
        for (&quality, by_class) in &self.data.chords {
            for (&pitch_class, notes) in by_class {
                if notes.len() < min {
                    return Err(OmnifyError::WrongStrumLength { quality, pitch_class, len: notes.len(), min });
                }
            }
        }
        Ok(())
    }

    pub fn data(&self) -> &ChordFile {
        &self.data
    }
}

impl VoicingStyle for FromFile {
    fn name(&self) -> &str { &self.data.name }

    fn construct_chord(&self, quality: ChordQuality, root: u8) -> Result<Vec<i32>> {
        let pitch_class = root % 12;
        let entry = self
            .data
            .chords
            .get(&quality)
            .and_then(|by_class| by_class.get(&pitch_class))
            .ok_or(OmnifyError::MissingVoicing { quality, pitch_class })?;

        if self.data.is_offset_file {
            let root = root as i32;
            return Ok(entry.iter().map(|o| root + o).collect());
        }
        Ok(entry.clone())
    }
}
