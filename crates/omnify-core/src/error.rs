//! Error types for omnify

use std::path::PathBuf;

use thiserror::Error;

use crate::chord_quality::ChordQuality;

#[derive(Debug, Error)]
pub enum OmnifyError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Chord file {path}: {source}")]
    ChordFile {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("No voicing for {quality:?} at pitch class {pitch_class}")]
    MissingVoicing { quality: ChordQuality, pitch_class: u8 },
    #[error("Strum voicing for {quality:?} at pitch class {pitch_class} has {len} notes, need at least {min}")]
    WrongStrumLength { quality: ChordQuality, pitch_class: u8, len: usize, min: usize },
    #[error("Unknown chord quality: {0}")]
    UnknownQuality(String),
    #[error("Invalid setting: {0}")]
    InvalidSetting(String),
    #[error("Settings parse error: {0}")]
    SettingsParse(#[from] toml::de::Error),
    #[error("Settings serialize error: {0}")]
    SettingsSerialize(#[from] toml::ser::Error),
}

pub type Result<T> = std::result::Result<T, OmnifyError>;

/// An output sink could not take an event right now
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("Sink disconnected")]
    Disconnected,
    #[error("Sink full")]
    Full,
    #[error("Send failed: {0}")]
    Other(String),
}
