//! omnify-services: Run loop, control handle, and MIDI file rendering

pub mod daemon;
pub mod render;

pub use daemon::{ChannelSink, ChannelSource, ControlHandle, Daemon, DaemonError, EventSource, RecordingSink, POLL_INTERVAL};
pub use render::{encode_smf, load_smf, parse_smf, replay, save_smf, RenderError, TimedMessage};
