//! Offline rendering: play a Standard MIDI File through the daemon in real
//! time and capture what comes out.
//!
//! Input tracks are merged; tick times become seconds through the file's tempo
//! map. Output is a single-track SMF at a fixed 120 BPM.

use std::path::Path;
use std::thread;
use std::time::{Duration, Instant};

use midly::num::{u15, u24, u28, u4, u7};
use midly::{Format, Header, MetaMessage, Smf, Timing, Track, TrackEvent, TrackEventKind};
use omnify_core::{secs_to_duration, MidiMessage};
use thiserror::Error;
use tracing::{info, warn};

use crate::daemon::{ChannelSource, Daemon, RecordingSink};

/// Ticks per quarter note in written files
const TICKS_PER_QUARTER: u16 = 480;
/// 120 BPM
const OUTPUT_TEMPO_US: u32 = 500_000;
/// SMF default when a file carries no tempo
const DEFAULT_TEMPO_US: u32 = 500_000;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("MIDI parse error: {0}")]
    Parse(#[from] midly::Error),
}

/// A message at an offset from the start of playback
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimedMessage {
    pub secs: f64,
    pub message: MidiMessage,
}

/// Tempo changes as (tick, seconds at that tick, microseconds per quarter)
struct TempoMap {
    ticks_per_quarter: f64,
    changes: Vec<(u64, f64, u32)>,
}

impl TempoMap {
    fn new(ticks_per_quarter: u16, mut tempos: Vec<(u64, u32)>) -> Self {
        let ticks_per_quarter = ticks_per_quarter.max(1) as f64;
        tempos.sort_by_key(|(tick, _)| *tick);

        let mut changes = vec![(0, 0.0, DEFAULT_TEMPO_US)];
        for (tick, tempo) in tempos {
            let secs = Self::secs_in(&changes, ticks_per_quarter, tick);
            match changes.last_mut() {
                Some(last) if last.0 == tick => last.2 = tempo,
                _ => changes.push((tick, secs, tempo)),
            }
        }
        Self { ticks_per_quarter, changes }
    }

    fn secs_in(changes: &[(u64, f64, u32)], ticks_per_quarter: f64, tick: u64) -> f64 {
        let idx = changes.partition_point(|(t, _, _)| *t <= tick).saturating_sub(1);
        let (start, secs, tempo) = changes[idx];
        secs + (tick - start) as f64 * tempo as f64 / 1_000_000.0 / ticks_per_quarter
    }

    fn secs_at(&self, tick: u64) -> f64 {
        Self::secs_in(&self.changes, self.ticks_per_quarter, tick)
    }
}

fn from_midly(channel: u4, message: midly::MidiMessage) -> Option<MidiMessage> {
    let channel = channel.as_int();
    match message {
        midly::MidiMessage::NoteOn { key, vel } => Some(MidiMessage::note_on(channel, key.as_int(), vel.as_int())),
        midly::MidiMessage::NoteOff { key, vel } => Some(MidiMessage::note_off(channel, key.as_int(), vel.as_int())),
        midly::MidiMessage::Controller { controller, value } => {
            Some(MidiMessage::control_change(channel, controller.as_int(), value.as_int()))
        }
        _ => None,
    }
}

fn to_midly(message: &MidiMessage) -> (u4, midly::MidiMessage) {
    match *message {
        MidiMessage::NoteOn { channel, pitch, velocity } => (
            u4::from_int_lossy(channel),
            midly::MidiMessage::NoteOn { key: u7::from_int_lossy(pitch), vel: u7::from_int_lossy(velocity) },
        ),
        MidiMessage::NoteOff { channel, pitch, velocity } => (
            u4::from_int_lossy(channel),
            midly::MidiMessage::NoteOff { key: u7::from_int_lossy(pitch), vel: u7::from_int_lossy(velocity) },
        ),
        MidiMessage::ControlChange { channel, control, value } => (
            u4::from_int_lossy(channel),
            midly::MidiMessage::Controller {
                controller: u7::from_int_lossy(control),
                value: u7::from_int_lossy(value),
            },
        ),
    }
}

/// Parse an SMF into note and controller messages ordered by time
pub fn parse_smf(bytes: &[u8]) -> Result<Vec<TimedMessage>, RenderError> {
    let smf = Smf::parse(bytes)?;

    let mut tempos = Vec::new();
    let mut raw = Vec::new();
    for track in &smf.tracks {
        let mut tick = 0u64;
        for event in track {
            tick += event.delta.as_int() as u64;
            match &event.kind {
                TrackEventKind::Midi { channel, message } => {
                    if let Some(msg) = from_midly(*channel, *message) {
                        raw.push((tick, msg));
                    }
                }
                TrackEventKind::Meta(MetaMessage::Tempo(tempo)) => tempos.push((tick, tempo.as_int())),
                _ => {}
            }
        }
    }
    // Stable: same-tick events keep track order
    raw.sort_by_key(|(tick, _)| *tick);

    let to_secs: Box<dyn Fn(u64) -> f64> = match smf.header.timing {
        Timing::Metrical(tpq) => {
            let map = TempoMap::new(tpq.as_int(), tempos);
            Box::new(move |tick| map.secs_at(tick))
        }
        Timing::Timecode(fps, subframes) => {
            let ticks_per_sec = fps.as_f32() as f64 * subframes.max(1) as f64;
            Box::new(move |tick| tick as f64 / ticks_per_sec)
        }
    };

    Ok(raw.into_iter().map(|(tick, message)| TimedMessage { secs: to_secs(tick), message }).collect())
}

pub fn load_smf(path: &Path) -> Result<Vec<TimedMessage>, RenderError> {
    let bytes = std::fs::read(path)?;
    let events = parse_smf(&bytes)?;
    info!(path = %path.display(), events = events.len(), "Loaded MIDI file");
    Ok(events)
}

/// Encode messages as a single-track SMF. Events must be in time order.
pub fn encode_smf(events: &[TimedMessage]) -> Result<Vec<u8>, RenderError> {
    let ticks_per_sec = TICKS_PER_QUARTER as f64 * 1_000_000.0 / OUTPUT_TEMPO_US as f64;

    let mut track: Track = Vec::with_capacity(events.len() + 2);
    track.push(TrackEvent {
        delta: u28::new(0),
        kind: TrackEventKind::Meta(MetaMessage::Tempo(u24::new(OUTPUT_TEMPO_US))),
    });

    let mut last_tick = 0u32;
    for event in events {
        let tick = ((event.secs.max(0.0) * ticks_per_sec).round() as u32).max(last_tick);
        let (channel, message) = to_midly(&event.message);
        track.push(TrackEvent {
            delta: u28::from_int_lossy(tick - last_tick),
            kind: TrackEventKind::Midi { channel, message },
        });
        last_tick = tick;
    }
    track.push(TrackEvent { delta: u28::new(0), kind: TrackEventKind::Meta(MetaMessage::EndOfTrack) });

    let mut smf = Smf::new(Header::new(Format::SingleTrack, Timing::Metrical(u15::new(TICKS_PER_QUARTER))));
    smf.tracks.push(track);

    let mut buf = Vec::new();
    smf.write_std(&mut buf)?;
    Ok(buf)
}

pub fn save_smf(path: &Path, events: &[TimedMessage]) -> Result<(), RenderError> {
    let bytes = encode_smf(events)?;
    std::fs::write(path, bytes)?;
    info!(path = %path.display(), events = events.len(), "Wrote MIDI file");
    Ok(())
}

/// Feed `events` into the daemon at their real offsets, keep it running for
/// `tail` after the last one, then stop it. Returns the output with offsets
/// from the start of playback.
pub fn replay(daemon: &mut Daemon, events: Vec<TimedMessage>, tail: Duration) -> Vec<TimedMessage> {
    let (tx, mut source) = ChannelSource::pair();
    let control = daemon.control();
    let start = Instant::now();

    let feeder = thread::spawn(move || {
        for event in events {
            let due = start + secs_to_duration(event.secs);
            let now = Instant::now();
            if due > now {
                thread::sleep(due - now);
            }
            if tx.send(event.message).is_err() {
                break;
            }
        }
        thread::sleep(tail);
        control.request_shutdown();
    });

    let mut sink = RecordingSink::new();
    daemon.run(&mut source, &mut sink);
    if feeder.join().is_err() {
        warn!("Feeder thread panicked");
    }

    sink.into_events()
        .into_iter()
        .map(|(at, message)| TimedMessage { secs: at.saturating_duration_since(start).as_secs_f64(), message })
        .collect()
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use omnify_core::EngineConfig;

    fn midi(delta: u32, channel: u8, message: midly::MidiMessage) -> TrackEvent<'static> {
        TrackEvent { delta: u28::new(delta), kind: TrackEventKind::Midi { channel: u4::new(channel), message } }
    }

    fn key_on(key: u8) -> midly::MidiMessage {
        midly::MidiMessage::NoteOn { key: u7::new(key), vel: u7::new(100) }
    }

    fn write(smf: &Smf) -> Vec<u8> {
        let mut buf = Vec::new();
        smf.write_std(&mut buf).unwrap();
        buf
    }

    #[test]
    fn test_ticks_follow_tempo_changes() {
        let mut smf = Smf::new(Header::new(Format::SingleTrack, Timing::Metrical(u15::new(480))));
        smf.tracks.push(vec![
            midi(0, 0, key_on(60)),
            // one beat at the default 120 BPM
            midi(480, 0, key_on(62)),
            TrackEvent { delta: u28::new(0), kind: TrackEventKind::Meta(MetaMessage::Tempo(u24::new(1_000_000))) },
            // one beat at 60 BPM
            midi(480, 0, key_on(64)),
            TrackEvent { delta: u28::new(0), kind: TrackEventKind::Meta(MetaMessage::EndOfTrack) },
        ]);

        let events = parse_smf(&write(&smf)).unwrap();
        let secs: Vec<f64> = events.iter().map(|e| e.secs).collect();
        assert_eq!(secs, vec![0.0, 0.5, 1.5]);
        assert_eq!(events[2].message, MidiMessage::note_on(0, 64, 100));
    }

    #[test]
    fn test_tracks_merge_in_time_order() {
        let mut smf = Smf::new(Header::new(Format::Parallel, Timing::Metrical(u15::new(96))));
        smf.tracks.push(vec![midi(96, 0, key_on(60))]);
        smf.tracks.push(vec![
            midi(0, 1, midly::MidiMessage::Controller { controller: u7::new(1), value: u7::new(64) }),
            midi(0, 1, midly::MidiMessage::ProgramChange { program: u7::new(3) }),
        ]);

        let events = parse_smf(&write(&smf)).unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].message, MidiMessage::control_change(1, 1, 64));
        assert_eq!(events[1].message, MidiMessage::note_on(0, 60, 100));
    }

    #[test]
    fn test_encoded_file_reads_back() {
        let events = vec![
            TimedMessage { secs: 0.0, message: MidiMessage::note_on(0, 60, 100) },
            TimedMessage { secs: 0.25, message: MidiMessage::control_change(0, 1, 10) },
            TimedMessage { secs: 1.0, message: MidiMessage::note_off(0, 60, 100) },
        ];
        let back = parse_smf(&encode_smf(&events).unwrap()).unwrap();
        assert_eq!(back, events);
    }

    #[test]
    fn test_garbage_is_a_parse_error() {
        assert!(matches!(parse_smf(b"not a midi file"), Err(RenderError::Parse(_))));
    }

    #[test]
    fn test_replay_produces_chord_and_strum() {
        let mut daemon = Daemon::new(Arc::new(EngineConfig::default()));
        daemon.control().set_strum_gate_secs(0.02);
        let input = vec![
            TimedMessage { secs: 0.0, message: MidiMessage::note_on(0, 60, 100) },
            TimedMessage { secs: 0.01, message: MidiMessage::control_change(0, 1, 127) },
            TimedMessage { secs: 0.05, message: MidiMessage::note_off(0, 60, 0) },
        ];

        let output = replay(&mut daemon, input, Duration::from_millis(50));
        let messages: Vec<MidiMessage> = output.iter().map(|e| e.message).collect();
        assert_eq!(messages.len(), 8);
        assert!(messages.contains(&MidiMessage::note_on(1, 96, 100)));
        assert!(messages.contains(&MidiMessage::note_off(1, 96, 0)));
        assert!(output.windows(2).all(|w| w[0].secs <= w[1].secs));
    }
}
