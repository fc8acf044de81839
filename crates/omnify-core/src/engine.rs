//! Chord engine: turns root notes, control buttons and the strum plate into a
//! sustained chord plus strummed notes

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, error, info};

use crate::chord_quality::ChordQuality;
use crate::controls::ButtonAction;
use crate::dispatcher::{Claim, EventDispatcher};
use crate::midi::{clamp_note, MidiMessage};
use crate::scheduler::{secs_to_duration, MessageScheduler, MidiSink, MAX_DELAY_SECS};
use crate::settings::EngineConfig;
use crate::voicing::STRUM_ZONES;

/// Strum timings adjustable while running (lock-free reads from the loop)
pub struct RealtimeParams {
    strum_gate_raw: AtomicU64,
    strum_cooldown_raw: AtomicU64,
}

impl RealtimeParams {
    pub fn new(strum_gate_secs: f64, strum_cooldown_secs: f64) -> Self {
        Self {
            strum_gate_raw: AtomicU64::new(bounded_secs(strum_gate_secs).to_bits()),
            strum_cooldown_raw: AtomicU64::new(bounded_secs(strum_cooldown_secs).to_bits()),
        }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(config.settings.strum_gate_time_secs, config.settings.strum_cooldown_secs)
    }

    pub fn strum_gate_secs(&self) -> f64 {
        f64::from_bits(self.strum_gate_raw.load(Ordering::Relaxed))
    }

    pub fn strum_cooldown_secs(&self) -> f64 {
        f64::from_bits(self.strum_cooldown_raw.load(Ordering::Relaxed))
    }

    pub fn set_strum_gate_secs(&self, secs: f64) {
        self.strum_gate_raw.store(bounded_secs(secs).to_bits(), Ordering::Relaxed);
    }

    pub fn set_strum_cooldown_secs(&self, secs: f64) {
        self.strum_cooldown_raw.store(bounded_secs(secs).to_bits(), Ordering::Relaxed);
    }
}

/// Clamp a timing into 0..=MAX_DELAY_SECS; NaN becomes 0
fn bounded_secs(secs: f64) -> f64 {
    if secs.is_nan() {
        return 0.0;
    }
    secs.clamp(0.0, MAX_DELAY_SECS)
}

impl Default for RealtimeParams {
    fn default() -> Self {
        Self::from_config(&EngineConfig::default())
    }
}

/// Performance state, mutated only by the engine's handlers
#[derive(Debug, Clone)]
pub struct EngineState {
    /// Selected, but waiting for the next root
    pub enqueued_quality: ChordQuality,
    /// Quality of the sounding chord
    pub current_quality: Option<ChordQuality>,
    pub current_root: Option<u8>,
    /// Velocity the current root was played with
    pub root_velocity: u8,
    /// Note-ons sent for the current chord
    pub sounding: Vec<MidiMessage>,
    pub latch: bool,
    pub last_strum: Option<Instant>,
    pub last_strum_zone: Option<usize>,
}

impl Default for EngineState {
    fn default() -> Self {
        Self {
            enqueued_quality: ChordQuality::default_enqueued(),
            current_quality: None,
            current_root: None,
            root_velocity: 0,
            sounding: Vec::new(),
            latch: false,
            last_strum: None,
            last_strum_zone: None,
        }
    }
}

impl EngineState {
    pub fn is_sounding(&self) -> bool {
        self.current_quality.is_some() && self.current_root.is_some()
    }
}

/// Strum plate zone for a controller value
pub fn strum_zone(value: u8) -> usize {
    value as usize * STRUM_ZONES / 128
}

pub struct ChordEngine {
    config: Arc<EngineConfig>,
    realtime: Arc<RealtimeParams>,
    scheduler: MessageScheduler,
    state: EngineState,
    /// Time of the message being handled
    now: Instant,
}

impl ChordEngine {
    pub fn new(config: Arc<EngineConfig>, realtime: Arc<RealtimeParams>) -> Self {
        Self {
            config,
            realtime,
            scheduler: MessageScheduler::new(),
            state: EngineState::default(),
            now: Instant::now(),
        }
    }

    pub fn state(&self) -> &EngineState {
        &self.state
    }

    pub fn config(&self) -> &Arc<EngineConfig> {
        &self.config
    }

    pub fn scheduler(&self) -> &MessageScheduler {
        &self.scheduler
    }

    /// Register the engine's routes. Controls go first so their notes and CCs
    /// are never taken as performance input.
    pub fn register_handlers(dispatcher: &mut EventDispatcher<ChordEngine>) {
        dispatcher.register(
            "chord_quality",
            |e: &ChordEngine, msg: &MidiMessage| e.config.settings.chord_quality_selection_style.classify(msg),
            ChordEngine::on_chord_quality_change,
        );
        dispatcher.register(
            "stop_button",
            |e: &ChordEngine, msg: &MidiMessage| e.config.settings.stop_button.classify(msg),
            ChordEngine::on_stop_button,
        );
        dispatcher.register(
            "latch_button",
            |e: &ChordEngine, msg: &MidiMessage| e.config.settings.latch_toggle_button.classify(msg),
            ChordEngine::on_latch_button,
        );
        dispatcher.register("chord_note_on", ChordEngine::is_chord_note_on, ChordEngine::on_chord_note_on);
        dispatcher.register("chord_note_off", ChordEngine::is_chord_note_off, ChordEngine::on_chord_note_off);
        dispatcher.register("strum", ChordEngine::is_strum, ChordEngine::on_strum);
    }

    fn on_chord_quality_change(&mut self, quality: ChordQuality) -> Vec<MidiMessage> {
        debug!(%quality, "Chord quality enqueued");
        self.state.enqueued_quality = quality;
        vec![]
    }

    fn on_stop_button(&mut self, _action: ButtonAction) -> Vec<MidiMessage> {
        self.stop_current_chord()
    }

    fn on_latch_button(&mut self, action: ButtonAction) -> Vec<MidiMessage> {
        self.state.latch = action.apply(self.state.latch);
        debug!(latch = self.state.latch, "Latch changed");
        if !self.state.latch {
            return self.stop_current_chord();
        }
        vec![]
    }

    fn is_chord_note_on(&self, msg: &MidiMessage) -> Claim<(u8, u8)> {
        match *msg {
            MidiMessage::NoteOn { pitch, velocity, .. }
                if velocity > 0 && !self.config.settings.is_control_note(pitch) =>
            {
                Claim::Claimed((pitch, velocity))
            }
            _ => Claim::NoMatch,
        }
    }

    fn on_chord_note_on(&mut self, (root, velocity): (u8, u8)) -> Vec<MidiMessage> {
        let mut events = self.stop_current_chord();

        let quality = self.state.enqueued_quality;
        let settings = &self.config.settings;
        let notes = match settings.voicing_modifier.apply(&self.config.chord_voicing, quality, root) {
            Ok(notes) => notes,
            Err(e) => {
                error!(root, %quality, error = %e, "Cannot voice chord");
                return events;
            }
        };

        let channel = settings.chord_channel_index();
        for note in notes {
            let pitch = clamp_note(note);
            if self.state.sounding.iter().any(|m| m.pitch() == Some(pitch)) {
                continue;
            }
            let on = MidiMessage::note_on(channel, pitch, velocity);
            events.push(on);
            self.state.sounding.push(on);
        }

        self.state.current_quality = Some(quality);
        self.state.current_root = Some(root);
        self.state.root_velocity = velocity;
        debug!(root, %quality, notes = self.state.sounding.len(), "Chord started");
        events
    }

    fn is_chord_note_off(&self, msg: &MidiMessage) -> Claim<u8> {
        match msg.pitch() {
            Some(pitch) if msg.is_note_off() => Claim::Claimed(pitch),
            _ => Claim::NoMatch,
        }
    }

    fn on_chord_note_off(&mut self, pitch: u8) -> Vec<MidiMessage> {
        // Releases of other keys may be left over from before; only the root counts
        if self.state.current_root != Some(pitch) || self.state.latch {
            return vec![];
        }
        self.stop_current_chord()
    }

    fn is_strum(&self, msg: &MidiMessage) -> Claim<u8> {
        msg.cc_value(self.config.settings.strum_plate_cc).into()
    }

    fn on_strum(&mut self, value: u8) -> Vec<MidiMessage> {
        let (Some(quality), Some(root)) = (self.state.current_quality, self.state.current_root) else {
            return vec![];
        };

        let now = self.now;
        let zone = strum_zone(value);
        let cooldown = secs_to_duration(self.realtime.strum_cooldown_secs());
        let cooldown_ready = match self.state.last_strum {
            None => true,
            Some(t) => t.checked_add(cooldown).is_some_and(|ready| now >= ready),
        };
        if self.state.last_strum_zone == Some(zone) && !cooldown_ready {
            return vec![];
        }

        let notes = match self.config.strum_voicing.construct_chord(quality, root) {
            Ok(notes) => notes,
            Err(e) => {
                error!(root, %quality, error = %e, "Cannot voice strum");
                return vec![];
            }
        };
        let Some(&note) = notes.get(zone) else {
            error!(root, %quality, zone, len = notes.len(), "Strum voicing too short");
            return vec![];
        };

        let pitch = clamp_note(note);
        let channel = self.config.settings.strum_channel_index();
        let gate = secs_to_duration(self.realtime.strum_gate_secs());
        self.scheduler.schedule_at(now, MidiMessage::note_off(channel, pitch, 0), gate);

        self.state.last_strum = Some(now);
        self.state.last_strum_zone = Some(zone);
        debug!(zone, pitch, "Strum");
        vec![MidiMessage::note_on(channel, pitch, self.state.root_velocity)]
    }

    /// Release every note of the current chord and go silent
    pub fn stop_current_chord(&mut self) -> Vec<MidiMessage> {
        self.state.current_quality = None;
        self.state.current_root = None;
        self.state
            .sounding
            .drain(..)
            .filter_map(|on| match on {
                MidiMessage::NoteOn { channel, pitch, velocity } => Some(MidiMessage::note_off(channel, pitch, velocity)),
                _ => None,
            })
            .collect()
    }
}

/// Engine plus its routing table: the unit the run loop drives
pub struct Omnify {
    engine: ChordEngine,
    dispatcher: EventDispatcher<ChordEngine>,
}

impl Omnify {
    pub fn new(config: Arc<EngineConfig>) -> Self {
        let realtime = Arc::new(RealtimeParams::from_config(&config));
        Self::with_realtime(config, realtime)
    }

    pub fn with_realtime(config: Arc<EngineConfig>, realtime: Arc<RealtimeParams>) -> Self {
        let mut dispatcher = EventDispatcher::new();
        ChordEngine::register_handlers(&mut dispatcher);
        Self { engine: ChordEngine::new(config, realtime), dispatcher }
    }

    /// Handle one input message now
    pub fn handle(&mut self, msg: &MidiMessage) -> Vec<MidiMessage> {
        self.handle_at(msg, Instant::now())
    }

    /// Handle one input message as if received at `now`
    pub fn handle_at(&mut self, msg: &MidiMessage, now: Instant) -> Vec<MidiMessage> {
        self.engine.now = now;
        self.dispatcher.dispatch(&mut self.engine, msg).unwrap_or_default()
    }

    /// Deliver scheduled messages due by `now`
    pub fn send_overdue(&mut self, sink: &mut dyn MidiSink, now: Instant) -> usize {
        self.engine.scheduler.drain_overdue(sink, now)
    }

    /// Silence everything: chord note-offs plus every pending scheduled message
    pub fn shutdown(&mut self, sink: &mut dyn MidiSink) {
        for msg in self.engine.stop_current_chord() {
            if let Err(e) = sink.send(&msg) {
                tracing::warn!(%msg, error = %e, "Dropped note-off at shutdown");
            }
        }
        self.engine.scheduler.flush(sink);
    }

    /// Swap in a new configuration snapshot. Engine state carries over; the
    /// realtime strum timings are re-seeded from the new settings.
    pub fn update_config(&mut self, config: Arc<EngineConfig>) {
        self.engine.realtime.set_strum_gate_secs(config.settings.strum_gate_time_secs);
        self.engine.realtime.set_strum_cooldown_secs(config.settings.strum_cooldown_secs);
        self.engine.config = config;
        info!("Settings updated");
    }

    pub fn realtime(&self) -> Arc<RealtimeParams> {
        self.engine.realtime.clone()
    }

    pub fn engine(&self) -> &ChordEngine {
        &self.engine
    }
}
