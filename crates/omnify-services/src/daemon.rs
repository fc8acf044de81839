//! Run loop: pulls input events, drives the engine, and delivers output

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use crossbeam_channel::{unbounded, Receiver, Sender, TrySendError};
use omnify_core::{EngineConfig, MidiMessage, MidiSink, Omnify, OmnifyError, RealtimeParams, SinkError};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Idle time between loop iterations
pub const POLL_INTERVAL: Duration = Duration::from_millis(1);

#[derive(Debug, Error)]
pub enum DaemonError {
    #[error("Settings error: {0}")]
    Settings(#[from] OmnifyError),
    #[error("Daemon is not running")]
    Stopped,
}

/// Where input events come from. Must not block.
pub trait EventSource {
    fn poll_pending(&mut self) -> Vec<MidiMessage>;
}

/// Input fed through a crossbeam channel
pub struct ChannelSource {
    rx: Receiver<MidiMessage>,
}

impl ChannelSource {
    pub fn new(rx: Receiver<MidiMessage>) -> Self {
        Self { rx }
    }

    /// Unbounded channel plus the source reading from it
    pub fn pair() -> (Sender<MidiMessage>, Self) {
        let (tx, rx) = unbounded();
        (tx, Self::new(rx))
    }
}

impl EventSource for ChannelSource {
    fn poll_pending(&mut self) -> Vec<MidiMessage> {
        self.rx.try_iter().collect()
    }
}

/// Output pushed into a crossbeam channel
pub struct ChannelSink {
    tx: Sender<MidiMessage>,
}

impl ChannelSink {
    pub fn new(tx: Sender<MidiMessage>) -> Self {
        Self { tx }
    }
}

impl MidiSink for ChannelSink {
    fn send(&mut self, msg: &MidiMessage) -> Result<(), SinkError> {
        self.tx.try_send(*msg).map_err(|e| match e {
            TrySendError::Full(_) => SinkError::Full,
            TrySendError::Disconnected(_) => SinkError::Disconnected,
        })
    }
}

/// Keeps every output message with the time it was sent
#[derive(Debug, Default)]
pub struct RecordingSink {
    events: Vec<(Instant, MidiMessage)>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> &[(Instant, MidiMessage)] {
        &self.events
    }

    pub fn messages(&self) -> impl Iterator<Item = &MidiMessage> {
        self.events.iter().map(|(_, m)| m)
    }

    pub fn into_events(self) -> Vec<(Instant, MidiMessage)> {
        self.events
    }
}

impl MidiSink for RecordingSink {
    fn send(&mut self, msg: &MidiMessage) -> Result<(), SinkError> {
        self.events.push((Instant::now(), *msg));
        Ok(())
    }
}

/// Cross-thread control of a running daemon
#[derive(Clone)]
pub struct ControlHandle {
    shutdown: Arc<AtomicBool>,
    settings_tx: Sender<Arc<EngineConfig>>,
    realtime: Arc<RealtimeParams>,
}

impl ControlHandle {
    pub fn request_shutdown(&self) {
        self.shutdown.store(true, Ordering::SeqCst);
        info!("Shutdown requested");
    }

    pub fn is_shutdown_requested(&self) -> bool {
        self.shutdown.load(Ordering::SeqCst)
    }

    /// Queue a configuration snapshot; the loop picks up the newest one
    pub fn replace_settings(&self, config: Arc<EngineConfig>) -> Result<(), DaemonError> {
        self.settings_tx.send(config).map_err(|_| DaemonError::Stopped)
    }

    /// Load, validate and queue a settings file. A bad file leaves the running
    /// configuration untouched.
    pub fn reload_settings(&self, path: &Path) -> Result<(), DaemonError> {
        let config = EngineConfig::load(path)?;
        self.replace_settings(Arc::new(config))
    }

    pub fn set_strum_gate_secs(&self, secs: f64) {
        self.realtime.set_strum_gate_secs(secs);
    }

    pub fn set_strum_cooldown_secs(&self, secs: f64) {
        self.realtime.set_strum_cooldown_secs(secs);
    }

    pub fn realtime(&self) -> Arc<RealtimeParams> {
        self.realtime.clone()
    }
}

pub struct Daemon {
    omnify: Omnify,
    control: ControlHandle,
    settings_rx: Receiver<Arc<EngineConfig>>,
}

impl Daemon {
    pub fn new(config: Arc<EngineConfig>) -> Self {
        let omnify = Omnify::new(config);
        let (settings_tx, settings_rx) = unbounded();
        let control = ControlHandle {
            shutdown: Arc::new(AtomicBool::new(false)),
            settings_tx,
            realtime: omnify.realtime(),
        };
        Self { omnify, control, settings_rx }
    }

    pub fn control(&self) -> ControlHandle {
        self.control.clone()
    }

    pub fn omnify(&self) -> &Omnify {
        &self.omnify
    }

    /// Run until shutdown is requested, then release every sounding note
    pub fn run(&mut self, source: &mut dyn EventSource, sink: &mut dyn MidiSink) {
        info!("Daemon started");
        while !self.control.is_shutdown_requested() {
            self.tick(source, sink, Instant::now());
            thread::sleep(POLL_INTERVAL);
        }
        self.omnify.shutdown(sink);
        info!("Daemon stopped");
    }

    /// One loop iteration at `now`. Returns the number of messages delivered.
    pub fn tick(&mut self, source: &mut dyn EventSource, sink: &mut dyn MidiSink, now: Instant) -> usize {
        if let Some(config) = self.settings_rx.try_iter().last() {
            self.omnify.update_config(config);
        }

        let mut delivered = 0;
        for input in source.poll_pending() {
            for out in self.omnify.handle_at(&input, now) {
                match sink.send(&out) {
                    Ok(()) => delivered += 1,
                    Err(e) => warn!(msg = %out, error = %e, "Dropped output message"),
                }
            }
        }

        delivered += self.omnify.send_overdue(sink, now);
        if delivered > 0 {
            debug!(delivered, "Tick");
        }
        delivered
    }
}
