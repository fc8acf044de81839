//! Deferred delivery of MIDI messages
//!
//! A min-heap keyed by absolute deadline. Each poll flushes every message whose
//! deadline has passed. Used for strum note-offs.

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::time::{Duration, Instant};

use tracing::warn;

use crate::error::SinkError;
use crate::midi::MidiMessage;

/// Destination for output messages
pub trait MidiSink {
    fn send(&mut self, msg: &MidiMessage) -> Result<(), SinkError>;
}

impl MidiSink for Vec<MidiMessage> {
    fn send(&mut self, msg: &MidiMessage) -> Result<(), SinkError> {
        self.push(*msg);
        Ok(())
    }
}

/// A message waiting for its deadline
#[derive(Debug, Clone)]
struct ScheduledMessage {
    deadline: Instant,
    /// Insertion counter; keeps equal deadlines in FIFO order
    sequence: u64,
    message: MidiMessage,
}

// BinaryHeap is a max-heap, so the ordering is reversed.
impl PartialEq for ScheduledMessage {
    fn eq(&self, other: &Self) -> bool {
        self.deadline == other.deadline && self.sequence == other.sequence
    }
}

impl Eq for ScheduledMessage {}

impl PartialOrd for ScheduledMessage {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ScheduledMessage {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .deadline
            .cmp(&self.deadline)
            .then_with(|| other.sequence.cmp(&self.sequence))
    }
}

#[derive(Debug, Default)]
pub struct MessageScheduler {
    heap: BinaryHeap<ScheduledMessage>,
    next_sequence: u64,
}

impl MessageScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule `message` for `delay_secs` from now
    pub fn schedule(&mut self, message: MidiMessage, delay_secs: f64) {
        self.schedule_at(Instant::now(), message, secs_to_duration(delay_secs));
    }

    /// Schedule `message` for `now + delay`
    pub fn schedule_at(&mut self, now: Instant, message: MidiMessage, delay: Duration) {
        let deadline = now.checked_add(delay).unwrap_or_else(|| {
            warn!(msg = %message, ?delay, "Delay out of range, sending immediately");
            now
        });
        let sequence = self.next_sequence;
        self.next_sequence += 1;
        self.heap.push(ScheduledMessage { deadline, sequence, message });
    }

    /// Deliver everything due at or before `now`, earliest first.
    ///
    /// A sink failure drops that one message with a warning and draining
    /// continues. Returns the number delivered.
    pub fn drain_overdue(&mut self, sink: &mut dyn MidiSink, now: Instant) -> usize {
        let mut delivered = 0;
        while self.heap.peek().is_some_and(|s| s.deadline <= now) {
            let Some(scheduled) = self.heap.pop() else { break };
            match sink.send(&scheduled.message) {
                Ok(()) => delivered += 1,
                Err(e) => warn!(msg = %scheduled.message, error = %e, "Dropped scheduled message"),
            }
        }
        delivered
    }

    /// Deliver everything regardless of deadline (used at shutdown)
    pub fn flush(&mut self, sink: &mut dyn MidiSink) -> usize {
        let mut delivered = 0;
        while let Some(scheduled) = self.heap.pop() {
            match sink.send(&scheduled.message) {
                Ok(()) => delivered += 1,
                Err(e) => warn!(msg = %scheduled.message, error = %e, "Dropped scheduled message"),
            }
        }
        delivered
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.heap.peek().map(|s| s.deadline)
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }
}

/// Longest accepted strum gate or cooldown
pub const MAX_DELAY_SECS: f64 = 60.0;

/// Negative or non-finite delays mean "immediately"
pub fn secs_to_duration(secs: f64) -> Duration {
    Duration::try_from_secs_f64(secs).unwrap_or(Duration::ZERO)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct RejectFirst {
        rejected: bool,
        accepted: Vec<MidiMessage>,
    }

    impl MidiSink for RejectFirst {
        fn send(&mut self, msg: &MidiMessage) -> Result<(), SinkError> {
            if !self.rejected {
                self.rejected = true;
                return Err(SinkError::Full);
            }
            self.accepted.push(*msg);
            Ok(())
        }
    }

    fn off(pitch: u8) -> MidiMessage {
        MidiMessage::note_off(1, pitch, 0)
    }

    #[test]
    fn test_delivers_only_after_deadline() {
        let t0 = Instant::now();
        let mut scheduler = MessageScheduler::new();
        scheduler.schedule_at(t0, off(60), secs_to_duration(0.5));

        let mut sink = Vec::new();
        assert_eq!(scheduler.drain_overdue(&mut sink, t0 + Duration::from_millis(300)), 0);
        assert!(sink.is_empty());

        assert_eq!(scheduler.drain_overdue(&mut sink, t0 + Duration::from_millis(600)), 1);
        assert_eq!(sink, vec![off(60)]);

        scheduler.drain_overdue(&mut sink, t0 + Duration::from_secs(10));
        assert_eq!(sink.len(), 1);
        assert!(scheduler.is_empty());
    }

    #[test]
    fn test_drains_in_deadline_order() {
        let t0 = Instant::now();
        let mut scheduler = MessageScheduler::new();
        scheduler.schedule_at(t0, off(3), Duration::from_millis(30));
        scheduler.schedule_at(t0, off(1), Duration::from_millis(10));
        scheduler.schedule_at(t0, off(2), Duration::from_millis(20));
        scheduler.schedule_at(t0, off(9), Duration::from_millis(90));
        assert_eq!(scheduler.next_deadline(), Some(t0 + Duration::from_millis(10)));

        let mut sink = Vec::new();
        scheduler.drain_overdue(&mut sink, t0 + Duration::from_millis(50));
        assert_eq!(sink, vec![off(1), off(2), off(3)]);
        assert_eq!(scheduler.len(), 1);
    }

    #[test]
    fn test_sink_failure_does_not_stop_draining() {
        let t0 = Instant::now();
        let mut scheduler = MessageScheduler::new();
        scheduler.schedule_at(t0, off(1), Duration::ZERO);
        scheduler.schedule_at(t0, off(2), Duration::ZERO);

        let mut sink = RejectFirst { rejected: false, accepted: Vec::new() };
        assert_eq!(scheduler.drain_overdue(&mut sink, t0), 1);
        assert_eq!(sink.accepted, vec![off(2)]);
        assert!(scheduler.is_empty());
    }

    #[test]
    fn test_flush_ignores_deadlines() {
        let t0 = Instant::now();
        let mut scheduler = MessageScheduler::new();
        scheduler.schedule_at(t0, off(1), Duration::from_secs(60));
        let mut sink = Vec::new();
        assert_eq!(scheduler.flush(&mut sink), 1);
    }

    #[test]
    fn test_bad_delays_mean_now() {
        assert_eq!(secs_to_duration(-1.0), Duration::ZERO);
        assert_eq!(secs_to_duration(f64::NAN), Duration::ZERO);
        assert_eq!(secs_to_duration(0.25), Duration::from_millis(250));
    }

    #[test]
    fn test_schedule_is_relative_to_now() {
        let before = Instant::now();
        let mut scheduler = MessageScheduler::new();
        scheduler.schedule(off(60), 0.5);
        let after = Instant::now();

        let deadline = scheduler.next_deadline().unwrap();
        assert!(deadline >= before + Duration::from_millis(500));
        assert!(deadline <= after + Duration::from_millis(500));

        let mut sink = Vec::new();
        assert_eq!(scheduler.drain_overdue(&mut sink, before + Duration::from_millis(300)), 0);
        assert_eq!(scheduler.drain_overdue(&mut sink, after + Duration::from_millis(600)), 1);
        assert_eq!(sink, vec![off(60)]);
    }

    #[test]
    fn test_unrepresentable_deadline_sends_immediately() {
        let t0 = Instant::now();
        let mut scheduler = MessageScheduler::new();
        scheduler.schedule_at(t0, off(60), Duration::MAX);
        scheduler.schedule(off(61), 1e19);

        let mut sink = Vec::new();
        assert_eq!(scheduler.drain_overdue(&mut sink, Instant::now()), 2);
    }
}
