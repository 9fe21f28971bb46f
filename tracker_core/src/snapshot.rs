//! Per-tick state handoff from the control loop to the status side.
//!
//! The control loop builds one immutable [`SharedSnapshot`] per tick and
//! drops it into a single-slot mailbox. Any unread snapshot is evicted first,
//! so the slot always holds the newest tick and publishing never blocks.
//! The reader keeps the last snapshot it drained and answers from that copy;
//! every field it returns therefore comes from the same tick.

use crossbeam_channel as xch;

use crate::arbiter::Mode;
use crate::{HISTORY_LEN, SENSOR_COUNT};

/// Everything the status side can observe, captured at the end of one tick.
#[derive(Debug, Clone, PartialEq)]
pub struct SharedSnapshot {
    /// Tick sequence number; 0 before the first tick.
    pub seq: u64,
    pub voltage: f32,
    pub power: f32,
    /// Actuator position after this tick's slew step.
    pub angle_deg: i32,
    /// Arbitrated target the actuator is slewing toward; reported as `angle`.
    pub target_deg: i32,
    pub mode: Mode,
    /// Clamped sensor values used by this tick's fusion.
    pub ldr_raw: [i32; SENSOR_COUNT],
    /// Voltage ring in raw storage order.
    pub history: [f32; HISTORY_LEN],
    /// Write cursor of `history`, needed to reorder it chronologically.
    pub history_cursor: usize,
}

impl Default for SharedSnapshot {
    fn default() -> Self {
        Self::initial(90)
    }
}

impl SharedSnapshot {
    /// Power-up state: actuator parked at `angle_deg`, autonomous, empty history.
    pub fn initial(angle_deg: i32) -> Self {
        Self {
            seq: 0,
            voltage: 0.0,
            power: 0.0,
            angle_deg,
            target_deg: angle_deg,
            mode: Mode::Autonomous,
            ldr_raw: [0; SENSOR_COUNT],
            history: [0.0; HISTORY_LEN],
            history_cursor: 0,
        }
    }

    /// History oldest-first, derived from the raw ring and its cursor.
    pub fn history_chronological(&self) -> [f32; HISTORY_LEN] {
        let mut out = self.history;
        out.rotate_left(self.history_cursor % HISTORY_LEN);
        out
    }
}

/// Create a connected publisher/reader pair seeded with `initial`.
pub fn channel(initial: SharedSnapshot) -> (SnapshotPublisher, SnapshotReader) {
    let (tx, rx) = xch::bounded(1);
    let publisher = SnapshotPublisher {
        tx,
        evict: rx.clone(),
    };
    let reader = SnapshotReader {
        rx,
        cached: initial,
    };
    (publisher, reader)
}

/// Control-side end of the mailbox.
#[derive(Debug)]
pub struct SnapshotPublisher {
    tx: xch::Sender<SharedSnapshot>,
    evict: xch::Receiver<SharedSnapshot>,
}

impl SnapshotPublisher {
    /// Replace whatever is in the slot with `snap`. Never blocks.
    pub fn publish(&self, snap: SharedSnapshot) {
        // Drop a stale, unread snapshot so try_send finds the slot free.
        let _ = self.evict.try_recv();
        if let Err(xch::TrySendError::Full(_)) = self.tx.try_send(snap) {
            // The reader raced us into the slot between evict and send; the
            // next tick publishes again.
            tracing::trace!("snapshot slot contended, skipped");
        }
    }
}

/// Status-side end of the mailbox.
///
/// Draining consumes the slot, so there is exactly one reader per channel:
///
/// ```compile_fail
/// let (_p, r) = tracker_core::snapshot::channel(Default::default());
/// let _second = r.clone();
/// ```
#[derive(Debug)]
pub struct SnapshotReader {
    rx: xch::Receiver<SharedSnapshot>,
    cached: SharedSnapshot,
}

impl SnapshotReader {
    /// Drain the slot and return the newest snapshot seen so far.
    pub fn latest(&mut self) -> &SharedSnapshot {
        if let Some(s) = self.rx.try_iter().last() {
            self.cached = s;
        }
        &self.cached
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snap(seq: u64) -> SharedSnapshot {
        SharedSnapshot {
            seq,
            ..SharedSnapshot::default()
        }
    }

    #[test]
    fn reader_sees_initial_before_first_publish() {
        let (_p, mut r) = channel(SharedSnapshot::initial(90));
        assert_eq!(r.latest().seq, 0);
        assert_eq!(r.latest().angle_deg, 90);
        assert_eq!(r.latest().mode, Mode::Autonomous);
    }

    #[test]
    fn publisher_overwrites_unread_snapshot() {
        let (p, mut r) = channel(SharedSnapshot::default());
        p.publish(snap(1));
        p.publish(snap(2));
        p.publish(snap(3));
        assert_eq!(r.latest().seq, 3);
    }

    #[test]
    fn reader_keeps_last_value_when_slot_empty() {
        let (p, mut r) = channel(SharedSnapshot::default());
        p.publish(snap(7));
        assert_eq!(r.latest().seq, 7);
        assert_eq!(r.latest().seq, 7);
    }

    #[test]
    fn publish_survives_dropped_reader() {
        let (p, r) = channel(SharedSnapshot::default());
        drop(r);
        p.publish(snap(1));
        p.publish(snap(2));
    }
}
