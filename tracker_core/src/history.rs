//! Fixed-capacity voltage history, overwritten in place.

use crate::HISTORY_LEN;

/// Ring of the last [`HISTORY_LEN`] panel voltages, zero-filled at power-up.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryRingBuffer {
    samples: [f32; HISTORY_LEN],
    cursor: usize,
}

impl Default for HistoryRingBuffer {
    fn default() -> Self {
        Self {
            samples: [0.0; HISTORY_LEN],
            cursor: 0,
        }
    }
}

impl HistoryRingBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrite the slot at the cursor and advance it modulo capacity.
    pub fn append(&mut self, voltage: f32) {
        self.samples[self.cursor] = voltage;
        self.cursor = (self.cursor + 1) % HISTORY_LEN;
    }

    /// Raw storage order: slot 0 first, regardless of the cursor.
    pub fn snapshot(&self) -> [f32; HISTORY_LEN] {
        self.samples
    }

    /// Oldest sample first, newest last.
    pub fn chronological(&self) -> [f32; HISTORY_LEN] {
        let mut out = self.samples;
        out.rotate_left(self.cursor);
        out
    }

    /// Next slot to be written; also the index of the oldest sample.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Most recently appended value (0.0 before the first append).
    pub fn latest(&self) -> f32 {
        self.samples[(self.cursor + HISTORY_LEN - 1) % HISTORY_LEN]
    }
}
