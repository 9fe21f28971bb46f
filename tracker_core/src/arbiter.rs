//! Mode arbitration between the fused target and an operator setpoint.
//!
//! The status side writes the operator's choice into a [`ModeCell`]; the
//! control loop reads it once per tick and hands it to [`ModeArbiter`].
//! The cell packs the manual flag and the setpoint into a single atomic word,
//! so a reader never sees a flag from one command paired with a setpoint
//! from another.

use std::sync::atomic::{AtomicU32, Ordering};

use crate::clamp_angle;

/// Tracking mode as seen by the control loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Autonomous,
    Manual { setpoint_deg: i32 },
}

impl Mode {
    /// Wire label used by the status query.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Autonomous => "auto",
            Self::Manual { .. } => "manual",
        }
    }

    pub fn is_manual(&self) -> bool {
        matches!(self, Self::Manual { .. })
    }
}

/// Mode selection carried by a control command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModeCommand {
    Auto,
    Manual,
}

impl ModeCommand {
    /// Exact, case-sensitive match; anything else selects nothing.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "auto" => Some(Self::Auto),
            "manual" => Some(Self::Manual),
            _ => None,
        }
    }
}

const SETPOINT_MASK: u32 = 0xFF;
const MANUAL_BIT: u32 = 1 << 8;

#[inline]
fn pack(manual: bool, setpoint_deg: i32) -> u32 {
    let sp = u32::try_from(clamp_angle(i64::from(setpoint_deg))).unwrap_or(0);
    if manual { MANUAL_BIT | sp } else { sp }
}

#[inline]
fn unpack(word: u32) -> Mode {
    if word & MANUAL_BIT == 0 {
        Mode::Autonomous
    } else {
        // Masked to 8 bits, always fits.
        let setpoint_deg = i32::try_from(word & SETPOINT_MASK).unwrap_or(0);
        Mode::Manual { setpoint_deg }
    }
}

/// Single-slot handoff of the operator's mode and setpoint.
///
/// The setpoint is retained while autonomous, so selecting manual later
/// resumes at the last requested angle.
#[derive(Debug)]
pub struct ModeCell {
    word: AtomicU32,
}

impl Default for ModeCell {
    fn default() -> Self {
        Self::new(90)
    }
}

impl ModeCell {
    /// Start autonomous with the given manual setpoint in reserve.
    pub fn new(initial_setpoint_deg: i32) -> Self {
        Self {
            word: AtomicU32::new(pack(false, initial_setpoint_deg)),
        }
    }

    pub fn load(&self) -> Mode {
        unpack(self.word.load(Ordering::Acquire))
    }

    /// Setpoint currently held, whether or not manual mode is active.
    pub fn setpoint(&self) -> i32 {
        i32::try_from(self.word.load(Ordering::Acquire) & SETPOINT_MASK).unwrap_or(0)
    }

    /// Apply an optional mode selection and an optional setpoint as one update.
    ///
    /// The setpoint is clamped to `[0, 180]` here, at the moment it is set.
    pub fn apply(&self, mode: Option<ModeCommand>, setpoint_deg: Option<i64>) -> Mode {
        let update = |word: u32| {
            let manual = match mode {
                Some(ModeCommand::Manual) => true,
                Some(ModeCommand::Auto) => false,
                None => word & MANUAL_BIT != 0,
            };
            let sp = setpoint_deg.map_or_else(
                || i32::try_from(word & SETPOINT_MASK).unwrap_or(0),
                clamp_angle,
            );
            Some(pack(manual, sp))
        };
        let prev = self
            .word
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, update)
            .unwrap_or_else(|w| w);
        // Recompute from the word we replaced; the closure is pure.
        unpack(update(prev).unwrap_or(prev))
    }

    pub fn select(&self, mode: ModeCommand) -> Mode {
        self.apply(Some(mode), None)
    }

    pub fn set_setpoint(&self, setpoint_deg: i64) -> Mode {
        self.apply(None, Some(setpoint_deg))
    }
}

/// Chooses this tick's target angle from the mode and the fused angle.
#[derive(Debug, Clone)]
pub struct ModeArbiter {
    mode: Mode,
}

impl Default for ModeArbiter {
    fn default() -> Self {
        Self {
            mode: Mode::Autonomous,
        }
    }
}

impl ModeArbiter {
    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Adopt `mode` unconditionally and return the target for this tick.
    pub fn arbitrate(&mut self, mode: Mode, fused_deg: i32) -> i32 {
        if mode != self.mode {
            tracing::debug!(from = self.mode.label(), to = mode.label(), ?mode, "mode change");
            self.mode = mode;
        }
        match mode {
            Mode::Autonomous => clamp_angle(i64::from(fused_deg)),
            Mode::Manual { setpoint_deg } => setpoint_deg,
        }
    }
}
