//! Rate-limited actuator tracking: one degree per control tick.

use std::cmp::Ordering;

use crate::clamp_angle;

/// Maximum angular change per control tick.
pub const SLEW_STEP_DEG: i32 = 1;

/// Move `current` one step toward `target`; the result is clamped to the axis travel.
#[inline]
pub fn step(current_pos_deg: i32, target_deg: i32) -> i32 {
    let next = match current_pos_deg.cmp(&target_deg) {
        Ordering::Less => current_pos_deg.saturating_add(SLEW_STEP_DEG),
        Ordering::Greater => current_pos_deg.saturating_sub(SLEW_STEP_DEG),
        Ordering::Equal => current_pos_deg,
    };
    clamp_angle(i64::from(next))
}

/// Commanded actuator position and the target it is slewing toward.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActuatorState {
    pub current_pos_deg: i32,
    pub target_deg: i32,
}

impl ActuatorState {
    pub fn new(initial_deg: i32) -> Self {
        let p = clamp_angle(i64::from(initial_deg));
        Self {
            current_pos_deg: p,
            target_deg: p,
        }
    }

    /// Retarget and take one slew step; returns the new position.
    pub fn advance(&mut self, target_deg: i32) -> i32 {
        self.target_deg = clamp_angle(i64::from(target_deg));
        self.current_pos_deg = step(self.current_pos_deg, self.target_deg);
        self.current_pos_deg
    }

    /// Ticks still needed to reach the current target.
    pub fn ticks_remaining(&self) -> u32 {
        self.current_pos_deg.abs_diff(self.target_deg)
    }

    pub fn at_target(&self) -> bool {
        self.current_pos_deg == self.target_deg
    }
}
