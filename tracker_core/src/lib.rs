#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
//! Core tracking logic (hardware-agnostic).
//!
//! All hardware interactions go through the `tracker_traits::LightSensors`,
//! `tracker_traits::PanelAdc` and `tracker_traits::Actuator` seams.
//!
//! ## Architecture
//!
//! - **Calibration**: per-sensor mounting angle and saturation ceiling (`calibration`)
//! - **Fusion**: illumination-weighted centroid over the mounting angles (`fusion`)
//! - **Arbitration**: autonomous vs. manual target selection (`arbiter`)
//! - **Slew**: one degree per tick toward the target (`slew`)
//! - **Panel**: ADC → volts → estimated watts (`panel`)
//! - **History**: 60-sample voltage ring (`history`)
//! - **Shared state**: per-tick snapshot handoff to the status side (`snapshot`)
//! - **Loop**: `TrackerCore::tick` and the fixed-rate `ControlLoop` thread
//! - **Status facade**: request handling for an external transport (`service`)
//!
//! Nothing in the tick path returns an error. Out-of-range inputs are clamped,
//! hardware faults are logged and the last good value is reused.

pub mod arbiter;
pub mod builder;
pub mod calibration;
pub mod config;
pub mod controller;
pub mod conversions;
pub mod error;
pub mod fusion;
pub mod history;
pub mod hw_error;
pub mod mocks;
pub mod panel;
pub mod scheduler;
pub mod service;
pub mod slew;
pub mod snapshot;
pub mod util;

pub use arbiter::{Mode, ModeArbiter, ModeCell, ModeCommand};
pub use builder::{StatusLink, TrackerBuilder};
pub use calibration::{CalibrationTable, SensorCalibration};
pub use config::{HistoryOrder, LoopCfg, PanelCfg};
pub use controller::{TickReport, TrackerCore};
pub use error::{BuildError, TrackerError};
pub use fusion::{FusedTarget, SensorFusion, SensorReading};
pub use history::HistoryRingBuffer;
pub use panel::{PanelState, PanelVoltageSampler};
pub use scheduler::ControlLoop;
pub use service::{ControlCommand, Response, StatusService};
pub use slew::ActuatorState;
pub use snapshot::{SharedSnapshot, SnapshotPublisher, SnapshotReader};

/// Number of light sensors on the tracker head.
pub const SENSOR_COUNT: usize = 4;

/// Capacity of the voltage history ring.
pub const HISTORY_LEN: usize = 60;

/// Mechanical travel of the single axis, in degrees.
pub const ANGLE_MIN_DEG: i32 = 0;
pub const ANGLE_MAX_DEG: i32 = 180;

/// Clamp any angle-like integer into the axis travel.
#[inline]
pub fn clamp_angle(deg: i64) -> i32 {
    let clamped = deg.clamp(i64::from(ANGLE_MIN_DEG), i64::from(ANGLE_MAX_DEG));
    i32::try_from(clamped).unwrap_or(ANGLE_MAX_DEG)
}

#[cfg(test)]
mod tests {
    use super::clamp_angle;

    #[test]
    fn clamp_angle_saturates_both_ends() {
        assert_eq!(clamp_angle(999), 180);
        assert_eq!(clamp_angle(-5), 0);
        assert_eq!(clamp_angle(i64::MIN), 0);
        assert_eq!(clamp_angle(45), 45);
    }
}
