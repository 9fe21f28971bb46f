#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
//! Hardware backends for the tracker seams.
//!
//! - `sim`: a simulated rig (sun, light sensors, servo, panel) for hosts
//!   without GPIO. Always available.
//! - `mcp3208` and `servo`: Raspberry Pi drivers over `rppal`, behind the
//!   `hardware` feature on Linux. The MCP3208 frame helpers are pure and
//!   always compiled.

pub mod error;
pub mod mcp3208;
#[cfg(all(feature = "hardware", target_os = "linux"))]
pub mod servo;
pub mod sim;

pub use error::HwError;
pub use sim::{SimLightSensors, SimPanelAdc, SimRig, SimServo};

/// Highest commandable servo angle.
const SERVO_SPAN_DEG: u64 = 180;

/// Pulse width in microseconds for `angle_deg` on a servo spanning
/// `[min_us, max_us]` over 0..=180 degrees. The angle is clamped first.
pub fn servo_pulse_us(angle_deg: i32, min_us: u32, max_us: u32) -> u32 {
    let angle = u64::from(angle_deg.clamp(0, 180).unsigned_abs());
    let span = u64::from(max_us.saturating_sub(min_us));
    let offset = (span * angle + SERVO_SPAN_DEG / 2) / SERVO_SPAN_DEG;
    min_us.saturating_add(u32::try_from(offset).unwrap_or(u32::MAX))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(0, 500)]
    #[case(90, 1450)]
    #[case(180, 2400)]
    #[case(-30, 500)]
    #[case(400, 2400)]
    fn pulse_maps_linearly(#[case] angle: i32, #[case] expected: u32) {
        assert_eq!(servo_pulse_us(angle, 500, 2400), expected);
    }

    #[test]
    fn inverted_range_collapses_to_min() {
        assert_eq!(servo_pulse_us(90, 2400, 500), 2400);
    }
}
