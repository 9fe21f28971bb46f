//! Runtime configuration types for the tracking engine.
//!
//! These are the structs consumed by `TrackerCore` and the status facade.
//! They are separate from the TOML-deserialized config in `tracker_config`;
//! see `conversions` for the mapping.

/// Panel voltage reconstruction and power estimate.
#[derive(Debug, Clone)]
pub struct PanelCfg {
    /// ADC count corresponding to `reference_v` (4095 for a 12-bit converter).
    pub adc_full_scale: i32,
    /// ADC reference voltage.
    pub reference_v: f32,
    /// Divider ratio between panel terminals and the ADC pin.
    pub divider_ratio: f32,
    /// Reconstructed voltage is clamped to `[0, max_voltage]`.
    pub max_voltage: f32,
    /// Fixed load current assumption; power is `voltage * assumed_current_a`.
    pub assumed_current_a: f32,
}

impl Default for PanelCfg {
    fn default() -> Self {
        Self {
            adc_full_scale: 4095,
            reference_v: 3.3,
            divider_ratio: 11.0,
            max_voltage: 12.0,
            assumed_current_a: 0.8,
        }
    }
}

/// Control loop timing and power-up state.
#[derive(Debug, Clone)]
pub struct LoopCfg {
    /// Tick rate; the loop sleeps until the next `1 / tick_hz` boundary.
    pub tick_hz: u32,
    /// Actuator position, fused angle and manual setpoint at power-up.
    pub initial_angle_deg: i32,
}

impl Default for LoopCfg {
    fn default() -> Self {
        Self {
            tick_hz: 50,
            initial_angle_deg: 90,
        }
    }
}

/// Order in which the history query returns the voltage ring.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum HistoryOrder {
    /// Oldest sample first, newest last.
    #[default]
    Chronological,
    /// Raw ring slots 0..60; the start point rotates as the cursor wraps.
    Storage,
}
