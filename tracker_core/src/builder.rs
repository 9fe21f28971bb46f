//! Type-state builder for `TrackerCore`.
//!
//! The builder enforces at compile time that the light sensors, the panel ADC
//! and the actuator are provided before `build()` is available. Everything
//! else defaults to the stock tracker.

use std::sync::Arc;

use tracker_traits::{Actuator, LightSensors, PanelAdc};

use crate::arbiter::{ModeArbiter, ModeCell};
use crate::calibration::CalibrationTable;
use crate::config::{LoopCfg, PanelCfg};
use crate::controller::{FaultLatch, TrackerCore};
use crate::error::{BuildError, Result};
use crate::fusion::SensorFusion;
use crate::history::HistoryRingBuffer;
use crate::panel::PanelVoltageSampler;
use crate::slew::ActuatorState;
use crate::snapshot::{self, SharedSnapshot, SnapshotReader};
use crate::{ANGLE_MAX_DEG, ANGLE_MIN_DEG, SENSOR_COUNT};

/// Placeholder for a hardware seam that has not been provided yet.
#[derive(Debug, Default)]
pub struct Missing;

/// Status-side handles returned alongside the core. Owns the only reader.
#[derive(Debug)]
pub struct StatusLink {
    pub reader: SnapshotReader,
    pub mode: Arc<ModeCell>,
}

#[derive(Debug)]
pub struct TrackerBuilder<L, P, A> {
    sensors: L,
    panel_adc: P,
    actuator: A,
    calibration: Option<CalibrationTable>,
    panel: Option<PanelCfg>,
    loop_cfg: Option<LoopCfg>,
}

impl Default for TrackerBuilder<Missing, Missing, Missing> {
    fn default() -> Self {
        Self {
            sensors: Missing,
            panel_adc: Missing,
            actuator: Missing,
            calibration: None,
            panel: None,
            loop_cfg: None,
        }
    }
}

impl TrackerBuilder<Missing, Missing, Missing> {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Chainable setters that do not affect type-state.
impl<L, P, A> TrackerBuilder<L, P, A> {
    pub fn with_calibration(mut self, calibration: CalibrationTable) -> Self {
        self.calibration = Some(calibration);
        self
    }
    pub fn with_panel(mut self, panel: PanelCfg) -> Self {
        self.panel = Some(panel);
        self
    }
    pub fn with_loop(mut self, loop_cfg: LoopCfg) -> Self {
        self.loop_cfg = Some(loop_cfg);
        self
    }
}

// Setters that advance type-state
impl<P, A> TrackerBuilder<Missing, P, A> {
    pub fn with_sensors<L: LightSensors>(self, sensors: L) -> TrackerBuilder<L, P, A> {
        TrackerBuilder {
            sensors,
            panel_adc: self.panel_adc,
            actuator: self.actuator,
            calibration: self.calibration,
            panel: self.panel,
            loop_cfg: self.loop_cfg,
        }
    }
}

impl<L, A> TrackerBuilder<L, Missing, A> {
    pub fn with_panel_adc<P: PanelAdc>(self, panel_adc: P) -> TrackerBuilder<L, P, A> {
        TrackerBuilder {
            sensors: self.sensors,
            panel_adc,
            actuator: self.actuator,
            calibration: self.calibration,
            panel: self.panel,
            loop_cfg: self.loop_cfg,
        }
    }
}

impl<L, P> TrackerBuilder<L, P, Missing> {
    pub fn with_actuator<A: Actuator>(self, actuator: A) -> TrackerBuilder<L, P, A> {
        TrackerBuilder {
            sensors: self.sensors,
            panel_adc: self.panel_adc,
            actuator,
            calibration: self.calibration,
            panel: self.panel,
            loop_cfg: self.loop_cfg,
        }
    }
}

fn validate(panel: &PanelCfg, loop_cfg: &LoopCfg) -> std::result::Result<(), BuildError> {
    if loop_cfg.tick_hz == 0 {
        return Err(BuildError::InvalidConfig("tick_hz must be > 0"));
    }
    if !(ANGLE_MIN_DEG..=ANGLE_MAX_DEG).contains(&loop_cfg.initial_angle_deg) {
        return Err(BuildError::InvalidConfig(
            "initial_angle_deg must be in [0, 180]",
        ));
    }
    if panel.adc_full_scale <= 0 {
        return Err(BuildError::InvalidConfig("adc_full_scale must be > 0"));
    }
    for v in [panel.reference_v, panel.divider_ratio, panel.max_voltage] {
        if !v.is_finite() || v <= 0.0 {
            return Err(BuildError::InvalidConfig(
                "panel constants must be finite and > 0",
            ));
        }
    }
    if !panel.assumed_current_a.is_finite() || panel.assumed_current_a < 0.0 {
        return Err(BuildError::InvalidConfig(
            "assumed_current_a must be finite and >= 0",
        ));
    }
    Ok(())
}

impl<L: LightSensors, P: PanelAdc, A: Actuator> TrackerBuilder<L, P, A> {
    /// Validate and build the core. Only available once every seam is set.
    ///
    /// Returns the core (moved into the control thread) and the status-side
    /// link sharing its snapshot mailbox and mode cell.
    pub fn build(self) -> Result<(TrackerCore<L, P, A>, StatusLink)> {
        let panel = self.panel.unwrap_or_default();
        let loop_cfg = self.loop_cfg.unwrap_or_default();
        validate(&panel, &loop_cfg).map_err(eyre::Report::new)?;

        let initial = loop_cfg.initial_angle_deg;
        let calibration = self.calibration.unwrap_or_default();
        let mode_cell = Arc::new(ModeCell::new(initial));
        let (publisher, reader) = snapshot::channel(SharedSnapshot::initial(initial));

        let core = TrackerCore {
            sensors: self.sensors,
            panel_adc: self.panel_adc,
            actuator: self.actuator,
            loop_cfg,
            fusion: SensorFusion::new(calibration, initial),
            arbiter: ModeArbiter::default(),
            mode_cell: Arc::clone(&mode_cell),
            slew: ActuatorState::new(initial),
            sampler: PanelVoltageSampler::new(panel),
            history: HistoryRingBuffer::new(),
            publisher,
            last_raw: [0; SENSOR_COUNT],
            last_panel_raw: 0,
            seq: 0,
            fault_count: 0,
            sensor_fault: [FaultLatch::default(); SENSOR_COUNT],
            panel_fault: FaultLatch::default(),
            actuator_fault: FaultLatch::default(),
        };
        Ok((
            core,
            StatusLink {
                reader,
                mode: mode_cell,
            },
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mocks::{RecordingActuator, ScriptedLightSensors, ScriptedPanelAdc};

    #[test]
    fn zero_tick_rate_is_rejected() {
        let err = TrackerBuilder::new()
            .with_sensors(ScriptedLightSensors::default())
            .with_panel_adc(ScriptedPanelAdc::default())
            .with_actuator(RecordingActuator::new())
            .with_loop(LoopCfg {
                tick_hz: 0,
                initial_angle_deg: 90,
            })
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("tick_hz"));
    }

    #[test]
    fn defaults_park_at_ninety() {
        let (core, mut link) = TrackerBuilder::new()
            .with_sensors(ScriptedLightSensors::default())
            .with_panel_adc(ScriptedPanelAdc::default())
            .with_actuator(RecordingActuator::new())
            .build()
            .unwrap();
        assert_eq!(core.position(), 90);
        assert_eq!(core.tick_hz(), 50);
        assert_eq!(link.reader.latest().angle_deg, 90);
        assert_eq!(link.mode.setpoint(), 90);
    }
}
