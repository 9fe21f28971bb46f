//! Conversions from `tracker_config` types to `tracker_core` types.

use crate::calibration::{CalibrationTable, SensorCalibration};
use crate::config::{HistoryOrder, LoopCfg, PanelCfg};
use crate::error::BuildError;
use crate::SENSOR_COUNT;

// ── PanelCfg ─────────────────────────────────────────────────────────────────

impl From<&tracker_config::PanelCfg> for PanelCfg {
    fn from(c: &tracker_config::PanelCfg) -> Self {
        Self {
            adc_full_scale: c.adc_full_scale,
            reference_v: c.reference_v,
            divider_ratio: c.divider_ratio,
            max_voltage: c.max_voltage,
            assumed_current_a: c.assumed_current_a,
        }
    }
}

// ── LoopCfg ──────────────────────────────────────────────────────────────────

impl From<&tracker_config::ControlCfg> for LoopCfg {
    fn from(c: &tracker_config::ControlCfg) -> Self {
        Self {
            tick_hz: c.tick_hz,
            initial_angle_deg: c.initial_angle_deg,
        }
    }
}

// ── HistoryOrder ─────────────────────────────────────────────────────────────

impl From<tracker_config::HistoryOrder> for HistoryOrder {
    fn from(o: tracker_config::HistoryOrder) -> Self {
        match o {
            tracker_config::HistoryOrder::Chronological => Self::Chronological,
            tracker_config::HistoryOrder::Storage => Self::Storage,
        }
    }
}

// ── Calibration ──────────────────────────────────────────────────────────────

impl From<&tracker_config::SensorEntry> for SensorCalibration {
    fn from(e: &tracker_config::SensorEntry) -> Self {
        Self {
            mount_angle_deg: e.mount_angle_deg,
            calibrated_max: e.calibrated_max,
        }
    }
}

impl TryFrom<&[tracker_config::SensorEntry]> for CalibrationTable {
    type Error = BuildError;

    fn try_from(entries: &[tracker_config::SensorEntry]) -> Result<Self, Self::Error> {
        let sensors: [SensorCalibration; SENSOR_COUNT] = entries
            .iter()
            .map(SensorCalibration::from)
            .collect::<Vec<_>>()
            .try_into()
            .map_err(|v: Vec<SensorCalibration>| {
                BuildError::InvalidCalibration(format!(
                    "expected {SENSOR_COUNT} sensors, got {}",
                    v.len()
                ))
            })?;
        Self::new(sensors)
    }
}
