//! Static per-sensor calibration, fixed for the life of the process.

use crate::error::BuildError;
use crate::{ANGLE_MAX_DEG, ANGLE_MIN_DEG, SENSOR_COUNT};

/// Where a sensor points and the raw reading at which it saturates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SensorCalibration {
    pub mount_angle_deg: i32,
    pub calibrated_max: i32,
}

/// Immutable table of the four sensor calibrations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalibrationTable {
    sensors: [SensorCalibration; SENSOR_COUNT],
}

impl CalibrationTable {
    /// Validate and freeze a calibration table.
    ///
    /// Mount angles must lie in `[0, 180]` and ceilings must be positive,
    /// otherwise the fusion weight would be undefined.
    pub fn new(sensors: [SensorCalibration; SENSOR_COUNT]) -> Result<Self, BuildError> {
        for (i, s) in sensors.iter().enumerate() {
            if !(ANGLE_MIN_DEG..=ANGLE_MAX_DEG).contains(&s.mount_angle_deg) {
                return Err(BuildError::InvalidCalibration(format!(
                    "sensor {i} mount angle {} outside [0, 180]",
                    s.mount_angle_deg
                )));
            }
            if s.calibrated_max <= 0 {
                return Err(BuildError::InvalidCalibration(format!(
                    "sensor {i} ceiling {} must be > 0",
                    s.calibrated_max
                )));
            }
        }
        Ok(Self { sensors })
    }

    pub fn sensors(&self) -> &[SensorCalibration; SENSOR_COUNT] {
        &self.sensors
    }

    pub fn mount_angles(&self) -> [i32; SENSOR_COUNT] {
        self.sensors.map(|s| s.mount_angle_deg)
    }
}

impl Default for CalibrationTable {
    /// Stock tracker head: sensors at 30/70/110/150 degrees.
    fn default() -> Self {
        let cal = |mount_angle_deg, calibrated_max| SensorCalibration {
            mount_angle_deg,
            calibrated_max,
        };
        Self {
            sensors: [cal(30, 2000), cal(70, 3000), cal(110, 2700), cal(150, 1000)],
        }
    }
}
