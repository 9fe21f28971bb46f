//! Sensor fusion: illumination-weighted centroid over fixed mounting angles.
//!
//! Each raw reading is clamped into `[0, calibrated_max]` and normalized to a
//! weight in `[0, 1]`. The fused angle is `Σ(wᵢ·angleᵢ) / Σwᵢ`, rounded to the
//! nearest degree. In total darkness (`Σwᵢ == 0`) the previous fused angle is
//! held; that is a normal operating state, not an error.

use crate::calibration::{CalibrationTable, SensorCalibration};
use crate::{SENSOR_COUNT, clamp_angle};

/// One sensor sample after clamping against its calibration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SensorReading {
    pub raw: i32,
    pub calibrated_max: i32,
    pub mount_angle_deg: i32,
}

impl SensorReading {
    /// Clamp `raw` into `[0, calibrated_max]`.
    pub fn new(raw: i32, cal: SensorCalibration) -> Self {
        Self {
            raw: raw.clamp(0, cal.calibrated_max.max(0)),
            calibrated_max: cal.calibrated_max,
            mount_angle_deg: cal.mount_angle_deg,
        }
    }

    /// Normalized illumination proxy in `[0, 1]`.
    #[inline]
    pub fn weight(&self) -> f64 {
        if self.calibrated_max <= 0 {
            return 0.0;
        }
        f64::from(self.raw) / f64::from(self.calibrated_max)
    }
}

/// Weighted centroid of the mounting angles, or `None` when no sensor sees light.
pub fn weighted_centroid(readings: &[SensorReading]) -> Option<i32> {
    let mut weighted_sum = 0.0_f64;
    let mut total_weight = 0.0_f64;
    for r in readings {
        let w = r.weight();
        weighted_sum += w * f64::from(r.mount_angle_deg);
        total_weight += w;
    }
    if total_weight <= 0.0 {
        return None;
    }
    let centroid = (weighted_sum / total_weight).round();
    // Centroid of angles in [0, 180] stays in range; clamp guards float residue.
    Some(clamp_angle(centroid as i64))
}

/// Result of one fusion pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FusedTarget {
    pub angle_deg: i32,
    /// True when every sensor was dark and the previous angle was kept.
    pub held: bool,
    pub readings: [SensorReading; SENSOR_COUNT],
}

/// Stateful fusion stage; remembers the last fused angle for darkness hold.
#[derive(Debug, Clone)]
pub struct SensorFusion {
    calibration: CalibrationTable,
    last_angle_deg: i32,
}

impl SensorFusion {
    pub fn new(calibration: CalibrationTable, initial_angle_deg: i32) -> Self {
        Self {
            calibration,
            last_angle_deg: clamp_angle(i64::from(initial_angle_deg)),
        }
    }

    pub fn last_angle(&self) -> i32 {
        self.last_angle_deg
    }

    /// Clamp raw values against the calibration table.
    pub fn readings(&self, raws: &[i32; SENSOR_COUNT]) -> [SensorReading; SENSOR_COUNT] {
        let cal = self.calibration.sensors();
        std::array::from_fn(|i| SensorReading::new(raws[i], cal[i]))
    }

    pub fn compute(&mut self, raws: &[i32; SENSOR_COUNT]) -> FusedTarget {
        let readings = self.readings(raws);
        match weighted_centroid(&readings) {
            Some(angle_deg) => {
                self.last_angle_deg = angle_deg;
                FusedTarget {
                    angle_deg,
                    held: false,
                    readings,
                }
            }
            None => FusedTarget {
                angle_deg: self.last_angle_deg,
                held: true,
                readings,
            },
        }
    }
}
