//! Test and helper mocks for tracker_core.
//!
//! Handles are `Clone` and share state through `Arc`, so a test can keep one
//! copy to steer or inspect the hardware after moving the other into the
//! control loop.

use std::sync::{Arc, Mutex};

use tracker_traits::{Actuator, HwResult, LightSensors, PanelAdc};

use crate::SENSOR_COUNT;

/// Light sensors whose raw values can be changed while the loop runs.
#[derive(Debug, Clone, Default)]
pub struct ScriptedLightSensors {
    raws: Arc<Mutex<[i32; SENSOR_COUNT]>>,
}

impl ScriptedLightSensors {
    pub fn new(raws: [i32; SENSOR_COUNT]) -> Self {
        Self {
            raws: Arc::new(Mutex::new(raws)),
        }
    }

    pub fn set(&self, raws: [i32; SENSOR_COUNT]) {
        if let Ok(mut g) = self.raws.lock() {
            *g = raws;
        }
    }
}

impl LightSensors for ScriptedLightSensors {
    fn read(&mut self, index: usize) -> HwResult<i32> {
        let g = self.raws.lock().map_err(|_| "sensor mock poisoned")?;
        g.get(index)
            .copied()
            .ok_or_else(|| format!("no sensor at index {index}").into())
    }
}

/// Panel ADC returning a settable raw count.
#[derive(Debug, Clone, Default)]
pub struct ScriptedPanelAdc {
    raw: Arc<Mutex<i32>>,
}

impl ScriptedPanelAdc {
    pub fn new(raw: i32) -> Self {
        Self {
            raw: Arc::new(Mutex::new(raw)),
        }
    }

    pub fn set(&self, raw: i32) {
        if let Ok(mut g) = self.raw.lock() {
            *g = raw;
        }
    }
}

impl PanelAdc for ScriptedPanelAdc {
    fn read(&mut self) -> HwResult<i32> {
        let g = self.raw.lock().map_err(|_| "panel mock poisoned")?;
        Ok(*g)
    }
}

/// Actuator that records every commanded angle.
#[derive(Debug, Clone, Default)]
pub struct RecordingActuator {
    writes: Arc<Mutex<Vec<i32>>>,
}

impl RecordingActuator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn writes(&self) -> Vec<i32> {
        self.writes.lock().map(|g| g.clone()).unwrap_or_default()
    }

    pub fn last(&self) -> Option<i32> {
        self.writes.lock().ok().and_then(|g| g.last().copied())
    }
}

impl Actuator for RecordingActuator {
    fn write_angle(&mut self, angle_deg: i32) -> HwResult<()> {
        let mut g = self.writes.lock().map_err(|_| "actuator mock poisoned")?;
        g.push(angle_deg);
        Ok(())
    }
}

/// Any seam that fails every call with a fixed message.
#[derive(Debug, Clone)]
pub struct Failing(pub &'static str);

impl LightSensors for Failing {
    fn read(&mut self, _index: usize) -> HwResult<i32> {
        Err(Box::new(std::io::Error::other(self.0)))
    }
}

impl PanelAdc for Failing {
    fn read(&mut self) -> HwResult<i32> {
        Err(Box::new(std::io::Error::other(self.0)))
    }
}

impl Actuator for Failing {
    fn write_angle(&mut self, _angle_deg: i32) -> HwResult<()> {
        Err(Box::new(std::io::Error::other(self.0)))
    }
}
