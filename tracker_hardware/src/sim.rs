//! Simulated tracker rig for development hosts and tests.
//!
//! A point sun moves across the sky on a single axis. Each light sensor sees
//! `ceiling × cos(sun − mount)` (zero when facing away or at night) and the
//! panel sees `peak × cos(sun − servo)`, so a working controller visibly
//! raises the panel voltage by pointing at the sun.
//!
//! Environment overrides used by `SimRig::from_env`:
//! - `TRACKER_SIM_SUN_DEG`: starting sun angle (default 60)
//! - `TRACKER_SIM_SWEEP_MDEG`: sun motion per tick in millidegrees (default 0)
//! - `TRACKER_SIM_FAIL_LDR`: when `1`, every light-sensor read fails

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicI32, Ordering};

use tracker_traits::{Actuator, HwResult, LightSensors, PanelAdc};

use crate::error::HwError;

const SENSORS: usize = 4;
const MDEG: i32 = 1000;
/// Sun position wraps from here back to `NIGHT_START_MDEG`.
const NIGHT_END_MDEG: i32 = 200 * MDEG;
const NIGHT_START_MDEG: i32 = -20 * MDEG;

#[derive(Debug)]
struct SimState {
    sun_mdeg: AtomicI32,
    sweep_mdeg: AtomicI32,
    servo_deg: AtomicI32,
    fail_sensors: AtomicBool,
    mounts: [i32; SENSORS],
    ceilings: [i32; SENSORS],
    panel_peak_raw: i32,
}

impl SimState {
    fn sun_up(&self) -> Option<f32> {
        let sun = self.sun_mdeg.load(Ordering::Relaxed);
        (0..=180 * MDEG)
            .contains(&sun)
            .then(|| sun as f32 / MDEG as f32)
    }

    fn exposure(sun_deg: f32, facing_deg: f32) -> f32 {
        (sun_deg - facing_deg).to_radians().cos().max(0.0)
    }
}

/// Shared handle to one simulated rig; hand out the seams with
/// [`sensors`](Self::sensors), [`panel_adc`](Self::panel_adc) and [`servo`](Self::servo).
#[derive(Debug, Clone)]
pub struct SimRig {
    state: Arc<SimState>,
}

impl SimRig {
    /// Rig with the given sensor layout, sun at `sun_deg`, servo at 90°.
    pub fn new(mounts: [i32; SENSORS], ceilings: [i32; SENSORS], sun_deg: f32) -> Self {
        Self {
            state: Arc::new(SimState {
                sun_mdeg: AtomicI32::new(deg_to_mdeg(sun_deg)),
                sweep_mdeg: AtomicI32::new(0),
                servo_deg: AtomicI32::new(90),
                fail_sensors: AtomicBool::new(false),
                mounts,
                ceilings,
                // ~11.5 V through the stock 3.3 V / 11:1 divider
                panel_peak_raw: 1300,
            }),
        }
    }

    /// Like [`new`](Self::new) with the `TRACKER_SIM_*` overrides applied.
    pub fn from_env(mounts: [i32; SENSORS], ceilings: [i32; SENSORS]) -> Self {
        let sun = env_parse::<f32>("TRACKER_SIM_SUN_DEG").unwrap_or(60.0);
        let rig = Self::new(mounts, ceilings, sun);
        if let Some(sweep) = env_parse::<i32>("TRACKER_SIM_SWEEP_MDEG") {
            rig.set_sweep_mdeg(sweep);
        }
        if env_parse::<u8>("TRACKER_SIM_FAIL_LDR") == Some(1) {
            rig.set_sensor_fault(true);
        }
        rig
    }

    pub fn set_sun_deg(&self, deg: f32) {
        self.state.sun_mdeg.store(deg_to_mdeg(deg), Ordering::Relaxed);
    }

    pub fn sun_deg(&self) -> f32 {
        self.state.sun_mdeg.load(Ordering::Relaxed) as f32 / MDEG as f32
    }

    /// Sun motion applied on every panel read (once per control tick).
    pub fn set_sweep_mdeg(&self, mdeg: i32) {
        self.state.sweep_mdeg.store(mdeg, Ordering::Relaxed);
    }

    pub fn set_sensor_fault(&self, failing: bool) {
        self.state.fail_sensors.store(failing, Ordering::Relaxed);
    }

    /// Last angle commanded to the simulated servo.
    pub fn servo_deg(&self) -> i32 {
        self.state.servo_deg.load(Ordering::Relaxed)
    }

    pub fn sensors(&self) -> SimLightSensors {
        SimLightSensors {
            state: Arc::clone(&self.state),
        }
    }

    pub fn panel_adc(&self) -> SimPanelAdc {
        SimPanelAdc {
            state: Arc::clone(&self.state),
        }
    }

    pub fn servo(&self) -> SimServo {
        SimServo {
            state: Arc::clone(&self.state),
        }
    }
}

fn deg_to_mdeg(deg: f32) -> i32 {
    if deg.is_finite() {
        (deg * MDEG as f32).round() as i32
    } else {
        0
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok()?.trim().parse().ok()
}

#[derive(Debug, Clone)]
pub struct SimLightSensors {
    state: Arc<SimState>,
}

impl LightSensors for SimLightSensors {
    fn read(&mut self, index: usize) -> HwResult<i32> {
        if self.state.fail_sensors.load(Ordering::Relaxed) {
            return Err(Box::new(HwError::Spi("simulated light sensor fault".into())));
        }
        let (mount, ceiling) = self
            .state
            .mounts
            .get(index)
            .zip(self.state.ceilings.get(index))
            .ok_or_else(|| HwError::Channel(u8::try_from(index).unwrap_or(u8::MAX)))?;
        let Some(sun) = self.state.sun_up() else {
            return Ok(0);
        };
        let lux = SimState::exposure(sun, *mount as f32);
        Ok((lux * *ceiling as f32).round() as i32)
    }
}

#[derive(Debug, Clone)]
pub struct SimPanelAdc {
    state: Arc<SimState>,
}

impl PanelAdc for SimPanelAdc {
    fn read(&mut self) -> HwResult<i32> {
        let s = &self.state;
        let raw = s.sun_up().map_or(0, |sun| {
            let servo = s.servo_deg.load(Ordering::Relaxed) as f32;
            (SimState::exposure(sun, servo) * s.panel_peak_raw as f32).round() as i32
        });

        let sweep = s.sweep_mdeg.load(Ordering::Relaxed);
        if sweep != 0 {
            let mut next = s.sun_mdeg.load(Ordering::Relaxed).saturating_add(sweep);
            if next > NIGHT_END_MDEG {
                next = NIGHT_START_MDEG;
            } else if next < NIGHT_START_MDEG {
                next = NIGHT_END_MDEG;
            }
            s.sun_mdeg.store(next, Ordering::Relaxed);
        }
        Ok(raw)
    }
}

#[derive(Debug, Clone)]
pub struct SimServo {
    state: Arc<SimState>,
}

impl Actuator for SimServo {
    fn write_angle(&mut self, angle_deg: i32) -> HwResult<()> {
        self.state
            .servo_deg
            .store(angle_deg.clamp(0, 180), Ordering::Relaxed);
        Ok(())
    }
}
