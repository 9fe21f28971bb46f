//! The per-tick control pipeline (`TrackerCore`).
//!
//! One call to [`TrackerCore::tick`] reads the sensors, fuses them into a
//! target, arbitrates against the operator's mode, slews the actuator one
//! step, samples the panel, appends to the history ring and publishes a
//! snapshot. Nothing here returns an error: a failed read reuses the last
//! good value and a failed write is retried implicitly on the next tick.

use std::sync::Arc;

use tracker_traits::{Actuator, HwResult, LightSensors, PanelAdc};

use crate::SENSOR_COUNT;
use crate::arbiter::{Mode, ModeArbiter, ModeCell};
use crate::config::LoopCfg;
use crate::fusion::{FusedTarget, SensorFusion};
use crate::history::HistoryRingBuffer;
use crate::hw_error::map_hw_error;
use crate::panel::{PanelState, PanelVoltageSampler};
use crate::slew::ActuatorState;
use crate::snapshot::{SharedSnapshot, SnapshotPublisher};

/// What one tick did; returned for tests and tracing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickReport {
    pub seq: u64,
    pub fused: FusedTarget,
    pub mode: Mode,
    pub target_deg: i32,
    pub angle_deg: i32,
    pub panel: PanelState,
}

/// Edge-triggered fault flag for one hardware seam.
#[derive(Debug, Default, Clone, Copy)]
pub(crate) struct FaultLatch {
    active: bool,
}

impl FaultLatch {
    fn observe<T>(&mut self, source: &'static str, r: HwResult<T>) -> Option<T> {
        match r {
            Ok(v) => {
                if self.active {
                    tracing::info!(source, "hardware recovered");
                    self.active = false;
                }
                Some(v)
            }
            Err(e) => {
                if !self.active {
                    let err = map_hw_error(&*e);
                    tracing::warn!(source, error = %err, "hardware fault, holding last value");
                    self.active = true;
                }
                None
            }
        }
    }
}

pub struct TrackerCore<L: LightSensors, P: PanelAdc, A: Actuator> {
    pub(crate) sensors: L,
    pub(crate) panel_adc: P,
    pub(crate) actuator: A,
    pub(crate) loop_cfg: LoopCfg,
    pub(crate) fusion: SensorFusion,
    pub(crate) arbiter: ModeArbiter,
    pub(crate) mode_cell: Arc<ModeCell>,
    pub(crate) slew: ActuatorState,
    pub(crate) sampler: PanelVoltageSampler,
    pub(crate) history: HistoryRingBuffer,
    pub(crate) publisher: SnapshotPublisher,

    pub(crate) last_raw: [i32; SENSOR_COUNT],
    pub(crate) last_panel_raw: i32,
    pub(crate) seq: u64,
    pub(crate) fault_count: u64,
    pub(crate) sensor_fault: [FaultLatch; SENSOR_COUNT],
    pub(crate) panel_fault: FaultLatch,
    pub(crate) actuator_fault: FaultLatch,
}

impl<L: LightSensors, P: PanelAdc, A: Actuator> core::fmt::Debug for TrackerCore<L, P, A> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("TrackerCore")
            .field("seq", &self.seq)
            .field("mode", &self.arbiter.mode())
            .field("position_deg", &self.slew.current_pos_deg)
            .field("target_deg", &self.slew.target_deg)
            .field("fault_count", &self.fault_count)
            .finish_non_exhaustive()
    }
}

impl<L: LightSensors, P: PanelAdc, A: Actuator> TrackerCore<L, P, A> {
    pub fn tick_hz(&self) -> u32 {
        self.loop_cfg.tick_hz
    }

    /// Ticks completed so far.
    pub fn seq(&self) -> u64 {
        self.seq
    }

    pub fn position(&self) -> i32 {
        self.slew.current_pos_deg
    }

    pub fn history(&self) -> &HistoryRingBuffer {
        &self.history
    }

    /// Hardware calls that have failed since construction.
    pub fn fault_count(&self) -> u64 {
        self.fault_count
    }

    pub fn mode_cell(&self) -> &Arc<ModeCell> {
        &self.mode_cell
    }

    /// Park the actuator at its power-up position and publish the initial state.
    pub fn begin(&mut self) {
        let pos = self.slew.current_pos_deg;
        let r = self.actuator.write_angle(pos);
        self.note_fault(r.is_err());
        self.actuator_fault.observe("actuator", r);
        self.publisher.publish(self.snapshot(self.arbiter.mode()));
        tracing::info!(
            position_deg = pos,
            tick_hz = self.loop_cfg.tick_hz,
            "tracker core ready"
        );
    }

    /// One full control iteration, reading every seam.
    pub fn tick(&mut self) -> TickReport {
        let mut raws = self.last_raw;
        for (i, slot) in raws.iter_mut().enumerate() {
            let r = self.sensors.read(i);
            self.note_fault(r.is_err());
            if let Some(v) = self.sensor_fault[i].observe("light_sensor", r) {
                *slot = v;
            }
        }
        let r = self.panel_adc.read();
        self.note_fault(r.is_err());
        let panel_raw = self
            .panel_fault
            .observe("panel_adc", r)
            .unwrap_or(self.last_panel_raw);
        self.tick_from_raw(raws, panel_raw)
    }

    /// Run the pipeline on pre-sampled raw values.
    pub fn tick_from_raw(&mut self, raws: [i32; SENSOR_COUNT], panel_raw: i32) -> TickReport {
        self.last_raw = raws;
        self.last_panel_raw = panel_raw;

        let fused = self.fusion.compute(&raws);
        let mode = self.mode_cell.load();
        let target_deg = self.arbiter.arbitrate(mode, fused.angle_deg);
        let angle_deg = self.slew.advance(target_deg);

        let r = self.actuator.write_angle(angle_deg);
        self.note_fault(r.is_err());
        self.actuator_fault.observe("actuator", r);

        let panel = self.sampler.measure(panel_raw);
        self.history.append(panel.voltage);

        self.seq = self.seq.wrapping_add(1);
        self.publisher.publish(self.snapshot(mode));

        tracing::trace!(
            seq = self.seq,
            fused_deg = fused.angle_deg,
            held = fused.held,
            target_deg,
            angle_deg,
            voltage = panel.voltage,
            mode = mode.label(),
            "tick"
        );

        TickReport {
            seq: self.seq,
            fused,
            mode,
            target_deg,
            angle_deg,
            panel,
        }
    }

    fn note_fault(&mut self, failed: bool) {
        if failed {
            self.fault_count = self.fault_count.saturating_add(1);
        }
    }

    fn snapshot(&self, mode: Mode) -> SharedSnapshot {
        let panel = self.sampler.measure(self.last_panel_raw);
        SharedSnapshot {
            seq: self.seq,
            voltage: panel.voltage,
            power: panel.power,
            angle_deg: self.slew.current_pos_deg,
            target_deg: self.slew.target_deg,
            mode,
            ldr_raw: self.fusion.readings(&self.last_raw).map(|r| r.raw),
            history: self.history.snapshot(),
            history_cursor: self.history.cursor(),
        }
    }
}
