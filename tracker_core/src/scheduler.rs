//! Fixed-rate control thread.
//!
//! Spawns one named thread that owns the `TrackerCore` and calls `tick()`
//! once per period. Deadlines advance by exactly one period; a tick that
//! overruns re-anchors the schedule at "now" instead of bursting to catch up.
//!
//! Each `ControlLoop` owns exactly one thread, shut down and joined when the
//! handle is dropped.
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::thread::JoinHandle;

use eyre::WrapErr;
use tracker_traits::clock::Clock;
use tracker_traits::{Actuator, LightSensors, PanelAdc};

use crate::controller::TrackerCore;

/// Counters shared between the control thread and its handle.
#[derive(Debug, Default)]
struct LoopStats {
    ticks: AtomicU64,
    overruns: AtomicU64,
}

pub struct ControlLoop {
    stats: Arc<LoopStats>,
    shutdown: Arc<AtomicBool>,
    join_handle: Option<JoinHandle<()>>,
}

impl core::fmt::Debug for ControlLoop {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ControlLoop")
            .field("ticks", &self.ticks())
            .field("overruns", &self.overruns())
            .field("running", &self.join_handle.is_some())
            .finish()
    }
}

impl ControlLoop {
    pub fn spawn<L, P, A, C>(core: TrackerCore<L, P, A>, clock: C) -> eyre::Result<Self>
    where
        L: LightSensors + Send + 'static,
        P: PanelAdc + Send + 'static,
        A: Actuator + Send + 'static,
        C: Clock + Send + 'static,
    {
        Self::spawn_with(core, clock, || {})
    }

    /// Like [`spawn`](Self::spawn), running `on_start` on the new thread before
    /// the first tick (CPU pinning, scheduler policy).
    pub fn spawn_with<L, P, A, C, F>(
        mut core: TrackerCore<L, P, A>,
        clock: C,
        on_start: F,
    ) -> eyre::Result<Self>
    where
        L: LightSensors + Send + 'static,
        P: PanelAdc + Send + 'static,
        A: Actuator + Send + 'static,
        C: Clock + Send + 'static,
        F: FnOnce() + Send + 'static,
    {
        let stats = Arc::new(LoopStats::default());
        let stats_thread = Arc::clone(&stats);
        let shutdown = Arc::new(AtomicBool::new(false));
        let shutdown_thread = Arc::clone(&shutdown);
        let period = crate::util::tick_period(core.tick_hz());

        let join_handle = std::thread::Builder::new()
            .name("tracker-control".into())
            .spawn(move || {
                on_start();
                core.begin();
                tracing::info!(period_us = period.as_micros(), "control loop started");

                let mut next = clock.now();
                loop {
                    if shutdown_thread.load(Ordering::Relaxed) {
                        tracing::debug!("control loop received shutdown signal");
                        break;
                    }

                    core.tick();
                    stats_thread.ticks.fetch_add(1, Ordering::Relaxed);

                    next += period;
                    let now = clock.now();
                    if now > next {
                        let n = stats_thread.overruns.fetch_add(1, Ordering::Relaxed) + 1;
                        tracing::debug!(
                            late_us = now.saturating_duration_since(next).as_micros(),
                            overruns = n,
                            "tick overran its period"
                        );
                        next = now;
                    }
                    clock.sleep_until(next);
                }
                tracing::trace!(ticks = core.seq(), "control thread exiting cleanly");
            })
            .wrap_err("spawn control thread")?;

        Ok(Self {
            stats,
            shutdown,
            join_handle: Some(join_handle),
        })
    }

    /// Ticks executed so far.
    pub fn ticks(&self) -> u64 {
        self.stats.ticks.load(Ordering::Relaxed)
    }

    /// Ticks that finished after their deadline.
    pub fn overruns(&self) -> u64 {
        self.stats.overruns.load(Ordering::Relaxed)
    }

    /// Signal the thread and wait for it to exit.
    pub fn stop(mut self) {
        self.shutdown_and_join();
    }

    fn shutdown_and_join(&mut self) {
        self.shutdown.store(true, Ordering::Relaxed);
        if let Some(handle) = self.join_handle.take() {
            match handle.join() {
                Ok(()) => tracing::trace!("control thread joined successfully"),
                Err(e) => tracing::warn!(?e, "control thread panicked during shutdown"),
            }
        }
    }
}

impl Drop for ControlLoop {
    fn drop(&mut self) {
        self.shutdown_and_join();
    }
}
