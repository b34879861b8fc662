//! Binds a `Trajectory` to a pulse input and runs the idle poller.
//!
//! Every encoder edge becomes `Trajectory::step(1.0)`. A background thread
//! wakes every half zero-speed threshold and, once pulses have been silent
//! for longer than the threshold, emits a zero-speed sample through
//! `Trajectory::not_moving`. It keeps emitting one per tick while the
//! scooter stays parked.

use crossbeam_channel as xch;
use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};
use std::thread::JoinHandle;
use std::time::Duration;

use scoot_traits::{PulseHandler, PulseInput};

use crate::error::{OdoError, Result};
use crate::hw_error::map_hw_error;
use crate::trajectory::Trajectory;
use crate::types::OdometerState;
use crate::util::poll_period;

/// Zero-speed inference, one tick at a time.
///
/// The poller thread calls `tick` on a timer; tests call it directly against
/// a trajectory driven by a `ManualClock`.
#[derive(Debug, Clone)]
pub struct IdleMonitor {
    threshold_s: f64,
    state: Arc<AtomicU8>,
}

impl IdleMonitor {
    pub fn new(threshold: Duration) -> Self {
        Self {
            threshold_s: threshold.as_secs_f64(),
            state: Arc::new(AtomicU8::new(OdometerState::Idle.as_u8())),
        }
    }

    pub fn state(&self) -> OdometerState {
        OdometerState::from_u8(self.state.load(Ordering::Acquire))
    }

    /// Record a pulse: any state becomes `Moving`.
    pub fn on_pulse(&self) {
        let prev = self
            .state
            .swap(OdometerState::Moving.as_u8(), Ordering::AcqRel);
        if prev != OdometerState::Moving.as_u8() {
            tracing::debug!(from = ?OdometerState::from_u8(prev), "odometer moving");
        }
    }

    /// Emit a zero-speed sample if pulses have been silent past the threshold.
    /// Returns whether one was emitted.
    pub fn tick(&self, trajectory: &Trajectory) -> bool {
        trajectory
            .not_moving_if_silent(self.threshold_s, |silent_for| {
                // A parked odometer that never moved stays Idle.
                if self
                    .state
                    .compare_exchange(
                        OdometerState::Moving.as_u8(),
                        OdometerState::Stopped.as_u8(),
                        Ordering::AcqRel,
                        Ordering::Acquire,
                    )
                    .is_ok()
                {
                    tracing::debug!(silent_for, "odometer stopped");
                }
            })
            .is_some()
    }
}

pub struct Odometer<P: PulseInput> {
    trajectory: Arc<Trajectory>,
    input: P,
    monitor: IdleMonitor,
    threshold: Duration,
    enabled: bool,
    stop_tx: Option<xch::Sender<()>>,
    poller: Option<JoinHandle<()>>,
    released: bool,
}

impl<P: PulseInput> core::fmt::Debug for Odometer<P> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Odometer")
            .field("state", &self.state())
            .field("enabled", &self.enabled)
            .field("threshold", &self.threshold)
            .field("trajectory", &self.trajectory)
            .finish()
    }
}

fn pulse_handler(trajectory: Arc<Trajectory>, monitor: IdleMonitor) -> PulseHandler {
    Box::new(move || {
        trajectory.step(1.0);
        monitor.on_pulse();
    })
}

impl<P: PulseInput> Odometer<P> {
    /// Bind the input and spawn the poller. When `enabled` is false neither runs.
    pub(crate) fn start(
        trajectory: Arc<Trajectory>,
        mut input: P,
        threshold: Duration,
        enabled: bool,
    ) -> Result<Self> {
        let monitor = IdleMonitor::new(threshold);
        if !enabled {
            tracing::info!("odometer disabled; pulse input and idle poller not started");
            return Ok(Self {
                trajectory,
                input,
                monitor,
                threshold,
                enabled,
                stop_tx: None,
                poller: None,
                released: true,
            });
        }

        input
            .start(pulse_handler(trajectory.clone(), monitor.clone()))
            .map_err(|e| eyre::Report::new(map_hw_error(e.as_ref())))?;

        let (stop_tx, stop_rx) = xch::bounded::<()>(0);
        let period = poll_period(threshold);
        let poll_traj = trajectory.clone();
        let poll_monitor = monitor.clone();
        let spawned = std::thread::Builder::new()
            .name("idle-poller".into())
            .spawn(move || {
                loop {
                    match stop_rx.recv_timeout(period) {
                        Err(xch::RecvTimeoutError::Timeout) => {
                            poll_monitor.tick(&poll_traj);
                        }
                        // Stop signal or sender dropped.
                        _ => break,
                    }
                }
                tracing::trace!("idle poller exiting cleanly");
            });
        let poller = match spawned {
            Ok(h) => h,
            Err(e) => {
                if let Err(stop_err) = input.stop() {
                    tracing::warn!(error = %stop_err, "pulse input stop failed after poller spawn error");
                }
                return Err(eyre::Report::new(OdoError::Io(format!(
                    "spawn idle poller: {e}"
                ))));
            }
        };
        tracing::info!(
            threshold_ms = threshold.as_millis() as u64,
            poll_ms = period.as_millis() as u64,
            "odometer started"
        );

        Ok(Self {
            trajectory,
            input,
            monitor,
            threshold,
            enabled,
            stop_tx: Some(stop_tx),
            poller: Some(poller),
            released: false,
        })
    }

    pub fn trajectory(&self) -> &Arc<Trajectory> {
        &self.trajectory
    }

    pub fn state(&self) -> OdometerState {
        self.monitor.state()
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn zero_speed_threshold(&self) -> Duration {
        self.threshold
    }

    /// Stop the poller, join it, then release the pulse input. Idempotent.
    ///
    /// No poll tick runs after the input is released.
    pub fn deinit(&mut self) -> Result<()> {
        drop(self.stop_tx.take());
        if let Some(handle) = self.poller.take() {
            match handle.join() {
                Ok(()) => tracing::trace!("idle poller joined"),
                Err(e) => tracing::warn!(?e, "idle poller panicked"),
            }
        }
        if self.released {
            return Ok(());
        }
        self.released = true;
        self.input
            .stop()
            .map_err(|e| eyre::Report::new(map_hw_error(e.as_ref())))?;
        tracing::info!("odometer stopped");
        Ok(())
    }
}

impl<P: PulseInput> Drop for Odometer<P> {
    fn drop(&mut self) {
        if let Err(e) = self.deinit() {
            tracing::warn!(error = %e, "odometer deinit failed during drop");
        }
    }
}
