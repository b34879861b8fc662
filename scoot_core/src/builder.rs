//! Type-state builder for `Odometer`.
//!
//! `start()` only exists once a pulse input has been supplied. The shared
//! trajectory is checked at runtime so callers get a `BuildError` rather
//! than a panic when they forget it.

use std::sync::Arc;
use std::time::Duration;

use scoot_traits::PulseInput;

use crate::config::OdometerCfg;
use crate::error::{BuildError, Result};
use crate::odometer::Odometer;
use crate::trajectory::Trajectory;

/// Marker: no pulse input yet.
pub struct NoInput;

pub struct OdometerBuilder<I> {
    input: I,
    trajectory: Option<Arc<Trajectory>>,
    cfg: OdometerCfg,
}

impl Default for OdometerBuilder<NoInput> {
    fn default() -> Self {
        Self::new()
    }
}

impl OdometerBuilder<NoInput> {
    pub fn new() -> Self {
        Self {
            input: NoInput,
            trajectory: None,
            cfg: OdometerCfg::default(),
        }
    }
}

impl<I> OdometerBuilder<I> {
    pub fn with_input<Q: PulseInput>(self, input: Q) -> OdometerBuilder<Q> {
        OdometerBuilder {
            input,
            trajectory: self.trajectory,
            cfg: self.cfg,
        }
    }

    pub fn with_trajectory(mut self, trajectory: Arc<Trajectory>) -> Self {
        self.trajectory = Some(trajectory);
        self
    }

    pub fn with_cfg(mut self, cfg: OdometerCfg) -> Self {
        self.cfg = cfg;
        self
    }

    pub fn with_zero_speed_threshold(mut self, threshold: Duration) -> Self {
        self.cfg.zero_speed_threshold = threshold;
        self
    }

    pub fn enabled(mut self, enabled: bool) -> Self {
        self.cfg.enabled = enabled;
        self
    }
}

impl<P: PulseInput> OdometerBuilder<P> {
    /// Validate, bind the pulse input and start the idle poller.
    pub fn start(self) -> Result<Odometer<P>> {
        let trajectory = self
            .trajectory
            .ok_or_else(|| eyre::Report::new(BuildError::MissingTrajectory))?;
        if self.cfg.zero_speed_threshold.is_zero() {
            return Err(eyre::Report::new(BuildError::InvalidConfig(
                "zero_speed_threshold must be > 0",
            )));
        }
        Odometer::start(
            trajectory,
            self.input,
            self.cfg.zero_speed_threshold,
            self.cfg.enabled,
        )
    }
}
