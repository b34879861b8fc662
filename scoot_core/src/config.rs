//! Configuration types for the odometry engine.
//!
//! These are the runtime configuration structs used by `Trajectory`,
//! `Odometer` and `DistanceCache`. They are separate from the
//! TOML-deserialized config in `scoot_config`.

use std::path::PathBuf;
use std::time::Duration;

/// Speed smoothing configuration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SmoothingCfg {
    /// EMA weight of the newest sample. Range: (0.0, 1.0].
    pub alpha: f64,
    /// Smoothed magnitudes below this snap to exactly 0.0. `None` disables snapping.
    pub zero_tolerance: Option<f64>,
}

impl Default for SmoothingCfg {
    fn default() -> Self {
        Self {
            alpha: 0.75,
            zero_tolerance: Some(0.001),
        }
    }
}

/// Trajectory configuration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrajectoryCfg {
    pub smoothing: SmoothingCfg,
    /// Points kept in each of the speed/position history windows.
    pub history_capacity: usize,
}

impl Default for TrajectoryCfg {
    fn default() -> Self {
        Self {
            smoothing: SmoothingCfg::default(),
            history_capacity: 20,
        }
    }
}

/// Odometer configuration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OdometerCfg {
    /// Pulse silence after which a zero-speed sample is emitted.
    /// The idle poller runs every half of this.
    pub zero_speed_threshold: Duration,
    /// Whether the pulse input and idle poller run at all.
    pub enabled: bool,
}

impl Default for OdometerCfg {
    fn default() -> Self {
        Self {
            zero_speed_threshold: Duration::from_millis(750),
            enabled: true,
        }
    }
}

/// Distance cache configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheCfg {
    pub path: PathBuf,
    /// Periodic flush cadence.
    pub write_interval: Duration,
    /// Coalescing step for the cache observer, in pulses.
    pub min_delta_pulses: f64,
}

impl Default for CacheCfg {
    fn default() -> Self {
        Self {
            path: PathBuf::from("odometer.ini"),
            write_interval: Duration::from_secs(60),
            min_delta_pulses: 10.0,
        }
    }
}
