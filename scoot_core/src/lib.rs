#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::missing_errors_doc,
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation
)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
//! Scooter odometry core (hardware-agnostic).
//!
//! Encoder pulses arrive through `scoot_traits::PulseInput`; everything here
//! works in pulse units and leaves feet/mph to `units::Units`.
//!
//! ## Architecture
//!
//! - **Smoothing**: EMA with snap-to-zero (`smoothing`)
//! - **Trajectory**: position, smoothed speed, history and ordered observer fan-out (`trajectory`)
//! - **Odometer**: pulse handler plus the idle poller that infers "stopped" (`odometer`, `builder`)
//! - **Distance cache**: persisted cumulative distance with periodic flush (`cache`)
//! - **Replay**: offline pulse-log playback on a manual clock (`replay`)
//!
//! ## Threads
//!
//! Samples are produced on the pulse input's interrupt thread and on the idle
//! poller. Observers run on whichever thread produced the sample, in order,
//! outside the trajectory lock. Slow consumers go behind `QueuedObserver`.

mod atomic;
pub mod builder;
pub mod cache;
pub mod config;
pub mod conversions;
pub mod error;
pub mod history;
pub mod hw_error;
pub mod mocks;
pub mod observer;
pub mod odometer;
pub mod replay;
pub mod smoothing;
pub mod trajectory;
pub mod types;
pub mod units;
pub mod util;

pub use builder::OdometerBuilder;
pub use cache::{CacheRecord, CacheUpdater, DistanceCache};
pub use config::{CacheCfg, OdometerCfg, SmoothingCfg, TrajectoryCfg};
pub use error::{BuildError, OdoError, Result};
pub use observer::{Observer, QueuedObserver};
pub use odometer::{IdleMonitor, Odometer};
pub use smoothing::ExponentialSmoothing;
pub use trajectory::Trajectory;
pub use types::{OdometerState, Sample};
pub use units::Units;
