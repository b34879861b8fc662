//! Offline replay of recorded pulse times.
//!
//! Drives a `Trajectory` on a `ManualClock` with the same idle inference the
//! live odometer uses: poll ticks land every half threshold from the first
//! pulse and are interleaved with the recorded pulses in time order.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use scoot_traits::ManualClock;

use crate::config::TrajectoryCfg;
use crate::odometer::IdleMonitor;
use crate::trajectory::Trajectory;
use crate::types::Sample;
use crate::util::poll_period;

/// Upper bound on trailing ticks after the last pulse.
const MAX_TRAILING_TICKS: usize = 16;

/// Ticks replayed inside one gap before skipping to the tick just ahead of
/// the next pulse.
const MAX_TICKS_PER_GAP: usize = 16;

#[derive(Debug, Clone, PartialEq)]
pub struct ReplayReport {
    /// Every sample the observers saw, in order.
    pub samples: Vec<Sample>,
    pub pulses: usize,
    pub final_position: f64,
}

impl ReplayReport {
    /// Samples where the position did not advance.
    pub fn idle_samples(&self) -> usize {
        let mut prev = 0.0;
        self.samples
            .iter()
            .filter(|s| {
                let idle = s.position <= prev;
                prev = s.position;
                idle
            })
            .count()
    }

    pub fn max_speed(&self) -> f64 {
        self.samples.iter().map(|s| s.speed).fold(0.0, f64::max)
    }
}

/// Replay `times` (seconds, non-decreasing) through a fresh trajectory.
///
/// The clock starts at the first pulse time, so that first pulse only moves
/// the position. After the last pulse, ticking continues until one idle
/// sample has been emitted.
pub fn replay(times: &[f64], cfg: TrajectoryCfg, threshold: Duration) -> ReplayReport {
    let Some(&start) = times.first() else {
        return ReplayReport {
            samples: Vec::new(),
            pulses: 0,
            final_position: 0.0,
        };
    };

    let clock = ManualClock::starting_at(start);
    let trajectory = Trajectory::new(cfg, 0.0, Arc::new(clock.clone()));
    let seen = Arc::new(Mutex::new(Vec::with_capacity(times.len() * 2)));
    let sink = seen.clone();
    trajectory.register_callback(move |s: Sample| {
        sink.lock().unwrap_or_else(PoisonError::into_inner).push(s);
    });

    let monitor = IdleMonitor::new(threshold);
    let period = poll_period(threshold).as_secs_f64();
    let seek = |t: f64| {
        let offset = (t - start).max(0.0);
        clock.set_offset(Duration::try_from_secs_f64(offset).unwrap_or(Duration::MAX));
    };
    // Tick k lands at start + k * period.
    let tick_at = |k: u64| start + k as f64 * period;
    let mut k: u64 = 1;

    for &t in times {
        // Index of the last tick strictly before t; the cast saturates.
        let last = (((t - start) / period).ceil() as u64).saturating_sub(1);
        let mut ticks = 0;
        while k <= last && tick_at(k) < t {
            seek(tick_at(k));
            monitor.tick(&trajectory);
            ticks += 1;
            k = if ticks == MAX_TICKS_PER_GAP {
                last.max(k + 1)
            } else {
                k + 1
            };
        }
        seek(t);
        trajectory.step(1.0);
        monitor.on_pulse();
    }
    for _ in 0..MAX_TRAILING_TICKS {
        seek(tick_at(k));
        k = k.saturating_add(1);
        if monitor.tick(&trajectory) {
            break;
        }
    }

    let (_, final_position) = trajectory.position();
    let samples = std::mem::take(&mut *seen.lock().unwrap_or_else(PoisonError::into_inner));
    tracing::debug!(
        pulses = times.len(),
        samples = samples.len(),
        final_position,
        "replay finished"
    );
    ReplayReport {
        samples,
        pulses: times.len(),
        final_position,
    }
}
