use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

/// Time source for pulse timestamps and idle detection.
///
/// `timestamp_s()` is seconds since the Unix epoch and never moves backwards.
pub trait Clock {
    fn timestamp_s(&self) -> f64;
}

fn unix_now_s() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or(0.0)
}

/// Real-time monotonic clock backed by std::time::Instant.
///
/// Timestamps are anchored to the wall clock once at construction and then
/// advanced with `Instant`, so NTP steps cannot make them go backwards.
#[derive(Debug, Clone, Copy)]
pub struct MonotonicClock {
    anchor: Instant,
    anchor_unix_s: f64,
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl MonotonicClock {
    #[inline]
    pub fn new() -> Self {
        Self {
            anchor: Instant::now(),
            anchor_unix_s: unix_now_s(),
        }
    }
}

impl Clock for MonotonicClock {
    #[inline]
    fn timestamp_s(&self) -> f64 {
        self.anchor_unix_s + self.anchor.elapsed().as_secs_f64()
    }
}

/// Deterministic clock whose time can be advanced manually.
///
/// timestamp_s() = start_s + offset
///
/// Clones share the same offset, so a test can hand one clone to the code
/// under test and keep another to drive time.
#[derive(Debug, Clone)]
pub struct ManualClock {
    start_s: f64,
    offset: Arc<Mutex<Duration>>,
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl ManualClock {
    pub fn new() -> Self {
        Self::starting_at(0.0)
    }

    /// Clock whose `timestamp_s()` reads `start_s` until advanced.
    pub fn starting_at(start_s: f64) -> Self {
        Self {
            start_s,
            offset: Arc::new(Mutex::new(Duration::ZERO)),
        }
    }

    /// Advance the clock by the given duration.
    pub fn advance(&self, d: Duration) {
        if let Ok(mut off) = self.offset.lock() {
            *off = off.saturating_add(d);
        }
    }

    /// Advance the clock by a number of seconds; negative values are ignored.
    pub fn advance_s(&self, secs: f64) {
        if secs.is_finite() && secs > 0.0 {
            self.advance(Duration::from_secs_f64(secs));
        }
    }

    /// Set the absolute offset from `start_s`.
    pub fn set_offset(&self, d: Duration) {
        if let Ok(mut off) = self.offset.lock() {
            *off = d;
        }
    }

    fn offset(&self) -> Duration {
        self.offset.lock().map(|g| *g).unwrap_or(Duration::ZERO)
    }
}

impl Clock for ManualClock {
    fn timestamp_s(&self) -> f64 {
        self.start_s + self.offset().as_secs_f64()
    }
}

impl<C: Clock + ?Sized> Clock for Arc<C> {
    fn timestamp_s(&self) -> f64 {
        (**self).timestamp_s()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_clock_clones_share_time() {
        let clock = ManualClock::starting_at(100.0);
        let driver = clock.clone();
        driver.advance(Duration::from_millis(1500));
        assert!((clock.timestamp_s() - 101.5).abs() < 1e-9);
        clock.advance_s(0.5);
        assert!((driver.timestamp_s() - 102.0).abs() < 1e-9);
    }

    #[test]
    fn manual_clock_ignores_negative_advance() {
        let clock = ManualClock::new();
        clock.advance_s(-3.0);
        clock.advance_s(f64::NAN);
        assert_eq!(clock.timestamp_s(), 0.0);
    }

    #[test]
    fn monotonic_timestamps_never_decrease() {
        let clock = MonotonicClock::new();
        let a = clock.timestamp_s();
        let b = clock.timestamp_s();
        assert!(b >= a);
        assert!(a > 1_000_000_000.0, "anchored to the unix epoch");
    }
}
