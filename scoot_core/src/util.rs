//! Small timing helpers shared by the odometer and replay.

use std::time::Duration;

/// Idle poller period: half the zero-speed threshold, never below 1 ms.
#[inline]
pub fn poll_period(threshold: Duration) -> Duration {
    (threshold / 2).max(Duration::from_millis(1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(750, 375)]
    #[case(1000, 500)]
    #[case(1, 1)]
    #[case(3, 1)]
    fn halves_threshold_with_floor(#[case] threshold_ms: u64, #[case] expect_ms: u64) {
        assert_eq!(
            poll_period(Duration::from_millis(threshold_ms)),
            Duration::from_millis(expect_ms)
        );
    }

    #[test]
    fn zero_threshold_still_polls() {
        assert_eq!(poll_period(Duration::ZERO), Duration::from_millis(1));
    }
}
