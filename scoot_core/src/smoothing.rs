//! Exponential moving average with snap-to-zero.

/// Exponential smoothing filter for irregularly arriving samples.
///
/// The first sample passes through unchanged. Later samples blend as
/// `alpha * value + (1 - alpha) * previous`; a blended magnitude under
/// `zero_tolerance` is stored and returned as exactly `0.0`, so the decay
/// tail after the scooter stops does not linger as tiny non-zero speeds.
#[derive(Debug, Clone)]
pub struct ExponentialSmoothing {
    alpha: f64,
    zero_tolerance: Option<f64>,
    last_smoothed: Option<f64>,
}

impl ExponentialSmoothing {
    pub fn new(alpha: f64, zero_tolerance: Option<f64>) -> Self {
        debug_assert!(alpha > 0.0 && alpha <= 1.0, "alpha must be in (0, 1]");
        Self {
            alpha,
            zero_tolerance,
            last_smoothed: None,
        }
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    pub fn smooth(&mut self, value: f64) -> f64 {
        let next = match self.last_smoothed {
            None => value,
            Some(prev) => {
                let blended = self.alpha * value + (1.0 - self.alpha) * prev;
                match self.zero_tolerance {
                    Some(tol) if blended.abs() < tol => 0.0,
                    _ => blended,
                }
            }
        };
        self.last_smoothed = Some(next);
        next
    }

    /// Last smoothed value, `None` before the first sample.
    pub fn value(&self) -> Option<f64> {
        self.last_smoothed
    }
}

impl From<crate::config::SmoothingCfg> for ExponentialSmoothing {
    fn from(cfg: crate::config::SmoothingCfg) -> Self {
        Self::new(cfg.alpha, cfg.zero_tolerance)
    }
}
