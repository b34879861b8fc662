//! `From` implementations bridging `scoot_config` types to `scoot_core` types.

use std::time::Duration;

use crate::config::{CacheCfg, OdometerCfg, SmoothingCfg, TrajectoryCfg};

// ── SmoothingCfg ─────────────────────────────────────────────────────────────

impl From<&scoot_config::EncoderCfg> for SmoothingCfg {
    fn from(c: &scoot_config::EncoderCfg) -> Self {
        Self {
            alpha: c.alpha,
            // 0.0 in the file means "never snap".
            zero_tolerance: (c.zero_tolerance > 0.0).then_some(c.zero_tolerance),
        }
    }
}

// ── TrajectoryCfg ────────────────────────────────────────────────────────────

impl From<&scoot_config::Config> for TrajectoryCfg {
    fn from(c: &scoot_config::Config) -> Self {
        Self {
            smoothing: SmoothingCfg::from(&c.encoder),
            history_capacity: c.history.capacity,
        }
    }
}

// ── OdometerCfg ──────────────────────────────────────────────────────────────

/// `enabled` absent in the file maps to `true` here; the CLI replaces it with
/// the platform probe result before building.
impl From<&scoot_config::EncoderCfg> for OdometerCfg {
    fn from(c: &scoot_config::EncoderCfg) -> Self {
        Self {
            zero_speed_threshold: Duration::from_millis(c.zero_speed_threshold_ms),
            enabled: c.enabled.unwrap_or(true),
        }
    }
}

// ── CacheCfg ─────────────────────────────────────────────────────────────────

impl From<&scoot_config::CacheCfg> for CacheCfg {
    fn from(c: &scoot_config::CacheCfg) -> Self {
        Self {
            path: c.path.clone(),
            write_interval: Duration::from_secs(c.write_interval_s),
            min_delta_pulses: c.min_delta_pulses,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CFG: &str = r#"
[encoder]
pin = 17
alpha = 0.5
zero_tolerance = 0.0
zero_speed_threshold_ms = 1000
enabled = false

[cache]
path = "/var/lib/scoot/odo.ini"
write_interval_s = 30
min_delta_pulses = 4.0

[history]
capacity = 8
"#;

    #[test]
    fn maps_every_section() {
        let c = scoot_config::load_toml(CFG).unwrap();
        let t = TrajectoryCfg::from(&c);
        assert_eq!(t.smoothing.alpha, 0.5);
        assert_eq!(t.smoothing.zero_tolerance, None);
        assert_eq!(t.history_capacity, 8);

        let o = OdometerCfg::from(&c.encoder);
        assert_eq!(o.zero_speed_threshold, Duration::from_secs(1));
        assert!(!o.enabled);

        let k = CacheCfg::from(&c.cache);
        assert_eq!(k.write_interval, Duration::from_secs(30));
        assert_eq!(k.min_delta_pulses, 4.0);
    }

    #[test]
    fn defaults_fill_missing_sections() {
        let c = scoot_config::load_toml("[encoder]\npin = 4\n").unwrap();
        let t = TrajectoryCfg::from(&c);
        assert_eq!(t, TrajectoryCfg::default());
        assert_eq!(OdometerCfg::from(&c.encoder), OdometerCfg::default());
        assert_eq!(CacheCfg::from(&c.cache), CacheCfg::default());
    }
}
