#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
//! Config schemas and pulse-log parsing for the scooter odometer.
//!
//! - `Config` and sub-structs are deserialized from TOML and validated.
//! - The pulse-log CSV loader enforces its header and time ordering so that
//!   a replay never feeds the trajectory a timestamp from the past.
use serde::Deserialize;
use std::path::PathBuf;

/// Pulse-log CSV schema.
///
/// Expected headers:
/// t_s
///
/// Example:
/// t_s
/// 0.00
/// 0.25
/// 0.50
#[derive(Debug, Deserialize, Clone, Copy)]
pub struct PulseLogRow {
    pub t_s: f64,
}

#[derive(Debug, Deserialize)]
pub struct EncoderCfg {
    /// BCM pin the encoder output is wired to
    pub pin: u8,
    /// EMA weight of the newest speed sample, in (0.0, 1.0]
    #[serde(default = "default_alpha")]
    pub alpha: f64,
    /// Smoothed speeds below this magnitude (pulses/s) snap to 0. 0.0 disables.
    #[serde(default = "default_zero_tolerance")]
    pub zero_tolerance: f64,
    /// Pulse silence after which the scooter is reported stopped
    #[serde(default = "default_zero_speed_threshold_ms")]
    pub zero_speed_threshold_ms: u64,
    /// Force hardware polling on/off; absent means "probe for a Raspberry Pi"
    #[serde(default)]
    pub enabled: Option<bool>,
    /// Use the fixed-rate simulator at this many pulses/s instead of GPIO
    #[serde(default)]
    pub simulate_hz: Option<f64>,
}

/// Slowest simulated rate: one pulse every 100 s.
const MIN_SIMULATE_HZ: f64 = 0.01;

fn default_alpha() -> f64 {
    0.75
}

fn default_zero_tolerance() -> f64 {
    0.001
}

fn default_zero_speed_threshold_ms() -> u64 {
    750
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct WheelCfg {
    /// Encoder pulses per wheel revolution
    pub pulses_per_rev: u32,
    /// Wheel diameter in inches
    pub diameter_in: f64,
}

impl Default for WheelCfg {
    fn default() -> Self {
        Self {
            pulses_per_rev: 4,
            diameter_in: 7.5,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct CacheCfg {
    /// Persisted distance file (key/value text)
    pub path: PathBuf,
    /// Periodic flush cadence in seconds
    pub write_interval_s: u64,
    /// Only push a new distance into the cache once it moved this many pulses
    pub min_delta_pulses: f64,
}

impl Default for CacheCfg {
    fn default() -> Self {
        Self {
            path: PathBuf::from("odometer.ini"),
            write_interval_s: 60,
            min_delta_pulses: 10.0,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct HistoryCfg {
    /// Number of recent (timestamp, value) points kept for graphing
    pub capacity: usize,
}

impl Default for HistoryCfg {
    fn default() -> Self {
        Self { capacity: 20 }
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct Logging {
    pub file: Option<String>,  // path to .log (JSON lines)
    pub level: Option<String>, // "info","debug"
    /// Log rotation policy: "never" | "daily" | "hourly" (default: never)
    pub rotation: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Config {
    pub encoder: EncoderCfg,
    #[serde(default)]
    pub wheel: WheelCfg,
    #[serde(default)]
    pub cache: CacheCfg,
    #[serde(default)]
    pub history: HistoryCfg,
    #[serde(default)]
    pub logging: Logging,
}

pub fn load_toml(s: &str) -> Result<Config, toml::de::Error> {
    toml::from_str::<Config>(s)
}

/// Load a recorded pulse log. Times must be finite and non-decreasing.
pub fn load_pulse_log_csv(path: &std::path::Path) -> eyre::Result<Vec<f64>> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(|e| eyre::eyre!("open pulse log {:?}: {}", path, e))?;

    // Enforce exact headers
    let headers = rdr
        .headers()
        .map_err(|e| eyre::eyre!("read CSV headers {:?}: {}", path, e))?
        .clone();
    let expected = ["t_s"];
    let actual: Vec<String> = headers.iter().map(|s| s.to_string()).collect();
    if actual != expected {
        eyre::bail!(
            "pulse log CSV must have header 't_s', got: {}",
            actual.join(",")
        );
    }

    let mut times: Vec<f64> = Vec::new();
    for (idx, rec) in rdr.deserialize::<PulseLogRow>().enumerate() {
        let row = rec.map_err(|e| eyre::eyre!("invalid CSV row {}: {}", idx + 2, e))?;
        if !row.t_s.is_finite() {
            eyre::bail!("pulse log row {} has a non-finite time", idx + 2);
        }
        if let Some(&prev) = times.last()
            && row.t_s < prev
        {
            eyre::bail!(
                "pulse log times must be non-decreasing (row {}: {} < {})",
                idx + 2,
                row.t_s,
                prev
            );
        }
        times.push(row.t_s);
    }

    if times.is_empty() {
        eyre::bail!("pulse log {:?} has no rows", path);
    }
    Ok(times)
}

impl Config {
    pub fn validate(&self) -> eyre::Result<()> {
        // Encoder
        let e = &self.encoder;
        if !(e.alpha > 0.0 && e.alpha <= 1.0) {
            eyre::bail!("encoder.alpha must be in (0.0, 1.0]");
        }
        if !e.zero_tolerance.is_finite() || e.zero_tolerance < 0.0 {
            eyre::bail!("encoder.zero_tolerance must be >= 0.0");
        }
        if e.zero_speed_threshold_ms == 0 {
            eyre::bail!("encoder.zero_speed_threshold_ms must be >= 1");
        }
        if e.zero_speed_threshold_ms > 60 * 1000 {
            eyre::bail!("encoder.zero_speed_threshold_ms is unreasonably large (>60s)");
        }
        if let Some(hz) = e.simulate_hz
            && !(hz == 0.0 || (MIN_SIMULATE_HZ..=10_000.0).contains(&hz))
        {
            eyre::bail!("encoder.simulate_hz must be 0 or in [{MIN_SIMULATE_HZ}, 10000.0]");
        }

        // Wheel
        if self.wheel.pulses_per_rev == 0 {
            eyre::bail!("wheel.pulses_per_rev must be >= 1");
        }
        if !(self.wheel.diameter_in.is_finite() && self.wheel.diameter_in > 0.0) {
            eyre::bail!("wheel.diameter_in must be > 0.0");
        }

        // Cache
        if self.cache.path.as_os_str().is_empty() {
            eyre::bail!("cache.path must not be empty");
        }
        if self.cache.write_interval_s == 0 {
            eyre::bail!("cache.write_interval_s must be >= 1");
        }
        if self.cache.write_interval_s > 24 * 60 * 60 {
            eyre::bail!("cache.write_interval_s is unreasonably large (>24h)");
        }
        if !self.cache.min_delta_pulses.is_finite() || self.cache.min_delta_pulses < 0.0 {
            eyre::bail!("cache.min_delta_pulses must be >= 0.0");
        }

        // History
        if self.history.capacity == 0 {
            eyre::bail!("history.capacity must be >= 1");
        }
        if self.history.capacity > 100_000 {
            eyre::bail!("history.capacity is unreasonably large (>100000)");
        }

        // Logging
        if let Some(rot) = self.logging.rotation.as_deref()
            && !matches!(rot, "never" | "daily" | "hourly")
        {
            eyre::bail!("logging.rotation must be one of never|daily|hourly");
        }

        Ok(())
    }
}
