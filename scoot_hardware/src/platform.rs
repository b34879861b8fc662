//! Host platform probe used to decide whether GPIO pulse input is available.

use std::path::Path;

/// SoC identifiers reported in the `Hardware` line of older Pi kernels.
const PI_CHIPS: &[&str] = &["BCM2708", "BCM2709", "BCM2711", "BCM2835", "BCM2836"];

/// True when `/proc/cpuinfo` identifies a Raspberry Pi. Any read error means "no".
pub fn is_raspberry_pi() -> bool {
    if !cfg!(target_os = "linux") {
        return false;
    }
    cpuinfo_is_raspberry_pi(Path::new("/proc/cpuinfo"))
}

/// Probe an arbitrary cpuinfo file.
pub fn cpuinfo_is_raspberry_pi(path: &Path) -> bool {
    match std::fs::read_to_string(path) {
        Ok(text) => parse_cpuinfo(&text),
        Err(e) => {
            tracing::debug!(error = %e, path = %path.display(), "cpuinfo unreadable");
            false
        }
    }
}

/// Newer kernels drop the `Hardware` line but keep a `Model` line.
pub fn parse_cpuinfo(text: &str) -> bool {
    text.lines().any(|line| {
        let Some((key, value)) = line.split_once(':') else {
            return false;
        };
        let value = value.trim();
        match key.trim() {
            "Hardware" => PI_CHIPS.contains(&value),
            "Model" => value.starts_with("Raspberry Pi"),
            _ => false,
        }
    })
}
