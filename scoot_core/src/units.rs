//! Pulse-to-distance conversion for a given wheel.

use std::f64::consts::PI;

const INCHES_PER_FOOT: f64 = 12.0;
const FEET_PER_MILE: f64 = 5280.0;
const SECONDS_PER_HOUR: f64 = 3600.0;

/// Converts pulse counts and pulse rates into feet, miles and mph.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Units {
    pulses_per_foot: f64,
}

impl Units {
    /// `pulses_per_rev` encoder edges per revolution of a wheel `diameter_in` inches across.
    pub fn from_wheel(pulses_per_rev: u32, diameter_in: f64) -> Self {
        let circumference_ft = PI * diameter_in / INCHES_PER_FOOT;
        Self {
            pulses_per_foot: f64::from(pulses_per_rev) / circumference_ft,
        }
    }

    pub fn pulses_per_foot(&self) -> f64 {
        self.pulses_per_foot
    }

    pub fn feet(&self, pulses: f64) -> f64 {
        pulses / self.pulses_per_foot
    }

    pub fn miles(&self, pulses: f64) -> f64 {
        self.feet(pulses) / FEET_PER_MILE
    }

    pub fn feet_per_s(&self, pulses_per_s: f64) -> f64 {
        pulses_per_s / self.pulses_per_foot
    }

    pub fn mph(&self, pulses_per_s: f64) -> f64 {
        self.feet_per_s(pulses_per_s) * SECONDS_PER_HOUR / FEET_PER_MILE
    }
}

impl From<&scoot_config::WheelCfg> for Units {
    fn from(w: &scoot_config::WheelCfg) -> Self {
        Self::from_wheel(w.pulses_per_rev, w.diameter_in)
    }
}
