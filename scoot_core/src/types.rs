/// One observation of the trajectory, in pulse units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    /// Seconds since the Unix epoch (effective time of the observation).
    pub timestamp_s: f64,
    /// Cumulative pulses.
    pub position: f64,
    /// Smoothed pulses per second; exactly 0.0 for idle samples.
    pub speed: f64,
}

/// Motion state as seen by the odometer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OdometerState {
    /// Initialized, no pulse seen yet.
    Idle,
    /// Pulses arriving faster than the zero-speed threshold.
    Moving,
    /// The idle poller forced a zero-speed sample.
    Stopped,
}

impl OdometerState {
    pub(crate) fn as_u8(self) -> u8 {
        match self {
            OdometerState::Idle => 0,
            OdometerState::Moving => 1,
            OdometerState::Stopped => 2,
        }
    }

    pub(crate) fn from_u8(v: u8) -> Self {
        match v {
            1 => OdometerState::Moving,
            2 => OdometerState::Stopped,
            _ => OdometerState::Idle,
        }
    }
}
