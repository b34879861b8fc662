pub mod error;
#[cfg(all(feature = "hardware", target_os = "linux"))]
pub mod gpio;
pub mod platform;

use scoot_traits::{PulseHandler, PulseInput};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use crate::error::HwError;

#[cfg(all(feature = "hardware", target_os = "linux"))]
pub use gpio::GpioPulseInput;

/// Longest uninterrupted sleep in the simulator, bounds stop() latency.
const SIM_SLEEP_SLICE: Duration = Duration::from_millis(10);

/// Simulated encoder emitting pulses at a fixed rate from its own thread.
///
/// A rate of 0 Hz models a parked scooter: `start` succeeds and no pulse
/// ever arrives.
pub struct SimulatedPulseInput {
    hz: f64,
    shutdown: Arc<AtomicBool>,
    join_handle: Option<JoinHandle<()>>,
}

impl SimulatedPulseInput {
    pub fn new(hz: f64) -> Self {
        Self {
            hz: if hz.is_finite() { hz.max(0.0) } else { 0.0 },
            shutdown: Arc::new(AtomicBool::new(false)),
            join_handle: None,
        }
    }

    pub fn hz(&self) -> f64 {
        self.hz
    }
}

impl PulseInput for SimulatedPulseInput {
    fn start(
        &mut self,
        mut handler: PulseHandler,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        if self.join_handle.is_some() {
            return Err(Box::new(HwError::AlreadyStarted));
        }
        if self.hz <= 0.0 {
            tracing::debug!("simulated encoder parked (0 Hz)");
            return Ok(());
        }
        let period = Duration::try_from_secs_f64(1.0 / self.hz)
            .ok()
            .filter(|p| Instant::now().checked_add(*p).is_some())
            .ok_or(HwError::InvalidRate(self.hz))?;
        let shutdown = self.shutdown.clone();
        shutdown.store(false, Ordering::Relaxed);
        tracing::debug!(hz = self.hz, "simulated encoder started");

        let handle = std::thread::Builder::new()
            .name("sim-encoder".into())
            .spawn(move || {
                let Some(mut next) = Instant::now().checked_add(period) else {
                    return;
                };
                'pulses: loop {
                    while Instant::now() < next {
                        if shutdown.load(Ordering::Relaxed) {
                            break 'pulses;
                        }
                        let left = next.saturating_duration_since(Instant::now());
                        std::thread::sleep(left.min(SIM_SLEEP_SLICE));
                    }
                    if shutdown.load(Ordering::Relaxed) {
                        break;
                    }
                    handler();
                    let Some(after) = next.checked_add(period) else {
                        break;
                    };
                    next = after;
                }
                tracing::trace!("simulated encoder thread exiting cleanly");
            })
            .map_err(HwError::Io)?;
        self.join_handle = Some(handle);
        Ok(())
    }

    fn stop(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.shutdown.store(true, Ordering::Relaxed);
        if let Some(handle) = self.join_handle.take()
            && handle.join().is_err()
        {
            tracing::warn!("simulated encoder thread panicked during shutdown");
        }
        Ok(())
    }
}

impl Drop for SimulatedPulseInput {
    fn drop(&mut self) {
        let _ = self.stop();
    }
}

/// Pulse input that never fires; used when hardware polling is disabled.
#[derive(Debug, Default, Clone, Copy)]
pub struct DisabledPulseInput;

impl PulseInput for DisabledPulseInput {
    fn start(
        &mut self,
        _handler: PulseHandler,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        Ok(())
    }

    fn stop(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        Ok(())
    }
}

/// Which pulse input to construct.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PulseBackend {
    /// GPIO edge detection on the given BCM pin.
    Gpio { bcm_pin: u8 },
    /// Fixed-rate simulator.
    Simulated { hz: f64 },
    /// No input at all.
    Disabled,
}

/// Construct the pulse input for `backend`.
///
/// Requesting `Gpio` in a build without the `hardware` feature (or off Linux)
/// is an error rather than a silent fallback.
pub fn open_pulse_input(backend: PulseBackend) -> error::Result<Box<dyn PulseInput + Send>> {
    match backend {
        PulseBackend::Gpio { bcm_pin } => open_gpio(bcm_pin),
        PulseBackend::Simulated { hz } => Ok(Box::new(SimulatedPulseInput::new(hz))),
        PulseBackend::Disabled => Ok(Box::new(DisabledPulseInput)),
    }
}

#[cfg(all(feature = "hardware", target_os = "linux"))]
fn open_gpio(bcm_pin: u8) -> error::Result<Box<dyn PulseInput + Send>> {
    Ok(Box::new(GpioPulseInput::new(bcm_pin)?))
}

#[cfg(not(all(feature = "hardware", target_os = "linux")))]
fn open_gpio(bcm_pin: u8) -> error::Result<Box<dyn PulseInput + Send>> {
    tracing::warn!(bcm_pin, "built without GPIO support");
    Err(HwError::Unsupported)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn simulated_input_pulses_until_stopped() {
        let count = Arc::new(AtomicUsize::new(0));
        let seen = count.clone();
        let mut input = SimulatedPulseInput::new(200.0);
        input
            .start(Box::new(move || {
                seen.fetch_add(1, Ordering::Relaxed);
            }))
            .unwrap();
        std::thread::sleep(Duration::from_millis(100));
        input.stop().unwrap();
        let after_stop = count.load(Ordering::Relaxed);
        assert!(after_stop > 0, "expected some pulses");
        std::thread::sleep(Duration::from_millis(30));
        assert_eq!(count.load(Ordering::Relaxed), after_stop);
    }

    #[test]
    fn parked_simulator_never_pulses() {
        let count = Arc::new(AtomicUsize::new(0));
        let seen = count.clone();
        let mut input = SimulatedPulseInput::new(0.0);
        input
            .start(Box::new(move || {
                seen.fetch_add(1, Ordering::Relaxed);
            }))
            .unwrap();
        std::thread::sleep(Duration::from_millis(20));
        input.stop().unwrap();
        assert_eq!(count.load(Ordering::Relaxed), 0);
    }

    #[test]
    fn double_start_is_rejected() {
        let mut input = SimulatedPulseInput::new(50.0);
        input.start(Box::new(|| {})).unwrap();
        let err = input.start(Box::new(|| {})).expect_err("second start");
        assert!(err.to_string().contains("already started"));
    }

    #[rstest]
    #[case(1e-30)]
    #[case(f64::MIN_POSITIVE)]
    fn unrepresentable_rate_is_an_error(#[case] hz: f64) {
        let mut input = SimulatedPulseInput::new(hz);
        let err = input.start(Box::new(|| {})).expect_err("rate too low");
        let hw = err.downcast_ref::<HwError>().expect("HwError");
        assert!(matches!(hw, HwError::InvalidRate(_)));
        input.stop().unwrap();
    }

    #[cfg(not(feature = "hardware"))]
    #[test]
    fn gpio_backend_unsupported_without_feature() {
        let err = open_pulse_input(PulseBackend::Gpio { bcm_pin: 12 })
            .err()
            .expect("gpio should be unavailable");
        assert!(matches!(err, HwError::Unsupported));
    }
}
