//! Test pulse inputs for scoot_core and downstream crates.

use std::sync::{Arc, Mutex, PoisonError};

use scoot_traits::{PulseHandler, PulseInput};

type Slot = Arc<Mutex<Option<PulseHandler>>>;

/// Pulse input fired by hand through a `PulseTrigger`.
#[derive(Default)]
pub struct ManualPulseInput {
    slot: Slot,
    stops: Arc<Mutex<u32>>,
}

/// Fires the handler bound to a `ManualPulseInput`, from any thread.
#[derive(Clone)]
pub struct PulseTrigger {
    slot: Slot,
    stops: Arc<Mutex<u32>>,
}

impl ManualPulseInput {
    pub fn new() -> (Self, PulseTrigger) {
        let input = Self::default();
        let trigger = PulseTrigger {
            slot: input.slot.clone(),
            stops: input.stops.clone(),
        };
        (input, trigger)
    }
}

impl PulseTrigger {
    /// Deliver one edge. Returns false when no handler is bound.
    pub fn pulse(&self) -> bool {
        let mut slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
        match slot.as_mut() {
            Some(handler) => {
                handler();
                true
            }
            None => false,
        }
    }

    pub fn pulses(&self, n: usize) -> usize {
        (0..n).filter(|_| self.pulse()).count()
    }

    pub fn is_bound(&self) -> bool {
        self.slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// How many times `stop` was called on the input.
    pub fn stop_count(&self) -> u32 {
        *self.stops.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl PulseInput for ManualPulseInput {
    fn start(
        &mut self,
        handler: PulseHandler,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let mut slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
        if slot.is_some() {
            return Err(Box::new(std::io::Error::other("manual input already started")));
        }
        *slot = Some(handler);
        Ok(())
    }

    fn stop(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        // Taking the slot waits out an in-flight pulse.
        self.slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        *self.stops.lock().unwrap_or_else(PoisonError::into_inner) += 1;
        Ok(())
    }
}

/// Pulse input whose `start` always fails, like a GPIO pin held by another process.
#[derive(Debug, Default, Clone, Copy)]
pub struct FailingPulseInput;

impl PulseInput for FailingPulseInput {
    fn start(
        &mut self,
        _handler: PulseHandler,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        #[cfg(feature = "hardware-errors")]
        {
            Err(Box::new(scoot_hardware::error::HwError::Gpio(
                "pin busy".into(),
            )))
        }
        #[cfg(not(feature = "hardware-errors"))]
        {
            Err(Box::new(std::io::Error::other("gpio error: pin busy")))
        }
    }

    fn stop(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        Ok(())
    }
}
