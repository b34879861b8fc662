use rppal::gpio::{Gpio, InputPin, Level, Trigger};
use scoot_traits::{PulseHandler, PulseInput};
use tracing::{debug, trace};

use crate::error::{HwError, Result};

/// Rotary encoder wired to a single BCM pin, pulled up, counting rising edges.
///
/// rppal runs the interrupt callback on its own thread, one call per edge.
pub struct GpioPulseInput {
    bcm_pin: u8,
    pin: Option<InputPin>,
}

impl GpioPulseInput {
    /// Acquire the pin. Fails if the GPIO peripheral or the pin is unavailable.
    pub fn new(bcm_pin: u8) -> Result<Self> {
        let gpio = Gpio::new().map_err(|e| HwError::Gpio(format!("open gpio: {e}")))?;
        let pin = gpio
            .get(bcm_pin)
            .map_err(|e| HwError::Gpio(format!("open encoder pin {bcm_pin}: {e}")))?
            .into_input_pullup();
        debug!(bcm_pin, "encoder pin acquired");
        Ok(Self {
            bcm_pin,
            pin: Some(pin),
        })
    }

    fn pin_mut(&mut self) -> Result<&mut InputPin> {
        self.pin
            .as_mut()
            .ok_or_else(|| HwError::Gpio(format!("encoder pin {} released", self.bcm_pin)))
    }
}

impl PulseInput for GpioPulseInput {
    fn start(
        &mut self,
        mut handler: PulseHandler,
    ) -> std::result::Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let bcm_pin = self.bcm_pin;
        self.pin_mut()?
            .set_async_interrupt(Trigger::RisingEdge, move |level: Level| {
                trace!(bcm_pin, ?level, "encoder edge");
                handler();
            })
            .map_err(|e| HwError::Gpio(format!("edge detect on pin {bcm_pin}: {e}")))?;
        Ok(())
    }

    fn stop(&mut self) -> std::result::Result<(), Box<dyn std::error::Error + Send + Sync>> {
        if let Some(mut pin) = self.pin.take() {
            pin.clear_async_interrupt()
                .map_err(|e| HwError::Gpio(format!("clear edge detect: {e}")))?;
            // Dropping the InputPin resets it to its original state.
            drop(pin);
            debug!(bcm_pin = self.bcm_pin, "encoder pin released");
        }
        Ok(())
    }
}
