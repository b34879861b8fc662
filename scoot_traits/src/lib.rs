pub mod clock;

pub use clock::{Clock, ManualClock, MonotonicClock};

/// Callback bound to a pulse input; invoked once per encoder edge, with no payload.
pub type PulseHandler = Box<dyn FnMut() + Send + 'static>;

/// Source of encoder pulses (GPIO edge detection, a simulator, a test harness).
///
/// `start` hands the handler to the platform's interrupt machinery; it may be
/// called from any thread. `stop` must guarantee the handler is not invoked
/// again once it returns, and releases the underlying pin.
pub trait PulseInput {
    fn start(
        &mut self,
        handler: PulseHandler,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
    fn stop(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
}

impl<P: PulseInput + ?Sized> PulseInput for Box<P> {
    fn start(
        &mut self,
        handler: PulseHandler,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        (**self).start(handler)
    }

    fn stop(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        (**self).stop()
    }
}
