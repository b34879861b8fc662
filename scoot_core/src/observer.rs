//! Sample observers and their dispatch.
//!
//! Observers run on whichever thread produced the sample (the pulse
//! interrupt thread or the idle poller). A panicking observer is caught and
//! logged; the remaining observers still run. Observers that may block
//! (network posts, socket pushes) belong behind a `QueuedObserver`.

use crossbeam_channel as xch;
use std::any::Any;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::JoinHandle;

use crate::types::Sample;

/// Receives every trajectory sample, in production order.
///
/// Must not call back into the `Trajectory` that invoked it.
pub trait Observer: Send + Sync {
    fn on_sample(&self, sample: Sample);
}

impl<F> Observer for F
where
    F: Fn(Sample) + Send + Sync,
{
    fn on_sample(&self, sample: Sample) {
        self(sample)
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.as_str()
    } else {
        "non-string panic payload"
    }
}

/// Invoke one observer, containing any panic. Returns false if it panicked.
pub(crate) fn notify_isolated(index: usize, observer: &dyn Observer, sample: Sample) -> bool {
    match catch_unwind(AssertUnwindSafe(|| observer.on_sample(sample))) {
        Ok(()) => true,
        Err(payload) => {
            tracing::error!(
                observer = index,
                panic = panic_message(payload.as_ref()),
                "observer panicked; continuing with remaining observers"
            );
            false
        }
    }
}

/// Runs an inner observer on a dedicated worker thread fed by a bounded FIFO.
///
/// `on_sample` never blocks: when the queue is full the sample is dropped and
/// counted. Samples that were queued are delivered in order.
pub struct QueuedObserver {
    name: String,
    tx: Mutex<Option<xch::Sender<Sample>>>,
    dropped: AtomicU64,
    join_handle: Mutex<Option<JoinHandle<()>>>,
}

impl QueuedObserver {
    pub fn spawn<O: Observer + 'static>(
        name: impl Into<String>,
        capacity: usize,
        inner: O,
    ) -> crate::error::Result<Arc<Self>> {
        let name = name.into();
        let (tx, rx) = xch::bounded::<Sample>(capacity.max(1));
        let thread_name = format!("observer-{name}");
        let worker_name = name.clone();
        let join_handle = std::thread::Builder::new()
            .name(thread_name)
            .spawn(move || {
                // recv() fails once every sender is gone and the queue is drained.
                while let Ok(sample) = rx.recv() {
                    notify_isolated(0, &inner, sample);
                }
                tracing::trace!(observer = %worker_name, "observer worker exiting cleanly");
            })
            .map_err(|e| crate::error::OdoError::Io(format!("spawn observer worker: {e}")))?;

        Ok(Arc::new(Self {
            name,
            tx: Mutex::new(Some(tx)),
            dropped: AtomicU64::new(0),
            join_handle: Mutex::new(Some(join_handle)),
        }))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Samples discarded because the queue was full or already shut down.
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Stop accepting samples, let the worker drain the queue, and join it.
    /// Idempotent.
    pub fn shutdown(&self) {
        let tx = self
            .tx
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        drop(tx);
        let handle = self
            .join_handle
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(handle) = handle {
            match handle.join() {
                Ok(()) => tracing::trace!(observer = %self.name, "observer worker joined"),
                Err(e) => tracing::warn!(?e, observer = %self.name, "observer worker panicked"),
            }
        }
    }
}

impl Observer for QueuedObserver {
    fn on_sample(&self, sample: Sample) {
        let guard = self.tx.lock().unwrap_or_else(PoisonError::into_inner);
        let sent = match guard.as_ref() {
            Some(tx) => tx.try_send(sample).is_ok(),
            None => false,
        };
        drop(guard);
        if !sent {
            let n = self.dropped.fetch_add(1, Ordering::Relaxed) + 1;
            // Log the first drop and then every 100th to keep the pulse path quiet.
            if n == 1 || n % 100 == 0 {
                tracing::warn!(observer = %self.name, dropped = n, "observer queue full, sample dropped");
            }
        }
    }
}

impl Drop for QueuedObserver {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn sample(i: usize) -> Sample {
        Sample {
            timestamp_s: i as f64,
            position: i as f64,
            speed: 1.0,
        }
    }

    #[test]
    fn isolated_notify_reports_panics() {
        let ok = |_s: Sample| {};
        let bad = |_s: Sample| panic!("boom");
        assert!(notify_isolated(0, &ok, sample(0)));
        assert!(!notify_isolated(1, &bad, sample(0)));
    }

    #[test]
    fn queued_observer_delivers_in_order_before_shutdown_returns() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let q = QueuedObserver::spawn("test", 64, move |s: Sample| {
            std::thread::sleep(Duration::from_millis(1));
            sink.lock().unwrap().push(s.position as usize);
        })
        .unwrap();
        for i in 0..10 {
            q.on_sample(sample(i));
        }
        q.shutdown();
        assert_eq!(*seen.lock().unwrap(), (0..10).collect::<Vec<_>>());
        assert_eq!(q.dropped(), 0);
    }

    #[test]
    fn full_queue_drops_instead_of_blocking() {
        let (gate_tx, gate_rx) = xch::bounded::<()>(0);
        let q = QueuedObserver::spawn("slow", 1, move |_s: Sample| {
            let _ = gate_rx.recv();
        })
        .unwrap();
        for i in 0..10 {
            q.on_sample(sample(i));
        }
        assert!(q.dropped() > 0);
        drop(gate_tx);
        q.shutdown();
    }

    #[test]
    fn samples_after_shutdown_are_counted_as_dropped() {
        let q = QueuedObserver::spawn("closed", 4, |_s: Sample| {}).unwrap();
        q.shutdown();
        q.on_sample(sample(0));
        assert_eq!(q.dropped(), 1);
    }
}
