//! Position/speed tracker advanced by encoder pulses.
//!
//! State mutations happen under `state`; observers are invoked after that
//! lock is released. Each mutation takes a ticket while still holding the
//! state lock, and dispatch waits for its ticket, so observers see samples
//! in exactly the order the state advanced even when the pulse thread and
//! the idle poller race.

use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError, RwLock};

use scoot_traits::clock::{Clock, MonotonicClock};

use crate::config::TrajectoryCfg;
use crate::history::History;
use crate::observer::{Observer, notify_isolated};
use crate::smoothing::ExponentialSmoothing;
use crate::types::Sample;

struct TrajectoryState {
    last_timestamp: f64,
    last_position: f64,
    last_speed: f64,
    filter: ExponentialSmoothing,
    speeds: History,
    positions: History,
    next_ticket: u64,
}

impl TrajectoryState {
    fn take_ticket(&mut self) -> u64 {
        let t = self.next_ticket;
        self.next_ticket = self.next_ticket.wrapping_add(1);
        t
    }
}

/// Serves dispatch tickets in issue order.
#[derive(Default)]
struct Sequencer {
    serving: Mutex<u64>,
    turn: Condvar,
}

impl Sequencer {
    fn wait_for(&self, ticket: u64) -> MutexGuard<'_, u64> {
        let mut serving = self.serving.lock().unwrap_or_else(PoisonError::into_inner);
        while *serving != ticket {
            serving = self
                .turn
                .wait(serving)
                .unwrap_or_else(PoisonError::into_inner);
        }
        serving
    }

    fn done(&self, mut serving: MutexGuard<'_, u64>) {
        *serving = serving.wrapping_add(1);
        drop(serving);
        self.turn.notify_all();
    }
}

pub struct Trajectory {
    state: Mutex<TrajectoryState>,
    observers: RwLock<Vec<Arc<dyn Observer>>>,
    sequencer: Sequencer,
    clock: Arc<dyn Clock + Send + Sync>,
}

impl core::fmt::Debug for Trajectory {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let s = self.snapshot();
        f.debug_struct("Trajectory")
            .field("timestamp_s", &s.timestamp_s)
            .field("position", &s.position)
            .field("speed", &s.speed)
            .finish()
    }
}

impl Trajectory {
    /// Create a trajectory seeded at `initial_position` pulses, timed by `clock`.
    pub fn new(
        cfg: TrajectoryCfg,
        initial_position: f64,
        clock: Arc<dyn Clock + Send + Sync>,
    ) -> Self {
        let now = clock.timestamp_s();
        Self {
            state: Mutex::new(TrajectoryState {
                last_timestamp: now,
                last_position: initial_position,
                last_speed: 0.0,
                filter: cfg.smoothing.into(),
                speeds: History::new(cfg.history_capacity),
                positions: History::new(cfg.history_capacity),
                next_ticket: 0,
            }),
            observers: RwLock::new(Vec::new()),
            sequencer: Sequencer::default(),
            clock,
        }
    }

    /// Trajectory on the real monotonic clock.
    pub fn with_monotonic_clock(cfg: TrajectoryCfg, initial_position: f64) -> Self {
        Self::new(cfg, initial_position, Arc::new(MonotonicClock::new()))
    }

    fn lock_state(&self) -> MutexGuard<'_, TrajectoryState> {
        // Observers never run under this lock, so a poisoned guard still holds consistent state.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Current time on this trajectory's clock.
    pub fn now_s(&self) -> f64 {
        self.clock.timestamp_s()
    }

    /// Record `pulses` counted since the previous step.
    pub fn step(&self, pulses: f64) -> Sample {
        self.step_with_offset(pulses, 0.0)
    }

    /// Record `pulses` at `now + time_offset_s`.
    ///
    /// The effective time must be later than the previous step. If it is not,
    /// the position still advances but the speed estimate and timestamp are
    /// left as they were, so a bad clock reading cannot divide by zero or
    /// produce a negative speed.
    pub fn step_with_offset(&self, pulses: f64, time_offset_s: f64) -> Sample {
        let (sample, ticket) = {
            let mut st = self.lock_state();
            let timestamp = self.clock.timestamp_s() + time_offset_s;
            let dt = timestamp - st.last_timestamp;
            let position = st.last_position + pulses;
            if dt > 0.0 {
                let speed = st.filter.smooth(pulses / dt);
                st.last_timestamp = timestamp;
                st.last_speed = speed;
            } else {
                tracing::warn!(
                    dt,
                    pulses,
                    "non-positive step interval; speed update skipped"
                );
            }
            st.last_position = position;
            let (ts, speed) = (st.last_timestamp, st.last_speed);
            st.speeds.push(ts, speed);
            st.positions.push(ts, position);
            let sample = Sample {
                timestamp_s: ts,
                position,
                speed,
            };
            (sample, st.take_ticket())
        };
        self.dispatch(ticket, sample);
        sample
    }

    /// Report "not moving": fan out `(now, last_position, 0.0)`.
    ///
    /// The filter, last timestamp and last speed are left untouched, so the
    /// next real pulse is measured against the last real pulse.
    pub fn not_moving(&self) -> Sample {
        let (sample, ticket) = {
            let mut st = self.lock_state();
            let now = self.clock.timestamp_s();
            Self::idle_sample(&mut st, now)
        };
        self.dispatch(ticket, sample);
        sample
    }

    /// `not_moving()` only if no step landed in the last `threshold_s`.
    ///
    /// The silence check, `on_idle` and the emit all happen under one state
    /// lock, so a concurrent step is either seen by the check or ordered
    /// after the idle sample. `on_idle` must not call back into `self`.
    pub fn not_moving_if_silent(
        &self,
        threshold_s: f64,
        on_idle: impl FnOnce(f64),
    ) -> Option<Sample> {
        let (sample, ticket) = {
            let mut st = self.lock_state();
            let now = self.clock.timestamp_s();
            let silent_for = now - st.last_timestamp;
            if silent_for <= threshold_s {
                return None;
            }
            on_idle(silent_for);
            Self::idle_sample(&mut st, now)
        };
        self.dispatch(ticket, sample);
        Some(sample)
    }

    fn idle_sample(st: &mut TrajectoryState, now: f64) -> (Sample, u64) {
        let timestamp = now.max(st.last_timestamp);
        st.speeds.push(timestamp, 0.0);
        let sample = Sample {
            timestamp_s: timestamp,
            position: st.last_position,
            speed: 0.0,
        };
        (sample, st.take_ticket())
    }

    fn dispatch(&self, ticket: u64, sample: Sample) {
        let turn = self.sequencer.wait_for(ticket);
        let observers: Vec<Arc<dyn Observer>> = self
            .observers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        for (index, observer) in observers.iter().enumerate() {
            notify_isolated(index, observer.as_ref(), sample);
        }
        self.sequencer.done(turn);
    }

    /// `(timestamp, position)` of the last step.
    pub fn position(&self) -> (f64, f64) {
        let st = self.lock_state();
        (st.last_timestamp, st.last_position)
    }

    /// `(timestamp, speed)` of the last step.
    pub fn speed(&self) -> (f64, f64) {
        let st = self.lock_state();
        (st.last_timestamp, st.last_speed)
    }

    /// Timestamp, position and speed of the last step, read together.
    pub fn snapshot(&self) -> Sample {
        let st = self.lock_state();
        Sample {
            timestamp_s: st.last_timestamp,
            position: st.last_position,
            speed: st.last_speed,
        }
    }

    /// Recent `(timestamp, speed)` points, oldest first. Includes idle zeros.
    pub fn speeds(&self) -> Vec<(f64, f64)> {
        self.lock_state().speeds.values()
    }

    /// Recent `(timestamp, position)` points, oldest first.
    pub fn positions(&self) -> Vec<(f64, f64)> {
        self.lock_state().positions.values()
    }

    /// Append an observer. No de-duplication; observers live as long as the trajectory.
    pub fn register_callback<O: Observer + 'static>(&self, observer: O) {
        self.register_shared(Arc::new(observer));
    }

    /// Append an observer that is also held elsewhere (e.g. a `QueuedObserver`).
    pub fn register_shared(&self, observer: Arc<dyn Observer>) {
        self.observers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(observer);
    }

    pub fn observer_count(&self) -> usize {
        self.observers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}
