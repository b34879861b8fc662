//! Odometer start/stop behaviour against a hand-driven pulse input.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use scoot_core::mocks::ManualPulseInput;
use scoot_core::{OdometerBuilder, OdometerState, Sample, Trajectory, TrajectoryCfg};
use scoot_traits::{ManualClock, MonotonicClock};

#[test]
fn pulses_advance_position_until_deinit() {
    let clock = ManualClock::new();
    let traj = Arc::new(Trajectory::new(
        TrajectoryCfg::default(),
        0.0,
        Arc::new(clock.clone()),
    ));
    let (input, trigger) = ManualPulseInput::new();
    let mut odo = OdometerBuilder::new()
        .with_input(input)
        .with_trajectory(traj.clone())
        .with_zero_speed_threshold(Duration::from_secs(3600))
        .start()
        .unwrap();
    assert_eq!(odo.state(), OdometerState::Idle);

    for _ in 0..3 {
        clock.advance(Duration::from_millis(250));
        assert!(trigger.pulse());
    }
    assert_eq!(traj.position().1, 3.0);
    assert!((traj.speed().1 - 4.0).abs() < 1e-9);
    assert_eq!(odo.state(), OdometerState::Moving);

    odo.deinit().unwrap();
    odo.deinit().unwrap();
    assert_eq!(trigger.stop_count(), 1);
    assert!(!trigger.pulse(), "handler must be unbound after deinit");
    assert_eq!(traj.position().1, 3.0);
}

#[test]
fn drop_releases_the_input() {
    let traj = Arc::new(Trajectory::with_monotonic_clock(TrajectoryCfg::default(), 0.0));
    let (input, trigger) = ManualPulseInput::new();
    let odo = OdometerBuilder::new()
        .with_input(input)
        .with_trajectory(traj)
        .start()
        .unwrap();
    assert!(trigger.is_bound());
    drop(odo);
    assert!(!trigger.is_bound());
    assert_eq!(trigger.stop_count(), 1);
}

#[test]
fn poller_emits_zero_speed_after_silence() {
    let traj = Arc::new(Trajectory::new(
        TrajectoryCfg::default(),
        0.0,
        Arc::new(MonotonicClock::new()),
    ));
    let seen: Arc<Mutex<Vec<Sample>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    traj.register_callback(move |s: Sample| sink.lock().unwrap().push(s));

    let (input, trigger) = ManualPulseInput::new();
    let mut odo = OdometerBuilder::new()
        .with_input(input)
        .with_trajectory(traj.clone())
        .with_zero_speed_threshold(Duration::from_millis(40))
        .start()
        .unwrap();

    std::thread::sleep(Duration::from_millis(5));
    trigger.pulse();
    std::thread::sleep(Duration::from_millis(5));
    trigger.pulse();
    std::thread::sleep(Duration::from_millis(300));
    odo.deinit().unwrap();

    assert_eq!(odo.state(), OdometerState::Stopped);
    let seen = seen.lock().unwrap();
    let idle: Vec<_> = seen.iter().filter(|s| s.speed == 0.0).collect();
    assert!(idle.len() >= 2, "expected an idle heartbeat, got {seen:?}");
    assert!(idle.iter().all(|s| s.position == 2.0));
    let n = seen.len();
    std::thread::sleep(Duration::from_millis(100));
    assert_eq!(seen.len(), n, "no samples after deinit");
}

#[test]
fn poller_shuts_down_promptly() {
    let traj = Arc::new(Trajectory::with_monotonic_clock(TrajectoryCfg::default(), 0.0));
    let (input, _trigger) = ManualPulseInput::new();
    let mut odo = OdometerBuilder::new()
        .with_input(input)
        .with_trajectory(traj)
        .with_zero_speed_threshold(Duration::from_secs(60))
        .start()
        .unwrap();
    let t0 = std::time::Instant::now();
    odo.deinit().unwrap();
    assert!(t0.elapsed() < Duration::from_secs(5));
}
