use std::sync::Arc;
use std::time::Duration;

use rstest::rstest;
use scoot_core::error::{BuildError, OdoError};
use scoot_core::mocks::{FailingPulseInput, ManualPulseInput};
use scoot_core::{OdometerBuilder, Trajectory, TrajectoryCfg};
use scoot_traits::ManualClock;

fn trajectory() -> Arc<Trajectory> {
    Arc::new(Trajectory::new(
        TrajectoryCfg::default(),
        0.0,
        Arc::new(ManualClock::new()),
    ))
}

#[rstest]
fn missing_trajectory_yields_typed_build_error() {
    let (input, _trigger) = ManualPulseInput::new();
    let err = OdometerBuilder::new()
        .with_input(input)
        .start()
        .expect_err("should fail with MissingTrajectory");

    match err.downcast_ref::<BuildError>() {
        Some(BuildError::MissingTrajectory) => {}
        other => panic!("expected MissingTrajectory, got: {other:?}"),
    }
}

#[rstest]
fn zero_threshold_is_invalid() {
    let (input, trigger) = ManualPulseInput::new();
    let err = OdometerBuilder::new()
        .with_input(input)
        .with_trajectory(trajectory())
        .with_zero_speed_threshold(Duration::ZERO)
        .start()
        .expect_err("zero threshold must be rejected");

    assert!(matches!(
        err.downcast_ref::<BuildError>(),
        Some(BuildError::InvalidConfig(_))
    ));
    assert!(!trigger.is_bound());
}

#[rstest]
fn pulse_input_failure_surfaces_as_hardware_error() {
    let err = OdometerBuilder::new()
        .with_input(FailingPulseInput)
        .with_trajectory(trajectory())
        .start()
        .expect_err("input start failure must propagate");

    match err.downcast_ref::<OdoError>() {
        Some(OdoError::Hardware(msg)) => assert!(msg.contains("pin busy"), "{msg}"),
        other => panic!("expected Hardware error, got: {other:?}"),
    }
}

#[rstest]
fn disabled_odometer_never_touches_the_input() {
    let odo = OdometerBuilder::new()
        .with_input(FailingPulseInput)
        .with_trajectory(trajectory())
        .enabled(false)
        .start()
        .expect("disabled odometer skips input start");
    assert!(!odo.is_enabled());
}
