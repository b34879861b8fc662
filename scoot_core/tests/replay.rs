use std::io::Write;
use std::time::Duration;

use scoot_core::TrajectoryCfg;
use scoot_core::replay::replay;

#[test]
fn replays_a_csv_pulse_log() {
    let mut f = tempfile::NamedTempFile::new().unwrap();
    writeln!(f, "t_s").unwrap();
    for i in 0..9 {
        writeln!(f, "{:.2}", f64::from(i) * 0.25).unwrap();
    }
    f.flush().unwrap();

    let times = scoot_config::load_pulse_log_csv(f.path()).unwrap();
    let report = replay(&times, TrajectoryCfg::default(), Duration::from_millis(750));

    assert_eq!(report.pulses, 9);
    assert_eq!(report.final_position, 9.0);
    assert!((report.max_speed() - 4.0).abs() < 1e-6);
    let last = report.samples.last().unwrap();
    assert_eq!(last.speed, 0.0);
    assert_eq!(last.position, 9.0);
}

#[test]
fn alpha_shapes_the_deceleration_curve() {
    // 4 pulses/s, then 1 pulse/s
    let mut times: Vec<f64> = (0..8).map(|i| f64::from(i) * 0.25).collect();
    times.extend((1..4).map(|i| 1.75 + f64::from(i)));
    let slow = TrajectoryCfg {
        smoothing: scoot_core::SmoothingCfg {
            alpha: 0.2,
            zero_tolerance: None,
        },
        ..TrajectoryCfg::default()
    };
    let fast = TrajectoryCfg::default();
    let threshold = Duration::from_secs(3);
    let a = replay(&times, slow, threshold);
    let b = replay(&times, fast, threshold);
    let first_slow_a = a.samples.iter().find(|s| s.position == 9.0).unwrap().speed;
    let first_slow_b = b.samples.iter().find(|s| s.position == 9.0).unwrap().speed;
    assert!(first_slow_a > first_slow_b, "{first_slow_a} vs {first_slow_b}");
}

#[test]
fn month_long_gap_is_bounded() {
    let times = [0.0, 0.25, 0.5, 30.0 * 86_400.0, 30.0 * 86_400.0 + 0.25];
    let report = replay(&times, TrajectoryCfg::default(), Duration::from_millis(750));
    assert_eq!(report.final_position, 5.0);
    assert!(report.samples.len() < 64, "{} samples", report.samples.len());
    assert!(report.idle_samples() >= 2);
    let positions: Vec<f64> = report.samples.iter().map(|s| s.position).collect();
    assert!(positions.windows(2).all(|w| w[0] <= w[1]));
}

#[test]
fn absurd_timestamps_terminate() {
    let report = replay(&[0.0, 1e20], TrajectoryCfg::default(), Duration::from_millis(750));
    assert_eq!(report.pulses, 2);
    assert_eq!(report.final_position, 2.0);
}
