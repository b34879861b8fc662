use std::fs::File;
use std::io::Write;

use scoot_config::load_pulse_log_csv;
use rstest::rstest;
use tempfile::tempdir;

fn write_csv(lines: &[&str]) -> (tempfile::TempDir, std::path::PathBuf) {
    let dir = tempdir().unwrap();
    let path = dir.path().join("pulses.csv");
    let mut f = File::create(&path).unwrap();
    for l in lines {
        writeln!(f, "{l}").unwrap();
    }
    (dir, path)
}

#[rstest]
fn loads_ordered_times() {
    let (_dir, path) = write_csv(&["t_s", "0.0", "0.25", "0.5", "0.5"]);
    let times = load_pulse_log_csv(&path).unwrap();
    assert_eq!(times, vec![0.0, 0.25, 0.5, 0.5]);
}

#[rstest]
fn rejects_wrong_header() {
    let (_dir, path) = write_csv(&["time", "0.0"]);
    let err = load_pulse_log_csv(&path).unwrap_err();
    assert!(format!("{err}").contains("must have header 't_s'"));
}

#[rstest]
fn rejects_time_going_backwards() {
    let (_dir, path) = write_csv(&["t_s", "1.0", "0.5"]);
    let err = load_pulse_log_csv(&path).unwrap_err();
    assert!(format!("{err}").contains("non-decreasing"));
}

#[rstest]
fn rejects_non_numeric_row() {
    let (_dir, path) = write_csv(&["t_s", "0.0", "soon"]);
    let err = load_pulse_log_csv(&path).unwrap_err();
    assert!(format!("{err}").contains("invalid CSV row 3"));
}

#[rstest]
fn rejects_empty_log() {
    let (_dir, path) = write_csv(&["t_s"]);
    let err = load_pulse_log_csv(&path).unwrap_err();
    assert!(format!("{err}").contains("has no rows"));
}

#[rstest]
fn missing_file_is_an_error() {
    let dir = tempdir().unwrap();
    let err = load_pulse_log_csv(&dir.path().join("absent.csv")).unwrap_err();
    assert!(format!("{err}").contains("open pulse log"));
}
