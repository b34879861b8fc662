//! `run` and `replay`: assemble the odometer and print samples.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::{Duration, Instant};

use scoot_core::error::{OdoError, Result};
use scoot_core::hw_error::map_hw_error;
use scoot_core::{
    CacheCfg, DistanceCache, Observer, OdometerBuilder, OdometerCfg, QueuedObserver, Sample,
    Trajectory, TrajectoryCfg, Units,
};
use scoot_hardware::PulseBackend;

/// Samples buffered for the printer before new ones are dropped.
const PRINT_QUEUE: usize = 1024;
const WAIT_SLICE: Duration = Duration::from_millis(50);

/// Pick the pulse source. An explicit `enabled` wins over the Raspberry Pi probe;
/// a configured simulator rate wins over GPIO.
pub fn resolve_backend(enc: &scoot_config::EncoderCfg) -> PulseBackend {
    let enabled = enc
        .enabled
        .unwrap_or_else(|| enc.simulate_hz.is_some() || scoot_hardware::platform::is_raspberry_pi());
    match (enabled, enc.simulate_hz) {
        (false, _) => PulseBackend::Disabled,
        (true, Some(hz)) => PulseBackend::Simulated { hz },
        (true, None) => PulseBackend::Gpio { bcm_pin: enc.pin },
    }
}

pub fn sample_json(units: &Units, s: &Sample) -> serde_json::Value {
    serde_json::json!({
        "timestamp_s": s.timestamp_s,
        "position_pulses": s.position,
        "speed_pulses_s": s.speed,
        "distance_ft": units.feet(s.position),
        "speed_mph": units.mph(s.speed),
    })
}

pub fn sample_line(units: &Units, s: &Sample) -> String {
    format!(
        "t={:.3} distance={:.1} ft ({:.0} pulses) speed={:.1} mph",
        s.timestamp_s,
        units.feet(s.position),
        s.position,
        units.mph(s.speed)
    )
}

fn printer(json: bool, units: Units, every: u64) -> impl Observer {
    let every = every.max(1);
    let seen = AtomicU64::new(0);
    move |s: Sample| {
        if seen.fetch_add(1, Ordering::Relaxed) % every != 0 {
            return;
        }
        if json {
            println!("{}", sample_json(&units, &s));
        } else {
            println!("{}", sample_line(&units, &s));
        }
    }
}

pub fn run(
    cfg: &scoot_config::Config,
    json: bool,
    duration: Option<Duration>,
    every: u64,
) -> Result<()> {
    let units = Units::from(&cfg.wheel);
    let backend = resolve_backend(&cfg.encoder);
    let odo_cfg = OdometerCfg {
        enabled: !matches!(backend, PulseBackend::Disabled),
        ..OdometerCfg::from(&cfg.encoder)
    };
    let cache_cfg = CacheCfg::from(&cfg.cache);
    tracing::info!(?backend, pulses_per_foot = units.pulses_per_foot(), "starting odometer");

    let cache = Arc::new(DistanceCache::open(&cache_cfg)?);
    let trajectory = Arc::new(Trajectory::with_monotonic_clock(
        TrajectoryCfg::from(cfg),
        cache.distance(),
    ));
    trajectory.register_callback(cache.observer(cache_cfg.min_delta_pulses));
    let out = QueuedObserver::spawn("printer", PRINT_QUEUE, printer(json, units, every))?;
    trajectory.register_shared(out.clone() as Arc<dyn Observer>);

    let input = scoot_hardware::open_pulse_input(backend)
        .map_err(|e| eyre::Report::new(map_hw_error(&e)))?;
    let mut odometer = OdometerBuilder::new()
        .with_input(input)
        .with_trajectory(trajectory.clone())
        .with_cfg(odo_cfg)
        .start()?;

    let shutdown = Arc::new(AtomicBool::new(false));
    {
        let flag = shutdown.clone();
        ctrlc::set_handler(move || flag.store(true, Ordering::SeqCst))
            .map_err(|e| eyre::Report::new(OdoError::State(format!("install Ctrl-C handler: {e}"))))?;
    }

    let started = Instant::now();
    while !shutdown.load(Ordering::SeqCst) {
        if duration.is_some_and(|d| started.elapsed() >= d) {
            break;
        }
        std::thread::sleep(WAIT_SLICE);
    }
    tracing::info!(state = ?odometer.state(), "shutting down");

    let deinit = odometer.deinit();
    let last = trajectory.snapshot();
    cache.set_distance(last.timestamp_s, last.position, last.speed);
    out.shutdown();
    cache.shutdown();
    deinit?;

    if json {
        println!(
            "{}",
            serde_json::json!({
                "final_position_pulses": last.position,
                "distance_ft": units.feet(last.position),
                "distance_mi": units.miles(last.position),
                "dropped_samples": out.dropped(),
            })
        );
    } else {
        println!(
            "total distance: {:.1} ft ({:.3} mi)",
            units.feet(last.position),
            units.miles(last.position)
        );
    }
    Ok(())
}

pub fn replay(cfg: &scoot_config::Config, log: &std::path::Path, json: bool) -> Result<()> {
    let times = scoot_config::load_pulse_log_csv(log)
        .map_err(|e| eyre::Report::new(OdoError::Config(format!("{e:#}"))))?;
    let units = Units::from(&cfg.wheel);
    let odo_cfg = OdometerCfg::from(&cfg.encoder);
    let report = scoot_core::replay::replay(
        &times,
        TrajectoryCfg::from(cfg),
        odo_cfg.zero_speed_threshold,
    );
    for s in &report.samples {
        if json {
            println!("{}", sample_json(&units, s));
        } else {
            println!("{}", sample_line(&units, s));
        }
    }
    if json {
        println!(
            "{}",
            serde_json::json!({
                "pulses": report.pulses,
                "samples": report.samples.len(),
                "final_position_pulses": report.final_position,
                "distance_ft": units.feet(report.final_position),
                "max_speed_mph": units.mph(report.max_speed()),
            })
        );
    } else {
        println!(
            "replayed {} pulses: {:.1} ft, max {:.1} mph, {} idle samples",
            report.pulses,
            units.feet(report.final_position),
            units.mph(report.max_speed()),
            report.idle_samples()
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn enc(enabled: Option<bool>, simulate_hz: Option<f64>) -> scoot_config::EncoderCfg {
        let mut c = scoot_config::load_toml("[encoder]\npin = 22\n")
            .unwrap()
            .encoder;
        c.enabled = enabled;
        c.simulate_hz = simulate_hz;
        c
    }

    #[test]
    fn explicit_flag_beats_probe() {
        assert_eq!(resolve_backend(&enc(Some(false), Some(5.0))), PulseBackend::Disabled);
        assert_eq!(
            resolve_backend(&enc(Some(true), None)),
            PulseBackend::Gpio { bcm_pin: 22 }
        );
    }

    #[test]
    fn simulator_implies_enabled() {
        assert_eq!(
            resolve_backend(&enc(None, Some(5.0))),
            PulseBackend::Simulated { hz: 5.0 }
        );
    }

    #[test]
    fn sample_json_has_units() {
        let u = Units::from_wheel(4, 12.0 / std::f64::consts::PI);
        let v = sample_json(
            &u,
            &Sample {
                timestamp_s: 1.0,
                position: 8.0,
                speed: 4.0,
            },
        );
        assert!((v["distance_ft"].as_f64().unwrap() - 2.0).abs() < 1e-9);
        assert_eq!(v["position_pulses"], 8.0);
    }
}
