//! `cache` and `self-check`.

use scoot_core::Units;
use scoot_core::cache::read_record;
use scoot_core::error::Result;
use scoot_core::hw_error::map_hw_error;
use scoot_hardware::PulseBackend;

use crate::run::resolve_backend;

pub fn show_cache(cfg: &scoot_config::Config, json: bool) -> Result<()> {
    let units = Units::from(&cfg.wheel);
    let record = read_record(&cfg.cache.path)?;
    if json {
        println!(
            "{}",
            serde_json::json!({
                "path": cfg.cache.path.display().to_string(),
                "distance_pulses": record.distance_pulses,
                "distance_ft": units.feet(record.distance_pulses),
                "distance_mi": units.miles(record.distance_pulses),
                "timestamp": record.timestamp,
            })
        );
    } else {
        println!("cache: {}", cfg.cache.path.display());
        println!("distance: {:.0} pulses", record.distance_pulses);
        println!(
            "          {:.1} ft / {:.3} mi",
            units.feet(record.distance_pulses),
            units.miles(record.distance_pulses)
        );
        println!("updated:  {:.3}", record.timestamp);
    }
    Ok(())
}

/// Config is already validated by the time this runs.
pub fn self_check(cfg: &scoot_config::Config, json: bool) -> Result<()> {
    let on_pi = scoot_hardware::platform::is_raspberry_pi();
    let backend = resolve_backend(&cfg.encoder);

    // Opening the input claims the GPIO pin without binding a handler.
    let input = scoot_hardware::open_pulse_input(backend)
        .map(drop)
        .map_err(|e| eyre::Report::new(map_hw_error(&e)));

    let cache = if cfg.cache.path.exists() {
        read_record(&cfg.cache.path).map(|r| format!("ok ({:.0} pulses)", r.distance_pulses))
    } else {
        Ok("not created yet".to_string())
    };

    let backend_name = match backend {
        PulseBackend::Gpio { .. } => "gpio",
        PulseBackend::Simulated { .. } => "simulated",
        PulseBackend::Disabled => "disabled",
    };
    let input_status = match &input {
        Ok(()) => "ok".to_string(),
        Err(e) => e.to_string(),
    };
    let cache_status = match &cache {
        Ok(s) => s.clone(),
        Err(e) => e.to_string(),
    };

    if json {
        println!(
            "{}",
            serde_json::json!({
                "config": "ok",
                "raspberry_pi": on_pi,
                "backend": backend_name,
                "pulse_input": input_status,
                "cache": cache_status,
            })
        );
    } else {
        println!("config:      ok");
        println!("raspberry pi: {}", if on_pi { "yes" } else { "no" });
        println!("pulse input: {backend_name} ({input_status})");
        println!("cache:       {cache_status}");
    }

    input?;
    cache?;
    println!("OK");
    Ok(())
}
