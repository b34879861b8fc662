//! Human-readable error descriptions and structured JSON error formatting.

use scoot_core::error::{BuildError, OdoError};

/// Map an eyre::Report to a human-readable explanation with likely causes and fix hints.
pub fn humanize(err: &eyre::Report) -> String {
    // Typed matches first
    if let Some(be) = err.downcast_ref::<BuildError>() {
        return match be {
            BuildError::MissingTrajectory => {
                "What happened: The odometer was started without a trajectory.\nLikely causes: Internal wiring bug.\nHow to fix: Report this with the log output.".to_string()
            }
            BuildError::InvalidConfig(msg) => format!(
                "What happened: Invalid configuration ({msg}).\nLikely causes: Missing or out-of-range values in the TOML.\nHow to fix: Edit the config file, then rerun. See etc/scoot.toml for a sample."
            ),
        };
    }

    if let Some(oe) = err.downcast_ref::<OdoError>() {
        return match oe {
            OdoError::Hardware(msg) => format!(
                "What happened: The encoder pulse input could not be started ({msg}).\nLikely causes: Wrong [encoder] pin, the pin is held by another process, or missing GPIO permissions.\nHow to fix: Check the wiring and pin number; add the user to the gpio group or set [encoder] simulate_hz to test without hardware."
            ),
            OdoError::HardwareUnsupported => {
                "What happened: GPIO pulse input is not available in this build.\nLikely causes: Built without the `hardware` feature, or not running on Linux.\nHow to fix: Rebuild with `--features hardware`, or set [encoder] enabled = false or simulate_hz.".to_string()
            }
            OdoError::Config(msg) => format!(
                "What happened: Configuration problem: {msg}.\nLikely causes: Missing file, TOML syntax error, or an out-of-range value.\nHow to fix: Fix the file named above and rerun `scoot self-check`."
            ),
            OdoError::Io(msg) => format!(
                "What happened: File or thread error: {msg}.\nLikely causes: Missing directory, read-only filesystem, or wrong cache path.\nHow to fix: Check [cache] path and its permissions."
            ),
            OdoError::State(msg) => format!(
                "What happened: {msg}.\nLikely causes: See logs.\nHow to fix: Re-run with --log-level=debug or set RUST_LOG for more detail."
            ),
        };
    }

    let msg = err.to_string();

    // Generic fallback
    let mut cause = String::new();
    if let Some(src) = err.source() {
        cause = format!(" Cause: {src}");
    }
    format!(
        "Something went wrong.{cause}\nHow to fix: Re-run with --log-level=debug for details. Original: {msg}"
    )
}

/// Stable exit codes: 3 for configuration problems, 1 for everything else.
pub fn exit_code_for_error(err: &eyre::Report) -> i32 {
    match err.downcast_ref::<OdoError>() {
        Some(OdoError::Config(_)) => 3,
        _ if matches!(
            err.downcast_ref::<BuildError>(),
            Some(BuildError::InvalidConfig(_))
        ) =>
        {
            3
        }
        _ => 1,
    }
}

fn reason_name(err: &eyre::Report) -> &'static str {
    if let Some(be) = err.downcast_ref::<BuildError>() {
        return match be {
            BuildError::MissingTrajectory => "MissingTrajectory",
            BuildError::InvalidConfig(_) => "InvalidConfig",
        };
    }
    match err.downcast_ref::<OdoError>() {
        Some(OdoError::Hardware(_)) => "Hardware",
        Some(OdoError::HardwareUnsupported) => "HardwareUnsupported",
        Some(OdoError::Config(_)) => "Config",
        Some(OdoError::Io(_)) => "Io",
        Some(OdoError::State(_)) => "State",
        None => "Error",
    }
}

/// Structured JSON for errors when --json is enabled.
pub fn format_error_json(err: &eyre::Report) -> String {
    serde_json::json!({
        "reason": reason_name(err),
        "message": humanize(err),
        "exit_code": exit_code_for_error(err),
    })
    .to_string()
}
