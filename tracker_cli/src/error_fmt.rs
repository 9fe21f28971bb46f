//! Human-readable error descriptions and structured JSON error formatting.

use crate::cli::CliError;

/// Map an eyre::Report to a human-readable explanation with likely causes and fix hints.
pub fn humanize(err: &eyre::Report) -> String {
    use tracker_core::error::{BuildError, TrackerError};

    let msg = err.to_string();
    let lower = msg.to_ascii_lowercase();

    // Calibration CSV header special-case
    if lower.contains("calibration csv must have headers") {
        return "Invalid headers in calibration CSV. Expected 'mount_angle_deg,calibrated_max'."
            .to_string();
    }

    // Typed matches first
    if let Some(te) = err.downcast_ref::<toml::de::Error>() {
        return format!(
            "What happened: The config file is not valid TOML ({}).\nLikely causes: A typo, a value of the wrong type, or an unknown enum value such as history_order.\nHow to fix: Compare the file with etc/tracker.toml and rerun.",
            te.message().trim()
        );
    }

    if let Some(ce) = err.downcast_ref::<CliError>() {
        return match ce {
            CliError::InvalidConfig(msg) => format!(
                "What happened: Invalid configuration ({msg}).\nLikely causes: Missing or out-of-range values in the TOML or calibration CSV.\nHow to fix: Edit the config file, then rerun. See etc/tracker.toml for a sample."
            ),
            CliError::HardwareInit(msg) => format!(
                "What happened: Hardware could not be initialized ({msg}).\nLikely causes: SPI not enabled, wrong servo pin, or insufficient GPIO permissions.\nHow to fix: Enable SPI, check [hardware] in the config, and run with access to /dev/gpiomem and /dev/spidev0.0."
            ),
        };
    }

    if let Some(be) = err.downcast_ref::<BuildError>() {
        return match be {
            BuildError::InvalidCalibration(msg) => format!(
                "What happened: The sensor calibration was rejected ({msg}).\nLikely causes: Wrong number of sensors, a mount angle outside 0..=180, or a non-positive calibrated_max.\nHow to fix: Fix the [[sensors]] table or the calibration CSV."
            ),
            BuildError::InvalidConfig(msg) => format!(
                "What happened: Invalid configuration ({msg}).\nLikely causes: Missing or out-of-range values in the TOML.\nHow to fix: Edit the config file, then rerun. See etc/tracker.toml for a sample."
            ),
        };
    }

    if let Some(te) = err.downcast_ref::<TrackerError>() {
        if matches!(te, TrackerError::Timeout) {
            return "What happened: A hardware read timed out.\nLikely causes: ADC not wired correctly or SPI clock too high.\nHow to fix: Verify the MCP3208 wiring and lower hardware.spi_clock_hz.".to_string();
        }
        return format!(
            "What happened: {te}.\nLikely causes: See logs.\nHow to fix: Re-run with --log-level=debug or set RUST_LOG for more detail."
        );
    }

    // String-based heuristics for errors coming from init
    if lower.contains("open spi") || lower.contains("open gpio") || lower.contains("servo pin") {
        return "What happened: Failed to initialize hardware.\nLikely causes: SPI disabled, wrong pin numbers, or insufficient permissions.\nHow to fix: Fix [hardware] in the config and check device permissions.".to_string();
    }

    // Generic fallback
    let mut cause = String::new();
    if let Some(src) = err.source() {
        cause = format!(" Cause: {src}");
    }
    format!(
        "Something went wrong.{cause}\nHow to fix: Re-run with --log-level=debug for details. Original: {msg}"
    )
}

/// Stable exit codes: 2 for configuration problems, 3 for hardware init, 1 otherwise.
pub fn exit_code_for_error(err: &eyre::Report) -> i32 {
    use tracker_core::error::BuildError;

    match err.downcast_ref::<CliError>() {
        Some(CliError::InvalidConfig(_)) => return 2,
        Some(CliError::HardwareInit(_)) => return 3,
        None => {}
    }
    if err.downcast_ref::<BuildError>().is_some() || err.downcast_ref::<toml::de::Error>().is_some() {
        return 2;
    }
    1
}

fn reason_name(err: &eyre::Report) -> &'static str {
    use tracker_core::error::BuildError;

    match err.downcast_ref::<CliError>() {
        Some(CliError::InvalidConfig(_)) => return "InvalidConfig",
        Some(CliError::HardwareInit(_)) => return "HardwareInit",
        None => {}
    }
    if err.downcast_ref::<BuildError>().is_some() || err.downcast_ref::<toml::de::Error>().is_some() {
        return "InvalidConfig";
    }
    "Error"
}

/// Structured JSON for errors when --json is enabled.
pub fn format_error_json(err: &eyre::Report) -> String {
    serde_json::json!({ "reason": reason_name(err), "message": humanize(err) }).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use eyre::WrapErr;

    #[test]
    fn wrapped_config_error_maps_to_exit_two() {
        let err = Err::<(), _>(eyre::eyre!("control.tick_hz must be > 0"))
            .wrap_err(CliError::InvalidConfig("validate".into()))
            .unwrap_err();
        assert_eq!(exit_code_for_error(&err), 2);
        assert!(humanize(&err).starts_with("What happened: Invalid configuration"));
    }

    #[test]
    fn hardware_init_maps_to_exit_three() {
        let err = eyre::Report::new(CliError::HardwareInit("open spi0".into()));
        assert_eq!(exit_code_for_error(&err), 3);
        let v: serde_json::Value = serde_json::from_str(&format_error_json(&err)).unwrap();
        assert_eq!(v["reason"], "HardwareInit");
    }

    #[test]
    fn toml_syntax_error_is_explained() {
        let toml_err = tracker_config::load_toml("[control\n").unwrap_err();
        let err = eyre::Report::new(toml_err);
        assert_eq!(exit_code_for_error(&err), 2);
        assert!(humanize(&err).contains("not valid TOML"));
    }

    #[test]
    fn unknown_errors_fall_back_to_generic_text() {
        let err = eyre::eyre!("boom");
        assert_eq!(exit_code_for_error(&err), 1);
        let msg = humanize(&err);
        assert!(msg.starts_with("Something went wrong."));
        assert!(msg.contains("boom"));
    }
}
