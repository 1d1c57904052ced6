//! Human-readable error descriptions and structured JSON error formatting.

use throttle_core::error::{BuildError, ThrottleError};

/// Map an eyre::Report to a human-readable explanation with likely causes and fix hints.
pub fn humanize(err: &eyre::Report) -> String {
    // Typed matches first
    if let Some(BuildError::InvalidConfig(msg)) = err.downcast_ref::<BuildError>() {
        return format!(
            "What happened: Invalid control parameters ({msg}).\nLikely causes: Out-of-range values in [control], [current] or [safety].\nHow to fix: Edit the config file, then rerun `throttle self-check`."
        );
    }

    if let Some(te) = err.downcast_ref::<ThrottleError>() {
        return match te {
            ThrottleError::Timeout => "What happened: The command source timed out.\nLikely causes: Transmitter off, wrong UART device, or baud mismatch.\nHow to fix: Check [source] device and baud; the loop brakes safely while no commands arrive.".to_string(),
            ThrottleError::Hardware(m) | ThrottleError::HardwareFault(m) => format!(
                "What happened: Actuator or link failure ({m}).\nLikely causes: Controller disconnected or faulted.\nHow to fix: Check wiring and power, then rerun with --log-level=debug."
            ),
            other => format!(
                "What happened: {other}.\nLikely causes: See logs.\nHow to fix: Re-run with --log-level=debug or set RUST_LOG for more detail."
            ),
        };
    }

    if let Some(te) = err.downcast_ref::<toml::de::Error>() {
        return format!(
            "What happened: The config file is not valid TOML.\nLikely causes: Syntax error, unknown preset name, or a value of the wrong type.\nHow to fix: Correct the file and rerun. Parser said: {te}"
        );
    }

    // String-based heuristics for errors coming from init or config
    let msg = err.to_string();
    let lower = format!("{err:#}").to_ascii_lowercase();

    if lower.contains("open uart") {
        return format!(
            "What happened: Failed to open the command UART.\nLikely causes: Wrong [source] device path, device busy, or missing permissions.\nHow to fix: Fix the device path or add the user to the dialout group. Original: {msg}"
        );
    }

    if lower.contains("must be") {
        return format!(
            "What happened: Configuration is invalid ({err:#}).\nLikely causes: Out-of-range values in the TOML.\nHow to fix: Edit the config file and try again."
        );
    }

    if lower.contains("read config") {
        return format!(
            "What happened: The config file could not be read ({err:#}).\nHow to fix: Check the --config path."
        );
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

/// Stable exit codes: 2 config, 3 hardware, 4 source timeout, 1 anything else.
pub fn exit_code_for_error(err: &eyre::Report) -> i32 {
    if err.downcast_ref::<BuildError>().is_some() || err.downcast_ref::<toml::de::Error>().is_some() {
        return 2;
    }
    match err.downcast_ref::<ThrottleError>() {
        Some(ThrottleError::Hardware(_) | ThrottleError::HardwareFault(_)) => 3,
        Some(ThrottleError::Timeout) => 4,
        _ => {
            if format!("{err:#}").contains("must be") {
                2
            } else {
                1
            }
        }
    }
}

fn reason_name(err: &eyre::Report) -> &'static str {
    if err.downcast_ref::<BuildError>().is_some() {
        return "InvalidConfig";
    }
    if err.downcast_ref::<toml::de::Error>().is_some() {
        return "ConfigParse";
    }
    match err.downcast_ref::<ThrottleError>() {
        Some(ThrottleError::Hardware(_) | ThrottleError::HardwareFault(_)) => "Hardware",
        Some(ThrottleError::Timeout) => "Timeout",
        Some(ThrottleError::State(_)) => "State",
        None if exit_code_for_error(err) == 2 => "InvalidConfig",
        None => "Error",
    }
}

/// Structured JSON for errors when --json is enabled.
pub fn format_error_json(err: &eyre::Report) -> String {
    serde_json::json!({
        "reason": reason_name(err),
        "exit_code": exit_code_for_error(err),
        "message": humanize(err),
    })
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_errors_map_to_config_exit_code() {
        let e = eyre::Report::new(BuildError::InvalidConfig("soft_rpm must be below hard_rpm"));
        assert_eq!(exit_code_for_error(&e), 2);
        assert!(humanize(&e).contains("soft_rpm"));
        let v: serde_json::Value = serde_json::from_str(&format_error_json(&e)).unwrap();
        assert_eq!(v["reason"], "InvalidConfig");
    }

    #[test]
    fn validation_messages_are_config_errors() {
        let e = eyre::eyre!("control.hysteresis must be in [0.0, 1.0)").wrap_err("invalid config");
        assert_eq!(exit_code_for_error(&e), 2);
        assert!(humanize(&e).contains("hysteresis"));
    }

    #[test]
    fn hardware_faults_map_to_hardware_exit_code() {
        let e = eyre::Report::new(ThrottleError::HardwareFault("bus off".into()));
        assert_eq!(exit_code_for_error(&e), 3);
        assert!(humanize(&e).contains("bus off"));
    }

    #[test]
    fn every_core_error_has_a_stable_exit_code() {
        let cases = [
            (ThrottleError::Hardware("link".into()), 3, "Hardware"),
            (ThrottleError::HardwareFault("bus off".into()), 3, "Hardware"),
            (ThrottleError::Timeout, 4, "Timeout"),
            (ThrottleError::State("latch closed".into()), 1, "State"),
        ];
        for (err, code, reason) in cases {
            let e = eyre::Report::new(err);
            assert_eq!(exit_code_for_error(&e), code, "{e}");
            assert_eq!(reason_name(&e), reason, "{e}");
        }
    }

    #[test]
    fn unknown_errors_fall_back() {
        let e = eyre::eyre!("boom");
        assert_eq!(exit_code_for_error(&e), 1);
        assert!(humanize(&e).starts_with("Something went wrong."));
    }
}
