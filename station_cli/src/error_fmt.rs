//! Human-readable error descriptions and structured JSON error formatting.

use station_core::StationError;

/// Map an eyre::Report to a human-readable explanation with likely causes and fix hints.
pub fn humanize(err: &eyre::Report) -> String {
    if let Some(se) = err.downcast_ref::<StationError>() {
        return match se {
            StationError::Timeout => {
                "What happened: Scale read timed out.\nLikely causes: HX711 not wired correctly, no power/ground, or timeout too low.\nHow to fix: Verify the hx711 pins and power, and consider increasing weight.read_timeout_ms in the config.".to_string()
            }
            StationError::HardwareFault(msg) | StationError::Hardware(msg) => format!(
                "What happened: A device failed ({msg}).\nLikely causes: Loose wiring, a peripheral without power, or a UART claimed by another process.\nHow to fix: Check the [pins] section and the device connections, then rerun `station self-check`."
            ),
            StationError::Config(msg) => format!(
                "What happened: Invalid configuration ({msg}).\nLikely causes: Missing or out-of-range values in the TOML.\nHow to fix: Edit the config file and run `station check-config`."
            ),
            StationError::Io(msg) => format!(
                "What happened: I/O failure ({msg}).\nLikely causes: Serial port unplugged or permissions changed.\nHow to fix: Reconnect the device and check access to the port."
            ),
            StationError::State(msg) => format!(
                "What happened: {msg}.\nLikely causes: See logs.\nHow to fix: Re-run with --log-level=debug or set RUST_LOG for more detail."
            ),
        };
    }

    let msg = format!("{err:#}");
    let lower = msg.to_ascii_lowercase();

    if lower.contains("open hx711") || lower.contains("power pin") || lower.contains("uart") {
        return format!(
            "What happened: Failed to open station hardware.\nLikely causes: Incorrect pin numbers, wrong serial device path, or insufficient GPIO permissions.\nHow to fix: Fix the [pins] values in the config and make sure the process can access GPIO and the serial ports. Original: {msg}"
        );
    }

    if lower.contains("invalid configuration")
        || lower.contains("parse config")
        || lower.contains("must be")
    {
        return format!(
            "What happened: Configuration is invalid or incomplete ({msg}).\nLikely causes: A typo in a key or an out-of-range value.\nHow to fix: Edit the TOML config and run `station check-config`."
        );
    }

    if lower.contains("sample trace") {
        return format!(
            "What happened: The sample trace could not be used ({msg}).\nHow to fix: Provide a CSV file whose first line is `raw` followed by one integer reading per line."
        );
    }

    let mut cause = String::new();
    if let Some(src) = err.source() {
        cause = format!(" Cause: {src}");
    }
    format!(
        "Something went wrong.{cause}\nHow to fix: Re-run with --log-level=debug for details. Original: {msg}"
    )
}

/// Stable exit codes per failure class; anything unclassified returns 1.
pub fn exit_code_for_error(err: &eyre::Report) -> i32 {
    match err.downcast_ref::<StationError>() {
        Some(StationError::Config(_)) => 2,
        Some(StationError::Timeout) => 3,
        Some(StationError::Hardware(_) | StationError::HardwareFault(_)) => 4,
        Some(StationError::Io(_)) => 5,
        Some(StationError::State(_)) | None => 1,
    }
}

fn reason_name(err: &eyre::Report) -> &'static str {
    match err.downcast_ref::<StationError>() {
        Some(StationError::Config(_)) => "Config",
        Some(StationError::Timeout) => "Timeout",
        Some(StationError::Hardware(_) | StationError::HardwareFault(_)) => "Hardware",
        Some(StationError::Io(_)) => "Io",
        Some(StationError::State(_)) => "State",
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
