//! Human-readable error descriptions and structured JSON error formatting.

use pendant_config::ConfigError;

/// Map an eyre::Report to a human-readable explanation with likely causes and fix hints.
pub fn humanize(err: &eyre::Report) -> String {
    use pendant_core::error::{BuildError, PendantError};

    // Typed matches first
    if let Some(ce) = err.downcast_ref::<ConfigError>() {
        return match ce {
            ConfigError::Read { path, source } => format!(
                "What happened: Could not read the config file {} ({source}).\nLikely causes: Wrong --config path or missing file permissions.\nHow to fix: Pass --config with the path to your pendant TOML (see etc/pendant.toml).",
                path.display()
            ),
            ConfigError::Parse { path, source } => format!(
                "What happened: The config file {} is not valid TOML for the pendant ({}).\nLikely causes: Typo in a key, a missing [pins] entry, or a value of the wrong type.\nHow to fix: Compare the file with etc/pendant.toml and fix the reported key.",
                path.display(),
                source.message()
            ),
            ConfigError::Invalid { reason, .. } => format!(
                "What happened: Invalid configuration ({reason}).\nLikely causes: Out-of-range values or a GPIO used twice.\nHow to fix: Edit the config file, then rerun `pendant self-check`."
            ),
        };
    }

    if let Some(be) = err.downcast_ref::<BuildError>() {
        return match be {
            BuildError::MissingPanel => {
                "What happened: No selector panel was provided to the controller.\nLikely causes: The switch inputs failed to open or were not wired into the builder.\nHow to fix: Ensure the panel is created successfully and passed via with_panel(...).".to_string()
            }
            BuildError::MissingBus => {
                "What happened: No potentiometer bus was provided to the controller.\nLikely causes: The SPI pins failed to open or were not wired into the builder.\nHow to fix: Ensure the bus is created successfully and passed via with_bus(...).".to_string()
            }
            BuildError::InvalidConfig(msg) => format!(
                "What happened: Invalid configuration ({msg}).\nLikely causes: Missing or out-of-range values in the TOML.\nHow to fix: Edit the config file, then rerun."
            ),
        };
    }

    if let Some(pe) = err.downcast_ref::<PendantError>() {
        return match pe {
            PendantError::Hardware(_) | PendantError::HardwareFault(_) | PendantError::Io(_) => format!(
                "What happened: {pe}.\nLikely causes: A potentiometer or the enable output did not accept a write; loose SPI wiring or missing power.\nHow to fix: Check SCK/MOSI/CS wiring and 3.3V/GND, then run `pendant self-check`."
            ),
            other => format!(
                "What happened: {other}.\nLikely causes: See logs.\nHow to fix: Re-run with --log-level=debug or set RUST_LOG for more detail."
            ),
        };
    }

    // String-based heuristics for errors coming from hardware init
    let msg = err.to_string();
    let lower = msg.to_ascii_lowercase();

    if lower.contains("gpio") || lower.contains("open pins") {
        return "What happened: Failed to initialize GPIO pins.\nLikely causes: Incorrect pin numbers, a pin claimed by another driver, or insufficient GPIO permissions.\nHow to fix: Fix the [pins] values in the config; ensure the process can access /dev/gpiomem.".to_string();
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

/// Stable exit codes: 2 config, 3 hardware, 1 anything else.
pub fn exit_code_for_error(err: &eyre::Report) -> i32 {
    use pendant_core::error::{BuildError, PendantError};
    if err.downcast_ref::<ConfigError>().is_some() || err.downcast_ref::<BuildError>().is_some() {
        return 2;
    }
    match err.downcast_ref::<PendantError>() {
        Some(PendantError::Config(_)) => 2,
        Some(PendantError::Hardware(_) | PendantError::HardwareFault(_) | PendantError::Io(_)) => 3,
        _ => 1,
    }
}

fn reason_name(err: &eyre::Report) -> &'static str {
    use pendant_core::error::{BuildError, PendantError};
    if let Some(ce) = err.downcast_ref::<ConfigError>() {
        return match ce {
            ConfigError::Read { .. } => "ConfigRead",
            ConfigError::Parse { .. } => "ConfigParse",
            ConfigError::Invalid { .. } => "ConfigInvalid",
        };
    }
    if err.downcast_ref::<BuildError>().is_some() {
        return "Build";
    }
    match err.downcast_ref::<PendantError>() {
        Some(PendantError::Config(_)) => "ConfigInvalid",
        Some(PendantError::State(_)) => "State",
        Some(_) => "Hardware",
        None => "Error",
    }
}

/// Structured JSON for errors when --json is enabled.
pub fn format_error_json(err: &eyre::Report) -> String {
    use serde_json::json;

    if let Some(ConfigError::Parse { source, .. }) = err.downcast_ref::<ConfigError>()
        && let Some(span) = source.span()
    {
        return json!({
            "reason": reason_name(err),
            "details": { "span": [span.start, span.end] },
            "message": humanize(err),
        })
        .to_string();
    }

    json!({ "reason": reason_name(err), "message": humanize(err) }).to_string()
}
