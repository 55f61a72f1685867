//! Human-readable error descriptions and structured JSON error formatting.

use foamguard_core::error::{BuildError, CommandError, CoreError};
use foamguard_core::HELP_TEXT;

/// Map an eyre::Report to a human-readable explanation with likely causes and fix hints.
pub fn humanize(err: &eyre::Report) -> String {
    if let Some(be) = err.downcast_ref::<BuildError>() {
        return match be {
            BuildError::MissingSwitches => {
                "What happened: No level switches were provided to the controller.\nLikely causes: The switch inputs failed to initialize or were not passed to the builder.\nHow to fix: Check [pins] level_low/level_mid/level_high and GPIO permissions.".to_string()
            }
            BuildError::MissingFoamProbe => {
                "What happened: No foam probe was provided to the controller.\nLikely causes: The ADC or the foam switch input failed to initialize.\nHow to fix: Check sampler.foam_mode and the matching [pins] entry; for analog, make sure SPI is enabled.".to_string()
            }
            BuildError::MissingPump => {
                "What happened: No pump output was provided to the controller.\nLikely causes: The pump pin failed to initialize or was not passed to the builder.\nHow to fix: Check [pins] pump and GPIO permissions.".to_string()
            }
        };
    }

    if let Some(ce) = err.downcast_ref::<CommandError>() {
        return match ce {
            CommandError::UnknownCommand(cmd) => {
                format!("Unknown command `{cmd}`.\n{HELP_TEXT}")
            }
            CommandError::InvalidParameter {
                name,
                value,
                expected,
            } => format!("Rejected: {name} = {value} is out of range (expected {expected})."),
            CommandError::MissingParameter(name) => {
                format!("Rejected: the command needs a `{name}` value.")
            }
            CommandError::MalformedPayload(msg) => {
                format!("Rejected: the payload could not be parsed ({msg}).")
            }
        };
    }

    if let Some(ce) = err.downcast_ref::<CoreError>() {
        return match ce {
            CoreError::Config(msg) => format!(
                "What happened: Invalid configuration ({msg}).\nLikely causes: Missing or out-of-range values in the TOML.\nHow to fix: Edit the config file, then rerun. See etc/foamguard.toml for a sample."
            ),
            CoreError::SensorUnavailable(msg) => format!(
                "What happened: A sensor could not be read ({msg}).\nLikely causes: Loose wiring, wrong pin numbers, or the ADC not answering.\nHow to fix: Verify [pins] and power, then run `foamguard self-check` again."
            ),
            CoreError::ActuatorWrite(msg) => format!(
                "What happened: The pump output could not be switched ({msg}).\nLikely causes: GPIO permissions or a wrong pump pin.\nHow to fix: Check [pins] pump and that the process may access GPIO."
            ),
            CoreError::ChannelUnavailable { channel, reason } => format!(
                "What happened: The {channel} channel is unavailable ({reason}).\nLikely causes: The sink could not be opened or written.\nHow to fix: Check the path or endpoint configured for that channel."
            ),
        };
    }

    let msg = err.to_string();
    let lower = msg.to_ascii_lowercase();

    if lower.contains("gpio") || lower.contains("spi error") {
        return "What happened: Failed to initialize hardware pins.\nLikely causes: Incorrect pin numbers or insufficient GPIO/SPI permissions.\nHow to fix: Fix the [pins] values in the config; ensure the process may access /dev/gpiomem and /dev/spidev0.0.".to_string();
    }

    let mut cause = String::new();
    if let Some(src) = err.source() {
        cause = format!(" Cause: {src}");
    }
    format!(
        "Something went wrong.{cause}\nHow to fix: Re-run with --log-level=debug for details. Original: {msg}"
    )
}

/// Stable exit codes per error class; anything unclassified returns 1.
pub fn exit_code_for_error(err: &eyre::Report) -> i32 {
    if err.downcast_ref::<CommandError>().is_some() {
        return 1;
    }
    if err.downcast_ref::<BuildError>().is_some() {
        return 4;
    }
    match err.downcast_ref::<CoreError>() {
        Some(CoreError::Config(_)) => 3,
        Some(CoreError::SensorUnavailable(_)) => 5,
        _ => 1,
    }
}

fn reason_name(err: &eyre::Report) -> &'static str {
    if let Some(ce) = err.downcast_ref::<CommandError>() {
        return match ce {
            CommandError::InvalidParameter { .. } => "InvalidParameter",
            CommandError::MissingParameter(_) => "MissingParameter",
            CommandError::UnknownCommand(_) => "UnknownCommand",
            CommandError::MalformedPayload(_) => "MalformedPayload",
        };
    }
    if err.downcast_ref::<BuildError>().is_some() {
        return "Build";
    }
    match err.downcast_ref::<CoreError>() {
        Some(CoreError::Config(_)) => "Config",
        Some(CoreError::SensorUnavailable(_)) => "SensorUnavailable",
        Some(CoreError::ActuatorWrite(_)) => "ActuatorWrite",
        Some(CoreError::ChannelUnavailable { .. }) => "ChannelUnavailable",
        None => "Error",
    }
}

/// Structured JSON for errors when --json is enabled.
pub fn format_error_json(err: &eyre::Report) -> String {
    serde_json::json!({ "reason": reason_name(err), "message": humanize(err) }).to_string()
}
