use foamguard_core::{CanonicalCommand, CommandChannel, CommandError, normalize};
use rstest::rstest;

use CanonicalCommand::*;
use CommandChannel::*;

#[rstest]
#[case(Console, "pump.on", TurnOn)]
#[case(Console, "  PUMP.OFF  ", TurnOff)]
#[case(Console, "pump.toggle", Toggle)]
#[case(Console, "mode.auto", SetAuto)]
#[case(Console, "threshold.set 70", SetThreshold(70))]
#[case(Console, "report.interval.set 1440", SetReportInterval(1440))]
#[case(Console, "status.query", StatusQuery)]
#[case(Bot, "/pump_on", TurnOn)]
#[case(Bot, "/pump_off", TurnOff)]
#[case(Bot, "/auto", SetAuto)]
#[case(Bot, "/setinterval 15", SetReportInterval(15))]
#[case(Bot, "/threshold 0", SetThreshold(0))]
#[case(Bot, "/datasensores", StatusQuery)]
#[case(Bot, "/status", StatusQuery)]
#[case(Bot, "/start", Help)]
#[case(Bot, "/menu", Help)]
#[case(Web, r#"{"action":"on"}"#, TurnOn)]
#[case(Web, r#"{"action":"OFF"}"#, TurnOff)]
#[case(Web, r#"{"action":"toggle"}"#, Toggle)]
#[case(Web, r#"{"action":"auto"}"#, SetAuto)]
#[case(Web, r#"{"action":"threshold","value":100}"#, SetThreshold(100))]
#[case(Web, r#"{"action":"interval","value":1}"#, SetReportInterval(1))]
#[case(Web, r#"{"action":"status"}"#, StatusQuery)]
#[case(Push, r#"{"type":"control","pump":true}"#, TurnOn)]
#[case(Push, r#"{"type":"control","pump":false}"#, TurnOff)]
#[case(Push, r#"{"type":"control","command":"mode.auto"}"#, SetAuto)]
#[case(Push, r#"{"type":"status"}"#, StatusQuery)]
fn accepted_payloads(
    #[case] channel: CommandChannel,
    #[case] payload: &str,
    #[case] expected: CanonicalCommand,
) {
    assert_eq!(normalize(channel, payload), Ok(expected));
}

#[rstest]
#[case::threshold_too_high(Bot, "threshold.set 150", "threshold")]
#[case::threshold_negative(Console, "threshold.set -1", "threshold")]
#[case::threshold_not_a_number(Bot, "/threshold lots", "threshold")]
#[case::interval_zero(Bot, "/setinterval 0", "interval")]
#[case::interval_too_long(Web, r#"{"action":"interval","value":1441}"#, "interval")]
#[case::interval_wrong_type(Web, r#"{"action":"interval","value":true}"#, "interval")]
#[case::threshold_extra_token(Bot, "threshold.set 50 150", "threshold")]
#[case::interval_extra_token(Console, "/setinterval 15 min", "interval")]
fn out_of_range_parameters_are_invalid(
    #[case] channel: CommandChannel,
    #[case] payload: &str,
    #[case] param: &str,
) {
    match normalize(channel, payload) {
        Err(CommandError::InvalidParameter { name, .. }) => assert_eq!(name, param),
        other => panic!("expected InvalidParameter, got {other:?}"),
    }
}

#[rstest]
#[case(Console, "threshold.set", "threshold")]
#[case(Web, r#"{"action":"threshold"}"#, "threshold")]
#[case(Web, r#"{"value":3}"#, "action")]
#[case(Push, r#"{"type":"control"}"#, "pump")]
#[case(Push, r#"{"pump":true}"#, "type")]
fn missing_parameters_are_named(
    #[case] channel: CommandChannel,
    #[case] payload: &str,
    #[case] param: &'static str,
) {
    assert_eq!(
        normalize(channel, payload),
        Err(CommandError::MissingParameter(param))
    );
}

#[rstest]
#[case(Web, "action=on")]
#[case(Web, "[1,2]")]
#[case(Push, "{")]
fn malformed_json_is_rejected(#[case] channel: CommandChannel, #[case] payload: &str) {
    assert!(matches!(
        normalize(channel, payload),
        Err(CommandError::MalformedPayload(_))
    ));
}

#[rstest]
#[case(Bot, "/reboot")]
#[case(Console, "")]
#[case(Bot, "pump.on please wait")]
#[case(Console, "mode.auto 99")]
#[case(Bot, "/status now")]
#[case(Web, r#"{"action":"explode"}"#)]
#[case(Push, r#"{"type":"hello"}"#)]
fn unknown_commands_are_reported(#[case] channel: CommandChannel, #[case] payload: &str) {
    assert!(matches!(
        normalize(channel, payload),
        Err(CommandError::UnknownCommand(_))
    ));
}
