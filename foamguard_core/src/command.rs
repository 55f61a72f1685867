//! Command normalizer: maps channel-specific payloads onto one canonical
//! command set. Pure; rejections never touch controller state.
//!
//! | Channel   | Payload shape                                              |
//! |-----------|------------------------------------------------------------|
//! | `Web`     | `{"action": "on", "value": 70}`                            |
//! | `Push`    | `{"type":"control","pump":true}`, `{"type":"status"}`      |
//! | `Bot`     | text line, canonical grammar or slash aliases              |
//! | `Console` | text line, same grammar as `Bot`                           |
use serde::{Deserialize, Serialize};

use crate::error::CommandError;

pub const THRESHOLD_RANGE: (i64, i64) = (0, 100);
pub const REPORT_INTERVAL_RANGE: (i64, i64) = (1, 1440);

/// Menu returned for help requests and unknown commands.
pub const HELP_TEXT: &str = "\
pump.on                 manual mode, pump on            (/pump_on)
pump.off                manual mode, pump off           (/pump_off)
pump.toggle             manual mode, flip the pump
mode.auto               return to automatic control     (/auto)
threshold.set N         foam threshold, 0-100 %         (/threshold N)
report.interval.set N   report cadence, 1-1440 min      (/setinterval N)
status.query            current status                  (/status, /datasensores)
help                    this menu                       (/start, /menu, /help)";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CommandChannel {
    Web,
    Push,
    Bot,
    Console,
}

impl CommandChannel {
    pub const fn as_str(self) -> &'static str {
        match self {
            CommandChannel::Web => "web",
            CommandChannel::Push => "push",
            CommandChannel::Bot => "bot",
            CommandChannel::Console => "console",
        }
    }
}

impl std::fmt::Display for CommandChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CanonicalCommand {
    TurnOn,
    TurnOff,
    Toggle,
    SetAuto,
    SetThreshold(u8),
    SetReportInterval(u16),
    StatusQuery,
    Help,
}

impl std::fmt::Display for CanonicalCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CanonicalCommand::TurnOn => f.write_str("pump.on"),
            CanonicalCommand::TurnOff => f.write_str("pump.off"),
            CanonicalCommand::Toggle => f.write_str("pump.toggle"),
            CanonicalCommand::SetAuto => f.write_str("mode.auto"),
            CanonicalCommand::SetThreshold(n) => write!(f, "threshold.set {n}"),
            CanonicalCommand::SetReportInterval(n) => write!(f, "report.interval.set {n}"),
            CanonicalCommand::StatusQuery => f.write_str("status.query"),
            CanonicalCommand::Help => f.write_str("help"),
        }
    }
}

/// A canonical command tagged with the channel it arrived on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InboundCommand {
    pub channel: CommandChannel,
    pub command: CanonicalCommand,
}

/// Normalize one payload received on `channel`.
pub fn normalize(channel: CommandChannel, payload: &str) -> Result<CanonicalCommand, CommandError> {
    match channel {
        CommandChannel::Web => parse_web(payload),
        CommandChannel::Push => parse_push(payload),
        CommandChannel::Bot | CommandChannel::Console => parse_text(payload),
    }
}

/// Parse a text line (canonical grammar or slash aliases).
///
/// Parameterless verbs take no further tokens and the setters exactly one;
/// anything trailing rejects the whole line.
pub fn parse_text(line: &str) -> Result<CanonicalCommand, CommandError> {
    let lowered = line.trim().to_ascii_lowercase();
    let words: Vec<&str> = lowered.split_whitespace().collect();
    let (verb, args) = words.split_first().map_or(("", &[][..]), |(v, a)| (*v, a));
    let unknown = || CommandError::UnknownCommand(line.trim().to_string());
    let bare = |cmd: CanonicalCommand| if args.is_empty() { Ok(cmd) } else { Err(unknown()) };
    match verb {
        "pump.on" | "/pump_on" => bare(CanonicalCommand::TurnOn),
        "pump.off" | "/pump_off" => bare(CanonicalCommand::TurnOff),
        "pump.toggle" | "/toggle" => bare(CanonicalCommand::Toggle),
        "mode.auto" | "/auto" => bare(CanonicalCommand::SetAuto),
        "threshold.set" | "/threshold" => {
            single_arg(args, "threshold", "integer in [0, 100]").and_then(threshold)
        }
        "report.interval.set" | "/setinterval" => {
            single_arg(args, "interval", "integer in [1, 1440]").and_then(report_interval)
        }
        "status.query" | "/status" | "/datasensores" => bare(CanonicalCommand::StatusQuery),
        "help" | "/help" | "/start" | "/menu" => bare(CanonicalCommand::Help),
        _ => Err(unknown()),
    }
}

/// At most one parameter token; more is an invalid parameter.
fn single_arg<'a>(
    args: &[&'a str],
    name: &'static str,
    expected: &'static str,
) -> Result<Option<&'a str>, CommandError> {
    match args {
        [] => Ok(None),
        [one] => Ok(Some(*one)),
        more => Err(invalid(name, more.join(" "), expected)),
    }
}

fn threshold<A: ParamArg>(arg: Option<A>) -> Result<CanonicalCommand, CommandError> {
    let n = ranged(arg, "threshold", THRESHOLD_RANGE, "integer in [0, 100]")?;
    u8::try_from(n)
        .map(CanonicalCommand::SetThreshold)
        .map_err(|_| invalid("threshold", n.to_string(), "integer in [0, 100]"))
}

fn report_interval<A: ParamArg>(arg: Option<A>) -> Result<CanonicalCommand, CommandError> {
    let n = ranged(arg, "interval", REPORT_INTERVAL_RANGE, "integer in [1, 1440]")?;
    u16::try_from(n)
        .map(CanonicalCommand::SetReportInterval)
        .map_err(|_| invalid("interval", n.to_string(), "integer in [1, 1440]"))
}

fn invalid(name: &'static str, value: String, expected: &'static str) -> CommandError {
    CommandError::InvalidParameter {
        name,
        value,
        expected,
    }
}

/// Something that can be read as an integer parameter: a text token or a
/// JSON value.
trait ParamArg {
    fn as_int(&self) -> Option<i64>;
    fn describe(&self) -> String;
}

impl ParamArg for &str {
    fn as_int(&self) -> Option<i64> {
        self.parse().ok()
    }
    fn describe(&self) -> String {
        (*self).to_string()
    }
}

impl ParamArg for &serde_json::Value {
    fn as_int(&self) -> Option<i64> {
        match self {
            serde_json::Value::Number(n) => n.as_i64(),
            serde_json::Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }
    fn describe(&self) -> String {
        self.to_string()
    }
}

fn ranged<A: ParamArg>(
    arg: Option<A>,
    name: &'static str,
    (lo, hi): (i64, i64),
    expected: &'static str,
) -> Result<i64, CommandError> {
    let arg = arg.ok_or(CommandError::MissingParameter(name))?;
    match arg.as_int() {
        Some(n) if (lo..=hi).contains(&n) => Ok(n),
        _ => Err(invalid(name, arg.describe(), expected)),
    }
}

#[derive(Debug, Deserialize)]
struct WebBody {
    action: Option<String>,
    value: Option<serde_json::Value>,
}

fn parse_web(payload: &str) -> Result<CanonicalCommand, CommandError> {
    let body: WebBody = serde_json::from_str(payload)
        .map_err(|e| CommandError::MalformedPayload(e.to_string()))?;
    let action = body
        .action
        .ok_or(CommandError::MissingParameter("action"))?
        .trim()
        .to_ascii_lowercase();
    let value = body.value.as_ref();
    match action.as_str() {
        "on" => Ok(CanonicalCommand::TurnOn),
        "off" => Ok(CanonicalCommand::TurnOff),
        "toggle" => Ok(CanonicalCommand::Toggle),
        "auto" => Ok(CanonicalCommand::SetAuto),
        "threshold" => threshold(value),
        "interval" => report_interval(value),
        "status" => Ok(CanonicalCommand::StatusQuery),
        _ => Err(CommandError::UnknownCommand(action)),
    }
}

#[derive(Debug, Deserialize)]
struct PushFrame {
    #[serde(rename = "type")]
    kind: Option<String>,
    pump: Option<bool>,
    command: Option<String>,
}

fn parse_push(payload: &str) -> Result<CanonicalCommand, CommandError> {
    let frame: PushFrame = serde_json::from_str(payload)
        .map_err(|e| CommandError::MalformedPayload(e.to_string()))?;
    match frame.kind.as_deref() {
        Some("control") => match (frame.pump, frame.command.as_deref()) {
            (Some(true), _) => Ok(CanonicalCommand::TurnOn),
            (Some(false), _) => Ok(CanonicalCommand::TurnOff),
            (None, Some(text)) => parse_text(text),
            (None, None) => Err(CommandError::MissingParameter("pump")),
        },
        Some("status") => Ok(CanonicalCommand::StatusQuery),
        Some(other) => Err(CommandError::UnknownCommand(other.to_string())),
        None => Err(CommandError::MissingParameter("type")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_round_trips_through_text_grammar() {
        for cmd in [
            CanonicalCommand::TurnOn,
            CanonicalCommand::Toggle,
            CanonicalCommand::SetThreshold(70),
            CanonicalCommand::SetReportInterval(15),
            CanonicalCommand::Help,
        ] {
            assert_eq!(parse_text(&cmd.to_string()), Ok(cmd));
        }
    }

    #[test]
    fn json_value_may_be_a_numeric_string() {
        assert_eq!(
            parse_web(r#"{"action":"threshold","value":"65"}"#),
            Ok(CanonicalCommand::SetThreshold(65))
        );
    }
}
