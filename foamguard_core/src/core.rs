//! The control core: sampler, arbiter and fan-out owned by one value and
//! driven by `tick`.
use std::time::Instant;

use foamguard_traits::{FoamProbe, LevelSwitches, Pump};

use crate::arbiter::{Arbiter, ManualAction, Transition};
use crate::command::{CanonicalCommand, CommandChannel, HELP_TEXT, InboundCommand, normalize};
use crate::error::CommandError;
use crate::fanout::{Emission, FanOut};
use crate::sampler::SensorSampler;
use crate::snapshot::StatusSnapshot;

/// Answer returned to the channel that sent a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandReply {
    Ack(CanonicalCommand),
    Status(Box<StatusSnapshot>),
    Help(&'static str),
    Rejected(CommandError),
}

impl CommandReply {
    pub fn is_rejected(&self) -> bool {
        matches!(self, CommandReply::Rejected(_))
    }
}

impl std::fmt::Display for CommandReply {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CommandReply::Ack(cmd) => write!(f, "ok: {cmd}"),
            CommandReply::Status(s) => f.write_str(&s.summary()),
            CommandReply::Help(text) => f.write_str(text),
            CommandReply::Rejected(e @ CommandError::UnknownCommand(_)) => {
                write!(f, "error: {e}\n{HELP_TEXT}")
            }
            CommandReply::Rejected(e) => write!(f, "error: {e}"),
        }
    }
}

/// What one `tick` did.
#[derive(Debug, Default)]
pub struct TickOutcome {
    pub sampled: bool,
    pub transition: Option<Transition>,
    pub emissions: Vec<Emission>,
}

pub struct ControlCore<L, F, P> {
    pub(crate) sampler: SensorSampler<L, F>,
    pub(crate) arbiter: Arbiter<P>,
    pub(crate) fanout: FanOut,
    last_switches: Option<[bool; 3]>,
    sensor_fault: bool,
    samples: u64,
    transitions: u64,
}

impl<L: LevelSwitches, F: FoamProbe, P: Pump> ControlCore<L, F, P> {
    pub(crate) fn from_parts(sampler: SensorSampler<L, F>, arbiter: Arbiter<P>, fanout: FanOut) -> Self {
        Self {
            sampler,
            arbiter,
            fanout,
            last_switches: None,
            sensor_fault: false,
            samples: 0,
            transitions: 0,
        }
    }

    /// One cooperative step: sample if due, evaluate, then fan out.
    pub fn tick(&mut self, now: Instant) -> TickOutcome {
        let mut outcome = TickOutcome::default();
        if self.sampler.is_due(now) {
            let reading = self.sampler.sample(now);
            self.samples += 1;
            outcome.sampled = true;
            if reading.switches.is_some() {
                self.last_switches = reading.switches;
            }
            self.sensor_fault = reading.sensor_fault();
            outcome.transition = self.arbiter.evaluate(reading.foam_for_control());
            if let Some(t) = outcome.transition {
                self.record(t);
            }
        }
        let snapshot = self.snapshot();
        outcome.emissions = self.fanout.on_tick(now, &snapshot);
        outcome
    }

    /// Normalize a raw payload from `channel` and apply it.
    pub fn handle_payload(&mut self, channel: CommandChannel, payload: &str) -> CommandReply {
        match normalize(channel, payload) {
            Ok(command) => self.handle_command(InboundCommand { channel, command }),
            Err(e) => {
                tracing::info!(%channel, error = %e, "command rejected");
                CommandReply::Rejected(e)
            }
        }
    }

    /// Apply an already-normalized command.
    pub fn handle_command(&mut self, cmd: InboundCommand) -> CommandReply {
        let InboundCommand { channel, command } = cmd;
        tracing::debug!(%channel, %command, "command");
        let action = match command {
            CanonicalCommand::TurnOn => Some(ManualAction::On),
            CanonicalCommand::TurnOff => Some(ManualAction::Off),
            CanonicalCommand::Toggle => Some(ManualAction::Toggle),
            CanonicalCommand::SetAuto => {
                self.arbiter.set_auto();
                None
            }
            CanonicalCommand::SetThreshold(pct) => {
                self.arbiter.set_threshold(pct);
                None
            }
            CanonicalCommand::SetReportInterval(min) => {
                self.fanout.set_report_interval(min);
                None
            }
            CanonicalCommand::StatusQuery => {
                if channel == CommandChannel::Bot {
                    self.fanout.request_report();
                }
                return CommandReply::Status(Box::new(self.snapshot()));
            }
            CanonicalCommand::Help => return CommandReply::Help(HELP_TEXT),
        };
        if let Some(action) = action
            && let Some(t) = self.arbiter.manual(action, channel)
        {
            self.record(t);
        }
        CommandReply::Ack(command)
    }

    /// Operator shutdown control (panel button or console stand-in).
    pub fn set_shutdown(&mut self, on: bool) -> Option<Transition> {
        let t = self.arbiter.set_shutdown(on);
        if let Some(t) = t {
            self.record(t);
        }
        t
    }

    pub fn toggle_shutdown(&mut self) -> Option<Transition> {
        let on = !self.arbiter.is_shutdown();
        self.set_shutdown(on)
    }

    /// Force an on-demand report on the next tick.
    pub fn request_report(&mut self) {
        self.fanout.request_report();
    }

    pub fn snapshot(&self) -> StatusSnapshot {
        let control = self.arbiter.control();
        StatusSnapshot {
            timestamp: chrono::Utc::now(),
            level: self.sampler.level(),
            foam: self.sampler.foam(),
            pump: self.arbiter.pump_on(),
            shutdown: self.arbiter.is_shutdown(),
            mode: self.arbiter.mode(),
            sensors: self.last_switches,
            threshold: control.threshold_pct,
            hysteresis: control.hysteresis_pct,
            report_interval_min: self.fanout.report_interval_min(),
            sensor_fault: self.sensor_fault,
        }
    }

    pub fn pump_on(&self) -> bool {
        self.arbiter.pump_on()
    }

    pub fn is_shutdown(&self) -> bool {
        self.arbiter.is_shutdown()
    }

    pub fn mode(&self) -> crate::arbiter::ControlMode {
        self.arbiter.mode()
    }

    pub fn threshold(&self) -> u8 {
        self.arbiter.control().threshold_pct
    }

    pub fn samples(&self) -> u64 {
        self.samples
    }

    pub fn transitions(&self) -> u64 {
        self.transitions
    }

    fn record(&mut self, t: Transition) {
        self.transitions += 1;
        self.fanout.notify_transition(t);
    }
}
