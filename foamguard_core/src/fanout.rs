//! Change detector and per-channel fan-out scheduler.
//!
//! - Push: on any change of level, foam, pump or shutdown (first tick included).
//! - Log: every `log_interval`, skipped while shut down.
//! - Messaging: periodic reports (skipped while shut down), on-demand
//!   reports, pump transition notices and one startup notice.
use std::time::Instant;

use serde::Serialize;

use crate::arbiter::Transition;
use crate::config::ScheduleCfg;
use crate::snapshot::{ChangeKey, StatusSnapshot};
use crate::util::{is_due, report_period};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum ReportKind {
    Startup,
    Periodic,
    OnDemand,
    Transition(Transition),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Report {
    pub kind: ReportKind,
    pub snapshot: StatusSnapshot,
}

impl Report {
    /// Text for the messaging backend.
    pub fn text(&self) -> String {
        let head = match self.kind {
            ReportKind::Startup => "foamguard started".to_string(),
            ReportKind::Periodic => "periodic report".to_string(),
            ReportKind::OnDemand => "status".to_string(),
            ReportKind::Transition(t) => format!(
                "pump {} ({})",
                if t.on { "on" } else { "off" },
                t.reason
            ),
        };
        format!("{head}\n{}", self.snapshot.summary())
    }
}

/// Destination class of an emission; one outbound worker serves each.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutboundChannel {
    Push,
    Log,
    Messaging,
}

impl OutboundChannel {
    pub const fn as_str(self) -> &'static str {
        match self {
            OutboundChannel::Push => "push",
            OutboundChannel::Log => "log",
            OutboundChannel::Messaging => "messaging",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Emission {
    Push(StatusSnapshot),
    Log(StatusSnapshot),
    Report(Report),
}

impl Emission {
    pub fn channel(&self) -> OutboundChannel {
        match self {
            Emission::Push(_) => OutboundChannel::Push,
            Emission::Log(_) => OutboundChannel::Log,
            Emission::Report(_) => OutboundChannel::Messaging,
        }
    }
}

#[derive(Debug)]
pub struct FanOut {
    cfg: ScheduleCfg,
    last_pushed: Option<ChangeKey>,
    /// Anchors for the periodic timers; set on the first tick.
    last_log: Option<Instant>,
    last_report: Option<Instant>,
    started: bool,
    report_requested: bool,
    transitions: Vec<Transition>,
}

impl FanOut {
    pub fn new(cfg: ScheduleCfg) -> Self {
        Self {
            cfg,
            last_pushed: None,
            last_log: None,
            last_report: None,
            started: false,
            report_requested: false,
            transitions: Vec::new(),
        }
    }

    pub fn report_interval_min(&self) -> u16 {
        self.cfg.report_interval_min
    }

    /// Change the messaging cadence. The running period keeps its anchor.
    pub fn set_report_interval(&mut self, minutes: u16) {
        tracing::info!(
            from = self.cfg.report_interval_min,
            to = minutes,
            "report interval changed"
        );
        self.cfg.report_interval_min = minutes;
    }

    /// Force an on-demand report on the next tick, shutdown or not.
    pub fn request_report(&mut self) {
        self.report_requested = true;
    }

    /// Queue a pump transition notice for the next tick.
    pub fn notify_transition(&mut self, t: Transition) {
        self.transitions.push(t);
    }

    pub fn on_tick(&mut self, now: Instant, snapshot: &StatusSnapshot) -> Vec<Emission> {
        let mut out = Vec::new();
        let first = !self.started;
        if first {
            self.started = true;
            self.last_log = Some(now);
            self.last_report = Some(now);
        }

        let key = snapshot.change_key();
        if self.last_pushed != Some(key) {
            self.last_pushed = Some(key);
            out.push(Emission::Push(snapshot.clone()));
        }

        if !snapshot.shutdown && is_due(self.last_log, now, self.cfg.log_interval) {
            self.last_log = Some(now);
            out.push(Emission::Log(snapshot.clone()));
        }

        let report = |kind| {
            Emission::Report(Report {
                kind,
                snapshot: snapshot.clone(),
            })
        };
        for t in self.transitions.drain(..) {
            out.push(report(ReportKind::Transition(t)));
        }
        if first {
            out.push(report(ReportKind::Startup));
        }
        if std::mem::take(&mut self.report_requested) {
            out.push(report(ReportKind::OnDemand));
        }
        if !snapshot.shutdown
            && let Some(period) = report_period(self.cfg.report_interval_min)
            && is_due(self.last_report, now, period)
        {
            self.last_report = Some(now);
            out.push(report(ReportKind::Periodic));
        }
        out
    }
}
