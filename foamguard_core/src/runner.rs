//! Cooperative run loop.
//!
//! One iteration: drain inbound commands and operator actions, poll the
//! shutdown button, tick the core, hand emissions to the outbound workers.
//! Nothing in an iteration blocks on I/O.
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use crossbeam_channel as xch;
use foamguard_traits::{Clock, FoamProbe, LevelSwitches, Pump};
use serde::Serialize;

use crate::button::ShutdownButton;
use crate::command::CommandChannel;
use crate::config::RunnerCfg;
use crate::core::{CommandReply, ControlCore};
use crate::outbound::OutboundHub;

/// Message from an inbound reader thread.
#[derive(Debug)]
pub enum Inbound {
    /// Raw payload to normalize; the reply goes back on `reply_to` if set.
    Command {
        channel: CommandChannel,
        payload: String,
        reply_to: Option<xch::Sender<CommandReply>>,
    },
    /// Operator shutdown control, bypassing the normalizer.
    Shutdown(bool),
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RunStats {
    pub iterations: u64,
    pub samples: u64,
    pub commands: u64,
    pub rejected: u64,
    pub emissions: u64,
    pub transitions: u64,
}

type ButtonReader = Box<dyn FnMut() -> bool>;

pub struct Runner<C> {
    clock: C,
    cfg: RunnerCfg,
    duration: Option<Duration>,
    stop: Arc<AtomicBool>,
    inbound: Option<xch::Receiver<Inbound>>,
    button: Option<(ButtonReader, ShutdownButton)>,
}

impl<C: Clock> Runner<C> {
    pub fn new(clock: C, cfg: RunnerCfg) -> Self {
        Self {
            clock,
            cfg,
            duration: None,
            stop: Arc::new(AtomicBool::new(false)),
            inbound: None,
            button: None,
        }
    }

    /// Stop after `d` of clock time; `None` runs until the stop flag.
    pub fn with_duration(mut self, d: Option<Duration>) -> Self {
        self.duration = d;
        self
    }

    /// Share a stop flag (e.g. raised by a Ctrl-C handler).
    pub fn with_stop_flag(mut self, stop: Arc<AtomicBool>) -> Self {
        self.stop = stop;
        self
    }

    pub fn with_inbound(mut self, rx: xch::Receiver<Inbound>) -> Self {
        self.inbound = Some(rx);
        self
    }

    /// Raw "is the shutdown button pressed" reader; debounced here.
    pub fn with_button<F>(mut self, reader: F) -> Self
    where
        F: FnMut() -> bool + 'static,
    {
        self.button = Some((
            Box::new(reader),
            ShutdownButton::new(self.cfg.button_debounce),
        ));
        self
    }

    pub fn stop_flag(&self) -> Arc<AtomicBool> {
        self.stop.clone()
    }

    pub fn run<L, F, P>(&mut self, core: &mut ControlCore<L, F, P>, hub: &OutboundHub) -> RunStats
    where
        L: LevelSwitches,
        F: FoamProbe,
        P: Pump,
    {
        let mut stats = RunStats::default();
        let start = self.clock.now();
        let samples0 = core.samples();
        let transitions0 = core.transitions();
        tracing::info!(loop_ms = self.cfg.loop_period.as_millis() as u64, "run loop start");

        loop {
            if self.stop.load(Ordering::Relaxed) {
                tracing::info!("stop requested");
                break;
            }
            let now = self.clock.now();
            if let Some(d) = self.duration
                && now.saturating_duration_since(start) >= d
            {
                break;
            }

            self.drain_inbound(core, &mut stats);

            if let Some((read, button)) = self.button.as_mut()
                && button.poll(read(), now)
            {
                tracing::info!("shutdown button pressed");
                core.toggle_shutdown();
            }

            let outcome = core.tick(now);
            stats.emissions += outcome.emissions.len() as u64;
            for e in outcome.emissions {
                hub.dispatch(e);
            }
            stats.iterations += 1;

            let spent = self.clock.now().saturating_duration_since(now);
            self.clock.sleep(self.cfg.loop_period.saturating_sub(spent));
        }

        stats.samples = core.samples() - samples0;
        stats.transitions = core.transitions() - transitions0;
        tracing::info!(
            iterations = stats.iterations,
            samples = stats.samples,
            commands = stats.commands,
            transitions = stats.transitions,
            "run loop stopped"
        );
        stats
    }

    fn drain_inbound<L, F, P>(&mut self, core: &mut ControlCore<L, F, P>, stats: &mut RunStats)
    where
        L: LevelSwitches,
        F: FoamProbe,
        P: Pump,
    {
        let Some(rx) = self.inbound.as_ref() else {
            return;
        };
        let mut closed = false;
        loop {
            match rx.try_recv() {
                Ok(Inbound::Command {
                    channel,
                    payload,
                    reply_to,
                }) => {
                    stats.commands += 1;
                    let reply = core.handle_payload(channel, &payload);
                    if reply.is_rejected() {
                        stats.rejected += 1;
                    }
                    if let Some(tx) = reply_to {
                        // Reader may have gone away; the command still applied.
                        let _ = tx.try_send(reply);
                    }
                }
                Ok(Inbound::Shutdown(on)) => {
                    core.set_shutdown(on);
                }
                Err(xch::TryRecvError::Empty) => break,
                Err(xch::TryRecvError::Disconnected) => {
                    tracing::debug!("inbound channel closed");
                    closed = true;
                    break;
                }
            }
        }
        if closed {
            self.inbound = None;
        }
    }
}
