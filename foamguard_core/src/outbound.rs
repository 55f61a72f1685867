//! Outbound workers: one thread per channel behind a bounded queue.
//!
//! The control loop only ever calls `submit`, which never blocks. A slow or
//! failing sink delays nothing but its own worker; failures and deliveries
//! that overrun the channel timeout are logged and the emission is discarded.
//!
//! Each worker thread is shut down and joined when the worker is dropped,
//! after draining what is still queued.
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use crossbeam_channel as xch;

use crate::config::OutboundCfg;
use crate::error::CoreError;
use crate::fanout::{Emission, OutboundChannel};

/// What to discard when a channel queue is full.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Backpressure {
    #[default]
    DropOldest,
    DropNewest,
}

/// Delivery backend for one outbound channel.
pub trait Sink: Send {
    /// Deliver one emission. `timeout` is the budget for this attempt.
    fn deliver(
        &mut self,
        emission: &Emission,
        timeout: Duration,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
}

impl<T: Sink + ?Sized> Sink for Box<T> {
    fn deliver(
        &mut self,
        emission: &Emission,
        timeout: Duration,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        (**self).deliver(emission, timeout)
    }
}

/// Counters for one worker.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WorkerStats {
    pub delivered: u64,
    pub failed: u64,
    pub dropped: u64,
}

#[derive(Debug, Default)]
struct Counters {
    delivered: AtomicU64,
    failed: AtomicU64,
    dropped: AtomicU64,
}

/// How often an idle worker re-checks its shutdown flag.
const IDLE_POLL: Duration = Duration::from_millis(20);

type DeliveryResult = Result<(), String>;

pub struct OutboundWorker {
    channel: OutboundChannel,
    tx: xch::Sender<Emission>,
    /// Producer-side handle used to evict the oldest item under `DropOldest`.
    evict: xch::Receiver<Emission>,
    backpressure: Backpressure,
    counters: Arc<Counters>,
    shutdown: Arc<AtomicBool>,
    /// Raised when the dispatcher exits while a delivery is still running.
    sink_stuck: Arc<AtomicBool>,
    join_handle: Option<std::thread::JoinHandle<()>>,
    sink_handle: Option<std::thread::JoinHandle<()>>,
}

impl OutboundWorker {
    /// Spawn the worker. The sink runs on its own thread so the dispatcher
    /// can give up on a delivery once `cfg.timeout` has passed; an overrun
    /// counts as failed and later emissions wait at most one more timeout
    /// for the sink to come back before they are discarded too.
    pub fn spawn<S: Sink + 'static>(channel: OutboundChannel, mut sink: S, cfg: OutboundCfg) -> Self {
        let (tx, rx) = xch::bounded::<Emission>(cfg.capacity.max(1));
        let evict = rx.clone();
        let shutdown = Arc::new(AtomicBool::new(false));
        let shutdown_clone = shutdown.clone();
        let sink_stuck = Arc::new(AtomicBool::new(false));
        let sink_stuck_clone = sink_stuck.clone();
        let counters = Arc::new(Counters::default());
        let counters_clone = counters.clone();
        let timeout = cfg.timeout;
        let name = channel.as_str();

        let (job_tx, job_rx) = xch::bounded::<Emission>(1);
        let (done_tx, done_rx) = xch::bounded::<DeliveryResult>(1);
        let sink_handle = std::thread::spawn(move || {
            for emission in job_rx {
                let res = sink.deliver(&emission, timeout).map_err(|e| e.to_string());
                if done_tx.send(res).is_err() {
                    break;
                }
            }
        });

        let unavailable = move |reason: String| CoreError::ChannelUnavailable {
            channel: name,
            reason,
        };

        let join_handle = std::thread::spawn(move || {
            // A timed-out delivery is still running on the sink thread.
            let mut busy = false;
            // Set once a shutdown drain meets a stuck sink; the rest is dropped.
            let mut abandon = false;
            loop {
                let emission = match rx.recv_timeout(IDLE_POLL) {
                    Ok(e) => e,
                    Err(xch::RecvTimeoutError::Timeout) => {
                        if busy && done_rx.try_recv().is_ok() {
                            busy = false;
                        }
                        if shutdown_clone.load(Ordering::Relaxed) {
                            break;
                        }
                        continue;
                    }
                    Err(xch::RecvTimeoutError::Disconnected) => break,
                };
                if abandon {
                    counters_clone.dropped.fetch_add(1, Ordering::Relaxed);
                    continue;
                }
                if busy {
                    if done_rx.recv_timeout(timeout).is_ok() {
                        busy = false;
                    } else {
                        counters_clone.failed.fetch_add(1, Ordering::Relaxed);
                        let err = unavailable("previous delivery still running".into());
                        tracing::warn!(error = %err, "emission discarded");
                        abandon = shutdown_clone.load(Ordering::Relaxed);
                        continue;
                    }
                }
                if job_tx.send(emission).is_err() {
                    counters_clone.failed.fetch_add(1, Ordering::Relaxed);
                    tracing::warn!(error = %unavailable("sink thread gone".into()), "emission discarded");
                    continue;
                }
                match done_rx.recv_timeout(timeout) {
                    Ok(Ok(())) => {
                        counters_clone.delivered.fetch_add(1, Ordering::Relaxed);
                    }
                    Ok(Err(reason)) => {
                        counters_clone.failed.fetch_add(1, Ordering::Relaxed);
                        tracing::warn!(error = %unavailable(reason), "emission discarded");
                    }
                    Err(xch::RecvTimeoutError::Timeout) => {
                        counters_clone.failed.fetch_add(1, Ordering::Relaxed);
                        busy = true;
                        let err = unavailable(format!(
                            "delivery overran timeout ({} ms)",
                            timeout.as_millis()
                        ));
                        tracing::warn!(error = %err, "emission discarded");
                        abandon = shutdown_clone.load(Ordering::Relaxed);
                    }
                    Err(xch::RecvTimeoutError::Disconnected) => {
                        counters_clone.failed.fetch_add(1, Ordering::Relaxed);
                        tracing::warn!(error = %unavailable("sink thread exited".into()), "emission discarded");
                    }
                }
            }
            sink_stuck_clone.store(busy, Ordering::Relaxed);
            tracing::trace!(channel = name, "outbound worker exiting cleanly");
        });

        Self {
            channel,
            tx,
            evict,
            backpressure: cfg.backpressure,
            counters,
            shutdown,
            sink_stuck,
            join_handle: Some(join_handle),
            sink_handle: Some(sink_handle),
        }
    }

    pub fn channel(&self) -> OutboundChannel {
        self.channel
    }

    /// Enqueue without blocking. Returns false when something was dropped.
    pub fn submit(&self, emission: Emission) -> bool {
        let emission = match self.tx.try_send(emission) {
            Ok(()) => return true,
            Err(xch::TrySendError::Disconnected(_)) => {
                tracing::warn!(channel = self.channel.as_str(), "outbound worker gone");
                self.counters.dropped.fetch_add(1, Ordering::Relaxed);
                return false;
            }
            Err(xch::TrySendError::Full(e)) => e,
        };
        self.counters.dropped.fetch_add(1, Ordering::Relaxed);
        match self.backpressure {
            Backpressure::DropNewest => {
                tracing::warn!(channel = self.channel.as_str(), "queue full; newest dropped");
            }
            Backpressure::DropOldest => {
                let _ = self.evict.try_recv();
                if self.tx.try_send(emission).is_err() {
                    // Another eviction raced us; count the loss and move on.
                    self.counters.dropped.fetch_add(1, Ordering::Relaxed);
                }
                tracing::warn!(channel = self.channel.as_str(), "queue full; oldest dropped");
            }
        }
        false
    }

    pub fn stats(&self) -> WorkerStats {
        WorkerStats {
            delivered: self.counters.delivered.load(Ordering::Relaxed),
            failed: self.counters.failed.load(Ordering::Relaxed),
            dropped: self.counters.dropped.load(Ordering::Relaxed),
        }
    }
}

impl Drop for OutboundWorker {
    fn drop(&mut self) {
        self.shutdown.store(true, Ordering::Relaxed);
        if let Some(handle) = self.join_handle.take() {
            match handle.join() {
                Ok(()) => {
                    tracing::trace!(channel = self.channel.as_str(), "outbound worker joined");
                }
                Err(e) => {
                    tracing::warn!(?e, "outbound worker panicked during shutdown");
                }
            }
        }
        if let Some(handle) = self.sink_handle.take() {
            if self.sink_stuck.load(Ordering::Relaxed) {
                // Exits on its own once the hung delivery returns.
                tracing::warn!(channel = self.channel.as_str(), "sink still delivering; detached");
            } else if handle.join().is_err() {
                tracing::warn!(channel = self.channel.as_str(), "sink thread panicked");
            }
        }
    }
}

/// Routes emissions to the worker of their channel. Channels without a
/// worker silently discard.
#[derive(Default)]
pub struct OutboundHub {
    push: Option<OutboundWorker>,
    log: Option<OutboundWorker>,
    messaging: Option<OutboundWorker>,
    cfg: OutboundCfg,
}

impl OutboundHub {
    pub fn new(cfg: OutboundCfg) -> Self {
        Self {
            push: None,
            log: None,
            messaging: None,
            cfg,
        }
    }

    pub fn with_sink<S: Sink + 'static>(mut self, channel: OutboundChannel, sink: S) -> Self {
        let worker = OutboundWorker::spawn(channel, sink, self.cfg);
        *self.slot(channel) = Some(worker);
        self
    }

    fn slot(&mut self, channel: OutboundChannel) -> &mut Option<OutboundWorker> {
        match channel {
            OutboundChannel::Push => &mut self.push,
            OutboundChannel::Log => &mut self.log,
            OutboundChannel::Messaging => &mut self.messaging,
        }
    }

    pub fn worker(&self, channel: OutboundChannel) -> Option<&OutboundWorker> {
        match channel {
            OutboundChannel::Push => self.push.as_ref(),
            OutboundChannel::Log => self.log.as_ref(),
            OutboundChannel::Messaging => self.messaging.as_ref(),
        }
    }

    pub fn dispatch(&self, emission: Emission) {
        match self.worker(emission.channel()) {
            Some(w) => {
                w.submit(emission);
            }
            None => {
                tracing::trace!(channel = emission.channel().as_str(), "no sink; emission discarded");
            }
        }
    }

    /// Sum of all worker counters.
    pub fn stats(&self) -> WorkerStats {
        [&self.push, &self.log, &self.messaging]
            .into_iter()
            .flatten()
            .map(OutboundWorker::stats)
            .fold(WorkerStats::default(), |acc, s| WorkerStats {
                delivered: acc.delivered + s.delivered,
                failed: acc.failed + s.failed,
                dropped: acc.dropped + s.dropped,
            })
    }
}
