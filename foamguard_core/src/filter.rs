//! Signal conditioning for the foam probe and the shutdown button.
use std::collections::VecDeque;
use std::time::{Duration, Instant};

use crate::util::counts_to_pct;

/// Fixed-window running mean over raw ADC counts.
#[derive(Debug, Clone)]
pub struct MovingAverage {
    buf: VecDeque<u16>,
    cap: usize,
    sum: u64,
}

impl MovingAverage {
    pub fn new(window: usize) -> Self {
        let cap = window.max(1);
        Self {
            buf: VecDeque::with_capacity(cap),
            cap,
            sum: 0,
        }
    }

    /// Push one sample and return the mean of the current window.
    pub fn push(&mut self, v: u16) -> f32 {
        if self.buf.len() == self.cap
            && let Some(old) = self.buf.pop_front()
        {
            self.sum -= u64::from(old);
        }
        self.buf.push_back(v);
        self.sum += u64::from(v);
        self.sum as f32 / self.buf.len() as f32
    }
}

/// Analog foam conditioning: running mean, mapping to percent, and a
/// noise floor below which changes are not accepted.
#[derive(Debug, Clone)]
pub struct AnalogFoamFilter {
    avg: MovingAverage,
    adc_max: u16,
    min_delta_pct: u8,
    accepted: Option<u8>,
}

impl AnalogFoamFilter {
    pub fn new(window: usize, adc_max: u16, min_delta_pct: u8) -> Self {
        Self {
            avg: MovingAverage::new(window),
            adc_max,
            min_delta_pct,
            accepted: None,
        }
    }

    /// Feed raw counts. Returns the accepted percentage and whether it
    /// changed on this call. The first sample is always accepted.
    pub fn update(&mut self, counts: u16) -> (u8, bool) {
        let pct = counts_to_pct(self.avg.push(counts), self.adc_max);
        match self.accepted {
            Some(last) if pct.abs_diff(last) < self.min_delta_pct => (last, false),
            Some(last) if pct == last => (last, false),
            _ => {
                self.accepted = Some(pct);
                (pct, true)
            }
        }
    }
}

/// Time-based debouncer for a boolean input.
///
/// A new value is accepted once it has been observed continuously for
/// `hold`. With no initial value the first observation is accepted as is.
#[derive(Debug, Clone)]
pub struct Debouncer {
    hold: Duration,
    stable: Option<bool>,
    candidate: Option<(bool, Instant)>,
}

impl Debouncer {
    pub fn new(hold: Duration) -> Self {
        Self {
            hold,
            stable: None,
            candidate: None,
        }
    }

    /// Start from a known stable value; the first change must be held.
    pub fn with_initial(hold: Duration, initial: bool) -> Self {
        Self {
            hold,
            stable: Some(initial),
            candidate: None,
        }
    }

    /// Feed one raw observation. Returns `Some(v)` when `v` becomes the
    /// new stable value on this call.
    pub fn update(&mut self, raw: bool, now: Instant) -> Option<bool> {
        let Some(stable) = self.stable else {
            self.stable = Some(raw);
            return Some(raw);
        };
        if raw == stable {
            self.candidate = None;
            return None;
        }
        let since = match self.candidate {
            Some((v, t)) if v == raw => t,
            _ => {
                self.candidate = Some((raw, now));
                now
            }
        };
        if now.saturating_duration_since(since) >= self.hold {
            self.stable = Some(raw);
            self.candidate = None;
            return Some(raw);
        }
        None
    }
}
