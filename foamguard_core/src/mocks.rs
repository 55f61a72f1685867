//! Test and helper mocks for foamguard_core.
//!
//! Every mock is a cheap handle over shared state, so a test can keep one
//! clone to steer or inspect while the core owns another.
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crossbeam_channel as xch;
use foamguard_traits::{FoamProbe, FoamRaw, HwResult, LevelSwitches, Pump};

use crate::arbiter::ControlMode;
use crate::fanout::Emission;
use crate::outbound::Sink;
use crate::snapshot::StatusSnapshot;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

fn fault(what: &str) -> BoxError {
    Box::new(std::io::Error::other(format!("scripted {what} fault")))
}

/// Queue of scripted values; the last one repeats once the queue runs dry.
/// `None` entries are read failures.
#[derive(Debug)]
struct Script<T> {
    queue: VecDeque<Option<T>>,
    last: Option<T>,
}

impl<T: Copy> Script<T> {
    fn new(values: Vec<Option<T>>) -> Self {
        Self {
            queue: values.into(),
            last: None,
        }
    }

    fn next(&mut self) -> Option<T> {
        if let Some(v) = self.queue.pop_front() {
            self.last = v;
        }
        self.last
    }

    fn set(&mut self, v: Option<T>) {
        self.queue.clear();
        self.last = v;
    }
}

/// Level switches returning scripted `[low, mid, high]` states.
#[derive(Debug, Clone)]
pub struct ScriptedSwitches {
    script: Arc<Mutex<Script<[bool; 3]>>>,
}

impl ScriptedSwitches {
    pub fn script(values: Vec<Option<[bool; 3]>>) -> Self {
        Self {
            script: Arc::new(Mutex::new(Script::new(values))),
        }
    }

    pub fn steady(bits: [bool; 3]) -> Self {
        Self::script(vec![Some(bits)])
    }

    /// Replace the script with one steady value.
    pub fn set(&self, bits: [bool; 3]) {
        if let Ok(mut s) = self.script.lock() {
            s.set(Some(bits));
        }
    }

    /// Make every following read fail.
    pub fn fail(&self) {
        if let Ok(mut s) = self.script.lock() {
            s.set(None);
        }
    }
}

impl LevelSwitches for ScriptedSwitches {
    fn read(&mut self) -> HwResult<[bool; 3]> {
        let next = self.script.lock().ok().and_then(|mut s| s.next());
        next.ok_or_else(|| fault("switch"))
    }
}

/// Foam probe returning scripted raw values.
#[derive(Debug, Clone)]
pub struct ScriptedFoam {
    script: Arc<Mutex<Script<FoamRaw>>>,
}

impl ScriptedFoam {
    pub fn script(values: Vec<Option<FoamRaw>>) -> Self {
        Self {
            script: Arc::new(Mutex::new(Script::new(values))),
        }
    }

    pub fn analog(counts: &[u16]) -> Self {
        Self::script(counts.iter().map(|&c| Some(FoamRaw::Analog(c))).collect())
    }

    pub fn digital(present: &[bool]) -> Self {
        Self::script(present.iter().map(|&p| Some(FoamRaw::Digital(p))).collect())
    }

    pub fn set(&self, raw: FoamRaw) {
        if let Ok(mut s) = self.script.lock() {
            s.set(Some(raw));
        }
    }

    pub fn fail(&self) {
        if let Ok(mut s) = self.script.lock() {
            s.set(None);
        }
    }
}

impl FoamProbe for ScriptedFoam {
    fn read(&mut self, _timeout: Duration) -> HwResult<FoamRaw> {
        let next = self.script.lock().ok().and_then(|mut s| s.next());
        next.ok_or_else(|| fault("foam probe"))
    }
}

#[derive(Debug, Default)]
struct PumpLog {
    writes: Vec<bool>,
    fail: bool,
}

/// Pump that records every successful write (`true` = start).
#[derive(Debug, Clone, Default)]
pub struct RecordingPump {
    log: Arc<Mutex<PumpLog>>,
}

impl RecordingPump {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn writes(&self) -> Vec<bool> {
        self.log.lock().map(|l| l.writes.clone()).unwrap_or_default()
    }

    /// Make following writes fail until cleared.
    pub fn set_fail(&self, fail: bool) {
        if let Ok(mut l) = self.log.lock() {
            l.fail = fail;
        }
    }

    fn write(&self, on: bool) -> HwResult<()> {
        let mut l = self.log.lock().map_err(|_| fault("pump lock"))?;
        if l.fail {
            return Err(fault("pump"));
        }
        l.writes.push(on);
        Ok(())
    }
}

impl Pump for RecordingPump {
    fn start(&mut self) -> HwResult<()> {
        self.write(true)
    }

    fn stop(&mut self) -> HwResult<()> {
        self.write(false)
    }
}

/// Sink that keeps every delivered emission.
#[derive(Debug, Clone, Default)]
pub struct CaptureSink {
    seen: Arc<Mutex<Vec<Emission>>>,
}

impl CaptureSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn emissions(&self) -> Vec<Emission> {
        self.seen.lock().map(|v| v.clone()).unwrap_or_default()
    }
}

impl Sink for CaptureSink {
    fn deliver(&mut self, emission: &Emission, _timeout: Duration) -> Result<(), BoxError> {
        self.seen
            .lock()
            .map_err(|_| fault("capture lock"))?
            .push(emission.clone());
        Ok(())
    }
}

/// Sink whose transport is always down.
#[derive(Debug, Clone, Copy, Default)]
pub struct FailingSink;

impl Sink for FailingSink {
    fn deliver(&mut self, _emission: &Emission, _timeout: Duration) -> Result<(), BoxError> {
        Err(Box::new(std::io::Error::other("transport unreachable")))
    }
}

/// Sink that takes `delay` for every delivery before recording it.
#[derive(Debug, Clone, Default)]
pub struct SlowSink {
    pub inner: CaptureSink,
    delay: Duration,
}

impl SlowSink {
    pub fn new(delay: Duration) -> Self {
        Self {
            inner: CaptureSink::new(),
            delay,
        }
    }
}

impl Sink for SlowSink {
    fn deliver(&mut self, emission: &Emission, timeout: Duration) -> Result<(), BoxError> {
        std::thread::sleep(self.delay);
        self.inner.deliver(emission, timeout)
    }
}

/// Sink that announces each delivery on `started` and then waits for the
/// `gate` before recording it. Dropping the gate sender opens it for good.
pub struct GatedSink {
    pub inner: CaptureSink,
    started: xch::Sender<()>,
    gate: xch::Receiver<()>,
}

impl GatedSink {
    /// Returns the sink, a receiver of delivery-start signals and the gate sender.
    pub fn new() -> (Self, xch::Receiver<()>, xch::Sender<()>) {
        let (started_tx, started_rx) = xch::unbounded();
        let (gate_tx, gate_rx) = xch::unbounded();
        (
            Self {
                inner: CaptureSink::new(),
                started: started_tx,
                gate: gate_rx,
            },
            started_rx,
            gate_tx,
        )
    }
}

impl Sink for GatedSink {
    fn deliver(&mut self, emission: &Emission, timeout: Duration) -> Result<(), BoxError> {
        let _ = self.started.send(());
        let _ = self.gate.recv();
        self.inner.deliver(emission, timeout)
    }
}

/// A plausible snapshot for sink and fan-out tests.
pub fn snapshot(threshold: u8) -> StatusSnapshot {
    StatusSnapshot {
        timestamp: chrono::Utc::now(),
        level: crate::level::compute_water_level(
            [true, false, false],
            crate::level::LevelPolicy::Highest,
        ),
        foam: Some(crate::sampler::FoamState::Percent(10)),
        pump: false,
        shutdown: false,
        mode: ControlMode::Auto,
        sensors: Some([true, false, false]),
        threshold,
        hysteresis: 15,
        report_interval_min: 30,
        sensor_fault: false,
    }
}
