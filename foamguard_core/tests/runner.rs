use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use crossbeam_channel as xch;
use foamguard_core::mocks::{CaptureSink, RecordingPump, ScriptedFoam, ScriptedSwitches};
use foamguard_core::{
    CanonicalCommand, CommandChannel, CommandReply, ControlCfg, ControlCore, Emission, Inbound,
    OutboundCfg, OutboundChannel, OutboundHub, RunnerCfg, Runner, SamplerCfg, ScheduleCfg,
    build_core,
};
use foamguard_traits::{Clock, ManualClock};
use rstest::rstest;

fn core(pump: RecordingPump) -> ControlCore<ScriptedSwitches, ScriptedFoam, RecordingPump> {
    build_core(
        ScriptedSwitches::steady([true, true, false]),
        ScriptedFoam::analog(&[0]),
        pump,
        SamplerCfg::default(),
        ControlCfg::default(),
        ScheduleCfg::default(),
    )
    .expect("core build")
}

#[rstest]
fn duration_bounds_the_loop_on_a_manual_clock() {
    let clock = ManualClock::new();
    let mut core = core(RecordingPump::new());
    let hub = OutboundHub::new(OutboundCfg::default());
    let stats = Runner::new(clock.clone(), RunnerCfg::default())
        .with_duration(Some(Duration::from_secs(3)))
        .run(&mut core, &hub);
    assert_eq!(stats.iterations, 300);
    assert_eq!(stats.samples, 3);
    assert_eq!(clock.ms_since(clock.origin()), 3_000);
}

#[rstest]
fn raised_stop_flag_ends_before_first_iteration() {
    let mut core = core(RecordingPump::new());
    let hub = OutboundHub::new(OutboundCfg::default());
    let stop = Arc::new(AtomicBool::new(true));
    let stats = Runner::new(ManualClock::new(), RunnerCfg::default())
        .with_stop_flag(stop)
        .run(&mut core, &hub);
    assert_eq!(stats.iterations, 0);
}

#[rstest]
fn inbound_commands_and_operator_shutdown_are_applied() {
    let pump = RecordingPump::new();
    let mut core = core(pump.clone());
    let push = CaptureSink::new();
    let messaging = CaptureSink::new();
    let hub = OutboundHub::new(OutboundCfg::default())
        .with_sink(OutboundChannel::Push, push.clone())
        .with_sink(OutboundChannel::Messaging, messaging.clone());

    let (tx, rx) = xch::bounded(8);
    let (reply_tx, reply_rx) = xch::bounded(8);
    tx.send(Inbound::Command {
        channel: CommandChannel::Console,
        payload: "pump.on".into(),
        reply_to: Some(reply_tx.clone()),
    })
    .expect("send");
    tx.send(Inbound::Command {
        channel: CommandChannel::Console,
        payload: "make coffee".into(),
        reply_to: Some(reply_tx),
    })
    .expect("send");
    tx.send(Inbound::Shutdown(true)).expect("send");
    drop(tx);

    let stats = Runner::new(ManualClock::new(), RunnerCfg::default())
        .with_inbound(rx)
        .with_duration(Some(Duration::from_millis(100)))
        .run(&mut core, &hub);

    assert_eq!(stats.commands, 2);
    assert_eq!(stats.rejected, 1);
    assert_eq!(stats.transitions, 2);
    assert_eq!(pump.writes(), vec![true, false]);
    assert!(core.is_shutdown());

    assert_eq!(
        reply_rx.try_recv().expect("ack"),
        CommandReply::Ack(CanonicalCommand::TurnOn)
    );
    assert!(reply_rx.try_recv().expect("rejection").is_rejected());

    drop(hub);
    let pushed = push.emissions();
    assert_eq!(pushed.len(), 1, "one push for the first tick state");
    match &pushed[0] {
        Emission::Push(s) => assert!(s.shutdown && !s.pump),
        other => panic!("unexpected {other:?}"),
    }
    // Startup plus two transition notices.
    assert_eq!(messaging.emissions().len(), 3);
}

#[rstest]
fn held_button_toggles_shutdown_once() {
    let mut core = core(RecordingPump::new());
    let hub = OutboundHub::new(OutboundCfg::default());
    let pressed = Arc::new(AtomicBool::new(true));
    let reader = pressed.clone();
    Runner::new(ManualClock::new(), RunnerCfg::default())
        .with_button(move || reader.load(Ordering::Relaxed))
        .with_duration(Some(Duration::from_millis(500)))
        .run(&mut core, &hub);
    assert!(core.is_shutdown());
    assert!(pressed.load(Ordering::Relaxed));
}
