//! Closed loop against the simulated reservoir from foamguard_hardware.
use std::time::Duration;

use foamguard_core::{
    ControlCfg, ControlMode, FoamKind, OutboundCfg, OutboundHub, RunnerCfg, Runner, SamplerCfg,
    ScheduleCfg, build_core,
};
use foamguard_hardware::{SimFoamKind, SimReservoir};
use foamguard_traits::ManualClock;
use rstest::rstest;

#[rstest]
fn automatic_control_cycles_the_pump_around_threshold() {
    let res = SimReservoir::new().with_rates(4.0, 6.0);
    res.set_level_pct(60);
    let sampler = SamplerCfg {
        foam: FoamKind::Analog {
            window: 1,
            min_delta_pct: 3,
            adc_max: 4095,
        },
        ..SamplerCfg::default()
    };
    let mut core = build_core(
        res.switches(),
        res.foam_probe(SimFoamKind::Analog { adc_max: 4095 }),
        res.pump(),
        sampler,
        ControlCfg::default(),
        ScheduleCfg::default(),
    )
    .expect("core build");
    let hub = OutboundHub::new(OutboundCfg::default());

    let stats = Runner::new(ManualClock::new(), RunnerCfg::default())
        .with_duration(Some(Duration::from_secs(120)))
        .run(&mut core, &hub);

    assert_eq!(stats.samples, 120);
    assert!(stats.transitions >= 4, "pump cycled: {stats:?}");
    assert_eq!(core.mode(), ControlMode::Auto);
    assert_eq!(core.snapshot().level.map(|l| l.pct()), Some(50));
    assert_eq!(res.pump_on(), core.pump_on());
}

#[rstest]
fn switch_harness_fault_keeps_last_level() {
    let res = SimReservoir::new();
    res.set_level_pct(80);
    let mut core = build_core(
        res.switches(),
        res.foam_probe(SimFoamKind::Digital { present_at_pct: 50 }),
        res.pump(),
        SamplerCfg {
            foam: FoamKind::Digital {
                hold: Duration::from_millis(50),
            },
            ..SamplerCfg::default()
        },
        ControlCfg {
            threshold_pct: 50,
            hysteresis_pct: 0,
        },
        ScheduleCfg::default(),
    )
    .expect("core build");
    let t0 = std::time::Instant::now();
    core.tick(t0);
    res.set_switches_fault(true);
    core.tick(t0 + Duration::from_secs(1));
    let snap = core.snapshot();
    assert_eq!(snap.level.map(|l| l.pct()), Some(100));
    assert!(snap.sensor_fault);
}
