use foamguard_core::error::{BuildError, CoreError};
use foamguard_core::mocks::{RecordingPump, ScriptedFoam, ScriptedSwitches};
use foamguard_core::{ControlCfg, DynCore, FoamKind, SamplerCfg};
use rstest::rstest;

#[rstest]
fn builder_missing_pump_yields_typed_build_error() {
    let err = DynCore::builder()
        .with_switches(ScriptedSwitches::steady([false; 3]))
        .with_foam_probe(ScriptedFoam::analog(&[0]))
        // missing with_pump()
        .try_build()
        .err()
        .expect("should fail with MissingPump");

    match err.downcast_ref::<BuildError>() {
        Some(BuildError::MissingPump) => {}
        other => panic!("expected MissingPump, got: {other:?}"),
    }
}

#[rstest]
fn builder_missing_switches_is_reported_first() {
    let err = DynCore::builder()
        .try_build()
        .err()
        .expect("should fail with MissingSwitches");
    assert!(matches!(
        err.downcast_ref::<BuildError>(),
        Some(BuildError::MissingSwitches)
    ));
}

#[rstest]
#[case::threshold(
    SamplerCfg::default(),
    ControlCfg { threshold_pct: 101, hysteresis_pct: 15 },
    "threshold"
)]
#[case::window(
    SamplerCfg {
        foam: FoamKind::Analog { window: 0, min_delta_pct: 3, adc_max: 4095 },
        ..SamplerCfg::default()
    },
    ControlCfg::default(),
    "window"
)]
#[case::interval(
    SamplerCfg { interval: std::time::Duration::ZERO, ..SamplerCfg::default() },
    ControlCfg::default(),
    "interval"
)]
fn invalid_runtime_config_is_rejected(
    #[case] sampler: SamplerCfg,
    #[case] control: ControlCfg,
    #[case] needle: &str,
) {
    let err = DynCore::builder()
        .with_switches(ScriptedSwitches::steady([false; 3]))
        .with_foam_probe(ScriptedFoam::analog(&[0]))
        .with_pump(RecordingPump::new())
        .with_sampler(sampler)
        .with_control(control)
        .build()
        .err()
        .expect("invalid config");
    match err.downcast_ref::<CoreError>() {
        Some(CoreError::Config(msg)) => assert!(msg.contains(needle), "{msg}"),
        other => panic!("expected CoreError::Config, got: {other:?}"),
    }
}

#[rstest]
fn config_file_settings_reach_the_core() {
    let cfg = foamguard_config::load_toml(
        "[control]\nthreshold_pct = 65\n[channels]\nreport_interval_min = 5",
    )
    .expect("parse");
    let core = DynCore::builder()
        .with_switches(ScriptedSwitches::steady([false; 3]))
        .with_foam_probe(ScriptedFoam::analog(&[0]))
        .with_pump(RecordingPump::new())
        .apply_config(&cfg)
        .build()
        .expect("build");
    let snap = core.snapshot();
    assert_eq!(snap.threshold, 65);
    assert_eq!(snap.report_interval_min, 5);
}
