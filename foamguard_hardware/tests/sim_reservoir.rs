use std::time::Duration;

use foamguard_hardware::{SimFoamKind, SimReservoir};
use foamguard_traits::{FoamProbe, FoamRaw, LevelSwitches, Pump};
use rstest::rstest;

#[rstest]
#[case(0, [false, false, false])]
#[case(24, [false, false, false])]
#[case(25, [true, false, false])]
#[case(50, [true, true, false])]
#[case(75, [true, true, true])]
#[case(100, [true, true, true])]
fn switch_thresholds(#[case] level: u8, #[case] expected: [bool; 3]) {
    let res = SimReservoir::new();
    res.set_level_pct(level);
    assert_eq!(res.switches().read().unwrap(), expected);
}

#[rstest]
fn digital_probe_reports_presence_at_threshold() {
    let res = SimReservoir::new().with_rates(0.0, 0.0);
    let mut probe = res.foam_probe(SimFoamKind::Digital { present_at_pct: 40 });
    res.set_foam_pct(39.0);
    assert_eq!(probe.read(Duration::ZERO).unwrap(), FoamRaw::Digital(false));
    res.set_foam_pct(40.0);
    assert_eq!(probe.read(Duration::ZERO).unwrap(), FoamRaw::Digital(true));
}

#[rstest]
fn pump_and_probe_share_the_model() {
    let res = SimReservoir::new().with_rates(5.0, 5.0);
    res.set_foam_pct(50.0);
    let mut pump = res.pump();
    let mut probe = res.foam_probe(SimFoamKind::Analog { adc_max: 100 });
    pump.start().unwrap();
    assert_eq!(probe.read(Duration::ZERO).unwrap(), FoamRaw::Analog(45));
    pump.stop().unwrap();
    assert_eq!(probe.read(Duration::ZERO).unwrap(), FoamRaw::Analog(50));
    assert_eq!(res.pump_writes(), 2);
}
