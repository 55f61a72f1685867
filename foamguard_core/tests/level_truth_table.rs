use foamguard_core::{LevelPolicy, compute_water_level};
use rstest::rstest;

#[rstest]
#[case::empty([false, false, false], 0)]
#[case::low([true, false, false], 25)]
#[case::low_mid([true, true, false], 50)]
#[case::mid_high([false, true, true], 75)]
#[case::full([true, true, true], 100)]
fn ladder_combinations_are_exact(#[case] bits: [bool; 3], #[case] pct: u8) {
    for policy in [LevelPolicy::Highest, LevelPolicy::Count, LevelPolicy::Reject] {
        assert_eq!(
            compute_water_level(bits, policy).map(|l| l.pct()),
            Some(pct),
            "{bits:?} under {policy:?}"
        );
    }
}

#[rstest]
#[case::mid_only([false, true, false], Some(50), Some(25), None)]
#[case::high_only([false, false, true], Some(75), Some(25), None)]
#[case::low_high([true, false, true], Some(75), Some(50), None)]
fn off_ladder_combinations_follow_policy(
    #[case] bits: [bool; 3],
    #[case] highest: Option<u8>,
    #[case] count: Option<u8>,
    #[case] reject: Option<u8>,
) {
    let level = |p| compute_water_level(bits, p).map(|l| l.pct());
    assert_eq!(level(LevelPolicy::Highest), highest);
    assert_eq!(level(LevelPolicy::Count), count);
    assert_eq!(level(LevelPolicy::Reject), reject);
}
