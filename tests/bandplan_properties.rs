use proptest::prelude::*;

use adiflog::{
    bandplan::BandPlan,
    normalize::parse_signal_report,
    types::{Band, Frequency, Mode},
};

fn band_strategy() -> impl Strategy<Value = Band> {
    prop::sample::select(Band::ALL.to_vec())
}

fn mode_strategy() -> impl Strategy<Value = Mode> {
    prop::sample::select(Mode::ALL.to_vec())
}

#[test]
fn boundaries_are_inclusive_on_the_upper_edge() {
    let plan = BandPlan::global();

    assert_eq!(plan.classify(Frequency::from_khz(14_350)), Band::B20m);
    assert_eq!(plan.classify(Frequency::from_hz(14_350_001).expect("hz")), Band::B17m);
    assert_eq!(plan.classify(Frequency::from_khz(136)), Band::B160m);
    assert_eq!(plan.classify(Frequency::from_khz(29_700)), Band::B10m);
    assert_eq!(plan.classify_strict(Frequency::from_khz(29_701)), None);
    assert_eq!(plan.classify(Frequency::from_khz(50_125)), Band::B10m);
}

#[test]
fn default_frequencies_are_whole_kilohertz() {
    let plan = BandPlan::global();
    for band in Band::ALL {
        for mode in Mode::ALL {
            assert_eq!(plan.default_frequency(band, mode).hz() % 1_000, 0, "{band} {mode}");
        }
    }
}

#[test]
fn sub_kilohertz_text_is_rounded() {
    assert_eq!(Frequency::from_mhz_str("14.074512").map(|f| f.hz()), Some(14_075_000));
    assert_eq!(Frequency::from_mhz_str("7.0475").map(|f| f.hz()), Some(7_048_000));
    assert_eq!(Frequency::from_mhz_str("7.0474999").map(|f| f.hz()), Some(7_047_000));
    assert_eq!(Frequency::from_mhz_str("0.0004"), None);
}

#[test]
fn conventional_frequencies() {
    let plan = BandPlan::global();

    assert_eq!(plan.default_frequency(Band::B20m, Mode::FT8).hz(), 14_074_000);
    assert_eq!(plan.default_frequency(Band::B40m, Mode::CW).hz(), 7_030_000);
    assert_eq!(plan.default_frequency(Band::B20m, Mode::OLIVIA).hz(), 14_100_000);
}

#[test]
fn ranges_tile_the_plan_without_gaps() {
    let plan = BandPlan::global();
    let mut next = 1u64;
    for band in Band::ALL {
        let range = plan.range(band);
        assert_eq!(*range.start(), next, "{band}");
        next = range.end() + 1;
    }
    assert_eq!(next - 1, plan.upper_limit().hz());
}

proptest! {
    #[test]
    fn default_frequency_lies_in_its_band(band in band_strategy(), mode in mode_strategy()) {
        let plan = BandPlan::global();
        let freq = plan.default_frequency(band, mode);
        prop_assert_eq!(plan.classify_strict(freq), Some(band));
        prop_assert!(plan.range(band).contains(&freq.hz()));
    }

    #[test]
    fn classification_is_monotonic(a in 1u64..40_000_000, b in 1u64..40_000_000) {
        let plan = BandPlan::global();
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        let lo = plan.classify(Frequency::from_hz(lo).expect("hz"));
        let hi = plan.classify(Frequency::from_hz(hi).expect("hz"));
        prop_assert!((lo as usize) <= (hi as usize));
    }

    #[test]
    fn strict_and_lenient_agree_inside_the_plan(hz in 1u64..=29_700_000) {
        let plan = BandPlan::global();
        let freq = Frequency::from_hz(hz).expect("hz");
        prop_assert_eq!(plan.classify_strict(freq), Some(plan.classify(freq)));
        prop_assert!(plan.range(plan.classify(freq)).contains(&hz));
    }

    #[test]
    fn mhz_text_rounds_to_the_kilohertz(hz in 1u64..100_000_000) {
        let text = format!("{}.{:06}", hz / 1_000_000, hz % 1_000_000);
        let rounded = (hz + 500) / 1_000 * 1_000;
        let expected = (rounded > 0).then_some(rounded);
        prop_assert_eq!(Frequency::from_mhz_str(&text).map(|f| f.hz()), expected);
    }

    #[test]
    fn parsed_frequency_survives_its_own_rendering(hz in 500u64..100_000_000) {
        let text = format!("{}.{:06}", hz / 1_000_000, hz % 1_000_000);
        let freq = Frequency::from_mhz_str(&text).expect("positive");
        prop_assert_eq!(Frequency::from_mhz_str(&freq.to_mhz_string()), Some(freq));
    }

    #[test]
    fn signal_report_sign_and_magnitude(value in 0i32..100_000, zeros in 0usize..3, negative in any::<bool>()) {
        let text = format!("{}{}{}", if negative { "-" } else { "" }, "0".repeat(zeros), value);
        let expected = if negative { -value } else { value };
        prop_assert_eq!(parse_signal_report(Some(&text)), expected);
    }
}
