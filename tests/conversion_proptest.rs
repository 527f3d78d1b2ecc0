//! Properties of the voltage-to-code conversion and the sine wave plan.

use approx::assert_relative_eq;
use speaker_test_bench::dac::sine_wave_voltages;
use speaker_test_bench::{convert_analog_to_digital, sample_plan};

#[test]
fn test_conversion_endpoints() {
    for v_ref in [0.5, 2.5, 3.3, 5.0, 12.0] {
        assert_eq!(convert_analog_to_digital(0.0, v_ref), 0);
        assert_eq!(convert_analog_to_digital(v_ref, v_ref), 65535);
    }
}

#[test]
fn test_sequence_shape_is_preserved() {
    let voltages = vec![0.0, 1.25, 2.5, 3.75, 5.0];
    let codes = convert_analog_to_digital(&voltages, 5.0);
    assert_eq!(codes, vec![0, 16383, 32767, 49151, 65535]);
    assert_eq!(convert_analog_to_digital(voltages.as_slice(), 5.0).len(), 5);
    assert!(convert_analog_to_digital(Vec::<f64>::new(), 5.0).is_empty());
}

#[test]
fn test_sample_plan_couples_sample_count_to_v_ref() {
    let at_5v = sample_plan(5.0, 1.0, 2.0).unwrap();
    assert_eq!(at_5v.num_samples, 10);
    assert_relative_eq!(at_5v.delay_per_sample, 0.05);

    let at_2v = sample_plan(2.0, 1.0, 2.0).unwrap();
    assert_eq!(at_2v.num_samples, 4);
    assert_relative_eq!(at_2v.delay_per_sample, 0.125);
}

proptest::proptest! {
    /// Codes never decrease as the voltage rises.
    #[test]
    fn conversion_is_monotonic(
        a in -20.0f64..20.0,
        b in -20.0f64..20.0,
        v_ref in 0.01f64..50.0,
    ) {
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        proptest::prop_assert!(
            convert_analog_to_digital(lo, v_ref) <= convert_analog_to_digital(hi, v_ref)
        );
    }

    /// Full scale always maps to 65535, zero to 0.
    #[test]
    fn conversion_endpoints_hold_for_any_reference(v_ref in 1e-3f64..1e3) {
        proptest::prop_assert_eq!(convert_analog_to_digital(v_ref, v_ref), 65535);
        proptest::prop_assert_eq!(convert_analog_to_digital(0.0, v_ref), 0);
    }

    /// Sequence conversion is the scalar conversion applied elementwise.
    #[test]
    fn sequence_matches_scalar(
        voltages in proptest::collection::vec(-10.0f64..10.0, 0..64),
        v_ref in 0.1f64..10.0,
    ) {
        let codes = convert_analog_to_digital(&voltages, v_ref);
        proptest::prop_assert_eq!(codes.len(), voltages.len());
        for (v, c) in voltages.iter().zip(&codes) {
            proptest::prop_assert_eq!(*c, convert_analog_to_digital(*v, v_ref));
        }
    }

    /// Samples stay within 0..=v_ref, and the paced samples span one period
    /// of the wave regardless of the requested duration.
    #[test]
    fn sine_wave_stays_in_range(
        v_ref in 1.0f64..10.0,
        frequency in 1.0f64..50.0,
        duration in 1.0f64..5.0,
    ) {
        let plan = sample_plan(v_ref, duration, frequency).unwrap();
        proptest::prop_assert_eq!(plan.num_samples, (v_ref * duration * frequency).floor() as u64);
        let period = plan.delay_per_sample * plan.num_samples as f64;
        proptest::prop_assert!((period * frequency - 1.0).abs() < 1e-9);
        for v in sine_wave_voltages(plan, frequency, v_ref) {
            proptest::prop_assert!(v >= -1e-9 && v <= v_ref + 1e-9);
        }
    }
}
