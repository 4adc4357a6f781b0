//! Property-based tests for tap tempo, control mapping and the engine.

use flick_config::{RoutingMode, Settings};
use flick_pedal::controls::{delay_mix, delay_time_scale};
use flick_pedal::{PedalConfig, PedalEngine, TapTempo};
use flick_platform::{Knob, VirtualPedal};
use proptest::prelude::*;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Evenly spaced taps give that spacing in samples, clamped to the
    /// delay range.
    #[test]
    fn even_taps_give_their_interval(
        start in 0u32..1_000_000,
        interval in 1u32..6000,
        taps in 2usize..8,
    ) {
        let config = PedalConfig::default();
        let mut tap = TapTempo::new(&config);
        for i in 0..taps {
            tap.register_tap(start + interval * i as u32);
        }
        let expected = (interval as f32 * 48.0)
            .clamp(config.min_delay_samples(), config.max_delay());
        let Some(got) = tap.tapped_samples() else {
            return Err(TestCaseError::fail("no estimate"));
        };
        prop_assert!((got - expected).abs() < 0.05, "{} vs {}", got, expected);
    }

    /// However the taps fall, the estimate stays inside the delay range.
    #[test]
    fn tap_estimate_stays_in_range(gaps in prop::collection::vec(0u32..10_000, 1..10)) {
        let config = PedalConfig::default();
        let mut tap = TapTempo::new(&config);
        let mut now = 0u32;
        tap.register_tap(now);
        for gap in gaps {
            now += gap;
            tap.register_tap(now);
        }
        let Some(got) = tap.tapped_samples() else {
            return Err(TestCaseError::fail("no estimate"));
        };
        prop_assert!(got >= config.min_delay_samples());
        prop_assert!(got <= config.max_delay());
    }

    /// The delay time knob is monotonic across its travel.
    #[test]
    fn delay_knob_is_monotonic(a in 0.0f32..=1.0, b in 0.0f32..=1.0) {
        let scale = delay_time_scale(2400.0, 96000.0);
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        prop_assert!(scale.denormalize(lo) <= scale.denormalize(hi));
    }

    /// Delay mix lands on whole percent and never exceeds the knob.
    #[test]
    fn delay_mix_is_whole_percent(knob in -0.5f32..1.5) {
        let mix = delay_mix(knob);
        prop_assert!((0.0..=1.0).contains(&mix));
        let percent = mix * 100.0;
        prop_assert!((percent - percent.round()).abs() < 1e-3);
        prop_assert!(mix <= knob.clamp(0.0, 1.0) + 1e-6);
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(12))]

    /// With every effect engaged and any knob setting, full-scale input
    /// never produces NaN or runaway output.
    #[test]
    fn engine_output_stays_bounded(
        knobs in prop::array::uniform6(0.0f32..=1.0),
        amplitude in 0.0f32..=1.0,
    ) {
        let mut settings = Settings {
            routing: RoutingMode::StereoInStereoOut,
            ..Settings::default()
        };
        settings.bypass.reverb = false;
        settings.bypass.tremolo = false;
        settings.bypass.delay = false;
        let mut engine = PedalEngine::new(PedalConfig::default(), &settings);
        let mut hw = VirtualPedal::new();
        for (knob, value) in Knob::ALL.iter().zip(knobs) {
            hw.set_knob(*knob, value);
        }

        let (mut l, mut r) = ([0.0f32; 8], [0.0f32; 8]);
        for b in 0..600 {
            let input: Vec<f32> = (0..8)
                .map(|i| if (b * 8 + i) % 96 < 48 { amplitude } else { -amplitude })
                .collect();
            engine.process_block(&mut hw, &input, &input, &mut l, &mut r);
            for s in l.iter().chain(r.iter()) {
                prop_assert!(s.is_finite());
                prop_assert!(s.abs() < 50.0, "sample {}", s);
            }
        }
    }
}
