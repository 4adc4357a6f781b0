//! The audio-block driver.
//!
//! [`PedalEngine`] is called once per audio block. It reads the controls,
//! classifies footswitch gestures, lets the [`ModeController`] react, drives
//! the LEDs, pushes parameters into the effects and then runs the fixed
//! signal path over every sample:
//!
//! ```text
//! in -> routing -> notches -> delay -> tremolo -> limit -> reverb -> polarity -> out
//!                                                    |
//!                                 reverb always fed, even when bypassed
//! ```

#[cfg(not(feature = "std"))]
use alloc::boxed::Box;

use flick_config::{BypassState, RoutingMode, Settings};
use flick_core::{Biquad, DelayLine, SampleStorage, hard_limit, mono_sum, peaking_eq_coefficients};
use flick_effects::{DelayEffect, Reverb, ReverbBank, ReverbKind, TremoloBank};
use flick_platform::{Footswitch, GestureDetector, Led, PedalHardware};

use crate::controls::{ControlSnapshot, PlateParameters};
use crate::leds::{IndicatorInput, Indicators};
use crate::mode::{ChainParams, ControlAction, Mode, ModeController};
use crate::{CommitFlags, PedalConfig};

/// Centers of the two always-on resonance notches, in Hz.
pub const NOTCH_FREQUENCIES_HZ: [f32; 2] = [6020.0, 12278.0];
/// Notch depth in dB.
pub const NOTCH_GAIN_DB: f32 = -30.0;
/// Notch Q.
pub const NOTCH_Q: f32 = 40.0;

/// Wet delay attenuation, keeps high feedback from clipping.
pub const DELAY_WET_GAIN: f32 = 0.333;
/// Dry makeup through an active delay.
pub const DELAY_DRY_MAKEUP: f32 = 1.66;
/// Makeup after an active tremolo.
pub const TREMOLO_MAKEUP: f32 = 1.2;
/// Drive into the reverb: -18 dB, -20 dB, then x8.
pub const REVERB_INPUT_GAIN: f32 = 0.125_892_54 * 0.1 * 8.0;
/// Output boost on the hall so it sits with the other reverbs.
pub const HALL_OUTPUT_GAIN: f32 = 4.0;

/// Hall decay used by the pedal.
pub const HALL_DECAY: f32 = 0.95;
/// Spring decay used by the pedal.
pub const SPRING_DECAY: f32 = 0.7;
/// Spring internal mix used by the pedal.
pub const SPRING_MIX: f32 = 1.0;
/// Spring damping cutoff used by the pedal, in Hz.
pub const SPRING_DAMPING_HZ: f32 = 7000.0;

/// Reverb input scaling and dry return for a routing mode.
///
/// Mono-out sums two channels, so it drives the reverb harder and returns
/// less dry.
pub fn reverb_scales(routing: RoutingMode) -> (f32, f32) {
    if routing.mono_out() {
        (5.0, 0.2)
    } else {
        (2.5, 0.4)
    }
}

/// Pedal control and audio state.
///
/// Generic over the delay memory like [`DelayEffect`]: heap buffers on a
/// host, arena slices on a device.
///
/// # Example
///
/// ```rust
/// use flick_config::Settings;
/// use flick_pedal::{PedalConfig, PedalEngine};
/// use flick_platform::VirtualPedal;
///
/// let mut engine = PedalEngine::new(PedalConfig::default(), &Settings::default());
/// let mut hw = VirtualPedal::new();
/// let input = [0.1f32; 8];
/// let (mut left, mut right) = ([0.0f32; 8], [0.0f32; 8]);
/// engine.process_block(&mut hw, &input, &input, &mut left, &mut right);
/// assert_eq!(right, [0.0; 8]);
/// ```
#[derive(Debug)]
pub struct PedalEngine<S: SampleStorage = Box<[f32]>> {
    config: PedalConfig,
    controller: ModeController,
    detectors: [GestureDetector; 2],
    indicators: Indicators,
    delay: DelayEffect<S>,
    tremolos: TremoloBank,
    reverbs: ReverbBank,
    notches: [[Biquad; 2]; 2],
    applied_plate: Option<PlateParameters>,
    tremolo_lfo: f32,
}

impl PedalEngine {
    /// Engine with heap-allocated delay lines.
    pub fn new(config: PedalConfig, settings: &Settings) -> Self {
        // One slot more than the longest delay so the full range is reachable.
        let capacity = config.max_delay_samples + 1;
        Self::from_delay_lines(
            config,
            settings,
            DelayLine::new(capacity),
            DelayLine::new(capacity),
        )
    }
}

impl<S: SampleStorage> PedalEngine<S> {
    /// Engine over two pre-allocated delay lines.
    pub fn from_delay_lines(
        config: PedalConfig,
        settings: &Settings,
        left: DelayLine<S>,
        right: DelayLine<S>,
    ) -> Self {
        let sr = config.sample_rate;

        let mut reverbs = ReverbBank::new(sr);
        reverbs.hall_mut().set_decay(HALL_DECAY);
        let spring = reverbs.spring_mut();
        spring.set_decay(SPRING_DECAY);
        spring.set_mix(SPRING_MIX);
        spring.set_damping(SPRING_DAMPING_HZ);

        let notch = |hz: f32| {
            Biquad::from_coefficients(peaking_eq_coefficients(hz, NOTCH_GAIN_DB, NOTCH_Q, sr))
        };
        let notches = [0, 1].map(|_| NOTCH_FREQUENCIES_HZ.map(notch));

        #[cfg(feature = "tracing")]
        tracing::info!(
            sample_rate = sr,
            block_size = config.block_size,
            max_delay = config.max_delay_samples,
            "pedal engine ready"
        );

        Self {
            controller: ModeController::new(&config, settings),
            detectors: [GestureDetector::new(config.gesture), GestureDetector::new(config.gesture)],
            indicators: Indicators::new(config.block_rate()),
            delay: DelayEffect::from_lines(sr, left, right),
            tremolos: TremoloBank::new(sr),
            reverbs,
            notches,
            applied_plate: None,
            tremolo_lfo: 0.0,
            config,
        }
    }

    /// Loads a settings record, as after a factory reset. Every reverb
    /// algorithm is emptied, not only the selected one.
    pub fn restore(&mut self, settings: &Settings) {
        self.controller.load(settings);
        self.reverbs.clear_all();
        self.applied_plate = None;
        for detector in &mut self.detectors {
            detector.reset();
        }
    }

    /// Takes up the footswitch levels after audio was held, so a switch still
    /// down from the service loop's sequence is not reported on release.
    pub fn resume<H: PedalHardware + ?Sized>(&mut self, hw: &mut H) {
        hw.poll();
        for footswitch in Footswitch::ALL {
            self.detectors[footswitch.index()].sync(hw.footswitch_pressed(footswitch));
        }
    }

    /// Operating parameters.
    pub fn config(&self) -> &PedalConfig {
        &self.config
    }

    /// The control context.
    pub fn controller(&self) -> &ModeController {
        &self.controller
    }

    /// Requests for the service loop.
    pub fn flags(&self) -> &CommitFlags {
        self.controller.flags()
    }

    /// The committed settings record.
    pub fn settings(&self) -> &Settings {
        self.controller.settings()
    }

    /// Current mode.
    pub fn mode(&self) -> Mode {
        self.controller.mode()
    }

    /// Live bypass flags.
    pub fn bypass(&self) -> BypassState {
        self.controller.bypass()
    }

    /// Parameters applied in the last block.
    pub fn params(&self) -> &ChainParams {
        self.controller.params()
    }

    /// Processes one audio block.
    ///
    /// Control work happens once at the top; the sample loop then runs over
    /// the shortest of the four buffers.
    pub fn process_block<H: PedalHardware + ?Sized>(
        &mut self,
        hw: &mut H,
        in_left: &[f32],
        in_right: &[f32],
        out_left: &mut [f32],
        out_right: &mut [f32],
    ) {
        hw.poll();
        let snap = ControlSnapshot::read(hw);

        for footswitch in Footswitch::ALL {
            let pressed = snap.footswitches[footswitch.index()];
            let Some(gesture) = self.detectors[footswitch.index()].update(pressed, snap.now_ms)
            else {
                continue;
            };
            if let Some(ControlAction::ClearReverb) =
                self.controller.handle_gesture(footswitch, gesture, &snap)
            {
                self.reverbs.active().clear();
            }
        }

        self.update_leds(hw);
        self.controller.update_block(&snap);
        self.apply_params();
        self.run_samples(in_left, in_right, out_left, out_right);
    }

    fn update_leds<H: PedalHardware + ?Sized>(&mut self, hw: &mut H) {
        let mode = self.controller.mode();
        let tap_flash = mode == Mode::TapTempo && self.controller.tap_mut().tick_flash();
        let input = IndicatorInput {
            mode,
            bypass: self.controller.bypass(),
            tap_flash,
            tempo_ms: self.controller.tap().tempo_ms(),
            tremolo_lfo: self.tremolo_lfo,
        };
        let (left, right) = self.indicators.update(&input);
        hw.set_led(Led::Left, left);
        hw.set_led(Led::Right, right);
        hw.update_leds();
    }

    fn apply_params(&mut self) {
        let params = *self.controller.params();

        self.tremolos.select(params.tremolo_kind);
        let tremolo = self.tremolos.active();
        tremolo.set_speed(params.tremolo_speed_hz);
        tremolo.set_depth(params.tremolo_depth);

        self.delay.set_delay_time(params.delay_samples);
        self.delay.set_feedback(params.delay_feedback);

        if params.reverb_kind != self.reverbs.kind() {
            self.applied_plate = None;
        }
        self.reverbs.select(params.reverb_kind);
        if params.reverb_kind == ReverbKind::Plate {
            let plate = PlateParameters::from_settings(&params.plate);
            if self.applied_plate != Some(plate) {
                plate.apply(self.reverbs.active());
                self.applied_plate = Some(plate);
            }
        }
    }

    fn run_samples(
        &mut self,
        in_left: &[f32],
        in_right: &[f32],
        out_left: &mut [f32],
        out_right: &mut [f32],
    ) {
        let params = *self.controller.params();
        let bypass = self.controller.bypass();
        let mono_in = params.routing.mono_in();
        let mono_out = params.routing.mono_out();
        let (pol_left, pol_right) = params.polarity.gains();
        let (dry_scale, reverse_scale) = reverb_scales(params.routing);
        let reverb_gain = if params.reverb_kind == ReverbKind::Hall {
            HALL_OUTPUT_GAIN
        } else {
            1.0
        };
        let mix = params.delay_mix;

        let [notch_left, notch_right] = &mut self.notches;
        let delay = &mut self.delay;
        let tremolo = self.tremolos.active();
        let reverb: &mut dyn Reverb = self.reverbs.active();

        let frames = in_left
            .len()
            .min(in_right.len())
            .min(out_left.len())
            .min(out_right.len());

        for i in 0..frames {
            let mut l = in_left[i];
            let mut r = if mono_in { in_left[i] } else { in_right[i] };

            for notch in notch_left.iter_mut() {
                l = notch.process(l);
            }
            for notch in notch_right.iter_mut() {
                r = notch.process(r);
            }

            if !bypass.delay {
                let (wet_l, wet_r) = delay.process_sample(l, r);
                l = mix * wet_l * DELAY_WET_GAIN + (1.0 - mix) * l * DELAY_DRY_MAKEUP;
                r = mix * wet_r * DELAY_WET_GAIN + (1.0 - mix) * r * DELAY_DRY_MAKEUP;
            }

            if !bypass.tremolo {
                let (trem_l, trem_r) = tremolo.process_sample(l, r);
                l = trem_l * TREMOLO_MAKEUP;
                r = trem_r * TREMOLO_MAKEUP;
            }

            let send_l = hard_limit(l) * dry_scale;
            let send_r = hard_limit(r) * dry_scale;
            let (rev_l, rev_r) =
                reverb.process_sample(send_l * REVERB_INPUT_GAIN, send_r * REVERB_INPUT_GAIN);

            if !bypass.reverb {
                let dry = params.reverb_dry * reverse_scale;
                l = send_l * dry + rev_l * reverb_gain * params.reverb_wet;
                r = send_r * dry + rev_r * reverb_gain * params.reverb_wet;
            }

            if mono_out {
                out_left[i] = mono_sum(l, r) * pol_left;
                out_right[i] = 0.0;
            } else {
                out_left[i] = l * pol_left;
                out_right[i] = r * pol_right;
            }
        }

        if !bypass.tremolo {
            self.tremolo_lfo = self.tremolos.last_lfo_value();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flick_config::{Polarity, ReverbKnobMode};
    use flick_core::SampleArena;
    use flick_platform::{Knob, SwitchPosition, Toggle, VirtualPedal};

    const BLOCK: usize = 8;

    fn all_bypassed_stereo() -> Settings {
        Settings {
            routing: RoutingMode::StereoInStereoOut,
            ..Settings::default()
        }
    }

    fn run(
        engine: &mut PedalEngine,
        hw: &mut VirtualPedal,
        blocks: usize,
        input: impl Fn(usize) -> (f32, f32),
    ) -> (Vec<f32>, Vec<f32>) {
        let mut out = (Vec::new(), Vec::new());
        for b in 0..blocks {
            let (il, ir): (Vec<f32>, Vec<f32>) = (0..BLOCK).map(|i| input(b * BLOCK + i)).unzip();
            let mut ol = [0.0; BLOCK];
            let mut or = [0.0; BLOCK];
            engine.process_block(hw, &il, &ir, &mut ol, &mut or);
            out.0.extend_from_slice(&ol);
            out.1.extend_from_slice(&or);
        }
        out
    }

    #[test]
    fn bypassed_chain_passes_low_frequencies() {
        let mut engine = PedalEngine::new(PedalConfig::default(), &all_bypassed_stereo());
        let mut hw = VirtualPedal::new();
        let (l, r) = run(&mut engine, &mut hw, 100, |_| (0.5, -0.25));
        let last = l.len() - 1;
        assert!((l[last] - 0.5).abs() < 1e-3);
        assert!((r[last] + 0.25).abs() < 1e-3);
    }

    #[test]
    fn mono_out_sums_to_channel_one() {
        let mut engine = PedalEngine::new(PedalConfig::default(), &Settings::default());
        let mut hw = VirtualPedal::new();
        let (l, r) = run(&mut engine, &mut hw, 100, |_| (0.4, 0.9));
        assert!(r.iter().all(|&s| s == 0.0));
        // Mono-in copies the left input to both channels before the sum.
        assert!((l[l.len() - 1] - 0.4).abs() < 1e-3);
    }

    #[test]
    fn polarity_flips_one_channel() {
        let settings = Settings {
            polarity: Polarity::InvertRight,
            ..all_bypassed_stereo()
        };
        let mut engine = PedalEngine::new(PedalConfig::default(), &settings);
        let mut hw = VirtualPedal::new();
        let (l, r) = run(&mut engine, &mut hw, 100, |_| (0.5, 0.5));
        let last = l.len() - 1;
        assert!(l[last] > 0.49);
        assert!(r[last] < -0.49);
    }

    #[test]
    fn all_dry_reverb_returns_scaled_dry_and_wet() {
        let mut settings = all_bypassed_stereo();
        settings.bypass.reverb = false;
        settings.reverb_knob_mode = ReverbKnobMode::AllDry;
        let mut engine = PedalEngine::new(PedalConfig::default(), &settings);
        let mut hw = VirtualPedal::new();
        hw.set_knob(Knob::K1, 0.0);
        let (l, _) = run(&mut engine, &mut hw, 100, |_| (0.1, 0.1));
        // Wet at zero leaves the limited, scaled dry path: 0.1 * 2.5 * 0.4.
        assert!((l[l.len() - 1] - 0.1).abs() < 1e-3);
    }

    #[test]
    fn delay_echoes_after_the_knob_time() {
        let mut settings = all_bypassed_stereo();
        settings.bypass.delay = false;
        let mut engine = PedalEngine::new(PedalConfig::default(), &settings);
        let mut hw = VirtualPedal::new();
        hw.set_knob(Knob::K4, 0.0);
        hw.set_knob(Knob::K5, 0.0);
        hw.set_knob(Knob::K6, 1.0);
        // Let the delay time glide down to the minimum before the impulse.
        run(&mut engine, &mut hw, 12_000, |_| (0.0, 0.0));
        let (l, _) = run(&mut engine, &mut hw, 400, |n| {
            if n == 0 { (1.0, 1.0) } else { (0.0, 0.0) }
        });
        let peak = l
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.abs().total_cmp(&b.1.abs()))
            .map(|(i, _)| i);
        let min_delay = PedalConfig::default().min_delay_samples() as usize;
        let Some(peak) = peak else {
            panic!("no output");
        };
        assert!(peak.abs_diff(min_delay) <= 2, "echo at {peak}");
    }

    #[test]
    fn plate_voicing_is_pushed_when_selected() {
        let mut settings = all_bypassed_stereo();
        settings.reverb.decay = 0.3;
        let mut engine = PedalEngine::new(PedalConfig::default(), &settings);
        let mut hw = VirtualPedal::new();
        hw.set_toggle(Toggle::T1, SwitchPosition::Up);
        run(&mut engine, &mut hw, 1, |_| (0.0, 0.0));
        assert_eq!(engine.reverbs.kind(), ReverbKind::Spring);
        assert!(engine.applied_plate.is_none());

        hw.set_toggle(Toggle::T1, SwitchPosition::Middle);
        run(&mut engine, &mut hw, 1, |_| (0.0, 0.0));
        assert_eq!(engine.reverbs.plate_mut().decay(), 0.3);
    }

    #[test]
    fn pedal_voicing_of_spring_and_hall() {
        let mut engine = PedalEngine::new(PedalConfig::default(), &Settings::default());
        assert_eq!(engine.reverbs.hall_mut().decay(), HALL_DECAY);
        let spring = engine.reverbs.spring_mut();
        assert_eq!(spring.mix(), SPRING_MIX);
        assert!((spring.damping() - SPRING_DAMPING_HZ).abs() < 1e-3);
    }

    #[test]
    fn arena_backed_engine_runs() {
        let config = PedalConfig {
            max_delay_samples: 4800,
            ..PedalConfig::default()
        };
        let mut pool = vec![0.0f32; 2 * 4801];
        let mut arena = SampleArena::new(&mut pool);
        let (Some(a), Some(b)) = (arena.take(4801), arena.take(4801)) else {
            panic!("pool too small");
        };
        let mut engine = PedalEngine::from_delay_lines(
            config,
            &Settings::default(),
            DelayLine::from_storage(a),
            DelayLine::from_storage(b),
        );
        let mut hw = VirtualPedal::new();
        let input = [0.2f32; BLOCK];
        let (mut l, mut r) = ([0.0; BLOCK], [0.0; BLOCK]);
        engine.process_block(&mut hw, &input, &input, &mut l, &mut r);
        assert!(l.iter().all(|s| s.is_finite()));
    }

    #[test]
    fn footswitch_a_toggles_reverb_and_lights_left_led() {
        let mut engine = PedalEngine::new(PedalConfig::default(), &Settings::default());
        let mut hw = VirtualPedal::new();
        hw.set_footswitch(Footswitch::A, true);
        run(&mut engine, &mut hw, 1, |_| (0.0, 0.0));
        hw.advance_ms(50);
        hw.set_footswitch(Footswitch::A, false);
        run(&mut engine, &mut hw, 2, |_| (0.0, 0.0));
        assert!(!engine.bypass().reverb);
        assert!(engine.flags().save_pending());
        assert_eq!(hw.led(Led::Left), 1.0);
    }

    #[test]
    fn restore_returns_to_normal_mode() {
        let mut engine = PedalEngine::new(PedalConfig::default(), &Settings::default());
        let mut hw = VirtualPedal::new();
        hw.set_footswitch(Footswitch::B, true);
        run(&mut engine, &mut hw, 1, |_| (0.0, 0.0));
        hw.advance_ms(2001);
        run(&mut engine, &mut hw, 1, |_| (0.0, 0.0));
        assert_eq!(engine.mode(), Mode::EditDeviceSettings);

        engine.restore(&Settings::default());
        assert_eq!(engine.mode(), Mode::Normal);
    }

    #[test]
    fn restore_empties_every_reverb() {
        let mut settings = all_bypassed_stereo();
        settings.bypass.reverb = false;
        let mut engine = PedalEngine::new(PedalConfig::default(), &settings);
        let mut hw = VirtualPedal::new();
        for position in [SwitchPosition::Up, SwitchPosition::Middle, SwitchPosition::Down] {
            hw.set_toggle(Toggle::T1, position);
            run(&mut engine, &mut hw, 200, |_| (0.5, 0.5));
        }

        engine.restore(&Settings::default());
        for kind in [ReverbKind::Spring, ReverbKind::Plate, ReverbKind::Hall] {
            engine.reverbs.select(kind);
            for _ in 0..100 {
                assert_eq!(engine.reverbs.active().process_sample(0.0, 0.0), (0.0, 0.0));
            }
        }
    }
}
