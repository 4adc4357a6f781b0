//! The four-mode controller.
//!
//! [`ModeController`] is the pedal's whole control context: the operating
//! mode, bypass flags, the live parameter mirror, soft-takeover captures,
//! tap tempo state and the committed settings record. It is owned by the
//! audio-block driver and touched once per block; the service loop only sees
//! its [`CommitFlags`] and the committed [`Settings`].
//!
//! ```text
//!            long A                      double A
//!   EditReverb <------- Normal -------------------> TapTempo
//!       |  press A/B     ^  ^   press A / timeout      |
//!       +----------------+  +--------------------------+
//!                        |
//!         press A/B      | long B
//!   EditDeviceSettings <-+
//! ```
//!
//! Both footswitches held past the hold threshold request the bootloader
//! from any mode.

use flick_config::{
    BypassState, Polarity, ReverbKnobMode, ReverbSettings, RoutingMode, Settings,
};
use flick_effects::{ReverbKind, TremoloKind, tremolo};
use flick_platform::{
    Footswitch, Gesture, Knob, KnobCapture, SwitchCapture, SwitchPosition, Toggle,
};

use crate::controls::{
    self, ControlSnapshot, DelayTiming, KnobScale, TREMOLO_SPEED, delay_time_scale,
};
use crate::{CommitFlags, PedalConfig, TapTempo};

/// Operating mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    /// Playing; footswitches toggle effects.
    #[default]
    Normal,
    /// Footswitch B taps the delay tempo.
    TapTempo,
    /// Knobs 2-6 and the toggles edit the plate voicing.
    EditReverb,
    /// The toggles edit routing, polarity and the reverb knob mode.
    EditDeviceSettings,
}

/// Side effect a gesture asks of the audio chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlAction {
    /// Flush the active reverb tail.
    ClearReverb,
}

/// Suppression state after leaving tap tempo with footswitch A.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GestureGuard {
    Open,
    SuppressNext,
}

/// Parameters the audio chain reads every block.
///
/// Fields not driven by the current mode keep their last value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChainParams {
    /// Active reverb algorithm.
    pub reverb_kind: ReverbKind,
    /// Active tremolo algorithm.
    pub tremolo_kind: TremoloKind,
    /// Tremolo rate in Hz.
    pub tremolo_speed_hz: f32,
    /// Tremolo depth, 0..1.
    pub tremolo_depth: f32,
    /// Delay target in samples, subdivision applied.
    pub delay_samples: f32,
    /// Delay feedback, 0..1.
    pub delay_feedback: f32,
    /// Delay wet share, 0..1.
    pub delay_mix: f32,
    /// Reverb wet level from knob 1.
    pub reverb_wet: f32,
    /// Dry level through the reverb stage.
    pub reverb_dry: f32,
    /// Live plate voicing in control units.
    pub plate: ReverbSettings,
    /// Live routing.
    pub routing: RoutingMode,
    /// Live polarity.
    pub polarity: Polarity,
    /// Live knob 1 dry behavior.
    pub reverb_knob_mode: ReverbKnobMode,
}

impl ChainParams {
    fn from_settings(settings: &Settings) -> Self {
        Self {
            reverb_kind: ReverbKind::Plate,
            tremolo_kind: TremoloKind::Sine,
            tremolo_speed_hz: tremolo::DEFAULT_SPEED_HZ,
            tremolo_depth: tremolo::DEFAULT_DEPTH,
            delay_samples: 0.0,
            delay_feedback: 0.0,
            delay_mix: 0.0,
            reverb_wet: 0.5,
            reverb_dry: 1.0,
            plate: settings.reverb,
            routing: settings.routing,
            polarity: settings.polarity,
            reverb_knob_mode: settings.reverb_knob_mode,
        }
    }
}

/// Dry level through the reverb stage for a knob mode and wet level.
pub fn reverb_dry(mode: ReverbKnobMode, wet: f32) -> f32 {
    match mode {
        ReverbKnobMode::AllDry => 1.0,
        ReverbKnobMode::DryWetMix => 1.0 - wet,
        ReverbKnobMode::AllWet => 0.0,
    }
}

/// Knobs captured in reverb edit mode, in order: pre-delay, decay,
/// diffusion, input high-cut, tank high-cut.
const EDIT_KNOBS: [Knob; 5] = [Knob::K2, Knob::K3, Knob::K4, Knob::K5, Knob::K6];

/// Mode state machine and control context.
#[derive(Debug)]
pub struct ModeController {
    mode: Mode,
    guard: GestureGuard,
    bypass: BypassState,
    params: ChainParams,
    saved: Settings,
    flags: CommitFlags,
    tap: TapTempo,
    knob_captures: [KnobCapture; 5],
    switch_captures: [SwitchCapture; 3],
    delay_knob: KnobCapture,
    delay_scale: KnobScale,
    takeover_threshold: f32,
}

impl ModeController {
    /// Controller in normal mode with `settings` as the committed record.
    pub fn new(config: &PedalConfig, settings: &Settings) -> Self {
        let threshold = config.takeover_threshold;
        let mut controller = Self {
            mode: Mode::Normal,
            guard: GestureGuard::Open,
            bypass: settings.bypass,
            params: ChainParams::from_settings(settings),
            saved: *settings,
            flags: CommitFlags::new(),
            tap: TapTempo::new(config),
            knob_captures: [KnobCapture::new(0.0, threshold); 5],
            switch_captures: [SwitchCapture::default(); 3],
            delay_knob: KnobCapture::new(0.0, threshold),
            delay_scale: delay_time_scale(config.min_delay_samples(), config.max_delay()),
            takeover_threshold: threshold,
        };
        controller.tap.restore(settings.tapped_delay_samples);
        controller
    }

    /// Replaces the committed record and everything derived from it, and
    /// returns to normal mode. Pending flags are left alone.
    pub fn load(&mut self, settings: &Settings) {
        self.saved = *settings;
        self.bypass = settings.bypass;
        self.params.plate = settings.reverb;
        self.params.routing = settings.routing;
        self.params.polarity = settings.polarity;
        self.params.reverb_knob_mode = settings.reverb_knob_mode;
        self.tap.restore(settings.tapped_delay_samples);
        self.release_captures();
        self.delay_knob.reset();
        self.guard = GestureGuard::Open;
        self.set_mode(Mode::Normal);
    }

    /// Current mode.
    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Live bypass flags.
    pub fn bypass(&self) -> BypassState {
        self.bypass
    }

    /// Parameters for the audio chain.
    pub fn params(&self) -> &ChainParams {
        &self.params
    }

    /// The committed settings record.
    pub fn settings(&self) -> &Settings {
        &self.saved
    }

    /// Requests for the service loop.
    pub fn flags(&self) -> &CommitFlags {
        &self.flags
    }

    /// Tap tempo state.
    pub fn tap(&self) -> &TapTempo {
        &self.tap
    }

    /// Tap tempo state, for the indicator flash countdown.
    pub fn tap_mut(&mut self) -> &mut TapTempo {
        &mut self.tap
    }

    /// True while the next double or long press will be swallowed.
    pub fn guard_armed(&self) -> bool {
        self.guard == GestureGuard::SuppressNext
    }

    /// Handles one classified gesture.
    pub fn handle_gesture(
        &mut self,
        footswitch: Footswitch,
        gesture: Gesture,
        snap: &ControlSnapshot,
    ) -> Option<ControlAction> {
        #[cfg(feature = "tracing")]
        tracing::debug!(?footswitch, ?gesture, mode = ?self.mode, "gesture");

        match gesture {
            Gesture::Normal => self.normal_press(footswitch, snap),
            Gesture::Double => self.double_press(footswitch, snap),
            Gesture::Long => {
                self.long_press(footswitch, snap);
                None
            }
        }
    }

    fn take_guard(&mut self) -> bool {
        let armed = self.guard_armed();
        self.guard = GestureGuard::Open;
        armed
    }

    fn normal_press(
        &mut self,
        footswitch: Footswitch,
        snap: &ControlSnapshot,
    ) -> Option<ControlAction> {
        if self.mode == Mode::TapTempo {
            match footswitch {
                Footswitch::A => {
                    self.exit_tap_tempo(snap);
                    self.guard = GestureGuard::SuppressNext;
                }
                Footswitch::B => self.register_tap(snap.now_ms),
            }
            return None;
        }

        self.guard = GestureGuard::Open;

        match self.mode {
            Mode::EditReverb => {
                match footswitch {
                    Footswitch::B => self.commit_reverb(),
                    Footswitch::A => self.params.plate = self.saved.reverb,
                }
                self.release_captures();
                self.set_mode(Mode::Normal);
                None
            }
            Mode::EditDeviceSettings => {
                match footswitch {
                    Footswitch::B => self.commit_device(),
                    Footswitch::A => {
                        self.params.routing = self.saved.routing;
                        self.params.polarity = self.saved.polarity;
                        self.params.reverb_knob_mode = self.saved.reverb_knob_mode;
                    }
                }
                for capture in &mut self.switch_captures {
                    capture.reset();
                }
                self.set_mode(Mode::Normal);
                None
            }
            Mode::Normal | Mode::TapTempo => {
                let action = match footswitch {
                    Footswitch::A => {
                        self.bypass.reverb = !self.bypass.reverb;
                        self.bypass.reverb.then_some(ControlAction::ClearReverb)
                    }
                    Footswitch::B => {
                        self.bypass.tremolo = !self.bypass.tremolo;
                        None
                    }
                };
                self.commit_bypass();
                action
            }
        }
    }

    fn double_press(
        &mut self,
        footswitch: Footswitch,
        snap: &ControlSnapshot,
    ) -> Option<ControlAction> {
        if self.take_guard() {
            return None;
        }
        match self.mode {
            Mode::TapTempo => {
                if footswitch == Footswitch::B {
                    self.register_tap(snap.now_ms);
                }
                None
            }
            Mode::EditReverb | Mode::EditDeviceSettings => None,
            Mode::Normal => {
                // Toggling again undoes what the first press of the pair did.
                let action = self.normal_press(footswitch, snap);
                match footswitch {
                    Footswitch::A => self.enter_tap_tempo(snap),
                    Footswitch::B => {
                        self.bypass.delay = !self.bypass.delay;
                        self.commit_bypass();
                    }
                }
                action
            }
        }
    }

    fn long_press(&mut self, footswitch: Footswitch, snap: &ControlSnapshot) {
        if self.take_guard() {
            return;
        }
        if snap.both_footswitches() {
            #[cfg(feature = "tracing")]
            tracing::info!("both footswitches held, requesting bootloader");
            self.flags.request_bootloader();
            return;
        }
        if self.mode != Mode::Normal {
            return;
        }
        match footswitch {
            Footswitch::A => self.enter_edit_reverb(snap),
            Footswitch::B => self.enter_device_settings(snap),
        }
    }

    fn enter_edit_reverb(&mut self, snap: &ControlSnapshot) {
        let plate = self.params.plate;
        let frozen = [
            plate.pre_delay,
            plate.decay,
            plate.diffusion,
            plate.input_high_cut,
            plate.tank_high_cut,
        ];
        for ((capture, knob), value) in self.knob_captures.iter_mut().zip(EDIT_KNOBS).zip(frozen) {
            capture.capture(snap.knob(knob), value);
        }
        let positions = [plate.mod_speed_pos, plate.mod_depth_pos, plate.mod_shape_pos];
        self.capture_switches(snap, positions.map(usize::from));

        self.bypass.reverb = false;
        self.set_mode(Mode::EditReverb);
    }

    fn enter_device_settings(&mut self, snap: &ControlSnapshot) {
        self.capture_switches(
            snap,
            [
                self.params.reverb_knob_mode.index(),
                self.params.polarity.index(),
                self.params.routing.index(),
            ],
        );
        self.set_mode(Mode::EditDeviceSettings);
    }

    fn capture_switches(&mut self, snap: &ControlSnapshot, frozen: [usize; 3]) {
        for ((capture, toggle), index) in self.switch_captures.iter_mut().zip(Toggle::ALL).zip(frozen) {
            capture.capture(snap.toggle(toggle), SwitchPosition::from_index(index));
        }
    }

    fn release_captures(&mut self) {
        for capture in &mut self.knob_captures {
            capture.reset();
        }
        for capture in &mut self.switch_captures {
            capture.reset();
        }
    }

    fn enter_tap_tempo(&mut self, snap: &ControlSnapshot) {
        let knob = snap.knob(Knob::K4);
        self.delay_knob.capture(knob, knob);

        // Keep the current delay as the beat so entering does not jump.
        let timing = DelayTiming::from_position(snap.toggle(Toggle::T3));
        self.tap
            .begin(self.params.delay_samples / timing.multiplier(), snap.now_ms);

        if self.bypass.delay {
            self.bypass.delay = false;
            self.commit_bypass();
        }
        self.set_mode(Mode::TapTempo);
    }

    fn exit_tap_tempo(&mut self, snap: &ControlSnapshot) {
        let knob_moved = !self.delay_knob.is_frozen();
        self.delay_knob.reset();

        if knob_moved || self.tap.tapped_samples().is_none() {
            self.tap.clear();
        } else {
            self.tap.set_knob_baseline(Some(snap.knob(Knob::K4)));
        }
        self.commit_bypass();
        self.set_mode(Mode::Normal);
    }

    fn register_tap(&mut self, now_ms: u32) {
        if self.tap.register_tap(now_ms) {
            self.commit_bypass();
        }
    }

    /// Maps this block's control readings onto the chain parameters.
    pub fn update_block(&mut self, snap: &ControlSnapshot) {
        let wet = snap.knob(Knob::K1);
        self.params.reverb_wet = wet;

        match self.mode {
            Mode::Normal | Mode::TapTempo => {
                self.params.reverb_kind = controls::reverb_kind(snap.toggle(Toggle::T1));
                self.params.tremolo_kind = controls::tremolo_kind(snap.toggle(Toggle::T2));
                self.params.tremolo_speed_hz = TREMOLO_SPEED.denormalize(snap.knob(Knob::K2));
                self.params.tremolo_depth = snap.knob(Knob::K3).clamp(0.0, 1.0);

                let timing = DelayTiming::from_position(snap.toggle(Toggle::T3));
                let base = self.base_delay(snap);
                self.params.delay_samples = base * timing.multiplier();
                self.params.delay_feedback = snap.knob(Knob::K5);
                self.params.delay_mix = controls::delay_mix(snap.knob(Knob::K6));
                self.params.reverb_dry = reverb_dry(self.params.reverb_knob_mode, wet);

                if self.mode == Mode::TapTempo && self.tap.timed_out(snap.now_ms) {
                    #[cfg(feature = "tracing")]
                    tracing::debug!("tap tempo timed out");
                    self.exit_tap_tempo(snap);
                }
            }
            Mode::EditReverb => {
                self.params.reverb_dry = 1.0;
                let [pre_delay, decay, diffusion, input_cut, tank_cut] =
                    core::array::from_fn(|i| {
                        self.knob_captures[i].process(snap.knob(EDIT_KNOBS[i]))
                    });
                let [speed, depth, shape] = self.process_switches(snap);

                let plate = &mut self.params.plate;
                plate.pre_delay = pre_delay;
                plate.decay = decay;
                plate.diffusion = diffusion;
                plate.input_high_cut = input_cut;
                plate.tank_high_cut = tank_cut;
                plate.mod_speed_pos = speed.index() as u8;
                plate.mod_depth_pos = depth.index() as u8;
                plate.mod_shape_pos = shape.index() as u8;
            }
            Mode::EditDeviceSettings => {
                let [knob_mode, polarity, routing] = self.process_switches(snap);
                self.params.reverb_knob_mode = ReverbKnobMode::from_index(knob_mode.index());
                self.params.reverb_dry = reverb_dry(self.params.reverb_knob_mode, wet);
                self.params.polarity = Polarity::from_index(polarity.index());
                self.params.routing = RoutingMode::from_index(routing.index());
            }
        }
    }

    fn process_switches(&mut self, snap: &ControlSnapshot) -> [SwitchPosition; 3] {
        core::array::from_fn(|i| self.switch_captures[i].process(snap.toggles[i]))
    }

    /// Beat length before the subdivision: the knob, or the tapped value
    /// while it still holds.
    fn base_delay(&mut self, snap: &ControlSnapshot) -> f32 {
        let knob = snap.knob(Knob::K4);
        let from_knob = self.delay_scale.denormalize(knob);

        if self.mode == Mode::TapTempo {
            self.delay_knob.process(knob);
            if !self.delay_knob.is_frozen() {
                return from_knob;
            }
            return self.tap.tapped_samples().unwrap_or(from_knob);
        }

        if self.tap.tapped_samples().is_some() {
            match self.tap.knob_baseline() {
                None => self.tap.set_knob_baseline(Some(knob)),
                Some(baseline) if (knob - baseline).abs() > self.takeover_threshold => {
                    #[cfg(feature = "tracing")]
                    tracing::debug!("delay knob moved, dropping tapped tempo");
                    self.tap.clear();
                    self.commit_bypass();
                }
                Some(_) => {}
            }
        }
        self.tap.tapped_samples().unwrap_or(from_knob)
    }

    fn commit_reverb(&mut self) {
        self.saved.reverb = self.params.plate;
        self.flags.request_save();
        #[cfg(feature = "tracing")]
        tracing::info!("reverb voicing committed");
    }

    fn commit_device(&mut self) {
        self.saved.routing = self.params.routing;
        self.saved.polarity = self.params.polarity;
        self.saved.reverb_knob_mode = self.params.reverb_knob_mode;
        self.flags.request_save();
        #[cfg(feature = "tracing")]
        tracing::info!(routing = ?self.saved.routing, polarity = ?self.saved.polarity, "device settings committed");
    }

    fn commit_bypass(&mut self) {
        self.saved.bypass = self.bypass;
        self.saved.tapped_delay_samples = self.tap.persisted_samples();
        self.flags.request_save();
    }

    fn set_mode(&mut self, mode: Mode) {
        #[cfg(feature = "tracing")]
        if mode != self.mode {
            tracing::info!(from = ?self.mode, to = ?mode, "mode change");
        }
        self.mode = mode;
    }
}
