//! End-to-end scenarios: the whole pedal driven through a virtual enclosure
//! and an in-memory settings store, audio and service loop interleaved.

use flick_config::{MemoryStore, ReverbKnobMode, RoutingMode, Settings};
use flick_pedal::{HostRig, Mode, PedalConfig, ServiceEvent};
use flick_platform::{Footswitch, Knob, VirtualPedal};

fn boot_with(hw: VirtualPedal, store: MemoryStore) -> HostRig<MemoryStore> {
    let Ok(rig) = HostRig::boot(PedalConfig::default(), hw, store);
    rig
}

fn boot(settings: Settings) -> HostRig<MemoryStore> {
    boot_with(VirtualPedal::new(), MemoryStore::with_record(settings))
}

fn idle(rig: &mut HostRig<MemoryStore>, ms: u32) {
    let Ok(()) = rig.idle_ms(ms);
}

/// Presses and releases a footswitch, then waits `gap` ms.
fn press(rig: &mut HostRig<MemoryStore>, footswitch: Footswitch, hold: u32, gap: u32) {
    rig.hw_mut().set_footswitch(footswitch, true);
    idle(rig, hold);
    rig.hw_mut().set_footswitch(footswitch, false);
    idle(rig, gap);
}

fn stereo() -> Settings {
    Settings {
        routing: RoutingMode::StereoInStereoOut,
        ..Settings::default()
    }
}

#[test]
fn bypassed_pedal_passes_guitar_band_unchanged() {
    let mut rig = boot(stereo());
    let block = 8;
    let tone = |n: usize| 0.5 * (2.0 * std::f32::consts::PI * 220.0 * n as f32 / 48000.0).sin();

    let mut max_err = 0.0f32;
    for b in 0..1200 {
        let left: Vec<f32> = (0..block).map(|i| tone(b * block + i)).collect();
        let right: Vec<f32> = left.iter().map(|s| -s).collect();
        let (mut ol, mut or) = (vec![0.0; block], vec![0.0; block]);
        let Ok(()) = rig.process_block(&left, &right, &mut ol, &mut or);
        if b > 600 {
            for i in 0..block {
                max_err = max_err.max((ol[i] - left[i]).abs());
                max_err = max_err.max((or[i] - right[i]).abs());
            }
        }
    }
    assert!(max_err < 1e-2, "max deviation {max_err}");
}

#[test]
fn mono_out_silences_second_output() {
    let mut rig = boot(Settings::default());
    let input = [0.3f32; 8];
    let (mut ol, mut or) = ([0.0f32; 8], [0.0f32; 8]);
    for _ in 0..100 {
        let Ok(()) = rig.process_block(&input, &input, &mut ol, &mut or);
    }
    assert!(or.iter().all(|&s| s == 0.0));
    assert!(ol.iter().all(|&s| s > 0.25));
}

#[test]
fn footswitch_a_enables_reverb_and_persists() {
    let mut rig = boot(Settings::default());
    press(&mut rig, Footswitch::A, 50, 50);
    assert!(!rig.engine().bypass().reverb);
    assert!(rig.drain_events().contains(&ServiceEvent::SettingsWritten));

    let store = rig.into_store();
    assert_eq!(store.record().map(|s| s.bypass.reverb), Some(false));

    let rig = boot_with(VirtualPedal::new(), store);
    assert!(!rig.engine().bypass().reverb);
}

#[test]
fn tap_tempo_sets_and_persists_the_delay() {
    let mut rig = boot(Settings::default());

    // Double press A: the first press is undone, then tap tempo starts.
    press(&mut rig, Footswitch::A, 50, 100);
    press(&mut rig, Footswitch::A, 50, 100);
    assert_eq!(rig.engine().mode(), Mode::TapTempo);
    assert!(rig.engine().bypass().reverb);
    assert!(!rig.engine().bypass().delay);

    for _ in 0..3 {
        press(&mut rig, Footswitch::B, 30, 470);
    }
    let tapped = rig.engine().controller().tap().tapped_samples();
    let Some(tapped) = tapped else {
        panic!("no tempo after three taps");
    };
    assert!((tapped - 24000.0).abs() < 100.0, "tapped {tapped}");

    press(&mut rig, Footswitch::A, 30, 50);
    assert_eq!(rig.engine().mode(), Mode::Normal);
    assert!((rig.engine().params().delay_samples - tapped).abs() < 1e-3);

    let record = rig.store().record().map(|s| s.tapped_delay_samples);
    assert_eq!(record, Some(tapped));
}

#[test]
fn tap_tempo_times_out_without_taps() {
    let mut rig = boot(Settings::default());
    press(&mut rig, Footswitch::A, 50, 100);
    press(&mut rig, Footswitch::A, 50, 100);
    assert_eq!(rig.engine().mode(), Mode::TapTempo);
    idle(&mut rig, 4100);
    assert_eq!(rig.engine().mode(), Mode::Normal);
}

#[test]
fn tapped_delay_yields_to_the_knob() {
    let mut settings = Settings::default();
    settings.tapped_delay_samples = 30000.0;
    let mut rig = boot(settings);
    idle(&mut rig, 20);
    assert!((rig.engine().params().delay_samples - 30000.0).abs() < 1e-3);

    rig.hw_mut().set_knob(Knob::K4, 0.9);
    idle(&mut rig, 20);
    assert!(rig.engine().controller().tap().tapped_samples().is_none());
    assert_eq!(rig.settings().tapped_delay_samples, 0.0);
    assert!(rig.engine().params().delay_samples > 30000.0);
}

#[test]
fn reverb_edit_saves_the_new_voicing() {
    let mut rig = boot(Settings::default());
    press(&mut rig, Footswitch::A, 2100, 50);
    assert_eq!(rig.engine().mode(), Mode::EditReverb);

    // Within the takeover threshold the stored decay holds.
    rig.hw_mut().set_knob(Knob::K3, 0.52);
    idle(&mut rig, 20);
    assert_eq!(rig.engine().params().plate.decay, 0.8);

    rig.hw_mut().set_knob(Knob::K3, 0.2);
    idle(&mut rig, 20);
    press(&mut rig, Footswitch::B, 50, 50);
    assert_eq!(rig.engine().mode(), Mode::Normal);
    assert_eq!(rig.store().record().map(|s| s.reverb.decay), Some(0.2));
}

#[test]
fn reverb_edit_cancel_restores_voicing() {
    let mut rig = boot(Settings::default());
    press(&mut rig, Footswitch::A, 2100, 50);
    rig.hw_mut().set_knob(Knob::K3, 0.1);
    idle(&mut rig, 20);
    press(&mut rig, Footswitch::A, 50, 50);
    assert_eq!(rig.engine().params().plate.decay, 0.8);
    assert_eq!(rig.settings().reverb.decay, 0.8);
}

#[test]
fn device_settings_edit_changes_knob_mode() {
    use flick_platform::{SwitchPosition, Toggle};

    let mut rig = boot(Settings::default());
    press(&mut rig, Footswitch::B, 2100, 50);
    assert_eq!(rig.engine().mode(), Mode::EditDeviceSettings);

    rig.hw_mut().set_toggle(Toggle::T1, SwitchPosition::Down);
    idle(&mut rig, 20);
    press(&mut rig, Footswitch::B, 50, 50);
    assert_eq!(
        rig.store().record().map(|s| s.reverb_knob_mode),
        Some(ReverbKnobMode::AllWet)
    );
}

#[test]
fn both_footswitches_enter_the_bootloader() {
    let mut rig = boot(Settings::default());
    rig.hw_mut().set_footswitch(Footswitch::A, true);
    rig.hw_mut().set_footswitch(Footswitch::B, true);
    idle(&mut rig, 2100);
    idle(&mut rig, 1000);

    assert!(!rig.service().audio_enabled());
    assert_eq!(rig.hw().bootloader_requests(), 1);
    let events = rig.drain_events();
    assert!(events.contains(&ServiceEvent::BootloaderSequence));
    assert!(events.contains(&ServiceEvent::BootloaderEntered));
}

fn boot_into_factory_reset() -> HostRig<MemoryStore> {
    let mut hw = VirtualPedal::new();
    hw.set_footswitch(Footswitch::B, true);
    let mut stored = stereo();
    stored.bypass.reverb = false;
    let mut rig = boot_with(hw, MemoryStore::with_record(stored));
    assert!(rig.service().in_factory_reset());
    rig.hw_mut().set_footswitch(Footswitch::B, false);
    idle(&mut rig, 20);
    rig
}

#[test]
fn factory_reset_restores_defaults() {
    let mut rig = boot_into_factory_reset();

    let input = [0.5f32; 8];
    let (mut ol, mut or) = ([1.0f32; 8], [1.0f32; 8]);
    let Ok(()) = rig.process_block(&input, &input, &mut ol, &mut or);
    assert_eq!(ol, [0.0; 8], "audio held during the reset");

    for value in [1.0, 0.0, 1.0, 0.0] {
        rig.hw_mut().set_knob(Knob::K1, value);
        idle(&mut rig, 600);
    }

    let events = rig.drain_events();
    assert!(events.contains(&ServiceEvent::FactoryResetComplete(Settings::default())));
    assert_eq!(rig.store().record(), Some(&Settings::default()));
    assert_eq!(rig.settings(), &Settings::default());
    assert!(rig.engine().bypass().reverb);
    assert!(rig.service().audio_enabled());
}

#[test]
fn factory_reset_cancelled_by_footswitch() {
    let mut rig = boot_into_factory_reset();
    press(&mut rig, Footswitch::A, 30, 30);

    assert!(rig.drain_events().contains(&ServiceEvent::FactoryResetCancelled));
    assert!(rig.service().audio_enabled());
    assert_eq!(rig.store().record().map(|s| s.bypass.reverb), Some(false));
}
