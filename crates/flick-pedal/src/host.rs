//! Host-side harness that runs the whole pedal against a [`VirtualPedal`].
//!
//! On the device the audio interrupt and the service loop run side by side.
//! [`HostRig`] interleaves them deterministically instead: the clock is
//! derived from the number of samples processed, and the service loop is
//! polled every `service_interval_ms` of audio. The offline renderer and
//! the scenario tests both drive the pedal through it.

use flick_config::{Settings, SettingsStore};
use flick_platform::VirtualPedal;

use crate::{PedalConfig, PedalEngine, ServiceEvent, ServiceLoop};

/// Engine, service loop, virtual enclosure and settings store in one place.
#[derive(Debug)]
pub struct HostRig<S: SettingsStore> {
    engine: PedalEngine,
    service: ServiceLoop,
    hw: VirtualPedal,
    store: S,
    samples: u64,
    next_service_ms: u32,
    events: Vec<ServiceEvent>,
}

impl<S: SettingsStore> HostRig<S> {
    /// Boots the pedal with the controls as `hw` currently reads them.
    pub fn boot(config: PedalConfig, mut hw: VirtualPedal, mut store: S) -> Result<Self, S::Error> {
        hw.set_now_ms(0);
        let (service, settings) = ServiceLoop::boot(&config, &mut hw, &mut store)?;
        Ok(Self {
            engine: PedalEngine::new(config, &settings),
            service,
            hw,
            store,
            samples: 0,
            next_service_ms: 0,
            events: Vec::new(),
        })
    }

    /// The virtual enclosure, for setting controls between blocks.
    pub fn hw(&self) -> &VirtualPedal {
        &self.hw
    }

    /// Mutable access to the virtual enclosure.
    pub fn hw_mut(&mut self) -> &mut VirtualPedal {
        &mut self.hw
    }

    /// The audio engine.
    pub fn engine(&self) -> &PedalEngine {
        &self.engine
    }

    /// The service loop.
    pub fn service(&self) -> &ServiceLoop {
        &self.service
    }

    /// The settings store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Consumes the rig, returning the store.
    pub fn into_store(self) -> S {
        self.store
    }

    /// Service events other than [`ServiceEvent::Idle`] since the last call.
    pub fn drain_events(&mut self) -> Vec<ServiceEvent> {
        core::mem::take(&mut self.events)
    }

    /// Milliseconds of audio processed so far.
    pub fn elapsed_ms(&self) -> u32 {
        let sr = f64::from(self.engine.config().sample_rate);
        (self.samples as f64 * 1000.0 / sr) as u32
    }

    /// Processes one block and then runs the service loop for every interval
    /// the block crossed.
    ///
    /// Output is silent while the service loop holds audio, during the
    /// factory reset and the bootloader sequence.
    pub fn process_block(
        &mut self,
        in_left: &[f32],
        in_right: &[f32],
        out_left: &mut [f32],
        out_right: &mut [f32],
    ) -> Result<(), S::Error> {
        self.hw.set_now_ms(self.elapsed_ms());

        if self.service.audio_enabled() {
            self.engine
                .process_block(&mut self.hw, in_left, in_right, out_left, out_right);
        } else {
            out_left.fill(0.0);
            out_right.fill(0.0);
        }

        let frames = in_left
            .len()
            .min(in_right.len())
            .min(out_left.len())
            .min(out_right.len());
        self.samples += frames as u64;

        let now = self.elapsed_ms();
        let interval = self.engine.config().service_interval_ms.max(1);
        while (now.wrapping_sub(self.next_service_ms) as i32) >= 0 {
            self.hw.set_now_ms(self.next_service_ms);
            self.service_once()?;
            self.next_service_ms = self.next_service_ms.wrapping_add(interval);
        }
        self.hw.set_now_ms(now);
        Ok(())
    }

    fn service_once(&mut self) -> Result<(), S::Error> {
        let event = self.service.poll(
            self.engine.flags(),
            self.engine.settings(),
            &mut self.hw,
            &mut self.store,
        )?;
        match event {
            ServiceEvent::FactoryResetComplete(settings) => {
                self.engine.restore(&settings);
                self.engine.resume(&mut self.hw);
            }
            ServiceEvent::FactoryResetCancelled => self.engine.resume(&mut self.hw),
            _ => {}
        }
        if event != ServiceEvent::Idle {
            self.events.push(event);
        }
        Ok(())
    }

    /// Runs `ms` of silence through the pedal, block by block.
    pub fn idle_ms(&mut self, ms: u32) -> Result<(), S::Error> {
        let block = self.engine.config().block_size.max(1);
        let silence = vec![0.0f32; block];
        let mut out_l = vec![0.0f32; block];
        let mut out_r = vec![0.0f32; block];
        let target = self.elapsed_ms().saturating_add(ms);
        while self.elapsed_ms() < target {
            self.process_block(&silence, &silence, &mut out_l, &mut out_r)?;
        }
        Ok(())
    }

    /// The committed settings record.
    pub fn settings(&self) -> &Settings {
        self.engine.settings()
    }
}
