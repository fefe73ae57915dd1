//! # Loveless Mod Delay: A Modulated Delay Core and AU/VST3/CLAP Plugin
//!
//! A reusable, real-time safe delay-line library and a plugin built on it
//! with [nih-plug](https://github.com/robbert-vdh/nih-plug). The same core
//! covers plain echoes, chorus, flanger and vibrato. The only differences
//! are delay time, modulation depth and feedback.
//!
//! The library half lives in [`dsp`]; the plugin shell in this file only
//! maps host parameters onto a [`ModulatedDelay`](dsp::ModulatedDelay).
//!
//! ## Signal Flow
//!
//! ```text
//! Input ──┬──────────────────────────────────────────── × (1 - mix) ───┐
//!         │                                                            │
//!         │    ┌──────────────────────────────────────────────────┐    │
//!         │    │                  FEEDBACK LOOP                   │    │
//!         │    │                                                  │    │
//!         └──►(+)──► [Delay Line] ─────┬──────► [Damping]         │    │
//!              ▲      ▲                │            │             │    │
//!              │      │                │            ▼             │    │
//!              │    [LFO] × depth      │     own ◄─ ping-pong ─► other ch
//!              │                       │            │             │    │
//!              └───────── × feedback ◄─│────────────┘             │    │
//!                                      │                               │
//!                                      └──── × mix ──────────────────►(+)──► Output
//! ```

pub mod dsp;
pub mod error;
mod params;

use std::num::NonZeroU32;
use std::sync::Arc;

use dsp::{BufferLayout, DelayLineConfig, Lagrange3rd, ModulatedDelay, ModulatedDelayConfig};
use nih_plug::prelude::*;
use params::{PluginParams, MAX_DELAY_MS, MAX_MOD_DEPTH_MS};

/// Glide time for delay-time changes. Long enough that moving the knob
/// sounds like tape speeding up rather than a click.
const DELAY_SMOOTHING_MS: f32 = 50.0;

/// Glide time for gains, modulation depth and stereo spread.
const GAIN_SMOOTHING_MS: f32 = 20.0;

/// The main plugin struct.
///
/// Parameters (`PluginParams`) are shared with the host via `Arc` and can
/// be read from any thread. The DSP core is owned by the audio thread and
/// only touched in `initialize()`, `reset()` and `process()`.
struct LovelessModDelay {
    params: Arc<PluginParams>,

    /// `None` until the host calls `initialize()` with a sample rate and
    /// channel count.
    core: Option<ModulatedDelay<Lagrange3rd>>,
}

impl Default for LovelessModDelay {
    fn default() -> Self {
        Self {
            params: Arc::new(PluginParams::default()),
            core: None,
        }
    }
}

impl LovelessModDelay {
    /// Hands the current host parameter values to the core. The core's
    /// own smoothers glide toward them sample by sample.
    fn push_params(&mut self, skip_smoothing: bool) {
        let Some(core) = self.core.as_mut() else {
            return;
        };
        let params = &self.params;
        let mix = params.mix.value();

        core.set_delay_ms(params.delay_time.value(), skip_smoothing);
        core.set_feedback(params.feedback.value(), skip_smoothing);
        core.set_cross_feedback(params.ping_pong.value(), skip_smoothing);
        core.set_feedforward(mix, skip_smoothing);
        core.set_dry(1.0 - mix, skip_smoothing);
        core.set_damping(params.damping_cutoff());
        core.set_lfo_rate(params.mod_rate.value());
        core.set_mod_depth_ms(params.mod_depth.value(), skip_smoothing);
        core.set_stereo_spread(params.spread_cycles(), skip_smoothing);
    }
}

impl Plugin for LovelessModDelay {
    const NAME: &'static str = "Loveless Mod Delay";
    const VENDOR: &'static str = "Loveless Audio";
    const URL: &'static str = "";
    const EMAIL: &'static str = "steve.loveless@gmail.com";
    const VERSION: &'static str = env!("CARGO_PKG_VERSION");

    // Stereo first: the host picks the first layout that fits the track.
    const AUDIO_IO_LAYOUTS: &'static [AudioIOLayout] = &[
        AudioIOLayout {
            main_input_channels: NonZeroU32::new(2),
            main_output_channels: NonZeroU32::new(2),
            aux_input_ports: &[],
            aux_output_ports: &[],
            names: PortNames::const_default(),
        },
        AudioIOLayout {
            main_input_channels: NonZeroU32::new(1),
            main_output_channels: NonZeroU32::new(1),
            aux_input_ports: &[],
            aux_output_ports: &[],
            names: PortNames::const_default(),
        },
    ];

    const MIDI_INPUT: MidiConfig = MidiConfig::None;

    // Blocks are split at automation points, so pushing parameters once
    // per block still lands every change on the right sample.
    const SAMPLE_ACCURATE_AUTOMATION: bool = true;

    type SysExMessage = ();
    type BackgroundTask = ();

    fn params(&self) -> Arc<dyn Params> {
        self.params.clone()
    }

    /// Allocates the delay buffers for this sample rate and channel count.
    ///
    /// Returning `false` tells the host the configuration is unusable.
    fn initialize(
        &mut self,
        audio_io_layout: &AudioIOLayout,
        buffer_config: &BufferConfig,
        _context: &mut impl InitContext<Self>,
    ) -> bool {
        let num_channels = audio_io_layout
            .main_input_channels
            .map(|c| c.get() as usize)
            .unwrap_or(2);

        let config = ModulatedDelayConfig {
            delay: DelayLineConfig {
                num_channels,
                sample_rate: buffer_config.sample_rate,
                // Room for the longest delay swung by the deepest modulation.
                max_delay_ms: MAX_DELAY_MS + MAX_MOD_DEPTH_MS,
                smoothing_ms: DELAY_SMOOTHING_MS,
                layout: BufferLayout::SampleMajor,
            },
            gain_smoothing_ms: GAIN_SMOOTHING_MS,
        };

        // Reuse the existing core when the host re-initializes.
        let prepared = match self.core.take() {
            Some(mut core) => core.prepare(config).map(|()| core),
            None => ModulatedDelay::new(config),
        };

        match prepared {
            Ok(core) => {
                self.core = Some(core);
                self.push_params(true);
                true
            }
            Err(err) => {
                nih_warn!("Cannot initialize delay core: {err}");
                false
            }
        }
    }

    /// Clears the delay history so stale echoes don't play after a stop.
    fn reset(&mut self) {
        if let Some(core) = self.core.as_mut() {
            core.reset();
        }
    }

    fn process(
        &mut self,
        buffer: &mut Buffer,
        _aux: &mut AuxiliaryBuffers,
        _context: &mut impl ProcessContext<Self>,
    ) -> ProcessStatus {
        self.push_params(false);

        let Some(core) = self.core.as_mut() else {
            return ProcessStatus::Normal;
        };
        core.process_block(buffer.as_slice());

        // Keep the host calling process() after the input goes silent,
        // until the repeats have decayed to -60 dB.
        ProcessStatus::Tail(core.tail_samples())
    }
}

// ─────────────────────────────────────────────────────────────────────
// Plugin format trait implementations
// ─────────────────────────────────────────────────────────────────────

impl ClapPlugin for LovelessModDelay {
    const CLAP_ID: &'static str = "com.loveless-audio.loveless-mod-delay";
    const CLAP_DESCRIPTION: Option<&'static str> =
        Some("A modulated delay: echo, chorus and flanger with ping-pong feedback");
    const CLAP_MANUAL_URL: Option<&'static str> = None;
    const CLAP_SUPPORT_URL: Option<&'static str> = None;
    const CLAP_FEATURES: &'static [ClapFeature] = &[
        ClapFeature::AudioEffect,
        ClapFeature::Stereo,
        ClapFeature::Mono,
        ClapFeature::Delay,
        ClapFeature::Chorus,
        ClapFeature::Flanger,
    ];
}

impl Vst3Plugin for LovelessModDelay {
    // Must be exactly 16 bytes and unique across all VST3 plugins.
    const VST3_CLASS_ID: [u8; 16] = *b"LvlssModDelay001";

    const VST3_SUBCATEGORIES: &'static [Vst3SubCategory] = &[
        Vst3SubCategory::Fx,
        Vst3SubCategory::Delay,
        Vst3SubCategory::Modulation,
    ];
}

// ─────────────────────────────────────────────────────────────────────
// Export macros
// ─────────────────────────────────────────────────────────────────────
//
// nih_export_clap! exports `clap_entry` for CLAP hosts and
// nih_export_vst3! exports `GetPluginFactory` for VST3 hosts.
// clap_wrapper re-exports the CLAP entry point as an AUv2 component so
// Logic Pro can load it.

nih_export_clap!(LovelessModDelay);
nih_export_vst3!(LovelessModDelay);
clap_wrapper::export_auv2!();
