//! # Plugin Parameters
//!
//! The knobs the host sees. Each parameter has a stable string ID
//! (`#[id = "..."]`) used to save and recall presets. Once published,
//! never change these IDs or existing presets will break.
//!
//! ## No Host-Side Smoothing
//!
//! None of these parameters use nih-plug's smoothers. The plugin reads the
//! plain values once per block and hands them to the DSP core, whose own
//! smoothed parameters do the gliding per sample. Smoothing twice would
//! only make the controls feel sluggish.

use nih_plug::prelude::*;

/// Damping knob position that turns the feedback filter off entirely.
pub const DAMPING_OFF_HZ: f32 = 20000.0;

/// Longest delay the knob can reach. The core is prepared with this plus
/// the maximum modulation depth.
pub const MAX_DELAY_MS: f32 = 2000.0;

/// Deepest modulation excursion, in milliseconds.
pub const MAX_MOD_DEPTH_MS: f32 = 10.0;

/// All user-facing parameters for the Loveless Mod Delay plugin.
#[derive(Params)]
pub struct PluginParams {
    /// **Delay Time**: the base distance between the input and its echo.
    ///
    /// A few milliseconds with modulation gives chorus and flanger sounds;
    /// hundreds of milliseconds give distinct echoes.
    #[id = "delay"]
    pub delay_time: FloatParam,

    /// **Feedback**: how much of each echo is fed back in.
    ///
    /// Negative values invert every other repeat, which gives flangers
    /// their hollow sound. Capped at ±95% so repeats always decay.
    #[id = "fdbk"]
    pub feedback: FloatParam,

    /// **Ping-Pong**: how much of the feedback crosses to the other
    /// channel. 100% bounces each repeat between left and right.
    #[id = "pong"]
    pub ping_pong: FloatParam,

    /// **Mix**: dry/wet balance.
    #[id = "mix"]
    pub mix: FloatParam,

    /// **Damping**: lowpass cutoff in the feedback path. Each repeat
    /// passes through it again, so the echoes get darker as they fade.
    /// Fully open (20 kHz) switches the filter off.
    #[id = "damp"]
    pub damping: FloatParam,

    /// **Mod Rate**: LFO speed.
    #[id = "mrate"]
    pub mod_rate: FloatParam,

    /// **Mod Depth**: how far the LFO swings the delay time either way.
    #[id = "mdepth"]
    pub mod_depth: FloatParam,

    /// **Stereo Spread**: LFO phase difference between left and right.
    /// 180° sweeps the channels in opposite directions.
    #[id = "spread"]
    pub stereo_spread: FloatParam,
}

impl Default for PluginParams {
    fn default() -> Self {
        Self {
            delay_time: FloatParam::new(
                "Delay Time",
                350.0,
                FloatRange::Skewed {
                    min: 1.0,
                    max: MAX_DELAY_MS,
                    // Most of the knob travel goes to short delays, where
                    // chorus and flanger live.
                    factor: FloatRange::skew_factor(-2.0),
                },
            )
            .with_unit(" ms")
            .with_step_size(0.1),

            feedback: FloatParam::new(
                "Feedback",
                0.40,
                FloatRange::Linear {
                    min: -0.95,
                    max: 0.95,
                },
            )
            .with_unit("%")
            .with_value_to_string(formatters::v2s_f32_percentage(1))
            .with_string_to_value(formatters::s2v_f32_percentage()),

            ping_pong: FloatParam::new("Ping-Pong", 0.0, FloatRange::Linear { min: 0.0, max: 1.0 })
                .with_unit("%")
                .with_value_to_string(formatters::v2s_f32_percentage(0))
                .with_string_to_value(formatters::s2v_f32_percentage()),

            mix: FloatParam::new("Mix", 0.50, FloatRange::Linear { min: 0.0, max: 1.0 })
                .with_unit("%")
                .with_value_to_string(formatters::v2s_f32_percentage(1))
                .with_string_to_value(formatters::s2v_f32_percentage()),

            damping: FloatParam::new(
                "Damping",
                8000.0,
                FloatRange::Skewed {
                    min: 200.0,
                    max: DAMPING_OFF_HZ,
                    factor: FloatRange::skew_factor(-2.0),
                },
            )
            .with_unit(" Hz")
            .with_step_size(1.0),

            mod_rate: FloatParam::new(
                "Mod Rate",
                0.5,
                FloatRange::Skewed {
                    min: 0.01,
                    max: 10.0,
                    factor: FloatRange::skew_factor(-1.5),
                },
            )
            .with_unit(" Hz")
            .with_step_size(0.01),

            mod_depth: FloatParam::new(
                "Mod Depth",
                0.0,
                FloatRange::Linear {
                    min: 0.0,
                    max: MAX_MOD_DEPTH_MS,
                },
            )
            .with_unit(" ms")
            .with_step_size(0.01),

            stereo_spread: FloatParam::new(
                "Stereo Spread",
                90.0,
                FloatRange::Linear {
                    min: 0.0,
                    max: 180.0,
                },
            )
            .with_unit("°")
            .with_step_size(1.0),
        }
    }
}

impl PluginParams {
    /// The damping cutoff, or `None` when the knob is fully open.
    pub fn damping_cutoff(&self) -> Option<f32> {
        let cutoff = self.damping.value();
        (cutoff < DAMPING_OFF_HZ).then_some(cutoff)
    }

    /// Stereo spread converted from degrees to LFO cycles.
    pub fn spread_cycles(&self) -> f32 {
        self.stereo_spread.value() / 360.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_enable_damping() {
        let params = PluginParams::default();
        assert_eq!(params.damping_cutoff(), Some(8000.0));
    }

    #[test]
    fn test_default_spread_is_quarter_cycle() {
        let params = PluginParams::default();
        assert!((params.spread_cycles() - 0.25).abs() < 1e-6);
    }

    #[test]
    fn test_feedback_range_is_symmetric_and_below_unity() {
        let params = PluginParams::default();
        assert!((params.feedback.preview_plain(0.0) + 0.95).abs() < 1e-6);
        assert!((params.feedback.preview_plain(1.0) - 0.95).abs() < 1e-6);
    }
}
