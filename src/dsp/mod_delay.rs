//! # Modulated Delay Stage
//!
//! The shared engine behind delay, chorus and flanger effects: a
//! [`DelayLine`] wrapped with feedback, optional damping, ping-pong
//! cross-feedback and a dry/delayed output blend.
//!
//! ```text
//!              ┌──────────────────────── × dry ───────────────────────┐
//!  input ──────┤                                                      │
//!              └─►(+)─► [delay line] ──┬──────────── × feedforward ──(+)─► output
//!                  ▲     (modulated)   │
//!                  │                   ▼
//!                  │              [damping]
//!                  │                   │   (1 - cross) · own
//!                  └── × feedback ◄── mix
//!                                      ▲   cross · next channel
//! ```
//!
//! ## Two Passes Per Frame
//!
//! With cross-feedback, channel `i` writes a blend of its own delayed
//! signal and channel `i + 1`'s. That makes every channel's write depend
//! on another channel's read *from the same sample*. The stage therefore
//! processes a whole frame at a time:
//!
//! 1. read every channel (delayed + damped) into a snapshot buffer,
//! 2. compute each channel's feedback from the snapshot and write.
//!
//! The snapshot buffers are allocated once in `prepare`.
//!
//! ## Modulation
//!
//! Delay modulation comes either from the internal [`Lfo`] or from a
//! caller-supplied per-sample signal. Both are bipolar and scaled by the
//! modulation depth (in samples) before being added to the base delay.

use nih_plug::{nih_debug_assert, nih_log};

use super::delay_line::{DelayLine, DelayLineConfig};
use super::filter::DampingFilter;
use super::interpolation::{Interpolator, Lagrange3rd};
use super::lfo::{Lfo, LfoShape};
use super::param::DspParam;
use super::smoothing::LinearSmoother;
use crate::error::ConfigResult;

/// Largest feedback magnitude. At 1.0 repeats would never decay.
pub const MAX_FEEDBACK: f32 = 0.99;

/// Prepare-time settings for a [`ModulatedDelay`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModulatedDelayConfig {
    pub delay: DelayLineConfig,
    /// Glide time for the gain, depth and phase-offset parameters.
    pub gain_smoothing_ms: f32,
}

impl Default for ModulatedDelayConfig {
    fn default() -> Self {
        Self {
            delay: DelayLineConfig::default(),
            gain_smoothing_ms: 20.0,
        }
    }
}

/// A delay line with feedback, damping, cross-feedback and modulation.
#[derive(Debug, Clone)]
pub struct ModulatedDelay<I: Interpolator = Lagrange3rd> {
    delay_line: DelayLine<I, LinearSmoother>,
    damping: DampingFilter,
    lfo: Lfo,

    feedback: DspParam,
    cross_feedback: DspParam,
    feedforward: DspParam,
    dry: DspParam,
    mod_depth: DspParam,

    delayed: Vec<f32>,
    damped: Vec<f32>,
    frame: Vec<f32>,
    mod_frame: Vec<f32>,
}

impl<I: Interpolator> ModulatedDelay<I> {
    pub fn new(config: ModulatedDelayConfig) -> ConfigResult<Self> {
        let mut stage = Self {
            delay_line: DelayLine::new(config.delay)?,
            damping: DampingFilter::new(),
            lfo: Lfo::new(LfoShape::Sine),
            feedback: DspParam::with_bounds(-MAX_FEEDBACK, MAX_FEEDBACK),
            cross_feedback: DspParam::with_bounds(0.0, 1.0),
            feedforward: DspParam::with_bounds(-1.0, 1.0),
            dry: DspParam::with_bounds(0.0, 1.0),
            mod_depth: DspParam::with_bounds(0.0, 0.0),
            delayed: Vec::new(),
            damped: Vec::new(),
            frame: Vec::new(),
            mod_frame: Vec::new(),
        };
        stage.prepare(config)?;
        Ok(stage)
    }

    /// Reallocates all state. Not real-time safe.
    ///
    /// Defaults after prepare: pure delay (feedforward 1, dry 0), no
    /// feedback, no cross-feedback, no modulation, damping off.
    pub fn prepare(&mut self, config: ModulatedDelayConfig) -> ConfigResult<()> {
        self.delay_line.prepare(config.delay)?;
        // Reads happen before the frame's writes, so a zero delay would
        // read the slot about to be overwritten.
        self.delay_line.set_min_delay_samples(1.0);

        let num_channels = self.delay_line.num_channels();
        let sample_rate = self.delay_line.sample_rate();
        let smoothing_ms = config.gain_smoothing_ms;

        self.damping.prepare(num_channels, sample_rate);
        self.lfo.prepare(num_channels, sample_rate, smoothing_ms);

        self.feedback
            .prepare(num_channels, sample_rate, smoothing_ms, 0.0);
        self.cross_feedback
            .prepare(num_channels, sample_rate, smoothing_ms, 0.0);
        self.feedforward
            .prepare(num_channels, sample_rate, smoothing_ms, 1.0);
        self.dry.prepare(num_channels, sample_rate, smoothing_ms, 0.0);
        self.mod_depth
            .prepare(num_channels, sample_rate, smoothing_ms, 0.0);
        self.mod_depth
            .set_bounds(0.0, (self.delay_line.buffer_size() - 1) as f32);

        self.delayed = vec![0.0; num_channels];
        self.damped = vec![0.0; num_channels];
        self.frame = vec![0.0; num_channels];
        self.mod_frame = vec![0.0; num_channels];

        nih_log!(
            "modulated delay prepared: {} ch, {} samples of history",
            num_channels,
            self.delay_line.buffer_size()
        );
        Ok(())
    }

    /// Silences the history and filter memory and restarts the LFO.
    /// Parameter targets are kept.
    pub fn reset(&mut self) {
        self.delay_line.reset();
        self.damping.reset();
        self.lfo.reset();
    }

    // ─── Parameters ──────────────────────────────────────────────────

    pub fn set_delay_ms(&mut self, ms: f32, skip_smoothing: bool) {
        self.delay_line.set_delay_ms(ms, skip_smoothing);
    }

    pub fn set_delay_ms_for(&mut self, channel: usize, ms: f32, skip_smoothing: bool) {
        self.delay_line.set_delay_ms_for(channel, ms, skip_smoothing);
    }

    pub fn set_delay_samples(&mut self, samples: f32, skip_smoothing: bool) {
        self.delay_line.set_delay_samples(samples, skip_smoothing);
    }

    pub fn set_delay_samples_for(&mut self, channel: usize, samples: f32, skip_smoothing: bool) {
        self.delay_line
            .set_delay_samples_for(channel, samples, skip_smoothing);
    }

    /// Feedback gain, clamped to ±[`MAX_FEEDBACK`].
    pub fn set_feedback(&mut self, gain: f32, skip_smoothing: bool) {
        self.feedback.set_target(gain, skip_smoothing);
    }

    pub fn set_feedback_for(&mut self, channel: usize, gain: f32, skip_smoothing: bool) {
        self.feedback.set_target_for(channel, gain, skip_smoothing);
    }

    /// How much of each channel's feedback comes from the next channel:
    /// 0 = independent channels, 1 = full ping-pong.
    pub fn set_cross_feedback(&mut self, amount: f32, skip_smoothing: bool) {
        self.cross_feedback.set_target(amount, skip_smoothing);
    }

    pub fn set_cross_feedback_for(&mut self, channel: usize, amount: f32, skip_smoothing: bool) {
        self.cross_feedback
            .set_target_for(channel, amount, skip_smoothing);
    }

    /// Gain on the delayed signal at the output.
    pub fn set_feedforward(&mut self, gain: f32, skip_smoothing: bool) {
        self.feedforward.set_target(gain, skip_smoothing);
    }

    pub fn set_feedforward_for(&mut self, channel: usize, gain: f32, skip_smoothing: bool) {
        self.feedforward
            .set_target_for(channel, gain, skip_smoothing);
    }

    /// Gain on the unprocessed input at the output.
    pub fn set_dry(&mut self, gain: f32, skip_smoothing: bool) {
        self.dry.set_target(gain, skip_smoothing);
    }

    pub fn set_dry_for(&mut self, channel: usize, gain: f32, skip_smoothing: bool) {
        self.dry.set_target_for(channel, gain, skip_smoothing);
    }

    /// Peak delay excursion of the modulation, in samples.
    pub fn set_mod_depth_samples(&mut self, samples: f32, skip_smoothing: bool) {
        self.mod_depth.set_target(samples, skip_smoothing);
    }

    pub fn set_mod_depth_samples_for(&mut self, channel: usize, samples: f32, skip_smoothing: bool) {
        self.mod_depth
            .set_target_for(channel, samples, skip_smoothing);
    }

    pub fn set_mod_depth_ms(&mut self, ms: f32, skip_smoothing: bool) {
        let samples = self.delay_line.ms_to_samples(ms);
        self.set_mod_depth_samples(samples, skip_smoothing);
    }

    pub fn set_mod_depth_ms_for(&mut self, channel: usize, ms: f32, skip_smoothing: bool) {
        let samples = self.delay_line.ms_to_samples(ms);
        self.set_mod_depth_samples_for(channel, samples, skip_smoothing);
    }

    pub fn set_lfo_rate(&mut self, rate_hz: f32) {
        self.lfo.set_rate(rate_hz);
    }

    pub fn set_lfo_shape(&mut self, shape: LfoShape) {
        self.lfo.set_shape(shape);
    }

    /// LFO phase offset between adjacent channels, in cycles.
    pub fn set_stereo_spread(&mut self, spread_cycles: f32, skip_smoothing: bool) {
        self.lfo.set_stereo_spread(spread_cycles, skip_smoothing);
    }

    pub fn set_phase_offset(&mut self, channel: usize, offset_cycles: f32, skip_smoothing: bool) {
        self.lfo
            .set_phase_offset(channel, offset_cycles, skip_smoothing);
    }

    /// Feedback-path lowpass cutoff, or `None` to disable damping.
    pub fn set_damping(&mut self, cutoff_hz: Option<f32>) {
        self.damping.set_cutoff(cutoff_hz);
    }

    // ─── Processing ──────────────────────────────────────────────────

    /// Processes one frame (one sample per channel) in place, modulated
    /// by the internal LFO.
    pub fn process_frame(&mut self, frame: &mut [f32]) {
        self.run_frame(frame, None);
    }

    /// Processes one frame in place with an external bipolar modulation
    /// value per channel.
    pub fn process_frame_with_modulation(&mut self, frame: &mut [f32], modulation: &[f32]) {
        self.run_frame(frame, Some(modulation));
    }

    /// Processes channel slices in place, modulated by the internal LFO.
    pub fn process_block(&mut self, channels: &mut [&mut [f32]]) {
        self.run_block(channels, None);
    }

    /// Processes channel slices in place with an external bipolar
    /// modulation signal per channel.
    pub fn process_block_with_modulation(
        &mut self,
        channels: &mut [&mut [f32]],
        modulation: &[&[f32]],
    ) {
        self.run_block(channels, Some(modulation));
    }

    fn run_block(&mut self, channels: &mut [&mut [f32]], modulation: Option<&[&[f32]]>) {
        let num_channels = self.num_channels().min(channels.len());
        let num_samples = channels
            .iter()
            .take(num_channels)
            .map(|c| c.len())
            .min()
            .unwrap_or(0);

        // Moved out for the duration of the block so `run_frame` can
        // borrow `self` mutably. Taking a Vec does not allocate.
        let mut frame = std::mem::take(&mut self.frame);
        let mut mod_frame = std::mem::take(&mut self.mod_frame);

        for n in 0..num_samples {
            for ch in 0..num_channels {
                frame[ch] = channels[ch][n];
            }
            match modulation {
                Some(m) => {
                    for ch in 0..num_channels {
                        mod_frame[ch] = m.get(ch).and_then(|s| s.get(n)).copied().unwrap_or(0.0);
                    }
                    self.run_frame(&mut frame[..num_channels], Some(&mod_frame[..num_channels]));
                }
                None => self.run_frame(&mut frame[..num_channels], None),
            }
            for ch in 0..num_channels {
                channels[ch][n] = frame[ch];
            }
        }

        self.frame = frame;
        self.mod_frame = mod_frame;
    }

    fn run_frame(&mut self, frame: &mut [f32], modulation: Option<&[f32]>) {
        nih_debug_assert!(frame.len() <= self.num_channels());
        let num_channels = frame.len().min(self.num_channels());
        if num_channels == 0 {
            return;
        }
        if modulation.is_none() {
            self.lfo.advance();
        }

        // Pass 1: read every channel before any channel writes.
        for ch in 0..num_channels {
            let mod_value = match modulation {
                Some(m) => m.get(ch).copied().unwrap_or(0.0),
                None => self.lfo.value(ch),
            };
            let depth = self.mod_depth.next_value(ch);
            let delayed = self
                .delay_line
                .read_sample_modulated(ch, depth * mod_value);
            self.delayed[ch] = delayed;
            self.damped[ch] = self.damping.process(ch, delayed);
        }

        // Pass 2: feedback from the snapshot, then write and mix.
        for ch in 0..num_channels {
            let next = (ch + 1) % num_channels;
            let cross = self.cross_feedback.next_value(ch);
            let feedback = self.feedback.next_value(ch);
            let feedforward = self.feedforward.next_value(ch);
            let dry = self.dry.next_value(ch);

            let fed_back = (1.0 - cross) * self.damped[ch] + cross * self.damped[next];
            let input = frame[ch];
            self.delay_line.write_sample(ch, input + feedback * fed_back);
            frame[ch] = dry * input + feedforward * self.delayed[ch];
        }
    }

    // ─── Accessors ───────────────────────────────────────────────────

    /// Approximate number of samples until the repeats decay below -60 dB,
    /// based on the current delay and feedback.
    ///
    /// Each repeat is scaled by the feedback gain, so after N repeats the
    /// level is `feedback^N`. Solving `feedback^N = 0.001` gives
    /// `N = -3 / log10(feedback)`.
    pub fn tail_samples(&self) -> u32 {
        if self.num_channels() == 0 {
            return 0;
        }
        let delay = self.delay_line.delay_samples(0) + self.mod_depth.current_value(0);
        let feedback = self.feedback.current_value(0).abs();

        if feedback > 0.001 {
            let repeats = -3.0 / feedback.log10();
            (repeats * delay) as u32
        } else {
            delay as u32
        }
    }

    pub fn num_channels(&self) -> usize {
        self.delay_line.num_channels()
    }

    pub fn delay_line(&self) -> &DelayLine<I, LinearSmoother> {
        &self.delay_line
    }
}

// ─────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────
