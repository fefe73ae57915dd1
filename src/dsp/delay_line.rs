//! # Delay Line
//!
//! A delay line stores audio samples and lets you read them back after a
//! specified time delay. This is the fundamental building block of all
//! delay, reverb, chorus, and flanger effects.
//!
//! This one combines three pieces:
//!
//! - a [`CircularBuffer`] holding the past of every channel,
//! - an [`Interpolator`] kernel for reading between stored samples,
//! - a [`DspParam`] holding the delay time in samples, smoothed so delay
//!   changes glide instead of jumping, and clamped to the buffer.
//!
//! ## One Sample, Three Steps
//!
//! ```text
//! 1. (read_index, frac) = position `delay` samples behind the write cursor
//! 2. write the input at the write cursor (cursor advances)
//! 3. interpolate backward from read_index by frac
//! ```
//!
//! The read position is computed from the cursor *before* the write. With
//! that ordering, a delay of 0 returns the sample just written (the input
//! passes straight through) and a delay of 1 returns the previous input.
//! Swapping steps 1 and 2 shifts every delay by one sample, which is easy
//! to miss and breaks every filter built on top.
//!
//! ## The Index Math
//!
//! ```text
//! delay      = clamp(delay, 0, buffer_size - 1)
//! delay_int  = floor(delay)
//! frac       = delay - delay_int
//! read_index = (write_index + buffer_size - delay_int) & (buffer_size - 1)
//! ```
//!
//! Adding `buffer_size` before subtracting keeps the `usize` arithmetic
//! from going negative; the mask wraps the result back into the ring.

use nih_plug::{nih_debug_assert, nih_log};

use super::buffer::{CircularBuffer, MAX_CAPACITY};
use super::interpolation::{Interpolator, Linear};
use super::param::DspParam;
use super::smoothing::{LinearSmoother, Smoother};
use crate::error::{ConfigError, ConfigResult};

/// Iteration order for block processing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BufferLayout {
    /// All samples of channel 0, then all samples of channel 1, ...
    ChannelMajor,
    /// Sample 0 of every channel, then sample 1 of every channel, ...
    #[default]
    SampleMajor,
}

/// Prepare-time settings for a [`DelayLine`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DelayLineConfig {
    pub num_channels: usize,
    pub sample_rate: f32,
    /// Longest delay that must be reachable, in milliseconds.
    pub max_delay_ms: f32,
    /// Glide time for delay changes.
    pub smoothing_ms: f32,
    pub layout: BufferLayout,
}

impl Default for DelayLineConfig {
    fn default() -> Self {
        Self {
            num_channels: 2,
            sample_rate: 44100.0,
            max_delay_ms: 1000.0,
            smoothing_ms: 50.0,
            layout: BufferLayout::SampleMajor,
        }
    }
}

/// A multi-channel fractional delay line.
///
/// `I` picks the interpolation kernel, `S` the smoothing law for delay
/// changes. Both are resolved at compile time.
#[derive(Debug, Clone)]
pub struct DelayLine<I: Interpolator = Linear, S: Smoother = LinearSmoother> {
    buffer: CircularBuffer,
    delay: DspParam<S>,
    sample_rate: f32,
    buffer_size: usize,
    layout: BufferLayout,
    _interpolator: std::marker::PhantomData<I>,
}

impl<I: Interpolator, S: Smoother> DelayLine<I, S> {
    /// Builds and prepares a delay line in one step.
    pub fn new(config: DelayLineConfig) -> ConfigResult<Self> {
        let mut line = Self {
            buffer: CircularBuffer::new(),
            delay: DspParam::new(),
            sample_rate: config.sample_rate,
            buffer_size: 0,
            layout: config.layout,
            _interpolator: std::marker::PhantomData,
        };
        line.prepare(config)?;
        Ok(line)
    }

    /// Reallocates history for a new channel count, sample rate or maximum
    /// delay. Not real-time safe.
    ///
    /// History is cleared and every channel's delay snaps to 0.
    ///
    /// The buffer holds the maximum delay plus the kernel's history
    /// (`I::HISTORY + 1` slots) so the maximum delay is readable in full.
    /// A maximum delay that would need more than [`MAX_CAPACITY`] samples
    /// is rejected.
    pub fn prepare(&mut self, config: DelayLineConfig) -> ConfigResult<()> {
        ConfigError::check_channels(config.num_channels)?;
        let sample_rate = ConfigError::check_sample_rate(config.sample_rate)?;
        let invalid_max_delay = ConfigError::InvalidMaxDelay {
            max_delay_ms: config.max_delay_ms,
        };
        if !(config.max_delay_ms.is_finite() && config.max_delay_ms > 0.0) {
            return Err(invalid_max_delay);
        }

        let headroom = I::HISTORY + 1;
        let max_delay_samples =
            (f64::from(config.max_delay_ms) * f64::from(sample_rate) / 1000.0).ceil();
        if max_delay_samples + headroom as f64 > MAX_CAPACITY as f64 {
            nih_log!(
                "delay line rejected: {} ms at {} Hz needs more than {} samples",
                config.max_delay_ms,
                sample_rate,
                MAX_CAPACITY
            );
            return Err(invalid_max_delay);
        }
        self.buffer
            .resize(config.num_channels, max_delay_samples as usize + headroom)?;

        self.sample_rate = sample_rate;
        self.buffer_size = self.buffer.capacity();
        self.layout = config.layout;

        self.delay
            .prepare(config.num_channels, sample_rate, config.smoothing_ms, 0.0);
        self.delay.set_bounds(0.0, (self.buffer_size - 1) as f32);

        nih_log!(
            "delay line prepared: {} ch @ {} Hz, {} ms max -> {} samples per channel",
            config.num_channels,
            sample_rate,
            config.max_delay_ms,
            self.buffer_size
        );
        Ok(())
    }

    /// Zeroes all history. Delay targets and smoothing state are kept.
    pub fn reset(&mut self) {
        self.buffer.clear();
    }

    // ─── Delay setters ───────────────────────────────────────────────

    pub fn set_delay_samples(&mut self, samples: f32, skip_smoothing: bool) {
        self.delay.set_target(samples, skip_smoothing);
    }

    pub fn set_delay_samples_for(&mut self, channel: usize, samples: f32, skip_smoothing: bool) {
        self.delay.set_target_for(channel, samples, skip_smoothing);
    }

    pub fn set_delay_ms(&mut self, ms: f32, skip_smoothing: bool) {
        self.set_delay_samples(self.ms_to_samples(ms), skip_smoothing);
    }

    pub fn set_delay_ms_for(&mut self, channel: usize, ms: f32, skip_smoothing: bool) {
        self.set_delay_samples_for(channel, self.ms_to_samples(ms), skip_smoothing);
    }

    /// Raises the lower clamp of the delay. Feedback structures that read
    /// before they write need at least one sample here.
    pub fn set_min_delay_samples(&mut self, min_samples: f32) {
        let max = (self.buffer_size - 1) as f32;
        self.delay.set_bounds(min_samples.clamp(0.0, max), max);
    }

    pub fn set_smoothing_ms(&mut self, time_ms: f32) {
        self.delay.set_time_ms(time_ms);
    }

    /// The channel's current (smoothed, clamped) delay in samples.
    pub fn delay_samples(&self, channel: usize) -> f32 {
        self.delay.current_value(channel)
    }

    /// Whether the channel's delay is still gliding toward its target.
    pub fn is_smoothing(&self, channel: usize) -> bool {
        self.delay.is_smoothing(channel)
    }

    pub fn ms_to_samples(&self, ms: f32) -> f32 {
        ms * self.sample_rate / 1000.0
    }

    // ─── Per-sample processing ───────────────────────────────────────

    /// Writes `input` and returns the sample from `delay` samples ago.
    #[inline]
    pub fn process_sample(&mut self, channel: usize, input: f32) -> f32 {
        let delay = self.delay.next_value(channel);
        self.step(channel, input, delay)
    }

    /// Like [`process_sample`](Self::process_sample), but the smoothed
    /// delay is offset by `modulation` samples before clamping.
    #[inline]
    pub fn process_sample_modulated(&mut self, channel: usize, input: f32, modulation: f32) -> f32 {
        let delay = self.delay.apply_additive_mod(channel, modulation);
        self.step(channel, input, delay)
    }

    /// Reads without writing. Delay `D` returns the sample written `D`
    /// writes ago; pair with [`write_sample`](Self::write_sample) when the
    /// value to store depends on what was read.
    #[inline]
    pub fn read_sample(&mut self, channel: usize) -> f32 {
        let delay = self.delay.next_value(channel);
        self.read_at(channel, delay)
    }

    #[inline]
    pub fn read_sample_modulated(&mut self, channel: usize, modulation: f32) -> f32 {
        let delay = self.delay.apply_additive_mod(channel, modulation);
        self.read_at(channel, delay)
    }

    /// Stores `input` and advances the channel's cursor.
    #[inline]
    pub fn write_sample(&mut self, channel: usize, input: f32) {
        nih_debug_assert!(channel < self.buffer.num_channels());
        self.buffer.write(channel, input);
    }

    // ─── Block processing ────────────────────────────────────────────

    /// Processes `min(len)` samples of every channel in the configured
    /// layout order.
    pub fn process_block(&mut self, inputs: &[&[f32]], outputs: &mut [&mut [f32]]) {
        self.run_block(inputs, outputs, None);
    }

    /// Block processing with a per-channel modulation signal in samples.
    pub fn process_block_modulated(
        &mut self,
        inputs: &[&[f32]],
        outputs: &mut [&mut [f32]],
        modulation: &[&[f32]],
    ) {
        self.run_block(inputs, outputs, Some(modulation));
    }

    fn run_block(
        &mut self,
        inputs: &[&[f32]],
        outputs: &mut [&mut [f32]],
        modulation: Option<&[&[f32]]>,
    ) {
        let num_channels = self
            .num_channels()
            .min(inputs.len())
            .min(outputs.len())
            .min(modulation.map_or(usize::MAX, <[_]>::len));
        let num_samples = (0..num_channels)
            .map(|ch| {
                let len = inputs[ch].len().min(outputs[ch].len());
                modulation.map_or(len, |m| len.min(m[ch].len()))
            })
            .min()
            .unwrap_or(0);

        match self.layout {
            BufferLayout::ChannelMajor => {
                for ch in 0..num_channels {
                    for n in 0..num_samples {
                        outputs[ch][n] = self.block_sample(ch, inputs[ch][n], modulation, n);
                    }
                }
            }
            BufferLayout::SampleMajor => {
                for n in 0..num_samples {
                    for ch in 0..num_channels {
                        outputs[ch][n] = self.block_sample(ch, inputs[ch][n], modulation, n);
                    }
                }
            }
        }
    }

    #[inline]
    fn block_sample(
        &mut self,
        channel: usize,
        input: f32,
        modulation: Option<&[&[f32]]>,
        n: usize,
    ) -> f32 {
        match modulation {
            Some(m) => self.process_sample_modulated(channel, input, m[channel][n]),
            None => self.process_sample(channel, input),
        }
    }

    // ─── Core ────────────────────────────────────────────────────────

    /// Splits an (already clamped) delay into a read anchor and fraction
    /// relative to the channel's current write cursor.
    #[inline]
    fn read_index_and_frac(&self, channel: usize, delay: f32) -> (usize, f32) {
        let delay = delay.clamp(0.0, (self.buffer_size - 1) as f32);
        let delay_int = delay.floor();
        let frac = delay - delay_int;
        let write_index = self.buffer.write_index(channel);
        let read_index = (write_index + self.buffer_size - delay_int as usize) & (self.buffer_size - 1);
        (read_index, frac)
    }

    #[inline]
    fn step(&mut self, channel: usize, input: f32, delay: f32) -> f32 {
        nih_debug_assert!(channel < self.buffer.num_channels());
        let (read_index, frac) = self.read_index_and_frac(channel, delay);
        self.buffer.write(channel, input);
        I::interpolate_backward(self.buffer.channel(channel), read_index, frac, self.buffer_size)
    }

    #[inline]
    fn read_at(&self, channel: usize, delay: f32) -> f32 {
        nih_debug_assert!(channel < self.buffer.num_channels());
        let (read_index, frac) = self.read_index_and_frac(channel, delay);
        I::interpolate_backward(self.buffer.channel(channel), read_index, frac, self.buffer_size)
    }

    // ─── Accessors ───────────────────────────────────────────────────

    /// Samples of history per channel (a power of two).
    pub fn buffer_size(&self) -> usize {
        self.buffer_size
    }

    pub fn num_channels(&self) -> usize {
        self.buffer.num_channels()
    }

    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    pub fn layout(&self) -> BufferLayout {
        self.layout
    }

    pub fn set_layout(&mut self, layout: BufferLayout) {
        self.layout = layout;
    }
}

// ─────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────
