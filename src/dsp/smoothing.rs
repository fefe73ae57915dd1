//! # Parameter Smoothing
//!
//! When a parameter jumps (a knob moves, a preset loads), applying the
//! new value instantly creates a step in the signal that you hear as a
//! click or "zipper noise." A smoother glides from the current value to
//! the target over a short time instead, advancing exactly one step per
//! processed sample.
//!
//! Two laws are provided:
//!
//! - [`OnePoleSmoother`]: exponential approach, the step response of a
//!   one-pole lowpass. Each sample closes a fixed fraction of the
//!   remaining distance:
//!
//!   ```text
//!   current += (target - current) * alpha
//!   alpha    = 1 - e^(-1 / (time_s * sample_rate))
//!   ```
//!
//!   After `time_s` the value has covered ~63.2% of the distance, after
//!   five time constants more than 99%. `ORDER` stages can be chained,
//!   each one smoothing the previous stage's output, for an S-shaped
//!   transition without the initial jump in slope.
//!
//! - [`LinearSmoother`]: constant-rate ramp. When a new target arrives,
//!   the per-sample increment `(target - current) / steps` is fixed and
//!   the value lands exactly on the target after `steps` samples.
//!
//! Every channel smooths independently.

/// A per-channel value that glides toward a target one sample at a time.
pub trait Smoother: Default {
    /// Allocates state for `num_channels` and derives coefficients.
    ///
    /// All channels start settled at 0.0. Not real-time safe.
    fn prepare(&mut self, num_channels: usize, sample_rate: f32, time_ms: f32);

    /// Changes the smoothing time without disturbing current values.
    fn set_time_ms(&mut self, time_ms: f32);

    /// Sets a new target on one channel. With `skip_smoothing` the
    /// current value jumps straight to the target.
    fn set_target(&mut self, channel: usize, target: f32, skip_smoothing: bool);

    /// Advances one sample and returns the new current value.
    fn next_value(&mut self, channel: usize) -> f32;

    /// The current value, without advancing.
    fn current_value(&self, channel: usize) -> f32;

    fn target_value(&self, channel: usize) -> f32;

    /// `true` while the channel has not yet arrived at its target.
    fn is_smoothing(&self, channel: usize) -> bool;

    /// Snaps every channel to `value`, dropping any ramp in progress.
    fn reset(&mut self, value: f32);

    fn num_channels(&self) -> usize;

    /// Sets the same target on every channel.
    fn set_target_all(&mut self, target: f32, skip_smoothing: bool) {
        for ch in 0..self.num_channels() {
            self.set_target(ch, target, skip_smoothing);
        }
    }
}

/// Relative distance below which a one-pole smoother snaps to its target,
/// so it reports "settled" in finite time and never crawls through
/// denormals. Scaled by `max(|target|, 1)`.
const SETTLE_EPSILON: f32 = 1.0e-6;

#[derive(Debug, Clone, Copy)]
struct OnePoleState<const ORDER: usize> {
    stages: [f32; ORDER],
    target: f32,
}

impl<const ORDER: usize> Default for OnePoleState<ORDER> {
    fn default() -> Self {
        Self {
            stages: [0.0; ORDER],
            target: 0.0,
        }
    }
}

/// Exponential smoother built from `ORDER` cascaded one-pole stages.
#[derive(Debug, Clone)]
pub struct OnePoleSmoother<const ORDER: usize = 1> {
    channels: Vec<OnePoleState<ORDER>>,
    sample_rate: f32,
    time_ms: f32,
    alpha: f32,
}

impl<const ORDER: usize> Default for OnePoleSmoother<ORDER> {
    fn default() -> Self {
        Self {
            channels: Vec::new(),
            sample_rate: 44100.0,
            time_ms: 0.0,
            alpha: 1.0,
        }
    }
}

impl<const ORDER: usize> OnePoleSmoother<ORDER> {
    /// Per-stage coefficient. A zero (or invalid) time means "no smoothing."
    pub fn alpha(&self) -> f32 {
        self.alpha
    }

    fn update_alpha(&mut self) {
        let time_samples = self.time_ms * self.sample_rate / 1000.0;
        self.alpha = if time_samples.is_finite() && time_samples > 0.0 {
            1.0 - (-1.0 / time_samples).exp()
        } else {
            1.0
        };
    }
}

impl<const ORDER: usize> Smoother for OnePoleSmoother<ORDER> {
    fn prepare(&mut self, num_channels: usize, sample_rate: f32, time_ms: f32) {
        self.channels = vec![OnePoleState::default(); num_channels];
        self.sample_rate = sample_rate;
        self.time_ms = time_ms;
        self.update_alpha();
    }

    fn set_time_ms(&mut self, time_ms: f32) {
        self.time_ms = time_ms;
        self.update_alpha();
    }

    #[inline]
    fn set_target(&mut self, channel: usize, target: f32, skip_smoothing: bool) {
        let state = &mut self.channels[channel];
        state.target = target;
        if skip_smoothing {
            state.stages = [target; ORDER];
        }
    }

    #[inline]
    fn next_value(&mut self, channel: usize) -> f32 {
        let alpha = self.alpha;
        let state = &mut self.channels[channel];

        let mut input = state.target;
        let mut moved = false;
        for stage in state.stages.iter_mut() {
            let next = *stage + (input - *stage) * alpha;
            moved |= next != *stage;
            *stage = next;
            input = next;
        }

        // Near large targets the per-sample step can fall below one ULP and
        // the cascade stops moving short of the target.
        let tolerance = SETTLE_EPSILON * state.target.abs().max(1.0);
        if !moved || (state.target - input).abs() < tolerance {
            state.stages = [state.target; ORDER];
            return state.target;
        }
        input
    }

    #[inline]
    fn current_value(&self, channel: usize) -> f32 {
        self.channels[channel]
            .stages
            .last()
            .copied()
            .unwrap_or(self.channels[channel].target)
    }

    fn target_value(&self, channel: usize) -> f32 {
        self.channels[channel].target
    }

    fn is_smoothing(&self, channel: usize) -> bool {
        let state = &self.channels[channel];
        state.stages.iter().any(|s| *s != state.target)
    }

    fn reset(&mut self, value: f32) {
        for state in &mut self.channels {
            state.target = value;
            state.stages = [value; ORDER];
        }
    }

    fn num_channels(&self) -> usize {
        self.channels.len()
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct LinearState {
    current: f32,
    target: f32,
    step: f32,
    steps_left: u32,
}

/// Constant-rate ramp that reaches the target in a fixed number of samples.
#[derive(Debug, Clone)]
pub struct LinearSmoother {
    channels: Vec<LinearState>,
    sample_rate: f32,
    time_ms: f32,
    ramp_len: u32,
}

impl Default for LinearSmoother {
    fn default() -> Self {
        Self {
            channels: Vec::new(),
            sample_rate: 44100.0,
            time_ms: 0.0,
            ramp_len: 0,
        }
    }
}

impl LinearSmoother {
    /// Number of samples a full ramp takes.
    pub fn ramp_len(&self) -> u32 {
        self.ramp_len
    }

    fn update_ramp_len(&mut self) {
        let samples = (self.time_ms * self.sample_rate / 1000.0).round();
        self.ramp_len = if samples.is_finite() && samples >= 1.0 {
            samples as u32
        } else {
            0
        };
    }
}

impl Smoother for LinearSmoother {
    fn prepare(&mut self, num_channels: usize, sample_rate: f32, time_ms: f32) {
        self.channels = vec![LinearState::default(); num_channels];
        self.sample_rate = sample_rate;
        self.time_ms = time_ms;
        self.update_ramp_len();
    }

    fn set_time_ms(&mut self, time_ms: f32) {
        self.time_ms = time_ms;
        self.update_ramp_len();
    }

    #[inline]
    fn set_target(&mut self, channel: usize, target: f32, skip_smoothing: bool) {
        let ramp_len = self.ramp_len;
        let state = &mut self.channels[channel];
        // Re-sending the same target must not restart the ramp.
        if !skip_smoothing && target == state.target {
            return;
        }
        state.target = target;

        if skip_smoothing || ramp_len == 0 {
            state.current = target;
            state.steps_left = 0;
            state.step = 0.0;
        } else {
            state.step = (target - state.current) / ramp_len as f32;
            state.steps_left = ramp_len;
        }
    }

    #[inline]
    fn next_value(&mut self, channel: usize) -> f32 {
        let state = &mut self.channels[channel];
        if state.steps_left > 0 {
            state.steps_left -= 1;
            state.current = if state.steps_left == 0 {
                state.target
            } else {
                state.current + state.step
            };
        }
        state.current
    }

    #[inline]
    fn current_value(&self, channel: usize) -> f32 {
        self.channels[channel].current
    }

    fn target_value(&self, channel: usize) -> f32 {
        self.channels[channel].target
    }

    fn is_smoothing(&self, channel: usize) -> bool {
        self.channels[channel].steps_left > 0
    }

    fn reset(&mut self, value: f32) {
        for state in &mut self.channels {
            *state = LinearState {
                current: value,
                target: value,
                step: 0.0,
                steps_left: 0,
            };
        }
    }

    fn num_channels(&self) -> usize {
        self.channels.len()
    }
}
