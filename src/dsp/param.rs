//! # Bounded DSP Parameter
//!
//! A [`Smoother`] plus a `[min, max]` range and two ways of folding an
//! audio-rate modulation signal into the smoothed value:
//!
//! ```text
//! additive:        clamp(smoothed + modulation)
//! multiplicative:  clamp(smoothed * modulation)
//! ```
//!
//! The clamp is applied *after* modulation, so no matter how wild the
//! modulation source gets, what comes out is inside the bounds. This is
//! what keeps a modulated delay from reading outside its buffer and a
//! feedback gain from running away.
//!
//! Every read method advances the smoother exactly once.

use super::smoothing::{OnePoleSmoother, Smoother};

/// A smoothed, per-channel value that is always clamped into `[min, max]`.
#[derive(Debug, Clone)]
pub struct DspParam<S: Smoother = OnePoleSmoother> {
    smoother: S,
    min: f32,
    max: f32,
}

impl<S: Smoother> Default for DspParam<S> {
    fn default() -> Self {
        Self {
            smoother: S::default(),
            min: f32::MIN,
            max: f32::MAX,
        }
    }
}

impl<S: Smoother> DspParam<S> {
    /// An unbounded parameter. Call [`prepare`](Self::prepare) before use.
    pub fn new() -> Self {
        Self::default()
    }

    /// A parameter bounded to `[min, max]`.
    pub fn with_bounds(min: f32, max: f32) -> Self {
        let mut param = Self::default();
        param.set_bounds(min, max);
        param
    }

    /// Allocates per-channel smoothing state. Not real-time safe.
    ///
    /// Every channel starts settled at `initial`.
    pub fn prepare(&mut self, num_channels: usize, sample_rate: f32, time_ms: f32, initial: f32) {
        self.smoother.prepare(num_channels, sample_rate, time_ms);
        self.smoother.reset(initial);
    }

    /// Sets the clamp range. Swapped arguments are put in order.
    pub fn set_bounds(&mut self, min: f32, max: f32) {
        self.min = min.min(max);
        self.max = max.max(min);
    }

    pub fn min(&self) -> f32 {
        self.min
    }

    pub fn max(&self) -> f32 {
        self.max
    }

    /// Same target on every channel.
    pub fn set_target(&mut self, value: f32, skip_smoothing: bool) {
        self.smoother.set_target_all(value, skip_smoothing);
    }

    pub fn set_target_for(&mut self, channel: usize, value: f32, skip_smoothing: bool) {
        self.smoother.set_target(channel, value, skip_smoothing);
    }

    /// Advances one sample and returns the clamped smoothed value.
    #[inline]
    pub fn next_value(&mut self, channel: usize) -> f32 {
        let value = self.smoother.next_value(channel);
        self.clamp(value)
    }

    /// Advances one sample, adds `modulation`, then clamps.
    #[inline]
    pub fn apply_additive_mod(&mut self, channel: usize, modulation: f32) -> f32 {
        let value = self.smoother.next_value(channel) + modulation;
        self.clamp(value)
    }

    /// Advances one sample, multiplies by `modulation`, then clamps.
    #[inline]
    pub fn apply_multiplicative_mod(&mut self, channel: usize, modulation: f32) -> f32 {
        let value = self.smoother.next_value(channel) * modulation;
        self.clamp(value)
    }

    /// The clamped current value, without advancing.
    pub fn current_value(&self, channel: usize) -> f32 {
        self.clamp(self.smoother.current_value(channel))
    }

    pub fn target_value(&self, channel: usize) -> f32 {
        self.smoother.target_value(channel)
    }

    pub fn is_smoothing(&self, channel: usize) -> bool {
        self.smoother.is_smoothing(channel)
    }

    pub fn set_time_ms(&mut self, time_ms: f32) {
        self.smoother.set_time_ms(time_ms);
    }

    /// Snaps every channel to `value`.
    pub fn reset(&mut self, value: f32) {
        self.smoother.reset(value);
    }

    pub fn num_channels(&self) -> usize {
        self.smoother.num_channels()
    }

    #[inline]
    fn clamp(&self, value: f32) -> f32 {
        // `f32::clamp` passes NaN through; map it to the lower bound so a
        // bad modulation sample can never index outside a buffer.
        if value.is_nan() {
            self.min
        } else {
            value.clamp(self.min, self.max)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dsp::smoothing::LinearSmoother;

    fn settled(min: f32, max: f32, value: f32) -> DspParam<LinearSmoother> {
        let mut p = DspParam::<LinearSmoother>::with_bounds(min, max);
        p.prepare(2, 1000.0, 10.0, value);
        p
    }

    #[test]
    fn test_unbounded_by_default() {
        let mut p = DspParam::<LinearSmoother>::new();
        p.prepare(1, 1000.0, 0.0, 0.0);
        p.set_target(1.0e30, true);
        assert_eq!(p.next_value(0), 1.0e30);
        assert_eq!(p.min(), f32::MIN);
        assert_eq!(p.max(), f32::MAX);
    }

    #[test]
    fn test_next_value_is_clamped() {
        let mut p = settled(-0.99, 0.99, 0.0);
        p.set_target(5.0, true);
        assert_eq!(p.next_value(0), 0.99);
        p.set_target(-5.0, true);
        assert_eq!(p.next_value(0), -0.99);
    }

    #[test]
    fn test_additive_mod_clamps_after_adding() {
        let mut p = settled(0.0, 63.0, 32.0);
        assert_eq!(p.apply_additive_mod(0, 10.0), 42.0);
        assert_eq!(p.apply_additive_mod(0, 10_000.0), 63.0);
        assert_eq!(p.apply_additive_mod(0, -10_000.0), 0.0);
    }

    #[test]
    fn test_multiplicative_mod_clamps_after_scaling() {
        let mut p = settled(0.0, 1.0, 0.5);
        assert_eq!(p.apply_multiplicative_mod(0, 1.5), 0.75);
        assert_eq!(p.apply_multiplicative_mod(0, 4.0), 1.0);
        assert_eq!(p.apply_multiplicative_mod(0, -1.0), 0.0);
    }

    /// Modulated reads must step the smoother exactly once, the same as
    /// a plain `next_value`.
    #[test]
    fn test_modulation_advances_smoother_once() {
        let mut plain = settled(f32::MIN, f32::MAX, 0.0);
        let mut modded = settled(f32::MIN, f32::MAX, 0.0);
        plain.set_target(1.0, false);
        modded.set_target(1.0, false);

        for _ in 0..5 {
            let a = plain.next_value(0);
            let b = modded.apply_additive_mod(0, 0.0);
            let c = modded.current_value(0);
            assert_eq!(a, b);
            assert_eq!(b, c);
        }
    }

    #[test]
    fn test_nan_modulation_is_clamped_to_min() {
        let mut p = settled(0.0, 100.0, 50.0);
        assert_eq!(p.apply_additive_mod(0, f32::NAN), 0.0);
    }

    #[test]
    fn test_swapped_bounds_are_ordered() {
        let mut p = DspParam::<LinearSmoother>::new();
        p.set_bounds(1.0, -1.0);
        assert_eq!(p.min(), -1.0);
        assert_eq!(p.max(), 1.0);
    }

    #[test]
    fn test_per_channel_targets() {
        let mut p = settled(-1.0, 1.0, 0.0);
        p.set_target_for(1, 0.5, true);
        assert_eq!(p.next_value(0), 0.0);
        assert_eq!(p.next_value(1), 0.5);
        assert_eq!(p.target_value(1), 0.5);
    }
}
