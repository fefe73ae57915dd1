//! # Low Frequency Oscillator
//!
//! The internal modulation source for the modulated delay. A single phase
//! accumulator runs at the LFO rate; each channel reads it with its own
//! phase offset, so a stereo pair can sweep in opposite directions for a
//! wider image.
//!
//! Output is bipolar, `[-1, 1]`.

use std::f32::consts::TAU;

use super::param::DspParam;

/// LFO wave shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LfoShape {
    #[default]
    Sine,
    Triangle,
}

impl LfoShape {
    /// Evaluates the shape at `phase` in cycles, `[0, 1)`.
    #[inline]
    pub fn eval(self, phase: f32) -> f32 {
        match self {
            Self::Sine => (phase * TAU).sin(),
            // 0 → 0, 0.25 → 1, 0.75 → -1, like the sine.
            Self::Triangle => {
                let q = phase - 0.25;
                4.0 * (q - q.floor() - 0.5).abs() - 1.0
            }
        }
    }
}

/// Multi-channel LFO with per-channel phase offsets.
#[derive(Debug, Clone)]
pub struct Lfo {
    shape: LfoShape,
    /// Shared phase in cycles. Kept in f64 so slow rates still advance by
    /// their exact increment near the top of the cycle.
    phase: f64,
    rate_hz: f32,
    sample_rate: f32,
    /// Per-channel offset in cycles, smoothed so spread changes don't jump.
    phase_offsets: DspParam,
}

impl Default for Lfo {
    fn default() -> Self {
        Self {
            shape: LfoShape::Sine,
            phase: 0.0,
            rate_hz: 1.0,
            sample_rate: 44100.0,
            phase_offsets: DspParam::with_bounds(0.0, 1.0),
        }
    }
}

impl Lfo {
    pub fn new(shape: LfoShape) -> Self {
        Self {
            shape,
            ..Self::default()
        }
    }

    /// Allocates per-channel offset state. Not real-time safe.
    pub fn prepare(&mut self, num_channels: usize, sample_rate: f32, smoothing_ms: f32) {
        self.sample_rate = sample_rate;
        self.phase_offsets
            .prepare(num_channels, sample_rate, smoothing_ms, 0.0);
    }

    pub fn set_shape(&mut self, shape: LfoShape) {
        self.shape = shape;
    }

    /// Negative rates are treated as 0 (frozen LFO).
    pub fn set_rate(&mut self, rate_hz: f32) {
        self.rate_hz = rate_hz.max(0.0);
    }

    pub fn set_phase_offset(&mut self, channel: usize, offset_cycles: f32, skip_smoothing: bool) {
        self.phase_offsets
            .set_target_for(channel, offset_cycles, skip_smoothing);
    }

    /// Spreads channels evenly: channel `i` gets offset `i * spread`,
    /// wrapped into one cycle.
    pub fn set_stereo_spread(&mut self, spread_cycles: f32, skip_smoothing: bool) {
        for ch in 0..self.phase_offsets.num_channels() {
            let offset = (ch as f32 * spread_cycles).rem_euclid(1.0);
            self.phase_offsets.set_target_for(ch, offset, skip_smoothing);
        }
    }

    /// Moves the shared phase forward by one sample. Call once per frame,
    /// before reading any channel.
    #[inline]
    pub fn advance(&mut self) {
        self.phase += f64::from(self.rate_hz) / f64::from(self.sample_rate);
        self.phase -= self.phase.floor();
    }

    /// The shared phase in cycles, `[0, 1)`.
    pub fn phase(&self) -> f64 {
        self.phase
    }

    /// The channel's output at the current phase. Advances that channel's
    /// offset smoother.
    #[inline]
    pub fn value(&mut self, channel: usize) -> f32 {
        let offset = f64::from(self.phase_offsets.next_value(channel));
        let phase = self.phase + offset;
        self.shape.eval((phase - phase.floor()) as f32)
    }

    /// Restarts the cycle at phase 0.
    pub fn reset(&mut self) {
        self.phase = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_triangle_matches_sine_landmarks() {
        for (phase, expected) in [(0.0, 0.0), (0.25, 1.0), (0.5, 0.0), (0.75, -1.0)] {
            let tri = LfoShape::Triangle.eval(phase);
            let sine = LfoShape::Sine.eval(phase);
            assert!((tri - expected).abs() < 1e-6, "triangle at {phase}: {tri}");
            assert!((sine - expected).abs() < 1e-6, "sine at {phase}: {sine}");
        }
    }

    #[test]
    fn test_output_stays_bipolar() {
        for shape in [LfoShape::Sine, LfoShape::Triangle] {
            let mut lfo = Lfo::new(shape);
            lfo.prepare(1, 1000.0, 0.0);
            lfo.set_rate(7.3);
            for _ in 0..5000 {
                lfo.advance();
                let v = lfo.value(0);
                assert!((-1.0..=1.0).contains(&v), "{shape:?} out of range: {v}");
            }
        }
    }

    /// A 1 Hz LFO at 100 Hz sample rate completes a cycle in 100 frames.
    #[test]
    fn test_period_follows_rate() {
        let mut lfo = Lfo::new(LfoShape::Sine);
        lfo.prepare(1, 100.0, 0.0);
        lfo.set_rate(1.0);
        for _ in 0..25 {
            lfo.advance();
        }
        assert!((lfo.value(0) - 1.0).abs() < 1e-3, "quarter cycle should peak");
        for _ in 0..75 {
            lfo.advance();
        }
        assert!(lfo.value(0).abs() < 1e-3, "full cycle should return to 0");
    }

    /// At 0.01 Hz and 48 kHz the per-sample increment is a few f32 ULPs
    /// near phase 1.0; the accumulated phase must still match the rate.
    #[test]
    fn test_slow_rate_keeps_exact_period() {
        let mut lfo = Lfo::new(LfoShape::Sine);
        lfo.prepare(1, 48000.0, 0.0);
        lfo.set_rate(0.01);

        // 0.95 cycles takes 95 s.
        for _ in 0..(95 * 48000) {
            lfo.advance();
        }
        assert!(
            (lfo.phase() - 0.95).abs() < 1e-6,
            "phase drifted to {}",
            lfo.phase()
        );
    }

    /// A half-cycle spread puts the second channel in antiphase.
    #[test]
    fn test_stereo_spread_offsets_channels() {
        let mut lfo = Lfo::new(LfoShape::Sine);
        lfo.prepare(2, 1000.0, 0.0);
        lfo.set_rate(3.0);
        lfo.set_stereo_spread(0.5, true);
        for _ in 0..123 {
            lfo.advance();
            let left = lfo.value(0);
            let right = lfo.value(1);
            assert!((left + right).abs() < 1e-4, "expected antiphase, got {left} / {right}");
        }
    }
}
