//! # One-Pole Damping Filter
//!
//! A one-pole lowpass placed in a delay's feedback path. Every trip
//! around the loop passes through it again, so each repeat comes back a
//! little darker than the one before, the way tape and bucket-brigade
//! delays lose their top end.
//!
//! ```text
//! y[n] = (1 - a) * x[n] + a * y[n-1]
//! a    = e^(-2π * cutoff_hz / sample_rate)
//! ```
//!
//! `a = 0` passes the input through untouched; as `a → 1` the output
//! barely moves. The cutoff is kept within [20 Hz, 0.49 · sample rate]
//! so the coefficient never reaches the frozen (`a = 1`) or unstable end.
//! Damping can also be switched off entirely, in which case the filter is
//! a pass-through and its state is left alone.

use std::f32::consts::PI;

/// Per-channel one-pole lowpass with a shared cutoff.
#[derive(Debug, Clone)]
pub struct DampingFilter {
    coefficient: f32,
    prev_outputs: Vec<f32>,
    sample_rate: f32,
    enabled: bool,
}

impl Default for DampingFilter {
    fn default() -> Self {
        Self {
            coefficient: 0.0,
            prev_outputs: Vec::new(),
            sample_rate: 44100.0,
            enabled: false,
        }
    }
}

impl DampingFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocates one state slot per channel. Not real-time safe.
    pub fn prepare(&mut self, num_channels: usize, sample_rate: f32) {
        self.prev_outputs = vec![0.0; num_channels];
        self.sample_rate = sample_rate;
    }

    /// Enables damping at `cutoff_hz`, or disables it with `None`.
    pub fn set_cutoff(&mut self, cutoff_hz: Option<f32>) {
        match cutoff_hz {
            Some(hz) => {
                let safe_cutoff = hz.clamp(20.0, self.sample_rate * 0.49);
                self.coefficient = (-2.0 * PI * safe_cutoff / self.sample_rate).exp();
                self.enabled = true;
            }
            None => {
                self.coefficient = 0.0;
                self.enabled = false;
            }
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn coefficient(&self) -> f32 {
        self.coefficient
    }

    #[inline]
    pub fn process(&mut self, channel: usize, input: f32) -> f32 {
        if !self.enabled {
            return input;
        }
        let prev = &mut self.prev_outputs[channel];
        let output = (1.0 - self.coefficient) * input + self.coefficient * *prev;
        *prev = output;
        output
    }

    /// Zeroes the filter memory of every channel.
    pub fn reset(&mut self) {
        self.prev_outputs.fill(0.0);
    }
}

// ─────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────
