//! # Interpolation Kernels
//!
//! A delay line stores whole samples, but modulated delays ask for
//! positions *between* samples (e.g. 441.3 samples ago). An interpolator
//! reconstructs the in-between value from a few stored neighbors.
//!
//! Every kernel works on one channel's power-of-two sized segment of a
//! circular buffer. Neighbor indices wrap with a bitmask:
//!
//! ```text
//! neighbor = (index + size ± k) & (size - 1)
//! ```
//!
//! ## Backward vs Forward
//!
//! Each kernel comes in two flavors:
//!
//! - **Backward** walks toward *older* samples (`index - 1`, `index - 2`,
//!   ...). A delay line must use this one: the samples after the read
//!   anchor are newer than the requested position and, at small delays,
//!   may not have been written yet.
//! - **Forward** walks toward *later* samples in a time-ordered buffer
//!   (`index + 1`, ...) and, for Lagrange, uses a symmetric window around
//!   the position. This suits resampling and wavetable playback where the
//!   whole signal is already available.
//!
//! In both cases `frac = 0.0` returns `buffer[index]` exactly.

/// A fractional-position reconstruction kernel.
///
/// Implementors are zero-sized policy types; the delay line is generic
/// over them so each kernel is monomorphized into the processing loop.
pub trait Interpolator {
    /// How many samples behind the anchor the backward kernel may read.
    const HISTORY: usize;

    /// Reads `frac` of the way from `buffer[index]` toward older samples.
    fn interpolate_backward(buffer: &[f32], index: usize, frac: f32, size: usize) -> f32;

    /// Reads `frac` of the way from `buffer[index]` toward later samples.
    fn interpolate_forward(buffer: &[f32], index: usize, frac: f32, size: usize) -> f32;
}

#[inline]
fn wrap(index: usize, size: usize) -> usize {
    index & (size - 1)
}

/// Integer-only reads. The fractional part is ignored.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoInterpolation;

impl Interpolator for NoInterpolation {
    const HISTORY: usize = 0;

    #[inline]
    fn interpolate_backward(buffer: &[f32], index: usize, _frac: f32, size: usize) -> f32 {
        buffer[wrap(index, size)]
    }

    #[inline]
    fn interpolate_forward(buffer: &[f32], index: usize, _frac: f32, size: usize) -> f32 {
        buffer[wrap(index, size)]
    }
}

/// Picks whichever stored sample is closer to the requested position.
///
/// Ties (`frac == 0.5`) go to the neighbor.
#[derive(Debug, Clone, Copy, Default)]
pub struct Nearest;

impl Interpolator for Nearest {
    const HISTORY: usize = 1;

    #[inline]
    fn interpolate_backward(buffer: &[f32], index: usize, frac: f32, size: usize) -> f32 {
        if frac < 0.5 {
            buffer[wrap(index, size)]
        } else {
            buffer[wrap(index + size - 1, size)]
        }
    }

    #[inline]
    fn interpolate_forward(buffer: &[f32], index: usize, frac: f32, size: usize) -> f32 {
        if frac < 0.5 {
            buffer[wrap(index, size)]
        } else {
            buffer[wrap(index + 1, size)]
        }
    }
}

/// Straight-line blend between two adjacent samples.
///
/// ```text
/// result = a + (b - a) * frac
/// ```
///
/// Cheap and click-free, but it acts as a mild lowpass whose strength
/// depends on `frac`, so modulated delays lose a little top end.
#[derive(Debug, Clone, Copy, Default)]
pub struct Linear;

impl Interpolator for Linear {
    const HISTORY: usize = 1;

    #[inline]
    fn interpolate_backward(buffer: &[f32], index: usize, frac: f32, size: usize) -> f32 {
        let a = buffer[wrap(index, size)];
        let b = buffer[wrap(index + size - 1, size)];
        a + (b - a) * frac
    }

    #[inline]
    fn interpolate_forward(buffer: &[f32], index: usize, frac: f32, size: usize) -> f32 {
        let a = buffer[wrap(index, size)];
        let b = buffer[wrap(index + 1, size)];
        a + (b - a) * frac
    }
}

/// Third-order (4-point) Lagrange interpolation.
///
/// Fits the unique cubic through four neighboring samples and evaluates
/// it at the requested position. Exact for any signal that is locally a
/// polynomial of degree three or less, and much flatter in frequency
/// response than [`Linear`].
///
/// The backward kernel uses the anchor plus three older samples placed at
/// positions 0, 1, 2, 3 and evaluates at `frac`, so it never touches a
/// sample newer than the anchor. The forward kernel uses one earlier and
/// two later samples at positions -1, 0, 1, 2, centering the window on
/// the interval being reconstructed.
#[derive(Debug, Clone, Copy, Default)]
pub struct Lagrange3rd;

impl Interpolator for Lagrange3rd {
    const HISTORY: usize = 3;

    #[inline]
    fn interpolate_backward(buffer: &[f32], index: usize, frac: f32, size: usize) -> f32 {
        let y0 = buffer[wrap(index, size)];
        let y1 = buffer[wrap(index + size - 1, size)];
        let y2 = buffer[wrap(index + size - 2, size)];
        let y3 = buffer[wrap(index + size - 3, size)];

        let d1 = frac - 1.0;
        let d2 = frac - 2.0;
        let d3 = frac - 3.0;

        let c0 = -d1 * d2 * d3 / 6.0;
        let c1 = frac * d2 * d3 * 0.5;
        let c2 = -frac * d1 * d3 * 0.5;
        let c3 = frac * d1 * d2 / 6.0;

        y0 * c0 + y1 * c1 + y2 * c2 + y3 * c3
    }

    #[inline]
    fn interpolate_forward(buffer: &[f32], index: usize, frac: f32, size: usize) -> f32 {
        let ym1 = buffer[wrap(index + size - 1, size)];
        let y0 = buffer[wrap(index, size)];
        let y1 = buffer[wrap(index + 1, size)];
        let y2 = buffer[wrap(index + 2, size)];

        let dp1 = frac + 1.0;
        let dm1 = frac - 1.0;
        let dm2 = frac - 2.0;

        let cm1 = -frac * dm1 * dm2 / 6.0;
        let c0 = dp1 * dm1 * dm2 * 0.5;
        let c1 = -dp1 * frac * dm2 * 0.5;
        let c2 = dp1 * frac * dm1 / 6.0;

        ym1 * cm1 + y0 * c0 + y1 * c1 + y2 * c2
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A ramp laid out as a ring of 8: buffer[i] = i.
    fn ramp() -> Vec<f32> {
        (0..8).map(|i| i as f32).collect()
    }

    /// A cubic sampled at integer positions, for checking Lagrange exactness.
    fn cubic(x: f32) -> f32 {
        0.005 * x * x * x - 0.05 * x * x + 0.3 * x + 1.0
    }

    #[test]
    fn test_zero_frac_returns_anchor_for_every_kernel() {
        let buf = ramp();
        for idx in 0..8 {
            let expected = idx as f32;
            assert_eq!(NoInterpolation::interpolate_backward(&buf, idx, 0.0, 8), expected);
            assert_eq!(Nearest::interpolate_backward(&buf, idx, 0.0, 8), expected);
            assert_eq!(Linear::interpolate_backward(&buf, idx, 0.0, 8), expected);
            assert_eq!(Nearest::interpolate_forward(&buf, idx, 0.0, 8), expected);
            assert_eq!(Linear::interpolate_forward(&buf, idx, 0.0, 8), expected);
            let lb = Lagrange3rd::interpolate_backward(&buf, idx, 0.0, 8);
            let lf = Lagrange3rd::interpolate_forward(&buf, idx, 0.0, 8);
            assert!((lb - expected).abs() < 1e-6, "backward at {idx}: {lb}");
            assert!((lf - expected).abs() < 1e-6, "forward at {idx}: {lf}");
        }
    }

    #[test]
    fn test_none_ignores_frac() {
        let buf = ramp();
        assert_eq!(NoInterpolation::interpolate_backward(&buf, 5, 0.9, 8), 5.0);
        assert_eq!(NoInterpolation::interpolate_forward(&buf, 5, 0.9, 8), 5.0);
    }

    #[test]
    fn test_nearest_switches_at_half() {
        let buf = ramp();
        assert_eq!(Nearest::interpolate_backward(&buf, 4, 0.49, 8), 4.0);
        assert_eq!(Nearest::interpolate_backward(&buf, 4, 0.5, 8), 3.0);
        assert_eq!(Nearest::interpolate_forward(&buf, 4, 0.49, 8), 4.0);
        assert_eq!(Nearest::interpolate_forward(&buf, 4, 0.5, 8), 5.0);
    }

    #[test]
    fn test_linear_blends_in_both_directions() {
        let buf = ramp();
        let back = Linear::interpolate_backward(&buf, 4, 0.25, 8);
        let fwd = Linear::interpolate_forward(&buf, 4, 0.25, 8);
        assert!((back - 3.75).abs() < 1e-6, "Expected 3.75, got {back}");
        assert!((fwd - 4.25).abs() < 1e-6, "Expected 4.25, got {fwd}");
    }

    /// Reading across the start of the ring must pull from the end.
    #[test]
    fn test_backward_wraps_across_start() {
        let buf = ramp();
        // Anchor 0, neighbor is index 7.
        let v = Linear::interpolate_backward(&buf, 0, 0.5, 8);
        assert!((v - 3.5).abs() < 1e-6, "Expected 3.5, got {v}");
        assert_eq!(Nearest::interpolate_backward(&buf, 0, 0.75, 8), 7.0);
    }

    #[test]
    fn test_forward_wraps_across_end() {
        let buf = ramp();
        let v = Linear::interpolate_forward(&buf, 7, 0.5, 8);
        assert!((v - 3.5).abs() < 1e-6, "Expected 3.5, got {v}");
    }

    /// Backward Lagrange reconstructs a cubic exactly from past samples.
    ///
    /// The buffer holds the cubic in *time order*, so stepping backward in
    /// the buffer means stepping backward in x.
    #[test]
    fn test_lagrange_backward_exact_on_cubic() {
        let size = 16;
        let buf: Vec<f32> = (0..size).map(|i| cubic(i as f32)).collect();
        for frac in [0.0, 0.1, 0.25, 0.5, 0.8, 0.99] {
            let got = Lagrange3rd::interpolate_backward(&buf, 10, frac, size);
            let expected = cubic(10.0 - frac);
            assert!(
                (got - expected).abs() < 1e-3,
                "frac {frac}: expected {expected}, got {got}"
            );
        }
    }

    #[test]
    fn test_lagrange_forward_exact_on_cubic() {
        let size = 16;
        let buf: Vec<f32> = (0..size).map(|i| cubic(i as f32)).collect();
        for frac in [0.0, 0.1, 0.25, 0.5, 0.8, 0.99] {
            let got = Lagrange3rd::interpolate_forward(&buf, 5, frac, size);
            let expected = cubic(5.0 + frac);
            assert!(
                (got - expected).abs() < 1e-3,
                "frac {frac}: expected {expected}, got {got}"
            );
        }
    }

    /// The backward kernel must never look at samples newer than the anchor.
    #[test]
    fn test_lagrange_backward_is_causal() {
        let mut buf = vec![0.0_f32; 8];
        // Poison the slot just after the anchor.
        buf[5] = 1.0e6;
        let v = Lagrange3rd::interpolate_backward(&buf, 4, 0.5, 8);
        assert!(v.abs() < 1e-6, "Backward kernel read a future sample: {v}");
    }

    #[test]
    fn test_lagrange_weights_sum_to_one() {
        let buf = vec![1.0_f32; 8];
        for frac in [0.0, 0.3, 0.5, 0.7, 0.999] {
            let b = Lagrange3rd::interpolate_backward(&buf, 2, frac, 8);
            let f = Lagrange3rd::interpolate_forward(&buf, 6, frac, 8);
            assert!((b - 1.0).abs() < 1e-5, "backward DC gain {b}");
            assert!((f - 1.0).abs() < 1e-5, "forward DC gain {f}");
        }
    }
}
