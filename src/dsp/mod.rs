//! # DSP Building Blocks
//!
//! Everything here is real-time safe once prepared: `prepare` allocates,
//! the per-sample and per-block paths never do.
//!
//! - **`interpolation`**: fractional-index kernels for reading between
//!   stored samples (none, nearest, linear, 3rd-order Lagrange).
//!
//! - **`buffer`**: a multi-channel circular buffer with a power-of-two
//!   capacity, so wrapping is a single bitmask.
//!
//! - **`smoothing`**: one-pole (optionally cascaded) and linear-ramp
//!   smoothers that glide a value toward its target per channel.
//!
//! - **`param`**: a smoother with bounds. Modulation is applied first,
//!   then the result is clamped.
//!
//! - **`delay_line`**: the buffer, a smoothed delay time and an
//!   interpolator put together. The core of every time-based effect.
//!
//! - **`filter`**: a one-pole lowpass that darkens the feedback path.
//!
//! - **`lfo`**: the internal modulation source.
//!
//! - **`mod_delay`**: delay + feedback + cross-feedback + modulation, the
//!   engine behind delay, chorus and flanger sounds.

pub mod buffer;
pub mod delay_line;
pub mod filter;
pub mod interpolation;
pub mod lfo;
pub mod mod_delay;
pub mod param;
pub mod smoothing;

pub use buffer::CircularBuffer;
pub use delay_line::{BufferLayout, DelayLine, DelayLineConfig};
pub use filter::DampingFilter;
pub use interpolation::{Interpolator, Lagrange3rd, Linear, Nearest, NoInterpolation};
pub use lfo::{Lfo, LfoShape};
pub use mod_delay::{ModulatedDelay, ModulatedDelayConfig};
pub use param::DspParam;
pub use smoothing::{LinearSmoother, OnePoleSmoother, Smoother};
