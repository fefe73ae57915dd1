//! # Multi-Channel Circular Buffer
//!
//! One flat `Vec<f32>` holds every channel back to back, each channel
//! owning a segment of `capacity` samples. The capacity is always rounded
//! up to a power of two so that wrapping an index is a single bitmask:
//!
//! ```text
//! index & (capacity - 1)      instead of      index % capacity
//! ```
//!
//! Each channel has its own write cursor. A write stores the sample at
//! the cursor and advances it by one, wrapping at the end of the segment.
//! Reads are done by the caller (usually an [`Interpolator`](super::interpolation::Interpolator))
//! on the raw channel slice, using [`write_index`](CircularBuffer::write_index)
//! as the reference point.
//!
//! Only [`resize`](CircularBuffer::resize) allocates. Everything else is
//! safe to call from the audio thread.

use nih_plug::nih_debug_assert;

use crate::error::{ConfigError, ConfigResult};

/// Largest per-channel capacity [`CircularBuffer::resize`] accepts:
/// 2^24 samples, about six minutes at 48 kHz.
pub const MAX_CAPACITY: usize = 1 << 24;

/// Fixed-capacity ring buffer with one write cursor per channel.
#[derive(Debug, Clone, Default)]
pub struct CircularBuffer {
    data: Vec<f32>,
    write_indices: Vec<usize>,
    capacity: usize,
}

impl CircularBuffer {
    /// An empty buffer with no channels. Call [`resize`](Self::resize)
    /// before use.
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocates `num_channels` segments of at least `requested_capacity`
    /// samples each, rounded up to the next power of two.
    ///
    /// All samples are zeroed and all write cursors reset to 0.
    pub fn resize(&mut self, num_channels: usize, requested_capacity: usize) -> ConfigResult<()> {
        ConfigError::check_channels(num_channels)?;
        if requested_capacity == 0 {
            return Err(ConfigError::ZeroCapacity);
        }

        let too_large = ConfigError::CapacityTooLarge {
            requested: requested_capacity,
            limit: MAX_CAPACITY,
        };
        let capacity = requested_capacity
            .checked_next_power_of_two()
            .filter(|c| *c <= MAX_CAPACITY)
            .ok_or_else(|| too_large.clone())?;
        let total = num_channels.checked_mul(capacity).ok_or(too_large)?;

        self.data = vec![0.0; total];
        self.write_indices = vec![0; num_channels];
        self.capacity = capacity;
        Ok(())
    }

    /// Stores `sample` at the channel's cursor and advances the cursor.
    #[inline]
    pub fn write(&mut self, channel: usize, sample: f32) {
        nih_debug_assert!(channel < self.write_indices.len());
        let mask = self.mask();
        let pos = self.write_indices[channel];
        self.data[channel * self.capacity + pos] = sample;
        self.write_indices[channel] = (pos + 1) & mask;
    }

    /// The channel's whole segment, in storage order.
    #[inline]
    pub fn channel(&self, channel: usize) -> &[f32] {
        nih_debug_assert!(channel < self.write_indices.len());
        let start = channel * self.capacity;
        &self.data[start..start + self.capacity]
    }

    /// Where the next write on this channel will land.
    #[inline]
    pub fn write_index(&self, channel: usize) -> usize {
        self.write_indices[channel]
    }

    /// The sample written `offset` writes ago (`offset = 1` is the most
    /// recent). Offsets are taken modulo the capacity.
    #[inline]
    pub fn read_back(&self, channel: usize, offset: usize) -> f32 {
        let mask = self.mask();
        let pos = (self.write_indices[channel] + self.capacity - (offset & mask)) & mask;
        self.channel(channel)[pos]
    }

    /// Zero-fills every channel. Capacity and cursors are unchanged.
    pub fn clear(&mut self) {
        self.data.fill(0.0);
    }

    /// Samples per channel (a power of two, or 0 before `resize`).
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// `capacity - 1`, the wrap mask.
    #[inline]
    pub fn mask(&self) -> usize {
        self.capacity.wrapping_sub(1)
    }

    pub fn num_channels(&self) -> usize {
        self.write_indices.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_capacity_rounds_up_to_power_of_two() {
        let mut buf = CircularBuffer::new();
        for (requested, expected) in [(1, 1), (3, 4), (64, 64), (65, 128), (1000, 1024)] {
            buf.resize(2, requested).unwrap();
            assert_eq!(buf.capacity(), expected);
            assert_eq!(buf.mask(), expected - 1);
            assert_eq!(buf.num_channels(), 2);
        }
    }

    #[test]
    fn test_resize_rejects_degenerate_sizes() {
        let mut buf = CircularBuffer::new();
        assert_eq!(buf.resize(0, 16), Err(ConfigError::ZeroChannels));
        assert_eq!(buf.resize(1, 0), Err(ConfigError::ZeroCapacity));
    }

    /// Oversized requests fail cleanly instead of overflowing the
    /// power-of-two rounding or the total allocation.
    #[test]
    fn test_resize_rejects_oversized_requests() {
        let mut buf = CircularBuffer::new();
        buf.resize(1, 8).unwrap();

        for (channels, requested) in [(1, usize::MAX), (1, MAX_CAPACITY + 1), (usize::MAX, 4)] {
            assert!(
                matches!(
                    buf.resize(channels, requested),
                    Err(ConfigError::CapacityTooLarge { .. })
                ),
                "accepted {channels} x {requested}"
            );
        }
        // A rejected resize leaves the old storage in place.
        assert_eq!(buf.capacity(), 8);
        assert_eq!(buf.num_channels(), 1);
    }

    #[test]
    fn test_write_advances_and_wraps_cursor() {
        let mut buf = CircularBuffer::new();
        buf.resize(1, 4).unwrap();
        for i in 0..6 {
            buf.write(0, i as f32);
        }
        // Six writes into four slots: cursor at 2, slots 0/1 overwritten.
        assert_eq!(buf.write_index(0), 2);
        assert_eq!(buf.channel(0), &[4.0, 5.0, 2.0, 3.0]);
    }

    #[test]
    fn test_channels_are_independent() {
        let mut buf = CircularBuffer::new();
        buf.resize(2, 4).unwrap();
        buf.write(0, 1.0);
        buf.write(0, 2.0);
        buf.write(1, -1.0);

        assert_eq!(buf.write_index(0), 2);
        assert_eq!(buf.write_index(1), 1);
        assert_eq!(buf.channel(0), &[1.0, 2.0, 0.0, 0.0]);
        assert_eq!(buf.channel(1), &[-1.0, 0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_read_back_follows_write_order() {
        let mut buf = CircularBuffer::new();
        buf.resize(1, 8).unwrap();
        for i in 1..=10 {
            buf.write(0, i as f32);
        }
        assert_eq!(buf.read_back(0, 1), 10.0);
        assert_eq!(buf.read_back(0, 2), 9.0);
        assert_eq!(buf.read_back(0, 8), 3.0);
    }

    #[test]
    fn test_clear_keeps_cursor_and_capacity() {
        let mut buf = CircularBuffer::new();
        buf.resize(1, 4).unwrap();
        buf.write(0, 0.5);
        buf.write(0, 0.25);
        buf.clear();

        assert_eq!(buf.capacity(), 4);
        assert_eq!(buf.write_index(0), 2);
        assert_eq!(buf.channel(0), &[0.0; 4]);
    }
}
