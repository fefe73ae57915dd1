//! Configuration errors for the delay core.
//!
//! Only prepare-time setup can fail. Everything that runs on the audio
//! thread clamps out-of-range values instead of returning errors.

use thiserror::Error;

/// Result type for prepare-time operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Errors raised when a component is prepared with an unusable
/// configuration.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    /// At least one channel is required.
    #[error("channel count must be at least 1")]
    ZeroChannels,

    /// Sample rate must be finite and positive.
    #[error("invalid sample rate: {rate} Hz")]
    InvalidSampleRate {
        /// The rejected sample rate.
        rate: f32,
    },

    /// Maximum delay must be finite and positive.
    #[error("invalid maximum delay: {max_delay_ms} ms")]
    InvalidMaxDelay {
        /// The rejected maximum delay in milliseconds.
        max_delay_ms: f32,
    },

    /// A circular buffer cannot hold zero samples per channel.
    #[error("buffer capacity must be at least 1 sample")]
    ZeroCapacity,

    /// The requested storage exceeds what a circular buffer may allocate.
    #[error("buffer capacity of {requested} samples per channel exceeds the limit of {limit}")]
    CapacityTooLarge {
        /// The rejected per-channel capacity.
        requested: usize,
        /// The largest capacity allowed.
        limit: usize,
    },
}

impl ConfigError {
    /// Checks a sample rate, returning it unchanged when usable.
    pub fn check_sample_rate(rate: f32) -> ConfigResult<f32> {
        if rate.is_finite() && rate > 0.0 {
            Ok(rate)
        } else {
            Err(Self::InvalidSampleRate { rate })
        }
    }

    /// Checks a channel count, returning it unchanged when usable.
    pub fn check_channels(num_channels: usize) -> ConfigResult<usize> {
        if num_channels == 0 {
            Err(Self::ZeroChannels)
        } else {
            Ok(num_channels)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_rate_validation() {
        assert_eq!(ConfigError::check_sample_rate(48000.0), Ok(48000.0));
        assert!(ConfigError::check_sample_rate(0.0).is_err());
        assert!(ConfigError::check_sample_rate(-44100.0).is_err());
        assert!(ConfigError::check_sample_rate(f32::NAN).is_err());
        assert!(ConfigError::check_sample_rate(f32::INFINITY).is_err());
    }

    #[test]
    fn test_error_messages() {
        assert_eq!(
            ConfigError::ZeroChannels.to_string(),
            "channel count must be at least 1"
        );
        assert_eq!(
            ConfigError::InvalidMaxDelay { max_delay_ms: -1.0 }.to_string(),
            "invalid maximum delay: -1 ms"
        );
    }
}
