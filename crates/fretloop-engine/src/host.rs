//! Abstract audio host interface (sample rate/block size reporting).
//!
//! This is deliberately narrow: it only describes what the engine needs to
//! know about the host driving it, not how that host is built. A host
//! (a `cpal` stream callback, a plugin's process call, an audio worklet)
//! reads [`sample_rate`](AudioHost::sample_rate)/[`block_size`](AudioHost::block_size)
//! once to build an [`EngineConfig`](crate::engine::EngineConfig) and then
//! drives [`Engine::process`](crate::Engine::process) directly from its own
//! callback; there is no callback-registration surface here.

use crate::error::ConfigurationError;

/// Sample rates the engine supports.
pub const SUPPORTED_SAMPLE_RATES: [u32; 4] = [44_100, 48_000, 96_000, 192_000];

/// Smallest block size the engine accepts.
pub const MIN_BLOCK_SIZE: usize = 128;

/// Largest block size the engine accepts.
pub const MAX_BLOCK_SIZE: usize = 8192;

/// Reject a sample rate outside [`SUPPORTED_SAMPLE_RATES`].
pub fn validate_sample_rate(sample_rate: u32) -> Result<(), ConfigurationError> {
    if SUPPORTED_SAMPLE_RATES.contains(&sample_rate) {
        Ok(())
    } else {
        Err(ConfigurationError::UnsupportedSampleRate(sample_rate))
    }
}

/// Reject a block size that isn't a power of two in `[MIN_BLOCK_SIZE, MAX_BLOCK_SIZE]`.
pub fn validate_block_size(block_size: usize) -> Result<(), ConfigurationError> {
    if (MIN_BLOCK_SIZE..=MAX_BLOCK_SIZE).contains(&block_size) && block_size.is_power_of_two() {
        Ok(())
    } else {
        Err(ConfigurationError::InvalidBlockSize(block_size))
    }
}

/// What the engine needs to know about the real-time host driving it.
pub trait AudioHost {
    /// Stream sample rate in Hz; one of [`SUPPORTED_SAMPLE_RATES`].
    fn sample_rate(&self) -> u32;

    /// Stream block size in frames; a power of two in `128..=8192`.
    fn block_size(&self) -> usize;
}
