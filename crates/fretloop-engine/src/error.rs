//! Error taxonomy for the engine lifecycle and parameter bus.
//!
//! Four categories, matching the points in the engine's lifecycle where
//! something can go wrong: configuration is validated once at [`start`](crate::Engine::start)
//! and at each parameter-bus write, lifecycle errors guard `start`/`stop`
//! against being called out of order, resource errors cover allocation at
//! `start`, and runtime anomalies are never propagated — they are counted
//! in the status snapshot instead (see [`RuntimeAnomaly`]).

use thiserror::Error;

/// An invalid configuration was supplied at [`Engine::start`](crate::Engine::start)
/// or through a [`ParameterBus`](crate::ParameterBus) setter.
#[derive(Debug, Error, Clone, Copy, PartialEq)]
pub enum ConfigurationError {
    /// Host reported a sample rate outside the supported set.
    #[error("unsupported sample rate {0}Hz (expected 44100, 48000, 96000, or 192000)")]
    UnsupportedSampleRate(u32),
    /// Host reported a block size that isn't a power of two in 128..=8192.
    #[error("block size {0} is not a power of two in 128..=8192")]
    InvalidBlockSize(usize),
    /// A parameter-bus write fell outside the parameter's documented domain.
    #[error("parameter '{name}' value {value} out of range {min}..={max}")]
    ParameterOutOfRange {
        name: &'static str,
        value: f32,
        min: f32,
        max: f32,
    },
    /// The compiled voice pool is smaller than the minimum of 32 voices.
    #[error("voice count {0} is below the minimum of 32")]
    VoiceCountTooLow(usize),
}

/// `start`/`stop` called out of order.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleError {
    /// `start` was called while the engine was already running.
    #[error("engine already running")]
    AlreadyRunning,
    /// `stop` was called while the engine was not running.
    #[error("engine is not running")]
    NotRunning,
}

/// Allocation or sizing failed while bringing the engine up.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ResourceError {
    /// The delay lines could not be sized for the requested sample rate.
    #[error("allocation failed while sizing the delay buffer")]
    AllocationFailed,
    /// Requested block size exceeds the compile-time ceiling.
    #[error("block size {0} exceeds the compile-time ceiling of {1}")]
    BlockSizeCeilingExceeded(usize, usize),
    /// Delay buffers would exceed the configured memory budget.
    #[error("delay buffer of {0} bytes exceeds the {1}-byte memory budget")]
    DelayBufferOverBudget(usize, usize),
}

/// A non-fatal condition observed during `process`. Never returned from
/// `process` itself — counted here and surfaced through the status
/// snapshot so a host can decide whether to react.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RuntimeAnomaly {
    /// Nothing anomalous since the last `reset`.
    #[default]
    None,
    /// A non-finite (NaN/Inf) sample was produced and replaced with 0.
    NonFiniteSample,
    /// A note-on arrived with no free or released voice to allocate; the
    /// oldest voice overall was stolen instead.
    VoicePoolExhausted,
    /// A block was dropped from chord-detector analysis because the
    /// analysis buffer was still draining the previous block.
    AnalysisSkippedOverrun,
}

impl RuntimeAnomaly {
    /// Short machine-readable name, used in log fields.
    pub fn name(self) -> &'static str {
        match self {
            RuntimeAnomaly::None => "none",
            RuntimeAnomaly::NonFiniteSample => "non_finite_sample",
            RuntimeAnomaly::VoicePoolExhausted => "voice_pool_exhausted",
            RuntimeAnomaly::AnalysisSkippedOverrun => "analysis_skipped_overrun",
        }
    }
}

/// Unified error type returned from [`Engine::start`](crate::Engine::start)
/// and [`Engine::stop`](crate::Engine::stop).
#[derive(Debug, Error, Clone, Copy, PartialEq)]
pub enum EngineError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),
    #[error(transparent)]
    Resource(#[from] ResourceError),
}
