//! Fretloop Core - DSP primitives for audio effects
//!
//! This crate provides the foundational building blocks for audio DSP, designed for
//! real-time audio processing with zero allocation in the audio path.
//!
//! # Core Abstractions
//!
//! ## Effect System
//!
//! - [`Effect`] - Object-safe trait for all audio effects
//! - [`EffectExt`] - Extension trait for effect chaining
//! - [`Chain`] - Zero-cost effect chain combinator
//!
//! ## Parameter Smoothing
//!
//! Zipper-free parameter changes for click-free automation:
//!
//! - [`SmoothedParam`] - Exponential smoothing (RC-like response)
//! - [`LinearSmoothedParam`] - Linear ramps (constant rate)
//!
//! ## Filters
//!
//! - [`StateVariableFilter`] - Multi-output SVF (lowpass, highpass, bandpass simultaneously)
//!
//! ## Delay Lines
//!
//! - [`InterpolatedDelay`] - Variable-length delay with interpolation
//! - [`FixedDelayLine`] - Fixed-length delay (compile-time size)
//!
//! ## Modulation
//!
//! - [`Lfo`] - Low-frequency oscillator (5 waveforms)
//!
//! ## Utilities
//!
//! - Math functions: [`db_to_linear`], [`linear_to_db`], [`fast_tanh`], etc.
//! - [`PitchClass`], [`ChordQuality`] - shared twelve-tone vocabulary between
//!   the chord detector and the synth/arpeggiator
//!
//! # no_std Support
//!
//! This crate is `no_std` compatible for embedded audio applications.
//! Disable the default `std` feature in your `Cargo.toml`:
//!
//! ```toml
//! [dependencies]
//! fretloop-core = { version = "0.1", default-features = false }
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use fretloop_core::{Effect, EffectExt, SmoothedParam};
//!
//! // Create effects and chain them with zero-cost static dispatch
//! let mut chain = distortion.chain(chorus).chain(delay);
//!
//! // Process audio sample-by-sample
//! for sample in audio_buffer.iter_mut() {
//!     *sample = chain.process(*sample);
//! }
//!
//! // Or process entire blocks for efficiency
//! chain.process_block(&input, &mut output);
//!
//! // For runtime flexibility, use dynamic dispatch
//! let effects: Vec<Box<dyn Effect>> = vec![
//!     Box::new(distortion),
//!     Box::new(chorus),
//! ];
//! ```
//!
//! # Design Principles
//!
//! - **Real-time safe**: No allocations in audio processing paths
//! - **No dependencies on std**: Pure `no_std` with `libm` for math
//! - **Object-safe traits**: Dynamic dispatch when needed
//! - **Zero-cost abstractions**: Static dispatch chains optimize away

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(not(feature = "std"))]
extern crate alloc;

pub mod adaa;
pub mod delay;
pub mod effect;
pub mod gain;
pub mod lfo;
pub mod math;
pub mod one_pole;
pub mod param;
pub mod param_info;
pub mod pitch;
pub mod svf;
pub mod tempo;

// Re-export main types at crate root
pub use adaa::Adaa1;
pub use delay::{FixedDelayLine, InterpolatedDelay, Interpolation};
pub use effect::{Chain, Effect, EffectExt};
pub use lfo::{Lfo, LfoWaveform};
pub use math::{
    asymmetric_clip, asymmetric_clip_ad, clamp, db_to_linear, fast_tanh, flush_denormal, foldback,
    hard_clip, hard_clip_ad, hz_to_omega, lerp, linear_to_db, mono_sum, ms_to_samples, samples_to_ms,
    soft_clip, soft_clip_ad, soft_limit, soft_limit_stereo, tape_sat_ad, tape_sat_neg_ad,
    tape_sat_pos_ad, wet_dry_mix, wet_dry_mix_stereo,
};
pub use one_pole::OnePole;
pub use param::{LinearSmoothedParam, SmoothedParam};
pub use param_info::{ParamDescriptor, ParamFlags, ParamId, ParamScale, ParamUnit, ParameterInfo};
pub use pitch::{A4_FREQUENCY, ChordQuality, PitchClass, frequency_to_note, note_frequency};
pub use svf::{StateVariableFilter, SvfOutput};
pub use tempo::{NoteDivision, TempoManager, TransportState};
