//! Fretloop Effects - stereo delay and distortion for the signal chain
//!
//! - [`Distortion`] - waveshaping distortion with seven selectable kinds
//! - [`StereoDelay`] - cross-feeding stereo delay with an embedded distortion
//!   unit on the feedback path
//!
//! ## Example
//!
//! ```rust,ignore
//! use fretloop_core::{Effect, EffectExt};
//! use fretloop_effects::{Distortion, DistortionKind, StereoDelay};
//!
//! let mut dist = Distortion::new(48000.0);
//! dist.set_kind(DistortionKind::Tube);
//! dist.set_drive(0.7);
//!
//! let mut delay = StereoDelay::new(48000.0);
//! delay.set_cross_feedback(0.35);
//! ```

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(not(feature = "std"))]
extern crate alloc;

pub mod distortion;
pub mod stereo_delay;

// Re-export main types at crate root
pub use distortion::{Distortion, DistortionKind};
pub use stereo_delay::StereoDelay;
