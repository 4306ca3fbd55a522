//! Fretloop Engine - wires chord detection, arpeggiation, synthesis and
//! stereo delay into one real-time processing unit.
//!
//! # Lifecycle
//!
//! ```rust
//! use fretloop_engine::{Engine, EngineConfig};
//!
//! let mut engine: Engine<32> = Engine::new(48000.0, 0x5EED);
//! engine.start(&EngineConfig::new(48000, 512)).unwrap();
//!
//! let input = vec![0.0f32; 512];
//! let mut left = vec![0.0f32; 512];
//! let mut right = vec![0.0f32; 512];
//! engine.process(&input, &mut left, &mut right);
//!
//! let status = engine.status();
//! assert!(status.running);
//!
//! engine.stop().unwrap();
//! ```
//!
//! # Parameters
//!
//! External threads never touch the engine's owned DSP state directly —
//! they write through a cloned [`ParameterBus`] handle:
//!
//! ```rust
//! use fretloop_engine::Engine;
//!
//! let engine: Engine<32> = Engine::new(48000.0, 1);
//! let bus = engine.parameter_bus();
//! bus.set_feedback(0.5).unwrap();
//! bus.set_bpm(128.0).unwrap();
//! ```
//!
//! # Fixed per-block order
//!
//! [`Engine::process`] always, in order: drains the parameter bus, polls
//! the chord detector's latched chord and regenerates the arpeggio timeline
//! if it changed, advances the arp scheduler and triggers due note-ons,
//! runs the synth and stereo delay per frame with NaN/Inf guarding and a
//! soft limiter, and finally feeds the input block to the chord detector
//! for the next block's analysis.

pub mod engine;
pub mod error;
pub mod host;
pub mod param_bus;
pub mod status;

pub use engine::{Engine, EngineConfig, DEFAULT_VOICES, MIN_VOICES};
pub use error::{ConfigurationError, EngineError, LifecycleError, ResourceError, RuntimeAnomaly};
pub use host::{AudioHost, MAX_BLOCK_SIZE, MIN_BLOCK_SIZE, SUPPORTED_SAMPLE_RATES};
pub use param_bus::{ParameterBus, ParameterSnapshot};
pub use status::{ChordSummary, StatusSnapshot};
