//! Fretloop Synth - chord/arp-driven polyphonic synthesis engine
//!
//! This crate provides synthesis building blocks including oscillators,
//! envelopes, voice management, and complete synthesizer implementations.
//!
//! # Core Components
//!
//! ## Oscillators
//!
//! Audio-rate oscillators with PolyBLEP anti-aliasing:
//!
//! - [`Oscillator`] - Main audio oscillator with multiple waveforms
//! - [`OscillatorWaveform`] - Waveform types (Sine, Triangle, Saw, Square, Pulse, Noise)
//!
//! ```rust
//! use fretloop_synth::{Oscillator, OscillatorWaveform};
//!
//! let mut osc = Oscillator::new(48000.0);
//! osc.set_frequency(440.0);
//! osc.set_waveform(OscillatorWaveform::Saw);
//!
//! let sample = osc.advance();
//! ```
//!
//! ## Envelopes
//!
//! ADSR envelope generators:
//!
//! - [`AdsrEnvelope`] - Attack-Decay-Sustain-Release envelope
//! - [`EnvelopeState`] - Envelope stage tracking
//!
//! ```rust
//! use fretloop_synth::{AdsrEnvelope, EnvelopeState};
//!
//! let mut env = AdsrEnvelope::new(48000.0);
//! env.set_attack_ms(10.0);
//! env.set_decay_ms(100.0);
//! env.set_sustain(0.7);
//! env.set_release_ms(200.0);
//!
//! env.gate_on();
//! let level = env.advance();
//! ```
//!
//! ## Voice Management
//!
//! For building polyphonic synthesizers:
//!
//! - [`Voice`] - Single synthesizer voice, addressed by pitch class + octave
//! - [`VoiceWaveform`] - Waveform compositions (sine/square/saw/triangle plus
//!   fm/pluck/pad/lead/bass)
//! - [`VoiceManager`] - Polyphonic voice allocation
//! - [`VoiceAllocationMode`] - Voice stealing strategies, including stealing
//!   the oldest voice currently releasing
//!
//! ## Complete Synthesizers
//!
//! Ready-to-use synthesizer implementations:
//!
//! - [`PolyphonicSynth`] - Multi-voice synth
//!
//! # no_std Support
//!
//! This crate is `no_std` compatible. Disable the default `std` feature:
//!
//! ```toml
//! [dependencies]
//! fretloop-synth = { version = "0.1", default-features = false }
//! ```
//!
//! # Example: Simple Polyphonic Synth
//!
//! ```rust
//! use fretloop_synth::{PolyphonicSynth, VoiceWaveform, VoiceAllocationMode};
//! use fretloop_core::PitchClass;
//!
//! // Create an 8-voice synth
//! let mut synth: PolyphonicSynth<8> = PolyphonicSynth::new(48000.0);
//!
//! // Configure sound
//! synth.set_waveform(VoiceWaveform::Pad);
//! synth.set_osc2_detune(7.0); // 7 cents detune for thickness
//! synth.set_filter_cutoff(2000.0);
//! synth.set_filter_resonance(2.0);
//! synth.set_amp_attack(10.0);
//! synth.set_amp_release(500.0);
//!
//! // Play a chord
//! synth.note_on(PitchClass::C, 4, 100);
//! synth.note_on(PitchClass::E, 4, 100);
//! synth.note_on(PitchClass::G, 4, 100);
//!
//! // Generate audio
//! let mut buffer = vec![0.0; 1024];
//! for sample in buffer.iter_mut() {
//!     *sample = synth.process();
//! }
//! ```
//!
//! ## Arpeggiator
//!
//! - [`ArpScheduler`] - Turns a latched chord into a note timeline
//! - [`ArpPattern`] - The eleven supported patterns
//! - [`ArpNote`] - One scheduled note in a timeline

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(not(feature = "std"))]
extern crate alloc;

pub mod arp;
pub mod envelope;
pub mod oscillator;
pub mod synth;
pub mod voice;

// Re-export main types at crate root
pub use arp::{ArpNote, ArpPattern, ArpScheduler};
pub use envelope::{AdsrEnvelope, EnvelopeState};
pub use oscillator::{Oscillator, OscillatorWaveform};
pub use synth::PolyphonicSynth;
pub use voice::{Voice, VoiceAllocationMode, VoiceManager, VoiceWaveform, cents_to_ratio};

// Re-export commonly used types from fretloop-core
pub use fretloop_core::{Lfo, LfoWaveform, StateVariableFilter, SvfOutput};
