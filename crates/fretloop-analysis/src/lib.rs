//! Fretloop Analysis - windowed-FFT chord detection
//!
//! - [`fft`] - FFT wrapper with windowing functions
//! - [`spectrum`] - peak-picking on a magnitude spectrum
//! - [`chord_detector`] - pitch-class extraction and chord-quality matching
//!   on top of the two modules above
//!
//! ## Example
//!
//! ```rust,ignore
//! use fretloop_analysis::ChordDetector;
//!
//! let mut detector = ChordDetector::new(48000.0);
//! detector.push_block(&input_block);
//! let chord = detector.latched_chord();
//! if chord.valid {
//!     println!("{:?} {:?}", chord.root, chord.quality);
//! }
//! ```

pub mod fft;
pub mod spectrum;
pub mod chord_detector;

// Re-export main types
pub use fft::{Fft, Window};
pub use spectrum::{magnitude_spectrum, phase_spectrum, spectral_centroid};
pub use chord_detector::{Chord, ChordDetector, DetectedNote};
