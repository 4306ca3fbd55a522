//! Read-only status reporting: what a control surface can learn about the
//! engine without touching the audio thread's owned state directly.

use fretloop_core::{ChordQuality, PitchClass};

use crate::error::RuntimeAnomaly;

/// A compact description of the currently latched chord, or its absence.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChordSummary {
    pub root_name: &'static str,
    pub quality_name: &'static str,
    pub confidence: f32,
    pub valid: bool,
}

impl ChordSummary {
    pub(crate) fn from_chord(root: PitchClass, quality: ChordQuality, confidence: f32, valid: bool) -> Self {
        Self {
            root_name: root.name(),
            quality_name: quality.name(),
            confidence,
            valid,
        }
    }

    /// No chord currently latched.
    pub fn none() -> Self {
        Self {
            root_name: PitchClass::C.name(),
            quality_name: ChordQuality::Major.name(),
            confidence: 0.0,
            valid: false,
        }
    }
}

/// Snapshot of engine state for a control surface to poll, typically once
/// per UI frame rather than once per audio block.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StatusSnapshot {
    /// Whether `start()` has been called and `stop()` has not.
    pub running: bool,
    /// The chord detector's current latched chord, if any.
    pub chord: ChordSummary,
    /// Voices currently sounding or releasing.
    pub active_voice_count: usize,
    /// Peak absolute input sample observed in the most recent block.
    pub input_peak: f32,
    /// Peak absolute output sample observed in the most recent block.
    pub output_peak: f32,
    /// Fraction of the block's real-time budget spent inside `process`,
    /// measured over the most recent block (1.0 == exactly real-time).
    pub cpu_load_estimate: f32,
    /// Number of blocks processed since the last `reset`.
    pub block_counter: u64,
    /// The most recent runtime anomaly observed since the last `reset`.
    pub last_anomaly: RuntimeAnomaly,
}

impl StatusSnapshot {
    pub(crate) fn initial() -> Self {
        Self {
            running: false,
            chord: ChordSummary::none(),
            active_voice_count: 0,
            input_peak: 0.0,
            output_peak: 0.0,
            cpu_load_estimate: 0.0,
            block_counter: 0,
            last_anomaly: RuntimeAnomaly::None,
        }
    }
}
