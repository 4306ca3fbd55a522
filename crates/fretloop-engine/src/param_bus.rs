//! Lock-free parameter bus: one atomic cell per control-surface parameter.
//!
//! A control thread (UI, host automation, MIDI mapping) writes through the
//! setters; the audio thread drains the bus once per block via
//! [`Engine::process`](crate::Engine::process) and lets its own
//! `SmoothedParam`s (owned by the delay/detector) do the declicking. Floats
//! ride in an `AtomicU32` as a bit pattern, toggles in an `AtomicBool`,
//! enum-valued parameters in an `AtomicU8` with a small index mapping below
//! since none of the donor enums expose a public index conversion.

use std::sync::atomic::{AtomicBool, AtomicU8, AtomicU32, Ordering};

use fretloop_effects::DistortionKind;
use fretloop_synth::{ArpPattern, VoiceWaveform};

use crate::error::ConfigurationError;

fn load_f32(cell: &AtomicU32) -> f32 {
    f32::from_bits(cell.load(Ordering::Acquire))
}

fn store_f32(cell: &AtomicU32, value: f32) {
    cell.store(value.to_bits(), Ordering::Release);
}

fn validate_range(name: &'static str, value: f32, min: f32, max: f32) -> Result<(), ConfigurationError> {
    if value.is_finite() && value >= min && value <= max {
        Ok(())
    } else {
        Err(ConfigurationError::ParameterOutOfRange { name, value, min, max })
    }
}

fn distortion_kind_to_index(kind: DistortionKind) -> u8 {
    match kind {
        DistortionKind::SoftClip => 0,
        DistortionKind::HardClip => 1,
        DistortionKind::Tube => 2,
        DistortionKind::Fuzz => 3,
        DistortionKind::BitCrush => 4,
        DistortionKind::Waveshaper => 5,
        DistortionKind::None => 6,
    }
}

fn distortion_kind_from_index(index: u8) -> DistortionKind {
    match index {
        1 => DistortionKind::HardClip,
        2 => DistortionKind::Tube,
        3 => DistortionKind::Fuzz,
        4 => DistortionKind::BitCrush,
        5 => DistortionKind::Waveshaper,
        6 => DistortionKind::None,
        _ => DistortionKind::SoftClip,
    }
}

const ARP_PATTERNS: [ArpPattern; 11] = [
    ArpPattern::Up,
    ArpPattern::Down,
    ArpPattern::UpDown,
    ArpPattern::DownUp,
    ArpPattern::Random,
    ArpPattern::OctaveUp,
    ArpPattern::OctaveDown,
    ArpPattern::Trance16th,
    ArpPattern::DubstepChop,
    ArpPattern::AmbientFlow,
    ArpPattern::RockEighth,
];

fn arp_pattern_to_index(pattern: ArpPattern) -> u8 {
    ARP_PATTERNS
        .iter()
        .position(|&p| p == pattern)
        .expect("ARP_PATTERNS covers every ArpPattern variant") as u8
}

fn arp_pattern_from_index(index: u8) -> ArpPattern {
    ARP_PATTERNS[index as usize % ARP_PATTERNS.len()]
}

const VOICE_WAVEFORMS: [VoiceWaveform; 9] = [
    VoiceWaveform::Sine,
    VoiceWaveform::Square,
    VoiceWaveform::Saw,
    VoiceWaveform::Triangle,
    VoiceWaveform::Fm,
    VoiceWaveform::Pluck,
    VoiceWaveform::Pad,
    VoiceWaveform::Lead,
    VoiceWaveform::Bass,
];

fn voice_waveform_to_index(waveform: VoiceWaveform) -> u8 {
    VOICE_WAVEFORMS
        .iter()
        .position(|&w| w == waveform)
        .expect("VOICE_WAVEFORMS covers every VoiceWaveform variant") as u8
}

fn voice_waveform_from_index(index: u8) -> VoiceWaveform {
    VOICE_WAVEFORMS[index as usize % VOICE_WAVEFORMS.len()]
}

/// A fully resolved snapshot of every parameter, as currently visible to
/// readers of the bus. Smoothed parameters approximate their audible value
/// by reporting the most recently written target; the exact post-smoothing
/// sample lags by at most one smoothing time constant.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParameterSnapshot {
    pub left_delay_s: f32,
    pub right_delay_s: f32,
    pub feedback: f32,
    pub wet_mix: f32,
    pub dry_mix: f32,
    pub ping_pong: bool,
    pub stereo_width: f32,
    pub cross_feedback: f32,
    pub distortion_enabled: bool,
    pub distortion_kind: DistortionKind,
    pub distortion_drive: f32,
    pub distortion_mix: f32,
    pub distortion_feedback_intensity: f32,
    pub bpm: f32,
    pub pattern: ArpPattern,
    pub synth_kind: VoiceWaveform,
    pub arp_duration_s: f32,
    pub arp_enabled: bool,
    pub delay_enabled: bool,
    pub min_chord_confidence: f32,
    pub chord_hold_time_s: f32,
}

/// Single-writer/single-reader parameter bus: one atomic cell per
/// control-interface parameter. Safe to share as `Arc<ParameterBus>` between
/// a control thread and the audio thread.
#[derive(Debug)]
pub struct ParameterBus {
    left_delay_s: AtomicU32,
    right_delay_s: AtomicU32,
    feedback: AtomicU32,
    wet_mix: AtomicU32,
    dry_mix: AtomicU32,
    ping_pong: AtomicBool,
    stereo_width: AtomicU32,
    cross_feedback: AtomicU32,
    distortion_enabled: AtomicBool,
    distortion_kind: AtomicU8,
    distortion_drive: AtomicU32,
    distortion_mix: AtomicU32,
    distortion_feedback_intensity: AtomicU32,
    bpm: AtomicU32,
    pattern: AtomicU8,
    synth_kind: AtomicU8,
    arp_duration_s: AtomicU32,
    arp_enabled: AtomicBool,
    delay_enabled: AtomicBool,
    min_chord_confidence: AtomicU32,
    chord_hold_time_s: AtomicU32,
}

impl Default for ParameterBus {
    fn default() -> Self {
        Self {
            left_delay_s: AtomicU32::new(0.35f32.to_bits()),
            right_delay_s: AtomicU32::new(0.35f32.to_bits()),
            feedback: AtomicU32::new(0.35f32.to_bits()),
            wet_mix: AtomicU32::new(0.35f32.to_bits()),
            dry_mix: AtomicU32::new(1.0f32.to_bits()),
            ping_pong: AtomicBool::new(false),
            stereo_width: AtomicU32::new(1.0f32.to_bits()),
            cross_feedback: AtomicU32::new(0.25f32.to_bits()),
            distortion_enabled: AtomicBool::new(false),
            distortion_kind: AtomicU8::new(distortion_kind_to_index(DistortionKind::SoftClip)),
            distortion_drive: AtomicU32::new(0.5f32.to_bits()),
            distortion_mix: AtomicU32::new(1.0f32.to_bits()),
            distortion_feedback_intensity: AtomicU32::new(0.5f32.to_bits()),
            bpm: AtomicU32::new(120.0f32.to_bits()),
            pattern: AtomicU8::new(arp_pattern_to_index(ArpPattern::Up)),
            synth_kind: AtomicU8::new(voice_waveform_to_index(VoiceWaveform::Saw)),
            arp_duration_s: AtomicU32::new(4.0f32.to_bits()),
            arp_enabled: AtomicBool::new(true),
            delay_enabled: AtomicBool::new(true),
            min_chord_confidence: AtomicU32::new(0.6f32.to_bits()),
            chord_hold_time_s: AtomicU32::new(0.5f32.to_bits()),
        }
    }
}

macro_rules! smoothed_f32_param {
    ($get:ident, $set:ident, $field:ident, $name:literal, $min:expr, $max:expr) => {
        pub fn $get(&self) -> f32 {
            load_f32(&self.$field)
        }

        pub fn $set(&self, value: f32) -> Result<(), ConfigurationError> {
            validate_range($name, value, $min, $max)?;
            store_f32(&self.$field, value);
            Ok(())
        }
    };
}

impl ParameterBus {
    /// Build a bus at its default parameter values.
    pub fn new() -> Self {
        Self::default()
    }

    smoothed_f32_param!(left_delay_s, set_left_delay_s, left_delay_s, "left_delay_s", 0.001, 2.0);
    smoothed_f32_param!(right_delay_s, set_right_delay_s, right_delay_s, "right_delay_s", 0.001, 2.0);
    smoothed_f32_param!(feedback, set_feedback, feedback, "feedback", 0.0, 0.9);
    smoothed_f32_param!(wet_mix, set_wet_mix, wet_mix, "wet_mix", 0.0, 1.0);
    smoothed_f32_param!(dry_mix, set_dry_mix, dry_mix, "dry_mix", 0.0, 1.0);
    smoothed_f32_param!(stereo_width, set_stereo_width, stereo_width, "stereo_width", 0.0, 1.0);
    smoothed_f32_param!(cross_feedback, set_cross_feedback, cross_feedback, "cross_feedback", 0.0, 0.5);
    smoothed_f32_param!(distortion_drive, set_distortion_drive, distortion_drive, "distortion_drive", 0.0, 1.0);
    smoothed_f32_param!(distortion_mix, set_distortion_mix, distortion_mix, "distortion_mix", 0.0, 1.0);
    smoothed_f32_param!(
        distortion_feedback_intensity,
        set_distortion_feedback_intensity,
        distortion_feedback_intensity,
        "distortion_feedback_intensity",
        0.0,
        1.0
    );
    smoothed_f32_param!(bpm, set_bpm, bpm, "bpm", 20.0, 300.0);
    smoothed_f32_param!(arp_duration_s, set_arp_duration_s, arp_duration_s, "arp_duration_s", 0.5, 10.0);
    smoothed_f32_param!(
        min_chord_confidence,
        set_min_chord_confidence,
        min_chord_confidence,
        "min_chord_confidence",
        0.0,
        1.0
    );
    smoothed_f32_param!(
        chord_hold_time_s,
        set_chord_hold_time_s,
        chord_hold_time_s,
        "chord_hold_time_s",
        0.05,
        2.0
    );

    pub fn ping_pong(&self) -> bool {
        self.ping_pong.load(Ordering::Acquire)
    }

    pub fn set_ping_pong(&self, enabled: bool) {
        self.ping_pong.store(enabled, Ordering::Release);
    }

    pub fn distortion_enabled(&self) -> bool {
        self.distortion_enabled.load(Ordering::Acquire)
    }

    pub fn set_distortion_enabled(&self, enabled: bool) {
        self.distortion_enabled.store(enabled, Ordering::Release);
    }

    pub fn arp_enabled(&self) -> bool {
        self.arp_enabled.load(Ordering::Acquire)
    }

    pub fn set_arp_enabled(&self, enabled: bool) {
        self.arp_enabled.store(enabled, Ordering::Release);
    }

    pub fn delay_enabled(&self) -> bool {
        self.delay_enabled.load(Ordering::Acquire)
    }

    pub fn set_delay_enabled(&self, enabled: bool) {
        self.delay_enabled.store(enabled, Ordering::Release);
    }

    /// Strongly typed, so already domain-restricted — no rejection path.
    pub fn distortion_kind(&self) -> DistortionKind {
        distortion_kind_from_index(self.distortion_kind.load(Ordering::Acquire))
    }

    pub fn set_distortion_kind(&self, kind: DistortionKind) {
        self.distortion_kind.store(distortion_kind_to_index(kind), Ordering::Release);
    }

    pub fn pattern(&self) -> ArpPattern {
        arp_pattern_from_index(self.pattern.load(Ordering::Acquire))
    }

    pub fn set_pattern(&self, pattern: ArpPattern) {
        self.pattern.store(arp_pattern_to_index(pattern), Ordering::Release);
    }

    pub fn synth_kind(&self) -> VoiceWaveform {
        voice_waveform_from_index(self.synth_kind.load(Ordering::Acquire))
    }

    pub fn set_synth_kind(&self, waveform: VoiceWaveform) {
        self.synth_kind.store(voice_waveform_to_index(waveform), Ordering::Release);
    }

    /// Bulk read of every parameter in one call.
    pub fn snapshot(&self) -> ParameterSnapshot {
        ParameterSnapshot {
            left_delay_s: self.left_delay_s(),
            right_delay_s: self.right_delay_s(),
            feedback: self.feedback(),
            wet_mix: self.wet_mix(),
            dry_mix: self.dry_mix(),
            ping_pong: self.ping_pong(),
            stereo_width: self.stereo_width(),
            cross_feedback: self.cross_feedback(),
            distortion_enabled: self.distortion_enabled(),
            distortion_kind: self.distortion_kind(),
            distortion_drive: self.distortion_drive(),
            distortion_mix: self.distortion_mix(),
            distortion_feedback_intensity: self.distortion_feedback_intensity(),
            bpm: self.bpm(),
            pattern: self.pattern(),
            synth_kind: self.synth_kind(),
            arp_duration_s: self.arp_duration_s(),
            arp_enabled: self.arp_enabled(),
            delay_enabled: self.delay_enabled(),
            min_chord_confidence: self.min_chord_confidence(),
            chord_hold_time_s: self.chord_hold_time_s(),
        }
    }
}
