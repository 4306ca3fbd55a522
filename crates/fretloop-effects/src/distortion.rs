//! Drive-parameterized distortion with seven selectable waveshaping kinds.
//!
//! Used standalone in the main signal chain and embedded (one instance per
//! channel) in [`crate::stereo_delay::StereoDelay`]'s cross-feedback path.
//!
//! # Signal Flow
//!
//! ```text
//! Input → f_kind(s, drive) → Mix (wet/dry) → Soft Limit → Output Level
//! ```
//!
//! # Kinds
//!
//! | Kind | Character |
//! |------|-----------|
//! | [`DistortionKind::SoftClip`] | Smooth tanh saturation, odd harmonics |
//! | [`DistortionKind::HardClip`] | Hard threshold clamp, aggressive |
//! | [`DistortionKind::Tube`] | Asymmetric soft saturation, even + odd |
//! | [`DistortionKind::Fuzz`] | Asymmetric tanh/linear split plus a squared term |
//! | [`DistortionKind::BitCrush`] | Bit-depth quantization + sample-and-hold rate reduction |
//! | [`DistortionKind::Waveshaper`] | Cubic polynomial waveshaper |
//! | [`DistortionKind::None`] | Passthrough |
//!
//! Because `drive` reshapes the waveshaping function itself (it is not a
//! fixed pre-gain stage), first-order ADAA's assumption of a drive-independent
//! antiderivative doesn't hold here — each kind is evaluated directly rather
//! than through [`fretloop_core::Adaa1`]. The smoothed `drive`/`mix` params
//! keep sample-to-sample changes in the shaping function gradual enough that
//! this doesn't introduce audible zipper aliasing.

use fretloop_core::math::soft_limit;
use fretloop_core::{
    OnePole, ParamDescriptor, ParamFlags, ParamId, ParamUnit, ParameterInfo, SmoothedParam, clamp,
    gain, wet_dry_mix,
};
use libm::{powf, roundf, tanhf};

/// Waveshaping algorithm selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DistortionKind {
    /// `tanh(s*(1+10d)) / (1+10d)` — smooth, tube-like, level-compensated.
    #[default]
    SoftClip,
    /// Clamp to `±(1-d)` — aggressive, transistor-like.
    HardClip,
    /// Asymmetric `s/(1+|s|/k)`, `k_pos = 1+5d`, `k_neg = 2*k_pos`.
    Tube,
    /// Asymmetric tanh/linear split plus a `0.3*y²` even-harmonic term.
    Fuzz,
    /// Bit-depth quantization with sample-and-hold rate reduction.
    BitCrush,
    /// `clamp(s + 0.3*(1+8d)*s³, -1, 1)`.
    Waveshaper,
    /// Passthrough.
    None,
}

impl DistortionKind {
    fn from_index(v: u8) -> Self {
        match v {
            0 => Self::SoftClip,
            1 => Self::HardClip,
            2 => Self::Tube,
            3 => Self::Fuzz,
            4 => Self::BitCrush,
            5 => Self::Waveshaper,
            _ => Self::None,
        }
    }
}

fn soft_clip_driven(s: f32, drive: f32) -> f32 {
    let k = 1.0 + 10.0 * drive;
    tanhf(s * k) / k
}

fn hard_clip_driven(s: f32, drive: f32) -> f32 {
    let threshold = (1.0 - drive).max(0.001);
    clamp(s, -threshold, threshold)
}

fn tube_driven(s: f32, drive: f32) -> f32 {
    let k_pos = 1.0 + 5.0 * drive;
    let k_neg = 2.0 * k_pos;
    if s >= 0.0 {
        s / (1.0 + s.abs() / k_pos)
    } else {
        s / (1.0 + s.abs() / k_neg)
    }
}

fn fuzz_driven(s: f32, drive: f32) -> f32 {
    let k = 1.0 + 20.0 * drive;
    let y = if s > 0.0 { tanhf(s * k) } else { 0.5 * s * k };
    y + 0.3 * y * y
}

fn waveshaper_driven(s: f32, drive: f32) -> f32 {
    let k = 0.3 * (1.0 + 8.0 * drive);
    clamp(s + k * s * s * s, -1.0, 1.0)
}

/// Distortion effect with seven selectable waveshaping kinds.
///
/// ## Parameter Indices (`ParameterInfo`)
///
/// | Index | Name | Range | Default |
/// |-------|------|-------|---------|
/// | 0 | Drive | 0.0–1.0 | 0.5 |
/// | 1 | Kind | 0–6 (see [`DistortionKind`]) | 0 |
/// | 2 | Mix | 0.0–1.0 | 1.0 |
/// | 3 | Bit Depth | 1–16 (`BitCrush` only) | 8 |
/// | 4 | Rate Reduction | 0.02–1.0 (`BitCrush` only) | 1.0 |
/// | 5 | Output | −20.0–20.0 dB | 0.0 |
///
/// # Example
///
/// ```rust
/// use fretloop_effects::{Distortion, DistortionKind};
/// use fretloop_core::Effect;
///
/// let mut dist = Distortion::new(48000.0);
/// dist.set_kind(DistortionKind::Tube);
/// dist.set_drive(0.7);
///
/// let output = dist.process(0.1);
/// ```
pub struct Distortion {
    drive: SmoothedParam,
    mix: SmoothedParam,
    output_level: SmoothedParam,

    kind: DistortionKind,
    bit_depth: f32,
    rate_reduction: f32,

    bc_held: f32,
    bc_counter: f32,
    bc_smooth: OnePole,
    bc_last_rate_reduction: f32,
    sample_rate: f32,
}

impl Distortion {
    /// Create a new distortion effect.
    ///
    /// Defaults: Drive 0.5, SoftClip, Mix 1.0 (fully wet), Bit Depth 8,
    /// Rate Reduction 1.0 (no reduction), Output 0 dB.
    pub fn new(sample_rate: f32) -> Self {
        Self {
            drive: SmoothedParam::fast(0.5, sample_rate),
            mix: SmoothedParam::standard(1.0, sample_rate),
            output_level: gain::output_level_param(sample_rate),
            kind: DistortionKind::default(),
            bit_depth: 8.0,
            rate_reduction: 1.0,
            bc_held: 0.0,
            bc_counter: 0.0,
            bc_smooth: OnePole::new(sample_rate, sample_rate * 0.45),
            bc_last_rate_reduction: 1.0,
            sample_rate,
        }
    }

    /// Set drive amount, 0.0 to 1.0.
    pub fn set_drive(&mut self, drive: f32) {
        self.drive.set_target(drive.clamp(0.0, 1.0));
    }

    /// Get current drive target.
    pub fn drive(&self) -> f32 {
        self.drive.target()
    }

    /// Set the waveshaping kind.
    pub fn set_kind(&mut self, kind: DistortionKind) {
        self.kind = kind;
    }

    /// Get the current waveshaping kind.
    pub fn kind(&self) -> DistortionKind {
        self.kind
    }

    /// Set wet/dry mix, 0.0 (dry) to 1.0 (wet).
    pub fn set_mix(&mut self, mix: f32) {
        self.mix.set_target(mix.clamp(0.0, 1.0));
    }

    /// Set bit depth for `BitCrush`, 1 to 16 bits.
    pub fn set_bit_depth(&mut self, bits: f32) {
        self.bit_depth = bits.round().clamp(1.0, 16.0);
    }

    /// Set rate reduction factor for `BitCrush`, `(0, 1]`.
    ///
    /// 1.0 holds every sample (no reduction); smaller values hold samples
    /// longer, lowering the effective sample rate.
    pub fn set_rate_reduction(&mut self, factor: f32) {
        self.rate_reduction = factor.clamp(0.02, 1.0);
    }

    fn bit_crush(&mut self, s: f32) -> f32 {
        if (self.rate_reduction - self.bc_last_rate_reduction).abs() > 1e-4 {
            self.bc_last_rate_reduction = self.rate_reduction;
            let cutoff = (self.sample_rate * self.rate_reduction * 0.5).max(40.0);
            self.bc_smooth.set_frequency(cutoff);
        }

        self.bc_counter += self.rate_reduction;
        if self.bc_counter >= 1.0 {
            self.bc_counter -= 1.0;
            let levels = powf(2.0, self.bit_depth) - 1.0;
            self.bc_held = roundf(s * levels) / levels;
        }
        self.bc_smooth.process(self.bc_held)
    }

    fn shape(&mut self, s: f32, drive: f32) -> f32 {
        match self.kind {
            DistortionKind::SoftClip => soft_clip_driven(s, drive),
            DistortionKind::HardClip => hard_clip_driven(s, drive),
            DistortionKind::Tube => tube_driven(s, drive),
            DistortionKind::Fuzz => fuzz_driven(s, drive),
            DistortionKind::BitCrush => self.bit_crush(s),
            DistortionKind::Waveshaper => waveshaper_driven(s, drive),
            DistortionKind::None => s,
        }
    }
}

impl fretloop_core::Effect for Distortion {
    #[inline]
    fn process(&mut self, input: f32) -> f32 {
        let drive = self.drive.advance();
        let mix_val = self.mix.advance();
        let level = self.output_level.advance();

        let wet = self.shape(input, drive);
        soft_limit(wet_dry_mix(input, wet, mix_val), 1.0) * level
    }

    fn set_sample_rate(&mut self, sample_rate: f32) {
        self.sample_rate = sample_rate;
        self.drive.set_sample_rate(sample_rate);
        self.mix.set_sample_rate(sample_rate);
        self.output_level.set_sample_rate(sample_rate);
        self.bc_smooth.set_sample_rate(sample_rate);
    }

    fn reset(&mut self) {
        self.drive.snap_to_target();
        self.mix.snap_to_target();
        self.output_level.snap_to_target();
        self.bc_held = 0.0;
        self.bc_counter = 0.0;
        self.bc_smooth.reset();
    }
}

fretloop_core::impl_params! {
    Distortion, this {
        [0] ParamDescriptor::custom("Drive", "Drive", 0.0, 1.0, 0.5)
                .with_step(0.01)
                .with_id(ParamId(200), "dist_drive"),
            get: this.drive.target(),
            set: |v| this.set_drive(v);

        [1] ParamDescriptor::custom("Kind", "Kind", 0.0, 6.0, 0.0)
                .with_step(1.0)
                .with_id(ParamId(201), "dist_kind")
                .with_flags(ParamFlags::AUTOMATABLE.union(ParamFlags::STEPPED))
                .with_step_labels(&[
                    "Soft Clip", "Hard Clip", "Tube", "Fuzz", "Bit Crush", "Waveshaper", "None",
                ]),
            get: this.kind as u8 as f32,
            set: |v| this.kind = DistortionKind::from_index(v as u8);

        [2] ParamDescriptor::custom("Mix", "Mix", 0.0, 1.0, 1.0)
                .with_unit(ParamUnit::Percent)
                .with_step(0.01)
                .with_id(ParamId(202), "dist_mix"),
            get: this.mix.target(),
            set: |v| this.set_mix(v);

        [3] ParamDescriptor::custom("Bit Depth", "Bits", 1.0, 16.0, 8.0)
                .with_step(1.0)
                .with_id(ParamId(203), "dist_bits"),
            get: this.bit_depth,
            set: |v| this.set_bit_depth(v);

        [4] ParamDescriptor::custom("Rate Reduction", "Rate", 0.02, 1.0, 1.0)
                .with_step(0.01)
                .with_id(ParamId(204), "dist_rate"),
            get: this.rate_reduction,
            set: |v| this.set_rate_reduction(v);

        [5] fretloop_core::gain::output_param_descriptor()
                .with_id(ParamId(205), "dist_output"),
            get: fretloop_core::gain::output_level_db(&this.output_level),
            set: |v| fretloop_core::gain::set_output_level_db(&mut this.output_level, v);
    }
}
