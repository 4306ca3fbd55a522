//! Cross-feeding stereo delay with an embedded distortion unit on the
//! feedback path.
//!
//! Each channel owns an independent [`InterpolatedDelay`] tap. Beyond each
//! channel's own feedback, a `cross_feedback` term routes a fraction of the
//! *opposite* channel's delayed signal back into this channel — optionally
//! through a [`Distortion`] unit, blended in by `feedback_intensity`. In
//! ping-pong mode the self-feedback routing is replaced with fully crossed
//! routing, producing the classic alternating left/right repeat pattern.

use fretloop_core::{
    Effect, InterpolatedDelay, ParamDescriptor, ParamFlags, ParamId, ParameterInfo, SmoothedParam,
    flush_denormal, gain, lerp, soft_limit,
};
use libm::ceilf;

use crate::{Distortion, DistortionKind};

/// Single-channel delay tap: smoothed delay time, circular buffer, no
/// feedback writeback of its own (the composite owns feedback routing).
#[derive(Debug, Clone)]
struct DelayTap {
    buffer: InterpolatedDelay,
    max_delay_samples: f32,
    delay_time: SmoothedParam,
}

impl DelayTap {
    fn new(sample_rate: f32, max_delay_ms: f32, default_ms: f32) -> Self {
        let max_delay_samples = ceilf((max_delay_ms / 1000.0) * sample_rate) as usize;
        let max_delay_samples_f32 = max_delay_samples.max(1) as f32;
        let default_samples = ((default_ms / 1000.0) * sample_rate).min(max_delay_samples_f32 - 1.0);
        Self {
            buffer: InterpolatedDelay::new(max_delay_samples.max(1)),
            max_delay_samples: max_delay_samples_f32,
            // >= 20ms time constant per the ordering contract, so delay-time
            // changes glide rather than click.
            delay_time: SmoothedParam::with_config(default_samples, sample_rate, 25.0),
        }
    }

    fn set_delay_ms(&mut self, ms: f32, sample_rate: f32) {
        let samples = (ms / 1000.0) * sample_rate;
        self.delay_time
            .set_target(samples.clamp(1.0, self.max_delay_samples - 1.0));
    }

    fn delay_ms(&self, sample_rate: f32) -> f32 {
        self.delay_time.target() / sample_rate * 1000.0
    }

    fn set_sample_rate(&mut self, sample_rate: f32) {
        self.delay_time.set_sample_rate(sample_rate);
    }

    fn reset(&mut self) {
        self.buffer.clear();
        self.delay_time.snap_to_target();
    }

    /// Read without writing (the "tap" in the per-block ordering contract).
    #[inline]
    fn tap(&mut self) -> f32 {
        let delay_samples = self.delay_time.advance();
        self.buffer.read(delay_samples)
    }

    #[inline]
    fn write(&mut self, sample: f32) {
        self.buffer.write(flush_denormal(sample));
    }
}

/// Stereo delay with cross-channel feedback, optional ping-pong routing,
/// mid/side stereo width, and an embedded distortion unit on the
/// cross-feedback path.
///
/// ## Parameter Indices (`ParameterInfo`)
///
/// | Index | Name | Range | Default |
/// |-------|------|-------|---------|
/// | 0 | Left Delay | 1.0–2000.0 ms | 350.0 |
/// | 1 | Right Delay | 1.0–2000.0 ms | 350.0 |
/// | 2 | Feedback | 0.0–0.9 | 0.35 |
/// | 3 | Cross Feedback | 0.0–0.5 | 0.25 |
/// | 4 | Ping Pong | 0–1 | 0 |
/// | 5 | Stereo Width | 0.0–1.0 | 1.0 |
/// | 6 | Dry Mix | 0.0–1.0 | 1.0 |
/// | 7 | Wet Mix | 0.0–1.0 | 0.35 |
/// | 8 | Distortion Enabled | 0–1 | 0 |
/// | 9 | Distortion Kind | 0–6 | 0 |
/// | 10 | Distortion Drive | 0.0–1.0 | 0.5 |
/// | 11 | Distortion Mix | 0.0–1.0 | 1.0 |
/// | 12 | Feedback Intensity | 0.0–1.0 | 0.5 |
/// | 13 | Output | -20.0–20.0 dB | 0.0 |
///
/// # Example
///
/// ```rust
/// use fretloop_effects::{StereoDelay, DistortionKind};
/// use fretloop_core::Effect;
///
/// let mut delay = StereoDelay::new(48000.0);
/// delay.set_cross_feedback(0.35);
/// delay.set_ping_pong(true);
/// delay.set_distortion_enabled(true);
/// delay.set_distortion_kind(DistortionKind::Tube);
///
/// let (l, r) = delay.process_stereo(0.5, 0.5);
/// ```
pub struct StereoDelay {
    left: DelayTap,
    right: DelayTap,

    feedback: SmoothedParam,
    cross_feedback: SmoothedParam,
    ping_pong: bool,
    stereo_width: SmoothedParam,
    dry_mix: SmoothedParam,
    wet_mix: SmoothedParam,

    distortion_enabled: bool,
    distortion_l: Distortion,
    distortion_r: Distortion,
    feedback_intensity: SmoothedParam,

    output_level: SmoothedParam,
    sample_rate: f32,
}

impl StereoDelay {
    /// Create a new stereo delay with a 2-second maximum delay per channel.
    pub fn new(sample_rate: f32) -> Self {
        Self::with_max_delay_ms(sample_rate, 2000.0)
    }

    /// Create a new stereo delay with a custom maximum delay time.
    pub fn with_max_delay_ms(sample_rate: f32, max_delay_ms: f32) -> Self {
        Self {
            left: DelayTap::new(sample_rate, max_delay_ms, 350.0),
            right: DelayTap::new(sample_rate, max_delay_ms, 350.0),
            feedback: SmoothedParam::standard(0.35, sample_rate),
            cross_feedback: SmoothedParam::standard(0.25, sample_rate),
            ping_pong: false,
            stereo_width: SmoothedParam::standard(1.0, sample_rate),
            dry_mix: SmoothedParam::standard(1.0, sample_rate),
            wet_mix: SmoothedParam::standard(0.35, sample_rate),
            distortion_enabled: false,
            distortion_l: Distortion::new(sample_rate),
            distortion_r: Distortion::new(sample_rate),
            feedback_intensity: SmoothedParam::standard(0.5, sample_rate),
            output_level: gain::output_level_param(sample_rate),
            sample_rate,
        }
    }

    /// Set left channel delay time in milliseconds.
    pub fn set_left_delay_ms(&mut self, ms: f32) {
        self.left.set_delay_ms(ms, self.sample_rate);
    }

    /// Set right channel delay time in milliseconds.
    pub fn set_right_delay_ms(&mut self, ms: f32) {
        self.right.set_delay_ms(ms, self.sample_rate);
    }

    /// Set per-channel feedback, 0.0 to 0.9.
    pub fn set_feedback(&mut self, feedback: f32) {
        self.feedback.set_target(feedback.clamp(0.0, 0.9));
    }

    /// Set cross-channel feedback, 0.0 to 0.5.
    ///
    /// Capped below the per-channel maximum so the combined loop gain from
    /// self-feedback plus cross-feedback can't exceed unity.
    pub fn set_cross_feedback(&mut self, amount: f32) {
        self.cross_feedback.set_target(amount.clamp(0.0, 0.5));
    }

    /// Enable or disable ping-pong routing.
    ///
    /// In ping-pong mode, each channel's self-feedback is replaced by the
    /// opposite channel's delayed signal, producing alternating repeats.
    pub fn set_ping_pong(&mut self, enabled: bool) {
        self.ping_pong = enabled;
    }

    /// Get current ping-pong mode state.
    pub fn ping_pong(&self) -> bool {
        self.ping_pong
    }

    /// Set stereo width of the delayed (wet) signal, 0.0 (mono) to 1.0 (full width).
    pub fn set_stereo_width(&mut self, width: f32) {
        self.stereo_width.set_target(width.clamp(0.0, 1.0));
    }

    /// Set dry signal level, 0.0 to 1.0.
    pub fn set_dry_mix(&mut self, dry: f32) {
        self.dry_mix.set_target(dry.clamp(0.0, 1.0));
    }

    /// Set wet (delayed) signal level, 0.0 to 1.0.
    pub fn set_wet_mix(&mut self, wet: f32) {
        self.wet_mix.set_target(wet.clamp(0.0, 1.0));
    }

    /// Enable or disable the embedded distortion unit on the cross-feedback path.
    pub fn set_distortion_enabled(&mut self, enabled: bool) {
        self.distortion_enabled = enabled;
    }

    /// Set the embedded distortion's waveshaping kind.
    pub fn set_distortion_kind(&mut self, kind: DistortionKind) {
        self.distortion_l.set_kind(kind);
        self.distortion_r.set_kind(kind);
    }

    /// Set the embedded distortion's drive, 0.0 to 1.0.
    pub fn set_distortion_drive(&mut self, drive: f32) {
        self.distortion_l.set_drive(drive);
        self.distortion_r.set_drive(drive);
    }

    /// Set the embedded distortion's internal wet/dry mix, 0.0 to 1.0.
    pub fn set_distortion_mix(&mut self, mix: f32) {
        self.distortion_l.set_mix(mix);
        self.distortion_r.set_mix(mix);
    }

    /// Set how much the distorted cross-feedback signal blends over the
    /// clean cross-feedback signal, 0.0 (clean) to 1.0 (fully distorted).
    pub fn set_feedback_intensity(&mut self, intensity: f32) {
        self.feedback_intensity.set_target(intensity.clamp(0.0, 1.0));
    }
}

impl Effect for StereoDelay {
    #[inline]
    fn process(&mut self, input: f32) -> f32 {
        let (l, _) = self.process_stereo(input, input);
        l
    }

    #[inline]
    fn process_stereo(&mut self, left_in: f32, right_in: f32) -> (f32, f32) {
        let feedback = self.feedback.advance();
        let cross_feedback = self.cross_feedback.advance();
        let width = self.stereo_width.advance();
        let dry_mix = self.dry_mix.advance();
        let wet_mix = self.wet_mix.advance();
        let feedback_intensity = self.feedback_intensity.advance();
        let output_gain = self.output_level.advance();

        // Tap without writing.
        let left_delayed = self.left.tap();
        let right_delayed = self.right.tap();

        let raw_cross_l = right_delayed * cross_feedback;
        let raw_cross_r = left_delayed * cross_feedback;

        let (cross_l, cross_r) = if self.distortion_enabled {
            let distorted_l = self.distortion_l.process(raw_cross_l);
            let distorted_r = self.distortion_r.process(raw_cross_r);
            (
                lerp(raw_cross_l, distorted_l, feedback_intensity),
                lerp(raw_cross_r, distorted_r, feedback_intensity),
            )
        } else {
            (raw_cross_l, raw_cross_r)
        };

        if self.ping_pong {
            self.left.write(left_in + feedback * right_delayed + cross_l);
            self.right.write(right_in + feedback * left_delayed + cross_r);
        } else {
            self.left.write(left_in + feedback * left_delayed + cross_l);
            self.right.write(right_in + feedback * right_delayed + cross_r);
        }

        // Mid/side width applied to the delayed pair before mixing.
        let mid = (left_delayed + right_delayed) * 0.5;
        let side = (left_delayed - right_delayed) * 0.5 * (1.0 + width);
        let wide_l = mid + side;
        let wide_r = mid - side;

        let out_l = left_in * dry_mix + wide_l * wet_mix;
        let out_r = right_in * dry_mix + wide_r * wet_mix;

        (
            soft_limit(out_l, 1.0) * output_gain,
            soft_limit(out_r, 1.0) * output_gain,
        )
    }

    fn set_sample_rate(&mut self, sample_rate: f32) {
        self.sample_rate = sample_rate;
        self.left.set_sample_rate(sample_rate);
        self.right.set_sample_rate(sample_rate);
        self.feedback.set_sample_rate(sample_rate);
        self.cross_feedback.set_sample_rate(sample_rate);
        self.stereo_width.set_sample_rate(sample_rate);
        self.dry_mix.set_sample_rate(sample_rate);
        self.wet_mix.set_sample_rate(sample_rate);
        self.feedback_intensity.set_sample_rate(sample_rate);
        self.output_level.set_sample_rate(sample_rate);
        self.distortion_l.set_sample_rate(sample_rate);
        self.distortion_r.set_sample_rate(sample_rate);
    }

    fn reset(&mut self) {
        self.left.reset();
        self.right.reset();
        self.feedback.snap_to_target();
        self.cross_feedback.snap_to_target();
        self.stereo_width.snap_to_target();
        self.dry_mix.snap_to_target();
        self.wet_mix.snap_to_target();
        self.feedback_intensity.snap_to_target();
        self.output_level.snap_to_target();
        self.distortion_l.reset();
        self.distortion_r.reset();
    }
}

fretloop_core::impl_params! {
    StereoDelay, this {
        [0] ParamDescriptor::time_ms("Left Delay", "L Time", 1.0, 2000.0, 350.0)
                .with_id(ParamId(300), "sdly_left_ms"),
            get: this.left.delay_ms(this.sample_rate),
            set: |v| this.set_left_delay_ms(v);

        [1] ParamDescriptor::time_ms("Right Delay", "R Time", 1.0, 2000.0, 350.0)
                .with_id(ParamId(301), "sdly_right_ms"),
            get: this.right.delay_ms(this.sample_rate),
            set: |v| this.set_right_delay_ms(v);

        [2] ParamDescriptor::custom("Feedback", "Fdbk", 0.0, 0.9, 0.35)
                .with_step(0.01)
                .with_id(ParamId(302), "sdly_feedback"),
            get: this.feedback.target(),
            set: |v| this.set_feedback(v);

        [3] ParamDescriptor::custom("Cross Feedback", "X-Fdbk", 0.0, 0.5, 0.25)
                .with_step(0.01)
                .with_id(ParamId(303), "sdly_cross_feedback"),
            get: this.cross_feedback.target(),
            set: |v| this.set_cross_feedback(v);

        [4] ParamDescriptor::custom("Ping Pong", "PngPng", 0.0, 1.0, 0.0)
                .with_step(1.0)
                .with_flags(ParamFlags::AUTOMATABLE.union(ParamFlags::STEPPED))
                .with_id(ParamId(304), "sdly_ping_pong"),
            get: if this.ping_pong { 1.0 } else { 0.0 },
            set: |v| this.set_ping_pong(v > 0.5);

        [5] ParamDescriptor::custom("Stereo Width", "Width", 0.0, 1.0, 1.0)
                .with_step(0.01)
                .with_id(ParamId(305), "sdly_width"),
            get: this.stereo_width.target(),
            set: |v| this.set_stereo_width(v);

        [6] ParamDescriptor::custom("Dry Mix", "Dry", 0.0, 1.0, 1.0)
                .with_step(0.01)
                .with_id(ParamId(306), "sdly_dry_mix"),
            get: this.dry_mix.target(),
            set: |v| this.set_dry_mix(v);

        [7] ParamDescriptor::custom("Wet Mix", "Wet", 0.0, 1.0, 0.35)
                .with_step(0.01)
                .with_id(ParamId(307), "sdly_wet_mix"),
            get: this.wet_mix.target(),
            set: |v| this.set_wet_mix(v);

        [8] ParamDescriptor::custom("Distortion Enabled", "DistOn", 0.0, 1.0, 0.0)
                .with_step(1.0)
                .with_flags(ParamFlags::AUTOMATABLE.union(ParamFlags::STEPPED))
                .with_id(ParamId(308), "sdly_dist_enabled"),
            get: if this.distortion_enabled { 1.0 } else { 0.0 },
            set: |v| this.set_distortion_enabled(v > 0.5);

        [9] ParamDescriptor::custom("Distortion Kind", "DistKnd", 0.0, 6.0, 0.0)
                .with_step(1.0)
                .with_flags(ParamFlags::AUTOMATABLE.union(ParamFlags::STEPPED))
                .with_step_labels(&[
                    "Soft Clip", "Hard Clip", "Tube", "Fuzz", "Bit Crush", "Waveshaper", "None",
                ])
                .with_id(ParamId(309), "sdly_dist_kind"),
            get: this.distortion_l.kind() as u8 as f32,
            set: |v| this.set_distortion_kind(kind_from_index(v as u8));

        [10] ParamDescriptor::custom("Distortion Drive", "DistDrv", 0.0, 1.0, 0.5)
                .with_step(0.01)
                .with_id(ParamId(310), "sdly_dist_drive"),
            get: this.distortion_l.drive(),
            set: |v| this.set_distortion_drive(v);

        [11] ParamDescriptor::custom("Distortion Mix", "DistMix", 0.0, 1.0, 1.0)
                .with_step(0.01)
                .with_id(ParamId(311), "sdly_dist_mix"),
            get: this.distortion_l.get_param(2),
            set: |v| this.set_distortion_mix(v);

        [12] ParamDescriptor::custom("Feedback Intensity", "FbkInt", 0.0, 1.0, 0.5)
                .with_step(0.01)
                .with_id(ParamId(312), "sdly_feedback_intensity"),
            get: this.feedback_intensity.target(),
            set: |v| this.set_feedback_intensity(v);

        [13] fretloop_core::gain::output_param_descriptor()
                .with_id(ParamId(313), "sdly_output"),
            get: fretloop_core::gain::output_level_db(&this.output_level),
            set: |v| fretloop_core::gain::set_output_level_db(&mut this.output_level, v);
    }
}

fn kind_from_index(v: u8) -> DistortionKind {
    match v {
        0 => DistortionKind::SoftClip,
        1 => DistortionKind::HardClip,
        2 => DistortionKind::Tube,
        3 => DistortionKind::Fuzz,
        4 => DistortionKind::BitCrush,
        5 => DistortionKind::Waveshaper,
        _ => DistortionKind::None,
    }
}
