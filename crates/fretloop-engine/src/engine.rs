//! The engine itself: owns the signal chain and implements the fixed
//! per-block processing order.

use std::sync::Arc;
use std::time::Instant;

use fretloop_analysis::ChordDetector;
use fretloop_core::{Effect, soft_limit};
use fretloop_effects::StereoDelay;
use fretloop_synth::{ArpScheduler, PolyphonicSynth};

use crate::error::{ConfigurationError, EngineError, LifecycleError, RuntimeAnomaly};
use crate::host::{MAX_BLOCK_SIZE, validate_block_size, validate_sample_rate};
use crate::param_bus::ParameterBus;
use crate::status::{ChordSummary, StatusSnapshot};

/// Minimum compiled voice pool size, per the control-interface contract.
pub const MIN_VOICES: usize = 32;

/// Default arpeggiator voice pool size used by [`Engine::new`].
pub const DEFAULT_VOICES: usize = 32;

/// A validated snapshot the host hands to [`Engine::start`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EngineConfig {
    pub sample_rate: u32,
    pub block_size: usize,
}

impl EngineConfig {
    pub fn new(sample_rate: u32, block_size: usize) -> Self {
        Self { sample_rate, block_size }
    }

    fn validate(self) -> Result<(), ConfigurationError> {
        validate_sample_rate(self.sample_rate)?;
        validate_block_size(self.block_size)?;
        Ok(())
    }
}

/// Wires a stereo delay, a polyphonic chord detector, an arpeggio
/// scheduler, and a chord/arp-driven synth into one `start`/`stop`/`reset`/
/// `process` unit.
///
/// `VOICES` is the compile-time size of the synth's voice pool; it must be
/// at least [`MIN_VOICES`], checked at [`start`](Engine::start).
pub struct Engine<const VOICES: usize = DEFAULT_VOICES> {
    sample_rate: f32,
    running: bool,
    bus: Arc<ParameterBus>,
    delay: StereoDelay,
    detector: ChordDetector,
    arp: ArpScheduler,
    synth: PolyphonicSynth<VOICES>,
    arp_seed: u64,
    block_counter: u64,
    last_anomaly: RuntimeAnomaly,
    input_peak: f32,
    output_peak: f32,
    cpu_load_estimate: f32,
}

impl<const VOICES: usize> Engine<VOICES> {
    /// Build an engine at the given sample rate. `arp_seed` seeds the
    /// deterministic xorshift generator backing the `random` arp pattern;
    /// callers that want non-repeating randomness across runs should pass
    /// a fresh seed (e.g. drawn from an OS RNG) rather than a constant.
    pub fn new(sample_rate: f32, arp_seed: u64) -> Self {
        let synth = PolyphonicSynth::new(sample_rate);
        Self {
            sample_rate,
            running: false,
            bus: Arc::new(ParameterBus::new()),
            delay: StereoDelay::new(sample_rate),
            detector: ChordDetector::new(sample_rate),
            arp: ArpScheduler::new(
                fretloop_synth::ArpPattern::Up,
                120.0,
                4.0,
                arp_seed,
            ),
            synth,
            arp_seed,
            block_counter: 0,
            last_anomaly: RuntimeAnomaly::None,
            input_peak: 0.0,
            output_peak: 0.0,
            cpu_load_estimate: 0.0,
        }
    }

    /// Clone of the shared parameter bus handle. Give this to a control
    /// thread; the audio thread keeps using `self` directly.
    pub fn parameter_bus(&self) -> Arc<ParameterBus> {
        Arc::clone(&self.bus)
    }

    /// True between a successful `start()` and the matching `stop()`.
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Validate `config` and transition to running. Idempotent failure: an
    /// already-running engine returns `LifecycleError::AlreadyRunning`
    /// without touching any owned state.
    pub fn start(&mut self, config: &EngineConfig) -> Result<(), EngineError> {
        if self.running {
            return Err(LifecycleError::AlreadyRunning.into());
        }
        config.validate()?;
        if VOICES < MIN_VOICES {
            return Err(ConfigurationError::VoiceCountTooLow(VOICES).into());
        }
        self.set_sample_rate(config.sample_rate as f32);
        self.running = true;
        tracing::info!(
            sample_rate = config.sample_rate,
            block_size = config.block_size,
            voices = VOICES,
            "engine started"
        );
        Ok(())
    }

    /// Stop processing. `process` called afterward emits silence.
    pub fn stop(&mut self) -> Result<(), EngineError> {
        if !self.running {
            return Err(LifecycleError::NotRunning.into());
        }
        self.running = false;
        tracing::info!(block_counter = self.block_counter, "engine stopped");
        Ok(())
    }

    /// Clear all internal state (delay buffers, chord history, arp cursor,
    /// voice pool) without leaving the running state. Idempotent.
    pub fn reset(&mut self) {
        self.delay.reset();
        self.detector = ChordDetector::new(self.sample_rate);
        self.arp = ArpScheduler::new(fretloop_synth::ArpPattern::Up, 120.0, 4.0, self.arp_seed);
        self.synth.reset();
        self.block_counter = 0;
        self.last_anomaly = RuntimeAnomaly::None;
        self.input_peak = 0.0;
        self.output_peak = 0.0;
        tracing::info!("engine reset");
    }

    fn set_sample_rate(&mut self, sample_rate: f32) {
        self.sample_rate = sample_rate;
        self.delay.set_sample_rate(sample_rate);
        self.detector = ChordDetector::new(sample_rate);
        self.synth.set_sample_rate(sample_rate);
    }

    fn apply_parameter_bus(&mut self) {
        let snapshot = self.bus.snapshot();

        self.delay.set_left_delay_ms(snapshot.left_delay_s * 1000.0);
        self.delay.set_right_delay_ms(snapshot.right_delay_s * 1000.0);
        self.delay.set_feedback(snapshot.feedback);
        self.delay.set_wet_mix(snapshot.wet_mix);
        self.delay.set_dry_mix(snapshot.dry_mix);
        self.delay.set_ping_pong(snapshot.ping_pong);
        self.delay.set_stereo_width(snapshot.stereo_width);
        self.delay.set_cross_feedback(snapshot.cross_feedback);
        self.delay.set_distortion_enabled(snapshot.distortion_enabled);
        self.delay.set_distortion_kind(snapshot.distortion_kind);
        self.delay.set_distortion_drive(snapshot.distortion_drive);
        self.delay.set_distortion_mix(snapshot.distortion_mix);
        self.delay.set_feedback_intensity(snapshot.distortion_feedback_intensity);

        self.synth.set_waveform(snapshot.synth_kind);

        self.detector.set_min_chord_confidence(snapshot.min_chord_confidence);
        self.detector.set_chord_hold_time(snapshot.chord_hold_time_s);

        self.arp.set_tempo_bpm(snapshot.bpm);
        self.arp.set_pattern(snapshot.pattern);
        self.arp.set_duration_seconds(snapshot.arp_duration_s);
    }

    /// The arpeggiator's current note timeline, for diagnostics and tests.
    /// Regenerated whenever the latched chord, tempo, pattern, or duration
    /// changes (see [`Engine::process`]).
    pub fn arp_timeline(&self) -> &[fretloop_synth::ArpNote] {
        self.arp.timeline()
    }

    /// Process one block. Mono input is read once per frame and duplicated
    /// across both output channels before the stereo delay; `out_left` and
    /// `out_right` must be the same length as `in_block`. Never panics or
    /// returns an error: anomalies are recorded in the status snapshot and
    /// the offending sample is replaced with silence.
    pub fn process(&mut self, in_block: &[f32], out_left: &mut [f32], out_right: &mut [f32]) {
        debug_assert_eq!(in_block.len(), out_left.len());
        debug_assert_eq!(in_block.len(), out_right.len());

        if !self.running {
            out_left.fill(0.0);
            out_right.fill(0.0);
            return;
        }

        let started_at = Instant::now();
        let frame_count = in_block.len();
        let arp_enabled = self.bus.arp_enabled();
        let delay_enabled = self.bus.delay_enabled();

        self.apply_parameter_bus();

        if arp_enabled {
            let chord = self.detector.latched_chord();
            if self.arp.update_chord(chord.root, chord.quality, chord.valid) {
                tracing::debug!(
                    root = chord.root.name(),
                    quality = chord.quality.name(),
                    valid = chord.valid,
                    "arp timeline regenerated"
                );
            }

            let dt = frame_count as f32 / self.sample_rate;
            for note in self.arp.advance(dt) {
                if self.synth.active_voice_count() >= VOICES {
                    self.last_anomaly = RuntimeAnomaly::VoicePoolExhausted;
                }
                self.synth.note_on(note.pitch_class, note.octave, note.velocity);
            }
        }

        // Sanitize the raw input before it reaches the mixer, the delay's
        // circular buffers, or the chord detector's FFT window: a single
        // non-finite host sample must not corrupt state beyond its own
        // frame, and the offending frame's output must be silence.
        let mut clean_input = [0.0f32; MAX_BLOCK_SIZE];
        let mut input_peak = 0.0f32;
        for i in 0..frame_count {
            let x = in_block[i];
            if x.is_finite() {
                clean_input[i] = x;
                input_peak = input_peak.max(libm::fabsf(x));
            } else {
                clean_input[i] = 0.0;
                self.last_anomaly = RuntimeAnomaly::NonFiniteSample;
            }
        }
        let clean_input = &clean_input[..frame_count];

        // Render the synth's stereo output for the whole block before
        // mixing it with the input, so the §4.5 mixer rule (normalize by
        // peak once it exceeds 0.99) is applied to what actually reaches
        // the delay rather than being dead code on this signal path.
        let mut synth_l = [0.0f32; MAX_BLOCK_SIZE];
        let mut synth_r = [0.0f32; MAX_BLOCK_SIZE];
        let mut synth_peak = 0.0f32;
        for i in 0..frame_count {
            let (l, r) = self.synth.process_stereo();
            synth_l[i] = l;
            synth_r[i] = r;
            synth_peak = synth_peak.max(libm::fabsf(l)).max(libm::fabsf(r));
        }
        if synth_peak > 0.99 {
            let gain = 0.99 / synth_peak;
            for i in 0..frame_count {
                synth_l[i] *= gain;
                synth_r[i] *= gain;
            }
        }

        let mut output_peak = 0.0f32;

        for i in 0..frame_count {
            let pre_l = clean_input[i] + synth_l[i];
            let pre_r = clean_input[i] + synth_r[i];

            let (mut out_l, mut out_r) = if delay_enabled {
                self.delay.process_stereo(pre_l, pre_r)
            } else {
                (pre_l, pre_r)
            };

            if !out_l.is_finite() || !out_r.is_finite() {
                out_l = 0.0;
                out_r = 0.0;
                self.last_anomaly = RuntimeAnomaly::NonFiniteSample;
            }

            out_l = soft_limit(out_l, 1.0);
            out_r = soft_limit(out_r, 1.0);

            output_peak = output_peak.max(libm::fabsf(out_l)).max(libm::fabsf(out_r));
            out_left[i] = out_l;
            out_right[i] = out_r;
        }

        self.detector.push_block(clean_input);

        self.input_peak = input_peak;
        self.output_peak = output_peak;
        self.block_counter += 1;

        let elapsed = started_at.elapsed().as_secs_f32();
        let budget = frame_count as f32 / self.sample_rate;
        if budget > 0.0 {
            self.cpu_load_estimate = elapsed / budget;
        }
    }

    /// Read-only status, intended to be polled at UI rate rather than once
    /// per audio block.
    pub fn status(&self) -> StatusSnapshot {
        let chord = self.detector.latched_chord();
        StatusSnapshot {
            running: self.running,
            chord: ChordSummary::from_chord(chord.root, chord.quality, chord.confidence, chord.valid),
            active_voice_count: self.synth.active_voice_count(),
            input_peak: self.input_peak,
            output_peak: self.output_peak,
            cpu_load_estimate: self.cpu_load_estimate,
            block_counter: self.block_counter,
            last_anomaly: self.last_anomaly,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn started_engine() -> Engine<32> {
        let mut engine = Engine::<32>::new(48000.0, 42);
        engine.start(&EngineConfig::new(48000, 512)).unwrap();
        engine
    }

    #[test]
    fn process_emits_silence_before_start() {
        let mut engine = Engine::<32>::new(48000.0, 1);
        let input = vec![0.5f32; 256];
        let mut left = vec![0.0f32; 256];
        let mut right = vec![0.0f32; 256];
        engine.process(&input, &mut left, &mut right);
        assert!(left.iter().all(|&s| s == 0.0));
        assert!(right.iter().all(|&s| s == 0.0));
    }

    #[test]
    fn start_twice_is_rejected() {
        let mut engine = started_engine();
        let err = engine.start(&EngineConfig::new(48000, 512)).unwrap_err();
        assert_eq!(err, EngineError::Lifecycle(LifecycleError::AlreadyRunning));
    }

    #[test]
    fn stop_without_start_is_rejected() {
        let mut engine = Engine::<32>::new(48000.0, 1);
        let err = engine.stop().unwrap_err();
        assert_eq!(err, EngineError::Lifecycle(LifecycleError::NotRunning));
    }

    #[test]
    fn rejects_unsupported_sample_rate() {
        let mut engine = Engine::<32>::new(48000.0, 1);
        let err = engine.start(&EngineConfig::new(22050, 512)).unwrap_err();
        assert_eq!(
            err,
            EngineError::Configuration(ConfigurationError::UnsupportedSampleRate(22050))
        );
    }

    #[test]
    fn rejects_non_power_of_two_block_size() {
        let mut engine = Engine::<32>::new(48000.0, 1);
        let err = engine.start(&EngineConfig::new(48000, 500)).unwrap_err();
        assert_eq!(
            err,
            EngineError::Configuration(ConfigurationError::InvalidBlockSize(500))
        );
    }

    #[test]
    fn voice_pool_below_minimum_is_rejected() {
        let mut engine = Engine::<8>::new(48000.0, 1);
        let err = engine.start(&EngineConfig::new(48000, 512)).unwrap_err();
        assert_eq!(
            err,
            EngineError::Configuration(ConfigurationError::VoiceCountTooLow(8))
        );
    }

    #[test]
    fn process_produces_finite_bounded_output() {
        let mut engine = started_engine();
        let input: Vec<f32> = (0..512).map(|i| libm::sinf(i as f32 * 0.05)).collect();
        let mut left = vec![0.0f32; 512];
        let mut right = vec![0.0f32; 512];
        for _ in 0..20 {
            engine.process(&input, &mut left, &mut right);
        }
        for &s in left.iter().chain(right.iter()) {
            assert!(s.is_finite());
            assert!(s.abs() <= 1.0 + 1e-4);
        }
    }

    #[test]
    fn reset_clears_block_counter_and_anomaly() {
        let mut engine = started_engine();
        let input = vec![0.1f32; 512];
        let mut left = vec![0.0f32; 512];
        let mut right = vec![0.0f32; 512];
        engine.process(&input, &mut left, &mut right);
        assert_eq!(engine.status().block_counter, 1);
        engine.reset();
        let status = engine.status();
        assert_eq!(status.block_counter, 0);
        assert_eq!(status.last_anomaly, RuntimeAnomaly::None);
    }

    #[test]
    fn disabling_arp_stops_new_notes_without_erroring() {
        let mut engine = started_engine();
        engine.bus.set_arp_enabled(false);
        let input = vec![0.0f32; 512];
        let mut left = vec![0.0f32; 512];
        let mut right = vec![0.0f32; 512];
        for _ in 0..10 {
            engine.process(&input, &mut left, &mut right);
        }
        assert!(left.iter().chain(right.iter()).all(|s| s.is_finite()));
    }
}
