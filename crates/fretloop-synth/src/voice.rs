//! Voice management for polyphonic synthesis.
//!
//! Provides a per-note [`Voice`] (oscillator(s), filter, envelopes) and a
//! [`VoiceManager`] pool that allocates/steals voices across a fixed-size
//! array, addressed by [`PitchClass`] + octave rather than raw MIDI note
//! numbers.

use crate::envelope::AdsrEnvelope;
use crate::oscillator::{Oscillator, OscillatorWaveform};
use fretloop_core::PitchClass;
use fretloop_core::{Effect, OnePole, StateVariableFilter, note_frequency};

/// Voice allocation modes for polyphonic synthesizers.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum VoiceAllocationMode {
    /// Cycle through voices in order (default)
    #[default]
    RoundRobin,
    /// Steal the oldest active note
    OldestNote,
    /// Steal the lowest pitch voice
    LowestNote,
    /// Steal the highest pitch voice
    HighestNote,
    /// Prefer stealing a voice already in its release phase; fall back to
    /// the oldest voice overall if every voice is still sustaining.
    OldestReleased,
}

/// The timbral character a [`Voice`] synthesizes.
///
/// `Sine`/`Square`/`Saw`/`Triangle` map directly onto [`OscillatorWaveform`].
/// The rest are small compositions built from the same oscillator/filter
/// primitives: `Fm` is two-operator phase modulation, `Pluck` is a noise
/// burst through a one-pole lowpass, `Pad` layers three detuned saws,
/// `Lead` runs a saw through a resonant lowpass with an envelope sweep, and
/// `Bass` mixes a saw with a one-octave-down sub-oscillator.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum VoiceWaveform {
    #[default]
    Sine,
    Square,
    Saw,
    Triangle,
    Fm,
    Pluck,
    Pad,
    Lead,
    Bass,
}

/// Modulator-to-carrier frequency ratio for the `Fm` waveform kind.
const FM_MODULATOR_RATIO: f32 = 2.1;
/// Phase modulation index (radians) for the `Fm` waveform kind.
const FM_MODULATION_INDEX: f32 = 3.0;
/// Detune applied to the two extra layers of the `Pad` waveform kind.
const PAD_DETUNE_CENTS: f32 = 7.0;
/// `Pluck`'s one-pole lowpass tracks a multiple of the fundamental.
const PLUCK_FILTER_RATIO: f32 = 8.0;

/// A single synthesizer voice.
///
/// Contains up to three oscillators, a state-variable filter, and envelopes
/// for amplitude and filter, composed according to the voice's
/// [`VoiceWaveform`].
///
/// # Example
///
/// ```rust
/// use fretloop_synth::Voice;
/// use fretloop_core::PitchClass;
///
/// let mut voice = Voice::new(48000.0);
/// voice.note_on(PitchClass::C, 4, 100);
///
/// for _ in 0..1000 {
///     let sample = voice.process();
/// }
///
/// voice.note_off();
/// ```
#[derive(Debug, Clone)]
pub struct Voice {
    /// Primary oscillator (carrier for `Fm`, fundamental everywhere else).
    pub osc1: Oscillator,
    /// Secondary oscillator (modulator for `Fm`, detuned layer for `Pad`).
    pub osc2: Oscillator,
    /// Tertiary oscillator (third `Pad` layer, sub-oscillator for `Bass`).
    pub osc3: Oscillator,
    /// Resonant lowpass used by the `Lead` waveform kind.
    pub filter: StateVariableFilter,
    /// One-pole lowpass used by the `Pluck` waveform kind.
    pub pluck_filter: OnePole,
    /// Amplitude envelope
    pub amp_env: AdsrEnvelope,
    /// Filter envelope
    pub filter_env: AdsrEnvelope,

    waveform: VoiceWaveform,
    pitch_class: PitchClass,
    octave: i32,
    velocity: u8,
    age: u64,
    active: bool,

    sample_rate: f32,

    osc2_detune: f32,
    osc_mix: f32,
    filter_env_amount: f32,
    filter_cutoff: f32,

    external_pitch_mod_semitones: f32,
    external_filter_mod_hz: f32,
}

impl Default for Voice {
    fn default() -> Self {
        Self::new(48000.0)
    }
}

impl Voice {
    /// Create a new voice at the given sample rate, defaulting to `Sine`.
    pub fn new(sample_rate: f32) -> Self {
        let mut voice = Self {
            osc1: Oscillator::new(sample_rate),
            osc2: Oscillator::new(sample_rate),
            osc3: Oscillator::new(sample_rate),
            filter: StateVariableFilter::new(sample_rate),
            pluck_filter: OnePole::new(sample_rate, 2000.0),
            amp_env: AdsrEnvelope::new(sample_rate),
            filter_env: AdsrEnvelope::new(sample_rate),
            waveform: VoiceWaveform::Sine,
            pitch_class: PitchClass::C,
            octave: 4,
            velocity: 0,
            age: 0,
            active: false,
            sample_rate,
            osc2_detune: 0.0,
            osc_mix: 0.0,
            filter_env_amount: 0.0,
            filter_cutoff: 20000.0,
            external_pitch_mod_semitones: 0.0,
            external_filter_mod_hz: 0.0,
        };
        voice.set_waveform(VoiceWaveform::Sine);
        voice
    }

    /// Set sample rate for all components.
    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        self.sample_rate = sample_rate;
        self.osc1.set_sample_rate(sample_rate);
        self.osc2.set_sample_rate(sample_rate);
        self.osc3.set_sample_rate(sample_rate);
        self.filter.set_sample_rate(sample_rate);
        self.pluck_filter.set_sample_rate(sample_rate);
        self.amp_env.set_sample_rate(sample_rate);
        self.filter_env.set_sample_rate(sample_rate);
    }

    /// Configure the voice's timbral character.
    ///
    /// Sets the oscillator waveforms and picks an ADSR/filter profile
    /// suited to the kind: snappy for `Pluck`, slow attack/release for
    /// `Pad`, medium attack/long release for `Lead`/`Fm`, and fast
    /// attack/short release for the rest.
    pub fn set_waveform(&mut self, waveform: VoiceWaveform) {
        self.waveform = waveform;
        match waveform {
            VoiceWaveform::Sine => self.osc1.set_waveform(OscillatorWaveform::Sine),
            VoiceWaveform::Square => self.osc1.set_waveform(OscillatorWaveform::Square),
            VoiceWaveform::Saw => self.osc1.set_waveform(OscillatorWaveform::Saw),
            VoiceWaveform::Triangle => self.osc1.set_waveform(OscillatorWaveform::Triangle),
            VoiceWaveform::Fm => {
                self.osc1.set_waveform(OscillatorWaveform::Sine);
                self.osc2.set_waveform(OscillatorWaveform::Sine);
            }
            VoiceWaveform::Pluck => self.osc1.set_waveform(OscillatorWaveform::Noise),
            VoiceWaveform::Pad => {
                self.osc1.set_waveform(OscillatorWaveform::Saw);
                self.osc2.set_waveform(OscillatorWaveform::Saw);
                self.osc3.set_waveform(OscillatorWaveform::Saw);
            }
            VoiceWaveform::Lead => self.osc1.set_waveform(OscillatorWaveform::Saw),
            VoiceWaveform::Bass => {
                self.osc1.set_waveform(OscillatorWaveform::Saw);
                self.osc3.set_waveform(OscillatorWaveform::Saw);
            }
        }

        let (attack, decay, sustain, release) = match waveform {
            VoiceWaveform::Pluck => (2.0, 150.0, 0.0, 100.0),
            VoiceWaveform::Pad => (600.0, 400.0, 0.8, 900.0),
            VoiceWaveform::Lead | VoiceWaveform::Fm => (40.0, 200.0, 0.75, 500.0),
            _ => (5.0, 50.0, 0.8, 80.0),
        };
        self.amp_env.set_attack_ms(attack);
        self.amp_env.set_decay_ms(decay);
        self.amp_env.set_sustain(sustain);
        self.amp_env.set_release_ms(release);

        match waveform {
            VoiceWaveform::Lead => {
                self.filter_cutoff = 800.0;
                self.filter.set_resonance(4.0);
                self.filter_env_amount = 3000.0;
            }
            _ => {
                self.filter_cutoff = 20000.0;
                self.filter.set_resonance(0.7);
                self.filter_env_amount = 0.0;
            }
        }
        self.filter_env.set_attack_ms(attack.max(5.0));
        self.filter_env.set_decay_ms(decay);
        self.filter_env.set_sustain(sustain);
        self.filter_env.set_release_ms(release);
    }

    /// Get the voice's current waveform kind.
    pub fn waveform(&self) -> VoiceWaveform {
        self.waveform
    }

    /// Trigger note on at the given pitch class, octave, and velocity (0-127).
    pub fn note_on(&mut self, pitch_class: PitchClass, octave: i32, velocity: u8) {
        self.pitch_class = pitch_class;
        self.octave = octave;
        self.velocity = velocity;
        self.active = true;

        let freq = note_frequency(pitch_class, octave);
        match self.waveform {
            VoiceWaveform::Fm => {
                self.osc1.set_frequency(freq);
                self.osc2.set_frequency(freq * FM_MODULATOR_RATIO);
            }
            VoiceWaveform::Pad => {
                self.osc1.set_frequency(freq);
                self.osc2
                    .set_frequency(freq * cents_to_ratio(PAD_DETUNE_CENTS));
                self.osc3
                    .set_frequency(freq * cents_to_ratio(-PAD_DETUNE_CENTS));
            }
            VoiceWaveform::Bass => {
                self.osc1.set_frequency(freq);
                self.osc3.set_frequency(freq * 0.5);
            }
            VoiceWaveform::Pluck => {
                self.pluck_filter
                    .set_frequency((freq * PLUCK_FILTER_RATIO).clamp(200.0, 10000.0));
            }
            _ => {
                self.osc1.set_frequency(freq);
                self.osc2
                    .set_frequency(freq * cents_to_ratio(self.osc2_detune));
            }
        }

        self.osc1.reset();
        self.osc2.reset();
        self.osc3.reset();
        self.amp_env.gate_on();
        self.filter_env.gate_on();
    }

    /// Trigger note off.
    pub fn note_off(&mut self) {
        self.amp_env.gate_off();
        self.filter_env.gate_off();
    }

    /// Force voice to stop immediately.
    pub fn kill(&mut self) {
        self.active = false;
        self.amp_env.reset();
        self.filter_env.reset();
    }

    /// Reset voice to initial state.
    pub fn reset(&mut self) {
        self.kill();
        self.pitch_class = PitchClass::C;
        self.octave = 4;
        self.velocity = 0;
        self.age = 0;
        self.osc1.reset();
        self.osc2.reset();
        self.osc3.reset();
        self.filter.reset();
        self.pluck_filter.reset();
    }

    /// Check if voice is currently producing sound.
    pub fn is_active(&self) -> bool {
        self.active && self.amp_env.is_active()
    }

    /// Check if the voice is active but in its release phase — the
    /// preferred steal target for [`VoiceAllocationMode::OldestReleased`].
    pub fn is_released(&self) -> bool {
        self.active && self.amp_env.state() == crate::envelope::EnvelopeState::Release
    }

    /// Get the current pitch class.
    pub fn pitch_class(&self) -> PitchClass {
        self.pitch_class
    }

    /// Get the current octave.
    pub fn octave(&self) -> i32 {
        self.octave
    }

    /// Monotonic note number (`C-1` = 0) used for ordering across voices.
    pub fn note_number(&self) -> i32 {
        (self.octave + 1) * 12 + self.pitch_class.semitone() as i32
    }

    /// Get the current velocity.
    pub fn velocity(&self) -> u8 {
        self.velocity
    }

    /// Get voice age.
    pub fn age(&self) -> u64 {
        self.age
    }

    /// Set voice age.
    pub fn set_age(&mut self, age: u64) {
        self.age = age;
    }

    /// Set oscillator 2 detune in cents (non-`Fm`/`Pad`/`Bass` kinds only).
    pub fn set_osc2_detune(&mut self, cents: f32) {
        self.osc2_detune = cents;
        if self.active
            && matches!(
                self.waveform,
                VoiceWaveform::Sine
                    | VoiceWaveform::Square
                    | VoiceWaveform::Saw
                    | VoiceWaveform::Triangle
                    | VoiceWaveform::Lead
            )
        {
            let base_freq = note_frequency(self.pitch_class, self.octave);
            self.osc2.set_frequency(base_freq * cents_to_ratio(cents));
        }
    }

    /// Set oscillator mix (0 = osc1 only, 1 = osc2 only). Only meaningful
    /// for the plain waveform kinds that expose a detuned osc2 layer.
    pub fn set_osc_mix(&mut self, mix: f32) {
        self.osc_mix = mix.clamp(0.0, 1.0);
    }

    /// Set filter envelope amount (in Hz).
    pub fn set_filter_env_amount(&mut self, amount: f32) {
        self.filter_env_amount = amount;
    }

    /// Set base filter cutoff frequency.
    pub fn set_filter_cutoff(&mut self, freq: f32) {
        self.filter_cutoff = freq;
    }

    /// Apply an external pitch modulation in semitones (e.g. from an LFO).
    pub fn set_external_pitch_mod(&mut self, semitones: f32) {
        self.external_pitch_mod_semitones = semitones;
    }

    /// Apply an external filter cutoff modulation in Hz (e.g. from an LFO).
    pub fn set_external_filter_mod(&mut self, hz: f32) {
        self.external_filter_mod_hz = hz;
    }

    /// Process one sample.
    #[inline]
    pub fn process(&mut self) -> f32 {
        if !self.is_active() {
            if self.active && !self.amp_env.is_active() {
                self.active = false;
            }
            return 0.0;
        }

        if self.external_pitch_mod_semitones != 0.0 {
            let ratio = cents_to_ratio(self.external_pitch_mod_semitones * 100.0);
            let base = note_frequency(self.pitch_class, self.octave);
            self.osc1.set_frequency(base * ratio);
        }

        let osc_out = match self.waveform {
            VoiceWaveform::Sine
            | VoiceWaveform::Square
            | VoiceWaveform::Saw
            | VoiceWaveform::Triangle => {
                let a = self.osc1.advance();
                let b = self.osc2.advance();
                a * (1.0 - self.osc_mix) + b * self.osc_mix
            }
            VoiceWaveform::Fm => {
                let modulator = self.osc2.advance();
                self.osc1.advance_with_pm(modulator * FM_MODULATION_INDEX)
            }
            VoiceWaveform::Pluck => {
                let noise = self.osc1.advance();
                self.pluck_filter.process(noise)
            }
            VoiceWaveform::Pad => {
                let a = self.osc1.advance();
                let b = self.osc2.advance();
                let c = self.osc3.advance();
                (a + b + c) / 3.0
            }
            VoiceWaveform::Lead => self.osc1.advance(),
            VoiceWaveform::Bass => {
                let fundamental = self.osc1.advance();
                let sub = self.osc3.advance();
                fundamental * 0.6 + sub * 0.4
            }
        };

        let filter_env = self.filter_env.advance();
        let modulated_cutoff =
            self.filter_cutoff + filter_env * self.filter_env_amount + self.external_filter_mod_hz;
        self.filter.set_cutoff(modulated_cutoff.clamp(20.0, 20000.0));

        let filtered = match self.waveform {
            VoiceWaveform::Lead => self.filter.process(osc_out),
            _ => osc_out,
        };

        let amp_env = self.amp_env.advance();
        let velocity_scale = self.velocity as f32 / 127.0;

        filtered * amp_env * velocity_scale
    }
}

/// Voice manager for polyphonic synthesis.
///
/// Manages a pool of `N` voices and handles note allocation/stealing.
///
/// # Example
///
/// ```rust
/// use fretloop_synth::{VoiceManager, VoiceAllocationMode};
/// use fretloop_core::PitchClass;
///
/// let mut manager: VoiceManager<8> = VoiceManager::new(48000.0);
/// manager.set_allocation_mode(VoiceAllocationMode::OldestReleased);
///
/// manager.note_on(PitchClass::C, 4, 100);
/// manager.note_on(PitchClass::E, 4, 100);
/// manager.note_on(PitchClass::G, 4, 100);
///
/// for _ in 0..1000 {
///     let sample = manager.process();
/// }
/// ```
#[derive(Debug)]
pub struct VoiceManager<const N: usize> {
    voices: [Voice; N],
    allocation_mode: VoiceAllocationMode,
    sample_rate: f32,
    age_counter: u64,
    round_robin_idx: usize,
}

impl<const N: usize> VoiceManager<N> {
    /// Create a new voice manager with the specified number of voices.
    pub fn new(sample_rate: f32) -> Self {
        Self {
            voices: core::array::from_fn(|_| Voice::new(sample_rate)),
            allocation_mode: VoiceAllocationMode::RoundRobin,
            sample_rate,
            age_counter: 0,
            round_robin_idx: 0,
        }
    }

    /// Set sample rate for all voices.
    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        self.sample_rate = sample_rate;
        for voice in &mut self.voices {
            voice.set_sample_rate(sample_rate);
        }
    }

    /// Set voice allocation mode.
    pub fn set_allocation_mode(&mut self, mode: VoiceAllocationMode) {
        self.allocation_mode = mode;
    }

    /// Get current allocation mode.
    pub fn allocation_mode(&self) -> VoiceAllocationMode {
        self.allocation_mode
    }

    /// Get number of voices.
    pub fn voice_count(&self) -> usize {
        N
    }

    /// Get number of active voices.
    pub fn active_voice_count(&self) -> usize {
        self.voices.iter().filter(|v| v.is_active()).count()
    }

    /// Get mutable access to all voices (for setting parameters).
    pub fn voices_mut(&mut self) -> &mut [Voice; N] {
        &mut self.voices
    }

    /// Get read access to all voices.
    pub fn voices(&self) -> &[Voice; N] {
        &self.voices
    }

    /// Trigger a note on.
    pub fn note_on(&mut self, pitch_class: PitchClass, octave: i32, velocity: u8) {
        let voice_idx = self.allocate_voice();
        self.age_counter += 1;
        self.voices[voice_idx].set_age(self.age_counter);
        self.voices[voice_idx].note_on(pitch_class, octave, velocity);
    }

    /// Trigger a note off for the first active voice matching this pitch.
    pub fn note_off(&mut self, pitch_class: PitchClass, octave: i32) {
        for voice in &mut self.voices {
            if voice.is_active() && voice.pitch_class() == pitch_class && voice.octave() == octave
            {
                voice.note_off();
                return;
            }
        }
    }

    /// Stop all notes immediately.
    pub fn all_notes_off(&mut self) {
        for voice in &mut self.voices {
            voice.kill();
        }
    }

    /// Reset all voices.
    pub fn reset(&mut self) {
        for voice in &mut self.voices {
            voice.reset();
        }
        self.age_counter = 0;
        self.round_robin_idx = 0;
    }

    /// Process one sample from all voices.
    #[inline]
    pub fn process(&mut self) -> f32 {
        let mut output = 0.0;
        for voice in &mut self.voices {
            output += voice.process();
        }
        output
    }

    /// Process stereo output from all voices.
    #[inline]
    pub fn process_stereo(&mut self) -> (f32, f32) {
        let mono = self.process();
        (mono, mono)
    }

    fn allocate_voice(&mut self) -> usize {
        for (i, voice) in self.voices.iter().enumerate() {
            if !voice.is_active() {
                return i;
            }
        }

        match self.allocation_mode {
            VoiceAllocationMode::RoundRobin => {
                let idx = self.round_robin_idx;
                self.round_robin_idx = (self.round_robin_idx + 1) % N;
                idx
            }
            VoiceAllocationMode::OldestNote => self
                .voices
                .iter()
                .enumerate()
                .min_by_key(|(_, v)| v.age())
                .map(|(i, _)| i)
                .unwrap_or(0),
            VoiceAllocationMode::LowestNote => self
                .voices
                .iter()
                .enumerate()
                .min_by_key(|(_, v)| v.note_number())
                .map(|(i, _)| i)
                .unwrap_or(0),
            VoiceAllocationMode::HighestNote => self
                .voices
                .iter()
                .enumerate()
                .max_by_key(|(_, v)| v.note_number())
                .map(|(i, _)| i)
                .unwrap_or(0),
            VoiceAllocationMode::OldestReleased => self
                .voices
                .iter()
                .enumerate()
                .filter(|(_, v)| v.is_released())
                .min_by_key(|(_, v)| v.age())
                .or_else(|| self.voices.iter().enumerate().min_by_key(|(_, v)| v.age()))
                .map(|(i, _)| i)
                .unwrap_or(0),
        }
    }
}

/// Convert cents to frequency ratio.
///
/// 100 cents = 1 semitone.
#[inline]
pub fn cents_to_ratio(cents: f32) -> f32 {
    libm::powf(2.0, cents / 1200.0)
}
