//! Complete synthesizer implementations.
//!
//! Provides ready-to-use monophonic and polyphonic synthesizers
//! with modulation, filtering, and voice management.

use crate::voice::{VoiceAllocationMode, VoiceManager, VoiceWaveform};
use fretloop_core::{Lfo, LfoWaveform, PitchClass};

/// A polyphonic, chord/arp-driven synthesizer with configurable voice count.
///
/// Addresses notes by [`PitchClass`] + octave (matching the chord
/// detector's and arp scheduler's vocabulary) rather than raw MIDI note
/// numbers, and colors every voice with one [`VoiceWaveform`] composition.
///
/// # Example
///
/// ```rust
/// use fretloop_synth::{PolyphonicSynth, VoiceWaveform, VoiceAllocationMode};
/// use fretloop_core::PitchClass;
///
/// // Create an 8-voice synth
/// let mut synth: PolyphonicSynth<8> = PolyphonicSynth::new(48000.0);
///
/// synth.set_allocation_mode(VoiceAllocationMode::OldestReleased);
/// synth.set_waveform(VoiceWaveform::Pad);
///
/// // Play a chord
/// synth.note_on(PitchClass::C, 4, 100);
/// synth.note_on(PitchClass::E, 4, 100);
/// synth.note_on(PitchClass::G, 4, 100);
///
/// // Generate audio
/// for _ in 0..1000 {
///     let sample = synth.process();
/// }
/// ```
#[derive(Debug)]
pub struct PolyphonicSynth<const VOICES: usize> {
    /// Voice manager
    voices: VoiceManager<VOICES>,
    /// LFO 1 (global)
    lfo1: Lfo,
    /// LFO 2 (global)
    lfo2: Lfo,
    /// Sample rate
    sample_rate: f32,

    // Global parameters
    waveform: VoiceWaveform,
    osc2_detune: f32,
    osc_mix: f32,
    filter_cutoff: f32,
    filter_resonance: f32,
    filter_env_amount: f32,

    // LFO modulation amounts
    lfo1_to_pitch: f32,
    lfo1_to_filter: f32,
}

impl<const VOICES: usize> PolyphonicSynth<VOICES> {
    /// Create a new polyphonic synthesizer.
    pub fn new(sample_rate: f32) -> Self {
        let mut synth = Self {
            voices: VoiceManager::new(sample_rate),
            lfo1: Lfo::new(sample_rate, 5.0),
            lfo2: Lfo::new(sample_rate, 0.5),
            sample_rate,
            waveform: VoiceWaveform::Saw,
            osc2_detune: 0.0,
            osc_mix: 0.0,
            filter_cutoff: 1000.0,
            filter_resonance: 1.0,
            filter_env_amount: 0.0,
            lfo1_to_pitch: 0.0,
            lfo1_to_filter: 0.0,
        };

        // Apply default waveform/params to all voices
        synth.voices.set_allocation_mode(VoiceAllocationMode::OldestReleased);
        synth.update_voice_params();
        synth
    }

    /// Set sample rate.
    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        self.sample_rate = sample_rate;
        self.voices.set_sample_rate(sample_rate);
        self.lfo1.set_sample_rate(sample_rate);
        self.lfo2.set_sample_rate(sample_rate);
    }

    /// Set voice allocation mode.
    pub fn set_allocation_mode(&mut self, mode: VoiceAllocationMode) {
        self.voices.set_allocation_mode(mode);
    }

    /// Set the waveform composition for all voices.
    pub fn set_waveform(&mut self, waveform: VoiceWaveform) {
        self.waveform = waveform;
        for voice in self.voices.voices_mut() {
            voice.set_waveform(waveform);
        }
    }

    /// Current waveform composition.
    pub fn waveform(&self) -> VoiceWaveform {
        self.waveform
    }

    /// Set oscillator 2 detune for all voices.
    pub fn set_osc2_detune(&mut self, cents: f32) {
        self.osc2_detune = cents;
        for voice in self.voices.voices_mut() {
            voice.set_osc2_detune(cents);
        }
    }

    /// Set oscillator mix for all voices.
    pub fn set_osc_mix(&mut self, mix: f32) {
        self.osc_mix = mix;
        for voice in self.voices.voices_mut() {
            voice.set_osc_mix(mix);
        }
    }

    /// Set filter cutoff for all voices.
    pub fn set_filter_cutoff(&mut self, freq: f32) {
        self.filter_cutoff = freq;
        for voice in self.voices.voices_mut() {
            voice.set_filter_cutoff(freq);
        }
    }

    /// Set filter resonance for all voices.
    pub fn set_filter_resonance(&mut self, resonance: f32) {
        self.filter_resonance = resonance;
        for voice in self.voices.voices_mut() {
            voice.filter.set_resonance(resonance);
        }
    }

    /// Set filter envelope amount for all voices.
    pub fn set_filter_env_amount(&mut self, amount: f32) {
        self.filter_env_amount = amount;
        for voice in self.voices.voices_mut() {
            voice.set_filter_env_amount(amount);
        }
    }

    /// Set amplitude envelope attack for all voices.
    pub fn set_amp_attack(&mut self, ms: f32) {
        for voice in self.voices.voices_mut() {
            voice.amp_env.set_attack_ms(ms);
        }
    }

    /// Set amplitude envelope decay for all voices.
    pub fn set_amp_decay(&mut self, ms: f32) {
        for voice in self.voices.voices_mut() {
            voice.amp_env.set_decay_ms(ms);
        }
    }

    /// Set amplitude envelope sustain for all voices.
    pub fn set_amp_sustain(&mut self, level: f32) {
        for voice in self.voices.voices_mut() {
            voice.amp_env.set_sustain(level);
        }
    }

    /// Set amplitude envelope release for all voices.
    pub fn set_amp_release(&mut self, ms: f32) {
        for voice in self.voices.voices_mut() {
            voice.amp_env.set_release_ms(ms);
        }
    }

    /// Set LFO 1 rate.
    pub fn set_lfo1_rate(&mut self, hz: f32) {
        self.lfo1.set_frequency(hz);
    }

    /// Set LFO 1 waveform.
    pub fn set_lfo1_waveform(&mut self, waveform: LfoWaveform) {
        self.lfo1.set_waveform(waveform);
    }

    /// Set LFO 1 to pitch modulation.
    pub fn set_lfo1_to_pitch(&mut self, semitones: f32) {
        self.lfo1_to_pitch = semitones;
    }

    /// Set LFO 1 to filter modulation.
    pub fn set_lfo1_to_filter(&mut self, hz: f32) {
        self.lfo1_to_filter = hz;
    }

    fn update_voice_params(&mut self) {
        for voice in self.voices.voices_mut() {
            voice.set_waveform(self.waveform);
            voice.set_osc2_detune(self.osc2_detune);
            voice.set_osc_mix(self.osc_mix);
            voice.set_filter_cutoff(self.filter_cutoff);
            voice.filter.set_resonance(self.filter_resonance);
            voice.set_filter_env_amount(self.filter_env_amount);
        }
    }

    /// Trigger a note at the given pitch class and octave.
    pub fn note_on(&mut self, pitch_class: PitchClass, octave: i32, velocity: u8) {
        self.voices.note_on(pitch_class, octave, velocity);
    }

    /// Release a note at the given pitch class and octave.
    pub fn note_off(&mut self, pitch_class: PitchClass, octave: i32) {
        self.voices.note_off(pitch_class, octave);
    }

    /// Stop all notes.
    pub fn all_notes_off(&mut self) {
        self.voices.all_notes_off();
    }

    /// Get number of active voices.
    pub fn active_voice_count(&self) -> usize {
        self.voices.active_voice_count()
    }

    /// Process one sample.
    #[inline]
    pub fn process(&mut self) -> f32 {
        // Get global LFO values
        let lfo1_val = self.lfo1.advance();
        let _lfo2_val = self.lfo2.advance();

        // Apply LFO modulation via Voice external mod fields
        let pitch_mod = lfo1_val * self.lfo1_to_pitch; // semitones
        let filter_mod = lfo1_val * self.lfo1_to_filter; // Hz

        for voice in self.voices.voices_mut() {
            voice.set_external_pitch_mod(pitch_mod);
            voice.set_external_filter_mod(filter_mod);
        }

        // Sum all voices
        self.voices.process()
    }

    /// Process stereo output from all voices.
    #[inline]
    pub fn process_stereo(&mut self) -> (f32, f32) {
        let lfo1_val = self.lfo1.advance();
        let _lfo2_val = self.lfo2.advance();

        let pitch_mod = lfo1_val * self.lfo1_to_pitch;
        let filter_mod = lfo1_val * self.lfo1_to_filter;

        for voice in self.voices.voices_mut() {
            voice.set_external_pitch_mod(pitch_mod);
            voice.set_external_filter_mod(filter_mod);
        }

        self.voices.process_stereo()
    }

    /// Fill `buffer` one sample at a time, then scale the whole block down
    /// if its peak exceeds unity headroom. A soft, no-look-ahead safety net
    /// against many voices summing past 0dBFS, not a true limiter.
    pub fn process_block(&mut self, buffer: &mut [f32]) {
        for sample in buffer.iter_mut() {
            *sample = self.process();
        }
        let peak = buffer.iter().fold(0.0f32, |max, &s| max.max(libm::fabsf(s)));
        if peak > 0.99 {
            let gain = 0.99 / peak;
            for sample in buffer.iter_mut() {
                *sample *= gain;
            }
        }
    }

    /// Reset the synthesizer.
    pub fn reset(&mut self) {
        self.voices.reset();
        self.lfo1.reset();
        self.lfo2.reset();
    }
}
