//! Arpeggio scheduling: turns a chord (root + quality) into an ordered,
//! immutable [`ArpNote`] timeline, and tracks playback of that timeline.

use fretloop_core::{ChordQuality, PitchClass};

/// One scheduled note in an arpeggio timeline. Timelines are built with
/// non-decreasing `start_time` and never place a note past the requested
/// duration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArpNote {
    pub pitch_class: PitchClass,
    pub octave: i32,
    pub start_time: f32,
    pub duration: f32,
    pub velocity: u8,
}

/// Named arpeggio patterns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ArpPattern {
    #[default]
    Up,
    Down,
    UpDown,
    DownUp,
    Random,
    OctaveUp,
    OctaveDown,
    Trance16th,
    DubstepChop,
    AmbientFlow,
    RockEighth,
}

impl ArpPattern {
    /// Parse a pattern from its wire/config name (e.g. `"up_down"`).
    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "up" => ArpPattern::Up,
            "down" => ArpPattern::Down,
            "up_down" => ArpPattern::UpDown,
            "down_up" => ArpPattern::DownUp,
            "random" => ArpPattern::Random,
            "octave_up" => ArpPattern::OctaveUp,
            "octave_down" => ArpPattern::OctaveDown,
            "trance_16th" => ArpPattern::Trance16th,
            "dubstep_chop" => ArpPattern::DubstepChop,
            "ambient_flow" => ArpPattern::AmbientFlow,
            "rock_eighth" => ArpPattern::RockEighth,
            _ => return None,
        })
    }

    /// The wire/config name for this pattern.
    pub fn name(self) -> &'static str {
        match self {
            ArpPattern::Up => "up",
            ArpPattern::Down => "down",
            ArpPattern::UpDown => "up_down",
            ArpPattern::DownUp => "down_up",
            ArpPattern::Random => "random",
            ArpPattern::OctaveUp => "octave_up",
            ArpPattern::OctaveDown => "octave_down",
            ArpPattern::Trance16th => "trance_16th",
            ArpPattern::DubstepChop => "dubstep_chop",
            ArpPattern::AmbientFlow => "ambient_flow",
            ArpPattern::RockEighth => "rock_eighth",
        }
    }

    fn subdivision(self) -> f32 {
        match self {
            ArpPattern::Trance16th | ArpPattern::DubstepChop => 4.0,
            _ => 2.0,
        }
    }

    fn stride_factor(self) -> f32 {
        match self {
            ArpPattern::AmbientFlow => 0.75,
            _ => 1.0,
        }
    }

    fn emphasis(self) -> &'static [f32] {
        match self {
            ArpPattern::RockEighth => &[1.0, 0.6, 0.85, 0.6],
            ArpPattern::Trance16th => &[1.0, 0.5, 0.75, 0.5],
            ArpPattern::DubstepChop => &[1.0, 0.7, 0.0, 0.85],
            ArpPattern::AmbientFlow => &[0.9, 0.7],
            _ => &[1.0, 0.8],
        }
    }

    /// Per-step duration scaling. Only `dubstep_chop` varies this.
    fn rhythm_factor(self, step: usize) -> f32 {
        match self {
            ArpPattern::DubstepChop => [0.5, 0.25, 0.25, 0.5][step % 4],
            _ => 1.0,
        }
    }

    /// `dubstep_chop`'s third slot in every four-step group is a rest.
    fn is_silent_step(self, step: usize) -> bool {
        matches!(self, ArpPattern::DubstepChop) && step % 4 == 2
    }
}

/// xorshift64* — small, seedable, no external RNG crate needed for a
/// deterministic note-order generator.
fn next_rand(state: &mut u64) -> u64 {
    let mut x = *state;
    x ^= x << 13;
    x ^= x >> 7;
    x ^= x << 17;
    *state = x;
    x.wrapping_mul(0x2545F4914F6CDD1D)
}

/// Chord-tone index and octave for a given step, per pattern.
///
/// `random` draws without replacement from a bag of chord-tone indices,
/// refilling the bag once exhausted so the same tone can't repeat until
/// every other tone has played. `octave_up`/`octave_down` keep the basic
/// ascending tone order but cycle the octave through 3→4→5 / 5→4→3 one
/// step at a time.
fn step_selection(
    pattern: ArpPattern,
    step: usize,
    n: usize,
    bag: &mut Vec<usize>,
    rng: &mut u64,
) -> (usize, i32) {
    match pattern {
        ArpPattern::Down => (n - 1 - (step % n), 4),
        ArpPattern::UpDown if n > 1 => {
            let period = 2 * (n - 1);
            let phase = step % period;
            let idx = if phase < n { phase } else { period - phase };
            (idx, 4)
        }
        ArpPattern::DownUp if n > 1 => {
            let period = 2 * (n - 1);
            let phase = step % period;
            let idx = if phase < n {
                n - 1 - phase
            } else {
                n - 1 - (period - phase)
            };
            (idx, 4)
        }
        ArpPattern::Random => {
            if bag.is_empty() {
                *bag = (0..n).collect();
            }
            let r = (next_rand(rng) as usize) % bag.len();
            (bag.swap_remove(r), 4)
        }
        ArpPattern::OctaveUp => (step % n, [3, 4, 5][step % 3]),
        ArpPattern::OctaveDown => (step % n, [5, 4, 3][step % 3]),
        _ => (step % n, 4),
    }
}

/// Build an ordered arpeggio timeline from a chord root/quality.
///
/// Returns an empty timeline if `quality` yields no pitch classes under
/// `root` (never happens for the built-in qualities, but kept as an
/// explicit edge case) or if `duration_seconds` is non-positive.
pub fn generate(
    root: PitchClass,
    quality: ChordQuality,
    pattern: ArpPattern,
    tempo_bpm: f32,
    duration_seconds: f32,
    seed: u64,
) -> Vec<ArpNote> {
    let mut pitch_classes: Vec<PitchClass> = quality
        .intervals()
        .iter()
        .map(|&interval| root.offset(interval as i32))
        .collect();
    pitch_classes.sort_by_key(|pc| pc.semitone());
    pitch_classes.dedup();

    let n = pitch_classes.len();
    if n == 0 || duration_seconds <= 0.0 {
        return Vec::new();
    }

    let subdivision = pattern.subdivision();
    let base_dur = 60.0 / (tempo_bpm.max(1.0) * subdivision);

    let mut notes = Vec::new();
    let mut t = 0.0f32;
    let mut step = 0usize;
    let mut rng_state = seed ^ 0x9E3779B97F4A7C15;
    let mut bag: Vec<usize> = Vec::new();
    let emphasis = pattern.emphasis();

    while t < duration_seconds {
        let (index, octave) = step_selection(pattern, step, n, &mut bag, &mut rng_state);
        if !pattern.is_silent_step(step) {
            let rhythm = pattern.rhythm_factor(step);
            let duration = (base_dur * rhythm).min(duration_seconds - t).max(0.0);
            if duration > 0.0 {
                let velocity_scale = emphasis[step % emphasis.len()].clamp(0.0, 1.0);
                notes.push(ArpNote {
                    pitch_class: pitch_classes[index],
                    octave,
                    start_time: t,
                    duration,
                    velocity: ((velocity_scale * 127.0) as u8).max(1),
                });
            }
        }
        t += base_dur * pattern.stride_factor();
        step += 1;
    }

    notes
}

/// Tracks a generated timeline and the playback cursor through it,
/// regenerating whenever the chord identity or scheduling parameters
/// change.
#[derive(Debug, Clone)]
pub struct ArpScheduler {
    pattern: ArpPattern,
    tempo_bpm: f32,
    duration_seconds: f32,
    seed: u64,
    chord_identity: Option<(PitchClass, ChordQuality)>,
    timeline: Vec<ArpNote>,
    cursor_time: f32,
    next_index: usize,
}

impl ArpScheduler {
    /// Create a new scheduler. `seed` fixes the `random` pattern's draw
    /// order so playback is reproducible.
    pub fn new(pattern: ArpPattern, tempo_bpm: f32, duration_seconds: f32, seed: u64) -> Self {
        Self {
            pattern,
            tempo_bpm,
            duration_seconds,
            seed,
            chord_identity: None,
            timeline: Vec::new(),
            cursor_time: 0.0,
            next_index: 0,
        }
    }

    /// Change pattern; regenerates immediately if a chord is latched.
    pub fn set_pattern(&mut self, pattern: ArpPattern) {
        if pattern != self.pattern {
            self.pattern = pattern;
            self.regenerate_from_current_identity();
        }
    }

    /// Change tempo; regenerates immediately if a chord is latched.
    pub fn set_tempo_bpm(&mut self, bpm: f32) {
        if (bpm - self.tempo_bpm).abs() > f32::EPSILON {
            self.tempo_bpm = bpm;
            self.regenerate_from_current_identity();
        }
    }

    /// Change the timeline length; regenerates immediately if a chord is
    /// latched.
    pub fn set_duration_seconds(&mut self, duration_seconds: f32) {
        if (duration_seconds - self.duration_seconds).abs() > f32::EPSILON {
            self.duration_seconds = duration_seconds;
            self.regenerate_from_current_identity();
        }
    }

    /// Current timeline (empty when no chord is latched).
    pub fn timeline(&self) -> &[ArpNote] {
        &self.timeline
    }

    /// Playback position within the current timeline, in seconds.
    pub fn cursor(&self) -> f32 {
        self.cursor_time
    }

    /// Feed the latest chord-detector output. Regenerates the timeline
    /// (resetting the play cursor to 0) whenever the latched root/quality
    /// changes, including transitions to/from invalid.
    ///
    /// Returns `true` if the timeline was regenerated.
    pub fn update_chord(&mut self, root: PitchClass, quality: ChordQuality, valid: bool) -> bool {
        let identity = if valid { Some((root, quality)) } else { None };
        if identity != self.chord_identity {
            self.chord_identity = identity;
            self.regenerate();
            true
        } else {
            false
        }
    }

    fn regenerate_from_current_identity(&mut self) {
        self.regenerate();
    }

    fn regenerate(&mut self) {
        self.cursor_time = 0.0;
        self.next_index = 0;
        self.timeline = match self.chord_identity {
            Some((root, quality)) => generate(
                root,
                quality,
                self.pattern,
                self.tempo_bpm,
                self.duration_seconds,
                self.seed,
            ),
            None => Vec::new(),
        };
    }

    /// Advance the cursor by `dt` seconds and return, in order, every
    /// timeline note whose `start_time` falls within the elapsed window —
    /// the note-on events the voice pool should trigger this block.
    pub fn advance(&mut self, dt: f32) -> Vec<ArpNote> {
        let window_end = self.cursor_time + dt;
        let mut due = Vec::new();
        while self.next_index < self.timeline.len()
            && self.timeline[self.next_index].start_time < window_end
        {
            due.push(self.timeline[self.next_index]);
            self.next_index += 1;
        }
        self.cursor_time = window_end;
        due
    }
}
