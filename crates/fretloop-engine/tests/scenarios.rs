//! End-to-end scenario tests exercising the whole signal chain through
//! the public `Engine` API.

use fretloop_engine::{Engine, EngineConfig, RuntimeAnomaly};

const SAMPLE_RATE: f32 = 48000.0;

fn engine(block_size: usize) -> Engine<32> {
    let mut engine: Engine<32> = Engine::new(SAMPLE_RATE, 7);
    engine.start(&EngineConfig::new(SAMPLE_RATE as u32, block_size)).unwrap();
    engine
}

#[test]
fn dry_passthrough_with_effects_disabled() {
    let mut engine = engine(512);
    let bus = engine.parameter_bus();
    bus.set_arp_enabled(false);
    bus.set_delay_enabled(false);
    bus.set_wet_mix(0.0).unwrap();
    bus.set_dry_mix(1.0).unwrap();

    let input: Vec<f32> = (0..512)
        .map(|i| if i % 2 == 0 { 0.5 } else { -0.5 })
        .collect();
    let mut left = vec![0.0f32; 512];
    let mut right = vec![0.0f32; 512];
    engine.process(&input, &mut left, &mut right);

    for i in 0..512 {
        assert!((left[i] - input[i]).abs() < 1e-3, "left[{i}] = {} vs input {}", left[i], input[i]);
        assert!((right[i] - input[i]).abs() < 1e-3, "right[{i}] = {} vs input {}", right[i], input[i]);
    }
}

#[test]
fn simple_echo_places_impulse_at_delay_time() {
    let mut engine = engine(48000);
    let bus = engine.parameter_bus();
    bus.set_arp_enabled(false);
    bus.set_left_delay_s(0.25).unwrap();
    bus.set_right_delay_s(0.25).unwrap();
    bus.set_feedback(0.0).unwrap();
    bus.set_cross_feedback(0.0).unwrap();
    bus.set_wet_mix(1.0).unwrap();
    bus.set_dry_mix(0.0).unwrap();
    bus.set_ping_pong(false);

    let mut input = vec![0.0f32; 48000];
    input[0] = 1.0;
    let mut left = vec![0.0f32; 48000];
    let mut right = vec![0.0f32; 48000];
    engine.process(&input, &mut left, &mut right);

    let expected_index = 12000usize;
    let window = 3usize;
    let peak_near = |buf: &[f32]| {
        buf[expected_index.saturating_sub(window)..=(expected_index + window).min(buf.len() - 1)]
            .iter()
            .cloned()
            .fold(0.0f32, f32::max)
    };
    assert!(peak_near(&left) > 0.9, "left peak near delay time was {}", peak_near(&left));
    assert!(peak_near(&right) > 0.9, "right peak near delay time was {}", peak_near(&right));

    let far_from_impulse = left[20000..25000].iter().cloned().fold(0.0f32, |m, s| m.max(s.abs()));
    assert!(far_from_impulse < 0.05, "unexpected energy far from the impulse: {far_from_impulse}");
}

#[test]
fn chord_latch_reports_c_major_then_unlatches_on_silence() {
    let mut engine = engine(512);
    let bus = engine.parameter_bus();
    bus.set_arp_enabled(false);
    bus.set_min_chord_confidence(0.4).unwrap();
    bus.set_chord_hold_time_s(0.1).unwrap();

    let tone_block: Vec<f32> = (0..512)
        .map(|i| {
            let t = i as f32 / SAMPLE_RATE;
            0.33 * ((2.0 * std::f32::consts::PI * 261.63 * t).sin()
                + (2.0 * std::f32::consts::PI * 329.63 * t).sin()
                + (2.0 * std::f32::consts::PI * 392.0 * t).sin())
        })
        .collect();
    let silence = vec![0.0f32; 512];
    let mut left = vec![0.0f32; 512];
    let mut right = vec![0.0f32; 512];

    for _ in 0..100 {
        engine.process(&tone_block, &mut left, &mut right);
    }
    let status = engine.status();
    assert!(status.chord.valid, "expected a latched chord after sustained C major input");
    assert_eq!(status.chord.root_name, "C");

    for _ in 0..100 {
        engine.process(&silence, &mut left, &mut right);
    }
    let status = engine.status();
    assert!(!status.chord.valid, "chord should unlatch after sustained silence");
}

#[test]
fn arp_generation_produces_up_pattern_timeline_for_latched_c_major() {
    use fretloop_core::PitchClass;
    use fretloop_synth::VoiceWaveform;

    let mut engine = engine(512);
    let bus = engine.parameter_bus();
    bus.set_bpm(120.0).unwrap();
    bus.set_pattern(fretloop_synth::ArpPattern::Up);
    bus.set_arp_duration_s(1.0).unwrap();
    bus.set_synth_kind(VoiceWaveform::Sine);
    bus.set_min_chord_confidence(0.4).unwrap();
    bus.set_chord_hold_time_s(0.1).unwrap();

    let tone_block: Vec<f32> = (0..512)
        .map(|i| {
            let t = i as f32 / SAMPLE_RATE;
            0.33 * ((2.0 * std::f32::consts::PI * 261.63 * t).sin()
                + (2.0 * std::f32::consts::PI * 329.63 * t).sin()
                + (2.0 * std::f32::consts::PI * 392.0 * t).sin())
        })
        .collect();
    let mut left = vec![0.0f32; 512];
    let mut right = vec![0.0f32; 512];
    for _ in 0..100 {
        engine.process(&tone_block, &mut left, &mut right);
    }

    assert!(engine.status().chord.valid);
    let timeline = engine.arp_timeline();
    assert_eq!(timeline.len(), 4);
    let expected_starts = [0.0, 0.25, 0.5, 0.75];
    let expected_pitches = [PitchClass::C, PitchClass::E, PitchClass::G, PitchClass::C];
    for (note, (&start, &pitch)) in timeline.iter().zip(expected_starts.iter().zip(expected_pitches.iter())) {
        assert!((note.start_time - start).abs() < 1e-4);
        assert!((note.duration - 0.25).abs() < 1e-4);
        assert_eq!(note.pitch_class, pitch);
        assert_eq!(note.octave, 4);
    }
}

#[test]
fn non_finite_input_is_replaced_with_silence_and_counted() {
    let mut dirty = engine(64);
    dirty.parameter_bus().set_arp_enabled(false);
    let mut clean = engine(64);
    clean.parameter_bus().set_arp_enabled(false);

    let mut dirty_input = vec![0.0f32; 64];
    dirty_input[10] = f32::INFINITY;
    let clean_input = vec![0.0f32; 64];

    let mut dirty_left = vec![0.0f32; 64];
    let mut dirty_right = vec![0.0f32; 64];
    let mut clean_left = vec![0.0f32; 64];
    let mut clean_right = vec![0.0f32; 64];

    dirty.process(&dirty_input, &mut dirty_left, &mut dirty_right);
    clean.process(&clean_input, &mut clean_left, &mut clean_right);

    assert!(dirty_left.iter().chain(dirty_right.iter()).all(|s| s.is_finite()));
    assert_eq!(dirty_left[10], 0.0, "offending frame's output must be silence");
    assert_eq!(dirty_right[10], 0.0, "offending frame's output must be silence");
    assert_eq!(dirty.status().last_anomaly, RuntimeAnomaly::NonFiniteSample);
    assert_eq!(clean.status().last_anomaly, RuntimeAnomaly::None);

    let next_input = vec![0.1f32; 64];
    dirty.process(&next_input, &mut dirty_left, &mut dirty_right);
    clean.process(&next_input, &mut clean_left, &mut clean_right);

    assert!(
        dirty_left.iter().chain(dirty_right.iter()).all(|s| s.is_finite()),
        "the corrupted sample must not linger in the delay buffer"
    );
    for i in 0..64 {
        assert!(
            (dirty_left[i] - clean_left[i]).abs() < 1e-4,
            "left[{i}] diverged from the uncorrupted baseline: {} vs {}",
            dirty_left[i],
            clean_left[i]
        );
        assert!(
            (dirty_right[i] - clean_right[i]).abs() < 1e-4,
            "right[{i}] diverged from the uncorrupted baseline: {} vs {}",
            dirty_right[i],
            clean_right[i]
        );
    }
}

#[test]
fn feedback_and_cross_feedback_at_upper_bound_stays_bibo_stable() {
    let mut engine = engine(512);
    let bus = engine.parameter_bus();
    bus.set_arp_enabled(false);
    bus.set_feedback(0.9).unwrap();
    bus.set_cross_feedback(0.5).unwrap();
    bus.set_wet_mix(1.0).unwrap();
    bus.set_dry_mix(0.0).unwrap();

    let mut input = vec![0.0f32; 512];
    input[0] = 1.0;
    let mut left = vec![0.0f32; 512];
    let mut right = vec![0.0f32; 512];

    let mut total_energy = 0.0f64;
    for block in 0..200 {
        if block == 0 {
            engine.process(&input, &mut left, &mut right);
        } else {
            engine.process(&vec![0.0f32; 512], &mut left, &mut right);
        }
        for &s in left.iter().chain(right.iter()) {
            assert!(s.is_finite());
            assert!(s.abs() <= 1.0 + 1e-4);
            total_energy += f64::from(s.abs());
        }
    }
    assert!(total_energy.is_finite());
}
