//! Property-based tests for the engine's universal invariants: finite and
//! bounded output for any finite input and any in-domain parameter set.

use fretloop_engine::{Engine, EngineConfig};
use proptest::prelude::*;

const SAMPLE_RATE: f32 = 48000.0;
const BLOCK_SIZE: usize = 256;

fn configured_engine(
    feedback: f32,
    cross_feedback: f32,
    wet_mix: f32,
    dry_mix: f32,
    left_delay_s: f32,
    right_delay_s: f32,
    ping_pong: bool,
    distortion_enabled: bool,
) -> Engine<32> {
    let mut engine: Engine<32> = Engine::new(SAMPLE_RATE, 99);
    engine.start(&EngineConfig::new(SAMPLE_RATE as u32, BLOCK_SIZE)).unwrap();
    let bus = engine.parameter_bus();
    bus.set_feedback(feedback).unwrap();
    bus.set_cross_feedback(cross_feedback).unwrap();
    bus.set_wet_mix(wet_mix).unwrap();
    bus.set_dry_mix(dry_mix).unwrap();
    bus.set_left_delay_s(left_delay_s).unwrap();
    bus.set_right_delay_s(right_delay_s).unwrap();
    bus.set_ping_pong(ping_pong);
    bus.set_distortion_enabled(distortion_enabled);
    engine
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn output_is_always_finite_and_bounded(
        input in prop::array::uniform32(-1.0f32..=1.0f32),
        feedback in 0.0f32..=0.9f32,
        cross_feedback in 0.0f32..=0.5f32,
        wet_mix in 0.0f32..=1.0f32,
        dry_mix in 0.0f32..=1.0f32,
        left_delay_s in 0.001f32..=2.0f32,
        right_delay_s in 0.001f32..=2.0f32,
        ping_pong in any::<bool>(),
        distortion_enabled in any::<bool>(),
    ) {
        let mut engine = configured_engine(
            feedback, cross_feedback, wet_mix, dry_mix,
            left_delay_s, right_delay_s, ping_pong, distortion_enabled,
        );

        let block: Vec<f32> = input.to_vec();
        let mut left = vec![0.0f32; 32];
        let mut right = vec![0.0f32; 32];

        for _ in 0..8 {
            engine.process(&block, &mut left, &mut right);
            for &s in left.iter().chain(right.iter()) {
                prop_assert!(s.is_finite());
                prop_assert!(s.abs() <= 1.0 + 1e-3);
            }
        }
    }

}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    #[test]
    fn impulse_response_is_bibo_stable(
        feedback in 0.0f32..=0.9f32,
        cross_feedback in 0.0f32..=0.5f32,
    ) {
        let mut engine = configured_engine(feedback, cross_feedback, 1.0, 0.0, 0.1, 0.1, false, false);
        let bus = engine.parameter_bus();
        bus.set_arp_enabled(false);

        let mut impulse = vec![0.0f32; 32];
        impulse[0] = 1.0;
        let mut silence = vec![0.0f32; 32];
        let mut left = vec![0.0f32; 32];
        let mut right = vec![0.0f32; 32];

        let mut total: f64 = 0.0;
        for block in 0..(5 * 48000 / 32) {
            if block == 0 {
                engine.process(&impulse, &mut left, &mut right);
            } else {
                silence.fill(0.0);
                engine.process(&silence, &mut left, &mut right);
            }
            for &s in left.iter().chain(right.iter()) {
                total += f64::from(s.abs());
            }
        }
        prop_assert!(total.is_finite());
    }
}
