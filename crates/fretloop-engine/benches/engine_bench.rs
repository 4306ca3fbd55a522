//! Criterion benchmarks for the engine's per-block hot path.
//!
//! Run with: cargo bench -p fretloop-engine

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use fretloop_engine::{Engine, EngineConfig};

const SAMPLE_RATE: f32 = 48000.0;
const BLOCK_SIZES: &[usize] = &[128, 256, 512, 1024, 2048];

fn bench_process(c: &mut Criterion) {
    let mut group = c.benchmark_group("Engine::process");

    for &block_size in BLOCK_SIZES {
        let mut engine: Engine<32> = Engine::new(SAMPLE_RATE, 0xC0FFEE);
        engine
            .start(&EngineConfig::new(SAMPLE_RATE as u32, block_size))
            .unwrap();
        let bus = engine.parameter_bus();
        bus.set_bpm(140.0).unwrap();

        let input: Vec<f32> = (0..block_size)
            .map(|i| (i as f32 * 0.1).sin() * 0.5)
            .collect();
        let mut left = vec![0.0f32; block_size];
        let mut right = vec![0.0f32; block_size];

        group.bench_with_input(BenchmarkId::from_parameter(block_size), &block_size, |b, _| {
            b.iter(|| {
                engine.process(black_box(&input), &mut left, &mut right);
                black_box((&left, &right));
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_process);
criterion_main!(benches);
