use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use rustamp::amp::chain::EffectsChain;
use rustamp::amp::stages::clipper::ClipperType;
use rustamp::preset::PresetCatalog;
use std::hint::black_box;

const SAMPLE_RATE: f32 = 48000.0;
const BUFFER_SIZE: usize = 128;

fn bench_presets(c: &mut Criterion) {
    let mut group = c.benchmark_group("Effects Chain");
    let catalog = PresetCatalog::default();

    for preset in catalog.presets() {
        group.bench_with_input(
            BenchmarkId::from_parameter(&preset.name),
            &preset.parameters,
            |b, params| {
                let mut chain = EffectsChain::new(*params, SAMPLE_RATE, ClipperType::Soft);
                let mut buffer: Vec<f32> = vec![0.5f32; BUFFER_SIZE];

                b.iter(|| {
                    chain.process(black_box(&mut buffer), params);
                    black_box(&buffer);
                });
            },
        );
    }

    group.finish();
}

fn bench_parameter_change(c: &mut Criterion) {
    let catalog = PresetCatalog::default();
    let (Some(clean), Some(metal)) = (catalog.get("clean"), catalog.get("metal")) else {
        return;
    };
    let (clean, metal) = (clean.parameters, metal.parameters);

    c.bench_function("Effects Chain/alternating snapshots", |b| {
        let mut chain = EffectsChain::new(clean, SAMPLE_RATE, ClipperType::Soft);
        let mut buffer: Vec<f32> = vec![0.5f32; BUFFER_SIZE];
        let mut flip = false;

        b.iter(|| {
            flip = !flip;
            let params = if flip { &metal } else { &clean };
            chain.process(black_box(&mut buffer), params);
            black_box(&buffer);
        });
    });
}

criterion_group!(benches, bench_presets, bench_parameter_change);
criterion_main!(benches);
