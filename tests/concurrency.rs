use anyhow::Result;
use rustamp::amp::stages::clipper::ClipperType;
use rustamp::audio::engine::Engine;
use rustamp::preset::PresetCatalog;
use rustamp::Amplifier;
use rustamp::params::ParameterSet;
use rustamp::snapshot::SnapshotPublisher;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;

const SAMPLE_RATE: usize = 48_000;
const BUFFER_SIZE: usize = 64;

#[test]
fn reader_never_sees_a_mixed_snapshot() -> Result<()> {
    let catalog = PresetCatalog::default();
    let clean = catalog.get("clean").map(|p| p.parameters);
    let metal = catalog.get("metal").map(|p| p.parameters);
    let (Some(clean), Some(metal)) = (clean, metal) else {
        anyhow::bail!("built-in presets missing");
    };

    let mut amp = Amplifier::new(catalog, "clean")?;
    let reader = amp.reader();
    let done = Arc::new(AtomicBool::new(false));

    let writer_done = Arc::clone(&done);
    let writer = thread::spawn(move || -> Result<()> {
        for i in 0..2_000 {
            amp.load_preset(if i % 2 == 0 { "metal" } else { "clean" })?;
        }
        writer_done.store(true, Ordering::SeqCst);
        Ok(())
    });

    let mut last_version = 0;
    let mut observed = 0;
    while !done.load(Ordering::SeqCst) || observed == 0 {
        let snapshot = reader.load();
        assert!(
            snapshot.params == clean || snapshot.params == metal,
            "torn snapshot: {:?}",
            snapshot.params
        );
        assert!(snapshot.version >= last_version, "version went backwards");
        last_version = snapshot.version;
        observed += 1;
    }

    writer
        .join()
        .map_err(|e| anyhow::anyhow!("writer panicked: {e:?}"))??;
    assert_eq!(reader.load().version, 2_000);

    Ok(())
}

#[test]
fn engine_keeps_running_while_parameters_change() -> Result<()> {
    let mut amp = Amplifier::new(PresetCatalog::default(), "clean")?;
    let (mut engine, handle) =
        Engine::offline(amp.reader(), BUFFER_SIZE, SAMPLE_RATE, ClipperType::Soft)?;

    let audio = thread::spawn(move || -> Result<()> {
        let input = vec![0.25f32; BUFFER_SIZE];
        let mut output = vec![0.0f32; BUFFER_SIZE];
        for _ in 0..1_000 {
            engine.process(&input, &mut output)?;
            assert!(output.iter().all(|x| x.is_finite() && x.abs() <= 1.0));
        }
        Ok(())
    });

    let presets = amp.list_presets();
    for i in 0..500 {
        amp.load_preset(&presets[i % presets.len()])?;
    }

    audio
        .join()
        .map_err(|e| anyhow::anyhow!("audio thread panicked: {e:?}"))??;

    let stats = handle.stats();
    assert_eq!(stats.buffers, 1_000);
    assert_eq!(stats.device_errors, 0);
    assert!(stats.snapshot_version <= amp.current_snapshot().version);

    Ok(())
}

#[test]
fn every_buffer_uses_exactly_one_snapshot() -> Result<()> {
    const INPUT: f32 = 0.25;
    const GAINS: [f32; 2] = [1.0, 2.0];

    // Distortion, EQ and reverb at zero make the chain an exact scale by gain.
    let sets = GAINS.map(|gain| ParameterSet {
        gain,
        ..ParameterSet::default()
    });
    let (mut publisher, reader) = SnapshotPublisher::new(sets[0]);
    let (mut engine, _) = Engine::offline(reader, BUFFER_SIZE, SAMPLE_RATE, ClipperType::Soft)?;
    let done = Arc::new(AtomicBool::new(false));

    let writer_done = Arc::clone(&done);
    let writer = thread::spawn(move || {
        for i in 0..20_000 {
            publisher.publish(sets[i % 2]);
        }
        writer_done.store(true, Ordering::SeqCst);
    });

    let input = vec![INPUT; BUFFER_SIZE];
    let mut output = vec![0.0f32; BUFFER_SIZE];
    let mut seen = [0usize; 2];
    while !done.load(Ordering::SeqCst) || seen.iter().sum::<usize>() < 100 {
        engine.process(&input, &mut output)?;

        let first = output[0];
        assert!(
            output.iter().all(|&x| x == first),
            "buffer mixes parameter sets: {output:?}"
        );
        let Some(which) = GAINS.iter().position(|&g| first == INPUT * g) else {
            panic!("output {first} matches neither gain");
        };
        seen[which] += 1;
    }

    writer
        .join()
        .map_err(|e| anyhow::anyhow!("writer panicked: {e:?}"))?;

    Ok(())
}
