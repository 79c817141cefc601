use anyhow::Result;
use rustamp::amp::stages::clipper::ClipperType;
use rustamp::audio::engine::Engine;
use rustamp::error::EngineError;
use rustamp::params::{Parameter, ParameterSet};
use rustamp::snapshot::SnapshotPublisher;
use std::time::Duration;

const SAMPLE_RATE: usize = 48_000;
const BUFFER_SIZE: usize = 128;

fn sine(len: usize, amplitude: f32) -> Vec<f32> {
    (0..len)
        .map(|i| {
            let t = i as f32 / SAMPLE_RATE as f32;
            (2.0 * std::f32::consts::PI * 440.0 * t).sin() * amplitude
        })
        .collect()
}

fn rms(buffer: &[f32]) -> f32 {
    (buffer.iter().map(|x| x * x).sum::<f32>() / buffer.len() as f32).sqrt()
}

#[test]
fn engine_processes_non_zero_signal() -> Result<()> {
    let (_publisher, reader) = SnapshotPublisher::new(ParameterSet::default());
    let (mut engine, handle) = Engine::offline(reader, BUFFER_SIZE, SAMPLE_RATE, ClipperType::Soft)?;

    let input = vec![0.5f32; BUFFER_SIZE];
    let mut output = vec![0.0f32; BUFFER_SIZE];

    for _ in 0..10 {
        engine.process(&input, &mut output)?;
    }

    assert!(output.iter().any(|&x| x != 0.0), "expected non-zero output");
    assert_eq!(handle.stats().buffers, 10);

    Ok(())
}

#[test]
fn neutral_parameters_pass_signal_through() -> Result<()> {
    let (_publisher, reader) = SnapshotPublisher::new(ParameterSet::default());
    let (mut engine, _) = Engine::offline(reader, BUFFER_SIZE, SAMPLE_RATE, ClipperType::Soft)?;

    let input = sine(BUFFER_SIZE, 0.5);
    let mut output = vec![0.0f32; BUFFER_SIZE];
    engine.process(&input, &mut output)?;

    for (x, y) in input.iter().zip(&output) {
        assert!((x - y).abs() < 1e-6, "expected {x}, got {y}");
    }

    Ok(())
}

#[test]
fn engine_handles_buffer_size_change() -> Result<()> {
    const NEW_BUFFER_SIZE: usize = 256;

    let (_publisher, reader) = SnapshotPublisher::new(ParameterSet::default());
    let (mut engine, _) = Engine::offline(reader, BUFFER_SIZE, SAMPLE_RATE, ClipperType::Soft)?;

    let input = vec![0.5f32; BUFFER_SIZE];
    let mut output = vec![0.0f32; BUFFER_SIZE];
    engine.process(&input, &mut output)?;

    engine.update_buffer_size(NEW_BUFFER_SIZE);
    assert_eq!(engine.buffer_size(), NEW_BUFFER_SIZE);

    let input = vec![0.5f32; NEW_BUFFER_SIZE];
    let mut output = vec![0.0f32; NEW_BUFFER_SIZE];
    engine.process(&input, &mut output)?;

    assert!(
        output.iter().any(|&x| x != 0.0),
        "expected non-zero output after buffer size change"
    );

    Ok(())
}

#[test]
fn engine_rejects_mismatched_buffer_sizes() -> Result<()> {
    let (_publisher, reader) = SnapshotPublisher::new(ParameterSet::default());
    let (mut engine, handle) = Engine::offline(reader, BUFFER_SIZE, SAMPLE_RATE, ClipperType::Soft)?;

    let small_input = vec![0.5f32; BUFFER_SIZE / 2];
    let mut small_output = vec![0.3f32; BUFFER_SIZE / 2];
    assert_eq!(
        engine.process(&small_input, &mut small_output),
        Err(EngineError::BufferSizeMismatch {
            expected: BUFFER_SIZE,
            actual: BUFFER_SIZE / 2,
        })
    );
    assert!(
        small_output.iter().all(|&x| x == 0.0),
        "expected silence on mismatch"
    );

    let large_input = vec![0.5f32; BUFFER_SIZE * 2];
    let mut large_output = vec![0.0f32; BUFFER_SIZE * 2];
    assert!(
        engine.process(&large_input, &mut large_output).is_err(),
        "expected error when input buffer size is larger than expected"
    );

    let stats = handle.stats();
    assert_eq!(stats.device_errors, 2);
    assert_eq!(stats.buffers, 0);
    assert_eq!(handle.events().try_iter().count(), 2);

    Ok(())
}

#[test]
fn engine_follows_published_parameters() -> Result<()> {
    let (mut publisher, reader) = SnapshotPublisher::new(ParameterSet::default());
    let (mut engine, handle) = Engine::offline(reader, BUFFER_SIZE, SAMPLE_RATE, ClipperType::Soft)?;

    let input = sine(BUFFER_SIZE, 0.2);
    let mut output = vec![0.0f32; BUFFER_SIZE];

    engine.process(&input, &mut output)?;
    let baseline = rms(&output);

    let version = publisher.publish(ParameterSet::default().with(Parameter::Gain, 0.5)?);
    engine.process(&input, &mut output)?;
    let halved = rms(&output);

    let ratio = halved / baseline;
    assert!(
        ratio < 0.55 && ratio > 0.45,
        "expected ~0.5x ratio, got {ratio}"
    );
    assert_eq!(handle.stats().snapshot_version, version);

    Ok(())
}

#[test]
fn overrun_replays_last_good_buffer() -> Result<()> {
    let (_publisher, reader) = SnapshotPublisher::new(ParameterSet::default());
    let (engine, handle) = Engine::offline(reader, BUFFER_SIZE, SAMPLE_RATE, ClipperType::Soft)?;
    // A zero budget can never be met.
    let mut engine = engine.with_deadline(Some(Duration::ZERO));

    let input = vec![0.5f32; BUFFER_SIZE];
    let mut output = vec![0.0f32; BUFFER_SIZE];

    for _ in 0..3 {
        engine.process(&input, &mut output)?;
        assert!(
            output.iter().all(|&x| x == 0.0),
            "nothing made its deadline, so the held buffer is silence"
        );
    }

    let stats = handle.stats();
    assert_eq!(stats.overruns, 3);
    assert_eq!(stats.buffers, 3);
    assert!(
        handle
            .events()
            .try_iter()
            .all(|e| matches!(e, EngineError::Overrun { .. }))
    );

    Ok(())
}

#[test]
fn output_never_exceeds_unit_range() -> Result<()> {
    let params = ParameterSet {
        gain: 5.0,
        distortion: 1.0,
        bass: 1.0,
        mid: 1.0,
        treble: 1.0,
        reverb: 1.0,
    };
    let (_publisher, reader) = SnapshotPublisher::new(params);
    let (mut engine, _) = Engine::offline(reader, BUFFER_SIZE, SAMPLE_RATE, ClipperType::Medium)?;

    let input = sine(BUFFER_SIZE, 1.0);
    let mut output = vec![0.0f32; BUFFER_SIZE];
    for _ in 0..50 {
        engine.process(&input, &mut output)?;
        assert!(output.iter().all(|x| (-1.0..=1.0).contains(x)));
    }

    Ok(())
}
