use anyhow::{Context, Result};
use hound::{SampleFormat, WavReader, WavSpec, WavWriter};
use log::{debug, info};
use serde::Serialize;
use std::path::Path;

use crate::amp::stages::clipper::ClipperType;
use crate::audio::engine::Engine;
use crate::snapshot::SnapshotReader;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RenderSummary {
    pub frames: usize,
    pub blocks: usize,
    pub sample_rate: u32,
    /// Largest absolute output sample.
    pub peak: f32,
}

/// Runs a WAV file through the amp in fixed-size blocks, as the live engine
/// would, and writes the mono result as 32-bit float.
///
/// Only the first channel of multi-channel input is used.
pub fn render_file(
    input: &Path,
    output: &Path,
    reader: SnapshotReader,
    block_size: usize,
    clipper: ClipperType,
) -> Result<RenderSummary> {
    anyhow::ensure!(block_size > 0, "block size must be non-zero");

    let wav = WavReader::open(input)
        .with_context(|| format!("failed to open '{}'", input.display()))?;
    let spec = wav.spec();
    let samples = read_first_channel(wav)?;
    debug!(
        "Rendering {} frames at {} Hz from {}",
        samples.len(),
        spec.sample_rate,
        input.display()
    );

    let out_spec = WavSpec {
        channels: 1,
        sample_rate: spec.sample_rate,
        bits_per_sample: 32,
        sample_format: SampleFormat::Float,
    };
    let mut writer = WavWriter::create(output, out_spec)
        .with_context(|| format!("failed to create '{}'", output.display()))?;

    let (mut engine, _) = Engine::offline(reader, block_size, spec.sample_rate as usize, clipper)?;

    let mut in_block = vec![0.0f32; block_size];
    let mut out_block = vec![0.0f32; block_size];
    let mut summary = RenderSummary {
        frames: samples.len(),
        blocks: 0,
        sample_rate: spec.sample_rate,
        peak: 0.0,
    };

    for chunk in samples.chunks(block_size) {
        in_block[..chunk.len()].copy_from_slice(chunk);
        in_block[chunk.len()..].fill(0.0);

        engine.process(&in_block, &mut out_block)?;

        for &sample in &out_block[..chunk.len()] {
            summary.peak = summary.peak.max(sample.abs());
            writer.write_sample(sample)?;
        }
        summary.blocks += 1;
    }

    writer.finalize().context("failed to finalize WAV file")?;
    info!(
        "Rendered {} frames to {} (peak {:.3})",
        summary.frames,
        output.display(),
        summary.peak
    );

    Ok(summary)
}

fn read_first_channel<R: std::io::Read>(wav: WavReader<R>) -> Result<Vec<f32>> {
    let spec = wav.spec();
    let channels = spec.channels.max(1) as usize;

    let interleaved: Vec<f32> = match spec.sample_format {
        SampleFormat::Float => wav
            .into_samples::<f32>()
            .collect::<Result<_, _>>()
            .context("failed to read float samples")?,
        SampleFormat::Int => {
            let scale = 1.0 / (1u64 << (spec.bits_per_sample - 1)) as f32;
            wav.into_samples::<i32>()
                .map(|s| s.map(|v| v as f32 * scale))
                .collect::<Result<_, _>>()
                .context("failed to read integer samples")?
        }
    };

    Ok(interleaved.into_iter().step_by(channels).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_first_channel_of_stereo_ints() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("stereo.wav");
        let spec = WavSpec {
            channels: 2,
            sample_rate: 44_100,
            bits_per_sample: 16,
            sample_format: SampleFormat::Int,
        };
        let mut writer = WavWriter::create(&path, spec)?;
        for _ in 0..4 {
            writer.write_sample(i16::MAX / 2)?;
            writer.write_sample(i16::MIN)?;
        }
        writer.finalize()?;

        let samples = read_first_channel(WavReader::open(&path)?)?;
        assert_eq!(samples.len(), 4);
        assert!(samples.iter().all(|&s| (s - 0.5).abs() < 1e-3));
        Ok(())
    }
}
