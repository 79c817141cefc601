use crossbeam::channel::{Receiver, Sender, bounded};
use serde::Serialize;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use crate::amp::chain::EffectsChain;
use crate::amp::stages::clipper::ClipperType;
use crate::error::EngineError;
use crate::snapshot::SnapshotReader;

const EVENT_CHANNEL_CAPACITY: usize = 64;

#[derive(Default)]
struct Counters {
    buffers: AtomicU64,
    overruns: AtomicU64,
    device_errors: AtomicU64,
    xruns: AtomicU64,
    snapshot_version: AtomicU64,
}

/// Point-in-time copy of the engine's diagnostic counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct EngineStats {
    pub buffers: u64,
    pub overruns: u64,
    pub device_errors: u64,
    pub xruns: u64,
    /// Version of the parameter snapshot used for the latest buffer.
    pub snapshot_version: u64,
}

impl std::fmt::Display for EngineStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Buffers processed: {}", self.buffers)?;
        writeln!(f, "Overruns:          {}", self.overruns)?;
        writeln!(f, "Device errors:     {}", self.device_errors)?;
        writeln!(f, "Xruns:             {}", self.xruns)?;
        write!(f, "Snapshot version:  {}", self.snapshot_version)
    }
}

/// Non-real-time view of a running engine: counters and the event stream.
#[derive(Clone)]
pub struct EngineHandle {
    counters: Arc<Counters>,
    rx_events: Receiver<EngineError>,
}

impl EngineHandle {
    pub fn stats(&self) -> EngineStats {
        EngineStats {
            buffers: self.counters.buffers.load(Ordering::Relaxed),
            overruns: self.counters.overruns.load(Ordering::Relaxed),
            device_errors: self.counters.device_errors.load(Ordering::Relaxed),
            xruns: self.counters.xruns.load(Ordering::Relaxed),
            snapshot_version: self.counters.snapshot_version.load(Ordering::Relaxed),
        }
    }

    /// Events pushed by the callback. Disconnects once the engine is dropped.
    pub const fn events(&self) -> &Receiver<EngineError> {
        &self.rx_events
    }

    pub fn record_xrun(&self) {
        self.counters.xruns.fetch_add(1, Ordering::Relaxed);
    }
}

/// The body of the audio callback.
///
/// Owns the effects chain and everything it needs, all sized up front, so
/// `process` never allocates, locks or logs.
pub struct Engine {
    chain: EffectsChain,
    reader: SnapshotReader,
    buffer_size: usize,
    sample_rate: usize,
    /// Processing budget per buffer; `None` when there is no hardware clock.
    deadline: Option<Duration>,
    /// Last output that made its deadline, replayed on overrun.
    held: Vec<f32>,
    counters: Arc<Counters>,
    tx_events: Sender<EngineError>,
}

impl Engine {
    /// Real-time engine with a deadline of one buffer period.
    pub fn new(
        reader: SnapshotReader,
        buffer_size: usize,
        sample_rate: usize,
        clipper: ClipperType,
    ) -> Result<(Self, EngineHandle), EngineError> {
        let (mut engine, handle) = Self::offline(reader, buffer_size, sample_rate, clipper)?;
        engine.deadline = Some(engine.period());
        Ok((engine, handle))
    }

    /// Engine without a deadline, for rendering files and tests.
    ///
    /// Both the buffer size and the sample rate must be non-zero.
    pub fn offline(
        reader: SnapshotReader,
        buffer_size: usize,
        sample_rate: usize,
        clipper: ClipperType,
    ) -> Result<(Self, EngineHandle), EngineError> {
        if buffer_size == 0 || sample_rate == 0 {
            return Err(EngineError::InvalidFormat {
                buffer_size,
                sample_rate,
            });
        }

        let counters = Arc::new(Counters::default());
        let (tx_events, rx_events) = bounded(EVENT_CHANNEL_CAPACITY);
        let initial = reader.load();

        Ok((
            Self {
                chain: EffectsChain::new(initial.params, sample_rate as f32, clipper),
                reader,
                buffer_size,
                sample_rate,
                deadline: None,
                held: vec![0.0; buffer_size],
                counters: Arc::clone(&counters),
                tx_events,
            },
            EngineHandle {
                counters,
                rx_events,
            },
        ))
    }

    pub fn with_deadline(mut self, deadline: Option<Duration>) -> Self {
        self.deadline = deadline;
        self
    }

    pub fn period(&self) -> Duration {
        Duration::from_secs_f64(self.buffer_size as f64 / self.sample_rate as f64)
    }

    pub const fn buffer_size(&self) -> usize {
        self.buffer_size
    }

    pub const fn sample_rate(&self) -> usize {
        self.sample_rate
    }

    /// Processes one buffer.
    ///
    /// Mismatched lengths silence `output` and return an error. An overrun is
    /// not an error for the caller: the previous output is substituted and the
    /// event is queued for the monitor.
    pub fn process(&mut self, input: &[f32], output: &mut [f32]) -> Result<(), EngineError> {
        let started = Instant::now();

        if input.len() != self.buffer_size || output.len() != self.buffer_size {
            output.fill(0.0);
            let err = EngineError::BufferSizeMismatch {
                expected: self.buffer_size,
                actual: if input.len() == self.buffer_size {
                    output.len()
                } else {
                    input.len()
                },
            };
            self.record_device_error(err);
            return Err(err);
        }

        let snapshot = self.reader.load();

        output.copy_from_slice(input);
        self.chain.process(output, &snapshot.params);
        for sample in output.iter_mut() {
            *sample = sample.clamp(-1.0, 1.0);
        }

        self.counters.buffers.fetch_add(1, Ordering::Relaxed);
        self.counters
            .snapshot_version
            .store(snapshot.version, Ordering::Relaxed);

        if let Some(budget) = self.deadline {
            let elapsed = started.elapsed();
            if elapsed >= budget {
                output.copy_from_slice(&self.held);
                self.counters.overruns.fetch_add(1, Ordering::Relaxed);
                let _ = self
                    .tx_events
                    .try_send(EngineError::Overrun { elapsed, budget });
                return Ok(());
            }
        }

        self.held.copy_from_slice(output);
        Ok(())
    }

    /// Counts a device-side failure seen by the driver around `process`.
    pub fn record_device_error(&self, err: EngineError) {
        self.counters.device_errors.fetch_add(1, Ordering::Relaxed);
        let _ = self.tx_events.try_send(err);
    }

    /// Called outside the callback when the device changes its period.
    pub fn update_buffer_size(&mut self, new_size: usize) {
        self.buffer_size = new_size;
        self.held.clear();
        self.held.resize(new_size, 0.0);
        if self.deadline.is_some() {
            self.deadline = Some(self.period());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::{Parameter, ParameterSet};
    use crate::snapshot::SnapshotPublisher;

    #[test]
    fn period_matches_buffer_and_rate() {
        let (_, reader) = SnapshotPublisher::new(ParameterSet::default());
        let (engine, _) = Engine::new(reader, 1024, 44_100, ClipperType::Soft).unwrap();
        let period = engine.period();
        assert!((period.as_secs_f64() - 0.023_22).abs() < 1e-4);
    }

    #[test]
    fn output_is_clamped() {
        let params = ParameterSet::default().with(Parameter::Gain, 5.0).unwrap();
        let (_, reader) = SnapshotPublisher::new(params);
        let (mut engine, _) = Engine::offline(reader, 64, 48_000, ClipperType::Soft).unwrap();

        let input = vec![0.9f32; 64];
        let mut output = vec![0.0f32; 64];
        engine.process(&input, &mut output).unwrap();
        assert!(output.iter().all(|&x| x == 1.0));
    }

    #[test]
    fn resize_changes_expected_length() {
        let (_, reader) = SnapshotPublisher::new(ParameterSet::default());
        let (mut engine, handle) = Engine::offline(reader, 64, 48_000, ClipperType::Soft).unwrap();

        engine.update_buffer_size(32);
        let input = vec![0.1f32; 32];
        let mut output = vec![0.0f32; 32];
        assert!(engine.process(&input, &mut output).is_ok());
        assert_eq!(handle.stats().device_errors, 0);
    }

    #[test]
    fn xruns_are_counted_through_handle() {
        let (_, reader) = SnapshotPublisher::new(ParameterSet::default());
        let (_engine, handle) = Engine::new(reader, 64, 48_000, ClipperType::Soft).unwrap();
        handle.record_xrun();
        handle.record_xrun();
        assert_eq!(handle.stats().xruns, 2);
    }

    #[test]
    fn zero_rate_or_size_is_rejected() {
        let (_, reader) = SnapshotPublisher::new(ParameterSet::default());
        assert!(matches!(
            Engine::new(reader.clone(), 128, 0, ClipperType::Soft),
            Err(EngineError::InvalidFormat {
                buffer_size: 128,
                sample_rate: 0,
            })
        ));
        assert!(Engine::offline(reader, 0, 48_000, ClipperType::Soft).is_err());
    }
}
