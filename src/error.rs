//! Error taxonomy shared by the control path, the engine and the device layer.

use std::time::Duration;
use thiserror::Error;

use crate::params::Parameter;

/// Rejections from the amplifier's control API. State is never modified when
/// one of these is returned.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AmpError {
    #[error("{parameter} must be between {min} and {max}, got {value}")]
    OutOfRange {
        parameter: Parameter,
        value: f32,
        min: f32,
        max: f32,
    },

    #[error("unknown preset '{0}'")]
    UnknownPreset(String),

    #[error("unknown parameter '{0}'")]
    UnknownParameter(String),
}

/// Failures opening or driving the audio device.
#[derive(Error, Debug)]
pub enum DeviceError {
    #[error("failed to open audio device")]
    Open(#[source] jack::Error),

    #[error("failed to register port '{name}'")]
    Port {
        name: &'static str,
        #[source]
        source: jack::Error,
    },

    #[error("failed to activate audio client")]
    Activate(#[source] jack::Error),
}

/// Real-time path failures. These never cross the callback boundary as a
/// panic; the caller substitutes silence or the held buffer and counts them.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineError {
    #[error("buffer size mismatch: expected {expected} frames, got {actual}")]
    BufferSizeMismatch { expected: usize, actual: usize },

    #[error("processing took {elapsed:?}, budget is {budget:?}")]
    Overrun { elapsed: Duration, budget: Duration },

    #[error("unsupported stream format: {buffer_size} frames at {sample_rate} Hz")]
    InvalidFormat {
        buffer_size: usize,
        sample_rate: usize,
    },
}
