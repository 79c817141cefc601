use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::f32::consts::PI;

/// Saturation curves. Both are odd, monotonic and approach ±1 asymptotically.
#[derive(ValueEnum, Copy, Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ClipperType {
    #[default]
    Soft, // Smooth, tube-like saturation (tanh)
    Medium, // Slower knee, more headroom (arctan)
}

impl std::fmt::Display for ClipperType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Soft => write!(f, "soft"),
            Self::Medium => write!(f, "medium"),
        }
    }
}

impl ClipperType {
    #[inline]
    pub fn process(&self, input: f32, drive: f32) -> f32 {
        let driven = input * drive;

        match self {
            Self::Soft => driven.tanh(),
            Self::Medium => driven.atan() * (2.0 / PI),
        }
    }
}
