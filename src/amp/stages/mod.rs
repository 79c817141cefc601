pub mod clipper;
pub mod common;
pub mod distortion;
pub mod equalizer;
pub mod gain;
pub mod reverb;

use crate::params::ParameterSet;

use distortion::DistortionStage;
use equalizer::EqualizerStage;
use gain::GainStage;
use reverb::ReverbStage;

// The core trait that all processing stages must implement
pub trait Stage: Send + 'static {
    // Process a single sample through this stage
    fn process(&mut self, input: f32) -> f32;

    // Process a block of samples through this stage
    fn process_block(&mut self, input: &mut [f32]) {
        for sample in input.iter_mut() {
            *sample = self.process(*sample);
        }
    }

    // Pick this stage's controls out of a snapshot
    fn set_parameters(&mut self, params: &ParameterSet);
}

/// The closed set of stages an amplifier is built from.
pub enum EffectStage {
    Gain(GainStage),
    Distortion(DistortionStage),
    Equalizer(EqualizerStage),
    Reverb(ReverbStage),
}

impl EffectStage {
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Gain(_) => "gain",
            Self::Distortion(_) => "distortion",
            Self::Equalizer(_) => "equalizer",
            Self::Reverb(_) => "reverb",
        }
    }
}

impl Stage for EffectStage {
    #[inline]
    fn process(&mut self, input: f32) -> f32 {
        match self {
            Self::Gain(s) => s.process(input),
            Self::Distortion(s) => s.process(input),
            Self::Equalizer(s) => s.process(input),
            Self::Reverb(s) => s.process(input),
        }
    }

    fn process_block(&mut self, input: &mut [f32]) {
        match self {
            Self::Gain(s) => s.process_block(input),
            Self::Distortion(s) => s.process_block(input),
            Self::Equalizer(s) => s.process_block(input),
            Self::Reverb(s) => s.process_block(input),
        }
    }

    fn set_parameters(&mut self, params: &ParameterSet) {
        match self {
            Self::Gain(s) => s.set_parameters(params),
            Self::Distortion(s) => s.set_parameters(params),
            Self::Equalizer(s) => s.set_parameters(params),
            Self::Reverb(s) => s.set_parameters(params),
        }
    }
}
