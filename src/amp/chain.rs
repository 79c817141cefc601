use crate::amp::stages::clipper::ClipperType;
use crate::amp::stages::distortion::DistortionStage;
use crate::amp::stages::equalizer::EqualizerStage;
use crate::amp::stages::gain::GainStage;
use crate::amp::stages::reverb::ReverbStage;
use crate::amp::stages::{EffectStage, Stage};
use crate::params::ParameterSet;

// EffectsChain holds the fixed gain -> distortion -> EQ -> reverb sequence.
pub struct EffectsChain {
    stages: [EffectStage; 4],
    applied: ParameterSet,
}

impl EffectsChain {
    /// Builds every stage for `sample_rate`, including reverb delay lines, and
    /// primes them with `params`.
    pub fn new(params: ParameterSet, sample_rate: f32, clipper: ClipperType) -> Self {
        Self {
            stages: [
                EffectStage::Gain(GainStage::new(params.gain)),
                EffectStage::Distortion(DistortionStage::new(params.distortion, clipper)),
                EffectStage::Equalizer(EqualizerStage::new(
                    params.bass,
                    params.mid,
                    params.treble,
                    sample_rate,
                )),
                EffectStage::Reverb(ReverbStage::new(params.reverb, sample_rate)),
            ],
            applied: params,
        }
    }

    /// Pushes a snapshot's values into each stage. A no-op when nothing changed.
    pub fn apply_snapshot(&mut self, params: &ParameterSet) {
        if *params == self.applied {
            return;
        }
        for stage in &mut self.stages {
            stage.set_parameters(params);
        }
        self.applied = *params;
    }

    /// Processes a buffer in place with one consistent parameter set.
    pub fn process(&mut self, buffer: &mut [f32], params: &ParameterSet) {
        self.apply_snapshot(params);
        for stage in &mut self.stages {
            stage.process_block(buffer);
        }
    }

    pub const fn applied(&self) -> &ParameterSet {
        &self.applied
    }

    pub fn stage_names(&self) -> [&'static str; 4] {
        [
            self.stages[0].name(),
            self.stages[1].name(),
            self.stages[2].name(),
            self.stages[3].name(),
        ]
    }
}
