use crate::amp::stages::Stage;
use crate::params::ParameterSet;

/// Input gain. Scales only; clipping is left to the distortion stage and the
/// engine's output clamp.
pub struct GainStage {
    gain: f32,
}

impl GainStage {
    pub const fn new(gain: f32) -> Self {
        Self { gain }
    }

    pub const fn gain(&self) -> f32 {
        self.gain
    }
}

impl Stage for GainStage {
    #[inline]
    fn process(&mut self, input: f32) -> f32 {
        input * self.gain
    }

    fn set_parameters(&mut self, params: &ParameterSet) {
        self.gain = params.gain;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::Parameter;

    #[test]
    fn test_gain_stage() {
        let mut stage = GainStage::new(1.0);
        assert_eq!(stage.process(0.5), 0.5);

        let params = ParameterSet::default().with(Parameter::Gain, 4.0).unwrap();
        stage.set_parameters(&params);
        assert_eq!(stage.process(0.5), 2.0);

        // Never clips on its own.
        assert_eq!(stage.process(1.0), 4.0);
    }
}
