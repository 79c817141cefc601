use crate::amp::stages::Stage;
use crate::amp::stages::common::{Biquad, BiquadCoefficients};
use crate::params::ParameterSet;

/// Three-band EQ: bass low shelf, mid peak/notch, treble high shelf in series.
///
/// Each control spans -1..1 which maps to ±12 dB. A control at exactly 0
/// leaves its band as a passthrough, so the flat EQ is an identity.
pub struct EqualizerStage {
    bass: f32,
    mid: f32,
    treble: f32,
    sample_rate: f32,

    // --- filter state ---
    low: Biquad,
    peak: Biquad,
    high: Biquad,
}

impl EqualizerStage {
    pub const BASS_HZ: f32 = 100.0;
    pub const MID_HZ: f32 = 800.0;
    pub const TREBLE_HZ: f32 = 3000.0;
    pub const RANGE_DB: f32 = 12.0;

    const SHELF_Q: f32 = std::f32::consts::FRAC_1_SQRT_2;
    const MID_Q: f32 = 0.7;

    pub fn new(bass: f32, mid: f32, treble: f32, sample_rate: f32) -> Self {
        let mut stage = Self {
            bass,
            mid,
            treble,
            sample_rate,
            low: Biquad::default(),
            peak: Biquad::default(),
            high: Biquad::default(),
        };
        stage.update_low();
        stage.update_mid();
        stage.update_high();
        stage
    }

    fn update_low(&mut self) {
        self.low.set_coefficients(BiquadCoefficients::low_shelf(
            Self::BASS_HZ,
            Self::SHELF_Q,
            self.bass * Self::RANGE_DB,
            self.sample_rate,
        ));
    }

    fn update_mid(&mut self) {
        self.peak.set_coefficients(BiquadCoefficients::peaking(
            Self::MID_HZ,
            Self::MID_Q,
            self.mid * Self::RANGE_DB,
            self.sample_rate,
        ));
    }

    fn update_high(&mut self) {
        self.high.set_coefficients(BiquadCoefficients::high_shelf(
            Self::TREBLE_HZ,
            Self::SHELF_Q,
            self.treble * Self::RANGE_DB,
            self.sample_rate,
        ));
    }
}

impl Stage for EqualizerStage {
    #[inline]
    fn process(&mut self, input: f32) -> f32 {
        let x = self.low.process(input);
        let x = self.peak.process(x);
        self.high.process(x)
    }

    // Coefficients involve pow/sin/cos, so only recompute the bands that moved.
    fn set_parameters(&mut self, params: &ParameterSet) {
        if params.bass != self.bass {
            self.bass = params.bass;
            self.update_low();
        }
        if params.mid != self.mid {
            self.mid = params.mid;
            self.update_mid();
        }
        if params.treble != self.treble {
            self.treble = params.treble;
            self.update_high();
        }
    }
}
