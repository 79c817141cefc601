use crate::amp::stages::Stage;
use crate::amp::stages::clipper::ClipperType;
use crate::params::ParameterSet;

/// Soft-clipping overdrive blended with the dry signal.
///
/// `y = (1 - d) * x + d * clip(drive(d) * x)`, where `drive` sweeps 1..50
/// with the distortion amount, so more distortion pushes the curve harder as
/// well as mixing more of it in.
pub struct DistortionStage {
    amount: f32, // 0..1
    drive: f32,
    clipper_type: ClipperType,
}

impl DistortionStage {
    const DRIVE_MIN: f32 = 1.0;
    const DRIVE_SCALE: f32 = 49.0;

    pub fn new(amount: f32, clipper: ClipperType) -> Self {
        let amount = amount.clamp(0.0, 1.0);
        Self {
            amount,
            drive: Self::drive_for(amount),
            clipper_type: clipper,
        }
    }

    #[inline]
    fn drive_for(amount: f32) -> f32 {
        amount.mul_add(Self::DRIVE_SCALE, Self::DRIVE_MIN)
    }

    pub const fn amount(&self) -> f32 {
        self.amount
    }
}

impl Stage for DistortionStage {
    #[inline]
    fn process(&mut self, input: f32) -> f32 {
        let d = self.amount;
        let wet = self.clipper_type.process(input, self.drive);
        let blended = (1.0 - d).mul_add(input, d * wet);

        // Rounding guard: the blend can never exceed max(|x|, 1).
        let bound = input.abs().max(1.0);
        blended.clamp(-bound, bound)
    }

    fn set_parameters(&mut self, params: &ParameterSet) {
        if params.distortion != self.amount {
            self.amount = params.distortion;
            self.drive = Self::drive_for(self.amount);
        }
    }
}
