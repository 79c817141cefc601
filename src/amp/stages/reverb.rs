use crate::amp::stages::Stage;
use crate::amp::stages::common::flush_denormal;
use crate::params::ParameterSet;

/// Comb delays in samples at 44.1 kHz (first four Freeverb tunings).
const COMB_TUNING: [usize; 4] = [1116, 1188, 1277, 1356];
/// All-pass delays in samples at 44.1 kHz.
const ALLPASS_TUNING: [usize; 2] = [556, 441];
const REFERENCE_SAMPLE_RATE: f32 = 44_100.0;

const FEEDBACK: f32 = 0.84;
const DAMPING: f32 = 0.2;
const ALLPASS_FEEDBACK: f32 = 0.5;
const INPUT_GAIN: f32 = 0.05;

/// Feedback comb with a one-pole lowpass in the loop.
struct Comb {
    buffer: Vec<f32>,
    index: usize,
    store: f32,
}

impl Comb {
    fn new(len: usize) -> Self {
        Self {
            buffer: vec![0.0; len],
            index: 0,
            store: 0.0,
        }
    }

    #[inline]
    fn process(&mut self, input: f32) -> f32 {
        let output = self.buffer[self.index];
        self.store = flush_denormal((1.0 - DAMPING).mul_add(output, DAMPING * self.store));
        self.buffer[self.index] = FEEDBACK.mul_add(self.store, input);
        self.index = (self.index + 1) % self.buffer.len();
        output
    }

    fn clear(&mut self) {
        self.buffer.fill(0.0);
        self.store = 0.0;
    }
}

/// Schroeder all-pass used for diffusion.
struct AllPass {
    buffer: Vec<f32>,
    index: usize,
}

impl AllPass {
    fn new(len: usize) -> Self {
        Self {
            buffer: vec![0.0; len],
            index: 0,
        }
    }

    #[inline]
    fn process(&mut self, input: f32) -> f32 {
        let delayed = self.buffer[self.index];
        self.buffer[self.index] = flush_denormal(ALLPASS_FEEDBACK.mul_add(delayed, input));
        self.index = (self.index + 1) % self.buffer.len();
        delayed - input
    }

    fn clear(&mut self) {
        self.buffer.fill(0.0);
    }
}

/// Mono Freeverb-style reverb: parallel damped combs into series all-passes.
///
/// All delay lines are sized in the constructor for the sample rate; nothing
/// is allocated while processing. With a mix of 0 the input passes through
/// untouched and the network idles; it is cleared on re-activation so an old
/// tail never replays.
pub struct ReverbStage {
    mix: f32,
    combs: [Comb; 4],
    allpasses: [AllPass; 2],
}

impl ReverbStage {
    pub fn new(mix: f32, sample_rate: f32) -> Self {
        let scale = |len: usize| ((len as f32 * sample_rate / REFERENCE_SAMPLE_RATE) as usize).max(1);

        Self {
            mix: mix.clamp(0.0, 1.0),
            combs: COMB_TUNING.map(|len| Comb::new(scale(len))),
            allpasses: ALLPASS_TUNING.map(|len| AllPass::new(scale(len))),
        }
    }

    pub const fn mix(&self) -> f32 {
        self.mix
    }

    fn clear(&mut self) {
        for comb in &mut self.combs {
            comb.clear();
        }
        for allpass in &mut self.allpasses {
            allpass.clear();
        }
    }

    #[inline]
    fn wet(&mut self, input: f32) -> f32 {
        let excite = input * INPUT_GAIN;
        let mut out = 0.0;
        for comb in &mut self.combs {
            out += comb.process(excite);
        }
        for allpass in &mut self.allpasses {
            out = allpass.process(out);
        }
        out
    }
}

impl Stage for ReverbStage {
    #[inline]
    fn process(&mut self, input: f32) -> f32 {
        if self.mix == 0.0 {
            return input;
        }
        let wet = self.wet(input);
        (1.0 - self.mix).mul_add(input, self.mix * wet)
    }

    fn set_parameters(&mut self, params: &ParameterSet) {
        if self.mix == 0.0 && params.reverb > 0.0 {
            self.clear();
        }
        self.mix = params.reverb;
    }
}
