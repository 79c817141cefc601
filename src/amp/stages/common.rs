use std::f32::consts::PI;

/// Convert decibels to linear amplitude.
#[inline]
pub fn db_to_lin(db: f32) -> f32 {
    10f32.powf(db / 20.0)
}

/// Flush values too small to matter to zero so feedback paths never sit in
/// denormal territory.
#[inline]
pub fn flush_denormal(x: f32) -> f32 {
    if x.abs() < 1e-20 { 0.0 } else { x }
}

/// Normalised biquad coefficients (`a0 == 1`).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BiquadCoefficients {
    pub b0: f32,
    pub b1: f32,
    pub b2: f32,
    pub a1: f32,
    pub a2: f32,
}

impl BiquadCoefficients {
    pub const PASSTHROUGH: Self = Self {
        b0: 1.0,
        b1: 0.0,
        b2: 0.0,
        a1: 0.0,
        a2: 0.0,
    };

    fn normalized(b0: f32, b1: f32, b2: f32, a0: f32, a1: f32, a2: f32) -> Self {
        let inv = 1.0 / a0;
        Self {
            b0: b0 * inv,
            b1: b1 * inv,
            b2: b2 * inv,
            a1: a1 * inv,
            a2: a2 * inv,
        }
    }

    /// RBJ cookbook low shelf. Exactly 0 dB yields passthrough.
    pub fn low_shelf(frequency: f32, q: f32, gain_db: f32, sample_rate: f32) -> Self {
        if gain_db == 0.0 {
            return Self::PASSTHROUGH;
        }
        let (a, cos, alpha) = Self::prewarp(frequency, q, gain_db, sample_rate);
        let sqrt_a_alpha = 2.0 * a.sqrt() * alpha;

        Self::normalized(
            a * ((a + 1.0) - (a - 1.0) * cos + sqrt_a_alpha),
            2.0 * a * ((a - 1.0) - (a + 1.0) * cos),
            a * ((a + 1.0) - (a - 1.0) * cos - sqrt_a_alpha),
            (a + 1.0) + (a - 1.0) * cos + sqrt_a_alpha,
            -2.0 * ((a - 1.0) + (a + 1.0) * cos),
            (a + 1.0) + (a - 1.0) * cos - sqrt_a_alpha,
        )
    }

    /// RBJ cookbook high shelf. Exactly 0 dB yields passthrough.
    pub fn high_shelf(frequency: f32, q: f32, gain_db: f32, sample_rate: f32) -> Self {
        if gain_db == 0.0 {
            return Self::PASSTHROUGH;
        }
        let (a, cos, alpha) = Self::prewarp(frequency, q, gain_db, sample_rate);
        let sqrt_a_alpha = 2.0 * a.sqrt() * alpha;

        Self::normalized(
            a * ((a + 1.0) + (a - 1.0) * cos + sqrt_a_alpha),
            -2.0 * a * ((a - 1.0) + (a + 1.0) * cos),
            a * ((a + 1.0) + (a - 1.0) * cos - sqrt_a_alpha),
            (a + 1.0) - (a - 1.0) * cos + sqrt_a_alpha,
            2.0 * ((a - 1.0) - (a + 1.0) * cos),
            (a + 1.0) - (a - 1.0) * cos - sqrt_a_alpha,
        )
    }

    /// RBJ cookbook peaking EQ. Negative gain cuts. Exactly 0 dB yields passthrough.
    pub fn peaking(frequency: f32, q: f32, gain_db: f32, sample_rate: f32) -> Self {
        if gain_db == 0.0 {
            return Self::PASSTHROUGH;
        }
        let (a, cos, alpha) = Self::prewarp(frequency, q, gain_db, sample_rate);

        Self::normalized(
            alpha.mul_add(a, 1.0),
            -2.0 * cos,
            (-alpha).mul_add(a, 1.0),
            1.0 + alpha / a,
            -2.0 * cos,
            1.0 - alpha / a,
        )
    }

    fn prewarp(frequency: f32, q: f32, gain_db: f32, sample_rate: f32) -> (f32, f32, f32) {
        let a = 10f32.powf(gain_db / 40.0);
        let omega = 2.0 * PI * frequency / sample_rate;
        let alpha = omega.sin() / (2.0 * q);
        (a, omega.cos(), alpha)
    }
}

/// Direct Form I biquad.
///
/// `y[n] = b0*x[n] + b1*x[n-1] + b2*x[n-2] - a1*y[n-1] - a2*y[n-2]`
#[derive(Debug, Clone)]
pub struct Biquad {
    coeffs: BiquadCoefficients,
    x1: f32,
    x2: f32,
    y1: f32,
    y2: f32,
}

impl Default for Biquad {
    fn default() -> Self {
        Self::new(BiquadCoefficients::PASSTHROUGH)
    }
}

impl Biquad {
    pub const fn new(coeffs: BiquadCoefficients) -> Self {
        Self {
            coeffs,
            x1: 0.0,
            x2: 0.0,
            y1: 0.0,
            y2: 0.0,
        }
    }

    /// Swaps coefficients while keeping the delay taps, so a change in
    /// response does not reset the signal history.
    pub const fn set_coefficients(&mut self, coeffs: BiquadCoefficients) {
        self.coeffs = coeffs;
    }

    pub const fn coefficients(&self) -> BiquadCoefficients {
        self.coeffs
    }

    #[inline]
    pub fn process(&mut self, input: f32) -> f32 {
        let c = self.coeffs;
        let output = c.b0 * input + c.b1 * self.x1 + c.b2 * self.x2
            - c.a1 * self.y1
            - c.a2 * self.y2;

        self.x2 = self.x1;
        self.x1 = input;
        self.y2 = self.y1;
        self.y1 = flush_denormal(output);

        output
    }

    pub const fn clear(&mut self) {
        self.x1 = 0.0;
        self.x2 = 0.0;
        self.y1 = 0.0;
        self.y2 = 0.0;
    }
}
