use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::RangeInclusive;
use std::str::FromStr;

use crate::error::AmpError;

/// One of the six user-facing amplifier controls.
#[derive(ValueEnum, Copy, Clone, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Parameter {
    Gain,
    Distortion,
    Bass,
    Mid,
    Treble,
    Reverb,
}

impl Parameter {
    pub const ALL: [Self; 6] = [
        Self::Gain,
        Self::Distortion,
        Self::Bass,
        Self::Mid,
        Self::Treble,
        Self::Reverb,
    ];

    pub const fn name(self) -> &'static str {
        match self {
            Self::Gain => "gain",
            Self::Distortion => "distortion",
            Self::Bass => "bass",
            Self::Mid => "mid",
            Self::Treble => "treble",
            Self::Reverb => "reverb",
        }
    }

    /// Closed range of valid values for this control.
    pub const fn range(self) -> RangeInclusive<f32> {
        match self {
            Self::Gain => 0.1..=5.0,
            Self::Distortion | Self::Reverb => 0.0..=1.0,
            Self::Bass | Self::Mid | Self::Treble => -1.0..=1.0,
        }
    }

    pub fn validate(self, value: f32) -> Result<f32, AmpError> {
        let range = self.range();
        if range.contains(&value) {
            Ok(value)
        } else {
            Err(AmpError::OutOfRange {
                parameter: self,
                value,
                min: *range.start(),
                max: *range.end(),
            })
        }
    }
}

impl fmt::Display for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for Parameter {
    type Err = AmpError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "gain" => Ok(Self::Gain),
            "dist" | "distortion" => Ok(Self::Distortion),
            "bass" => Ok(Self::Bass),
            "mid" => Ok(Self::Mid),
            "treble" => Ok(Self::Treble),
            "reverb" | "reverb_mix" => Ok(Self::Reverb),
            other => Err(AmpError::UnknownParameter(other.to_string())),
        }
    }
}

/// The full set of amplifier controls.
///
/// Fields are public, so a set built by hand or deserialized may hold
/// anything. [`ParameterSet::with`] and [`ParameterSet::validated`] are the
/// checked ways in, and the amplifier only stores sets that passed one.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ParameterSet {
    pub gain: f32,
    pub distortion: f32,
    pub bass: f32,
    pub mid: f32,
    pub treble: f32,
    #[serde(alias = "reverb_mix")]
    pub reverb: f32,
}

impl Default for ParameterSet {
    /// Unity gain, no distortion, flat EQ, dry.
    fn default() -> Self {
        Self {
            gain: 1.0,
            distortion: 0.0,
            bass: 0.0,
            mid: 0.0,
            treble: 0.0,
            reverb: 0.0,
        }
    }
}

impl ParameterSet {
    pub const fn get(&self, parameter: Parameter) -> f32 {
        match parameter {
            Parameter::Gain => self.gain,
            Parameter::Distortion => self.distortion,
            Parameter::Bass => self.bass,
            Parameter::Mid => self.mid,
            Parameter::Treble => self.treble,
            Parameter::Reverb => self.reverb,
        }
    }

    /// Returns a copy with `parameter` replaced, rejecting out-of-range values.
    pub fn with(&self, parameter: Parameter, value: f32) -> Result<Self, AmpError> {
        let value = parameter.validate(value)?;
        let mut next = *self;
        match parameter {
            Parameter::Gain => next.gain = value,
            Parameter::Distortion => next.distortion = value,
            Parameter::Bass => next.bass = value,
            Parameter::Mid => next.mid = value,
            Parameter::Treble => next.treble = value,
            Parameter::Reverb => next.reverb = value,
        }
        Ok(next)
    }

    /// Checks every field, returning the set unchanged when all are in range.
    pub fn validated(self) -> Result<Self, AmpError> {
        for parameter in Parameter::ALL {
            parameter.validate(self.get(parameter))?;
        }
        Ok(self)
    }
}

impl fmt::Display for ParameterSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "  Gain:       {:.2}", self.gain)?;
        writeln!(f, "  Distortion: {:.2}", self.distortion)?;
        writeln!(f, "  Bass:       {:.2}", self.bass)?;
        writeln!(f, "  Mid:        {:.2}", self.mid)?;
        writeln!(f, "  Treble:     {:.2}", self.treble)?;
        write!(f, "  Reverb:     {:.2}", self.reverb)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_aliases() {
        assert_eq!("dist".parse::<Parameter>().unwrap(), Parameter::Distortion);
        assert_eq!(
            "reverb_mix".parse::<Parameter>().unwrap(),
            Parameter::Reverb
        );
        assert_eq!(" Treble ".parse::<Parameter>().unwrap(), Parameter::Treble);
        assert!("presence".parse::<Parameter>().is_err());
    }

    #[test]
    fn range_edges_are_inclusive() {
        for parameter in Parameter::ALL {
            let range = parameter.range();
            assert!(parameter.validate(*range.start()).is_ok());
            assert!(parameter.validate(*range.end()).is_ok());
            assert!(parameter.validate(*range.end() + 0.01).is_err());
            assert!(parameter.validate(*range.start() - 0.01).is_err());
        }
    }

    #[test]
    fn nan_is_rejected() {
        assert!(Parameter::Gain.validate(f32::NAN).is_err());
        assert!(Parameter::Mid.validate(f32::INFINITY).is_err());
    }

    #[test]
    fn with_leaves_original_untouched() {
        let base = ParameterSet::default();
        let next = base.with(Parameter::Bass, -0.5).unwrap();
        assert_eq!(next.bass, -0.5);
        assert_eq!(base.bass, 0.0);

        let err = base.with(Parameter::Gain, 6.0).unwrap_err();
        assert!(matches!(
            err,
            AmpError::OutOfRange {
                parameter: Parameter::Gain,
                ..
            }
        ));
    }

    #[test]
    fn deserializes_reverb_mix_alias() {
        let json = r#"{"gain":2.0,"distortion":0.3,"bass":0.2,"mid":0.1,"treble":0.1,"reverb_mix":0.15}"#;
        let set: ParameterSet = serde_json::from_str(json).unwrap();
        assert_eq!(set.reverb, 0.15);
        assert!(set.validated().is_ok());
    }
}
