use log::warn;
use serde::{Deserialize, Serialize};

use crate::params::ParameterSet;

pub mod loader;

pub use loader::load_dir;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Preset {
    pub name: String,
    pub description: Option<String>,
    pub parameters: ParameterSet,
}

impl Preset {
    pub fn new(name: &str, parameters: ParameterSet) -> Self {
        Self {
            name: name.to_string(),
            description: None,
            parameters,
        }
    }

    pub fn with_description(mut self, description: &str) -> Self {
        self.description = Some(description.to_string());
        self
    }
}

/// The five factory voicings, in display order.
pub fn builtin() -> Vec<Preset> {
    let preset = |name, description, gain, distortion, bass, mid, treble, reverb| {
        Preset::new(
            name,
            ParameterSet {
                gain,
                distortion,
                bass,
                mid,
                treble,
                reverb,
            },
        )
        .with_description(description)
    };

    vec![
        preset("clean", "Unity gain, flat EQ, a touch of room", 1.0, 0.0, 0.0, 0.0, 0.0, 0.2),
        preset("crunch", "Edge-of-breakup rhythm", 2.0, 0.3, 0.2, 0.1, 0.1, 0.15),
        preset("overdrive", "Mid-forward lead drive", 2.5, 0.5, 0.1, 0.3, 0.2, 0.1),
        preset("distortion", "Saturated rock", 3.0, 0.7, 0.3, 0.2, 0.3, 0.1),
        preset("metal", "High gain, scooped mids", 4.0, 0.9, 0.4, -0.2, 0.5, 0.05),
    ]
}

/// Read-only, ordered collection of presets handed to the amplifier at
/// construction.
#[derive(Debug, Clone)]
pub struct PresetCatalog {
    presets: Vec<Preset>,
}

impl Default for PresetCatalog {
    fn default() -> Self {
        Self::new(builtin())
    }
}

impl PresetCatalog {
    pub const fn new(presets: Vec<Preset>) -> Self {
        Self { presets }
    }

    /// Appends user presets after the built-ins. Names already present, and
    /// presets with out-of-range values, are skipped.
    pub fn with_user_presets(mut self, presets: Vec<Preset>) -> Self {
        let mut user: Vec<Preset> = presets
            .into_iter()
            .filter(|p| {
                if self.contains(&p.name) {
                    warn!("Ignoring user preset '{}': name is already taken", p.name);
                    return false;
                }
                if let Err(e) = p.parameters.validated() {
                    warn!("Ignoring user preset '{}': {e}", p.name);
                    return false;
                }
                true
            })
            .collect();
        user.sort_by(|a, b| a.name.cmp(&b.name));
        user.dedup_by(|a, b| a.name == b.name);
        self.presets.extend(user);
        self
    }

    pub fn get(&self, name: &str) -> Option<&Preset> {
        self.presets.iter().find(|p| p.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn names(&self) -> Vec<String> {
        self.presets.iter().map(|p| p.name.clone()).collect()
    }

    pub fn presets(&self) -> &[Preset] {
        &self.presets
    }

    pub fn len(&self) -> usize {
        self.presets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.presets.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtins_are_valid_and_ordered() {
        let catalog = PresetCatalog::default();
        assert_eq!(
            catalog.names(),
            vec!["clean", "crunch", "overdrive", "distortion", "metal"]
        );
        for preset in catalog.presets() {
            assert!(
                preset.parameters.validated().is_ok(),
                "{} out of range",
                preset.name
            );
        }
    }

    #[test]
    fn metal_values() {
        let catalog = PresetCatalog::default();
        let metal = catalog.get("metal").unwrap().parameters;
        assert_eq!(metal.gain, 4.0);
        assert_eq!(metal.distortion, 0.9);
        assert_eq!(metal.mid, -0.2);
        assert_eq!(metal.reverb, 0.05);
    }

    #[test]
    fn user_presets_cannot_shadow_builtins() {
        let user = vec![
            Preset::new("zebra", ParameterSet::default()),
            Preset::new("clean", ParameterSet {
                gain: 5.0,
                ..ParameterSet::default()
            }),
            Preset::new("ambient", ParameterSet::default()),
        ];
        let catalog = PresetCatalog::default().with_user_presets(user);

        assert_eq!(catalog.len(), 7);
        assert_eq!(catalog.get("clean").unwrap().parameters.gain, 1.0);
        assert_eq!(&catalog.names()[5..], ["ambient", "zebra"]);
    }

    #[test]
    fn out_of_range_user_presets_are_skipped() {
        let user = vec![
            Preset::new("hot", ParameterSet {
                gain: 9.0,
                reverb: -3.0,
                ..ParameterSet::default()
            }),
            Preset::new("warm", ParameterSet::default()),
        ];
        let catalog = PresetCatalog::default().with_user_presets(user);

        assert!(!catalog.contains("hot"));
        assert!(catalog.contains("warm"));
    }
}
