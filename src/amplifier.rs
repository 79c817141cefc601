//! Control-side amplifier state: the effective parameters, the preset they
//! came from, and the snapshot the audio thread reads.

use log::{debug, info};
use serde::Serialize;
use std::fmt;

use crate::error::AmpError;
use crate::params::{Parameter, ParameterSet};
use crate::preset::{Preset, PresetCatalog};
use crate::snapshot::{Snapshot, SnapshotPublisher, SnapshotReader};

/// Which preset the effective parameters correspond to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PresetLabel {
    Preset(String),
    Custom,
}

impl PresetLabel {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Preset(name) => name,
            Self::Custom => "custom",
        }
    }
}

impl fmt::Display for PresetLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AmpStatus {
    pub label: PresetLabel,
    pub parameters: ParameterSet,
}

impl fmt::Display for AmpStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Current Preset: {}", self.label.as_str().to_uppercase())?;
        write!(f, "{}", self.parameters)
    }
}

pub struct Amplifier {
    catalog: PresetCatalog,
    /// Index of the last-loaded preset in the catalog.
    loaded: usize,
    params: ParameterSet,
    label: PresetLabel,
    publisher: SnapshotPublisher,
}

impl Amplifier {
    /// Starts in `default_preset`. Fails if the catalog doesn't have it, or
    /// if any preset in it holds an out-of-range value.
    pub fn new(catalog: PresetCatalog, default_preset: &str) -> Result<Self, AmpError> {
        for preset in catalog.presets() {
            preset.parameters.validated()?;
        }

        let loaded = Self::index_of(&catalog, default_preset)?;
        let params = catalog.presets()[loaded].parameters;
        let (publisher, _) = SnapshotPublisher::new(params);

        Ok(Self {
            label: PresetLabel::Preset(default_preset.to_string()),
            catalog,
            loaded,
            params,
            publisher,
        })
    }

    fn index_of(catalog: &PresetCatalog, name: &str) -> Result<usize, AmpError> {
        catalog
            .presets()
            .iter()
            .position(|p| p.name == name)
            .ok_or_else(|| AmpError::UnknownPreset(name.to_string()))
    }

    /// Replaces every parameter with the named preset's values.
    pub fn load_preset(&mut self, name: &str) -> Result<(), AmpError> {
        let index = Self::index_of(&self.catalog, name)?;
        self.loaded = index;
        self.params = self.catalog.presets()[index].parameters;
        self.label = PresetLabel::Preset(name.to_string());
        let version = self.publisher.publish(self.params);

        info!("Loaded preset: {name}");
        debug!("Published snapshot v{version}");
        Ok(())
    }

    /// Sets one control. Out-of-range values are rejected, never clamped.
    pub fn set_parameter(&mut self, parameter: Parameter, value: f32) -> Result<(), AmpError> {
        self.params = self.params.with(parameter, value)?;
        self.label = self.derive_label();
        let version = self.publisher.publish(self.params);

        debug!(
            "{parameter} set to {value:.2} ({}), published snapshot v{version}",
            self.label
        );
        Ok(())
    }

    fn derive_label(&self) -> PresetLabel {
        let preset = &self.catalog.presets()[self.loaded];
        if preset.parameters == self.params {
            PresetLabel::Preset(preset.name.clone())
        } else {
            PresetLabel::Custom
        }
    }

    pub fn status(&self) -> AmpStatus {
        AmpStatus {
            label: self.label.clone(),
            parameters: self.params,
        }
    }

    pub fn list_presets(&self) -> Vec<String> {
        self.catalog.names()
    }

    pub fn preset(&self, name: &str) -> Option<&Preset> {
        self.catalog.get(name)
    }

    pub const fn parameters(&self) -> &ParameterSet {
        &self.params
    }

    pub const fn label(&self) -> &PresetLabel {
        &self.label
    }

    /// The snapshot most recently published to the audio thread.
    pub fn current_snapshot(&self) -> Snapshot {
        self.publisher.current()
    }

    /// A handle for the audio thread to read published snapshots.
    pub fn reader(&self) -> SnapshotReader {
        self.publisher.reader()
    }
}
