use super::Preset;
use anyhow::{Context, Result};
use log::{debug, warn};
use std::fs;
use std::path::Path;

/// Reads every `*.json` preset in `dir`.
///
/// A missing directory yields no presets. Files that fail to parse, or whose
/// values are out of range, are skipped with a warning. Nothing is written.
pub fn load_dir<P: AsRef<Path>>(dir: P) -> Result<Vec<Preset>> {
    let dir = dir.as_ref();
    let mut presets = Vec::new();

    if !dir.exists() {
        debug!("Preset directory {} does not exist", dir.display());
        return Ok(presets);
    }

    let entries =
        fs::read_dir(dir).with_context(|| format!("failed to read {}", dir.display()))?;

    for entry in entries {
        let path = entry?.path();

        if path.extension().and_then(|s| s.to_str()) == Some("json") {
            match load_preset_file(&path) {
                Ok(preset) => {
                    debug!("Loaded preset '{}' from {}", preset.name, path.display());
                    presets.push(preset);
                }
                Err(e) => {
                    warn!("Failed to load preset {}: {e:#}", path.display());
                }
            }
        }
    }

    // Sort presets by name
    presets.sort_by(|a, b| a.name.cmp(&b.name));

    Ok(presets)
}

fn load_preset_file(path: &Path) -> Result<Preset> {
    let content = fs::read_to_string(path).context("Failed to read preset file")?;

    let mut preset: Preset =
        serde_json::from_str(&content).context("Failed to parse preset JSON")?;
    preset.name = preset.name.trim().to_lowercase();
    anyhow::ensure!(!preset.name.is_empty(), "preset name is empty");
    preset.parameters = preset
        .parameters
        .validated()
        .context("preset values out of range")?;

    Ok(preset)
}
