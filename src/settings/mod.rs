use anyhow::{Context, Result};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::amp::stages::clipper::ClipperType;

const APP_DIR: &str = "rustamp";
const SETTINGS_FILENAME: &str = "settings.json";

/// Where the amp plugs into the JACK graph, and the period it asks PipeWire for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioSettings {
    pub input_port: String,
    pub output_left_port: String,
    pub output_right_port: String,
    pub buffer_size: u32,
    pub sample_rate: u32,
}

impl Default for AudioSettings {
    fn default() -> Self {
        Self {
            input_port: "system:capture_1".to_string(),
            output_left_port: "system:playback_1".to_string(),
            output_right_port: "system:playback_2".to_string(),
            buffer_size: 1024,
            sample_rate: 44_100,
        }
    }
}

impl fmt::Display for AudioSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "  In:          {}", self.input_port)?;
        writeln!(
            f,
            "  Out (L/R):   {} / {}",
            self.output_left_port, self.output_right_port
        )?;
        write!(
            f,
            "  Period:      {} frames @ {} Hz",
            self.buffer_size, self.sample_rate
        )
    }
}

/// Persisted user settings. Unknown or missing fields fall back to defaults,
/// so older files keep loading.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub audio: AudioSettings,
    pub default_preset: String,
    pub preset_dir: String,
    pub clipper: ClipperType,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            audio: AudioSettings::default(),
            default_preset: "clean".to_string(),
            preset_dir: "./presets".to_string(),
            clipper: ClipperType::default(),
        }
    }
}

impl fmt::Display for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Settings:")?;
        writeln!(f, "{}", self.audio)?;
        writeln!(f, "  Preset:      {}", self.default_preset)?;
        writeln!(f, "  Preset dir:  {}", self.preset_dir)?;
        write!(f, "  Clipper:     {}", self.clipper)
    }
}

impl Settings {
    pub fn load() -> Result<Self> {
        Self::load_from(&settings_path())
    }

    /// Reads `path`, or writes and returns the defaults if it doesn't exist.
    pub fn load_from(path: &Path) -> Result<Self> {
        match fs::read_to_string(path) {
            Ok(contents) => {
                let settings = serde_json::from_str(&contents)
                    .with_context(|| format!("failed to parse {}", path.display()))?;
                debug!("Loaded settings from {}", path.display());
                Ok(settings)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                info!("No settings at {}, using defaults", path.display());
                let settings = Self::default();
                if let Err(e) = settings.save_to(path) {
                    warn!("Could not write default settings: {e:#}");
                }
                Ok(settings)
            }
            Err(e) => Err(e).with_context(|| format!("failed to read {}", path.display())),
        }
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&settings_path())
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).context("failed to create config directory")?;
        }

        let json = serde_json::to_string_pretty(self).context("failed to serialize settings")?;
        fs::write(path, json).with_context(|| format!("failed to write {}", path.display()))?;

        debug!("Saved settings to {}", path.display());
        Ok(())
    }

    /// PipeWire's JACK shim reads its quantum from the environment, so this
    /// must run before the client is opened.
    pub fn apply_to_environment(&self) {
        // Called from the main thread before any other thread is spawned.
        unsafe {
            std::env::set_var("PIPEWIRE_LATENCY", self.pipewire_latency());
            if std::env::var("JACK_PROMISCUOUS_SERVER").is_err() {
                std::env::set_var("JACK_PROMISCUOUS_SERVER", "pipewire");
            }
        }
    }

    fn pipewire_latency(&self) -> String {
        format!("{}/{}", self.audio.buffer_size, self.audio.sample_rate)
    }
}

/// `$XDG_CONFIG_HOME/rustamp`, then `~/.config/rustamp`, then the working directory.
fn settings_path() -> PathBuf {
    let config_dir = std::env::var_os("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .or_else(|| std::env::var_os("HOME").map(|home| PathBuf::from(home).join(".config")));

    match config_dir {
        Some(dir) => dir.join(APP_DIR).join(SETTINGS_FILENAME),
        None => PathBuf::from(".").join(SETTINGS_FILENAME),
    }
}
