//! Line-oriented control surface for a running amp.

use log::warn;

use crate::amplifier::Amplifier;
use crate::audio::engine::EngineStats;
use crate::params::Parameter;

pub const HELP: &str = "\
Available Commands:
  preset <name>  - Load a preset
  gain <value>   - Set gain (0.1 - 5.0)
  dist <value>   - Set distortion (0.0 - 1.0)
  bass <value>   - Set bass EQ (-1.0 to 1.0)
  mid <value>    - Set mid EQ (-1.0 to 1.0)
  treble <value> - Set treble EQ (-1.0 to 1.0)
  reverb <value> - Set reverb mix (0.0 - 1.0)
  status         - Show current settings
  presets        - List available presets
  stats          - Show engine diagnostics
  help           - Show this help
  quit           - Exit the application";

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Preset(String),
    Set(Parameter, f32),
    Status,
    Presets,
    Stats,
    Help,
    Quit,
    Empty,
}

impl Command {
    pub fn parse(line: &str) -> Result<Self, String> {
        let lowered = line.trim().to_lowercase();
        let parts: Vec<&str> = lowered.split_whitespace().collect();

        let Some((&cmd, args)) = parts.split_first() else {
            return Ok(Self::Empty);
        };

        match cmd {
            "quit" | "exit" | "q" => Ok(Self::Quit),
            "help" | "?" => Ok(Self::Help),
            "status" => Ok(Self::Status),
            "presets" => Ok(Self::Presets),
            "stats" => Ok(Self::Stats),
            "preset" => match args.first() {
                Some(name) => Ok(Self::Preset((*name).to_string())),
                None => Err("Usage: preset <name>".to_string()),
            },
            other => {
                let parameter: Parameter = other
                    .parse()
                    .map_err(|_| format!("Unknown command '{other}'. Type 'help' for commands."))?;
                let raw = args
                    .first()
                    .ok_or_else(|| format!("Usage: {other} <value>"))?;
                let value = raw
                    .parse::<f32>()
                    .map_err(|_| "Invalid value. Must be a number.".to_string())?;
                Ok(Self::Set(parameter, value))
            }
        }
    }
}

/// What the caller should do after a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Continue(String),
    Quit,
}

/// Applies `command` to the amp. Rejected commands leave it untouched.
pub fn execute(amp: &mut Amplifier, command: Command, stats: Option<EngineStats>) -> Outcome {
    let text = match command {
        Command::Empty => String::new(),
        Command::Quit => return Outcome::Quit,
        Command::Help => HELP.to_string(),
        Command::Status => amp.status().to_string(),
        Command::Presets => format!("Available presets: {}", amp.list_presets().join(", ")),
        Command::Stats => match stats {
            Some(stats) => stats.to_string(),
            None => "Audio engine is not running".to_string(),
        },
        Command::Preset(name) => match amp.load_preset(&name) {
            Ok(()) => format!("Loaded preset: {name}"),
            Err(e) => {
                warn!("{e}");
                format!("{e}. Available: {}", amp.list_presets().join(", "))
            }
        },
        Command::Set(parameter, value) => match amp.set_parameter(parameter, value) {
            Ok(()) => format!("{parameter} set to {value:.2} [{}]", amp.label()),
            Err(e) => {
                warn!("{e}");
                e.to_string()
            }
        },
    };

    Outcome::Continue(text)
}
