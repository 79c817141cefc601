use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use crossbeam::channel::{self, Receiver, RecvTimeoutError};
use log::{info, warn};
use std::io::BufRead;
use std::path::PathBuf;
use std::{
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    thread,
    time::Duration,
};

use rustamp::amplifier::Amplifier;
use rustamp::audio::manager::Manager;
use rustamp::audio::offline::render_file;
use rustamp::console::{self, Command, Outcome};
use rustamp::params::Parameter;
use rustamp::preset::{self, PresetCatalog};
use rustamp::settings::Settings;

#[cfg(debug_assertions)]
#[global_allocator]
static A: assert_no_alloc::AllocDisabler = assert_no_alloc::AllocDisabler;

#[derive(Parser, Debug)]
#[command(name = "rustamp")]
#[command(version)]
#[command(about = "A real-time JACK guitar amp with presets, EQ and reverb.")]
struct Args {
    #[arg(
        long,
        env = "RUSTAMP_PRESET_DIR",
        help = "Directory of extra JSON presets (overrides settings)"
    )]
    preset_dir: Option<String>,

    #[command(subcommand)]
    command: Option<Mode>,
}

#[derive(Subcommand, Debug)]
enum Mode {
    /// Run the live amp on JACK (default)
    Run {
        #[arg(long, help = "Preset to start in (overrides settings)")]
        preset: Option<String>,
        #[arg(long, help = "Don't read commands from stdin")]
        no_console: bool,
    },
    /// Process a WAV file offline
    Render {
        input: PathBuf,
        #[arg(long, short)]
        output: Option<PathBuf>,
        #[arg(long)]
        preset: Option<String>,
        #[arg(long = "set", value_name = "FIELD=VALUE", help = "Override a parameter, e.g. --set gain=3.5")]
        overrides: Vec<String>,
    },
    /// List available presets
    Presets,
}

fn main() -> Result<()> {
    dotenv::dotenv().ok();
    env_logger::init();

    let args = Args::parse();
    info!("Rustamp v{}", env!("CARGO_PKG_VERSION"));
    info!("Args: {:?}", args);

    let mut settings = Settings::load().context("failed to load settings")?;
    if let Some(dir) = args.preset_dir {
        settings.preset_dir = dir;
    }
    info!("{settings}");

    let user_presets = preset::load_dir(&settings.preset_dir)
        .with_context(|| format!("failed to load presets from '{}'", settings.preset_dir))?;
    let catalog = PresetCatalog::default().with_user_presets(user_presets);

    match args.command.unwrap_or(Mode::Run {
        preset: None,
        no_console: false,
    }) {
        Mode::Presets => {
            for preset in catalog.presets() {
                match &preset.description {
                    Some(description) => println!("{:<12} {description}", preset.name),
                    None => println!("{}", preset.name),
                }
            }
            Ok(())
        }
        Mode::Render {
            input,
            output,
            preset,
            overrides,
        } => {
            let preset = preset.unwrap_or_else(|| settings.default_preset.clone());
            let mut amp = Amplifier::new(catalog, &preset)?;
            for spec in &overrides {
                let (parameter, value) = parse_override(spec)?;
                amp.set_parameter(parameter, value)?;
            }

            let output = output.unwrap_or_else(|| {
                PathBuf::from(format!(
                    "render_{}.wav",
                    chrono::Local::now().format("%Y%m%d_%H%M%S")
                ))
            });
            let summary = render_file(
                &input,
                &output,
                amp.reader(),
                settings.audio.buffer_size as usize,
                settings.clipper,
            )?;
            println!(
                "Rendered {} frames ({} Hz) to {} with preset {}, peak {:.3}",
                summary.frames,
                summary.sample_rate,
                output.display(),
                amp.label(),
                summary.peak
            );
            Ok(())
        }
        Mode::Run { preset, no_console } => {
            let preset = preset.unwrap_or_else(|| settings.default_preset.clone());
            let amp = Amplifier::new(catalog, &preset)?;
            run(&settings, amp, !no_console)
        }
    }
}

fn parse_override(spec: &str) -> Result<(Parameter, f32)> {
    let (field, value) = spec
        .split_once('=')
        .with_context(|| format!("expected FIELD=VALUE, got '{spec}'"))?;
    let parameter: Parameter = field.parse()?;
    let value: f32 = value
        .trim()
        .parse()
        .with_context(|| format!("invalid value for {parameter}: '{value}'"))?;
    Ok((parameter, value))
}

fn run(settings: &Settings, mut amp: Amplifier, console: bool) -> Result<()> {
    settings.apply_to_environment();

    let mut manager = Manager::new(settings, amp.reader()).context("failed to start audio")?;

    let running = Arc::new(AtomicBool::new(true));
    let shutdown_flag = Arc::clone(&running);

    ctrlc::set_handler(move || {
        info!("Ctrl+C received, shutting down...");
        shutdown_flag.store(false, Ordering::SeqCst);
    })
    .context("error setting Ctrl+C handler")?;

    println!("{}\n", amp.status());

    if console {
        println!("Type 'help' for commands.");
        let lines = spawn_stdin_reader()?;

        while running.load(Ordering::SeqCst) {
            let line = match lines.recv_timeout(Duration::from_millis(200)) {
                Ok(line) => line,
                Err(RecvTimeoutError::Timeout) => continue,
                Err(RecvTimeoutError::Disconnected) => break,
            };

            let command = match Command::parse(&line) {
                Ok(command) => command,
                Err(msg) => {
                    println!("{msg}");
                    continue;
                }
            };

            match console::execute(&mut amp, command, Some(manager.stats())) {
                Outcome::Continue(text) if text.is_empty() => {}
                Outcome::Continue(text) => println!("{text}"),
                Outcome::Quit => break,
            }
        }
    } else {
        while running.load(Ordering::SeqCst) {
            thread::sleep(Duration::from_secs(1));
        }
    }

    let stats = manager.stats();
    manager.shutdown()?;
    if stats.overruns > 0 || stats.xruns > 0 {
        warn!("Session had {} overruns and {} xruns", stats.overruns, stats.xruns);
    }
    info!("Goodbye");

    Ok(())
}

/// Stdin blocks, so read it on its own thread and hand lines over.
fn spawn_stdin_reader() -> Result<Receiver<String>> {
    let (tx, rx) = channel::unbounded();

    thread::Builder::new()
        .name("rustamp-stdin".to_string())
        .spawn(move || {
            for line in std::io::stdin().lock().lines() {
                let Ok(line) = line else { break };
                if tx.send(line).is_err() {
                    break;
                }
            }
        })
        .context("failed to spawn stdin reader")?;

    Ok(rx)
}
