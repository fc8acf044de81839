//! omnify: command-line front end for the chord engine
//!
//! Usage:
//!   omnify render [--settings PATH] <in.mid> <out.mid>
//!   omnify print-default-settings

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use omnify_core::{secs_to_duration, EngineConfig, Settings};
use omnify_services::{load_smf, replay, save_smf, Daemon};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Extra run time after the last input so scheduled note-offs land naturally
const TAIL_MARGIN_SECS: f64 = 0.1;

enum Command {
    Render { settings: Option<PathBuf>, input: PathBuf, output: PathBuf },
    PrintDefaultSettings,
}

fn main() -> ExitCode {
    init_logging();

    let command = parse_args();
    let result = match command {
        Command::Render { settings, input, output } => render(settings.as_deref(), &input, &output),
        Command::PrintDefaultSettings => print_default_settings(),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

fn init_logging() {
    let mut filter = tracing_subscriber::EnvFilter::from_default_env();
    if let Ok(directive) = "omnify=info".parse() {
        filter = filter.add_directive(directive);
    }
    // stdout is reserved for command output
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

/// `$CONFIG/omnify/settings.toml`
fn default_settings_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("omnify").join("settings.toml"))
}

fn load_config(explicit: Option<&Path>) -> anyhow::Result<EngineConfig> {
    let path = match explicit {
        Some(path) => Some(path.to_path_buf()),
        None => default_settings_path().filter(|p| p.exists()),
    };
    match path {
        Some(path) => EngineConfig::load(&path).with_context(|| format!("loading settings from {}", path.display())),
        None => {
            info!("No settings file, using defaults");
            Ok(EngineConfig::default())
        }
    }
}

fn render(settings: Option<&Path>, input: &Path, output: &Path) -> anyhow::Result<()> {
    let config = load_config(settings)?;
    let tail = secs_to_duration(config.settings.strum_gate_time_secs + TAIL_MARGIN_SECS);
    let events = load_smf(input).with_context(|| format!("reading {}", input.display()))?;

    let length = events.last().map(|e| e.secs).unwrap_or_default();
    info!(events = events.len(), secs = length, "Rendering in real time");

    let mut daemon = Daemon::new(Arc::new(config));
    let rendered = replay(&mut daemon, events, tail);
    save_smf(output, &rendered).with_context(|| format!("writing {}", output.display()))?;
    Ok(())
}

fn print_default_settings() -> anyhow::Result<()> {
    print!("{}", Settings::default().to_toml_string()?);
    Ok(())
}

fn parse_args() -> Command {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let Some(command) = args.first() else {
        print_usage();
        std::process::exit(1);
    };

    match command.as_str() {
        "render" => parse_render_args(&args[1..]),
        "print-default-settings" => Command::PrintDefaultSettings,
        "--help" | "-h" => {
            print_usage();
            std::process::exit(0);
        }
        other => {
            eprintln!("Unknown command: {other}");
            print_usage();
            std::process::exit(1);
        }
    }
}

fn parse_render_args(args: &[String]) -> Command {
    let mut settings = None;
    let mut paths = Vec::new();
    let mut i = 0;

    while i < args.len() {
        match args[i].as_str() {
            "--settings" => {
                i += 1;
                settings = Some(args.get(i).map(PathBuf::from).unwrap_or_else(|| {
                    eprintln!("--settings requires a path");
                    std::process::exit(1);
                }));
            }
            other if other.starts_with("--") => {
                eprintln!("Unknown argument: {other}");
                print_usage();
                std::process::exit(1);
            }
            path => paths.push(PathBuf::from(path)),
        }
        i += 1;
    }

    let [input, output]: [PathBuf; 2] = paths.try_into().unwrap_or_else(|_| {
        eprintln!("render needs an input and an output file");
        print_usage();
        std::process::exit(1);
    });
    Command::Render { settings, input, output }
}

fn print_usage() {
    println!("Usage: omnify <COMMAND>");
    println!();
    println!("Commands:");
    println!("  render [--settings PATH] <in.mid> <out.mid>   Play a MIDI file through the engine");
    println!("  print-default-settings                        Print the default settings as TOML");
    println!();
    let path = default_settings_path().map(|p| p.display().to_string()).unwrap_or_else(|| "(none)".into());
    println!("Settings are read from {path} when --settings is not given.");
}
