//! Board CLI
//!
//! Preset listing, arrangement validation and script replay for the
//! tactics board engine.

#[cfg(feature = "cli")]
use anyhow::{Context, Result};
#[cfg(feature = "cli")]
use clap::{Parser, Subcommand};
#[cfg(feature = "cli")]
use std::path::PathBuf;

#[cfg(feature = "cli")]
#[derive(Parser)]
#[command(name = "board_cli")]
#[command(about = "Offline tooling for the tactics board", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[cfg(feature = "cli")]
#[derive(Subcommand)]
enum Commands {
    /// List the built-in formation presets
    Formations,

    /// Validate a saved arrangement against a formation
    Validate {
        /// Preset id / display name, or a YAML/JSON formation file
        #[arg(long)]
        formation: String,

        /// Arrangement JSON file
        #[arg(long)]
        arrangement: PathBuf,

        /// Board config (YAML/JSON) for the validation rules
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Replay a recorded input script
    Replay {
        /// Preset id / display name, or a YAML/JSON formation file
        #[arg(long)]
        formation: String,

        /// Roster JSON file (list of token specs)
        #[arg(long)]
        roster: PathBuf,

        /// Script JSON file (list of steps)
        #[arg(long)]
        script: PathBuf,

        /// Board config (YAML/JSON)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Write the replay report here instead of stdout
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

#[cfg(feature = "cli")]
fn main() -> Result<()> {
    use board_core::{Board, BoardConfig};

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let load_config = |path: Option<PathBuf>| -> Result<BoardConfig> {
        match path {
            Some(path) => board_cli::load_config(&path),
            None => Ok(BoardConfig::default()),
        }
    };

    match cli.command {
        Commands::Formations => {
            for line in board_cli::preset_listing() {
                println!("{}", line);
            }
        }

        Commands::Validate { formation, arrangement, config } => {
            let formation = board_cli::load_formation(&formation)?;
            let arrangement = board_cli::load_arrangement(&arrangement)?;
            let rules = load_config(config)?.validation;
            let report = board_cli::validate_arrangement(formation, &arrangement, rules)?;

            println!("{}", serde_json::to_string_pretty(&report)?);
            if report.has_errors() {
                anyhow::bail!("{} blocking finding(s)", report.error_count());
            }
        }

        Commands::Replay { formation, roster, script, config, out } => {
            let formation = board_cli::load_formation(&formation)?;
            let roster = board_cli::load_roster(&roster)?;
            let steps = board_cli::load_script(&script)?;
            let config = load_config(config)?;

            let mut board = Board::new(config, formation, roster)
                .context("Failed to set up board from roster")?;
            let report = board_cli::run_script(&mut board, &steps)?;
            let json = serde_json::to_string_pretty(&report)?;

            match out {
                Some(path) => {
                    std::fs::write(&path, json)
                        .with_context(|| format!("Failed to write {}", path.display()))?;
                    eprintln!(
                        "replayed {} step(s), {} event(s), {} rejected -> {}",
                        steps.len(),
                        report.events.len(),
                        report.rejected.len(),
                        path.display()
                    );
                }
                None => println!("{}", json),
            }
        }
    }

    Ok(())
}

#[cfg(not(feature = "cli"))]
fn main() {
    eprintln!("board_cli is not available. Enable the 'cli' feature to use it.");
    std::process::exit(1);
}
