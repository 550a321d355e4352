//! picotouch CLI - simulate the synth and inspect its files.

mod commands;

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use picotouch_cli::DeviceConfig;

/// Config file picked up from the working directory when `--config` is absent.
const DEFAULT_CONFIG: &str = "picotouch.toml";

#[derive(Parser)]
#[command(name = "picotouch")]
#[command(author, version, about = "picotouch synth simulator and tools", long_about = None)]
struct Cli {
    /// Device config file (TOML)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the device against a touch script and render its audio
    Run(commands::run::RunArgs),

    /// List the factory patches
    Patches(commands::patches::PatchesArgs),

    /// List drum kits and their slots
    Kits(commands::kits::KitsArgs),

    /// Show WAV file information and engine compatibility
    Info(commands::info::InfoArgs),

    /// Print the effective config as TOML
    Config(commands::config::ConfigArgs),
}

fn load_config(path: Option<&Path>) -> anyhow::Result<DeviceConfig> {
    if let Some(path) = path {
        return Ok(DeviceConfig::load(path)?);
    }
    let fallback = Path::new(DEFAULT_CONFIG);
    if fallback.exists() {
        tracing::debug!(path = %fallback.display(), "using config from working directory");
        return Ok(DeviceConfig::load(fallback)?);
    }
    Ok(DeviceConfig::default())
}

fn main() -> anyhow::Result<()> {
    use tracing_subscriber::EnvFilter;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Run(args) => commands::run::run(args, &config),
        Commands::Patches(args) => commands::patches::run(args),
        Commands::Kits(args) => commands::kits::run(args, &config),
        Commands::Info(args) => commands::info::run(args),
        Commands::Config(args) => commands::config::run(args, &config),
    }
}
