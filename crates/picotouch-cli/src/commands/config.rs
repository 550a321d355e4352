//! Config file output.

use std::path::PathBuf;

use clap::Args;
use picotouch_cli::DeviceConfig;

/// Print the effective config as TOML.
#[derive(Args)]
pub struct ConfigArgs {
    /// Print the built-in defaults instead of the loaded config
    #[arg(long)]
    default: bool,

    /// Write to this file instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,
}

/// Run the config command.
pub fn run(args: ConfigArgs, config: &DeviceConfig) -> anyhow::Result<()> {
    let text = if args.default {
        DeviceConfig::default().to_toml()?
    } else {
        config.to_toml()?
    };
    match args.output {
        Some(path) => {
            std::fs::write(&path, text)?;
            println!("Wrote {}", path.display());
        }
        None => print!("{text}"),
    }
    Ok(())
}
