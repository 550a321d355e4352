//! Drum kit listing.

use std::path::PathBuf;

use clap::Args;
use picotouch_cli::{DeviceConfig, DrumApp};
use picotouch_io::{list_kits, load_kit};
use picotouch_synth::SoftwareMixer;

/// List drum kits and their filled slots.
#[derive(Args)]
pub struct KitsArgs {
    /// Kit directory (default: from the config)
    root: Option<PathBuf>,
}

/// Run the kits command.
pub fn run(args: KitsArgs, config: &DeviceConfig) -> anyhow::Result<()> {
    let root = args.root.unwrap_or_else(|| config.drums.kit_root.clone());
    let kits = list_kits(&root)
        .map_err(|e| anyhow::anyhow!("cannot list kits in '{}': {e}", root.display()))?;
    if kits.is_empty() {
        println!("No kits in {}", root.display());
        return Ok(());
    }

    let slots = DrumApp::<SoftwareMixer>::SLOTS;
    println!("Kits in {}", root.display());
    for name in &kits {
        let kit = load_kit(&root, name, slots)?;
        let filled: Vec<String> = (0..kit.slot_count())
            .filter_map(|slot| kit.get(slot).map(|s| format!("{slot}:{}", s.len())))
            .collect();
        let marker = if config.drums.kits.contains(name) { "*" } else { " " };
        println!(
            "{marker} {:<12} size {:>2}  [{}]",
            name,
            kit.size(),
            filled.join(" ")
        );
    }
    Ok(())
}
