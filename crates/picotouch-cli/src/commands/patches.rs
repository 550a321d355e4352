//! Factory patch listing.

use clap::Args;
use picotouch_synth::{EnvelopeParams, Patch, factory_patches};

/// List the factory patches.
#[derive(Args)]
pub struct PatchesArgs {
    /// Show envelopes and LFO settings
    #[arg(short, long)]
    verbose: bool,
}

/// Run the patches command.
pub fn run(args: PatchesArgs) -> anyhow::Result<()> {
    println!("Factory Patches");
    println!("===============");
    for (slot, patch) in ["A", "B", "C"].iter().zip(factory_patches()) {
        println!();
        print_patch(slot, &patch, args.verbose);
    }
    Ok(())
}

fn print_patch(slot: &str, patch: &Patch, verbose: bool) {
    println!("{slot}: {}", patch.name());
    println!("  wave:      {} (dir {})", patch.encode(), patch.wave_dir());
    println!(
        "  filter:    {:?} {:.0} Hz q {:.2}",
        patch.filter_kind(),
        patch.cutoff(),
        patch.resonance()
    );
    println!("  detune:    {:.3}", patch.detune());
    if verbose {
        println!(
            "  wave mix:  {:.2} (lfo {:.2} at {:.2} Hz)",
            patch.wave_mix(),
            patch.wave_mix_lfo_amount(),
            patch.wave_mix_lfo_rate()
        );
        println!("  amp env:   {}", envelope(patch.amp_env()));
        println!("  filt env:  {}", envelope(patch.filter_env()));
    }
}

fn envelope(env: &EnvelopeParams) -> String {
    format!(
        "A {:.2}s to {:.2}, D {:.2}s to {:.2}, R {:.2}s",
        env.attack_time, env.attack_level, env.decay_time, env.sustain_level, env.release_time
    )
}
