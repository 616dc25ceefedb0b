//! Rig file commands: print the stock rig, check or save a rig file.

use std::path::PathBuf;

use anyhow::Context;
use clap::{Args, Subcommand};
use looprig_config::RigConfig;

use crate::commands::common::load_rig;

#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    command: ConfigCommand,
}

#[derive(Subcommand)]
enum ConfigCommand {
    /// Print a rig as TOML (the stock rig unless a file is given)
    Show {
        /// Rig file to load and print back
        #[arg(value_name = "FILE")]
        file: Option<PathBuf>,
    },

    /// Validate a rig file and report what it builds
    Check {
        /// Rig file to check
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },

    /// Write the stock rig to a file as a starting point
    Init {
        /// Destination path
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

pub fn run(args: ConfigArgs) -> anyhow::Result<()> {
    match args.command {
        ConfigCommand::Show { file } => show(file),
        ConfigCommand::Check { file } => check(file),
        ConfigCommand::Init { file, force } => init(file, force),
    }
}

fn show(file: Option<PathBuf>) -> anyhow::Result<()> {
    let rig = load_rig(file.as_deref())?;
    print!("{}", rig.to_toml_string()?);
    Ok(())
}

fn check(file: PathBuf) -> anyhow::Result<()> {
    let rig = load_rig(Some(file.as_path()))?;
    let pedal = rig
        .build()
        .with_context(|| format!("{} is not a playable rig", file.display()))?;

    println!("{}: OK", file.display());
    println!("  Sample rate: {} Hz, block {}", rig.sample_rate, rig.audio.block_size);
    let chain: Vec<String> = rig
        .chain_entries()
        .map(|(id, bypassed)| {
            if bypassed {
                format!("{id} (off)")
            } else {
                id.to_string()
            }
        })
        .collect();
    println!("  Chain: {}", chain.join(" -> "));
    println!(
        "  Looper: {} layers, {:.1}s",
        rig.looper.layers, rig.looper.max_seconds
    );
    println!(
        "  Controls: {} knob route(s), {} switch route(s)",
        rig.knobs.len(),
        rig.switches.len()
    );
    println!("  Modules in rack: {}", pedal.rack().len());
    Ok(())
}

fn init(file: PathBuf, force: bool) -> anyhow::Result<()> {
    if file.exists() && !force {
        anyhow::bail!(
            "{} already exists. Use --force to overwrite.",
            file.display()
        );
    }
    RigConfig::default()
        .save(&file)
        .with_context(|| format!("writing {}", file.display()))?;
    println!("Wrote stock rig to {}", file.display());
    Ok(())
}
