//! Module listing and parameter detail command.

#![allow(clippy::print_literal)] // Table headers use literal strings intentionally

use clap::Args;
use looprig_effects::{ModuleDescriptor, ModuleRegistry};
use looprig_core::{ParamDescriptor, ParamType};

#[derive(Args)]
pub struct ModulesArgs {
    /// Show parameters for a specific module
    #[arg(value_name = "MODULE")]
    module: Option<String>,
}

pub fn run(args: ModulesArgs) -> anyhow::Result<()> {
    let registry = ModuleRegistry::new();

    if let Some(name) = &args.module {
        let module = registry
            .descriptor(name)
            .ok_or_else(|| anyhow::anyhow!("Unknown module: {}", name))?;
        print_detail(module);
        return Ok(());
    }

    println!("Available Modules");
    println!("=================");
    println!();
    println!("  {:12}  {:8}  {:6}  {}", "Module", "Category", "Params", "Description");
    println!("  {:12}  {:8}  {:6}  {}", "------", "--------", "------", "-----------");
    for module in registry.all_modules() {
        println!(
            "  {:12}  {:8}  {:6}  {}",
            module.id,
            module.category.name(),
            module.params.len(),
            module.description
        );
    }
    println!();
    println!("Use 'looprig modules <MODULE>' for parameter details.");
    Ok(())
}

fn print_detail(module: &ModuleDescriptor) {
    println!("{}", module.name);
    println!("{}", "=".repeat(module.name.len()));
    println!();
    println!("{}", module.description);
    println!();

    if module.params.is_empty() {
        println!("No parameters of its own.");
        if module.id == "router" {
            println!("The router exposes the parameters of its inner module ([router] inner = ...).");
        }
        return;
    }

    println!("Parameters:");
    println!();
    println!(
        "  {:12}  {:6}  {:8}  {:8}  {:16}  {}",
        "Name", "Short", "Kind", "Default", "Range", "Knob/CC"
    );
    println!(
        "  {:12}  {:6}  {:8}  {:8}  {:16}  {}",
        "----", "-----", "----", "-------", "-----", "-------"
    );
    for param in module.params {
        println!(
            "  {:12}  {:6}  {:8}  {:8}  {:16}  {}",
            param.name,
            param.short_name,
            kind(param),
            format!("{:.2}", param.default),
            range(param),
            assignment(param)
        );
    }
}

fn kind(param: &ParamDescriptor) -> &'static str {
    match param.value_type {
        ParamType::Float => "float",
        ParamType::Bool => "switch",
        ParamType::Binned { .. } => "choice",
    }
}

fn range(param: &ParamDescriptor) -> String {
    match param.value_type {
        ParamType::Float => format!("{} .. {}", param.min, param.max),
        ParamType::Bool => "off / on".to_string(),
        ParamType::Binned { bins } => {
            if param.bin_names.is_empty() {
                format!("0 .. {}", bins.saturating_sub(1))
            } else {
                param.bin_names.join(" / ")
            }
        }
    }
}

fn assignment(param: &ParamDescriptor) -> String {
    let knob = param.knob_mapping.map(|k| format!("knob {k}"));
    let cc = param.midi_cc.map(|c| format!("CC {c}"));
    match (knob, cc) {
        (Some(k), Some(c)) => format!("{k}, {c}"),
        (Some(k), None) => k,
        (None, Some(c)) => c,
        (None, None) => "-".to_string(),
    }
}
