//! Effect listing and information command.

#![allow(clippy::print_literal)] // Table headers use literal strings intentionally

use clap::Args;

use super::common::registry;

#[derive(Args)]
pub struct EffectsArgs {
    /// Show parameters for a specific effect
    #[arg(value_name = "EFFECT")]
    effect: Option<String>,
}

pub fn run(args: EffectsArgs) -> anyhow::Result<()> {
    let registry = registry();

    if let Some(effect_id) = &args.effect {
        let descriptor = registry
            .get(effect_id)
            .ok_or_else(|| anyhow::anyhow!("Unknown effect: {}", effect_id))?;
        let effect = registry
            .create(descriptor.id, 48000.0)
            .ok_or_else(|| anyhow::anyhow!("Failed to create effect: {}", descriptor.id))?;

        println!("{} ({})", descriptor.name, descriptor.id);
        println!("{}", "=".repeat(descriptor.name.len() + descriptor.id.len() + 3));
        println!();
        println!("{}", descriptor.description);
        println!("Category: {}", descriptor.category.name());
        println!();

        println!("Parameters:");
        println!();
        println!(
            "  {:3}  {:16}  {:16}  {:14}  {}",
            "#", "Name", "Key", "Default", "Range"
        );
        println!(
            "  {:3}  {:16}  {:16}  {:14}  {}",
            "-", "----", "---", "-------", "-----"
        );

        for i in 0..effect.effect_param_count() {
            let Some(desc) = effect.effect_param_info(i) else {
                continue;
            };
            println!(
                "  {:3}  {:16}  {:16}  {:14}  {} .. {}",
                i,
                desc.name,
                desc.key,
                desc.format_value(desc.default),
                desc.format_value(desc.min),
                desc.format_value(desc.max)
            );
        }

        println!();
        println!("Example usage:");
        println!();
        println!("  rackfx create my_chain.toml {}", descriptor.id);
        if let Some(first) = effect.effect_param_info(0) {
            println!(
                "  rackfx create my_chain.toml {} --set 0.{}={}",
                descriptor.id,
                first.key,
                first.default
            );
        }
    } else {
        println!("Available Effects");
        println!("=================");
        println!();

        for (index, descriptor) in registry.all_effects().iter().enumerate() {
            println!(
                "  {:2}  {:12} {:12} - {}",
                index,
                descriptor.id,
                descriptor.category.name(),
                descriptor.description
            );
        }

        println!();
        println!("Use 'rackfx effects <name>' for detailed parameter info.");
    }

    Ok(())
}
