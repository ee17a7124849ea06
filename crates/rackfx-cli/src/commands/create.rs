//! Chain creation command.

use std::path::PathBuf;

use anyhow::Context;
use clap::Args;
use rackfx_chain::EffectProcessorChain;
use rackfx_config::ChainDocument;

use super::common::{ParamSetting, parse_setting, registry};

#[derive(Args)]
pub struct CreateArgs {
    /// Output chain file (.toml or .json)
    output: PathBuf,

    /// Effects to chain, in processing order
    #[arg(value_name = "EFFECT", required = true)]
    effects: Vec<String>,

    /// Parameter assignment (SLOT.PARAM=VALUE, PARAM is a name or index)
    #[arg(long = "set", value_parser = parse_setting)]
    settings: Vec<ParamSetting>,

    /// Dry/wet mix for every processor (0-1)
    #[arg(long, default_value = "1.0")]
    mix: f32,

    /// Sample rate recorded in the document
    #[arg(long, default_value = "48000")]
    sample_rate: u32,
}

pub fn run(args: CreateArgs) -> anyhow::Result<()> {
    if !(0.0..=1.0).contains(&args.mix) {
        anyhow::bail!("Mix must be between 0 and 1, got {}", args.mix);
    }

    let chain = EffectProcessorChain::new(registry());
    chain.prepare(f64::from(args.sample_rate), 512);

    for effect in &args.effects {
        chain
            .append_new_effect(effect.as_str())
            .with_context(|| format!("Unknown effect: {effect}"))?;
    }

    for setting in &args.settings {
        apply_setting(&chain, setting)?;
    }

    for index in 0..chain.num_effects() {
        chain.set_mix_level(index, args.mix);
    }

    ChainDocument::capture(&chain)
        .save(&args.output)
        .with_context(|| format!("Failed to save chain to {}", args.output.display()))?;

    println!(
        "Saved {} processor(s) to {}",
        chain.num_effects(),
        args.output.display()
    );
    Ok(())
}

fn apply_setting(chain: &EffectProcessorChain, setting: &ParamSetting) -> anyhow::Result<()> {
    let processor = chain
        .effect(setting.slot)
        .with_context(|| format!("No processor at slot {}", setting.slot))?;

    let index = match setting.param.parse::<usize>() {
        Ok(index) if index < processor.parameter_count() => Some(index),
        _ => (0..processor.parameter_count()).find(|&i| {
            processor
                .parameter_descriptor(i)
                .is_some_and(|desc| desc.matches_name(&setting.param))
        }),
    }
    .with_context(|| {
        format!(
            "Unknown parameter '{}' for {}",
            setting.param,
            processor.identifier()
        )
    })?;

    let value = processor
        .parameter_descriptor(index)
        .and_then(|desc| desc.parse_value(&setting.value))
        .with_context(|| {
            format!(
                "Invalid value '{}' for parameter '{}'",
                setting.value, setting.param
            )
        })?;

    processor.set_parameter(index, value);
    tracing::debug!(slot = setting.slot, param = index, value, "parameter set");
    Ok(())
}
