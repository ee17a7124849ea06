//! Chain inspection command.

#![allow(clippy::print_literal)] // Table headers use literal strings intentionally

use clap::Args;
use rackfx_config::check_factory;

use super::common::{load_chain, registry};

#[derive(Args)]
pub struct InspectArgs {
    /// Chain name or path
    chain: String,

    /// Show every parameter value
    #[arg(long)]
    params: bool,
}

pub fn run(args: InspectArgs) -> anyhow::Result<()> {
    let (chain, doc, report) = load_chain(&args.chain, 48000.0, 512)?;

    let unknown = check_factory(&doc, registry().as_ref());

    println!("Chain: {}", args.chain);
    println!("  Format version: {}", doc.version);
    println!("  Sample rate:    {} Hz", doc.sample_rate);
    println!("  Processors:     {}", chain.num_effects());
    println!("  Latency:        {} samples", chain.latency_samples());
    println!("  Channels:       {}", chain.num_channels());
    println!(
        "  Bypassed:       {}",
        if chain.is_whole_chain_bypassed() { "yes" } else { "no" }
    );
    println!();

    println!(
        "  {:3}  {:14}  {:20}  {:8}  {:5}  {}",
        "#", "Effect", "Name", "Status", "Mix", "Latency"
    );
    println!(
        "  {:3}  {:14}  {:20}  {:8}  {:5}  {}",
        "-", "------", "----", "------", "---", "-------"
    );

    for (index, processor) in chain.effects().iter().enumerate() {
        let status = if processor.is_missing() {
            "missing"
        } else if processor.is_bypassed() {
            "bypass"
        } else {
            "active"
        };
        println!(
            "  {:3}  {:14}  {:20}  {:8}  {:5.2}  {}",
            index,
            processor.identifier(),
            processor.display_name(),
            status,
            processor.mix_level(),
            processor.latency_samples()
        );

        if args.params {
            for p in 0..processor.parameter_count() {
                let (Some(desc), Some(value)) =
                    (processor.parameter_descriptor(p), processor.format_parameter(p))
                else {
                    continue;
                };
                println!("         {:18} {}", desc.name, value);
            }
        }
    }

    if !unknown.is_empty() {
        println!();
        println!("Warnings:");
        for warning in &unknown {
            println!("  {warning}");
        }
    }

    println!();
    println!(
        "{} restored, {} missing",
        report.restored,
        report.missing.len()
    );
    Ok(())
}
