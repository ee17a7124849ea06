//! Shared CLI helpers used across multiple commands.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use rackfx_chain::EffectProcessorChain;
use rackfx_config::{ChainDocument, RestoreReport, find_chain};
use rackfx_registry::EffectRegistry;

/// A `SLOT.PARAM=VALUE` assignment from the command line.
#[derive(Debug, Clone, PartialEq)]
pub struct ParamSetting {
    /// Processor index in the chain.
    pub slot: usize,
    /// Parameter name, short name, or index.
    pub param: String,
    /// Value text, optionally with a unit suffix (`800`, `2.5 kHz`, `0.5s`).
    pub value: String,
}

/// Parse a `SLOT.PARAM=VALUE` string for clap's `value_parser`.
pub fn parse_setting(s: &str) -> Result<ParamSetting, String> {
    let (target, value) = s
        .split_once('=')
        .ok_or_else(|| format!("Invalid setting: '{s}' (expected SLOT.PARAM=VALUE)"))?;
    let (slot, param) = target
        .split_once('.')
        .ok_or_else(|| format!("Invalid setting: '{s}' (expected SLOT.PARAM=VALUE)"))?;
    let slot = slot
        .trim()
        .parse()
        .map_err(|_| format!("Invalid slot index '{slot}' in '{s}'"))?;
    let value = value.trim();
    if value.is_empty() {
        return Err(format!("Missing value in '{s}'"));
    }
    Ok(ParamSetting {
        slot,
        param: param.trim().to_string(),
        value: value.to_string(),
    })
}

/// Built-in effect registry shared by every command.
pub fn registry() -> Arc<EffectRegistry> {
    Arc::new(EffectRegistry::new())
}

/// Resolve a chain name or path to an existing file.
///
/// Searches in this order:
/// 1. `name` as a file path
/// 2. The user chains directory, by name
pub fn resolve_chain(name: &str) -> anyhow::Result<PathBuf> {
    find_chain(name).with_context(|| {
        format!("Chain '{name}' not found (looked for a file and in the user chains directory)")
    })
}

/// Load a chain document and restore it into a prepared chain.
pub fn load_chain(
    name: &str,
    sample_rate: f64,
    block_size: usize,
) -> anyhow::Result<(EffectProcessorChain, ChainDocument, RestoreReport)> {
    let path = resolve_chain(name)?;
    let doc = ChainDocument::load(&path)
        .with_context(|| format!("Failed to load chain from {}", path.display()))?;

    let chain = EffectProcessorChain::new(registry());
    chain.prepare(sample_rate, block_size);
    let report = doc.restore_into(&chain)?;
    // Snap smoothers to the restored values.
    chain.prepare(sample_rate, block_size);

    for identity in &report.missing {
        tracing::warn!(identity = %identity, "processor unavailable, it will be skipped");
    }
    Ok((chain, doc, report))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_setting() {
        let setting = parse_setting("1.cutoff=800").unwrap();
        assert_eq!(
            setting,
            ParamSetting {
                slot: 1,
                param: "cutoff".to_string(),
                value: "800".to_string(),
            }
        );
        assert_eq!(parse_setting("0.Time = 0.5s").unwrap().value, "0.5s");
    }

    #[test]
    fn test_parse_setting_rejects_malformed() {
        assert!(parse_setting("cutoff=800").is_err());
        assert!(parse_setting("1.cutoff").is_err());
        assert!(parse_setting("x.cutoff=1").is_err());
        assert!(parse_setting("1.cutoff=").is_err());
    }

    #[test]
    fn test_resolve_chain_missing() {
        assert!(resolve_chain("definitely_not_a_chain_98765").is_err());
    }
}
