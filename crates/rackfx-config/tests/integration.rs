//! Integration tests for rackfx-config.
//!
//! These tests save live chains to disk, load them back into fresh chains,
//! and compare the audio the two produce.

use std::sync::Arc;

use rackfx_chain::EffectProcessorChain;
use rackfx_config::{
    ChainDocument, ConfigError, FileAction, ProcessorRecord, check_factory, paths,
};
use rackfx_core::{AudioBuffer, EventList};
use rackfx_registry::EffectRegistry;
use tempfile::TempDir;

const SR: f64 = 48000.0;
const BLOCK: usize = 256;

fn fresh_chain() -> EffectProcessorChain {
    let chain = EffectProcessorChain::new(Arc::new(EffectRegistry::new()));
    chain.prepare(SR, BLOCK);
    chain
}

fn saw(len: usize, offset: usize) -> AudioBuffer {
    let left: Vec<f32> = (0..len)
        .map(|i| (((i + offset) % 97) as f32 / 97.0) * 1.2 - 0.6)
        .collect();
    let right: Vec<f32> = left.iter().map(|s| -s * 0.5).collect();
    AudioBuffer::from_channels(&[&left, &right])
}

fn tweaked_chain() -> EffectProcessorChain {
    let chain = fresh_chain();
    let ladder = chain.append_new_effect("ladder").unwrap();
    ladder.set_parameter(0, 900.0);
    ladder.set_parameter(1, 45.0);
    let delay = chain.append_new_effect("delay").unwrap();
    delay.set_parameter(0, 2.5);
    delay.set_parameter(1, 30.0);
    chain.append_new_effect("gain").unwrap().set_parameter(0, -6.0);
    chain.set_mix_level(1, 0.6);
    chain.set_bypass(2, true);
    chain.set_effect_name(0, "Low pass");
    chain.prepare(SR, BLOCK);
    chain
}

fn assert_same_audio(a: &EffectProcessorChain, b: &EffectProcessorChain) {
    for block in 0..4 {
        let mut x = saw(BLOCK, block * BLOCK);
        let mut y = x.clone();
        a.process(&mut x, &EventList::new());
        b.process(&mut y, &EventList::new());
        for ch in 0..2 {
            for (p, q) in x.channel(ch).iter().zip(y.channel(ch)) {
                assert!((p - q).abs() <= 1e-6, "block {block}: {p} vs {q}");
            }
        }
    }
}

fn round_trip_through(file_name: &str) {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("nested").join(file_name);

    let original = tweaked_chain();
    ChainDocument::capture(&original).save(&path).unwrap();
    assert!(path.exists());

    let restored = fresh_chain();
    let report = ChainDocument::load(&path)
        .unwrap()
        .restore_into(&restored)
        .unwrap();
    assert_eq!(report.restored, 3);
    assert!(report.is_complete());
    restored.prepare(SR, BLOCK);

    for (a, b) in original.effects().iter().zip(restored.effects().iter()) {
        assert_eq!(a.identifier(), b.identifier());
        assert_eq!(a.display_name(), b.display_name());
        assert_eq!(a.is_bypassed(), b.is_bypassed());
        assert_eq!(a.mix_level(), b.mix_level());
        for i in 0..a.parameter_count() {
            assert_eq!(a.parameter(i), b.parameter(i));
        }
    }
    assert_same_audio(&original, &restored);
}

#[test]
fn test_toml_file_round_trip() {
    round_trip_through("set.toml");
}

#[test]
fn test_json_file_round_trip() {
    round_trip_through("set.json");
}

#[test]
fn test_json_file_is_json() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("set.json");
    ChainDocument::capture(&tweaked_chain()).save(&path).unwrap();

    let text = std::fs::read_to_string(&path).unwrap();
    let value: serde_json::Value = serde_json::from_str(&text).unwrap();
    assert_eq!(value["processors"][0]["identity"], "ladder");
}

#[test]
fn test_missing_slot_survives_save_and_load() {
    let temp_dir = TempDir::new().unwrap();
    let first = temp_dir.path().join("first.toml");
    let second = temp_dir.path().join("second.toml");

    let mut doc = ChainDocument::new(SR);
    doc.processors.push(ProcessorRecord::new("gain", "Gain"));
    let mut unknown = ProcessorRecord::new("tape_echo_deluxe", "Tape Echo");
    unknown.bypassed = true;
    unknown.mix_level = 0.4;
    unknown.last_state = "c29tZSBzdGF0ZQ==".to_string();
    doc.processors.push(unknown);
    doc.save(&first).unwrap();

    let chain = fresh_chain();
    let report = ChainDocument::load(&first)
        .unwrap()
        .restore_into(&chain)
        .unwrap();
    assert_eq!(report.missing, vec!["tape_echo_deluxe".to_string()]);
    assert!(!chain.effect(1).unwrap().can_be_processed());

    // The placeholder is skipped, the gain still runs.
    let mut buffer = saw(BLOCK, 0);
    let input = buffer.clone();
    chain.process(&mut buffer, &EventList::new());
    for (out, dry) in buffer.channel(0).iter().zip(input.channel(0)) {
        assert!((out - dry).abs() < 1e-6);
    }

    ChainDocument::capture(&chain).save(&second).unwrap();
    let reloaded = ChainDocument::load(&second).unwrap();
    let record = &reloaded.processors[1];
    assert_eq!(record.identity, "tape_echo_deluxe");
    assert_eq!(record.display_name, "Tape Echo");
    assert!(record.bypassed);
    assert_eq!(record.mix_level, 0.4);
    assert_eq!(record.last_state_bytes().unwrap(), b"some state");
}

#[test]
fn test_check_factory_flags_unknown_identity() {
    let mut doc = ChainDocument::new(SR);
    doc.processors.push(ProcessorRecord::new("delay", "Delay"));
    doc.processors.push(ProcessorRecord::new("nonexistent", "?"));
    let unknown = check_factory(&doc, &EffectRegistry::new());
    assert_eq!(unknown.len(), 1);
}

#[test]
fn test_load_reports_missing_file() {
    let temp_dir = TempDir::new().unwrap();
    let err = ChainDocument::load(temp_dir.path().join("absent.toml")).unwrap_err();
    assert!(err.is_not_found());
    assert!(matches!(
        err,
        ConfigError::Io {
            action: FileAction::Read,
            ..
        }
    ));
}

#[test]
fn test_saved_chains_are_listed() {
    let temp_dir = TempDir::new().unwrap();
    let chain = tweaked_chain();
    let doc = ChainDocument::capture(&chain);
    doc.save(temp_dir.path().join("b.json")).unwrap();
    doc.save(temp_dir.path().join("a.toml")).unwrap();

    let listed = paths::list_chains_in_dir(temp_dir.path());
    let names: Vec<String> = listed
        .iter()
        .filter_map(|p| paths::chain_name_from_path(p))
        .collect();
    assert_eq!(names, vec!["a".to_string(), "b".to_string()]);
}
