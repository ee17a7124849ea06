//! Integration tests for rackfx-cli.
//!
//! Tests cover the CLI binary invocation: listing effects, building a chain
//! file, inspecting it, and rendering a tone through it.

use std::path::Path;
use std::process::{Command, Output};

use tempfile::TempDir;

/// Helper to get the path to the `rackfx` binary built by cargo.
fn rackfx_bin() -> Command {
    Command::new(env!("CARGO_BIN_EXE_rackfx"))
}

fn run(args: &[&str]) -> Output {
    rackfx_bin()
        .args(args)
        .env("RUST_LOG", "warn")
        .output()
        .expect("failed to run rackfx")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn create(path: &Path, extra: &[&str]) {
    let mut args = vec!["create", path.to_str().unwrap()];
    args.extend_from_slice(extra);
    let output = run(&args);
    assert!(
        output.status.success(),
        "create failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
}

// ---------------------------------------------------------------------------
// `rackfx effects`
// ---------------------------------------------------------------------------

#[test]
fn cli_effects_lists_all_effects() {
    let output = run(&["effects"]);
    assert!(output.status.success(), "rackfx effects failed");

    let text = stdout(&output);
    assert!(text.contains("Available Effects"));
    for effect in [
        "gain",
        "clipper",
        "ladder",
        "filter",
        "delay",
        "bitcrusher",
        "bandsplit",
        "sampledelay",
    ] {
        assert!(text.contains(effect), "listing should contain '{effect}'");
    }
}

#[test]
fn cli_effects_shows_parameters() {
    let output = run(&["effects", "delay"]);
    assert!(output.status.success());
    let text = stdout(&output);
    assert!(text.contains("Delay Time"));
    assert!(text.contains("Feedback"));
    assert!(text.contains("dly_feedback"), "got: {text}");
    assert!(text.contains("--set 0.dly_time=300"), "got: {text}");
}

#[test]
fn cli_effects_unknown_fails() {
    let output = run(&["effects", "theremin"]);
    assert!(!output.status.success());
}

// ---------------------------------------------------------------------------
// `rackfx create` / `inspect`
// ---------------------------------------------------------------------------

#[test]
fn cli_create_then_inspect() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("set.toml");
    create(
        &path,
        &[
            "sampledelay",
            "ladder",
            "--set",
            "0.samples=128",
            "--set",
            "1.cutoff=0.9 kHz",
            "--mix",
            "0.8",
        ],
    );
    assert!(path.exists());

    let output = run(&["inspect", path.to_str().unwrap(), "--params"]);
    assert!(output.status.success());
    let text = stdout(&output);
    assert!(text.contains("Processors:     2"), "got: {text}");
    assert!(text.contains("Latency:        128 samples"), "got: {text}");
    assert!(text.contains("ladder"));
    assert!(text.contains("2 restored, 0 missing"));
}

#[test]
fn cli_create_rejects_unknown_effect() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("bad.toml");
    let output = run(&["create", path.to_str().unwrap(), "gain", "theremin"]);
    assert!(!output.status.success());
    assert!(!path.exists());
}

#[test]
fn cli_create_rejects_unknown_parameter() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("bad.toml");
    let output = run(&[
        "create",
        path.to_str().unwrap(),
        "gain",
        "--set",
        "0.warmth=3",
    ]);
    assert!(!output.status.success());
}

#[test]
fn cli_create_rejects_unparseable_value() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("bad.toml");
    let output = run(&[
        "create",
        path.to_str().unwrap(),
        "gain",
        "--set",
        "0.gain=loud",
    ]);
    assert!(!output.status.success());
    assert!(!path.exists());
}

#[test]
fn cli_inspect_reports_missing_processor() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("legacy.toml");
    std::fs::write(
        &path,
        r#"
version = 1
sample_rate = 48000.0

[[processors]]
identity = "gain"
display_name = "Gain"

[[processors]]
identity = "spring_reverb"
display_name = "Spring"
"#,
    )
    .unwrap();

    let output = run(&["inspect", path.to_str().unwrap()]);
    assert!(output.status.success());
    let text = stdout(&output);
    assert!(text.contains("missing"));
    assert!(text.contains("unknown effect 'spring_reverb'"));
    assert!(text.contains("1 restored, 1 missing"));
}

#[test]
fn cli_inspect_nonexistent_fails() {
    let output = run(&["inspect", "no_such_chain_4321.toml"]);
    assert!(!output.status.success());
}

// ---------------------------------------------------------------------------
// `rackfx render`
// ---------------------------------------------------------------------------

#[test]
fn cli_render_reports_levels() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("loud.json");
    create(&path, &["gain", "clipper", "--set", "0.gain=12"]);

    let output = run(&[
        "render",
        path.to_str().unwrap(),
        "--duration",
        "0.25",
        "--amplitude",
        "0.5",
    ]);
    assert!(output.status.success());
    let text = stdout(&output);
    assert!(text.contains("Rendered 12000 samples"), "got: {text}");
    assert!(text.contains("Output:      peak 1.0000"), "got: {text}");
}
