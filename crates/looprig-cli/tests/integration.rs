//! Integration tests for looprig-cli.
//!
//! Tests run the `looprig` binary: module listing, rig file handling, and an
//! offline render driven by a control script.

use std::path::Path;
use std::process::{Command, Output};

use looprig_config::RigConfig;
use looprig_io::{WavSpec, read_wav_info, write_wav};
use tempfile::TempDir;

/// Helper to get the path to the `looprig` binary built by cargo.
fn looprig_bin() -> Command {
    Command::new(env!("CARGO_BIN_EXE_looprig"))
}

fn run(args: &[&str]) -> Output {
    looprig_bin()
        .args(args)
        .output()
        .expect("failed to run looprig")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

/// Half a second of a quiet sine, stereo, 8 kHz.
fn write_input(path: &Path) {
    let samples: Vec<f32> = (0..4000)
        .flat_map(|i| {
            let x = 0.3 * (i as f32 * 0.05).sin();
            [x, x]
        })
        .collect();
    let spec = WavSpec {
        channels: 2,
        sample_rate: 8000,
        bits_per_sample: 32,
    };
    write_wav(path, &samples, spec).unwrap();
}

// ---------------------------------------------------------------------------
// `looprig modules`
// ---------------------------------------------------------------------------

#[test]
fn modules_lists_every_module() {
    let output = run(&["modules"]);
    assert!(output.status.success(), "looprig modules failed");

    let text = stdout(&output);
    assert!(text.contains("Available Modules"));
    for id in ["looper", "distortion", "filter", "router"] {
        assert!(text.contains(id), "listing should contain '{id}'");
    }
}

#[test]
fn modules_shows_parameters() {
    let output = run(&["modules", "distortion"]);
    assert!(output.status.success());

    let text = stdout(&output);
    assert!(text.contains("Parameters:"));
    assert!(text.contains("Gain"));
    assert!(text.contains("Oversample"));
}

#[test]
fn modules_rejects_unknown_id() {
    let output = run(&["modules", "reverb"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Unknown module"));
}

// ---------------------------------------------------------------------------
// `looprig config`
// ---------------------------------------------------------------------------

#[test]
fn config_show_prints_the_stock_rig() {
    let output = run(&["config", "show"]);
    assert!(output.status.success());

    let rig = RigConfig::from_toml_str(&stdout(&output)).expect("printed rig should parse");
    assert_eq!(rig.chain, RigConfig::default().chain);
    assert_eq!(rig.knobs.len(), RigConfig::default().knobs.len());
}

#[test]
fn config_init_then_check() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("rigs").join("stock.toml");
    let path_str = path.to_str().unwrap();

    let output = run(&["config", "init", path_str]);
    assert!(output.status.success());
    assert!(path.exists());

    // A second init refuses to clobber the file.
    let output = run(&["config", "init", path_str]);
    assert!(!output.status.success());

    let output = run(&["config", "check", path_str]);
    assert!(output.status.success());
    let text = stdout(&output);
    assert!(text.contains("OK"));
    assert!(text.contains("Modules in rack: 4"));
}

#[test]
fn config_check_reports_invalid_rig() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("bad.toml");
    let mut rig = RigConfig::default();
    rig.chain.push("looper".to_string());
    rig.save(&path).unwrap();

    let output = run(&["config", "check", path.to_str().unwrap()]);
    assert!(!output.status.success());
}

// ---------------------------------------------------------------------------
// `looprig render`
// ---------------------------------------------------------------------------

#[test]
fn render_with_script_writes_stereo_output() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("in.wav");
    let output_path = dir.path().join("out").join("loop.wav");
    let script = dir.path().join("take.toml");
    write_input(&input);
    std::fs::write(
        &script,
        r#"
        knobs = [0.2, 0.5, 0.0, 0.5, 0.0, 0.0]

        [[event]]
        at = 0.05
        switch = 0

        [[event]]
        at = 0.3
        switch = 0

        [[event]]
        at = 0.35
        knob = 3
        value = 0.8
        "#,
    )
    .unwrap();

    let output = run(&[
        "render",
        input.to_str().unwrap(),
        output_path.to_str().unwrap(),
        "--script",
        script.to_str().unwrap(),
        "--tail",
        "0.25",
        "--bit-depth",
        "16",
    ]);
    assert!(
        output.status.success(),
        "render failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    assert!(stdout(&output).contains("Wrote"));

    let info = read_wav_info(&output_path).unwrap();
    assert_eq!(info.channels, 2);
    assert_eq!(info.sample_rate, 8000);
    assert_eq!(info.bits_per_sample, 16);
    assert_eq!(info.num_frames, 4000 + 2000);
}

#[test]
fn render_rejects_out_of_range_switch() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("in.wav");
    let script = dir.path().join("bad.toml");
    write_input(&input);
    std::fs::write(&script, "[[event]]\nat = 0.1\nswitch = 42\n").unwrap();

    let output = run(&[
        "render",
        input.to_str().unwrap(),
        dir.path().join("out.wav").to_str().unwrap(),
        "--script",
        script.to_str().unwrap(),
    ]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("switch 42"));
}

#[test]
fn render_missing_input_fails() {
    let dir = TempDir::new().unwrap();
    let output = run(&[
        "render",
        dir.path().join("nope.wav").to_str().unwrap(),
        dir.path().join("out.wav").to_str().unwrap(),
    ]);
    assert!(!output.status.success());
}
