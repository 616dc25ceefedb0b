//! Offline render: a WAV file through a configured pedal, with a scripted
//! player on the controls.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, bail};
use clap::Args;
use indicatif::{ProgressBar, ProgressStyle};

use looprig_core::HardwareState;
use looprig_io::{TakeWriter, WavSpec, WriterStatus, read_wav_stereo};
use looprig_platform::{ControlSurface, Pedal, VirtualSurface};

use crate::commands::common::{linear_to_db, load_rig, peak, rms};
use crate::script::{Action, Script};

#[derive(Args)]
pub struct RenderArgs {
    /// Input WAV file (mono or stereo)
    #[arg(value_name = "INPUT")]
    input: PathBuf,

    /// Output WAV file (stereo)
    #[arg(value_name = "OUTPUT")]
    output: PathBuf,

    /// Rig file (TOML). The stock rig is used when omitted
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Control script (TOML timeline of knob, switch and MIDI events)
    #[arg(short, long)]
    script: Option<PathBuf>,

    /// Audio block size, overrides the rig
    #[arg(long)]
    block_size: Option<usize>,

    /// Output bit depth (16, 24, or 32)
    #[arg(long, default_value = "32")]
    bit_depth: u16,

    /// Seconds of silence to render after the input ends, so loops keep
    /// playing
    #[arg(long, default_value = "0")]
    tail: f64,
}

pub fn run(args: RenderArgs) -> anyhow::Result<()> {
    let mut rig = load_rig(args.config.as_deref())?;

    println!("Reading {}...", args.input.display());
    let (input, in_spec) = read_wav_stereo(&args.input)
        .with_context(|| format!("reading {}", args.input.display()))?;
    let sample_rate = in_spec.sample_rate;

    if rig.sample_rate != sample_rate {
        tracing::info!(
            rig = rig.sample_rate,
            file = sample_rate,
            "using the input file's sample rate"
        );
        rig.sample_rate = sample_rate;
    }
    if let Some(block_size) = args.block_size {
        rig.audio.block_size = block_size;
    }
    if !(args.tail >= 0.0 && args.tail.is_finite()) {
        bail!("--tail must be a non-negative number of seconds");
    }

    let tail_frames = (args.tail * f64::from(sample_rate)) as usize;
    let frames = input.len() + tail_frames;
    let seconds = |frames: usize| frames as f64 / f64::from(sample_rate);
    println!(
        "  {} frames, {} Hz, {:.2}s (+{:.2}s tail)",
        input.len(),
        sample_rate,
        seconds(input.len()),
        seconds(tail_frames)
    );

    let mut pedal = rig.build().context("building the rig")?;
    let block = rig.audio.block_size;

    let script = match &args.script {
        Some(path) => Script::load(path)?,
        None => Script::default(),
    };
    let mut timeline = script.into_timeline(Duration::from_secs_f64(seconds(frames)))?;
    tracing::info!(actions = timeline.scheduled(), "script loaded");

    let c = &rig.controls;
    let mut surface =
        VirtualSurface::new(c.knobs, c.switches, c.leds).with_true_bypass(rig.audio.true_bypass);
    if timeline.initial_knobs().len() > c.knobs {
        bail!(
            "script sets {} knobs, the rig has {}",
            timeline.initial_knobs().len(),
            c.knobs
        );
    }
    for (i, &value) in timeline.initial_knobs().iter().enumerate() {
        surface.set_knob(i, value);
    }

    let out_spec = WavSpec {
        channels: 2,
        sample_rate,
        bits_per_sample: args.bit_depth,
    };
    let (dir, name) = split_output(&args.output)?;
    let mut take = TakeWriter::new(dir);
    take.try_start(name, out_spec, frames * 2)
        .with_context(|| format!("opening {}", args.output.display()))?;

    println!("Rendering through {} module(s)...", pedal.rack().len());
    let pb = ProgressBar::new(frames as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})")
            .context("progress bar template")?
            .progress_chars("##-"),
    );

    let mut in_l = vec![0.0; block];
    let mut in_r = vec![0.0; block];
    let mut out_l = vec![0.0; block];
    let mut out_r = vec![0.0; block];
    let mut hardware = pedal.hardware_state();
    let mut stats = RenderStats::default();

    let mut start = 0;
    while start < frames {
        let n = block.min(frames - start);
        let now = Duration::from_secs_f64(seconds(start));

        for &(_, action) in timeline.due(now) {
            apply(action, &mut surface, &mut pedal)?;
        }

        fill(&mut in_l[..n], &input.left, start);
        fill(&mut in_r[..n], &input.right, start);
        let next = pedal.process_block(&in_l[..n], &in_r[..n], &mut out_l[..n], &mut out_r[..n]);
        if rig.audio.true_bypass {
            apply_hardware(hardware, &in_l[..n], &in_r[..n], &mut out_l[..n], &mut out_r[..n]);
            stats.relay_flips += usize::from(next.relay_engaged != hardware.relay_engaged);
        }
        hardware = next;

        for (&l, &r) in out_l[..n].iter().zip(&out_r[..n]) {
            take.push(l);
            take.push(r);
            stats.sum_sq += f64::from(l * l + r * r);
            stats.peak = stats.peak.max(l.abs()).max(r.abs());
        }

        let elapsed = Duration::from_secs_f64(seconds(n));
        surface.advance(elapsed);
        let report = pedal.control_tick(&mut surface, elapsed);
        stats.switch_events += report.switch_events;
        stats.knob_writes += report.knob_writes;

        take.poll();
        if take.status() == WriterStatus::Error {
            bail!("writing {} failed", args.output.display());
        }

        start += n;
        pb.set_position(start as u64);
    }
    pb.finish_with_message("done");

    take.close();
    if take.status() != WriterStatus::Idle {
        bail!("finalizing {} failed", args.output.display());
    }
    tracing::debug!(remaining = timeline.remaining(), "timeline finished");

    let leds: Vec<String> = (0..surface.led_count())
        .map(|i| format!("{:.2}", surface.led(i)))
        .collect();
    let dry: Vec<f32> = input.left.iter().chain(&input.right).copied().collect();
    let (dry_rms, dry_peak) = (rms(&dry), peak(&dry));
    let wet_rms = if frames == 0 {
        0.0
    } else {
        (stats.sum_sq / (frames * 2) as f64).sqrt() as f32
    };

    println!("\nStats:");
    println!(
        "  Input:  RMS {:.1} dB, Peak {:.1} dB",
        linear_to_db(dry_rms),
        linear_to_db(dry_peak)
    );
    println!(
        "  Output: RMS {:.1} dB, Peak {:.1} dB",
        linear_to_db(wet_rms),
        linear_to_db(stats.peak)
    );
    println!(
        "  Controls: {} switch event(s), {} knob write(s), {} MIDI message(s) accepted",
        stats.switch_events,
        stats.knob_writes,
        pedal.midi().accepted()
    );
    if rig.audio.true_bypass {
        println!("  Relay flips: {}", stats.relay_flips);
    }
    println!("  LEDs at end: [{}]", leds.join(", "));
    println!("\nWrote {}", args.output.display());
    Ok(())
}

#[derive(Debug, Default)]
struct RenderStats {
    switch_events: usize,
    knob_writes: usize,
    relay_flips: usize,
    sum_sq: f64,
    peak: f32,
}

fn apply(
    action: Action,
    surface: &mut VirtualSurface,
    pedal: &mut Pedal,
) -> anyhow::Result<()> {
    let switches = surface.switch_count();
    let check_switch = |index: usize| {
        if index < switches {
            Ok(index)
        } else {
            Err(anyhow::anyhow!("script uses switch {index}, the rig has {switches}"))
        }
    };
    match action {
        Action::Press(i) => surface.press(check_switch(i)?),
        Action::Release(i) => surface.release(check_switch(i)?),
        Action::Toggle(left, position) => {
            check_switch(left + 1)?;
            surface.set_three_way(left, position);
        }
        Action::Knob(i, value) => {
            if i >= surface.knob_count() {
                bail!("script uses knob {i}, the rig has {}", surface.knob_count());
            }
            surface.set_knob(i, value);
        }
        Action::Midi(event) => {
            if !pedal.queue_midi(event) {
                tracing::warn!(?event, "MIDI queue full, message dropped");
            }
        }
    }
    Ok(())
}

/// Copies `source[start..]` into `dest`, padding with silence.
fn fill(dest: &mut [f32], source: &[f32], start: usize) {
    let source = source.get(start..).unwrap_or(&[]);
    let available = source.len().min(dest.len());
    dest[..available].copy_from_slice(&source[..available]);
    dest[available..].fill(0.0);
}

/// What the relay and mute line do to the signal on real hardware.
fn apply_hardware(
    state: HardwareState,
    in_l: &[f32],
    in_r: &[f32],
    out_l: &mut [f32],
    out_r: &mut [f32],
) {
    if state.muted {
        out_l.fill(0.0);
        out_r.fill(0.0);
    } else if state.relay_engaged {
        out_l.copy_from_slice(in_l);
        out_r.copy_from_slice(in_r);
    }
}

fn split_output(path: &Path) -> anyhow::Result<(PathBuf, PathBuf)> {
    let name = path
        .file_name()
        .with_context(|| format!("{} is not a file path", path.display()))?;
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    Ok((dir, PathBuf::from(name)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fill_pads_past_the_end() {
        let mut dest = [9.0; 4];
        fill(&mut dest, &[1.0, 2.0, 3.0], 1);
        assert_eq!(dest, [2.0, 3.0, 0.0, 0.0]);
        fill(&mut dest, &[1.0], 5);
        assert_eq!(dest, [0.0; 4]);
    }

    #[test]
    fn fill_well_into_the_tail() {
        let source = [0.5; 10];
        let mut dest = [9.0; 4];
        // Every block of a long tail starts past the end of the input.
        for start in [8, 10, 12, 400] {
            fill(&mut dest, &source, start);
            let expected = if start == 8 { [0.5, 0.5, 0.0, 0.0] } else { [0.0; 4] };
            assert_eq!(dest, expected, "start {start}");
        }
    }

    #[test]
    fn muted_beats_relay() {
        let input = [0.5; 3];
        let mut l = [0.1; 3];
        let mut r = [0.1; 3];
        let state = HardwareState {
            muted: true,
            relay_engaged: true,
        };
        apply_hardware(state, &input, &input, &mut l, &mut r);
        assert_eq!(l, [0.0; 3]);

        let state = HardwareState {
            muted: false,
            relay_engaged: true,
        };
        apply_hardware(state, &input, &input, &mut l, &mut r);
        assert_eq!(r, input);
    }

    #[test]
    fn output_split() {
        let (dir, name) = split_output(Path::new("out.wav")).unwrap();
        assert_eq!(dir, PathBuf::from("."));
        assert_eq!(name, PathBuf::from("out.wav"));
        let (dir, _) = split_output(Path::new("renders/a/out.wav")).unwrap();
        assert_eq!(dir, PathBuf::from("renders/a"));
        assert!(split_output(Path::new("..")).is_err());
    }
}
