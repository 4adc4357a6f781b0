//! Offline rendering through the complete pedal.
//!
//! The file is fed block by block through [`HostRig`], so gestures, the
//! service loop and every parameter path behave as on the device. Controls
//! are fixed for the whole render.

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Args, ValueEnum};
use flick_config::{MemoryStore, RoutingMode, Settings, SettingsStore, TomlFileStore};
use flick_pedal::{HostRig, PedalConfig};
use flick_platform::{Knob, SwitchPosition, Toggle, VirtualPedal};
use hound::{SampleFormat, WavReader, WavSpec, WavWriter};

#[derive(Args)]
pub struct RenderArgs {
    /// Input WAV file (mono or stereo)
    #[arg(value_name = "INPUT")]
    input: PathBuf,

    /// Output WAV file
    #[arg(value_name = "OUTPUT")]
    output: PathBuf,

    /// Knob position as NUMBER=VALUE, e.g. "4=0.25" (repeatable)
    #[arg(short, long, value_parser = parse_knob)]
    knob: Vec<(Knob, f32)>,

    /// Toggle position as NUMBER=up|middle|down, e.g. "1=down" (repeatable)
    #[arg(short, long, value_parser = parse_toggle)]
    toggle: Vec<(Toggle, SwitchPosition)>,

    /// Engage the reverb
    #[arg(long)]
    reverb: bool,

    /// Engage the tremolo
    #[arg(long)]
    tremolo: bool,

    /// Engage the delay
    #[arg(long)]
    delay: bool,

    /// Audio routing; defaults to the one in the settings record
    #[arg(long, value_enum)]
    routing: Option<Routing>,

    /// Settings file to start from instead of the factory defaults.
    /// The file is only read.
    #[arg(long)]
    settings: Option<PathBuf>,

    /// Seconds of silence appended so tails can ring out
    #[arg(long, default_value = "0")]
    tail: f32,

    /// Processing block size
    #[arg(long, default_value = "8")]
    block_size: usize,

    /// Output bit depth (16, 24, or 32)
    #[arg(long, default_value = "32")]
    bit_depth: u16,
}

#[derive(Clone, Copy, ValueEnum)]
enum Routing {
    /// Stereo in, stereo out
    Stereo,
    /// Input 1 to both outputs
    MonoIn,
    /// Input 1 only, mono output
    Mono,
}

impl From<Routing> for RoutingMode {
    fn from(routing: Routing) -> Self {
        match routing {
            Routing::Stereo => RoutingMode::StereoInStereoOut,
            Routing::MonoIn => RoutingMode::MonoInStereoOut,
            Routing::Mono => RoutingMode::MonoInMonoOut,
        }
    }
}

fn parse_key_val(s: &str) -> Result<(usize, &str), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("Invalid control format: '{}' (expected NUMBER=VALUE)", s))?;
    let number: usize = key
        .trim()
        .parse()
        .map_err(|_| format!("Invalid control number: '{}'", key))?;
    Ok((number, value.trim()))
}

fn parse_knob(s: &str) -> Result<(Knob, f32), String> {
    let (number, value) = parse_key_val(s)?;
    let knob = number
        .checked_sub(1)
        .and_then(|i| Knob::ALL.get(i).copied())
        .ok_or_else(|| format!("Knob number must be 1-6, got {}", number))?;
    let value: f32 = value
        .parse()
        .map_err(|_| format!("Invalid knob value: '{}'", value))?;
    if !(0.0..=1.0).contains(&value) {
        return Err(format!("Knob value must be in 0..1, got {}", value));
    }
    Ok((knob, value))
}

fn parse_toggle(s: &str) -> Result<(Toggle, SwitchPosition), String> {
    let (number, value) = parse_key_val(s)?;
    let toggle = number
        .checked_sub(1)
        .and_then(|i| Toggle::ALL.get(i).copied())
        .ok_or_else(|| format!("Toggle number must be 1-3, got {}", number))?;
    let position = match value.to_ascii_lowercase().as_str() {
        "up" | "0" => SwitchPosition::Up,
        "middle" | "1" => SwitchPosition::Middle,
        "down" | "2" => SwitchPosition::Down,
        other => return Err(format!("Invalid toggle position: '{}'", other)),
    };
    Ok((toggle, position))
}

/// Loads the starting record without ever writing the file.
fn starting_settings(path: Option<&Path>) -> anyhow::Result<Settings> {
    let Some(path) = path else {
        return Ok(Settings::default());
    };
    let mut store = TomlFileStore::new(path);
    let settings = store
        .load()
        .with_context(|| format!("loading settings from {}", path.display()))?
        .with_context(|| format!("no settings file at {}", path.display()))?;
    if !settings.is_current() {
        tracing::warn!(
            version = settings.version,
            "settings file is from another version, using defaults"
        );
        return Ok(Settings::default());
    }
    Ok(settings)
}

fn read_input(path: &Path) -> anyhow::Result<(Vec<f32>, Vec<f32>, u32)> {
    let reader =
        WavReader::open(path).with_context(|| format!("opening {}", path.display()))?;
    let spec = reader.spec();
    let channels = usize::from(spec.channels.max(1));

    let samples: Vec<f32> = match spec.sample_format {
        SampleFormat::Float => reader
            .into_samples::<f32>()
            .collect::<Result<Vec<_>, _>>()?,
        SampleFormat::Int => {
            let max_val = (1i64 << (spec.bits_per_sample - 1)) as f32;
            reader
                .into_samples::<i32>()
                .map(|s| s.map(|v| v as f32 / max_val))
                .collect::<Result<Vec<_>, _>>()?
        }
    };

    // Mono files feed both inputs; past two channels only the first two count.
    let (left, right) = samples
        .chunks(channels)
        .map(|frame| (frame[0], frame.get(1).copied().unwrap_or(frame[0])))
        .unzip();
    Ok((left, right, spec.sample_rate))
}

fn write_output(
    path: &Path,
    channels: &[&[f32]],
    sample_rate: u32,
    bit_depth: u16,
) -> anyhow::Result<()> {
    let spec = WavSpec {
        channels: channels.len() as u16,
        sample_rate,
        bits_per_sample: bit_depth,
        sample_format: if bit_depth == 32 {
            SampleFormat::Float
        } else {
            SampleFormat::Int
        },
    };
    let mut writer =
        WavWriter::create(path, spec).with_context(|| format!("creating {}", path.display()))?;
    let frames = channels.first().map_or(0, |c| c.len());
    let max_val = (1i64 << (bit_depth - 1)) as f32;
    for i in 0..frames {
        for channel in channels {
            if bit_depth == 32 {
                writer.write_sample(channel[i])?;
            } else {
                let int_sample = (channel[i] * max_val).clamp(-max_val, max_val - 1.0) as i32;
                writer.write_sample(int_sample)?;
            }
        }
    }
    writer.finalize()?;
    Ok(())
}

pub fn run(args: RenderArgs) -> anyhow::Result<()> {
    if !matches!(args.bit_depth, 16 | 24 | 32) {
        anyhow::bail!("Unsupported bit depth {} (expected 16, 24, or 32)", args.bit_depth);
    }
    if args.block_size == 0 {
        anyhow::bail!("Block size must be at least 1");
    }

    println!("Reading {}...", args.input.display());
    let (mut left, mut right, sample_rate) = read_input(&args.input)?;
    println!(
        "  {} frames, {} Hz, {:.2}s",
        left.len(),
        sample_rate,
        left.len() as f32 / sample_rate as f32
    );

    let tail = (args.tail.max(0.0) * sample_rate as f32) as usize;
    left.resize(left.len() + tail, 0.0);
    right.resize(right.len() + tail, 0.0);

    let mut settings = starting_settings(args.settings.as_deref())?;
    settings.bypass.reverb &= !args.reverb;
    settings.bypass.tremolo &= !args.tremolo;
    settings.bypass.delay &= !args.delay;
    if let Some(routing) = args.routing {
        settings.routing = routing.into();
    }

    let mut hw = VirtualPedal::new();
    for (knob, value) in &args.knob {
        hw.set_knob(*knob, *value);
    }
    for (toggle, position) in &args.toggle {
        hw.set_toggle(*toggle, *position);
    }

    let config = PedalConfig {
        sample_rate: sample_rate as f32,
        block_size: args.block_size,
        max_delay_samples: (sample_rate as usize) * 2,
        ..PedalConfig::default()
    };
    tracing::info!(
        sample_rate,
        block_size = args.block_size,
        reverb = !settings.bypass.reverb,
        tremolo = !settings.bypass.tremolo,
        delay = !settings.bypass.delay,
        routing = ?settings.routing,
        "rendering"
    );

    let Ok(mut rig) = HostRig::boot(config, hw, MemoryStore::with_record(settings));
    let mut out_left = vec![0.0f32; left.len()];
    let mut out_right = vec![0.0f32; right.len()];
    for (((in_l, in_r), out_l), out_r) in left
        .chunks(args.block_size)
        .zip(right.chunks(args.block_size))
        .zip(out_left.chunks_mut(args.block_size))
        .zip(out_right.chunks_mut(args.block_size))
    {
        let Ok(()) = rig.process_block(in_l, in_r, out_l, out_r);
    }

    println!("\nStats:");
    println!(
        "  Input:  RMS {:.1} dB, Peak {:.1} dB",
        linear_to_db(rms(&left)),
        linear_to_db(peak(&left))
    );
    println!(
        "  Output: RMS {:.1} dB, Peak {:.1} dB",
        linear_to_db(rms(&out_left)),
        linear_to_db(peak(&out_left))
    );

    println!("\nWriting {}...", args.output.display());
    if settings.routing.mono_out() {
        write_output(&args.output, &[out_left.as_slice()], sample_rate, args.bit_depth)?;
    } else {
        let channels = [out_left.as_slice(), out_right.as_slice()];
        write_output(&args.output, &channels, sample_rate, args.bit_depth)?;
    }
    println!("Done!");

    Ok(())
}

fn rms(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum: f32 = samples.iter().map(|s| s * s).sum();
    (sum / samples.len() as f32).sqrt()
}

fn peak(samples: &[f32]) -> f32 {
    samples.iter().map(|s| s.abs()).fold(0.0, f32::max)
}

fn linear_to_db(linear: f32) -> f32 {
    if linear <= 0.0 {
        -120.0
    } else {
        20.0 * linear.log10()
    }
}
