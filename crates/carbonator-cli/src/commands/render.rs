//! Offline rendering of a WAV file through the engine.

use super::{FlavorArg, format_db};
use anyhow::Context;
use carbonator_effects::{
    EffectsChain, FIZZ_RANGE, OUTPUT_GAIN_RANGE_DB, ParamSnapshot, ProcessSpec, SharedParams,
    UnderwaterFilter,
};
use carbonator_io::{WavSpec, read_wav, write_wav};
use clap::Args;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;

#[derive(Args)]
pub struct RenderArgs {
    /// Input WAV file
    #[arg(value_name = "INPUT")]
    input: PathBuf,

    /// Output WAV file
    #[arg(value_name = "OUTPUT")]
    output: PathBuf,

    /// Flavor chain
    #[arg(short, long, value_enum, default_value_t = FlavorArg::Cola)]
    flavor: FlavorArg,

    /// Fizz amount, 0 to 100
    #[arg(long, default_value = "50", allow_negative_numbers = true)]
    fizz: f32,

    /// Use the flavor's Flat (uncarbonated) mode
    #[arg(long)]
    flat: bool,

    /// 4x oversampled saturation
    #[arg(short, long)]
    quality: bool,

    /// Output gain in dB, -12 to +12
    #[arg(long, default_value = "0", allow_negative_numbers = true)]
    output_gain: f32,

    /// Pass audio through untouched
    #[arg(long)]
    bypass: bool,

    /// Processing block size
    #[arg(long, default_value = "512")]
    block_size: usize,

    /// Run the Fizz-swept underwater low-pass ahead of the chain
    #[arg(long)]
    underwater: bool,

    /// Output bit depth (16, 24, or 32)
    #[arg(long, default_value = "32")]
    bit_depth: u16,

    /// Shift the output back by the engine latency so it lines up with the input
    #[arg(long)]
    compensate_latency: bool,
}

impl RenderArgs {
    fn snapshot(&self) -> ParamSnapshot {
        ParamSnapshot {
            fizz: self.fizz,
            carbonated: !self.flat,
            flavor: self.flavor.into(),
            quality_mode: self.quality,
            output_gain_db: self.output_gain,
            bypass: self.bypass,
        }
    }

    fn validate(&self) -> anyhow::Result<()> {
        if self.block_size == 0 {
            anyhow::bail!("--block-size must be at least 1");
        }
        if !matches!(self.bit_depth, 16 | 24 | 32) {
            anyhow::bail!("--bit-depth must be 16, 24 or 32 (got {})", self.bit_depth);
        }
        if !(FIZZ_RANGE.0..=FIZZ_RANGE.1).contains(&self.fizz) {
            anyhow::bail!(
                "--fizz must be between {} and {} (got {})",
                FIZZ_RANGE.0,
                FIZZ_RANGE.1,
                self.fizz
            );
        }
        if !(OUTPUT_GAIN_RANGE_DB.0..=OUTPUT_GAIN_RANGE_DB.1).contains(&self.output_gain) {
            anyhow::bail!(
                "--output-gain must be between {} and {} dB (got {})",
                OUTPUT_GAIN_RANGE_DB.0,
                OUTPUT_GAIN_RANGE_DB.1,
                self.output_gain
            );
        }
        Ok(())
    }
}

/// Whole frames to shift by so a fractional latency is fully covered.
fn compensation_frames(latency_samples: f32) -> usize {
    latency_samples.max(0.0).ceil() as usize
}

pub fn run(args: RenderArgs) -> anyhow::Result<()> {
    args.validate()?;

    tracing::info!(path = %args.input.display(), "reading input");
    let (mut buffer, spec) = read_wav(&args.input)
        .with_context(|| format!("failed to read {}", args.input.display()))?;
    let frames = buffer.num_frames();
    if buffer.num_channels() == 0 {
        anyhow::bail!("{} has no audio channels", args.input.display());
    }

    println!(
        "  {} frames, {} channel(s), {} Hz, {:.2}s",
        frames,
        spec.channels,
        spec.sample_rate,
        frames as f64 / f64::from(spec.sample_rate)
    );

    let process_spec = ProcessSpec::new(
        f64::from(spec.sample_rate),
        args.block_size,
        buffer.num_channels(),
    );
    let mut engine = EffectsChain::new();
    engine
        .prepare(process_spec)
        .context("failed to prepare the effects chain")?;
    engine.set_quality_mode(args.quality);

    let mut underwater = args.underwater.then(|| {
        let mut filter = UnderwaterFilter::new();
        filter.prepare(&process_spec);
        filter
    });

    let shared = SharedParams::new(args.snapshot());
    let initial = shared.snapshot();
    tracing::info!(
        flavor = %initial.flavor,
        fizz = initial.fizz,
        carbonated = initial.carbonated,
        quality = initial.quality_mode,
        output_gain_db = initial.output_gain_db,
        bypass = initial.bypass,
        underwater = underwater.is_some(),
        "rendering"
    );

    let input_rms = buffer.rms();
    let input_peak = buffer.peak();

    let latency = if args.compensate_latency && !initial.bypass {
        compensation_frames(engine.latency_samples())
    } else {
        0
    };
    if latency > 0 {
        tracing::debug!(latency, "compensating latency");
        buffer.pad_back(latency);
    }

    let total = buffer.num_frames();

    let pb = ProgressBar::new(total as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})")?
            .progress_chars("##-"),
    );

    for start in (0..total).step_by(args.block_size) {
        let end = (start + args.block_size).min(total);
        let params = shared.snapshot();
        let mut block = buffer.block_mut(start, end);
        if let Some(filter) = underwater.as_mut().filter(|_| !params.bypass) {
            filter.process(&mut block, &params);
        }
        engine.process(&mut block, &params);
        pb.set_position(end as u64);
    }

    pb.finish_with_message("done");

    if latency > 0 {
        buffer.trim_front(latency);
    }

    println!("\nStats:");
    println!(
        "  Input:  RMS {}, Peak {}",
        format_db(input_rms),
        format_db(input_peak)
    );
    println!(
        "  Output: RMS {}, Peak {}",
        format_db(buffer.rms()),
        format_db(buffer.peak())
    );
    if engine.latency_samples() > 0.0 {
        println!("  Latency: {:.2} samples", engine.latency_samples());
    }

    let out_spec = WavSpec {
        channels: spec.channels,
        sample_rate: spec.sample_rate,
        bits_per_sample: args.bit_depth,
    };

    tracing::info!(path = %args.output.display(), "writing output");
    write_wav(&args.output, &buffer, out_spec)
        .with_context(|| format!("failed to write {}", args.output.display()))?;
    println!("Done!");

    Ok(())
}
