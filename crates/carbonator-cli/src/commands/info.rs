//! Engine information: flavors, parameters and latency.

use super::FlavorArg;
use carbonator_effects::{EffectsChain, FlavorType, PARAMS, ParamUnit, ProcessSpec};
use clap::{Args, ValueEnum};

/// Display engine information.
#[derive(Args)]
pub struct InfoArgs {
    /// Sample rate used for the latency report
    #[arg(long, default_value = "48000")]
    pub sample_rate: f64,
}

/// Run the info command.
pub fn run(args: InfoArgs) -> anyhow::Result<()> {
    let mut engine = EffectsChain::new();
    engine.prepare(ProcessSpec::new(args.sample_rate, 512, 2))?;

    println!("Flavors:");
    for flavor in FlavorType::ALL {
        let cli_name = FlavorArg::value_variants()
            .iter()
            .find(|arg| FlavorType::from(**arg) == flavor)
            .and_then(|arg| arg.to_possible_value())
            .map(|value| value.get_name().to_string())
            .unwrap_or_default();
        println!("  {:<2} {:<14} --flavor {}", flavor.index(), flavor.name(), cli_name);
    }

    println!("\nParameters:");
    for param in &PARAMS {
        let range = match param.unit {
            ParamUnit::Toggle => "off / on".to_string(),
            ParamUnit::Choice => format!("{} to {}", param.min, param.max),
            ParamUnit::Percent | ParamUnit::Decibels => format!(
                "{}{unit} to {}{unit}",
                param.min,
                param.max,
                unit = param.unit.suffix()
            ),
        };
        println!(
            "  {:<12} {:<12} {:<20} default {}{}",
            param.id,
            param.name,
            range,
            param.default,
            param.unit.suffix()
        );
    }

    println!("\nLatency at {} Hz:", args.sample_rate);
    for (label, quality) in [("standard", false), ("quality (4x)", true)] {
        engine.set_quality_mode(quality);
        let samples = engine.latency_samples();
        println!(
            "  {:<14} {:.2} samples ({:.3} ms)",
            label,
            samples,
            f64::from(samples) * 1000.0 / args.sample_rate
        );
    }

    Ok(())
}
