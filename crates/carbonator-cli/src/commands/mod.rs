//! CLI command implementations.

pub mod info;
pub mod render;

use carbonator_effects::FlavorType;
use clap::ValueEnum;

/// Flavor names as typed on the command line.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum FlavorArg {
    /// Warm tape-style saturation with a dark tilt
    #[default]
    Cola,
    /// Sweet parallel drive with chorus shimmer
    Cherry,
    /// Lo-fi transport wobble and vinyl dust
    Grape,
    /// Bright band-split crunch
    LemonLime,
    /// Creamy mid/side glue and detuned width
    OrangeCream,
}

impl From<FlavorArg> for FlavorType {
    fn from(flavor: FlavorArg) -> Self {
        match flavor {
            FlavorArg::Cola => FlavorType::Cola,
            FlavorArg::Cherry => FlavorType::Cherry,
            FlavorArg::Grape => FlavorType::Grape,
            FlavorArg::LemonLime => FlavorType::LemonLime,
            FlavorArg::OrangeCream => FlavorType::OrangeCream,
        }
    }
}

/// Format a level in dBFS, `-inf` for silence.
pub fn format_db(linear: f32) -> String {
    if linear <= 0.0 {
        "-inf dB".to_string()
    } else {
        format!("{:.1} dB", carbonator_core::linear_to_db(linear))
    }
}
