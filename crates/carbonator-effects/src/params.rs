//! Engine configuration and control parameters.
//!
//! The host owns the parameter values. Once per block the engine takes a
//! [`ParamSnapshot`] and uses it for the whole block, so a UI thread moving a
//! control mid-block can never tear the block's processing. [`SharedParams`]
//! is the lock-free store a host or UI thread writes and the audio thread
//! snapshots.

use core::fmt;
use core::sync::atomic::{AtomicBool, AtomicU8, AtomicU32, Ordering};

use crate::error::{Error, Result};

/// Audio configuration passed to `prepare`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProcessSpec {
    /// Sample rate in Hz.
    pub sample_rate: f64,
    /// Largest block the host will ever pass to `process`.
    pub max_block_size: usize,
    /// Channel count. Channels beyond this are left untouched.
    pub num_channels: usize,
}

impl ProcessSpec {
    /// Create a spec.
    pub fn new(sample_rate: f64, max_block_size: usize, num_channels: usize) -> Self {
        Self {
            sample_rate,
            max_block_size,
            num_channels,
        }
    }

    /// Check that the spec describes a usable configuration.
    ///
    /// ```rust
    /// use carbonator_effects::{Error, ProcessSpec};
    ///
    /// assert!(ProcessSpec::new(48000.0, 512, 2).validate().is_ok());
    /// assert_eq!(
    ///     ProcessSpec::new(0.0, 512, 2).validate(),
    ///     Err(Error::InvalidSampleRate(0.0))
    /// );
    /// ```
    pub fn validate(&self) -> Result<()> {
        if !self.sample_rate.is_finite() || self.sample_rate <= 0.0 {
            return Err(Error::InvalidSampleRate(self.sample_rate));
        }
        if self.num_channels == 0 {
            return Err(Error::InvalidChannelCount(self.num_channels));
        }
        if self.max_block_size == 0 {
            return Err(Error::InvalidBlockSize(self.max_block_size));
        }
        Ok(())
    }

    /// Sample rate as `f32` for the DSP primitives.
    pub fn sample_rate_f32(&self) -> f32 {
        self.sample_rate as f32
    }
}

impl Default for ProcessSpec {
    fn default() -> Self {
        Self::new(48000.0, 512, 2)
    }
}

/// The five soda flavors. Exactly one chain processes audio at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FlavorType {
    /// Compressed, tilted and pushed into asymmetric soft clipping.
    #[default]
    Cola,
    /// Parallel tanh saturation with a bright presence lift.
    Cherry,
    /// Tape: biased saturation, wow and flutter, head roll-off.
    Grape,
    /// Band-split exciter on the highs.
    LemonLime,
    /// Warm clip, mid/side widening and micro-detune.
    OrangeCream,
}

impl FlavorType {
    /// Every flavor in index order.
    pub const ALL: [FlavorType; 5] = [
        FlavorType::Cola,
        FlavorType::Cherry,
        FlavorType::Grape,
        FlavorType::LemonLime,
        FlavorType::OrangeCream,
    ];

    /// Look up a flavor by its parameter index.
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// Parameter index of this flavor.
    pub fn index(self) -> usize {
        self as usize
    }

    /// Display name.
    pub fn name(self) -> &'static str {
        match self {
            FlavorType::Cola => "Cola",
            FlavorType::Cherry => "Cherry",
            FlavorType::Grape => "Grape",
            FlavorType::LemonLime => "Lemon-Lime",
            FlavorType::OrangeCream => "Orange Cream",
        }
    }
}

impl TryFrom<u8> for FlavorType {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self> {
        Self::from_index(usize::from(value)).ok_or(Error::InvalidFlavor(value))
    }
}

impl fmt::Display for FlavorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Fizz control range (percent).
pub const FIZZ_RANGE: (f32, f32) = (0.0, 100.0);

/// Output gain range in dB.
pub const OUTPUT_GAIN_RANGE_DB: (f32, f32) = (-12.0, 12.0);

/// One block's worth of control values.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParamSnapshot {
    /// Master morph control, 0-100.
    pub fizz: f32,
    /// Normal processing when on, each flavor's Flat mode when off.
    pub carbonated: bool,
    /// Active flavor chain.
    pub flavor: FlavorType,
    /// 4× oversampled saturation.
    pub quality_mode: bool,
    /// Output gain in dB, -12 to +12.
    pub output_gain_db: f32,
    /// Skip all processing.
    pub bypass: bool,
}

impl Default for ParamSnapshot {
    fn default() -> Self {
        Self {
            fizz: 50.0,
            carbonated: true,
            flavor: FlavorType::Cola,
            quality_mode: false,
            output_gain_db: 0.0,
            bypass: false,
        }
    }
}

impl ParamSnapshot {
    /// Clamp continuous values into range; non-finite values fall back to
    /// their defaults.
    ///
    /// ```rust
    /// use carbonator_effects::ParamSnapshot;
    ///
    /// let raw = ParamSnapshot { fizz: 250.0, output_gain_db: f32::NAN, ..Default::default() };
    /// let clean = raw.sanitized();
    /// assert_eq!(clean.fizz, 100.0);
    /// assert_eq!(clean.output_gain_db, 0.0);
    /// ```
    pub fn sanitized(self) -> Self {
        let defaults = Self::default();
        let fizz = if self.fizz.is_finite() {
            self.fizz.clamp(FIZZ_RANGE.0, FIZZ_RANGE.1)
        } else {
            defaults.fizz
        };
        let output_gain_db = if self.output_gain_db.is_finite() {
            self.output_gain_db
                .clamp(OUTPUT_GAIN_RANGE_DB.0, OUTPUT_GAIN_RANGE_DB.1)
        } else {
            defaults.output_gain_db
        };
        Self {
            fizz,
            output_gain_db,
            ..self
        }
    }

    /// Fizz mapped to `[0, 1]`.
    pub fn fizz_normalized(&self) -> f32 {
        let fizz = if self.fizz.is_finite() { self.fizz } else { 0.0 };
        (fizz / FIZZ_RANGE.1).clamp(0.0, 1.0)
    }
}

/// Lock-free parameter store shared between a control thread and the audio
/// thread.
///
/// Every field is a single-word atomic (`f32` values are stored as their
/// bits), so each load is tear-free. [`snapshot`](Self::snapshot) reads all of
/// them once at the start of a block.
///
/// ```rust
/// use carbonator_effects::{FlavorType, SharedParams};
/// use std::sync::Arc;
///
/// let shared = Arc::new(SharedParams::default());
/// let ui = Arc::clone(&shared);
/// std::thread::spawn(move || ui.set_flavor(FlavorType::Grape))
///     .join()
///     .unwrap();
/// assert_eq!(shared.snapshot().flavor, FlavorType::Grape);
/// ```
#[derive(Debug)]
pub struct SharedParams {
    fizz: AtomicU32,
    carbonated: AtomicBool,
    flavor: AtomicU8,
    quality_mode: AtomicBool,
    output_gain_db: AtomicU32,
    bypass: AtomicBool,
}

impl SharedParams {
    /// Create a store holding `initial`.
    pub fn new(initial: ParamSnapshot) -> Self {
        Self {
            fizz: AtomicU32::new(initial.fizz.to_bits()),
            carbonated: AtomicBool::new(initial.carbonated),
            flavor: AtomicU8::new(initial.flavor.index() as u8),
            quality_mode: AtomicBool::new(initial.quality_mode),
            output_gain_db: AtomicU32::new(initial.output_gain_db.to_bits()),
            bypass: AtomicBool::new(initial.bypass),
        }
    }

    /// Set Fizz (0-100).
    pub fn set_fizz(&self, fizz: f32) {
        self.fizz.store(fizz.to_bits(), Ordering::Relaxed);
    }

    /// Set the Carbonated toggle.
    pub fn set_carbonated(&self, carbonated: bool) {
        self.carbonated.store(carbonated, Ordering::Relaxed);
    }

    /// Select the active flavor.
    pub fn set_flavor(&self, flavor: FlavorType) {
        self.flavor.store(flavor.index() as u8, Ordering::Relaxed);
    }

    /// Enable or disable oversampled saturation.
    pub fn set_quality_mode(&self, enabled: bool) {
        self.quality_mode.store(enabled, Ordering::Relaxed);
    }

    /// Set the output gain in dB.
    pub fn set_output_gain_db(&self, gain_db: f32) {
        self.output_gain_db.store(gain_db.to_bits(), Ordering::Relaxed);
    }

    /// Set global bypass.
    pub fn set_bypass(&self, bypass: bool) {
        self.bypass.store(bypass, Ordering::Relaxed);
    }

    /// Overwrite every value.
    pub fn store(&self, params: &ParamSnapshot) {
        self.set_fizz(params.fizz);
        self.set_carbonated(params.carbonated);
        self.set_flavor(params.flavor);
        self.set_quality_mode(params.quality_mode);
        self.set_output_gain_db(params.output_gain_db);
        self.set_bypass(params.bypass);
    }

    /// Load every value once and return the sanitized snapshot.
    pub fn snapshot(&self) -> ParamSnapshot {
        let flavor = FlavorType::try_from(self.flavor.load(Ordering::Relaxed)).unwrap_or_default();
        ParamSnapshot {
            fizz: f32::from_bits(self.fizz.load(Ordering::Relaxed)),
            carbonated: self.carbonated.load(Ordering::Relaxed),
            flavor,
            quality_mode: self.quality_mode.load(Ordering::Relaxed),
            output_gain_db: f32::from_bits(self.output_gain_db.load(Ordering::Relaxed)),
            bypass: self.bypass.load(Ordering::Relaxed),
        }
        .sanitized()
    }
}

impl Default for SharedParams {
    fn default() -> Self {
        Self::new(ParamSnapshot::default())
    }
}

/// Display unit of a control parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParamUnit {
    /// Percent (%).
    Percent,
    /// Decibels (dB).
    Decibels,
    /// On/off switch.
    Toggle,
    /// Index into a fixed list of choices.
    Choice,
}

impl ParamUnit {
    /// Unit suffix for display.
    pub const fn suffix(&self) -> &'static str {
        match self {
            ParamUnit::Percent => "%",
            ParamUnit::Decibels => " dB",
            ParamUnit::Toggle | ParamUnit::Choice => "",
        }
    }
}

/// Static description of one control parameter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParamDescriptor {
    /// Stable identifier used by hosts and the CLI.
    pub id: &'static str,
    /// Display name.
    pub name: &'static str,
    /// Minimum value.
    pub min: f32,
    /// Maximum value.
    pub max: f32,
    /// Value after initialization.
    pub default: f32,
    /// Display unit.
    pub unit: ParamUnit,
}

/// Every control parameter the engine reads, in snapshot field order.
pub const PARAMS: [ParamDescriptor; 6] = [
    ParamDescriptor {
        id: "fizz",
        name: "Fizz",
        min: FIZZ_RANGE.0,
        max: FIZZ_RANGE.1,
        default: 50.0,
        unit: ParamUnit::Percent,
    },
    ParamDescriptor {
        id: "carbonated",
        name: "Carbonated",
        min: 0.0,
        max: 1.0,
        default: 1.0,
        unit: ParamUnit::Toggle,
    },
    ParamDescriptor {
        id: "flavor",
        name: "Flavor",
        min: 0.0,
        max: 4.0,
        default: 0.0,
        unit: ParamUnit::Choice,
    },
    ParamDescriptor {
        id: "quality",
        name: "Quality",
        min: 0.0,
        max: 1.0,
        default: 0.0,
        unit: ParamUnit::Toggle,
    },
    ParamDescriptor {
        id: "output_gain",
        name: "Output Gain",
        min: OUTPUT_GAIN_RANGE_DB.0,
        max: OUTPUT_GAIN_RANGE_DB.1,
        default: 0.0,
        unit: ParamUnit::Decibels,
    },
    ParamDescriptor {
        id: "bypass",
        name: "Bypass",
        min: 0.0,
        max: 1.0,
        default: 0.0,
        unit: ParamUnit::Toggle,
    },
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spec_validation() {
        assert!(ProcessSpec::default().validate().is_ok());
        assert!(matches!(
            ProcessSpec::new(f64::NAN, 512, 2).validate(),
            Err(Error::InvalidSampleRate(_))
        ));
        assert_eq!(
            ProcessSpec::new(44100.0, 512, 0).validate(),
            Err(Error::InvalidChannelCount(0))
        );
        assert_eq!(
            ProcessSpec::new(44100.0, 0, 2).validate(),
            Err(Error::InvalidBlockSize(0))
        );
    }

    #[test]
    fn test_flavor_index_round_trip() {
        for (i, flavor) in FlavorType::ALL.iter().enumerate() {
            assert_eq!(flavor.index(), i);
            assert_eq!(FlavorType::from_index(i), Some(*flavor));
        }
        assert_eq!(FlavorType::from_index(5), None);
        assert_eq!(FlavorType::try_from(7u8), Err(Error::InvalidFlavor(7)));
        assert_eq!(FlavorType::try_from(3u8), Ok(FlavorType::LemonLime));
    }

    #[test]
    fn test_sanitize_clamps() {
        let raw = ParamSnapshot {
            fizz: -5.0,
            output_gain_db: 40.0,
            ..ParamSnapshot::default()
        };
        let clean = raw.sanitized();
        assert_eq!(clean.fizz, 0.0);
        assert_eq!(clean.output_gain_db, 12.0);

        let nan = ParamSnapshot {
            fizz: f32::NAN,
            ..ParamSnapshot::default()
        };
        assert_eq!(nan.sanitized().fizz, 50.0);
    }

    #[test]
    fn test_fizz_normalized() {
        let p = ParamSnapshot {
            fizz: 25.0,
            ..ParamSnapshot::default()
        };
        assert_eq!(p.fizz_normalized(), 0.25);
    }

    #[test]
    fn test_shared_params_snapshot() {
        let shared = SharedParams::default();
        shared.set_fizz(80.0);
        shared.set_carbonated(false);
        shared.set_flavor(FlavorType::OrangeCream);
        shared.set_quality_mode(true);
        shared.set_output_gain_db(-3.0);
        shared.set_bypass(true);

        let snap = shared.snapshot();
        assert_eq!(snap.fizz, 80.0);
        assert!(!snap.carbonated);
        assert_eq!(snap.flavor, FlavorType::OrangeCream);
        assert!(snap.quality_mode);
        assert_eq!(snap.output_gain_db, -3.0);
        assert!(snap.bypass);
    }

    #[test]
    fn test_shared_params_sanitizes() {
        let shared = SharedParams::default();
        shared.set_fizz(1000.0);
        assert_eq!(shared.snapshot().fizz, 100.0);
    }

    #[test]
    fn test_descriptor_defaults_match_snapshot() {
        let defaults = ParamSnapshot::default();
        assert_eq!(PARAMS[0].default, defaults.fizz);
        assert_eq!(PARAMS[4].default, defaults.output_gain_db);
        for desc in &PARAMS {
            assert!(desc.min <= desc.default && desc.default <= desc.max, "{}", desc.id);
        }
    }
}
