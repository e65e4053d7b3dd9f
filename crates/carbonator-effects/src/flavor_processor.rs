//! Flavor dispatch.
//!
//! [`FlavorProcessor`] owns all five flavor chains and the shared
//! [`SaturationEngine`]. Every chain stays allocated, so switching flavors
//! never reallocates; only the selected chain touches the block.

use carbonator_core::SmoothedParam;

use crate::flavor::{
    CherryChain, ColaChain, FlavorChain, GrapeChain, LemonLimeChain, OrangeCreamChain,
};
use crate::params::{FlavorType, ParamSnapshot, ProcessSpec};
use crate::saturation::SaturationEngine;

/// Fizz glide time.
const FIZZ_SMOOTHING_MS: f32 = 20.0;
/// Normalized Fizz before the first block.
const FIZZ_INITIAL: f32 = 0.5;

/// Runs the selected flavor chain over a block.
///
/// Per block the processor
///
/// 1. applies the quality mode to the saturation engine,
/// 2. moves the smoothed Fizz toward the snapshot value and reads it,
/// 3. runs the selected chain (`process` when carbonated, `process_flat`
///    otherwise),
/// 4. advances the Fizz ramp by the block length.
///
/// # Example
///
/// ```rust
/// use carbonator_effects::{FlavorProcessor, FlavorType, ParamSnapshot, ProcessSpec};
///
/// let mut processor = FlavorProcessor::new();
/// processor.prepare(&ProcessSpec::new(48000.0, 64, 2));
///
/// let params = ParamSnapshot {
///     flavor: FlavorType::Grape,
///     ..ParamSnapshot::default()
/// };
/// let mut left = [0.25f32; 64];
/// let mut right = [0.25f32; 64];
/// processor.process(&mut [&mut left[..], &mut right[..]], &params);
/// assert!(left.iter().all(|s| s.is_finite()));
/// ```
#[derive(Debug, Clone)]
pub struct FlavorProcessor {
    spec: Option<ProcessSpec>,
    saturation: SaturationEngine,
    fizz: SmoothedParam,
    /// Jump straight to the next Fizz target instead of gliding.
    snap_fizz: bool,
    cola: ColaChain,
    cherry: CherryChain,
    grape: GrapeChain,
    lemon_lime: LemonLimeChain,
    orange_cream: OrangeCreamChain,
}

impl FlavorProcessor {
    /// Create an unprepared processor.
    pub fn new() -> Self {
        Self {
            spec: None,
            saturation: SaturationEngine::new(),
            fizz: SmoothedParam::with_config(FIZZ_INITIAL, 48000.0, FIZZ_SMOOTHING_MS),
            snap_fizz: true,
            cola: ColaChain::new(),
            cherry: CherryChain::new(),
            grape: GrapeChain::new(),
            lemon_lime: LemonLimeChain::new(),
            orange_cream: OrangeCreamChain::new(),
        }
    }

    /// Allocate every chain for `spec`.
    pub fn prepare(&mut self, spec: &ProcessSpec) {
        let sample_rate = spec.sample_rate_f32();
        self.saturation.prepare(spec);
        self.fizz = SmoothedParam::with_config(FIZZ_INITIAL, sample_rate, FIZZ_SMOOTHING_MS);
        self.snap_fizz = true;

        self.cola.prepare(spec);
        self.cherry.prepare(spec);
        self.grape.prepare(spec);
        self.lemon_lime.prepare(spec);
        self.orange_cream.prepare(spec);
        self.spec = Some(*spec);

        #[cfg(feature = "tracing")]
        tracing::debug!(
            sample_rate,
            channels = spec.num_channels,
            max_block = spec.max_block_size,
            "flavor processor prepared"
        );
    }

    /// Clear every chain. The next Fizz value is taken without a glide.
    pub fn reset(&mut self) {
        self.saturation.reset();
        self.fizz.set_immediate(FIZZ_INITIAL);
        self.snap_fizz = true;

        self.cola.reset();
        self.cherry.reset();
        self.grape.reset();
        self.lemon_lime.reset();
        self.orange_cream.reset();
    }

    /// Whether [`prepare`](Self::prepare) has been called.
    pub fn is_prepared(&self) -> bool {
        self.spec.is_some()
    }

    /// Switch 4× oversampling in the saturation stage.
    pub fn set_quality_mode(&mut self, enabled: bool) {
        self.saturation.set_oversampling_enabled(enabled);
    }

    /// Latency of the current quality mode, in samples.
    pub fn latency_samples(&self) -> f32 {
        self.saturation.latency_samples()
    }

    /// Current smoothed Fizz, normalized to `[0, 1]`.
    pub fn fizz(&self) -> f32 {
        self.fizz.get()
    }

    /// Run the chain selected by `params` over `block`.
    ///
    /// Unprepared processors leave the block untouched, as do channels beyond
    /// the prepared count.
    pub fn process(&mut self, block: &mut [&mut [f32]], params: &ParamSnapshot) {
        let Some(spec) = self.spec else {
            return;
        };
        let channels = block.len().min(spec.num_channels);
        let block = &mut block[..channels];
        let len = block.first().map_or(0, |channel| channel.len());
        if len == 0 {
            return;
        }

        self.saturation.set_oversampling_enabled(params.quality_mode);

        self.fizz.set_target(params.fizz_normalized());
        if self.snap_fizz {
            self.fizz.snap_to_target();
            self.snap_fizz = false;
        }
        let fizz = self.fizz.get();

        let chain: &mut dyn FlavorChain = match params.flavor {
            FlavorType::Cola => &mut self.cola,
            FlavorType::Cherry => &mut self.cherry,
            FlavorType::Grape => &mut self.grape,
            FlavorType::LemonLime => &mut self.lemon_lime,
            FlavorType::OrangeCream => &mut self.orange_cream,
        };
        if params.carbonated {
            chain.process(block, fizz, &mut self.saturation);
        } else {
            chain.process_flat(block, fizz, &mut self.saturation);
        }

        self.fizz.skip(len);
    }
}

impl Default for FlavorProcessor {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prepared(channels: usize) -> FlavorProcessor {
        let mut processor = FlavorProcessor::new();
        processor.prepare(&ProcessSpec::new(48000.0, 128, channels));
        processor
    }

    fn snapshot(flavor: FlavorType, fizz: f32, carbonated: bool) -> ParamSnapshot {
        ParamSnapshot {
            fizz,
            carbonated,
            flavor,
            ..ParamSnapshot::default()
        }
    }

    #[test]
    fn test_unprepared_leaves_block_untouched() {
        let mut processor = FlavorProcessor::new();
        let mut left = [0.7f32; 32];
        let mut right = [-0.7f32; 32];
        processor.process(&mut [&mut left[..], &mut right[..]], &ParamSnapshot::default());
        assert!(left.iter().all(|&s| s == 0.7));
        assert!(right.iter().all(|&s| s == -0.7));
    }

    #[test]
    fn test_first_fizz_is_taken_without_glide() {
        let mut processor = prepared(2);
        let mut left = [0.0f32; 128];
        let mut right = [0.0f32; 128];
        processor.process(
            &mut [&mut left[..], &mut right[..]],
            &snapshot(FlavorType::Cola, 100.0, true),
        );
        assert_eq!(processor.fizz(), 1.0);
    }

    #[test]
    fn test_fizz_glides_after_first_block() {
        let mut processor = prepared(1);
        let mut mono = [0.0f32; 128];
        processor.process(&mut [&mut mono[..]], &snapshot(FlavorType::Cola, 0.0, true));
        assert_eq!(processor.fizz(), 0.0);

        processor.process(&mut [&mut mono[..]], &snapshot(FlavorType::Cola, 100.0, true));
        let fizz = processor.fizz();
        assert!(fizz > 0.0 && fizz < 1.0, "fizz {fizz}");

        // 20 ms ramp: well settled after 200 ms
        for _ in 0..75 {
            processor.process(&mut [&mut mono[..]], &snapshot(FlavorType::Cola, 100.0, true));
        }
        assert!((processor.fizz() - 1.0).abs() < 1e-3);
    }

    #[test]
    fn test_reset_snaps_next_fizz() {
        let mut processor = prepared(1);
        let mut mono = [0.0f32; 128];
        processor.process(&mut [&mut mono[..]], &snapshot(FlavorType::Cherry, 0.0, true));
        processor.reset();
        processor.process(&mut [&mut mono[..]], &snapshot(FlavorType::Cherry, 80.0, true));
        assert!((processor.fizz() - 0.8).abs() < 1e-6);
    }

    #[test]
    fn test_quality_mode_follows_snapshot() {
        let mut processor = prepared(2);
        assert_eq!(processor.latency_samples(), 0.0);

        let mut left = [0.0f32; 128];
        let mut right = [0.0f32; 128];
        let params = ParamSnapshot {
            quality_mode: true,
            ..ParamSnapshot::default()
        };
        processor.process(&mut [&mut left[..], &mut right[..]], &params);
        assert!(processor.latency_samples() > 0.0);

        processor.set_quality_mode(false);
        assert_eq!(processor.latency_samples(), 0.0);
    }

    #[test]
    fn test_only_prepared_channels_are_processed() {
        let mut processor = prepared(1);
        let mut first = [0.5f32; 128];
        let mut second = [0.5f32; 128];
        processor.process(
            &mut [&mut first[..], &mut second[..]],
            &snapshot(FlavorType::Grape, 100.0, false),
        );
        assert!(second.iter().all(|&s| s == 0.5));
        assert!(first.iter().any(|&s| s != 0.5));
    }

    #[test]
    fn test_every_flavor_is_finite_in_both_modes() {
        for flavor in FlavorType::ALL {
            for carbonated in [true, false] {
                let mut processor = prepared(2);
                for block_index in 0..8 {
                    let mut left: Vec<f32> = (0..128)
                        .map(|i| ((block_index * 128 + i) as f32 * 0.031).sin() * 0.9)
                        .collect();
                    let mut right: Vec<f32> = left.iter().map(|s| -s * 0.5).collect();
                    processor.process(
                        &mut [&mut left[..], &mut right[..]],
                        &snapshot(flavor, 100.0, carbonated),
                    );
                    assert!(
                        left.iter().chain(right.iter()).all(|s| s.is_finite()),
                        "{flavor} carbonated={carbonated}"
                    );
                }
            }
        }
    }
}
