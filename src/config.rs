//! Pipeline configuration: every knob the conversion recognizes,
//! gathered into one value so [`crate::pipeline::convert`] takes a single
//! configuration argument rather than a long parameter list.

use crate::color::metric::MetricKind;
use crate::dither::DithererKind;
use crate::gif::LoopCount;
use crate::plan::ColorOrdering;
use crate::quantize::QuantizerKind;

/// A full palette of `4*255+1 = 1021` colors (one 256-entry
/// background sub-image plus four 255-entry overlays); that figure is the
/// default total color budget handed to the quantizer before planning.
pub const DEFAULT_TOTAL_COLORS: usize = 1021;

/// The default final-frame delay: one second, long enough that a viewer
/// sees the converged image before any loop restarts it.
pub const DEFAULT_FINAL_DELAY_HUNDREDTHS: u16 = 100;

/// All recognized conversion options.
#[derive(Debug, Clone, Copy)]
pub struct Config {
    pub quantizer: QuantizerKind,
    pub use_pca: bool,
    pub use_ant_refinement: bool,
    pub ant_iterations: usize,
    /// Total distinct colors the source histogram is quantized down to
    /// before sub-image planning partitions them.
    pub total_colors: usize,
    pub ditherer: DithererKind,
    /// `1..=8` overrides `ditherer` with an ordered Bayer matrix of size
    /// `2^bayer_index`; any other value (including 0) is silently ignored
    /// and `ditherer` is used as given.
    pub bayer_index: u32,
    pub metric: MetricKind,
    pub color_ordering: ColorOrdering,
    pub first_sub_image_inits_background: bool,
    pub use_back_filling: bool,
    pub no_compression: bool,
    pub loop_count: LoopCount,
    pub final_delay_hundredths: u16,
    /// Seed for `ColorOrdering::Random`'s shuffle.
    pub random_seed: u64,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            quantizer: QuantizerKind::default(),
            use_pca: false,
            use_ant_refinement: false,
            ant_iterations: 25,
            total_colors: DEFAULT_TOTAL_COLORS,
            ditherer: DithererKind::default(),
            bayer_index: 0,
            metric: MetricKind::default(),
            color_ordering: ColorOrdering::default(),
            first_sub_image_inits_background: true,
            use_back_filling: false,
            no_compression: false,
            loop_count: LoopCount::default(),
            final_delay_hundredths: DEFAULT_FINAL_DELAY_HUNDREDTHS,
            random_seed: 0,
        }
    }
}

impl Config {
    /// Resolves `ditherer`/`bayer_index` into the [`DithererKind`] the
    /// pipeline actually runs: `bayer_index` in `1..=8` overrides `ditherer`
    /// with an ordered Bayer matrix of that size.
    pub fn effective_ditherer(&self) -> DithererKind {
        if (1..=8).contains(&self.bayer_index) {
            DithererKind::Ordered { bayer_k: self.bayer_index }
        } else {
            self.ditherer
        }
    }
}
