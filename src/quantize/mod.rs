//! Quantizer: reduces a histogram of up to ~16.7M colors to a
//! small palette (<= 256 entries).
//!
//! Every concrete algorithm implements the narrow [`ReduceColors`] trait;
//! [`reduce`] is the facade that wraps whichever algorithm was selected with
//! the shared post-conditions every quantizer must obey (length, uniqueness,
//! single-color and empty-histogram behavior).

pub mod adu;
pub mod ant;
pub mod binary_splitting;
pub mod fixed;
pub mod median_cut;
pub mod octree;
pub mod pca;
pub mod support;
pub mod variance;
pub mod wu;

use crate::color::metric::MetricKind;
use crate::color::Color;
use crate::histogram::Histogram;
use crate::palette::Palette;
use std::str::FromStr;

/// A concrete color-reduction algorithm. Implementations may ignore
/// `histogram` entirely (the fixed palettes) or return more or fewer than
/// `n` colors — [`reduce`] enforces the exact-length contract afterward.
pub trait ReduceColors: Sync {
    fn reduce_raw(&self, histogram: &Histogram, n: usize) -> Vec<Color>;
}

/// Selects which concrete quantizer [`reduce`] dispatches to.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum QuantizerKind {
    MedianCut,
    Octree,
    Wu,
    VarianceCut,
    VarianceBased,
    BinarySplitting,
    Adu,
    Ega16,
    Vga256,
    WebSafe,
    Mac8Bit,
}

impl Default for QuantizerKind {
    fn default() -> Self {
        QuantizerKind::MedianCut
    }
}

#[derive(Debug, Default, Copy, Clone, Eq, PartialEq)]
pub struct QuantizerParseError;

impl std::fmt::Display for QuantizerParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("invalid quantizer name")
    }
}

impl std::error::Error for QuantizerParseError {}

impl FromStr for QuantizerKind {
    type Err = QuantizerParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace(['_', ' '], "-").as_str() {
            "mediancut" | "median-cut" => Ok(QuantizerKind::MedianCut),
            "octree" => Ok(QuantizerKind::Octree),
            "wu" => Ok(QuantizerKind::Wu),
            "variancecut" | "variance-cut" => Ok(QuantizerKind::VarianceCut),
            "variancebased" | "variance-based" => Ok(QuantizerKind::VarianceBased),
            "binarysplitting" | "binary-splitting" => Ok(QuantizerKind::BinarySplitting),
            "adu" => Ok(QuantizerKind::Adu),
            "ega16" | "ega-16" => Ok(QuantizerKind::Ega16),
            "vga256" | "vga-256" => Ok(QuantizerKind::Vga256),
            "websafe" | "web-safe" => Ok(QuantizerKind::WebSafe),
            "mac8bit" | "mac-8bit" => Ok(QuantizerKind::Mac8Bit),
            _ => Err(QuantizerParseError),
        }
    }
}

impl QuantizerKind {
    fn resolver(self) -> Box<dyn ReduceColors> {
        match self {
            QuantizerKind::MedianCut => Box::new(median_cut::MedianCut),
            QuantizerKind::Octree => Box::new(octree::Octree),
            QuantizerKind::Wu => Box::new(wu::Wu),
            QuantizerKind::VarianceCut => Box::new(variance::VarianceCut),
            QuantizerKind::VarianceBased => Box::new(variance::VarianceBased),
            QuantizerKind::BinarySplitting => Box::new(binary_splitting::BinarySplitting),
            QuantizerKind::Adu => Box::new(adu::Adu),
            QuantizerKind::Ega16 => Box::new(fixed::Ega16),
            QuantizerKind::Vga256 => Box::new(fixed::Vga256),
            QuantizerKind::WebSafe => Box::new(fixed::WebSafe),
            QuantizerKind::Mac8Bit => Box::new(fixed::Mac8Bit),
        }
    }
}

/// Options layered on top of whichever [`QuantizerKind`] produces the base
/// reduction.
#[derive(Debug, Copy, Clone)]
pub struct QuantizeOptions {
    pub kind: QuantizerKind,
    pub use_pca: bool,
    pub use_ant_refinement: bool,
    pub ant_iterations: usize,
    pub metric: MetricKind,
}

impl Default for QuantizeOptions {
    fn default() -> Self {
        QuantizeOptions {
            kind: QuantizerKind::default(),
            use_pca: false,
            use_ant_refinement: false,
            ant_iterations: 25,
            metric: MetricKind::default(),
        }
    }
}

/// Reduces `histogram` to a palette of exactly `n` colors (or empty when
/// `n == 0`), applying the configured wrappers and enforcing the shared
/// post-conditions every quantizer must obey:
///   - `|result| == n` for `n > 0`,
///   - unique entries by 32-bit ARGB,
///   - a single-color histogram's color survives in the result,
///   - short results are padded with a deterministic fallback ramp.
pub fn reduce(options: &QuantizeOptions, histogram: &Histogram, n: usize) -> Palette {
    if n == 0 {
        return Palette::default();
    }

    let resolver = options.kind.resolver();
    let mut raw = if options.use_pca {
        pca::reduce(resolver.as_ref(), histogram, n)
    } else {
        resolver.reduce_raw(histogram, n)
    };

    if options.use_ant_refinement {
        raw = ant::refine(raw, histogram, options.metric, options.ant_iterations);
    }

    let mut palette = Palette::new(raw);
    palette.dedup_by_argb();

    // A single-color histogram must survive in the result.
    let mut distinct = histogram.iter().map(|(c, _)| c);
    if let (Some(only), None) = (distinct.next(), distinct.next()) {
        if !palette.colors().iter().any(|&c| c == only) {
            if palette.len() >= n {
                // Replace the last entry to keep the length invariant while
                // guaranteeing presence of the sole source color.
                let mut colors = palette.into_vec();
                colors.pop();
                colors.push(only);
                palette = Palette::new(colors);
                palette.dedup_by_argb();
            } else {
                palette.push(only);
            }
        }
    }

    palette.pad_to(n);
    let mut colors = palette.into_vec();
    colors.truncate(n);
    Palette::new(colors)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::histogram;
    use crate::pixelbuf::RgbaBuffer;

    fn gradient_histogram() -> Histogram {
        let pixels: Vec<Color> = (0..256u32)
            .map(|i| Color::new(i as u8, (i * 3 % 256) as u8, (i * 11 % 256) as u8))
            .collect();
        let buf = RgbaBuffer::new(16, 16, pixels);
        histogram::build(&buf, true)
    }

    const ALL_KINDS: &[QuantizerKind] = &[
        QuantizerKind::MedianCut,
        QuantizerKind::Octree,
        QuantizerKind::Wu,
        QuantizerKind::VarianceCut,
        QuantizerKind::VarianceBased,
        QuantizerKind::BinarySplitting,
        QuantizerKind::Adu,
        QuantizerKind::Ega16,
        QuantizerKind::Vga256,
        QuantizerKind::WebSafe,
        QuantizerKind::Mac8Bit,
    ];

    #[test]
    fn every_quantizer_respects_exact_length_contract() {
        let h = gradient_histogram();
        for &kind in ALL_KINDS {
            for n in [1usize, 16, 64, 200] {
                let opts = QuantizeOptions {
                    kind,
                    ..Default::default()
                };
                let palette = reduce(&opts, &h, n);
                assert_eq!(palette.len(), n, "{:?} failed for n={}", kind, n);
                let unique: std::collections::HashSet<_> =
                    palette.colors().iter().map(|c| c.to_argb()).collect();
                assert_eq!(unique.len(), n, "{:?} produced duplicate entries", kind);
            }
        }
    }

    #[test]
    fn n_zero_is_always_empty() {
        let h = gradient_histogram();
        for &kind in ALL_KINDS {
            let opts = QuantizeOptions { kind, ..Default::default() };
            assert!(reduce(&opts, &h, 0).is_empty());
        }
    }

    #[test]
    fn empty_histogram_still_yields_n_fallback_colors() {
        let h = Histogram::default();
        let opts = QuantizeOptions::default();
        let palette = reduce(&opts, &h, 10);
        assert_eq!(palette.len(), 10);
    }

    #[test]
    fn single_color_histogram_contains_that_color() {
        let pixels = vec![Color::new(77, 88, 99); 16];
        let buf = RgbaBuffer::new(4, 4, pixels);
        let h = histogram::build(&buf, true);
        for &kind in &[
            QuantizerKind::MedianCut,
            QuantizerKind::Octree,
            QuantizerKind::Wu,
            QuantizerKind::VarianceCut,
            QuantizerKind::VarianceBased,
            QuantizerKind::BinarySplitting,
            QuantizerKind::Adu,
        ] {
            let opts = QuantizeOptions { kind, ..Default::default() };
            let palette = reduce(&opts, &h, 4);
            assert!(
                palette.colors().contains(&Color::new(77, 88, 99)),
                "{:?} dropped the sole source color",
                kind
            );
        }
    }

    #[test]
    fn fixed_palettes_return_their_table_prefix() {
        let h = gradient_histogram();
        let opts = QuantizeOptions {
            kind: QuantizerKind::Ega16,
            ..Default::default()
        };
        let palette = reduce(&opts, &h, 8);
        let expected: Vec<Color> = fixed::ega_16().into_iter().take(8).collect();
        assert_eq!(palette.colors(), expected.as_slice());
    }

    #[test]
    fn pca_wrapper_preserves_contract() {
        let h = gradient_histogram();
        let opts = QuantizeOptions {
            kind: QuantizerKind::MedianCut,
            use_pca: true,
            ..Default::default()
        };
        let palette = reduce(&opts, &h, 32);
        assert_eq!(palette.len(), 32);
    }

    #[test]
    fn ant_refinement_preserves_contract() {
        let h = gradient_histogram();
        let opts = QuantizeOptions {
            kind: QuantizerKind::MedianCut,
            use_ant_refinement: true,
            ant_iterations: 5,
            ..Default::default()
        };
        let palette = reduce(&opts, &h, 32);
        assert_eq!(palette.len(), 32);
    }

    #[test]
    fn parses_known_names() {
        assert_eq!("median-cut".parse::<QuantizerKind>().unwrap(), QuantizerKind::MedianCut);
        assert_eq!("VGA256".parse::<QuantizerKind>().unwrap(), QuantizerKind::Vga256);
        assert!("nonsense".parse::<QuantizerKind>().is_err());
    }
}
