//! Dithering: spreads quantization error across neighboring
//! pixels (or otherwise perturbs the source color before lookup) so a small
//! palette still reads as smooth gradients rather than flat, banded regions.
//!
//! Every concrete family ends in the same place: a [`crate::color::lookup::PaletteLookup`]
//! call that yields the final 8-bit index. [`dither`] is the single entry
//! point the pipeline calls; it owns no state between sub-images.

pub mod adaptive;
pub mod error_diffusion;
pub mod knoll;
pub mod n_closest;
pub mod n_convex;
pub mod noise;
pub mod ordered;
pub mod riemersma;

use crate::color::lookup::PaletteLookup;
use crate::pixelbuf::{IndexBuffer, PixelBuffer};

/// Selects a concrete dither family and its parameters.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum DithererKind {
    /// Plain nearest-color lookup, no perturbation.
    None,
    ErrorDiffusion {
        kernel: error_diffusion::KernelKind,
        serpentine: bool,
    },
    Ordered {
        bayer_k: u32,
    },
    Halftone,
    /// Adds a constant half-step bias to every pixel regardless of
    /// position — a degenerate ordered variant preserved from the source
    /// tool's `ADitherer.Uniform` rather than folded into `None`.
    Uniform,
    Riemersma {
        curve: riemersma::Curve,
        history: usize,
    },
    Noise {
        spectrum: noise::Spectrum,
        intensity: f32,
    },
    Knoll {
        matrix_size: u32,
        k: usize,
        error_multiplier: f32,
    },
    NClosest {
        n: usize,
        rule: n_closest::Rule,
    },
    NConvex {
        n: usize,
        strategy: n_convex::Strategy,
    },
    Adaptive {
        profile: adaptive::Profile,
    },
}

impl Default for DithererKind {
    fn default() -> Self {
        DithererKind::None
    }
}

/// Applies `kind` to every pixel of `source`, writing palette indices into
/// `target`. `source` and `target` must share the same dimensions; mismatch
/// only affects which area gets filled, since each family indexes by its
/// own bounds and never reads past `source`'s extent.
pub fn dither(kind: DithererKind, source: &dyn PixelBuffer, target: &mut IndexBuffer, lookup: &PaletteLookup) {
    match kind {
        DithererKind::None => {
            for y in 0..source.height() {
                for x in 0..source.width() {
                    let index = lookup.find_closest(source.get(x, y));
                    target.set(x, y, index);
                }
            }
        }
        DithererKind::ErrorDiffusion { kernel, serpentine } => {
            error_diffusion::dither(kernel.kernel(), serpentine, source, target, lookup);
        }
        DithererKind::Ordered { bayer_k } => {
            let matrix = ordered::bayer_matrix(bayer_k.clamp(1, 8));
            ordered::dither(&matrix, source, target, lookup);
        }
        DithererKind::Halftone => {
            let matrix: Vec<Vec<u32>> = ordered::HALFTONE_8X8.iter().map(|row| row.to_vec()).collect();
            ordered::dither(&matrix, source, target, lookup);
        }
        DithererKind::Uniform => {
            ordered::dither_uniform(source, target, lookup);
        }
        DithererKind::Riemersma { curve, history } => {
            riemersma::dither(curve, history, source, target, lookup);
        }
        DithererKind::Noise { spectrum, intensity } => {
            noise::dither(spectrum, intensity, source, target, lookup);
        }
        DithererKind::Knoll {
            matrix_size,
            k,
            error_multiplier,
        } => {
            knoll::dither(matrix_size, k, error_multiplier, source, target, lookup);
        }
        DithererKind::NClosest { n, rule } => {
            n_closest::dither(rule, n, source, target, lookup);
        }
        DithererKind::NConvex { n, strategy } => {
            n_convex::dither(strategy, n, source, target, lookup);
        }
        DithererKind::Adaptive { profile } => {
            let characteristics = adaptive::analyze(source);
            let chosen = adaptive::dispatch(characteristics, profile);
            // `chosen` is never itself `Adaptive`, so this can't recurse
            // indefinitely.
            dither(chosen, source, target, lookup);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::metric::MetricKind;
    use crate::color::Color;
    use crate::palette::Palette;
    use crate::pixelbuf::RgbaBuffer;

    fn bw_lookup() -> PaletteLookup {
        PaletteLookup::new(
            Palette::new(vec![Color::new(0, 0, 0), Color::new(255, 255, 255)]),
            MetricKind::EuclideanRgb,
        )
    }

    #[test]
    fn none_matches_plain_nearest_lookup() {
        let pixels: Vec<Color> = (0..16).map(|i| Color::new((i * 16) as u8, 0, 0)).collect();
        let src = RgbaBuffer::new(4, 4, pixels.clone());
        let lookup = bw_lookup();
        let mut target = IndexBuffer::new(4, 4, 99);
        dither(DithererKind::None, &src, &mut target, &lookup);
        for (i, &p) in pixels.iter().enumerate() {
            let (x, y) = (i as u32 % 4, i as u32 / 4);
            assert_eq!(target.get(x, y), lookup.find_closest(p));
        }
    }

    #[test]
    fn every_family_produces_in_range_indices() {
        let pixels: Vec<Color> = (0..64).map(|i| Color::new((i * 4) as u8, (i * 2) as u8, 100)).collect();
        let src = RgbaBuffer::new(8, 8, pixels);
        let lookup = bw_lookup();
        let kinds = [
            DithererKind::None,
            DithererKind::ErrorDiffusion {
                kernel: error_diffusion::KernelKind::FloydSteinberg,
                serpentine: true,
            },
            DithererKind::Ordered { bayer_k: 3 },
            DithererKind::Halftone,
            DithererKind::Uniform,
            DithererKind::Riemersma {
                curve: riemersma::Curve::Hilbert,
                history: 8,
            },
            DithererKind::Noise {
                spectrum: noise::Spectrum::Blue,
                intensity: 0.3,
            },
            DithererKind::Knoll {
                matrix_size: 3,
                k: 2,
                error_multiplier: 1.0,
            },
            DithererKind::NClosest {
                n: 2,
                rule: n_closest::Rule::Luminance,
            },
            DithererKind::NConvex {
                n: 2,
                strategy: n_convex::Strategy::Nearest,
            },
            DithererKind::Adaptive {
                profile: adaptive::Profile::Balanced,
            },
        ];
        for kind in kinds {
            let mut target = IndexBuffer::new(8, 8, 99);
            dither(kind, &src, &mut target, &lookup);
            assert!(
                target.as_slice().iter().all(|&v| (v as usize) < 2),
                "{:?} produced out-of-range index",
                kind
            );
        }
    }

    #[test]
    fn empty_palette_writes_all_zeros() {
        let pixels = vec![Color::new(1, 2, 3); 4];
        let src = RgbaBuffer::new(2, 2, pixels);
        let lookup = PaletteLookup::new(Palette::default(), MetricKind::EuclideanRgb);
        let mut target = IndexBuffer::new(2, 2, 255);
        dither(DithererKind::None, &src, &mut target, &lookup);
        assert!(target.as_slice().iter().all(|&v| v == 0));
    }
}
