//! Adaptive dithering: analyzes coarse characteristics of the
//! source sub-image (color complexity, edge density, gradient smoothness,
//! noise level, detail level) and dispatches to whichever concrete dither
//! family suits it best, under one of four dispatch profiles trading
//! quality for speed — the fourth, `Smart`, scores every candidate ditherer
//! via a linear combination of the characteristics instead of threshold
//! branching.

use super::{error_diffusion::KernelKind, DithererKind};
use crate::color::Color;
use crate::pixelbuf::PixelBuffer;

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Profile {
    QualityOptimized,
    Balanced,
    PerformanceOptimized,
    /// Scores every candidate ditherer via a linear combination of the
    /// measured characteristics and picks the highest-scoring one, rather
    /// than branching on fixed thresholds.
    Smart,
}

/// Coarse statistics used to steer dispatch, each roughly in `[0, 1]`
/// except the raw counts.
#[derive(Debug, Copy, Clone)]
pub struct Characteristics {
    pub distinct_colors: usize,
    pub pixel_count: usize,
    /// `min(1.0, distinct_colors / min(1000, pixel_count / 10))`, guarded
    /// against the `pixel_count < 10` division-by-zero case.
    pub color_complexity: f32,
    /// Fraction of pixels whose local Sobel gradient magnitude exceeds a
    /// fixed threshold.
    pub edge_density: f32,
    /// Average 3x3 luminance variance across the image, normalized to
    /// roughly `[0, 1]`.
    pub gradient_smoothness: f32,
    /// Average absolute luminance delta to the right/below neighbor,
    /// normalized to `[0, 1]`.
    pub noise_level: f32,
    /// Composite of the above, summarizing how much fine-grained detail
    /// the image carries.
    pub detail_level: f32,
}

fn luminance_at(source: &dyn PixelBuffer, x: i64, y: i64, width: u32, height: u32) -> f32 {
    let cx = x.clamp(0, width as i64 - 1) as u32;
    let cy = y.clamp(0, height as i64 - 1) as u32;
    source.get(cx, cy).luminance()
}

/// 3x3 Sobel kernels for horizontal/vertical gradient approximation.
const SOBEL_X: [[i32; 3]; 3] = [[-1, 0, 1], [-2, 0, 2], [-1, 0, 1]];
const SOBEL_Y: [[i32; 3]; 3] = [[-1, -2, -1], [0, 0, 0], [1, 2, 1]];

const EDGE_MAGNITUDE_THRESHOLD: f32 = 80.0;

/// Measures `source`'s characteristics per spec: color complexity, Sobel
/// edge density, 3x3-variance gradient smoothness, neighbor-delta noise
/// level, and a composite detail level.
pub fn analyze(source: &dyn PixelBuffer) -> Characteristics {
    let (width, height) = (source.width(), source.height());
    let pixel_count = (width as usize) * (height as usize);
    if pixel_count == 0 {
        return Characteristics {
            distinct_colors: 0,
            pixel_count: 0,
            color_complexity: 0.0,
            edge_density: 0.0,
            gradient_smoothness: 0.0,
            noise_level: 0.0,
            detail_level: 0.0,
        };
    }

    let mut seen = std::collections::HashSet::new();
    let mut edge_count = 0usize;
    let mut variance_sum = 0f32;
    let mut noise_sum = 0f32;
    let mut noise_samples = 0usize;

    for y in 0..height {
        for x in 0..width {
            let c = source.get(x, y);
            seen.insert(c.to_argb());

            let (ix, iy) = (x as i64, y as i64);
            let mut window = [0f32; 9];
            let mut gx = 0f32;
            let mut gy = 0f32;
            let mut k = 0;
            for dy in -1i64..=1 {
                for dx in -1i64..=1 {
                    let l = luminance_at(source, ix + dx, iy + dy, width, height);
                    window[k] = l;
                    gx += SOBEL_X[(dy + 1) as usize][(dx + 1) as usize] as f32 * l;
                    gy += SOBEL_Y[(dy + 1) as usize][(dx + 1) as usize] as f32 * l;
                    k += 1;
                }
            }
            let magnitude = (gx * gx + gy * gy).sqrt();
            if magnitude > EDGE_MAGNITUDE_THRESHOLD {
                edge_count += 1;
            }

            let mean: f32 = window.iter().sum::<f32>() / 9.0;
            let variance: f32 = window.iter().map(|&v| (v - mean) * (v - mean)).sum::<f32>() / 9.0;
            variance_sum += variance;

            if x + 1 < width {
                let right = source.get(x + 1, y);
                noise_sum += (c.luminance() - right.luminance()).abs();
                noise_samples += 1;
            }
            if y + 1 < height {
                let below = source.get(x, y + 1);
                noise_sum += (c.luminance() - below.luminance()).abs();
                noise_samples += 1;
            }
        }
    }

    let edge_density = edge_count as f32 / pixel_count as f32;
    // Typical 8-bit luminance variance tops out well under 128^2; normalize
    // against that and clamp so smooth images land near 0 and busy ones
    // near 1.
    let gradient_smoothness = (variance_sum / pixel_count as f32 / (128.0 * 128.0)).clamp(0.0, 1.0);
    let noise_level = if noise_samples == 0 {
        0.0
    } else {
        (noise_sum / noise_samples as f32 / 255.0).clamp(0.0, 1.0)
    };

    // `min(1.0, colorSet.Count / min(1000, totalPixels/10))`, with the
    // divide-by-zero guard for images with fewer than 10 pixels (where
    // `totalPixels/10` would otherwise be 0).
    let color_complexity = {
        let divisor = (pixel_count / 10).min(1000);
        if divisor == 0 {
            0.0
        } else {
            (seen.len() as f32 / divisor as f32).min(1.0)
        }
    };

    let detail_level = ((edge_density + noise_level + color_complexity) / 3.0).clamp(0.0, 1.0);

    Characteristics {
        distinct_colors: seen.len(),
        pixel_count,
        color_complexity,
        edge_density,
        gradient_smoothness,
        noise_level,
        detail_level,
    }
}

/// One scorable ditherer candidate for the `Smart` profile: a kind plus the
/// linear-combination weights `(edge_density, noise_level, color_complexity,
/// gradient_smoothness, bias)` applied to a measured [`Characteristics`].
struct Candidate {
    kind: DithererKind,
    weights: (f32, f32, f32, f32, f32),
}

fn smart_candidates() -> [Candidate; 4] {
    [
        Candidate {
            kind: DithererKind::None,
            weights: (-1.0, -0.6, -0.6, -0.4, 0.5),
        },
        Candidate {
            kind: DithererKind::Ordered { bayer_k: 4 },
            weights: (0.1, -0.1, 0.3, 0.2, 0.1),
        },
        Candidate {
            kind: DithererKind::ErrorDiffusion {
                kernel: KernelKind::FloydSteinberg,
                serpentine: true,
            },
            weights: (0.5, 0.1, 0.3, 0.5, -0.2),
        },
        Candidate {
            kind: DithererKind::ErrorDiffusion {
                kernel: KernelKind::JarvisJudiceNinke,
                serpentine: true,
            },
            weights: (0.8, 0.2, 0.5, 0.4, -0.4),
        },
    ]
}

fn score(c: Characteristics, weights: (f32, f32, f32, f32, f32)) -> f32 {
    let (we, wn, wc, wg, bias) = weights;
    we * c.edge_density + wn * c.noise_level + wc * c.color_complexity + wg * c.gradient_smoothness + bias
}

/// Picks a concrete ditherer for `characteristics` under `profile`.
///
/// - Flat, low-color regions get ordered dithering (cheap, avoids banding
///   artifacts error diffusion would introduce on smooth gradients).
/// - High edge density favors error diffusion, which preserves edges better
///   than ordered dithering's fixed grid.
/// - `PerformanceOptimized` caps out at Bayer/None since error diffusion's
///   sequential carry dependency doesn't parallelize per-pixel.
/// - `Smart` scores every candidate via [`score`] and picks the argmax.
pub fn dispatch(characteristics: Characteristics, profile: Profile) -> DithererKind {
    if characteristics.pixel_count == 0 {
        return DithererKind::None;
    }

    match profile {
        Profile::PerformanceOptimized => {
            if characteristics.distinct_colors <= 2 {
                DithererKind::None
            } else {
                DithererKind::Ordered { bayer_k: 3 }
            }
        }
        Profile::Balanced => {
            if characteristics.edge_density > 0.35 {
                DithererKind::ErrorDiffusion {
                    kernel: KernelKind::FloydSteinberg,
                    serpentine: true,
                }
            } else if characteristics.distinct_colors <= 4 {
                DithererKind::None
            } else {
                DithererKind::Ordered { bayer_k: 4 }
            }
        }
        Profile::QualityOptimized => {
            if characteristics.edge_density > 0.2 {
                DithererKind::ErrorDiffusion {
                    kernel: KernelKind::JarvisJudiceNinke,
                    serpentine: true,
                }
            } else if characteristics.distinct_colors <= 4 {
                DithererKind::None
            } else {
                DithererKind::Ordered { bayer_k: 5 }
            }
        }
        Profile::Smart => {
            smart_candidates()
                .into_iter()
                .map(|candidate| (score(characteristics, candidate.weights), candidate.kind))
                .fold(None, |best: Option<(f32, DithererKind)>, (s, kind)| match best {
                    Some((bs, _)) if bs >= s => best,
                    _ => Some((s, kind)),
                })
                .map(|(_, kind)| kind)
                .unwrap_or(DithererKind::None)
        }
    }
}
