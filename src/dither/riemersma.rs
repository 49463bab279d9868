//! Riemersma dithering: error diffusion along a space-filling
//! curve instead of raster order, so error spreads isotropically rather than
//! along rows. The reference curve is the Hilbert curve; a `Linear` fallback
//! traverses in serpentine raster order for non-power-of-two dimensions
//! where a Hilbert curve can't tile exactly.

use crate::color::lookup::PaletteLookup;
use crate::color::Color;
use crate::pixelbuf::{IndexBuffer, PixelBuffer};

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Curve {
    Hilbert,
    Linear,
}

/// Generates the sequence of `(x, y)` visited by the Hilbert curve over a
/// `2^order x 2^order` grid, in curve order.
pub fn hilbert_path(order: u32) -> Vec<(u32, u32)> {
    let n = 1u32 << order;
    (0..n * n).map(|d| hilbert_d2xy(order, d)).collect()
}

fn hilbert_d2xy(order: u32, mut d: u32) -> (u32, u32) {
    let (mut x, mut y) = (0u32, 0u32);
    let mut s = 1u32;
    while s < (1 << order) {
        let rx = 1 & (d / 2);
        let ry = 1 & (d ^ rx);
        rotate(s, &mut x, &mut y, rx, ry);
        x += s * rx;
        y += s * ry;
        d /= 4;
        s *= 2;
    }
    (x, y)
}

fn rotate(s: u32, x: &mut u32, y: &mut u32, rx: u32, ry: u32) {
    if ry == 0 {
        if rx == 1 {
            *x = s.wrapping_sub(1).wrapping_sub(*x);
            *y = s.wrapping_sub(1).wrapping_sub(*y);
        }
        std::mem::swap(x, y);
    }
}

/// Builds a traversal path covering a `width x height` image. Uses the
/// Hilbert curve over the smallest enclosing power-of-two square (cells
/// outside `width x height` are skipped) when `curve` is `Hilbert`;
/// otherwise a boustrophedon (serpentine) raster scan.
fn path_for(curve: Curve, width: u32, height: u32) -> Vec<(u32, u32)> {
    if width == 0 || height == 0 {
        return Vec::new();
    }
    match curve {
        Curve::Hilbert => {
            let order = (32 - (width.max(height) - 1).leading_zeros()).max(1);
            hilbert_path(order)
                .into_iter()
                .filter(|&(x, y)| x < width && y < height)
                .collect()
        }
        Curve::Linear => {
            let mut path = Vec::with_capacity((width * height) as usize);
            for y in 0..height {
                if y % 2 == 0 {
                    for x in 0..width {
                        path.push((x, y));
                    }
                } else {
                    for x in (0..width).rev() {
                        path.push((x, y));
                    }
                }
            }
            path
        }
    }
}

/// Diffuses error along `curve`'s traversal order, decaying contributions
/// from the last `history` visited pixels exponentially.
pub fn dither(
    curve: Curve,
    history: usize,
    source: &dyn PixelBuffer,
    target: &mut IndexBuffer,
    lookup: &PaletteLookup,
) {
    let path = path_for(curve, source.width(), source.height());
    if path.is_empty() {
        return;
    }
    let history = history.max(1);
    // Weights decay by half each step back, matching the reference
    // Riemersma decay profile.
    let weights: Vec<f32> = (0..history).map(|i| 0.5f32.powi(i as i32 + 1)).collect();
    let weight_sum: f32 = weights.iter().sum();

    let mut ring: Vec<(f32, f32, f32)> = Vec::with_capacity(history);

    for &(x, y) in &path {
        let src = source.get(x, y);
        let mut err = (0.0f32, 0.0f32, 0.0f32);
        for (i, &w) in ring.iter().rev().take(history).enumerate() {
            let weight = weights.get(i).copied().unwrap_or(0.0);
            err.0 += w.0 * weight;
            err.1 += w.1 * weight;
            err.2 += w.2 * weight;
        }
        if weight_sum > 0.0 {
            err.0 /= weight_sum;
            err.1 /= weight_sum;
            err.2 /= weight_sum;
        }

        let corrected = Color::new(
            (src.r as f32 + err.0).round().clamp(0.0, 255.0) as u8,
            (src.g as f32 + err.1).round().clamp(0.0, 255.0) as u8,
            (src.b as f32 + err.2).round().clamp(0.0, 255.0) as u8,
        );
        let index = lookup.find_closest(corrected);
        target.set(x, y, index);

        let chosen = lookup.palette().get(index).unwrap_or(corrected);
        ring.push((
            corrected.r as f32 - chosen.r as f32,
            corrected.g as f32 - chosen.g as f32,
            corrected.b as f32 - chosen.b as f32,
        ));
        if ring.len() > history {
            ring.remove(0);
        }
    }
}
