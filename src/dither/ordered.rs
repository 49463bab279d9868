//! Ordered (matrix) dithering: Bayer thresholds of order
//! `2^k, k in [1,8]`, and a fixed 8x8 halftone matrix. Each source pixel is
//! perturbed by a threshold drawn from a tiled matrix before nearest-color
//! lookup; unlike error diffusion, no state carries between pixels.

use crate::color::lookup::PaletteLookup;
use crate::color::Color;
use crate::error::{self, Error};
use crate::pixelbuf::{IndexBuffer, PixelBuffer};

/// Recursively builds the n x n Bayer matrix for `n = 2^k`, `k in [1,8]`
///, returning values in `0..n*n`.
pub fn bayer_matrix(k: u32) -> Vec<Vec<u32>> {
    assert!((1..=8).contains(&k), "bayer order must be in [1,8]");
    let mut m = vec![vec![0u32]];
    for _ in 0..k {
        let size = m.len();
        let mut next = vec![vec![0u32; size * 2]; size * 2];
        for y in 0..size {
            for x in 0..size {
                let base = m[y][x] * 4;
                next[y][x] = base;
                next[y][x + size] = base + 2;
                next[y + size][x] = base + 3;
                next[y + size][x + size] = base + 1;
            }
        }
        m = next;
    }
    m
}

/// Builds the Bayer matrix of side length `n`, validating that `n` is a
/// power of two `>= 2`` testable property).
pub fn generate(n: u32) -> Result<Vec<Vec<u32>>, Error> {
    if n < 2 || !n.is_power_of_two() {
        return Err(error::invalid_argument(format!(
            "bayer matrix size must be a power of two >= 2, got {n}"
        )));
    }
    Ok(bayer_matrix(n.trailing_zeros()))
}

/// Classic 8x8 clustered-dot halftone threshold matrix (values `0..64`).
pub const HALFTONE_8X8: [[u32; 8]; 8] = [
    [24, 10, 12, 26, 35, 47, 49, 37],
    [8, 0, 2, 14, 45, 59, 61, 51],
    [22, 6, 4, 16, 43, 57, 63, 53],
    [30, 20, 18, 28, 33, 41, 55, 39],
    [34, 46, 48, 36, 25, 11, 13, 27],
    [44, 58, 60, 50, 9, 1, 3, 15],
    [42, 56, 62, 52, 23, 7, 5, 17],
    [32, 40, 54, 38, 31, 21, 19, 29],
];

/// Dithers `source` using a threshold matrix, tiling it across the image.
/// `matrix[y][x]` must hold values in `0..matrix.len()*matrix.len()` (or,
/// for non-square matrices, `0..matrix.len()*row_len`).
pub fn dither(matrix: &[Vec<u32>], source: &dyn PixelBuffer, target: &mut IndexBuffer, lookup: &PaletteLookup) {
    let size = matrix.len() as u32;
    if size == 0 {
        return;
    }
    let cell_count = (size * matrix[0].len() as u32) as f32;
    // `s^2 - 1` so the threshold spans the matrix's full value range
    // (`0..=s^2-1`) to `[-0.5, 0.5]`, independent of palette size.
    let levels = (cell_count - 1.0).max(1.0);

    for y in 0..source.height() {
        for x in 0..source.width() {
            let my = (y % size) as usize;
            let mx = (x % matrix[my].len() as u32) as usize;
            let threshold = matrix[my][mx] as f32 / levels - 0.5;
            let bias = threshold * 255.0;

            let src = source.get(x, y);
            let perturbed = Color::new(
                (src.r as f32 + bias).round().clamp(0.0, 255.0) as u8,
                (src.g as f32 + bias).round().clamp(0.0, 255.0) as u8,
                (src.b as f32 + bias).round().clamp(0.0, 255.0) as u8,
            );
            target.set(x, y, lookup.find_closest(perturbed));
        }
    }
}

/// The "Uniform" ordered variant: adds a constant 0.5 (of one quantization
/// step) to every channel of every pixel, with no `(x, y)` dependence at
/// all. This looks like a bug — a threshold matrix degenerated to a single
/// constant cell — and it is preserved verbatim rather than reinterpreted
/// as "probably meant dithering": a uniform bias shifts the whole image by
/// half a step instead of spreading error, so uniform source colors stay
/// uniform in the output (which a property test below locks in).
pub fn dither_uniform(source: &dyn PixelBuffer, target: &mut IndexBuffer, lookup: &PaletteLookup) {
    let palette_len = lookup.palette().len().max(2) as f32;
    let step = 255.0 / (palette_len - 1.0).max(1.0);
    let bias = 0.5 * step;

    for y in 0..source.height() {
        for x in 0..source.width() {
            let src = source.get(x, y);
            let perturbed = Color::new(
                (src.r as f32 + bias).round().clamp(0.0, 255.0) as u8,
                (src.g as f32 + bias).round().clamp(0.0, 255.0) as u8,
                (src.b as f32 + bias).round().clamp(0.0, 255.0) as u8,
            );
            target.set(x, y, lookup.find_closest(perturbed));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::metric::MetricKind;
    use crate::palette::Palette;
    use crate::pixelbuf::RgbaBuffer;

    #[test]
    fn bayer_2x2_matches_known_values() {
        let m = bayer_matrix(1);
        assert_eq!(m, vec![vec![0, 2], vec![3, 1]]);
    }

    #[test]
    fn generate_matches_bayer_matrix_for_valid_sizes() {
        for k in 1..=6u32 {
            let n = 1u32 << k;
            assert_eq!(generate(n).unwrap(), bayer_matrix(k));
        }
    }

    #[test]
    fn generate_rejects_non_power_of_two_and_too_small() {
        assert!(generate(3).is_err());
        assert!(generate(1).is_err());
        assert!(generate(0).is_err());
    }

    #[test]
    fn bayer_matrix_has_all_distinct_values() {
        for k in 1..=4 {
            let m = bayer_matrix(k);
            let n = m.len();
            let mut values: Vec<u32> = m.into_iter().flatten().collect();
            values.sort_unstable();
            let expected: Vec<u32> = (0..(n * n) as u32).collect();
            assert_eq!(values, expected, "k={}", k);
        }
    }

    #[test]
    fn mid_gray_bayer_checkerboard_splits_roughly_evenly() {
        let pixels = vec![Color::new(128, 128, 128); 64];
        let src = RgbaBuffer::new(8, 8, pixels);
        let lookup = PaletteLookup::new(
            Palette::new(vec![Color::new(0, 0, 0), Color::new(255, 255, 255)]),
            MetricKind::EuclideanRgb,
        );
        let matrix = bayer_matrix(3);
        let mut target = IndexBuffer::new(8, 8, 0);
        dither(&matrix, &src, &mut target, &lookup);
        let ones = target.as_slice().iter().filter(|&&i| i == 1).count();
        assert!(ones > 20 && ones < 44, "expected roughly half black/white, got {} white", ones);
    }

    #[test]
    fn uniform_dither_gives_uniform_output_for_uniform_input() {
        let pixels = vec![Color::new(50, 50, 50); 16];
        let src = RgbaBuffer::new(4, 4, pixels);
        let lookup = PaletteLookup::new(
            Palette::new(vec![Color::new(0, 0, 0), Color::new(255, 255, 255)]),
            MetricKind::EuclideanRgb,
        );
        let mut target = IndexBuffer::new(4, 4, 99);
        dither_uniform(&src, &mut target, &lookup);
        let first = target.get(0, 0);
        assert!(target.as_slice().iter().all(|&v| v == first));
    }

    #[test]
    fn halftone_matrix_in_range() {
        let flat: Vec<u32> = HALFTONE_8X8.iter().flatten().copied().collect();
        let mut sorted = flat.clone();
        sorted.sort_unstable();
        let expected: Vec<u32> = (0..64).collect();
        assert_eq!(sorted, expected);
    }
}
