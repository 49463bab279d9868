//! Noise dithering: perturbs each pixel with pseudo-random
//! noise drawn from one of four spectra before nearest-color lookup. Unlike
//! error diffusion and ordered dithering, the perturbation at each pixel is
//! independent of its neighbors' quantization outcome (though blue/brown/pink
//! spectra are spatially correlated by construction).

use crate::color::lookup::PaletteLookup;
use crate::color::Color;
use crate::pixelbuf::{IndexBuffer, PixelBuffer};

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Spectrum {
    White,
    Blue,
    Brown,
    Pink,
}

/// A deterministic xorshift PRNG so dithering stays reproducible without
/// pulling in a `rand` dependency the rest of the crate doesn't otherwise
/// need.
struct Xorshift32(u32);

impl Xorshift32 {
    fn next(&mut self) -> u32 {
        let mut x = self.0;
        x ^= x << 13;
        x ^= x >> 17;
        x ^= x << 5;
        self.0 = x;
        x
    }

    /// Uniform sample in `[-1.0, 1.0)`.
    fn sample(&mut self) -> f32 {
        (self.next() as f32 / u32::MAX as f32) * 2.0 - 1.0
    }
}

/// Generates one noise field of `width * height` samples roughly in
/// `[-1.0, 1.0]`, row-major, for the given spectrum and seed.
fn noise_field(spectrum: Spectrum, width: u32, height: u32, seed: u32) -> Vec<f32> {
    let n = (width as usize) * (height as usize);
    let mut rng = Xorshift32(seed | 1);
    let white: Vec<f32> = (0..n).map(|_| rng.sample()).collect();

    match spectrum {
        Spectrum::White => white,
        // Blue noise emphasizes high spatial frequencies: a simple
        // high-pass via subtracting a local average approximates this
        // without a full void-and-cluster table.
        Spectrum::Blue => high_pass(&white, width, height),
        // Brown (red) noise: sum of coordinate-hashed samples at multiple
        // spatial scales, each weighted by `1/scale^2` so coarser scales
        // (the low frequencies) dominate.
        Spectrum::Brown => {
            let mut out = vec![0.0f32; n];
            const SCALES: [u32; 6] = [1, 2, 4, 8, 16, 32];
            for y in 0..height as i64 {
                for x in 0..width as i64 {
                    let mut sum = 0.0f32;
                    for &scale in &SCALES {
                        let weight = 1.0 / (scale as f32 * scale as f32);
                        let sx = x.div_euclid(scale as i64);
                        let sy = y.div_euclid(scale as i64);
                        sum += hash_coord(sx, sy, scale, seed) * weight;
                    }
                    out[(y as usize) * (width as usize) + x as usize] = sum;
                }
            }
            normalize(&mut out);
            out
        }
        // Pink noise: sum of 6 octaves of coordinate-hashed samples, each
        // doubling the spatial scale of the last while its amplitude is
        // halved, so frequency and amplitude trade off evenly.
        Spectrum::Pink => {
            let mut out = vec![0.0f32; n];
            let mut amplitude = 1.0f32;
            for octave in 0..6u32 {
                let scale = 1u32 << octave;
                for y in 0..height as i64 {
                    for x in 0..width as i64 {
                        let sx = x.div_euclid(scale as i64);
                        let sy = y.div_euclid(scale as i64);
                        let idx = (y as usize) * (width as usize) + x as usize;
                        out[idx] += hash_coord(sx, sy, scale, seed.wrapping_add(octave)) * amplitude;
                    }
                }
                amplitude *= 0.5;
            }
            normalize(&mut out);
            out
        }
    }
}

/// Deterministically hashes a `(x, y, scale)` coordinate plus `seed` into a
/// pseudo-random sample in `[-1.0, 1.0)`, used to build the brown/pink noise
/// fields without needing a full value-noise/Perlin implementation.
fn hash_coord(x: i64, y: i64, scale: u32, seed: u32) -> f32 {
    let mut h = seed
        .wrapping_add((x as u32).wrapping_mul(0x9E37_79B1))
        .wrapping_add((y as u32).wrapping_mul(0x85EB_CA77))
        .wrapping_add(scale.wrapping_mul(0xC2B2_AE3D));
    h ^= h >> 15;
    h = h.wrapping_mul(0x2C1B_3C6D);
    h ^= h >> 12;
    h = h.wrapping_mul(0x297A_2D39);
    h ^= h >> 15;
    (h as f32 / u32::MAX as f32) * 2.0 - 1.0
}

fn high_pass(field: &[f32], width: u32, height: u32) -> Vec<f32> {
    let (w, h) = (width as i32, height as i32);
    let mut out = vec![0.0f32; field.len()];
    for y in 0..h {
        for x in 0..w {
            let mut sum = 0.0f32;
            let mut count = 0f32;
            for dy in -1..=1 {
                for dx in -1..=1 {
                    let (nx, ny) = (x + dx, y + dy);
                    if nx >= 0 && ny >= 0 && nx < w && ny < h {
                        sum += field[(ny * w + nx) as usize];
                        count += 1.0;
                    }
                }
            }
            let avg = sum / count;
            out[(y * w + x) as usize] = field[(y * w + x) as usize] - avg;
        }
    }
    normalize(&mut out);
    out
}

fn normalize(field: &mut [f32]) {
    let max = field.iter().fold(0.0f32, |m, &v| m.max(v.abs()));
    if max > 0.0 {
        for v in field.iter_mut() {
            *v /= max;
        }
    }
}

/// Dithers `source` by adding `intensity`-scaled noise from `spectrum` to
/// each channel before nearest-color lookup.
pub fn dither(
    spectrum: Spectrum,
    intensity: f32,
    source: &dyn PixelBuffer,
    target: &mut IndexBuffer,
    lookup: &PaletteLookup,
) {
    let (width, height) = (source.width(), source.height());
    if width == 0 || height == 0 {
        return;
    }
    let field = noise_field(spectrum, width, height, 0x9E37_79B9);
    let scale = intensity.max(0.0) * 64.0;

    for y in 0..height {
        for x in 0..width {
            let n = field[(y * width + x) as usize] * scale;
            let src = source.get(x, y);
            let perturbed = Color::new(
                (src.r as f32 + n).round().clamp(0.0, 255.0) as u8,
                (src.g as f32 + n).round().clamp(0.0, 255.0) as u8,
                (src.b as f32 + n).round().clamp(0.0, 255.0) as u8,
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
    fn zero_intensity_is_deterministic_passthrough() {
        let pixels = vec![Color::new(100, 50, 25); 16];
        let src = RgbaBuffer::new(4, 4, pixels);
        let lookup = PaletteLookup::new(
            Palette::new(vec![Color::new(100, 50, 25), Color::new(0, 0, 0)]),
            MetricKind::EuclideanRgb,
        );
        let mut target = IndexBuffer::new(4, 4, 99);
        dither(Spectrum::White, 0.0, &src, &mut target, &lookup);
        assert!(target.as_slice().iter().all(|&v| v == 0));
    }

    #[test]
    fn all_spectra_cover_the_whole_image() {
        let pixels: Vec<Color> = (0..64).map(|i| Color::new((i * 4) as u8, 10, 20)).collect();
        let src = RgbaBuffer::new(8, 8, pixels);
        let lookup = PaletteLookup::new(
            Palette::new(vec![Color::new(0, 0, 0), Color::new(255, 255, 255)]),
            MetricKind::EuclideanRgb,
        );
        for spectrum in [Spectrum::White, Spectrum::Blue, Spectrum::Brown, Spectrum::Pink] {
            let mut target = IndexBuffer::new(8, 8, 99);
            dither(spectrum, 0.5, &src, &mut target, &lookup);
            assert!(target.as_slice().iter().all(|&v| v == 0 || v == 1));
        }
    }

    #[test]
    fn hash_coord_is_deterministic_and_varies_with_each_input() {
        let a = hash_coord(3, 5, 2, 7);
        let b = hash_coord(3, 5, 2, 7);
        assert_eq!(a, b);
        assert_ne!(a, hash_coord(4, 5, 2, 7));
        assert_ne!(a, hash_coord(3, 6, 2, 7));
        assert_ne!(a, hash_coord(3, 5, 4, 7));
    }

    #[test]
    fn brown_field_is_deterministic_and_seed_sensitive() {
        let a = noise_field(Spectrum::Brown, 16, 16, 0x1234_5678);
        let b = noise_field(Spectrum::Brown, 16, 16, 0x1234_5678);
        assert_eq!(a, b);
        let c = noise_field(Spectrum::Brown, 16, 16, 0x1111_1111);
        assert_ne!(a, c);
    }

    #[test]
    fn pink_field_changes_with_octave_seed_offset() {
        // Regression guard that the 6-octave sum actually varies the seed
        // per octave rather than reusing one hash for every scale.
        let field_a = noise_field(Spectrum::Pink, 8, 8, 1);
        let field_b = noise_field(Spectrum::Pink, 8, 8, 2);
        assert_ne!(field_a, field_b);
    }
}
