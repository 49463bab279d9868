//! Knoll ordered dithering: generates `k` candidate palette
//! indices by repeatedly quantizing a walking "goal" color that chases the
//! accumulated quantization error, sorts those candidates by luminance, and
//! picks among them by a Bayer matrix position index — so each pixel emits
//! one of several plausible candidates rather than always the single
//! nearest one, without ever perturbing the source color itself.

use super::ordered::bayer_matrix;
use crate::color::lookup::PaletteLookup;
use crate::color::Color;
use crate::pixelbuf::{IndexBuffer, PixelBuffer};

/// Dithers using Knoll's candidate-generation-then-select scheme.
///
/// For each pixel: walk a "goal" color starting at the source color,
/// repeating `k` times: quantize the current goal to its nearest palette
/// index, record that index as a candidate, then advance
/// `goal += (original - palette[index]) * error_multiplier`. The `k`
/// candidates (with repeats, by construction) are sorted by luminance, and
/// the Bayer matrix entry at the pixel's position selects which sorted
/// candidate to emit: `floor(bayer[y%s, x%s] / s^2 * k)`. `matrix_size`
/// selects the Bayer order (`2^matrix_size`).
pub fn dither(
    matrix_size: u32,
    k: usize,
    error_multiplier: f32,
    source: &dyn PixelBuffer,
    target: &mut IndexBuffer,
    lookup: &PaletteLookup,
) {
    let k = k.max(1);
    let matrix = bayer_matrix(matrix_size.clamp(1, 8));
    let size = matrix.len() as u32;
    let levels = (size * size) as f32;
    if lookup.palette().is_empty() {
        return;
    }

    for y in 0..source.height() {
        for x in 0..source.width() {
            let src = source.get(x, y);
            let mut candidates = generate_candidates(lookup, src, k, error_multiplier);
            candidates.sort_by(|&a, &b| {
                let la = lookup.palette().get(a).map(Color::luminance).unwrap_or(0.0);
                let lb = lookup.palette().get(b).map(Color::luminance).unwrap_or(0.0);
                la.partial_cmp(&lb).unwrap_or(std::cmp::Ordering::Equal)
            });

            let my = (y % size) as usize;
            let mx = (x % size) as usize;
            let position = ((matrix[my][mx] as f32 / levels) * candidates.len() as f32) as usize;
            let position = position.min(candidates.len() - 1);

            target.set(x, y, candidates[position]);
        }
    }
}

/// Runs the goal-walk candidate generation: quantize, record, advance the
/// goal by the scaled residual, `k` times.
fn generate_candidates(lookup: &PaletteLookup, original: Color, k: usize, error_multiplier: f32) -> Vec<u8> {
    let mut candidates = Vec::with_capacity(k);
    let mut goal = (original.r as f32, original.g as f32, original.b as f32);

    for _ in 0..k {
        let goal_color = Color::new(
            goal.0.round().clamp(0.0, 255.0) as u8,
            goal.1.round().clamp(0.0, 255.0) as u8,
            goal.2.round().clamp(0.0, 255.0) as u8,
        );
        let index = lookup.find_closest(goal_color);
        candidates.push(index);

        let chosen = lookup.palette().get(index).unwrap_or(goal_color);
        goal.0 += (original.r as f32 - chosen.r as f32) * error_multiplier;
        goal.1 += (original.g as f32 - chosen.g as f32) * error_multiplier;
        goal.2 += (original.b as f32 - chosen.b as f32) * error_multiplier;
    }

    candidates
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::metric::MetricKind;
    use crate::palette::Palette;
    use crate::pixelbuf::RgbaBuffer;

    #[test]
    fn output_indices_are_in_range() {
        let pixels: Vec<Color> = (0..64).map(|i| Color::new((i * 4) as u8, 0, 0)).collect();
        let src = RgbaBuffer::new(8, 8, pixels);
        let lookup = PaletteLookup::new(
            Palette::new(vec![
                Color::new(0, 0, 0),
                Color::new(85, 0, 0),
                Color::new(170, 0, 0),
                Color::new(255, 0, 0),
            ]),
            MetricKind::EuclideanRgb,
        );
        let mut target = IndexBuffer::new(8, 8, 99);
        dither(3, 3, 1.0, &src, &mut target, &lookup);
        assert!(target.as_slice().iter().all(|&v| (v as usize) < 4));
    }

    #[test]
    fn single_entry_palette_selects_it_everywhere() {
        let pixels = vec![Color::new(10, 20, 30); 4];
        let src = RgbaBuffer::new(2, 2, pixels);
        let lookup = PaletteLookup::new(Palette::new(vec![Color::new(1, 2, 3)]), MetricKind::EuclideanRgb);
        let mut target = IndexBuffer::new(2, 2, 99);
        dither(2, 4, 1.0, &src, &mut target, &lookup);
        assert!(target.as_slice().iter().all(|&v| v == 0));
    }

    #[test]
    fn candidates_are_sorted_by_luminance_before_selection() {
        // Three-entry palette spanning low/mid/high luminance; the goal-walk
        // from a mid-gray source should only ever emit indices into this
        // palette, and position 0 after sorting must be the darkest.
        let lookup = PaletteLookup::new(
            Palette::new(vec![Color::new(200, 0, 0), Color::new(0, 0, 0), Color::new(100, 100, 100)]),
            MetricKind::EuclideanRgb,
        );
        let candidates = generate_candidates(&lookup, Color::new(128, 128, 128), 3, 0.5);
        let mut sorted = candidates.clone();
        sorted.sort_by(|&a, &b| {
            let la = lookup.palette().get(a).unwrap().luminance();
            let lb = lookup.palette().get(b).unwrap().luminance();
            la.partial_cmp(&lb).unwrap()
        });
        let first_luminance = lookup.palette().get(sorted[0]).unwrap().luminance();
        for &idx in &candidates {
            assert!(lookup.palette().get(idx).unwrap().luminance() >= first_luminance - 1e-6);
        }
    }

    #[test]
    fn goal_walk_advances_toward_uncovered_candidates() {
        // A two-entry palette straddling the source color: the goal-walk's
        // error feedback should visit both entries across k=4 iterations
        // rather than collapsing onto the single nearest one.
        let lookup = PaletteLookup::new(
            Palette::new(vec![Color::new(0, 0, 0), Color::new(255, 255, 255)]),
            MetricKind::EuclideanRgb,
        );
        let candidates = generate_candidates(&lookup, Color::new(128, 128, 128), 4, 1.0);
        let distinct: std::collections::HashSet<_> = candidates.iter().collect();
        assert_eq!(distinct.len(), 2, "expected the goal walk to visit both palette entries");
    }
}
