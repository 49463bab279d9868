//! Ant-refinement quantizer wrapper: post-processes a palette
//! via iterative reassignment — each iteration reassigns every histogram
//! color to its nearest palette entry, then moves each entry toward its
//! cluster's weighted centroid.

use crate::color::metric::{self, MetricKind};
use crate::color::Color;
use crate::histogram::Histogram;

/// Runs `iterations` rounds of nearest-assignment + centroid-recentering
/// over `palette`, using `metric` for nearest-entry assignment.
pub fn refine(palette: Vec<Color>, histogram: &Histogram, metric: MetricKind, iterations: usize) -> Vec<Color> {
    if palette.is_empty() || histogram.is_empty() {
        return palette;
    }

    let mut palette = palette;
    let weighted: Vec<(Color, u32)> = histogram.iter().map(|(c, e)| (c, e.count)).collect();

    for _ in 0..iterations {
        let mut sum_r = vec![0u64; palette.len()];
        let mut sum_g = vec![0u64; palette.len()];
        let mut sum_b = vec![0u64; palette.len()];
        let mut weight = vec![0u64; palette.len()];

        for &(color, count) in &weighted {
            let (nearest, _) = palette
                .iter()
                .enumerate()
                .map(|(i, &p)| (i, metric::distance(metric, color, p)))
                .min_by_key(|&(_, d)| d)
                .unwrap();
            sum_r[nearest] += color.r as u64 * count as u64;
            sum_g[nearest] += color.g as u64 * count as u64;
            sum_b[nearest] += color.b as u64 * count as u64;
            weight[nearest] += count as u64;
        }

        for i in 0..palette.len() {
            if weight[i] == 0 {
                continue;
            }
            palette[i] = Color::new(
                (sum_r[i] / weight[i]) as u8,
                (sum_g[i] / weight[i]) as u8,
                (sum_b[i] / weight[i]) as u8,
            );
        }
    }

    palette
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::histogram;
    use crate::pixelbuf::RgbaBuffer;

    #[test]
    fn refinement_preserves_palette_length() {
        let pixels: Vec<Color> = (0..64u32)
            .map(|i| Color::new(i as u8 * 4, 0, 0))
            .collect();
        let buf = RgbaBuffer::new(8, 8, pixels);
        let h = histogram::build(&buf, true);
        let palette = vec![Color::new(10, 0, 0), Color::new(240, 0, 0)];
        let refined = refine(palette, &h, MetricKind::EuclideanRgb, 10);
        assert_eq!(refined.len(), 2);
    }

    #[test]
    fn empty_histogram_is_noop() {
        let h = Histogram::default();
        let palette = vec![Color::new(1, 2, 3)];
        let refined = refine(palette.clone(), &h, MetricKind::EuclideanRgb, 5);
        assert_eq!(refined, palette);
    }
}
