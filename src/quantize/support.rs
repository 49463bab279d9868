//! Shared helpers used by more than one quantizer: weighted color entries,
//! axis-aligned bounding boxes in color space, and simple linear-algebra
//! primitives for the PCA-based quantizers.

use crate::color::Color;
use crate::histogram::Histogram;

/// A single distinct color plus its occurrence weight, the unit most
/// box-splitting quantizers operate on.
#[derive(Debug, Clone, Copy)]
pub struct WeightedColor {
    pub color: Color,
    pub weight: u32,
}

pub fn weighted_colors(histogram: &Histogram) -> Vec<WeightedColor> {
    histogram
        .iter()
        .map(|(color, entry)| WeightedColor {
            color,
            weight: entry.count.max(1),
        })
        .collect()
}

/// An axis-aligned box over the R, G, B channels, used by median-cut,
/// Wu-style, and variance-based quantizers alike.
#[derive(Debug, Clone)]
pub struct ColorBox {
    pub members: Vec<WeightedColor>,
}

impl ColorBox {
    pub fn new(members: Vec<WeightedColor>) -> Self {
        ColorBox { members }
    }

    pub fn total_weight(&self) -> u64 {
        self.members.iter().map(|m| m.weight as u64).sum()
    }

    /// `(min, max)` per channel, in R,G,B order.
    pub fn channel_ranges(&self) -> [(u8, u8); 3] {
        let mut ranges = [(255u8, 0u8), (255u8, 0u8), (255u8, 0u8)];
        for m in &self.members {
            let c = [m.color.r, m.color.g, m.color.b];
            for i in 0..3 {
                ranges[i].0 = ranges[i].0.min(c[i]);
                ranges[i].1 = ranges[i].1.max(c[i]);
            }
        }
        ranges
    }

    /// The channel index (0=R,1=G,2=B) with the widest value range.
    pub fn longest_axis(&self) -> usize {
        let ranges = self.channel_ranges();
        let spans: [i32; 3] = [
            ranges[0].1 as i32 - ranges[0].0 as i32,
            ranges[1].1 as i32 - ranges[1].0 as i32,
            ranges[2].1 as i32 - ranges[2].0 as i32,
        ];
        (0..3).max_by_key(|&i| spans[i]).unwrap_or(0)
    }

    /// Weighted average color of all members. Falls back to mid-gray for an
    /// empty box (should not occur given the splitting invariants, but keeps
    /// the function total).
    pub fn average(&self) -> Color {
        if self.members.is_empty() {
            return Color::new(128, 128, 128);
        }
        let mut sum = [0u64; 3];
        let mut weight = 0u64;
        for m in &self.members {
            let w = m.weight as u64;
            sum[0] += m.color.r as u64 * w;
            sum[1] += m.color.g as u64 * w;
            sum[2] += m.color.b as u64 * w;
            weight += w;
        }
        if weight == 0 {
            return Color::new(128, 128, 128);
        }
        Color::new(
            (sum[0] / weight) as u8,
            (sum[1] / weight) as u8,
            (sum[2] / weight) as u8,
        )
    }

    /// Splits along `axis` at the member's median position on that axis
    /// (by count-weighted rank), returning (lower half, upper half). Both
    /// halves are guaranteed non-empty when `members.len() >= 2`.
    pub fn split_median(mut self, axis: usize) -> (ColorBox, ColorBox) {
        self.members.sort_by_key(|m| match axis {
            0 => m.color.r,
            1 => m.color.g,
            _ => m.color.b,
        });
        let mid = (self.members.len() / 2).max(1);
        let upper = self.members.split_off(mid);
        (ColorBox::new(self.members), ColorBox::new(upper))
    }

    /// Per-channel population variance, weighted by occurrence count.
    pub fn variance(&self) -> f64 {
        let total_weight = self.total_weight() as f64;
        if total_weight == 0.0 {
            return 0.0;
        }
        let mut mean = [0f64; 3];
        for m in &self.members {
            let w = m.weight as f64;
            mean[0] += m.color.r as f64 * w;
            mean[1] += m.color.g as f64 * w;
            mean[2] += m.color.b as f64 * w;
        }
        for v in &mut mean {
            *v /= total_weight;
        }
        let mut var = 0f64;
        for m in &self.members {
            let w = m.weight as f64;
            let dr = m.color.r as f64 - mean[0];
            let dg = m.color.g as f64 - mean[1];
            let db = m.color.b as f64 - mean[2];
            var += (dr * dr + dg * dg + db * db) * w;
        }
        var / total_weight
    }
}

/// Repeatedly splits the box judged "worst" by `score` (higher = split
/// next) along its longest axis until `target` boxes exist or no box can be
/// split further. Shared by median-cut and variance-based/variance-cut.
pub fn split_until<F>(initial: ColorBox, target: usize, mut score: F) -> Vec<ColorBox>
where
    F: FnMut(&ColorBox) -> f64,
{
    let mut boxes = vec![initial];
    while boxes.len() < target {
        let Some((worst_idx, _)) = boxes
            .iter()
            .enumerate()
            .filter(|(_, b)| b.members.len() >= 2)
            .map(|(i, b)| (i, score(b)))
            .max_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal))
        else {
            break;
        };
        let worst = boxes.remove(worst_idx);
        let axis = worst.longest_axis();
        let (lo, hi) = worst.split_median(axis);
        boxes.push(lo);
        boxes.push(hi);
    }
    boxes
}

/// 3x3 symmetric covariance matrix over R,G,B, weighted by occurrence count.
pub fn covariance(colors: &[WeightedColor]) -> ([f64; 3], [[f64; 3]; 3]) {
    let total: f64 = colors.iter().map(|c| c.weight as f64).sum::<f64>().max(1.0);
    let mut mean = [0f64; 3];
    for c in colors {
        let w = c.weight as f64;
        mean[0] += c.color.r as f64 * w;
        mean[1] += c.color.g as f64 * w;
        mean[2] += c.color.b as f64 * w;
    }
    for m in &mut mean {
        *m /= total;
    }

    let mut cov = [[0f64; 3]; 3];
    for c in colors {
        let w = c.weight as f64;
        let d = [
            c.color.r as f64 - mean[0],
            c.color.g as f64 - mean[1],
            c.color.b as f64 - mean[2],
        ];
        for i in 0..3 {
            for j in 0..3 {
                cov[i][j] += d[i] * d[j] * w;
            }
        }
    }
    for row in &mut cov {
        for v in row {
            *v /= total;
        }
    }
    (mean, cov)
}

/// Dominant eigenvector of a 3x3 symmetric matrix via power iteration.
/// Returns a unit vector; if the matrix is (numerically) the zero matrix —
/// all colors identical — returns the R axis as a neutral fallback so
/// callers never divide by zero.
pub fn dominant_eigenvector(m: [[f64; 3]; 3]) -> [f64; 3] {
    let mut v = [1.0, 1.0, 1.0];
    for _ in 0..64 {
        let nv = [
            m[0][0] * v[0] + m[0][1] * v[1] + m[0][2] * v[2],
            m[1][0] * v[0] + m[1][1] * v[1] + m[1][2] * v[2],
            m[2][0] * v[0] + m[2][1] * v[1] + m[2][2] * v[2],
        ];
        let norm = (nv[0] * nv[0] + nv[1] * nv[1] + nv[2] * nv[2]).sqrt();
        if norm < 1e-12 {
            return [1.0, 0.0, 0.0];
        }
        v = [nv[0] / norm, nv[1] / norm, nv[2] / norm];
    }
    v
}
