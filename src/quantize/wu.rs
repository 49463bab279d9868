//! Wu / greedy orthogonal bi-partitioning quantization.
//!
//! Colors are quantized to a 32-level-per-channel grid (5 bits/channel, the
//! resolution Wu's original paper operates at) and weighted by occurrence
//! count. The box with the greatest weighted variance is split; unlike
//! median-cut (which always cuts at the member median) this picks, for each
//! of the three axes, the cut position that maximizes the resulting
//! between-group variance reduction, and takes the best of the three.

use super::support::{weighted_colors, ColorBox, WeightedColor};
use super::ReduceColors;
use crate::color::Color;
use crate::histogram::Histogram;

pub struct Wu;

impl ReduceColors for Wu {
    fn reduce_raw(&self, histogram: &Histogram, n: usize) -> Vec<Color> {
        reduce(histogram, n)
    }
}

fn quantize_5bit(v: u8) -> u8 {
    v >> 3
}

fn dequantize_5bit(v: u8) -> u8 {
    (v << 3) | (v >> 2)
}

/// Weighted variance reduction achieved by splitting `members` (sorted by
/// `key`) at each possible position; returns the best split index (number
/// of elements in the lower half) and the variance-reduction score.
fn best_split_on_axis(members: &[WeightedColor], axis: usize) -> Option<(usize, f64)> {
    if members.len() < 2 {
        return None;
    }
    let mut sorted = members.to_vec();
    sorted.sort_by_key(|m| match axis {
        0 => m.color.r,
        1 => m.color.g,
        _ => m.color.b,
    });

    let value = |m: &WeightedColor| -> f64 {
        match axis {
            0 => m.color.r as f64,
            1 => m.color.g as f64,
            _ => m.color.b as f64,
        }
    };

    let total_weight: f64 = sorted.iter().map(|m| m.weight as f64).sum();
    if total_weight <= 0.0 {
        return None;
    }

    // Prefix sums of weight and weight*value, weight*value^2.
    let n = sorted.len();
    let mut pw = vec![0f64; n + 1];
    let mut psum = vec![0f64; n + 1];
    for (i, m) in sorted.iter().enumerate() {
        let w = m.weight as f64;
        let v = value(m);
        pw[i + 1] = pw[i] + w;
        psum[i + 1] = psum[i] + w * v;
    }

    let mut best: Option<(usize, f64)> = None;
    for split in 1..n {
        let w_lo = pw[split];
        let w_hi = total_weight - w_lo;
        if w_lo <= 0.0 || w_hi <= 0.0 {
            continue;
        }
        let mean_lo = psum[split] / w_lo;
        let mean_hi = (psum[n] - psum[split]) / w_hi;
        // Between-group variance: the portion of total variance explained
        // by separating the two means, weighted by each group's mass.
        let score = w_lo * mean_lo * mean_lo + w_hi * mean_hi * mean_hi;
        if best.map_or(true, |(_, s)| score > s) {
            best = Some((split, score));
        }
    }
    best
}

fn split_box(b: ColorBox) -> (ColorBox, ColorBox) {
    let mut best_axis = 0;
    let mut best_score = f64::MIN;
    let mut best_split = b.members.len() / 2;
    for axis in 0..3 {
        if let Some((split, score)) = best_split_on_axis(&b.members, axis) {
            if score > best_score {
                best_score = score;
                best_axis = axis;
                best_split = split;
            }
        }
    }
    let mut members = b.members;
    members.sort_by_key(|m| match best_axis {
        0 => m.color.r,
        1 => m.color.g,
        _ => m.color.b,
    });
    let upper = members.split_off(best_split.max(1).min(members.len().saturating_sub(1).max(1)));
    (ColorBox::new(members), ColorBox::new(upper))
}

pub fn reduce(histogram: &Histogram, n: usize) -> Vec<Color> {
    let quantized: Vec<WeightedColor> = weighted_colors(histogram)
        .into_iter()
        .map(|w| WeightedColor {
            color: Color::new(
                quantize_5bit(w.color.r),
                quantize_5bit(w.color.g),
                quantize_5bit(w.color.b),
            ),
            weight: w.weight,
        })
        .collect();
    if quantized.is_empty() || n == 0 {
        return Vec::new();
    }

    let mut boxes = vec![ColorBox::new(quantized)];
    while boxes.len() < n {
        let Some((idx, _)) = boxes
            .iter()
            .enumerate()
            .filter(|(_, b)| b.members.len() >= 2)
            .map(|(i, b)| (i, b.variance() * b.total_weight() as f64))
            .max_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal))
        else {
            break;
        };
        let worst = boxes.remove(idx);
        let (lo, hi) = split_box(worst);
        boxes.push(lo);
        boxes.push(hi);
    }

    boxes
        .iter()
        .map(|b| {
            let avg = b.average();
            Color::new(
                dequantize_5bit(avg.r),
                dequantize_5bit(avg.g),
                dequantize_5bit(avg.b),
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::histogram;
    use crate::pixelbuf::RgbaBuffer;

    #[test]
    fn respects_requested_upper_bound() {
        let pixels: Vec<Color> = (0..256u32)
            .map(|i| Color::new(i as u8, (i * 2) as u8, (i * 5) as u8))
            .collect();
        let buf = RgbaBuffer::new(16, 16, pixels);
        let h = histogram::build(&buf, true);
        let result = reduce(&h, 12);
        assert!(result.len() <= 12 && !result.is_empty());
    }

    #[test]
    fn single_color_approximated_within_quantization_step() {
        let pixels = vec![Color::new(100, 100, 100); 4];
        let buf = RgbaBuffer::new(2, 2, pixels);
        let h = histogram::build(&buf, true);
        let result = reduce(&h, 4);
        assert_eq!(result.len(), 1);
        // 5-bit quantization rounds to the nearest 8-level step.
        assert!((result[0].r as i32 - 100).abs() <= 8);
    }
}
