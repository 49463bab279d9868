//! Variance-based and variance-cut quantizers: both split boxes
//! by a variance criterion; they differ in what they score a candidate split
//! by (total variance vs. variance scaled by population weight).

use super::support::{split_until, weighted_colors, ColorBox};
use super::ReduceColors;
use crate::color::Color;
use crate::histogram::Histogram;

pub struct VarianceBased;

impl ReduceColors for VarianceBased {
    fn reduce_raw(&self, histogram: &Histogram, n: usize) -> Vec<Color> {
        reduce_variance_based(histogram, n)
    }
}

pub struct VarianceCut;

impl ReduceColors for VarianceCut {
    fn reduce_raw(&self, histogram: &Histogram, n: usize) -> Vec<Color> {
        reduce_variance_cut(histogram, n)
    }
}

/// Splits the box with the highest raw per-channel variance first.
pub fn reduce_variance_based(histogram: &Histogram, n: usize) -> Vec<Color> {
    let members = weighted_colors(histogram);
    if members.is_empty() || n == 0 {
        return Vec::new();
    }
    let boxes = split_until(ColorBox::new(members), n, |b| b.variance());
    boxes.iter().map(ColorBox::average).collect()
}

/// Splits the box whose variance, weighted by its population share, is
/// highest — biasing toward boxes that represent more of the image rather
/// than purely the most spread-out ones.
pub fn reduce_variance_cut(histogram: &Histogram, n: usize) -> Vec<Color> {
    let members = weighted_colors(histogram);
    if members.is_empty() || n == 0 {
        return Vec::new();
    }
    let boxes = split_until(ColorBox::new(members), n, |b| {
        b.variance() * b.total_weight() as f64
    });
    boxes.iter().map(ColorBox::average).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::histogram;
    use crate::pixelbuf::RgbaBuffer;

    fn gradient_histogram() -> Histogram {
        let pixels: Vec<Color> = (0..256u32)
            .map(|i| Color::new(i as u8, (i / 2) as u8, (i / 4) as u8))
            .collect();
        let buf = RgbaBuffer::new(16, 16, pixels);
        histogram::build(&buf, true)
    }

    #[test]
    fn variance_based_respects_upper_bound() {
        let h = gradient_histogram();
        let result = reduce_variance_based(&h, 10);
        assert!(result.len() <= 10 && !result.is_empty());
    }

    #[test]
    fn variance_cut_respects_upper_bound() {
        let h = gradient_histogram();
        let result = reduce_variance_cut(&h, 10);
        assert!(result.len() <= 10 && !result.is_empty());
    }
}
