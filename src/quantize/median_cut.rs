//! Median-cut quantization: recursively split the tightest
//! axis-aligned bounding box by the median along its longest channel until
//! `n` boxes exist, then average each.

use super::support::{split_until, weighted_colors, ColorBox};
use super::ReduceColors;
use crate::color::Color;
use crate::histogram::Histogram;

/// Unit struct implementing [`ReduceColors`] for median-cut, so it can be
/// used as a trait object by the PCA and ant-refinement wrappers.
pub struct MedianCut;

impl ReduceColors for MedianCut {
    fn reduce_raw(&self, histogram: &Histogram, n: usize) -> Vec<Color> {
        reduce(histogram, n)
    }
}

pub fn reduce(histogram: &Histogram, n: usize) -> Vec<Color> {
    let members = weighted_colors(histogram);
    if members.is_empty() || n == 0 {
        return Vec::new();
    }
    let boxes = split_until(ColorBox::new(members), n, |b| {
        // Score a box by "worth splitting": wider range and more weight
        // both make a split more valuable, matching the intent of always
        // cutting the currently-largest box first.
        let ranges = b.channel_ranges();
        let span = ranges
            .iter()
            .map(|&(lo, hi)| (hi as i32 - lo as i32) as f64)
            .fold(0.0, f64::max);
        span * b.total_weight() as f64
    });
    boxes.iter().map(ColorBox::average).collect()
}
