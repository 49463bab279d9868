//! Binary splitting (PCA-based) quantization: project each box's
//! members onto their principal axis, split at the centroid, and recurse.

use super::support::{covariance, dominant_eigenvector, weighted_colors, ColorBox};
use super::ReduceColors;
use crate::color::Color;
use crate::histogram::Histogram;

pub struct BinarySplitting;

impl ReduceColors for BinarySplitting {
    fn reduce_raw(&self, histogram: &Histogram, n: usize) -> Vec<Color> {
        reduce(histogram, n)
    }
}

fn split_on_principal_axis(b: ColorBox) -> (ColorBox, ColorBox) {
    let (mean, cov) = covariance(&b.members);
    let axis = dominant_eigenvector(cov);

    let project = |c: Color| -> f64 {
        (c.r as f64 - mean[0]) * axis[0]
            + (c.g as f64 - mean[1]) * axis[1]
            + (c.b as f64 - mean[2]) * axis[2]
    };

    let mut members = b.members;
    members.sort_by(|a, b| {
        project(a.color)
            .partial_cmp(&project(b.color))
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    // Split at the member closest to the projected centroid (0.0 after
    // mean-centering), guaranteeing both halves non-empty.
    let split = members
        .iter()
        .position(|m| project(m.color) >= 0.0)
        .unwrap_or(members.len() / 2)
        .max(1)
        .min(members.len() - 1);
    let upper = members.split_off(split);
    (ColorBox::new(members), ColorBox::new(upper))
}

pub fn reduce(histogram: &Histogram, n: usize) -> Vec<Color> {
    let members = weighted_colors(histogram);
    if members.is_empty() || n == 0 {
        return Vec::new();
    }

    let mut boxes = vec![ColorBox::new(members)];
    while boxes.len() < n {
        let Some(idx) = boxes
            .iter()
            .enumerate()
            .filter(|(_, b)| b.members.len() >= 2)
            .max_by_key(|(_, b)| b.total_weight())
            .map(|(i, _)| i)
        else {
            break;
        };
        let worst = boxes.remove(idx);
        let (lo, hi) = split_on_principal_axis(worst);
        boxes.push(lo);
        boxes.push(hi);
    }

    boxes.iter().map(ColorBox::average).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::histogram;
    use crate::pixelbuf::RgbaBuffer;

    #[test]
    fn respects_upper_bound() {
        let pixels: Vec<Color> = (0..256u32)
            .map(|i| Color::new(i as u8, (i / 3) as u8, (i * 2) as u8))
            .collect();
        let buf = RgbaBuffer::new(16, 16, pixels);
        let h = histogram::build(&buf, true);
        let result = reduce(&h, 6);
        assert!(result.len() <= 6 && !result.is_empty());
    }

    #[test]
    fn zero_variance_axis_does_not_panic() {
        // All colors identical along every axis: covariance is the zero
        // matrix, exercising the eigenvector fallback.
        let pixels = vec![Color::new(7, 7, 7); 9];
        let buf = RgbaBuffer::new(3, 3, pixels);
        let h = histogram::build(&buf, true);
        let result = reduce(&h, 5);
        assert_eq!(result, vec![Color::new(7, 7, 7)]);
    }
}
