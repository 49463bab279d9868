//! PCA-preprocess quantizer wrapper: transforms colors into
//! their principal-component basis, runs the wrapped quantizer there, then
//! inverse-transforms the result back into RGB.
//!
//! Robust to zero variance along any axis (a degenerate, e.g. single-hue,
//! source image): any axis whose projected range collapses to a point is
//! mapped to a constant mid-level instead of dividing by zero.

use super::support::{covariance, dominant_eigenvector, weighted_colors};
use super::ReduceColors;
use crate::color::Color;
use crate::histogram::Histogram;

/// Three mutually orthogonal axes spanning color space, ordered by
/// explained variance (axis 0 = principal component).
fn principal_axes(colors: &[super::support::WeightedColor]) -> ([f64; 3], [[f64; 3]; 3]) {
    let (mean, cov) = covariance(colors);
    let v1 = dominant_eigenvector(cov);

    // Deflate: remove the v1 component's contribution and find the next
    // dominant direction in the remaining subspace.
    let lambda1 = {
        let mv = mat_vec(cov, v1);
        dot(v1, mv)
    };
    let deflated = sub_outer(cov, v1, lambda1);
    let v2_raw = dominant_eigenvector(deflated);
    // Orthogonalize against v1 defensively (power iteration on the deflated
    // matrix should already be orthogonal, but guards numerical drift).
    let v2 = normalize(sub(v2_raw, scale(v1, dot(v1, v2_raw))));
    let v3 = cross(v1, v2);

    (mean, [v1, v2, v3])
}

fn mat_vec(m: [[f64; 3]; 3], v: [f64; 3]) -> [f64; 3] {
    [
        m[0][0] * v[0] + m[0][1] * v[1] + m[0][2] * v[2],
        m[1][0] * v[0] + m[1][1] * v[1] + m[1][2] * v[2],
        m[2][0] * v[0] + m[2][1] * v[1] + m[2][2] * v[2],
    ]
}

fn dot(a: [f64; 3], b: [f64; 3]) -> f64 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}

fn sub(a: [f64; 3], b: [f64; 3]) -> [f64; 3] {
    [a[0] - b[0], a[1] - b[1], a[2] - b[2]]
}

fn scale(a: [f64; 3], s: f64) -> [f64; 3] {
    [a[0] * s, a[1] * s, a[2] * s]
}

fn cross(a: [f64; 3], b: [f64; 3]) -> [f64; 3] {
    [
        a[1] * b[2] - a[2] * b[1],
        a[2] * b[0] - a[0] * b[2],
        a[0] * b[1] - a[1] * b[0],
    ]
}

fn normalize(v: [f64; 3]) -> [f64; 3] {
    let n = dot(v, v).sqrt();
    if n < 1e-12 {
        [0.0, 1.0, 0.0]
    } else {
        scale(v, 1.0 / n)
    }
}

fn sub_outer(m: [[f64; 3]; 3], v: [f64; 3], lambda: f64) -> [[f64; 3]; 3] {
    let mut out = m;
    for i in 0..3 {
        for j in 0..3 {
            out[i][j] -= lambda * v[i] * v[j];
        }
    }
    out
}

/// Runs `inner` after projecting the histogram into PCA space, then maps
/// the result back to RGB.
pub fn reduce(inner: &dyn ReduceColors, histogram: &Histogram, n: usize) -> Vec<Color> {
    let members = weighted_colors(histogram);
    if members.is_empty() || n == 0 {
        return Vec::new();
    }

    let (mean, axes) = principal_axes(&members);

    let project = |c: Color| -> [f64; 3] {
        let centered = [
            c.r as f64 - mean[0],
            c.g as f64 - mean[1],
            c.b as f64 - mean[2],
        ];
        [dot(centered, axes[0]), dot(centered, axes[1]), dot(centered, axes[2])]
    };

    let projected: Vec<[f64; 3]> = members.iter().map(|m| project(m.color)).collect();

    // Per-axis range, guarding the zero-variance case (division by zero).
    let mut lo = [f64::MAX; 3];
    let mut hi = [f64::MIN; 3];
    for p in &projected {
        for axis in 0..3 {
            lo[axis] = lo[axis].min(p[axis]);
            hi[axis] = hi[axis].max(p[axis]);
        }
    }
    let span: [f64; 3] = std::array::from_fn(|axis| {
        let s = hi[axis] - lo[axis];
        if s.abs() < 1e-9 {
            1.0
        } else {
            s
        }
    });

    let encode = |axis: usize, v: f64| -> u8 {
        if hi[axis] - lo[axis] < 1e-9 {
            128
        } else {
            (((v - lo[axis]) / span[axis]) * 255.0).round().clamp(0.0, 255.0) as u8
        }
    };

    let transformed_colors: Vec<(Color, u32)> = members
        .iter()
        .zip(projected.iter())
        .map(|(m, p)| {
            (
                Color::new(encode(0, p[0]), encode(1, p[1]), encode(2, p[2])),
                m.weight,
            )
        })
        .collect();
    let transformed_histogram = Histogram::from_counts(transformed_colors);

    let inner_palette = inner.reduce_raw(&transformed_histogram, n);

    let decode = |axis: usize, v: u8| -> f64 {
        if hi[axis] - lo[axis] < 1e-9 {
            lo[axis]
        } else {
            lo[axis] + (v as f64 / 255.0) * span[axis]
        }
    };

    inner_palette
        .into_iter()
        .map(|c| {
            let coords = [decode(0, c.r), decode(1, c.g), decode(2, c.b)];
            let rgb = [
                mean[0] + coords[0] * axes[0][0] + coords[1] * axes[1][0] + coords[2] * axes[2][0],
                mean[1] + coords[0] * axes[0][1] + coords[1] * axes[1][1] + coords[2] * axes[2][1],
                mean[2] + coords[0] * axes[0][2] + coords[1] * axes[1][2] + coords[2] * axes[2][2],
            ];
            Color::new(
                rgb[0].round().clamp(0.0, 255.0) as u8,
                rgb[1].round().clamp(0.0, 255.0) as u8,
                rgb[2].round().clamp(0.0, 255.0) as u8,
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::histogram;
    use crate::pixelbuf::RgbaBuffer;
    use crate::quantize::median_cut::MedianCut;

    #[test]
    fn wraps_inner_quantizer_without_panicking_on_zero_variance() {
        let pixels = vec![Color::new(40, 40, 40); 9];
        let buf = RgbaBuffer::new(3, 3, pixels);
        let h = histogram::build(&buf, true);
        let result = reduce(&MedianCut, &h, 3);
        assert_eq!(result, vec![Color::new(40, 40, 40)]);
    }

    #[test]
    fn preserves_upper_bound_on_varied_input() {
        let pixels: Vec<Color> = (0..256u32)
            .map(|i| Color::new(i as u8, (i * 2 % 256) as u8, (i * 9 % 256) as u8))
            .collect();
        let buf = RgbaBuffer::new(16, 16, pixels);
        let h = histogram::build(&buf, true);
        let result = reduce(&MedianCut, &h, 10);
        assert!(result.len() <= 10 && !result.is_empty());
    }
}
