//! Histogram builder: scans a pixel buffer into a mapping from
//! distinct color to occurrence count plus the coordinates it occurred at.

use crate::color::Color;
use crate::pixelbuf::PixelBuffer;
use itertools::Itertools;
use rayon::prelude::*;
use std::collections::HashMap;

/// Occurrence count and pixel coordinates for one distinct color.
#[derive(Debug, Clone, Default)]
pub struct ColorEntry {
    pub count: u32,
    pub coords: Vec<(u16, u16)>,
}

/// `Color -> (count, coordinates)`, built once per conversion.
#[derive(Debug, Clone, Default)]
pub struct Histogram(HashMap<u32, ColorEntry>);

impl Histogram {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Color, &ColorEntry)> {
        self.0.iter().map(|(&argb, entry)| (Color::from_argb(argb), entry))
    }

    pub fn get(&self, color: Color) -> Option<&ColorEntry> {
        self.0.get(&color.to_argb())
    }

    /// Colors sorted by descending occurrence count, ties broken by ARGB
    /// value for determinism.
    pub fn colors_by_count_desc(&self) -> Vec<Color> {
        self.iter()
            .map(|(c, e)| (c, e.count))
            .sorted_by(|a, b| b.1.cmp(&a.1).then(a.0.to_argb().cmp(&b.0.to_argb())))
            .map(|(c, _)| c)
            .collect()
    }

    /// Builds a histogram directly from (color, count) pairs with no
    /// coordinate information. Used by quantizer wrappers that need to feed
    /// a synthetic, transformed color set (e.g. a PCA-projected space) to
    /// an inner quantizer that only consumes weighted colors.
    pub fn from_counts(colors: impl IntoIterator<Item = (Color, u32)>) -> Self {
        let mut map = HashMap::new();
        for (color, count) in colors {
            let entry: &mut ColorEntry = map.entry(color.to_argb()).or_default();
            entry.count += count;
        }
        Histogram(map)
    }

    fn merge(&mut self, other: HashMap<u32, ColorEntry>) {
        for (argb, mut entry) in other {
            self.0
                .entry(argb)
                .and_modify(|e| {
                    e.count += entry.count;
                    e.coords.append(&mut entry.coords);
                })
                .or_insert(entry);
        }
    }
}

/// Minimum rows per stripe; below this, data-parallelism overhead is not
/// worth it and the whole image is scanned on the calling thread.
const MIN_ROWS_PER_STRIPE: u32 = 32;

/// Builds a histogram by scanning `buf` in parallel horizontal stripes, each
/// accumulating a thread-local map, merged afterward. Coordinates per color
/// are preserved losslessly across the merge.
///
/// When `opaque_only` is true, alpha is dropped from the key (only RGB
/// participates), for sources where alpha is unused.
pub fn build<B: PixelBuffer + Sync>(buf: &B, opaque_only: bool) -> Histogram {
    let height = buf.height();
    let width = buf.width();
    if width == 0 || height == 0 {
        return Histogram::default();
    }

    let stripe_rows = MIN_ROWS_PER_STRIPE.max(1);
    let stripe_count = (height + stripe_rows - 1) / stripe_rows;

    let partials: Vec<HashMap<u32, ColorEntry>> = (0..stripe_count)
        .into_par_iter()
        .map(|stripe| {
            let y0 = stripe * stripe_rows;
            let y1 = (y0 + stripe_rows).min(height);
            let mut local: HashMap<u32, ColorEntry> = HashMap::new();
            for y in y0..y1 {
                for x in 0..width {
                    let mut c = buf.get(x, y);
                    if opaque_only {
                        c.a = 255;
                    }
                    let entry = local.entry(c.to_argb()).or_default();
                    entry.count += 1;
                    entry.coords.push((x as u16, y as u16));
                }
            }
            local
        })
        .collect();

    let mut histogram = Histogram::default();
    for partial in partials {
        histogram.merge(partial);
    }
    histogram
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pixelbuf::RgbaBuffer;

    #[test]
    fn counts_and_coordinates_are_lossless() {
        let pixels = vec![
            Color::new(1, 0, 0),
            Color::new(1, 0, 0),
            Color::new(2, 0, 0),
            Color::new(1, 0, 0),
        ];
        let buf = RgbaBuffer::new(2, 2, pixels);
        let h = build(&buf, true);
        assert_eq!(h.len(), 2);
        let red1 = h.get(Color::new(1, 0, 0)).unwrap();
        assert_eq!(red1.count, 3);
        let mut coords = red1.coords.clone();
        coords.sort();
        assert_eq!(coords, vec![(0, 0), (1, 0), (0, 1)]);
    }

    #[test]
    fn stripes_merge_across_boundary() {
        // Build a tall image so multiple stripes are produced, and check the
        // total count is preserved exactly.
        let height = 200u32;
        let width = 3u32;
        let pixels: Vec<Color> = (0..(height * width))
            .map(|i| Color::new((i % 7) as u8, 0, 0))
            .collect();
        let buf = RgbaBuffer::new(width, height, pixels);
        let h = build(&buf, true);
        let total: u32 = h.iter().map(|(_, e)| e.count).sum();
        assert_eq!(total, height * width);
    }

    #[test]
    fn colors_by_count_desc_orders_correctly() {
        let pixels = vec![
            Color::new(1, 0, 0),
            Color::new(2, 0, 0),
            Color::new(2, 0, 0),
            Color::new(2, 0, 0),
        ];
        let buf = RgbaBuffer::new(2, 2, pixels);
        let h = build(&buf, true);
        let ordered = h.colors_by_count_desc();
        assert_eq!(ordered[0], Color::new(2, 0, 0));
    }
}
