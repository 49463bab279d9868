//! Sub-image planner: partitions the full palette across a
//! sequence of sub-image plans, each carrying its own 256-entry-or-fewer
//! palette and a mask of which pixels it paints.

use crate::color::metric::MetricKind;
use crate::color::Color;
use crate::histogram::Histogram;
use crate::palette::Palette;
use crate::pixelbuf::PixelBuffer;
use std::str::FromStr;

/// How distinct source colors are ordered before being sliced into
/// per-sub-image groups.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum ColorOrdering {
    MostUsedFirst,
    LeastUsedFirst,
    HighLuminanceFirst,
    LowLuminanceFirst,
    FromCenter,
    Random,
}

impl Default for ColorOrdering {
    fn default() -> Self {
        ColorOrdering::MostUsedFirst
    }
}

#[derive(Debug, Default, Copy, Clone, Eq, PartialEq)]
pub struct ColorOrderingParseError;

impl std::fmt::Display for ColorOrderingParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("invalid color ordering name")
    }
}
impl std::error::Error for ColorOrderingParseError {}

impl FromStr for ColorOrdering {
    type Err = ColorOrderingParseError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace(['_', ' '], "-").as_str() {
            "mostusedfirst" | "most-used-first" => Ok(ColorOrdering::MostUsedFirst),
            "leastusedfirst" | "least-used-first" => Ok(ColorOrdering::LeastUsedFirst),
            "highluminancefirst" | "high-luminance-first" => Ok(ColorOrdering::HighLuminanceFirst),
            "lowluminancefirst" | "low-luminance-first" => Ok(ColorOrdering::LowLuminanceFirst),
            "fromcenter" | "from-center" => Ok(ColorOrdering::FromCenter),
            "random" => Ok(ColorOrdering::Random),
            _ => Err(ColorOrderingParseError),
        }
    }
}

/// Planner-level options.
#[derive(Debug, Clone, Copy)]
pub struct PlanOptions {
    pub color_ordering: ColorOrdering,
    pub first_sub_image_inits_background: bool,
    pub use_back_filling: bool,
    pub metric: MetricKind,
    /// Seed for `ColorOrdering::Random`'s shuffle.
    pub random_seed: u64,
}

impl Default for PlanOptions {
    fn default() -> Self {
        PlanOptions {
            color_ordering: ColorOrdering::default(),
            first_sub_image_inits_background: true,
            use_back_filling: false,
            metric: MetricKind::default(),
            random_seed: 0,
        }
    }
}

/// A bit-per-pixel mask of which pixels a sub-image paints opaquely,
/// row-major with `x` fastest.
#[derive(Debug, Clone)]
pub struct PixelMask {
    width: u32,
    height: u32,
    bits: Vec<bool>,
}

impl PixelMask {
    pub(crate) fn new(width: u32, height: u32) -> Self {
        PixelMask {
            width,
            height,
            bits: vec![false; (width as usize) * (height as usize)],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn get(&self, x: u32, y: u32) -> bool {
        self.bits[(y * self.width + x) as usize]
    }

    fn set(&mut self, x: u32, y: u32, v: bool) {
        self.bits[(y * self.width + x) as usize] = v;
    }

    pub fn any_active(&self) -> bool {
        self.bits.iter().any(|&b| b)
    }
}

/// One planned sub-image.
#[derive(Debug, Clone)]
pub struct SubImagePlan {
    pub palette: Palette,
    pub mask: PixelMask,
    /// `None` when this sub-image paints every pixel (the background
    /// initializer): there is no hole for transparency to fill.
    pub transparent_index: Option<u8>,
}

/// Produces the ordered sequence of sub-image plans for `source` and its
/// already-quantized full palette `full_palette`. `full_palette`
/// is consumed in insertion order: that order is what `color_ordering`
/// determines upstream, via [`order_colors`].
pub fn plan(source: &dyn PixelBuffer, histogram: &Histogram, options: &PlanOptions) -> Vec<SubImagePlan> {
    let width = source.width();
    let height = source.height();
    let ordered_colors = order_colors(source, histogram, options);
    if ordered_colors.is_empty() {
        return Vec::new();
    }

    let mut plans = Vec::new();
    let mut offset = 0usize;
    let mut sub_index = 0usize;

    while offset < ordered_colors.len() {
        let is_background = sub_index == 0 && options.first_sub_image_inits_background;
        let group_size = if is_background { 256 } else { 255 };
        let end = (offset + group_size).min(ordered_colors.len());
        let group: Vec<Color> = ordered_colors[offset..end].to_vec();
        offset = end;

        let mut palette_colors = group.clone();
        let transparent_index = if is_background {
            None
        } else {
            let idx = palette_colors.len() as u8;
            palette_colors.push(Color::default());
            Some(idx)
        };
        let palette = Palette::new(palette_colors);

        let mask = if is_background {
            let mut m = PixelMask::new(width, height);
            for y in 0..height {
                for x in 0..width {
                    m.set(x, y, true);
                }
            }
            m
        } else {
            build_mask(source, &group, options.use_back_filling)
        };

        plans.push(SubImagePlan {
            palette,
            mask,
            transparent_index,
        });
        sub_index += 1;
    }

    plans
}

/// Builds the active-pixel mask for a non-background sub-image: pixels
/// whose exact color falls in `group`, plus (when `back_fill` is set)
/// every other pixel too — back-filling paints the whole frame each time,
/// approximated against this sub-image's palette at dither time, and later
/// "do not dispose" sub-images simply overwrite earlier approximations
/// where they have an exact match.
fn build_mask(source: &dyn PixelBuffer, group: &[Color], back_fill: bool) -> PixelMask {
    let width = source.width();
    let height = source.height();
    let mut mask = PixelMask::new(width, height);
    let in_group: std::collections::HashSet<u32> = group.iter().map(|c| c.to_argb()).collect();

    for y in 0..height {
        for x in 0..width {
            let color = source.get(x, y);
            let exact = in_group.contains(&color.to_argb());
            if exact || back_fill {
                mask.set(x, y, true);
            }
        }
    }
    mask
}

/// Orders distinct histogram colors per `options.color_ordering`
///.
fn order_colors(source: &dyn PixelBuffer, histogram: &Histogram, options: &PlanOptions) -> Vec<Color> {
    match options.color_ordering {
        ColorOrdering::MostUsedFirst => histogram.colors_by_count_desc(),
        ColorOrdering::LeastUsedFirst => {
            let mut v = histogram.colors_by_count_desc();
            v.reverse();
            v
        }
        ColorOrdering::HighLuminanceFirst => {
            let mut v: Vec<Color> = histogram.iter().map(|(c, _)| c).collect();
            v.sort_by(|a, b| {
                b.luminance()
                    .partial_cmp(&a.luminance())
                    .unwrap_or(std::cmp::Ordering::Equal)
                    .then(a.to_argb().cmp(&b.to_argb()))
            });
            v
        }
        ColorOrdering::LowLuminanceFirst => {
            let mut v: Vec<Color> = histogram.iter().map(|(c, _)| c).collect();
            v.sort_by(|a, b| {
                a.luminance()
                    .partial_cmp(&b.luminance())
                    .unwrap_or(std::cmp::Ordering::Equal)
                    .then(a.to_argb().cmp(&b.to_argb()))
            });
            v
        }
        ColorOrdering::FromCenter => {
            let (cx, cy) = (source.width() as f32 / 2.0, source.height() as f32 / 2.0);
            let mut v: Vec<(Color, u64)> = histogram
                .iter()
                .map(|(c, entry)| {
                    let (fx, fy) = entry.coords.first().copied().unwrap_or((0, 0));
                    let dx = fx as f32 - cx;
                    let dy = fy as f32 - cy;
                    // Squared distance keeps this integer-comparable and
                    // avoids a sqrt per color.
                    ((dx * dx + dy * dy) as u64, c)
                })
                .map(|(d, c)| (c, d))
                .collect();
            v.sort_by(|a, b| a.1.cmp(&b.1).then(a.0.to_argb().cmp(&b.0.to_argb())));
            v.into_iter().map(|(c, _)| c).collect()
        }
        ColorOrdering::Random => {
            let mut v: Vec<Color> = histogram.iter().map(|(c, _)| c).collect();
            v.sort_by_key(|c| c.to_argb());
            shuffle(&mut v, options.random_seed);
            v
        }
    }
}

/// Deterministic seeded Fisher-Yates shuffle (xorshift64), avoiding a `rand`
/// dependency for the one caller that needs reproducible randomness.
fn shuffle<T>(items: &mut [T], seed: u64) {
    let mut state = seed | 1;
    let mut next = || {
        state ^= state << 13;
        state ^= state >> 7;
        state ^= state << 17;
        state
    };
    for i in (1..items.len()).rev() {
        let j = (next() as usize) % (i + 1);
        items.swap(i, j);
    }
}
