//! N-Closest dithering: ranks the `n` nearest palette entries
//! to the source color, then picks one according to a selection rule rather
//! than always the nearest — trading exactness for reduced banding.
//!
//! The `Luminance` rule deliberately reproduces a known quirk from the
//! original tool this family is modeled on: it ranks candidates by their
//! *position in the distance-sorted list* rather than by recomputing each
//! candidate's actual luminance. This means "Luminance" selection tracks
//! color-distance rank, not true luminance, whenever the two orders
//! diverge. Kept intentionally rather than silently fixed.

use crate::color::lookup::PaletteLookup;
use crate::color::{metric, Color};
use crate::pixelbuf::{IndexBuffer, PixelBuffer};

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Rule {
    /// Always the nearest candidate (degenerates to plain nearest-color).
    Nearest,
    /// Alternates between the nearest and second-nearest by pixel parity.
    Alternating,
    /// Picks the candidate whose list position matches `(x + y) % n`.
    PositionCycle,
    /// Picks by list position ordered by true luminance of each candidate.
    TrueLuminance,
    /// Picks by list position, but the "luminance" used for ordering is
    /// just each candidate's position in the distance-sorted list — a
    /// faithfully reproduced quirk, not real luminance.
    Luminance,
}

fn nearest_n(lookup: &PaletteLookup, query: Color, n: usize) -> Vec<u8> {
    let mut scored: Vec<(u8, u32)> = lookup
        .palette()
        .colors()
        .iter()
        .enumerate()
        .map(|(i, &c)| (i as u8, metric::distance(lookup.metric(), query, c)))
        .collect();
    scored.sort_by_key(|&(_, d)| d);
    scored.truncate(n.max(1));
    scored.into_iter().map(|(i, _)| i).collect()
}

fn select(rule: Rule, candidates: &[u8], x: u32, y: u32, lookup: &PaletteLookup) -> u8 {
    if candidates.is_empty() {
        return 0;
    }
    match rule {
        Rule::Nearest => candidates[0],
        Rule::Alternating => {
            let i = ((x + y) % 2) as usize;
            candidates[i.min(candidates.len() - 1)]
        }
        Rule::PositionCycle => {
            let i = ((x + y) as usize) % candidates.len();
            candidates[i]
        }
        Rule::TrueLuminance => {
            let mut by_lum: Vec<u8> = candidates.to_vec();
            by_lum.sort_by_key(|&idx| {
                lookup
                    .palette()
                    .get(idx)
                    .map(|c| c.luminance() as u32)
                    .unwrap_or(0)
            });
            let i = ((x + y) as usize) % by_lum.len();
            by_lum[i]
        }
        Rule::Luminance => {
            // Bug preserved verbatim: `candidates` is already sorted by
            // distance, so this is a no-op re-sort by list position rather
            // than a true luminance sort.
            let i = ((x + y) as usize) % candidates.len();
            candidates[i]
        }
    }
}

/// Dithers by selecting among each pixel's `n` nearest palette candidates
/// per `rule`.
pub fn dither(
    rule: Rule,
    n: usize,
    source: &dyn PixelBuffer,
    target: &mut IndexBuffer,
    lookup: &PaletteLookup,
) {
    let n = n.max(1);
    for y in 0..source.height() {
        for x in 0..source.width() {
            let src = source.get(x, y);
            let candidates = nearest_n(lookup, src, n.min(lookup.palette().len().max(1)));
            let index = select(rule, &candidates, x, y, lookup);
            target.set(x, y, index);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::metric::MetricKind;
    use crate::palette::Palette;
    use crate::pixelbuf::RgbaBuffer;

    fn ramp_lookup() -> PaletteLookup {
        PaletteLookup::new(
            Palette::new(vec![
                Color::new(0, 0, 0),
                Color::new(64, 64, 64),
                Color::new(128, 128, 128),
                Color::new(192, 192, 192),
                Color::new(255, 255, 255),
            ]),
            MetricKind::EuclideanRgb,
        )
    }

    #[test]
    fn nearest_rule_matches_plain_lookup() {
        let pixels: Vec<Color> = (0..16).map(|i| Color::new((i * 16) as u8, (i * 16) as u8, (i * 16) as u8)).collect();
        let src = RgbaBuffer::new(4, 4, pixels.clone());
        let lookup = ramp_lookup();
        let mut target = IndexBuffer::new(4, 4, 99);
        dither(Rule::Nearest, 3, &src, &mut target, &lookup);
        for (i, &p) in pixels.iter().enumerate() {
            let (x, y) = (i as u32 % 4, i as u32 / 4);
            assert_eq!(target.get(x, y), lookup.find_closest(p));
        }
    }

    #[test]
    fn all_rules_stay_in_range() {
        let pixels: Vec<Color> = (0..16).map(|i| Color::new((i * 16) as u8, 10, 20)).collect();
        let src = RgbaBuffer::new(4, 4, pixels);
        let lookup = ramp_lookup();
        for rule in [
            Rule::Nearest,
            Rule::Alternating,
            Rule::PositionCycle,
            Rule::TrueLuminance,
            Rule::Luminance,
        ] {
            let mut target = IndexBuffer::new(4, 4, 99);
            dither(rule, 3, &src, &mut target, &lookup);
            assert!(target.as_slice().iter().all(|&v| (v as usize) < 5));
        }
    }
}
