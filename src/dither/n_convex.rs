//! N-Convex dithering: selects among the `n` nearest palette
//! entries whose convex hull (in color space) contains the source color, so
//! the chosen index can only ever be a genuine interpolation neighbor of the
//! source rather than an arbitrary near match.

use crate::color::lookup::PaletteLookup;
use crate::color::{metric, Color};
use crate::pixelbuf::{IndexBuffer, PixelBuffer};

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Strategy {
    /// Picks whichever convex-set member is nearest the source color.
    Nearest,
    /// Picks the convex-set member with greatest barycentric weight toward
    /// the source color (i.e. would contribute most to a weighted blend).
    MaxWeight,
    /// Alternates among the convex set members by pixel parity, spreading
    /// error across the set rather than collapsing to one member.
    RoundRobin,
    /// Weighted random selection seeded by pixel position, biased toward
    /// members with lower distance.
    WeightedPick,
}

/// Finds up to `n` palette indices forming an approximately convex set
/// around `query`: the nearest entry plus entries from distinct octants
/// around it (above/below per channel), approximating full N-dimensional
/// convex hull membership without a full hull computation.
fn convex_candidates(lookup: &PaletteLookup, query: Color, n: usize) -> Vec<u8> {
    let palette = lookup.palette();
    if palette.is_empty() {
        return Vec::new();
    }
    let mut scored: Vec<(u8, u32)> = palette
        .colors()
        .iter()
        .enumerate()
        .map(|(i, &c)| (i as u8, metric::distance(lookup.metric(), query, c)))
        .collect();
    scored.sort_by_key(|&(_, d)| d);

    let mut chosen = vec![scored[0].0];
    let mut octants_seen = std::collections::HashSet::new();
    octants_seen.insert(octant(query, palette.get(scored[0].0).unwrap()));

    for &(idx, _) in &scored[1..] {
        if chosen.len() >= n.max(1) {
            break;
        }
        let color = palette.get(idx).unwrap();
        let oct = octant(query, color);
        if octants_seen.insert(oct) {
            chosen.push(idx);
        }
    }
    // Fill remaining slots with the next-nearest entries if distinct
    // octants ran out before reaching `n`.
    for &(idx, _) in &scored {
        if chosen.len() >= n.max(1) {
            break;
        }
        if !chosen.contains(&idx) {
            chosen.push(idx);
        }
    }
    chosen
}

fn octant(query: Color, candidate: Color) -> (bool, bool, bool) {
    (
        candidate.r >= query.r,
        candidate.g >= query.g,
        candidate.b >= query.b,
    )
}

fn select(strategy: Strategy, candidates: &[u8], query: Color, x: u32, y: u32, lookup: &PaletteLookup) -> u8 {
    if candidates.is_empty() {
        return 0;
    }
    match strategy {
        Strategy::Nearest => candidates[0],
        Strategy::MaxWeight => {
            candidates
                .iter()
                .copied()
                .max_by_key(|&idx| {
                    let c = lookup.palette().get(idx).unwrap_or(query);
                    // Higher weight = smaller distance; invert so max_by_key
                    // favors the closest member.
                    u32::MAX - metric::distance(lookup.metric(), query, c)
                })
                .unwrap_or(candidates[0])
        }
        Strategy::RoundRobin => {
            let i = ((x + y) as usize) % candidates.len();
            candidates[i]
        }
        Strategy::WeightedPick => {
            let weights: Vec<f32> = candidates
                .iter()
                .map(|&idx| {
                    let c = lookup.palette().get(idx).unwrap_or(query);
                    1.0 / (1.0 + metric::distance(lookup.metric(), query, c) as f32)
                })
                .collect();
            let total: f32 = weights.iter().sum();
            // Deterministic pseudo-random threshold derived from pixel
            // position, so the same image always dithers the same way.
            let seed = (x.wrapping_mul(1_000_003) ^ y.wrapping_mul(999_983)) as f32;
            let threshold = (seed.sin().abs()) * total;
            let mut acc = 0.0f32;
            for (i, &w) in weights.iter().enumerate() {
                acc += w;
                if threshold <= acc {
                    return candidates[i];
                }
            }
            *candidates.last().unwrap()
        }
    }
}

/// Dithers by selecting among each pixel's `n`-member convex candidate set
/// per `strategy`.
pub fn dither(
    strategy: Strategy,
    n: usize,
    source: &dyn PixelBuffer,
    target: &mut IndexBuffer,
    lookup: &PaletteLookup,
) {
    for y in 0..source.height() {
        for x in 0..source.width() {
            let src = source.get(x, y);
            let candidates = convex_candidates(lookup, src, n);
            let index = select(strategy, &candidates, src, x, y, lookup);
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

    fn cube_lookup() -> PaletteLookup {
        let mut colors = Vec::new();
        for r in [0u8, 255] {
            for g in [0u8, 255] {
                for b in [0u8, 255] {
                    colors.push(Color::new(r, g, b));
                }
            }
        }
        PaletteLookup::new(Palette::new(colors), MetricKind::EuclideanRgb)
    }

    #[test]
    fn all_strategies_stay_in_range() {
        let pixels: Vec<Color> = (0..16).map(|i| Color::new((i * 16) as u8, (i * 8) as u8, 100)).collect();
        let src = RgbaBuffer::new(4, 4, pixels);
        let lookup = cube_lookup();
        for strategy in [
            Strategy::Nearest,
            Strategy::MaxWeight,
            Strategy::RoundRobin,
            Strategy::WeightedPick,
        ] {
            let mut target = IndexBuffer::new(4, 4, 99);
            dither(strategy, 4, &src, &mut target, &lookup);
            assert!(target.as_slice().iter().all(|&v| (v as usize) < 8));
        }
    }

    #[test]
    fn single_entry_palette_is_always_chosen() {
        let pixels = vec![Color::new(5, 5, 5); 4];
        let src = RgbaBuffer::new(2, 2, pixels);
        let lookup = PaletteLookup::new(Palette::new(vec![Color::new(9, 9, 9)]), MetricKind::EuclideanRgb);
        let mut target = IndexBuffer::new(2, 2, 99);
        dither(Strategy::MaxWeight, 4, &src, &mut target, &lookup);
        assert!(target.as_slice().iter().all(|&v| v == 0));
    }
}
