//! Nearest-palette-index lookup.

use super::metric::{self, MetricKind};
use super::Color;
use crate::palette::Palette;
use std::collections::HashMap;
use std::sync::Mutex;

/// Finds the palette index nearest a query color under a configured metric.
///
/// Exact matches are served from a memoized table built at construction.
/// Everything else falls through to a linear scan with early-exit once a
/// distance of `<= 1` is found. The scan result is cached behind
/// a mutex: nothing in this crate shares a `PaletteLookup` across threads
/// today, but the cache stays safe to share if a caller ever does.
pub struct PaletteLookup {
    palette: Palette,
    metric: MetricKind,
    exact: HashMap<u32, u8>,
    cache: Mutex<HashMap<u32, u8>>,
}

impl PaletteLookup {
    pub fn new(palette: Palette, metric: MetricKind) -> Self {
        let mut exact = HashMap::with_capacity(palette.len());
        for (i, c) in palette.colors().iter().enumerate() {
            // First occurrence wins if the palette (unusually) contains
            // duplicate colors.
            exact.entry(c.to_argb()).or_insert(i as u8);
        }
        PaletteLookup {
            palette,
            metric,
            exact,
            cache: Mutex::new(HashMap::new()),
        }
    }

    pub fn palette(&self) -> &Palette {
        &self.palette
    }

    pub fn metric(&self) -> MetricKind {
        self.metric
    }

    /// Returns the index of the palette entry closest to `query`. Behavior
    /// is pure: the same palette and query always yield the same index.
    pub fn find_closest(&self, query: Color) -> u8 {
        if let Some(&idx) = self.exact.get(&query.to_argb()) {
            return idx;
        }
        if let Ok(cache) = self.cache.lock() {
            if let Some(&idx) = cache.get(&query.to_argb()) {
                return idx;
            }
        }

        let mut best_idx = 0u8;
        let mut best_dist = u32::MAX;
        for (i, &c) in self.palette.colors().iter().enumerate() {
            let d = metric::distance(self.metric, query, c);
            if d < best_dist {
                best_dist = d;
                best_idx = i as u8;
                if d <= 1 {
                    break;
                }
            }
        }

        if let Ok(mut cache) = self.cache.lock() {
            cache.insert(query.to_argb(), best_idx);
        }
        best_idx
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_match_short_circuits() {
        let palette = Palette::new(vec![Color::new(0, 0, 0), Color::new(255, 255, 255)]);
        let lookup = PaletteLookup::new(palette, MetricKind::EuclideanRgb);
        assert_eq!(lookup.find_closest(Color::new(255, 255, 255)), 1);
        assert_eq!(lookup.find_closest(Color::new(0, 0, 0)), 0);
    }

    #[test]
    fn nearest_of_two() {
        let palette = Palette::new(vec![Color::new(0, 0, 0), Color::new(255, 255, 255)]);
        let lookup = PaletteLookup::new(palette, MetricKind::EuclideanRgb);
        assert_eq!(lookup.find_closest(Color::new(10, 10, 10)), 0);
        assert_eq!(lookup.find_closest(Color::new(250, 250, 250)), 1);
    }

    #[test]
    fn deterministic_across_calls() {
        let palette = Palette::new(vec![
            Color::new(10, 10, 10),
            Color::new(200, 10, 10),
            Color::new(10, 200, 10),
        ]);
        let lookup = PaletteLookup::new(palette, MetricKind::CompuPhase);
        let q = Color::new(100, 90, 80);
        let first = lookup.find_closest(q);
        for _ in 0..10 {
            assert_eq!(lookup.find_closest(q), first);
        }
    }
}
