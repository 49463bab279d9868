//! The [`Palette`] type: an ordered, length-bounded sequence of colors
//! forming a local or global GIF color table.

use crate::color::Color;

/// An ordered sequence of up to 256 colors. Insertion order is significant —
/// it is emitted verbatim as the GIF color table.
#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub struct Palette(Vec<Color>);

impl Palette {
    pub fn new(colors: Vec<Color>) -> Self {
        Palette(colors)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn colors(&self) -> &[Color] {
        &self.0
    }

    pub fn get(&self, index: u8) -> Option<Color> {
        self.0.get(index as usize).copied()
    }

    pub fn push(&mut self, color: Color) {
        self.0.push(color);
    }

    pub fn into_vec(self) -> Vec<Color> {
        self.0
    }

    /// Pads the palette up to `n` entries using a deterministic fallback
    /// ramp (grayscale, evenly spaced), skipping any value already present
    /// so uniqueness is preserved. Used by quantizer wrappers to satisfy
    /// their exact-length post-condition.
    pub fn pad_to(&mut self, n: usize) {
        if self.0.len() >= n {
            return;
        }
        let mut seen: std::collections::HashSet<u32> =
            self.0.iter().map(|c| c.to_argb()).collect();
        let mut step = 0u32;
        while self.0.len() < n {
            // Walk a 6x6x6 web-safe-like cube until an unused color turns up;
            // this always terminates well before step exhausts u8 range^3
            // for any n <= 256.
            let idx = step as usize;
            let r = ((idx / 36) % 6 * 51) as u8;
            let g = ((idx / 6) % 6 * 51) as u8;
            let b = (idx % 6 * 51) as u8;
            let candidate = Color::new(r, g, b);
            step += 1;
            if seen.insert(candidate.to_argb()) {
                self.0.push(candidate);
            }
            if step > 10_000 {
                // Exhausted the cube (should not happen for n <= 256); fall
                // back to literal gray ramp with a tie-breaking low bit.
                let gray = (self.0.len() % 256) as u8;
                self.0.push(Color::new(gray, gray, gray.wrapping_add(1)));
            }
        }
    }

    /// Deduplicates entries by 32-bit ARGB value, preserving first-seen
    /// order.
    pub fn dedup_by_argb(&mut self) {
        let mut seen = std::collections::HashSet::new();
        self.0.retain(|c| seen.insert(c.to_argb()));
    }
}

impl From<Vec<Color>> for Palette {
    fn from(v: Vec<Color>) -> Self {
        Palette(v)
    }
}

impl std::ops::Index<usize> for Palette {
    type Output = Color;
    fn index(&self, i: usize) -> &Color {
        &self.0[i]
    }
}

/// 16-color EGA standard palette.
pub const EGA_16: [[u8; 3]; 16] = [
    [0x00, 0x00, 0x00],
    [0x00, 0x00, 0xAA],
    [0x00, 0xAA, 0x00],
    [0x00, 0xAA, 0xAA],
    [0xAA, 0x00, 0x00],
    [0xAA, 0x00, 0xAA],
    [0xAA, 0x55, 0x00],
    [0xAA, 0xAA, 0xAA],
    [0x55, 0x55, 0x55],
    [0x55, 0x55, 0xFF],
    [0x55, 0xFF, 0x55],
    [0x55, 0xFF, 0xFF],
    [0xFF, 0x55, 0x55],
    [0xFF, 0x55, 0xFF],
    [0xFF, 0xFF, 0x55],
    [0xFF, 0xFF, 0xFF],
];

/// Web-safe 216-color palette: all combinations of {0,51,...,255}^3.
pub fn web_safe_216() -> Vec<Color> {
    let mut out = Vec::with_capacity(216);
    for r in 0..6 {
        for g in 0..6 {
            for b in 0..6 {
                out.push(Color::new(r * 51, g * 51, b * 51));
            }
        }
    }
    out
}

/// 256-color VGA default palette: the 16 EGA colors, the web-safe 216 cube,
/// and a 24-step grayscale ramp filling out the rest (standard VGA mode 13h
/// layout).
pub fn vga_256() -> Vec<Color> {
    let mut out = Vec::with_capacity(256);
    out.extend(EGA_16.iter().map(|&rgb| Color::from(rgb)));
    out.extend(web_safe_216());
    for i in 0..24 {
        let v = (i * 255 / 23) as u8;
        out.push(Color::new(v, v, v));
    }
    out.truncate(256);
    out
}

/// Classic 8-bit Macintosh system palette (Apple's default indexed palette,
/// a 6-6-6 color cube plus grays, distinct ordering from web-safe).
pub fn mac_8bit() -> Vec<Color> {
    let mut out = Vec::with_capacity(256);
    // 215 colors from a reordered 6-level-per-channel cube (classic Mac
    // ordering walks blue fastest, then red, then green, descending).
    for r in (0..6).rev() {
        for g in (0..6).rev() {
            for b in (0..6).rev() {
                out.push(Color::new(r * 51, g * 51, b * 51));
            }
        }
    }
    out.truncate(256);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn web_safe_has_216_unique_colors() {
        let colors = web_safe_216();
        assert_eq!(colors.len(), 216);
        let unique: std::collections::HashSet<_> = colors.iter().map(|c| c.to_argb()).collect();
        assert_eq!(unique.len(), 216);
    }

    #[test]
    fn pad_to_reaches_target_length_and_stays_unique() {
        let mut p = Palette::new(vec![Color::new(0, 0, 0)]);
        p.pad_to(40);
        assert_eq!(p.len(), 40);
        let mut seen = std::collections::HashSet::new();
        assert!(p.colors().iter().all(|c| seen.insert(c.to_argb())));
    }
}
