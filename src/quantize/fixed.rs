//! Fixed palette "quantizers": literal color tables, ignoring
//! the histogram entirely. Uniqueness and N-padding are still enforced by
//! the `reduce` facade in `quantize::mod`.

use super::ReduceColors;
use crate::color::Color;
use crate::histogram::Histogram;
use crate::palette;

pub struct Ega16;
impl ReduceColors for Ega16 {
    fn reduce_raw(&self, _histogram: &Histogram, _n: usize) -> Vec<Color> {
        ega_16()
    }
}

pub struct Vga256;
impl ReduceColors for Vga256 {
    fn reduce_raw(&self, _histogram: &Histogram, _n: usize) -> Vec<Color> {
        vga_256()
    }
}

pub struct WebSafe;
impl ReduceColors for WebSafe {
    fn reduce_raw(&self, _histogram: &Histogram, _n: usize) -> Vec<Color> {
        web_safe()
    }
}

pub struct Mac8Bit;
impl ReduceColors for Mac8Bit {
    fn reduce_raw(&self, _histogram: &Histogram, _n: usize) -> Vec<Color> {
        mac_8bit()
    }
}

pub fn ega_16() -> Vec<Color> {
    palette::EGA_16.iter().map(|&rgb| Color::from(rgb)).collect()
}

pub fn vga_256() -> Vec<Color> {
    palette::vga_256()
}

pub fn web_safe() -> Vec<Color> {
    palette::web_safe_216()
}

pub fn mac_8bit() -> Vec<Color> {
    palette::mac_8bit()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ega_has_sixteen_entries() {
        assert_eq!(ega_16().len(), 16);
    }

    #[test]
    fn vga_has_256_entries() {
        assert_eq!(vga_256().len(), 256);
    }
}
