//! Error-diffusion (matrix-based) dithering.
//!
//! Each kernel is a set of `(dx, dy, weight)` offsets relative to the pixel
//! just quantized (dx, dy are both non-negative in scan direction; the
//! serpentine variant mirrors dx when scanning right-to-left) plus a
//! divisor. For each pixel in scan order: read source + accumulated error,
//! clamp to `[0,255]` per channel, find the nearest palette index, then
//! spread `(corrected - palette[index])` to not-yet-visited neighbors
//! weighted by `weight / divisor`.

use crate::color::lookup::PaletteLookup;
use crate::color::Color;
use crate::pixelbuf::{IndexBuffer, PixelBuffer};

/// One error-diffusion weight matrix.
#[derive(Debug, Clone, Copy)]
pub struct Kernel {
    pub offsets: &'static [(i32, i32, i32)],
    pub divisor: i32,
    /// Atkinson-style kernels discard the fractional remainder instead of
    /// propagating it forward.
    pub discard_remainder: bool,
}

macro_rules! kernel {
    ($name:ident, divisor = $div:expr, $($dx:expr, $dy:expr, $w:expr);+ $(;)?) => {
        pub const $name: Kernel = Kernel {
            offsets: &[$(($dx, $dy, $w)),+],
            divisor: $div,
            discard_remainder: false,
        };
    };
}

kernel!(FLOYD_STEINBERG, divisor = 16,
    1, 0, 7;
    -1, 1, 3;
    0, 1, 5;
    1, 1, 1;
);

kernel!(EQUAL_FLOYD_STEINBERG, divisor = 16,
    1, 0, 4;
    -1, 1, 4;
    0, 1, 4;
    1, 1, 4;
);

kernel!(FALSE_FLOYD_STEINBERG, divisor = 8,
    1, 0, 3;
    0, 1, 3;
    1, 1, 2;
);

kernel!(JARVIS_JUDICE_NINKE, divisor = 48,
    1, 0, 7; 2, 0, 5;
    -2, 1, 3; -1, 1, 5; 0, 1, 7; 1, 1, 5; 2, 1, 3;
    -2, 2, 1; -1, 2, 3; 0, 2, 5; 1, 2, 3; 2, 2, 1;
);

kernel!(STUCKI, divisor = 42,
    1, 0, 8; 2, 0, 4;
    -2, 1, 2; -1, 1, 4; 0, 1, 8; 1, 1, 4; 2, 1, 2;
    -2, 2, 1; -1, 2, 2; 0, 2, 4; 1, 2, 2; 2, 2, 1;
);

pub const ATKINSON: Kernel = Kernel {
    offsets: &[
        (1, 0, 1),
        (2, 0, 1),
        (-1, 1, 1),
        (0, 1, 1),
        (1, 1, 1),
        (0, 2, 1),
    ],
    divisor: 8,
    discard_remainder: true,
};

kernel!(BURKES, divisor = 32,
    1, 0, 8; 2, 0, 4;
    -2, 1, 2; -1, 1, 4; 0, 1, 8; 1, 1, 4; 2, 1, 2;
);

kernel!(SIERRA, divisor = 32,
    1, 0, 5; 2, 0, 3;
    -2, 1, 2; -1, 1, 4; 0, 1, 5; 1, 1, 4; 2, 1, 2;
    -1, 2, 2; 0, 2, 3; 1, 2, 2;
);

kernel!(TWO_ROW_SIERRA, divisor = 16,
    1, 0, 4; 2, 0, 3;
    -2, 1, 1; -1, 1, 2; 0, 1, 3; 1, 1, 2; 2, 1, 1;
);

kernel!(SIERRA_LITE, divisor = 4,
    1, 0, 2;
    -1, 1, 1; 0, 1, 1;
);

kernel!(PIGEON, divisor = 6,
    1, 0, 2;
    -1, 1, 1; 0, 1, 2; 1, 1, 1;
);

kernel!(STEVENSON_ARCE, divisor = 200,
    2, 0, 32;
    -3, 1, 12; -1, 1, 26; 1, 1, 30; 3, 1, 16;
    -2, 2, 12; 0, 2, 26; 2, 2, 12;
    -3, 3, 5; -1, 3, 12; 1, 3, 12; 3, 3, 5;
);

kernel!(SHIAU_FAN, divisor = 8,
    1, 0, 4;
    -1, 1, 1; 0, 1, 2; 1, 1, 1;
);

kernel!(SHIAU_FAN_2, divisor = 16,
    1, 0, 8;
    -2, 1, 1; -1, 1, 2; 0, 1, 3; 1, 1, 2;
);

kernel!(FAN_93, divisor = 16,
    1, 0, 7;
    -1, 1, 1; 0, 1, 3; 1, 1, 5;
);

kernel!(SIMPLE, divisor = 1,
    1, 0, 1;
);

kernel!(TWO_D, divisor = 2,
    1, 0, 1;
    0, 1, 1;
);

kernel!(DOWN, divisor = 1,
    0, 1, 1;
);

kernel!(DOUBLE_DOWN, divisor = 2,
    0, 1, 1; 0, 2, 1;
);

kernel!(DIAGONAL, divisor = 1,
    1, 1, 1;
);

kernel!(VERTICAL_DIAMOND, divisor = 4,
    0, 1, 2;
    -1, 2, 1; 1, 2, 1;
);

kernel!(HORIZONTAL_DIAMOND, divisor = 4,
    1, 0, 2;
    1, 1, 1; 1, -1, 1;
);

kernel!(DIAMOND, divisor = 4,
    1, 0, 1;
    -1, 1, 1; 0, 1, 1; 1, 1, 1;
);

/// Selects one of the named error-diffusion kernels.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum KernelKind {
    FloydSteinberg,
    EqualFloydSteinberg,
    FalseFloydSteinberg,
    JarvisJudiceNinke,
    Stucki,
    Atkinson,
    Burkes,
    Sierra,
    TwoRowSierra,
    SierraLite,
    Pigeon,
    StevensonArce,
    ShiauFan,
    ShiauFan2,
    Fan93,
    Simple,
    TwoD,
    Down,
    DoubleDown,
    Diagonal,
    VerticalDiamond,
    HorizontalDiamond,
    Diamond,
}

impl KernelKind {
    pub fn kernel(self) -> Kernel {
        match self {
            KernelKind::FloydSteinberg => FLOYD_STEINBERG,
            KernelKind::EqualFloydSteinberg => EQUAL_FLOYD_STEINBERG,
            KernelKind::FalseFloydSteinberg => FALSE_FLOYD_STEINBERG,
            KernelKind::JarvisJudiceNinke => JARVIS_JUDICE_NINKE,
            KernelKind::Stucki => STUCKI,
            KernelKind::Atkinson => ATKINSON,
            KernelKind::Burkes => BURKES,
            KernelKind::Sierra => SIERRA,
            KernelKind::TwoRowSierra => TWO_ROW_SIERRA,
            KernelKind::SierraLite => SIERRA_LITE,
            KernelKind::Pigeon => PIGEON,
            KernelKind::StevensonArce => STEVENSON_ARCE,
            KernelKind::ShiauFan => SHIAU_FAN,
            KernelKind::ShiauFan2 => SHIAU_FAN_2,
            KernelKind::Fan93 => FAN_93,
            KernelKind::Simple => SIMPLE,
            KernelKind::TwoD => TWO_D,
            KernelKind::Down => DOWN,
            KernelKind::DoubleDown => DOUBLE_DOWN,
            KernelKind::Diagonal => DIAGONAL,
            KernelKind::VerticalDiamond => VERTICAL_DIAMOND,
            KernelKind::HorizontalDiamond => HORIZONTAL_DIAMOND,
            KernelKind::Diamond => DIAMOND,
        }
    }
}

/// Per-pixel accumulated error, one `f32` per channel, row-major.
struct ErrorGrid {
    width: i32,
    height: i32,
    r: Vec<f32>,
    g: Vec<f32>,
    b: Vec<f32>,
}

impl ErrorGrid {
    fn new(width: u32, height: u32) -> Self {
        let n = (width as usize) * (height as usize);
        ErrorGrid {
            width: width as i32,
            height: height as i32,
            r: vec![0.0; n],
            g: vec![0.0; n],
            b: vec![0.0; n],
        }
    }

    fn idx(&self, x: i32, y: i32) -> Option<usize> {
        if x < 0 || y < 0 || x >= self.width || y >= self.height {
            None
        } else {
            Some((y * self.width + x) as usize)
        }
    }

    fn take(&mut self, x: i32, y: i32) -> (f32, f32, f32) {
        match self.idx(x, y) {
            Some(i) => (self.r[i], self.g[i], self.b[i]),
            None => (0.0, 0.0, 0.0),
        }
    }

    fn add(&mut self, x: i32, y: i32, err: (f32, f32, f32)) {
        if let Some(i) = self.idx(x, y) {
            self.r[i] += err.0;
            self.g[i] += err.1;
            self.b[i] += err.2;
        }
    }
}

fn clamp_channel(v: f32) -> u8 {
    v.round().clamp(0.0, 255.0) as u8
}

/// Diffuses quantization error through `kernel` in scan order.
/// `serpentine` alternates scan direction per row.
pub fn dither(
    kernel: Kernel,
    serpentine: bool,
    source: &dyn PixelBuffer,
    target: &mut IndexBuffer,
    lookup: &PaletteLookup,
) {
    let width = source.width();
    let height = source.height();
    if width == 0 || height == 0 {
        return;
    }
    let mut errors = ErrorGrid::new(width, height);

    for y in 0..height as i32 {
        let reverse = serpentine && y % 2 == 1;
        let xs: Box<dyn Iterator<Item = i32>> = if reverse {
            Box::new((0..width as i32).rev())
        } else {
            Box::new(0..width as i32)
        };

        for x in xs {
            let src = source.get(x as u32, y as u32);
            let (er, eg, eb) = errors.take(x, y);
            let corrected = Color::new(
                clamp_channel(src.r as f32 + er),
                clamp_channel(src.g as f32 + eg),
                clamp_channel(src.b as f32 + eb),
            );

            let index = lookup.find_closest(corrected);
            target.set(x as u32, y as u32, index);

            let palette_color = lookup.palette().get(index).unwrap_or(corrected);
            let mut err_r = corrected.r as f32 - palette_color.r as f32;
            let mut err_g = corrected.g as f32 - palette_color.g as f32;
            let mut err_b = corrected.b as f32 - palette_color.b as f32;

            if kernel.discard_remainder {
                // Atkinson-style: each share keeps only the integer part of
                // its contribution, discarding the leftover fraction.
                err_r = (err_r / kernel.divisor as f32 * kernel.divisor as f32).trunc();
                err_g = (err_g / kernel.divisor as f32 * kernel.divisor as f32).trunc();
                err_b = (err_b / kernel.divisor as f32 * kernel.divisor as f32).trunc();
            }

            let dir = if reverse { -1 } else { 1 };
            for &(dx, dy, w) in kernel.offsets {
                let share = w as f32 / kernel.divisor as f32;
                let (nx, ny) = (x + dx * dir, y + dy);
                let mut share_r = err_r * share;
                let mut share_g = err_g * share;
                let mut share_b = err_b * share;
                if kernel.discard_remainder {
                    share_r = share_r.trunc();
                    share_g = share_g.trunc();
                    share_b = share_b.trunc();
                }
                errors.add(nx, ny, (share_r, share_g, share_b));
            }
        }
    }
}
