//! Pixel buffer abstraction -> Color`
//! and a target writer `set(x,y,index)`"; no raw pointers cross this
//! module's boundary).

use crate::color::Color;

/// Read-only truecolor pixel source, row-major with `x` fastest.
pub trait PixelBuffer {
    fn width(&self) -> u32;
    fn height(&self) -> u32;
    fn get(&self, x: u32, y: u32) -> Color;
}

/// An owned, row-major truecolor buffer. `stride` may exceed `width` so a
/// buffer can describe a sub-rectangle of a larger backing store without
/// copying.
#[derive(Debug, Clone)]
pub struct RgbaBuffer {
    width: u32,
    height: u32,
    stride: u32,
    pixels: Vec<Color>,
}

impl RgbaBuffer {
    pub fn new(width: u32, height: u32, pixels: Vec<Color>) -> Self {
        assert_eq!(
            pixels.len(),
            (width as usize) * (height as usize),
            "pixel buffer length must equal width * height"
        );
        RgbaBuffer {
            width,
            height,
            stride: width,
            pixels,
        }
    }

    pub fn with_stride(width: u32, height: u32, stride: u32, pixels: Vec<Color>) -> Self {
        assert!(stride >= width);
        assert!(pixels.len() as u64 >= stride as u64 * height as u64);
        RgbaBuffer {
            width,
            height,
            stride,
            pixels,
        }
    }

    pub fn from_rgb8(width: u32, height: u32, rgb: &[u8]) -> Self {
        assert_eq!(rgb.len(), width as usize * height as usize * 3);
        let pixels = rgb
            .chunks_exact(3)
            .map(|c| Color::new(c[0], c[1], c[2]))
            .collect();
        RgbaBuffer::new(width, height, pixels)
    }

    pub fn pixels(&self) -> &[Color] {
        &self.pixels
    }
}

impl PixelBuffer for RgbaBuffer {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn get(&self, x: u32, y: u32) -> Color {
        debug_assert!(x < self.width && y < self.height);
        self.pixels[(y * self.stride + x) as usize]
    }
}

/// An 8-bit palette-index target buffer for a single sub-image crop.
#[derive(Debug, Clone)]
pub struct IndexBuffer {
    width: u32,
    height: u32,
    indices: Vec<u8>,
}

impl IndexBuffer {
    pub fn new(width: u32, height: u32, fill: u8) -> Self {
        IndexBuffer {
            width,
            height,
            indices: vec![fill; (width as usize) * (height as usize)],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn set(&mut self, x: u32, y: u32, index: u8) {
        debug_assert!(x < self.width && y < self.height);
        self.indices[(y * self.width + x) as usize] = index;
    }

    pub fn get(&self, x: u32, y: u32) -> u8 {
        self.indices[(y * self.width + x) as usize]
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.indices
    }

    pub fn into_vec(self) -> Vec<u8> {
        self.indices
    }
}
