//! GIF89a writer: byte-exact emission of the header, logical
//! screen descriptor, optional global color table, Netscape looping
//! extension, one graphic-control-extension + image-descriptor pair per
//! frame, and the trailer.

use crate::color::Color;
use crate::error::Result;
use crate::frame::Frame;
use crate::lzw;
use crate::palette::Palette;
use std::io::Write;

/// GIF89a's loop-count extension value.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum LoopCount {
    Infinite,
    Finite(u16),
}

impl LoopCount {
    fn as_u16(self) -> u16 {
        match self {
            LoopCount::Infinite => 0,
            LoopCount::Finite(n) => n,
        }
    }
}

impl Default for LoopCount {
    fn default() -> Self {
        LoopCount::Infinite
    }
}

/// Smallest `size` field (3 bits) such that `2^(size+1) >= n`, per the GIF89a
/// color table size encoding.
fn color_table_size_field(n: usize) -> u8 {
    let n = n.max(1);
    let mut entries = 2usize;
    let mut size = 0u8;
    while entries < n && size < 7 {
        entries *= 2;
        size += 1;
    }
    size
}

fn write_color_table<W: Write>(w: &mut W, palette: &Palette, size_field: u8) -> std::io::Result<()> {
    let entries = 2usize << size_field;
    for i in 0..entries {
        let c = palette.get(i as u8).unwrap_or(Color::default());
        w.write_all(&[c.r, c.g, c.b])?;
    }
    Ok(())
}

/// Writes a complete GIF89a stream to `w`.
///
/// `global_palette` becomes the logical screen's global color table when
/// present; every frame still carries its own local color table (this
/// format always layers many distinct local palettes), so a missing global
/// palette is typical and simply skips that optional block.
pub fn write_gif<W: Write>(
    w: &mut W,
    width: u16,
    height: u16,
    global_palette: Option<&Palette>,
    loop_count: LoopCount,
    frames: &[Frame],
    no_compression: bool,
) -> Result<()> {
    w.write_all(b"GIF89a")?;

    let has_global = global_palette.map(|p| !p.is_empty()).unwrap_or(false);
    let global_size_field = global_palette.map(|p| color_table_size_field(p.len())).unwrap_or(0);

    let packed = (has_global as u8) << 7 | (0b111 << 4) | (0 << 3) | global_size_field;
    w.write_all(&width.to_le_bytes())?;
    w.write_all(&height.to_le_bytes())?;
    w.write_all(&[packed, 0, 0])?; // packed, background index, aspect ratio

    if let Some(palette) = global_palette {
        if has_global {
            write_color_table(w, palette, global_size_field)?;
        }
    }

    // Netscape looping extension; always emitted since every conversion in
    // this format is an animation by construction.
    w.write_all(&[0x21, 0xFF, 0x0B])?;
    w.write_all(b"NETSCAPE2.0")?;
    w.write_all(&[0x03, 0x01])?;
    w.write_all(&loop_count.as_u16().to_le_bytes())?;
    w.write_all(&[0x00])?;

    for frame in frames {
        write_frame(w, frame, no_compression)?;
    }

    w.write_all(&[0x3B])?;
    Ok(())
}

fn write_frame<W: Write>(w: &mut W, frame: &Frame, no_compression: bool) -> Result<()> {
    let (transparent_flag, transparent_index) = match frame.transparent_index {
        Some(idx) => (1u8, idx),
        None => (0u8, 0u8),
    };
    let gce_packed = (0b000 << 5) | (frame.disposal.code() << 2) | (0 << 1) | transparent_flag;
    w.write_all(&[0x21, 0xF9, 0x04, gce_packed])?;
    w.write_all(&frame.delay_hundredths.to_le_bytes())?;
    w.write_all(&[transparent_index, 0x00])?;

    w.write_all(&[0x2C])?;
    w.write_all(&(frame.left as u16).to_le_bytes())?;
    w.write_all(&(frame.top as u16).to_le_bytes())?;
    w.write_all(&(frame.width as u16).to_le_bytes())?;
    w.write_all(&(frame.height as u16).to_le_bytes())?;

    let local_palette = frame_palette(frame);
    if let Some(&bad) = frame.indices.iter().find(|&&i| i as usize >= local_palette.len()) {
        return Err(crate::error::internal(format!(
            "palette index {} >= local palette length {}",
            bad,
            local_palette.len()
        )));
    }
    let size_field = color_table_size_field(local_palette.len());
    let id_packed = (1u8 << 7) | (0 << 6) | (0 << 5) | (0b00 << 3) | size_field;
    w.write_all(&[id_packed])?;
    write_color_table(w, &local_palette, size_field)?;

    let block = if no_compression {
        lzw::encode_uncompressed(&frame.indices, local_palette.len())
    } else {
        lzw::encode(&frame.indices, local_palette.len())
    };
    w.write_all(&block)?;
    Ok(())
}

/// [`Frame`] carries its index payload but not the palette it was dithered
/// against (that lives on the `SubImagePlan`); the caller is expected to
/// have replaced `frame.indices`' implicit palette reference by baking the
/// same palette into a [`Palette`] alongside the frame. Since the pipeline
/// always constructs frames immediately after composing against a known
/// palette, that palette is threaded through via `Frame::local_palette`
/// rather than recomputed here.
fn frame_palette(frame: &Frame) -> Palette {
    frame.local_palette.clone()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::Disposal;

    fn solid_frame(width: u32, height: u32, palette: Palette) -> Frame {
        Frame {
            left: 0,
            top: 0,
            width,
            height,
            indices: vec![0u8; (width * height) as usize],
            transparent_index: None,
            disposal: Disposal::RestoreBackground,
            delay_hundredths: 100,
            local_palette: palette,
        }
    }

    #[test]
    fn header_and_trailer_are_byte_exact() {
        let frame = solid_frame(1, 1, Palette::new(vec![Color::new(255, 0, 0)]));
        let mut out = Vec::new();
        write_gif(&mut out, 1, 1, None, LoopCount::Infinite, &[frame], false).unwrap();
        assert_eq!(&out[0..6], b"GIF89a");
        assert_eq!(*out.last().unwrap(), 0x3B);
    }

    #[test]
    fn netscape_extension_carries_loop_count() {
        let frame = solid_frame(1, 1, Palette::new(vec![Color::new(1, 2, 3)]));
        let mut out = Vec::new();
        write_gif(&mut out, 1, 1, None, LoopCount::Finite(7), &[frame], false).unwrap();
        let marker = b"NETSCAPE2.0";
        let pos = out.windows(marker.len()).position(|w| w == marker).unwrap();
        let loop_bytes = &out[pos + marker.len() + 2..pos + marker.len() + 4];
        assert_eq!(u16::from_le_bytes([loop_bytes[0], loop_bytes[1]]), 7);
    }

    #[test]
    fn one_by_one_solid_red_roundtrips_through_a_minimal_parser() {
        let frame = solid_frame(1, 1, Palette::new(vec![Color::new(255, 0, 0)]));
        let mut out = Vec::new();
        write_gif(&mut out, 1, 1, None, LoopCount::Infinite, &[frame], false).unwrap();

        // Minimal structural parse: signature, logical screen descriptor,
        // Netscape block, one GCE + image descriptor + local table + data,
        // then trailer — enough to validate chunk boundaries without a
        // full third-party decoder.
        assert_eq!(&out[0..6], b"GIF89a");
        let packed = out[10];
        assert_eq!(packed & 0x80, 0, "no global color table expected");
        assert_eq!(out[out.len() - 1], 0x3B);

        let gce_pos = out.windows(2).position(|w| w == [0x21, 0xF9]).unwrap();
        assert_eq!(out[gce_pos + 2], 0x04);
        let id_pos = gce_pos + 8;
        assert_eq!(out[id_pos], 0x2C);
    }

    #[test]
    fn no_compression_mode_still_produces_a_valid_block_terminator() {
        let frame = solid_frame(2, 2, Palette::new(vec![Color::new(0, 0, 0), Color::new(255, 255, 255)]));
        let mut out = Vec::new();
        write_gif(&mut out, 2, 2, None, LoopCount::Infinite, &[frame], true).unwrap();
        assert_eq!(*out.last().unwrap(), 0x3B);
    }

    #[test]
    fn out_of_range_index_is_a_fatal_internal_error_not_a_malformed_stream() {
        let mut frame = solid_frame(1, 1, Palette::new(vec![Color::new(1, 2, 3)]));
        frame.indices = vec![5];
        let mut out = Vec::new();
        let err = write_gif(&mut out, 1, 1, None, LoopCount::Infinite, &[frame], false).unwrap_err();
        assert!(matches!(err, crate::error::Error::Internal { .. }));
    }
}
