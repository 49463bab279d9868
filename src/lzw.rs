//! GIF-flavor LZW encoder: variable-width codes, a CLEAR code at
//! the dictionary's reset points, an EOI terminator, and little-endian
//! LSB-first bit packing framed into 255-byte GIF sub-blocks.

use std::collections::HashMap;

/// `M = ceil(log2(palette_size))`, clamped to `>= 2`.
pub fn min_code_size(palette_len: usize) -> u8 {
    let n = palette_len.max(1);
    let mut m = 0u32;
    while (1usize << m) < n {
        m += 1;
    }
    m.max(2) as u8
}

struct BitWriter {
    bytes: Vec<u8>,
    acc: u32,
    bits: u32,
}

impl BitWriter {
    fn new() -> Self {
        BitWriter {
            bytes: Vec::new(),
            acc: 0,
            bits: 0,
        }
    }

    fn write_code(&mut self, code: u16, width: u8) {
        self.acc |= (code as u32) << self.bits;
        self.bits += width as u32;
        while self.bits >= 8 {
            self.bytes.push((self.acc & 0xFF) as u8);
            self.acc >>= 8;
            self.bits -= 8;
        }
    }

    fn finish(mut self) -> Vec<u8> {
        if self.bits > 0 {
            self.bytes.push((self.acc & 0xFF) as u8);
        }
        self.bytes
    }
}

/// Splits `data` into GIF sub-blocks (length byte + up to 255 bytes each),
/// terminated by a single zero-length block.
fn frame_subblocks(data: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(data.len() + data.len() / 255 + 2);
    for chunk in data.chunks(255) {
        out.push(chunk.len() as u8);
        out.extend_from_slice(chunk);
    }
    out.push(0);
    out
}

/// Encodes `indices` (palette indices in `0..palette_len`) into a complete
/// GIF image-data block: the leading LZW-minimum-code-size byte, the
/// sub-block-framed compressed stream, and the terminating zero block.
pub fn encode(indices: &[u8], palette_len: usize) -> Vec<u8> {
    let min_code_size_byte = min_code_size(palette_len);
    let clear: u16 = 1 << min_code_size_byte;
    let eoi: u16 = clear + 1;

    let mut writer = BitWriter::new();
    let mut code_width = min_code_size_byte + 1;
    writer.write_code(clear, code_width);

    let mut dict: HashMap<(u16, u8), u16> = HashMap::new();
    let mut next_code = eoi + 1;
    let mut prefix: Option<u16> = None;

    for &byte in indices {
        match prefix {
            None => prefix = Some(byte as u16),
            Some(pc) => {
                if let Some(&code) = dict.get(&(pc, byte)) {
                    prefix = Some(code);
                } else {
                    writer.write_code(pc, code_width);
                    dict.insert((pc, byte), next_code);
                    next_code += 1;
                    if next_code == (1 << code_width) && code_width < 12 {
                        code_width += 1;
                    }
                    if next_code == 4096 {
                        writer.write_code(clear, code_width);
                        dict.clear();
                        next_code = eoi + 1;
                        code_width = min_code_size_byte + 1;
                    }
                    prefix = Some(byte as u16);
                }
            }
        }
    }
    if let Some(pc) = prefix {
        writer.write_code(pc, code_width);
    }
    writer.write_code(eoi, code_width);

    let compressed = writer.finish();
    let mut out = vec![min_code_size_byte];
    out.extend(frame_subblocks(&compressed));
    out
}

/// Uncompressed mode: emits CLEAR before every symbol instead of
/// building a dictionary, still using the same sub-block framing.
pub fn encode_uncompressed(indices: &[u8], palette_len: usize) -> Vec<u8> {
    let min_code_size_byte = min_code_size(palette_len);
    let clear: u16 = 1 << min_code_size_byte;
    let eoi: u16 = clear + 1;
    let code_width = min_code_size_byte + 1;

    let mut writer = BitWriter::new();
    for &byte in indices {
        writer.write_code(clear, code_width);
        writer.write_code(byte as u16, code_width);
    }
    writer.write_code(eoi, code_width);

    let compressed = writer.finish();
    let mut out = vec![min_code_size_byte];
    out.extend(frame_subblocks(&compressed));
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Bit reader mirroring [`BitWriter`], used only to validate the
    /// encoder's roundtrip in tests — the crate itself never decodes GIFs.
    struct BitReader<'a> {
        data: &'a [u8],
        byte_pos: usize,
        acc: u32,
        bits: u32,
    }

    impl<'a> BitReader<'a> {
        fn new(data: &'a [u8]) -> Self {
            BitReader {
                data,
                byte_pos: 0,
                acc: 0,
                bits: 0,
            }
        }

        fn read_code(&mut self, width: u8) -> Option<u16> {
            while self.bits < width as u32 {
                let byte = *self.data.get(self.byte_pos)?;
                self.byte_pos += 1;
                self.acc |= (byte as u32) << self.bits;
                self.bits += 8;
            }
            let mask = (1u32 << width) - 1;
            let code = (self.acc & mask) as u16;
            self.acc >>= width;
            self.bits -= width as u32;
            Some(code)
        }
    }

    /// Strips GIF sub-block framing back into a flat byte stream.
    fn unframe_subblocks(data: &[u8]) -> Vec<u8> {
        let mut out = Vec::new();
        let mut i = 0;
        while i < data.len() {
            let len = data[i] as usize;
            i += 1;
            if len == 0 {
                break;
            }
            out.extend_from_slice(&data[i..i + len]);
            i += len;
        }
        out
    }

    fn decode(block: &[u8], palette_len: usize) -> Vec<u8> {
        let min_code_size_byte = min_code_size(palette_len);
        let compressed = unframe_subblocks(&block[1..]);
        let clear: u16 = 1 << min_code_size_byte;
        let eoi: u16 = clear + 1;

        let mut table: Vec<Vec<u8>> = (0..clear).map(|v| vec![v as u8]).collect();
        table.push(vec![]); // CLEAR placeholder
        table.push(vec![]); // EOI placeholder

        let mut code_width = min_code_size_byte + 1;
        let mut reader = BitReader::new(&compressed);
        let mut out = Vec::new();
        let mut prev: Option<Vec<u8>> = None;

        loop {
            let code = match reader.read_code(code_width) {
                Some(c) => c,
                None => break,
            };
            if code == clear {
                table = (0..clear).map(|v| vec![v as u8]).collect();
                table.push(vec![]);
                table.push(vec![]);
                code_width = min_code_size_byte + 1;
                prev = None;
                continue;
            }
            if code == eoi {
                break;
            }

            let entry = if (code as usize) < table.len() {
                table[code as usize].clone()
            } else if let Some(p) = &prev {
                let mut e = p.clone();
                e.push(p[0]);
                e
            } else {
                break;
            };

            out.extend_from_slice(&entry);

            if let Some(p) = prev {
                let mut new_entry = p;
                new_entry.push(entry[0]);
                table.push(new_entry);
                if table.len() == (1 << code_width) && code_width < 12 {
                    code_width += 1;
                }
            }
            prev = Some(entry);
        }
        out
    }

    #[test]
    fn min_code_size_respects_floor_of_two() {
        assert_eq!(min_code_size(1), 2);
        assert_eq!(min_code_size(2), 2);
        assert_eq!(min_code_size(4), 2);
        assert_eq!(min_code_size(5), 3);
        assert_eq!(min_code_size(256), 8);
    }

    #[test]
    fn roundtrip_small_buffer() {
        let palette_len = 4;
        let indices = vec![0u8, 1, 2, 3, 0, 1, 2, 3, 0, 0, 0, 1, 1, 1, 2, 3];
        let encoded = encode(&indices, palette_len);
        let decoded = decode(&encoded, palette_len);
        assert_eq!(decoded, indices);
    }

    #[test]
    fn roundtrip_repetitive_buffer_grows_dictionary() {
        let palette_len = 256;
        let indices: Vec<u8> = (0..2000).map(|i| (i % 17) as u8).collect();
        let encoded = encode(&indices, palette_len);
        let decoded = decode(&encoded, palette_len);
        assert_eq!(decoded, indices);
    }

    #[test]
    fn roundtrip_large_buffer_forces_dictionary_reset() {
        let palette_len = 256;
        // 65536 pseudo-random-ish bytes so the dictionary actually fills
        // and the CLEAR-and-reset path gets exercised.
        let indices: Vec<u8> = (0..65536u32).map(|i| ((i * 2654435761) >> 16) as u8).collect();
        let encoded = encode(&indices, palette_len);
        let decoded = decode(&encoded, palette_len);
        assert_eq!(decoded, indices);
    }

    #[test]
    fn empty_buffer_roundtrips_to_empty() {
        let encoded = encode(&[], 16);
        let decoded = decode(&encoded, 16);
        assert!(decoded.is_empty());
    }

    #[test]
    fn single_symbol_roundtrips() {
        let indices = vec![7u8; 1];
        let encoded = encode(&indices, 16);
        let decoded = decode(&encoded, 16);
        assert_eq!(decoded, indices);
    }

    #[test]
    fn uncompressed_mode_roundtrips() {
        let indices = vec![0u8, 1, 2, 3, 3, 3, 2, 1, 0];
        let encoded = encode_uncompressed(&indices, 4);
        let decoded = decode(&encoded, 4);
        assert_eq!(decoded, indices);
    }

    #[test]
    fn sub_blocks_never_exceed_255_bytes() {
        let indices: Vec<u8> = (0..10_000u32).map(|i| (i % 200) as u8).collect();
        let encoded = encode(&indices, 256);
        let mut i = 1; // skip min-code-size byte
        while i < encoded.len() {
            let len = encoded[i] as usize;
            assert!(len <= 255);
            i += 1;
            if len == 0 {
                break;
            }
            i += len;
        }
    }
}
