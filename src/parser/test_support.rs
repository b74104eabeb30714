//! Builders for hand-made GIF streams used by the unit tests.

use super::color_table::{ColorTable, Rgba};

pub(crate) const BLACK: Rgba = Rgba::opaque(0, 0, 0);
pub(crate) const RED: Rgba = Rgba::opaque(255, 0, 0);
pub(crate) const BLUE: Rgba = Rgba::opaque(0, 0, 255);
pub(crate) const GREEN: Rgba = Rgba::opaque(0, 255, 0);

pub(crate) const PALETTE_RGB: [[u8; 3]; 4] = [[0, 0, 0], [255, 0, 0], [0, 0, 255], [0, 255, 0]];

pub(crate) fn palette() -> ColorTable {
    [BLACK, RED, BLUE, GREEN].into_iter().collect()
}

pub(crate) fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub(crate) fn pack_codes(codes: &[(u16, u8)]) -> Vec<u8> {
    let mut out = Vec::new();
    let mut accumulator: u32 = 0;
    let mut bit_count = 0;

    for &(code, width) in codes {
        accumulator |= (code as u32) << bit_count;
        bit_count += width as u32;
        while bit_count >= 8 {
            out.push(accumulator as u8);
            accumulator >>= 8;
            bit_count -= 8;
        }
    }
    if bit_count > 0 {
        out.push(accumulator as u8);
    }
    out
}

pub(crate) fn sub_blocks(data: &[u8], chunk: usize) -> Vec<u8> {
    let mut out = Vec::new();
    for block in data.chunks(chunk) {
        out.push(block.len() as u8);
        out.extend_from_slice(block);
    }
    out.push(0);
    out
}

/// Sub-block framed LZW data that sends every index as a literal code. Each run is preceded
/// by a clear code; code widths track the dictionary growth a decoder performs.
pub(crate) fn encode_literals(min_code_size: u8, runs: &[&[u8]]) -> Vec<u8> {
    let clear_code = 1u16 << min_code_size;
    let mut codes = Vec::new();
    let mut width = min_code_size + 1;

    for run in runs {
        codes.push((clear_code, width));
        width = min_code_size + 1;
        let mut next_code = clear_code + 2;

        for (i, &index) in run.iter().enumerate() {
            codes.push((index as u16, width));
            if i > 0 && next_code < 4096 {
                next_code += 1;
                if next_code == 1 << width && width < 12 {
                    width += 1;
                }
            }
        }
    }
    codes.push((clear_code + 1, width));

    sub_blocks(&pack_codes(&codes), 255)
}

fn table_exponent(table: &[[u8; 3]]) -> u8 {
    debug_assert!(table.len().is_power_of_two() && table.len() >= 2);
    table.len().trailing_zeros() as u8 - 1
}

pub(crate) fn image_block(
    left: u16,
    top: u16,
    width: u16,
    height: u16,
    interlaced: bool,
    local_table: Option<&[[u8; 3]]>,
    indices: &[u8],
) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(&left.to_le_bytes());
    out.extend_from_slice(&top.to_le_bytes());
    out.extend_from_slice(&width.to_le_bytes());
    out.extend_from_slice(&height.to_le_bytes());

    let mut flags = 0;
    if interlaced {
        flags |= 0b0100_0000;
    }
    if let Some(table) = local_table {
        flags |= 0b1000_0000 | table_exponent(table);
    }
    out.push(flags);
    if let Some(table) = local_table {
        out.extend(table.iter().flatten());
    }

    let max_index = indices.iter().copied().max().unwrap_or(0);
    let min_code_size = ((8 - max_index.leading_zeros()) as u8).max(2);
    out.push(min_code_size);
    out.extend(encode_literals(min_code_size, &[indices]));
    out
}

pub(crate) struct GifBuilder {
    bytes: Vec<u8>,
}

impl GifBuilder {
    pub(crate) fn new(width: u16, height: u16, global_table: Option<&[[u8; 3]]>) -> Self {
        Self::with_background(width, height, global_table, 0)
    }

    pub(crate) fn with_background(
        width: u16,
        height: u16,
        global_table: Option<&[[u8; 3]]>,
        background_index: u8,
    ) -> Self {
        let mut bytes = b"GIF89a".to_vec();
        bytes.extend_from_slice(&width.to_le_bytes());
        bytes.extend_from_slice(&height.to_le_bytes());

        let mut flags = 0b0111_0000;
        if let Some(table) = global_table {
            flags |= 0b1000_0000 | table_exponent(table);
        }
        bytes.push(flags);
        bytes.push(background_index);
        bytes.push(0);

        if let Some(table) = global_table {
            bytes.extend(table.iter().flatten());
        }
        Self { bytes }
    }

    pub(crate) fn graphic_control(
        mut self,
        disposal: u8,
        transparent_index: Option<u8>,
        delay: u16,
    ) -> Self {
        let mut flags = disposal << 2;
        if transparent_index.is_some() {
            flags |= 1;
        }
        self.bytes.extend_from_slice(&[0x21, 0xf9, 4, flags]);
        self.bytes.extend_from_slice(&delay.to_le_bytes());
        self.bytes.push(transparent_index.unwrap_or(0));
        self.bytes.push(0);
        self
    }

    pub(crate) fn extension(mut self, label: u8, data: &[u8]) -> Self {
        self.bytes.extend_from_slice(&[0x21, label]);
        self.bytes.extend(sub_blocks(data, 255));
        self
    }

    pub(crate) fn comment(self, text: &str) -> Self {
        self.extension(0xfe, text.as_bytes())
    }

    pub(crate) fn netscape_loop(mut self, count: u16) -> Self {
        self.bytes.extend_from_slice(&[0x21, 0xff, 11]);
        self.bytes.extend_from_slice(b"NETSCAPE2.0");
        self.bytes.push(3);
        self.bytes.push(1);
        self.bytes.extend_from_slice(&count.to_le_bytes());
        self.bytes.push(0);
        self
    }

    pub(crate) fn image(
        self,
        left: u16,
        top: u16,
        width: u16,
        height: u16,
        indices: &[u8],
    ) -> Self {
        self.image_block(image_block(left, top, width, height, false, None, indices))
    }

    pub(crate) fn image_block(mut self, block: Vec<u8>) -> Self {
        self.bytes.push(0x2c);
        self.bytes.extend(block);
        self
    }

    pub(crate) fn raw(mut self, bytes: &[u8]) -> Self {
        self.bytes.extend_from_slice(bytes);
        self
    }

    pub(crate) fn trailer(mut self) -> Self {
        self.bytes.push(0x3b);
        self
    }

    pub(crate) fn build(self) -> Vec<u8> {
        self.bytes
    }
}

#[cfg(test)]
mod tests {
    use super::{pack_codes, sub_blocks};

    #[test]
    fn packs_lsb_first() {
        assert_eq!(pack_codes(&[(0b100, 3), (0b01, 2), (0b111, 3)]), vec![0b111_01_100]);
        assert_eq!(pack_codes(&[(0xabc, 12)]), vec![0xbc, 0x0a]);
    }

    #[test]
    fn frames_into_sub_blocks() {
        assert_eq!(sub_blocks(&[1, 2, 3], 2), vec![2, 1, 2, 1, 3, 0]);
        assert_eq!(sub_blocks(&[], 255), vec![0]);
    }
}
