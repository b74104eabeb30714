use log::trace;

use super::sub_block::{SubBlockReader, MAX_SUB_BLOCK_LEN};
use crate::error::DecodeError;
use crate::source::ByteSource;

/// Pulls LSB-first codes out of a sub-block framed byte stream. Codes may straddle
/// both byte and sub-block boundaries.
pub(crate) struct BitReader<'a, S: ByteSource> {
    blocks: SubBlockReader<'a, S>,
    block: [u8; MAX_SUB_BLOCK_LEN],
    block_len: usize,
    block_pos: usize,
    // bits not yet handed out, lowest bit first
    accumulator: u32,
    bit_count: u8,
}

impl<'a, S: ByteSource> BitReader<'a, S> {
    pub(crate) fn new(source: &'a mut S) -> Self {
        Self {
            blocks: SubBlockReader::new(source),
            block: [0; MAX_SUB_BLOCK_LEN],
            block_len: 0,
            block_pos: 0,
            accumulator: 0,
            bit_count: 0,
        }
    }

    pub(crate) fn read_code(&mut self, width: u8) -> Result<u16, DecodeError> {
        debug_assert!(width > 0 && width <= 16);

        while self.bit_count < width {
            if self.block_pos == self.block_len {
                match self.blocks.next_block(&mut self.block)? {
                    Some(len) => {
                        trace!("loaded sub-block of {len} bytes");
                        self.block_len = len;
                        self.block_pos = 0;
                    }
                    None => return Err(DecodeError::ShortRead),
                }
            }

            self.accumulator |= (self.block[self.block_pos] as u32) << self.bit_count;
            self.block_pos += 1;
            self.bit_count += 8;
        }

        let code = (self.accumulator & ((1 << width) - 1)) as u16;
        self.accumulator >>= width;
        self.bit_count -= width;
        Ok(code)
    }

    pub(crate) fn finish(mut self) -> Result<usize, DecodeError> {
        self.blocks.skip_remaining()
    }
}

#[cfg(test)]
mod tests {
    use super::BitReader;
    use crate::error::DecodeError;
    use crate::source::ByteSource;
    use std::io::Cursor;

    #[test]
    fn it_works() {
        let buffer = vec![
            7,
            0b10000100,
            0b10001111,
            0b10101001,
            0b11001011,
            0b11101101,
            0b00001111,
            0b10100011,
            0,
        ];
        let mut source = Cursor::new(buffer);
        let mut reader = BitReader::new(&mut source);
        assert_eq!(reader.read_code(3).unwrap(), 0b100);
        assert_eq!(reader.read_code(3).unwrap(), 0b000);
        assert_eq!(reader.read_code(3).unwrap(), 0b110);
        assert_eq!(reader.read_code(3).unwrap(), 0b111);
        assert_eq!(reader.read_code(3).unwrap(), 0b000);
        assert_eq!(reader.read_code(3).unwrap(), 0b011);
        assert_eq!(reader.read_code(3).unwrap(), 0b010);
        assert_eq!(reader.read_code(3).unwrap(), 0b101);
    }

    #[test]
    fn codes_cross_sub_block_boundaries() {
        // 0xabc as a 12 bit code followed by 0x5 in 4 bits, split one byte per sub-block
        let mut source = Cursor::new(vec![1, 0xbc, 1, 0x5a, 0]);
        let mut reader = BitReader::new(&mut source);
        assert_eq!(reader.read_code(12).unwrap(), 0xabc);
        assert_eq!(reader.read_code(4).unwrap(), 0x5);
    }

    #[test]
    fn short_read_once_sub_blocks_run_out() {
        let mut source = Cursor::new(vec![1, 0xff, 0, 0x3b]);
        let mut reader = BitReader::new(&mut source);
        assert_eq!(reader.read_code(5).unwrap(), 0x1f);
        assert!(matches!(reader.read_code(5), Err(DecodeError::ShortRead)));
        // terminator consumed, trailer left in place
        assert_eq!(source.read_byte().unwrap(), 0x3b);
    }

    #[test]
    fn finish_skips_unread_blocks() {
        let mut source = Cursor::new(vec![2, 0x01, 0x02, 3, 9, 9, 9, 0, 0x21]);
        let mut reader = BitReader::new(&mut source);
        assert_eq!(reader.read_code(8).unwrap(), 0x01);
        assert_eq!(reader.finish().unwrap(), 3);
        assert_eq!(source.read_byte().unwrap(), 0x21);
    }
}
