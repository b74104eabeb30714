use crate::error::DecodeError;
use crate::source::ByteSource;

pub(crate) const MAX_SUB_BLOCK_LEN: usize = 255;

// walks a run of (length, data) sub-blocks up to and including the zero length terminator
pub(crate) struct SubBlockReader<'a, S: ByteSource> {
    source: &'a mut S,
    finished: bool,
}

impl<'a, S: ByteSource> SubBlockReader<'a, S> {
    pub(crate) fn new(source: &'a mut S) -> Self {
        Self {
            source,
            finished: false,
        }
    }

    // `None` once the terminator has been consumed
    pub(crate) fn next_block(
        &mut self,
        buf: &mut [u8; MAX_SUB_BLOCK_LEN],
    ) -> Result<Option<usize>, DecodeError> {
        if self.finished {
            return Ok(None);
        }

        let block_size = self.source.read_byte()? as usize;
        if block_size == 0 {
            self.finished = true;
            return Ok(None);
        }

        self.source.read_exact_into(&mut buf[..block_size])?;
        Ok(Some(block_size))
    }

    pub(crate) fn skip_remaining(&mut self) -> Result<usize, DecodeError> {
        let mut scratch = [0; MAX_SUB_BLOCK_LEN];
        let mut skipped = 0;
        while let Some(len) = self.next_block(&mut scratch)? {
            skipped += len;
        }
        Ok(skipped)
    }

    pub(crate) fn read_data_sub_blocks(&mut self) -> Result<Box<[u8]>, DecodeError> {
        let mut block = [0; MAX_SUB_BLOCK_LEN];
        let mut result = Vec::new();

        while let Some(len) = self.next_block(&mut block)? {
            result.extend_from_slice(&block[..len]);
        }

        Ok(result.into_boxed_slice())
    }
}
