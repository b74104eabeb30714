use std::io::{self, Read, Seek, SeekFrom};

use crate::error::DecodeError;

// `read_into` returning 0 means end of input
pub trait ByteSource {
    fn read_into(&mut self, buf: &mut [u8]) -> io::Result<usize>;

    fn seek_to(&mut self, pos: SeekFrom) -> io::Result<u64>;

    fn tell(&mut self) -> io::Result<u64>;

    fn at_eof(&mut self) -> io::Result<bool>;

    fn read_exact_into(&mut self, buf: &mut [u8]) -> Result<(), DecodeError> {
        let mut filled = 0;
        while filled < buf.len() {
            match self.read_into(&mut buf[filled..]) {
                Ok(0) => return Err(DecodeError::TruncatedStream),
                Ok(n) => filled += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }
        Ok(())
    }

    fn read_bytes(&mut self, count: usize) -> Result<Box<[u8]>, DecodeError> {
        let mut buffer = vec![0; count];
        self.read_exact_into(&mut buffer)?;
        Ok(buffer.into_boxed_slice())
    }

    fn read_byte(&mut self) -> Result<u8, DecodeError> {
        let mut buffer = [0; 1];
        self.read_exact_into(&mut buffer)?;
        Ok(buffer[0])
    }

    // multi-byte fields are little-endian
    fn read_u16(&mut self) -> Result<u16, DecodeError> {
        let mut buffer = [0; 2];
        self.read_exact_into(&mut buffer)?;
        Ok(u16::from_le_bytes(buffer))
    }
}

impl<T: Read + Seek> ByteSource for T {
    fn read_into(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.read(buf)
    }

    fn seek_to(&mut self, pos: SeekFrom) -> io::Result<u64> {
        self.seek(pos)
    }

    fn tell(&mut self) -> io::Result<u64> {
        self.stream_position()
    }

    fn at_eof(&mut self) -> io::Result<bool> {
        let position = self.stream_position()?;
        let end = self.seek(SeekFrom::End(0))?;
        self.seek(SeekFrom::Start(position))?;
        Ok(position >= end)
    }
}
