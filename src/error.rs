use std::io;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("signature {signature:?} is neither GIF87a nor GIF89a")]
    MalformedHeader { signature: String },

    #[error("stream ended in the middle of a block")]
    TruncatedStream,

    #[error("compressed data ran out of sub-blocks before the end code")]
    ShortRead,

    #[error("code {code} has no dictionary entry, next code to be assigned is {next_code}")]
    CorruptDictionary { code: u16, next_code: u16 },

    #[error("LZW minimum code size {0} is out of range")]
    InvalidCodeSize(u8),

    #[error("failed to allocate {0} bytes for frame data")]
    AllocationFailure(usize),

    #[error("stream contained no decodable frames")]
    NoFrames,

    #[error(transparent)]
    Io(io::Error),
}

impl DecodeError {
    pub fn is_fatal(&self) -> bool {
        matches!(self, DecodeError::MalformedHeader { .. })
    }
}

impl From<io::Error> for DecodeError {
    fn from(err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::UnexpectedEof => DecodeError::TruncatedStream,
            _ => DecodeError::Io(err),
        }
    }
}
