//! Decoder for animated, interlaced, palette based GIF streams.

mod error;
mod parser;
mod source;

pub use error::DecodeError;
pub use parser::{
    decode, decode_with_options, is_gif, Animation, ApplicationBlock, ClearFill, ColorTable,
    DecodeOptions, Decoder, DisposalMethod, Frame, LogicalScreenDescriptor, LoopCount, Rgba,
    Version,
};
pub use source::ByteSource;
