mod bit_reader;
mod color_table;
mod compositor;
mod decoder;
mod dictionary;
mod extension;
mod frame;
mod lzw;
mod sub_block;

#[cfg(test)]
pub(crate) mod test_support;

pub use color_table::{ColorTable, Rgba};
pub use decoder::{
    decode, decode_with_options, is_gif, Animation, ClearFill, DecodeOptions, Decoder,
    LogicalScreenDescriptor, Version,
};
pub use extension::{ApplicationBlock, LoopCount};
pub use frame::Frame;

#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DisposalMethod {
    #[default]
    DontCare = 0,
    Overlay = 1,
    Clear = 2,
    Restore = 3,
}

impl DisposalMethod {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(DisposalMethod::DontCare),
            1 => Some(DisposalMethod::Overlay),
            2 => Some(DisposalMethod::Clear),
            3 => Some(DisposalMethod::Restore),
            _ => None,
        }
    }
}
