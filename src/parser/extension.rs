use log::{debug, warn};

use super::sub_block::{SubBlockReader, MAX_SUB_BLOCK_LEN};
use super::DisposalMethod;
use crate::error::DecodeError;
use crate::source::ByteSource;

// Extension labels
const APPLICATION_EXTENSION: u8 = 0xff;
const COMMENT_EXTENSION: u8 = 0xfe;
const GRAPHIC_CONTROL_EXTENSION: u8 = 0xf9;
const PLAIN_TEXT_EXTENSION: u8 = 0x01;

const GRAPHIC_CONTROL_LEN: usize = 4;
const APPLICATION_HEADER_LEN: usize = 11;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ExtensionType {
    Application,
    Comment,
    GraphicControl,
    PlainText,
    Unknown(u8),
}

impl From<u8> for ExtensionType {
    fn from(value: u8) -> Self {
        use ExtensionType::*;

        match value {
            APPLICATION_EXTENSION => Application,
            COMMENT_EXTENSION => Comment,
            GRAPHIC_CONTROL_EXTENSION => GraphicControl,
            PLAIN_TEXT_EXTENSION => PlainText,
            label => Unknown(label),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(crate) struct GraphicControl {
    pub(crate) disposal_method: DisposalMethod,
    pub(crate) user_input: bool,
    pub(crate) delay_time: u16,
    pub(crate) transparent_index: Option<u8>,
}

impl GraphicControl {
    fn parse(block: &[u8]) -> Self {
        // packed fields: XXXYYYZW
        // XXX = reserved
        // YYY = disposal method
        // Z = user input flag
        // W = transparent color flag
        let packed_fields = block[0];
        let disposal = (packed_fields >> 2) & 0b111;
        let disposal_method = DisposalMethod::from_u8(disposal).unwrap_or_else(|| {
            debug!("reserved disposal method {disposal}, treating as don't care");
            DisposalMethod::DontCare
        });

        let transparent_color_flag = packed_fields & 0b0000_0001 != 0;

        Self {
            disposal_method,
            user_input: packed_fields & 0b0000_0010 != 0,
            delay_time: u16::from_le_bytes([block[1], block[2]]),
            transparent_index: transparent_color_flag.then_some(block[3]),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopCount {
    Infinite,
    Number(u16),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplicationBlock {
    pub identifier: String,
    pub authentication_code: Box<[u8]>,
    pub data: Box<[u8]>,
}

impl ApplicationBlock {
    pub fn loop_count(&self) -> Option<LoopCount> {
        let looping = matches!(
            (self.identifier.as_str(), &*self.authentication_code),
            ("NETSCAPE", b"2.0") | ("ANIMEXTS", b"1.0")
        );
        if !looping || self.data.len() < 3 || self.data[0] != 1 {
            return None;
        }

        Some(match u16::from_le_bytes([self.data[1], self.data[2]]) {
            0 => LoopCount::Infinite,
            number => LoopCount::Number(number),
        })
    }
}

#[derive(Debug)]
pub(crate) enum Extension {
    // `None` when the block had the wrong size
    GraphicControl(Option<GraphicControl>),
    Comment(Box<[u8]>),
    PlainText(Box<[u8]>),
    Application(ApplicationBlock),
    Unknown(u8),
}

pub(crate) fn read_extension<S: ByteSource>(
    source: &mut S,
    label: u8,
) -> Result<Extension, DecodeError> {
    let extension_type = ExtensionType::from(label);
    debug!("processing extension type: {:?}", extension_type);

    let mut reader = SubBlockReader::new(source);
    let mut block = [0; MAX_SUB_BLOCK_LEN];

    let extension = match extension_type {
        ExtensionType::GraphicControl => {
            let control = match reader.next_block(&mut block)? {
                Some(GRAPHIC_CONTROL_LEN) => Some(GraphicControl::parse(&block)),
                len => {
                    warn!(
                        "graphic control extension has size {len:?}, expected {GRAPHIC_CONTROL_LEN}"
                    );
                    None
                }
            };
            Extension::GraphicControl(control)
        }
        ExtensionType::Comment => Extension::Comment(reader.read_data_sub_blocks()?),
        ExtensionType::PlainText => {
            // 12 byte text grid header, then the text itself
            reader.next_block(&mut block)?;
            Extension::PlainText(reader.read_data_sub_blocks()?)
        }
        ExtensionType::Application => {
            let header_len = reader.next_block(&mut block)?.unwrap_or(0);
            if header_len != APPLICATION_HEADER_LEN {
                warn!(
                    "application extension header has size {header_len}, \
                     expected {APPLICATION_HEADER_LEN}"
                );
            }
            let header = &block[..header_len];
            let (identifier, authentication_code) = header.split_at(header_len.min(8));
            let identifier = String::from_utf8_lossy(identifier).into_owned();
            let authentication_code = authentication_code.into();

            Extension::Application(ApplicationBlock {
                identifier,
                authentication_code,
                data: reader.read_data_sub_blocks()?,
            })
        }
        ExtensionType::Unknown(label) => Extension::Unknown(label),
    };

    reader.skip_remaining()?;
    Ok(extension)
}
