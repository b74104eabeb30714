use std::fmt::Debug;
use std::io::SeekFrom;

use log::{debug, trace, warn};

use super::color_table::{ColorTable, Rgba};
use super::compositor::Compositor;
use super::extension::{self, ApplicationBlock, Extension, GraphicControl, LoopCount};
use super::frame::Frame;
use crate::error::DecodeError;
use crate::source::ByteSource;

const SIGNATURE_LEN: usize = 6;

const EXTENSION_INTRODUCER: u8 = 0x21;
const IMAGE_DESCRIPTOR_LABEL: u8 = 0x2c;
const TRAILER_LABEL: u8 = 0x3b;
const BLOCK_TERMINATOR: u8 = 0x00;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Version {
    V87a,
    V89a,
}

impl TryFrom<&[u8]> for Version {
    type Error = DecodeError;

    fn try_from(signature: &[u8]) -> Result<Self, Self::Error> {
        match signature {
            b"GIF87a" => Ok(Version::V87a),
            b"GIF89a" => Ok(Version::V89a),
            other => Err(DecodeError::MalformedHeader {
                signature: String::from_utf8_lossy(other).into_owned(),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogicalScreenDescriptor {
    pub screen_width: u16,
    pub screen_height: u16,
    pub global_color_table_flag: bool,
    pub color_resolution: u8,
    pub sort_flag: bool,
    pub global_color_table_exponent: u8,
    pub background_color_index: u8,
    pub pixel_aspect_ratio: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ClearFill {
    #[default]
    Transparent,
    /// The global table's background color, opaque. Transparent without a global table.
    Background,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DecodeOptions {
    pub clear_fill: ClearFill,
}

#[derive(Debug, Clone)]
pub struct Animation {
    pub version: Version,
    pub screen: LogicalScreenDescriptor,
    pub global_color_table: Option<ColorTable>,
    pub frames: Vec<Frame>,
    pub comments: Vec<String>,
    pub plain_text: Vec<String>,
    pub applications: Vec<ApplicationBlock>,
    pub loop_count: Option<LoopCount>,
}

#[derive(Debug)]
enum ParserState {
    ProcessMagic,
    ProcessLogicalScreenDescriptor,
    ProcessGlobalColorTable,
    ProcessTrailer,

    DetermineNextBlock(Option<GraphicControl>),
    ProcessExtension(u8, Option<GraphicControl>),
    ProcessImageDescriptor(Option<GraphicControl>),

    Done,
}

pub struct Decoder<'a, S: ByteSource> {
    inner: &'a mut S,
    options: DecodeOptions,
    version: Option<Version>,
    logical_screen_descriptor: Option<LogicalScreenDescriptor>,
    global_color_table: Option<ColorTable>,
    compositor: Compositor,
    frames: Vec<Frame>,
    comments: Vec<String>,
    plain_text: Vec<String>,
    applications: Vec<ApplicationBlock>,
    loop_count: Option<LoopCount>,
}

impl<'a, S: ByteSource> Decoder<'a, S> {
    pub fn new(inner: &'a mut S) -> Self {
        Self::with_options(inner, DecodeOptions::default())
    }

    pub fn with_options(inner: &'a mut S, options: DecodeOptions) -> Self {
        Self {
            inner,
            options,
            version: None,
            logical_screen_descriptor: None,
            global_color_table: None,
            compositor: Compositor::new(0, 0, Rgba::TRANSPARENT),
            frames: Vec::new(),
            comments: Vec::new(),
            plain_text: Vec::new(),
            applications: Vec::new(),
            loop_count: None,
        }
    }

    /// Runs the block loop until the trailer, the end of the stream or an error.
    ///
    /// A bad signature always fails. Any other error fails only when no frame has been
    /// decoded yet; otherwise the frames decoded so far are kept and `Ok` is returned.
    pub fn parse(&mut self) -> Result<(), DecodeError> {
        let mut state = ParserState::ProcessMagic;

        loop {
            debug!("begin parsing state {:?}", state);

            state = match self.process_next_state(state) {
                Ok(ParserState::Done) => break,
                Ok(next_state) => next_state,
                Err(err) if err.is_fatal() || self.frames.is_empty() => return Err(err),
                Err(err) => {
                    warn!("stopping after {} frame(s): {err}", self.frames.len());
                    break;
                }
            };
        }

        if self.frames.is_empty() {
            return Err(DecodeError::NoFrames);
        }
        Ok(())
    }

    fn process_next_state(&mut self, next_state: ParserState) -> Result<ParserState, DecodeError> {
        use ParserState::*;

        match next_state {
            ProcessMagic => {
                let mut signature = [0; SIGNATURE_LEN];
                let read = read_up_to(&mut *self.inner, &mut signature)?;
                self.version = Some(Version::try_from(&signature[..read])?);
                debug!("processed signature, got {:?}", self.version);

                Ok(ProcessLogicalScreenDescriptor)
            }
            ProcessLogicalScreenDescriptor => {
                let screen_width = self.inner.read_u16()?;
                let screen_height = self.inner.read_u16()?;

                let packed_fields = self.inner.read_byte()?;

                // packed field start
                let global_color_table_flag = packed_fields & 0b1000_0000 != 0;
                let color_resolution = (packed_fields >> 4) & 0b0000_0111;
                let sort_flag = packed_fields & 0b0000_1000 != 0;
                let global_color_table_exponent = packed_fields & 0b0000_0111;
                // packed field end

                let background_color_index = self.inner.read_byte()?;
                let pixel_aspect_ratio = self.inner.read_byte()?;

                let screen = LogicalScreenDescriptor {
                    screen_width,
                    screen_height,
                    global_color_table_flag,
                    color_resolution,
                    sort_flag,
                    global_color_table_exponent,
                    background_color_index,
                    pixel_aspect_ratio,
                };
                debug!("processed logical screen descriptor, got: {:#?}", screen);
                self.logical_screen_descriptor = Some(screen);

                if global_color_table_flag {
                    Ok(ProcessGlobalColorTable)
                } else {
                    Ok(self.enter_block_loop(screen))
                }
            }
            ProcessGlobalColorTable => {
                let Some(screen) = self.logical_screen_descriptor else {
                    return Ok(ProcessLogicalScreenDescriptor);
                };
                let table = ColorTable::read(&mut *self.inner, screen.global_color_table_exponent)?;
                debug!("processed global color table with {} entries", table.len());
                self.global_color_table = Some(table);

                Ok(self.enter_block_loop(screen))
            }
            ProcessTrailer => Ok(Done),
            DetermineNextBlock(graphic_control) => {
                let mut introducer = [0];
                if self.inner.read_into(&mut introducer)? == 0 {
                    warn!("stream ended without a trailer");
                    return Ok(ProcessTrailer);
                }

                let introducer_or_label = introducer[0];
                trace!(
                    "block 0x{:02x} at {:?}",
                    introducer_or_label,
                    self.inner.tell().ok().map(|pos| pos - 1)
                );

                match introducer_or_label {
                    // extension introducer means that a label follows determining what exact type
                    // of extension it is.
                    EXTENSION_INTRODUCER => {
                        Ok(ProcessExtension(self.inner.read_byte()?, graphic_control))
                    }
                    IMAGE_DESCRIPTOR_LABEL => Ok(ProcessImageDescriptor(graphic_control)),
                    TRAILER_LABEL => Ok(ProcessTrailer),
                    BLOCK_TERMINATOR => Ok(DetermineNextBlock(graphic_control)),
                    label => {
                        // resynchronize by trying the next byte
                        debug!("skipping unexpected byte 0x{label:02x}");
                        Ok(DetermineNextBlock(graphic_control))
                    }
                }
            }
            ProcessExtension(label, graphic_control) => {
                self.process_extension(label, graphic_control)
            }
            ProcessImageDescriptor(graphic_control) => {
                let frame = self.compositor.compose(
                    &mut *self.inner,
                    self.global_color_table.as_ref(),
                    graphic_control,
                )?;
                debug!(
                    "processed frame {}: {}x{} at ({}, {}), {:?}, {} ms",
                    self.frames.len(),
                    frame.width,
                    frame.height,
                    frame.left,
                    frame.top,
                    frame.disposal_method,
                    frame.duration_ms()
                );
                self.frames.push(frame);

                Ok(DetermineNextBlock(None))
            }
            Done => Ok(Done),
        }
    }

    fn enter_block_loop(&mut self, screen: LogicalScreenDescriptor) -> ParserState {
        let fill = match self.options.clear_fill {
            ClearFill::Transparent => Rgba::TRANSPARENT,
            ClearFill::Background => self
                .global_color_table
                .as_ref()
                .and_then(|table| table.get(screen.background_color_index))
                .unwrap_or(Rgba::TRANSPARENT),
        };
        self.compositor = Compositor::new(screen.screen_width, screen.screen_height, fill);

        ParserState::DetermineNextBlock(None)
    }

    fn process_extension(
        &mut self,
        label: u8,
        graphic_control: Option<GraphicControl>,
    ) -> Result<ParserState, DecodeError> {
        let extension = extension::read_extension(&mut *self.inner, label)?;

        let graphic_control = match extension {
            Extension::GraphicControl(Some(control)) => {
                debug!("processed GraphicControlExtension: {:#?}", control);
                if graphic_control.is_some() {
                    debug!("previous graphic control extension was never used");
                }
                Some(control)
            }
            Extension::GraphicControl(None) => graphic_control,
            Extension::Comment(data) => {
                let text = String::from_utf8_lossy(&data).into_owned();
                debug!("processed comment block, got: {}", text);
                self.comments.push(text);
                graphic_control
            }
            Extension::PlainText(data) => {
                self.plain_text.push(String::from_utf8_lossy(&data).into_owned());
                graphic_control
            }
            Extension::Application(block) => {
                if let Some(loop_count) = block.loop_count() {
                    self.loop_count = Some(loop_count);
                }
                debug!("processed application block, got: {:#?}", block);
                self.applications.push(block);
                graphic_control
            }
            Extension::Unknown(label) => {
                debug!("skipped extension with unknown label 0x{label:02x}");
                graphic_control
            }
        };

        Ok(ParserState::DetermineNextBlock(graphic_control))
    }

    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    pub fn version(&self) -> Option<Version> {
        self.version
    }

    pub fn logical_screen_descriptor(&self) -> Option<&LogicalScreenDescriptor> {
        self.logical_screen_descriptor.as_ref()
    }

    pub fn global_color_table(&self) -> Option<&ColorTable> {
        self.global_color_table.as_ref()
    }

    pub fn comments(&self) -> &[String] {
        &self.comments
    }

    pub fn loop_count(&self) -> Option<LoopCount> {
        self.loop_count
    }

    pub fn into_animation(self) -> Option<Animation> {
        Some(Animation {
            version: self.version?,
            screen: self.logical_screen_descriptor?,
            global_color_table: self.global_color_table,
            frames: self.frames,
            comments: self.comments,
            plain_text: self.plain_text,
            applications: self.applications,
            loop_count: self.loop_count,
        })
    }
}

impl<S: ByteSource> Debug for Decoder<'_, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Decoder")
            .field("version", &self.version)
            .field("logical_screen_descriptor", &self.logical_screen_descriptor)
            .field("frames", &self.frames.len())
            .field("loop_count", &self.loop_count)
            .finish_non_exhaustive()
    }
}

fn read_up_to<S: ByteSource>(source: &mut S, buf: &mut [u8]) -> Result<usize, DecodeError> {
    let mut filled = 0;
    while filled < buf.len() {
        match source.read_into(&mut buf[filled..])? {
            0 => break,
            n => filled += n,
        }
    }
    Ok(filled)
}

pub fn decode<S: ByteSource>(source: &mut S) -> Result<Animation, DecodeError> {
    decode_with_options(source, DecodeOptions::default())
}

pub fn decode_with_options<S: ByteSource>(
    source: &mut S,
    options: DecodeOptions,
) -> Result<Animation, DecodeError> {
    let mut decoder = Decoder::with_options(source, options);
    decoder.parse()?;
    decoder.into_animation().ok_or(DecodeError::NoFrames)
}

pub fn is_gif<S: ByteSource>(source: &mut S) -> Result<bool, DecodeError> {
    let start = source.tell()?;
    let mut signature = [0; SIGNATURE_LEN];
    let read = read_up_to(source, &mut signature)?;
    source.seek_to(SeekFrom::Start(start))?;

    Ok(Version::try_from(&signature[..read]).is_ok())
}
