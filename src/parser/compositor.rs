use std::mem::size_of;

use log::{debug, warn};

use super::color_table::{ColorTable, Rgba};
use super::extension::GraphicControl;
use super::frame::Frame;
use super::lzw::LzwDecoder;
use super::DisposalMethod;
use crate::error::DecodeError;
use crate::source::ByteSource;

// (stride, first row) of each interlace pass
const INTERLACE_PASSES: [(usize, usize); 4] = [(8, 0), (8, 4), (4, 2), (2, 1)];
const PROGRESSIVE: [(usize, usize); 1] = [(1, 0)];

#[derive(Debug, Clone, Copy)]
pub(crate) struct ImageDescriptor {
    pub(crate) left: u16,
    pub(crate) top: u16,
    pub(crate) width: u16,
    pub(crate) height: u16,

    pub(crate) interlaced: bool,
    pub(crate) local_table_exponent: Option<u8>,
}

impl ImageDescriptor {
    pub(crate) fn read<S: ByteSource>(source: &mut S) -> Result<Self, DecodeError> {
        let left = source.read_u16()?;
        let top = source.read_u16()?;
        let width = source.read_u16()?;
        let height = source.read_u16()?;

        let packed_fields = source.read_byte()?;
        let local_color_table_flag = packed_fields & 0b1000_0000 != 0;

        Ok(Self {
            left,
            top,
            width,
            height,
            interlaced: packed_fields & 0b0100_0000 != 0,
            local_table_exponent: local_color_table_flag.then_some(packed_fields & 0b0000_0111),
        })
    }
}

// rows of a sub-image in the order its pixels arrive
pub(crate) fn row_order(height: u16, interlaced: bool) -> impl Iterator<Item = usize> {
    let passes: &'static [(usize, usize)] = if interlaced {
        &INTERLACE_PASSES
    } else {
        &PROGRESSIVE
    };
    let height = height as usize;

    passes
        .iter()
        .flat_map(move |&(stride, start)| (start..height).step_by(stride))
}

fn try_filled<T: Clone>(len: usize, value: T) -> Result<Vec<T>, DecodeError> {
    let mut buffer = Vec::new();
    buffer
        .try_reserve_exact(len)
        .map_err(|_| DecodeError::AllocationFailure(len.saturating_mul(size_of::<T>())))?;
    buffer.resize(len, value);
    Ok(buffer)
}

fn try_copied<T: Copy>(from: &[T]) -> Result<Vec<T>, DecodeError> {
    let mut buffer = Vec::new();
    buffer
        .try_reserve_exact(from.len())
        .map_err(|_| DecodeError::AllocationFailure(std::mem::size_of_val(from)))?;
    buffer.extend_from_slice(from);
    Ok(buffer)
}

pub(crate) struct Compositor {
    screen_width: u16,
    screen_height: u16,
    fill: Rgba,

    // composite of the last frame, None before the first one
    canvas: Option<Box<[Rgba]>>,
    previous_disposal: DisposalMethod,
    // canvas as prepared for the last frame, kept only when that frame asked to be restored
    restore_snapshot: Option<Box<[Rgba]>>,
    frame_index: usize,
}

impl Compositor {
    pub(crate) fn new(screen_width: u16, screen_height: u16, fill: Rgba) -> Self {
        Self {
            screen_width,
            screen_height,
            fill,
            canvas: None,
            previous_disposal: DisposalMethod::DontCare,
            restore_snapshot: None,
            frame_index: 0,
        }
    }

    /// Reads one image block (descriptor, optional local table, image data) and draws it.
    ///
    /// An error means the frame was abandoned and the compositor is unchanged. A corrupt or
    /// short code stream inside intact sub-blocks only cuts the pixel fill short.
    pub(crate) fn compose<S: ByteSource>(
        &mut self,
        source: &mut S,
        global_table: Option<&ColorTable>,
        control: Option<GraphicControl>,
    ) -> Result<Frame, DecodeError> {
        let descriptor = ImageDescriptor::read(source)?;
        debug!("frame {}: {:?}", self.frame_index, descriptor);

        let palette = match descriptor.local_table_exponent {
            Some(exponent) => ColorTable::read(source, exponent)?,
            None => global_table.cloned().unwrap_or_else(|| {
                warn!("frame {} has no color table, drawing black", self.frame_index);
                ColorTable::default()
            }),
        };
        let control = control.unwrap_or_default();

        let mut canvas = self.prepare_canvas()?;
        let snapshot = match control.disposal_method {
            DisposalMethod::Restore => Some(try_copied(&canvas)?.into_boxed_slice()),
            _ => None,
        };
        let width = descriptor.width as usize;
        let mut indices = try_filled(width * descriptor.height as usize, 0u8)?;

        let min_code_size = source.read_byte()?;
        let mut decoder = LzwDecoder::new(source, min_code_size)?;

        let written = self.draw(
            &descriptor,
            &palette,
            &control,
            &mut decoder,
            &mut canvas,
            &mut indices,
        )?;
        if written < indices.len() {
            warn!(
                "frame {}: image data covered {written} of {} pixels",
                self.frame_index,
                indices.len()
            );
        }

        let skipped = decoder.finish()?;
        if skipped > 0 {
            debug!("frame {}: skipped {skipped} trailing data bytes", self.frame_index);
        }

        let composite = canvas.into_boxed_slice();
        self.canvas = Some(try_copied(&composite)?.into_boxed_slice());
        self.previous_disposal = control.disposal_method;
        self.restore_snapshot = snapshot;
        self.frame_index += 1;

        Ok(Frame {
            left: descriptor.left,
            top: descriptor.top,
            width: descriptor.width,
            height: descriptor.height,
            interlaced: descriptor.interlaced,
            disposal_method: control.disposal_method,
            delay_hundredths: control.delay_time,
            transparent_index: control.transparent_index,
            user_input: control.user_input,
            palette,
            indices: indices.into_boxed_slice(),
            pixels: composite,
        })
    }

    fn prepare_canvas(&self) -> Result<Vec<Rgba>, DecodeError> {
        let carried = match (&self.canvas, self.previous_disposal) {
            (None, _) => None,
            (Some(canvas), DisposalMethod::DontCare | DisposalMethod::Overlay) => Some(canvas),
            (Some(_), DisposalMethod::Clear) => None,
            (Some(_), DisposalMethod::Restore) => self.restore_snapshot.as_ref(),
        };

        match carried {
            Some(pixels) => try_copied(pixels),
            None => try_filled(self.screen_len(), self.fill),
        }
    }

    // damaged or short compressed data only cuts the fill short, running out of input
    // abandons the frame
    fn draw<S: ByteSource>(
        &self,
        descriptor: &ImageDescriptor,
        palette: &ColorTable,
        control: &GraphicControl,
        decoder: &mut LzwDecoder<'_, S>,
        canvas: &mut [Rgba],
        indices: &mut [u8],
    ) -> Result<usize, DecodeError> {
        let screen_width = self.screen_width as usize;
        let screen_height = self.screen_height as usize;
        let width = descriptor.width as usize;
        let mut written = 0;

        for row in row_order(descriptor.height, descriptor.interlaced) {
            for col in 0..width {
                let index = match decoder.next_index() {
                    Ok(Some(index)) => palette.reduce(index),
                    Ok(None) => return Ok(written),
                    Err(err @ (DecodeError::CorruptDictionary { .. } | DecodeError::ShortRead)) => {
                        warn!("frame {}: {err}", self.frame_index);
                        return Ok(written);
                    }
                    Err(err) => return Err(err),
                };
                indices[row * width + col] = index;
                written += 1;

                let x = descriptor.left as usize + col;
                let y = descriptor.top as usize + row;
                if x >= screen_width || y >= screen_height {
                    continue;
                }

                let mut color = palette.resolve(index);
                if control.transparent_index == Some(index) {
                    // later frames show whatever the disposal left underneath
                    if self.frame_index > 0 {
                        continue;
                    }
                    color.a = 0;
                }
                canvas[y * screen_width + x] = color;
            }
        }

        Ok(written)
    }

    fn screen_len(&self) -> usize {
        self.screen_width as usize * self.screen_height as usize
    }
}
