use super::color_table::{ColorTable, Rgba};
use super::DisposalMethod;

#[derive(Debug, Clone)]
pub struct Frame {
    // sub-image rectangle on the logical screen
    pub left: u16,
    pub top: u16,
    pub width: u16,
    pub height: u16,

    pub interlaced: bool,
    // applies to the canvas of the next frame
    pub disposal_method: DisposalMethod,
    pub delay_hundredths: u16,
    pub transparent_index: Option<u8>,
    pub user_input: bool,

    pub(crate) palette: ColorTable,
    pub(crate) indices: Box<[u8]>,
    pub(crate) pixels: Box<[Rgba]>,
}

impl Frame {
    pub fn duration_ms(&self) -> u32 {
        self.delay_hundredths as u32 * 10
    }

    pub fn palette(&self) -> &ColorTable {
        &self.palette
    }

    // de-interlaced, pixels the data never reached stay 0
    pub fn indices(&self) -> &[u8] {
        &self.indices
    }

    pub fn pixels(&self) -> &[Rgba] {
        &self.pixels
    }
}
