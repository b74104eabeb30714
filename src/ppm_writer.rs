use std::fs::File;
use std::io::{prelude::*, BufWriter};
use std::path::Path;

use anyhow::{Context, Result};
use gifload::Rgba;

const MAGIC_NUMBER: &[u8] = b"P3";

pub fn write_ppm(path: &Path, width: u16, height: u16, pixels: &[Rgba]) -> Result<()> {
    let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    log::debug!("writing {}", path.display());

    let mut writer = BufWriter::new(file);
    write_pixels(&mut writer, width, height, pixels)?;
    writer.flush()?;
    Ok(())
}

// alpha is dropped, P3 has no channel for it
fn write_pixels<W: Write>(writer: &mut W, width: u16, height: u16, pixels: &[Rgba]) -> Result<()> {
    writer.write_all(MAGIC_NUMBER)?;
    writer.write_all(b"\n")?;
    writer.write_all(format!("{} {}", width, height).as_bytes())?;
    writer.write_all(b" 255")?;
    writer.write_all(b"\n")?;

    if width == 0 {
        return Ok(());
    }
    for pixel_row in pixels.chunks(width as usize).take(height as usize) {
        for (i, pixel) in pixel_row.iter().enumerate() {
            let triplet = format!("{: >3} {: >3} {: >3}", pixel.r, pixel.g, pixel.b);
            writer.write_all(triplet.as_bytes())?;
            if i + 1 != pixel_row.len() {
                writer.write_all(b" ")?;
            }
        }
        writer.write_all(b"\n")?;
    }

    Ok(())
}
