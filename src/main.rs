use std::fs::{self, File};
use std::io::BufReader;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use log::info;

mod ppm_writer;

fn main() -> Result<()> {
    env_logger::init();

    let mut args = std::env::args_os().skip(1);
    let Some(input) = args.next().map(PathBuf::from) else {
        bail!("usage: gifload <input.gif> [output-dir]");
    };
    let output_dir = args.next().map(PathBuf::from).unwrap_or_else(|| PathBuf::from("frames"));

    let file = File::open(&input).with_context(|| format!("opening {}", input.display()))?;
    let mut reader = BufReader::new(file);

    if !gifload::is_gif(&mut reader)? {
        bail!("{} is not a GIF", input.display());
    }
    let animation = gifload::decode(&mut reader)
        .with_context(|| format!("decoding {}", input.display()))?;
    info!(
        "{}: {}x{}, {} frame(s), loop {:?}",
        input.display(),
        animation.screen.screen_width,
        animation.screen.screen_height,
        animation.frames.len(),
        animation.loop_count
    );

    fs::create_dir_all(&output_dir)
        .with_context(|| format!("creating {}", output_dir.display()))?;

    for (i, frame) in animation.frames.iter().enumerate() {
        let path = output_dir.join(format!("frame_{i}.ppm"));
        ppm_writer::write_ppm(
            &path,
            animation.screen.screen_width,
            animation.screen.screen_height,
            frame.pixels(),
        )?;
    }
    Ok(())
}
