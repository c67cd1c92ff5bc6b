use std::io::Cursor;
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use image::codecs::gif::GifDecoder;
use image::AnimationDecoder;
use image::{DynamicImage, ImageFormat, ImageReader};

use crate::content::MediaImage;

/// Decode an image file into shareable RGBA content.
///
/// Animated GIFs decode to their first frame; a slideshow page shows a
/// still, playback belongs to the host.
pub fn open_image(path: &Path) -> Result<MediaImage> {
    let bytes = std::fs::read(path).with_context(|| format!("Failed to read image: {:?}", path))?;
    let format = image::guess_format(&bytes).ok();

    let decoded: DynamicImage = if format == Some(ImageFormat::Gif) {
        let decoder = GifDecoder::new(Cursor::new(bytes))
            .with_context(|| format!("Failed to decode GIF: {:?}", path))?;
        let mut frames = decoder.into_frames();
        let frame = frames
            .next()
            .ok_or_else(|| anyhow!("GIF has no frames: {:?}", path))?
            .context("Failed to decode GIF frame")?;
        DynamicImage::ImageRgba8(frame.into_buffer())
    } else {
        match format {
            Some(fmt) => image::load_from_memory_with_format(&bytes, fmt)
                .with_context(|| format!("Failed to decode image: {:?}", path))?,
            None => image::load_from_memory(&bytes)
                .with_context(|| format!("Failed to decode image: {:?}", path))?,
        }
    };

    MediaImage::from_dynamic(decoded).ok_or_else(|| anyhow!("Decoded image is empty: {:?}", path))
}

/// Read intrinsic dimensions without a full decode (except GIF, which
/// needs its first frame materialized).
pub fn read_dimensions(path: &Path) -> Result<(u32, u32)> {
    let bytes = std::fs::read(path).with_context(|| format!("Failed to read image: {:?}", path))?;
    let format = image::guess_format(&bytes).ok();

    if format == Some(ImageFormat::Gif) {
        let decoder = GifDecoder::new(Cursor::new(bytes))
            .with_context(|| format!("Failed to decode GIF: {:?}", path))?;
        let mut frames = decoder.into_frames();
        if let Some(frame) = frames.next() {
            let buf = frame.context("Failed to decode GIF frame")?.into_buffer();
            return Ok((buf.width(), buf.height()));
        }
        return Err(anyhow!("GIF has no frames: {:?}", path));
    }

    let reader = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .context("Failed to guess image format")?;
    reader
        .into_dimensions()
        .with_context(|| format!("Failed to read dimensions: {:?}", path))
}
