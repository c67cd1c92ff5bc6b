//! Decoded media content shared between sources, cache, and surfaces.

use std::sync::Arc;

use image::DynamicImage;

use crate::geometry::Size;

/// Decoded RGBA content for one media item.
///
/// Pixel data is kept as tightly-packed RGBA8 so it can cross worker
/// threads and be handed to any surface implementation without another
/// conversion pass.
#[derive(Debug, Clone, PartialEq)]
pub struct MediaImage {
    data: Vec<u8>,
    width: u32,
    height: u32,
}

impl MediaImage {
    /// Wrap raw RGBA8 data. Returns `None` when the buffer length does
    /// not match the claimed dimensions or a dimension is zero. Slack
    /// bytes are rejected too; `byte_len` feeds cache accounting and
    /// must equal the pixel payload.
    pub fn from_rgba(data: Vec<u8>, width: u32, height: u32) -> Option<Self> {
        if width == 0 || height == 0 {
            return None;
        }
        let expected = (width as u64)
            .saturating_mul(height as u64)
            .saturating_mul(4);
        if (data.len() as u64) != expected {
            tracing::warn!(
                "rejecting media content: {} bytes for {}x{}, expected {}",
                data.len(),
                width,
                height,
                expected
            );
            return None;
        }
        Some(Self {
            data,
            width,
            height,
        })
    }

    pub fn from_dynamic(img: DynamicImage) -> Option<Self> {
        let rgba = img.to_rgba8();
        let (width, height) = rgba.dimensions();
        Self::from_rgba(rgba.into_raw(), width, height)
    }

    /// Single-color content, handy for placeholders.
    pub fn solid(width: u32, height: u32, rgba: [u8; 4]) -> Option<Self> {
        let pixels = (width as usize).checked_mul(height as usize)?;
        Self::from_rgba(rgba.repeat(pixels), width, height)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Intrinsic content size in pixels.
    pub fn size(&self) -> Size {
        Size::new(self.width as f64, self.height as f64)
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Approximate heap footprint, used for cache budgeting.
    pub fn byte_len(&self) -> usize {
        self.data.len()
    }
}

/// Shared handle to decoded content.
pub type SharedImage = Arc<MediaImage>;
