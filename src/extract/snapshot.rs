//! Serializable view of a live page handed to the extraction engine.
//!
//! The page side captures what a static HTML serialization loses: open
//! shadow roots (their markup is not part of `outerHTML`), same-process
//! frames, and canvas pixel buffers.

use std::io::Cursor;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use image::{DynamicImage, ImageFormat, RgbaImage};
use serde::{Deserialize, Serialize};

use crate::error_handling::ExtractError;

/// One document: its URL, serialized markup and everything nested in it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageSnapshot {
    /// Document URL; relative references resolve against it (or `<base href>`)
    pub url: String,
    pub html: String,
    #[serde(default)]
    pub shadow_roots: Vec<ShadowRootSnapshot>,
    /// Same-process child documents (iframes), scanned with their own base URL
    #[serde(default)]
    pub frames: Vec<PageSnapshot>,
    #[serde(default)]
    pub canvases: Vec<CanvasSnapshot>,
}

impl PageSnapshot {
    pub fn new(url: impl Into<String>, html: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            html: html.into(),
            ..Default::default()
        }
    }
}

/// Markup of an open shadow root plus the shadow roots nested inside it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShadowRootSnapshot {
    pub html: String,
    #[serde(default)]
    pub shadow_roots: Vec<ShadowRootSnapshot>,
}

/// A `<canvas>` element: declared size and, unless tainted, its RGBA pixels.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanvasSnapshot {
    pub width: u32,
    pub height: u32,
    /// `None` when cross-origin content made the pixels unreadable
    #[serde(default)]
    pub rgba: Option<Vec<u8>>,
}

impl CanvasSnapshot {
    /// Serializes the canvas to a `data:image/png;base64,...` URI.
    ///
    /// # Errors
    ///
    /// `ExtractError::TaintedCanvas` when there are no readable pixels,
    /// `ExtractError::CanvasEncode` when the buffer does not match the size
    /// or PNG encoding fails.
    pub fn to_data_url(&self) -> Result<String, ExtractError> {
        let rgba = self.rgba.as_ref().ok_or(ExtractError::TaintedCanvas)?;
        let image = RgbaImage::from_raw(self.width, self.height, rgba.clone()).ok_or_else(|| {
            ExtractError::CanvasEncode(format!(
                "{} bytes for a {}x{} canvas",
                rgba.len(),
                self.width,
                self.height
            ))
        })?;

        let mut png = Vec::new();
        DynamicImage::ImageRgba8(image)
            .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
            .map_err(|e| ExtractError::CanvasEncode(e.to_string()))?;

        Ok(format!("data:image/png;base64,{}", STANDARD.encode(png)))
    }
}
