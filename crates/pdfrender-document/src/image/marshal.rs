// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Pixel-buffer marshaling: turn a rasterizer's (possibly row-padded) output
// into a tightly packed, color-mode tagged buffer.

use pdfrender_core::{ColorMode, PdfRenderError, PixelBuffer, PixelFormat, RasterImage, Result};
use tracing::{debug, instrument};

/// Color mode and tight row length for one pixel format at a given width.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowLayout {
    pub color_mode: ColorMode,
    pub row_len: usize,
}

impl RowLayout {
    /// Tightly packed byte length for `height` rows, or `None` on overflow.
    pub fn buffer_len(&self, height: u32) -> Option<usize> {
        self.row_len.checked_mul(height as usize)
    }
}

/// Map a pixel format to its buffer layout.
///
/// | format | mode   | row length      |
/// |--------|--------|-----------------|
/// | Mono   | Bitmap | `ceil(W / 8)`   |
/// | Gray8  | Gray   | `W`             |
/// | Rgb24  | RGB    | `W * 3`         |
/// | Bgr24  | BGR    | `W * 3`         |
/// | Argb32 | RGBA   | `W * 4`         |
///
/// Returns `None` for [`PixelFormat::Invalid`].
pub fn layout_for(format: PixelFormat, width: u32) -> Option<RowLayout> {
    let color_mode = match format {
        PixelFormat::Invalid => return None,
        PixelFormat::Mono => ColorMode::Bitmap,
        PixelFormat::Gray8 => ColorMode::Gray,
        PixelFormat::Rgb24 => ColorMode::Rgb,
        PixelFormat::Bgr24 => ColorMode::Bgr,
        PixelFormat::Argb32 => ColorMode::Rgba,
    };
    Some(RowLayout {
        color_mode,
        row_len: color_mode.row_len(width),
    })
}

/// Copy a raster into an owned [`PixelBuffer`].
///
/// Each row is copied on its own, so padding past the tight row length is
/// dropped row by row rather than shifting later rows. Returns `Ok(None)` for
/// an invalid raster.
#[instrument(skip_all, fields(
    width = image.width(),
    height = image.height(),
    format = ?image.format(),
    bytes_per_row = image.bytes_per_row(),
))]
pub fn to_buffer(image: &RasterImage) -> Result<Option<PixelBuffer>> {
    let Some(layout) = layout_for(image.format(), image.width()) else {
        debug!("invalid raster format, nothing to marshal");
        return Ok(None);
    };
    if !image.is_valid() {
        debug!("empty raster, nothing to marshal");
        return Ok(None);
    }

    let height = image.height() as usize;
    let stride = image.bytes_per_row();
    if stride < layout.row_len {
        return Err(PdfRenderError::MalformedRaster(format!(
            "row stride {stride} is shorter than a {} row of {} bytes",
            layout.color_mode, layout.row_len
        )));
    }
    let needed = stride
        .checked_mul(height - 1)
        .and_then(|len| len.checked_add(layout.row_len))
        .ok_or_else(|| {
            PdfRenderError::MalformedRaster(format!(
                "{height} rows of stride {stride} overflow the address space"
            ))
        })?;
    if image.data().len() < needed {
        return Err(PdfRenderError::MalformedRaster(format!(
            "raster holds {} bytes, geometry needs {needed}",
            image.data().len()
        )));
    }

    // Bounded by `needed`, which the data already covers.
    let tight_len = layout.row_len * height;
    let mut bytes = Vec::with_capacity(tight_len);
    if stride == layout.row_len {
        bytes.extend_from_slice(&image.data()[..tight_len]);
    } else {
        for row in image.data().chunks(stride).take(height) {
            bytes.extend_from_slice(&row[..layout.row_len]);
        }
    }

    debug!(
        color_mode = layout.color_mode.tag(),
        len = bytes.len(),
        "raster marshaled"
    );
    PixelBuffer::new(image.width(), image.height(), layout.color_mode, bytes).map(Some)
}
