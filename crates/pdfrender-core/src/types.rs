// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core raster types: pixel formats produced by rasterizers, the color modes
// handed to image sinks, and the two buffers that carry pixels between them.

use serde::{Deserialize, Serialize};

use crate::error::{PdfRenderError, Result};

/// Pixel encodings a rasterizer can produce.
///
/// The numeric codes follow the poppler `image::format_enum` numbering, which
/// is what foreign engines report through [`PixelFormat::from_code`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PixelFormat {
    /// The rasterizer failed to produce an image.
    Invalid,
    /// 1 bit per pixel, most significant bit first, set bit = white.
    Mono,
    /// 8-bit luma.
    Gray8,
    /// 8-bit R, G, B.
    Rgb24,
    /// 8-bit B, G, R.
    Bgr24,
    /// 32-bit ARGB words stored little-endian, i.e. bytes B, G, R, A.
    Argb32,
}

impl PixelFormat {
    /// Decode an engine format code.
    pub fn from_code(code: u32) -> Result<Self> {
        match code {
            0 => Ok(Self::Invalid),
            1 => Ok(Self::Mono),
            2 => Ok(Self::Rgb24),
            3 => Ok(Self::Argb32),
            4 => Ok(Self::Gray8),
            5 => Ok(Self::Bgr24),
            other => Err(PdfRenderError::UnsupportedFormat(other)),
        }
    }

    /// Engine format code, inverse of [`PixelFormat::from_code`].
    pub fn code(&self) -> u32 {
        match self {
            Self::Invalid => 0,
            Self::Mono => 1,
            Self::Rgb24 => 2,
            Self::Argb32 => 3,
            Self::Gray8 => 4,
            Self::Bgr24 => 5,
        }
    }
}

/// Color mode of a [`PixelBuffer`], as understood by image sinks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ColorMode {
    Bitmap,
    Gray,
    Rgb,
    Bgr,
    Rgba,
}

impl ColorMode {
    /// Mode tag passed to image sinks.
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Bitmap => "1",
            Self::Gray => "L",
            Self::Rgb => "RGB",
            Self::Bgr => "BGR",
            Self::Rgba => "RGBA",
        }
    }

    /// Tightly packed length of one row of `width` pixels.
    pub fn row_len(&self, width: u32) -> usize {
        let width = width as usize;
        match self {
            Self::Bitmap => width.div_ceil(8),
            Self::Gray => width,
            Self::Rgb | Self::Bgr => width * 3,
            Self::Rgba => width * 4,
        }
    }

    /// Tightly packed length of a `width` x `height` buffer, or `None` if it
    /// does not fit in `usize`.
    pub fn buffer_len(&self, width: u32, height: u32) -> Option<usize> {
        self.row_len(width).checked_mul(height as usize)
    }
}

impl std::fmt::Display for ColorMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.tag())
    }
}

/// Byte order of the pixels handed to an image sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RawByteOrder {
    /// Bytes are already in the color mode's channel order.
    Raw,
    /// 32-bit pixels stored B, G, R, A.
    Bgra,
}

impl RawByteOrder {
    /// Byte order of buffers in `mode`: RGBA buffers come from ARGB32 rasters
    /// and therefore carry BGRA bytes.
    pub fn for_mode(mode: ColorMode) -> Self {
        match mode {
            ColorMode::Rgba => Self::Bgra,
            ColorMode::Bitmap | ColorMode::Gray | ColorMode::Rgb | ColorMode::Bgr => Self::Raw,
        }
    }

    pub fn tag(&self) -> &'static str {
        match self {
            Self::Raw => "raw",
            Self::Bgra => "BGRA",
        }
    }
}

/// Output of a single rasterization call.
///
/// Rows start every `bytes_per_row` bytes; a row may carry trailing padding
/// past its tightly packed length.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RasterImage {
    width: u32,
    height: u32,
    format: PixelFormat,
    bytes_per_row: usize,
    data: Vec<u8>,
}

impl RasterImage {
    pub fn new(
        width: u32,
        height: u32,
        format: PixelFormat,
        bytes_per_row: usize,
        data: Vec<u8>,
    ) -> Self {
        Self {
            width,
            height,
            format,
            bytes_per_row,
            data,
        }
    }

    /// Build a raster from an engine-reported format code.
    pub fn from_code(
        width: u32,
        height: u32,
        format_code: u32,
        bytes_per_row: usize,
        data: Vec<u8>,
    ) -> Result<Self> {
        let format = PixelFormat::from_code(format_code)?;
        Ok(Self::new(width, height, format, bytes_per_row, data))
    }

    /// The "nothing was rendered" raster.
    pub fn invalid() -> Self {
        Self::new(0, 0, PixelFormat::Invalid, 0, Vec::new())
    }

    pub fn is_valid(&self) -> bool {
        self.format != PixelFormat::Invalid && self.width > 0 && self.height > 0
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn format(&self) -> PixelFormat {
        self.format
    }

    pub fn bytes_per_row(&self) -> usize {
        self.bytes_per_row
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }
}

/// Tightly packed pixels tagged with a color mode, ready for an image sink.
///
/// Both dimensions are non-zero and the byte length always equals
/// [`ColorMode::buffer_len`] for them; construction rejects anything else.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    width: u32,
    height: u32,
    color_mode: ColorMode,
    bytes: Vec<u8>,
}

impl PixelBuffer {
    pub fn new(width: u32, height: u32, color_mode: ColorMode, bytes: Vec<u8>) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(PdfRenderError::MalformedRaster(format!(
                "{width}x{height} {color_mode} buffer has no pixels"
            )));
        }
        let expected = color_mode.buffer_len(width, height).ok_or_else(|| {
            PdfRenderError::MalformedRaster(format!(
                "{width}x{height} {color_mode} buffer does not fit in memory"
            ))
        })?;
        if bytes.len() != expected {
            return Err(PdfRenderError::MalformedRaster(format!(
                "{width}x{height} {color_mode} buffer needs {expected} bytes, got {}",
                bytes.len()
            )));
        }
        Ok(Self {
            width,
            height,
            color_mode,
            bytes,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn color_mode(&self) -> ColorMode {
        self.color_mode
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}
