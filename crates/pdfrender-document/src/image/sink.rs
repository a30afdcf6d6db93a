// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Image sinks: build a caller-facing image object from a marshaled pixel
// buffer. `DynamicImageSink` targets the `image` crate.

use image::{DynamicImage, GrayImage, ImageFormat, RgbImage, RgbaImage};
use pdfrender_core::{ColorMode, PdfRenderError, PixelBuffer, RawByteOrder, Result};
use tracing::{debug, instrument};

/// Something that can turn raw pixels into an image object.
pub trait ImageSink {
    type Image;

    /// Build an image of `size` from tightly packed `bytes` in `mode`, whose
    /// channels are laid out as `order` says.
    fn from_bytes(
        &self,
        mode: ColorMode,
        size: (u32, u32),
        bytes: &[u8],
        order: RawByteOrder,
    ) -> Result<Self::Image>;

    /// Attach resolution metadata. Sinks without a place for it ignore it.
    fn set_dpi(&self, _image: &mut Self::Image, _dpi: (u32, u32)) {}
}

/// Hand a pixel buffer to `sink` and tag the result with `dpi` on both axes.
#[instrument(skip_all, fields(
    width = buffer.width(),
    height = buffer.height(),
    mode = buffer.color_mode().tag(),
    dpi,
))]
pub fn to_image<S: ImageSink>(sink: &S, buffer: &PixelBuffer, dpi: u32) -> Result<S::Image> {
    let order = RawByteOrder::for_mode(buffer.color_mode());
    let mut image = sink.from_bytes(buffer.color_mode(), buffer.size(), buffer.bytes(), order)?;
    sink.set_dpi(&mut image, (dpi, dpi));
    debug!(order = order.tag(), "image built");
    Ok(image)
}

/// [`ImageSink`] producing [`RenderedImage`]s backed by `image::DynamicImage`.
///
/// `Bitmap` buffers are unpacked to 8-bit luma (0 or 255); `BGR` and `BGRA`
/// bytes are reordered to RGB and RGBA.
#[derive(Debug, Clone, Copy, Default)]
pub struct DynamicImageSink;

impl ImageSink for DynamicImageSink {
    type Image = RenderedImage;

    fn from_bytes(
        &self,
        mode: ColorMode,
        size: (u32, u32),
        bytes: &[u8],
        order: RawByteOrder,
    ) -> Result<RenderedImage> {
        let (width, height) = size;
        if width == 0 || height == 0 {
            return Err(PdfRenderError::ImageSink(format!(
                "{width}x{height} {mode} image has no pixels"
            )));
        }
        let expected = mode.buffer_len(width, height).ok_or_else(|| {
            PdfRenderError::ImageSink(format!(
                "{width}x{height} {mode} image does not fit in memory"
            ))
        })?;
        if bytes.len() != expected {
            return Err(PdfRenderError::ImageSink(format!(
                "{width}x{height} {mode} image needs {expected} bytes, got {}",
                bytes.len()
            )));
        }
        if order == RawByteOrder::Bgra && mode != ColorMode::Rgba {
            return Err(PdfRenderError::ImageSink(format!(
                "raw order {} does not apply to mode {mode}",
                order.tag()
            )));
        }

        let image = match mode {
            ColorMode::Bitmap => {
                let row_len = mode.row_len(width);
                let mut luma = Vec::with_capacity(width as usize * height as usize);
                for row in bytes.chunks_exact(row_len) {
                    luma.extend((0..width as usize).map(|x| {
                        if row[x / 8] & (0x80 >> (x % 8)) != 0 {
                            255
                        } else {
                            0
                        }
                    }));
                }
                GrayImage::from_raw(width, height, luma).map(DynamicImage::ImageLuma8)
            }
            ColorMode::Gray => {
                GrayImage::from_raw(width, height, bytes.to_vec()).map(DynamicImage::ImageLuma8)
            }
            ColorMode::Rgb => {
                RgbImage::from_raw(width, height, bytes.to_vec()).map(DynamicImage::ImageRgb8)
            }
            ColorMode::Bgr => {
                let rgb = swap_red_blue(bytes, 3);
                RgbImage::from_raw(width, height, rgb).map(DynamicImage::ImageRgb8)
            }
            ColorMode::Rgba => {
                let rgba = match order {
                    RawByteOrder::Bgra => swap_red_blue(bytes, 4),
                    RawByteOrder::Raw => bytes.to_vec(),
                };
                RgbaImage::from_raw(width, height, rgba).map(DynamicImage::ImageRgba8)
            }
        };

        let image = image.ok_or_else(|| {
            PdfRenderError::ImageSink(format!(
                "pixel container does not fit a {width}x{height} {mode} image"
            ))
        })?;
        Ok(RenderedImage {
            image,
            color_mode: mode,
            dpi: None,
        })
    }

    fn set_dpi(&self, image: &mut RenderedImage, dpi: (u32, u32)) {
        image.dpi = Some(dpi);
    }
}

fn swap_red_blue(bytes: &[u8], channels: usize) -> Vec<u8> {
    let mut out = bytes.to_vec();
    for pixel in out.chunks_exact_mut(channels) {
        pixel.swap(0, 2);
    }
    out
}

/// A rendered page as an in-memory image.
#[derive(Debug, Clone)]
pub struct RenderedImage {
    image: DynamicImage,
    color_mode: ColorMode,
    dpi: Option<(u32, u32)>,
}

impl RenderedImage {
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Color mode of the buffer this image was built from.
    pub fn color_mode(&self) -> ColorMode {
        self.color_mode
    }

    /// Resolution the page was rendered at, if recorded.
    pub fn dpi(&self) -> Option<(u32, u32)> {
        self.dpi
    }

    pub fn as_dynamic(&self) -> &DynamicImage {
        &self.image
    }

    pub fn into_dynamic(self) -> DynamicImage {
        self.image
    }

    /// Encode as PNG.
    pub fn to_png_bytes(&self) -> Result<Vec<u8>> {
        let mut buffer = Vec::new();
        let mut cursor = std::io::Cursor::new(&mut buffer);
        self.image
            .write_to(&mut cursor, ImageFormat::Png)
            .map_err(|err| PdfRenderError::ImageSink(format!("failed to encode png: {err}")))?;
        Ok(buffer)
    }

    /// Save to `path`; the format follows the file extension.
    pub fn save(&self, path: impl AsRef<std::path::Path>) -> Result<()> {
        self.image.save(path.as_ref()).map_err(|err| {
            PdfRenderError::ImageSink(format!(
                "failed to save image to {}: {}",
                path.as_ref().display(),
                err
            ))
        })
    }
}
