// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Pixmap → raster encoding. Rows are padded to a 32-bit boundary.

use pdfrender_core::{PixelFormat, RasterImage};
use tiny_skia::{ColorU8, Pixmap};

use crate::image::marshal::layout_for;

/// Luma threshold at or above which a `Mono` pixel is white.
const MONO_THRESHOLD: u8 = 128;

pub(crate) fn encode(pixmap: &Pixmap, format: PixelFormat) -> RasterImage {
    let width = pixmap.width();
    let height = pixmap.height();
    let Some(layout) = layout_for(format, width) else {
        return RasterImage::invalid();
    };
    let stride = layout.row_len.next_multiple_of(4);
    let mut data = vec![0u8; stride * height as usize];

    let rows = pixmap.pixels().chunks_exact(width as usize);
    for (row, out) in rows.zip(data.chunks_exact_mut(stride)) {
        let out = &mut out[..layout.row_len];
        let colors = row.iter().map(|pixel| pixel.demultiply());
        match format {
            PixelFormat::Argb32 => {
                for (color, dst) in colors.zip(out.chunks_exact_mut(4)) {
                    dst.copy_from_slice(&[color.blue(), color.green(), color.red(), color.alpha()]);
                }
            }
            PixelFormat::Rgb24 => {
                for (color, dst) in colors.zip(out.chunks_exact_mut(3)) {
                    dst.copy_from_slice(&[color.red(), color.green(), color.blue()]);
                }
            }
            PixelFormat::Bgr24 => {
                for (color, dst) in colors.zip(out.chunks_exact_mut(3)) {
                    dst.copy_from_slice(&[color.blue(), color.green(), color.red()]);
                }
            }
            PixelFormat::Gray8 => {
                for (color, dst) in colors.zip(out.iter_mut()) {
                    *dst = luma(color);
                }
            }
            PixelFormat::Mono => {
                for (x, color) in colors.enumerate() {
                    if luma(color) >= MONO_THRESHOLD {
                        out[x / 8] |= 0x80 >> (x % 8);
                    }
                }
            }
            PixelFormat::Invalid => return RasterImage::invalid(),
        }
    }

    RasterImage::new(width, height, format, stride, data)
}

/// ITU-R BT.601 luma.
fn luma(color: ColorU8) -> u8 {
    let weighted = u32::from(color.red()) * 299
        + u32::from(color.green()) * 587
        + u32::from(color.blue()) * 114;
    (weighted / 1000) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use tiny_skia::Color;

    fn solid(width: u32, height: u32, color: Color) -> Pixmap {
        let mut pixmap = Pixmap::new(width, height).expect("pixmap");
        pixmap.fill(color);
        pixmap
    }

    #[test]
    fn rows_are_padded_to_four_bytes() {
        let pixmap = solid(5, 2, Color::WHITE);
        let rgb = encode(&pixmap, PixelFormat::Rgb24);
        assert_eq!(rgb.bytes_per_row(), 16);
        assert_eq!(rgb.data().len(), 32);
        // Padding stays zeroed.
        assert_eq!(&rgb.data()[15..16], &[0]);

        let argb = encode(&pixmap, PixelFormat::Argb32);
        assert_eq!(argb.bytes_per_row(), 20);
    }

    #[test]
    fn channel_orders() {
        let pixmap = solid(1, 1, Color::from_rgba8(10, 20, 30, 255));
        assert_eq!(&encode(&pixmap, PixelFormat::Rgb24).data()[..3], &[10, 20, 30]);
        assert_eq!(&encode(&pixmap, PixelFormat::Bgr24).data()[..3], &[30, 20, 10]);
        assert_eq!(
            &encode(&pixmap, PixelFormat::Argb32).data()[..4],
            &[30, 20, 10, 255]
        );
    }

    #[test]
    fn mono_sets_bits_for_light_pixels() {
        let mut pixmap = solid(10, 1, Color::BLACK);
        pixmap.fill_rect(
            tiny_skia::Rect::from_xywh(0.0, 0.0, 1.0, 1.0).expect("rect"),
            &tiny_skia::Paint {
                shader: tiny_skia::Shader::SolidColor(Color::WHITE),
                ..tiny_skia::Paint::default()
            },
            tiny_skia::Transform::identity(),
            None,
        );
        let raster = encode(&pixmap, PixelFormat::Mono);
        assert_eq!(raster.bytes_per_row(), 4);
        assert_eq!(raster.data()[0], 0b1000_0000);
        assert_eq!(raster.data()[1], 0);
    }

    #[test]
    fn gray_uses_luma() {
        let pixmap = solid(1, 1, Color::from_rgba8(255, 0, 0, 255));
        assert_eq!(encode(&pixmap, PixelFormat::Gray8).data()[0], 76);
    }

    #[test]
    fn invalid_format_yields_invalid_raster() {
        let pixmap = solid(2, 2, Color::WHITE);
        assert!(!encode(&pixmap, PixelFormat::Invalid).is_valid());
    }
}
