// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// pdfrender-document: PDF document handles, page rasterization, and pixel
// buffer marshaling.
//
// Opens PDFs from memory or disk, rasterizes pages through a pluggable engine
// (lopdf + tiny-skia by default), and hands tightly packed pixel buffers to an
// image sink (the `image` crate by default).

pub mod engine;
pub mod image;
pub mod pdf;

#[cfg(test)]
mod fixtures;

// Re-export the primary items so callers can use `pdfrender_document::PdfDocument` etc.
pub use engine::{EngineDocument, EnginePage, LopdfEngine, RasterEngine, RasterOptions};
pub use crate::image::marshal::{RowLayout, layout_for, to_buffer};
pub use crate::image::sink::{DynamicImageSink, ImageSink, RenderedImage, to_image};
pub use pdf::document::PdfDocument;
pub use pdf::raster::rasterize_page;
