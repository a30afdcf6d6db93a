// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Rasterization engine seam.
//
// The document handle never talks to a PDF library directly. It loads,
// counts, and renders through these traits, so a binding to another engine
// only has to implement them. The bundled `LopdfEngine` parses with `lopdf`
// and paints with `tiny-skia`.

pub mod lopdf_engine;
mod painter;
mod pixels;

use std::path::Path;
use std::sync::Arc;

use pdfrender_core::{RasterImage, Result};

pub use lopdf_engine::{LopdfDocument, LopdfEngine, LopdfPage, RasterOptions};

/// Loads documents.
pub trait RasterEngine {
    type Document: EngineDocument;

    /// Load a document from in-memory bytes.
    ///
    /// The engine may keep `bytes` and read from it lazily; the caller keeps
    /// its own reference alive until the returned document has been dropped.
    fn load_from_bytes(&self, bytes: Arc<[u8]>) -> Result<Self::Document>;

    /// Load a document directly from the filesystem.
    fn load_from_file(&self, path: &Path) -> Result<Self::Document>;
}

/// An opened engine document.
pub trait EngineDocument {
    type Page<'a>: EnginePage
    where
        Self: 'a;

    /// Number of pages.
    fn pages(&self) -> usize;

    /// Whether the document needs a password to be read.
    fn is_locked(&self) -> bool;

    /// Page at 0-based `index`, or `None` if the engine cannot build it.
    fn create_page(&self, index: usize) -> Option<Self::Page<'_>>;
}

/// A single page ready to be rasterized.
pub trait EnginePage {
    /// Displayed page size in points (1/72 inch), after page rotation.
    fn size_points(&self) -> (f64, f64);

    /// Rasterize at the given horizontal and vertical resolution.
    ///
    /// Failure is reported as a raster whose `is_valid()` is false.
    fn render(&self, dpi_x: u32, dpi_y: u32) -> RasterImage;
}

/// Pixel extent of `points` at `scale` pixels per point: rounded up, at least
/// one pixel. Values within floating-point noise of a whole pixel snap to it.
pub(crate) fn pixel_extent(points: f64, scale: f64) -> u32 {
    let extent = points * scale;
    let snapped = extent.round();
    let pixels = if (extent - snapped).abs() < 1e-6 {
        snapped
    } else {
        extent.ceil()
    };
    pixels.clamp(1.0, u32::MAX as f64) as u32
}
