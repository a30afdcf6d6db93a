// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Page rasterization through the document's engine.

use pdfrender_core::{PdfRenderError, RasterImage, Result};
use tracing::{debug, instrument};

use super::document::PdfDocument;
use crate::engine::{EngineDocument, EnginePage, RasterEngine};

/// Rasterize one page at `dpi` on both axes.
///
/// Checks run in order: closed handle ([`PdfRenderError::InvalidDocument`]),
/// page index ([`PdfRenderError::IndexOutOfRange`], whatever the
/// resolution), then resolution ([`PdfRenderError::InvalidResolution`] for 0
/// or anything above the configured maximum).
///
/// `Ok(None)` means the engine could not build or rasterize the page. Each
/// call renders afresh; nothing is cached.
#[instrument(skip(document), fields(page_count = document.page_count()))]
pub fn rasterize_page<E: RasterEngine>(
    document: &PdfDocument<E>,
    page_index: i64,
    dpi: u32,
) -> Result<Option<RasterImage>> {
    let engine_document = document.engine_document()?;
    let index = document.page_index(page_index)?;
    let max = document.config().max_dpi;
    if dpi == 0 || dpi > max {
        return Err(PdfRenderError::InvalidResolution { dpi, max });
    }

    let Some(page) = engine_document.create_page(index) else {
        debug!("engine could not create page");
        return Ok(None);
    };
    let raster = page.render(dpi, dpi);
    if !raster.is_valid() {
        debug!("engine produced no image");
        return Ok(None);
    }

    debug!(
        width = raster.width(),
        height = raster.height(),
        format = ?raster.format(),
        "page rasterized"
    );
    Ok(Some(raster))
}
