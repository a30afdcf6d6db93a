// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Document handle: owns an engine document (and, for in-memory opens, the
// bytes it was loaded from) from open until close.

use std::path::Path;

use pdfrender_core::{PdfRenderError, PixelBuffer, RenderConfig, Result};
use tracing::{debug, info, instrument};

use super::raster::rasterize_page;
use super::store::RawByteStore;
use crate::engine::{EngineDocument, EnginePage, LopdfEngine, RasterEngine};
use crate::image::{DynamicImageSink, ImageSink, RenderedImage, to_buffer, to_image};

/// An open (or closed) PDF document.
///
/// Closing is idempotent and also happens on drop. A closed handle reports
/// zero pages and rejects every render with
/// [`PdfRenderError::InvalidDocument`].
///
/// ```ignore
/// let document = PdfDocument::open("report.pdf")?;
/// if let Some(image) = document.render_page(0, 150)? {
///     image.save("page-1.png")?;
/// }
/// ```
pub struct PdfDocument<E: RasterEngine = LopdfEngine> {
    state: Option<OpenDocument<E::Document>>,
    page_count: usize,
    config: RenderConfig,
}

struct OpenDocument<D> {
    document: D,
    /// Present only for documents opened from memory.
    store: Option<RawByteStore>,
}

impl PdfDocument<LopdfEngine> {
    /// Open in-memory PDF bytes with the default engine and configuration.
    pub fn from_bytes(content: &[u8]) -> Result<Self> {
        Self::from_bytes_with_config(content, RenderConfig::default())
    }

    pub fn from_bytes_with_config(content: &[u8], config: RenderConfig) -> Result<Self> {
        let engine = LopdfEngine::from_config(&config);
        Self::open_from_bytes(&engine, content, config)
    }

    /// Open a PDF file with the default engine and configuration.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::open_with_config(path, RenderConfig::default())
    }

    pub fn open_with_config(path: impl AsRef<Path>, config: RenderConfig) -> Result<Self> {
        let engine = LopdfEngine::from_config(&config);
        Self::open_from_file(&engine, path, config)
    }
}

impl<E: RasterEngine> PdfDocument<E> {
    // -- Construction ---------------------------------------------------------

    /// Copy `content` and load it with `engine`.
    #[instrument(skip_all, fields(bytes_len = content.len()))]
    pub fn open_from_bytes(engine: &E, content: &[u8], config: RenderConfig) -> Result<Self> {
        config.validate()?;
        let store = RawByteStore::copy_from(content);
        let document = engine.load_from_bytes(store.share()).map_err(invalid_document)?;
        Self::from_loaded(document, Some(store), config)
    }

    /// Load the file at `path` with `engine`. A missing or unreadable file is
    /// reported as [`PdfRenderError::InvalidDocument`].
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open_from_file(engine: &E, path: impl AsRef<Path>, config: RenderConfig) -> Result<Self> {
        config.validate()?;
        let document = engine
            .load_from_file(path.as_ref())
            .map_err(invalid_document)?;
        Self::from_loaded(document, None, config)
    }

    fn from_loaded(
        document: E::Document,
        store: Option<RawByteStore>,
        config: RenderConfig,
    ) -> Result<Self> {
        if document.is_locked() {
            return Err(PdfRenderError::InvalidDocument(
                "document is password-locked".into(),
            ));
        }
        let page_count = document.pages();
        info!(
            page_count,
            in_memory = store.is_some(),
            "PDF document opened"
        );
        Ok(Self {
            state: Some(OpenDocument { document, store }),
            page_count,
            config,
        })
    }

    // -- Lifecycle ------------------------------------------------------------

    /// Release the engine document, then the bytes it was loaded from.
    /// Calling this on a closed handle does nothing.
    pub fn close(&mut self) {
        if let Some(OpenDocument { document, store }) = self.state.take() {
            drop(document);
            drop(store);
            debug!(page_count = self.page_count, "PDF document closed");
        }
        self.page_count = 0;
    }

    pub fn is_closed(&self) -> bool {
        self.state.is_none()
    }

    /// Number of pages; zero once closed.
    pub fn page_count(&self) -> usize {
        self.page_count
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    /// Run `f` with the handle and close it afterwards.
    pub fn scope<R>(mut self, f: impl FnOnce(&mut Self) -> R) -> R {
        let result = f(&mut self);
        self.close();
        result
    }

    pub(crate) fn engine_document(&self) -> Result<&E::Document> {
        self.state
            .as_ref()
            .map(|state| &state.document)
            .ok_or_else(|| PdfRenderError::InvalidDocument("document is closed".into()))
    }

    /// Validate a caller-supplied page index against the current page count.
    pub(crate) fn page_index(&self, index: i64) -> Result<usize> {
        usize::try_from(index)
            .ok()
            .filter(|&index| index < self.page_count)
            .ok_or(PdfRenderError::IndexOutOfRange {
                index,
                page_count: self.page_count,
            })
    }

    // -- Pages ----------------------------------------------------------------

    /// Displayed size of a page in points, or `None` if the engine cannot
    /// build the page.
    pub fn page_size(&self, index: i64) -> Result<Option<(f64, f64)>> {
        let document = self.engine_document()?;
        let index = self.page_index(index)?;
        Ok(document.create_page(index).map(|page| page.size_points()))
    }

    /// Rasterize and marshal a page, stopping short of building an image.
    pub fn render_buffer(&self, index: i64, dpi: u32) -> Result<Option<PixelBuffer>> {
        match rasterize_page(self, index, dpi)? {
            Some(raster) => to_buffer(&raster),
            None => Ok(None),
        }
    }

    /// Render a page into an image built by `sink`.
    pub fn render_page_with<S: ImageSink>(
        &self,
        sink: &S,
        index: i64,
        dpi: u32,
    ) -> Result<Option<S::Image>> {
        match self.render_buffer(index, dpi)? {
            Some(buffer) => to_image(sink, &buffer, dpi).map(Some),
            None => Ok(None),
        }
    }

    /// Render a page at `dpi`. `Ok(None)` means the page could not be
    /// rendered.
    pub fn render_page(&self, index: i64, dpi: u32) -> Result<Option<RenderedImage>> {
        self.render_page_with(&DynamicImageSink, index, dpi)
    }

    /// Render a page at the configured default resolution.
    pub fn render_default(&self, index: i64) -> Result<Option<RenderedImage>> {
        self.render_page(index, self.config.default_dpi)
    }

    /// Render every page in order. Pages that cannot be rendered yield
    /// `None`; errors stop the batch.
    #[instrument(skip(self), fields(page_count = self.page_count))]
    pub fn render_all(&self, dpi: u32) -> Result<Vec<Option<RenderedImage>>> {
        self.engine_document()?;
        let pages = (0..self.page_count)
            .map(|index| self.render_page(index as i64, dpi))
            .collect::<Result<Vec<_>>>()?;
        debug!(
            rendered = pages.iter().filter(|page| page.is_some()).count(),
            "batch render finished"
        );
        Ok(pages)
    }
}

impl<E: RasterEngine> Drop for PdfDocument<E> {
    fn drop(&mut self) {
        self.close();
    }
}

impl<E: RasterEngine> std::fmt::Debug for PdfDocument<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PdfDocument")
            .field("page_count", &self.page_count)
            .field("closed", &self.is_closed())
            .field(
                "store",
                &self.state.as_ref().and_then(|state| state.store.as_ref()),
            )
            .field("config", &self.config)
            .finish()
    }
}

fn invalid_document(err: PdfRenderError) -> PdfRenderError {
    match err {
        PdfRenderError::Engine(message) => PdfRenderError::InvalidDocument(message),
        err @ PdfRenderError::InvalidDocument(_) => err,
        other => PdfRenderError::InvalidDocument(other.to_string()),
    }
}
