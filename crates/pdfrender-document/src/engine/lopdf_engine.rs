// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Default engine: `lopdf` parses the document and page tree, `tiny-skia`
// paints the vector subset of each page's content stream.

use std::path::Path;
use std::sync::Arc;

use lopdf::content::Content;
use lopdf::{Document, Object, ObjectId};
use pdfrender_core::{PdfRenderError, PixelFormat, RasterImage, RenderConfig, Result};
use tiny_skia::{Color, Pixmap, Transform};
use tracing::{debug, instrument, trace, warn};

use super::painter::Painter;
use super::{EngineDocument, EnginePage, RasterEngine, pixel_extent, pixels};

/// US Letter, used when a page carries neither a CropBox nor a MediaBox.
const FALLBACK_BOX: [f64; 4] = [0.0, 0.0, 612.0, 792.0];

/// Bound on `/Parent` hops when resolving inherited page attributes.
const MAX_TREE_DEPTH: usize = 64;

/// Rasterizer settings carried by every document the engine opens.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RasterOptions {
    pub pixel_format: PixelFormat,
    pub antialias: bool,
    pub paper_color: [u8; 3],
}

impl From<&RenderConfig> for RasterOptions {
    fn from(config: &RenderConfig) -> Self {
        Self {
            pixel_format: config.pixel_format,
            antialias: config.antialias,
            paper_color: config.paper_color,
        }
    }
}

impl Default for RasterOptions {
    fn default() -> Self {
        Self::from(&RenderConfig::default())
    }
}

/// The bundled `lopdf` + `tiny-skia` engine.
#[derive(Debug, Clone, Default)]
pub struct LopdfEngine {
    options: RasterOptions,
}

impl LopdfEngine {
    pub fn new(options: RasterOptions) -> Self {
        Self { options }
    }

    pub fn from_config(config: &RenderConfig) -> Self {
        Self::new(RasterOptions::from(config))
    }

    pub fn options(&self) -> &RasterOptions {
        &self.options
    }
}

impl RasterEngine for LopdfEngine {
    type Document = LopdfDocument;

    // lopdf parses eagerly, so the shared bytes are not retained.
    #[instrument(skip_all, fields(bytes_len = bytes.len()))]
    fn load_from_bytes(&self, bytes: Arc<[u8]>) -> Result<LopdfDocument> {
        let inner = Document::load_mem(&bytes).map_err(|err| {
            PdfRenderError::Engine(format!("failed to load PDF from memory: {err}"))
        })?;
        Ok(LopdfDocument::new(inner, self.options))
    }

    #[instrument(skip_all, fields(path = %path.display()))]
    fn load_from_file(&self, path: &Path) -> Result<LopdfDocument> {
        let inner = Document::load(path).map_err(|err| {
            PdfRenderError::Engine(format!("failed to open {}: {err}", path.display()))
        })?;
        Ok(LopdfDocument::new(inner, self.options))
    }
}

/// A document parsed by `lopdf`.
pub struct LopdfDocument {
    inner: Document,
    /// Page object ids in page order.
    page_ids: Vec<ObjectId>,
    options: RasterOptions,
}

impl LopdfDocument {
    fn new(inner: Document, options: RasterOptions) -> Self {
        // get_pages() is keyed by 1-based page number, so values come out in order.
        let page_ids: Vec<ObjectId> = inner.get_pages().into_values().collect();
        debug!(pages = page_ids.len(), "PDF loaded");
        Self {
            inner,
            page_ids,
            options,
        }
    }
}

impl std::fmt::Debug for LopdfDocument {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LopdfDocument")
            .field("page_count", &self.page_ids.len())
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl EngineDocument for LopdfDocument {
    type Page<'a> = LopdfPage<'a>;

    fn pages(&self) -> usize {
        self.page_ids.len()
    }

    // lopdf tries the empty user password on load and records the key in
    // `encryption_state` when it works; `/Encrypt` stays in the trailer either
    // way. Only an encrypted document without a key needs a password.
    fn is_locked(&self) -> bool {
        self.inner.is_encrypted() && self.inner.encryption_state.is_none()
    }

    fn create_page(&self, index: usize) -> Option<LopdfPage<'_>> {
        let id = *self.page_ids.get(index)?;
        let geometry = match PageGeometry::resolve(&self.inner, id) {
            Ok(geometry) => geometry,
            Err(err) => {
                warn!(index, %err, "cannot build page");
                return None;
            }
        };
        Some(LopdfPage {
            document: &self.inner,
            id,
            geometry,
            options: self.options,
        })
    }
}

/// A page of a [`LopdfDocument`].
#[derive(Debug)]
pub struct LopdfPage<'a> {
    document: &'a Document,
    id: ObjectId,
    geometry: PageGeometry,
    options: RasterOptions,
}

impl LopdfPage<'_> {
    fn operations(&self) -> Result<Vec<lopdf::content::Operation>> {
        let bytes = self
            .document
            .get_page_content(self.id)
            .map_err(|err| PdfRenderError::Engine(format!("cannot read page content: {err}")))?;
        let content = Content::decode(&bytes)
            .map_err(|err| PdfRenderError::Engine(format!("cannot decode page content: {err}")))?;
        Ok(content.operations)
    }
}

impl EnginePage for LopdfPage<'_> {
    fn size_points(&self) -> (f64, f64) {
        self.geometry.displayed_size()
    }

    #[instrument(skip(self), fields(page = ?self.id))]
    fn render(&self, dpi_x: u32, dpi_y: u32) -> RasterImage {
        let scale_x = f64::from(dpi_x) / 72.0;
        let scale_y = f64::from(dpi_y) / 72.0;
        let (width_pt, height_pt) = self.size_points();
        let width = pixel_extent(width_pt, scale_x);
        let height = pixel_extent(height_pt, scale_y);

        let Some(mut pixmap) = Pixmap::new(width, height) else {
            warn!(width, height, "cannot allocate pixmap");
            return RasterImage::invalid();
        };
        let [r, g, b] = self.options.paper_color;
        pixmap.fill(Color::from_rgba8(r, g, b, 255));

        let base = self.geometry.device_transform(scale_x, scale_y);
        match self.operations() {
            Ok(operations) => {
                trace!(operations = operations.len(), "painting page content");
                Painter::new(&mut pixmap, base, self.options.antialias).run(&operations);
            }
            Err(err) => warn!(%err, "rendering blank page"),
        }

        pixels::encode(&pixmap, self.options.pixel_format)
    }
}

/// Visible area and orientation of a page.
#[derive(Debug, Clone, Copy, PartialEq)]
struct PageGeometry {
    /// `[x0, y0, x1, y1]` with `x0 <= x1` and `y0 <= y1`.
    bounds: [f64; 4],
    /// Clockwise rotation: 0, 90, 180 or 270.
    rotate: u16,
}

impl PageGeometry {
    fn resolve(document: &Document, page_id: ObjectId) -> Result<Self> {
        let bounds = match page_box(document, page_id, b"CropBox")? {
            Some(crop) => crop,
            None => page_box(document, page_id, b"MediaBox")?.unwrap_or(FALLBACK_BOX),
        };
        let rotate = match resolve_inherited(document, page_id, b"Rotate")? {
            Some(Object::Integer(degrees)) => normalize_rotation(*degrees),
            _ => 0,
        };
        Ok(Self { bounds, rotate })
    }

    fn displayed_size(&self) -> (f64, f64) {
        let [x0, y0, x1, y1] = self.bounds;
        let (width, height) = (x1 - x0, y1 - y0);
        match self.rotate {
            90 | 270 => (height, width),
            _ => (width, height),
        }
    }

    /// Map from PDF user space to device pixels: origin at the top-left of
    /// the displayed page, y growing downwards.
    fn device_transform(&self, scale_x: f64, scale_y: f64) -> Transform {
        let [x0, y0, x1, y1] = self.bounds;
        let (sx, sy) = (scale_x, scale_y);
        let row = match self.rotate {
            90 => [0.0, sy, sx, 0.0, -sx * y0, -sy * x0],
            180 => [-sx, 0.0, 0.0, sy, sx * x1, -sy * y0],
            270 => [0.0, -sy, -sx, 0.0, sx * y1, sy * x1],
            _ => [sx, 0.0, 0.0, -sy, -sx * x0, sy * y1],
        };
        Transform::from_row(
            row[0] as f32,
            row[1] as f32,
            row[2] as f32,
            row[3] as f32,
            row[4] as f32,
            row[5] as f32,
        )
    }
}

fn normalize_rotation(degrees: i64) -> u16 {
    match degrees.rem_euclid(360) {
        90 => 90,
        180 => 180,
        270 => 270,
        _ => 0,
    }
}

/// Read a page box, walking up the page tree. Malformed boxes count as
/// missing.
fn page_box(document: &Document, page_id: ObjectId, key: &[u8]) -> Result<Option<[f64; 4]>> {
    let Some(object) = resolve_inherited(document, page_id, key)? else {
        return Ok(None);
    };
    let object = deref(document, object);
    let Ok(array) = object.as_array() else {
        return Ok(None);
    };
    let numbers: Vec<f64> = array
        .iter()
        .filter_map(|item| number(deref(document, item)))
        .collect();
    let [a, b, c, d] = numbers[..] else {
        return Ok(None);
    };
    Ok(Some([a.min(c), b.min(d), a.max(c), b.max(d)]))
}

/// Look up `key` on the page dictionary, following `/Parent` links when the
/// page itself does not carry it.
fn resolve_inherited<'a>(
    document: &'a Document,
    page_id: ObjectId,
    key: &[u8],
) -> Result<Option<&'a Object>> {
    let mut current = page_id;
    for _ in 0..MAX_TREE_DEPTH {
        let dict = document
            .get_object(current)
            .and_then(Object::as_dict)
            .map_err(|err| PdfRenderError::Engine(format!("bad page dictionary: {err}")))?;
        if let Ok(value) = dict.get(key) {
            return Ok(Some(value));
        }
        match dict.get(b"Parent").and_then(Object::as_reference) {
            Ok(parent) => current = parent,
            Err(_) => return Ok(None),
        }
    }
    Ok(None)
}

fn deref<'a>(document: &'a Document, object: &'a Object) -> &'a Object {
    match object {
        Object::Reference(id) => document.get_object(*id).unwrap_or(object),
        other => other,
    }
}

fn number(object: &Object) -> Option<f64> {
    match object {
        Object::Integer(value) => Some(*value as f64),
        Object::Real(value) => Some(f64::from(*value)),
        _ => None,
    }
}
