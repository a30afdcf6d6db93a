// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Test fixtures: small PDFs built with lopdf, and a scriptable fake engine.

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use lopdf::encryption::{EncryptionState, EncryptionVersion, Permissions};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream, dictionary};
use pdfrender_core::{PdfRenderError, PixelFormat, RasterImage, Result};

use crate::engine::{EngineDocument, EnginePage, RasterEngine, pixel_extent};
use crate::image::layout_for;

// -- lopdf documents ----------------------------------------------------------

fn rect(values: [f64; 4]) -> Object {
    Object::Array(values.iter().map(|&v| Object::Real(v as f32)).collect())
}

/// Wire `pages` under a page tree node carrying `tree_extra`, add a catalog,
/// and serialize.
fn finish(mut doc: Document, pages_id: ObjectId, pages: Vec<ObjectId>, tree_extra: Dictionary) -> Vec<u8> {
    let mut tree = tree_extra;
    tree.set("Type", "Pages");
    tree.set("Count", pages.len() as i64);
    tree.set(
        "Kids",
        pages.into_iter().map(Object::Reference).collect::<Vec<_>>(),
    );
    doc.objects.insert(pages_id, Object::Dictionary(tree));

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut buf = Vec::new();
    doc.save_to(&mut buf).expect("failed to save test PDF");
    buf
}

/// `count` US Letter pages, each with a grey rectangle of a different width.
pub(crate) fn pdf_with_pages(count: usize) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let mut pages = Vec::with_capacity(count);
    for index in 0..count {
        let content = format!("0.5 g 72 72 {} 100 re f", 100 + index * 10);
        let content_id = doc.add_object(Stream::new(Dictionary::new(), content.into_bytes()));
        pages.push(doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
            "Contents" => content_id,
        }));
    }
    finish(doc, pages_id, pages, Dictionary::new())
}

/// One page with no box of its own; the page tree node carries the MediaBox.
pub(crate) fn pdf_with_inherited_media_box(width: f64, height: f64) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
    });
    let tree = dictionary! {
        "MediaBox" => rect([0.0, 0.0, width, height]),
    };
    finish(doc, pages_id, vec![page_id], tree)
}

pub(crate) fn pdf_with_crop_box(media: [f64; 4], crop: [f64; 4]) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "MediaBox" => rect(media),
        "CropBox" => rect(crop),
    });
    finish(doc, pages_id, vec![page_id], Dictionary::new())
}

/// One page with the given box, `/Rotate` entry and raw content stream.
pub(crate) fn pdf_with_content(media: [f64; 4], rotate: i64, content: &[u8]) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let content_id = doc.add_object(Stream::new(Dictionary::new(), content.to_vec()));
    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "MediaBox" => rect(media),
        "Rotate" => rotate,
        "Contents" => content_id,
    });
    finish(doc, pages_id, vec![page_id], Dictionary::new())
}

/// Two pages of [`pdf_with_pages`], RC4-encrypted with `user_password` and an
/// owner password. An empty user password opens without prompting.
pub(crate) fn encrypted_pdf(user_password: &str) -> Vec<u8> {
    let mut doc = Document::load_mem(&pdf_with_pages(2)).expect("fixture must load");
    let id = Object::string_literal(b"pdfrender-fixture".to_vec());
    doc.trailer.set("ID", Object::Array(vec![id.clone(), id]));

    let version = EncryptionVersion::V2 {
        document: &doc,
        owner_password: "owner-secret",
        user_password,
        key_length: 128,
        permissions: Permissions::all(),
    };
    let state = EncryptionState::try_from(version).expect("encryption state");
    doc.encrypt(&state).expect("failed to encrypt test PDF");

    let mut buf = Vec::new();
    doc.save_to(&mut buf).expect("failed to save test PDF");
    buf
}

// -- Fake engine --------------------------------------------------------------

/// Bytes the fake engine accepts as a document.
pub(crate) const FAKE_PDF: &[u8] = b"%PDF-1.7 fake";

/// Byte written into row padding by the fake engine.
pub(crate) const PADDING: u8 = 0xEE;

/// Shared counters observing what the handle does with fake documents.
#[derive(Debug, Clone, Default)]
pub(crate) struct Probe {
    drops: Arc<AtomicUsize>,
    renders: Arc<AtomicUsize>,
    bytes_alive_at_drop: Arc<AtomicBool>,
}

impl Probe {
    pub(crate) fn drops(&self) -> usize {
        self.drops.load(Ordering::SeqCst)
    }

    pub(crate) fn renders(&self) -> usize {
        self.renders.load(Ordering::SeqCst)
    }

    /// Whether someone besides the fake document still held the loaded bytes
    /// when the document was dropped.
    pub(crate) fn bytes_alive_at_drop(&self) -> bool {
        self.bytes_alive_at_drop.load(Ordering::SeqCst)
    }
}

/// Engine whose documents and pages behave as scripted.
///
/// Rasters carry three bytes of [`PADDING`] at the end of every row and fill
/// page `n`'s pixels with the byte `n + 1`.
#[derive(Debug, Clone)]
pub(crate) struct FakeEngine {
    pub pages: usize,
    pub locked: bool,
    /// Pages `create_page` refuses to build.
    pub missing_pages: Vec<usize>,
    /// Pages that render to an invalid raster.
    pub invalid_pages: Vec<usize>,
    pub format: PixelFormat,
    pub page_size: (f64, f64),
    pub probe: Probe,
}

impl FakeEngine {
    pub(crate) fn with_pages(pages: usize) -> Self {
        Self {
            pages,
            locked: false,
            missing_pages: Vec::new(),
            invalid_pages: Vec::new(),
            format: PixelFormat::Rgb24,
            page_size: (612.0, 792.0),
            probe: Probe::default(),
        }
    }

    fn check(bytes: &[u8]) -> Result<()> {
        if bytes.starts_with(b"%PDF") {
            Ok(())
        } else {
            Err(PdfRenderError::Engine("not a PDF".into()))
        }
    }
}

impl RasterEngine for FakeEngine {
    type Document = FakeDocument;

    fn load_from_bytes(&self, bytes: Arc<[u8]>) -> Result<FakeDocument> {
        Self::check(&bytes)?;
        Ok(FakeDocument {
            engine: self.clone(),
            bytes: Some(bytes),
        })
    }

    fn load_from_file(&self, path: &Path) -> Result<FakeDocument> {
        Self::check(&std::fs::read(path)?)?;
        Ok(FakeDocument {
            engine: self.clone(),
            bytes: None,
        })
    }
}

#[derive(Debug)]
pub(crate) struct FakeDocument {
    engine: FakeEngine,
    bytes: Option<Arc<[u8]>>,
}

impl Drop for FakeDocument {
    fn drop(&mut self) {
        let probe = &self.engine.probe;
        probe.drops.fetch_add(1, Ordering::SeqCst);
        if let Some(bytes) = &self.bytes {
            probe
                .bytes_alive_at_drop
                .store(Arc::strong_count(bytes) > 1, Ordering::SeqCst);
        }
    }
}

impl EngineDocument for FakeDocument {
    type Page<'a> = FakePage<'a>;

    fn pages(&self) -> usize {
        self.engine.pages
    }

    fn is_locked(&self) -> bool {
        self.engine.locked
    }

    fn create_page(&self, index: usize) -> Option<FakePage<'_>> {
        if index >= self.engine.pages || self.engine.missing_pages.contains(&index) {
            return None;
        }
        Some(FakePage {
            engine: &self.engine,
            index,
        })
    }
}

pub(crate) struct FakePage<'a> {
    engine: &'a FakeEngine,
    index: usize,
}

impl EnginePage for FakePage<'_> {
    fn size_points(&self) -> (f64, f64) {
        self.engine.page_size
    }

    fn render(&self, dpi_x: u32, dpi_y: u32) -> RasterImage {
        self.engine.probe.renders.fetch_add(1, Ordering::SeqCst);
        if self.engine.invalid_pages.contains(&self.index) {
            return RasterImage::invalid();
        }
        let (width_pt, height_pt) = self.engine.page_size;
        let width = pixel_extent(width_pt, f64::from(dpi_x) / 72.0);
        let height = pixel_extent(height_pt, f64::from(dpi_y) / 72.0);
        let Some(layout) = layout_for(self.engine.format, width) else {
            return RasterImage::invalid();
        };

        let stride = layout.row_len + 3;
        let fill = self.index as u8 + 1;
        let mut data = Vec::with_capacity(stride * height as usize);
        for _ in 0..height {
            data.extend(std::iter::repeat_n(fill, layout.row_len));
            data.extend([PADDING; 3]);
        }
        RasterImage::new(width, height, self.engine.format, stride, data)
    }
}
