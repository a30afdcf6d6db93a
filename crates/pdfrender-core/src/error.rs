// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for pdfrender.

use thiserror::Error;

/// Top-level error type for all pdfrender operations.
///
/// An unrenderable page is *not* an error: render calls return `Ok(None)` for
/// it, so that a batch of renders can carry on past it.
#[derive(Debug, Error)]
pub enum PdfRenderError {
    // -- Document lifecycle --
    /// The document could not be opened, is password-locked, or has already
    /// been closed.
    #[error("invalid pdf file: {0}")]
    InvalidDocument(String),

    #[error("page index out of range: {index} (document has {page_count} pages)")]
    IndexOutOfRange { index: i64, page_count: usize },

    #[error("invalid resolution: {dpi} dpi (expected 1..={max})")]
    InvalidResolution { dpi: u32, max: u32 },

    // -- Raster / marshaling --
    /// The rasterizer reported a pixel format code that has no color-mode
    /// mapping.
    #[error("unsupported pixel format code: {0}")]
    UnsupportedFormat(u32),

    #[error("malformed raster: {0}")]
    MalformedRaster(String),

    #[error("image sink rejected buffer: {0}")]
    ImageSink(String),

    #[error("rasterization engine error: {0}")]
    Engine(String),

    // -- Configuration / persistence --
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, PdfRenderError>;
