// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF module: document handles and page rasterization.

pub mod document;
pub mod raster;
mod store;

pub use document::PdfDocument;
pub use raster::rasterize_page;
