// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// pdfrender: Core types and error definitions shared across all crates.

pub mod config;
pub mod error;
pub mod types;

pub use config::{DEFAULT_DPI, RenderConfig};
pub use error::{PdfRenderError, Result};
pub use types::*;
