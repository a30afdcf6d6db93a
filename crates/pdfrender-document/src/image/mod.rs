// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Image module: raster marshaling and image sinks.

pub mod marshal;
pub mod sink;

pub use marshal::{RowLayout, layout_for, to_buffer};
pub use sink::{DynamicImageSink, ImageSink, RenderedImage, to_image};
