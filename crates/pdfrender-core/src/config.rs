// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Render configuration.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{PdfRenderError, Result};
use crate::types::PixelFormat;

/// Resolution used when the caller does not ask for one.
pub const DEFAULT_DPI: u32 = 72;

/// Settings shared by a document handle and the rasterizer behind it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Resolution for renders that do not name one.
    pub default_dpi: u32,
    /// Upper bound on requested resolutions; guards against runaway
    /// allocations.
    pub max_dpi: u32,
    /// Pixel format the rasterizer emits.
    pub pixel_format: PixelFormat,
    /// Anti-alias path edges.
    pub antialias: bool,
    /// Paper (background) color as RGB.
    pub paper_color: [u8; 3],
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            default_dpi: DEFAULT_DPI,
            max_dpi: 2400,
            pixel_format: PixelFormat::Argb32,
            antialias: true,
            paper_color: [255, 255, 255],
        }
    }
}

impl RenderConfig {
    /// Parse a JSON config; missing fields take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a JSON config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let data = std::fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&data)
    }

    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_dpi == 0 {
            return Err(PdfRenderError::InvalidConfig(
                "max_dpi must be positive".into(),
            ));
        }
        if self.default_dpi == 0 || self.default_dpi > self.max_dpi {
            return Err(PdfRenderError::InvalidConfig(format!(
                "default_dpi {} outside 1..={}",
                self.default_dpi, self.max_dpi
            )));
        }
        if self.pixel_format == PixelFormat::Invalid {
            return Err(PdfRenderError::InvalidConfig(
                "pixel_format cannot be `invalid`".into(),
            ));
        }
        Ok(())
    }
}
