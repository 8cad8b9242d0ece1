// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Watermark configuration. Built once per run and passed by reference to the
// engine; nothing here is global.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Result, StempelError};
use crate::types::{Rgb, StandardFont};

/// Default mark: the product label repeated with internal spacing.
pub const DEFAULT_TEXT: &str = "Tamokul    Tamokul";

/// What the assembler does when the start page lies beyond the last page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NoOpPolicy {
    /// Report the warning as an error and produce no output.
    #[default]
    Abort,
    /// Emit the unmodified document and record the warning in the report.
    PassThrough,
}

/// Immutable watermark settings for one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WatermarkSpec {
    /// Text drawn at every placement.
    pub text: String,
    /// Fill alpha, `0.0` (invisible) to `1.0` (opaque).
    pub opacity: f32,
    /// Counter-clockwise rotation in degrees. Wrapped into `[0, 360)`.
    pub angle: f32,
    /// First 1-based page that receives the mark.
    pub start_page: u32,
    /// Vertical anchor of each mark as a fraction of page height, drawn in
    /// this order.
    pub placements: Vec<f32>,
    /// Standard font used for the mark.
    pub font: StandardFont,
    /// Font size in points. Constant across pages of different sizes.
    pub font_size: f32,
    /// Fill colour of the glyphs.
    pub color: Rgb,
    /// Behaviour when `start_page` exceeds the page count.
    pub no_op_policy: NoOpPolicy,
}

impl Default for WatermarkSpec {
    fn default() -> Self {
        Self {
            text: DEFAULT_TEXT.to_owned(),
            opacity: 0.15,
            angle: 45.0,
            start_page: 9,
            placements: vec![0.75, 0.5, 0.25],
            font: StandardFont::HelveticaBold,
            font_size: 64.0,
            color: Rgb::gray(),
            no_op_policy: NoOpPolicy::Abort,
        }
    }
}

impl WatermarkSpec {
    /// Parse a spec from JSON. Missing fields take their default values.
    pub fn from_json(json: &str) -> Result<Self> {
        let spec: Self = serde_json::from_str(json)?;
        Ok(spec)
    }

    /// Load a JSON spec from disk.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path.as_ref())?;
        Self::from_json(&json)
    }

    /// Check every field. Start-page problems are configuration errors;
    /// anything that would stop the overlay from being drawn is a render error.
    pub fn validate(&self) -> Result<()> {
        if self.start_page == 0 {
            return Err(StempelError::Config(
                "start page is 1-based and must be at least 1".into(),
            ));
        }
        self.check_render()
    }

    /// Validate the fields the overlay generator consumes.
    pub fn check_render(&self) -> Result<()> {
        if self.text.trim().is_empty() {
            return Err(StempelError::Render("watermark text is empty".into()));
        }
        if !(0.0..=1.0).contains(&self.opacity) {
            return Err(StempelError::Render(format!(
                "opacity {} is outside 0.0..=1.0",
                self.opacity
            )));
        }
        if !self.angle.is_finite() {
            return Err(StempelError::Render(format!(
                "angle {} is not a finite number of degrees",
                self.angle
            )));
        }
        if !(self.font_size.is_finite() && self.font_size > 0.0) {
            return Err(StempelError::Render(format!(
                "font size {} must be a positive number of points",
                self.font_size
            )));
        }
        if self.placements.is_empty() {
            return Err(StempelError::Render("no placements configured".into()));
        }
        if let Some(bad) = self
            .placements
            .iter()
            .find(|f| !(0.0..=1.0).contains(*f))
        {
            return Err(StempelError::Render(format!(
                "placement {bad} is outside 0.0..=1.0 of the page height"
            )));
        }
        Ok(())
    }

    /// Rotation wrapped into `[0, 360)`. `405` draws the same mark as `45`.
    pub fn normalized_angle(&self) -> f32 {
        self.angle.rem_euclid(360.0)
    }
}
