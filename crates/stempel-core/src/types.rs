// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for the Stempel watermarking engine.

use serde::{Deserialize, Serialize};

use crate::error::{Result, StempelError};

/// Points per millimetre (1 pt = 1/72 in).
pub const PT_PER_MM: f32 = 72.0 / 25.4;

/// Visible area of one page, in PDF points.
///
/// `x` and `y` are the lower-left corner of the box in default user space;
/// most documents put it at the origin, but cropped pages often do not.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PageGeometry {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl PageGeometry {
    /// Geometry of a box anchored at the origin.
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            width,
            height,
        }
    }

    /// Build a geometry from two opposite corners, in any order.
    pub fn from_corners(x0: f32, y0: f32, x1: f32, y1: f32) -> Self {
        Self {
            x: x0.min(x1),
            y: y0.min(y1),
            width: (x1 - x0).abs(),
            height: (y1 - y0).abs(),
        }
    }

    /// (width, height) pair, the unit used in size comparisons.
    pub fn size(&self) -> (f32, f32) {
        (self.width, self.height)
    }

    /// True when `other` has the same size within `tolerance` points.
    pub fn same_size(&self, other: (f32, f32), tolerance: f32) -> bool {
        (self.width - other.0).abs() <= tolerance && (self.height - other.1).abs() <= tolerance
    }
}

/// An sRGB fill colour with components in `0.0..=1.0`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rgb {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Rgb {
    pub const fn new(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    /// The 50% gray used for watermark text by default.
    pub const fn gray() -> Self {
        Self::new(0.5, 0.5, 0.5)
    }

    /// Parse `#RRGGBB`, `RRGGBB`, `#RGB` or `RGB`.
    pub fn from_hex(hex: &str) -> Result<Self> {
        let digits = hex.trim().trim_start_matches('#');
        if !digits.is_ascii() {
            return Err(StempelError::Config(format!(
                "colour {hex:?} is not valid hex"
            )));
        }
        let expanded: String = match digits.len() {
            3 => digits.chars().flat_map(|c| [c, c]).collect(),
            6 => digits.to_owned(),
            _ => {
                return Err(StempelError::Config(format!(
                    "colour {hex:?} must have 3 or 6 hex digits"
                )));
            }
        };

        let channel = |range: std::ops::Range<usize>| {
            u8::from_str_radix(&expanded[range], 16)
                .map(|v| f32::from(v) / 255.0)
                .map_err(|_| StempelError::Config(format!("colour {hex:?} is not valid hex")))
        };

        Ok(Self::new(channel(0..2)?, channel(2..4)?, channel(4..6)?))
    }
}

impl Default for Rgb {
    fn default() -> Self {
        Self::gray()
    }
}

/// The standard PDF fonts the overlay can draw with.
///
/// Only the non-symbolic Helvetica and Times faces are offered; these need no
/// embedding and render with WinAnsi encoding in every conforming viewer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StandardFont {
    Helvetica,
    #[default]
    HelveticaBold,
    TimesRoman,
    TimesBold,
}

impl StandardFont {
    /// The `/BaseFont` name written into the font dictionary.
    pub fn base_font(&self) -> &'static str {
        match self {
            Self::Helvetica => "Helvetica",
            Self::HelveticaBold => "Helvetica-Bold",
            Self::TimesRoman => "Times-Roman",
            Self::TimesBold => "Times-Bold",
        }
    }

    /// Parse a font name as accepted on the command line.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().replace(['_', ' '], "-").as_str() {
            "helvetica" => Some(Self::Helvetica),
            "helvetica-bold" => Some(Self::HelveticaBold),
            "times" | "times-roman" => Some(Self::TimesRoman),
            "times-bold" => Some(Self::TimesBold),
            _ => None,
        }
    }
}

/// Standard paper sizes, used when generating sample documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaperSize {
    A4,
    A3,
    A5,
    Letter,
    Legal,
    Tabloid,
    Custom { width_mm: u32, height_mm: u32 },
}

impl PaperSize {
    /// Dimensions in millimetres (width, height).
    pub fn dimensions_mm(&self) -> (u32, u32) {
        match self {
            Self::A4 => (210, 297),
            Self::A3 => (297, 420),
            Self::A5 => (148, 210),
            Self::Letter => (216, 279),
            Self::Legal => (216, 356),
            Self::Tabloid => (279, 432),
            Self::Custom {
                width_mm,
                height_mm,
            } => (*width_mm, *height_mm),
        }
    }

    /// Dimensions in PDF points (width, height).
    pub fn dimensions_pt(&self) -> (f32, f32) {
        let (w, h) = self.dimensions_mm();
        (w as f32 * PT_PER_MM, h as f32 * PT_PER_MM)
    }

    /// Parse a paper name as accepted on the command line.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "a4" => Some(Self::A4),
            "a3" => Some(Self::A3),
            "a5" => Some(Self::A5),
            "letter" => Some(Self::Letter),
            "legal" => Some(Self::Legal),
            "tabloid" => Some(Self::Tabloid),
            _ => None,
        }
    }
}
