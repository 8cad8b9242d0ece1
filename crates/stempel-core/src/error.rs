// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for Stempel.

use thiserror::Error;

/// Top-level error type for all Stempel operations.
#[derive(Debug, Error)]
pub enum StempelError {
    // -- Engine errors --
    #[error("page {page} has invalid geometry: {reason}")]
    Geometry { page: u32, reason: String },

    #[error("cannot render watermark: {0}")]
    Render(String),

    #[error(
        "overlay for page {page} is {}x{} but the page is {}x{}",
        .actual.0, .actual.1, .expected.0, .expected.1
    )]
    DimensionMismatch {
        page: u32,
        /// Page (width, height) in points.
        expected: (f32, f32),
        /// Overlay (width, height) in points.
        actual: (f32, f32),
    },

    #[error("start page {start_page} is beyond the last page ({total_pages}); nothing to watermark")]
    NoOp { start_page: u32, total_pages: u32 },

    // -- Document errors --
    #[error("PDF operation failed: {0}")]
    Pdf(String),

    #[error("page {page} failed verification: {reason}")]
    Integrity { page: u32, reason: String },

    // -- Configuration --
    #[error("invalid configuration: {0}")]
    Config(String),

    // -- Storage / persistence --
    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl StempelError {
    /// True for outcomes that describe a policy decision rather than a broken
    /// mechanism. Callers may report these and carry on.
    pub fn is_advisory(&self) -> bool {
        matches!(self, Self::NoOp { .. })
    }
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, StempelError>;
