// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// stempel-document — the watermark engine.
//
// Loads a PDF, leaves the pages before the start page alone, and composites a
// translucent diagonal text overlay onto every page from the start page on.
// Also verifies watermarked output and writes numbered sample documents.

pub mod pdf;
pub mod watermark;

#[cfg(test)]
mod test_support;

// Re-export the primary structs so callers can use `stempel_document::DocumentAssembler` etc.
pub use pdf::integrity::{VerificationReport, verify_passthrough};
pub use pdf::reader::PdfReader;
pub use pdf::writer::SampleWriter;
pub use watermark::assembler::{Assembly, AssemblyReport, DocumentAssembler};
pub use watermark::compositor::PageCompositor;
pub use watermark::geometry::PageGeometryResolver;
pub use watermark::overlay::{Overlay, OverlayGenerator};
