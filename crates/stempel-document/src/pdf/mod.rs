// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF module — loading documents, verifying watermarked output, and writing
// sample documents.

pub mod integrity;
pub mod reader;
pub mod writer;

pub use integrity::{VerificationReport, fingerprint, verify_passthrough};
pub use reader::PdfReader;
pub use writer::SampleWriter;
