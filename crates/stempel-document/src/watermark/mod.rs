// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Watermark module — page geometry, overlay generation, page compositing, and
// whole-document assembly.

pub mod assembler;
pub mod compositor;
pub mod geometry;
pub mod metrics;
pub mod overlay;

pub use assembler::{Assembly, AssemblyReport, DocumentAssembler};
pub use compositor::PageCompositor;
pub use geometry::PageGeometryResolver;
pub use overlay::{Overlay, OverlayGenerator, OverlayResources};
