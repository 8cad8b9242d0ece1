// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Page geometry — the visible area of each page, read from the page's own
// declarations rather than an assumed paper size.

use lopdf::{Document, Object, ObjectId};
use stempel_core::error::{Result, StempelError};
use stempel_core::types::PageGeometry;
use tracing::debug;

use crate::pdf::reader::{inherited_attribute, kind, resolve};

/// Resolves the visible box of pages in one document.
///
/// The visible box is `/CropBox` clipped to `/MediaBox`; a page without a
/// crop box shows its whole media box. Both are inheritable from the page
/// tree, so pages of one document may disagree on size.
pub struct PageGeometryResolver<'a> {
    document: &'a Document,
}

impl<'a> PageGeometryResolver<'a> {
    pub fn new(document: &'a Document) -> Self {
        Self { document }
    }

    /// Geometry of the page `page_id`, which is page number `page` (1-based,
    /// used in error messages only).
    pub fn resolve(&self, page: u32, page_id: ObjectId) -> Result<PageGeometry> {
        let media_box = self
            .read_box(page, page_id, b"MediaBox")?
            .ok_or_else(|| StempelError::Geometry {
                page,
                reason: "page declares no /MediaBox".into(),
            })?;

        let visible = match self.read_box(page, page_id, b"CropBox")? {
            Some(crop_box) => intersect(&media_box, &crop_box).ok_or_else(|| {
                StempelError::Geometry {
                    page,
                    reason: "/CropBox lies outside the /MediaBox".into(),
                }
            })?,
            None => media_box,
        };

        if !(visible.width > 0.0 && visible.height > 0.0) {
            return Err(StempelError::Geometry {
                page,
                reason: format!(
                    "visible area {}x{} is not positive",
                    visible.width, visible.height
                ),
            });
        }

        debug!(page, width = visible.width, height = visible.height, "page geometry");
        Ok(visible)
    }

    fn read_box(&self, page: u32, page_id: ObjectId, key: &[u8]) -> Result<Option<PageGeometry>> {
        let name = String::from_utf8_lossy(key);
        let value = match inherited_attribute(self.document, page_id, key)? {
            Some(value) => value,
            None => return Ok(None),
        };

        let items = match value {
            Object::Array(items) if items.len() == 4 => items,
            Object::Array(items) => {
                return Err(StempelError::Geometry {
                    page,
                    reason: format!("/{name} has {} entries instead of 4", items.len()),
                });
            }
            other => {
                return Err(StempelError::Geometry {
                    page,
                    reason: format!("/{name} is a {}, not an array", kind(other)),
                });
            }
        };

        let mut corners = [0.0f32; 4];
        for (slot, item) in corners.iter_mut().zip(items) {
            *slot = self.number(item).ok_or_else(|| StempelError::Geometry {
                page,
                reason: format!("/{name} holds a non-numeric entry"),
            })?;
        }

        let [x0, y0, x1, y1] = corners;
        Ok(Some(PageGeometry::from_corners(x0, y0, x1, y1)))
    }

    fn number(&self, item: &Object) -> Option<f32> {
        let value = match resolve(self.document, item).ok()? {
            Object::Integer(i) => *i as f32,
            Object::Real(r) => *r as f32,
            _ => return None,
        };
        value.is_finite().then_some(value)
    }
}

fn intersect(a: &PageGeometry, b: &PageGeometry) -> Option<PageGeometry> {
    let x0 = a.x.max(b.x);
    let y0 = a.y.max(b.y);
    let x1 = (a.x + a.width).min(b.x + b.width);
    let y1 = (a.y + a.height).min(b.y + b.height);
    (x1 > x0 && y1 > y0).then(|| PageGeometry::from_corners(x0, y0, x1, y1))
}
