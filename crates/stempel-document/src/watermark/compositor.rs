// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Page compositing — paint an overlay on top of a page without rewriting any
// of the page's existing content.
//
// The page's content streams stay where they are, referenced by the same
// object ids. A one-operator `q` stream is put in front of them and a stream
// that restores the state and paints the overlay form is put behind them:
//
//   [ q ] [ original 1 ] ... [ original n ] [ Q q 1 0 0 1 x y cm /St0 Do Q ]

use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream, dictionary};
use stempel_core::error::{Result, StempelError};
use stempel_core::types::{PageGeometry, StandardFont};
use tracing::{debug, instrument};

use super::overlay::{Overlay, OverlayResources};
use crate::pdf::reader::{content_stream_ids, inherited_attribute, node_dictionary_mut, resolve};

/// Largest size difference, in points, still treated as the same page size.
pub const SIZE_TOLERANCE: f32 = 0.01;

/// Prefix of the resource names under which overlays are registered.
const XOBJECT_PREFIX: &str = "St";

/// Merges overlays onto the pages of one document.
///
/// Font and transparency objects are registered in the document once per
/// distinct (font, opacity) pair and shared by every overlay form.
#[derive(Debug, Default)]
pub struct PageCompositor {
    shared: Vec<(StandardFont, u32, OverlayResources)>,
}

impl PageCompositor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Paint `overlay` over page number `page` (object `page_id`), whose
    /// visible area is `geometry`.
    ///
    /// Fails with a dimension mismatch if the overlay was generated for a
    /// different page size.
    #[instrument(skip(self, document, geometry, overlay))]
    pub fn composite(
        &mut self,
        document: &mut Document,
        page: u32,
        page_id: ObjectId,
        geometry: &PageGeometry,
        overlay: &Overlay,
    ) -> Result<()> {
        if !geometry.same_size(overlay.size(), SIZE_TOLERANCE) {
            return Err(StempelError::DimensionMismatch {
                page,
                expected: geometry.size(),
                actual: overlay.size(),
            });
        }

        let resources = self.resources_for(document, overlay);
        let form_id = document.add_object(overlay.to_form_xobject(&resources)?);

        let mut page_resources = local_resources(document, page_id)?;
        let mut xobjects = owned_subdictionary(document, &page_resources, b"XObject")?;
        let name = fresh_name(&xobjects);
        xobjects.set(name.as_bytes().to_vec(), Object::Reference(form_id));
        page_resources.set("XObject", Object::Dictionary(xobjects));

        let existing = content_stream_ids(document, page_id)?;
        let mut contents: Vec<Object> = Vec::with_capacity(existing.len() + 2);
        if !existing.is_empty() {
            let open_id = document.add_object(Stream::new(dictionary! {}, b"q\n".to_vec()));
            contents.push(Object::Reference(open_id));
            contents.extend(existing.iter().copied().map(Object::Reference));
        }
        let paint = paint_operations(!existing.is_empty(), &name, geometry);
        let paint_bytes = Content { operations: paint }
            .encode()
            .map_err(|err| StempelError::Pdf(format!("failed to encode overlay call: {}", err)))?;
        let paint_id = document.add_object(Stream::new(dictionary! {}, paint_bytes));
        contents.push(Object::Reference(paint_id));

        let page_dict = node_dictionary_mut(document, page_id)?;
        page_dict.set("Resources", Object::Dictionary(page_resources));
        page_dict.set("Contents", Object::Array(contents));

        debug!(page, xobject = %name, original_streams = existing.len(), "overlay composited");
        Ok(())
    }

    fn resources_for(&mut self, document: &mut Document, overlay: &Overlay) -> OverlayResources {
        let key = (overlay.font(), overlay.opacity().to_bits());
        if let Some((_, _, resources)) = self
            .shared
            .iter()
            .find(|(font, opacity, _)| (*font, *opacity) == key)
        {
            return *resources;
        }
        let resources = OverlayResources::register(document, overlay.font(), overlay.opacity());
        self.shared.push((key.0, key.1, resources));
        resources
    }
}

/// The operators that restore the page's state (if its content was wrapped)
/// and paint the overlay form at the visible box's origin.
fn paint_operations(restore_first: bool, name: &str, geometry: &PageGeometry) -> Vec<Operation> {
    let mut operations = Vec::with_capacity(5);
    if restore_first {
        operations.push(Operation::new("Q", Vec::new()));
    }
    operations.push(Operation::new("q", Vec::new()));
    operations.push(Operation::new(
        "cm",
        vec![
            Object::Real(1.0f32.into()),
            Object::Real(0.0f32.into()),
            Object::Real(0.0f32.into()),
            Object::Real(1.0f32.into()),
            Object::Real(geometry.x.into()),
            Object::Real(geometry.y.into()),
        ],
    ));
    operations.push(Operation::new("Do", vec![Object::Name(name.as_bytes().to_vec())]));
    operations.push(Operation::new("Q", Vec::new()));
    operations
}

/// A page-local copy of the page's effective `/Resources`.
///
/// Resources may be inherited from the page tree or held in an indirect object
/// shared with other pages; neither may be modified, so the dictionary is
/// cloned and later stored directly on the page.
fn local_resources(document: &Document, page_id: ObjectId) -> Result<Dictionary> {
    match inherited_attribute(document, page_id, b"Resources")? {
        Some(Object::Dictionary(dict)) => Ok(dict.clone()),
        Some(Object::Null) | None => Ok(Dictionary::new()),
        Some(_) => Err(StempelError::Pdf(format!(
            "/Resources of page {:?} is not a dictionary",
            page_id
        ))),
    }
}

/// An owned copy of the sub-dictionary `key` of `resources`, following an
/// indirect reference if there is one.
fn owned_subdictionary(document: &Document, resources: &Dictionary, key: &[u8]) -> Result<Dictionary> {
    match resources.get(key) {
        Ok(value) => match resolve(document, value)? {
            Object::Dictionary(dict) => Ok(dict.clone()),
            Object::Null => Ok(Dictionary::new()),
            _ => Err(StempelError::Pdf(format!(
                "/{} resource entry is not a dictionary",
                String::from_utf8_lossy(key)
            ))),
        },
        Err(_) => Ok(Dictionary::new()),
    }
}

/// First `St<n>` not already used in `xobjects`. Repeated runs over the same
/// document therefore stack overlays instead of replacing them.
fn fresh_name(xobjects: &Dictionary) -> String {
    (0..)
        .map(|n| format!("{XOBJECT_PREFIX}{n}"))
        .find(|candidate| !xobjects.has(candidate.as_bytes()))
        .unwrap_or_default()
}
