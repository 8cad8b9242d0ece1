// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Overlay generation — synthesise the watermark drawing for one page size.
//
// Each placement is drawn in its own saved graphics state: translate to the
// anchor, rotate, then draw the text shifted left by half its width so the
// rotation pivots about the text's centre. The save is a guard that emits the
// matching restore when it goes out of scope, on every exit path.

use std::ops::{Deref, DerefMut};

use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream, StringFormat, dictionary};
use stempel_core::config::WatermarkSpec;
use stempel_core::error::{Result, StempelError};
use stempel_core::types::{Rgb, StandardFont};
use tracing::{debug, instrument, warn};

use super::metrics;

/// Resource name of the watermark font inside the overlay.
pub const FONT_RESOURCE: &str = "StFont";
/// Resource name of the transparency state inside the overlay.
pub const ALPHA_RESOURCE: &str = "StAlpha";

fn real(value: f32) -> Object {
    Object::Real(value.into())
}

// -- Content building ---------------------------------------------------------

/// An operation list under construction.
pub(crate) struct ContentBuilder {
    operations: Vec<Operation>,
}

impl ContentBuilder {
    pub(crate) fn new() -> Self {
        Self {
            operations: Vec::new(),
        }
    }

    pub(crate) fn push(&mut self, operator: &str, operands: Vec<Object>) {
        self.operations.push(Operation::new(operator, operands));
    }

    /// Save the graphics state (`q`). The returned guard restores it (`Q`)
    /// when dropped.
    pub(crate) fn saved_state(&mut self) -> SavedState<'_> {
        self.push("q", Vec::new());
        SavedState { builder: self }
    }

    pub(crate) fn into_operations(self) -> Vec<Operation> {
        self.operations
    }
}

/// A saved graphics state; dereferences to the builder it was taken from.
pub(crate) struct SavedState<'a> {
    builder: &'a mut ContentBuilder,
}

impl Deref for SavedState<'_> {
    type Target = ContentBuilder;

    fn deref(&self) -> &ContentBuilder {
        self.builder
    }
}

impl DerefMut for SavedState<'_> {
    fn deref_mut(&mut self) -> &mut ContentBuilder {
        self.builder
    }
}

impl Drop for SavedState<'_> {
    fn drop(&mut self) {
        self.builder.push("Q", Vec::new());
    }
}

// -- Overlay ------------------------------------------------------------------

/// A watermark drawing sized for one page. Generated per page and consumed by
/// the compositor.
#[derive(Debug, Clone)]
pub struct Overlay {
    width: f32,
    height: f32,
    font: StandardFont,
    opacity: f32,
    marks: usize,
    operations: Vec<Operation>,
}

impl Overlay {
    /// (width, height) in points.
    pub fn size(&self) -> (f32, f32) {
        (self.width, self.height)
    }

    /// How many copies of the text the overlay draws.
    pub fn mark_count(&self) -> usize {
        self.marks
    }

    pub fn font(&self) -> StandardFont {
        self.font
    }

    pub fn opacity(&self) -> f32 {
        self.opacity
    }

    /// The drawing operations, in paint order.
    pub fn operations(&self) -> &[Operation] {
        &self.operations
    }

    /// Serialise the operations as a content stream body.
    pub fn encode(&self) -> Result<Vec<u8>> {
        Content {
            operations: self.operations.clone(),
        }
        .encode()
        .map_err(|err| StempelError::Pdf(format!("failed to encode overlay content: {}", err)))
    }

    /// Wrap the drawing in a Form XObject whose bounding box is the overlay
    /// size and whose resources are `resources`.
    pub fn to_form_xobject(&self, resources: &OverlayResources) -> Result<Stream> {
        let form = dictionary! {
            "Type" => "XObject",
            "Subtype" => "Form",
            "FormType" => Object::Integer(1),
            "BBox" => vec![real(0.0), real(0.0), real(self.width), real(self.height)],
            "Resources" => resources.dictionary(),
        };
        Ok(Stream::new(form, self.encode()?))
    }

    /// Render the overlay alone as a one-page PDF, for previewing a mark
    /// without touching a document.
    #[instrument(skip(self), fields(width = self.width, height = self.height))]
    pub fn to_pdf(&self) -> Result<Vec<u8>> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();

        let resources = OverlayResources::register(&mut doc, self.font, self.opacity);
        let content_id = doc.add_object(Stream::new(dictionary! {}, self.encode()?));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "Resources" => resources.dictionary(),
            "MediaBox" => vec![real(0.0), real(0.0), real(self.width), real(self.height)],
        });
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => vec![Object::Reference(page_id)],
                "Count" => Object::Integer(1),
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut output = Vec::new();
        doc.save_to(&mut output).map_err(|err| {
            StempelError::Pdf(format!("failed to serialise overlay preview: {}", err))
        })?;

        debug!(output_bytes = output.len(), "Overlay preview rendered");
        Ok(output)
    }
}

/// Font and transparency objects an overlay draws with, registered once in a
/// target document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OverlayResources {
    pub font_id: ObjectId,
    pub alpha_id: ObjectId,
}

impl OverlayResources {
    /// Add a standard-font dictionary and an `/ExtGState` with fill and
    /// stroke alpha `opacity` to `doc`.
    pub fn register(doc: &mut Document, font: StandardFont, opacity: f32) -> Self {
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => font.base_font(),
            "Encoding" => "WinAnsiEncoding",
        });
        let alpha_id = doc.add_object(dictionary! {
            "Type" => "ExtGState",
            "BM" => "Normal",
            "ca" => real(opacity),
            "CA" => real(opacity),
        });
        Self { font_id, alpha_id }
    }

    /// The `/Resources` dictionary naming these objects.
    pub fn dictionary(&self) -> Dictionary {
        dictionary! {
            "Font" => dictionary! {
                FONT_RESOURCE => self.font_id,
            },
            "ExtGState" => dictionary! {
                ALPHA_RESOURCE => self.alpha_id,
            },
        }
    }
}

// -- Generator ----------------------------------------------------------------

/// Builds overlays from one validated [`WatermarkSpec`].
///
/// The text is encoded and measured once; each call to
/// [`OverlayGenerator::generate`] only lays the marks out for a page size.
pub struct OverlayGenerator<'a> {
    spec: &'a WatermarkSpec,
    encoded_text: Vec<u8>,
    substituted: Vec<char>,
    text_width: f32,
    angle: f32,
}

impl<'a> OverlayGenerator<'a> {
    /// Fails with a render error if the text is empty, the opacity is outside
    /// `0.0..=1.0`, or the placements or font size cannot be drawn.
    ///
    /// Characters the standard fonts cannot show are drawn as `?` and logged
    /// as a warning.
    pub fn new(spec: &'a WatermarkSpec) -> Result<Self> {
        spec.check_render()?;
        let encoded_text = metrics::encode_win_ansi(&spec.text);
        let substituted = metrics::unencodable(&spec.text);
        if !substituted.is_empty() {
            let chars: String = substituted.iter().collect();
            warn!(
                text = %spec.text,
                substituted = %chars,
                "Watermark text has characters outside WinAnsi; they are drawn as '?'"
            );
        }
        let text_width = metrics::encoded_width(spec.font, &encoded_text, spec.font_size);
        Ok(Self {
            spec,
            encoded_text,
            substituted,
            text_width,
            angle: spec.normalized_angle(),
        })
    }

    /// Characters of the text replaced by `?`, in order of first appearance.
    pub fn substituted(&self) -> &[char] {
        &self.substituted
    }

    /// Measured width of the mark text in points.
    pub fn text_width(&self) -> f32 {
        self.text_width
    }

    /// Lay out one mark per placement on a `width` x `height` page.
    pub fn generate(&self, width: f32, height: f32) -> Result<Overlay> {
        if !(width.is_finite() && height.is_finite() && width > 0.0 && height > 0.0) {
            return Err(StempelError::Render(format!(
                "cannot size an overlay to {width}x{height}"
            )));
        }

        let mut builder = ContentBuilder::new();
        builder.push("gs", vec![Object::Name(ALPHA_RESOURCE.into())]);
        set_fill(&mut builder, self.spec.color);

        for fraction in &self.spec.placements {
            let mut state = builder.saved_state();
            self.place_mark(&mut state, width / 2.0, height * fraction)?;
        }

        Ok(Overlay {
            width,
            height,
            font: self.spec.font,
            opacity: self.spec.opacity,
            marks: self.spec.placements.len(),
            operations: builder.into_operations(),
        })
    }

    fn place_mark(&self, builder: &mut ContentBuilder, anchor_x: f32, anchor_y: f32) -> Result<()> {
        if !(anchor_x.is_finite() && anchor_y.is_finite()) {
            return Err(StempelError::Render(format!(
                "placement anchor ({anchor_x}, {anchor_y}) is not finite"
            )));
        }

        let (sin, cos) = self.angle.to_radians().sin_cos();

        builder.push(
            "cm",
            vec![real(1.0), real(0.0), real(0.0), real(1.0), real(anchor_x), real(anchor_y)],
        );
        builder.push(
            "cm",
            vec![real(cos), real(sin), real(-sin), real(cos), real(0.0), real(0.0)],
        );
        builder.push("BT", Vec::new());
        builder.push(
            "Tf",
            vec![Object::Name(FONT_RESOURCE.into()), real(self.spec.font_size)],
        );
        builder.push("Td", vec![real(-self.text_width / 2.0), real(0.0)]);
        builder.push(
            "Tj",
            vec![Object::String(self.encoded_text.clone(), StringFormat::Literal)],
        );
        builder.push("ET", Vec::new());
        Ok(())
    }
}

fn set_fill(builder: &mut ContentBuilder, color: Rgb) {
    builder.push("rg", vec![real(color.r), real(color.g), real(color.b)]);
}
