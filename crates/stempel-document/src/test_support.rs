// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// In-memory fixture documents for unit tests. Built directly with lopdf so the
// object layout (shared resources, inherited boxes, content arrays) is known
// exactly.

use lopdf::content::{Content, Operation};
use lopdf::{Document, Object, Stream, dictionary};

/// How one fixture page is declared.
#[derive(Debug, Clone, Copy)]
pub(crate) struct FixturePage {
    pub media_box: Option<[f32; 4]>,
    pub crop_box: Option<[f32; 4]>,
    pub blank: bool,
    pub contents_as_array: bool,
}

impl FixturePage {
    pub fn sized(width: f32, height: f32) -> Self {
        Self {
            media_box: Some([0.0, 0.0, width, height]),
            crop_box: None,
            blank: false,
            contents_as_array: false,
        }
    }

    /// A page that declares no box of its own.
    pub fn inheriting() -> Self {
        Self {
            media_box: None,
            crop_box: None,
            blank: false,
            contents_as_array: false,
        }
    }

    pub fn with_media_box(mut self, media_box: [f32; 4]) -> Self {
        self.media_box = Some(media_box);
        self
    }

    pub fn with_crop_box(mut self, crop_box: [f32; 4]) -> Self {
        self.crop_box = Some(crop_box);
        self
    }

    pub fn blank(mut self) -> Self {
        self.blank = true;
        self
    }

    pub fn split_contents(mut self) -> Self {
        self.contents_as_array = true;
        self
    }
}

fn rect(values: [f32; 4]) -> Object {
    Object::Array(values.iter().map(|v| Object::Real((*v).into())).collect())
}

/// Build a document whose pages all share one indirect `/Resources` object
/// holding a Helvetica font named `/F1`.
pub(crate) fn build_document(pages: &[FixturePage], inherited_media_box: Option<[f32; 4]>) -> Document {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            "F1" => font_id,
        },
    });

    let mut kids: Vec<Object> = Vec::with_capacity(pages.len());
    for (index, fixture) in pages.iter().enumerate() {
        let number = index + 1;
        let mut page = dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Resources" => resources_id,
        };
        if let Some(media_box) = fixture.media_box {
            page.set("MediaBox", rect(media_box));
        }
        if let Some(crop_box) = fixture.crop_box {
            page.set("CropBox", rect(crop_box));
        }

        if !fixture.blank {
            let text = Content {
                operations: vec![
                    Operation::new("BT", vec![]),
                    Operation::new("Tf", vec!["F1".into(), 12.into()]),
                    Operation::new("Td", vec![72.into(), 720.into()]),
                    Operation::new("Tj", vec![Object::string_literal(format!("Page {number}"))]),
                    Operation::new("ET", vec![]),
                ],
            };
            let encoded = text.encode().unwrap();
            if fixture.contents_as_array {
                let rule = b"0 0 m 100 100 l S\n".to_vec();
                let first = doc.add_object(Stream::new(dictionary! {}, encoded));
                let second = doc.add_object(Stream::new(dictionary! {}, rule));
                page.set(
                    "Contents",
                    vec![Object::Reference(first), Object::Reference(second)],
                );
            } else {
                let content_id = doc.add_object(Stream::new(dictionary! {}, encoded));
                page.set("Contents", content_id);
            }
        }

        kids.push(Object::Reference(doc.add_object(page)));
    }

    let mut pages_dict = dictionary! {
        "Type" => "Pages",
        "Kids" => kids,
        "Count" => pages.len() as i64,
    };
    if let Some(media_box) = inherited_media_box {
        pages_dict.set("MediaBox", rect(media_box));
    }
    doc.objects.insert(pages_id, Object::Dictionary(pages_dict));

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc
}

/// Serialise a fixture document.
pub(crate) fn to_bytes(mut doc: Document) -> Vec<u8> {
    let mut out = Vec::new();
    doc.save_to(&mut out).unwrap();
    out
}

/// `count` pages of the same size, each printing its own page number.
pub(crate) fn numbered_pdf(count: usize, size: (f32, f32)) -> Vec<u8> {
    let pages = vec![FixturePage::sized(size.0, size.1); count];
    to_bytes(build_document(&pages, None))
}
