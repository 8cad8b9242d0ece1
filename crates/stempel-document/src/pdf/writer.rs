// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Sample documents — numbered pages built with `printpdf` 0.8, used to try
// out a watermark setup without a real book at hand.
//
// printpdf 0.8 builds pages from plain `Vec<Op>` lists and serialises the
// whole document in one `PdfDocument::save()` call.

use std::path::Path;

use printpdf::{
    BuiltinFont, Mm, Op, PdfDocument, PdfPage, PdfSaveOptions, PdfWarnMsg, Point, Pt, TextItem,
};
use stempel_core::PaperSize;
use stempel_core::error::{Result, StempelError};
use tracing::{debug, info, instrument};

const LABEL_SIZE_PT: f32 = 24.0;
const MARGIN_MM: f32 = 25.0;

/// Writes plain multi-page PDFs whose pages only say "Page N".
pub struct SampleWriter {
    paper_size: PaperSize,
    title: String,
}

impl SampleWriter {
    pub fn new(paper_size: PaperSize) -> Self {
        Self {
            paper_size,
            title: "Stempel sample".to_owned(),
        }
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = title.into();
    }

    fn page_dimensions(&self) -> (Mm, Mm) {
        let (w_mm, h_mm) = self.paper_size.dimensions_mm();
        (Mm(w_mm as f32), Mm(h_mm as f32))
    }

    /// Build a document with `pages` numbered pages.
    #[instrument(skip(self), fields(paper = ?self.paper_size))]
    pub fn create(&self, pages: u32) -> Result<Vec<u8>> {
        if pages == 0 {
            return Err(StempelError::Config(
                "a sample document needs at least one page".into(),
            ));
        }

        let (page_w, page_h) = self.page_dimensions();
        let margin_pt = Mm(MARGIN_MM).into_pt().0;
        let top_pt = page_h.into_pt().0 - margin_pt;

        let mut doc = PdfDocument::new(&self.title);
        let numbered: Vec<PdfPage> = (1..=pages)
            .map(|number| {
                let ops = vec![
                    Op::StartTextSection,
                    Op::SetTextCursor {
                        pos: Point {
                            x: Pt(margin_pt),
                            y: Pt(top_pt),
                        },
                    },
                    Op::SetFontSizeBuiltinFont {
                        size: Pt(LABEL_SIZE_PT),
                        font: BuiltinFont::Helvetica,
                    },
                    Op::WriteTextBuiltinFont {
                        items: vec![TextItem::Text(format!("Page {number}"))],
                        font: BuiltinFont::Helvetica,
                    },
                    Op::EndTextSection,
                ];
                PdfPage::new(page_w, page_h, ops)
            })
            .collect();
        doc.with_pages(numbered);

        let mut warnings: Vec<PdfWarnMsg> = Vec::new();
        let output = doc.save(&PdfSaveOptions::default(), &mut warnings);
        debug!(pages, warnings = warnings.len(), bytes = output.len(), "Sample document built");

        Ok(output)
    }

    /// Build a sample document and write it to `path`.
    pub fn write_to_file(&self, pages: u32, path: impl AsRef<Path>) -> Result<()> {
        let bytes = self.create(pages)?;
        std::fs::write(path.as_ref(), &bytes)?;
        info!("Wrote {pages}-page sample to {}", path.as_ref().display());
        Ok(())
    }
}
