// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Document assembly — walk the pages in order, watermark those at or after the
// start page, and serialise the result as one unit.
//
// Pages before the start page are never touched. Any failure on any page
// aborts the run before a single output byte exists, so callers either get a
// complete document or nothing.

use std::io::Write;
use std::path::Path;

use stempel_core::config::{NoOpPolicy, WatermarkSpec};
use stempel_core::error::{Result, StempelError};
use tempfile::NamedTempFile;
use tracing::{debug, info, instrument, warn};

use super::compositor::PageCompositor;
use super::geometry::PageGeometryResolver;
use super::overlay::OverlayGenerator;
use crate::pdf::reader::PdfReader;

/// What one run did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssemblyReport {
    /// Pages in the input (and therefore in the output).
    pub total_pages: u32,
    /// 1-based numbers of the pages that received the mark, ascending.
    pub watermarked: Vec<u32>,
    /// Number of pages passed through unchanged.
    pub skipped: u32,
    /// Non-fatal outcomes, e.g. a start page beyond the document.
    pub warnings: Vec<String>,
}

/// A finished output document, held in memory until the caller writes it.
#[derive(Debug, Clone)]
pub struct Assembly {
    pub bytes: Vec<u8>,
    pub report: AssemblyReport,
}

/// Drives a run for one [`WatermarkSpec`].
pub struct DocumentAssembler<'a> {
    spec: &'a WatermarkSpec,
}

impl<'a> DocumentAssembler<'a> {
    pub fn new(spec: &'a WatermarkSpec) -> Self {
        Self { spec }
    }

    /// Watermark an opened document.
    ///
    /// Returns [`StempelError::NoOp`] when the start page lies beyond the last
    /// page and the spec's policy is [`NoOpPolicy::Abort`].
    #[instrument(skip_all, fields(start_page = self.spec.start_page))]
    pub fn assemble(&self, reader: PdfReader) -> Result<Assembly> {
        self.spec.validate()?;

        let total_pages = reader.page_count();
        let start_page = self.spec.start_page;
        let pages = reader.page_ids();
        info!(
            total_pages,
            start_page,
            source = reader.source_path().unwrap_or("<memory>"),
            "Assembling watermarked document"
        );
        let mut document = reader.into_document();

        let mut report = AssemblyReport {
            total_pages,
            ..Default::default()
        };

        if start_page > total_pages {
            let outcome = StempelError::NoOp {
                start_page,
                total_pages,
            };
            match self.spec.no_op_policy {
                NoOpPolicy::Abort => {
                    warn!(%outcome, "No pages to watermark, aborting");
                    return Err(outcome);
                }
                NoOpPolicy::PassThrough => {
                    warn!(%outcome, "No pages to watermark, passing document through");
                    report.skipped = total_pages;
                    report.warnings.push(outcome.to_string());
                }
            }
        } else {
            let generator = OverlayGenerator::new(self.spec)?;
            let mut compositor = PageCompositor::new();

            for (number, page_id) in pages {
                if number < start_page {
                    debug!(page = number, "Skipped page (before start page)");
                    report.skipped += 1;
                    continue;
                }

                let geometry = PageGeometryResolver::new(&document).resolve(number, page_id)?;
                let overlay = generator.generate(geometry.width, geometry.height)?;
                compositor.composite(&mut document, number, page_id, &geometry, &overlay)?;

                debug!(page = number, marks = overlay.mark_count(), "Added watermark");
                report.watermarked.push(number);
            }
        }

        let mut bytes = Vec::new();
        document.save_to(&mut bytes).map_err(|err| {
            StempelError::Pdf(format!("failed to serialise watermarked PDF: {}", err))
        })?;

        info!(
            watermarked = report.watermarked.len(),
            skipped = report.skipped,
            output_bytes = bytes.len(),
            "Assembly complete"
        );
        Ok(Assembly { bytes, report })
    }

    /// Watermark a PDF held in memory.
    pub fn assemble_bytes(&self, input: &[u8]) -> Result<Assembly> {
        self.assemble(PdfReader::from_bytes(input)?)
    }

    /// Read `input`, watermark it, and write the result to `output`.
    ///
    /// `output` is created only after the whole document has been assembled,
    /// and only appears once every byte of it is on disk.
    #[instrument(skip_all, fields(input = %input.as_ref().display(), output = %output.as_ref().display()))]
    pub fn assemble_file(
        &self,
        input: impl AsRef<Path>,
        output: impl AsRef<Path>,
    ) -> Result<AssemblyReport> {
        let assembly = self.assemble(PdfReader::open(input.as_ref())?)?;
        write_output(output.as_ref(), &assembly.bytes)?;
        info!("Wrote watermarked PDF to {}", output.as_ref().display());
        Ok(assembly.report)
    }
}

/// Stage `bytes` in a temporary file beside `path`, then rename it into
/// place. A failed write leaves `path` as it was; the staged file is removed
/// when it is dropped.
fn write_output(path: &Path, bytes: &[u8]) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut staged = NamedTempFile::new_in(dir)?;
    staged.write_all(bytes)?;
    staged.as_file().sync_all()?;
    staged
        .persist(path)
        .map_err(|err| StempelError::Io(err.error))?;
    debug!(bytes = bytes.len(), "Output persisted");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdf::reader::{content_stream_bytes, content_stream_ids};
    use crate::test_support::{FixturePage, build_document, numbered_pdf, to_bytes};
    use lopdf::{Document, Object};

    fn spec_from(start_page: u32) -> WatermarkSpec {
        WatermarkSpec {
            start_page,
            ..Default::default()
        }
    }

    fn pages_of(bytes: &[u8]) -> (Document, Vec<lopdf::ObjectId>) {
        let document = Document::load_mem(bytes).unwrap();
        let ids = document.get_pages().into_values().collect();
        (document, ids)
    }

    /// Number of `Tj` operators painted by the overlay forms of a page.
    fn overlay_marks(document: &Document, page_id: lopdf::ObjectId) -> usize {
        let page = document.get_object(page_id).unwrap().as_dict().unwrap();
        let resources = match page.get(b"Resources") {
            Ok(Object::Dictionary(dict)) => dict,
            _ => return 0,
        };
        let xobjects = match resources.get(b"XObject") {
            Ok(Object::Dictionary(dict)) => dict,
            _ => return 0,
        };
        xobjects
            .iter()
            .filter(|(name, _)| name.starts_with(b"St"))
            .map(|(_, form)| {
                let id = form.as_reference().unwrap();
                match document.get_object(id).unwrap() {
                    Object::Stream(stream) => {
                        String::from_utf8_lossy(&stream.content).matches("Tj").count()
                    }
                    _ => 0,
                }
            })
            .sum()
    }

    #[test]
    fn twenty_pages_from_page_nine() {
        let input = numbered_pdf(20, (612.0, 792.0));
        let assembly = DocumentAssembler::new(&spec_from(9))
            .assemble_bytes(&input)
            .unwrap();

        assert_eq!(assembly.report.total_pages, 20);
        assert_eq!(assembly.report.skipped, 8);
        assert_eq!(assembly.report.watermarked, (9..=20).collect::<Vec<u32>>());
        assert!(assembly.report.warnings.is_empty());

        let (input_doc, input_pages) = pages_of(&input);
        let (output_doc, output_pages) = pages_of(&assembly.bytes);
        assert_eq!(output_pages.len(), 20);

        for (index, (&before, &after)) in input_pages.iter().zip(&output_pages).enumerate() {
            let number = index + 1;
            let original = content_stream_bytes(&input_doc, before).unwrap();
            let current = content_stream_bytes(&output_doc, after).unwrap();
            if number < 9 {
                assert_eq!(original, current, "page {number} changed");
                assert_eq!(overlay_marks(&output_doc, after), 0);
            } else {
                assert!(
                    current.windows(original.len()).any(|w| w == original.as_slice()),
                    "page {number} lost its content"
                );
                assert_eq!(overlay_marks(&output_doc, after), 3, "page {number}");
            }
        }
    }

    #[test]
    fn page_order_is_preserved() {
        let input = numbered_pdf(6, (612.0, 792.0));
        let assembly = DocumentAssembler::new(&spec_from(2))
            .assemble_bytes(&input)
            .unwrap();

        let (output_doc, output_pages) = pages_of(&assembly.bytes);
        for (index, page_id) in output_pages.iter().enumerate() {
            let streams = content_stream_bytes(&output_doc, *page_id).unwrap();
            let label = format!("(Page {}) Tj", index + 1);
            assert!(
                streams
                    .iter()
                    .any(|s| String::from_utf8_lossy(s).contains(&label)),
                "page {} out of place",
                index + 1
            );
        }
    }

    #[test]
    fn start_page_beyond_document_aborts() {
        let input = numbered_pdf(5, (612.0, 792.0));
        let err = DocumentAssembler::new(&spec_from(9))
            .assemble_bytes(&input)
            .unwrap_err();
        assert!(err.is_advisory());
        assert!(matches!(
            err,
            StempelError::NoOp {
                start_page: 9,
                total_pages: 5
            }
        ));
    }

    #[test]
    fn no_op_writes_no_file() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("kitap.pdf");
        let output = dir.path().join("kitap_watermarked.pdf");
        std::fs::write(&input, numbered_pdf(5, (612.0, 792.0))).unwrap();

        let err = DocumentAssembler::new(&spec_from(9))
            .assemble_file(&input, &output)
            .unwrap_err();
        assert!(err.is_advisory());
        assert!(!output.exists());
    }

    #[test]
    fn pass_through_policy_emits_the_document_unchanged() {
        let input = numbered_pdf(5, (612.0, 792.0));
        let spec = WatermarkSpec {
            start_page: 9,
            no_op_policy: NoOpPolicy::PassThrough,
            ..Default::default()
        };
        let assembly = DocumentAssembler::new(&spec).assemble_bytes(&input).unwrap();

        assert!(assembly.report.watermarked.is_empty());
        assert_eq!(assembly.report.skipped, 5);
        assert_eq!(assembly.report.warnings.len(), 1);

        let (output_doc, output_pages) = pages_of(&assembly.bytes);
        assert_eq!(output_pages.len(), 5);
        for page_id in output_pages {
            assert_eq!(overlay_marks(&output_doc, page_id), 0);
        }
    }

    #[test]
    fn page_count_is_kept_for_every_start_page() {
        let input = numbered_pdf(4, (595.0, 842.0));
        for start_page in 1..=4 {
            let assembly = DocumentAssembler::new(&spec_from(start_page))
                .assemble_bytes(&input)
                .unwrap();
            let (_, pages) = pages_of(&assembly.bytes);
            assert_eq!(pages.len(), 4);
            assert_eq!(assembly.report.watermarked.len() as u32, 5 - start_page);
        }
    }

    #[test]
    fn watermarking_twice_doubles_the_marks() {
        let input = numbered_pdf(3, (612.0, 792.0));
        let assembler_spec = spec_from(1);
        let assembler = DocumentAssembler::new(&assembler_spec);

        let once = assembler.assemble_bytes(&input).unwrap();
        let twice = assembler.assemble_bytes(&once.bytes).unwrap();

        let (document, pages) = pages_of(&twice.bytes);
        for page_id in pages {
            assert_eq!(overlay_marks(&document, page_id), 6);
        }
    }

    #[test]
    fn zero_opacity_is_still_composited() {
        let input = numbered_pdf(2, (612.0, 792.0));
        let spec = WatermarkSpec {
            start_page: 1,
            opacity: 0.0,
            ..Default::default()
        };
        let assembly = DocumentAssembler::new(&spec).assemble_bytes(&input).unwrap();
        assert_eq!(assembly.report.watermarked, vec![1, 2]);

        let (document, pages) = pages_of(&assembly.bytes);
        assert_eq!(overlay_marks(&document, pages[0]), 3);

        let alpha_states: Vec<f32> = document
            .objects
            .values()
            .filter_map(|object| match object {
                Object::Dictionary(dict)
                    if dict.get(b"Type").and_then(Object::as_name).ok() == Some(b"ExtGState".as_slice()) =>
                {
                    match dict.get(b"ca") {
                        Ok(Object::Real(ca)) => Some(*ca as f32),
                        Ok(Object::Integer(ca)) => Some(*ca as f32),
                        _ => None,
                    }
                }
                _ => None,
            })
            .collect();
        assert_eq!(alpha_states, vec![0.0]);
    }

    #[test]
    fn mixed_page_sizes_get_matching_overlays() {
        let document = build_document(
            &[
                FixturePage::sized(612.0, 792.0),
                FixturePage::sized(842.0, 595.0),
            ],
            None,
        );
        let assembly = DocumentAssembler::new(&spec_from(1))
            .assemble_bytes(&to_bytes(document))
            .unwrap();
        assert_eq!(assembly.report.watermarked, vec![1, 2]);

        let (output_doc, pages) = pages_of(&assembly.bytes);
        for (page_id, expected_width) in pages.iter().zip([612.0f32, 842.0]) {
            let page = output_doc.get_object(*page_id).unwrap().as_dict().unwrap();
            let xobjects = page
                .get(b"Resources")
                .unwrap()
                .as_dict()
                .unwrap()
                .get(b"XObject")
                .unwrap()
                .as_dict()
                .unwrap();
            let form_id = xobjects.get(b"St0").unwrap().as_reference().unwrap();
            let form = match output_doc.get_object(form_id).unwrap() {
                Object::Stream(stream) => stream,
                _ => panic!("form is not a stream"),
            };
            let bbox = form.dict.get(b"BBox").unwrap().as_array().unwrap();
            match &bbox[2] {
                Object::Real(w) => assert_eq!(*w as f32, expected_width),
                Object::Integer(w) => assert_eq!(*w as f32, expected_width),
                other => panic!("unexpected bbox entry {other:?}"),
            }
        }
    }

    #[test]
    fn geometry_failure_aborts_the_whole_run() {
        let document = build_document(
            &[FixturePage::sized(612.0, 792.0), FixturePage::inheriting()],
            None,
        );
        let err = DocumentAssembler::new(&spec_from(1))
            .assemble_bytes(&to_bytes(document))
            .unwrap_err();
        assert!(matches!(err, StempelError::Geometry { page: 2, .. }));
    }

    #[test]
    fn failure_before_start_page_is_irrelevant() {
        // A broken page that is only passed through is never inspected.
        let document = build_document(
            &[FixturePage::inheriting(), FixturePage::sized(612.0, 792.0)],
            None,
        );
        let assembly = DocumentAssembler::new(&spec_from(2))
            .assemble_bytes(&to_bytes(document))
            .unwrap();
        assert_eq!(assembly.report.watermarked, vec![2]);
    }

    #[test]
    fn invalid_spec_is_rejected_before_reading_pages() {
        let input = numbered_pdf(2, (612.0, 792.0));
        let spec = WatermarkSpec {
            start_page: 1,
            text: String::new(),
            ..Default::default()
        };
        let err = DocumentAssembler::new(&spec).assemble_bytes(&input).unwrap_err();
        assert!(matches!(err, StempelError::Render(_)));
    }

    fn entries(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(dir)
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn failed_write_leaves_no_output_behind() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in.pdf");
        std::fs::write(&input, numbered_pdf(20, (612.0, 792.0))).unwrap();

        // A non-empty directory cannot be replaced by the finished file.
        let output = dir.path().join("out.pdf");
        std::fs::create_dir(&output).unwrap();
        std::fs::write(output.join("keep"), b"").unwrap();

        let err = DocumentAssembler::new(&spec_from(1))
            .assemble_file(&input, &output)
            .unwrap_err();
        assert!(matches!(err, StempelError::Io(_)));
        assert!(output.is_dir());
        assert_eq!(entries(dir.path()), vec!["in.pdf", "out.pdf"]);
    }

    #[test]
    fn missing_output_directory_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in.pdf");
        std::fs::write(&input, numbered_pdf(2, (612.0, 792.0))).unwrap();
        let output = dir.path().join("missing").join("out.pdf");

        let err = DocumentAssembler::new(&spec_from(1))
            .assemble_file(&input, &output)
            .unwrap_err();
        assert!(matches!(err, StempelError::Io(_)));
        assert!(!output.exists());
        assert_eq!(entries(dir.path()), vec!["in.pdf"]);
    }

    #[test]
    fn existing_output_is_replaced_whole() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in.pdf");
        let output = dir.path().join("out.pdf");
        std::fs::write(&input, numbered_pdf(2, (612.0, 792.0))).unwrap();
        std::fs::write(&output, vec![b'x'; 1 << 20]).unwrap();

        DocumentAssembler::new(&spec_from(1))
            .assemble_file(&input, &output)
            .unwrap();

        let written = std::fs::read(&output).unwrap();
        assert!(written.starts_with(b"%PDF-"));
        assert_eq!(PdfReader::from_bytes(&written).unwrap().page_count(), 2);
        assert_eq!(entries(dir.path()), vec!["in.pdf", "out.pdf"]);
    }

    #[test]
    fn failed_run_keeps_previous_output() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in.pdf");
        let output = dir.path().join("out.pdf");
        let document = build_document(
            &[FixturePage::sized(612.0, 792.0), FixturePage::inheriting()],
            None,
        );
        std::fs::write(&input, to_bytes(document)).unwrap();
        std::fs::write(&output, b"previous").unwrap();

        let err = DocumentAssembler::new(&spec_from(1))
            .assemble_file(&input, &output)
            .unwrap_err();
        assert!(matches!(err, StempelError::Geometry { page: 2, .. }));
        assert_eq!(std::fs::read(&output).unwrap(), b"previous");
    }

    #[test]
    fn file_round_trip_writes_output() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in.pdf");
        let output = dir.path().join("out.pdf");
        std::fs::write(&input, numbered_pdf(3, (612.0, 792.0))).unwrap();

        let report = DocumentAssembler::new(&spec_from(3))
            .assemble_file(&input, &output)
            .unwrap();
        assert_eq!(report.watermarked, vec![3]);

        let written = std::fs::read(&output).unwrap();
        let (document, pages) = pages_of(&written);
        assert_eq!(pages.len(), 3);
        assert_eq!(content_stream_ids(&document, pages[0]).unwrap().len(), 1);
        assert_eq!(content_stream_ids(&document, pages[2]).unwrap().len(), 3);
    }
}
