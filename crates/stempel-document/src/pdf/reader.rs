// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF reader — open existing PDF documents with `lopdf` and answer the page
// tree questions the watermarking engine asks: page order, inherited page
// attributes, and the content streams that make up a page.

use std::path::Path;

use lopdf::{Dictionary, Document, Object, ObjectId};
use stempel_core::error::{Result, StempelError};
use tracing::{debug, info, instrument};

/// Guard against `/Parent` or reference cycles in damaged files.
const MAX_CHAIN_DEPTH: usize = 64;

/// Reads an existing PDF fully into memory.
///
/// Wraps `lopdf::Document`. The reader owns the document; the assembler takes
/// it over with [`PdfReader::into_document`] and never touches the source
/// bytes again.
pub struct PdfReader {
    /// The underlying lopdf document.
    document: Document,
    /// Source path, if opened from a file (useful for diagnostics).
    source_path: Option<String>,
}

impl PdfReader {
    // -- Construction ---------------------------------------------------------

    /// Open a PDF from the filesystem.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path_ref = path.as_ref();
        info!("Opening PDF: {}", path_ref.display());

        let bytes = std::fs::read(path_ref)?;
        let mut reader = Self::from_bytes(&bytes)?;
        reader.source_path = Some(path_ref.display().to_string());
        Ok(reader)
    }

    /// Create a reader from raw PDF bytes already in memory.
    #[instrument(skip_all, fields(bytes_len = data.len()))]
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let document = Document::load_mem(data).map_err(|err| {
            StempelError::Pdf(format!("failed to load PDF from memory: {}", err))
        })?;

        if document.is_encrypted() {
            return Err(StempelError::Pdf(
                "encrypted documents are not supported".to_string(),
            ));
        }

        debug!(pages = document.get_pages().len(), "PDF loaded from bytes");

        Ok(Self {
            document,
            source_path: None,
        })
    }

    /// Wrap a document that was built in memory.
    pub fn from_document(document: Document) -> Self {
        Self {
            document,
            source_path: None,
        }
    }

    // -- Inspection -----------------------------------------------------------

    /// Number of pages in the document.
    pub fn page_count(&self) -> u32 {
        self.document.get_pages().len() as u32
    }

    /// Page object ids keyed by 1-based page number, in reading order.
    pub fn page_ids(&self) -> Vec<(u32, ObjectId)> {
        self.document.get_pages().into_iter().collect()
    }

    /// Return the source path if the reader was created via [`PdfReader::open`].
    pub fn source_path(&self) -> Option<&str> {
        self.source_path.as_deref()
    }

    /// Borrow the underlying document.
    pub fn document(&self) -> &Document {
        &self.document
    }

    /// Hand the document over to the caller.
    pub fn into_document(self) -> Document {
        self.document
    }
}

// -- Page tree helpers --------------------------------------------------------

/// Follow indirect references until a direct object is reached.
pub(crate) fn resolve<'a>(document: &'a Document, object: &'a Object) -> Result<&'a Object> {
    let mut current = object;
    for _ in 0..MAX_CHAIN_DEPTH {
        match current {
            Object::Reference(id) => {
                current = document.get_object(*id).map_err(|err| {
                    StempelError::Pdf(format!("cannot resolve object {:?}: {}", id, err))
                })?;
            }
            direct => return Ok(direct),
        }
    }
    Err(StempelError::Pdf("reference chain too deep".to_string()))
}

/// Borrow the dictionary of a page (or page tree node).
pub(crate) fn node_dictionary(document: &Document, node_id: ObjectId) -> Result<&Dictionary> {
    match document.get_object(node_id) {
        Ok(Object::Dictionary(dict)) => Ok(dict),
        Ok(other) => Err(StempelError::Pdf(format!(
            "page tree node {:?} is a {}, not a dictionary",
            node_id,
            kind(other)
        ))),
        Err(err) => Err(StempelError::Pdf(format!(
            "cannot read page tree node {:?}: {}",
            node_id, err
        ))),
    }
}

/// Mutably borrow the dictionary of a page.
pub(crate) fn node_dictionary_mut(
    document: &mut Document,
    node_id: ObjectId,
) -> Result<&mut Dictionary> {
    match document.get_object_mut(node_id) {
        Ok(Object::Dictionary(dict)) => Ok(dict),
        Ok(_) => Err(StempelError::Pdf(format!(
            "page {:?} is not a dictionary",
            node_id
        ))),
        Err(err) => Err(StempelError::Pdf(format!(
            "cannot read page {:?}: {}",
            node_id, err
        ))),
    }
}

/// Look up an inheritable page attribute (`/MediaBox`, `/CropBox`,
/// `/Resources`, `/Rotate`), walking up the `/Parent` chain. The returned
/// object is already dereferenced.
pub(crate) fn inherited_attribute<'a>(
    document: &'a Document,
    page_id: ObjectId,
    key: &[u8],
) -> Result<Option<&'a Object>> {
    let mut node_id = page_id;
    for _ in 0..MAX_CHAIN_DEPTH {
        let node = node_dictionary(document, node_id)?;
        if let Ok(value) = node.get(key) {
            return resolve(document, value).map(Some);
        }
        match node.get(b"Parent") {
            Ok(Object::Reference(parent)) => node_id = *parent,
            _ => return Ok(None),
        }
    }
    Err(StempelError::Pdf(format!(
        "/Parent chain of page {:?} is too deep",
        page_id
    )))
}

/// The ids of the content streams of a page, in paint order.
///
/// Handles both forms of `/Contents`: a single stream reference, or an array
/// (direct or indirect) of stream references. A page without `/Contents` is
/// blank and yields an empty list.
pub(crate) fn content_stream_ids(document: &Document, page_id: ObjectId) -> Result<Vec<ObjectId>> {
    let page = node_dictionary(document, page_id)?;
    let contents = match page.get(b"Contents") {
        Ok(contents) => contents,
        Err(_) => return Ok(Vec::new()),
    };

    match contents {
        Object::Reference(id) => match resolve(document, contents)? {
            Object::Array(items) => collect_references(items),
            Object::Stream(_) => Ok(vec![*id]),
            other => Err(StempelError::Pdf(format!(
                "/Contents of page {:?} points at a {}",
                page_id,
                kind(other)
            ))),
        },
        Object::Array(items) => collect_references(items),
        other => Err(StempelError::Pdf(format!(
            "/Contents of page {:?} is a {}",
            page_id,
            kind(other)
        ))),
    }
}

/// Short name of an object's type for error messages.
pub(crate) fn kind(object: &Object) -> &'static str {
    match object {
        Object::Null => "null",
        Object::Boolean(_) => "boolean",
        Object::Integer(_) | Object::Real(_) => "number",
        Object::Name(_) => "name",
        Object::String(..) => "string",
        Object::Array(_) => "array",
        Object::Dictionary(_) => "dictionary",
        Object::Stream(_) => "stream",
        Object::Reference(_) => "reference",
    }
}

fn collect_references(items: &[Object]) -> Result<Vec<ObjectId>> {
    items
        .iter()
        .map(|item| {
            item.as_reference().map_err(|_| {
                StempelError::Pdf("/Contents array holds a non-reference entry".to_string())
            })
        })
        .collect()
}

/// Raw (still encoded) bytes of each content stream of a page.
pub(crate) fn content_stream_bytes(document: &Document, page_id: ObjectId) -> Result<Vec<Vec<u8>>> {
    content_stream_ids(document, page_id)?
        .into_iter()
        .map(|id| match document.get_object(id) {
            Ok(Object::Stream(stream)) => Ok(stream.content.clone()),
            Ok(other) => Err(StempelError::Pdf(format!(
                "content object {:?} is a {}, not a stream",
                id,
                kind(other)
            ))),
            Err(err) => Err(StempelError::Pdf(format!(
                "cannot read content stream {:?}: {}",
                id, err
            ))),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{FixturePage, build_document, numbered_pdf};

    #[test]
    fn pages_come_back_in_order() {
        let reader = PdfReader::from_bytes(&numbered_pdf(4, (612.0, 792.0))).unwrap();
        assert_eq!(reader.page_count(), 4);
        let numbers: Vec<u32> = reader.page_ids().iter().map(|(n, _)| *n).collect();
        assert_eq!(numbers, vec![1, 2, 3, 4]);
        assert!(reader.source_path().is_none());
    }

    #[test]
    fn garbage_is_a_pdf_error() {
        let err = PdfReader::from_bytes(b"definitely not a pdf").err().unwrap();
        assert!(matches!(err, StempelError::Pdf(_)));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = PdfReader::open("/nonexistent/kitap.pdf").err().unwrap();
        assert!(matches!(err, StempelError::Io(_)));
    }

    #[test]
    fn open_records_the_source_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("kitap.pdf");
        std::fs::write(&path, numbered_pdf(2, (595.0, 842.0))).unwrap();

        let reader = PdfReader::open(&path).unwrap();
        assert_eq!(reader.page_count(), 2);
        assert!(reader.source_path().unwrap().ends_with("kitap.pdf"));
    }

    #[test]
    fn media_box_is_inherited_from_the_page_tree() {
        let document = build_document(
            &[FixturePage::inheriting(), FixturePage::inheriting()],
            Some([0.0, 0.0, 420.0, 595.0]),
        );
        let (_, page_id) = document.get_pages().into_iter().next().unwrap();

        let media_box = inherited_attribute(&document, page_id, b"MediaBox")
            .unwrap()
            .unwrap();
        assert_eq!(media_box.as_array().unwrap().len(), 4);
        assert!(
            inherited_attribute(&document, page_id, b"CropBox")
                .unwrap()
                .is_none()
        );
    }

    #[test]
    fn single_stream_contents() {
        let document = build_document(&[FixturePage::sized(612.0, 792.0)], None);
        let (_, page_id) = document.get_pages().into_iter().next().unwrap();

        let bytes = content_stream_bytes(&document, page_id).unwrap();
        assert_eq!(bytes.len(), 1);
        assert!(String::from_utf8_lossy(&bytes[0]).contains("(Page 1) Tj"));
    }

    #[test]
    fn blank_page_has_no_content_streams() {
        let document = build_document(&[FixturePage::sized(612.0, 792.0).blank()], None);
        let (_, page_id) = document.get_pages().into_iter().next().unwrap();
        assert!(content_stream_ids(&document, page_id).unwrap().is_empty());
    }
}
