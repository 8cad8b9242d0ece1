// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Pass-through verification — prove that a watermarked document still carries
// every original page content stream, byte for byte.

use sha2::{Digest, Sha256};
use stempel_core::error::{Result, StempelError};
use tracing::{debug, info, instrument};

use super::reader::{PdfReader, content_stream_bytes};

/// SHA-256 of `data` as a lowercase hex string.
pub fn fingerprint(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

/// Outcome of a successful [`verify_passthrough`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VerificationReport {
    pub total_pages: u32,
    /// Pages whose content streams are identical to the input's.
    pub untouched: u32,
    /// Pages that keep their original streams plus added ones.
    pub stamped: u32,
}

/// Compare `output` against `input`, page by page.
///
/// Pages before `start_page` must have exactly the same content streams. Pages
/// from `start_page` on must contain each input stream unchanged and in the
/// original order, with anything else only added around them.
#[instrument(skip(input, output))]
pub fn verify_passthrough(
    input: &PdfReader,
    output: &PdfReader,
    start_page: u32,
) -> Result<VerificationReport> {
    let total_pages = input.page_count();
    if output.page_count() != total_pages {
        return Err(StempelError::Integrity {
            page: 0,
            reason: format!(
                "output has {} pages, input has {total_pages}",
                output.page_count()
            ),
        });
    }

    let mut report = VerificationReport {
        total_pages,
        ..Default::default()
    };

    for ((number, before), (_, after)) in input.page_ids().into_iter().zip(output.page_ids()) {
        let original = fingerprints(input, before)?;
        let current = fingerprints(output, after)?;

        if number < start_page {
            if original != current {
                return Err(StempelError::Integrity {
                    page: number,
                    reason: "page before the start page was modified".into(),
                });
            }
            report.untouched += 1;
        } else {
            if !contains_in_order(&current, &original) {
                return Err(StempelError::Integrity {
                    page: number,
                    reason: "original content streams are missing or reordered".into(),
                });
            }
            if current.len() > original.len() {
                report.stamped += 1;
            } else {
                report.untouched += 1;
            }
        }
        debug!(page = number, streams = current.len(), "page verified");
    }

    info!(
        total_pages,
        untouched = report.untouched,
        stamped = report.stamped,
        "Verification passed"
    );
    Ok(report)
}

fn fingerprints(reader: &PdfReader, page_id: lopdf::ObjectId) -> Result<Vec<String>> {
    Ok(content_stream_bytes(reader.document(), page_id)?
        .iter()
        .map(|bytes| fingerprint(bytes))
        .collect())
}

/// True when `needle` occurs in `haystack` as a contiguous run.
fn contains_in_order(haystack: &[String], needle: &[String]) -> bool {
    needle.is_empty() || haystack.windows(needle.len()).any(|window| window == needle)
}
