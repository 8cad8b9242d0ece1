// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Human-readable outcome messages.
//
// Every engine error is mapped to a plain sentence with a clear suggestion.
// The severity decides whether the caller treats the outcome as fatal.

use crate::error::StempelError;

/// Severity of an outcome from the user's perspective.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Nothing broke; the run simply had nothing to do.
    Advisory,
    /// The user must change an input or a setting.
    ActionRequired,
    /// The document itself cannot be processed as it is.
    Permanent,
}

/// A human-readable error with a plain message and an actionable suggestion.
#[derive(Debug, Clone)]
pub struct HumanError {
    /// One-line summary.
    pub message: String,
    /// What the user should try next.
    pub suggestion: String,
    /// Severity level (drives exit status in the CLI).
    pub severity: Severity,
}

/// Convert a `StempelError` into a `HumanError`.
pub fn humanize_error(err: &StempelError) -> HumanError {
    match err {
        StempelError::NoOp {
            start_page,
            total_pages,
        } => HumanError {
            message: format!(
                "No watermark was added: the document has {total_pages} pages but watermarking starts at page {start_page}."
            ),
            suggestion: "Pick a start page inside the document, or pass --pass-through to copy it unchanged.".into(),
            severity: Severity::Advisory,
        },

        StempelError::Geometry { page, reason } => HumanError {
            message: format!("Page {page} has no usable page size."),
            suggestion: format!(
                "The PDF may be damaged. Re-export it from the program that created it. ({reason})"
            ),
            severity: Severity::Permanent,
        },

        StempelError::Render(detail) => HumanError {
            message: "The watermark settings cannot be drawn.".into(),
            suggestion: format!("Check the text, opacity, placements and font size. ({detail})"),
            severity: Severity::ActionRequired,
        },

        StempelError::DimensionMismatch { page, .. } => HumanError {
            message: format!("The watermark for page {page} was built for a different page size."),
            suggestion: "This is an internal fault. Please report it with the input PDF.".into(),
            severity: Severity::Permanent,
        },

        StempelError::Pdf(detail) => HumanError {
            message: "The file could not be read or written as a PDF.".into(),
            suggestion: format!("Make sure the input is an unencrypted, valid PDF. ({detail})"),
            severity: Severity::Permanent,
        },

        StempelError::Integrity { page, reason } => HumanError {
            message: format!("Page {page} of the output does not match the input."),
            suggestion: format!("Re-run the watermarking from the original file. ({reason})"),
            severity: Severity::Permanent,
        },

        StempelError::Config(detail) => HumanError {
            message: "A setting has an invalid value.".into(),
            suggestion: detail.clone(),
            severity: Severity::ActionRequired,
        },

        StempelError::Io(io_err) => humanize_io_error(io_err),

        StempelError::Serialization(detail) => HumanError {
            message: "The configuration file is not valid JSON.".into(),
            suggestion: format!("Fix the file or remove --config. ({detail})"),
            severity: Severity::ActionRequired,
        },
    }
}

fn humanize_io_error(err: &std::io::Error) -> HumanError {
    use std::io::ErrorKind;

    let (message, suggestion) = match err.kind() {
        ErrorKind::NotFound => (
            "The file was not found.",
            "Check the path and make sure the PDF is in that folder.",
        ),
        ErrorKind::PermissionDenied => (
            "Permission denied.",
            "Choose a location you are allowed to read from and write to.",
        ),
        _ => ("The file could not be read or written.", "Try again or choose another location."),
    };

    HumanError {
        message: message.into(),
        suggestion: format!("{suggestion} ({err})"),
        severity: Severity::ActionRequired,
    }
}
