// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Stempel — diagonal text watermarks for PDF pages.
//
// Entry point. Initialises logging, parses the command line, and maps the
// outcome to an exit status: 0 on success, 2 when there was nothing to
// watermark, 1 on any other failure.

mod cli;

use std::process::ExitCode;

use clap::Parser;
use stempel_core::human_errors::{Severity, humanize_error};
use stempel_core::{StempelError, WatermarkSpec};
use stempel_document::{
    DocumentAssembler, OverlayGenerator, PdfReader, SampleWriter, verify_passthrough,
};

use cli::{Cli, Command};

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match run(cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => report(&err),
    }
}

fn run(command: Command) -> Result<(), StempelError> {
    match command {
        Command::Stamp {
            input,
            output,
            style,
            start_page,
            pass_through,
        } => {
            let spec = cli::stamp_spec(&style, start_page, pass_through)?;
            let output = output.unwrap_or_else(|| cli::default_output(&input));
            let report = DocumentAssembler::new(&spec).assemble_file(&input, &output)?;

            for warning in &report.warnings {
                eprintln!("warning: {warning}");
            }
            println!(
                "{}: watermarked {} of {} pages -> {}",
                input.display(),
                report.watermarked.len(),
                report.total_pages,
                output.display()
            );
        }

        Command::Preview {
            output,
            width,
            height,
            style,
        } => {
            let spec = style.to_spec()?;
            let overlay = OverlayGenerator::new(&spec)?.generate(width, height)?;
            std::fs::write(&output, overlay.to_pdf()?)?;
            println!(
                "{} marks on a {width}x{height} pt page -> {}",
                overlay.mark_count(),
                output.display()
            );
        }

        Command::Sample {
            output,
            pages,
            paper,
        } => {
            SampleWriter::new(cli::paper_size(&paper)?).write_to_file(pages, &output)?;
            println!("{pages} numbered pages -> {}", output.display());
        }

        Command::Verify {
            input,
            output,
            start_page,
            config,
        } => {
            let spec = match config {
                Some(path) => WatermarkSpec::load(path)?,
                None => WatermarkSpec::default(),
            };
            let start_page = start_page.unwrap_or(spec.start_page);
            let verification = verify_passthrough(
                &PdfReader::open(&input)?,
                &PdfReader::open(&output)?,
                start_page,
            )?;
            println!(
                "{}: {} pages intact, {} watermarked",
                output.display(),
                verification.untouched,
                verification.stamped
            );
        }
    }
    Ok(())
}

fn report(err: &StempelError) -> ExitCode {
    tracing::debug!(error = %err, "command failed");
    let human = humanize_error(err);
    let label = match human.severity {
        Severity::Advisory => "note",
        Severity::ActionRequired | Severity::Permanent => "error",
    };
    eprintln!("{label}: {}", human.message);
    eprintln!("  {}", human.suggestion);

    if err.is_advisory() {
        ExitCode::from(2)
    } else {
        ExitCode::FAILURE
    }
}
