// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Command-line surface. Flags override a JSON config file, which overrides the
// built-in defaults.

use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use stempel_core::error::{Result, StempelError};
use stempel_core::{NoOpPolicy, PaperSize, Rgb, StandardFont, WatermarkSpec};

#[derive(Debug, Parser)]
#[command(name = "stempel", version, about = "Diagonal text watermarks for PDF pages")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Watermark every page from the start page on.
    Stamp {
        /// PDF to watermark.
        input: PathBuf,
        /// Where to write the result. Defaults to `<input>_watermarked.pdf`.
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[command(flatten)]
        style: StyleArgs,
        /// First 1-based page to watermark.
        #[arg(long)]
        start_page: Option<u32>,
        /// Copy the document unchanged when the start page is past the end.
        #[arg(long)]
        pass_through: bool,
    },
    /// Write the overlay on its own as a one-page PDF.
    Preview {
        #[arg(short, long, default_value = "watermark_preview.pdf")]
        output: PathBuf,
        /// Page width in points (A4 by default).
        #[arg(long, default_value_t = 595.28)]
        width: f32,
        /// Page height in points (A4 by default).
        #[arg(long, default_value_t = 841.89)]
        height: f32,
        #[command(flatten)]
        style: StyleArgs,
    },
    /// Write a document of numbered pages to try settings on.
    Sample {
        output: PathBuf,
        #[arg(long, default_value_t = 12)]
        pages: u32,
        /// a4, a3, a5, letter, legal or tabloid.
        #[arg(long, default_value = "a4")]
        paper: String,
    },
    /// Check that a watermarked PDF kept every original page intact.
    Verify {
        input: PathBuf,
        output: PathBuf,
        #[arg(long)]
        start_page: Option<u32>,
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

/// Appearance flags shared by `stamp` and `preview`.
#[derive(Debug, Default, Args)]
pub struct StyleArgs {
    /// JSON file with watermark settings.
    #[arg(long)]
    pub config: Option<PathBuf>,
    #[arg(long)]
    pub text: Option<String>,
    /// Fill alpha from 0.0 to 1.0.
    #[arg(long)]
    pub opacity: Option<f32>,
    /// Rotation in degrees, counter-clockwise.
    #[arg(long, allow_negative_numbers = true)]
    pub angle: Option<f32>,
    /// Comma-separated fractions of the page height, e.g. `0.75,0.5,0.25`.
    #[arg(long)]
    pub placements: Option<String>,
    #[arg(long)]
    pub font_size: Option<f32>,
    /// helvetica, helvetica-bold, times-roman or times-bold.
    #[arg(long)]
    pub font: Option<String>,
    /// Hex colour such as `808080` or `#c00`.
    #[arg(long)]
    pub color: Option<String>,
}

impl StyleArgs {
    /// Build the run's spec: defaults, then the config file, then flags.
    pub fn to_spec(&self) -> Result<WatermarkSpec> {
        let mut spec = match &self.config {
            Some(path) => WatermarkSpec::load(path)?,
            None => WatermarkSpec::default(),
        };

        if let Some(text) = &self.text {
            spec.text = text.clone();
        }
        if let Some(opacity) = self.opacity {
            spec.opacity = opacity;
        }
        if let Some(angle) = self.angle {
            spec.angle = angle;
        }
        if let Some(placements) = &self.placements {
            spec.placements = parse_placements(placements)?;
        }
        if let Some(font_size) = self.font_size {
            spec.font_size = font_size;
        }
        if let Some(font) = &self.font {
            spec.font = StandardFont::from_name(font)
                .ok_or_else(|| StempelError::Config(format!("unknown font '{font}'")))?;
        }
        if let Some(color) = &self.color {
            spec.color = Rgb::from_hex(color)?;
        }
        Ok(spec)
    }
}

/// Spec for `stamp`, including the start page and no-op policy.
pub fn stamp_spec(style: &StyleArgs, start_page: Option<u32>, pass_through: bool) -> Result<WatermarkSpec> {
    let mut spec = style.to_spec()?;
    if let Some(start_page) = start_page {
        spec.start_page = start_page;
    }
    if pass_through {
        spec.no_op_policy = NoOpPolicy::PassThrough;
    }
    Ok(spec)
}

/// Parse `0.75,0.5,0.25` into fractions. Range checks happen in the spec.
pub fn parse_placements(list: &str) -> Result<Vec<f32>> {
    list.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(|item| {
            item.parse::<f32>()
                .map_err(|_| StempelError::Config(format!("placement '{item}' is not a number")))
        })
        .collect()
}

/// `book.pdf` becomes `book_watermarked.pdf` in the same directory.
pub fn default_output(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "document".to_owned());
    input.with_file_name(format!("{stem}_watermarked.pdf"))
}

pub fn paper_size(name: &str) -> Result<PaperSize> {
    PaperSize::from_name(name).ok_or_else(|| StempelError::Config(format!("unknown paper size '{name}'")))
}
