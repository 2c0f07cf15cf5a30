//! File Parsers
//!
//! Turns uploaded file bytes into a [`Dataset`]. The reader is chosen strictly
//! by file extension:
//!
//! - `csv`, `tsv`, `txt` - delimited text ([`delimited`])
//! - `xlsx`, `xls`, `xlsm`, `xlsb`, `ods` - first worksheet ([`spreadsheet`])
//! - `pdf` - extracted page text ([`pdf`])
//! - `docx` - first table, or paragraphs ([`document`])
//!
//! Readers report failures as plain messages; [`parse`] wraps them into
//! [`AppError::Parse`] so the caller sees which format failed and why.

pub mod delimited;
pub mod document;
pub mod pdf;
pub mod spreadsheet;

use std::path::Path;

use serde::Serialize;
use tracing::{debug, info};

use crate::dataset::Dataset;
use crate::types::{AppError, AppResult};

pub const SUPPORTED_EXTENSIONS: &[&str] = &[
    "csv", "tsv", "txt", "xlsx", "xls", "xlsm", "xlsb", "ods", "pdf", "docx",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FileFormat {
    Delimited,
    Spreadsheet,
    Pdf,
    Document,
}

impl FileFormat {
    pub fn from_extension(extension: &str) -> Option<Self> {
        match extension.to_lowercase().as_str() {
            "csv" | "tsv" | "txt" => Some(FileFormat::Delimited),
            "xlsx" | "xls" | "xlsm" | "xlsb" | "ods" => Some(FileFormat::Spreadsheet),
            "pdf" => Some(FileFormat::Pdf),
            "docx" => Some(FileFormat::Document),
            _ => None,
        }
    }

    pub fn from_filename(filename: &str) -> AppResult<Self> {
        let extension = Path::new(filename)
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default()
            .to_lowercase();

        Self::from_extension(&extension).ok_or_else(|| {
            let shown = if extension.is_empty() {
                "(none)".to_string()
            } else {
                format!(".{}", extension)
            };
            AppError::UnsupportedFormat(format!(
                "Unsupported file type: {}. Supported: {}",
                shown,
                SUPPORTED_EXTENSIONS.join(", ")
            ))
        })
    }

    /// Human-readable label reported back to the uploader.
    pub fn label(&self) -> &'static str {
        match self {
            FileFormat::Delimited => "CSV/TXT",
            FileFormat::Spreadsheet => "Excel",
            FileFormat::Pdf => "PDF",
            FileFormat::Document => "DOCX",
        }
    }
}

impl std::fmt::Display for FileFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Parse file bytes into a dataset using the reader selected by `filename`'s extension.
pub fn parse(bytes: &[u8], filename: &str) -> AppResult<(Dataset, FileFormat)> {
    let format = FileFormat::from_filename(filename)?;
    debug!(filename = %filename, format = %format, size = bytes.len(), "Dispatching file to reader");

    let result = match format {
        FileFormat::Delimited => delimited::read(bytes),
        FileFormat::Spreadsheet => spreadsheet::read(bytes),
        FileFormat::Pdf => pdf::read(bytes),
        FileFormat::Document => document::read(bytes),
    };
    let dataset = result.map_err(|message| AppError::parse(format.label(), message))?;

    info!(
        filename = %filename,
        format = %format,
        rows = dataset.row_count(),
        columns = dataset.column_count(),
        "Parsed uploaded file"
    );
    Ok((dataset, format))
}
