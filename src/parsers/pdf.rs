// PDF reader
//
// Text is extracted page by page. If the first non-blank line contains a
// delimiter the text is read as a delimited table, otherwise every line
// becomes a row of a two-column dataset.

use lopdf::Document;
use tracing::warn;

use crate::dataset::{normalize_cell, Column, Dataset};
use crate::parsers::delimited;

pub const MAX_TEXT_LINES: usize = 100;

const PDF_DELIMITERS: &[char] = &[',', '\t', '|', ';'];

pub fn read(bytes: &[u8]) -> Result<Dataset, String> {
    let document =
        Document::load_mem(bytes).map_err(|e| format!("Failed to load PDF: {}", e))?;

    let mut text = String::new();
    for page in document.get_pages().keys() {
        match document.extract_text(&[*page]) {
            Ok(page_text) => {
                text.push_str(&page_text);
                text.push('\n');
            }
            Err(e) => warn!(page = *page, error = %e, "Skipping PDF page without extractable text"),
        }
    }

    dataset_from_text(&text)
}

pub fn dataset_from_text(text: &str) -> Result<Dataset, String> {
    let lines: Vec<&str> = text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect();

    let Some(first) = lines.first() else {
        return Err("No text extracted from PDF".to_string());
    };

    if let Some(delimiter) = PDF_DELIMITERS.iter().find(|d| first.contains(**d)) {
        return delimited::parse_delimited(&lines.join("\n"), *delimiter as u8)
            .map_err(|e| format!("Failed to read PDF text as a table: {}", e));
    }

    let kept = &lines[..lines.len().min(MAX_TEXT_LINES)];
    let line_numbers = (1..=kept.len()).map(|n| Some(n.to_string())).collect();
    let text_values = kept.iter().map(|line| normalize_cell(line)).collect();

    Dataset::from_columns(vec![
        Column::new("line_number", line_numbers),
        Column::new("extracted_text", text_values),
    ])
    .map_err(|e| e.to_string())
}
