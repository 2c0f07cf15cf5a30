// Word document (DOCX) reader
//
// The first table in the body wins, with its first row as the header.
// Documents without tables fall back to one row per non-empty paragraph.

use std::io::Cursor;

use docx_rust::document::{BodyContent, Paragraph, Table, TableCellContent, TableRowContent};
use docx_rust::DocxFile;

use crate::dataset::{normalize_cell, Column, Dataset};

pub const MAX_PARAGRAPHS: usize = 100;

pub fn read(bytes: &[u8]) -> Result<Dataset, String> {
    let file = DocxFile::from_reader(Cursor::new(bytes))
        .map_err(|e| format!("Failed to open DOCX: {}", e))?;
    let docx = file
        .parse()
        .map_err(|e| format!("Failed to read DOCX: {}", e))?;

    let mut paragraphs: Vec<String> = Vec::new();
    for content in &docx.document.body.content {
        match content {
            BodyContent::Table(table) => return dataset_from_table(table_rows(table)),
            BodyContent::Paragraph(paragraph) => {
                let text = paragraph_text(paragraph);
                let text = text.trim();
                if !text.is_empty() {
                    paragraphs.push(text.to_string());
                }
            }
            _ => {}
        }
    }

    dataset_from_paragraphs(paragraphs)
}

fn paragraph_text(paragraph: &Paragraph<'_>) -> String {
    paragraph.iter_text().map(|t| t.to_string()).collect()
}

fn table_rows(table: &Table<'_>) -> Vec<Vec<String>> {
    table
        .rows
        .iter()
        .map(|row| {
            row.cells
                .iter()
                .filter_map(|cell| match cell {
                    TableRowContent::TableCell(cell) => Some(
                        cell.content
                            .iter()
                            .filter_map(|content| match content {
                                TableCellContent::Paragraph(p) => Some(paragraph_text(p)),
                                #[allow(unreachable_patterns)]
                                _ => None,
                            })
                            .collect::<Vec<_>>()
                            .join("\n")
                            .trim()
                            .to_string(),
                    ),
                    #[allow(unreachable_patterns)]
                    _ => None,
                })
                .collect()
        })
        .collect()
}

pub fn dataset_from_table(rows: Vec<Vec<String>>) -> Result<Dataset, String> {
    let mut rows = rows.into_iter();
    let Some(header) = rows.next() else {
        return Err("Empty table found".to_string());
    };
    Ok(Dataset::from_rows(header, rows.collect()))
}

pub fn dataset_from_paragraphs(paragraphs: Vec<String>) -> Result<Dataset, String> {
    if paragraphs.is_empty() {
        return Err("No content found in DOCX".to_string());
    }

    let kept = &paragraphs[..paragraphs.len().min(MAX_PARAGRAPHS)];
    let numbers = (1..=kept.len()).map(|n| Some(n.to_string())).collect();
    let texts = kept.iter().map(|p| normalize_cell(p)).collect();

    Dataset::from_columns(vec![
        Column::new("paragraph_number", numbers),
        Column::new("text", texts),
    ])
    .map_err(|e| e.to_string())
}
