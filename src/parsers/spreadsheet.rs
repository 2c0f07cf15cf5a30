// Spreadsheet reader (xlsx, xls, xlsm, xlsb, ods)
//
// Only the first worksheet is read. Its first row is the header.

use std::io::Cursor;

use calamine::{open_workbook_auto_from_rs, Data, Reader};
use chrono::{Duration, NaiveDate};

use crate::dataset::Dataset;

pub fn read(bytes: &[u8]) -> Result<Dataset, String> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))
        .map_err(|e| format!("Failed to open Excel file: {}", e))?;

    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| "Excel file contains no sheets".to_string())?
        .map_err(|e| format!("Failed to read first sheet: {}", e))?;

    let mut rows = range.rows();
    let Some(header) = rows.next() else {
        return Ok(Dataset::default());
    };

    let headers: Vec<String> = header
        .iter()
        .map(|cell| cell_text(cell).unwrap_or_default())
        .collect();

    let body: Vec<Vec<String>> = rows
        .filter(|row| row.iter().any(|cell| !matches!(cell, Data::Empty)))
        .map(|row| {
            row.iter()
                .map(|cell| cell_text(cell).unwrap_or_default())
                .collect()
        })
        .collect();

    Ok(Dataset::from_rows(headers, body))
}

fn cell_text(cell: &Data) -> Option<String> {
    match cell {
        Data::Empty => None,
        Data::String(s) => Some(s.clone()),
        Data::Float(n) => Some(format_float(*n)),
        Data::Int(n) => Some(n.to_string()),
        Data::Bool(b) => Some(if *b { "TRUE" } else { "FALSE" }.to_string()),
        Data::DateTime(dt) => {
            let serial = dt.as_f64();
            Some(excel_serial_to_iso(serial).unwrap_or_else(|| format_float(serial)))
        }
        Data::DateTimeIso(s) => Some(s.clone()),
        Data::DurationIso(s) => Some(s.clone()),
        // #DIV/0!, #REF! and friends carry no value
        Data::Error(_) => None,
    }
}

/// Integers without a trailing `.0`.
fn format_float(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

/// Convert an Excel serial date (1900 system) into an ISO date or datetime.
fn excel_serial_to_iso(serial: f64) -> Option<String> {
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?.and_hms_opt(0, 0, 0)?;
    let millis = (serial * 86_400_000.0).round() as i64;
    let datetime = epoch.checked_add_signed(Duration::milliseconds(millis))?;

    if serial.fract().abs() < 1e-9 {
        Some(datetime.format("%Y-%m-%d").to_string())
    } else {
        Some(datetime.format("%Y-%m-%dT%H:%M:%S").to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::ColumnKind;
    use rust_xlsxwriter::Workbook;

    fn workbook_bytes() -> Vec<u8> {
        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        sheet.write_string(0, 0, "region").unwrap();
        sheet.write_string(0, 1, "revenue").unwrap();
        sheet.write_string(1, 0, "north").unwrap();
        sheet.write_number(1, 1, 120.0).unwrap();
        sheet.write_string(2, 0, "south").unwrap();
        sheet.write_number(2, 1, 80.5).unwrap();

        let second = workbook.add_worksheet();
        second.write_string(0, 0, "ignored").unwrap();

        workbook.save_to_buffer().unwrap()
    }

    #[test]
    fn test_reads_first_sheet_only() {
        let dataset = read(&workbook_bytes()).unwrap();
        assert_eq!(dataset.column_names(), vec!["region", "revenue"]);
        assert_eq!(dataset.row_count(), 2);

        let revenue = dataset.column("revenue").unwrap();
        assert_eq!(revenue.kind, ColumnKind::Numeric);
        assert_eq!(revenue.values[0].as_deref(), Some("120"));
        assert_eq!(revenue.values[1].as_deref(), Some("80.5"));
    }

    #[test]
    fn test_invalid_bytes_report_error() {
        let err = read(b"plain text").unwrap_err();
        assert!(err.contains("Failed to open Excel file"));
    }

    #[test]
    fn test_excel_serial_conversion() {
        assert_eq!(excel_serial_to_iso(45292.0).as_deref(), Some("2024-01-01"));
        assert_eq!(excel_serial_to_iso(45292.5).as_deref(), Some("2024-01-01T12:00:00"));
        assert_eq!(format_float(3.0), "3");
        assert_eq!(format_float(2.25), "2.25");
    }
}
