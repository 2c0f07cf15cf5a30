// Delimited text (CSV/TSV/TXT) reader
//
// Delimiter selection is an ordered list of strategies. Each one either
// produces a dataset or reports why it was rejected; the first success wins.

use tracing::debug;

use crate::dataset::Dataset;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DelimiterStrategy {
    /// Parse with this delimiter and accept only if it yields more than one column.
    Fixed(u8),
    /// Sniff the most consistent delimiter and accept any column count.
    AutoDetect,
}

pub const STRATEGIES: &[DelimiterStrategy] = &[
    DelimiterStrategy::Fixed(b','),
    DelimiterStrategy::Fixed(b'\t'),
    DelimiterStrategy::Fixed(b';'),
    DelimiterStrategy::Fixed(b'|'),
    DelimiterStrategy::AutoDetect,
];

impl DelimiterStrategy {
    pub fn attempt(&self, text: &str) -> Result<Dataset, String> {
        match *self {
            DelimiterStrategy::Fixed(delimiter) => {
                let dataset = parse_delimited(text, delimiter)?;
                if dataset.column_count() > 1 {
                    Ok(dataset)
                } else {
                    Err(format!(
                        "delimiter {:?} produced {} column(s)",
                        delimiter as char,
                        dataset.column_count()
                    ))
                }
            }
            DelimiterStrategy::AutoDetect => parse_delimited(text, sniff_delimiter(text)),
        }
    }
}

pub fn read(bytes: &[u8]) -> Result<Dataset, String> {
    read_text(&decode_text(bytes))
}

pub fn read_text(text: &str) -> Result<Dataset, String> {
    let mut last_error = String::from("no delimiter strategy applied");

    for strategy in STRATEGIES {
        match strategy.attempt(text) {
            Ok(dataset) => {
                debug!(strategy = ?strategy, columns = dataset.column_count(), "Delimiter strategy accepted");
                return Ok(dataset);
            }
            Err(reason) => {
                debug!(strategy = ?strategy, reason = %reason, "Delimiter strategy rejected");
                last_error = reason;
            }
        }
    }

    Err(format!("Failed to parse CSV/TXT: {}", last_error))
}

/// Parse `text` with a header row and the given delimiter.
///
/// Rows with fewer fields than the header are padded with nulls; rows with
/// more fields are an error.
pub fn parse_delimited(text: &str, delimiter: u8) -> Result<Dataset, String> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .flexible(true)
        .from_reader(text.as_bytes());

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| e.to_string())?
        .iter()
        .map(|h| h.to_string())
        .collect();

    let mut rows: Vec<Vec<String>> = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| e.to_string())?;
        if record.len() > headers.len() {
            let line = record.position().map(|p| p.line()).unwrap_or_default();
            return Err(format!(
                "Expected {} fields in line {}, saw {}",
                headers.len(),
                line,
                record.len()
            ));
        }
        rows.push(record.iter().map(|v| v.to_string()).collect());
    }

    Ok(Dataset::from_rows(headers, rows))
}

/// Pick the delimiter whose field count is most consistent across the first lines.
fn sniff_delimiter(text: &str) -> u8 {
    let candidates: &[u8] = &[b',', b'\t', b';', b'|'];
    let sample_lines: Vec<&str> = text
        .lines()
        .filter(|l| !l.trim().is_empty())
        .take(10)
        .collect();

    let mut best = b',';
    let mut best_score = 0u64;

    for &delimiter in candidates {
        let counts: Vec<usize> = sample_lines
            .iter()
            .map(|line| {
                csv::ReaderBuilder::new()
                    .delimiter(delimiter)
                    .has_headers(false)
                    .flexible(true)
                    .from_reader(line.as_bytes())
                    .records()
                    .next()
                    .and_then(|r| r.ok())
                    .map(|r| r.len())
                    .unwrap_or(1)
            })
            .collect();

        let Some(&target) = counts.first() else {
            continue;
        };
        if target <= 1 {
            continue;
        }

        let consistent = counts.iter().filter(|&&c| c == target).count() as u64;
        let score = consistent * target as u64;
        if score > best_score {
            best_score = score;
            best = delimiter;
        }
    }

    best
}

/// Decode bytes as UTF-8 (dropping a BOM), falling back to Windows-1252.
pub fn decode_text(bytes: &[u8]) -> String {
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
    match std::str::from_utf8(bytes) {
        Ok(text) => text.to_string(),
        Err(_) => {
            let (decoded, _, _) = encoding_rs::WINDOWS_1252.decode(bytes);
            decoded.into_owned()
        }
    }
}
