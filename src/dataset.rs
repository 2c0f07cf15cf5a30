//! In-memory tabular data produced by the parsers.
//!
//! Cells are kept as trimmed text (`None` for nulls). Each column carries a
//! [`ColumnKind`] inferred from its non-null values, which is what the
//! profiler and the preview serializer work from.

use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};

use crate::types::{AppError, AppResult};

pub type Cell = Option<String>;

/// Tokens treated as missing values in addition to blank cells.
const NULL_TOKENS: &[&str] = &[
    "na", "n/a", "nan", "null", "none", "#n/a", "-", "-nan",
];

const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%m/%d/%Y",
    "%d/%m/%Y",
    "%d-%m-%Y",
    "%d.%m.%Y",
    "%d %b %Y",
    "%b %d, %Y",
    "%B %d, %Y",
];

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnKind {
    Numeric,
    Temporal,
    Categorical,
    Identifier,
}

impl ColumnKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ColumnKind::Numeric => "numeric",
            ColumnKind::Temporal => "temporal",
            ColumnKind::Categorical => "categorical",
            ColumnKind::Identifier => "identifier",
        }
    }

    /// Infer the kind of a column from its name and values.
    ///
    /// Only non-null values participate; a column with no values at all is
    /// categorical.
    pub fn infer<'a, I>(name: &str, values: I) -> Self
    where
        I: IntoIterator<Item = &'a Cell>,
    {
        if is_identifier_name(name) {
            return ColumnKind::Identifier;
        }

        let present: Vec<&str> = values
            .into_iter()
            .filter_map(|v| v.as_deref())
            .collect();
        if present.is_empty() {
            return ColumnKind::Categorical;
        }

        if present.iter().all(|v| parse_number(v).is_some()) {
            ColumnKind::Numeric
        } else if present.iter().all(|v| is_temporal(v)) {
            ColumnKind::Temporal
        } else if present.iter().all(|v| uuid::Uuid::parse_str(v).is_ok()) {
            ColumnKind::Identifier
        } else {
            ColumnKind::Categorical
        }
    }
}

impl std::fmt::Display for ColumnKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// `id` and `uuid` columns never take part in charts.
pub fn is_identifier_name(name: &str) -> bool {
    let lower = name.trim().to_lowercase();
    lower == "id" || lower == "uuid"
}

pub fn parse_number(value: &str) -> Option<f64> {
    value
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|n| n.is_finite())
}

pub fn is_temporal(value: &str) -> bool {
    let value = value.trim();
    if DateTime::parse_from_rfc3339(value).is_ok() {
        return true;
    }
    DATE_FORMATS
        .iter()
        .any(|fmt| NaiveDate::parse_from_str(value, fmt).is_ok())
        || DATETIME_FORMATS
            .iter()
            .any(|fmt| NaiveDateTime::parse_from_str(value, fmt).is_ok())
}

/// Normalize a raw cell: trims whitespace and maps blanks and null tokens to `None`.
pub fn normalize_cell(raw: &str) -> Cell {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    let lower = trimmed.to_lowercase();
    if NULL_TOKENS.contains(&lower.as_str()) {
        None
    } else {
        Some(trimmed.to_string())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub kind: ColumnKind,
    pub values: Vec<Cell>,
}

impl Column {
    pub fn new(name: impl Into<String>, values: Vec<Cell>) -> Self {
        let name = name.into();
        let kind = ColumnKind::infer(&name, &values);
        Self { name, kind, values }
    }

    pub fn is_all_null(&self) -> bool {
        self.values.iter().all(|v| v.is_none())
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    columns: Vec<Column>,
}

impl Dataset {
    /// Build a dataset from columns; every column must have the same length.
    pub fn from_columns(columns: Vec<Column>) -> AppResult<Self> {
        if let Some(first) = columns.first() {
            let expected = first.values.len();
            if let Some(bad) = columns.iter().find(|c| c.values.len() != expected) {
                return Err(AppError::Internal(format!(
                    "Column '{}' has {} values, expected {}",
                    bad.name,
                    bad.values.len(),
                    expected
                )));
            }
        }
        Ok(Self { columns })
    }

    /// Build a dataset from a header row and raw text rows.
    ///
    /// Short rows are padded with nulls and long rows truncated; readers that
    /// must reject ragged input check widths before calling this.
    pub fn from_rows<H, R>(headers: H, rows: Vec<Vec<R>>) -> Self
    where
        H: IntoIterator,
        H::Item: AsRef<str>,
        R: AsRef<str>,
    {
        let names = normalize_headers(headers);
        let mut values: Vec<Vec<Cell>> = vec![Vec::with_capacity(rows.len()); names.len()];

        for row in &rows {
            for (idx, column) in values.iter_mut().enumerate() {
                column.push(row.get(idx).and_then(|v| normalize_cell(v.as_ref())));
            }
        }

        let columns = names
            .into_iter()
            .zip(values)
            .map(|(name, values)| Column::new(name, values))
            .collect();
        Self { columns }
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn row_count(&self) -> usize {
        self.columns.first().map(|c| c.values.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.column_count() == 0 || self.row_count() == 0
    }

    /// The first `limit` rows as JSON objects keyed by column name.
    pub fn preview(&self, limit: usize) -> Vec<Map<String, Value>> {
        (0..self.row_count().min(limit))
            .map(|row| {
                self.columns
                    .iter()
                    .map(|col| (col.name.clone(), cell_to_json(col.kind, &col.values[row])))
                    .collect()
            })
            .collect()
    }
}

fn cell_to_json(kind: ColumnKind, cell: &Cell) -> Value {
    let Some(raw) = cell else {
        return Value::Null;
    };
    if kind == ColumnKind::Numeric {
        if let Some(n) = parse_number(raw) {
            if n.fract() == 0.0 && n.abs() < 1e15 {
                return Value::Number(Number::from(n as i64));
            }
            if let Some(num) = Number::from_f64(n) {
                return Value::Number(num);
            }
        }
    }
    Value::String(raw.clone())
}

/// Blank headers become `Unnamed: <index>`; repeated names get `.1`, `.2`, ... suffixes.
fn normalize_headers<H>(headers: H) -> Vec<String>
where
    H: IntoIterator,
    H::Item: AsRef<str>,
{
    let mut seen: HashMap<String, usize> = HashMap::new();
    let mut names = Vec::new();

    for (idx, raw) in headers.into_iter().enumerate() {
        let trimmed = raw.as_ref().trim().trim_start_matches('\u{feff}').trim();
        let base = if trimmed.is_empty() {
            format!("Unnamed: {}", idx)
        } else {
            trimmed.to_string()
        };

        let mut name = base.clone();
        while let Some(count) = seen.get_mut(&name) {
            *count += 1;
            name = format!("{}.{}", base, count);
        }
        seen.insert(name.clone(), 0);
        names.push(name);
    }

    names
}

/// Structural limits applied to every parsed dataset.
#[derive(Debug, Clone, Copy)]
pub struct ValidationRules {
    pub min_rows: usize,
    pub min_columns: usize,
}

impl Default for ValidationRules {
    fn default() -> Self {
        Self {
            min_rows: 1,
            min_columns: 1,
        }
    }
}

pub fn validate(dataset: &Dataset, rules: &ValidationRules) -> AppResult<()> {
    if dataset.is_empty() {
        return Err(AppError::Validation("File contains no data".to_string()));
    }

    if dataset.row_count() < rules.min_rows {
        return Err(AppError::Validation(format!(
            "File must contain at least {} rows of data",
            rules.min_rows
        )));
    }

    if dataset.column_count() < rules.min_columns {
        return Err(AppError::Validation(format!(
            "File must contain at least {} columns",
            rules.min_columns
        )));
    }

    let empty: Vec<&str> = dataset
        .columns()
        .iter()
        .filter(|c| c.is_all_null())
        .map(|c| c.name.as_str())
        .collect();
    if !empty.is_empty() {
        return Err(AppError::Validation(format!(
            "File contains empty columns: {}",
            empty.join(", ")
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cells(values: &[&str]) -> Vec<Cell> {
        values.iter().map(|v| normalize_cell(v)).collect()
    }

    #[test]
    fn test_infer_kinds() {
        assert_eq!(ColumnKind::infer("revenue", &cells(&["1", "2.5", "-3"])), ColumnKind::Numeric);
        assert_eq!(
            ColumnKind::infer("day", &cells(&["2024-01-01", "2024-01-02", ""])),
            ColumnKind::Temporal
        );
        assert_eq!(ColumnKind::infer("region", &cells(&["north", "south"])), ColumnKind::Categorical);
        assert_eq!(ColumnKind::infer("ID", &cells(&["1", "2"])), ColumnKind::Identifier);
        assert_eq!(
            ColumnKind::infer(
                "customer_ref",
                &cells(&["67e55044-10b1-426f-9247-bb680e5fe0c8", "a3bb189e-8bf9-3888-9912-ace4e6543002"])
            ),
            ColumnKind::Identifier
        );
        assert_eq!(ColumnKind::infer("mixed", &cells(&["1", "x"])), ColumnKind::Categorical);
    }

    #[test]
    fn test_infinite_values_are_not_numeric() {
        assert_eq!(parse_number("inf"), None);
        assert_eq!(parse_number(" 42 "), Some(42.0));
        assert_eq!(normalize_cell("NaN"), None);
    }

    #[test]
    fn test_from_rows_normalizes_headers_and_pads() {
        let dataset = Dataset::from_rows(
            vec!["a", "", "a"],
            vec![vec!["1", "x"], vec!["2", "y", "z"]],
        );
        assert_eq!(dataset.column_names(), vec!["a", "Unnamed: 1", "a.1"]);
        assert_eq!(dataset.row_count(), 2);
        assert_eq!(dataset.columns()[2].values, vec![None, Some("z".to_string())]);
    }

    #[test]
    fn test_from_columns_rejects_ragged_columns() {
        let result = Dataset::from_columns(vec![
            Column::new("a", cells(&["1", "2"])),
            Column::new("b", cells(&["1"])),
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_validate_rejects_empty_dataset() {
        let err = validate(&Dataset::default(), &ValidationRules::default()).unwrap_err();
        assert!(matches!(err, AppError::Validation(ref m) if m == "File contains no data"));
    }

    #[test]
    fn test_validate_minimums() {
        let dataset = Dataset::from_rows(vec!["a"], vec![vec!["1"]]);
        let rules = ValidationRules {
            min_rows: 2,
            min_columns: 1,
        };
        let err = validate(&dataset, &rules).unwrap_err();
        assert!(err.to_string().contains("at least 2 rows"));

        let rules = ValidationRules {
            min_rows: 1,
            min_columns: 3,
        };
        let err = validate(&dataset, &rules).unwrap_err();
        assert!(err.to_string().contains("at least 3 columns"));
    }

    #[test]
    fn test_validate_lists_all_null_columns() {
        let dataset = Dataset::from_rows(
            vec!["a", "empty_one", "empty_two"],
            vec![vec!["1", "", "NA"], vec!["2", "null", ""]],
        );
        let err = validate(&dataset, &ValidationRules::default()).unwrap_err();
        assert_eq!(err.to_string(), "File contains empty columns: empty_one, empty_two");
    }

    #[test]
    fn test_preview_types_values_by_kind() {
        let dataset = Dataset::from_rows(
            vec!["region", "revenue", "ratio"],
            vec![vec!["north", "10", "0.5"], vec!["south", "", "1.25"], vec!["east", "3", "2"]],
        );
        let preview = dataset.preview(2);
        assert_eq!(preview.len(), 2);
        assert_eq!(preview[0]["region"], Value::String("north".into()));
        assert_eq!(preview[0]["revenue"], serde_json::json!(10));
        assert_eq!(preview[0]["ratio"], serde_json::json!(0.5));
        assert_eq!(preview[1]["revenue"], Value::Null);
        let keys: Vec<&String> = preview[0].keys().collect();
        assert_eq!(keys, vec!["region", "revenue", "ratio"]);
    }
}
