//! Schema profiler.
//!
//! Derives structural hints from column names and inferred kinds. Only the
//! first `sample_rows` rows are inspected; kinds are assumed stable across
//! the rest of the file.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::dataset::{is_identifier_name, ColumnKind, Dataset};

pub const MAX_HINT_COLUMNS: usize = 3;
pub const DEFAULT_SAMPLE_ROWS: usize = 200;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hints {
    pub has_date: bool,
    pub date_field: Option<String>,
    pub measures: Vec<String>,
    pub categories: Vec<String>,
}

pub fn profile(dataset: &Dataset, sample_rows: usize) -> Hints {
    let sampled: Vec<(&str, ColumnKind)> = dataset
        .columns()
        .iter()
        .map(|col| {
            let sample = &col.values[..col.values.len().min(sample_rows)];
            (col.name.as_str(), ColumnKind::infer(&col.name, sample))
        })
        .collect();

    let measures: Vec<String> = sampled
        .iter()
        .filter(|(_, kind)| *kind == ColumnKind::Numeric)
        .map(|(name, _)| name.to_string())
        .take(MAX_HINT_COLUMNS)
        .collect();

    // Temporal columns are neither measures nor categories
    let categories: Vec<String> = sampled
        .iter()
        .filter(|(name, kind)| *kind == ColumnKind::Categorical && !is_identifier_name(name))
        .map(|(name, _)| name.to_string())
        .take(MAX_HINT_COLUMNS)
        .collect();

    let date_field = sampled
        .iter()
        .map(|(name, _)| *name)
        .find(|name| {
            let lower = name.to_lowercase();
            lower.contains("date") || lower.contains("time")
        })
        .map(str::to_string);

    let has_date =
        date_field.is_some() || sampled.iter().any(|(_, kind)| *kind == ColumnKind::Temporal);

    let hints = Hints {
        has_date,
        date_field,
        measures,
        categories,
    };
    debug!(?hints, sample_rows, "Profiled dataset");
    hints
}
