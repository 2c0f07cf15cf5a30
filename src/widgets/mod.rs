//! Widget compiler.
//!
//! Turns the ordered list of chart proposals into renderable widgets, each
//! carrying a Vega-Lite [`ChartDocument`] bound to the preview rows.

pub mod chart;

use serde::{Deserialize, Serialize};
use tracing::debug;

pub use chart::{strip_aggregate, ChartDocument};

pub const MAX_WIDGETS: usize = 6;
pub const PLACEHOLDER_COLUMNS: usize = 5;

/// A chart suggestion, either from the model or from the fallback rules.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WidgetProposal {
    pub title: String,
    pub chart: String,
    pub x: Option<String>,
    /// Field name or aggregate expression such as `SUM(revenue)`.
    pub y: Option<String>,
    pub group_by: Option<String>,
    #[serde(default)]
    pub explanation: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WidgetType {
    BarChart,
    LineChart,
    PieChart,
    Kpi,
    Table,
}

impl WidgetType {
    /// Total, case-insensitive mapping from a chart kind. Unknown kinds are bars.
    pub fn from_chart(chart: &str) -> Self {
        match chart.trim().to_lowercase().as_str() {
            "bar" | "funnel" | "treemap" => WidgetType::BarChart,
            "line" => WidgetType::LineChart,
            "pie" | "donut" => WidgetType::PieChart,
            "kpi" | "metric" | "number" => WidgetType::Kpi,
            "table" => WidgetType::Table,
            _ => WidgetType::BarChart,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            WidgetType::BarChart => "bar_chart",
            WidgetType::LineChart => "line_chart",
            WidgetType::PieChart => "pie_chart",
            WidgetType::Kpi => "kpi",
            WidgetType::Table => "table",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WidgetConfig {
    pub x_column: Option<String>,
    /// The proposal's `y` verbatim, aggregate included.
    pub y_column: Option<String>,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub columns: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WidgetSpec {
    pub id: String,
    #[serde(rename = "type")]
    pub widget_type: WidgetType,
    pub title: String,
    pub explanation: String,
    pub chart_document: ChartDocument,
    pub config: WidgetConfig,
}

/// Compile at most `limit` proposals into widgets with ids `widget_1..`.
///
/// Always returns at least one widget: with no proposals a single summary
/// table over the first columns is produced.
pub fn compile(proposals: &[WidgetProposal], columns: &[String], limit: usize) -> Vec<WidgetSpec> {
    if proposals.is_empty() || limit == 0 {
        debug!(columns = columns.len(), "No proposals, emitting summary table");
        return vec![placeholder(columns)];
    }

    proposals
        .iter()
        .take(limit)
        .enumerate()
        .map(|(idx, proposal)| compile_one(idx + 1, proposal, columns))
        .collect()
}

fn compile_one(number: usize, proposal: &WidgetProposal, columns: &[String]) -> WidgetSpec {
    let y_field = proposal.y.as_deref().map(|y| {
        if columns.iter().any(|c| c == y) {
            y.to_string()
        } else {
            strip_aggregate(y)
        }
    });

    WidgetSpec {
        id: format!("widget_{}", number),
        widget_type: WidgetType::from_chart(&proposal.chart),
        title: proposal.title.clone(),
        explanation: proposal.explanation.clone(),
        chart_document: ChartDocument::build(
            &proposal.title,
            &proposal.chart,
            proposal.x.as_deref(),
            y_field.as_deref(),
        ),
        config: WidgetConfig {
            x_column: proposal.x.clone(),
            y_column: proposal.y.clone(),
            description: proposal.explanation.clone(),
            columns: None,
        },
    }
}

fn placeholder(columns: &[String]) -> WidgetSpec {
    let shown: Vec<String> = columns.iter().take(PLACEHOLDER_COLUMNS).cloned().collect();
    let x = shown.first().cloned();
    let title = "Data Summary";
    let description = if shown.is_empty() {
        "Summary of the uploaded data".to_string()
    } else {
        format!("Summary of columns: {}", shown.join(", "))
    };

    WidgetSpec {
        id: "widget_1".to_string(),
        widget_type: WidgetType::Table,
        title: title.to_string(),
        explanation: description.clone(),
        chart_document: ChartDocument::build(title, "table", x.as_deref(), None),
        config: WidgetConfig {
            x_column: x,
            y_column: None,
            description,
            columns: Some(shown),
        },
    }
}
