// Vega-Lite chart document emitted with every widget

use serde::{Deserialize, Serialize};

pub const VEGA_LITE_SCHEMA: &str = "https://vega.github.io/schema/vega-lite/v5.json";

/// Named data source the front end binds the preview rows to.
pub const PREVIEW_DATA_NAME: &str = "preview";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartDocument {
    #[serde(rename = "$schema")]
    pub schema: String,
    pub description: String,
    pub data: DataRef,
    pub mark: Mark,
    pub encoding: Encoding,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataRef {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mark {
    #[serde(rename = "type")]
    pub mark_type: String,
    pub point: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Encoding {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x: Option<FieldEncoding>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y: Option<FieldEncoding>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldEncoding {
    pub field: String,
    #[serde(rename = "type")]
    pub field_type: String,
}

impl FieldEncoding {
    fn new(field: impl Into<String>, field_type: &str) -> Self {
        Self {
            field: field.into(),
            field_type: field_type.to_string(),
        }
    }
}

/// Mark type for a chart kind: `bar`, `line`, or `area` for everything else.
pub fn mark_for(chart: &str) -> &'static str {
    match chart.trim().to_lowercase().as_str() {
        "bar" | "funnel" | "treemap" => "bar",
        "line" => "line",
        _ => "area",
    }
}

/// Strip aggregate wrappers: `SUM(revenue)` and `COUNT(DISTINCT id)` both
/// yield the bare field. Plain field names come back unchanged.
pub fn strip_aggregate(expression: &str) -> String {
    let mut current = expression.trim();

    loop {
        let Some(open) = current.find('(') else {
            break;
        };
        if !current.ends_with(')') {
            break;
        }
        let func = current[..open].trim();
        if func.is_empty() || !func.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            break;
        }

        let mut inner = current[open + 1..current.len() - 1].trim();
        if let Some(rest) = inner
            .get(..9)
            .filter(|prefix| prefix.eq_ignore_ascii_case("distinct "))
            .and_then(|_| inner.get(9..))
        {
            inner = rest.trim();
        }
        current = inner;
    }

    current.to_string()
}

impl ChartDocument {
    /// Build the chart document for one proposal.
    ///
    /// `y_field` is the bare field already resolved by the caller; the
    /// original `y` expression stays in the widget config.
    pub fn build(title: &str, chart: &str, x: Option<&str>, y_field: Option<&str>) -> Self {
        let x = x.filter(|f| !f.is_empty()).map(|field| {
            let field_type = if field.to_lowercase().contains("date") {
                "temporal"
            } else {
                "nominal"
            };
            FieldEncoding::new(field, field_type)
        });
        let y = y_field
            .filter(|f| !f.is_empty())
            .map(|field| FieldEncoding::new(field, "quantitative"));

        let mark_type = mark_for(chart);
        Self {
            schema: VEGA_LITE_SCHEMA.to_string(),
            description: title.to_string(),
            data: DataRef {
                name: PREVIEW_DATA_NAME.to_string(),
            },
            mark: Mark {
                mark_type: mark_type.to_string(),
                point: mark_type == "line",
            },
            encoding: Encoding { x, y },
        }
    }
}
