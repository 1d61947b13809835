//! Chart specifications.
//!
//! A chart is never drawn here. A [`ChartSpec`] names the chart kind, maps
//! columns of its derived table to axes, color and size, and carries the data.

use super::table::DerivedTable;
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartKind {
    Bar,
    Box,
    Violin,
    Scatter,
    Line,
    Heatmap,
    Pie,
    Histogram,
}

impl fmt::Display for ChartKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ChartKind::Bar => "Bar Chart",
            ChartKind::Box => "Box Plot",
            ChartKind::Violin => "Violin Plot",
            ChartKind::Scatter => "Scatter Plot",
            ChartKind::Line => "Line Chart",
            ChartKind::Heatmap => "Heatmap",
            ChartKind::Pie => "Pie Chart",
            ChartKind::Histogram => "Histogram",
        };
        f.write_str(name)
    }
}

/// How multiple bar series share an axis position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BarMode {
    Group,
}

/// A horizontal marker line, e.g. an outlier fence.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReferenceLine {
    pub y: f64,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSpec {
    pub kind: ChartKind,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub hover: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bar_mode: Option<BarMode>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub reference_lines: Vec<ReferenceLine>,
    pub data: DerivedTable,
}

impl ChartSpec {
    pub fn new(kind: ChartKind, title: impl Into<String>, data: DerivedTable) -> Self {
        Self {
            kind,
            title: title.into(),
            x: None,
            y: None,
            color: None,
            size: None,
            hover: Vec::new(),
            bar_mode: None,
            reference_lines: Vec::new(),
            data,
        }
    }

    pub fn x(mut self, column: impl Into<String>) -> Self {
        self.x = Some(column.into());
        self
    }

    pub fn y(mut self, column: impl Into<String>) -> Self {
        self.y = Some(column.into());
        self
    }

    pub fn color(mut self, column: impl Into<String>) -> Self {
        self.color = Some(column.into());
        self
    }

    pub fn size(mut self, column: impl Into<String>) -> Self {
        self.size = Some(column.into());
        self
    }

    pub fn hover(mut self, columns: &[&str]) -> Self {
        self.hover = columns.iter().map(|c| c.to_string()).collect();
        self
    }

    pub fn bar_mode(mut self, mode: BarMode) -> Self {
        self.bar_mode = Some(mode);
        self
    }

    pub fn reference_line(mut self, y: f64, label: impl Into<String>) -> Self {
        self.reference_lines.push(ReferenceLine {
            y,
            label: label.into(),
        });
        self
    }

    /// Column mappings as `(role, column)` pairs, for display.
    pub fn mappings(&self) -> Vec<(&'static str, &str)> {
        [
            ("x", &self.x),
            ("y", &self.y),
            ("color", &self.color),
            ("size", &self.size),
        ]
        .into_iter()
        .filter_map(|(role, column)| column.as_deref().map(|c| (role, c)))
        .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_and_mappings() {
        let chart = ChartSpec::new(ChartKind::Scatter, "Age vs Purchase Amount", DerivedTable::default())
            .x("Age")
            .y("Purchase Amount (USD)")
            .color("Gender")
            .hover(&["Category"]);

        assert_eq!(
            chart.mappings(),
            vec![("x", "Age"), ("y", "Purchase Amount (USD)"), ("color", "Gender")]
        );
        assert_eq!(chart.hover, vec!["Category"]);
        assert_eq!(chart.kind.to_string(), "Scatter Plot");
    }

    #[test]
    fn test_json_skips_unset_fields() {
        let chart = ChartSpec::new(ChartKind::Pie, "Sizes", DerivedTable::default());
        let json = serde_json::to_string(&chart).unwrap();
        assert!(json.contains("\"kind\":\"pie\""));
        assert!(!json.contains("\"color\""));
        assert!(!json.contains("\"reference_lines\""));
    }
}
